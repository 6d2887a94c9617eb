use std::fmt;
use std::ops::Deref;
use std::path::{Component, Path};

use serde::{Deserialize, Serialize};

/// An owned URL or URL path, joined with `/`-aware append and prepend.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UrlBuf(String);

impl UrlBuf {
    pub fn new() -> UrlBuf {
        UrlBuf(String::new())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// ```rust
    /// use guidebook::url::UrlBuf;
    ///
    /// assert_eq!(UrlBuf::scheme_of("https://rocket.rs"), Some("https"));
    /// assert_eq!(UrlBuf::scheme_of("mailto:me@example.com"), Some("mailto"));
    /// assert_eq!(UrlBuf::scheme_of("/a:b"), None);
    /// assert_eq!(UrlBuf::scheme_of("a?b:c"), None);
    /// assert_eq!(UrlBuf::scheme_of("a#b:c"), None);
    /// ```
    pub fn scheme_of(url: &str) -> Option<&str> {
        let bytes = url.as_bytes();
        match memchr::memchr3(b':', b'?', b'/', bytes) {
            Some(i) if bytes[i] == b':' && i > 0 => match memchr::memchr(b'#', &bytes[..i]) {
                Some(_) => None,
                None => Some(&url[..i]),
            },
            _ => None,
        }
    }

    pub fn scheme(&self) -> Option<&str> {
        Self::scheme_of(&self.0)
    }

    /// Appends `url`, inserting or collapsing a `/` at the seam. A `url` with
    /// a scheme replaces `self` entirely.
    ///
    /// ```rust
    /// use guidebook::url::UrlBuf;
    ///
    /// let mut url = UrlBuf::from("/GuideWords.github.io");
    /// url.append("guides/leifengta");
    /// assert_eq!(url.as_str(), "/GuideWords.github.io/guides/leifengta");
    ///
    /// url.append("/");
    /// assert_eq!(url.as_str(), "/GuideWords.github.io/guides/leifengta/");
    ///
    /// url.append("https://unpkg.com/vconsole");
    /// assert_eq!(url.as_str(), "https://unpkg.com/vconsole");
    ///
    /// let mut url = UrlBuf::from("/");
    /// url.append("/a");
    /// assert_eq!(url.as_str(), "/a");
    /// ```
    pub fn append(&mut self, url: &str) -> &mut Self {
        if Self::scheme_of(url).is_some() {
            self.0 = url.to_owned();
            return self;
        }

        match (self.0.ends_with('/'), url.starts_with('/')) {
            (true, true) => self.0.push_str(&url[1..]),
            (false, false) if !self.0.is_empty() && !url.is_empty() => {
                self.0.push('/');
                self.0.push_str(url);
            }
            _ => self.0.push_str(url),
        }

        self
    }

    /// Prepends `url` unless `self` already carries a scheme.
    ///
    /// ```rust
    /// use guidebook::url::UrlBuf;
    ///
    /// let mut url = UrlBuf::from("resources/");
    /// url.prepend("/base");
    /// assert_eq!(url.as_str(), "/base/resources/");
    ///
    /// url.prepend("https://holding-hands.github.io/");
    /// assert_eq!(url.as_str(), "https://holding-hands.github.io/base/resources/");
    ///
    /// url.prepend("/ignored");
    /// assert_eq!(url.as_str(), "https://holding-hands.github.io/base/resources/");
    /// ```
    pub fn prepend(&mut self, url: &str) -> &mut Self {
        if self.scheme().is_some() {
            return self;
        }

        let suffix = std::mem::take(&mut self.0);
        self.0 = url.to_owned();
        self.append(&suffix)
    }

    pub fn extend<T: AsRef<str>, I: IntoIterator<Item = T>>(&mut self, iter: I) -> &mut Self {
        for url in iter {
            self.append(url.as_ref());
        }

        self
    }

    pub fn make_absolute(&mut self) -> &mut Self {
        if !self.0.starts_with('/') {
            self.prepend("/");
        }

        self
    }

    /// Strips the scheme and any leading `/`.
    ///
    /// ```rust
    /// use guidebook::url::UrlBuf;
    ///
    /// let mut url = UrlBuf::from("/resources/pdf-1/");
    /// url.make_relative();
    /// assert_eq!(url.as_str(), "resources/pdf-1/");
    /// ```
    pub fn make_relative(&mut self) -> &mut Self {
        let mut rest = self.0.as_str();
        if let Some(scheme) = self.scheme() {
            rest = &rest[scheme.len() + 1..];
        }

        let rest = rest.trim_start_matches('/');
        if rest.len() != self.0.len() {
            self.0 = rest.to_owned();
        }

        self
    }

    /// Ensures the URL ends with `/`, the form every page route uses.
    pub fn make_directory(&mut self) -> &mut Self {
        if !self.0.ends_with('/') {
            self.0.push('/');
        }

        self
    }
}

impl From<String> for UrlBuf {
    fn from(value: String) -> Self {
        UrlBuf(value)
    }
}

impl From<&str> for UrlBuf {
    fn from(value: &str) -> Self {
        UrlBuf(value.to_owned())
    }
}

/// Converts a relative file path into URL segments, dropping `.` and
/// resolving `..`.
impl From<&Path> for UrlBuf {
    fn from(value: &Path) -> Self {
        let mut segments: Vec<String> = vec![];
        let mut rooted = false;
        for component in value.components() {
            match component {
                Component::Prefix(_) | Component::CurDir => continue,
                Component::RootDir => rooted = true,
                Component::ParentDir => { segments.pop(); },
                Component::Normal(v) => segments.push(v.to_string_lossy().into_owned()),
            }
        }

        let joined = segments.join("/");
        UrlBuf(if rooted { format!("/{joined}") } else { joined })
    }
}

impl Deref for UrlBuf {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for UrlBuf {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UrlBuf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl<U: AsRef<str>> FromIterator<U> for UrlBuf {
    fn from_iter<T: IntoIterator<Item = U>>(iter: T) -> Self {
        let mut url = UrlBuf::new();
        url.extend(iter);
        url
    }
}

impl From<UrlBuf> for String {
    fn from(value: UrlBuf) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::UrlBuf;

    #[test]
    fn from_path_normalizes() {
        assert_eq!(UrlBuf::from(Path::new("pdfs/./x/../a.pdf")).as_str(), "pdfs/a.pdf");
        assert_eq!(UrlBuf::from(Path::new("/docs/b.md")).as_str(), "/docs/b.md");
    }

    #[test]
    fn collect_joins_segments() {
        let url: UrlBuf = ["/base", "resources", "c", "pdf/"].into_iter().collect();
        assert_eq!(url.as_str(), "/base/resources/c/pdf/");
    }
}
