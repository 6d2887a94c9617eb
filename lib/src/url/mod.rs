//! URL joining for a site served below a fixed base path.

mod url_buf;

pub use url_buf::UrlBuf;

/// Returns `true` if `url` points off-site: it has an `http`/`https` scheme
/// or is protocol-relative.
///
/// ```rust
/// use guidebook::url::is_external;
///
/// assert!(is_external("https://example.com/a.pdf"));
/// assert!(is_external("HTTP://example.com"));
/// assert!(is_external("//cdn.example.com/x.js"));
/// assert!(!is_external("/pdfs/a.pdf"));
/// assert!(!is_external("pdfs/https.pdf"));
/// ```
pub fn is_external(url: &str) -> bool {
    if url.starts_with("//") {
        return true;
    }

    UrlBuf::scheme_of(url)
        .map_or(false, |s| s.eq_ignore_ascii_case("http") || s.eq_ignore_ascii_case("https"))
}

/// Prefixes a site-local `url` with `base_path`. External URLs, in-page
/// anchors, and URLs already below the base path are returned unchanged.
///
/// ```rust
/// use guidebook::url::with_base_path;
///
/// let base = "/GuideWords.github.io";
/// assert_eq!(with_base_path(base, "/resources/"), "/GuideWords.github.io/resources/");
/// assert_eq!(with_base_path(base, "pdfs/a.pdf"), "/GuideWords.github.io/pdfs/a.pdf");
/// assert_eq!(with_base_path(base, "/GuideWords.github.io/x/"), "/GuideWords.github.io/x/");
/// assert_eq!(with_base_path(base, "https://a.org/b"), "https://a.org/b");
/// assert_eq!(with_base_path(base, "#top"), "#top");
/// assert_eq!(with_base_path("", "guides/x/"), "/guides/x/");
/// assert_eq!(with_base_path("/", "/"), "/");
/// ```
pub fn with_base_path(base_path: &str, url: &str) -> String {
    if is_external(url) || url.starts_with('#') || UrlBuf::scheme_of(url).is_some() {
        return url.to_owned();
    }

    let mut base = UrlBuf::from(base_path);
    base.make_absolute();
    let base = base.as_str().trim_end_matches('/');
    let already_based = !base.is_empty() && url.strip_prefix(base)
        .map_or(false, |rest| rest.is_empty() || rest.starts_with('/'));

    if already_based {
        return url.to_owned();
    }

    let mut joined = UrlBuf::from(base);
    joined.make_absolute().append(url);
    joined.into()
}

/// Turns a site-local URL into an absolute one on `origin`. URLs that already
/// carry a scheme are returned as-is.
///
/// ```rust
/// use guidebook::url::absolute;
///
/// let origin = "https://holding-hands.github.io";
/// assert_eq!(absolute(origin, "/g/pdfs/a.pdf"), "https://holding-hands.github.io/g/pdfs/a.pdf");
/// assert_eq!(absolute(origin, "https://x.org/a.pdf"), "https://x.org/a.pdf");
/// ```
pub fn absolute(origin: &str, url: &str) -> String {
    let mut url = UrlBuf::from(url);
    url.prepend(origin);
    url.into()
}
