//! Choosing how a reference document is shown in the browser.
//!
//! A document URL is dispatched on its extension to a [`DocumentFormat`].
//! PDFs and Word files are embedded in a frame whose [`EmbedSource`] depends
//! on whether the URL is external, whether the client is mobile, and whether
//! an earlier embed attempt failed. Large files are gated behind a
//! confirmation step by [`Guard`].

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};
use crate::url::{absolute, is_external};

pub const PDF_VIEWER: &str = "https://mozilla.github.io/pdf.js/web/viewer.html";
pub const DOC_VIEWER: &str = "https://view.officeapps.live.com/op/embed.aspx";

/// Script that renders markdown fetched at runtime.
pub const MARKDOWN_RENDERER_SRC: &str = "https://unpkg.com/marked@12/marked.min.js";

/// How long a frame may take to load before it counts as failed.
pub const EMBED_TIMEOUT_MS: u64 = 20_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Markdown,
    Word,
    Pdf,
}

impl DocumentFormat {
    /// Dispatches on the extension of the URL's path. The query string and
    /// fragment are ignored, as is case. Anything that isn't markdown or a
    /// Word document is treated as a PDF.
    ///
    /// ```rust
    /// use guidebook::viewer::DocumentFormat;
    ///
    /// assert_eq!(DocumentFormat::of("/docs/notes.md"), DocumentFormat::Markdown);
    /// assert_eq!(DocumentFormat::of("/docs/NOTES.MD?v=2#top"), DocumentFormat::Markdown);
    /// assert_eq!(DocumentFormat::of("https://x.org/a.docx"), DocumentFormat::Word);
    /// assert_eq!(DocumentFormat::of("/a.doc"), DocumentFormat::Word);
    /// assert_eq!(DocumentFormat::of("/a.pdf"), DocumentFormat::Pdf);
    /// assert_eq!(DocumentFormat::of("/a.md.pdf"), DocumentFormat::Pdf);
    /// assert_eq!(DocumentFormat::of("/download?file=a.md"), DocumentFormat::Pdf);
    /// assert_eq!(DocumentFormat::of("/no-extension"), DocumentFormat::Pdf);
    /// ```
    pub fn of(url: &str) -> DocumentFormat {
        let end = url.find(['?', '#']).unwrap_or(url.len());
        let path = url[..end].to_ascii_lowercase();
        if path.ends_with(".md") {
            DocumentFormat::Markdown
        } else if path.ends_with(".doc") || path.ends_with(".docx") {
            DocumentFormat::Word
        } else {
            DocumentFormat::Pdf
        }
    }
}

/// Detects phones and tablets the way the viewer's runtime script does.
///
/// ```rust
/// use guidebook::viewer::is_mobile;
///
/// assert!(is_mobile("Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X)"));
/// assert!(is_mobile("Mozilla/5.0 (Linux; android 14; Pixel 8)"));
/// assert!(!is_mobile("Mozilla/5.0 (Windows NT 10.0; Win64; x64)"));
/// ```
pub fn is_mobile(user_agent: &str) -> bool {
    let ua = user_agent.to_ascii_lowercase();
    MOBILE_MARKERS.iter().any(|marker| ua.contains(marker))
}

/// Lowercased user-agent substrings that mark a mobile client.
pub const MOBILE_MARKERS: &[&str] = &["iphone", "ipad", "ipod", "android"];

/// Where an embedded frame loads a document from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmbedSource {
    /// The document URL itself.
    Direct(String),
    /// A third-party viewer app pointed at the document through `param`.
    /// `target` is absolute unless the site has no public URL configured, in
    /// which case it is resolved against the page's origin in the browser.
    Proxy { viewer: String, param: &'static str, target: String },
}

impl EmbedSource {
    /// The URL as known at build time.
    pub fn url(&self) -> String {
        self.resolve("")
    }

    /// The URL with a site-relative proxy target made absolute on `origin`,
    /// which is what the page script does with `location.origin`.
    ///
    /// ```rust
    /// use guidebook::viewer::ViewerConfig;
    ///
    /// let src = ViewerConfig::default().pdf_proxy("", "/g/a.pdf");
    /// assert!(!src.is_resolved());
    /// assert_eq!(src.resolve("https://s.io"), "https://mozilla.github.io/pdf.js/web/viewer.html\
    ///     ?file=https%3A%2F%2Fs.io%2Fg%2Fa.pdf");
    /// ```
    pub fn resolve(&self, origin: &str) -> String {
        match self {
            EmbedSource::Direct(url) => url.clone(),
            EmbedSource::Proxy { viewer, param, target } => {
                let target = match self.is_resolved() {
                    true => target.clone(),
                    false => absolute(origin, target),
                };

                format!("{viewer}?{param}={}", urlencoding::encode(&target))
            }
        }
    }

    /// Whether [`url`](Self::url) works from any page.
    pub fn is_resolved(&self) -> bool {
        match self {
            EmbedSource::Direct(_) => true,
            EmbedSource::Proxy { target, .. } => !target.starts_with('/') || target.starts_with("//"),
        }
    }

    pub fn is_proxy(&self) -> bool {
        matches!(self, EmbedSource::Proxy { .. })
    }
}

impl Serialize for EmbedSource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        match self {
            EmbedSource::Direct(url) => {
                map.serialize_entry("kind", "direct")?;
                map.serialize_entry("url", url)?;
            }
            EmbedSource::Proxy { viewer, param, target } => {
                map.serialize_entry("kind", "proxy")?;
                map.serialize_entry("url", &self.url())?;
                map.serialize_entry("viewer", viewer)?;
                map.serialize_entry("param", param)?;
                map.serialize_entry("target", target)?;
            }
        }

        map.end()
    }
}

/// Viewer settings, read from the `[viewer]` table of the site config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub pdf_viewer: String,
    pub doc_viewer: String,
    pub large_file_threshold: FileSize,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        ViewerConfig {
            pdf_viewer: PDF_VIEWER.into(),
            doc_viewer: DOC_VIEWER.into(),
            large_file_threshold: FileSize::mb(50),
        }
    }
}

impl ViewerConfig {
    fn proxy(&self, viewer: &str, param: &'static str, origin: &str, url: &str) -> EmbedSource {
        EmbedSource::Proxy { viewer: viewer.to_owned(), param, target: absolute(origin, url) }
    }

    /// The PDF viewer proxy for `url`, made absolute on `origin`. An empty
    /// `origin` leaves a site-local `url` for the browser to resolve.
    pub fn pdf_proxy(&self, origin: &str, url: &str) -> EmbedSource {
        self.proxy(&self.pdf_viewer, "file", origin, url)
    }

    /// The office document viewer for `url`, made absolute on `origin`.
    pub fn doc_proxy(&self, origin: &str, url: &str) -> EmbedSource {
        self.proxy(&self.doc_viewer, "src", origin, url)
    }

    /// Chooses the embed source for a document.
    ///
    /// External URLs are embedded directly. Word documents always go through
    /// the document viewer. Local PDFs load directly on desktop and through
    /// the PDF viewer proxy on mobile or after a failed embed.
    ///
    /// ```rust
    /// use guidebook::viewer::{EmbedSource, ViewerConfig};
    ///
    /// let cfg = ViewerConfig::default();
    /// let origin = "https://holding-hands.github.io";
    ///
    /// let desktop = cfg.embed_source(origin, "/g/a.pdf", false, false);
    /// assert_eq!(desktop, EmbedSource::Direct("/g/a.pdf".into()));
    ///
    /// let mobile = cfg.embed_source(origin, "/g/a.pdf", true, false);
    /// assert_eq!(mobile.url(), "https://mozilla.github.io/pdf.js/web/viewer.html\
    ///     ?file=https%3A%2F%2Fholding-hands.github.io%2Fg%2Fa.pdf");
    ///
    /// let external = cfg.embed_source(origin, "https://x.org/a.pdf", true, true);
    /// assert_eq!(external, EmbedSource::Direct("https://x.org/a.pdf".into()));
    /// ```
    pub fn embed_source(&self, origin: &str, url: &str, mobile: bool, failed: bool) -> EmbedSource {
        match DocumentFormat::of(url) {
            DocumentFormat::Word => self.doc_proxy(origin, url),
            _ if is_external(url) => EmbedSource::Direct(url.to_owned()),
            DocumentFormat::Markdown => EmbedSource::Direct(url.to_owned()),
            DocumentFormat::Pdf if mobile || failed => self.pdf_proxy(origin, url),
            DocumentFormat::Pdf => EmbedSource::Direct(url.to_owned()),
        }
    }
}

/// The state of one embed attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmbedState {
    Loading(EmbedSource),
    /// Every source failed; show the failed-to-load panel.
    Failed,
}

/// Tracks an embedded frame through at most one fallback.
///
/// The first failure switches to the proxy source if it differs from the
/// current one; any later failure is final.
///
/// ```rust
/// use guidebook::viewer::{EmbedAttempt, EmbedState, ViewerConfig};
///
/// let cfg = ViewerConfig::default();
/// let mut attempt = EmbedAttempt::start(&cfg, "https://s.io", "/a.pdf", false);
/// assert!(!attempt.source().unwrap().is_proxy());
///
/// attempt.fail();
/// assert!(attempt.source().unwrap().is_proxy());
///
/// attempt.fail();
/// assert_eq!(attempt.state(), &EmbedState::Failed);
/// ```
#[derive(Debug, Clone)]
pub struct EmbedAttempt {
    state: EmbedState,
    fallback: Option<EmbedSource>,
}

impl EmbedAttempt {
    pub fn start(config: &ViewerConfig, origin: &str, url: &str, mobile: bool) -> Self {
        let primary = config.embed_source(origin, url, mobile, false);
        let fallback = Some(config.embed_source(origin, url, mobile, true))
            .filter(|fallback| *fallback != primary);

        EmbedAttempt { state: EmbedState::Loading(primary), fallback }
    }

    pub fn state(&self) -> &EmbedState {
        &self.state
    }

    pub fn source(&self) -> Option<&EmbedSource> {
        match &self.state {
            EmbedState::Loading(source) => Some(source),
            EmbedState::Failed => None,
        }
    }

    /// Records a load failure and returns the new state.
    pub fn fail(&mut self) -> &EmbedState {
        self.state = match self.fallback.take() {
            Some(fallback) if self.state != EmbedState::Failed => EmbedState::Loading(fallback),
            _ => EmbedState::Failed,
        };

        &self.state
    }

    /// Every source the attempt tries, in order, failing each in turn.
    ///
    /// ```rust
    /// use guidebook::viewer::{EmbedAttempt, ViewerConfig};
    ///
    /// let cfg = ViewerConfig::default();
    /// let sources = EmbedAttempt::start(&cfg, "https://s.io", "/a.pdf", false).into_sources();
    /// assert_eq!(sources.len(), 2);
    /// assert!(sources[1].is_proxy());
    /// ```
    pub fn into_sources(mut self) -> Vec<EmbedSource> {
        let mut sources = vec![];
        while let EmbedState::Loading(source) = &self.state {
            sources.push(source.clone());
            self.fail();
        }

        sources
    }
}

/// A byte count parsed from a human-readable size such as `"163 MB"`.
/// Units are binary: `1 KB = 1024 B`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FileSize(u64);

const UNITS: &[(&str, u32)] = &[("B", 0), ("KB", 1), ("MB", 2), ("GB", 3), ("TB", 4)];

impl FileSize {
    pub const fn bytes(bytes: u64) -> Self {
        FileSize(bytes)
    }

    pub const fn mb(mb: u64) -> Self {
        FileSize(mb * 1024 * 1024)
    }

    pub fn as_bytes(&self) -> u64 {
        self.0
    }
}

impl FromStr for FileSize {
    type Err = Error;

    /// ```rust
    /// use guidebook::viewer::FileSize;
    ///
    /// assert_eq!("800 KB".parse::<FileSize>().unwrap().as_bytes(), 800 * 1024);
    /// assert_eq!("1.5gb".parse::<FileSize>().unwrap().as_bytes(), 3 * 512 * 1024 * 1024);
    /// assert_eq!(" 163 MB ".parse::<FileSize>().unwrap(), FileSize::mb(163));
    /// assert_eq!("12".parse::<FileSize>().unwrap().as_bytes(), 12);
    /// assert_eq!("2M".parse::<FileSize>().unwrap(), FileSize::mb(2));
    /// assert!("about 3 MB".parse::<FileSize>().is_err());
    /// assert!("-1 MB".parse::<FileSize>().is_err());
    /// assert!("".parse::<FileSize>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let split = s.find(|c: char| !(c.is_ascii_digit() || c == '.')).unwrap_or(s.len());
        let (number, unit) = (&s[..split], s[split..].trim());

        let value: f64 = number.parse().map_err(|_| error! {
            "file size has no leading number",
            "file size" => s,
        })?;

        let unit = unit.to_ascii_uppercase();
        let unit = unit.strip_suffix("IB").map(|u| format!("{u}B")).unwrap_or(unit);
        let exponent = UNITS.iter()
            .find(|(name, _)| *name == unit || (unit.len() == 1 && name.starts_with(&unit)))
            .map(|(_, exp)| *exp)
            .or_else(|| unit.is_empty().then_some(0))
            .ok_or_else(|| error! {
                "unknown file size unit",
                "file size" => s,
                "known units" => "B, KB, MB, GB, TB",
            })?;

        let bytes = value * 1024f64.powi(exponent as i32);
        if !bytes.is_finite() || bytes > u64::MAX as f64 {
            return err!("file size is out of range", "file size" => s);
        }

        Ok(FileSize(bytes.round() as u64))
    }
}

impl<'de> Deserialize<'de> for FileSize {
    fn deserialize<D: Deserializer<'de>>(de: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Bytes(u64),
            Text(String),
        }

        match Repr::deserialize(de)? {
            Repr::Bytes(bytes) => Ok(FileSize(bytes)),
            Repr::Text(text) => text.parse().map_err(|e: Error| D::Error::custom(e.message())),
        }
    }
}

impl fmt::Display for FileSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (name, exp) = UNITS.iter()
            .rev()
            .find(|(_, exp)| self.0 >= 1024u64.pow(*exp))
            .copied()
            .unwrap_or(("B", 0));

        let value = self.0 as f64 / 1024f64.powi(exp as i32);
        match value.fract() == 0.0 {
            true => write!(f, "{value} {name}"),
            false => write!(f, "{value:.1} {name}"),
        }
    }
}

impl Serialize for FileSize {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Whether a document may be embedded right away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "guard", rename_all = "snake_case")]
pub enum Guard {
    Proceed,
    /// The declared size exceeds the threshold; ask before embedding.
    Confirm { size: FileSize, threshold: FileSize },
}

/// The reader's answer to a [`Guard::Confirm`] prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Choice {
    DownloadInstead,
    ContinueInline,
}

impl Choice {
    pub const ALL: [Choice; 2] = [Choice::DownloadInstead, Choice::ContinueInline];
}

/// What the viewer does next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Next {
    Embed,
    Download,
    /// Still waiting for the reader to choose.
    Prompt,
}

impl Guard {
    /// Checks a declared size against `threshold`. Sizes that don't parse
    /// never trigger the confirmation step.
    ///
    /// ```rust
    /// use guidebook::viewer::{FileSize, Guard};
    ///
    /// let limit = FileSize::mb(50);
    /// assert!(matches!(Guard::check("163 MB", limit), Guard::Confirm { .. }));
    /// assert_eq!(Guard::check("50 MB", limit), Guard::Proceed);
    /// assert_eq!(Guard::check("800 KB", limit), Guard::Proceed);
    /// assert_eq!(Guard::check("unknown", limit), Guard::Proceed);
    /// ```
    pub fn check(declared: &str, threshold: FileSize) -> Guard {
        match declared.parse::<FileSize>() {
            Ok(size) if size > threshold => Guard::Confirm { size, threshold },
            Ok(_) => Guard::Proceed,
            Err(e) => {
                tracing::debug!(declared, "file size not understood, skipping guard: {}", e.message());
                Guard::Proceed
            }
        }
    }

    pub fn needs_confirmation(&self) -> bool {
        matches!(self, Guard::Confirm { .. })
    }

    /// Resolves the guard with the reader's choice, if one was made.
    pub fn next(&self, choice: Option<Choice>) -> Next {
        match (self, choice) {
            (Guard::Proceed, _) => Next::Embed,
            (Guard::Confirm { .. }, None) => Next::Prompt,
            (Guard::Confirm { .. }, Some(Choice::ContinueInline)) => Next::Embed,
            (Guard::Confirm { .. }, Some(Choice::DownloadInstead)) => Next::Download,
        }
    }
}

/// Everything a resource page needs to show one document. The page script
/// walks `desktop` or `mobile` in order, moving on when a source fails, and
/// answers the guard prompt from `choices`.
#[derive(Debug, Clone, Serialize)]
pub struct ViewerPlan {
    pub format: DocumentFormat,
    /// The URL used for download and open-in-new-window links.
    pub download_url: String,
    /// Sources tried by desktop clients.
    pub desktop: Vec<EmbedSource>,
    /// Sources tried by mobile clients.
    pub mobile: Vec<EmbedSource>,
    pub guard: Guard,
    /// What happens before the reader has chosen anything.
    pub open: Next,
    pub choices: BTreeMap<Choice, Next>,
}

impl ViewerPlan {
    /// Plans the viewer for a document at `url` (already carrying the site's
    /// base path) with the declared `file_size`. An empty `origin` defers
    /// proxy targets to the browser.
    pub fn new(config: &ViewerConfig, origin: &str, url: &str, file_size: &str) -> Self {
        let guard = Guard::check(file_size, config.large_file_threshold);
        ViewerPlan {
            format: DocumentFormat::of(url),
            download_url: url.to_owned(),
            desktop: EmbedAttempt::start(config, origin, url, false).into_sources(),
            mobile: EmbedAttempt::start(config, origin, url, true).into_sources(),
            guard,
            open: guard.next(None),
            choices: Choice::ALL.into_iter().map(|c| (c, guard.next(Some(c)))).collect(),
        }
    }

    /// The sources a client tries, in order.
    pub fn sources(&self, mobile: bool) -> &[EmbedSource] {
        match mobile {
            true => &self.mobile,
            false => &self.desktop,
        }
    }

    /// The source a client starts with.
    pub fn initial(&self, mobile: bool) -> Option<&EmbedSource> {
        self.sources(mobile).first()
    }
}
