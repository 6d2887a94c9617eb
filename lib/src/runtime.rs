//! The data the exported pages' script runs on.
//!
//! Browser behavior is decided here and shipped as tables: the script only
//! looks things up in them. [`Runtime::script`] renders the tables as a
//! `GUIDEBOOK` global that precedes the script itself.

use serde::Serialize;

use crate::error::Result;
use crate::prefs;
use crate::speech;
use crate::viewer::{EMBED_TIMEOUT_MS, MARKDOWN_RENDERER_SRC, MOBILE_MARKERS};
use crate::watermark::{Layer, Watermark};

/// Viewer settings that don't vary per document.
#[derive(Debug, Clone, Serialize)]
pub struct Viewer {
    pub mobile_markers: &'static [&'static str],
    pub timeout_ms: u64,
    pub markdown_src: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct Runtime {
    pub prefs: prefs::Table,
    pub speech: speech::Machine,
    pub viewer: Viewer,
    pub watermark: Layer,
}

/// Name of the global the script reads.
pub const GLOBAL: &str = "GUIDEBOOK";

impl Runtime {
    pub fn new(watermark: &Watermark) -> Runtime {
        Runtime {
            prefs: prefs::Table::new(),
            speech: speech::Machine::new(),
            viewer: Viewer {
                mobile_markers: MOBILE_MARKERS,
                timeout_ms: EMBED_TIMEOUT_MS,
                markdown_src: MARKDOWN_RENDERER_SRC,
            },
            watermark: watermark.layer(),
        }
    }

    /// `var GUIDEBOOK = {...};`, followed by a newline.
    ///
    /// ```rust
    /// use guidebook::runtime::Runtime;
    /// use guidebook::watermark::Watermark;
    ///
    /// let js = Runtime::new(&Watermark::default()).script().unwrap();
    /// assert!(js.starts_with("var GUIDEBOOK = {"));
    /// assert!(js.ends_with("};\n"));
    /// ```
    pub fn script(&self) -> Result<String> {
        let json = serde_json::to_string(self)?;
        Ok(format!("var {GLOBAL} = {json};\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_section_is_present() {
        let watermark = Watermark { text: "</script>".into(), ..Default::default() };
        let value = serde_json::to_value(Runtime::new(&watermark)).unwrap();
        for section in ["prefs", "speech", "viewer", "watermark"] {
            assert!(value.get(section).is_some(), "{section}");
        }

        assert_eq!(value["viewer"]["timeout_ms"], 20_000);
        assert_eq!(value["viewer"]["mobile_markers"][0], "iphone");
        assert_eq!(value["watermark"]["text"], "</script>");
        assert_eq!(value["speech"]["initial"], "idle");
    }
}
