use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use guidebook::data::{Format, Toml};
use guidebook::error::Result;
use guidebook::fstree::FsTree;
use guidebook::markdown::AliasMap;
use guidebook::templating::{Engine, EngineInit};
use guidebook::url::UrlBuf;
use guidebook::viewer::ViewerConfig;
use guidebook::watermark::Watermark;

use crate::render::DEFAULT_TEMPLATES;

#[derive(Debug)]
pub struct Config {
    pub engine: Arc<dyn Engine>,
    pub settings: Settings,
}

/// The site's `config.toml`. Unknown keys are kept in `globals` and reach
/// templates through `G` with everything else.
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub title: String,
    pub description: String,
    pub author: String,
    pub base_path: UrlBuf,
    pub base_url: String,
    pub protect: bool,
    pub labels: Labels,
    pub watermark: Watermark,
    pub viewer: ViewerConfig,
    pub aliases: AliasMap,
    #[serde(flatten)]
    pub globals: FxHashMap<String, toml::Value>,
}

/// Display labels for the catch-all filter choices.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Labels {
    /// The "everything" category choice.
    pub all: String,
    /// Bucket for resources without a sub-category.
    pub other: String,
}

impl Default for Labels {
    fn default() -> Self {
        Labels { all: "All".into(), other: "Other".into() }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            title: "Guidewords".into(),
            description: String::new(),
            author: String::new(),
            base_path: UrlBuf::from("/"),
            base_url: String::new(),
            protect: false,
            labels: Labels::default(),
            watermark: Watermark::default(),
            viewer: ViewerConfig::default(),
            aliases: AliasMap::default(),
            globals: FxHashMap::default(),
        }
    }
}

impl Settings {
    /// The public URL of the site root: `base_url` followed by `base_path`.
    pub fn origin(&self) -> String {
        let mut url = UrlBuf::from(self.base_path.as_str());
        url.prepend(self.base_url.trim_end_matches('/'));
        url.as_str().trim_end_matches('/').to_owned()
    }

    /// `base_url` alone, which is what document URLs are made absolute on:
    /// they already carry the base path. Empty when no public URL is set,
    /// in which case the page script uses its own origin.
    pub fn host(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Joins a site-local `url` under the base path.
    pub fn url(&self, url: &str) -> String {
        guidebook::url::with_base_path(self.base_path.as_str(), url)
    }
}

impl Config {
    pub fn discover<E: EngineInit>(tree: Arc<FsTree>) -> Result<Self> {
        let mut settings: Settings = match tree.get_file(None, crate::CONFIG_FILE) {
            Some(entry) => Toml::read(entry)?,
            None => {
                tracing::info!("no {} found, using default settings", crate::CONFIG_FILE);
                Settings::default()
            }
        };

        settings.base_path.make_absolute();
        if settings.base_url.trim().is_empty() {
            tracing::info!("no base_url set, document viewers resolve against the page's origin");
        }

        settings.aliases.insert("".into(), settings.base_path.to_string());
        let templates_entry = crate::util::dircheck(&tree, None, crate::TEMPLATE_DIR, false)?;
        let engine = Arc::new(E::init(tree.clone(), templates_entry, DEFAULT_TEMPLATES, &settings)?);
        Ok(Config { engine, settings })
    }

    pub fn labels(&self) -> &Labels {
        &self.settings.labels
    }
}

#[cfg(test)]
mod tests {
    use guidebook::data::{Format, Toml};

    use super::Settings;

    #[test]
    fn unknown_keys_become_globals() {
        let settings: Settings = Toml::from_str(r#"
            title = "华东导游词"
            base_path = "/GuideWords.github.io"
            base_url = "https://holding-hands.github.io/"
            icp = "浙ICP备"

            [labels]
            all = "全部"
        "#).unwrap();

        assert_eq!(settings.title, "华东导游词");
        assert_eq!(settings.labels.all, "全部");
        assert_eq!(settings.labels.other, "Other");
        assert_eq!(settings.globals.get("icp").and_then(|v| v.as_str()), Some("浙ICP备"));
        assert_eq!(settings.origin(), "https://holding-hands.github.io/GuideWords.github.io");
        assert_eq!(settings.host(), "https://holding-hands.github.io");
        assert_eq!(settings.url("/resources/"), "/GuideWords.github.io/resources/");
    }

    #[test]
    fn missing_settings_use_defaults() {
        let settings: Settings = Toml::from_str("").unwrap();
        assert!(!settings.protect);
        assert!(settings.watermark.enabled);
        assert_eq!(settings.viewer.large_file_threshold.to_string(), "50 MB");
        assert_eq!(settings.url("guides/x/"), "/guides/x/");
    }
}
