use once_cell::unsync::OnceCell;
use serde::Deserialize;

use guidebook::catalog::{Catalog, Guide};
use guidebook::data::{Format, Source, Toml};
use guidebook::error::{Chainable, Result};
use guidebook::markdown::{self, *};
use guidebook::rayon::prelude::*;
use guidebook::util::escape_html;

use crate::GUIDES_FILE;
use crate::discover::Guidewords;

/// Characters of plain text kept as a guide's fallback description.
const SNIPPET_LENGTH: usize = 160;

/// A `[[guide]]` row of `guides.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct GuideSource {
    pub id: String,
    /// Markdown file, relative to the content directory.
    pub file: String,
    pub title: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct GuideTable {
    #[serde(default)]
    guide: Vec<GuideSource>,
}

/// Fields a guide's front matter may fill in.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GuideMeta {
    pub title: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
}

/// A markdown document after the build pipeline.
#[derive(Debug, Default)]
pub struct Compiled {
    pub meta: GuideMeta,
    pub content: String,
    pub toc: Vec<Entry>,
    pub snippet: Option<String>,
}

/// Runs `source` through the guide pipeline.
pub fn compile_markdown<S: Source>(source: S, aliases: &AliasMap) -> Result<Compiled> {
    let meta: OnceCell<GuideMeta> = OnceCell::new();
    let html: OnceCell<String> = OnceCell::new();
    let toc: OnceCell<Vec<Entry>> = OnceCell::new();
    let snippet: OnceCell<String> = OnceCell::new();

    Markdown::from(source)
        .plugin(FrontMatter::<GuideMeta, _, _>::new(Toml, &meta))
        .plugin(Indent)
        .plugin(HardBreaks)
        .plugin(Alias::new(aliases))
        .plugin(AutoHeading::default())
        .plugin(HeadingAnchor)
        .plugin(TableOfContents::new(&toc))
        .plugin(Snippet::new(&snippet, SNIPPET_LENGTH))
        .plugin(markdown::Renderer::new(&html))
        .run()
        .chain_with(|| "markdown rendering failed")?;

    Ok(Compiled {
        meta: meta.into_inner().unwrap_or_default(),
        content: html.into_inner().unwrap_or_default(),
        toc: toc.into_inner().unwrap_or_default(),
        snippet: snippet.into_inner().filter(|s| !s.trim().is_empty()),
    })
}

fn present(value: &Option<String>) -> Option<String> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty()).map(String::from)
}

fn file_stem(file: &str) -> String {
    std::path::Path::new(file)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.to_owned())
}

impl Guidewords {
    /// Reads the guide table. A site without one has no guides.
    pub fn guide_sources(&self) -> Result<Vec<GuideSource>> {
        match self.tree.get_file(None, GUIDES_FILE) {
            Some(entry) => Ok(Toml::read::<_, GuideTable>(entry)?.guide),
            None => {
                tracing::info!("no {GUIDES_FILE} found, the site has no guides");
                Ok(vec![])
            }
        }
    }

    /// Compiles every guide in parallel, keeping table order.
    pub fn compile_guides(&self) -> Result<Catalog<Guide>> {
        let sources = self.guide_sources()?;
        let guides: Vec<Guide> = sources.par_iter()
            .map(|source| self.compile_guide(source))
            .collect();

        Catalog::new(guides)
    }

    /// Compiles one guide. Problems with the markdown source are logged and
    /// replaced by a placeholder paragraph so the build can go on.
    pub fn compile_guide(&self, source: &GuideSource) -> Guide {
        let entry = self.content_root.and_then(|root| self.tree.get_file(root, &source.file));
        let compiled = match entry {
            Some(entry) => compile_markdown(entry, &self.config.settings.aliases)
                .unwrap_or_else(|e| {
                    tracing::error!(id = %source.id, file = %source.file, "error processing guide: {e}");
                    Compiled {
                        content: format!("<p>error processing {}</p>", escape_html(&source.file)),
                        ..Compiled::default()
                    }
                }),
            None => {
                tracing::warn!(id = %source.id, file = %source.file, "guide source not found");
                Compiled {
                    content: format!("<p>file {} not found</p>", escape_html(&source.file)),
                    ..Compiled::default()
                }
            }
        };

        let meta = &compiled.meta;
        Guide {
            id: source.id.clone(),
            title: present(&source.title)
                .or_else(|| present(&meta.title))
                .unwrap_or_else(|| file_stem(&source.file)),
            category: present(&source.category)
                .or_else(|| present(&meta.category))
                .unwrap_or_else(|| self.config.labels().other.clone()),
            location: present(&source.location).or_else(|| present(&meta.location)),
            description: present(&source.description)
                .or_else(|| present(&meta.description))
                .or(compiled.snippet),
            content: compiled.content,
            toc: compiled.toc,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_collects_meta_toc_and_snippet() {
        let source = "+++\ntitle = \"雷峰塔\"\nlocation = \"杭州\"\n+++\n\n# 雷峰塔\n\n## 历史\n\n雷峰塔位于西湖南岸。\n[地图](@/resources/)\n";
        let mut aliases = AliasMap::default();
        aliases.insert("".into(), "/GuideWords.github.io".into());

        let compiled = compile_markdown(source, &aliases).unwrap();
        assert_eq!(compiled.meta.title.as_deref(), Some("雷峰塔"));
        assert_eq!(compiled.meta.location.as_deref(), Some("杭州"));
        assert_eq!(compiled.toc.len(), 1);
        assert_eq!(compiled.toc[0].children.len(), 1);
        assert!(compiled.content.contains("href=\"/GuideWords.github.io/resources/\""));
        assert!(compiled.snippet.unwrap().contains("雷峰塔位于西湖南岸"));
    }

    #[test]
    fn blank_table_fields_are_missing() {
        assert_eq!(present(&Some("  ".into())), None);
        assert_eq!(present(&Some(" 杭州 ".into())), Some("杭州".into()));
        assert_eq!(file_stem("杭州景点/城隍阁.md"), "城隍阁");
    }
}
