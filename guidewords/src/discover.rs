use std::sync::Arc;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use guidebook::Site;
use guidebook::catalog::{Catalog, Resource};
use guidebook::data::{Format, Json, Toml};
use guidebook::error::Result;
use guidebook::fstree::{EntryId, FsTree};
use guidebook::templating::EngineInit;

use crate::{ASSETS_DIR, CONTENT_DIR, RESOURCES_JSON, RESOURCES_TOML, TEMPLATE_DIR};
use crate::config::Config;
use crate::util::dircheck;

#[derive(Debug)]
pub struct Guidewords {
    pub tree: Arc<FsTree>,
    pub config: Config,
    pub output: PathBuf,
    pub content_root: Option<EntryId>,
    pub template_root: Option<EntryId>,
    pub asset_root: Option<EntryId>,
}

/// `resources.toml`: a list of `[[resource]]` tables.
#[derive(Debug, Default, Deserialize)]
struct ResourceTable {
    #[serde(default)]
    resource: Vec<Resource>,
}

impl Guidewords {
    pub fn new<E, I, O>(input: I, output: O) -> Result<Self>
        where I: AsRef<Path>, O: AsRef<Path>, E: EngineInit
    {
        let tree = Arc::new(FsTree::build(input)?);
        Ok(Guidewords {
            output: output.as_ref().to_path_buf(),
            content_root: dircheck(&tree, None, CONTENT_DIR, false)?,
            template_root: dircheck(&tree, None, TEMPLATE_DIR, false)?,
            asset_root: dircheck(&tree, None, ASSETS_DIR, false)?,
            config: Config::discover::<E>(tree.clone())?,
            tree,
        })
    }

    pub fn discover(&self) -> Result<Site> {
        let mut site = Site::new(self.tree.clone());
        site.asset_root = self.asset_root;
        site.assets = self.asset_root
            .map(|root| self.tree.files(root).map(|e| e.id).collect())
            .unwrap_or_default();

        site.guides = self.compile_guides()?;
        site.resources = self.load_resources()?;
        tracing::info!(
            guides = site.guides.len(),
            resources = site.resources.len(),
            assets = site.assets.len(),
            "discovered site"
        );

        Ok(site)
    }

    /// Reads `resources.toml`, or `resources.json` when there is no TOML
    /// catalog. A site without either has no resource library.
    pub fn load_resources(&self) -> Result<Catalog<Resource>> {
        let toml = self.tree.get_file(None, RESOURCES_TOML);
        let json = self.tree.get_file(None, RESOURCES_JSON);
        let records = match (toml, json) {
            (Some(entry), _) => Toml::read::<_, ResourceTable>(entry)?.resource,
            (None, Some(entry)) => Json::read(entry)?,
            (None, None) => vec![],
        };

        Catalog::new(records)
    }

    /// The asset entry a site-local URL such as `/pdfs/a.md` points to.
    pub fn asset(&self, url: &str) -> Option<&guidebook::fstree::Entry> {
        let root = self.asset_root?;
        let path = url.split(['?', '#']).next().unwrap_or(url);
        self.tree.get_file(root, path.trim_start_matches('/'))
    }
}
