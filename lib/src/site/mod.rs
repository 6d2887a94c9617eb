mod page;
mod renderer;
mod routes;

use std::sync::Arc;

use chrono::NaiveDate;
use derive_more::Debug;
use once_cell::sync::OnceCell;

use crate::catalog::{categories, CategoryPath, Catalog, Guide, Resource, Selection};
use crate::fstree::{EntryId, FsTree};
use crate::sitemap::Sitemap;
use crate::url::UrlBuf;

pub use page::*;
pub use renderer::*;
pub use routes::Routes;

/// Everything a build exports: the compiled catalogs plus the static assets
/// that are copied through unchanged.
#[derive(Debug)]
pub struct Site {
    #[debug(ignore)]
    pub tree: Arc<FsTree>,
    pub guides: Catalog<Guide>,
    pub resources: Catalog<Resource>,
    pub asset_root: Option<EntryId>,
    pub assets: Vec<EntryId>,
    #[debug(ignore)]
    routes: OnceCell<Routes>,
}

impl Site {
    pub fn new(tree: Arc<FsTree>) -> Site {
        Site {
            tree,
            guides: Catalog::empty(),
            resources: Catalog::empty(),
            asset_root: None,
            assets: vec![],
            routes: OnceCell::new(),
        }
    }

    /// Every page the site exports, in a stable order.
    pub fn pages(&self) -> Vec<Page> {
        let mut pages = vec![Page::Home];
        pages.extend(categories(self.guides.as_slice()).into_iter().filter_map(|c| match c {
            Selection::Only(label) => Some(Page::Category(label)),
            Selection::All => None,
        }));

        pages.extend(self.guides.iter().map(|g| Page::Guide(g.id.clone())));
        pages.push(Page::Resources(CategoryPath::default()));

        let resources = self.resources.as_slice();
        for top in CategoryPath::top_options(resources) {
            let mut path = CategoryPath::default();
            path.select_top(Selection::only(top));
            pages.push(Page::Resources(path.clone()));

            for sub in path.sub_options(resources) {
                let mut path = path.clone();
                path.select_sub(Selection::only(sub));
                pages.push(Page::Resources(path.clone()));

                for third in path.third_options(resources) {
                    let mut path = path.clone();
                    path.select_third(Selection::only(third));
                    pages.push(Page::Resources(path));
                }
            }
        }

        pages.extend(self.resources.iter().map(|r| Page::Resource(r.id.clone())));
        pages.push(Page::Debug);
        pages
    }

    /// The route table for [`Site::pages`]. It is built on first use, so the
    /// catalogs must be in place by then.
    pub fn routes(&self) -> &Routes {
        self.routes.get_or_init(|| Routes::new(&self.pages()))
    }

    pub fn route(&self, page: &Page) -> UrlBuf {
        self.routes().route(page)
    }

    /// The sitemap: the fixed pages first, then every resource and guide.
    /// `origin` is the site's public URL including its base path.
    pub fn sitemap(&self, origin: &str, lastmod: NaiveDate) -> Sitemap {
        let mut sitemap = Sitemap::new(origin, lastmod);
        let fixed = [Page::Home, Page::Resources(CategoryPath::default()), Page::Debug];
        let resources = self.resources.iter().map(|r| Page::Resource(r.id.clone()));
        let guides = self.guides.iter().map(|g| Page::Guide(g.id.clone()));
        for page in fixed.into_iter().chain(resources).chain(guides) {
            if let Some((freq, priority)) = page.sitemap() {
                sitemap.push(self.route(&page).as_str(), freq, priority);
            }
        }

        sitemap
    }
}

impl Site {
    fn vis_line(siblings: &[bool], prefix: &str, label: impl std::fmt::Display) {
        for (j, sibling) in siblings.iter().enumerate() {
            match (sibling, j == siblings.len() - 1) {
                (false, false) => print!("    "),
                (false, true) => print!("└── "),
                (true, false) => print!("│   "),
                (true, true) => print!("├── "),
            }
        }

        println!("{prefix}{label}");
    }

    /// Prints the site as a tree: guides by category, resources by
    /// category, then assets.
    pub fn visualize(&self) {
        let root = self.tree.root();
        Self::vis_line(&[], "🗂 ", root.path.display());

        let has_assets = !self.assets.is_empty();
        let has_resources = !self.resources.is_empty();

        Self::vis_line(&[has_resources || has_assets], "📚 ", "guides");
        let cats = categories(self.guides.as_slice());
        let labels: Vec<_> = cats.iter().filter(|c| !c.is_all()).collect();
        for (i, cat) in labels.iter().enumerate() {
            let siblings = [has_resources || has_assets, i < labels.len() - 1];
            Self::vis_line(&siblings, "", cat);

            let guides: Vec<_> = self.guides.iter().filter(|g| cat.accepts(Some(g.category.as_str()))).collect();
            for (j, guide) in guides.iter().enumerate() {
                let siblings = [siblings[0], siblings[1], j < guides.len() - 1];
                Self::vis_line(&siblings, "📝 ", format_args!("{} {}", guide.id, guide.title));
            }
        }

        if has_resources {
            Self::vis_line(&[has_assets], "📎 ", "resources");
            for (i, resource) in self.resources.iter().enumerate() {
                let siblings = [has_assets, i < self.resources.len() - 1];
                Self::vis_line(&siblings, "📄 ", format_args!("{} [{}]", resource.id, resource.category));
            }
        }

        if let (true, Some(asset_root)) = (has_assets, self.asset_root) {
            let asset_root = &self.tree[asset_root];
            Self::vis_line(&[false], "🖼 ", "assets");
            for (i, id) in self.assets.iter().enumerate() {
                let entry = &self.tree[*id];
                let path = entry.path_relative_to(asset_root).unwrap_or(&*entry.path);
                Self::vis_line(&[false, i < self.assets.len() - 1], "", path.display());
            }
        }
    }
}
