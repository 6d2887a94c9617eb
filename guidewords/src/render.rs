use std::fs;
use std::path::Path;

use serde::Serialize;
use serde_json::{json, Value};

use guidebook::{error, render_site, Renderer, Site};
use guidebook::catalog::{category_counts, CategoryPath, Guide, Layout, Resource, Selection};
use guidebook::data::Sink;
use guidebook::error::{Chainable, Result};
use guidebook::fstree::Entry;
use guidebook::prefs::{DEBUG_CONSOLE_KEY, THEME_KEY};
use guidebook::protection;
use guidebook::runtime::Runtime;
use guidebook::site::{Page, Rendered, Routes};
use guidebook::speech::{plain_text, PlaybackState};
use guidebook::templating::Defaults;
use guidebook::url::is_external;
use guidebook::viewer::{DocumentFormat, ViewerPlan};

use crate::compile::compile_markdown;
use crate::discover::Guidewords;

pub const DEFAULT_TEMPLATES: Defaults = &[
    ("base.html", include_str!("../templates/base.html")),
    ("index.html", include_str!("../templates/index.html")),
    ("category.html", include_str!("../templates/category.html")),
    ("guide.html", include_str!("../templates/guide.html")),
    ("resources.html", include_str!("../templates/resources.html")),
    ("resource.html", include_str!("../templates/resource.html")),
    ("debug.html", include_str!("../templates/debug.html")),
];

const SITE_JS: &str = include_str!("../assets/site.js");
const SITE_CSS: &str = include_str!("../assets/site.css");

/// A guide as listed on the home and category pages.
#[derive(Debug, Serialize)]
struct GuideCard<'a> {
    id: &'a str,
    title: &'a str,
    category: &'a str,
    location: Option<&'a str>,
    description: Option<&'a str>,
    url: String,
}

impl<'a> GuideCard<'a> {
    fn new(guide: &'a Guide, routes: &Routes) -> Self {
        GuideCard {
            id: &guide.id,
            title: &guide.title,
            category: &guide.category,
            location: guide.location.as_deref(),
            description: guide.description.as_deref(),
            url: routes.route(&Page::Guide(guide.id.clone())).to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ResourceCard<'a> {
    #[serde(flatten)]
    resource: &'a Resource,
    url: String,
    format: DocumentFormat,
}

impl<'a> ResourceCard<'a> {
    fn new(resource: &'a Resource, routes: &Routes) -> Self {
        ResourceCard {
            resource,
            url: routes.route(&Page::Resource(resource.id.clone())).to_string(),
            format: DocumentFormat::of(resource.document_url()),
        }
    }
}

/// One choice in a row of category filters.
#[derive(Debug, Serialize)]
struct FilterLink {
    label: String,
    url: String,
    active: bool,
    count: Option<usize>,
}

#[derive(Debug, Serialize)]
struct Section<'a> {
    label: String,
    count: usize,
    items: Vec<ResourceCard<'a>>,
}

fn cards<'a>(resources: impl IntoIterator<Item = &'a Resource>, routes: &Routes) -> Vec<ResourceCard<'a>> {
    resources.into_iter().map(|r| ResourceCard::new(r, routes)).collect()
}

fn guide_cards<'a>(guides: impl IntoIterator<Item = &'a Guide>, routes: &Routes) -> Vec<GuideCard<'a>> {
    guides.into_iter().map(|g| GuideCard::new(g, routes)).collect()
}

impl Guidewords {
    /// Context shared by every page.
    fn chrome(&self, site: &Site, page: &Page) -> Value {
        json!({
            "route": site.route(page).as_str(),
            "template": page.template(),
            "watermark": self.config.settings.watermark.render_html(),
            "year": chrono::Local::now().format("%Y").to_string(),
        })
    }

    fn category_links(&self, site: &Site, active: &Selection) -> Vec<FilterLink> {
        let all = &self.config.labels().all;
        category_counts(site.guides.as_slice()).into_iter()
            .map(|(selection, count)| FilterLink {
                label: selection.label(all).to_owned(),
                url: match &selection {
                    Selection::All => site.route(&Page::Home).to_string(),
                    Selection::Only(label) => site.route(&Page::Category(label.clone())).to_string(),
                },
                active: &selection == active,
                count: Some(count),
            })
            .collect()
    }

    fn home(&self, site: &Site) -> Value {
        json!({
            "categories": self.category_links(site, &Selection::All),
            "guides": guide_cards(site.guides.iter(), site.routes()),
        })
    }

    fn category(&self, site: &Site, label: &str) -> Value {
        let selection = Selection::only(label);
        let guides = guidebook::catalog::filter(site.guides.as_slice(), &selection, "");
        json!({
            "category": label,
            "categories": self.category_links(site, &selection),
            "guides": guide_cards(guides, site.routes()),
        })
    }

    fn guide(&self, site: &Site, id: &str) -> Result<Value> {
        let guide = site.guides.get(id).ok_or_else(|| error!("unknown guide", "id" => id))?;
        let related = guide_cards(
            site.guides.iter().filter(|g| g.category == guide.category && g.id != guide.id),
            site.routes(),
        );

        Ok(json!({
            "guide": guide,
            "category_url": site.route(&Page::Category(guide.category.clone())).as_str(),
            "categories": self.category_links(site, &Selection::only(guide.category.as_str())),
            "related": related,
            "speech": plain_text(&guide.content),
            "speech_label": PlaybackState::default().label(),
        }))
    }

    fn library(&self, site: &Site, path: &CategoryPath) -> Value {
        let labels = self.config.labels();
        let resources = site.resources.as_slice();
        let link = |to: CategoryPath, label: &str, active: bool| FilterLink {
            label: label.to_owned(),
            url: site.route(&Page::Resources(to)).to_string(),
            active,
            count: None,
        };

        let mut tops = vec![link(CategoryPath::default(), &labels.all, path.top.is_all())];
        for top in CategoryPath::top_options(resources) {
            let to = CategoryPath::new(Selection::only(top), Selection::All, Selection::All);
            tops.push(link(to, top, path.top == Selection::only(top)));
        }

        let mut subs = vec![];
        if !path.top.is_all() {
            let to = CategoryPath::new(path.top.clone(), Selection::All, Selection::All);
            subs.push(link(to, &labels.all, path.sub.is_all()));
            for sub in path.sub_options(resources) {
                let to = CategoryPath::new(path.top.clone(), Selection::only(sub), Selection::All);
                subs.push(link(to, sub, path.sub == Selection::only(sub)));
            }
        }

        let mut thirds = vec![];
        let third_options = path.third_options(resources);
        if !path.sub.is_all() && !third_options.is_empty() {
            let to = CategoryPath::new(path.top.clone(), path.sub.clone(), Selection::All);
            thirds.push(link(to, &labels.all, path.third.is_all()));
            for third in third_options {
                let to = CategoryPath::new(path.top.clone(), path.sub.clone(), Selection::only(third));
                thirds.push(link(to, third, path.third == Selection::only(third)));
            }
        }

        let layout = path.layout(resources, &labels.other);
        let total = layout.len();
        let (grouped, sections) = match layout {
            Layout::Flat(items) => (false, vec![Section {
                label: path.third.label(path.sub.label(path.top.label(&labels.all))).to_owned(),
                count: items.len(),
                items: cards(items, site.routes()),
            }]),
            Layout::Grouped(groups) => (true, groups.into_iter()
                .map(|group| Section { count: group.count(), label: group.label, items: cards(group.items, site.routes()) })
                .collect()),
        };

        json!({
            "path": path,
            "tops": tops,
            "subs": subs,
            "thirds": thirds,
            "grouped": grouped,
            "sections": sections,
            "total": total,
        })
    }

    /// Renders a markdown document stored under the assets directory.
    fn markdown_document(&self, resource: &Resource) -> Option<String> {
        let Some(entry) = self.asset(resource.document_url()) else {
            tracing::warn!(id = %resource.id, url = resource.document_url(), "markdown document not found");
            return None;
        };

        match compile_markdown(entry, &self.config.settings.aliases) {
            Ok(compiled) => Some(compiled.content),
            Err(e) => {
                tracing::error!(id = %resource.id, "error processing document: {e}");
                None
            }
        }
    }

    fn resource(&self, site: &Site, id: &str) -> Result<Value> {
        let resource = site.resources.get(id).ok_or_else(|| error!("unknown resource", "id" => id))?;
        let settings = &self.config.settings;
        let url = settings.url(resource.document_url());
        let plan = ViewerPlan::new(&settings.viewer, settings.host(), &url, &resource.file_size);
        let document = match plan.format {
            DocumentFormat::Markdown if !is_external(resource.document_url()) => self.markdown_document(resource),
            _ => None,
        };

        let top = CategoryPath::new(Selection::only(resource.category.as_str()), Selection::All, Selection::All);
        let mut trail = vec![(resource.category.as_str(), top.clone())];
        if let Some(sub) = resource.sub_category.as_deref() {
            let mut path = top;
            path.select_sub(Selection::only(sub));
            trail.push((sub, path));
        }

        let breadcrumbs: Vec<_> = trail.into_iter()
            .map(|(label, path)| json!({ "label": label, "url": site.route(&Page::Resources(path)).as_str() }))
            .collect();

        Ok(json!({
            "resource": resource,
            "plan_json": serde_json::to_string(&plan)?,
            "plan": plan,
            "document": document,
            "breadcrumbs": breadcrumbs,
        }))
    }

    fn debug(&self, site: &Site) -> Value {
        json!({
            "build": {
                "date": chrono::Local::now().format("%Y-%m-%d %H:%M").to_string(),
                "version": env!("CARGO_PKG_VERSION"),
                "guides": site.guides.len(),
                "resources": site.resources.len(),
                "assets": site.assets.len(),
            },
            "keys": [THEME_KEY, DEBUG_CONSOLE_KEY],
        })
    }

    /// Files written next to the pages: the sitemap, the catalogs as JSON,
    /// and the site's script and stylesheet.
    fn render_extras(&self, site: &Site) -> Result<()> {
        let settings = &self.config.settings;
        let lastmod = chrono::Local::now().date_naive();
        let sitemap = site.sitemap(&settings.origin(), lastmod);
        self.output.join("sitemap.xml").write(sitemap.to_xml())?;
        self.output.join("data/guides.json").write(serde_json::to_vec_pretty(&site.guides)?)?;
        self.output.join("data/resources.json").write(serde_json::to_vec_pretty(&site.resources)?)?;

        let mut script = Runtime::new(&settings.watermark).script()?;
        script.push_str(SITE_JS);
        if settings.protect {
            script.push('\n');
            script.push_str(&protection::script());
        }

        self.output.join("_static/site.js").write(script)?;
        self.output.join("_static/site.css").write(SITE_CSS)?;
        tracing::debug!(entries = sitemap.entries().len(), "wrote sitemap and static files");
        Ok(())
    }
}

impl Renderer for Guidewords {
    fn output(&self) -> &Path {
        &self.output
    }

    fn render_page(&self, site: &Site, page: &Page) -> Result<String> {
        let mut context = match page {
            Page::Home => self.home(site),
            Page::Category(label) => self.category(site, label),
            Page::Guide(id) => self.guide(site, id)?,
            Page::Resources(path) => self.library(site, path),
            Page::Resource(id) => self.resource(site, id)?,
            Page::Debug => self.debug(site),
        };

        if let Value::Object(map) = &mut context {
            map.insert("page".into(), self.chrome(site, page));
        }

        self.config.engine.render(page.template(), &context)
            .chain_with(|| error!("template failed", "template" => page.template()))
    }

    fn render_asset(&self, _: &Site, asset: &Entry, destination: &Path) -> Result<()> {
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::copy(&*asset.path, destination).chain_with(|| error! {
            "failed to copy asset",
            "source path" => asset.path.display(),
            "destination path" => destination.display(),
        })?;

        Ok(())
    }

    fn render_site(&self, site: &Site) -> Result<Vec<Rendered>> {
        let rendered = render_site(self, site)?;
        self.render_extras(site)?;
        Ok(rendered)
    }
}
