use std::fmt::Display;
use std::path::{Path, PathBuf};

use dashmap::mapref::entry::Entry as MapEntry;
use dashmap::DashMap;
use rayon::prelude::*;

use crate::data::Sink;
use crate::error::{Chainable, Result};
use crate::fstree::Entry;
use crate::site::{Page, Site};

/// A page written by [`render_site`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub page: Page,
    pub output: PathBuf,
    pub bytes: usize,
}

/// Output paths claimed so far in a build, with what claimed them.
#[derive(Debug, Default)]
pub struct Claims {
    map: DashMap<PathBuf, String>,
}

impl Claims {
    /// Claims `path` for `owner`. Fails if something already claimed it.
    pub fn claim<P: AsRef<Path>, O: Display>(&self, path: P, owner: O) -> Result<()> {
        let path = path.as_ref();
        match self.map.entry(path.to_path_buf()) {
            MapEntry::Vacant(slot) => {
                slot.insert(owner.to_string());
                Ok(())
            }
            MapEntry::Occupied(existing) => err! {
                "output path collision",
                "output path" => path.display(),
                "first writer" => existing.get(),
                "second writer" => owner,
            },
        }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

pub trait Renderer: Sync {
    /// The directory the site is exported into.
    fn output(&self) -> &Path;

    fn render_page(&self, site: &Site, page: &Page) -> Result<String>;

    /// Copies `asset` to `destination`, transforming it if needed.
    fn render_asset(&self, site: &Site, asset: &Entry, destination: &Path) -> Result<()>;

    #[inline(always)]
    fn render_site(&self, site: &Site) -> Result<Vec<Rendered>> {
        render_site(self, site)
    }
}

/// Renders every page of `site` and copies its assets, in parallel. Pages
/// are returned in [`Site::pages`] order.
pub fn render_site<R>(renderer: &R, site: &Site) -> Result<Vec<Rendered>>
    where R: Renderer + ?Sized
{
    let pages = site.pages();
    let routes = site.routes();
    let claims = Claims::default();
    let records = boxcar::Vec::new();

    let (pages_result, assets_result) = rayon::join(
        || pages.par_iter().enumerate().try_for_each(|(i, page)| {
            let path = routes.output_path(page);
            claims.claim(&path, page)?;

            let html = renderer.render_page(site, page)
                .chain_with(|| error!("failed to render page", "route" => page))?;

            let output = renderer.output().join(&path);
            output.write(&html)?;
            records.push((i, Rendered { page: page.clone(), output, bytes: html.len() }));
            Ok(())
        }),
        || site.assets.par_iter().try_for_each(|id| {
            let entry = &site.tree[*id];
            let root = site.asset_root.map(|root| &site.tree[root]);
            let relative = root.and_then(|root| entry.path_relative_to(root))
                .unwrap_or_else(|| Path::new(&entry.file_name));

            claims.claim(relative, relative.display())?;
            renderer.render_asset(site, entry, &renderer.output().join(relative))
                .chain_with(|| error! {
                    "failed to copy asset",
                    "source path" => entry.path.display(),
                })
        }),
    );

    match (pages_result, assets_result) {
        (Ok(()), Ok(())) => {},
        (Ok(_), Err(e)) | (Err(e), Ok(_)) => return Err(e),
        (Err(e1), Err(e2)) => return Err(e1.chain(e2)),
    }

    let mut rendered: Vec<(usize, Rendered)> = (0..records.count())
        .filter_map(|i| records.get(i).cloned())
        .collect();

    rendered.sort_by_key(|(i, _)| *i);
    tracing::debug!(pages = rendered.len(), files = claims.len(), "site rendered");
    Ok(rendered.into_iter().map(|(_, r)| r).collect())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::site::tests::site;

    struct Echo {
        output: PathBuf,
        copies: AtomicUsize,
    }

    impl Renderer for Echo {
        fn output(&self) -> &Path {
            &self.output
        }

        fn render_page(&self, _: &Site, page: &Page) -> Result<String> {
            Ok(format!("<h1>{page}</h1>"))
        }

        fn render_asset(&self, _: &Site, _: &Entry, _: &Path) -> Result<()> {
            self.copies.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }
    }

    #[test]
    fn pages_are_written_in_order() {
        let output = std::env::temp_dir().join(format!("guidebook-render-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&output);
        let echo = Echo { output: output.clone(), copies: AtomicUsize::new(0) };

        let site = site();
        let rendered = echo.render_site(&site).unwrap();
        let expected: Vec<_> = site.pages();
        assert_eq!(rendered.iter().map(|r| r.page.clone()).collect::<Vec<_>>(), expected);
        assert_eq!(echo.copies.load(Ordering::Relaxed), 0);

        let debug = std::fs::read_to_string(output.join("debug/index.html")).unwrap();
        assert_eq!(debug, "<h1>/debug/</h1>");
        std::fs::remove_dir_all(&output).unwrap();
    }

    #[test]
    fn similar_labels_get_their_own_pages() {
        let output = std::env::temp_dir().join(format!("guidebook-similar-{}", std::process::id()));
        let echo = Echo { output: output.clone(), copies: AtomicUsize::new(0) };

        let mut site = site();
        let mut guides = site.guides.as_slice().to_vec();
        guides[1].category = "苏州".into();
        guides[2].category = "蘇州".into();
        site.guides = crate::catalog::Catalog::new(guides).unwrap();

        let rendered = echo.render_site(&site).unwrap();
        let outputs: Vec<_> = rendered.iter()
            .filter(|r| matches!(r.page, Page::Category(_)))
            .map(|r| r.output.strip_prefix(&output).unwrap().to_path_buf())
            .collect();

        assert_eq!(outputs, [
            PathBuf::from("category/gardens/index.html"),
            PathBuf::from("category/su-zhou/index.html"),
            PathBuf::from("category/su-zhou-2/index.html"),
        ]);

        std::fs::remove_dir_all(&output).unwrap();
    }

    #[test]
    fn claims_report_both_writers() {
        let claims = Claims::default();
        claims.claim("a/index.html", "/a/").unwrap();
        let e = claims.claim("a/index.html", "/A/").unwrap_err();
        let s = e.to_string();
        assert!(s.contains("first writer: /a/"));
        assert!(s.contains("second writer: /A/"));
    }
}
