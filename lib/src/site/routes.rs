use std::path::PathBuf;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::site::{output_path, segment, Page};
use crate::url::UrlBuf;

/// Path segments handed out to the labels and ids of one site.
///
/// Labels are free-form, so different ones can slug to the same segment
/// (`苏州` and `蘇州`, `Maps` and `maps`). The first label in page order keeps
/// the plain slug and later ones get `-2`, `-3`, and so on, within each
/// namespace. The `c` segment below `/resources/` is reserved for the
/// category hierarchy.
///
/// ```rust
/// use guidebook::site::{Page, Routes};
///
/// let pages = [Page::Category("苏州".into()), Page::Category("蘇州".into())];
/// let routes = Routes::new(&pages);
/// assert_eq!(routes.route(&pages[0]).as_str(), "/category/su-zhou/");
/// assert_eq!(routes.route(&pages[1]).as_str(), "/category/su-zhou-2/");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Routes {
    assigned: FxHashMap<(String, String), String>,
    taken: FxHashSet<(String, String)>,
}

impl Routes {
    pub fn new<'p, I>(pages: I) -> Routes
        where I: IntoIterator<Item = &'p Page>
    {
        let mut routes = Routes::default();
        routes.taken.insert(("resources".into(), "c".into()));
        for page in pages {
            page.route_with(|namespace, label| routes.assign(namespace, label));
        }

        routes
    }

    fn assign(&mut self, namespace: &str, label: &str) -> String {
        let key = (namespace.to_owned(), label.to_owned());
        if let Some(segment) = self.assigned.get(&key) {
            return segment.clone();
        }

        let base = segment(label);
        let mut candidate = base.clone();
        let mut n = 2;
        while self.taken.contains(&(key.0.clone(), candidate.clone())) {
            candidate = format!("{base}-{n}");
            n += 1;
        }

        if candidate != base {
            tracing::debug!(namespace, label, segment = %candidate, "slug taken, suffixing");
        }

        self.taken.insert((key.0.clone(), candidate.clone()));
        self.assigned.insert(key, candidate.clone());
        candidate
    }

    /// The page's route. Pages the table never saw get their preferred route.
    pub fn route(&self, page: &Page) -> UrlBuf {
        page.route_with(|namespace, label| {
            self.assigned.get(&(namespace.to_owned(), label.to_owned()))
                .cloned()
                .unwrap_or_else(|| segment(label))
        })
    }

    pub fn output_path(&self, page: &Page) -> PathBuf {
        output_path(&self.route(page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CategoryPath, Selection};

    fn routes_of(pages: &[Page]) -> Vec<String> {
        let routes = Routes::new(pages);
        pages.iter().map(|p| routes.route(p).to_string()).collect()
    }

    #[test]
    fn variant_characters_get_distinct_pages() {
        let pages = [Page::Category("苏州".into()), Page::Category("蘇州".into())];
        let routes = Routes::new(&pages);
        assert_ne!(routes.output_path(&pages[0]), routes.output_path(&pages[1]));
        assert_eq!(routes.output_path(&pages[1]), PathBuf::from("category/su-zhou-2/index.html"));
    }

    #[test]
    fn ids_and_case_variants_are_suffixed_in_order() {
        let pages = [
            Page::Guide("a b".into()),
            Page::Guide("a-b".into()),
            Page::Guide("a-b-2".into()),
            Page::Category("Maps".into()),
            Page::Category("maps".into()),
        ];

        assert_eq!(routes_of(&pages), [
            "/guides/a-b/",
            "/guides/a-b-2/",
            "/guides/a-b-2-2/",
            "/category/maps/",
            "/category/maps-2/",
        ]);
    }

    #[test]
    fn namespaces_are_independent() {
        let pages = [Page::Category("x".into()), Page::Guide("x".into()), Page::Resource("x".into())];
        assert_eq!(routes_of(&pages), ["/category/x/", "/guides/x/", "/resources/x/"]);
    }

    #[test]
    fn hierarchy_segment_is_reserved() {
        let top = CategoryPath::new(Selection::only("C"), Selection::All, Selection::All);
        let pages = [Page::Resources(top), Page::Resource("c".into())];
        assert_eq!(routes_of(&pages), ["/resources/c/c/", "/resources/c-2/"]);
    }

    #[test]
    fn sub_levels_are_scoped_to_their_parent() {
        let path = |top: &str, sub: &str| CategoryPath::new(Selection::only(top), Selection::only(sub), Selection::All);
        let pages = [
            Page::Resources(path("History", "Maps")),
            Page::Resources(path("History", "maps")),
            Page::Resources(path("Papers", "maps")),
        ];

        assert_eq!(routes_of(&pages), [
            "/resources/c/history/maps/",
            "/resources/c/history/maps-2/",
            "/resources/c/papers/maps/",
        ]);
    }

    #[test]
    fn unknown_pages_use_their_preferred_route() {
        let routes = Routes::default();
        assert_eq!(routes.route(&Page::Guide("Lei Feng".into())).as_str(), "/guides/lei-feng/");
    }
}
