use std::fmt;
use std::path::PathBuf;

use crate::catalog::{CategoryPath, Selection};
use crate::sitemap::ChangeFreq;
use crate::url::UrlBuf;
use crate::util::slugify;

/// One exported HTML page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Page {
    Home,
    /// Guides in one category, by label.
    Category(String),
    /// A guide, by id.
    Guide(String),
    /// The resource library at a category selection. The default path is
    /// the library's front page.
    Resources(CategoryPath),
    /// A resource's viewer page, by id.
    Resource(String),
    Debug,
}

/// A path segment for `label`: its slug, or the percent-encoded label when
/// nothing survives slugging.
///
/// ```rust
/// use guidebook::site::segment;
///
/// assert_eq!(segment("Su Shi"), "su-shi");
/// assert_eq!(segment("…"), "%E2%80%A6");
/// ```
pub fn segment(label: &str) -> String {
    match slugify(label) {
        slug if slug.is_empty() => urlencoding::encode(label).into_owned(),
        slug => slug,
    }
}

/// The file a page at `route` is written to, relative to the output
/// directory.
pub fn output_path(route: &UrlBuf) -> PathBuf {
    PathBuf::from(route.as_str().trim_matches('/')).join("index.html")
}

impl Page {
    /// The page's preferred URL below the site's base path, with a trailing
    /// slash. Labels and ids are turned into path segments by [`segment`]
    /// alone; [`Routes`](super::Routes) resolves pages that would share one.
    ///
    /// ```rust
    /// use guidebook::catalog::{CategoryPath, Selection};
    /// use guidebook::site::Page;
    ///
    /// assert_eq!(Page::Home.route().as_str(), "/");
    /// assert_eq!(Page::Guide("leifengta".into()).route().as_str(), "/guides/leifengta/");
    ///
    /// let path = CategoryPath::new(Selection::only("Papers"), Selection::only("Local History"), Selection::All);
    /// assert_eq!(Page::Resources(path).route().as_str(), "/resources/c/papers/local-history/");
    /// ```
    pub fn route(&self) -> UrlBuf {
        self.route_with(|_, label| segment(label))
    }

    /// Builds the route, asking `segment_of(namespace, label)` for the path
    /// segment of every label or id. The namespace is the route so far,
    /// without slashes at either end.
    pub fn route_with<F>(&self, mut segment_of: F) -> UrlBuf
        where F: FnMut(&str, &str) -> String
    {
        let mut url = UrlBuf::from("/");
        match self {
            Page::Home => {},
            Page::Category(label) => { url.extend(["category", segment_of("category", label).as_str()]); }
            Page::Guide(id) => { url.extend(["guides", segment_of("guides", id).as_str()]); }
            Page::Resources(path) if path.top.is_all() => { url.append("resources"); }
            Page::Resources(path) => {
                let mut namespace = String::from("resources/c");
                url.extend(["resources", "c"]);
                for level in [&path.top, &path.sub, &path.third] {
                    let Selection::Only(label) = level else { break };
                    let segment = segment_of(&namespace, label);
                    url.append(&segment);
                    namespace.push('/');
                    namespace.push_str(&segment);
                }
            }
            Page::Resource(id) => { url.extend(["resources", segment_of("resources", id).as_str()]); }
            Page::Debug => { url.append("debug"); }
        }

        url.make_directory();
        url
    }

    /// Where the page is written, relative to the output directory, going
    /// by its preferred route.
    pub fn output_path(&self) -> PathBuf {
        output_path(&self.route())
    }

    pub fn template(&self) -> &'static str {
        match self {
            Page::Home => "index.html",
            Page::Category(_) => "category.html",
            Page::Guide(_) => "guide.html",
            Page::Resources(_) => "resources.html",
            Page::Resource(_) => "resource.html",
            Page::Debug => "debug.html",
        }
    }

    /// Change frequency and priority for pages listed in the sitemap.
    pub fn sitemap(&self) -> Option<(ChangeFreq, f32)> {
        match self {
            Page::Home => Some((ChangeFreq::Weekly, 1.0)),
            Page::Resources(path) if path.top.is_all() => Some((ChangeFreq::Weekly, 0.9)),
            Page::Debug => Some((ChangeFreq::Monthly, 0.3)),
            Page::Resource(_) | Page::Guide(_) => Some((ChangeFreq::Monthly, 0.8)),
            Page::Category(_) | Page::Resources(_) => None,
        }
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.route().fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_paths_mirror_routes() {
        assert_eq!(Page::Home.output_path(), PathBuf::from("index.html"));
        assert_eq!(Page::Debug.output_path(), PathBuf::from("debug/index.html"));
        assert_eq!(
            Page::Resources(CategoryPath::default()).output_path(),
            PathBuf::from("resources/index.html")
        );
    }

    #[test]
    fn hierarchy_routes_stop_at_first_all() {
        let top = CategoryPath::new(Selection::only("Maps"), Selection::All, Selection::All);
        assert_eq!(Page::Resources(top).route().as_str(), "/resources/c/maps/");

        let third = CategoryPath::new(Selection::only("A"), Selection::only("B"), Selection::only("C"));
        assert_eq!(Page::Resources(third).route().as_str(), "/resources/c/a/b/c/");
    }

    #[test]
    fn category_routes_are_ascii() {
        let route = Page::Category("杭州景点".into()).route();
        assert!(route.as_str().starts_with("/category/hang"));
        assert!(route.as_str().is_ascii());
        assert!(route.as_str().ends_with('/'));
    }

    #[test]
    fn sitemap_rules() {
        assert_eq!(Page::Home.sitemap(), Some((ChangeFreq::Weekly, 1.0)));
        assert_eq!(Page::Resources(CategoryPath::default()).sitemap(), Some((ChangeFreq::Weekly, 0.9)));
        assert_eq!(Page::Debug.sitemap(), Some((ChangeFreq::Monthly, 0.3)));
        assert_eq!(Page::Guide("x".into()).sitemap(), Some((ChangeFreq::Monthly, 0.8)));
        assert_eq!(Page::Category("x".into()).sitemap(), None);
    }
}
