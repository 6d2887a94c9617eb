use std::fmt::{self, Write};

use chrono::NaiveDate;

use crate::util::escape_html;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeFreq {
    Weekly,
    Monthly,
}

impl fmt::Display for ChangeFreq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeFreq::Weekly => f.write_str("weekly"),
            ChangeFreq::Monthly => f.write_str("monthly"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SitemapEntry {
    pub loc: String,
    pub lastmod: NaiveDate,
    pub changefreq: ChangeFreq,
    pub priority: f32,
}

/// An XML sitemap whose entries all share one `lastmod` date.
#[derive(Debug, Clone)]
pub struct Sitemap {
    origin: String,
    lastmod: NaiveDate,
    entries: Vec<SitemapEntry>,
}

impl Sitemap {
    /// `origin` is prepended to every route, e.g.
    /// `https://holding-hands.github.io/GuideWords.github.io`.
    pub fn new(origin: impl Into<String>, lastmod: NaiveDate) -> Self {
        let mut origin = origin.into();
        while origin.ends_with('/') {
            origin.pop();
        }

        Sitemap { origin, lastmod, entries: vec![] }
    }

    pub fn push(&mut self, route: &str, changefreq: ChangeFreq, priority: f32) {
        let route = route.trim_start_matches('/');
        self.entries.push(SitemapEntry {
            loc: format!("{}/{route}", self.origin),
            lastmod: self.lastmod,
            changefreq,
            priority,
        });
    }

    pub fn entries(&self) -> &[SitemapEntry] {
        &self.entries
    }

    /// ```rust
    /// use chrono::NaiveDate;
    /// use guidebook::sitemap::{ChangeFreq, Sitemap};
    ///
    /// let date = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
    /// let mut map = Sitemap::new("https://a.io/g/", date);
    /// map.push("/", ChangeFreq::Weekly, 1.0);
    ///
    /// let xml = map.to_xml();
    /// assert!(xml.contains("<loc>https://a.io/g/</loc>"));
    /// assert!(xml.contains("<lastmod>2025-03-01</lastmod>"));
    /// assert!(xml.contains("<priority>1.0</priority>"));
    /// ```
    pub fn to_xml(&self) -> String {
        let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        xml.push_str("<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n");
        for entry in &self.entries {
            let _ = write!(xml,
                "  <url>\n    <loc>{}</loc>\n    <lastmod>{}</lastmod>\n    \
                <changefreq>{}</changefreq>\n    <priority>{:.1}</priority>\n  </url>\n",
                escape_html(&entry.loc),
                entry.lastmod.format("%Y-%m-%d"),
                entry.changefreq,
                entry.priority,
            );
        }

        xml.push_str("</urlset>\n");
        xml
    }
}
