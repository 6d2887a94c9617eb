use derive_more::Deref;
use serde::{Deserialize, Serialize};
use rustc_hash::FxHashMap;

use crate::error::Result;
use crate::markdown::Entry;

/// A compiled travel-guide article. `content` is rendered HTML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Guide {
    pub id: String,
    pub title: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub toc: Vec<Entry>,
}

/// A reference document: a local file under the site's assets or an
/// external URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: String,
    pub title: String,
    pub description: String,
    pub file_size: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub third_category: Option<String>,
    pub pdf_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_url: Option<String>,
}

impl Resource {
    /// The URL a viewer should load: the external copy when there is one.
    pub fn document_url(&self) -> &str {
        self.external_url.as_deref().unwrap_or(&self.pdf_url)
    }
}

/// A catalog record: something with a unique id and a category label.
pub trait Record {
    fn id(&self) -> &str;
    fn category(&self) -> &str;
}

impl Record for Guide {
    fn id(&self) -> &str { &self.id }
    fn category(&self) -> &str { &self.category }
}

impl Record for Resource {
    fn id(&self) -> &str { &self.id }
    fn category(&self) -> &str { &self.category }
}

/// An ordered list of records with unique ids.
#[derive(Debug, Clone, Deref, Serialize)]
#[serde(transparent)]
pub struct Catalog<T> {
    items: Vec<T>,
}

impl<T: Record> Catalog<T> {
    /// Builds a catalog, keeping the given order. Fails on the first
    /// duplicate id.
    ///
    /// ```rust
    /// use guidebook::catalog::{Catalog, Resource};
    ///
    /// let doc = |id: &str| Resource {
    ///     id: id.into(),
    ///     title: "t".into(),
    ///     description: "d".into(),
    ///     file_size: "1 MB".into(),
    ///     category: "c".into(),
    ///     sub_category: None,
    ///     third_category: None,
    ///     pdf_url: "/a.pdf".into(),
    ///     external_url: None,
    /// };
    ///
    /// assert_eq!(Catalog::new(vec![doc("a"), doc("b")]).unwrap().len(), 2);
    /// assert!(Catalog::new(vec![doc("a"), doc("a")]).is_err());
    /// ```
    pub fn new(items: Vec<T>) -> Result<Self> {
        let mut seen: FxHashMap<&str, usize> = FxHashMap::default();
        for (i, item) in items.iter().enumerate() {
            if let Some(first) = seen.insert(item.id(), i) {
                return err! {
                    "duplicate catalog id",
                    "id" => item.id(),
                    "first position" => first,
                    "second position" => i,
                };
            }
        }

        Ok(Catalog { items })
    }

    pub fn empty() -> Self {
        Catalog { items: vec![] }
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn into_inner(self) -> Vec<T> {
        self.items
    }
}

impl<T> Default for Catalog<T> {
    fn default() -> Self {
        Catalog { items: vec![] }
    }
}
