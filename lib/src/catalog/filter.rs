use std::fmt;

use serde::{Serialize, Serializer};

use crate::catalog::{Guide, Record, Resource};
use crate::util::first_appearance;

/// A category choice: everything, or exactly one label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum Selection {
    #[default]
    All,
    Only(String),
}

impl Selection {
    /// `None` and `all_label` map to [`Selection::All`].
    ///
    /// ```rust
    /// use guidebook::catalog::Selection;
    ///
    /// assert_eq!(Selection::parse(None, "全部"), Selection::All);
    /// assert_eq!(Selection::parse(Some("全部"), "全部"), Selection::All);
    /// assert_eq!(Selection::parse(Some("苏州园林"), "全部"), Selection::only("苏州园林"));
    /// ```
    pub fn parse(label: Option<&str>, all_label: &str) -> Selection {
        match label {
            None => Selection::All,
            Some(label) if label == all_label => Selection::All,
            Some(label) => Selection::Only(label.to_owned()),
        }
    }

    pub fn only<S: Into<String>>(label: S) -> Selection {
        Selection::Only(label.into())
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Selection::All)
    }

    /// Whether `value` is accepted: `All` accepts anything, including a
    /// missing value; `Only` requires an exact match.
    pub fn accepts(&self, value: Option<&str>) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(label) => value == Some(label.as_str()),
        }
    }

    pub fn label<'a>(&'a self, all_label: &'a str) -> &'a str {
        match self {
            Selection::All => all_label,
            Selection::Only(label) => label,
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::All => f.write_str("*"),
            Selection::Only(label) => f.write_str(label),
        }
    }
}

/// Serializes as `null` for `All` and the label otherwise.
impl Serialize for Selection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Selection::All => serializer.serialize_none(),
            Selection::Only(label) => serializer.serialize_some(label),
        }
    }
}

/// A record with free-text fields the search box looks at.
pub trait Searchable: Record {
    fn search_fields(&self) -> [Option<&str>; 3];
}

impl Searchable for Guide {
    fn search_fields(&self) -> [Option<&str>; 3] {
        [Some(&self.title), self.description.as_deref(), self.location.as_deref()]
    }
}

impl Searchable for Resource {
    fn search_fields(&self) -> [Option<&str>; 3] {
        [Some(&self.title), Some(&self.description), None]
    }
}

/// Returns the records in `category` whose searchable fields contain `query`,
/// ignoring case, in their original order.
///
/// A query that is blank after trimming matches everything. Otherwise the
/// whole query, untrimmed but lowercased, must appear in one of the fields.
pub fn filter<'a, T: Searchable>(items: &'a [T], category: &Selection, query: &str) -> Vec<&'a T> {
    let needle = match query.trim().is_empty() {
        true => None,
        false => Some(query.to_lowercase()),
    };

    items.iter()
        .filter(|item| category.accepts(Some(item.category())))
        .filter(|item| match &needle {
            None => true,
            Some(needle) => item.search_fields()
                .into_iter()
                .flatten()
                .any(|field| field.to_lowercase().contains(needle.as_str())),
        })
        .collect()
}

/// `All` followed by each distinct category in order of first appearance.
pub fn categories<T: Record>(items: &[T]) -> Vec<Selection> {
    let labels = first_appearance(items.iter().map(|item| item.category()));
    std::iter::once(Selection::All)
        .chain(labels.into_iter().map(Selection::only))
        .collect()
}

/// Each entry of [`categories`] with the number of records in it. `All`
/// counts every record.
pub fn category_counts<T: Record>(items: &[T]) -> Vec<(Selection, usize)> {
    categories(items).into_iter()
        .map(|selection| {
            let count = match &selection {
                Selection::All => items.len(),
                Selection::Only(label) => items.iter().filter(|i| i.category() == label).count(),
            };

            (selection, count)
        })
        .collect()
}
