use serde::Serialize;

use crate::catalog::{Resource, Selection};
use crate::util::first_appearance;

/// The three-level category selection over resources:
/// category, then sub-category, then third-level category.
///
/// Choosing a level resets every level below it to `All`:
///
/// ```rust
/// use guidebook::catalog::{CategoryPath, Selection};
///
/// let mut path = CategoryPath::default();
/// path.select_top(Selection::only("史料"));
/// path.select_sub(Selection::only("方志"));
/// path.select_third(Selection::only("杭州"));
///
/// path.select_top(Selection::only("论文"));
/// assert_eq!(path.sub, Selection::All);
/// assert_eq!(path.third, Selection::All);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CategoryPath {
    pub top: Selection,
    pub sub: Selection,
    pub third: Selection,
}

/// How a filtered resource list should be displayed.
#[derive(Debug, PartialEq)]
pub enum Layout<'a> {
    Flat(Vec<&'a Resource>),
    Grouped(Vec<Group<'a>>),
}

/// Resources sharing one sub-category. `sub_category` is `None` for the
/// fallback bucket of resources without one.
#[derive(Debug, PartialEq, Serialize)]
pub struct Group<'a> {
    pub label: String,
    pub sub_category: Option<String>,
    pub items: Vec<&'a Resource>,
}

impl Group<'_> {
    pub fn count(&self) -> usize {
        self.items.len()
    }
}

impl CategoryPath {
    pub fn new(top: Selection, sub: Selection, third: Selection) -> Self {
        let mut path = CategoryPath::default();
        path.select_top(top);
        path.select_sub(sub);
        path.select_third(third);
        path
    }

    pub fn select_top(&mut self, top: Selection) {
        self.top = top;
        self.sub = Selection::All;
        self.third = Selection::All;
    }

    pub fn select_sub(&mut self, sub: Selection) {
        self.sub = sub;
        self.third = Selection::All;
    }

    pub fn select_third(&mut self, third: Selection) {
        self.third = third;
    }

    /// Every level that isn't `All` must equal the resource's field.
    pub fn matches(&self, resource: &Resource) -> bool {
        self.top.accepts(Some(resource.category.as_str()))
            && self.sub.accepts(resource.sub_category.as_deref())
            && self.third.accepts(resource.third_category.as_deref())
    }

    pub fn filter<'a>(&self, items: &'a [Resource]) -> Vec<&'a Resource> {
        items.iter().filter(|r| self.matches(r)).collect()
    }

    /// Distinct top-level categories, in first-appearance order.
    pub fn top_options(items: &[Resource]) -> Vec<&str> {
        first_appearance(items.iter().map(|r| r.category.as_str()))
    }

    /// Distinct sub-categories among resources in the selected top category.
    pub fn sub_options<'a>(&self, items: &'a [Resource]) -> Vec<&'a str> {
        first_appearance(items.iter()
            .filter(|r| self.top.accepts(Some(r.category.as_str())))
            .filter_map(|r| r.sub_category.as_deref()))
    }

    /// Distinct third-level categories among resources matching the top and
    /// sub selections.
    pub fn third_options<'a>(&self, items: &'a [Resource]) -> Vec<&'a str> {
        first_appearance(items.iter()
            .filter(|r| self.top.accepts(Some(r.category.as_str())))
            .filter(|r| self.sub.accepts(r.sub_category.as_deref()))
            .filter_map(|r| r.third_category.as_deref()))
    }

    /// Resources are grouped by sub-category exactly when a top category is
    /// chosen and the sub-category is `All`; otherwise the layout is flat.
    pub fn is_grouped(&self) -> bool {
        !self.top.is_all() && self.sub.is_all()
    }

    /// Lays out the matching resources. Groups appear in order of first
    /// appearance; resources without a sub-category land in a trailing
    /// bucket labelled `fallback_label`.
    pub fn layout<'a>(&self, items: &'a [Resource], fallback_label: &str) -> Layout<'a> {
        let matching = self.filter(items);
        if !self.is_grouped() {
            return Layout::Flat(matching);
        }

        let mut groups: Vec<Group<'a>> = vec![];
        let mut fallback: Vec<&'a Resource> = vec![];
        for resource in matching {
            let Some(sub) = resource.sub_category.as_deref() else {
                fallback.push(resource);
                continue;
            };

            match groups.iter_mut().find(|g| g.sub_category.as_deref() == Some(sub)) {
                Some(group) => group.items.push(resource),
                None => groups.push(Group {
                    label: sub.to_owned(),
                    sub_category: Some(sub.to_owned()),
                    items: vec![resource],
                }),
            }
        }

        if !fallback.is_empty() {
            groups.push(Group { label: fallback_label.to_owned(), sub_category: None, items: fallback });
        }

        Layout::Grouped(groups)
    }
}

impl<'a> Layout<'a> {
    /// Every resource in display order.
    pub fn items(&self) -> Vec<&'a Resource> {
        match self {
            Layout::Flat(items) => items.clone(),
            Layout::Grouped(groups) => groups.iter().flat_map(|g| g.items.iter().copied()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Layout::Flat(items) => items.len(),
            Layout::Grouped(groups) => groups.iter().map(Group::count).sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
