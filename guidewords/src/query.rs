use std::fmt::Write;

use guidebook::catalog::{filter, CategoryPath, Guide, Layout, Resource, Selection};

use crate::config::Labels;

/// The guides in `category` matching `query`, one per line, followed by a
/// count.
pub fn search(guides: &[Guide], labels: &Labels, category: Option<&str>, query: Option<&str>) -> String {
    let selection = Selection::parse(category, &labels.all);
    let hits = filter(guides, &selection, query.unwrap_or(""));

    let mut out = String::new();
    for guide in &hits {
        let _ = writeln!(out, "{}\t{}\t{}", guide.id, guide.category, guide.title);
    }

    let _ = writeln!(out, "{} of {} guides in {}", hits.len(), guides.len(), selection.label(&labels.all));
    out
}

fn line(out: &mut String, indent: &str, resource: &Resource) {
    let _ = writeln!(out, "{indent}{}\t{}\t{}", resource.id, resource.file_size, resource.title);
}

/// The resource library at one category selection: the choices available
/// at each level, then the matching resources, grouped by sub-category
/// when a top category alone is chosen.
pub fn resources(
    resources: &[Resource],
    labels: &Labels,
    top: Option<&str>,
    sub: Option<&str>,
    third: Option<&str>,
) -> String {
    let all = labels.all.as_str();
    let path = CategoryPath::new(
        Selection::parse(top, all),
        Selection::parse(sub, all),
        Selection::parse(third, all),
    );

    let mut out = String::new();
    let _ = writeln!(out, "categories: {}", CategoryPath::top_options(resources).join(", "));
    if !path.top.is_all() {
        let _ = writeln!(out, "sub-categories: {}", path.sub_options(resources).join(", "));
    }

    if !path.sub.is_all() {
        let _ = writeln!(out, "third-level: {}", path.third_options(resources).join(", "));
    }

    let layout = path.layout(resources, &labels.other);
    let _ = writeln!(out, "{} resources", layout.len());
    match layout {
        Layout::Flat(items) => items.iter().for_each(|r| line(&mut out, "", r)),
        Layout::Grouped(groups) => for group in groups {
            let _ = writeln!(out, "{} ({})", group.label, group.count());
            group.items.iter().for_each(|r| line(&mut out, "    ", r));
        },
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels() -> Labels {
        Labels { all: "全部".into(), other: "其他".into() }
    }

    fn guide(id: &str, category: &str, title: &str) -> Guide {
        Guide {
            id: id.into(),
            title: title.into(),
            category: category.into(),
            location: Some("杭州".into()),
            description: None,
            content: String::new(),
            toc: vec![],
        }
    }

    fn doc(id: &str, top: &str, sub: Option<&str>) -> Resource {
        Resource {
            id: id.into(),
            title: id.to_uppercase(),
            description: String::new(),
            file_size: "2 MB".into(),
            category: top.into(),
            sub_category: sub.map(Into::into),
            third_category: None,
            pdf_url: format!("/pdfs/{id}.pdf"),
            external_url: None,
        }
    }

    #[test]
    fn search_filters_by_category_label() {
        let guides = [guide("a", "杭州景点", "雷峰塔"), guide("b", "苏州园林", "拙政园")];
        let out = search(&guides, &labels(), Some("苏州园林"), None);
        assert_eq!(out, "b\t苏州园林\t拙政园\n1 of 2 guides in 苏州园林\n");

        let out = search(&guides, &labels(), Some("全部"), Some("zzz_no_match"));
        assert_eq!(out, "0 of 2 guides in 全部\n");
    }

    #[test]
    fn resources_group_under_a_top_category() {
        let docs = [doc("a", "史料", Some("方志")), doc("b", "史料", None), doc("c", "论文", None)];
        let out = resources(&docs, &labels(), Some("史料"), None, None);
        assert_eq!(out, "categories: 史料, 论文\n\
                         sub-categories: 方志\n\
                         2 resources\n\
                         方志 (1)\n    a\t2 MB\tA\n\
                         其他 (1)\n    b\t2 MB\tB\n");

        let flat = resources(&docs, &labels(), None, None, None);
        assert!(flat.ends_with("3 resources\na\t2 MB\tA\nb\t2 MB\tB\nc\t2 MB\tC\n"));
    }
}
