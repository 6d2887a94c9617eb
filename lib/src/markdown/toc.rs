use pulldown_cmark::{Event, Tag, TagEnd};
use serde::{Deserialize, Serialize};

use crate::data::Sink;
use crate::error::Result;
use crate::markdown::{Events, Plugin};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub title: String,
    pub level: usize,
    pub id: Option<String>,
    pub children: Vec<Entry>,
}

/// Collects headings into a nested table of contents. A heading becomes a
/// child of the closest preceding heading with a smaller level.
pub struct TableOfContents<O> {
    flat: Vec<Entry>,
    open: Option<Entry>,
    output: O,
}

impl<O: Sink<Vec<Entry>>> TableOfContents<O> {
    pub fn new(output: O) -> Self {
        Self { flat: vec![], open: None, output }
    }
}

fn nest(entries: &mut Vec<Entry>, entry: Entry) {
    match entries.iter_mut().rev().find(|e| e.level < entry.level) {
        Some(parent) => nest(&mut parent.children, entry),
        None => entries.push(entry),
    }
}

impl<O: Sink<Vec<Entry>>> Plugin for TableOfContents<O> {
    fn remap<'a>(&'a mut self, events: Events<'a>) -> Events<'a> {
        self.flat.clear();
        self.open = None;

        Box::new(events.inspect(|event| match event {
            Event::Start(Tag::Heading { level, id, .. }) => {
                self.open = Some(Entry {
                    title: String::new(),
                    level: *level as usize,
                    id: id.as_ref().map(|id| id.to_string()),
                    children: vec![],
                });
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some(entry) = self.open.as_mut() {
                    entry.title.push_str(text);
                }
            }
            Event::End(TagEnd::Heading(..)) => {
                if let Some(entry) = self.open.take() {
                    self.flat.push(entry);
                }
            }
            _ => {}
        }))
    }

    fn finalize(&mut self) -> Result<()> {
        let mut tree = vec![];
        for entry in self.flat.drain(..) {
            nest(&mut tree, entry);
        }

        self.output.write(tree)
    }
}

#[cfg(test)]
mod tests {
    use once_cell::unsync::OnceCell;

    use crate::markdown::*;

    #[test]
    fn headings_nest_by_level() {
        let (toc, html) = (OnceCell::<Vec<Entry>>::new(), OnceCell::<String>::new());
        Markdown::from("# 拙政园\n## 东园\n### 兰雪堂\n## 中园\n# 附录 `code`\n")
            .plugin(AutoHeading::default())
            .plugin(TableOfContents::new(&toc))
            .plugin(Renderer::new(&html))
            .run()
            .unwrap();

        let toc = toc.into_inner().unwrap();
        assert_eq!(toc.len(), 2);
        assert_eq!(toc[0].title, "拙政园");
        assert_eq!(toc[0].children.len(), 2);
        assert_eq!(toc[0].children[0].children[0].title, "兰雪堂");
        assert_eq!(toc[0].children[1].title, "中园");
        assert_eq!(toc[1].title, "附录 code");
        assert!(toc.iter().all(|e| e.id.is_some()));
    }
}
