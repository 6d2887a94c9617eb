use std::collections::VecDeque;

use pulldown_cmark::{Event, Tag, CowStr, TagEnd};
use rustc_hash::FxHashMap;

use crate::markdown::{Events, Plugin};

/// Gives every heading without an explicit `{#id}` a slug id derived from its
/// text. Repeated slugs get `-1`, `-2`, ... suffixes.
#[derive(Default)]
pub struct AutoHeading {
    seen: FxHashMap<String, usize>,
}

struct HeadingIterator<'a> {
    pending: VecDeque<Event<'a>>,
    seen: &'a mut FxHashMap<String, usize>,
    inner: Events<'a>,
}

impl<'a> HeadingIterator<'a> {
    fn unique_id(&mut self, text: &str) -> String {
        let mut id = crate::util::slugify(text);
        if id.is_empty() {
            id.push_str("section");
        }

        let count = self.seen.entry(id.clone()).or_insert(0);
        *count += 1;
        match *count {
            1 => id,
            n => format!("{id}-{}", n - 1),
        }
    }
}

impl<'a> Iterator for HeadingIterator<'a> {
    type Item = Event<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(event) = self.pending.pop_front() {
            return Some(event);
        }

        match self.inner.next()? {
            Event::Start(Tag::Heading { level, id: None, classes, attrs }) => {
                let mut text = String::new();
                loop {
                    let event = self.inner.next()?;
                    let done = matches!(event, Event::End(TagEnd::Heading(..)));
                    if let Event::Text(ref s) | Event::Code(ref s) = event {
                        text.push_str(s);
                    }

                    self.pending.push_back(event);
                    if done {
                        break;
                    }
                }

                let id = self.unique_id(&text);
                Some(Event::Start(Tag::Heading { level, id: Some(id.into()), classes, attrs }))
            },
            Event::Start(Tag::Heading { id: Some(id), level, classes, attrs }) => {
                *self.seen.entry(id.to_string()).or_insert(0) += 1;
                Some(Event::Start(Tag::Heading { id: Some(id), level, classes, attrs }))
            }
            event => Some(event)
        }
    }
}

impl Plugin for AutoHeading {
    fn remap<'a>(&'a mut self, events: Events<'a>) -> Events<'a> {
        self.seen.clear();
        Box::new(HeadingIterator {
            seen: &mut self.seen,
            inner: events,
            pending: VecDeque::with_capacity(4),
        })
    }
}

/// Emits an empty `<a class="anchor">` link right after each heading opens.
/// Run after [`AutoHeading`] so every heading has an id.
#[derive(Default)]
pub struct HeadingAnchor;

struct AnchorIterator<'a> {
    pending: Option<CowStr<'a>>,
    inner: Events<'a>,
}

impl<'a> Iterator for AnchorIterator<'a> {
    type Item = Event<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(id) = self.pending.take() {
            let html = format!(r##"<a class="anchor" aria-hidden="true" href="#{id}"></a>"##);
            return Some(Event::Html(html.into()));
        }

        let event = self.inner.next()?;
        if let Event::Start(Tag::Heading { id: Some(ref id), .. }) = event {
            self.pending = Some(id.clone());
        }

        Some(event)
    }
}

impl Plugin for HeadingAnchor {
    fn remap<'a>(&'a mut self, events: Events<'a>) -> Events<'a> {
        Box::new(AnchorIterator { inner: events, pending: None })
    }
}
