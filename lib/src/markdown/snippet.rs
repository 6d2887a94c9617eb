use pulldown_cmark::{Event, Tag, TagEnd};

use crate::data::Sink;
use crate::error::Result;
use crate::markdown::{Events, Plugin};

/// Captures roughly the first `length` characters of paragraph text as a
/// plain-text summary. Whole paragraphs are taken until the length is reached;
/// the last one is cut at a character boundary and suffixed with `…`.
pub struct Snippet<O> {
    output: O,
    snippet: String,
    length: usize,
}

impl<O: Sink<String>> Snippet<O> {
    pub fn new(output: O, length: usize) -> Self {
        Self { output, snippet: String::new(), length }
    }
}

struct Capture<'s> {
    snippet: &'s mut String,
    chars: usize,
    limit: usize,
    in_paragraph: bool,
    truncated: bool,
}

impl Capture<'_> {
    fn done(&self) -> bool {
        self.truncated || self.chars >= self.limit
    }

    fn push(&mut self, text: &str) {
        for ch in text.chars() {
            if self.chars >= self.limit {
                self.truncated = true;
                return;
            }

            self.snippet.push(ch);
            self.chars += 1;
        }
    }

    fn observe(&mut self, event: &Event<'_>) {
        if self.done() {
            return;
        }

        match event {
            Event::Start(Tag::Paragraph) => {
                if !self.snippet.is_empty() {
                    self.push(" ");
                }

                self.in_paragraph = true;
            }
            Event::End(TagEnd::Paragraph) => self.in_paragraph = false,
            Event::Text(text) | Event::Code(text) if self.in_paragraph => {
                self.push(text.trim_start_matches('\u{3000}'));
            }
            Event::SoftBreak | Event::HardBreak if self.in_paragraph => self.push(" "),
            _ => {}
        }
    }
}

impl<O: Sink<String>> Plugin for Snippet<O> {
    fn remap<'a>(&'a mut self, events: Events<'a>) -> Events<'a> {
        self.snippet.clear();
        let mut capture = Capture {
            snippet: &mut self.snippet,
            chars: 0,
            limit: self.length,
            in_paragraph: false,
            truncated: false,
        };

        Box::new(events.inspect(move |event| {
            capture.observe(event);
            if capture.truncated && !capture.snippet.ends_with('…') {
                capture.snippet.push('…');
            }
        }))
    }

    fn finalize(&mut self) -> Result<()> {
        let snippet = std::mem::take(&mut self.snippet);
        self.output.write(snippet.trim().to_string())
    }
}
