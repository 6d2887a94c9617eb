use std::borrow::Cow;

use pulldown_cmark::{Parser, Options};

use crate::data::Source;
use crate::error::{Chainable, Result};
use crate::markdown::{Events, Plugin};

pub struct Markdown<'p, I> {
    input: I,
    options: Options,
    plugins: Vec<Box<dyn Plugin + 'p>>,
}

impl<'p, I: Source> Markdown<'p, I> {
    /// GitHub-flavored defaults: tables, footnotes, strikethrough and task
    /// lists, without smart punctuation.
    pub fn from(input: I) -> Self {
        Self {
            input,
            options: Options::ENABLE_TABLES
                | Options::ENABLE_FOOTNOTES
                | Options::ENABLE_STRIKETHROUGH
                | Options::ENABLE_TASKLISTS
                | Options::ENABLE_HEADING_ATTRIBUTES,
            plugins: vec![],
        }
    }

    pub fn plugin<P: Plugin + 'p>(mut self, plugin: P) -> Self {
        self.plugins.push(Box::new(plugin));
        self
    }

    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    pub fn run(mut self) -> Result<()> {
        let mut text = self.input.read_text()?;
        for plugin in &self.plugins {
            let rewritten = match plugin.preprocess(&text)? {
                Cow::Borrowed(s) if s.len() == text.len() => None,
                Cow::Borrowed(s) => Some(s.to_owned()),
                Cow::Owned(s) => Some(s),
            };

            if let Some(rewritten) = rewritten {
                text = rewritten;
            }
        }

        let mut events: Events<'_> = Box::new(Parser::new_ext(&text, self.options));
        for plugin in self.plugins.iter_mut() {
            events = plugin.remap(events);
        }

        events.for_each(drop);
        for plugin in self.plugins.iter_mut() {
            plugin.finalize().chain(error!("markdown plugin failed"))?;
        }

        Ok(())
    }
}
