use std::borrow::Cow;

use pulldown_cmark::Event;

use crate::error::Result;

/// A boxed stream of markdown events.
pub type Events<'a> = Box<dyn Iterator<Item = Event<'a>> + 'a>;

/// A stage of the [`Markdown`](crate::markdown::Markdown) pipeline.
///
/// Plugins run in the order they were added: every `preprocess` first, then
/// each `remap` wraps the event stream produced by the previous plugin, and
/// finally every `finalize` runs once the stream has been drained.
pub trait Plugin {
    fn preprocess<'a>(&self, input: &'a str) -> Result<Cow<'a, str>> {
        Ok(Cow::Borrowed(input))
    }

    fn remap<'a>(&'a mut self, events: Events<'a>) -> Events<'a> {
        events
    }

    fn finalize(&mut self) -> Result<()> {
        Ok(())
    }
}
