use pulldown_cmark::html;

use crate::data::Sink;
use crate::error::Result;
use crate::markdown::{Events, Plugin};

/// Renders the event stream to HTML and writes it to `output`. Consumes the
/// stream, so it must be the last plugin.
pub struct Renderer<O> {
    output: O,
    rendered: String,
}

impl<O: Sink<String>> Renderer<O> {
    pub fn new(output: O) -> Self {
        Renderer { output, rendered: String::new() }
    }
}

impl<O: Sink<String>> Plugin for Renderer<O> {
    fn remap<'a>(&'a mut self, events: Events<'a>) -> Events<'a> {
        html::push_html(&mut self.rendered, events);
        Box::new(std::iter::empty())
    }

    fn finalize(&mut self) -> Result<()> {
        self.output.write(std::mem::take(&mut self.rendered))
    }
}
