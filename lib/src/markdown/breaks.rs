use pulldown_cmark::Event;

use crate::markdown::{Events, Plugin};

/// Renders every soft line break as `<br>`, so single newlines in prose
/// survive as line breaks.
#[derive(Debug, Default, Clone, Copy)]
pub struct HardBreaks;

impl Plugin for HardBreaks {
    fn remap<'a>(&'a mut self, events: Events<'a>) -> Events<'a> {
        Box::new(events.map(|event| match event {
            Event::SoftBreak => Event::HardBreak,
            event => event,
        }))
    }
}
