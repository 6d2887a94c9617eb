pub mod minijinja;

use std::fmt::Debug;
use std::sync::Arc;

use serde::Serialize;

use crate::error::Result;
use crate::fstree::{EntryId, FsTree};

/// Built-in templates as `(name, source)` pairs.
pub type Defaults = &'static [(&'static str, &'static str)];

pub trait EngineInit {
    type Engine: Engine + 'static;

    /// Creates an engine whose templates are read from `root` in `tree` when
    /// present there and from `defaults` otherwise. `globals` is exposed to
    /// every template as `G`.
    fn init<G: Serialize>(
        tree: Arc<FsTree>,
        root: Option<EntryId>,
        defaults: Defaults,
        globals: G,
    ) -> Result<Self::Engine>;
}

pub trait Engine: Send + Sync + Debug {
    fn render(&self, name: &str, context: &serde_json::Value) -> Result<String>;

    fn render_str(&self, name: &str, source: &str, context: &serde_json::Value) -> Result<String>;
}
