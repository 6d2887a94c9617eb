//! A plugin-driven markdown pipeline over `pulldown-cmark` events.
//!
//! ```rust
//! use once_cell::unsync::OnceCell;
//! use guidebook::markdown::*;
//!
//! let html = OnceCell::<String>::new();
//! Markdown::from("# 雷峰塔\n\n西湖南岸\n夕照山")
//!     .plugin(HardBreaks)
//!     .plugin(AutoHeading::default())
//!     .plugin(Renderer::new(&html))
//!     .run()
//!     .unwrap();
//!
//! let html = html.into_inner().unwrap();
//! assert!(html.starts_with("<h1 id=\""));
//! assert!(html.contains("西湖南岸<br />\n夕照山"));
//! ```

mod plugin;
mod markdown;
mod render;
mod frontmatter;
mod breaks;
mod indent;
mod auto_heading;
mod toc;
mod snippet;
mod alias;

pub use plugin::*;
pub use markdown::*;
pub use render::*;
pub use frontmatter::*;
pub use breaks::*;
pub use indent::*;
pub use auto_heading::*;
pub use toc::*;
pub use snippet::*;
pub use alias::*;
