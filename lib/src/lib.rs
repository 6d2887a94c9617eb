#![doc = svgbobdoc::transform!(
//! Building blocks for a static travel-guide site.
//!
//! # Overview
//!
//! Guidebook holds the pieces of a guide site that don't depend on how the
//! site is laid out on disk: the catalogs and the views over them, the
//! markdown pipeline that compiles guides, the rules behind the in-browser
//! viewer, speech, protection, watermark, and preference widgets, and the
//! plumbing that renders pages and writes them out.
//!
//! A site is organized as follows:
//!
//! ```svgbob
//!                        +------+
//!                        | Site |
//!                        +--+---+
//!                           |
//!      +--------------------+--------------------+
//!      |                    |                    |
//! +----+---+          +-----+-----+         +----+---+
//! | guides |          | resources |         | assets |
//! +----+---+          +-----+-----+         +--------+
//!      |                    |
//! +----+-----+        +-----+----+
//! | category |        | category |
//! +----+-----+        +-----+----+
//!      |                    |
//! +----+--+          +------+-------+
//! | guide |          | sub-category |
//! +-------+          +------+-------+
//!                           |
//!                    +------+-------+
//!                    |    third     |
//!                    +------+-------+
//!                           |
//!                     +-----+----+
//!                     | resource |
//!                     +----------+
//! ```
//!
//!   * **Guides** are compiled from markdown at build time into HTML plus a
//!     table of contents, and grouped by a single category.
//!
//!   * **Resources** are reference documents (PDF, markdown, or Word files)
//!     grouped by up to three category levels and shown in an embedded
//!     viewer.
//!
//!   * **Assets** are copied through unchanged.
//!
//! ## Rendering
//!
//! A site is typically built as follows:
//!
//! 1. The site directory is snapshotted into an [`fstree::FsTree`].
//! 2. Guide sources are run through a [`markdown::Markdown`] pipeline in
//!    parallel and collected into a [`catalog::Catalog`].
//! 3. Every [`site::Page`] is rendered through a [`templating::Engine`] and
//!    written out by [`site::render_site`], alongside the assets.
//! 4. The tables in [`runtime::Runtime`] are shipped with the page script,
//!    which runs the viewer, speech, and preference widgets from them.
)]

#[macro_use]
pub mod error;
pub mod util;
pub mod fstree;
pub mod data;
pub mod url;
pub mod markdown;
pub mod catalog;
pub mod viewer;
pub mod speech;
pub mod protection;
pub mod watermark;
pub mod prefs;
pub mod runtime;
pub mod sitemap;
pub mod templating;
pub mod site;

pub use site::{Site, Renderer, render_site};

pub use rayon;
