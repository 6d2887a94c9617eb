//! A repeated, rotated text layer drawn over guide pages.
//!
//! The build lays the layer out for [`REFERENCE_VIEWPORT`]; the page script
//! re-tiles it for the real viewport from a [`Layer`], with the same grid.

use std::fmt::{Display, Write};

use serde::{Deserialize, Serialize};

use crate::util::escape_html;

/// The viewport the build lays tiles out for before the page script runs.
pub const REFERENCE_VIEWPORT: (u32, u32) = (1920, 1080);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Watermark {
    pub text: String,
    pub font_size: u32,
    pub opacity: f32,
    /// Degrees, clockwise.
    pub rotate: f32,
    /// Distance between tile origins, in pixels.
    pub gap: u32,
    pub enabled: bool,
}

impl Default for Watermark {
    fn default() -> Self {
        Watermark {
            text: "谁人不识张公子".into(),
            font_size: 16,
            opacity: 0.03,
            rotate: -25.0,
            gap: 200,
            enabled: true,
        }
    }
}

/// One placed copy of the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    pub row: u32,
    pub col: u32,
    pub left: u32,
    pub top: u32,
}

impl Watermark {
    /// `(cols, rows)` needed to cover a `width × height` viewport: one more
    /// than fits in each direction so rotated text never leaves a gap.
    ///
    /// ```rust
    /// use guidebook::watermark::Watermark;
    ///
    /// let w = Watermark::default();
    /// assert_eq!(w.grid(1920, 1080), (11, 7));
    /// assert_eq!(w.grid(400, 400), (3, 3));
    /// assert_eq!(w.grid(0, 0), (1, 1));
    /// ```
    pub fn grid(&self, width: u32, height: u32) -> (u32, u32) {
        let gap = self.gap.max(1);
        (width.div_ceil(gap) + 1, height.div_ceil(gap) + 1)
    }

    /// Tiles in row-major order.
    pub fn tiles(&self, width: u32, height: u32) -> impl Iterator<Item = Tile> + '_ {
        let (cols, rows) = self.grid(width, height);
        (0..rows).flat_map(move |row| (0..cols).map(move |col| Tile {
            row,
            col,
            left: col * self.gap,
            top: row * self.gap,
        }))
    }

    fn declarations(&self, left: impl Display, top: impl Display) -> String {
        format!(
            "left: {left}px; top: {top}px; font-size: {}px; color: rgba(0, 0, 0, {}); transform: rotate({}deg);",
            self.font_size, self.opacity, self.rotate
        )
    }

    /// Inline CSS for `tile`.
    pub fn style(&self, tile: &Tile) -> String {
        self.declarations(tile.left, tile.top)
    }

    pub fn is_visible(&self) -> bool {
        self.enabled && !self.text.is_empty()
    }

    /// What the page script needs to tile the layer itself.
    pub fn layer(&self) -> Layer {
        Layer {
            visible: self.is_visible(),
            text: self.text.clone(),
            gap: self.gap.max(1),
            style: self.declarations("{left}", "{top}"),
        }
    }

    /// The whole layer for the reference viewport, or nothing when disabled.
    pub fn render_html(&self) -> String {
        if !self.is_visible() {
            return String::new();
        }

        let (width, height) = REFERENCE_VIEWPORT;
        let text = escape_html(&self.text);
        let mut html = String::from("<div class=\"watermark-pattern\" aria-hidden=\"true\">");
        for tile in self.tiles(width, height) {
            let _ = write!(html, "<div class=\"watermark-text\" style=\"{}\">{text}</div>", self.style(&tile));
        }

        html.push_str("</div>");
        html
    }
}

/// The layer as the page script sees it. For a `width × height` viewport
/// the script places `ceil(width / gap) + 1` columns and
/// `ceil(height / gap) + 1` rows, as [`Watermark::grid`] does, and fills
/// `{left}` and `{top}` in `style` with each tile's offsets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layer {
    pub visible: bool,
    pub text: String,
    pub gap: u32,
    pub style: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiles_step_by_gap() {
        let w = Watermark { gap: 250, ..Default::default() };
        let tiles: Vec<_> = w.tiles(500, 250).collect();
        assert_eq!(tiles.len(), 3 * 2);
        assert_eq!(tiles[0], Tile { row: 0, col: 0, left: 0, top: 0 });
        assert_eq!(tiles[4], Tile { row: 1, col: 1, left: 250, top: 250 });
    }

    #[test]
    fn zero_gap_still_terminates() {
        let w = Watermark { gap: 0, ..Default::default() };
        assert_eq!(w.grid(10, 10), (11, 11));
        assert!(w.tiles(10, 10).all(|t| t.left == 0 && t.top == 0));
    }

    #[test]
    fn style_carries_config() {
        let w = Watermark::default();
        let tile = w.tiles(1, 1).last().unwrap();
        assert_eq!(
            w.style(&tile),
            "left: 200px; top: 200px; font-size: 16px; color: rgba(0, 0, 0, 0.03); transform: rotate(-25deg);"
        );
    }

    #[test]
    fn layer_renders_reference_viewport() {
        let html = Watermark::default().render_html();
        assert_eq!(html.matches("watermark-text").count(), 11 * 7);
        assert!(html.contains("谁人不识张公子"));

        let off = Watermark { enabled: false, ..Default::default() };
        assert_eq!(off.render_html(), "");
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let w: Watermark = toml::from_str("text = \"<b>\"\ngap = 250").unwrap();
        assert_eq!(w.font_size, 16);
        assert_eq!(w.gap, 250);
        assert!(w.render_html().contains("&lt;b&gt;"));
    }

    #[test]
    fn runtime_layer_matches_build_time_tiles() {
        let w = Watermark { gap: 150, ..Default::default() };
        let layer = w.layer();
        assert!(layer.visible);
        assert_eq!(layer.gap, 150);

        for tile in w.tiles(640, 480) {
            let style = layer.style
                .replace("{left}", &tile.left.to_string())
                .replace("{top}", &tile.top.to_string());
            assert_eq!(style, w.style(&tile));
        }

        let (cols, rows) = w.grid(640, 480);
        assert_eq!((cols, rows), (640u32.div_ceil(150) + 1, 480u32.div_ceil(150) + 1));
        assert_eq!(Watermark { gap: 0, ..Default::default() }.layer().gap, 1);
        assert!(!Watermark { text: String::new(), ..Default::default() }.layer().visible);
    }
}
