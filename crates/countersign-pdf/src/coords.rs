//! Coordinate transformation between layout space and PDF page space
//!
//! Field positions arrive as percentages of the page, anchored at the field
//! center, in layout coordinates (top-left origin, y grows downward). PDF
//! pages use a bottom-left origin with y growing upward, so every placement
//! goes through the axis flip here. This module knows nothing about document
//! bytes; it operates on page dimensions and artwork geometry only.

/// Native page dimensions in PDF points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

impl PageSize {
    pub fn letter() -> Self {
        Self {
            width: 612.0,
            height: 792.0,
        }
    }

    pub fn a4() -> Self {
        Self {
            width: 595.0,
            height: 842.0,
        }
    }
}

/// A field anchor in layout space: percentages (0-100) of page width/height,
/// measured from the top-left, pointing at the field's center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldAnchor {
    pub x_percent: f64,
    pub y_percent: f64,
}

/// Absolute placement of artwork on a page, in PDF points with bottom-left
/// origin. `(x, y)` is the lower-left corner of the drawn artwork.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Fraction of the font size the text baseline sits below the field's
/// vertical center. Chosen empirically against Helvetica metrics so the
/// rendered date appears vertically centered in the field box; fixed so
/// preview and embedded output agree.
pub const BASELINE_DROP_FACTOR: f64 = 1.0 / 3.0;

/// Average Helvetica glyph advance as a fraction of the font size, used to
/// estimate text width without font metrics at hand. Close enough for
/// centering digits, letters, and spaces in a date string.
pub const TEXT_WIDTH_FACTOR: f64 = 0.5;

/// Convert a field anchor into absolute page coordinates.
///
/// Returns `(x, y_from_bottom)`: the anchor point in PDF page space, with
/// the vertical axis flipped from layout space.
pub fn anchor_on_page(anchor: FieldAnchor, page: PageSize) -> (f64, f64) {
    let abs_x = (anchor.x_percent / 100.0) * page.width;
    let abs_y_from_top = (anchor.y_percent / 100.0) * page.height;
    (abs_x, page.height - abs_y_from_top)
}

/// Compute the on-page placement for raster artwork.
///
/// The target width is `width_percent` of the page width; the height follows
/// from the artwork's native aspect ratio (width-driven scaling, never a
/// non-uniform stretch). The anchor is the artwork's top-center: the artwork
/// is centered horizontally on the anchor and hangs below it, matching how
/// the layout surface draws a field's contents downward from its anchor
/// point. The resulting corner is clamped to non-negative coordinates so
/// artwork near a page edge never starts off-page.
pub fn place_artwork(
    anchor: FieldAnchor,
    width_percent: f64,
    artwork_width: u32,
    artwork_height: u32,
    page: PageSize,
) -> Placement {
    let (center_x, anchor_y) = anchor_on_page(anchor, page);

    let target_w = (width_percent / 100.0) * page.width;
    let ratio = artwork_width as f64 / artwork_height.max(1) as f64;
    let target_h = target_w / ratio;

    Placement {
        x: (center_x - target_w / 2.0).max(0.0),
        y: (anchor_y - target_h).max(0.0),
        width: target_w,
        height: target_h,
    }
}

/// Position for drawing literal text (date stamps) at a field anchor.
///
/// Returns `(x, baseline_y)` in page space: the start-of-text position that
/// horizontally centers the string on the anchor, using an estimated width
/// of `TEXT_WIDTH_FACTOR` times the font size per character. Clamped to
/// non-negative coordinates like artwork placement.
pub fn text_position(anchor: FieldAnchor, text: &str, font_size: f64, page: PageSize) -> (f64, f64) {
    let (anchor_x, anchor_y) = anchor_on_page(anchor, page);
    let est_width = text.chars().count() as f64 * font_size * TEXT_WIDTH_FACTOR;
    let x = anchor_x - est_width / 2.0;
    let baseline_y = anchor_y - font_size * BASELINE_DROP_FACTOR;
    (x.max(0.0), baseline_y.max(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn anchor_center_flips_y() {
        // A field at (50%, 50%) of an 800x1000 page anchors at (400, 500)
        // in both systems: the midpoint is its own mirror image.
        let page = PageSize {
            width: 800.0,
            height: 1000.0,
        };
        let anchor = FieldAnchor {
            x_percent: 50.0,
            y_percent: 50.0,
        };
        assert_eq!(anchor_on_page(anchor, page), (400.0, 500.0));
    }

    #[test]
    fn anchor_near_top_maps_high() {
        let page = PageSize::letter();
        let anchor = FieldAnchor {
            x_percent: 0.0,
            y_percent: 10.0,
        };
        let (x, y) = anchor_on_page(anchor, page);
        assert_eq!(x, 0.0);
        assert!((y - 712.8).abs() < 1e-9);
    }

    #[test]
    fn artwork_hangs_below_its_anchor() {
        // 2:1 artwork in a 20%-wide box on an 800x1000 page: target 160x80,
        // centered horizontally on the anchor (x = 400 - 80), top edge at
        // the anchor (y = 500 - 80).
        let page = PageSize {
            width: 800.0,
            height: 1000.0,
        };
        let anchor = FieldAnchor {
            x_percent: 50.0,
            y_percent: 50.0,
        };
        let placement = place_artwork(anchor, 20.0, 200, 100, page);
        assert_eq!(placement.x, 320.0);
        assert_eq!(placement.y, 420.0);
        assert_eq!(placement.width, 160.0);
        assert_eq!(placement.height, 80.0);
    }

    #[test]
    fn placement_clamps_at_page_edges() {
        let page = PageSize::letter();
        // Wide box anchored in the bottom-left corner would start off-page
        // without clamping.
        let anchor = FieldAnchor {
            x_percent: 2.0,
            y_percent: 99.0,
        };
        let placement = place_artwork(anchor, 40.0, 300, 100, page);
        assert_eq!(placement.x, 0.0);
        assert_eq!(placement.y, 0.0);
    }

    #[test]
    fn text_position_drops_below_center() {
        let page = PageSize {
            width: 800.0,
            height: 1000.0,
        };
        let anchor = FieldAnchor {
            x_percent: 50.0,
            y_percent: 50.0,
        };
        // 10 chars at size 12: estimated width 60, so text starts 30 left
        // of the anchor to center on it.
        let (x, y) = text_position(anchor, "0123456789", 12.0, page);
        assert_eq!(x, 400.0 - 30.0);
        assert_eq!(y, 500.0 - 12.0 * BASELINE_DROP_FACTOR);
    }

    #[test]
    fn text_position_centers_on_the_anchor() {
        let page = PageSize::letter();
        let anchor = FieldAnchor {
            x_percent: 50.0,
            y_percent: 50.0,
        };
        let (short_x, _) = text_position(anchor, "May 1, 2026", 14.0, page);
        let (long_x, _) = text_position(anchor, "September 30, 2026", 14.0, page);
        // Longer text starts further left; both center on the same anchor.
        assert!(long_x < short_x);
        let short_w = 11.0 * 14.0 * TEXT_WIDTH_FACTOR;
        let long_w = 18.0 * 14.0 * TEXT_WIDTH_FACTOR;
        assert!((short_x + short_w / 2.0 - 306.0).abs() < 1e-9);
        assert!((long_x + long_w / 2.0 - 306.0).abs() < 1e-9);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn dimension() -> impl Strategy<Value = f64> {
        100.0f64..2000.0
    }

    fn percent() -> impl Strategy<Value = f64> {
        0.0f64..=100.0
    }

    proptest! {
        /// Property: moving a field down in layout space moves it down the
        /// page in PDF space (decreasing y).
        #[test]
        fn y_axis_movement_direction(
            w in dimension(),
            h in dimension(),
            x_pct in percent(),
            y_pct in 0.0f64..90.0,
        ) {
            let page = PageSize { width: w, height: h };
            let (_, y1) = anchor_on_page(FieldAnchor { x_percent: x_pct, y_percent: y_pct }, page);
            let (_, y2) = anchor_on_page(FieldAnchor { x_percent: x_pct, y_percent: y_pct + 5.0 }, page);
            prop_assert!(y2 < y1, "layout y {} -> {} should decrease PDF y, got {} -> {}",
                y_pct, y_pct + 5.0, y1, y2);
        }

        /// Property: the layout top edge maps to the page top and the layout
        /// bottom edge maps to y = 0.
        #[test]
        fn y_axis_extremes(w in dimension(), h in dimension(), x_pct in percent()) {
            let page = PageSize { width: w, height: h };
            let (_, top) = anchor_on_page(FieldAnchor { x_percent: x_pct, y_percent: 0.0 }, page);
            let (_, bottom) = anchor_on_page(FieldAnchor { x_percent: x_pct, y_percent: 100.0 }, page);
            prop_assert!((top - h).abs() < 1e-9);
            prop_assert!(bottom.abs() < 1e-9);
        }

        /// Property: horizontal placement is linear in the percentage.
        #[test]
        fn x_axis_is_linear(w in dimension(), h in dimension(), base in 1.0f64..45.0) {
            let page = PageSize { width: w, height: h };
            let (x1, _) = anchor_on_page(FieldAnchor { x_percent: base, y_percent: 0.0 }, page);
            let (x2, _) = anchor_on_page(FieldAnchor { x_percent: base * 2.0, y_percent: 0.0 }, page);
            prop_assert!((x2 - 2.0 * x1).abs() < 1e-6);
        }

        /// Property: artwork scaling preserves the native aspect ratio.
        #[test]
        fn placement_preserves_aspect_ratio(
            w in dimension(),
            h in dimension(),
            x_pct in percent(),
            y_pct in percent(),
            width_pct in 1.0f64..100.0,
            art_w in 1u32..4000,
            art_h in 1u32..4000,
        ) {
            let page = PageSize { width: w, height: h };
            let anchor = FieldAnchor { x_percent: x_pct, y_percent: y_pct };
            let placement = place_artwork(anchor, width_pct, art_w, art_h, page);
            let native = art_w as f64 / art_h as f64;
            let placed = placement.width / placement.height;
            prop_assert!((native - placed).abs() < 1e-6,
                "aspect ratio distorted: native {} placed {}", native, placed);
        }

        /// Property: placement origin is never negative, no matter how wide
        /// the bounding box or how close to the edge the anchor sits.
        #[test]
        fn placement_never_negative(
            w in dimension(),
            h in dimension(),
            x_pct in percent(),
            y_pct in percent(),
            width_pct in 1.0f64..100.0,
            art_w in 1u32..4000,
            art_h in 1u32..4000,
        ) {
            let page = PageSize { width: w, height: h };
            let anchor = FieldAnchor { x_percent: x_pct, y_percent: y_pct };
            let placement = place_artwork(anchor, width_pct, art_w, art_h, page);
            prop_assert!(placement.x >= 0.0);
            prop_assert!(placement.y >= 0.0);
        }

        /// Property: away from page edges the anchor is the artwork's
        /// top-center, so the artwork is centered horizontally and its top
        /// edge sits exactly at the anchor.
        #[test]
        fn anchor_is_artwork_top_center(
            w in 500.0f64..2000.0,
            h in 500.0f64..2000.0,
            x_pct in 40.0f64..60.0,
            y_pct in 40.0f64..60.0,
            art_w in 100u32..400,
            art_h in 100u32..400,
        ) {
            // Landscape-or-square artwork keeps the scaled height bounded so
            // the edge clamp cannot engage this far from the page edges.
            prop_assume!(art_w >= art_h);
            let page = PageSize { width: w, height: h };
            let anchor = FieldAnchor { x_percent: x_pct, y_percent: y_pct };
            let placement = place_artwork(anchor, 10.0, art_w, art_h, page);
            let (cx, cy) = anchor_on_page(anchor, page);
            prop_assert!((placement.x + placement.width / 2.0 - cx).abs() < 1e-6);
            prop_assert!((placement.y + placement.height - cy).abs() < 1e-6);
        }
    }
}
