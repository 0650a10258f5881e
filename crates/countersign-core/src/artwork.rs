//! Raster artwork production
//!
//! Turns a signer's capture input — a freehand stroke path, typed text with
//! a cursive face, or an uploaded PNG — into raster artwork ready for
//! embedding. Everything here is a pure function of its input: no drawing
//! surface, no filesystem, no clock (callers pass the date in), which is
//! what makes preview and embedded output agree.

use chrono::NaiveDate;
use image::codecs::png::PngEncoder;
use image::{ColorType, ImageBuffer, ImageEncoder, Rgba};
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut, draw_text_mut};
use rusttype::{point, Font, Scale};
use serde::{Deserialize, Serialize};

use crate::error::SigningError;
use crate::field::FieldKind;

/// Fixed canvas for freehand capture, matching the capture surface's aspect.
pub const STROKE_CANVAS_WIDTH: u32 = 400;
pub const STROKE_CANVAS_HEIGHT: u32 = 150;

/// Pen width bounds in canvas pixels. Below the minimum the stroke turns
/// illegible once scaled down into the field box; above the maximum the pen
/// swallows the handwriting detail.
pub const MIN_PEN_WIDTH: f32 = 2.0;
pub const MAX_PEN_WIDTH: f32 = 6.0;
pub const DEFAULT_PEN_WIDTH: f32 = 3.0;

const SIGNATURE_POINT_SIZE: f32 = 48.0;
const INITIALS_POINT_SIZE: f32 = 32.0;
const DATE_POINT_SIZE: f32 = 18.0;

/// Padding around rendered text, in pixels.
const TEXT_PADDING: u32 = 12;

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// A point on the capture canvas, in canvas pixels, top-left origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrokePoint {
    pub x: f32,
    pub y: f32,
}

/// Raster artwork: an RGBA pixel buffer with its dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct Artwork {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl Artwork {
    /// Native pixel aspect ratio (width over height).
    pub fn aspect_ratio(&self) -> f64 {
        self.width as f64 / self.height.max(1) as f64
    }

    /// Encode to PNG. Deterministic for a given pixel buffer.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>, SigningError> {
        let mut out = Vec::new();
        PngEncoder::new(&mut out)
            .write_image(&self.rgba, self.width, self.height, ColorType::Rgba8)
            .map_err(|e| SigningError::ArtworkDecode(format!("PNG encode failed: {e}")))?;
        Ok(out)
    }

    /// Decode uploaded PNG bytes into artwork.
    pub fn from_png_bytes(bytes: &[u8]) -> Result<Self, SigningError> {
        let img = image::load_from_memory_with_format(bytes, image::ImageFormat::Png)
            .map_err(|e| SigningError::ArtworkDecode(e.to_string()))?
            .to_rgba8();
        let (width, height) = img.dimensions();
        Ok(Self {
            width,
            height,
            rgba: img.into_raw(),
        })
    }
}

/// A named typeface loaded from caller-supplied font bytes. The host keeps
/// its own catalog of cursive faces; the engine only ever sees one resolved
/// face at a time.
pub struct TypeFace {
    name: String,
    font: Font<'static>,
}

impl TypeFace {
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Result<Self, SigningError> {
        let name = name.into();
        let font = Font::try_from_vec(bytes).ok_or_else(|| {
            SigningError::ArtworkDecode(format!("font {name}: not a valid TTF/OTF"))
        })?;
        Ok(Self { name, font })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A rendered date stamp: the raster plus the literal text, kept together
/// because the document mutator prefers drawing the text natively.
#[derive(Debug, Clone, PartialEq)]
pub struct DateStamp {
    pub artwork: Artwork,
    pub text: String,
}

/// Rasterize a freehand stroke path with the default pen.
pub fn rasterize_stroke(points: &[StrokePoint]) -> Result<Artwork, SigningError> {
    rasterize_stroke_with_pen(points, DEFAULT_PEN_WIDTH)
}

/// Rasterize a freehand stroke path onto the fixed capture canvas.
///
/// The pen width is clamped into `[MIN_PEN_WIDTH, MAX_PEN_WIDTH]`. The
/// background is opaque white so the artwork scans like ink on paper when
/// embedded.
pub fn rasterize_stroke_with_pen(
    points: &[StrokePoint],
    pen_width: f32,
) -> Result<Artwork, SigningError> {
    if points.is_empty() {
        return Err(SigningError::EmptyInput);
    }

    let pen = pen_width.clamp(MIN_PEN_WIDTH, MAX_PEN_WIDTH);
    let radius = ((pen / 2.0).round() as i32).max(1);

    let mut canvas: ImageBuffer<Rgba<u8>, Vec<u8>> =
        ImageBuffer::from_pixel(STROKE_CANVAS_WIDTH, STROKE_CANVAS_HEIGHT, WHITE);

    let clamp = |p: &StrokePoint| -> (f32, f32) {
        (
            p.x.clamp(0.0, (STROKE_CANVAS_WIDTH - 1) as f32),
            p.y.clamp(0.0, (STROKE_CANVAS_HEIGHT - 1) as f32),
        )
    };

    let first = clamp(&points[0]);
    draw_filled_circle_mut(&mut canvas, (first.0 as i32, first.1 as i32), radius, BLACK);

    for pair in points.windows(2) {
        let start = clamp(&pair[0]);
        let end = clamp(&pair[1]);
        draw_line_segment_mut(&mut canvas, start, end, BLACK);
        stamp_segment(&mut canvas, start, end, radius);
        draw_filled_circle_mut(&mut canvas, (end.0 as i32, end.1 as i32), radius, BLACK);
    }

    let (width, height) = canvas.dimensions();
    Ok(Artwork {
        width,
        height,
        rgba: canvas.into_raw(),
    })
}

/// Stamp pen-width circles along a segment at one-pixel intervals so the
/// stroke has uniform thickness rather than a hairline with thick joints.
fn stamp_segment(
    canvas: &mut ImageBuffer<Rgba<u8>, Vec<u8>>,
    start: (f32, f32),
    end: (f32, f32),
    radius: i32,
) {
    let dx = end.0 - start.0;
    let dy = end.1 - start.1;
    let length = (dx * dx + dy * dy).sqrt();
    let steps = length.ceil() as i32;
    for i in 1..steps {
        let t = i as f32 / steps as f32;
        let x = start.0 + dx * t;
        let y = start.1 + dy * t;
        draw_filled_circle_mut(canvas, (x as i32, y as i32), radius, BLACK);
    }
}

/// Render typed text in the given face at the fixed point size for the field
/// kind, auto-sizing the canvas to the measured text bounds plus padding.
/// Deterministic for a given (text, face) pair.
pub fn render_typed(
    text: &str,
    face: &TypeFace,
    kind: FieldKind,
) -> Result<Artwork, SigningError> {
    let size = match kind {
        FieldKind::Signature => SIGNATURE_POINT_SIZE,
        FieldKind::Initials => INITIALS_POINT_SIZE,
        _ => DATE_POINT_SIZE,
    };
    render_text(text, &face.font, size)
}

/// Format a date the way it appears on the document: "January 16, 2026".
pub fn format_long_date(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

/// Render a date stamp with a neutral (non-cursive) face. Callers pass
/// `Utc::now().date_naive()`; taking the date as a parameter keeps the
/// renderer deterministic.
pub fn render_date_stamp(face: &TypeFace, date: NaiveDate) -> Result<DateStamp, SigningError> {
    let text = format_long_date(date);
    let artwork = render_text(&text, &face.font, DATE_POINT_SIZE)?;
    Ok(DateStamp { artwork, text })
}

fn render_text(text: &str, font: &Font<'static>, size: f32) -> Result<Artwork, SigningError> {
    if text.trim().is_empty() {
        return Err(SigningError::EmptyInput);
    }

    let scale = Scale::uniform(size);
    let v_metrics = font.v_metrics(scale);
    let glyphs: Vec<_> = font.layout(text, scale, point(0.0, v_metrics.ascent)).collect();

    let min_x = glyphs
        .iter()
        .filter_map(|g| g.pixel_bounding_box())
        .map(|bb| bb.min.x)
        .min()
        .unwrap_or(0);
    let max_x = glyphs
        .iter()
        .filter_map(|g| g.pixel_bounding_box())
        .map(|bb| bb.max.x)
        .max()
        .unwrap_or(1);

    let text_width = (max_x - min_x).max(1) as u32;
    let text_height = (v_metrics.ascent - v_metrics.descent).ceil().max(1.0) as u32;
    let width = text_width + 2 * TEXT_PADDING;
    let height = text_height + 2 * TEXT_PADDING;

    let mut canvas: ImageBuffer<Rgba<u8>, Vec<u8>> = ImageBuffer::from_pixel(width, height, WHITE);
    draw_text_mut(
        &mut canvas,
        BLACK,
        TEXT_PADDING as i32 - min_x,
        TEXT_PADDING as i32,
        scale,
        font,
        text,
    );

    Ok(Artwork {
        width,
        height,
        rgba: canvas.into_raw(),
    })
}
