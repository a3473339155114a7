//! The collaborator contracts the core builds against
//!
//! Four seams: font data ([`FaceRef`]), glyph shaping ([`ShapeEngine`]),
//! draw primitives ([`Canvas`]), and page management ([`DocumentSink`]).
//! Everything behind them is replaceable without touching the text model.

use std::path::Path;
use std::sync::Arc;

use kurbo::{Affine, BezPath, Rect};

use crate::error::Result;
use crate::types::{GlyphId, GlyphRun, Paint, ShapeParams, ShapedRun};

/// Your window into font data and metrics
///
/// Shaping engines read the raw table bytes; the fallback path uses the
/// cmap and advance lookups directly.
pub trait FaceRef: Send + Sync {
    /// Raw font bytes as they live in the file
    fn data(&self) -> &[u8];

    /// The font's internal coordinate system scale
    fn units_per_em(&self) -> u16;

    /// Find the glyph that represents this character
    fn glyph_id(&self, ch: char) -> Option<GlyphId>;

    /// Advance width of a glyph, in font units
    fn advance_width(&self, glyph_id: GlyphId) -> f32;
}

/// Where characters become glyphs
///
/// Assumed stateless per call aside from internal engine caches. Returned
/// glyph positions are local to the shaped run; the layout layer applies
/// the running cursor.
pub trait ShapeEngine: Send + Sync {
    /// Identify yourself in logs and error messages
    fn name(&self) -> &'static str;

    fn shape(&self, text: &str, face: Arc<dyn FaceRef>, params: &ShapeParams)
        -> Result<ShapedRun>;
}

/// Draw primitives on the current page
///
/// Each call takes exactly one paint; callers wanting fill and stroke issue
/// two calls, fill first.
pub trait Canvas {
    fn draw_rect(&mut self, rect: Rect, paint: &Paint);

    fn draw_oval(&mut self, rect: Rect, paint: &Paint);

    fn draw_path(&mut self, path: &BezPath, paint: &Paint);

    fn draw_glyph_run(&mut self, run: &GlyphRun, paint: &Paint);

    fn save(&mut self);

    fn restore(&mut self);

    /// Concatenate a transform onto the current matrix.
    fn apply_transform(&mut self, affine: Affine);
}

/// Page and output management
///
/// A sink hands out one canvas per page and takes it back at `end_page`;
/// `save` infers the encoding from the path's extension and fails with an
/// unknown-format error for unrecognized suffixes.
pub trait DocumentSink {
    fn begin_page(&mut self, width: f64, height: f64) -> Box<dyn Canvas>;

    fn end_page(&mut self, canvas: Box<dyn Canvas>);

    fn is_drawing(&self) -> bool;

    /// Size of the page currently being drawn, if any.
    fn page_size(&self) -> Option<(f64, f64)>;

    fn save(&mut self, path: &Path) -> Result<()>;
}
