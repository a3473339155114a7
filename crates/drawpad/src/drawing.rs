//! The imperative drawing surface.
//!
//! A [`Drawing`] owns a document sink, the canvas of the page being drawn,
//! and the active [`GraphicsState`]. Draw calls read the state; text calls
//! run the full layout pipeline and hand positioned glyph streams to the
//! canvas. The first draw call without an explicit page opens a default
//! 1000x1000 page, and the canvas is flipped so the origin sits bottom-left
//! with y pointing up.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use kurbo::{Affine, Rect};

use drawpad_core::error::{DrawpadError, Result};
use drawpad_core::traits::{Canvas, DocumentSink, ShapeEngine};
use drawpad_core::types::{
    Align, AxisInfo, BlendMode, Color, LineCap, LineJoin, NamedInstance, Paint,
};
use drawpad_fontdb::{FontLibrary, FontSpec};
use drawpad_shape_hr::HarfrustEngine;
use drawpad_text::layout;
use drawpad_text::{FormattedString, GraphicsState};

use crate::document::RecordingDocument;
use crate::path::{centered, BezierPath};

const DEFAULT_PAGE_SIZE: f64 = 1000.0;

pub struct Drawing<D: DocumentSink = RecordingDocument> {
    document: D,
    canvas: Option<Box<dyn Canvas>>,
    gstate: GraphicsState,
    stack: Vec<GraphicsState>,
    fonts: Arc<FontLibrary>,
    engine: Arc<dyn ShapeEngine>,
    flip_canvas: bool,
}

impl Drawing<RecordingDocument> {
    pub fn new() -> Self {
        Self::with_document(RecordingDocument::new())
    }
}

impl Default for Drawing<RecordingDocument> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: DocumentSink> Drawing<D> {
    pub fn with_document(document: D) -> Self {
        Self {
            document,
            canvas: None,
            gstate: GraphicsState::new(),
            stack: Vec::new(),
            fonts: Arc::new(FontLibrary::new()),
            engine: Arc::new(HarfrustEngine::new()),
            flip_canvas: true,
        }
    }

    pub fn with_engine(mut self, engine: Arc<dyn ShapeEngine>) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_font_library(mut self, fonts: Arc<FontLibrary>) -> Self {
        self.fonts = fonts;
        self
    }

    pub fn with_flip_canvas(mut self, flip: bool) -> Self {
        self.flip_canvas = flip;
        self
    }

    pub fn document(&self) -> &D {
        &self.document
    }

    pub fn state(&self) -> &GraphicsState {
        &self.gstate
    }

    pub fn font_library(&self) -> &Arc<FontLibrary> {
        &self.fonts
    }

    // Pages

    /// Set the size of the first page.
    ///
    /// Fails once a page is active; use [`Drawing::new_page`] to start the
    /// next one.
    pub fn size(&mut self, width: f64, height: f64) -> Result<()> {
        if self.document.is_drawing() {
            return Err(DrawpadError::UnsupportedOperation(
                "size() cannot be called when a page is already active".to_string(),
            ));
        }
        self.new_page(width, height);
        Ok(())
    }

    /// Finish the current page, if any, and start a new one.
    pub fn new_page(&mut self, width: f64, height: f64) {
        if self.document.is_drawing() {
            if let Some(canvas) = self.canvas.take() {
                self.document.end_page(canvas);
            }
        }
        let mut canvas = self.document.begin_page(width, height);
        if self.flip_canvas {
            canvas.apply_transform(
                Affine::translate((0.0, height)) * Affine::scale_non_uniform(1.0, -1.0),
            );
        }
        self.canvas = Some(canvas);
    }

    pub fn width(&self) -> Option<f64> {
        self.document.page_size().map(|(width, _)| width)
    }

    pub fn height(&self) -> Option<f64> {
        self.document.page_size().map(|(_, height)| height)
    }

    fn canvas_mut(&mut self) -> &mut dyn Canvas {
        if self.canvas.is_none() {
            self.new_page(DEFAULT_PAGE_SIZE, DEFAULT_PAGE_SIZE);
        }
        match self.canvas {
            Some(ref mut canvas) => canvas.as_mut(),
            None => unreachable!("new_page always installs a canvas"),
        }
    }

    // Shapes

    pub fn rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        let rect = Rect::new(x, y, x + w, y + h);
        self.draw_item(|canvas, paint| canvas.draw_rect(rect, paint));
    }

    pub fn oval(&mut self, x: f64, y: f64, w: f64, h: f64) {
        let rect = Rect::new(x, y, x + w, y + h);
        self.draw_item(|canvas, paint| canvas.draw_oval(rect, paint));
    }

    pub fn line(&mut self, from: (f64, f64), to: (f64, f64)) {
        let mut path = BezierPath::new();
        path.move_to(from);
        path.line_to(to);
        self.draw_path(&path);
    }

    pub fn polygon(&mut self, points: &[(f64, f64)], close: bool) {
        let mut path = BezierPath::new();
        path.add_polygon(points, close);
        self.draw_path(&path);
    }

    pub fn draw_path(&mut self, path: &BezierPath) {
        let bez = path.as_bez_path();
        self.draw_item(|canvas, paint| canvas.draw_path(bez, paint));
    }

    /// Issue one canvas call per active paint phase, fill first.
    fn draw_item(&mut self, draw: impl Fn(&mut dyn Canvas, &Paint)) {
        let fill = self.gstate.fill().paint();
        let stroke = self.gstate.stroke().paint();
        let canvas = self.canvas_mut();
        if let Some(paint) = fill {
            draw(&mut *canvas, &paint);
        }
        if let Some(paint) = stroke {
            draw(&mut *canvas, &paint);
        }
    }

    // Paint state

    /// `None` disables filling.
    pub fn fill(&mut self, color: Option<Color>) {
        self.gstate.set_fill_color(color);
    }

    /// `None` disables stroking.
    pub fn stroke(&mut self, color: Option<Color>) {
        self.gstate.set_stroke_color(color);
    }

    pub fn stroke_width(&mut self, width: f32) {
        self.gstate.set_stroke_width(width);
    }

    pub fn line_cap(&mut self, cap: LineCap) {
        self.gstate.set_line_cap(cap);
    }

    pub fn line_join(&mut self, join: LineJoin) {
        self.gstate.set_line_join(join);
    }

    pub fn miter_limit(&mut self, limit: f32) {
        self.gstate.set_miter_limit(limit);
    }

    pub fn blend_mode(&mut self, mode: BlendMode) {
        self.gstate.set_blend_mode(mode);
    }

    // Text state

    /// Select a font by file path or installed family name.
    pub fn font(&mut self, name_or_path: &str) {
        self.gstate.set_font(FontSpec::parse(name_or_path));
    }

    pub fn font_size(&mut self, size: f32) {
        self.gstate.set_font_size(size);
    }

    /// Merge OpenType feature settings; returns the map now in effect.
    pub fn open_type_features(
        &mut self,
        updates: &BTreeMap<String, u32>,
        reset: bool,
    ) -> BTreeMap<String, u32> {
        self.gstate.set_open_type_features(updates, reset)
    }

    /// Merge variation coordinates; returns the location now in effect.
    pub fn font_variations(
        &mut self,
        updates: &BTreeMap<String, f32>,
        reset: bool,
    ) -> BTreeMap<String, f32> {
        self.gstate.set_font_variations(updates, reset)
    }

    pub fn language(&mut self, language: Option<&str>) {
        self.gstate.set_language(language.map(str::to_string));
    }

    pub fn text_align(&mut self, align: Option<Align>) {
        self.gstate.set_align(align);
    }

    /// Design axes of the active font.
    pub fn font_variation_axes(&self) -> Result<Vec<AxisInfo>> {
        let asset = self.gstate.text().resolved(&self.fonts)?;
        Ok(asset.variation_axes())
    }

    /// Named instances of the active font.
    pub fn font_named_instances(&self) -> Result<Vec<NamedInstance>> {
        let asset = self.gstate.text().resolved(&self.fonts)?;
        Ok(asset.named_instances())
    }

    // Text

    /// Draw a plain string at `position` with the active style.
    ///
    /// Empty text is a no-op, not an error. Alignment falls back to the
    /// style's alignment, then to the paragraph direction.
    pub fn text(&mut self, text: &str, position: (f64, f64), align: Option<Align>) -> Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        let streams = layout::shape_text(
            text,
            &self.gstate,
            self.fonts.as_ref(),
            self.engine.as_ref(),
            self.flip_canvas,
        )?;
        self.draw_glyph_streams(streams, position, align)
    }

    /// Draw a formatted string at `position`.
    pub fn text_formatted(
        &mut self,
        formatted: &FormattedString,
        position: (f64, f64),
        align: Option<Align>,
    ) -> Result<()> {
        if formatted.is_empty() {
            return Ok(());
        }
        let streams = layout::shape_formatted(
            formatted,
            self.fonts.as_ref(),
            self.engine.as_ref(),
            self.flip_canvas,
        )?;
        self.draw_glyph_streams(streams, position, align)
    }

    fn draw_glyph_streams(
        &mut self,
        mut streams: Vec<drawpad_core::types::GlyphRun>,
        position: (f64, f64),
        align: Option<Align>,
    ) -> Result<()> {
        let align = align.or(self.gstate.text().align());
        layout::align_glyph_runs(&mut streams, align);
        let fill = self.gstate.fill().paint();
        let stroke = self.gstate.stroke().paint();
        let flip = self.flip_canvas;
        let canvas = self.canvas_mut();
        canvas.save();
        canvas.apply_transform(Affine::translate(position));
        if flip {
            // Glyph streams are produced y-down; undo the page flip around
            // the baseline.
            canvas.apply_transform(Affine::scale_non_uniform(1.0, -1.0));
        }
        for stream in &streams {
            if let Some(ref paint) = fill {
                canvas.draw_glyph_run(stream, paint);
            }
            if let Some(ref paint) = stroke {
                canvas.draw_glyph_run(stream, paint);
            }
        }
        canvas.restore();
        Ok(())
    }

    // Transforms

    pub fn translate(&mut self, x: f64, y: f64) {
        self.transform(Affine::translate((x, y)));
    }

    pub fn rotate(&mut self, degrees: f64, center: (f64, f64)) {
        self.transform(centered(Affine::rotate(degrees.to_radians()), center));
    }

    pub fn scale(&mut self, sx: f64, sy: f64, center: (f64, f64)) {
        self.transform(centered(Affine::scale_non_uniform(sx, sy), center));
    }

    pub fn skew(&mut self, x_degrees: f64, y_degrees: f64, center: (f64, f64)) {
        self.transform(centered(
            Affine::skew(x_degrees.to_radians().tan(), y_degrees.to_radians().tan()),
            center,
        ));
    }

    pub fn transform(&mut self, affine: Affine) {
        self.canvas_mut().apply_transform(affine);
    }

    // State stack

    /// Push an O(1) copy of the graphics state and a canvas save.
    pub fn save_state(&mut self) {
        self.stack.push(self.gstate.clone());
        self.canvas_mut().save();
    }

    /// Pop the stack. A restore without a matching save is a programming
    /// error and panics.
    pub fn restore_state(&mut self) {
        let Some(saved) = self.stack.pop() else {
            panic!("restore_state without a matching save_state");
        };
        self.canvas_mut().restore();
        self.gstate = saved;
    }

    /// Run `body` inside a saved-state scope; the state is restored on the
    /// way out, including on early return from the closure's value.
    pub fn with_saved_state<R>(&mut self, body: impl FnOnce(&mut Self) -> R) -> R {
        self.save_state();
        let result = body(self);
        self.restore_state();
        result
    }

    // Output

    /// Finish the current page and write the document.
    ///
    /// The format is inferred from the path's extension; an unrecognized
    /// extension is an error.
    pub fn save_image(&mut self, path: impl AsRef<Path>) -> Result<()> {
        if self.document.is_drawing() {
            if let Some(canvas) = self.canvas.take() {
                self.document.end_page(canvas);
            }
        }
        self.document.save(path.as_ref())
    }
}
