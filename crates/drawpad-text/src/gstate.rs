//! The copy-on-write graphics state.
//!
//! A [`GraphicsState`] is three independently-versioned style references.
//! Cloning is O(1) and shares all three; every mutator replaces exactly the
//! one reference it changes with a freshly-built style value. A saved copy
//! therefore never observes mutation made after the save.

use std::collections::BTreeMap;
use std::sync::Arc;

use drawpad_core::error::Result;
use drawpad_core::types::{Align, BlendMode, Color, LineCap, LineJoin};
use drawpad_fontdb::FontSpec;

use crate::style::{FillStyle, PropertyValue, StrokeStyle, StyleProperty, TextStyle};

#[derive(Debug, Clone)]
pub struct GraphicsState {
    fill: Arc<FillStyle>,
    stroke: Arc<StrokeStyle>,
    text: Arc<TextStyle>,
}

impl GraphicsState {
    pub fn new() -> Self {
        Self {
            fill: Arc::new(FillStyle::new()),
            stroke: Arc::new(StrokeStyle::new()),
            text: Arc::new(TextStyle::new()),
        }
    }

    pub fn from_parts(
        fill: Arc<FillStyle>,
        stroke: Arc<StrokeStyle>,
        text: Arc<TextStyle>,
    ) -> Self {
        Self { fill, stroke, text }
    }

    pub fn fill(&self) -> &Arc<FillStyle> {
        &self.fill
    }

    pub fn stroke(&self) -> &Arc<StrokeStyle> {
        &self.stroke
    }

    pub fn text(&self) -> &Arc<TextStyle> {
        &self.text
    }

    pub fn set_fill_color(&mut self, color: Option<Color>) {
        self.fill = Arc::new(self.fill.with_color(color));
    }

    pub fn set_stroke_color(&mut self, color: Option<Color>) {
        self.stroke = Arc::new(self.stroke.with_color(color));
    }

    pub fn set_stroke_width(&mut self, width: f32) {
        self.stroke = Arc::new(self.stroke.with_width(width));
    }

    pub fn set_line_cap(&mut self, cap: LineCap) {
        self.stroke = Arc::new(self.stroke.with_cap(cap));
    }

    pub fn set_line_join(&mut self, join: LineJoin) {
        self.stroke = Arc::new(self.stroke.with_join(join));
    }

    pub fn set_miter_limit(&mut self, miter_limit: f32) {
        self.stroke = Arc::new(self.stroke.with_miter_limit(miter_limit));
    }

    /// Blend mode applies to both paint phases.
    pub fn set_blend_mode(&mut self, blend_mode: BlendMode) {
        self.fill = Arc::new(self.fill.with_blend_mode(blend_mode));
        self.stroke = Arc::new(self.stroke.with_blend_mode(blend_mode));
    }

    pub fn set_font(&mut self, font: FontSpec) {
        self.text = Arc::new(self.text.with_font(font));
    }

    pub fn set_font_size(&mut self, size: f32) {
        self.text = Arc::new(self.text.with_font_size(size));
    }

    /// Merge feature settings into the active style.
    ///
    /// Returns the feature map now in effect.
    pub fn set_open_type_features(
        &mut self,
        updates: &BTreeMap<String, u32>,
        reset: bool,
    ) -> BTreeMap<String, u32> {
        let merged = self.text.merged_features(updates, reset);
        self.text = Arc::new(self.text.with_features(merged.clone()));
        merged
    }

    /// Merge variation coordinates into the active style.
    ///
    /// Returns the design-space location now in effect.
    pub fn set_font_variations(
        &mut self,
        updates: &BTreeMap<String, f32>,
        reset: bool,
    ) -> BTreeMap<String, f32> {
        let merged = self.text.merged_variations(updates, reset);
        self.text = Arc::new(self.text.with_variations(merged.clone()));
        merged
    }

    pub fn set_language(&mut self, language: Option<String>) {
        self.text = Arc::new(self.text.with_language(language));
    }

    pub fn set_align(&mut self, align: Option<Align>) {
        self.text = Arc::new(self.text.with_align(align));
    }

    /// Dispatch one typed property to its setter.
    pub fn apply(&mut self, property: &StyleProperty) {
        match property {
            StyleProperty::Fill(color) => self.set_fill_color(*color),
            StyleProperty::Stroke(color) => self.set_stroke_color(*color),
            StyleProperty::StrokeWidth(width) => self.set_stroke_width(*width),
            StyleProperty::LineCap(cap) => self.set_line_cap(*cap),
            StyleProperty::LineJoin(join) => self.set_line_join(*join),
            StyleProperty::MiterLimit(limit) => self.set_miter_limit(*limit),
            StyleProperty::BlendMode(mode) => self.set_blend_mode(*mode),
            StyleProperty::Font(font) => self.set_font(font.clone()),
            StyleProperty::FontSize(size) => self.set_font_size(*size),
            StyleProperty::OpenTypeFeatures { features, reset } => {
                self.set_open_type_features(features, *reset);
            }
            StyleProperty::FontVariations { variations, reset } => {
                self.set_font_variations(variations, *reset);
            }
            StyleProperty::Language(language) => self.set_language(language.clone()),
            StyleProperty::Align(align) => self.set_align(*align),
        }
    }

    pub fn apply_all(&mut self, properties: &[StyleProperty]) {
        for property in properties {
            self.apply(property);
        }
    }

    /// Name-based dispatch for dynamic callers.
    pub fn apply_by_name(&mut self, name: &str, value: PropertyValue) -> Result<()> {
        let property = StyleProperty::by_name(name, value)?;
        self.apply(&property);
        Ok(())
    }
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for GraphicsState {
    fn eq(&self, other: &Self) -> bool {
        self.fill == other.fill && self.stroke == other.stroke && self.text == other.text
    }
}
