//! Immutable style values.
//!
//! `FillStyle`, `StrokeStyle`, and `TextStyle` are value-equal property
//! bags. "Mutation" always produces a new instance via a `with_*` method;
//! unset fields are shared with the source. Each instance memoizes one
//! derived object (a resolved [`Paint`] or a resolved face) that is built
//! at most once and never recomputed for that instance.

use std::collections::BTreeMap;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use drawpad_core::error::{DrawpadError, FontLoadError, Result};
use drawpad_core::types::{Align, BlendMode, Color, LineCap, LineJoin, Paint, PaintStyle};
use drawpad_fontdb::{FontAsset, FontLibrary, FontSpec};

/// Fill phase of a draw call. `color: None` means "do not fill".
#[derive(Debug)]
pub struct FillStyle {
    color: Option<Color>,
    blend_mode: BlendMode,
    paint: OnceCell<Arc<Paint>>,
}

impl FillStyle {
    pub fn new() -> Self {
        Self {
            color: Some(Color::BLACK),
            blend_mode: BlendMode::SourceOver,
            paint: OnceCell::new(),
        }
    }

    pub fn with_color(&self, color: Option<Color>) -> Self {
        Self {
            color,
            blend_mode: self.blend_mode,
            paint: OnceCell::new(),
        }
    }

    pub fn with_blend_mode(&self, blend_mode: BlendMode) -> Self {
        Self {
            color: self.color,
            blend_mode,
            paint: OnceCell::new(),
        }
    }

    pub fn color(&self) -> Option<Color> {
        self.color
    }

    pub fn blend_mode(&self) -> BlendMode {
        self.blend_mode
    }

    pub fn is_visible(&self) -> bool {
        self.color.is_some()
    }

    /// The resolved paint, built once per instance.
    ///
    /// Returns `None` when filling is disabled.
    pub fn paint(&self) -> Option<Arc<Paint>> {
        let color = self.color?;
        let paint = self.paint.get_or_init(|| {
            Arc::new(Paint {
                color,
                blend_mode: self.blend_mode,
                anti_alias: true,
                style: PaintStyle::Fill,
            })
        });
        Some(Arc::clone(paint))
    }
}

impl Default for FillStyle {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for FillStyle {
    fn eq(&self, other: &Self) -> bool {
        self.color == other.color && self.blend_mode == other.blend_mode
    }
}

/// Stroke phase of a draw call. `color: None` means "do not stroke".
#[derive(Debug)]
pub struct StrokeStyle {
    color: Option<Color>,
    width: f32,
    cap: LineCap,
    join: LineJoin,
    miter_limit: f32,
    blend_mode: BlendMode,
    paint: OnceCell<Arc<Paint>>,
}

impl StrokeStyle {
    pub fn new() -> Self {
        Self {
            color: None,
            width: 1.0,
            cap: LineCap::Butt,
            join: LineJoin::Miter,
            // Wider than the common 4.0 so shallow joins stay mitered.
            miter_limit: 5.0,
            blend_mode: BlendMode::SourceOver,
            paint: OnceCell::new(),
        }
    }

    fn derive(&self) -> Self {
        Self {
            color: self.color,
            width: self.width,
            cap: self.cap,
            join: self.join,
            miter_limit: self.miter_limit,
            blend_mode: self.blend_mode,
            paint: OnceCell::new(),
        }
    }

    pub fn with_color(&self, color: Option<Color>) -> Self {
        Self {
            color,
            ..self.derive()
        }
    }

    pub fn with_width(&self, width: f32) -> Self {
        Self {
            width,
            ..self.derive()
        }
    }

    pub fn with_cap(&self, cap: LineCap) -> Self {
        Self {
            cap,
            ..self.derive()
        }
    }

    pub fn with_join(&self, join: LineJoin) -> Self {
        Self {
            join,
            ..self.derive()
        }
    }

    pub fn with_miter_limit(&self, miter_limit: f32) -> Self {
        Self {
            miter_limit,
            ..self.derive()
        }
    }

    pub fn with_blend_mode(&self, blend_mode: BlendMode) -> Self {
        Self {
            blend_mode,
            ..self.derive()
        }
    }

    pub fn color(&self) -> Option<Color> {
        self.color
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn cap(&self) -> LineCap {
        self.cap
    }

    pub fn join(&self) -> LineJoin {
        self.join
    }

    pub fn miter_limit(&self) -> f32 {
        self.miter_limit
    }

    pub fn blend_mode(&self) -> BlendMode {
        self.blend_mode
    }

    pub fn is_visible(&self) -> bool {
        self.color.is_some()
    }

    /// The resolved paint, built once per instance.
    pub fn paint(&self) -> Option<Arc<Paint>> {
        let color = self.color?;
        let paint = self.paint.get_or_init(|| {
            Arc::new(Paint {
                color,
                blend_mode: self.blend_mode,
                anti_alias: true,
                style: PaintStyle::Stroke {
                    width: self.width,
                    cap: self.cap,
                    join: self.join,
                    miter_limit: self.miter_limit,
                },
            })
        });
        Some(Arc::clone(paint))
    }
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for StrokeStyle {
    fn eq(&self, other: &Self) -> bool {
        self.color == other.color
            && self.width == other.width
            && self.cap == other.cap
            && self.join == other.join
            && self.miter_limit == other.miter_limit
            && self.blend_mode == other.blend_mode
    }
}

/// Everything that determines how text shapes and renders.
#[derive(Debug)]
pub struct TextStyle {
    font: FontSpec,
    font_size: f32,
    features: BTreeMap<String, u32>,
    variations: BTreeMap<String, f32>,
    language: Option<String>,
    align: Option<Align>,
    resolved: OnceCell<Arc<FontAsset>>,
}

impl TextStyle {
    pub fn new() -> Self {
        Self {
            font: FontSpec::Family("sans-serif".to_string()),
            font_size: 10.0,
            features: BTreeMap::new(),
            variations: BTreeMap::new(),
            language: None,
            align: None,
            resolved: OnceCell::new(),
        }
    }

    fn derive(&self) -> Self {
        Self {
            font: self.font.clone(),
            font_size: self.font_size,
            features: self.features.clone(),
            variations: self.variations.clone(),
            language: self.language.clone(),
            align: self.align,
            resolved: OnceCell::new(),
        }
    }

    pub fn with_font(&self, font: FontSpec) -> Self {
        Self {
            font,
            ..self.derive()
        }
    }

    pub fn with_font_size(&self, font_size: f32) -> Self {
        Self {
            font_size,
            ..self.derive()
        }
    }

    pub fn with_features(&self, features: BTreeMap<String, u32>) -> Self {
        Self {
            features,
            ..self.derive()
        }
    }

    pub fn with_variations(&self, variations: BTreeMap<String, f32>) -> Self {
        Self {
            variations,
            ..self.derive()
        }
    }

    pub fn with_language(&self, language: Option<String>) -> Self {
        Self {
            language,
            ..self.derive()
        }
    }

    pub fn with_align(&self, align: Option<Align>) -> Self {
        Self {
            align,
            ..self.derive()
        }
    }

    pub fn font(&self) -> &FontSpec {
        &self.font
    }

    pub fn font_size(&self) -> f32 {
        self.font_size
    }

    pub fn features(&self) -> &BTreeMap<String, u32> {
        &self.features
    }

    pub fn variations(&self) -> &BTreeMap<String, f32> {
        &self.variations
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    pub fn align(&self) -> Option<Align> {
        self.align
    }

    /// The current feature map with `updates` folded in.
    pub fn merged_features(
        &self,
        updates: &BTreeMap<String, u32>,
        reset: bool,
    ) -> BTreeMap<String, u32> {
        let mut merged = if reset {
            BTreeMap::new()
        } else {
            self.features.clone()
        };
        merged.extend(updates.iter().map(|(k, v)| (k.clone(), *v)));
        merged
    }

    /// The current variation map with `updates` folded in.
    pub fn merged_variations(
        &self,
        updates: &BTreeMap<String, f32>,
        reset: bool,
    ) -> BTreeMap<String, f32> {
        let mut merged = if reset {
            BTreeMap::new()
        } else {
            self.variations.clone()
        };
        merged.extend(updates.iter().map(|(k, v)| (k.clone(), *v)));
        merged
    }

    /// Resolve the font through the library, once per instance.
    ///
    /// The result is memoized on this style; a new instance (any `with_*`
    /// call) resolves afresh.
    pub fn resolved(&self, library: &FontLibrary) -> std::result::Result<Arc<FontAsset>, FontLoadError> {
        self.resolved
            .get_or_try_init(|| library.get(&self.font))
            .map(Arc::clone)
    }
}

impl Default for TextStyle {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for TextStyle {
    fn eq(&self, other: &Self) -> bool {
        self.font == other.font
            && self.font_size == other.font_size
            && self.features == other.features
            && self.variations == other.variations
            && self.language == other.language
            && self.align == other.align
    }
}

/// The closed set of settable style properties.
///
/// This replaces name-string dispatch for typed callers; the names remain
/// reachable through [`StyleProperty::by_name`] for dynamic surfaces.
#[derive(Debug, Clone, PartialEq)]
pub enum StyleProperty {
    Fill(Option<Color>),
    Stroke(Option<Color>),
    StrokeWidth(f32),
    LineCap(LineCap),
    LineJoin(LineJoin),
    MiterLimit(f32),
    BlendMode(BlendMode),
    Font(FontSpec),
    FontSize(f32),
    OpenTypeFeatures {
        features: BTreeMap<String, u32>,
        reset: bool,
    },
    FontVariations {
        variations: BTreeMap<String, f32>,
        reset: bool,
    },
    Language(Option<String>),
    Align(Option<Align>),
}

/// Loosely-typed value for the by-name property surface.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Number(f64),
    Color(Option<Color>),
    Name(String),
    Features(BTreeMap<String, u32>),
    Variations(BTreeMap<String, f32>),
}

impl StyleProperty {
    /// Look up a property by its public name.
    ///
    /// An unrecognized name is an [`DrawpadError::UnknownProperty`]; a value
    /// of the wrong shape for a known name is an unsupported operation.
    pub fn by_name(name: &str, value: PropertyValue) -> Result<Self> {
        use PropertyValue as V;
        let mismatch = |name: &str, value: &V| {
            DrawpadError::UnsupportedOperation(format!(
                "property '{name}' cannot take value {value:?}"
            ))
        };
        Ok(match (name, value) {
            ("fill", V::Color(color)) => Self::Fill(color),
            ("stroke", V::Color(color)) => Self::Stroke(color),
            ("strokeWidth", V::Number(width)) => Self::StrokeWidth(width as f32),
            ("lineCap", V::Name(ref cap)) => Self::LineCap(
                LineCap::from_name(cap).ok_or_else(|| mismatch(name, &V::Name(cap.clone())))?,
            ),
            ("lineJoin", V::Name(ref join)) => Self::LineJoin(
                LineJoin::from_name(join).ok_or_else(|| mismatch(name, &V::Name(join.clone())))?,
            ),
            ("miterLimit", V::Number(limit)) => Self::MiterLimit(limit as f32),
            ("blendMode", V::Name(ref mode)) => Self::BlendMode(
                BlendMode::from_name(mode).ok_or_else(|| mismatch(name, &V::Name(mode.clone())))?,
            ),
            ("font", V::Name(ref font)) => Self::Font(FontSpec::parse(font)),
            ("fontSize", V::Number(size)) => Self::FontSize(size as f32),
            ("openTypeFeatures", V::Features(features)) => Self::OpenTypeFeatures {
                features,
                reset: false,
            },
            ("fontVariations", V::Variations(variations)) => Self::FontVariations {
                variations,
                reset: false,
            },
            ("language", V::Name(language)) => Self::Language(Some(language)),
            ("align", V::Name(ref align)) => Self::Align(Some(
                Align::from_name(align).ok_or_else(|| mismatch(name, &V::Name(align.clone())))?,
            )),
            (
                "fill" | "stroke" | "strokeWidth" | "lineCap" | "lineJoin" | "miterLimit"
                | "blendMode" | "font" | "fontSize" | "openTypeFeatures" | "fontVariations"
                | "language" | "align",
                ref value,
            ) => return Err(mismatch(name, value)),
            _ => return Err(DrawpadError::UnknownProperty(name.to_string())),
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Fill(_) => "fill",
            Self::Stroke(_) => "stroke",
            Self::StrokeWidth(_) => "strokeWidth",
            Self::LineCap(_) => "lineCap",
            Self::LineJoin(_) => "lineJoin",
            Self::MiterLimit(_) => "miterLimit",
            Self::BlendMode(_) => "blendMode",
            Self::Font(_) => "font",
            Self::FontSize(_) => "fontSize",
            Self::OpenTypeFeatures { .. } => "openTypeFeatures",
            Self::FontVariations { .. } => "fontVariations",
            Self::Language(_) => "language",
            Self::Align(_) => "align",
        }
    }
}
