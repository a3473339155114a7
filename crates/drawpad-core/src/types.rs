//! The data structures shared across the drawing surface and the text pipeline

use std::path::Path;

use crate::error::ExportError;

/// Unique identifier for a glyph within a font
pub type GlyphId = u32;

/// Simple RGBA color that works everywhere
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Self = Self::rgba8(0, 0, 0, 255);
    pub const WHITE: Self = Self::rgba8(255, 255, 255, 255);

    pub const fn rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Grayscale from a unit-range component.
    pub fn gray(v: f32) -> Self {
        Self::rgba(v, v, v, 1.0)
    }

    pub fn gray_alpha(v: f32, a: f32) -> Self {
        Self::rgba(v, v, v, a)
    }

    pub fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::rgba(r, g, b, 1.0)
    }

    /// From unit-range components, clamped and rounded to 8 bits.
    pub fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        let quantize = |v: f32| (v * 255.0).round().clamp(0.0, 255.0) as u8;
        Self {
            r: quantize(r),
            g: quantize(g),
            b: quantize(b),
            a: quantize(a),
        }
    }

    /// Drawbot-style component list: gray / gray+alpha / rgb / rgba.
    ///
    /// Panics on any other arity; that is a caller bug, not an input error.
    pub fn from_components(components: &[f32]) -> Self {
        match *components {
            [v] => Self::gray(v),
            [v, a] => Self::gray_alpha(v, a),
            [r, g, b] => Self::rgb(r, g, b),
            [r, g, b, a] => Self::rgba(r, g, b, a),
            _ => panic!(
                "color takes 1 to 4 components, got {}",
                components.len()
            ),
        }
    }
}

/// How a paint combines with what is already on the surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendMode {
    Clear,
    Source,
    Destination,
    #[default]
    SourceOver,
    DestinationOver,
    SourceIn,
    DestinationIn,
    SourceOut,
    DestinationOut,
    SourceAtop,
    DestinationAtop,
    Xor,
    Plus,
    Modulate,
    Screen,
    Overlay,
    Darken,
    Lighten,
    ColorDodge,
    ColorBurn,
    HardLight,
    SoftLight,
    Difference,
    Exclusion,
    Multiply,
    Hue,
    Saturation,
    Color,
    Luminosity,
}

impl BlendMode {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "clear" => Self::Clear,
            "source" => Self::Source,
            "destination" => Self::Destination,
            "sourceOver" | "normal" => Self::SourceOver,
            "destinationOver" => Self::DestinationOver,
            "sourceIn" => Self::SourceIn,
            "destinationIn" => Self::DestinationIn,
            "sourceOut" => Self::SourceOut,
            "destinationOut" => Self::DestinationOut,
            "sourceAtop" => Self::SourceAtop,
            "destinationAtop" => Self::DestinationAtop,
            "xor" => Self::Xor,
            "plus" => Self::Plus,
            "modulate" => Self::Modulate,
            "screen" => Self::Screen,
            "overlay" => Self::Overlay,
            "darken" => Self::Darken,
            "lighten" => Self::Lighten,
            "colorDodge" => Self::ColorDodge,
            "colorBurn" => Self::ColorBurn,
            "hardLight" => Self::HardLight,
            "softLight" => Self::SoftLight,
            "difference" => Self::Difference,
            "exclusion" => Self::Exclusion,
            "multiply" => Self::Multiply,
            "hue" => Self::Hue,
            "saturation" => Self::Saturation,
            "color" => Self::Color,
            "luminosity" => Self::Luminosity,
            _ => return None,
        })
    }
}

/// Stroke end-cap geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Square,
}

impl LineCap {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "butt" => Self::Butt,
            "round" => Self::Round,
            "square" => Self::Square,
            _ => return None,
        })
    }
}

/// Stroke corner geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LineJoin {
    #[default]
    Miter,
    Round,
    Bevel,
}

impl LineJoin {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "miter" => Self::Miter,
            "round" => Self::Round,
            "bevel" => Self::Bevel,
            _ => return None,
        })
    }
}

/// Fill or stroke, with the stroke geometry riding along
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PaintStyle {
    Fill,
    Stroke {
        width: f32,
        cap: LineCap,
        join: LineJoin,
        miter_limit: f32,
    },
}

/// A resolved paint, ready for a rendering backend
#[derive(Debug, Clone, PartialEq)]
pub struct Paint {
    pub color: Color,
    pub blend_mode: BlendMode,
    pub anti_alias: bool,
    pub style: PaintStyle,
}

/// Which way the text flows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    LeftToRight,
    RightToLeft,
}

impl Direction {
    /// The embedding level parity this direction corresponds to.
    pub fn level(self) -> u8 {
        match self {
            Self::LeftToRight => 0,
            Self::RightToLeft => 1,
        }
    }

    pub fn from_level(level: u8) -> Self {
        if level % 2 == 1 {
            Self::RightToLeft
        } else {
            Self::LeftToRight
        }
    }
}

/// Horizontal alignment of a shaped line against its advance width
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Align {
    Left,
    Center,
    Right,
}

impl Align {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "left" => Self::Left,
            "center" => Self::Center,
            "right" => Self::Right,
            _ => return None,
        })
    }
}

/// A glyph that knows exactly where it belongs
///
/// `cluster` is the logical character index in the origin string, not the
/// visual position, so hit-testing can map back after bidi reordering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionedGlyph {
    pub id: GlyphId,
    pub x: f32,
    pub y: f32,
    pub x_advance: f32,
    pub y_advance: f32,
    pub cluster: u32,
}

/// What a shaping engine returns for one segment: run-local glyphs plus the
/// total advance of the run
#[derive(Debug, Clone, PartialEq)]
pub struct ShapedRun {
    pub glyphs: Vec<PositionedGlyph>,
    pub advance: (f32, f32),
}

impl ShapedRun {
    pub fn empty() -> Self {
        Self {
            glyphs: Vec::new(),
            advance: (0.0, 0.0),
        }
    }
}

/// One positioned glyph stream handed to the rendering backend
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphRun {
    /// Identifier of the face the glyph ids index into
    pub font: String,
    pub size: f32,
    pub glyphs: Vec<PositionedGlyph>,
    /// Pen position after the last glyph; callers align against this
    pub end_pos: (f32, f32),
    pub base_level: u8,
}

/// An OpenType feature applied over a contiguous cluster range
///
/// `start`/`end` are compared against cluster values, so they live in the
/// same logical character space as [`PositionedGlyph::cluster`]. An open
/// end is `u32::MAX`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feature {
    pub tag: String,
    pub value: u32,
    pub start: u32,
    pub end: u32,
}

impl Feature {
    pub fn global(tag: impl Into<String>, value: u32) -> Self {
        Self {
            tag: tag.into(),
            value,
            start: 0,
            end: u32::MAX,
        }
    }

    pub fn ranged(tag: impl Into<String>, value: u32, start: u32, end: u32) -> Self {
        Self {
            tag: tag.into(),
            value,
            start,
            end,
        }
    }
}

/// How one shaping call should behave
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeParams {
    pub size: f32,
    pub direction: Option<Direction>,
    /// ISO 15924 script tag, e.g. "Latn"
    pub script: Option<String>,
    pub language: Option<String>,
    pub features: Vec<Feature>,
    pub variations: Vec<(String, f32)>,
    /// Added to every output cluster, mapping segment-local character
    /// indices back to the logical origin string
    pub cluster_origin: u32,
}

impl Default for ShapeParams {
    fn default() -> Self {
        Self {
            size: 16.0,
            direction: None,
            script: None,
            language: None,
            features: Vec::new(),
            variations: Vec::new(),
            cluster_origin: 0,
        }
    }
}

/// One variable-font design axis
#[derive(Debug, Clone, PartialEq)]
pub struct AxisInfo {
    pub tag: String,
    pub min: f32,
    pub default: f32,
    pub max: f32,
}

/// A named location in a variable font's design space
#[derive(Debug, Clone, PartialEq)]
pub struct NamedInstance {
    pub name: Option<String>,
    pub coords: Vec<(String, f32)>,
}

/// The output encodings a document path can name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    Png,
    Jpeg,
    Pdf,
    Svg,
    Mp4,
    Json,
}

impl OutputFormat {
    /// Infer the format from a path's extension.
    pub fn from_path(path: &Path) -> std::result::Result<Self, ExportError> {
        let suffix = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        Ok(match suffix.as_str() {
            "png" => Self::Png,
            "jpg" | "jpeg" => Self::Jpeg,
            "pdf" => Self::Pdf,
            "svg" => Self::Svg,
            "mp4" => Self::Mp4,
            "json" => Self::Json,
            _ => return Err(ExportError::UnknownFormat(suffix)),
        })
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::Pdf => "pdf",
            Self::Svg => "svg",
            Self::Mp4 => "mp4",
            Self::Json => "json",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}
