//! A programmable 2D drawing surface with styled text.
//!
//! Callers issue imperative drawing commands against an implicit current
//! page; shapes and text pull their style from a copy-on-write graphics
//! state, and text runs through script/bidi segmentation, visual
//! reordering, and shaping before reaching the rendering backend.
//!
//! ```
//! use drawpad::{Color, Drawing};
//!
//! let mut drawing = Drawing::new();
//! drawing.size(400.0, 300.0)?;
//! drawing.fill(Some(Color::rgb(1.0, 0.0, 0.0)));
//! drawing.rect(40.0, 40.0, 120.0, 80.0);
//! drawing.with_saved_state(|d| {
//!     d.stroke(Some(Color::BLACK));
//!     d.rotate(45.0, (100.0, 80.0));
//!     d.rect(40.0, 40.0, 120.0, 80.0);
//! });
//! assert!(drawing.state().stroke().color().is_none());
//! # Ok::<(), drawpad::DrawpadError>(())
//! ```
//!
//! The default document is a [`RecordingDocument`] that keeps every page
//! as a replayable display list; rasterizing backends implement the same
//! [`DocumentSink`] trait.

pub mod document;
pub mod drawing;
pub mod path;

pub use document::{DisplayItem, Page, RecordingCanvas, RecordingDocument};
pub use drawing::Drawing;
pub use path::BezierPath;

pub use drawpad_core::error::{
    DrawpadError, ExportError, FontLoadError, Result, ShapingError,
};
pub use drawpad_core::traits::{Canvas, DocumentSink, FaceRef, ShapeEngine};
pub use drawpad_core::types::{
    Align, AxisInfo, BlendMode, Color, Direction, GlyphRun, LineCap, LineJoin, NamedInstance,
    OutputFormat, Paint, PaintStyle, PositionedGlyph,
};
pub use drawpad_fontdb::{FontAsset, FontLibrary, FontSpec};
pub use drawpad_shape_hr::HarfrustEngine;
pub use drawpad_text::{
    FormattedString, GraphicsState, PropertyValue, StyleProperty, TextProperty, TextRun,
};
pub use drawpad_unicode::{reordered_segments, text_segments, Segment, TextSegmenter};
