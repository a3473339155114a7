//! Drawpad core: shared types and collaborator traits
//!
//! Everything the styled-text model and the drawing surface agree on lives
//! here: the error taxonomy, paint and glyph value types, and the trait
//! seams for fonts, shaping, canvases, and document sinks.
//!
//! The crates build on each other in one direction:
//!
//! 1. **drawpad-unicode** - script/bidi segmentation and visual reordering
//! 2. **drawpad-fontdb** - the process-wide font library
//! 3. **drawpad-text** - styles, the run-based rich-text container, layout
//! 4. **drawpad** - the imperative drawing surface
//!
//! Shaping engines implement [`ShapeEngine`] and plug in from `backends/`.

pub mod error;
pub mod traits;
pub mod types;

pub use error::{DrawpadError, ExportError, FontLoadError, Result, ShapingError};
pub use traits::{Canvas, DocumentSink, FaceRef, ShapeEngine};
