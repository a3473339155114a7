//! The styled-text model and layout pipeline.
//!
//! Three layers, bottom up:
//!
//! - [`style`] - immutable style values (`FillStyle`, `StrokeStyle`,
//!   `TextStyle`) with memoized derived paints and faces, plus the closed
//!   [`StyleProperty`] dispatch enum.
//! - [`gstate`] - the copy-on-write [`GraphicsState`] triple that supplies
//!   style to both shapes and text.
//! - [`string`] - the run-based [`FormattedString`] container with
//!   coalescing, slicing, line splitting, and feature timelines.
//! - [`layout`] - shaping orchestration: shaping-span split, script/bidi
//!   segmentation, visual reordering, and glyph-stream assembly.
//!
//! ```
//! use drawpad_text::{FormattedString, StyleProperty};
//!
//! let mut label = FormattedString::from_text("weight ", &[]);
//! label.append("700", &[StyleProperty::FontSize(14.0)]);
//! assert_eq!(label.runs().len(), 2);
//! assert_eq!(label.text(), "weight 700");
//! ```

pub mod gstate;
pub mod layout;
pub mod string;
pub mod style;

pub use gstate::GraphicsState;
pub use layout::{align_glyph_runs, shape_formatted, shape_text, ResolveFace};
pub use string::{FeatureTimeline, FormattedString, TextProperty, TextRun};
pub use style::{FillStyle, PropertyValue, StrokeStyle, StyleProperty, TextStyle};
