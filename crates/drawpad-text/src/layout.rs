//! Shaping orchestration.
//!
//! A formatted string is split into shaping-compatible spans, each span is
//! segmented by script and bidi level, the segments are reordered into
//! visual order, and every segment goes through the shaping engine with the
//! active font state. The resulting glyph streams carry logical clusters
//! (for hit-testing back into the source string) and positions offset by a
//! running cursor, so the caller gets one ready-to-draw stream per span.

use std::sync::Arc;

use drawpad_core::error::Result;
use drawpad_core::traits::{FaceRef, ShapeEngine};
use drawpad_core::types::{Align, Direction, Feature, GlyphRun, PositionedGlyph, ShapeParams};
use drawpad_fontdb::FontLibrary;
use drawpad_unicode::{reordered_segments, TextSegmenter};

use crate::gstate::GraphicsState;
use crate::string::{FeatureTimeline, FormattedString};
use crate::style::TextStyle;

/// Resolves a text style to a shaping face.
///
/// The font library is the production resolver; tests substitute stub
/// faces without touching the filesystem.
pub trait ResolveFace {
    fn resolve_face(&self, style: &TextStyle) -> Result<Arc<dyn FaceRef>>;

    /// Variation coordinates to hand the shaping engine.
    ///
    /// Resolvers that know the face's axes drop unknown tags here.
    fn shaping_variations(&self, style: &TextStyle) -> Vec<(String, f32)> {
        style
            .variations()
            .iter()
            .map(|(tag, value)| (tag.clone(), *value))
            .collect()
    }
}

impl ResolveFace for FontLibrary {
    fn resolve_face(&self, style: &TextStyle) -> Result<Arc<dyn FaceRef>> {
        let asset = style.resolved(self)?;
        Ok(asset)
    }

    fn shaping_variations(&self, style: &TextStyle) -> Vec<(String, f32)> {
        let requested: Vec<(String, f32)> = style
            .variations()
            .iter()
            .map(|(tag, value)| (tag.clone(), *value))
            .collect();
        match style.resolved(self) {
            Ok(asset) => asset.filter_variations(&requested),
            Err(_) => requested,
        }
    }
}

/// Shape a plain string with a single style triple.
pub fn shape_text(
    text: &str,
    state: &GraphicsState,
    resolver: &dyn ResolveFace,
    engine: &dyn ShapeEngine,
    flip_y: bool,
) -> Result<Vec<GlyphRun>> {
    let mut formatted = FormattedString::new();
    *formatted.state_mut() = state.clone();
    formatted.append(text, &[]);
    shape_formatted(&formatted, resolver, engine, flip_y)
}

/// Shape a formatted string into one glyph stream per shaping span.
///
/// Spans lay out sequentially: each starts at the previous span's end
/// position, so the last stream's `end_pos` is the total advance of the
/// whole string. Empty text yields no streams; that is a valid outcome,
/// not an error.
pub fn shape_formatted(
    formatted: &FormattedString,
    resolver: &dyn ResolveFace,
    engine: &dyn ShapeEngine,
    flip_y: bool,
) -> Result<Vec<GlyphRun>> {
    let segmenter = TextSegmenter::new();
    let base = formatted.rtl_override().map(|rtl| {
        if rtl {
            Direction::RightToLeft
        } else {
            Direction::LeftToRight
        }
    });
    let mut streams = Vec::new();
    let mut cursor = (0.0f32, 0.0f32);
    let mut span_origin = 0usize;
    for span in formatted.split_for_shaping() {
        let stream = shape_span(
            &span,
            span_origin,
            cursor,
            base,
            &segmenter,
            resolver,
            engine,
            flip_y,
        )?;
        span_origin += span.char_len();
        cursor = stream.end_pos;
        streams.push(stream);
    }
    Ok(streams)
}

#[allow(clippy::too_many_arguments)]
fn shape_span(
    span: &FormattedString,
    span_origin: usize,
    start_pos: (f32, f32),
    base: Option<Direction>,
    segmenter: &TextSegmenter,
    resolver: &dyn ResolveFace,
    engine: &dyn ShapeEngine,
    flip_y: bool,
) -> Result<GlyphRun> {
    let style = Arc::clone(span.runs()[0].text_style());
    let face = resolver.resolve_face(&style)?;
    let variations = resolver.shaping_variations(&style);
    let features = span_features(span, span_origin);
    let text = span.text();

    let (segments, base_level) = segmenter.segments(&text, base);
    log::debug!(
        "shaping span at char {span_origin}: {} segments, base level {base_level}",
        segments.len()
    );

    let y_sign = if flip_y { -1.0f32 } else { 1.0f32 };
    let mut glyphs = Vec::new();
    let mut cursor = start_pos;
    for segment in reordered_segments(segments, base_level) {
        let params = ShapeParams {
            size: style.font_size(),
            direction: Some(segment.direction()),
            script: Some(segment.script.to_string()),
            language: style.language().map(str::to_string),
            features: features.clone(),
            variations: variations.clone(),
            // Clusters map back to logical offsets in the whole string, not
            // the reordered position.
            cluster_origin: (span_origin + segment.char_offset) as u32,
        };
        let shaped = engine.shape(segment.text, Arc::clone(&face), &params)?;
        glyphs.extend(shaped.glyphs.iter().map(|glyph| PositionedGlyph {
            id: glyph.id,
            x: cursor.0 + glyph.x,
            y: cursor.1 + y_sign * glyph.y,
            x_advance: glyph.x_advance,
            y_advance: y_sign * glyph.y_advance,
            cluster: glyph.cluster,
        }));
        cursor.0 += shaped.advance.0;
        cursor.1 += y_sign * shaped.advance.1;
    }

    Ok(GlyphRun {
        font: style.font().to_string(),
        size: style.font_size(),
        glyphs,
        end_pos: cursor,
        base_level,
    })
}

fn span_features(span: &FormattedString, span_origin: usize) -> Vec<Feature> {
    let mut features = Vec::new();
    for (tag, timeline) in span.feature_intervals() {
        match timeline {
            FeatureTimeline::Constant(value) => features.push(Feature::global(tag, value)),
            FeatureTimeline::Spans(spans) => {
                for (start, end, value) in spans {
                    features.push(Feature::ranged(
                        tag.clone(),
                        value,
                        (span_origin + start) as u32,
                        (span_origin + end) as u32,
                    ));
                }
            }
        }
    }
    features
}

/// Shift glyph streams for left/center/right alignment.
///
/// The default alignment follows the first stream's base level: left for
/// LTR, right for RTL. The alignment offset is measured against the total
/// advance width, i.e. the last stream's end position.
pub fn align_glyph_runs(streams: &mut [GlyphRun], align: Option<Align>) {
    let Some(last) = streams.last() else {
        return;
    };
    let text_width = last.end_pos.0;
    let base_level = streams.first().map_or(0, |stream| stream.base_level);
    let align = align.unwrap_or(if base_level % 2 == 1 {
        Align::Right
    } else {
        Align::Left
    });
    let x_offset = match align {
        Align::Left => return,
        Align::Right => -text_width,
        Align::Center => -text_width / 2.0,
    };
    for stream in streams.iter_mut() {
        for glyph in &mut stream.glyphs {
            glyph.x += x_offset;
        }
        stream.end_pos.0 += x_offset;
    }
}
