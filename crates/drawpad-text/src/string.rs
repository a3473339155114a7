//! The run-based rich-text container.
//!
//! A [`FormattedString`] is an ordered sequence of [`TextRun`]s plus the
//! "current" style triple used for appending. Adjacent runs with identical
//! style triples are merged eagerly, so the run count stays proportional to
//! the number of style changes, not the amount of text. A lazily-computed
//! prefix-sum array maps global character offsets to run boundaries and is
//! dropped on every mutation.

use std::collections::BTreeMap;
use std::ops::{Bound, RangeBounds};
use std::sync::Arc;

use once_cell::sync::OnceCell;

use drawpad_core::error::{DrawpadError, Result};
use drawpad_core::types::Direction;

use crate::gstate::GraphicsState;
use crate::style::{FillStyle, StrokeStyle, StyleProperty, TextStyle};

/// One span of text with a fixed style triple.
///
/// Immutable; slicing and splitting return new runs sharing the same three
/// style references.
#[derive(Debug, Clone)]
pub struct TextRun {
    text: String,
    text_style: Arc<TextStyle>,
    fill_style: Arc<FillStyle>,
    stroke_style: Arc<StrokeStyle>,
}

impl TextRun {
    fn new(text: String, state: &GraphicsState) -> Self {
        Self {
            text,
            text_style: Arc::clone(state.text()),
            fill_style: Arc::clone(state.fill()),
            stroke_style: Arc::clone(state.stroke()),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn text_style(&self) -> &Arc<TextStyle> {
        &self.text_style
    }

    pub fn fill_style(&self) -> &Arc<FillStyle> {
        &self.fill_style
    }

    pub fn stroke_style(&self) -> &Arc<StrokeStyle> {
        &self.stroke_style
    }

    fn state(&self) -> GraphicsState {
        GraphicsState::from_parts(
            Arc::clone(&self.fill_style),
            Arc::clone(&self.stroke_style),
            Arc::clone(&self.text_style),
        )
    }

    fn with_text(&self, text: String) -> Self {
        Self {
            text,
            text_style: Arc::clone(&self.text_style),
            fill_style: Arc::clone(&self.fill_style),
            stroke_style: Arc::clone(&self.stroke_style),
        }
    }

    /// Same style triple? Pointer equality first, value equality second.
    fn style_matches(&self, other: &Self) -> bool {
        (Arc::ptr_eq(&self.text_style, &other.text_style) || self.text_style == other.text_style)
            && (Arc::ptr_eq(&self.fill_style, &other.fill_style)
                || self.fill_style == other.fill_style)
            && (Arc::ptr_eq(&self.stroke_style, &other.stroke_style)
                || self.stroke_style == other.stroke_style)
    }

    /// Slice by character offsets, clamped to the run.
    pub fn char_slice(&self, start: usize, stop: usize) -> Self {
        let (byte_start, byte_stop) = char_range_to_bytes(&self.text, start, stop);
        self.with_text(self.text[byte_start..byte_stop].to_string())
    }

    /// Split at line boundaries (`\n`, `\r\n`, `\r`), one run per line.
    pub fn split_lines(&self, keepends: bool) -> Vec<Self> {
        split_line_parts(&self.text, keepends)
            .into_iter()
            .map(|part| self.with_text(part.to_string()))
            .collect()
    }
}

impl PartialEq for TextRun {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text && self.style_matches(other)
    }
}

fn char_range_to_bytes(text: &str, start: usize, stop: usize) -> (usize, usize) {
    let mut byte_start = text.len();
    let mut byte_stop = text.len();
    for (char_index, (byte_index, _)) in text.char_indices().enumerate() {
        if char_index == start {
            byte_start = byte_index;
        }
        if char_index == stop {
            byte_stop = byte_index;
            break;
        }
    }
    if start >= stop {
        return (byte_start, byte_start);
    }
    (byte_start, byte_stop)
}

/// Python-style line splitting: a trailing terminator produces no empty
/// final part, and an empty string has no lines at all.
fn split_line_parts(text: &str, keepends: bool) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut parts = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\n' => {
                parts.push(if keepends {
                    &text[start..i + 1]
                } else {
                    &text[start..i]
                });
                start = i + 1;
                i = start;
            }
            b'\r' => {
                let term_end = if bytes.get(i + 1) == Some(&b'\n') {
                    i + 2
                } else {
                    i + 1
                };
                parts.push(if keepends {
                    &text[start..term_end]
                } else {
                    &text[start..i]
                });
                start = term_end;
                i = start;
            }
            _ => i += 1,
        }
    }
    if start < bytes.len() {
        parts.push(&text[start..]);
    }
    parts
}

/// Which text-style properties a run comparison looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextProperty {
    Font,
    FontSize,
    Features,
    Variations,
    Language,
    Align,
}

fn text_property_eq(a: &TextStyle, b: &TextStyle, property: TextProperty) -> bool {
    match property {
        TextProperty::Font => a.font() == b.font(),
        TextProperty::FontSize => a.font_size() == b.font_size(),
        TextProperty::Features => a.features() == b.features(),
        TextProperty::Variations => a.variations() == b.variations(),
        TextProperty::Language => a.language() == b.language(),
        TextProperty::Align => a.align() == b.align(),
    }
}

/// Per-feature value over the whole string: one constant, or explicit
/// `(start, end, value)` character intervals covering the runs where the
/// feature is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeatureTimeline {
    Constant(u32),
    Spans(Vec<(usize, usize, u32)>),
}

/// An ordered, coalesced sequence of styled text runs.
#[derive(Debug, Clone)]
pub struct FormattedString {
    runs: Vec<TextRun>,
    state: GraphicsState,
    rtl_override: Option<bool>,
    run_char_indices: OnceCell<Vec<usize>>,
}

impl FormattedString {
    pub fn new() -> Self {
        Self {
            runs: Vec::new(),
            state: GraphicsState::new(),
            rtl_override: None,
            run_char_indices: OnceCell::new(),
        }
    }

    /// Build from initial text and style overrides.
    ///
    /// The overrides are applied to the default style triple before the
    /// text is appended, so they style the whole initial text.
    pub fn from_text(text: &str, properties: &[StyleProperty]) -> Self {
        let mut result = Self::new();
        result.append(text, properties);
        result
    }

    fn from_runs(runs: Vec<TextRun>) -> Self {
        let mut result = Self::new();
        if !runs.is_empty() {
            result.splice_runs(runs);
        }
        result
    }

    /// Apply style overrides to the current triple, then append a run.
    ///
    /// Appending empty text applies the overrides only. If the previous run
    /// has an identical style triple the text is merged into it.
    pub fn append(&mut self, text: &str, properties: &[StyleProperty]) {
        self.invalidate();
        self.state.apply_all(properties);
        if text.is_empty() {
            return;
        }
        self.push_run(TextRun::new(text.to_string(), &self.state));
    }

    /// Splice another formatted string's runs onto this one.
    ///
    /// The seam coalesces when the triples match, and the current triple
    /// becomes the appended string's trailing triple. Appending an empty
    /// string is a no-op.
    pub fn append_formatted(&mut self, other: &Self) {
        self.invalidate();
        if other.runs.is_empty() {
            return;
        }
        self.splice_runs(other.runs.clone());
    }

    fn splice_runs(&mut self, runs: Vec<TextRun>) {
        self.invalidate();
        let mut iter = runs.into_iter();
        if let Some(first) = iter.next() {
            self.push_run(first);
        }
        self.runs.extend(iter);
        if let Some(last) = self.runs.last() {
            self.state = last.state();
        }
    }

    fn push_run(&mut self, run: TextRun) {
        if let Some(last) = self.runs.last_mut() {
            if last.style_matches(&run) {
                last.text.push_str(&run.text);
                return;
            }
        }
        self.runs.push(run);
    }

    fn invalidate(&mut self) {
        self.run_char_indices.take();
    }

    pub fn runs(&self) -> &[TextRun] {
        &self.runs
    }

    /// The current style triple used for appending.
    pub fn state(&self) -> &GraphicsState {
        &self.state
    }

    /// Mutable access to the current style triple.
    ///
    /// Style changes affect future appends, never existing runs.
    pub fn state_mut(&mut self) -> &mut GraphicsState {
        &mut self.state
    }

    pub fn text(&self) -> String {
        self.runs.iter().map(TextRun::text).collect()
    }

    pub fn char_len(&self) -> usize {
        *self
            .run_char_indices()
            .last()
            .unwrap_or(&0)
    }

    pub fn is_empty(&self) -> bool {
        self.char_len() == 0
    }

    /// Prefix sums of run lengths in characters; `indices[i]` is the global
    /// character offset where run `i` starts.
    pub fn run_char_indices(&self) -> &[usize] {
        self.run_char_indices.get_or_init(|| {
            let mut position = 0;
            let mut indices = vec![position];
            for run in &self.runs {
                position += run.char_len();
                indices.push(position);
            }
            indices
        })
    }

    /// The index of the run owning a global character offset.
    ///
    /// Without a hint the first and last runs are checked directly (the
    /// common case for glyph-stream consumption), falling back to binary
    /// search. With a hint from the previous lookup, the same, previous,
    /// and next runs are checked before searching, which makes sequential
    /// cluster walks O(1) amortized.
    pub fn find_run_index(&self, character_index: usize, previous: Option<usize>) -> usize {
        let num_runs = self.runs.len();
        if num_runs == 1 {
            return 0;
        }
        let indices = self.run_char_indices();
        assert!(
            character_index < indices[num_runs],
            "character index {character_index} out of range"
        );
        match previous {
            None => {
                if character_index < indices[1] {
                    return 0;
                }
                if character_index >= indices[num_runs - 1] {
                    return num_runs - 1;
                }
            }
            Some(mut run_index) => {
                assert!(run_index < num_runs, "run hint {run_index} out of range");
                if run_index > 0 && character_index < indices[run_index] {
                    // Maybe it's the previous run.
                    run_index -= 1;
                } else if character_index >= indices[run_index + 1] {
                    // Maybe it's the next run; cannot overflow because the
                    // character index is in range.
                    run_index += 1;
                }
                if indices[run_index] <= character_index
                    && character_index < indices[run_index + 1]
                {
                    return run_index;
                }
                // Not a neighbor either; give up and search.
            }
        }
        indices.partition_point(|&offset| offset <= character_index) - 1
    }

    /// Slice by character offsets, with out-of-range bounds clamped.
    ///
    /// The result is a fresh string built from the run fragments; fragments
    /// are not re-coalesced with surrounding context.
    pub fn slice(&self, range: impl RangeBounds<usize>) -> Self {
        let len = self.char_len();
        let start = match range.start_bound() {
            Bound::Included(&s) => s,
            Bound::Excluded(&s) => s + 1,
            Bound::Unbounded => 0,
        };
        let stop = match range.end_bound() {
            Bound::Included(&s) => s + 1,
            Bound::Excluded(&s) => s,
            Bound::Unbounded => len,
        };
        self.slice_impl(start.min(len), stop.min(len))
    }

    /// The checked slicing surface: only a unit step is supported.
    pub fn slice_with_step(&self, start: usize, stop: usize, step: isize) -> Result<Self> {
        if step != 1 {
            return Err(DrawpadError::UnsupportedOperation(format!(
                "slicing does not support step != 1 ({step})"
            )));
        }
        Ok(self.slice(start..stop))
    }

    fn slice_impl(&self, start: usize, stop: usize) -> Self {
        if start >= stop || self.runs.is_empty() {
            return Self::new();
        }
        let len = self.char_len();
        let start_run = self.find_run_index(start, None);
        let stop_run = if stop == len {
            self.runs.len() - 1
        } else {
            self.find_run_index(stop, None)
        };
        let indices = self.run_char_indices();
        let run_start = indices[start_run];
        let run_stop = indices[stop_run];
        let mut fragments = Vec::new();
        if start_run == stop_run {
            fragments.push(self.runs[start_run].char_slice(start - run_start, stop - run_start));
        } else {
            let head = &self.runs[start_run];
            fragments.push(head.char_slice(start - run_start, head.char_len()));
            fragments.extend(self.runs[start_run + 1..stop_run].iter().cloned());
            let tail = self.runs[stop_run].char_slice(0, stop - run_stop);
            if !tail.text().is_empty() {
                fragments.push(tail);
            }
        }
        Self::from_runs(fragments)
    }

    /// Split at line boundaries, one formatted string per line, preserving
    /// each fragment's style.
    pub fn split_lines(&self, keepends: bool) -> Vec<Self> {
        let mut lines: Vec<Vec<TextRun>> = Vec::new();
        let mut current: Vec<TextRun> = Vec::new();
        for run in &self.runs {
            let mut parts = run.split_lines(keepends).into_iter();
            let Some(first) = parts.next() else {
                continue;
            };
            let rest: Vec<TextRun> = parts.collect();
            if rest.is_empty() {
                current.push(first);
            } else {
                current.push(first);
                lines.push(std::mem::take(&mut current));
                for middle in &rest[..rest.len() - 1] {
                    lines.push(vec![middle.clone()]);
                }
                if let Some(tail) = rest.last() {
                    current.push(tail.clone());
                }
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
        lines.into_iter().map(Self::from_runs).collect()
    }

    /// Interleave `self` between `items`, concatenating via append.
    pub fn join(&self, items: &[Self]) -> Self {
        let mut result = Self::new();
        if let Some((first, rest)) = items.split_first() {
            result.append_formatted(first);
            for item in rest {
                result.append_formatted(self);
                result.append_formatted(item);
            }
        }
        result
    }

    /// Maximal sub-sequences of runs over which the given text properties
    /// are constant.
    pub fn split_by(&self, properties: &[TextProperty]) -> Vec<Self> {
        let mut parts = Vec::new();
        let mut current: Vec<TextRun> = Vec::new();
        for run in &self.runs {
            if let Some(previous) = current.last() {
                let breaks = properties.iter().any(|&property| {
                    !text_property_eq(previous.text_style(), run.text_style(), property)
                });
                if breaks {
                    parts.push(Self::from_runs(std::mem::take(&mut current)));
                }
            }
            current.push(run.clone());
        }
        if !current.is_empty() {
            parts.push(Self::from_runs(current));
        }
        parts
    }

    /// Spans that must be shaped independently.
    ///
    /// Font, size, variations, and language select and position glyphs, so
    /// they break spans; features travel as ranged intervals instead (see
    /// [`FormattedString::feature_intervals`]), and paint never breaks
    /// shaping.
    pub fn split_for_shaping(&self) -> Vec<Self> {
        self.split_by(&[
            TextProperty::Font,
            TextProperty::FontSize,
            TextProperty::Variations,
            TextProperty::Language,
        ])
    }

    /// Per feature tag, the value timeline over this string.
    ///
    /// A feature set to one value across the entire string collapses to
    /// [`FeatureTimeline::Constant`]; otherwise the timeline lists the
    /// character intervals where the feature is set, merged across adjacent
    /// runs with equal values. Runs where a feature is unset are simply not
    /// covered.
    pub fn feature_intervals(&self) -> BTreeMap<String, FeatureTimeline> {
        let indices = self.run_char_indices();
        let mut spans: BTreeMap<String, Vec<(usize, usize, u32)>> = BTreeMap::new();
        for (run_index, run) in self.runs.iter().enumerate() {
            let (start, end) = (indices[run_index], indices[run_index + 1]);
            for (tag, &value) in run.text_style().features() {
                let timeline = spans.entry(tag.clone()).or_default();
                if let Some(last) = timeline.last_mut() {
                    if last.1 == start && last.2 == value {
                        last.1 = end;
                        continue;
                    }
                }
                timeline.push((start, end, value));
            }
        }
        let total = self.char_len();
        spans
            .into_iter()
            .map(|(tag, timeline)| {
                let collapsed = match timeline.as_slice() {
                    [(0, end, value)] if *end == total => FeatureTimeline::Constant(*value),
                    _ => FeatureTimeline::Spans(timeline),
                };
                (tag, collapsed)
            })
            .collect()
    }

    /// Base direction of the concatenated text, by first strong character
    /// unless overridden with [`FormattedString::set_rtl`].
    pub fn is_rtl(&self) -> bool {
        if let Some(value) = self.rtl_override {
            return value;
        }
        drawpad_unicode::base_direction(&self.text()) == Direction::RightToLeft
    }

    pub fn rtl_override(&self) -> Option<bool> {
        self.rtl_override
    }

    pub fn set_rtl(&mut self, value: Option<bool>) {
        self.rtl_override = value;
    }
}

impl Default for FormattedString {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for FormattedString {
    fn eq(&self, other: &Self) -> bool {
        self.runs == other.runs && self.state == other.state
    }
}
