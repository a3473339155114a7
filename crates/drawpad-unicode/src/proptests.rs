//! Property tests for segmentation totality and reorder permutation.

use proptest::prelude::*;

use super::{reordered_segments, text_segments, TextSegmenter};
use drawpad_core::types::Direction;

proptest! {
    /// Segment boundaries partition the string exactly: no gaps, no
    /// overlaps, and the concatenation equals the input.
    #[test]
    fn segments_tile_the_input(text in ".*") {
        let (segments, _) = text_segments(&text, None);
        let mut char_cursor = 0usize;
        let mut byte_cursor = 0usize;
        let mut rebuilt = String::with_capacity(text.len());
        for segment in &segments {
            prop_assert_eq!(segment.char_offset, char_cursor);
            prop_assert_eq!(segment.byte_offset, byte_cursor);
            char_cursor += segment.char_len();
            byte_cursor += segment.text.len();
            rebuilt.push_str(segment.text);
        }
        prop_assert_eq!(char_cursor, text.chars().count());
        prop_assert_eq!(byte_cursor, text.len());
        prop_assert_eq!(rebuilt, text);
    }

    /// Reordering never adds, drops, or splits a segment.
    #[test]
    fn reordering_is_a_permutation(text in ".*", rtl_base in any::<bool>()) {
        let base = if rtl_base {
            Some(Direction::RightToLeft)
        } else {
            None
        };
        let (segments, base_level) = text_segments(&text, base);
        let logical = segments.clone();
        let mut reordered = reordered_segments(segments, base_level);
        reordered.sort_by_key(|segment| segment.char_offset);
        prop_assert_eq!(reordered, logical);
    }

    /// Segmentation is deterministic across segmenter instances.
    #[test]
    fn segmentation_is_deterministic(text in ".*") {
        let first = TextSegmenter::new().segments(&text, None);
        let second = TextSegmenter::new().segments(&text, None);
        prop_assert_eq!(first, second);
    }

    /// Neutral-or-empty inputs never panic and resolve to the base level.
    #[test]
    fn neutral_inputs_take_base_level(spaces in " {0,12}") {
        let (segments, base_level) = text_segments(&spaces, Some(Direction::RightToLeft));
        prop_assert_eq!(base_level, 1);
        if spaces.is_empty() {
            prop_assert!(segments.is_empty());
        } else {
            prop_assert_eq!(segments.len(), 1);
            prop_assert_eq!(segments[0].level, 1);
        }
    }
}
