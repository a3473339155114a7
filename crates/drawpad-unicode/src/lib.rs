//! Script and bidi segmentation for styled text.
//!
//! [`TextSegmenter`] splits a string into maximal runs of consistent writing
//! script and bidi embedding level; [`reordered_segments`] puts those runs
//! into left-to-right visual order. This is deliberately a segment-level
//! model: embedding levels come from the resolved bidi levels of the input,
//! but reordering only ever permutes whole segments and never mirrors
//! characters within one. Downstream shaping encodes direction itself, so
//! that simplification holds for the independent, non-nested runs this
//! pipeline is built for.

use icu_properties::{props::Script, CodePointMapData, CodePointMapDataBorrowed};
use unicode_bidi::{BidiInfo, Level};

use drawpad_core::types::Direction;

/// A maximal substring sharing one writing script and one bidi level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    pub text: &'a str,
    /// ISO 15924 script tag, e.g. "Latn", "Arab", "Zyyy"
    pub script: &'static str,
    /// Bidi embedding level; odd means right-to-left
    pub level: u8,
    /// Character index of this segment in the original string
    pub char_offset: usize,
    /// Byte index of this segment in the original string
    pub byte_offset: usize,
}

impl Segment<'_> {
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn direction(&self) -> Direction {
        Direction::from_level(self.level)
    }
}

/// Splits text into script/bidi runs.
pub struct TextSegmenter {
    script_map: CodePointMapDataBorrowed<'static, Script>,
}

impl TextSegmenter {
    /// Create a new segmenter with ICU data baked in.
    pub fn new() -> Self {
        Self {
            script_map: CodePointMapData::<Script>::new(),
        }
    }

    /// Segment `text` into script/level runs and resolve the paragraph base
    /// level.
    ///
    /// Without an override the base level comes from the first strongly
    /// directional character (LTR when there is none). An empty string
    /// yields no segments; a string of only weak characters yields a single
    /// `Zyyy` segment at the base level.
    pub fn segments<'a>(
        &self,
        text: &'a str,
        base: Option<Direction>,
    ) -> (Vec<Segment<'a>>, u8) {
        let override_level = base.map(|direction| match direction {
            Direction::RightToLeft => Level::rtl(),
            Direction::LeftToRight => Level::ltr(),
        });
        let fallback_level = override_level.map_or(0, |level| level.number());
        if text.is_empty() {
            return (Vec::new(), fallback_level);
        }

        let bidi = BidiInfo::new(text, override_level);
        let base_level = bidi
            .paragraphs
            .first()
            .map_or(fallback_level, |paragraph| paragraph.level.number());

        // Per code point: byte offset, resolved level, script tag. Weak
        // scripts (Common/Inherited/Unknown) inherit the previous
        // significant script; leading weak characters adopt the first one
        // that follows.
        let mut classes: Vec<(usize, u8, Option<&'static str>)> =
            Vec::with_capacity(text.len());
        let mut last_significant: Option<&'static str> = None;
        for (byte_offset, ch) in text.char_indices() {
            let level = bidi.levels[byte_offset].number();
            let script = self.script_map.get(ch);
            if is_significant(script) {
                last_significant = Some(script_tag(script));
            }
            classes.push((byte_offset, level, last_significant));
        }

        let adopted = classes
            .iter()
            .find_map(|&(_, _, tag)| tag)
            .unwrap_or(WEAK_SCRIPT_TAG);
        for class in classes.iter_mut() {
            if class.2.is_some() {
                break;
            }
            class.2 = Some(adopted);
        }

        let mut segments = Vec::new();
        let mut start = (0usize, 0usize); // (byte, char)
        let mut open: Option<(&'static str, u8)> = None;
        for (char_offset, &(byte_offset, level, tag)) in classes.iter().enumerate() {
            let key = (tag.unwrap_or(WEAK_SCRIPT_TAG), level);
            match open {
                Some(current) if current == key => {}
                Some(current) => {
                    segments.push(Segment {
                        text: &text[start.0..byte_offset],
                        script: current.0,
                        level: current.1,
                        char_offset: start.1,
                        byte_offset: start.0,
                    });
                    start = (byte_offset, char_offset);
                    open = Some(key);
                }
                None => open = Some(key),
            }
        }
        if let Some(current) = open {
            segments.push(Segment {
                text: &text[start.0..],
                script: current.0,
                level: current.1,
                char_offset: start.1,
                byte_offset: start.0,
            });
        }

        (segments, base_level)
    }
}

impl Default for TextSegmenter {
    fn default() -> Self {
        Self::new()
    }
}

/// Segment a string with a one-shot segmenter.
pub fn text_segments(text: &str, base: Option<Direction>) -> (Vec<Segment<'_>>, u8) {
    TextSegmenter::new().segments(text, base)
}

/// Reorder segments into left-to-right visual order.
///
/// In an LTR paragraph, each maximal run of odd-level (RTL) segments is
/// reversed in place and even-level segments keep their logical order. In
/// an RTL paragraph the roles flip and the whole sequence is reversed at
/// the end, so the logically-first segment lands rightmost. Segments are
/// never split or merged, only permuted; there is no level cascade beyond
/// parity and no mirroring within a segment.
pub fn reordered_segments<'a>(segments: Vec<Segment<'a>>, base_level: u8) -> Vec<Segment<'a>> {
    let rtl_base = base_level % 2 == 1;
    let flush = |reordered: &mut Vec<Segment<'a>>, group: &mut Vec<Segment<'a>>, rtl: bool| {
        if rtl == rtl_base {
            reordered.append(group);
        } else {
            reordered.extend(group.drain(..).rev());
        }
    };

    let mut reordered = Vec::with_capacity(segments.len());
    let mut group: Vec<Segment<'a>> = Vec::new();
    let mut group_rtl = false;
    for segment in segments {
        let rtl = segment.level % 2 == 1;
        if !group.is_empty() && rtl != group_rtl {
            flush(&mut reordered, &mut group, group_rtl);
        }
        group_rtl = rtl;
        group.push(segment);
    }
    flush(&mut reordered, &mut group, group_rtl);
    if rtl_base {
        reordered.reverse();
    }
    log::debug!(
        "reordered {} segments at base level {}",
        reordered.len(),
        base_level
    );
    reordered
}

/// Resolve the base direction of a string by its first strong character.
pub fn base_direction(text: &str) -> Direction {
    if text.is_empty() {
        return Direction::LeftToRight;
    }
    let bidi = BidiInfo::new(text, None);
    bidi.paragraphs
        .first()
        .map_or(Direction::LeftToRight, |paragraph| {
            if paragraph.level.is_rtl() {
                Direction::RightToLeft
            } else {
                Direction::LeftToRight
            }
        })
}

const WEAK_SCRIPT_TAG: &str = "Zyyy";

fn is_significant(script: Script) -> bool {
    !matches!(script, Script::Common | Script::Inherited | Script::Unknown)
}

/// ISO 15924 tag for a script value.
// ICU 2.x keeps the enum-to-name mappers private, so spell out the scripts
// a shaping engine can meaningfully distinguish.
fn script_tag(script: Script) -> &'static str {
    match script {
        Script::Arabic => "Arab",
        Script::Armenian => "Armn",
        Script::Bengali => "Beng",
        Script::Cherokee => "Cher",
        Script::Cyrillic => "Cyrl",
        Script::Devanagari => "Deva",
        Script::Ethiopian => "Ethi",
        Script::Georgian => "Geor",
        Script::Greek => "Grek",
        Script::Gujarati => "Gujr",
        Script::Gurmukhi => "Guru",
        Script::Han => "Hani",
        Script::Hangul => "Hang",
        Script::Hebrew => "Hebr",
        Script::Hiragana => "Hira",
        Script::Kannada => "Knda",
        Script::Katakana => "Kana",
        Script::Khmer => "Khmr",
        Script::Lao => "Laoo",
        Script::Latin => "Latn",
        Script::Malayalam => "Mlym",
        Script::Myanmar => "Mymr",
        Script::Nko => "Nkoo",
        Script::Oriya => "Orya",
        Script::Sinhala => "Sinh",
        Script::Syriac => "Syrc",
        Script::Tamil => "Taml",
        Script::Telugu => "Telu",
        Script::Thaana => "Thaa",
        Script::Thai => "Thai",
        Script::Tibetan => "Tibt",
        Script::Common => "Zyyy",
        Script::Inherited => "Zinh",
        _ => "Zzzz",
    }
}

#[cfg(test)]
mod proptests;

#[cfg(test)]
mod tests {
    use super::*;

    const ARABIC: &str = " \u{623}\u{62d}\u{62f}\u{62b} "; // " أحدث "
    const HEBREW: &str = " \u{5de}\u{5d5}\u{5e1}\u{5d9}\u{5e7}\u{5d4} "; // " מוסיקה "
    const LATIN: &str = " hello ";

    fn summarize(segments: &[Segment<'_>]) -> Vec<(usize, &'static str, u8, usize)> {
        segments
            .iter()
            .map(|s| (s.char_len(), s.script, s.level, s.char_offset))
            .collect()
    }

    #[test]
    fn segment_pure_arabic() {
        let (segments, base_level) = text_segments(ARABIC, None);
        assert_eq!(base_level, 1);
        assert_eq!(summarize(&segments), vec![(6, "Arab", 1, 0)]);
    }

    #[test]
    fn segment_pure_hebrew() {
        let (segments, base_level) = text_segments(HEBREW, None);
        assert_eq!(base_level, 1);
        assert_eq!(summarize(&segments), vec![(8, "Hebr", 1, 0)]);
    }

    #[test]
    fn segment_pure_latin() {
        let (segments, base_level) = text_segments(LATIN, None);
        assert_eq!(base_level, 0);
        assert_eq!(summarize(&segments), vec![(7, "Latn", 0, 0)]);
    }

    #[test]
    fn segment_latin_arabic_latin() {
        let text = format!("{LATIN}{ARABIC}{LATIN}");
        let (segments, base_level) = text_segments(&text, None);
        assert_eq!(base_level, 0);
        assert_eq!(
            summarize(&segments),
            vec![
                (8, "Latn", 0, 0),
                (4, "Arab", 1, 8),
                (2, "Arab", 0, 12),
                (6, "Latn", 0, 14),
            ]
        );
    }

    #[test]
    fn segment_arabic_latin_arabic() {
        let text = format!("{ARABIC}{LATIN}{ARABIC}");
        let (segments, base_level) = text_segments(&text, None);
        assert_eq!(base_level, 1);
        assert_eq!(
            summarize(&segments),
            vec![
                (7, "Arab", 1, 0),
                (5, "Latn", 2, 7),
                (2, "Latn", 1, 12),
                (5, "Arab", 1, 14),
            ]
        );
    }

    #[test]
    fn segment_latin_arabic_hebrew_latin() {
        let text = format!("{LATIN}{ARABIC}{HEBREW}{LATIN}");
        let (segments, base_level) = text_segments(&text, None);
        assert_eq!(base_level, 0);
        assert_eq!(
            summarize(&segments),
            vec![
                (8, "Latn", 0, 0),
                (6, "Arab", 1, 8),
                (6, "Hebr", 1, 14),
                (2, "Hebr", 0, 20),
                (6, "Latn", 0, 22),
            ]
        );
    }

    #[test]
    fn segment_empty_string() {
        let (segments, base_level) = text_segments("", None);
        assert!(segments.is_empty());
        assert_eq!(base_level, 0);

        let (segments, base_level) = text_segments("", Some(Direction::RightToLeft));
        assert!(segments.is_empty());
        assert_eq!(base_level, 1);
    }

    #[test]
    fn segment_neutral_only() {
        let (segments, base_level) = text_segments("  ..  ", None);
        assert_eq!(base_level, 0);
        assert_eq!(summarize(&segments), vec![(6, "Zyyy", 0, 0)]);
    }

    #[test]
    fn segment_with_direction_override() {
        let (segments, base_level) = text_segments("hello", Some(Direction::RightToLeft));
        assert_eq!(base_level, 1);
        // Strong LTR inside an RTL paragraph embeds one level deeper.
        assert_eq!(summarize(&segments), vec![(5, "Latn", 2, 0)]);
    }

    #[test]
    fn segments_partition_the_string() {
        let text = format!("{LATIN}{ARABIC}{HEBREW}{LATIN}");
        let (segments, _) = text_segments(&text, None);
        let mut expected_char = 0;
        let mut expected_byte = 0;
        for segment in &segments {
            assert_eq!(segment.char_offset, expected_char);
            assert_eq!(segment.byte_offset, expected_byte);
            expected_char += segment.char_len();
            expected_byte += segment.text.len();
        }
        assert_eq!(expected_char, text.chars().count());
        assert_eq!(expected_byte, text.len());
    }

    #[test]
    fn reorder_groups_adjacent_rtl_segments() {
        let text = format!("{LATIN}{ARABIC}{HEBREW}{LATIN}");
        let (segments, base_level) = text_segments(&text, None);
        let reordered = reordered_segments(segments, base_level);
        assert_eq!(
            summarize(&reordered),
            vec![
                (8, "Latn", 0, 0),
                (6, "Hebr", 1, 14),
                (6, "Arab", 1, 8),
                (2, "Hebr", 0, 20),
                (6, "Latn", 0, 22),
            ]
        );
        // Segment text survives the permutation intact.
        for segment in &reordered {
            assert_eq!(
                segment.text,
                &text[segment.byte_offset..segment.byte_offset + segment.text.len()]
            );
        }
    }

    #[test]
    fn reorder_rtl_paragraph() {
        let text = format!("{ARABIC}{LATIN}{ARABIC}");
        let (segments, base_level) = text_segments(&text, None);
        assert_eq!(base_level, 1);
        let reordered = reordered_segments(segments, base_level);
        // The logically-first Arabic block ends up rightmost.
        assert_eq!(
            summarize(&reordered),
            vec![
                (5, "Arab", 1, 14),
                (2, "Latn", 1, 12),
                (5, "Latn", 2, 7),
                (7, "Arab", 1, 0),
            ]
        );
    }

    #[test]
    fn reorder_permutes_without_losing_segments() {
        let text = format!("{LATIN}{ARABIC}{HEBREW}{LATIN}");
        let (segments, base_level) = text_segments(&text, None);
        let logical = segments.clone();
        let once = reordered_segments(segments, base_level);
        let mut sorted = once.clone();
        sorted.sort_by_key(|s| s.char_offset);
        assert_eq!(sorted, logical);
        assert_ne!(once, logical);

        // A trivial all-LTR string is a fixed point.
        let (flat, flat_level) = text_segments(LATIN, None);
        let flat_clone = flat.clone();
        assert_eq!(reordered_segments(flat, flat_level), flat_clone);
    }

    #[test]
    fn base_direction_first_strong() {
        assert_eq!(base_direction(LATIN), Direction::LeftToRight);
        assert_eq!(base_direction(ARABIC), Direction::RightToLeft);
        assert_eq!(base_direction(HEBREW), Direction::RightToLeft);
        assert_eq!(
            base_direction(&format!("{HEBREW}{LATIN}")),
            Direction::RightToLeft
        );
        assert_eq!(
            base_direction(&format!("{LATIN}{HEBREW}")),
            Direction::LeftToRight
        );
        assert_eq!(base_direction(""), Direction::LeftToRight);
        assert_eq!(base_direction(" .. "), Direction::LeftToRight);
    }
}
