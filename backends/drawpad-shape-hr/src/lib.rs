//! Pure Rust shaping engine backed by harfrust.
//!
//! Harfrust is a pure Rust port of HarfBuzz, so this backend shapes every
//! script HarfBuzz handles without any C dependency. Each code point is fed
//! to the buffer with its logical cluster value, which keeps ranged
//! features and downstream hit-testing in the same character space the
//! text model uses.

use std::str::FromStr;
use std::sync::Arc;

use harfrust::{
    BufferClusterLevel, Direction as HrDirection, Feature as HrFeature, FontRef as HrFontRef,
    GlyphBuffer, Language, Script, ShaperData, ShaperInstance, Tag, UnicodeBuffer, Variation,
};

use drawpad_core::error::Result;
use drawpad_core::traits::{FaceRef, ShapeEngine};
use drawpad_core::types::{Direction, PositionedGlyph, ShapeParams, ShapedRun};

/// Pure Rust text shaping powered by harfrust.
#[derive(Debug, Default)]
pub struct HarfrustEngine;

impl HarfrustEngine {
    pub fn new() -> Self {
        Self
    }

    fn to_hr_direction(direction: Direction) -> HrDirection {
        match direction {
            Direction::LeftToRight => HrDirection::LeftToRight,
            Direction::RightToLeft => HrDirection::RightToLeft,
        }
    }

    /// Parse a 4-character tag string.
    fn parse_tag(tag_str: &str) -> Option<Tag> {
        let bytes = tag_str.as_bytes();
        if bytes.len() == 4 {
            Some(Tag::new(&[bytes[0], bytes[1], bytes[2], bytes[3]]))
        } else {
            log::warn!("invalid tag '{tag_str}' - skipping");
            None
        }
    }

    /// Basic cmap/advance shaping for faces harfrust cannot parse.
    ///
    /// Keeps cluster and cursor semantics intact so stub faces behave like
    /// real ones in tests.
    fn fallback_shape(text: &str, face: &dyn FaceRef, params: &ShapeParams) -> ShapedRun {
        let scale = params.size / f32::from(face.units_per_em().max(1));
        let mut glyphs = Vec::new();
        let mut x = 0.0;
        for (index, ch) in text.chars().enumerate() {
            let Some(glyph_id) = face.glyph_id(ch) else {
                continue;
            };
            let advance = face.advance_width(glyph_id) * scale;
            glyphs.push(PositionedGlyph {
                id: glyph_id,
                x,
                y: 0.0,
                x_advance: advance,
                y_advance: 0.0,
                cluster: params.cluster_origin + index as u32,
            });
            x += advance;
        }
        ShapedRun {
            glyphs,
            advance: (x, 0.0),
        }
    }

    /// Pull positioned glyphs out of harfrust's buffer, scaled to the
    /// requested size.
    fn extract_glyphs(buffer: &GlyphBuffer, size: f32, upem: u16) -> ShapedRun {
        let scale = size / f32::from(upem.max(1));
        let positions = buffer.glyph_positions();
        let infos = buffer.glyph_infos();

        let mut glyphs = Vec::with_capacity(infos.len());
        let mut x = 0.0;
        let mut y = 0.0;
        for (info, pos) in infos.iter().zip(positions.iter()) {
            glyphs.push(PositionedGlyph {
                id: info.glyph_id,
                x: x + pos.x_offset as f32 * scale,
                y: y + pos.y_offset as f32 * scale,
                x_advance: pos.x_advance as f32 * scale,
                y_advance: pos.y_advance as f32 * scale,
                cluster: info.cluster,
            });
            x += pos.x_advance as f32 * scale;
            y += pos.y_advance as f32 * scale;
        }
        ShapedRun {
            glyphs,
            advance: (x, y),
        }
    }
}

impl ShapeEngine for HarfrustEngine {
    fn name(&self) -> &'static str {
        "harfrust"
    }

    fn shape(
        &self,
        text: &str,
        face: Arc<dyn FaceRef>,
        params: &ShapeParams,
    ) -> Result<ShapedRun> {
        if text.is_empty() {
            return Ok(ShapedRun::empty());
        }

        let font_data = face.data();
        if font_data.is_empty() {
            return Ok(Self::fallback_shape(text, face.as_ref(), params));
        }

        let hr_font = match HrFontRef::new(font_data) {
            Ok(font) => font,
            Err(_) => {
                log::warn!("face data not parseable by harfrust, using fallback shaping");
                return Ok(Self::fallback_shape(text, face.as_ref(), params));
            }
        };

        // ShaperData caches font tables and is the expensive part.
        let shaper_data = ShaperData::new(&hr_font);

        let instance = if params.variations.is_empty() {
            None
        } else {
            let variations: Vec<Variation> = params
                .variations
                .iter()
                .filter_map(|(tag_str, value)| {
                    Self::parse_tag(tag_str).map(|tag| Variation { tag, value: *value })
                })
                .collect();
            Some(ShaperInstance::from_variations(&hr_font, variations))
        };

        let mut builder = shaper_data.shaper(&hr_font);
        if let Some(ref instance) = instance {
            builder = builder.instance(Some(instance));
        }
        builder = builder.point_size(Some(params.size));
        let shaper = builder.build();

        // Feed code points with their logical cluster values so ranged
        // features and output clusters stay in origin-string space.
        let mut buffer = UnicodeBuffer::new();
        for (index, ch) in text.chars().enumerate() {
            buffer.add(ch, params.cluster_origin + index as u32);
        }
        buffer.set_cluster_level(BufferClusterLevel::MonotoneCharacters);

        if let Some(direction) = params.direction {
            buffer.set_direction(Self::to_hr_direction(direction));
        }
        if let Some(ref language) = params.language {
            if let Ok(language) = Language::from_str(language) {
                buffer.set_language(language);
            }
        }
        if let Some(ref script_tag) = params.script {
            if let Some(tag) = Self::parse_tag(script_tag) {
                if let Some(script) = Script::from_iso15924_tag(tag) {
                    buffer.set_script(script);
                }
            }
        }

        let features: Vec<HrFeature> = params
            .features
            .iter()
            .filter_map(|feature| {
                Self::parse_tag(&feature.tag).map(|tag| HrFeature {
                    tag,
                    value: feature.value,
                    start: feature.start,
                    end: feature.end,
                })
            })
            .collect();

        let output = shaper.shape(buffer, &features);
        Ok(Self::extract_glyphs(&output, params.size, face.units_per_em()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A face with no table data: exercises the fallback path.
    struct TestFace;

    impl FaceRef for TestFace {
        fn data(&self) -> &[u8] {
            &[]
        }

        fn units_per_em(&self) -> u16 {
            1000
        }

        fn glyph_id(&self, ch: char) -> Option<u32> {
            Some(ch as u32)
        }

        fn advance_width(&self, _glyph_id: u32) -> f32 {
            500.0
        }
    }

    #[test]
    fn empty_text_shapes_to_nothing() {
        let engine = HarfrustEngine::new();
        let result = engine
            .shape("", Arc::new(TestFace), &ShapeParams::default())
            .unwrap();
        assert!(result.glyphs.is_empty());
        assert_eq!(result.advance, (0.0, 0.0));
    }

    #[test]
    fn fallback_shapes_without_font_data() {
        let engine = HarfrustEngine::new();
        let params = ShapeParams {
            size: 10.0,
            ..ShapeParams::default()
        };
        let result = engine.shape("Hi", Arc::new(TestFace), &params).unwrap();
        assert_eq!(result.glyphs.len(), 2);
        // 500 font units at 10pt/1000upem = 5.0 per glyph.
        assert_eq!(result.advance.0, 10.0);
        assert_eq!(result.glyphs[1].x, 5.0);
    }

    #[test]
    fn fallback_keeps_cluster_origin() {
        let engine = HarfrustEngine::new();
        let params = ShapeParams {
            cluster_origin: 40,
            ..ShapeParams::default()
        };
        let result = engine.shape("abc", Arc::new(TestFace), &params).unwrap();
        let clusters: Vec<u32> = result.glyphs.iter().map(|g| g.cluster).collect();
        assert_eq!(clusters, vec![40, 41, 42]);
    }

    #[test]
    fn unparseable_data_falls_back() {
        struct Garbage;
        impl FaceRef for Garbage {
            fn data(&self) -> &[u8] {
                b"not a font at all"
            }
            fn units_per_em(&self) -> u16 {
                1000
            }
            fn glyph_id(&self, ch: char) -> Option<u32> {
                Some(ch as u32)
            }
            fn advance_width(&self, _glyph_id: u32) -> f32 {
                250.0
            }
        }
        let engine = HarfrustEngine::new();
        let result = engine
            .shape("ok", Arc::new(Garbage), &ShapeParams::default())
            .unwrap();
        assert_eq!(result.glyphs.len(), 2);
    }

    #[test]
    fn tag_parsing_requires_four_bytes() {
        assert!(HarfrustEngine::parse_tag("liga").is_some());
        assert!(HarfrustEngine::parse_tag("lig").is_none());
        assert!(HarfrustEngine::parse_tag("ligatures").is_none());
    }

    #[test]
    fn missing_cmap_entries_are_skipped() {
        struct Sparse;
        impl FaceRef for Sparse {
            fn data(&self) -> &[u8] {
                &[]
            }
            fn units_per_em(&self) -> u16 {
                1000
            }
            fn glyph_id(&self, ch: char) -> Option<u32> {
                (ch != 'x').then_some(ch as u32)
            }
            fn advance_width(&self, _glyph_id: u32) -> f32 {
                500.0
            }
        }
        let engine = HarfrustEngine::new();
        let result = engine
            .shape("axb", Arc::new(Sparse), &ShapeParams::default())
            .unwrap();
        assert_eq!(result.glyphs.len(), 2);
        let clusters: Vec<u32> = result.glyphs.iter().map(|g| g.cluster).collect();
        // The unmapped character is dropped but clusters stay logical.
        assert_eq!(clusters, vec![0, 2]);
    }
}
