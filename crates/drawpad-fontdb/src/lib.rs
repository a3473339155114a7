//! Font loading and caching for drawpad.
//!
//! Fonts are identified by a [`FontSpec`]: either a file path or an
//! installed family name. The [`FontLibrary`] is the process-wide cache
//! mapping specs to loaded faces; it populates on first use and is
//! explicitly clearable. File fonts are memory-mapped; family names
//! resolve through the system font database.

use std::fs::File;
use std::io::ErrorKind;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use dashmap::DashMap;
use memmap2::Mmap;
use once_cell::sync::OnceCell;
use read_fonts::types::GlyphId as ReadGlyphId;
use read_fonts::{FileRef, FontRef, TableProvider};
use skrifa::MetadataProvider;

use drawpad_core::error::FontLoadError;
use drawpad_core::traits::FaceRef;
use drawpad_core::types::{AxisInfo, GlyphId, NamedInstance};

/// Maximum font file size (50MB) to prevent resource exhaustion.
pub const MAX_FONT_SIZE: u64 = 50 * 1024 * 1024;

const DEFAULT_CAPACITY: usize = 256;

/// How a font is identified: a file on disk or an installed family.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FontSpec {
    Path(Utf8PathBuf),
    Family(String),
}

impl FontSpec {
    /// Interpret a user-supplied font argument.
    ///
    /// Existing paths become [`FontSpec::Path`] (absolutized so equal fonts
    /// hit the same cache slot); everything else is treated as an installed
    /// family name.
    pub fn parse(name_or_path: &str) -> Self {
        let path = Utf8Path::new(name_or_path);
        if path.exists() {
            let absolute = path
                .canonicalize_utf8()
                .unwrap_or_else(|_| path.to_path_buf());
            Self::Path(absolute)
        } else {
            Self::Family(name_or_path.to_string())
        }
    }
}

impl std::fmt::Display for FontSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Path(path) => f.write_str(path.as_str()),
            Self::Family(name) => f.write_str(name),
        }
    }
}

#[derive(Debug)]
enum FontData {
    Mapped(Mmap),
    Owned(Vec<u8>),
}

impl FontData {
    fn bytes(&self) -> &[u8] {
        match self {
            Self::Mapped(mmap) => mmap,
            Self::Owned(bytes) => bytes,
        }
    }
}

/// A loaded face: raw table bytes plus the metadata the text pipeline needs.
///
/// A `FontRef` view is created on demand, so no unsafe lifetime extension is
/// required and TTC collections keep their face index.
#[derive(Debug)]
pub struct FontAsset {
    spec: FontSpec,
    data: FontData,
    face_index: u32,
    units_per_em: u16,
}

impl FontAsset {
    /// Memory-map a font file and validate it.
    pub fn from_file(path: &Utf8Path) -> Result<Self, FontLoadError> {
        Self::from_file_index(path, 0)
    }

    /// Memory-map a specific face of a font file (for TTC collections).
    pub fn from_file_index(path: &Utf8Path, face_index: u32) -> Result<Self, FontLoadError> {
        let file = File::open(path.as_std_path()).map_err(|e| match e.kind() {
            ErrorKind::NotFound => FontLoadError::FileNotFound(path.to_string()),
            _ => FontLoadError::Read {
                path: path.to_string(),
                source: e,
            },
        })?;

        let meta = file.metadata().map_err(|e| FontLoadError::Read {
            path: path.to_string(),
            source: e,
        })?;
        if meta.len() > MAX_FONT_SIZE {
            return Err(FontLoadError::TooLarge {
                path: path.to_string(),
                size: meta.len(),
                max: MAX_FONT_SIZE,
            });
        }

        #[allow(unsafe_code)]
        let mmap = unsafe {
            Mmap::map(&file).map_err(|e| FontLoadError::Read {
                path: path.to_string(),
                source: e,
            })?
        };

        Self::build(
            FontSpec::Path(path.to_path_buf()),
            FontData::Mapped(mmap),
            face_index,
        )
    }

    /// Wrap already-loaded font bytes.
    pub fn from_data(spec: FontSpec, data: Vec<u8>, face_index: u32) -> Result<Self, FontLoadError> {
        Self::build(spec, FontData::Owned(data), face_index)
    }

    fn build(spec: FontSpec, data: FontData, face_index: u32) -> Result<Self, FontLoadError> {
        // Parse once up front so a bad file fails at load time, and pull out
        // the one measurement everything scales by.
        let units_per_em = {
            let font = parse_face(data.bytes(), face_index)?;
            font.head().map(|head| head.units_per_em()).unwrap_or(1000)
        };
        Ok(Self {
            spec,
            data,
            face_index,
            units_per_em,
        })
    }

    pub fn spec(&self) -> &FontSpec {
        &self.spec
    }

    pub fn face_index(&self) -> u32 {
        self.face_index
    }

    /// Create a table-reader view on demand.
    fn font_ref(&self) -> Option<FontRef<'_>> {
        parse_face(self.data.bytes(), self.face_index).ok()
    }

    /// Variable-font design axes: tag, minimum, default, maximum.
    ///
    /// Empty for static fonts.
    pub fn variation_axes(&self) -> Vec<AxisInfo> {
        let Some(font) = self.font_ref() else {
            return Vec::new();
        };
        font.axes()
            .iter()
            .map(|axis| AxisInfo {
                tag: axis.tag().to_string(),
                min: axis.min_value(),
                default: axis.default_value(),
                max: axis.max_value(),
            })
            .collect()
    }

    /// Named design-space locations, with their user-space coordinates.
    pub fn named_instances(&self) -> Vec<NamedInstance> {
        let Some(font) = self.font_ref() else {
            return Vec::new();
        };
        let tags: Vec<String> = font
            .axes()
            .iter()
            .map(|axis| axis.tag().to_string())
            .collect();
        font.named_instances()
            .iter()
            .map(|instance| {
                let name = font
                    .localized_strings(instance.subfamily_name_id())
                    .english_or_first()
                    .map(|s| s.chars().collect::<String>());
                let coords = tags
                    .iter()
                    .cloned()
                    .zip(instance.user_coords())
                    .collect();
                NamedInstance { name, coords }
            })
            .collect()
    }

    /// Drop requested coordinates for axes the font does not define.
    ///
    /// Returns the surviving coordinates in the caller's order.
    pub fn filter_variations(&self, coordinates: &[(String, f32)]) -> Vec<(String, f32)> {
        if coordinates.is_empty() {
            return Vec::new();
        }
        let axes = self.variation_axes();
        if axes.is_empty() {
            log::warn!(
                "font {} is static but variation coordinates were provided - ignoring",
                self.spec
            );
            return Vec::new();
        }
        coordinates
            .iter()
            .filter(|(tag, _)| {
                let known = axes.iter().any(|axis| axis.tag == *tag);
                if !known {
                    log::warn!(
                        "unknown variation axis '{}' for font {} - dropping coordinate",
                        tag,
                        self.spec
                    );
                }
                known
            })
            .cloned()
            .collect()
    }

    pub fn glyph_count(&self) -> Option<u32> {
        self.font_ref()
            .and_then(|font| font.maxp().ok().map(|maxp| maxp.num_glyphs() as u32))
    }
}

impl FaceRef for FontAsset {
    fn data(&self) -> &[u8] {
        self.data.bytes()
    }

    fn units_per_em(&self) -> u16 {
        self.units_per_em
    }

    fn glyph_id(&self, ch: char) -> Option<GlyphId> {
        self.font_ref()
            .and_then(|font| font.cmap().ok()?.map_codepoint(ch).map(|gid| gid.to_u32()))
    }

    fn advance_width(&self, glyph_id: GlyphId) -> f32 {
        self.font_ref()
            .and_then(|font| {
                let hmtx = font.hmtx().ok()?;
                let advance = hmtx.advance(ReadGlyphId::new(glyph_id))?;
                Some(advance as f32)
            })
            .unwrap_or(0.0)
    }
}

fn parse_face(data: &[u8], face_index: u32) -> Result<FontRef<'_>, FontLoadError> {
    let file_ref = FileRef::new(data).map_err(|_| FontLoadError::InvalidData)?;
    match file_ref {
        FileRef::Font(font) => Ok(font),
        FileRef::Collection(collection) => collection
            .get(face_index)
            .map_err(|_| FontLoadError::InvalidData),
    }
}

/// Font cache statistics for observability.
#[derive(Debug, Clone, Copy)]
pub struct CacheStats {
    pub capacity: usize,
    pub entries: usize,
}

/// Process-wide font cache: spec → loaded face.
///
/// Lifecycle is "populate on first use, explicitly clearable". The map is
/// concurrent so a multi-worker port needs no redesign, but the drawing
/// model itself is single-threaded.
pub struct FontLibrary {
    cache: DashMap<FontSpec, Arc<FontAsset>>,
    max_capacity: usize,
    system: OnceCell<fontdb::Database>,
}

impl FontLibrary {
    /// Create a library caching at most `capacity` faces (minimum 1).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            cache: DashMap::with_capacity(capacity),
            max_capacity: capacity,
            system: OnceCell::new(),
        }
    }

    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Resolve a spec, loading and caching on first use.
    pub fn get(&self, spec: &FontSpec) -> Result<Arc<FontAsset>, FontLoadError> {
        if let Some(asset) = self.cache.get(spec) {
            return Ok(Arc::clone(asset.value()));
        }

        let asset = Arc::new(match spec {
            FontSpec::Path(path) => FontAsset::from_file(path)?,
            FontSpec::Family(name) => self.load_family(name)?,
        });

        if self.cache.len() >= self.max_capacity {
            // Cache full: drop an arbitrary entry. The map has no access
            // ordering, so this is FIFO-ish rather than LRU.
            if let Some(first_key) = self.cache.iter().next().map(|e| e.key().clone()) {
                log::warn!("font cache full, evicting {first_key}");
                self.cache.remove(&first_key);
            }
        }
        self.cache.insert(spec.clone(), Arc::clone(&asset));
        Ok(asset)
    }

    fn load_family(&self, name: &str) -> Result<FontAsset, FontLoadError> {
        let db = self.system.get_or_init(|| {
            let mut db = fontdb::Database::new();
            db.load_system_fonts();
            log::debug!("loaded {} system font faces", db.len());
            db
        });

        let family = match name {
            "sans-serif" => fontdb::Family::SansSerif,
            "serif" => fontdb::Family::Serif,
            "monospace" => fontdb::Family::Monospace,
            "cursive" => fontdb::Family::Cursive,
            "fantasy" => fontdb::Family::Fantasy,
            other => fontdb::Family::Name(other),
        };
        let query = fontdb::Query {
            families: &[family],
            weight: fontdb::Weight::NORMAL,
            stretch: fontdb::Stretch::Normal,
            style: fontdb::Style::Normal,
        };
        let id = db
            .query(&query)
            .ok_or_else(|| FontLoadError::FamilyNotFound(name.to_string()))?;
        let (source, face_index) = db
            .face_source(id)
            .ok_or_else(|| FontLoadError::FamilyNotFound(name.to_string()))?;

        let spec = FontSpec::Family(name.to_string());
        match source {
            fontdb::Source::File(path) | fontdb::Source::SharedFile(path, _) => {
                let utf8 = Utf8PathBuf::from_path_buf(path)
                    .map_err(|_| FontLoadError::FamilyNotFound(name.to_string()))?;
                FontAsset::from_file_index(&utf8, face_index)
            }
            fontdb::Source::Binary(data) => {
                FontAsset::from_data(spec, data.as_ref().as_ref().to_vec(), face_index)
            }
        }
    }

    /// Clear all cached faces.
    ///
    /// Useful when fonts on disk may have changed.
    pub fn clear(&self) {
        self.cache.clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            capacity: self.max_capacity,
            entries: self.cache.len(),
        }
    }
}

impl Default for FontLibrary {
    fn default() -> Self {
        Self::new()
    }
}
