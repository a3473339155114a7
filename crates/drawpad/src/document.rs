//! The recording document sink.
//!
//! Pages are recorded as display lists: every draw call, paint, and
//! transform lands in a [`DisplayItem`] in order. The recording can be
//! replayed against a rasterizing backend or dumped as JSON for tests and
//! debugging. Raster and video encodings are a backend concern; asking the
//! recording sink for them reports an unsupported format.

use std::cell::RefCell;
use std::fmt::Write as _;
use std::path::Path;
use std::rc::Rc;

use kurbo::{Affine, BezPath, Rect};

use drawpad_core::error::{ExportError, Result};
use drawpad_core::traits::{Canvas, DocumentSink};
use drawpad_core::types::{GlyphRun, OutputFormat, Paint, PaintStyle};

/// One recorded draw command.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayItem {
    Rect { rect: Rect, paint: Paint },
    Oval { rect: Rect, paint: Paint },
    Path { path: BezPath, paint: Paint },
    GlyphRun { run: GlyphRun, paint: Paint },
    Save,
    Restore,
    Transform { affine: Affine },
}

/// One finished page.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub width: f64,
    pub height: f64,
    pub items: Vec<DisplayItem>,
}

/// Canvas that appends display items to the page being recorded.
pub struct RecordingCanvas {
    items: Rc<RefCell<Vec<DisplayItem>>>,
}

impl RecordingCanvas {
    fn push(&self, item: DisplayItem) {
        self.items.borrow_mut().push(item);
    }
}

impl Canvas for RecordingCanvas {
    fn draw_rect(&mut self, rect: Rect, paint: &Paint) {
        self.push(DisplayItem::Rect {
            rect,
            paint: paint.clone(),
        });
    }

    fn draw_oval(&mut self, rect: Rect, paint: &Paint) {
        self.push(DisplayItem::Oval {
            rect,
            paint: paint.clone(),
        });
    }

    fn draw_path(&mut self, path: &BezPath, paint: &Paint) {
        self.push(DisplayItem::Path {
            path: path.clone(),
            paint: paint.clone(),
        });
    }

    fn draw_glyph_run(&mut self, run: &GlyphRun, paint: &Paint) {
        self.push(DisplayItem::GlyphRun {
            run: run.clone(),
            paint: paint.clone(),
        });
    }

    fn save(&mut self) {
        self.push(DisplayItem::Save);
    }

    fn restore(&mut self) {
        self.push(DisplayItem::Restore);
    }

    fn apply_transform(&mut self, affine: Affine) {
        self.push(DisplayItem::Transform { affine });
    }
}

struct OpenPage {
    width: f64,
    height: f64,
    items: Rc<RefCell<Vec<DisplayItem>>>,
}

/// Document sink that keeps every page as a replayable display list.
#[derive(Default)]
pub struct RecordingDocument {
    pages: Vec<Page>,
    current: Option<OpenPage>,
}

impl RecordingDocument {
    pub fn new() -> Self {
        Self {
            pages: Vec::new(),
            current: None,
        }
    }

    /// Finished pages, in order.
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// Dump the recording as JSON.
    pub fn to_json(&self) -> String {
        let mut out = String::new();
        out.push_str("{\"pages\":[");
        for (page_index, page) in self.pages.iter().enumerate() {
            if page_index > 0 {
                out.push(',');
            }
            let _ = write!(
                out,
                "{{\"width\":{},\"height\":{},\"items\":[",
                page.width, page.height
            );
            for (item_index, item) in page.items.iter().enumerate() {
                if item_index > 0 {
                    out.push(',');
                }
                write_item(&mut out, item);
            }
            out.push_str("]}");
        }
        out.push_str("]}");
        out
    }
}

fn write_item(out: &mut String, item: &DisplayItem) {
    match item {
        DisplayItem::Rect { rect, paint } => {
            let _ = write!(
                out,
                "{{\"op\":\"rect\",\"x\":{},\"y\":{},\"w\":{},\"h\":{},\"paint\":\"{}\"}}",
                rect.x0,
                rect.y0,
                rect.width(),
                rect.height(),
                paint_label(paint)
            );
        }
        DisplayItem::Oval { rect, paint } => {
            let _ = write!(
                out,
                "{{\"op\":\"oval\",\"x\":{},\"y\":{},\"w\":{},\"h\":{},\"paint\":\"{}\"}}",
                rect.x0,
                rect.y0,
                rect.width(),
                rect.height(),
                paint_label(paint)
            );
        }
        DisplayItem::Path { path, paint } => {
            let _ = write!(
                out,
                "{{\"op\":\"path\",\"elements\":{},\"paint\":\"{}\"}}",
                path.elements().len(),
                paint_label(paint)
            );
        }
        DisplayItem::GlyphRun { run, paint } => {
            let _ = write!(
                out,
                "{{\"op\":\"glyphs\",\"font\":\"{}\",\"size\":{},\"count\":{},\"paint\":\"{}\"}}",
                run.font,
                run.size,
                run.glyphs.len(),
                paint_label(paint)
            );
        }
        DisplayItem::Save => out.push_str("{\"op\":\"save\"}"),
        DisplayItem::Restore => out.push_str("{\"op\":\"restore\"}"),
        DisplayItem::Transform { affine } => {
            let coeffs = affine.as_coeffs();
            let _ = write!(
                out,
                "{{\"op\":\"transform\",\"matrix\":[{},{},{},{},{},{}]}}",
                coeffs[0], coeffs[1], coeffs[2], coeffs[3], coeffs[4], coeffs[5]
            );
        }
    }
}

fn paint_label(paint: &Paint) -> String {
    let phase = match paint.style {
        PaintStyle::Fill => "fill",
        PaintStyle::Stroke { .. } => "stroke",
    };
    format!(
        "{} #{:02x}{:02x}{:02x}{:02x}",
        phase, paint.color.r, paint.color.g, paint.color.b, paint.color.a
    )
}

impl DocumentSink for RecordingDocument {
    fn begin_page(&mut self, width: f64, height: f64) -> Box<dyn Canvas> {
        assert!(
            self.current.is_none(),
            "begin_page while a page is already active"
        );
        let items = Rc::new(RefCell::new(Vec::new()));
        self.current = Some(OpenPage {
            width,
            height,
            items: Rc::clone(&items),
        });
        Box::new(RecordingCanvas { items })
    }

    fn end_page(&mut self, canvas: Box<dyn Canvas>) {
        drop(canvas);
        let Some(open) = self.current.take() else {
            panic!("end_page without begin_page");
        };
        let items = Rc::try_unwrap(open.items)
            .map(RefCell::into_inner)
            .unwrap_or_else(|shared| shared.borrow().clone());
        self.pages.push(Page {
            width: open.width,
            height: open.height,
            items,
        });
    }

    fn is_drawing(&self) -> bool {
        self.current.is_some()
    }

    fn page_size(&self) -> Option<(f64, f64)> {
        self.current.as_ref().map(|open| (open.width, open.height))
    }

    fn save(&mut self, path: &Path) -> Result<()> {
        let format = OutputFormat::from_path(path)?;
        match format {
            OutputFormat::Json => {
                std::fs::write(path, self.to_json()).map_err(ExportError::Io)?;
                log::debug!("wrote {} page(s) to {}", self.pages.len(), path.display());
                Ok(())
            }
            other => Err(ExportError::FormatNotSupported(other.to_string()).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drawpad_core::types::{BlendMode, Color};

    fn fill_paint() -> Paint {
        Paint {
            color: Color::BLACK,
            blend_mode: BlendMode::SourceOver,
            anti_alias: true,
            style: PaintStyle::Fill,
        }
    }

    #[test]
    fn records_items_per_page() {
        let mut doc = RecordingDocument::new();
        let mut canvas = doc.begin_page(100.0, 50.0);
        assert!(doc.is_drawing());
        assert_eq!(doc.page_size(), Some((100.0, 50.0)));
        canvas.draw_rect(Rect::new(0.0, 0.0, 10.0, 10.0), &fill_paint());
        doc.end_page(canvas);
        assert!(!doc.is_drawing());
        assert_eq!(doc.pages().len(), 1);
        assert_eq!(doc.pages()[0].items.len(), 1);
    }

    #[test]
    #[should_panic(expected = "already active")]
    fn double_begin_page_is_a_bug() {
        let mut doc = RecordingDocument::new();
        let _first = doc.begin_page(10.0, 10.0);
        let _second = doc.begin_page(10.0, 10.0);
    }

    #[test]
    fn json_dump_lists_pages_and_ops() {
        let mut doc = RecordingDocument::new();
        let mut canvas = doc.begin_page(20.0, 20.0);
        canvas.draw_oval(Rect::new(0.0, 0.0, 20.0, 20.0), &fill_paint());
        canvas.save();
        canvas.restore();
        doc.end_page(canvas);
        let json = doc.to_json();
        assert!(json.contains("\"op\":\"oval\""));
        assert!(json.contains("\"op\":\"save\""));
        assert!(json.contains("\"width\":20"));
    }

    #[test]
    fn unsupported_formats_are_reported() {
        let mut doc = RecordingDocument::new();
        let err = doc.save(Path::new("out.png"));
        assert!(matches!(
            err,
            Err(drawpad_core::error::DrawpadError::Export(
                ExportError::FormatNotSupported(_)
            ))
        ));
        let err = doc.save(Path::new("out.webp"));
        assert!(matches!(
            err,
            Err(drawpad_core::error::DrawpadError::Export(
                ExportError::UnknownFormat(_)
            ))
        ));
    }
}
