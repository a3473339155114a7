//! End-to-end tests against the recording document.

use drawpad::{
    Color, DisplayItem, DocumentSink, DrawpadError, Drawing, ExportError, FontLoadError,
    PaintStyle, StyleProperty,
};

fn plain_drawing() -> Drawing {
    let _ = env_logger::builder().is_test(true).try_init();
    // No canvas flip, so recorded items start at the first draw call.
    Drawing::new().with_flip_canvas(false)
}

fn finished_items(drawing: &mut Drawing) -> Vec<DisplayItem> {
    // Flush the open page so the display list is inspectable.
    drawing.new_page(1.0, 1.0);
    drawing.document().pages()[0].items.clone()
}

#[test]
fn first_draw_opens_a_default_page() {
    let mut drawing = plain_drawing();
    assert!(drawing.width().is_none());
    drawing.rect(0.0, 0.0, 10.0, 10.0);
    assert_eq!(drawing.width(), Some(1000.0));
    assert_eq!(drawing.height(), Some(1000.0));
}

#[test]
fn size_fails_once_a_page_is_active() {
    let mut drawing = plain_drawing();
    drawing.size(400.0, 300.0).unwrap();
    assert_eq!(drawing.width(), Some(400.0));
    let err = drawing.size(500.0, 500.0);
    assert!(matches!(err, Err(DrawpadError::UnsupportedOperation(_))));
    // A new page is always allowed.
    drawing.new_page(500.0, 500.0);
    assert_eq!(drawing.width(), Some(500.0));
    assert_eq!(drawing.document().pages().len(), 1);
}

#[test]
fn fill_and_stroke_issue_separate_draws() {
    let mut drawing = plain_drawing();
    drawing.stroke(Some(Color::BLACK));
    drawing.stroke_width(3.0);
    drawing.rect(0.0, 0.0, 10.0, 10.0);
    let items = finished_items(&mut drawing);
    assert_eq!(items.len(), 2);
    match (&items[0], &items[1]) {
        (
            DisplayItem::Rect { paint: first, .. },
            DisplayItem::Rect { paint: second, .. },
        ) => {
            // Fill comes first, stroke carries its geometry.
            assert_eq!(first.style, PaintStyle::Fill);
            match second.style {
                PaintStyle::Stroke { width, .. } => assert_eq!(width, 3.0),
                PaintStyle::Fill => panic!("second draw should stroke"),
            }
        }
        other => panic!("unexpected items: {other:?}"),
    }
}

#[test]
fn disabling_fill_skips_the_fill_phase() {
    let mut drawing = plain_drawing();
    drawing.fill(None);
    drawing.oval(0.0, 0.0, 10.0, 10.0);
    let items = finished_items(&mut drawing);
    assert!(items.is_empty());

    let mut drawing = plain_drawing();
    drawing.fill(None);
    drawing.stroke(Some(Color::BLACK));
    drawing.oval(0.0, 0.0, 10.0, 10.0);
    let items = finished_items(&mut drawing);
    assert_eq!(items.len(), 1);
}

#[test]
fn saved_state_scopes_restore_style_and_canvas() {
    let mut drawing = plain_drawing();
    drawing.fill(Some(Color::rgb(1.0, 0.0, 0.0)));
    let before = drawing.state().clone();
    drawing.with_saved_state(|d| {
        d.fill(Some(Color::rgb(0.0, 1.0, 0.0)));
        d.translate(10.0, 10.0);
        d.rect(0.0, 0.0, 5.0, 5.0);
        assert_ne!(d.state(), &before);
    });
    assert_eq!(drawing.state(), &before);
    let items = finished_items(&mut drawing);
    assert!(matches!(items.first(), Some(DisplayItem::Save)));
    assert!(matches!(items.last(), Some(DisplayItem::Restore)));
    assert!(items
        .iter()
        .any(|item| matches!(item, DisplayItem::Transform { .. })));
}

#[test]
#[should_panic(expected = "without a matching save_state")]
fn unbalanced_restore_is_fatal() {
    let mut drawing = plain_drawing();
    drawing.restore_state();
}

#[test]
fn nested_saved_states_unwind_in_order() {
    let mut drawing = plain_drawing();
    drawing.font_size(10.0);
    drawing.with_saved_state(|d| {
        d.font_size(20.0);
        d.with_saved_state(|d| {
            d.font_size(30.0);
            assert_eq!(d.state().text().font_size(), 30.0);
        });
        assert_eq!(d.state().text().font_size(), 20.0);
    });
    assert_eq!(drawing.state().text().font_size(), 10.0);
}

#[test]
fn empty_text_is_a_benign_no_op() {
    let mut drawing = plain_drawing();
    drawing.font("this-font-does-not-exist-anywhere");
    // Succeeds without resolving the (missing) font or opening a page.
    drawing.text("", (10.0, 10.0), None).unwrap();
    assert!(!drawing.document().is_drawing());
    assert!(drawing.document().pages().is_empty());
}

#[test]
fn missing_fonts_surface_as_font_load_errors() {
    let mut drawing = plain_drawing();
    drawing.font("drawpad-definitely-not-installed");
    let err = drawing.text("hello", (0.0, 0.0), None);
    assert!(matches!(
        err,
        Err(DrawpadError::FontLoad(FontLoadError::FamilyNotFound(_)))
    ));
}

#[test]
fn empty_formatted_string_is_a_no_op() {
    let mut drawing = plain_drawing();
    let formatted = drawpad::FormattedString::from_text(
        "",
        &[StyleProperty::FontSize(24.0)],
    );
    drawing.text_formatted(&formatted, (0.0, 0.0), None).unwrap();
    assert!(!drawing.document().is_drawing());
    assert!(drawing.document().pages().is_empty());
}

#[test]
fn unknown_output_extension_is_an_error() {
    let mut drawing = plain_drawing();
    drawing.rect(0.0, 0.0, 10.0, 10.0);
    let err = drawing.save_image("/tmp/drawpad-test.tiff");
    assert!(matches!(
        err,
        Err(DrawpadError::Export(ExportError::UnknownFormat(_)))
    ));
}

#[test]
fn json_dump_round_trips_through_save_image() {
    let path = std::env::temp_dir().join("drawpad-json-dump-test.json");
    let mut drawing = plain_drawing();
    drawing.size(200.0, 100.0).unwrap();
    drawing.rect(10.0, 10.0, 50.0, 50.0);
    drawing.save_image(&path).unwrap();
    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.contains("\"pages\""));
    assert!(written.contains("\"op\":\"rect\""));
    assert!(written.contains("\"width\":200"));
    let _ = std::fs::remove_file(&path);
}

#[test]
fn raster_formats_belong_to_rasterizing_backends() {
    let mut drawing = plain_drawing();
    drawing.rect(0.0, 0.0, 10.0, 10.0);
    let err = drawing.save_image("/tmp/drawpad-test.png");
    assert!(matches!(
        err,
        Err(DrawpadError::Export(ExportError::FormatNotSupported(_)))
    ));
}

#[test]
fn page_flip_prepends_a_transform() {
    let mut drawing = Drawing::new();
    drawing.size(100.0, 100.0).unwrap();
    drawing.rect(0.0, 0.0, 10.0, 10.0);
    drawing.new_page(1.0, 1.0);
    let items = &drawing.document().pages()[0].items;
    assert!(matches!(items.first(), Some(DisplayItem::Transform { .. })));
}

#[test]
fn paths_record_with_their_elements() {
    let mut drawing = plain_drawing();
    let mut path = drawpad::BezierPath::new();
    path.move_to((0.0, 0.0));
    path.line_to((10.0, 0.0));
    path.curve_to((12.0, 2.0), (12.0, 8.0), (10.0, 10.0));
    path.close();
    drawing.draw_path(&path);
    let items = finished_items(&mut drawing);
    assert_eq!(items.len(), 1);
    match &items[0] {
        DisplayItem::Path { path, .. } => assert_eq!(path.elements().len(), 4),
        other => panic!("expected a path item, got {other:?}"),
    }
}
