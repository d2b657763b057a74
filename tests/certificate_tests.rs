//! # End-to-End Certificate Tests
//!
//! Drive the public API the way the CLI and server do: load a template,
//! register fonts, render, export and persist.

use certigen::compositor::{Compositor, layout_element};
use certigen::editor::{Editor, MIN_HEIGHT, MIN_WIDTH, Point, ResizeHandle};
use certigen::export::{self, ExportFormat, ExportOptions};
use certigen::fonts::FontRegistry;
use certigen::image_source::{ImageSource, TemplateImage, encode_data_uri};
use certigen::model::{
    ElementList, FontWeight, Recipient, RecipientList, RecipientRow, TextAlign, TextElement,
};
use certigen::storage::{FileStore, Workspace};
use image::{ImageFormat, Rgba, RgbaImage};
use pretty_assertions::assert_eq;
use std::io::Cursor;
use std::sync::Arc;

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

fn white_png(w: u32, h: u32) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    RgbaImage::from_pixel(w, h, WHITE)
        .write_to(&mut out, ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

fn dejavu() -> Vec<u8> {
    std::fs::read(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/tests/fixtures/fonts/DejaVuSans.ttf"
    ))
    .unwrap()
}

fn ink_columns(image: &RgbaImage) -> Option<(u32, u32)> {
    let xs: Vec<u32> = image
        .enumerate_pixels()
        .filter(|(_, _, p)| **p != WHITE)
        .map(|(x, _, _)| x)
        .collect();
    Some((*xs.iter().min()?, *xs.iter().max()?))
}

// ============================================================================
// Rendering
// ============================================================================

#[tokio::test]
async fn test_hello_ada_on_800x600() {
    let template = ImageSource::Bytes(white_png(800, 600)).load().await.unwrap();
    let fonts = FontRegistry::new();
    let element = TextElement::new("Hello {name}!")
        .with_position(50.0, 50.0)
        .with_font_size(20.0)
        .with_width(Some(200.0));

    let layout = layout_element(&element, "Ada", template.width(), template.height(), &fonts);
    assert_eq!(layout.lines.len(), 1);
    assert_eq!(layout.lines[0].text, "Hello Ada!");
    assert_eq!((layout.lines[0].x, layout.lines[0].top), (400.0, 300.0));

    let surface = Compositor::new(&fonts).render(&template, &[element], "Ada");
    assert_eq!((surface.width(), surface.height()), (800, 600));
    assert!(surface.as_rgba().pixels().any(|p| *p == Rgba([34, 34, 34, 255])));
}

#[test]
fn test_batch_has_no_cross_contamination() {
    let template = TemplateImage::decode(&white_png(240, 60)).unwrap();
    let fonts = FontRegistry::new();
    let elements = vec![
        TextElement::new("Certificate").with_position(0.0, 0.0).with_font_size(12.0),
        TextElement::new("{name}").with_position(50.0, 50.0).with_align(TextAlign::Center),
    ];

    let mut recipients = RecipientList::new();
    let summary = recipients.import(vec![
        RecipientRow { name: Some("Ada".into()), ..Default::default() },
        RecipientRow { name: Some("  ".into()), ..Default::default() },
        RecipientRow { name: Some("Grace Hopper".into()), ..Default::default() },
        RecipientRow { name: Some("Linus".into()), ..Default::default() },
    ]);
    assert_eq!((summary.imported, summary.skipped), (3, 1));

    let compositor = Compositor::new(&fonts);
    let batch: Vec<_> = compositor
        .render_batch(&template, &elements, recipients.as_slice())
        .collect();

    assert_eq!(batch.len(), 3);
    for (recipient, surface) in &batch {
        let alone = compositor.render(&template, &elements, &recipient.name);
        assert_eq!(surface, &alone, "batch output differs for {}", recipient.name);
    }
    assert_ne!(batch[0].1, batch[1].1);
    assert_ne!(batch[1].1, batch[2].1);
}

#[test]
fn test_custom_font_renders_antialiased() {
    let template = TemplateImage::decode(&white_png(400, 100)).unwrap();
    let mut fonts = FontRegistry::new();
    fonts.register("DejaVu", &FontWeight::normal(), dejavu()).unwrap();

    let element = TextElement::new("Smooth {name}")
        .with_position(5.0, 10.0)
        .with_font_size(40.0)
        .with_font_family("DejaVu");
    let surface = Compositor::new(&fonts).render(&template, &[element], "Ada");

    let greys = surface
        .as_rgba()
        .pixels()
        .filter(|p| p[0] > 34 && p[0] < 255)
        .count();
    assert!(greys > 0, "expected anti-aliased edges");
}

#[test]
fn test_unknown_font_falls_back_without_failing() {
    let template = TemplateImage::decode(&white_png(200, 50)).unwrap();
    let fonts = FontRegistry::new();
    let element = TextElement::new("Fallback")
        .with_position(0.0, 0.0)
        .with_font_family("Definitely Not Installed");
    let surface = Compositor::new(&fonts).render(&template, &[element], "");
    assert!(ink_columns(surface.as_rgba()).is_some());
}

#[test]
fn test_enormous_font_size_on_tiny_template() {
    let template = TemplateImage::decode(&white_png(10, 10)).unwrap();
    let mut fonts = FontRegistry::new();
    fonts.register("DejaVu", &FontWeight::normal(), dejavu()).unwrap();

    let elements = vec![
        TextElement::new("W")
            .with_position(0.0, 0.0)
            .with_font_size(60_000.0)
            .with_font_family("DejaVu"),
        TextElement::new("A").with_position(0.0, 0.0).with_font_size(20_000.0),
    ];
    let surface = Compositor::new(&fonts).render(&template, &elements, "Ada");
    assert_eq!((surface.width(), surface.height()), (10, 10));
}

#[test]
fn test_center_alignment_is_symmetric() {
    let template = TemplateImage::decode(&white_png(400, 60)).unwrap();
    let fonts = FontRegistry::new();
    let element = TextElement::new("{name}")
        .with_position(50.0, 20.0)
        .with_font_size(24.0)
        .with_align(TextAlign::Center);
    let surface = Compositor::new(&fonts).render(&template, &[element], "HHHH");

    // 4 cells of 12px centered on x=200 span 176..224.
    let (min_x, max_x) = ink_columns(surface.as_rgba()).unwrap();
    assert!(min_x >= 176 && max_x < 224);
}

// ============================================================================
// Editing
// ============================================================================

#[test]
fn test_edit_then_render_uses_new_geometry() {
    let element = TextElement::new("{name}").with_id("n").with_position(10.0, 10.0);
    let mut elements = ElementList::from(vec![element.clone()]);
    let mut editor = Editor::new(400.0, 200.0);

    editor.pointer_down(&element, Point::new(40.0, 20.0));
    editor.pointer_move(&mut elements, Point::new(240.0, 120.0));
    editor.pointer_up();

    let moved = elements.get("n").unwrap();
    assert_eq!((moved.x, moved.y), (60.0, 60.0));

    editor.pointer_down_handle(moved, ResizeHandle::Corner, Point::new(0.0, 0.0));
    let resized = editor
        .pointer_move(&mut elements, Point::new(-10_000.0, -10_000.0))
        .unwrap();
    assert_eq!((resized.width, resized.height), (Some(MIN_WIDTH), Some(MIN_HEIGHT)));
}

// ============================================================================
// Export
// ============================================================================

#[test]
fn test_jpeg_and_pdf_exports() {
    let template = TemplateImage::decode(&white_png(320, 240)).unwrap();
    let fonts = FontRegistry::new();
    let surface = Compositor::new(&fonts).render(
        &template,
        &[TextElement::new("{name}").with_position(10.0, 10.0)],
        "Ada",
    );

    let jpg = export::export(&surface, "Ada", &ExportOptions::default()).unwrap();
    assert_eq!(jpg.file_name, "certificate-Ada.jpg");
    let decoded = image::load_from_memory(&jpg.bytes).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (320, 240));

    let pdf = export::export(&surface, "Ada", &ExportOptions::new(ExportFormat::Pdf)).unwrap();
    assert_eq!(pdf.file_name, "certificate-Ada.pdf");
    let text = String::from_utf8_lossy(&pdf.bytes);
    assert!(text.contains("/MediaBox [0 0 320 240]"));
}

// ============================================================================
// Workspace
// ============================================================================

#[tokio::test]
async fn test_workspace_restores_fonts_and_template() {
    let dir = tempfile::tempdir().unwrap();
    let png = white_png(100, 40);

    {
        let workspace = Workspace::new(Arc::new(FileStore::open(dir.path()).unwrap()));
        workspace
            .set_current_image(&ImageSource::DataUri(encode_data_uri("image/png", &png)))
            .unwrap();
        workspace
            .set_elements(&ElementList::from(vec![
                TextElement::new("{name}").with_font_family("custom-dejavu-sans"),
            ]))
            .unwrap();
        workspace
            .add_font_upload(&certigen::fonts::FontUpload::new(
                "DejaVu Sans",
                FontWeight::normal(),
                &dejavu(),
            ))
            .unwrap();
        let mut recipients = RecipientList::new();
        recipients.add(Recipient::new("Ada").unwrap());
        workspace.set_recipients(&recipients).unwrap();
    }

    let workspace = Workspace::new(Arc::new(FileStore::open(dir.path()).unwrap()));
    let mut fonts = FontRegistry::new();
    assert_eq!(fonts.restore(&workspace.font_uploads().unwrap()), 1);
    assert!(fonts.contains("custom-dejavu-sans"));

    let template = workspace.current_template().unwrap().unwrap();
    let image = template.image.load().await.unwrap();
    assert_eq!((image.width(), image.height()), (100, 40));
    assert_eq!(template.elements.len(), 1);
    assert_eq!(workspace.recipients().unwrap().len(), 1);
}
