//! # Compositor
//!
//! Draws personalized text over a template image.
//!
//! ```text
//! TemplateImage ──copy──▶ Surface (natural resolution)
//!                            │
//! TextElement[] ──layout──▶ lines ──draw──▶ Surface
//!      ▲
//!   recipient name ({name} substitution)
//! ```
//!
//! Rendering is a pure function of its inputs: the same template, elements,
//! name and registered fonts always produce the same pixels. Elements are
//! drawn in list order, so later elements paint over earlier ones.

pub mod draw;
pub mod layout;
pub mod session;

use image::RgbaImage;

use crate::fonts::{Clip, FontRegistry};
use crate::image_source::TemplateImage;
use crate::model::{Recipient, TextElement};

pub use layout::{ElementLayout, PlacedLine, align_x, layout_element, to_pixels, wrap_words};
pub use session::{PreviewSession, RenderTicket};

/// A rendered certificate, same size as its template.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    image: RgbaImage,
}

impl Surface {
    pub fn new(image: RgbaImage) -> Self {
        Self { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn as_rgba(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_rgba(self) -> RgbaImage {
        self.image
    }
}

/// Renders certificates with a fixed set of registered fonts.
pub struct Compositor<'a> {
    fonts: &'a FontRegistry,
}

impl<'a> Compositor<'a> {
    pub fn new(fonts: &'a FontRegistry) -> Self {
        Self { fonts }
    }

    /// Lay out every element without drawing.
    pub fn layout(
        &self,
        template: &TemplateImage,
        elements: &[TextElement],
        recipient_name: &str,
    ) -> Vec<ElementLayout> {
        elements
            .iter()
            .map(|el| {
                layout_element(
                    el,
                    recipient_name,
                    template.width(),
                    template.height(),
                    self.fonts,
                )
            })
            .collect()
    }

    /// Render one certificate.
    pub fn render(
        &self,
        template: &TemplateImage,
        elements: &[TextElement],
        recipient_name: &str,
    ) -> Surface {
        let mut image = template.as_rgba().clone();
        let clip = Clip::surface(image.width(), image.height());

        for layout in self.layout(template, elements, recipient_name) {
            let color = layout.color;
            for line in &layout.lines {
                layout.font.draw(&line.text, line.x, line.top, clip, &mut |x, y, coverage| {
                    draw::blend(&mut image, x, y, color, coverage);
                });
            }
        }

        Surface::new(image)
    }

    /// Render one certificate per recipient, in order, one at a time.
    ///
    /// The template is decoded once by the caller and reused for every
    /// recipient. Each surface is produced only when the iterator is
    /// advanced.
    pub fn render_batch<'r>(
        &'r self,
        template: &'r TemplateImage,
        elements: &'r [TextElement],
        recipients: &'r [Recipient],
    ) -> impl Iterator<Item = (&'r Recipient, Surface)> + 'r {
        recipients
            .iter()
            .map(move |recipient| (recipient, self.render(template, elements, &recipient.name)))
    }
}

/// Render one certificate with the given fonts.
pub fn render(
    template: &TemplateImage,
    elements: &[TextElement],
    recipient_name: &str,
    fonts: &FontRegistry,
) -> Surface {
    Compositor::new(fonts).render(template, elements, recipient_name)
}
