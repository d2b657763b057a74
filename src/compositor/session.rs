//! Preview sessions with a stale-decode guard.
//!
//! Every preview request takes a ticket. Loading the template is the only
//! suspension point; when a newer request started while this one was
//! loading, the older result is discarded instead of drawn.
//!
//! ```text
//! request A ──begin(1)── load ........................▶ stale, dropped
//! request B ──────────────begin(2)── load ──▶ current, rendered
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::CertigenError;
use crate::fonts::FontRegistry;
use crate::image_source::{ImageSource, TemplateImage};
use crate::model::TextElement;

use super::{Compositor, Surface};

/// Identifies one preview request within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderTicket(u64);

/// A single preview target (one editor canvas, one preview pane).
///
/// Clones share the same generation counter.
#[derive(Debug, Clone, Default)]
pub struct PreviewSession {
    generation: Arc<AtomicU64>,
}

impl PreviewSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new request, superseding every earlier ticket.
    pub fn begin(&self) -> RenderTicket {
        RenderTicket(self.generation.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Whether `ticket` is still the latest request.
    pub fn is_current(&self, ticket: RenderTicket) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket.0
    }

    /// Render if `ticket` is still current, otherwise return `None`.
    pub fn render_if_current(
        &self,
        ticket: RenderTicket,
        template: &TemplateImage,
        elements: &[TextElement],
        recipient_name: &str,
        fonts: &FontRegistry,
    ) -> Option<Surface> {
        if !self.is_current(ticket) {
            tracing::debug!(ticket = ticket.0, "discarding stale preview");
            return None;
        }
        Some(Compositor::new(fonts).render(template, elements, recipient_name))
    }

    /// Load `source` and render it, unless a newer request overtook this
    /// one during the load.
    pub async fn preview(
        &self,
        source: &ImageSource,
        elements: &[TextElement],
        recipient_name: &str,
        fonts: &FontRegistry,
    ) -> Result<Option<Surface>, CertigenError> {
        let ticket = self.begin();
        let template = source.load().await?;
        Ok(self.render_if_current(ticket, &template, elements, recipient_name, fonts))
    }
}
