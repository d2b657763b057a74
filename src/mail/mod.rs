//! # Certificate Dispatch
//!
//! Renders each recipient's certificate and hands it to a [`Mailer`].
//!
//! ```text
//! for recipient in order:
//!   no email?      → Skipped
//!   render+export  → Failed on error
//!   mailer.send    → Sent | Failed
//! ```
//!
//! Recipients are processed one after another. A failure is recorded for
//! that recipient only and never aborts the batch.

pub mod emailjs;

use async_trait::async_trait;
use serde::Serialize;

use crate::compositor::Compositor;
use crate::error::CertigenError;
use crate::export::{ExportOptions, ExportedFile, export};
use crate::image_source::TemplateImage;
use crate::model::{Recipient, TextElement};

pub use emailjs::{EMAILJS_ENDPOINT, EmailJsMailer, MailSettings};

/// One outgoing certificate email.
#[derive(Debug, Clone)]
pub struct CertificateMail {
    pub to_name: String,
    pub to_email: String,
    pub attachment: ExportedFile,
}

/// Delivers certificate emails.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: &CertificateMail) -> Result<(), CertigenError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "lowercase")]
pub enum DispatchStatus {
    Sent,
    Skipped(String),
    Failed(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct DispatchOutcome {
    pub recipient: Recipient,
    #[serde(flatten)]
    pub status: DispatchStatus,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DispatchReport {
    pub outcomes: Vec<DispatchOutcome>,
}

impl DispatchReport {
    fn count(&self, pred: impl Fn(&DispatchStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.status)).count()
    }

    pub fn sent(&self) -> usize {
        self.count(|s| matches!(s, DispatchStatus::Sent))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, DispatchStatus::Skipped(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, DispatchStatus::Failed(_)))
    }
}

async fn dispatch_one(
    mailer: &dyn Mailer,
    compositor: &Compositor<'_>,
    template: &TemplateImage,
    elements: &[TextElement],
    recipient: &Recipient,
    options: &ExportOptions,
) -> DispatchStatus {
    let Some(email) = recipient.email.as_deref().map(str::trim).filter(|e| !e.is_empty()) else {
        return DispatchStatus::Skipped("no email address".to_string());
    };

    let surface = compositor.render(template, elements, &recipient.name);
    let attachment = match export(&surface, &recipient.name, options) {
        Ok(file) => file,
        Err(e) => return DispatchStatus::Failed(e.to_string()),
    };

    let mail = CertificateMail {
        to_name: recipient.name.clone(),
        to_email: email.to_string(),
        attachment,
    };
    match mailer.send(&mail).await {
        Ok(()) => DispatchStatus::Sent,
        Err(e) => DispatchStatus::Failed(e.to_string()),
    }
}

/// Render, export and send a certificate to every recipient, in order.
pub async fn dispatch_batch(
    mailer: &dyn Mailer,
    compositor: &Compositor<'_>,
    template: &TemplateImage,
    elements: &[TextElement],
    recipients: &[Recipient],
    options: &ExportOptions,
) -> DispatchReport {
    let mut report = DispatchReport::default();

    for recipient in recipients {
        let status =
            dispatch_one(mailer, compositor, template, elements, recipient, options).await;
        match &status {
            DispatchStatus::Sent => tracing::info!(recipient = %recipient.name, "certificate sent"),
            DispatchStatus::Skipped(reason) => {
                tracing::info!(recipient = %recipient.name, reason = %reason, "certificate skipped")
            }
            DispatchStatus::Failed(reason) => {
                tracing::warn!(recipient = %recipient.name, reason = %reason, "certificate dispatch failed")
            }
        }
        report.outcomes.push(DispatchOutcome {
            recipient: recipient.clone(),
            status,
        });
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fonts::FontRegistry;
    use image::{Rgba, RgbaImage};
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    /// Records every mail; rejects addresses containing "bounce".
    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<CertificateMail>>,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, mail: &CertificateMail) -> Result<(), CertigenError> {
            if mail.to_email.contains("bounce") {
                return Err(CertigenError::Dispatch("mailbox unavailable".to_string()));
            }
            self.sent.lock().unwrap().push(mail.clone());
            Ok(())
        }
    }

    fn template() -> TemplateImage {
        TemplateImage::from_rgba(RgbaImage::from_pixel(160, 40, Rgba([255, 255, 255, 255]))).unwrap()
    }

    #[tokio::test]
    async fn test_dispatch_reports_per_recipient() {
        let fonts = FontRegistry::new();
        let compositor = Compositor::new(&fonts);
        let elements = vec![TextElement::new("{name}").with_position(0.0, 0.0)];
        let recipients = vec![
            Recipient::new("Ada").unwrap().with_email("ada@example.com"),
            Recipient::new("Nobody").unwrap(),
            Recipient::new("Bob").unwrap().with_email("bounce@example.com"),
            Recipient::new("Grace").unwrap().with_email("grace@example.com"),
        ];
        let mailer = RecordingMailer::default();

        let report = dispatch_batch(
            &mailer,
            &compositor,
            &template(),
            &elements,
            &recipients,
            &ExportOptions::default(),
        )
        .await;

        assert_eq!((report.sent(), report.skipped(), report.failed()), (2, 1, 1));
        assert_eq!(report.outcomes[1].status, DispatchStatus::Skipped("no email address".into()));
        assert!(matches!(report.outcomes[2].status, DispatchStatus::Failed(_)));
        assert_eq!(report.outcomes[3].status, DispatchStatus::Sent);

        let sent = mailer.sent.lock().unwrap();
        let names: Vec<_> = sent.iter().map(|m| m.attachment.file_name.as_str()).collect();
        assert_eq!(names, vec!["certificate-Ada.jpg", "certificate-Grace.jpg"]);
        assert_ne!(sent[0].attachment.bytes, sent[1].attachment.bytes);
    }

    #[test]
    fn test_outcome_serializes_flat() {
        let outcome = DispatchOutcome {
            recipient: Recipient::new("Ada").unwrap().with_id("r1"),
            status: DispatchStatus::Failed("boom".into()),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["reason"], "boom");
        assert_eq!(json["recipient"]["name"], "Ada");
    }
}
