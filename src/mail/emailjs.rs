//! EmailJS-compatible HTTP mailer.
//!
//! Sends one `POST` per certificate:
//!
//! ```json
//! {
//!   "service_id": "...", "template_id": "...", "user_id": "...",
//!   "template_params": {
//!     "to_name": "Ada", "to_email": "ada@example.com", "from_name": "...",
//!     "file_name": "certificate-Ada.jpg",
//!     "certificate": "data:image/jpeg;base64,..."
//!   }
//! }
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{CertificateMail, Mailer};
use crate::error::CertigenError;
use crate::image_source::encode_data_uri;

pub const EMAILJS_ENDPOINT: &str = "https://api.emailjs.com/api/v1.0/email/send";

/// Credentials for the email API.
///
/// Accepts both the short field names and the `emailjs_`-prefixed names
/// used by older saved settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailSettings {
    #[serde(alias = "emailjs_service_id")]
    pub service_id: String,
    #[serde(alias = "emailjs_template_id")]
    pub template_id: String,
    #[serde(alias = "emailjs_user_id")]
    pub user_id: String,
    #[serde(default)]
    pub from_name: String,
}

impl MailSettings {
    pub fn validate(&self) -> Result<(), CertigenError> {
        let missing: Vec<&str> = [
            ("service_id", &self.service_id),
            ("template_id", &self.template_id),
            ("user_id", &self.user_id),
        ]
        .into_iter()
        .filter(|(_, v)| v.trim().is_empty())
        .map(|(k, _)| k)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(CertigenError::InvalidInput(format!(
                "Mail settings missing: {}",
                missing.join(", ")
            )))
        }
    }
}

#[derive(Serialize)]
struct SendRequest<'a> {
    service_id: &'a str,
    template_id: &'a str,
    user_id: &'a str,
    template_params: TemplateParams<'a>,
}

#[derive(Serialize)]
struct TemplateParams<'a> {
    to_name: &'a str,
    to_email: &'a str,
    from_name: &'a str,
    file_name: &'a str,
    certificate: String,
}

pub struct EmailJsMailer {
    client: reqwest::Client,
    settings: MailSettings,
    endpoint: String,
}

impl EmailJsMailer {
    pub fn new(settings: MailSettings) -> Result<Self, CertigenError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("certigen/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CertigenError::Dispatch(format!("HTTP client error: {}", e)))?;
        Self::with_client(client, settings)
    }

    pub fn with_client(client: reqwest::Client, settings: MailSettings) -> Result<Self, CertigenError> {
        settings.validate()?;
        Ok(Self {
            client,
            settings,
            endpoint: EMAILJS_ENDPOINT.to_string(),
        })
    }

    /// Point at a different API endpoint (self-hosted relay, tests).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl Mailer for EmailJsMailer {
    async fn send(&self, mail: &CertificateMail) -> Result<(), CertigenError> {
        let request = SendRequest {
            service_id: &self.settings.service_id,
            template_id: &self.settings.template_id,
            user_id: &self.settings.user_id,
            template_params: TemplateParams {
                to_name: &mail.to_name,
                to_email: &mail.to_email,
                from_name: &self.settings.from_name,
                file_name: &mail.attachment.file_name,
                certificate: encode_data_uri(mail.attachment.mime_type, &mail.attachment.bytes),
            },
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| CertigenError::Dispatch(format!("Failed to reach mail API: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CertigenError::Dispatch(format!(
                "Mail API returned HTTP {}: {}",
                status,
                body.trim()
            )));
        }

        tracing::debug!(to = %mail.to_email, "mail API accepted certificate");
        Ok(())
    }
}
