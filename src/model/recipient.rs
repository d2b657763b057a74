//! Recipients: the people a certificate is generated for.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CertigenError;

/// A named entity substituted into `{name}` tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    #[serde(default = "new_id")]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Trim an optional field, dropping it when blank.
fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Recipient {
    /// Create a recipient with a trimmed, non-empty name.
    pub fn new(name: &str) -> Result<Self, CertigenError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CertigenError::InvalidInput(
                "recipient name cannot be empty".to_string(),
            ));
        }
        Ok(Self {
            id: new_id(),
            name: name.to_string(),
            email: None,
            description: None,
        })
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = non_blank(Some(email.into()));
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = non_blank(Some(description.into()));
        self
    }
}

/// One row of already-parsed import data.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecipientRow {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Outcome of a bulk import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
}

/// The recipients of one batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecipientList {
    recipients: Vec<Recipient>,
}

impl RecipientList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.recipients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipients.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Recipient> {
        self.recipients.iter()
    }

    pub fn as_slice(&self) -> &[Recipient] {
        &self.recipients
    }

    pub fn get(&self, id: &str) -> Option<&Recipient> {
        self.recipients.iter().find(|r| r.id == id)
    }

    pub fn add(&mut self, recipient: Recipient) {
        self.recipients.push(recipient);
    }

    /// Append parsed rows; rows without a usable name are skipped.
    pub fn import(&mut self, rows: impl IntoIterator<Item = RecipientRow>) -> ImportSummary {
        let mut summary = ImportSummary {
            imported: 0,
            skipped: 0,
        };

        for row in rows {
            let Some(recipient) = row.name.as_deref().and_then(|n| Recipient::new(n).ok()) else {
                summary.skipped += 1;
                continue;
            };
            self.recipients.push(Recipient {
                email: non_blank(row.email),
                description: non_blank(row.description),
                ..recipient
            });
            summary.imported += 1;
        }

        summary
    }

    /// Remove a recipient by id. Returns whether anything was removed.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.recipients.len();
        self.recipients.retain(|r| r.id != id);
        self.recipients.len() != before
    }

    pub fn clear(&mut self) {
        self.recipients.clear();
    }
}

impl From<Vec<Recipient>> for RecipientList {
    fn from(recipients: Vec<Recipient>) -> Self {
        Self { recipients }
    }
}

impl<'a> IntoIterator for &'a RecipientList {
    type Item = &'a Recipient;
    type IntoIter = std::slice::Iter<'a, Recipient>;

    fn into_iter(self) -> Self::IntoIter {
        self.recipients.iter()
    }
}
