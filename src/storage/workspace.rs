//! Typed repository over a [`Store`].
//!
//! | Key | Value |
//! |-----|-------|
//! | `currentTemplate` | [`ImageSource`] of the template being edited |
//! | `textElements` | [`ElementList`] of the current template |
//! | `templates` | `Vec<`[`SavedTemplate`]`>` |
//! | `recipients` | [`RecipientList`] |
//! | `uploadedFonts` | storage keys of every `font.*` entry |
//! | `font.<family>.<weight>` | [`FontUpload`] |
//! | `mailSettings` | [`MailSettings`] |
//!
//! Every read-modify-write of a list (recipients, saved templates, the font
//! index) runs under one edit lock shared by all clones of a [`Workspace`],
//! so concurrent callers never lose each other's updates.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::{Arc, Mutex};

use super::Store;
use crate::error::CertigenError;
use crate::fonts::FontUpload;
use crate::image_source::ImageSource;
use crate::mail::MailSettings;
use crate::model::{ElementList, Recipient, RecipientList, SavedTemplate, Template};

pub mod keys {
    pub const CURRENT_TEMPLATE: &str = "currentTemplate";
    pub const TEXT_ELEMENTS: &str = "textElements";
    pub const SAVED_TEMPLATES: &str = "templates";
    pub const RECIPIENTS: &str = "recipients";
    pub const UPLOADED_FONTS: &str = "uploadedFonts";
    pub const MAIL_SETTINGS: &str = "mailSettings";
    pub const FONT_PREFIX: &str = "font.";
}

fn font_key(upload: &FontUpload) -> String {
    let safe = |s: &str| -> String {
        s.chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect()
    };
    format!(
        "{}{}.{}",
        keys::FONT_PREFIX,
        safe(&upload.family),
        safe(upload.weight.as_str())
    )
}

#[derive(Clone)]
pub struct Workspace {
    store: Arc<dyn Store>,
    edits: Arc<Mutex<()>>,
}

impl Workspace {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            edits: Arc::new(Mutex::new(())),
        }
    }

    fn edit<T>(&self, f: impl FnOnce() -> Result<T, CertigenError>) -> Result<T, CertigenError> {
        let _guard = self
            .edits
            .lock()
            .map_err(|_| CertigenError::Storage("workspace edit lock poisoned".to_string()))?;
        f()
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CertigenError> {
        match self.store.get(key)? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    fn write<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), CertigenError> {
        self.store.set(key, &serde_json::to_string(value)?)
    }

    // ========================================================================
    // Current template
    // ========================================================================

    pub fn current_image(&self) -> Result<Option<ImageSource>, CertigenError> {
        self.read(keys::CURRENT_TEMPLATE)
    }

    pub fn set_current_image(&self, image: &ImageSource) -> Result<(), CertigenError> {
        self.write(keys::CURRENT_TEMPLATE, image)
    }

    pub fn elements(&self) -> Result<ElementList, CertigenError> {
        Ok(self.read(keys::TEXT_ELEMENTS)?.unwrap_or_default())
    }

    pub fn set_elements(&self, elements: &ElementList) -> Result<(), CertigenError> {
        self.write(keys::TEXT_ELEMENTS, elements)
    }

    /// The template being edited, if an image has been chosen.
    pub fn current_template(&self) -> Result<Option<Template>, CertigenError> {
        let Some(image) = self.current_image()? else {
            return Ok(None);
        };
        Ok(Some(Template::new(image).with_elements(self.elements()?)))
    }

    pub fn set_current_template(&self, template: &Template) -> Result<(), CertigenError> {
        self.set_current_image(&template.image)?;
        self.set_elements(&template.elements)
    }

    // ========================================================================
    // Saved templates
    // ========================================================================

    pub fn saved_templates(&self) -> Result<Vec<SavedTemplate>, CertigenError> {
        Ok(self.read(keys::SAVED_TEMPLATES)?.unwrap_or_default())
    }

    /// Snapshot the current template under `name`.
    pub fn save_current(&self, name: &str) -> Result<SavedTemplate, CertigenError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CertigenError::InvalidInput("template name cannot be empty".to_string()));
        }
        let template = self.current_template()?.ok_or_else(|| {
            CertigenError::InvalidInput("no current template to save".to_string())
        })?;

        let saved = SavedTemplate::snapshot(name, &template);
        self.edit(|| {
            let mut all = self.saved_templates()?;
            all.push(saved.clone());
            self.write(keys::SAVED_TEMPLATES, &all)
        })?;
        tracing::info!(id = %saved.id, name = %saved.name, "template saved");
        Ok(saved)
    }

    /// Make a saved template the current one. `None` if `id` is unknown.
    pub fn open_saved(&self, id: &str) -> Result<Option<Template>, CertigenError> {
        self.edit(|| {
            let Some(saved) = self.saved_templates()?.into_iter().find(|t| t.id == id) else {
                return Ok(None);
            };
            self.set_current_template(&saved.template)?;
            tracing::info!(id, name = %saved.name, "saved template opened");
            Ok(Some(saved.template))
        })
    }

    pub fn delete_saved(&self, id: &str) -> Result<bool, CertigenError> {
        self.edit(|| {
            let mut all = self.saved_templates()?;
            let before = all.len();
            all.retain(|t| t.id != id);
            if all.len() == before {
                return Ok(false);
            }
            self.write(keys::SAVED_TEMPLATES, &all)?;
            Ok(true)
        })
    }

    // ========================================================================
    // Recipients
    // ========================================================================

    pub fn recipients(&self) -> Result<RecipientList, CertigenError> {
        Ok(self.read(keys::RECIPIENTS)?.unwrap_or_default())
    }

    pub fn set_recipients(&self, recipients: &RecipientList) -> Result<(), CertigenError> {
        self.edit(|| self.write(keys::RECIPIENTS, recipients))
    }

    /// Append one recipient to the stored list.
    pub fn add_recipient(&self, recipient: Recipient) -> Result<(), CertigenError> {
        self.edit(|| {
            let mut list = self.recipients()?;
            list.add(recipient);
            self.write(keys::RECIPIENTS, &list)
        })
    }

    /// Remove a recipient by id. `false` if no such recipient is stored.
    pub fn remove_recipient(&self, id: &str) -> Result<bool, CertigenError> {
        self.edit(|| {
            let mut list = self.recipients()?;
            if !list.remove(id) {
                return Ok(false);
            }
            self.write(keys::RECIPIENTS, &list)?;
            Ok(true)
        })
    }

    // ========================================================================
    // Fonts
    // ========================================================================

    /// Persist an uploaded font, replacing any earlier upload of the same
    /// family and weight.
    pub fn add_font_upload(&self, upload: &FontUpload) -> Result<(), CertigenError> {
        let key = font_key(upload);
        self.edit(|| {
            self.write(&key, upload)?;

            let mut index: Vec<String> = self.read(keys::UPLOADED_FONTS)?.unwrap_or_default();
            if !index.contains(&key) {
                index.push(key.clone());
                self.write(keys::UPLOADED_FONTS, &index)?;
            }
            Ok(())
        })
    }

    /// Every persisted upload. Entries that fail to load are logged and
    /// skipped.
    pub fn font_uploads(&self) -> Result<Vec<FontUpload>, CertigenError> {
        let index: Vec<String> = self.read(keys::UPLOADED_FONTS)?.unwrap_or_default();
        let mut uploads = Vec::with_capacity(index.len());
        for key in index {
            match self.read::<FontUpload>(&key) {
                Ok(Some(upload)) => uploads.push(upload),
                Ok(None) => tracing::warn!(key = %key, "indexed font is missing"),
                Err(e) => tracing::warn!(key = %key, "skipping unreadable font: {}", e),
            }
        }
        Ok(uploads)
    }

    // ========================================================================
    // Mail
    // ========================================================================

    pub fn mail_settings(&self) -> Result<Option<MailSettings>, CertigenError> {
        self.read(keys::MAIL_SETTINGS)
    }

    pub fn set_mail_settings(&self, settings: &MailSettings) -> Result<(), CertigenError> {
        self.write(keys::MAIL_SETTINGS, settings)
    }
}
