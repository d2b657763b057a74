//! Templates: a background image plus its text elements.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::collection::ElementList;
use crate::image_source::ImageSource;

/// A background image reference and the elements drawn over it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub image: ImageSource,
    #[serde(default)]
    pub elements: ElementList,
}

impl Template {
    pub fn new(image: ImageSource) -> Self {
        Self {
            image,
            elements: ElementList::new(),
        }
    }

    pub fn with_elements(self, elements: impl Into<ElementList>) -> Self {
        Self {
            elements: elements.into(),
            ..self
        }
    }
}

/// A named snapshot of a template, usable as the start of a new session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedTemplate {
    pub id: String,
    pub name: String,
    pub saved_at: DateTime<Utc>,
    pub template: Template,
}

impl SavedTemplate {
    pub fn snapshot(name: impl Into<String>, template: &Template) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            saved_at: Utc::now(),
            template: template.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TextElement;

    #[test]
    fn test_snapshot_is_independent() {
        let mut template = Template::new(ImageSource::Path("cert.png".into()))
            .with_elements(vec![TextElement::new("{name}").with_id("a")]);
        let saved = SavedTemplate::snapshot("Course", &template);

        template.elements.push(TextElement::new("extra"));
        assert_eq!(saved.template.elements.len(), 1);
        assert_eq!(saved.name, "Course");
    }

    #[test]
    fn test_json_round_trip() {
        let template = Template::new(ImageSource::Url("https://example.com/t.png".into()));
        let saved = SavedTemplate::snapshot("Web", &template);
        let json = serde_json::to_string(&saved).unwrap();
        assert!(json.contains("savedAt"));
        let back: SavedTemplate = serde_json::from_str(&json).unwrap();
        assert_eq!(back, saved);
    }
}
