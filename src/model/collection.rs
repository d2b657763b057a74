//! Ordered element collection.
//!
//! Render order is list order: later elements are drawn on top.

use serde::{Deserialize, Serialize};

use super::element::TextElement;

/// The text elements of one template, in draw order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementList {
    elements: Vec<TextElement>,
}

impl ElementList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TextElement> {
        self.elements.iter()
    }

    pub fn as_slice(&self) -> &[TextElement] {
        &self.elements
    }

    pub fn get(&self, id: &str) -> Option<&TextElement> {
        self.elements.iter().find(|el| el.id == id)
    }

    /// Append an element on top of the others.
    pub fn push(&mut self, element: TextElement) {
        self.elements.push(element);
    }

    /// Swap in a new record for the element with the same id.
    ///
    /// Returns the previous record, or `None` if no element has that id
    /// (the list is left unchanged).
    pub fn replace(&mut self, element: TextElement) -> Option<TextElement> {
        let slot = self.elements.iter_mut().find(|el| el.id == element.id)?;
        Some(std::mem::replace(slot, element))
    }

    /// Remove an element by id.
    ///
    /// Returns the id that should be selected next (the first remaining
    /// element), or `None` when the list is now empty or nothing matched.
    pub fn remove(&mut self, id: &str) -> Option<String> {
        let before = self.elements.len();
        self.elements.retain(|el| el.id != id);
        if self.elements.len() == before {
            return None;
        }
        self.elements.first().map(|el| el.id.clone())
    }

    /// Bulk edit: replace every element with `f(element)`.
    pub fn apply_to_all(&mut self, f: impl Fn(TextElement) -> TextElement) {
        self.elements = std::mem::take(&mut self.elements).into_iter().map(f).collect();
    }
}

impl From<Vec<TextElement>> for ElementList {
    fn from(elements: Vec<TextElement>) -> Self {
        Self { elements }
    }
}

impl<'a> IntoIterator for &'a ElementList {
    type Item = &'a TextElement;
    type IntoIter = std::slice::Iter<'a, TextElement>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}
