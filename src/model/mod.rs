//! # Data Model
//!
//! Plain serde records shared by the compositor, the editor and storage.
//!
//! | Type | Role |
//! |------|------|
//! | [`TextElement`] | One positioned, styled text field |
//! | [`ElementList`] | Elements of a template, in draw order |
//! | [`Recipient`] / [`RecipientList`] | Who gets a certificate |
//! | [`Template`] / [`SavedTemplate`] | Background + elements, and named snapshots |
//!
//! JSON field names match the browser-era storage format (camelCase), so
//! previously saved data loads as-is.

mod collection;
mod element;
mod recipient;
mod template;

pub use collection::ElementList;
pub use element::{
    DEFAULT_FONT_COLOR, DEFAULT_FONT_FAMILY, DEFAULT_FONT_SIZE, FontWeight, LINE_HEIGHT_FACTOR,
    NAME_TOKEN, TextAlign, TextElement, clamp_percent, substitute_name,
};
pub use recipient::{ImportSummary, Recipient, RecipientList, RecipientRow};
pub use template::{SavedTemplate, Template};
