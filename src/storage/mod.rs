//! # Storage
//!
//! A small key-value adapter and the typed repository built on it.
//!
//! ```text
//! Workspace (typed: templates, elements, recipients, fonts, mail)
//!     │  JSON strings
//!     ▼
//! dyn Store ──┬── MemoryStore  (tests, ephemeral sessions)
//!             └── FileStore    (<dir>/<key>.json)
//! ```
//!
//! The compositor never touches storage; callers load what they need and
//! pass plain values in.

mod file;
mod memory;
mod workspace;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use workspace::{Workspace, keys};

use crate::error::CertigenError;

/// String key-value storage.
pub trait Store: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, CertigenError>;

    fn set(&self, key: &str, value: &str) -> Result<(), CertigenError>;

    /// All keys, sorted.
    fn list(&self) -> Result<Vec<String>, CertigenError>;

    /// Remove a key. Returns whether it existed.
    fn delete(&self, key: &str) -> Result<bool, CertigenError>;
}
