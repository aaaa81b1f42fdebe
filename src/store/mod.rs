//! Key-value persistence
//!
//! The companion core treats durable state as an opaque get/set store;
//! schema versioning and durability guarantees live below this boundary.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::Result;

/// An opaque key-value store
///
/// Values are stored as strings; callers serialize through serde at the
/// typed layer (see [`crate::journal::Journal`]).
pub trait Store: Send + Sync {
    /// Fetch the raw value for a key, if present
    ///
    /// # Errors
    ///
    /// Returns error if the underlying store fails
    fn get_raw(&self, key: &str) -> Result<Option<String>>;

    /// Write the raw value for a key, replacing any prior value
    ///
    /// # Errors
    ///
    /// Returns error if the underlying store fails
    fn put_raw(&self, key: &str, value: &str) -> Result<()>;
}
