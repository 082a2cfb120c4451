//! In-memory storage backend for the Carelink service.
//!
//! This crate implements both `ClinicStorage` from `carelink-storage` and
//! `CredentialStore` from `carelink-auth` over a single set of tables behind
//! one `tokio::sync::RwLock`. Every constraint check runs under the same
//! write guard as the write it protects, so check-then-insert is atomic.
//!
//! # Example
//!
//! ```ignore
//! use carelink_db_memory::InMemoryStorage;
//! use carelink_storage::ClinicStorage;
//!
//! let storage = InMemoryStorage::shared();
//! let doctors = storage.list_doctors().await?;
//! ```

mod clinic;
mod credentials;
pub mod storage;

pub use storage::InMemoryStorage;

/// Creates a new shareable in-memory storage.
pub fn create_storage() -> std::sync::Arc<InMemoryStorage> {
    InMemoryStorage::shared()
}
