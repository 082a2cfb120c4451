//! Storage traits for identity data.
//!
//! Implementations are provided by storage backends (in-memory, PostgreSQL).

pub mod principal;

pub use principal::{CredentialStore, NewPrincipal, Principal};
