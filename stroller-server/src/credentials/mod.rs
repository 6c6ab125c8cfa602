//! Transitland credential management.
//!
//! [`CredentialStore`] owns the API key: it loads it once at construction
//! (persisted storage first, then a build-time key), persists updates, and
//! builds the headers and URLs for credentialed requests. The placeholder
//! sentinel [`PLACEHOLDER_KEY`] is never treated as a working key.

pub mod dev_env;
mod endpoints;
mod error;
mod storage;
mod store;

pub use endpoints::{DEFAULT_BASE_URL, TransitlandEndpoints};
pub use error::{CredentialError, StorageError};
pub use storage::{CREDENTIAL_KEY, CredentialStorage, FileStorage, MemoryStorage};
pub use store::{CredentialState, CredentialStore, PLACEHOLDER_KEY};
