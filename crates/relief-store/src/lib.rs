//! Durable key-value persistence for ReliefProof chains.
//!
//! Every chain is persisted as a single string value under a fixed key. The
//! ledger never interprets how a backend stores that value; it only relies on
//! the [`KeyValueStore`] contract.
//!
//! # Backends
//!
//! - [`InMemoryStore`] -- `HashMap`-based store for tests and embedding, with
//!   an optional byte quota and a read-only switch to exercise failure paths
//! - [`FileStore`] -- one file per key, written via temp file + rename

pub mod error;
pub mod file;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use file::FileStore;
pub use memory::InMemoryStore;
pub use traits::{validate_key, KeyValueStore};
