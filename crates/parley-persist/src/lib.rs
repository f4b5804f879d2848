//! # parley-persist
//!
//! Persistence for the only Parley state that outlives a negotiation session:
//! the per-counterpart concession history.
//!
//! - [`HistoryStore`] - keyed load/store/append of [`parley_core::ConcessionRecord`] lists
//! - [`FileHistoryStore`] - one atomically replaced JSON file per counterpart
//! - [`MemoryHistoryStore`] - in-process store for tests and embedding hosts
//! - [`JsonStore`] - the underlying JSON snapshot file

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod history;
pub mod json_store;

pub use error::{PersistError, Result};
pub use history::{sanitize_key, FileHistoryStore, HistoryStore, MemoryHistoryStore};
pub use json_store::JsonStore;
