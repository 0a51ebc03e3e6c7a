//! Core types and operations for the Dossier investigation tracker.
//!
//! This crate is deliberately free of file-system and CLI dependencies.
//! It owns the data model, the repository that enforces its invariants,
//! the derived views, and the JSON/CSV transcoder. Concrete persistence
//! backends (e.g. `dossier-store-json`) implement [`slot::StorageSlot`].

pub mod error;
pub mod model;
pub mod repo;
pub mod slot;
pub mod transcode;
pub mod view;

pub use error::{Error, Result};

#[cfg(test)]
mod tests;
