//! JSON file backend for the Dossier storage slot.
//!
//! The whole database lives in one pretty-printed JSON file. Saves go
//! through a write-to-temp-then-rename sequence so a crash mid-save never
//! leaves a truncated slot behind.

mod atomic;
mod slot;

pub mod error;

pub use error::{Error, Result};
pub use slot::JsonFileSlot;
