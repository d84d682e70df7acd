//! # selina-store
//!
//! Persistent record store for Selina: one pretty-printed JSON array file per collection.

pub mod collection;
pub mod store;

pub use collection::Collection;
pub use store::{BotSlot, Store};
