//! # selina-core
//!
//! Core types, traits, configuration, and error handling shared by every Selina crate.

pub mod config;
pub mod error;
pub mod message;
pub mod models;
pub mod traits;

pub use config::shellexpand;
