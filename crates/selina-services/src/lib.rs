//! # selina-services
//!
//! Adapters for the third-party HTTP APIs behind Selina's chat commands.
//! Every call carries its own timeout and fails with `SelinaError::Service`.

pub mod ai;
pub mod downloader;
pub mod fun;
mod http;
pub mod media;
pub mod search;

pub use ai::{AiChain, ChatBackend, AI_FALLBACK_REPLY};
pub use http::Services;
