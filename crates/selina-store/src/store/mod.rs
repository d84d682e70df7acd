//! Typed facade over the four collections.
//!
//! Split into focused submodules:
//! - `users`: accounts and bot counters
//! - `bots`: bot records and lifecycle fields
//! - `settings`: per-bot settings, created lazily with defaults
//! - `broadcasts`: append-only admin broadcast log

mod bots;
mod broadcasts;
mod settings;
mod users;

pub use users::BotSlot;

#[cfg(test)]
mod tests;

use crate::collection::Collection;
use selina_core::error::SelinaError;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Persistent record store backed by JSON files under one directory.
#[derive(Clone)]
pub struct Store {
    inner: Arc<Collections>,
}

struct Collections {
    users: Collection,
    bots: Collection,
    settings: Collection,
    broadcasts: Collection,
}

impl Store {
    /// Open (and create if needed) the data directory.
    pub async fn new(dir: &Path) -> Result<Self, SelinaError> {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| SelinaError::Store(format!("failed to create data dir: {e}")))?;

        info!("Record store initialized at {}", dir.display());

        Ok(Self {
            inner: Arc::new(Collections {
                users: Collection::new(dir, "users"),
                bots: Collection::new(dir, "bots"),
                settings: Collection::new(dir, "settings"),
                broadcasts: Collection::new(dir, "broadcasts"),
            }),
        })
    }
}

fn encode<T: Serialize>(record: &T) -> Result<Value, SelinaError> {
    Ok(serde_json::to_value(record)?)
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, SelinaError> {
    serde_json::from_value(value).map_err(|e| SelinaError::Store(format!("malformed record: {e}")))
}

fn decode_all<T: DeserializeOwned>(values: Vec<Value>) -> Result<Vec<T>, SelinaError> {
    values.into_iter().map(decode).collect()
}
