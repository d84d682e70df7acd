//! A named collection of JSON records persisted as a single file.

use selina_core::error::SelinaError;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::debug;

/// CRUD over one JSON array file.
///
/// Queries are JSON objects; a record matches when every field named in the
/// query is present and equal. An empty query matches everything.
/// Read-modify-write cycles are serialized per collection within this process.
/// Other processes writing the same file are not coordinated with.
pub struct Collection {
    name: String,
    path: PathBuf,
    lock: Mutex<()>,
}

impl Collection {
    pub fn new(dir: &Path, name: &str) -> Self {
        Self {
            name: name.to_string(),
            path: dir.join(format!("{name}.json")),
            lock: Mutex::new(()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every record in file order.
    pub async fn all(&self) -> Result<Vec<Value>, SelinaError> {
        let _guard = self.lock.lock().await;
        self.read().await
    }

    pub async fn find(&self, query: &Value) -> Result<Vec<Value>, SelinaError> {
        let _guard = self.lock.lock().await;
        let records = self.read().await?;
        Ok(records.into_iter().filter(|r| matches(r, query)).collect())
    }

    pub async fn find_one(&self, query: &Value) -> Result<Option<Value>, SelinaError> {
        let _guard = self.lock.lock().await;
        let records = self.read().await?;
        Ok(records.into_iter().find(|r| matches(r, query)))
    }

    /// Append a record and return it.
    pub async fn insert(&self, record: Value) -> Result<Value, SelinaError> {
        let _guard = self.lock.lock().await;
        let mut records = self.read().await?;
        records.push(record.clone());
        self.write(&records).await?;
        Ok(record)
    }

    /// Shallow-merge `partial` into every matching record.
    ///
    /// Returns false without touching the file when nothing matched.
    pub async fn update(&self, query: &Value, partial: &Value) -> Result<bool, SelinaError> {
        let patch = partial
            .as_object()
            .ok_or_else(|| SelinaError::Validation("update payload must be an object".into()))?;

        let _guard = self.lock.lock().await;
        let mut records = self.read().await?;
        let mut updated = false;
        for record in records.iter_mut().filter(|r| matches(r, query)) {
            if let Some(obj) = record.as_object_mut() {
                for (k, v) in patch {
                    obj.insert(k.clone(), v.clone());
                }
                updated = true;
            }
        }
        if updated {
            self.write(&records).await?;
        }
        Ok(updated)
    }

    /// The first match for `query`, inserting `default` when there is none.
    ///
    /// The lookup and the insert happen under one lock, so concurrent callers
    /// agree on a single record. The flag is true when `default` was inserted.
    pub async fn find_or_insert(
        &self,
        query: &Value,
        default: Value,
    ) -> Result<(Value, bool), SelinaError> {
        let _guard = self.lock.lock().await;
        let mut records = self.read().await?;
        if let Some(existing) = records.iter().find(|r| matches(r, query)) {
            return Ok((existing.clone(), false));
        }
        records.push(default.clone());
        self.write(&records).await?;
        Ok((default, true))
    }

    /// Run `f` on the first record matching `query` and persist the result.
    ///
    /// Read, mutation and write share one lock. The file is only rewritten when
    /// `f` actually changed the record. `None` when nothing matched.
    pub async fn modify<R>(
        &self,
        query: &Value,
        f: impl FnOnce(&mut Value) -> R,
    ) -> Result<Option<R>, SelinaError> {
        let _guard = self.lock.lock().await;
        let mut records = self.read().await?;
        let Some(record) = records.iter_mut().find(|r| matches(r, query)) else {
            return Ok(None);
        };
        let before = record.clone();
        let out = f(record);
        if *record != before {
            self.write(&records).await?;
        }
        Ok(Some(out))
    }

    /// Remove every matching record and return what remains.
    pub async fn delete(&self, query: &Value) -> Result<Vec<Value>, SelinaError> {
        let _guard = self.lock.lock().await;
        let records = self.read().await?;
        let remaining: Vec<Value> = records.into_iter().filter(|r| !matches(r, query)).collect();
        self.write(&remaining).await?;
        Ok(remaining)
    }

    async fn read(&self) -> Result<Vec<Value>, SelinaError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(SelinaError::Store(format!(
                    "failed to read {}: {e}",
                    self.path.display()
                )))
            }
        };
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&content).map_err(|e| {
            SelinaError::Store(format!("corrupt collection {}: {e}", self.path.display()))
        })
    }

    async fn write(&self, records: &[Value]) -> Result<(), SelinaError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| SelinaError::Store(format!("failed to create data dir: {e}")))?;
        }
        let json = serde_json::to_string_pretty(records)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| SelinaError::Store(format!("failed to write {}: {e}", tmp.display())))?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(|e| {
            SelinaError::Store(format!("failed to replace {}: {e}", self.path.display()))
        })?;
        debug!("{}: wrote {} records", self.name, records.len());
        Ok(())
    }
}

/// Field-wise equality against a query object.
fn matches(record: &Value, query: &Value) -> bool {
    let Some(query) = query.as_object() else {
        return false;
    };
    let empty = Map::new();
    let record = record.as_object().unwrap_or(&empty);
    query.iter().all(|(k, v)| record.get(k) == Some(v))
}
