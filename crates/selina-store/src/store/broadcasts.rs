//! Admin broadcast log.

use super::{decode, decode_all, encode, Store};
use selina_core::{error::SelinaError, models::BroadcastEntry};

impl Store {
    pub async fn insert_broadcast(
        &self,
        entry: &BroadcastEntry,
    ) -> Result<BroadcastEntry, SelinaError> {
        let value = self.inner.broadcasts.insert(encode(entry)?).await?;
        decode(value)
    }

    pub async fn list_broadcasts(&self) -> Result<Vec<BroadcastEntry>, SelinaError> {
        decode_all(self.inner.broadcasts.all().await?)
    }
}
