//! Self-opening store variant, retained for API compatibility.

use crate::config::Config;
use crate::error::StoreResult;
use crate::handle::BucketHandle;
use crate::provision::Provisioner;
use originstore_engine::{Key, StorageEngine, Value};
use std::sync::Arc;

/// A bucket accessor that re-runs the full provisioning algorithm on
/// every operation instead of caching a connection.
///
/// This mirrors the original callers' surface: construct with a bucket
/// name, call CRUD methods, never close. Each call pays a complete
/// provisioning round-trip (database enumeration, probe open, main open),
/// and each call's connection is closed once the operation settles so it
/// cannot block later version bumps.
///
/// New code should use [`Provisioner::provision`] and hold the returned
/// [`BucketHandle`] instead.
#[deprecated(
    since = "0.2.0",
    note = "provision a BucketHandle once and reuse it; LegacyStore re-provisions on every call"
)]
pub struct LegacyStore {
    provisioner: Provisioner,
    bucket: String,
}

#[allow(deprecated)]
impl LegacyStore {
    /// Creates a store for `bucket_name` with the default configuration.
    pub fn new(engine: Arc<dyn StorageEngine>, bucket_name: impl Into<String>) -> Self {
        Self::with_config(engine, Config::default(), bucket_name)
    }

    /// Creates a store for `bucket_name` with a custom configuration.
    pub fn with_config(
        engine: Arc<dyn StorageEngine>,
        config: Config,
        bucket_name: impl Into<String>,
    ) -> Self {
        Self {
            provisioner: Provisioner::with_config(engine, config),
            bucket: bucket_name.into(),
        }
    }

    /// Name of the bucket this store targets.
    #[must_use]
    pub fn bucket_name(&self) -> &str {
        &self.bucket
    }

    async fn handle(&self) -> StoreResult<BucketHandle> {
        self.provisioner.provision(&self.bucket).await
    }

    /// Reads the value stored for `key`, or `None` if no record exists.
    pub async fn get_item(&self, key: &Key) -> StoreResult<Option<Value>> {
        let handle = self.handle().await?;
        let result = handle.get(key).await;
        handle.close();
        result
    }

    /// Upserts the `{key, value}` record.
    pub async fn set_item(&self, key: Key, value: Value) -> StoreResult<()> {
        let handle = self.handle().await?;
        let result = handle.set(key, value).await;
        handle.close();
        result
    }

    /// Deletes the record for `key`; removing an absent key succeeds.
    pub async fn remove_item(&self, key: &Key) -> StoreResult<()> {
        let handle = self.handle().await?;
        let result = handle.remove(key).await;
        handle.close();
        result
    }

    /// Deletes all records in the bucket.
    pub async fn clear(&self) -> StoreResult<()> {
        let handle = self.handle().await?;
        let result = handle.clear().await;
        handle.close();
        result
    }

    /// Counts the records currently in the bucket.
    pub async fn length(&self) -> StoreResult<u64> {
        let handle = self.handle().await?;
        let result = handle.count().await;
        handle.close();
        result
    }

    /// Returns the key at ordinal position `index` in engine-return order.
    pub async fn keys(&self, index: usize) -> StoreResult<Option<Key>> {
        let handle = self.handle().await?;
        let result = handle.key_at(index).await;
        handle.close();
        result
    }
}

#[cfg(test)]
#[allow(deprecated)]
mod tests {
    use super::*;
    use originstore_engine::MemoryEngine;

    fn store(bucket: &str) -> LegacyStore {
        LegacyStore::new(Arc::new(MemoryEngine::new()), bucket)
    }

    #[tokio::test]
    async fn set_get_remove_cycle() {
        let store = store("prefs");
        store
            .set_item(Key::from("theme"), Value::from("dark"))
            .await
            .unwrap();
        assert_eq!(
            store.get_item(&Key::from("theme")).await.unwrap(),
            Some(Value::from("dark"))
        );
        store.remove_item(&Key::from("theme")).await.unwrap();
        assert_eq!(store.get_item(&Key::from("theme")).await.unwrap(), None);
        assert_eq!(store.length().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn each_call_reprovisions() {
        // A second store for a different bucket on the same engine works
        // even between calls on the first: no connection is cached that
        // could block the second bucket's version bump.
        let engine: Arc<MemoryEngine> = Arc::new(MemoryEngine::new());
        let a = LegacyStore::new(engine.clone(), "a");
        let b = LegacyStore::new(engine.clone(), "b");

        a.set_item(Key::from("k"), Value::Integer(1)).await.unwrap();
        b.set_item(Key::from("k"), Value::Integer(2)).await.unwrap();
        assert_eq!(
            a.get_item(&Key::from("k")).await.unwrap(),
            Some(Value::Integer(1))
        );
    }

    #[tokio::test]
    async fn keys_enumeration() {
        let store = store("prefs");
        store.set_item(Key::from("b"), Value::Null).await.unwrap();
        store.set_item(Key::from("a"), Value::Null).await.unwrap();
        assert_eq!(store.keys(0).await.unwrap(), Some(Key::from("a")));
        assert_eq!(store.keys(5).await.unwrap(), None);
    }
}
