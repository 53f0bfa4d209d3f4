//! Bucket handle CRUD surface.

use crate::error::{StoreError, StoreResult};
use originstore_engine::{BucketTransaction, Connection, Key, TransactionMode, Value};
use std::sync::Arc;
use tracing::trace;

/// A typed accessor bound to one open connection and one bucket.
///
/// Every operation opens and discards its own short-lived transaction;
/// there is no batching or transaction reuse across calls. Operations on
/// different handles, or successive operations on the same handle, have
/// no ordering guarantee relative to each other beyond what the engine's
/// transaction isolation provides.
///
/// Transaction-level faults (aborts, constraint violations) reject the
/// same call that observed them as [`StoreError::Transaction`];
/// request-level faults as [`StoreError::Request`].
pub struct BucketHandle {
    connection: Arc<dyn Connection>,
    bucket: String,
}

impl BucketHandle {
    pub(crate) fn new(connection: Arc<dyn Connection>, bucket: String) -> Self {
        Self { connection, bucket }
    }

    /// Name of the bucket this handle is bound to.
    #[must_use]
    pub fn bucket_name(&self) -> &str {
        &self.bucket
    }

    /// The underlying connection.
    #[must_use]
    pub fn connection(&self) -> &Arc<dyn Connection> {
        &self.connection
    }

    async fn begin(&self, mode: TransactionMode) -> StoreResult<Box<dyn BucketTransaction>> {
        self.connection
            .transaction(&self.bucket, mode)
            .await
            .map_err(StoreError::transaction)
    }

    /// Reads the value stored for `key`, or `None` if no record exists.
    pub async fn get(&self, key: &Key) -> StoreResult<Option<Value>> {
        trace!(bucket = %self.bucket, "get");
        let mut txn = self.begin(TransactionMode::ReadOnly).await?;
        let value = txn.get(key).await.map_err(StoreError::request)?;
        txn.commit().await.map_err(StoreError::transaction)?;
        Ok(value)
    }

    /// Upserts the `{key, value}` record.
    pub async fn set(&self, key: Key, value: Value) -> StoreResult<()> {
        trace!(bucket = %self.bucket, "set");
        let mut txn = self.begin(TransactionMode::ReadWrite).await?;
        txn.put(key, value).await.map_err(StoreError::request)?;
        txn.commit().await.map_err(StoreError::transaction)
    }

    /// Deletes the record for `key`; removing an absent key succeeds.
    pub async fn remove(&self, key: &Key) -> StoreResult<()> {
        trace!(bucket = %self.bucket, "remove");
        let mut txn = self.begin(TransactionMode::ReadWrite).await?;
        txn.delete(key).await.map_err(StoreError::request)?;
        txn.commit().await.map_err(StoreError::transaction)
    }

    /// Deletes all records in the bucket.
    pub async fn clear(&self) -> StoreResult<()> {
        trace!(bucket = %self.bucket, "clear");
        let mut txn = self.begin(TransactionMode::ReadWrite).await?;
        txn.clear().await.map_err(StoreError::request)?;
        txn.commit().await.map_err(StoreError::transaction)
    }

    /// Counts the records currently in the bucket.
    pub async fn count(&self) -> StoreResult<u64> {
        trace!(bucket = %self.bucket, "count");
        let mut txn = self.begin(TransactionMode::ReadOnly).await?;
        let count = txn.count().await.map_err(StoreError::request)?;
        txn.commit().await.map_err(StoreError::transaction)?;
        Ok(count)
    }

    /// Returns the key at ordinal position `index` in engine-return order,
    /// or `None` when out of range.
    ///
    /// This fetches every record in the bucket and is O(bucket size) per
    /// call; it exists for enumeration compatibility, not efficiency. The
    /// order is engine-defined, not insertion order.
    pub async fn key_at(&self, index: usize) -> StoreResult<Option<Key>> {
        trace!(bucket = %self.bucket, index, "key_at");
        let mut txn = self.begin(TransactionMode::ReadOnly).await?;
        let records = txn.get_all().await.map_err(StoreError::request)?;
        txn.commit().await.map_err(StoreError::transaction)?;
        Ok(records.into_iter().nth(index).map(|(key, _)| key))
    }

    /// Closes the underlying connection.
    ///
    /// Closing is fire-and-forget. The handle must not be used afterwards:
    /// the engine fails transactions against a closed connection.
    pub fn close(&self) {
        self.connection.close();
    }
}

impl std::fmt::Debug for BucketHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BucketHandle")
            .field("bucket", &self.bucket)
            .field("database", &self.connection.name())
            .field("closed", &self.connection.is_closed())
            .finish()
    }
}
