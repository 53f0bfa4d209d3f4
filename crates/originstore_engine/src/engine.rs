//! Engine capability contract.
//!
//! The traits here describe what the facade needs from an embedded,
//! versioned, document-oriented key-value engine: database enumeration,
//! open-with-version (which may deliver a one-time upgrade hook), and
//! per-bucket transactions with read-only/read-write modes. The in-memory
//! reference implementation lives in [`crate::MemoryEngine`]; a host
//! binding (e.g. a browser's IndexedDB) would implement the same traits.

use crate::error::EngineResult;
use crate::value::{Key, Value};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// A database schema version.
///
/// Versions are monotonically increasing positive integers. A database
/// that does not yet exist has stored version 0; the first successful open
/// establishes it at the requested version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Version(pub u64);

impl Version {
    /// Creates a new version.
    #[must_use]
    pub const fn new(version: u64) -> Self {
        Self(version)
    }

    /// Returns the raw version value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Returns the next version.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Name and stored version of an existing database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseInfo {
    /// Database name.
    pub name: String,
    /// Current stored version.
    pub version: Version,
}

/// Transaction access mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionMode {
    /// Reads only; write requests fail.
    ReadOnly,
    /// Reads and writes.
    ReadWrite,
}

/// Schema editor handed to an upgrade hook.
///
/// This is the only place bucket creation is permitted. The editor is
/// valid for the duration of the hook invocation and no longer.
pub trait SchemaEditor {
    /// Creates a bucket with the given primary-key field name.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EngineError::BucketExists`] if a bucket with this
    /// name already exists.
    fn create_bucket(&mut self, name: &str, key_field: &str) -> EngineResult<()>;

    /// Names of the buckets that currently exist.
    fn bucket_names(&self) -> Vec<String>;

    /// The stored version the upgrade is transitioning from.
    fn old_version(&self) -> Version;

    /// The version the upgrade is transitioning to.
    fn new_version(&self) -> Version;
}

/// One-shot hook invoked while an open upgrades the database.
///
/// The engine calls the hook exactly once, synchronously within the open,
/// before the open resolves. If the hook fails, the upgrade is rolled back
/// and the open fails.
pub type UpgradeHook = Box<dyn FnOnce(&mut dyn SchemaEditor) -> EngineResult<()> + Send>;

/// A versioned, schema-on-demand storage engine.
///
/// # Invariants
///
/// - `open` at a version below the stored version fails.
/// - `open` at a version above the stored version runs the upgrade hook
///   exactly once before resolving, and does not start the upgrade while
///   any other connection to the same database is live.
/// - Each request settles exactly once: success or error, no further
///   events.
#[async_trait]
pub trait StorageEngine: Send + Sync {
    /// Enumerates existing databases with their stored versions.
    async fn list_databases(&self) -> EngineResult<Vec<DatabaseInfo>>;

    /// Opens a connection to `name` at `version`.
    ///
    /// When `version` exceeds the stored version, `on_upgrade` (if any) is
    /// invoked once to perform schema changes; an open without a hook still
    /// performs the version transition.
    ///
    /// # Errors
    ///
    /// Fails if `version` is below the stored version, or if the upgrade
    /// hook fails.
    async fn open(
        &self,
        name: &str,
        version: Version,
        on_upgrade: Option<UpgradeHook>,
    ) -> EngineResult<Arc<dyn Connection>>;
}

/// A live session against a database at a specific version.
///
/// Connections are the only way to start transactions. A connection left
/// open does not reserve exclusivity, but it does block version-bump opens
/// of the same database until closed.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Database name this connection is bound to.
    fn name(&self) -> &str;

    /// Version the connection was opened at.
    fn version(&self) -> Version;

    /// Names of the buckets visible to this connection.
    fn bucket_names(&self) -> Vec<String>;

    /// Primary-key field declared by `bucket`, or `None` if the bucket
    /// does not exist.
    fn key_field(&self, bucket: &str) -> Option<String>;

    /// Starts a transaction scoped to one bucket.
    ///
    /// # Errors
    ///
    /// Fails if the bucket does not exist or the connection is closed.
    async fn transaction(
        &self,
        bucket: &str,
        mode: TransactionMode,
    ) -> EngineResult<Box<dyn BucketTransaction>>;

    /// Closes the connection.
    ///
    /// Closing is idempotent and fire-and-forget; pending and future
    /// transactions against the connection fail.
    fn close(&self);

    /// Whether the connection has been closed.
    fn is_closed(&self) -> bool;
}

/// A bounded-lifetime operation scope over one bucket.
///
/// Requests complete in issuance order. The transaction commits only via
/// [`BucketTransaction::commit`]; dropping an uncommitted transaction
/// aborts it and discards its writes. After the first failed request the
/// transaction is aborted and every subsequent request fails.
#[async_trait]
pub trait BucketTransaction: Send {
    /// Reads the value stored for `key`.
    async fn get(&mut self, key: &Key) -> EngineResult<Option<Value>>;

    /// Upserts a `{key, value}` record.
    async fn put(&mut self, key: Key, value: Value) -> EngineResult<()>;

    /// Deletes the record for `key`; deleting an absent key succeeds.
    async fn delete(&mut self, key: &Key) -> EngineResult<()>;

    /// Deletes all records in the bucket.
    async fn clear(&mut self) -> EngineResult<()>;

    /// Counts the records in the bucket.
    async fn count(&mut self) -> EngineResult<u64>;

    /// Fetches all records in engine-defined key order.
    async fn get_all(&mut self) -> EngineResult<Vec<(Key, Value)>>;

    /// Commits the transaction, making its writes visible.
    async fn commit(self: Box<Self>) -> EngineResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_next_increments() {
        assert_eq!(Version::new(3).next(), Version::new(4));
    }

    #[test]
    fn version_display() {
        assert_eq!(format!("{}", Version::new(7)), "v7");
    }

    #[test]
    fn version_ordering() {
        assert!(Version::new(1) < Version::new(2));
    }
}
