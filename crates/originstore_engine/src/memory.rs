//! In-memory reference engine.
//!
//! `MemoryEngine` implements the full capability contract without any host
//! dependency: versioned databases, one-shot upgrade hooks, and buffered
//! per-bucket transactions. It is suitable for unit tests and for
//! ephemeral storage that does not need persistence.
//!
//! The engine reproduces the open semantics the facade's provisioning
//! algorithm depends on:
//!
//! - a database that does not exist has stored version 0, and the first
//!   open establishes it at the requested version (running the upgrade
//!   hook for the 0 → v transition);
//! - an open requesting a version above the stored version waits until
//!   every other live connection to that database has closed, then runs
//!   the upgrade hook before resolving;
//! - an open requesting a version below the stored version fails.

use crate::engine::{
    BucketTransaction, Connection, DatabaseInfo, SchemaEditor, StorageEngine, TransactionMode,
    UpgradeHook, Version,
};
use crate::error::{EngineError, EngineResult};
use crate::value::{Key, Value};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::{debug, trace};

/// Per-bucket state: declared key field plus the record map.
///
/// Records live in a `BTreeMap` so `get_all` enumerates keys in the
/// engine-defined order ([`Key`]'s total ordering).
#[derive(Debug, Clone)]
struct BucketState {
    key_field: String,
    records: BTreeMap<Key, Value>,
}

#[derive(Debug, Clone)]
struct DatabaseState {
    version: Version,
    buckets: HashMap<String, BucketState>,
}

/// Shared state for one named database.
struct DatabaseSlot {
    name: String,
    state: RwLock<DatabaseState>,
    /// Number of live connections. Guards version-bump opens.
    live: Mutex<usize>,
    /// Signalled whenever a connection closes.
    closed: Notify,
}

/// An in-memory storage engine.
///
/// Cloning is not provided; share the engine behind an `Arc` the same way
/// a host engine handle would be shared.
#[derive(Default)]
pub struct MemoryEngine {
    databases: Mutex<HashMap<String, Arc<DatabaseSlot>>>,
}

impl MemoryEngine {
    /// Creates a new engine with no databases.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the slot for `name`, creating an empty one (stored version
    /// 0, i.e. "does not exist yet") if absent.
    fn slot(&self, name: &str) -> Arc<DatabaseSlot> {
        let mut databases = self.databases.lock();
        Arc::clone(databases.entry(name.to_string()).or_insert_with(|| {
            Arc::new(DatabaseSlot {
                name: name.to_string(),
                state: RwLock::new(DatabaseState {
                    version: Version::new(0),
                    buckets: HashMap::new(),
                }),
                live: Mutex::new(0),
                closed: Notify::new(),
            })
        }))
    }
}

impl std::fmt::Debug for MemoryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryEngine")
            .field("databases", &self.databases.lock().len())
            .finish()
    }
}

#[async_trait]
impl StorageEngine for MemoryEngine {
    async fn list_databases(&self) -> EngineResult<Vec<DatabaseInfo>> {
        let databases = self.databases.lock();
        let mut infos: Vec<DatabaseInfo> = databases
            .values()
            .filter_map(|slot| {
                let state = slot.state.read();
                // Version 0 means the database was never established.
                (state.version.as_u64() > 0).then(|| DatabaseInfo {
                    name: slot.name.clone(),
                    version: state.version,
                })
            })
            .collect();
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(infos)
    }

    async fn open(
        &self,
        name: &str,
        version: Version,
        on_upgrade: Option<UpgradeHook>,
    ) -> EngineResult<Arc<dyn Connection>> {
        if version.as_u64() == 0 {
            return Err(EngineError::VersionMismatch {
                requested: version,
                stored: Version::new(0),
            });
        }

        let slot = self.slot(name);
        let mut on_upgrade = on_upgrade;

        loop {
            // Arm the wakeup before inspecting the live count so a close
            // between the check and the await cannot be missed.
            let closed = slot.closed.notified();

            {
                let mut live = slot.live.lock();
                let mut state = slot.state.write();

                if version < state.version {
                    debug!(database = name, %version, stored = %state.version, "open rejected");
                    return Err(EngineError::VersionMismatch {
                        requested: version,
                        stored: state.version,
                    });
                }

                if version == state.version {
                    *live += 1;
                    trace!(database = name, %version, "open");
                    return Ok(connect(&slot, version));
                }

                // Version bump: only with exclusive access.
                if *live == 0 {
                    let old_version = state.version;
                    if let Some(hook) = on_upgrade.take() {
                        let snapshot = state.clone();
                        let mut editor = MemoryEditor {
                            state: &mut state,
                            old_version,
                            new_version: version,
                        };
                        if let Err(err) = hook(&mut editor) {
                            *state = snapshot;
                            debug!(database = name, %version, error = %err, "upgrade failed");
                            return Err(EngineError::upgrade_failed(err.to_string()));
                        }
                    }
                    state.version = version;
                    *live += 1;
                    debug!(database = name, from = %old_version, to = %version, "upgraded");
                    return Ok(connect(&slot, version));
                }

                trace!(database = name, %version, live = *live, "open blocked on live connections");
            }

            closed.await;
        }
    }
}

fn connect(slot: &Arc<DatabaseSlot>, version: Version) -> Arc<dyn Connection> {
    Arc::new(MemoryConnection {
        slot: Arc::clone(slot),
        version,
        closed: AtomicBool::new(false),
    })
}

struct MemoryEditor<'a> {
    state: &'a mut DatabaseState,
    old_version: Version,
    new_version: Version,
}

impl SchemaEditor for MemoryEditor<'_> {
    fn create_bucket(&mut self, name: &str, key_field: &str) -> EngineResult<()> {
        if self.state.buckets.contains_key(name) {
            return Err(EngineError::bucket_exists(name));
        }
        self.state.buckets.insert(
            name.to_string(),
            BucketState {
                key_field: key_field.to_string(),
                records: BTreeMap::new(),
            },
        );
        Ok(())
    }

    fn bucket_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.state.buckets.keys().cloned().collect();
        names.sort();
        names
    }

    fn old_version(&self) -> Version {
        self.old_version
    }

    fn new_version(&self) -> Version {
        self.new_version
    }
}

struct MemoryConnection {
    slot: Arc<DatabaseSlot>,
    version: Version,
    closed: AtomicBool,
}

impl MemoryConnection {
    fn close_now(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            let mut live = self.slot.live.lock();
            *live = live.saturating_sub(1);
            drop(live);
            trace!(database = %self.slot.name, "connection closed");
            self.slot.closed.notify_waiters();
        }
    }
}

#[async_trait]
impl Connection for MemoryConnection {
    fn name(&self) -> &str {
        &self.slot.name
    }

    fn version(&self) -> Version {
        self.version
    }

    fn bucket_names(&self) -> Vec<String> {
        let state = self.slot.state.read();
        let mut names: Vec<String> = state.buckets.keys().cloned().collect();
        names.sort();
        names
    }

    fn key_field(&self, bucket: &str) -> Option<String> {
        let state = self.slot.state.read();
        state
            .buckets
            .get(bucket)
            .map(|bucket_state| bucket_state.key_field.clone())
    }

    async fn transaction(
        &self,
        bucket: &str,
        mode: TransactionMode,
    ) -> EngineResult<Box<dyn BucketTransaction>> {
        if self.is_closed() {
            return Err(EngineError::ConnectionClosed);
        }
        let state = self.slot.state.read();
        let Some(bucket_state) = state.buckets.get(bucket) else {
            return Err(EngineError::bucket_not_found(bucket));
        };
        Ok(Box::new(MemoryTransaction {
            slot: Arc::clone(&self.slot),
            bucket: bucket.to_string(),
            mode,
            working: bucket_state.records.clone(),
            ops: Vec::new(),
            aborted: false,
        }))
    }

    fn close(&self) {
        self.close_now();
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Drop for MemoryConnection {
    fn drop(&mut self) {
        self.close_now();
    }
}

/// A buffered write operation, replayed on commit.
enum TxnOp {
    Put(Key, Value),
    Delete(Key),
    Clear,
}

struct MemoryTransaction {
    slot: Arc<DatabaseSlot>,
    bucket: String,
    mode: TransactionMode,
    /// Snapshot of the bucket at transaction start, mutated by this
    /// transaction's own writes (read-your-writes).
    working: BTreeMap<Key, Value>,
    ops: Vec<TxnOp>,
    aborted: bool,
}

impl MemoryTransaction {
    fn check_active(&self) -> EngineResult<()> {
        if self.aborted {
            return Err(EngineError::transaction_aborted(
                "an earlier request in this transaction failed",
            ));
        }
        Ok(())
    }

    fn check_writable(&mut self) -> EngineResult<()> {
        self.check_active()?;
        if self.mode == TransactionMode::ReadOnly {
            self.aborted = true;
            return Err(EngineError::ReadOnly {
                bucket: self.bucket.clone(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl BucketTransaction for MemoryTransaction {
    async fn get(&mut self, key: &Key) -> EngineResult<Option<Value>> {
        self.check_active()?;
        Ok(self.working.get(key).cloned())
    }

    async fn put(&mut self, key: Key, value: Value) -> EngineResult<()> {
        self.check_writable()?;
        self.working.insert(key.clone(), value.clone());
        self.ops.push(TxnOp::Put(key, value));
        Ok(())
    }

    async fn delete(&mut self, key: &Key) -> EngineResult<()> {
        self.check_writable()?;
        self.working.remove(key);
        self.ops.push(TxnOp::Delete(key.clone()));
        Ok(())
    }

    async fn clear(&mut self) -> EngineResult<()> {
        self.check_writable()?;
        self.working.clear();
        self.ops.push(TxnOp::Clear);
        Ok(())
    }

    async fn count(&mut self) -> EngineResult<u64> {
        self.check_active()?;
        Ok(self.working.len() as u64)
    }

    async fn get_all(&mut self) -> EngineResult<Vec<(Key, Value)>> {
        self.check_active()?;
        Ok(self
            .working
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    async fn commit(mut self: Box<Self>) -> EngineResult<()> {
        self.check_active()?;
        if self.ops.is_empty() {
            return Ok(());
        }
        let ops = std::mem::take(&mut self.ops);
        let mut state = self.slot.state.write();
        let Some(bucket_state) = state.buckets.get_mut(&self.bucket) else {
            // Buckets are never deleted; reaching this means the caller
            // outlived the database registry.
            return Err(EngineError::bucket_not_found(&self.bucket));
        };
        for op in ops {
            match op {
                TxnOp::Put(key, value) => {
                    bucket_state.records.insert(key, value);
                }
                TxnOp::Delete(key) => {
                    bucket_state.records.remove(&key);
                }
                TxnOp::Clear => bucket_state.records.clear(),
            }
        }
        Ok(())
    }
}
