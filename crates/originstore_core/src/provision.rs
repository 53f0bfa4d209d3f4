//! Lazy schema provisioning.
//!
//! The provisioner resolves a bucket name to a live connection that is
//! guaranteed to contain that bucket, creating it on demand through the
//! engine's versioned upgrade mechanism.

use crate::config::Config;
use crate::error::{StoreError, StoreResult};
use crate::handle::BucketHandle;
use originstore_engine::{Connection, StorageEngine, UpgradeHook, Version};
use std::sync::Arc;
use tracing::debug;

/// Phase of a provisioning attempt.
///
/// `AwaitingUpgrade` is entered only when the target version exceeds the
/// stored version; bucket creation is only valid as the transition out of
/// `AwaitingUpgrade`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionState {
    /// Inspecting the stored version and existing bucket names.
    Probing,
    /// The bucket is absent; the main open will run an upgrade.
    AwaitingUpgrade,
    /// A connection containing the bucket is available.
    Ready,
    /// Provisioning failed; the error was returned to the caller.
    Failed,
}

impl ProvisionState {
    /// Returns true if provisioning has finished, successfully or not.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProvisionState::Ready | ProvisionState::Failed)
    }
}

/// Provisions bucket handles against a shared, versioned database.
///
/// A provisioning call opens two sequential connections: a short-lived
/// probe at the stored version to read the existing bucket names, and the
/// main connection at either the stored version (bucket present) or the
/// next version (bucket absent, created inside the upgrade hook). The
/// probe is closed before the main open; the two must never overlap, or
/// the version bump would block behind the probe.
///
/// Provisioning the same bucket from overlapping calls is safe: the
/// engine serializes version-bump opens, the first open creates the
/// bucket, and the second resolves against the already-upgraded database.
/// Overlapping calls for *different* new buckets are not guarded: one
/// caller's bump can land first and leave the other's open resolving at a
/// version whose upgrade never created its bucket. Callers provisioning
/// many new buckets should do so sequentially.
pub struct Provisioner {
    engine: Arc<dyn StorageEngine>,
    config: Config,
}

impl Provisioner {
    /// Creates a provisioner with the default configuration.
    pub fn new(engine: Arc<dyn StorageEngine>) -> Self {
        Self::with_config(engine, Config::default())
    }

    /// Creates a provisioner with a custom configuration.
    pub fn with_config(engine: Arc<dyn StorageEngine>, config: Config) -> Self {
        Self { engine, config }
    }

    /// Returns the configuration in use.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Resolves a handle to `bucket_name`, creating the bucket if absent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Connection`] if the engine cannot be opened
    /// or upgraded, including failures raised inside the upgrade hook.
    pub async fn provision(&self, bucket_name: &str) -> StoreResult<BucketHandle> {
        let connection = self.connect(bucket_name).await?;
        Ok(BucketHandle::new(connection, bucket_name.to_string()))
    }

    /// Runs the provisioning algorithm and returns the main connection.
    async fn connect(&self, bucket_name: &str) -> StoreResult<Arc<dyn Connection>> {
        let database = self.config.database_name.as_str();
        let mut state = ProvisionState::Probing;
        debug!(bucket = bucket_name, database, ?state, "provisioning");

        // Step 1: stored version, or 1 if the database does not exist yet.
        let stored = self
            .engine
            .list_databases()
            .await
            .map_err(StoreError::connection)?
            .into_iter()
            .find(|info| info.name == database)
            .map(|info| info.version)
            .unwrap_or(Version::new(1));

        // Steps 2-3: probe at the stored version (never higher) to read the
        // bucket names, then close the probe before any further open.
        let probe = self
            .engine
            .open(database, stored, None)
            .await
            .map_err(StoreError::connection)?;
        let exists = probe.bucket_names().iter().any(|name| name == bucket_name);
        probe.close();

        // Step 4: target version.
        let target = if exists { stored } else { stored.next() };

        // Step 5: main open; the upgrade hook is attached only when the
        // bucket must be created.
        let on_upgrade: Option<UpgradeHook> = if exists {
            None
        } else {
            state = ProvisionState::AwaitingUpgrade;
            debug!(bucket = bucket_name, %stored, %target, ?state, "bucket absent");
            let bucket = bucket_name.to_string();
            let key_field = self.config.key_field.clone();
            Some(Box::new(move |editor| {
                editor.create_bucket(&bucket, &key_field)
            }))
        };

        match self.engine.open(database, target, on_upgrade).await {
            Ok(connection) => {
                state = ProvisionState::Ready;
                debug!(bucket = bucket_name, version = %connection.version(), ?state, "provisioned");
                Ok(connection)
            }
            Err(err) => {
                state = ProvisionState::Failed;
                debug!(bucket = bucket_name, ?state, error = %err, "provisioning failed");
                Err(StoreError::connection(err))
            }
        }
    }
}

impl std::fmt::Debug for Provisioner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provisioner")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use originstore_engine::{MemoryEngine, StorageEngine};

    fn provisioner() -> Provisioner {
        Provisioner::new(Arc::new(MemoryEngine::new()))
    }

    #[test]
    fn terminal_states() {
        assert!(!ProvisionState::Probing.is_terminal());
        assert!(!ProvisionState::AwaitingUpgrade.is_terminal());
        assert!(ProvisionState::Ready.is_terminal());
        assert!(ProvisionState::Failed.is_terminal());
    }

    #[tokio::test]
    async fn first_provision_creates_bucket_at_version_two() {
        let provisioner = provisioner();
        let handle = provisioner.provision("prefs").await.unwrap();

        // Probe established the database at 1, the bump created the bucket
        // at 2.
        assert_eq!(handle.connection().version(), Version::new(2));
        assert_eq!(
            handle.connection().bucket_names(),
            vec!["prefs".to_string()]
        );
        handle.close();
    }

    #[tokio::test]
    async fn reprovision_does_not_bump_version() {
        let provisioner = provisioner();
        let first = provisioner.provision("prefs").await.unwrap();
        first.close();

        let second = provisioner.provision("prefs").await.unwrap();
        assert_eq!(second.connection().version(), Version::new(2));
        assert_eq!(
            second.connection().bucket_names(),
            vec!["prefs".to_string()]
        );
        second.close();
    }

    #[tokio::test]
    async fn each_bucket_bumps_version_once() {
        let provisioner = provisioner();
        let a = provisioner.provision("a").await.unwrap();
        a.close();
        let b = provisioner.provision("b").await.unwrap();

        assert_eq!(b.connection().version(), Version::new(3));
        assert_eq!(
            b.connection().bucket_names(),
            vec!["a".to_string(), "b".to_string()]
        );
        b.close();
    }

    #[tokio::test]
    async fn bucket_declares_configured_key_field() {
        let provisioner = provisioner();
        let handle = provisioner.provision("prefs").await.unwrap();
        assert_eq!(
            handle.connection().key_field("prefs"),
            Some(crate::config::RECORD_KEY_FIELD.to_string())
        );
        assert_eq!(handle.connection().key_field("other"), None);
        handle.close();
    }

    #[tokio::test]
    async fn custom_key_field_is_declared() {
        let engine: Arc<MemoryEngine> = Arc::new(MemoryEngine::new());
        let config = Config::new().key_field("id");
        let provisioner = Provisioner::with_config(engine, config);

        let handle = provisioner.provision("items").await.unwrap();
        assert_eq!(
            handle.connection().key_field("items"),
            Some("id".to_string())
        );
        handle.close();
    }

    #[tokio::test]
    async fn custom_database_name_is_used() {
        let engine: Arc<MemoryEngine> = Arc::new(MemoryEngine::new());
        let config = Config::new().database_name("test/other");
        let provisioner = Provisioner::with_config(engine.clone(), config);

        let handle = provisioner.provision("items").await.unwrap();
        assert_eq!(handle.connection().name(), "test/other");
        handle.close();

        let infos = engine.list_databases().await.unwrap();
        assert_eq!(infos.len(), 1);
        assert_eq!(infos[0].name, "test/other");
    }
}
