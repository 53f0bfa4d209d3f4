//! # originstore core
//!
//! Per-namespace key-value storage facade over a single shared, versioned,
//! schema-on-demand database.
//!
//! Independent callers request an isolated named bucket without
//! pre-declaring a global schema or coordinating version bumps with each
//! other. The [`Provisioner`] inspects the stored database version,
//! detects whether the bucket exists, and if not, transactionally
//! upgrades the database to add it. The returned [`BucketHandle`] exposes
//! CRUD operations, each running in its own short-lived transaction.
//!
//! The engine is injectable ([`StorageEngine`]); the bundled
//! [`MemoryEngine`] serves tests and ephemeral storage.
//!
//! ## Example
//!
//! ```rust,ignore
//! use originstore_core::{Key, MemoryEngine, Provisioner, Value};
//! use std::sync::Arc;
//!
//! let provisioner = Provisioner::new(Arc::new(MemoryEngine::new()));
//! let prefs = provisioner.provision("prefs").await?;
//! prefs.set(Key::from("theme"), Value::from("dark")).await?;
//! assert_eq!(prefs.get(&Key::from("theme")).await?, Some(Value::from("dark")));
//! prefs.close();
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod handle;
mod legacy;
mod provision;

pub use config::{Config, RECORD_KEY_FIELD, SHARED_DATABASE_NAME};
pub use error::{StoreError, StoreResult};
pub use handle::BucketHandle;
#[allow(deprecated)]
pub use legacy::LegacyStore;
pub use provision::{ProvisionState, Provisioner};

// Engine surface re-exported for callers that inject their own engine or
// construct keys and values.
pub use originstore_engine::{
    Connection, EngineError, Key, MemoryEngine, StorageEngine, Value, Version,
};
