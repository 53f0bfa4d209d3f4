//! # originstore engine
//!
//! Engine capability contract and reference implementation for originstore.
//!
//! This crate defines the lowest-level abstraction the facade builds on:
//! an embedded, versioned, schema-on-demand key-value engine. Engines
//! expose database enumeration, open-with-version (which may deliver a
//! one-time upgrade hook), and per-bucket transactions with
//! read-only/read-write modes.
//!
//! ## Design Principles
//!
//! - Schema changes (bucket creation) happen only inside an upgrade hook
//! - Every request settles exactly once, success or error
//! - A version-bump open never starts while other connections are live
//!
//! ## Available Engines
//!
//! - [`MemoryEngine`] - In-memory reference engine for testing and
//!   ephemeral storage
//!
//! ## Example
//!
//! ```rust,ignore
//! use originstore_engine::{Key, MemoryEngine, StorageEngine, TransactionMode, Value, Version};
//!
//! let engine = MemoryEngine::new();
//! let conn = engine
//!     .open("db", Version::new(1), Some(Box::new(|editor| {
//!         editor.create_bucket("items", "key")
//!     })))
//!     .await?;
//! let mut txn = conn.transaction("items", TransactionMode::ReadWrite).await?;
//! txn.put(Key::from("greeting"), Value::from("hello")).await?;
//! txn.commit().await?;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod engine;
mod error;
mod memory;
mod value;

pub use engine::{
    BucketTransaction, Connection, DatabaseInfo, SchemaEditor, StorageEngine, TransactionMode,
    UpgradeHook, Version,
};
pub use error::{EngineError, EngineResult};
pub use memory::MemoryEngine;
pub use value::{Key, Value};
