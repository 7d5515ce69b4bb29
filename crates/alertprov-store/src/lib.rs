//! Alert provisioning store - SQLite-backed collaborators
//!
//! Provides:
//! - Connection management and the embedded migration framework
//! - `SqliteTransactionManager`: `BEGIN IMMEDIATE` units of work with
//!   cancellation-aware rollback
//! - `SqliteRuleStore`: rule and provenance persistence

pub mod db;
pub mod errors;
pub mod migrations;
pub mod repo;
pub mod transaction;

// Re-export key types
pub use errors::Result;
pub use repo::SqliteRuleStore;
pub use transaction::{SqliteTransactionManager, SqliteTx};
