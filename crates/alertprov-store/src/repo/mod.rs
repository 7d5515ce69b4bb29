//! Repository layer for persisting alert rules and provenance to SQLite

pub mod sqlite_repo;

pub use sqlite_repo::SqliteRuleStore;
