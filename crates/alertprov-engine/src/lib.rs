//! Alert provisioning engine - orchestration layer
//!
//! Coordinates rule validation, the provenance lattice and group interval
//! policy with the persistence collaborators. Every mutation runs as a
//! single unit of work on the injected `TransactionManager`.

pub mod service;

pub use service::{AlertRuleService, ProvisionedRule, RuleGroup};

/// Service wired to the SQLite collaborators
pub type SqliteAlertRuleService =
    AlertRuleService<alertprov_store::SqliteTransactionManager, alertprov_store::SqliteRuleStore>;
