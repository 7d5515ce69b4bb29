//! Alert provisioning core - domain model and invariants
//!
//! This crate provides the storage-independent half of the alert rule
//! provisioning service:
//! - AlertRule / AlertQuery models and the Provenance lattice
//! - Structural rule validation against the configured base interval
//! - The closed error taxonomy shared by every layer
//! - Collaborator contracts (transaction manager, rule and provenance stores)
//! - Service configuration and the structured logging facility

pub mod config;
pub mod errors;
pub mod logging_facility;
pub mod model;
pub mod rules;
pub mod store;

// Re-export commonly used types
pub use config::{AppConfig, ServiceConfig, StoreConfig};
pub use errors::{ErrorKind, ProvisioningError, Result, StoreError, ValidationError};
pub use model::{AlertQuery, AlertRule, ExecErrState, NoDataState, Provenance, RuleGroupKey};
pub use store::{ProvenanceStore, RuleStore, TransactionManager};

#[doc(hidden)]
pub mod __private {
    pub use alertprov_core_types::schema;
    pub use tracing;
}
