use crate::model::Provenance;
use thiserror::Error;

/// Result type alias using ProvisioningError
pub type Result<T> = std::result::Result<T, ProvisioningError>;

/// Coarse error classification
///
/// Every `ProvisioningError` maps to exactly one kind, and every kind has a
/// stable code usable by logs, tests and command-line output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    ProvenanceConflict,
    Store,
}

impl ErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "ERR_VALIDATION",
            ErrorKind::NotFound => "ERR_NOT_FOUND",
            ErrorKind::ProvenanceConflict => "ERR_PROVENANCE_CONFLICT",
            ErrorKind::Store => "ERR_STORE",
        }
    }
}

/// Errors returned by alert rule provisioning operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProvisioningError {
    /// The requested rule is malformed; nothing was written
    #[error("Invalid alert rule: {0}")]
    Validation(#[from] ValidationError),

    /// No record exists for the given key
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    /// The requested provenance change is not permitted
    #[error("Cannot change provenance of rule {uid} in org {org_id} from '{current}' to '{requested}'")]
    ProvenanceConflict {
        org_id: i64,
        uid: String,
        current: Provenance,
        requested: Provenance,
    },

    /// Persistence failed; the transaction was rolled back
    #[error("Store failure: {0}")]
    Store(#[from] StoreError),
}

impl ProvisioningError {
    /// Not-found error for an alert rule
    pub fn rule_not_found(org_id: i64, uid: &str) -> Self {
        ProvisioningError::NotFound {
            entity: "alert rule",
            key: format!("org {} uid {}", org_id, uid),
        }
    }

    /// Not-found error for a rule's provenance record
    pub fn provenance_not_found(org_id: i64, uid: &str) -> Self {
        ProvisioningError::NotFound {
            entity: "provenance",
            key: format!("org {} uid {}", org_id, uid),
        }
    }

    /// Get the error kind
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProvisioningError::Validation(_) => ErrorKind::Validation,
            ProvisioningError::NotFound { .. } => ErrorKind::NotFound,
            ProvisioningError::ProvenanceConflict { .. } => ErrorKind::ProvenanceConflict,
            ProvisioningError::Store(_) => ErrorKind::Store,
        }
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind().code()
    }
}

/// Structural problems with a requested rule
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("title must not be empty")]
    EmptyTitle,

    #[error("org id must be positive, got {org_id}")]
    InvalidOrgId { org_id: i64 },

    #[error("uid '{uid}' is longer than {max} characters")]
    UidTooLong { uid: String, max: usize },

    #[error("uid '{uid}' is already used in org {org_id}")]
    UidTaken { org_id: i64, uid: String },

    #[error("rule must contain at least one query")]
    EmptyData,

    #[error("query at position {index} has an empty ref id")]
    EmptyRefId { index: usize },

    #[error("ref id '{ref_id}' is used by more than one query")]
    DuplicateRefId { ref_id: String },

    #[error("condition '{condition}' does not name any query ref id")]
    DanglingCondition { condition: String },

    #[error("query '{ref_id}' has an invalid relative time range (from {from}s, to {to}s)")]
    InvalidTimeRange { ref_id: String, from: i64, to: i64 },

    #[error("interval must be positive, got {interval_seconds}s")]
    NonPositiveInterval { interval_seconds: i64 },

    #[error("interval {interval_seconds}s is not a multiple of the base interval {base_interval_seconds}s")]
    MisalignedInterval {
        interval_seconds: i64,
        base_interval_seconds: i64,
    },

    #[error("for duration of {seconds}s exceeds the storable maximum of {max}s")]
    ForOutOfRange { seconds: u64, max: i64 },

    #[error("for duration must be whole seconds, got {nanos}ns past {seconds}s")]
    FractionalFor { seconds: u64, nanos: u32 },
}

/// Failures raised by the storage collaborators
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("database error in '{op}': {message}")]
    Database { op: String, message: String },

    #[error("operation cancelled during '{op}'")]
    Cancelled { op: String },

    #[error("deadline exceeded during '{op}'")]
    DeadlineExceeded { op: String },

    #[error("corrupt record in '{op}': {message}")]
    Corrupt { op: String, message: String },

    #[error("migration {migration_id} failed: {reason}")]
    Migration { migration_id: String, reason: String },

    #[error("checksum mismatch for migration {migration_id}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        migration_id: String,
        expected: String,
        actual: String,
    },
}

impl StoreError {
    /// True when the failure came from cancellation or deadline expiry
    pub fn is_interrupted(&self) -> bool {
        matches!(
            self,
            StoreError::Cancelled { .. } | StoreError::DeadlineExceeded { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_codes() {
        let cases = [
            (ErrorKind::Validation, "ERR_VALIDATION"),
            (ErrorKind::NotFound, "ERR_NOT_FOUND"),
            (ErrorKind::ProvenanceConflict, "ERR_PROVENANCE_CONFLICT"),
            (ErrorKind::Store, "ERR_STORE"),
        ];
        for (kind, expected_code) in cases {
            assert_eq!(kind.code(), expected_code, "Wrong code for {:?}", kind);
        }
    }

    #[test]
    fn test_validation_error_converts_into_validation_kind() {
        let err: ProvisioningError = ValidationError::EmptyTitle.into();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.code(), "ERR_VALIDATION");
    }

    #[test]
    fn test_store_error_converts_into_store_kind() {
        let err: ProvisioningError = StoreError::Cancelled { op: "begin".into() }.into();
        assert_eq!(err.kind(), ErrorKind::Store);
    }

    #[test]
    fn test_provenance_conflict_message_names_both_states() {
        let err = ProvisioningError::ProvenanceConflict {
            org_id: 1,
            uid: "r1".into(),
            current: Provenance::Api,
            requested: Provenance::File,
        };
        let msg = err.to_string();
        assert!(msg.contains("'api'"), "{}", msg);
        assert!(msg.contains("'file'"), "{}", msg);
    }

    #[test]
    fn test_interrupted_classification() {
        assert!(StoreError::Cancelled { op: "x".into() }.is_interrupted());
        assert!(StoreError::DeadlineExceeded { op: "x".into() }.is_interrupted());
        assert!(!StoreError::Database {
            op: "x".into(),
            message: "boom".into()
        }
        .is_interrupted());
    }
}
