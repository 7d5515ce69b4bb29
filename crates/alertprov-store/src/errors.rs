//! Error handling for alertprov-store
//!
//! Maps SQLite and encoding failures into the shared error taxonomy

use alertprov_core::errors::{ProvisioningError, StoreError};
use alertprov_core_types::{Interruption, OpContext};

pub use alertprov_core::errors::Result;

/// Create a database error from rusqlite::Error
pub fn from_rusqlite(op: &str, err: rusqlite::Error) -> ProvisioningError {
    StoreError::Database {
        op: op.to_string(),
        message: err.to_string(),
    }
    .into()
}

/// Classify a failed statement, attributing interrupts to the context
///
/// A statement aborted by the progress handler surfaces from SQLite as
/// `SQLITE_INTERRUPT`; the context tells whether it was a cancel or a
/// deadline.
pub fn classify(ctx: &OpContext, op: &str, err: rusqlite::Error) -> ProvisioningError {
    if let Some(interruption) = ctx.interruption() {
        return interrupted(op, interruption);
    }
    if is_interrupt(&err) {
        return interrupted(op, Interruption::Cancelled);
    }
    from_rusqlite(op, err)
}

/// Fail fast when the context is already cancelled or expired
pub fn ensure_live(ctx: &OpContext, op: &str) -> Result<()> {
    match ctx.interruption() {
        Some(interruption) => Err(interrupted(op, interruption)),
        None => Ok(()),
    }
}

/// Create a cancellation or deadline error
pub fn interrupted(op: &str, interruption: Interruption) -> ProvisioningError {
    let op = op.to_string();
    match interruption {
        Interruption::Cancelled => StoreError::Cancelled { op },
        Interruption::DeadlineExceeded => StoreError::DeadlineExceeded { op },
    }
    .into()
}

/// Create an error for a stored value that cannot be decoded
pub fn corrupt(op: &str, message: impl Into<String>) -> ProvisioningError {
    StoreError::Corrupt {
        op: op.to_string(),
        message: message.into(),
    }
    .into()
}

/// Create a migration error
pub fn migration_error(migration_id: &str, reason: &str) -> ProvisioningError {
    StoreError::Migration {
        migration_id: migration_id.to_string(),
        reason: reason.to_string(),
    }
    .into()
}

/// Create a checksum mismatch error
pub fn checksum_mismatch(migration_id: &str, expected: &str, actual: &str) -> ProvisioningError {
    StoreError::ChecksumMismatch {
        migration_id: migration_id.to_string(),
        expected: expected.to_string(),
        actual: actual.to_string(),
    }
    .into()
}

/// True for `SQLITE_INTERRUPT`
pub fn is_interrupt(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::OperationInterrupted
    )
}

/// True for UNIQUE / NOT NULL / CHECK violations
pub fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}
