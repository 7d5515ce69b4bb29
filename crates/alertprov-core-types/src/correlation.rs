//! Operation context carried through every service call
//!
//! An `OpContext` pairs a correlation id with a cancellation flag and an
//! optional deadline. Storage layers poll it between statements and hand an
//! `InterruptProbe` to the database so long-running statements can be aborted.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Correlation id stamped on every log event of one call
///
/// Fresh ids are time-ordered UUIDv7 strings; ids supplied by a caller are
/// taken as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
    pub fn new() -> Self {
        Uuid::now_v7().to_string().into()
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Wrap a caller-supplied id
    pub fn from_string(id: String) -> Self {
        id.into()
    }
}

impl From<String> for RequestId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Why an operation stopped before completing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interruption {
    /// The caller cancelled the operation
    Cancelled,
    /// The operation ran past its deadline
    DeadlineExceeded,
}

/// Cheap, thread-safe view of a context's cancellation state
///
/// Holds no borrow of the context so it can be moved into callbacks that
/// must be `'static` (e.g. a SQLite progress handler).
#[derive(Debug, Clone)]
pub struct InterruptProbe {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl InterruptProbe {
    /// Current interruption, if any
    pub fn interruption(&self) -> Option<Interruption> {
        if self.cancelled.load(Ordering::SeqCst) {
            return Some(Interruption::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(Interruption::DeadlineExceeded),
            _ => None,
        }
    }

    /// True once the context is cancelled or expired
    pub fn is_tripped(&self) -> bool {
        self.interruption().is_some()
    }
}

/// Handle that cancels the context it was taken from
#[derive(Debug, Clone)]
pub struct CancelHandle {
    cancelled: Arc<AtomicBool>,
}

impl CancelHandle {
    /// Cancel every clone of the originating context
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}

/// Context carried through operation boundaries
#[derive(Debug, Clone)]
pub struct OpContext {
    pub request_id: RequestId,
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl OpContext {
    /// Create a new context with a fresh RequestId and no deadline
    pub fn new() -> Self {
        Self {
            request_id: RequestId::new(),
            cancelled: Arc::new(AtomicBool::new(false)),
            deadline: None,
        }
    }

    /// Create a context with an existing RequestId
    pub fn with_request_id(request_id: RequestId) -> Self {
        Self {
            request_id,
            ..Self::new()
        }
    }

    /// Set an absolute deadline
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Set a deadline relative to now
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Deadline, if one was set
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Obtain a handle that cancels this context (and all its clones)
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            cancelled: Arc::clone(&self.cancelled),
        }
    }

    /// Cancel this context
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Obtain a detached probe for polling from callbacks
    pub fn interrupt_probe(&self) -> InterruptProbe {
        InterruptProbe {
            cancelled: Arc::clone(&self.cancelled),
            deadline: self.deadline,
        }
    }

    /// Current interruption, if any
    pub fn interruption(&self) -> Option<Interruption> {
        self.interrupt_probe().interruption()
    }
}

impl Default for OpContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_request_ids_differ() {
        let first = RequestId::new();
        assert_ne!(first, RequestId::new());
        assert_eq!(first.to_string(), first.as_str());
        assert!(Uuid::parse_str(first.as_str()).is_ok());
    }

    #[test]
    fn test_supplied_request_id_is_kept() {
        let id = RequestId::from_string("req-42".to_string());
        assert_eq!(id.to_string(), "req-42");
    }

    #[test]
    fn test_fresh_context_is_live() {
        let ctx = OpContext::new();
        assert_eq!(ctx.interruption(), None);
        assert!(ctx.deadline().is_none());
    }

    #[test]
    fn test_cancel_propagates_to_clones_and_probes() {
        let ctx = OpContext::new();
        let clone = ctx.clone();
        let probe = ctx.interrupt_probe();

        ctx.cancel_handle().cancel();

        assert_eq!(clone.interruption(), Some(Interruption::Cancelled));
        assert!(probe.is_tripped());
    }

    #[test]
    fn test_expired_deadline_reports_deadline_exceeded() {
        let ctx = OpContext::new().with_deadline(Instant::now() - Duration::from_millis(1));
        assert_eq!(ctx.interruption(), Some(Interruption::DeadlineExceeded));
    }

    #[test]
    fn test_cancellation_wins_over_deadline() {
        let ctx = OpContext::new().with_deadline(Instant::now() - Duration::from_millis(1));
        ctx.cancel();
        assert_eq!(ctx.interruption(), Some(Interruption::Cancelled));
    }

    #[test]
    fn test_future_deadline_is_live() {
        let ctx = OpContext::new().with_timeout(Duration::from_secs(3600));
        assert_eq!(ctx.interruption(), None);
    }

    #[test]
    fn test_request_id_serializes_as_bare_string() {
        let id = RequestId::from_string("abc".to_string());
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc\"");
    }
}
