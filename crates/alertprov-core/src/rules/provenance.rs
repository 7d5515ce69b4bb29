use crate::errors::{ProvisioningError, Result};
use crate::model::Provenance;

/// Enforce the provenance lattice for an update
///
/// | from \ to | None    | API     | File    |
/// |-----------|---------|---------|---------|
/// | None      | allowed | allowed | allowed |
/// | API       | denied  | allowed | denied  |
/// | File      | denied  | denied  | allowed |
///
/// Release back to `None` and hand-over between channels are not possible
/// through an update.
///
/// # Errors
/// `ProvenanceConflict` carrying both states when the move is denied.
pub fn ensure_transition(
    org_id: i64,
    uid: &str,
    current: Provenance,
    requested: Provenance,
) -> Result<()> {
    if current.can_transition_to(requested) {
        return Ok(());
    }
    Err(ProvisioningError::ProvenanceConflict {
        org_id,
        uid: uid.to_string(),
        current,
        requested,
    })
}
