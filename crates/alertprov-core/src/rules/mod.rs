pub mod provenance;
pub mod validation;

pub use provenance::ensure_transition;
pub use validation::{validate_for_duration, validate_interval, validate_rule, MAX_UID_LEN};
