use crate::config::ServiceConfig;
use crate::errors::ValidationError;
use crate::model::AlertRule;
use std::collections::HashSet;
use std::time::Duration;

/// Longest caller-supplied uid accepted
pub const MAX_UID_LEN: usize = 40;

/// Validate the structure of a requested rule
///
/// Checks, in order:
///
/// 1. Org id is positive and a supplied uid fits `MAX_UID_LEN`
/// 2. Title is non-empty (ignoring whitespace)
/// 3. Data is non-empty; every ref id is non-empty and unique
/// 4. Every relative time range is well-formed
/// 5. Condition names one of the ref ids
/// 6. A requested interval (non-zero) is a positive multiple of the base interval
/// 7. `for` is whole seconds and fits the stored `i64` column
///
/// The query model payload is opaque and not inspected.
///
/// # Errors
/// Returns the first problem found.
pub fn validate_rule(rule: &AlertRule, config: &ServiceConfig) -> Result<(), ValidationError> {
    if rule.org_id <= 0 {
        return Err(ValidationError::InvalidOrgId {
            org_id: rule.org_id,
        });
    }
    if rule.uid.chars().count() > MAX_UID_LEN {
        return Err(ValidationError::UidTooLong {
            uid: rule.uid.clone(),
            max: MAX_UID_LEN,
        });
    }
    if rule.title.trim().is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    if rule.data.is_empty() {
        return Err(ValidationError::EmptyData);
    }

    let mut seen = HashSet::with_capacity(rule.data.len());
    for (index, query) in rule.data.iter().enumerate() {
        if query.ref_id.is_empty() {
            return Err(ValidationError::EmptyRefId { index });
        }
        if !seen.insert(query.ref_id.as_str()) {
            return Err(ValidationError::DuplicateRefId {
                ref_id: query.ref_id.clone(),
            });
        }
        if !query.relative_time_range.is_valid() {
            return Err(ValidationError::InvalidTimeRange {
                ref_id: query.ref_id.clone(),
                from: query.relative_time_range.from,
                to: query.relative_time_range.to,
            });
        }
    }

    if !seen.contains(rule.condition.as_str()) {
        return Err(ValidationError::DanglingCondition {
            condition: rule.condition.clone(),
        });
    }

    if rule.interval_seconds != 0 {
        validate_interval(rule.interval_seconds, config)?;
    }

    validate_for_duration(rule.for_duration)
}

/// Check that a `for` duration can be stored without loss
///
/// # Errors
/// `FractionalFor` or `ForOutOfRange`.
pub fn validate_for_duration(for_duration: Duration) -> Result<(), ValidationError> {
    let seconds = for_duration.as_secs();
    if for_duration.subsec_nanos() != 0 {
        return Err(ValidationError::FractionalFor {
            seconds,
            nanos: for_duration.subsec_nanos(),
        });
    }
    if i64::try_from(seconds).is_err() {
        return Err(ValidationError::ForOutOfRange {
            seconds,
            max: i64::MAX,
        });
    }
    Ok(())
}

/// Check that an interval is a positive multiple of the base interval
///
/// # Errors
/// `NonPositiveInterval` or `MisalignedInterval`.
pub fn validate_interval(
    interval_seconds: i64,
    config: &ServiceConfig,
) -> Result<(), ValidationError> {
    if interval_seconds <= 0 {
        return Err(ValidationError::NonPositiveInterval { interval_seconds });
    }
    if interval_seconds % config.base_interval_seconds != 0 {
        return Err(ValidationError::MisalignedInterval {
            interval_seconds,
            base_interval_seconds: config.base_interval_seconds,
        });
    }
    Ok(())
}
