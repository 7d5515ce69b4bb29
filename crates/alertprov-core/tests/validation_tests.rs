#![allow(clippy::unwrap_used, clippy::expect_used)]

use alertprov_core::model::{AlertQuery, AlertRule, RelativeTimeRange};
use alertprov_core::rules::{validate_for_duration, validate_interval, validate_rule, MAX_UID_LEN};
use alertprov_core::{ServiceConfig, ValidationError};
use proptest::prelude::*;
use std::time::Duration;

fn config() -> ServiceConfig {
    ServiceConfig {
        base_interval_seconds: 10,
        default_interval_seconds: 60,
    }
}

fn query(ref_id: &str) -> AlertQuery {
    AlertQuery::new(ref_id, RelativeTimeRange { from: 60, to: 0 })
}

fn rule(title: &str) -> AlertRule {
    let mut rule: AlertRule = serde_json::from_value(serde_json::json!({
        "orgId": 1,
        "title": title,
        "condition": "A",
        "ruleGroup": "my-cool-group",
        "intervalSeconds": 60,
        "data": []
    }))
    .unwrap();
    rule.data = vec![query("A")];
    rule
}

#[test]
fn test_valid_rule_passes() {
    assert_eq!(validate_rule(&rule("ok"), &config()), Ok(()));
}

#[test]
fn test_blank_title_rejected() {
    assert_eq!(
        validate_rule(&rule("   "), &config()),
        Err(ValidationError::EmptyTitle)
    );
}

#[test]
fn test_non_positive_org_rejected() {
    let mut r = rule("t");
    r.org_id = 0;
    assert_eq!(
        validate_rule(&r, &config()),
        Err(ValidationError::InvalidOrgId { org_id: 0 })
    );
}

#[test]
fn test_empty_data_rejected() {
    let mut r = rule("t");
    r.data.clear();
    assert_eq!(validate_rule(&r, &config()), Err(ValidationError::EmptyData));
}

#[test]
fn test_empty_ref_id_rejected_with_position() {
    let mut r = rule("t");
    r.data.push(query(""));
    assert_eq!(
        validate_rule(&r, &config()),
        Err(ValidationError::EmptyRefId { index: 1 })
    );
}

#[test]
fn test_duplicate_ref_id_rejected() {
    let mut r = rule("t");
    r.data.push(query("A"));
    assert_eq!(
        validate_rule(&r, &config()),
        Err(ValidationError::DuplicateRefId {
            ref_id: "A".to_string()
        })
    );
}

#[test]
fn test_dangling_condition_rejected() {
    let mut r = rule("t");
    r.condition = "B".to_string();
    assert_eq!(
        validate_rule(&r, &config()),
        Err(ValidationError::DanglingCondition {
            condition: "B".to_string()
        })
    );
}

#[test]
fn test_condition_may_name_any_query() {
    let mut r = rule("t");
    r.data.push(query("B"));
    r.condition = "B".to_string();
    assert_eq!(validate_rule(&r, &config()), Ok(()));
}

#[test]
fn test_inverted_time_range_rejected() {
    let mut r = rule("t");
    r.data[0].relative_time_range = RelativeTimeRange { from: 0, to: 60 };
    assert!(matches!(
        validate_rule(&r, &config()),
        Err(ValidationError::InvalidTimeRange { .. })
    ));
}

#[test]
fn test_negative_time_range_rejected() {
    let mut r = rule("t");
    r.data[0].relative_time_range = RelativeTimeRange { from: 10, to: -5 };
    assert!(matches!(
        validate_rule(&r, &config()),
        Err(ValidationError::InvalidTimeRange { .. })
    ));
}

#[test]
fn test_unrequested_interval_is_allowed() {
    let mut r = rule("t");
    r.interval_seconds = 0;
    assert_eq!(validate_rule(&r, &config()), Ok(()));
}

#[test]
fn test_negative_interval_rejected() {
    let mut r = rule("t");
    r.interval_seconds = -10;
    assert_eq!(
        validate_rule(&r, &config()),
        Err(ValidationError::NonPositiveInterval {
            interval_seconds: -10
        })
    );
}

#[test]
fn test_misaligned_interval_rejected() {
    let mut r = rule("t");
    r.interval_seconds = 65;
    assert_eq!(
        validate_rule(&r, &config()),
        Err(ValidationError::MisalignedInterval {
            interval_seconds: 65,
            base_interval_seconds: 10
        })
    );
}

#[test]
fn test_long_uid_rejected() {
    let mut r = rule("t");
    r.uid = "x".repeat(MAX_UID_LEN + 1);
    assert!(matches!(
        validate_rule(&r, &config()),
        Err(ValidationError::UidTooLong { .. })
    ));

    r.uid = "x".repeat(MAX_UID_LEN);
    assert_eq!(validate_rule(&r, &config()), Ok(()));
}

#[test]
fn test_for_beyond_storable_range_rejected() {
    let mut r = rule("t");
    r.for_duration = Duration::from_secs(u64::MAX);
    assert_eq!(
        validate_rule(&r, &config()),
        Err(ValidationError::ForOutOfRange {
            seconds: u64::MAX,
            max: i64::MAX
        })
    );

    let edge = Duration::from_secs(i64::MAX as u64);
    assert_eq!(validate_for_duration(edge), Ok(()));
    assert!(matches!(
        validate_for_duration(edge + Duration::from_secs(1)),
        Err(ValidationError::ForOutOfRange { .. })
    ));
}

#[test]
fn test_fractional_for_rejected() {
    let mut r = rule("t");
    r.for_duration = Duration::from_millis(1500);
    assert_eq!(
        validate_rule(&r, &config()),
        Err(ValidationError::FractionalFor {
            seconds: 1,
            nanos: 500_000_000
        })
    );

    r.for_duration = Duration::from_secs(90);
    assert_eq!(validate_rule(&r, &config()), Ok(()));
}

#[test]
fn test_model_payload_is_not_inspected() {
    let mut r = rule("t");
    r.data[0].model = serde_json::json!(["anything", {"goes": true}]);
    assert_eq!(validate_rule(&r, &config()), Ok(()));
}

proptest! {
    #[test]
    fn prop_multiples_of_base_are_valid(k in 1i64..10_000) {
        prop_assert_eq!(validate_interval(k * 10, &config()), Ok(()));
    }

    #[test]
    fn prop_non_multiples_are_misaligned(k in 0i64..10_000, offset in 1i64..10) {
        let interval = k * 10 + offset;
        let is_misaligned = matches!(
            validate_interval(interval, &config()),
            Err(ValidationError::MisalignedInterval { .. })
        );
        prop_assert!(is_misaligned);
    }

    #[test]
    fn prop_non_positive_intervals_rejected(interval in -10_000i64..=0) {
        prop_assert_eq!(
            validate_interval(interval, &config()),
            Err(ValidationError::NonPositiveInterval { interval_seconds: interval })
        );
    }

    #[test]
    fn prop_distinct_ref_ids_validate(n in 1usize..8, pick in 0usize..8) {
        let mut r = rule("generated");
        r.data = (0..n).map(|i| query(&format!("Q{}", i))).collect();
        r.condition = format!("Q{}", pick % n);
        prop_assert_eq!(validate_rule(&r, &config()), Ok(()));
    }
}
