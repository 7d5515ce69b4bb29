use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Outcome recorded when a rule's queries return no data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NoDataState {
    Alerting,
    #[default]
    NoData,
    #[serde(rename = "OK")]
    Ok,
}

impl NoDataState {
    /// Storage representation
    pub fn as_str(&self) -> &'static str {
        match self {
            NoDataState::Alerting => "Alerting",
            NoDataState::NoData => "NoData",
            NoDataState::Ok => "OK",
        }
    }

    /// Parse the storage representation
    pub fn from_stored(value: &str) -> Option<Self> {
        match value {
            "Alerting" => Some(NoDataState::Alerting),
            "NoData" => Some(NoDataState::NoData),
            "OK" => Some(NoDataState::Ok),
            _ => None,
        }
    }
}

/// Outcome recorded when evaluating a rule fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ExecErrState {
    #[default]
    Alerting,
    Error,
    #[serde(rename = "OK")]
    Ok,
}

impl ExecErrState {
    /// Storage representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecErrState::Alerting => "Alerting",
            ExecErrState::Error => "Error",
            ExecErrState::Ok => "OK",
        }
    }

    /// Parse the storage representation
    pub fn from_stored(value: &str) -> Option<Self> {
        match value {
            "Alerting" => Some(ExecErrState::Alerting),
            "Error" => Some(ExecErrState::Error),
            "OK" => Some(ExecErrState::Ok),
            _ => None,
        }
    }
}

/// Query window as offsets (in seconds) back from the evaluation time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RelativeTimeRange {
    pub from: i64,
    pub to: i64,
}

impl RelativeTimeRange {
    /// Both offsets non-negative and `from` at least as far back as `to`
    pub fn is_valid(&self) -> bool {
        self.from >= 0 && self.to >= 0 && self.from >= self.to
    }
}

/// One named sub-query of a rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertQuery {
    pub ref_id: String,

    #[serde(default)]
    pub query_type: String,

    pub relative_time_range: RelativeTimeRange,

    #[serde(default)]
    pub datasource_uid: String,

    /// Opaque payload interpreted by the evaluation engine
    #[serde(default)]
    pub model: serde_json::Value,
}

impl AlertQuery {
    /// Create a query with an empty model
    pub fn new(ref_id: impl Into<String>, relative_time_range: RelativeTimeRange) -> Self {
        Self {
            ref_id: ref_id.into(),
            query_type: String::new(),
            relative_time_range,
            datasource_uid: String::new(),
            model: serde_json::json!({}),
        }
    }
}

/// Identity of a rule group: rules sharing it share one evaluation interval
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleGroupKey {
    pub org_id: i64,
    pub namespace_uid: String,
    pub rule_group: String,
}

impl RuleGroupKey {
    pub fn new(
        org_id: i64,
        namespace_uid: impl Into<String>,
        rule_group: impl Into<String>,
    ) -> Self {
        Self {
            org_id,
            namespace_uid: namespace_uid.into(),
            rule_group: rule_group.into(),
        }
    }
}

impl fmt::Display for RuleGroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "org {} namespace '{}' group '{}'",
            self.org_id, self.namespace_uid, self.rule_group
        )
    }
}

/// An alert rule definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertRule {
    /// Storage-assigned identifier (0 until persisted)
    #[serde(default)]
    pub id: i64,

    pub org_id: i64,

    /// Caller-stable identifier, unique within the org (generated when empty)
    #[serde(default)]
    pub uid: String,

    pub title: String,

    /// Ref id of the query whose result drives the alert
    pub condition: String,

    pub data: Vec<AlertQuery>,

    /// Evaluation period; 0 means "not requested"
    #[serde(default)]
    pub interval_seconds: i64,

    #[serde(default)]
    pub version: i64,

    #[serde(default)]
    pub namespace_uid: String,

    pub rule_group: String,

    #[serde(default)]
    pub no_data_state: NoDataState,

    #[serde(default)]
    pub exec_err_state: ExecErrState,

    /// How long the condition must hold before firing (whole seconds)
    #[serde(rename = "for", default, with = "duration_secs")]
    pub for_duration: Duration,

    #[serde(default)]
    pub labels: BTreeMap<String, String>,

    #[serde(default)]
    pub annotations: BTreeMap<String, String>,

    #[serde(default)]
    pub dashboard_uid: Option<String>,

    #[serde(default)]
    pub panel_id: Option<i64>,

    /// Time of the last write, set by the store
    #[serde(default)]
    pub updated: DateTime<Utc>,
}

impl AlertRule {
    /// Key of the group this rule is evaluated with
    pub fn group_key(&self) -> RuleGroupKey {
        RuleGroupKey::new(self.org_id, self.namespace_uid.clone(), self.rule_group.clone())
    }

    /// Whether the rule belongs to the given group
    pub fn is_in_group(&self, key: &RuleGroupKey) -> bool {
        self.org_id == key.org_id
            && self.namespace_uid == key.namespace_uid
            && self.rule_group == key.rule_group
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(deserializer)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_time_range_validity() {
        assert!(RelativeTimeRange { from: 600, to: 0 }.is_valid());
        assert!(RelativeTimeRange { from: 0, to: 0 }.is_valid());
        assert!(!RelativeTimeRange { from: 0, to: 60 }.is_valid());
        assert!(!RelativeTimeRange { from: -1, to: -5 }.is_valid());
    }

    #[test]
    fn test_states_round_trip_storage_strings() {
        for s in [NoDataState::Alerting, NoDataState::NoData, NoDataState::Ok] {
            assert_eq!(NoDataState::from_stored(s.as_str()), Some(s));
        }
        for s in [ExecErrState::Alerting, ExecErrState::Error, ExecErrState::Ok] {
            assert_eq!(ExecErrState::from_stored(s.as_str()), Some(s));
        }
    }

    #[test]
    fn test_rule_deserializes_from_provisioning_json() {
        let json = r#"{
            "orgId": 1,
            "title": "High CPU",
            "condition": "B",
            "ruleGroup": "cpu",
            "intervalSeconds": 60,
            "for": 300,
            "noDataState": "OK",
            "execErrState": "Error",
            "labels": {"team": "infra"},
            "data": [
                {"refId": "A", "relativeTimeRange": {"from": 600, "to": 0}, "model": {"expr": "up"}},
                {"refId": "B", "relativeTimeRange": {"from": 0, "to": 0}}
            ]
        }"#;

        let rule: AlertRule = serde_json::from_str(json).unwrap();
        assert_eq!(rule.for_duration, Duration::from_secs(300));
        assert_eq!(rule.no_data_state, NoDataState::Ok);
        assert_eq!(rule.exec_err_state, ExecErrState::Error);
        assert_eq!(rule.data.len(), 2);
        assert_eq!(rule.data[1].model, serde_json::Value::Null);
        assert!(rule.uid.is_empty());
        assert_eq!(rule.namespace_uid, "");
        assert_eq!(rule.labels.get("team").map(String::as_str), Some("infra"));
    }

    #[test]
    fn test_group_key_membership() {
        let key = RuleGroupKey::new(1, "ns", "g");
        let json = r#"{"orgId":1,"namespaceUid":"ns","ruleGroup":"g","title":"t","condition":"A","data":[]}"#;
        let rule: AlertRule = serde_json::from_str(json).unwrap();
        assert!(rule.is_in_group(&key));
        assert_eq!(rule.group_key(), key);
        assert!(!rule.is_in_group(&RuleGroupKey::new(2, "ns", "g")));
    }
}
