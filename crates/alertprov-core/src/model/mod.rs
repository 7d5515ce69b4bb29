pub mod alert_rule;
pub mod provenance;

pub use alert_rule::{
    AlertQuery, AlertRule, ExecErrState, NoDataState, RelativeTimeRange, RuleGroupKey,
};
pub use provenance::Provenance;
