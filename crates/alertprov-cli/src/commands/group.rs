//! Rule group commands

use super::{print_json, CliResult, GlobalArgs};
use alertprov_core::model::RuleGroupKey;
use clap::Args;

#[derive(Debug, Args)]
pub struct GroupKeyArgs {
    #[arg(long)]
    pub org: i64,

    /// Namespace (folder) uid; empty for the default namespace
    #[arg(long, default_value = "")]
    pub namespace: String,

    #[arg(long)]
    pub group: String,
}

impl GroupKeyArgs {
    fn key(&self) -> RuleGroupKey {
        RuleGroupKey::new(self.org, self.namespace.clone(), self.group.clone())
    }
}

#[derive(Debug, Args)]
pub struct UpdateGroupArgs {
    #[command(flatten)]
    pub key: GroupKeyArgs,

    /// New evaluation interval in seconds
    #[arg(long)]
    pub interval: i64,
}

#[derive(Debug, Args)]
pub struct GroupArgs {
    #[command(flatten)]
    pub key: GroupKeyArgs,
}

pub fn execute_update_group(global: &GlobalArgs, args: UpdateGroupArgs) -> CliResult {
    let service = global.open_service()?;
    let key = args.key.key();
    let touched = service.update_alert_group(&global.op_context(), &key, args.interval)?;
    print_json(&serde_json::json!({
        "orgId": key.org_id,
        "namespaceUid": key.namespace_uid,
        "ruleGroup": key.rule_group,
        "intervalSeconds": args.interval,
        "rulesUpdated": touched,
    }))
}

pub fn execute_group(global: &GlobalArgs, args: GroupArgs) -> CliResult {
    let service = global.open_service()?;
    let group = service.get_alert_rule_group(&global.op_context(), &args.key.key())?;
    print_json(&group)
}
