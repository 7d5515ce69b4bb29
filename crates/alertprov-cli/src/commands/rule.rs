//! Rule commands: create, get, update, list

use super::{print_json, CliResult, GlobalArgs};
use alertprov_core::model::{AlertRule, Provenance};
use clap::Args;
use std::path::{Path, PathBuf};

#[derive(Debug, Args)]
pub struct CreateArgs {
    /// JSON file holding the rule definition
    #[arg(long)]
    pub file: PathBuf,

    /// Channel claiming the rule: none, api or file
    #[arg(long, default_value = "none")]
    pub provenance: Provenance,
}

#[derive(Debug, Args)]
pub struct GetArgs {
    #[arg(long)]
    pub org: i64,

    #[arg(long)]
    pub uid: String,
}

#[derive(Debug, Args)]
pub struct UpdateArgs {
    /// JSON file holding the new definition; must carry the rule's uid
    #[arg(long)]
    pub file: PathBuf,

    /// Channel claiming the rule: none, api or file
    #[arg(long, default_value = "none")]
    pub provenance: Provenance,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    #[arg(long)]
    pub org: i64,
}

fn read_rule(path: &Path) -> Result<AlertRule, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
    let rule = serde_json::from_str(&text)
        .map_err(|e| format!("invalid rule in {}: {}", path.display(), e))?;
    Ok(rule)
}

pub fn execute_create(global: &GlobalArgs, args: CreateArgs) -> CliResult {
    let rule = read_rule(&args.file)?;
    let service = global.open_service()?;
    let stored = service.create_alert_rule(&global.op_context(), rule, args.provenance)?;
    print_json(&stored)
}

pub fn execute_get(global: &GlobalArgs, args: GetArgs) -> CliResult {
    let service = global.open_service()?;
    let found = service.get_alert_rule(&global.op_context(), args.org, &args.uid)?;
    print_json(&found)
}

pub fn execute_update(global: &GlobalArgs, args: UpdateArgs) -> CliResult {
    let rule = read_rule(&args.file)?;
    if rule.uid.is_empty() {
        return Err("rule file must set \"uid\" for update".into());
    }
    let service = global.open_service()?;
    let stored = service.update_alert_rule(&global.op_context(), rule, args.provenance)?;
    print_json(&stored)
}

pub fn execute_list(global: &GlobalArgs, args: ListArgs) -> CliResult {
    let service = global.open_service()?;
    let rules = service.list_alert_rules(&global.op_context(), args.org)?;
    print_json(&rules)
}
