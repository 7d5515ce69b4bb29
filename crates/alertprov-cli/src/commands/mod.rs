//! Subcommand implementations and the options they share

pub mod group;
pub mod rule;

use alertprov_core::logging_facility::{init, Profile};
use alertprov_core::AppConfig;
use alertprov_core_types::{OpContext, RequestId};
use alertprov_engine::SqliteAlertRuleService;
use alertprov_store::{SqliteRuleStore, SqliteTransactionManager};
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// TOML configuration file with [service] and [store] tables
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Database file (overrides store.path from the config file)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Abort the operation after this many milliseconds
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    /// Correlation id stamped on every log event (generated when absent)
    #[arg(long, global = true)]
    pub request_id: Option<String>,

    /// Emit human-readable debug logs on stderr
    #[arg(long, global = true, conflicts_with = "log_json")]
    pub verbose: bool,

    /// Emit JSON info logs on stderr
    #[arg(long, global = true)]
    pub log_json: bool,
}

impl GlobalArgs {
    fn load_config(&self) -> Result<AppConfig, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => AppConfig::load(path)?,
            None => AppConfig::default(),
        };
        if let Some(db) = &self.db {
            config.store.path = db.clone();
        }
        Ok(config)
    }

    /// Initialize logging and open the service on the configured database
    pub fn open_service(&self) -> Result<SqliteAlertRuleService, Box<dyn std::error::Error>> {
        if self.verbose {
            init(Profile::Development);
        } else if self.log_json {
            init(Profile::Production);
        }

        let config = self.load_config()?;
        let xact = SqliteTransactionManager::open(&config.store)?;
        Ok(SqliteAlertRuleService::new(
            xact,
            SqliteRuleStore::new(),
            config.service,
        )?)
    }

    pub fn op_context(&self) -> OpContext {
        let ctx = match &self.request_id {
            Some(id) => OpContext::with_request_id(RequestId::from_string(id.clone())),
            None => OpContext::new(),
        };
        match self.timeout_ms {
            Some(ms) => ctx.with_timeout(Duration::from_millis(ms)),
            None => ctx,
        }
    }
}

/// Print a value as pretty JSON on stdout
pub fn print_json<T: Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
