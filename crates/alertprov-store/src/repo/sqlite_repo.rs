//! SQLite repository implementation
//!
//! Persists alert rules and their provenance tags. Every call runs on the
//! handle of an open `SqliteTx`, so writes only become visible when the
//! surrounding unit of work commits.

use crate::errors::{corrupt, is_constraint_violation, Result};
use crate::transaction::{SqliteTransactionManager, SqliteTx};
use alertprov_core::errors::{ProvisioningError, ValidationError};
use alertprov_core::model::{
    AlertQuery, AlertRule, ExecErrState, NoDataState, Provenance, RuleGroupKey,
};
use alertprov_core::store::{ProvenanceStore, RuleStore};
use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, Row};
use std::collections::BTreeMap;
use std::time::Duration;
use uuid::Uuid;

/// Record type under which rule provenance is filed
const RECORD_TYPE_ALERT_RULE: &str = "alertRule";

const RULE_COLUMNS: &str = "id, org_id, uid, title, condition, data, interval_seconds, version, \
     namespace_uid, rule_group, no_data_state, exec_err_state, for_seconds, labels, \
     annotations, dashboard_uid, panel_id, updated";

/// SQLite repository for alert rules and provenance
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteRuleStore;

impl SqliteRuleStore {
    pub fn new() -> Self {
        Self
    }
}

/// A rule row as stored, before decoding
struct RuleRow {
    id: i64,
    org_id: i64,
    uid: String,
    title: String,
    condition: String,
    data: String,
    interval_seconds: i64,
    version: i64,
    namespace_uid: String,
    rule_group: String,
    no_data_state: String,
    exec_err_state: String,
    for_seconds: i64,
    labels: String,
    annotations: String,
    dashboard_uid: Option<String>,
    panel_id: Option<i64>,
    updated: i64,
}

impl RuleRow {
    /// Read a row selected with `RULE_COLUMNS`
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            org_id: row.get(1)?,
            uid: row.get(2)?,
            title: row.get(3)?,
            condition: row.get(4)?,
            data: row.get(5)?,
            interval_seconds: row.get(6)?,
            version: row.get(7)?,
            namespace_uid: row.get(8)?,
            rule_group: row.get(9)?,
            no_data_state: row.get(10)?,
            exec_err_state: row.get(11)?,
            for_seconds: row.get(12)?,
            labels: row.get(13)?,
            annotations: row.get(14)?,
            dashboard_uid: row.get(15)?,
            panel_id: row.get(16)?,
            updated: row.get(17)?,
        })
    }

    fn into_rule(self, op: &str) -> Result<AlertRule> {
        let data: Vec<AlertQuery> = serde_json::from_str(&self.data)
            .map_err(|e| corrupt(op, format!("rule {} data: {}", self.uid, e)))?;
        let labels: BTreeMap<String, String> = serde_json::from_str(&self.labels)
            .map_err(|e| corrupt(op, format!("rule {} labels: {}", self.uid, e)))?;
        let annotations: BTreeMap<String, String> = serde_json::from_str(&self.annotations)
            .map_err(|e| corrupt(op, format!("rule {} annotations: {}", self.uid, e)))?;

        let no_data_state = NoDataState::from_stored(&self.no_data_state).ok_or_else(|| {
            corrupt(
                op,
                format!("rule {} no_data_state '{}'", self.uid, self.no_data_state),
            )
        })?;
        let exec_err_state = ExecErrState::from_stored(&self.exec_err_state).ok_or_else(|| {
            corrupt(
                op,
                format!("rule {} exec_err_state '{}'", self.uid, self.exec_err_state),
            )
        })?;

        let for_seconds = u64::try_from(self.for_seconds).map_err(|_| {
            corrupt(
                op,
                format!("rule {} for_seconds {}", self.uid, self.for_seconds),
            )
        })?;
        let updated = DateTime::<Utc>::from_timestamp_millis(self.updated)
            .ok_or_else(|| corrupt(op, format!("rule {} updated {}", self.uid, self.updated)))?;

        Ok(AlertRule {
            id: self.id,
            org_id: self.org_id,
            uid: self.uid,
            title: self.title,
            condition: self.condition,
            data,
            interval_seconds: self.interval_seconds,
            version: self.version,
            namespace_uid: self.namespace_uid,
            rule_group: self.rule_group,
            no_data_state,
            exec_err_state,
            for_duration: Duration::from_secs(for_seconds),
            labels,
            annotations,
            dashboard_uid: self.dashboard_uid,
            panel_id: self.panel_id,
            updated,
        })
    }
}

/// JSON-encoded columns of a rule
struct EncodedRule {
    data: String,
    labels: String,
    annotations: String,
    for_seconds: i64,
}

fn encode(op: &str, rule: &AlertRule) -> Result<EncodedRule> {
    let encode_err = |e: serde_json::Error| corrupt(op, format!("cannot encode rule: {}", e));
    Ok(EncodedRule {
        data: serde_json::to_string(&rule.data).map_err(encode_err)?,
        labels: serde_json::to_string(&rule.labels).map_err(encode_err)?,
        annotations: serde_json::to_string(&rule.annotations).map_err(encode_err)?,
        for_seconds: i64::try_from(rule.for_duration.as_secs())
            .map_err(|_| corrupt(op, "for duration out of range"))?,
    })
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

fn query_rules(
    tx: &SqliteTx<'_>,
    op: &str,
    sql: &str,
    params: impl rusqlite::Params,
) -> Result<Vec<AlertRule>> {
    let conn = tx.conn(op)?;
    let mut stmt = conn.prepare(sql).map_err(|e| tx.fail(op, e))?;
    let rows = stmt
        .query_map(params, RuleRow::read)
        .map_err(|e| tx.fail(op, e))?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(|e| tx.fail(op, e))?;

    rows.into_iter().map(|row| row.into_rule(op)).collect()
}

impl RuleStore<SqliteTransactionManager> for SqliteRuleStore {
    fn insert_rule(&self, tx: &SqliteTx<'_>, rule: &AlertRule) -> Result<(i64, String)> {
        const OP: &str = "insert_rule";
        let uid = if rule.uid.is_empty() {
            Uuid::now_v7().to_string()
        } else {
            rule.uid.clone()
        };
        let encoded = encode(OP, rule)?;

        let result = tx.conn(OP)?.execute(
            "INSERT INTO alert_rules (org_id, uid, title, condition, data, interval_seconds,
                version, namespace_uid, rule_group, no_data_state, exec_err_state, for_seconds,
                labels, annotations, dashboard_uid, panel_id, updated)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
            rusqlite::params![
                rule.org_id,
                uid,
                rule.title,
                rule.condition,
                encoded.data,
                rule.interval_seconds,
                rule.namespace_uid,
                rule.rule_group,
                rule.no_data_state.as_str(),
                rule.exec_err_state.as_str(),
                encoded.for_seconds,
                encoded.labels,
                encoded.annotations,
                rule.dashboard_uid,
                rule.panel_id,
                now_millis(),
            ],
        );

        match result {
            Ok(_) => {}
            Err(e) if is_constraint_violation(&e) && tx.ctx().interruption().is_none() => {
                return Err(ValidationError::UidTaken {
                    org_id: rule.org_id,
                    uid,
                }
                .into());
            }
            Err(e) => return Err(tx.fail(OP, e)),
        }

        let id = tx.conn(OP)?.last_insert_rowid();
        Ok((id, uid))
    }

    fn get_rule(&self, tx: &SqliteTx<'_>, org_id: i64, uid: &str) -> Result<Option<AlertRule>> {
        const OP: &str = "get_rule";
        let sql = format!(
            "SELECT {} FROM alert_rules WHERE org_id = ?1 AND uid = ?2",
            RULE_COLUMNS
        );
        let row = tx
            .conn(OP)?
            .query_row(&sql, rusqlite::params![org_id, uid], RuleRow::read)
            .optional()
            .map_err(|e| tx.fail(OP, e))?;

        row.map(|row| row.into_rule(OP)).transpose()
    }

    fn update_rule(&self, tx: &SqliteTx<'_>, rule: &AlertRule) -> Result<i64> {
        const OP: &str = "update_rule";
        let encoded = encode(OP, rule)?;

        let version: Option<i64> = tx
            .conn(OP)?
            .query_row(
                "UPDATE alert_rules SET
                    title = ?3,
                    condition = ?4,
                    data = ?5,
                    interval_seconds = ?6,
                    namespace_uid = ?7,
                    rule_group = ?8,
                    no_data_state = ?9,
                    exec_err_state = ?10,
                    for_seconds = ?11,
                    labels = ?12,
                    annotations = ?13,
                    dashboard_uid = ?14,
                    panel_id = ?15,
                    updated = ?16,
                    version = version + 1
                 WHERE org_id = ?1 AND uid = ?2
                 RETURNING version",
                rusqlite::params![
                    rule.org_id,
                    rule.uid,
                    rule.title,
                    rule.condition,
                    encoded.data,
                    rule.interval_seconds,
                    rule.namespace_uid,
                    rule.rule_group,
                    rule.no_data_state.as_str(),
                    rule.exec_err_state.as_str(),
                    encoded.for_seconds,
                    encoded.labels,
                    encoded.annotations,
                    rule.dashboard_uid,
                    rule.panel_id,
                    now_millis(),
                ],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| tx.fail(OP, e))?;

        version.ok_or_else(|| ProvisioningError::rule_not_found(rule.org_id, &rule.uid))
    }

    fn get_group_interval(&self, tx: &SqliteTx<'_>, key: &RuleGroupKey) -> Result<Option<i64>> {
        const OP: &str = "get_group_interval";
        tx.conn(OP)?
            .query_row(
                "SELECT interval_seconds FROM alert_rules
                 WHERE org_id = ?1 AND namespace_uid = ?2 AND rule_group = ?3
                 ORDER BY id LIMIT 1",
                rusqlite::params![key.org_id, key.namespace_uid, key.rule_group],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| tx.fail(OP, e))
    }

    fn update_group_interval(
        &self,
        tx: &SqliteTx<'_>,
        key: &RuleGroupKey,
        interval_seconds: i64,
    ) -> Result<usize> {
        const OP: &str = "update_group_interval";
        tx.conn(OP)?
            .execute(
                "UPDATE alert_rules
                 SET interval_seconds = ?4, version = version + 1, updated = ?5
                 WHERE org_id = ?1 AND namespace_uid = ?2 AND rule_group = ?3",
                rusqlite::params![
                    key.org_id,
                    key.namespace_uid,
                    key.rule_group,
                    interval_seconds,
                    now_millis(),
                ],
            )
            .map_err(|e| tx.fail(OP, e))
    }

    fn list_group_rules(&self, tx: &SqliteTx<'_>, key: &RuleGroupKey) -> Result<Vec<AlertRule>> {
        let sql = format!(
            "SELECT {} FROM alert_rules
             WHERE org_id = ?1 AND namespace_uid = ?2 AND rule_group = ?3
             ORDER BY id",
            RULE_COLUMNS
        );
        query_rules(
            tx,
            "list_group_rules",
            &sql,
            rusqlite::params![key.org_id, key.namespace_uid, key.rule_group],
        )
    }

    fn list_org_rules(&self, tx: &SqliteTx<'_>, org_id: i64) -> Result<Vec<AlertRule>> {
        let sql = format!(
            "SELECT {} FROM alert_rules WHERE org_id = ?1 ORDER BY id",
            RULE_COLUMNS
        );
        query_rules(tx, "list_org_rules", &sql, rusqlite::params![org_id])
    }
}

impl ProvenanceStore<SqliteTransactionManager> for SqliteRuleStore {
    fn get_provenance(
        &self,
        tx: &SqliteTx<'_>,
        org_id: i64,
        uid: &str,
    ) -> Result<Option<Provenance>> {
        const OP: &str = "get_provenance";
        let stored: Option<String> = tx
            .conn(OP)?
            .query_row(
                "SELECT provenance FROM provenance_type
                 WHERE record_type = ?1 AND record_key = ?2 AND org_id = ?3",
                rusqlite::params![RECORD_TYPE_ALERT_RULE, uid, org_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| tx.fail(OP, e))?;

        stored
            .map(|value| {
                Provenance::from_stored(&value).ok_or_else(|| {
                    corrupt(OP, format!("rule {} provenance '{}'", uid, value))
                })
            })
            .transpose()
    }

    fn set_provenance(
        &self,
        tx: &SqliteTx<'_>,
        org_id: i64,
        uid: &str,
        provenance: Provenance,
    ) -> Result<()> {
        const OP: &str = "set_provenance";
        tx.conn(OP)?
            .execute(
                "INSERT INTO provenance_type (org_id, record_key, record_type, provenance)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(record_type, record_key, org_id) DO UPDATE SET
                    provenance = excluded.provenance",
                rusqlite::params![org_id, uid, RECORD_TYPE_ALERT_RULE, provenance.as_str()],
            )
            .map_err(|e| tx.fail(OP, e))?;

        Ok(())
    }
}
