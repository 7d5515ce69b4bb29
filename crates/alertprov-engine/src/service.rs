//! Alert rule service with boundary logging.
//!
//! Operations:
//! - Create, read and update alert rules under the provenance lattice
//! - Change the shared evaluation interval of a rule group
//! - Read a whole group, or every rule of an org
//!
//! ## Logging Ownership
//!
//! The service owns lifecycle logging for its operations:
//! - `log_op_start!` at entry
//! - `log_op_end!` on success
//! - `log_op_error!` on failure
//!
//! The store layer only emits `tracing::trace!()`/`debug!()` for internal details.

use alertprov_core::config::{ConfigError, ServiceConfig};
use alertprov_core::errors::{ProvisioningError, Result};
use alertprov_core::model::{AlertRule, Provenance, RuleGroupKey};
use alertprov_core::rules::{ensure_transition, validate_interval, validate_rule};
use alertprov_core::store::{ProvenanceStore, RuleStore, TransactionManager};
use alertprov_core::{log_op_end, log_op_error, log_op_start};
use alertprov_core_types::OpContext;
use serde::Serialize;
use std::time::Instant;

const OP_CREATE: &str = "create_alert_rule";
const OP_GET: &str = "get_alert_rule";
const OP_UPDATE: &str = "update_alert_rule";
const OP_UPDATE_GROUP: &str = "update_alert_group";
const OP_GET_GROUP: &str = "get_alert_rule_group";
const OP_LIST: &str = "list_alert_rules";

/// A stored rule together with the channel that manages it
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionedRule {
    #[serde(flatten)]
    pub rule: AlertRule,
    pub provenance: Provenance,
}

/// A rule group as read back from storage
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleGroup {
    #[serde(flatten)]
    pub key: RuleGroupKey,
    pub interval_seconds: i64,
    /// Members ordered by id
    pub rules: Vec<ProvisionedRule>,
}

/// Alert rule provisioning service
///
/// Holds no state between calls besides its collaborators and configuration.
pub struct AlertRuleService<M, S> {
    xact: M,
    store: S,
    config: ServiceConfig,
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

impl<M, S> AlertRuleService<M, S>
where
    M: TransactionManager,
    S: RuleStore<M> + ProvenanceStore<M>,
{
    /// Build a service over the given collaborators
    ///
    /// # Errors
    /// `ConfigError::Invalid` when the interval settings are inconsistent.
    pub fn new(xact: M, store: S, config: ServiceConfig) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            xact,
            store,
            config,
        })
    }

    /// Create a rule and record its provenance
    ///
    /// The stored interval is the group's current interval when the group
    /// already has members; otherwise the requested interval, or the
    /// configured default when none was requested.
    ///
    /// ## Errors
    ///
    /// - `Validation`: malformed rule, or uid already taken in the org
    /// - `Store`: persistence failure or interrupted context
    pub fn create_alert_rule(
        &self,
        ctx: &OpContext,
        rule: AlertRule,
        provenance: Provenance,
    ) -> Result<AlertRule> {
        log_op_start!(
            OP_CREATE,
            request_id = %ctx.request_id,
            org_id = rule.org_id,
            rule_group = %rule.rule_group,
            provenance = %provenance
        );
        let start = Instant::now();

        let stored = self.create_impl(ctx, rule, provenance).map_err(|e| {
            log_op_error!(
                OP_CREATE,
                e,
                duration_ms = elapsed_ms(start),
                request_id = %ctx.request_id
            );
            e
        })?;

        log_op_end!(
            OP_CREATE,
            duration_ms = elapsed_ms(start),
            request_id = %ctx.request_id,
            rule_uid = %stored.uid,
            interval_seconds = stored.interval_seconds
        );
        Ok(stored)
    }

    fn create_impl(
        &self,
        ctx: &OpContext,
        mut rule: AlertRule,
        provenance: Provenance,
    ) -> Result<AlertRule> {
        validate_rule(&rule, &self.config)?;

        let store = &self.store;
        let default_interval = self.config.default_interval_seconds;
        self.xact.run_in_transaction(ctx, move |tx| {
            let key = rule.group_key();
            rule.interval_seconds = match store.get_group_interval(tx, &key)? {
                Some(group_interval) => group_interval,
                None if rule.interval_seconds > 0 => rule.interval_seconds,
                None => default_interval,
            };

            let (_, uid) = store.insert_rule(tx, &rule)?;
            store.set_provenance(tx, rule.org_id, &uid, provenance)?;

            store
                .get_rule(tx, rule.org_id, &uid)?
                .ok_or_else(|| ProvisioningError::rule_not_found(rule.org_id, &uid))
        })
    }

    /// Read a rule and its provenance
    ///
    /// A rule without a recorded provenance reads as unmanaged.
    ///
    /// ## Errors
    ///
    /// - `NotFound`: no rule with this uid in the org
    pub fn get_alert_rule(
        &self,
        ctx: &OpContext,
        org_id: i64,
        uid: &str,
    ) -> Result<ProvisionedRule> {
        log_op_start!(OP_GET, request_id = %ctx.request_id, org_id = org_id, rule_uid = uid);
        let start = Instant::now();

        let store = &self.store;
        let found = self
            .xact
            .run_read_only(ctx, |tx| {
                let rule = store
                    .get_rule(tx, org_id, uid)?
                    .ok_or_else(|| ProvisioningError::rule_not_found(org_id, uid))?;
                let provenance = store.get_provenance(tx, org_id, uid)?.unwrap_or_default();
                Ok(ProvisionedRule { rule, provenance })
            })
            .map_err(|e| {
                log_op_error!(
                    OP_GET,
                    e,
                    duration_ms = elapsed_ms(start),
                    request_id = %ctx.request_id
                );
                e
            })?;

        log_op_end!(
            OP_GET,
            duration_ms = elapsed_ms(start),
            request_id = %ctx.request_id
        );
        Ok(found)
    }

    /// Replace a rule's definition and claim it for `provenance`
    ///
    /// The provenance check and both writes share one transaction, so either
    /// the new definition and provenance are both stored or nothing is.
    ///
    /// ## Errors
    ///
    /// - `Validation`: malformed definition
    /// - `NotFound`: no provenance (or no rule) recorded for the uid
    /// - `ProvenanceConflict`: the rule is managed by another channel
    /// - `Store`: persistence failure or interrupted context
    pub fn update_alert_rule(
        &self,
        ctx: &OpContext,
        rule: AlertRule,
        provenance: Provenance,
    ) -> Result<AlertRule> {
        log_op_start!(
            OP_UPDATE,
            request_id = %ctx.request_id,
            org_id = rule.org_id,
            rule_uid = %rule.uid,
            provenance = %provenance
        );
        let start = Instant::now();

        let stored = self.update_impl(ctx, rule, provenance).map_err(|e| {
            log_op_error!(
                OP_UPDATE,
                e,
                duration_ms = elapsed_ms(start),
                request_id = %ctx.request_id
            );
            e
        })?;

        log_op_end!(
            OP_UPDATE,
            duration_ms = elapsed_ms(start),
            request_id = %ctx.request_id,
            version = stored.version,
            interval_seconds = stored.interval_seconds
        );
        Ok(stored)
    }

    fn update_impl(
        &self,
        ctx: &OpContext,
        mut rule: AlertRule,
        provenance: Provenance,
    ) -> Result<AlertRule> {
        validate_rule(&rule, &self.config)?;

        let store = &self.store;
        let default_interval = self.config.default_interval_seconds;
        self.xact.run_in_transaction(ctx, move |tx| {
            let org_id = rule.org_id;
            let current = store
                .get_provenance(tx, org_id, &rule.uid)?
                .ok_or_else(|| ProvisioningError::provenance_not_found(org_id, &rule.uid))?;
            ensure_transition(org_id, &rule.uid, current, provenance)?;

            let existing = store
                .get_rule(tx, org_id, &rule.uid)?
                .ok_or_else(|| ProvisioningError::rule_not_found(org_id, &rule.uid))?;

            let key = rule.group_key();
            rule.id = existing.id;
            rule.interval_seconds = if existing.is_in_group(&key) {
                existing.interval_seconds
            } else {
                match store.get_group_interval(tx, &key)? {
                    Some(group_interval) => group_interval,
                    None if rule.interval_seconds > 0 => rule.interval_seconds,
                    None => default_interval,
                }
            };

            store.update_rule(tx, &rule)?;
            store.set_provenance(tx, org_id, &rule.uid, provenance)?;

            store
                .get_rule(tx, org_id, &rule.uid)?
                .ok_or_else(|| ProvisioningError::rule_not_found(org_id, &rule.uid))
        })
    }

    /// Set the evaluation interval of every rule in a group
    ///
    /// Returns the number of rules touched; an empty group touches none and
    /// still succeeds. Each touched rule's version is incremented.
    ///
    /// ## Errors
    ///
    /// - `Validation`: interval not a positive multiple of the base interval
    /// - `Store`: persistence failure or interrupted context
    pub fn update_alert_group(
        &self,
        ctx: &OpContext,
        key: &RuleGroupKey,
        interval_seconds: i64,
    ) -> Result<usize> {
        log_op_start!(
            OP_UPDATE_GROUP,
            request_id = %ctx.request_id,
            org_id = key.org_id,
            namespace_uid = %key.namespace_uid,
            rule_group = %key.rule_group,
            interval_seconds = interval_seconds
        );
        let start = Instant::now();

        let touched = self
            .update_group_impl(ctx, key, interval_seconds)
            .map_err(|e| {
                log_op_error!(
                    OP_UPDATE_GROUP,
                    e,
                    duration_ms = elapsed_ms(start),
                    request_id = %ctx.request_id
                );
                e
            })?;

        log_op_end!(
            OP_UPDATE_GROUP,
            duration_ms = elapsed_ms(start),
            request_id = %ctx.request_id,
            rows_affected = touched as u64
        );
        Ok(touched)
    }

    fn update_group_impl(
        &self,
        ctx: &OpContext,
        key: &RuleGroupKey,
        interval_seconds: i64,
    ) -> Result<usize> {
        validate_interval(interval_seconds, &self.config)?;

        let store = &self.store;
        self.xact.run_in_transaction(ctx, |tx| {
            let touched = store.update_group_interval(tx, key, interval_seconds)?;
            if touched == 0 {
                tracing::debug!(group = %key, "group has no members");
            }
            Ok(touched)
        })
    }

    /// Read a group's interval and members
    ///
    /// ## Errors
    ///
    /// - `NotFound`: the group has no members
    pub fn get_alert_rule_group(&self, ctx: &OpContext, key: &RuleGroupKey) -> Result<RuleGroup> {
        log_op_start!(
            OP_GET_GROUP,
            request_id = %ctx.request_id,
            org_id = key.org_id,
            namespace_uid = %key.namespace_uid,
            rule_group = %key.rule_group
        );
        let start = Instant::now();

        let store = &self.store;
        let group = self
            .xact
            .run_read_only(ctx, |tx| {
                let members = store.list_group_rules(tx, key)?;
                let interval_seconds = members
                    .first()
                    .map(|rule| rule.interval_seconds)
                    .ok_or_else(|| ProvisioningError::NotFound {
                        entity: "rule group",
                        key: key.to_string(),
                    })?;

                let mut rules = Vec::with_capacity(members.len());
                for rule in members {
                    let provenance = store
                        .get_provenance(tx, rule.org_id, &rule.uid)?
                        .unwrap_or_default();
                    rules.push(ProvisionedRule { rule, provenance });
                }

                Ok(RuleGroup {
                    key: key.clone(),
                    interval_seconds,
                    rules,
                })
            })
            .map_err(|e| {
                log_op_error!(
                    OP_GET_GROUP,
                    e,
                    duration_ms = elapsed_ms(start),
                    request_id = %ctx.request_id
                );
                e
            })?;

        log_op_end!(
            OP_GET_GROUP,
            duration_ms = elapsed_ms(start),
            request_id = %ctx.request_id,
            rows_affected = group.rules.len() as u64
        );
        Ok(group)
    }

    /// Every rule of an org with its provenance, ordered by id
    pub fn list_alert_rules(&self, ctx: &OpContext, org_id: i64) -> Result<Vec<ProvisionedRule>> {
        log_op_start!(OP_LIST, request_id = %ctx.request_id, org_id = org_id);
        let start = Instant::now();

        let store = &self.store;
        let listed = self
            .xact
            .run_read_only(ctx, |tx| {
                store
                    .list_org_rules(tx, org_id)?
                    .into_iter()
                    .map(|rule| {
                        let provenance = store
                            .get_provenance(tx, org_id, &rule.uid)?
                            .unwrap_or_default();
                        Ok(ProvisionedRule { rule, provenance })
                    })
                    .collect::<Result<Vec<_>>>()
            })
            .map_err(|e| {
                log_op_error!(
                    OP_LIST,
                    e,
                    duration_ms = elapsed_ms(start),
                    request_id = %ctx.request_id
                );
                e
            })?;

        log_op_end!(
            OP_LIST,
            duration_ms = elapsed_ms(start),
            request_id = %ctx.request_id,
            rows_affected = listed.len() as u64
        );
        Ok(listed)
    }
}
