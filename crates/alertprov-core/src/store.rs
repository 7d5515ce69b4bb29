//! Collaborator contracts consumed by the alert rule service
//!
//! Store calls take an explicit transaction handle (`M::Tx`) obtained from a
//! `TransactionManager`; a store can only be reached from inside a unit of
//! work, so every atomicity boundary is visible at the call site.

use crate::errors::Result;
use crate::model::{AlertRule, Provenance, RuleGroupKey};
use alertprov_core_types::OpContext;

/// Runs units of work atomically
pub trait TransactionManager {
    /// Transaction-scoped handle passed to store calls
    type Tx<'t>;

    /// Run `f` inside one transaction
    ///
    /// Commits when `f` returns `Ok`; rolls back when it returns `Err`,
    /// panics, or when `ctx` is cancelled or expires. Returns `f`'s error
    /// unchanged, or a `Store` error raised by the transaction layer.
    fn run_in_transaction<T, F>(&self, ctx: &OpContext, f: F) -> Result<T>
    where
        F: for<'t> FnOnce(&Self::Tx<'t>) -> Result<T>;

    /// Run a unit of work that only reads
    ///
    /// Same guarantees as `run_in_transaction`, but the manager may skip
    /// taking its write lock. `f` sees one consistent snapshot.
    fn run_read_only<T, F>(&self, ctx: &OpContext, f: F) -> Result<T>
    where
        F: for<'t> FnOnce(&Self::Tx<'t>) -> Result<T>,
    {
        self.run_in_transaction(ctx, f)
    }
}

/// Persistence of alert rule records
pub trait RuleStore<M: TransactionManager> {
    /// Insert a new rule with `version = 1`
    ///
    /// Generates a uid when `rule.uid` is empty. Returns the assigned id
    /// and uid.
    fn insert_rule(&self, tx: &M::Tx<'_>, rule: &AlertRule) -> Result<(i64, String)>;

    /// Fetch a rule by org and uid; `None` when absent
    fn get_rule(&self, tx: &M::Tx<'_>, org_id: i64, uid: &str) -> Result<Option<AlertRule>>;

    /// Overwrite a rule's definition, incrementing its version
    ///
    /// Returns the new version. Fails with `NotFound` when the rule is absent.
    fn update_rule(&self, tx: &M::Tx<'_>, rule: &AlertRule) -> Result<i64>;

    /// Current interval of a group; `None` when the group has no members
    fn get_group_interval(&self, tx: &M::Tx<'_>, key: &RuleGroupKey) -> Result<Option<i64>>;

    /// Set the interval of every member of a group
    ///
    /// Returns the number of rules touched (0 for an empty group).
    fn update_group_interval(
        &self,
        tx: &M::Tx<'_>,
        key: &RuleGroupKey,
        interval_seconds: i64,
    ) -> Result<usize>;

    /// Members of a group ordered by id
    fn list_group_rules(&self, tx: &M::Tx<'_>, key: &RuleGroupKey) -> Result<Vec<AlertRule>>;

    /// Every rule of an org ordered by id
    fn list_org_rules(&self, tx: &M::Tx<'_>, org_id: i64) -> Result<Vec<AlertRule>>;
}

/// Persistence of provenance tags
pub trait ProvenanceStore<M: TransactionManager> {
    /// Provenance of a rule; `None` when no tag was recorded
    fn get_provenance(&self, tx: &M::Tx<'_>, org_id: i64, uid: &str)
        -> Result<Option<Provenance>>;

    /// Record (or overwrite) the provenance of a rule
    fn set_provenance(
        &self,
        tx: &M::Tx<'_>,
        org_id: i64,
        uid: &str,
        provenance: Provenance,
    ) -> Result<()>;
}
