//! SQLite transaction manager
//!
//! Every writing unit of work runs under `BEGIN IMMEDIATE`, which takes the
//! database write lock up front. Two writers that read-then-write the same
//! rule group are therefore serialized even across processes sharing the
//! database file. Read-only units use a deferred transaction, which under WAL
//! reads one snapshot without waiting for writers.
//!
//! While a unit of work runs, a progress handler polls the caller's
//! `OpContext` and interrupts the running statement once it is cancelled or
//! past its deadline; the transaction is then rolled back.

use crate::db;
use crate::errors::{classify, ensure_live, from_rusqlite, Result};
use crate::migrations::apply_migrations;
use alertprov_core::config::StoreConfig;
use alertprov_core::store::TransactionManager;
use alertprov_core_types::OpContext;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::sync::{Mutex, PoisonError};

/// SQLite VM steps between cancellation polls
const PROGRESS_OPS: i32 = 1_000;

/// Transaction-scoped handle given to store calls
pub struct SqliteTx<'t> {
    tx: Transaction<'t>,
    ctx: OpContext,
}

impl SqliteTx<'_> {
    /// Connection for the next statement, if the context is still live
    pub fn conn(&self, op: &str) -> Result<&Connection> {
        ensure_live(&self.ctx, op)?;
        Ok(&*self.tx)
    }

    /// Context of the unit of work
    pub fn ctx(&self) -> &OpContext {
        &self.ctx
    }

    /// Classify a failed statement of this unit of work
    pub fn fail(&self, op: &str, err: rusqlite::Error) -> alertprov_core::ProvisioningError {
        classify(&self.ctx, op, err)
    }
}

/// Transaction manager owning one SQLite connection
///
/// Units of work on the same manager run one at a time. Separate managers
/// opened on the same file are serialized by SQLite's write lock.
pub struct SqliteTransactionManager {
    conn: Mutex<Connection>,
}

impl SqliteTransactionManager {
    /// Wrap an already configured and migrated connection
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Open the database file named by `config`, then configure and migrate it
    pub fn open(config: &StoreConfig) -> Result<Self> {
        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    alertprov_core::StoreError::Database {
                        op: "open".to_string(),
                        message: format!("cannot create {}: {}", parent.display(), e),
                    }
                })?;
            }
        }
        let mut conn = db::open(&config.path)?;
        db::configure(&conn, config)?;
        apply_migrations(&mut conn)?;
        Ok(Self::new(conn))
    }

    /// Open a private in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let mut conn = db::open_in_memory()?;
        db::configure(&conn, &StoreConfig::default())?;
        apply_migrations(&mut conn)?;
        Ok(Self::new(conn))
    }
}

impl SqliteTransactionManager {
    fn run_with<T, F>(&self, ctx: &OpContext, behavior: TransactionBehavior, f: F) -> Result<T>
    where
        F: for<'t> FnOnce(&SqliteTx<'t>) -> Result<T>,
    {
        ensure_live(ctx, "begin")?;

        // A panic inside an earlier unit of work rolled its transaction back
        // on unwind; the connection itself is still usable.
        let mut conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);

        let probe = ctx.interrupt_probe();
        conn.progress_handler(PROGRESS_OPS, Some(move || probe.is_tripped()));
        let outcome = run_unit(&mut conn, ctx, behavior, f);
        conn.progress_handler(PROGRESS_OPS, None::<fn() -> bool>);

        outcome
    }
}

impl TransactionManager for SqliteTransactionManager {
    type Tx<'t> = SqliteTx<'t>;

    fn run_in_transaction<T, F>(&self, ctx: &OpContext, f: F) -> Result<T>
    where
        F: for<'t> FnOnce(&Self::Tx<'t>) -> Result<T>,
    {
        self.run_with(ctx, TransactionBehavior::Immediate, f)
    }

    fn run_read_only<T, F>(&self, ctx: &OpContext, f: F) -> Result<T>
    where
        F: for<'t> FnOnce(&Self::Tx<'t>) -> Result<T>,
    {
        self.run_with(ctx, TransactionBehavior::Deferred, f)
    }
}

fn run_unit<T, F>(
    conn: &mut Connection,
    ctx: &OpContext,
    behavior: TransactionBehavior,
    f: F,
) -> Result<T>
where
    F: for<'t> FnOnce(&SqliteTx<'t>) -> Result<T>,
{
    let tx = conn
        .transaction_with_behavior(behavior)
        .map_err(|e| classify(ctx, "begin", e))?;
    let handle = SqliteTx {
        tx,
        ctx: ctx.clone(),
    };
    tracing::trace!(request_id = %ctx.request_id, "transaction begun");

    let value = match f(&handle) {
        Ok(value) => value,
        Err(err) => {
            if let Err(rollback_err) = handle.tx.rollback() {
                // SQLite may already have rolled back after an interrupt.
                tracing::debug!(
                    request_id = %ctx.request_id,
                    error = %from_rusqlite("rollback", rollback_err),
                    "explicit rollback failed"
                );
            }
            return Err(err);
        }
    };

    ensure_live(ctx, "commit")?;
    handle
        .tx
        .commit()
        .map_err(|e| classify(ctx, "commit", e))?;
    tracing::trace!(request_id = %ctx.request_id, "transaction committed");

    Ok(value)
}
