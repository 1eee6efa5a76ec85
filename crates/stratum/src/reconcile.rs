//! Migration-state reconciliation.
//!
//! Linear pipeline: ensure the bookkeeping table exists, discover scripts,
//! load the applied set, compute the pending difference, apply each pending
//! script in order, then report the most recently applied migration. The
//! whole pass is expected to run inside a transaction the caller has already
//! opened on `conn`; this module never issues BEGIN, COMMIT, or ROLLBACK.

use crate::error::{StratumError, StratumResult};
use crate::script::{discover_scripts, Migration};
use duckdb::Connection;
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

/// DDL for the bookkeeping table. DuckDB has no SERIAL; a sequence feeding
/// the id default is the equivalent. UNIQUE(name) enforces the exactly-once
/// invariant in the database itself.
const BOOKKEEPING_DDL: &str = "CREATE SEQUENCE IF NOT EXISTS migrations_id_seq;
CREATE TABLE IF NOT EXISTS migrations (
    id         INTEGER PRIMARY KEY DEFAULT nextval('migrations_id_seq'),
    name       VARCHAR(255) NOT NULL UNIQUE,
    applied_at TIMESTAMP NOT NULL DEFAULT now()
);";

/// One row of the bookkeeping table, timestamp rendered as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedRecord {
    pub id: i32,
    pub name: String,
    pub applied_at: String,
}

/// The most recently applied migration, reported after a reconcile run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub name: String,
    pub id: i32,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Latest migration: {} ({})", self.name, self.id)
    }
}

/// Ensure the `migrations` bookkeeping table (and its id sequence) exist.
///
/// Idempotent: safe to call on every run.
pub fn ensure_bookkeeping_table(conn: &Connection) -> StratumResult<()> {
    conn.execute_batch(BOOKKEEPING_DDL)
        .map_err(|e| StratumError::Schema(format!("failed to create migrations table: {e}")))?;
    Ok(())
}

/// Read the set of already-applied migration names.
///
/// Only names are stored for applied records; script bodies are not
/// re-verified against their recorded state.
pub fn load_applied(conn: &Connection) -> StratumResult<HashSet<String>> {
    let mut stmt = conn
        .prepare("SELECT name FROM migrations")
        .map_err(|e| StratumError::Query(format!("failed to read applied migrations: {e}")))?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .map_err(|e| StratumError::Query(format!("failed to read applied migrations: {e}")))?;

    let mut applied = HashSet::new();
    for name in rows {
        let name = name
            .map_err(|e| StratumError::Query(format!("failed to read applied migrations: {e}")))?;
        applied.insert(name);
    }
    Ok(applied)
}

/// Order-preserving set difference: discovered scripts whose names are not in
/// the applied set.
pub fn compute_pending(discovered: Vec<Migration>, applied: &HashSet<String>) -> Vec<Migration> {
    discovered
        .into_iter()
        .filter(|script| !applied.contains(&script.name))
        .collect()
}

/// Execute one script's SQL body and record it in the bookkeeping table.
///
/// Both statements run on the caller's connection; inside a transaction a
/// failure of either leaves no partial effect once the caller rolls back.
/// `applied_at` comes from the column default.
pub fn apply(script: &Migration, conn: &Connection) -> StratumResult<()> {
    conn.execute_batch(&script.sql)
        .map_err(|e| StratumError::Execution {
            name: script.name.clone(),
            message: e.to_string(),
        })?;

    let rows = conn
        .execute(
            "INSERT INTO migrations (name) VALUES (?)",
            duckdb::params![script.name],
        )
        .map_err(|e| StratumError::Execution {
            name: script.name.clone(),
            message: format!("bookkeeping insert failed: {e}"),
        })?;
    if rows != 1 {
        return Err(StratumError::Consistency {
            name: script.name.clone(),
            rows,
        });
    }
    Ok(())
}

/// Run the full reconciliation pass against `conn`.
///
/// Applies every discovered script not yet recorded as applied, in name
/// order, stopping at the first failure. Returns the most recently applied
/// migration, or `None` when the bookkeeping table is empty after the run.
pub fn reconcile(dir: &Path, conn: &Connection) -> StratumResult<Option<Report>> {
    ensure_bookkeeping_table(conn)?;

    let discovered = discover_scripts(dir)?;
    let applied = load_applied(conn)?;
    let pending = compute_pending(discovered, &applied);

    for script in &pending {
        log::debug!("Applying migration {}", script.name);
        apply(script, conn)?;
    }

    let latest = latest_applied(conn)?;
    if let Some(report) = &latest {
        log::info!("{report}");
    }
    Ok(latest)
}

/// Dry run: the names `reconcile` would apply, without applying them.
pub fn pending_scripts(dir: &Path, conn: &Connection) -> StratumResult<Vec<String>> {
    ensure_bookkeeping_table(conn)?;
    let discovered = discover_scripts(dir)?;
    let applied = load_applied(conn)?;
    Ok(compute_pending(discovered, &applied)
        .into_iter()
        .map(|script| script.name)
        .collect())
}

/// Full bookkeeping contents in application order.
pub fn applied_history(conn: &Connection) -> StratumResult<Vec<AppliedRecord>> {
    let mut stmt = conn
        .prepare("SELECT id, name, CAST(applied_at AS VARCHAR) FROM migrations ORDER BY id")
        .map_err(|e| StratumError::Query(format!("failed to read migration history: {e}")))?;
    let rows = stmt
        .query_map([], |row| {
            Ok(AppliedRecord {
                id: row.get(0)?,
                name: row.get(1)?,
                applied_at: row.get(2)?,
            })
        })
        .map_err(|e| StratumError::Query(format!("failed to read migration history: {e}")))?;

    let mut history = Vec::new();
    for record in rows {
        history.push(
            record
                .map_err(|e| StratumError::Query(format!("failed to read migration history: {e}")))?,
        );
    }
    Ok(history)
}

/// Highest-id row of the bookkeeping table, or `None` on a fresh database.
fn latest_applied(conn: &Connection) -> StratumResult<Option<Report>> {
    let latest = conn.query_row(
        "SELECT id, name FROM migrations ORDER BY id DESC LIMIT 1",
        [],
        |row| {
            Ok(Report {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        },
    );
    match latest {
        Ok(report) => Ok(Some(report)),
        Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(StratumError::Query(format!(
            "failed to read latest migration: {e}"
        ))),
    }
}

#[cfg(test)]
#[path = "reconcile_test.rs"]
mod tests;
