//! Migration script discovery.
//!
//! Walks a directory recursively, reads every `.sql` file fully into memory,
//! and returns the scripts sorted lexicographically by name so the apply
//! order does not depend on filesystem walk order.

use crate::error::{StratumError, StratumResult};
use std::path::Path;

/// A single migration script: the filename and its raw SQL body.
///
/// The body is opaque to stratum and passed through to the database verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    pub name: String,
    pub sql: String,
}

/// Recursively discover `.sql` scripts under `dir`, sorted by name.
pub fn discover_scripts(dir: &Path) -> StratumResult<Vec<Migration>> {
    let mut scripts = Vec::new();
    walk_sql_files(dir, &mut scripts)?;
    scripts.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(scripts)
}

fn walk_sql_files(dir: &Path, scripts: &mut Vec<Migration>) -> StratumResult<()> {
    for entry in std::fs::read_dir(dir).map_err(|e| StratumError::Io {
        path: dir.display().to_string(),
        source: e,
    })? {
        let entry = entry.map_err(|e| StratumError::Io {
            path: dir.display().to_string(),
            source: e,
        })?;
        let path = entry.path();
        if path.is_dir() {
            walk_sql_files(&path, scripts)?;
            continue;
        }
        if !path.extension().is_some_and(|e| e == "sql") {
            continue;
        }
        let sql = std::fs::read_to_string(&path).map_err(|e| StratumError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        scripts.push(Migration {
            name: entry.file_name().to_string_lossy().into_owned(),
            sql,
        });
    }
    Ok(())
}

#[cfg(test)]
#[path = "script_test.rs"]
mod tests;
