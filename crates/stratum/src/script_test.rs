//! Tests for migration script discovery.

use super::*;
use crate::error::StratumError;
use std::fs;
use std::path::Path;

/// Write `content` at `rel` under `dir`, creating parent directories.
fn write(dir: &Path, rel: &str, content: &str) {
    let path = dir.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn names(scripts: &[Migration]) -> Vec<&str> {
    scripts.iter().map(|s| s.name.as_str()).collect()
}

#[test]
fn discovers_sql_files_sorted_by_name() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "002_seed.sql", "INSERT INTO users VALUES (1);");
    write(dir.path(), "001_init.sql", "CREATE TABLE users (id INTEGER);");
    write(dir.path(), "010_extra.sql", "SELECT 1;");

    let scripts = discover_scripts(dir.path()).unwrap();
    assert_eq!(
        names(&scripts),
        ["001_init.sql", "002_seed.sql", "010_extra.sql"]
    );
}

#[test]
fn walks_nested_directories() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "sub/002_seed.sql", "SELECT 2;");
    write(dir.path(), "001_init.sql", "SELECT 1;");
    write(dir.path(), "sub/deeper/003_more.sql", "SELECT 3;");

    let scripts = discover_scripts(dir.path()).unwrap();
    assert_eq!(
        names(&scripts),
        ["001_init.sql", "002_seed.sql", "003_more.sql"],
        "order is by name, not by directory depth"
    );
}

#[test]
fn ignores_non_sql_files() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "001_init.sql", "SELECT 1;");
    write(dir.path(), "README.md", "not a migration");
    write(dir.path(), "001_init.sql.bak", "stale copy");
    write(dir.path(), "notes.txt", "scratch");

    let scripts = discover_scripts(dir.path()).unwrap();
    assert_eq!(names(&scripts), ["001_init.sql"]);
}

#[test]
fn reads_script_content_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    let body = "CREATE TABLE t (id INTEGER);\n-- trailing comment\n";
    write(dir.path(), "001_init.sql", body);

    let scripts = discover_scripts(dir.path()).unwrap();
    assert_eq!(scripts[0].sql, body);
}

#[test]
fn empty_directory_yields_no_scripts() {
    let dir = tempfile::tempdir().unwrap();
    let scripts = discover_scripts(dir.path()).unwrap();
    assert!(scripts.is_empty());
}

#[test]
fn missing_directory_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("does_not_exist");
    match discover_scripts(&missing) {
        Err(StratumError::Io { path, .. }) => assert!(path.contains("does_not_exist")),
        other => panic!("expected Io error, got {other:?}"),
    }
}
