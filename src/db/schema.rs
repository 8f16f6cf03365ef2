//! Versioned schema migrations.

use std::collections::HashSet;

use anyhow::{Context, Result};
use rusqlite::Connection;

struct Migration {
    version: &'static str,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: "001",
        name: "initial",
        sql: include_str!("migrations/001_initial.sql"),
    },
    Migration {
        version: "002",
        name: "rig_variant",
        sql: include_str!("migrations/002_rig_variant.sql"),
    },
];

/// Brings the schema up to date. Safe to call on every start.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL
        )",
    )
    .context("Failed to create schema_migrations table")?;

    // Saves written before version tracking existed carry the 001 schema.
    if is_untracked_save(conn)? {
        mark_applied(conn, &MIGRATIONS[0])?;
        tracing::info!("Found an untracked world save, baselined at migration 001");
    }

    let applied = applied_versions(conn)?;
    for migration in MIGRATIONS.iter().filter(|m| !applied.contains(m.version)) {
        apply(conn, migration)?;
    }
    Ok(())
}

fn is_untracked_save(conn: &Connection) -> Result<bool> {
    let tracked: i64 =
        conn.query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| row.get(0))?;
    if tracked > 0 {
        return Ok(false);
    }

    let gates_table: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'gates'",
        [],
        |row| row.get(0),
    )?;
    Ok(gates_table > 0)
}

fn applied_versions(conn: &Connection) -> Result<HashSet<String>> {
    let mut stmt = conn.prepare("SELECT version FROM schema_migrations")?;
    let versions = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<HashSet<String>, _>>()?;
    Ok(versions)
}

fn mark_applied(conn: &Connection, migration: &Migration) -> Result<()> {
    conn.execute(
        "INSERT INTO schema_migrations (version, name, applied_at) VALUES (?, ?, ?)",
        (
            migration.version,
            migration.name,
            chrono::Utc::now().to_rfc3339(),
        ),
    )?;
    Ok(())
}

fn apply(conn: &Connection, migration: &Migration) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(migration.sql).with_context(|| {
        format!(
            "Failed to apply migration {} ({})",
            migration.version, migration.name
        )
    })?;
    mark_applied(&tx, migration)?;
    tx.commit()?;

    tracing::info!("Applied migration {} ({})", migration.version, migration.name);
    Ok(())
}
