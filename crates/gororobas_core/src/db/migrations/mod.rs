//! Entity store schema migrations.
//!
//! `0001_entities` creates one table per entity kind with one column per
//! declared field. `0002_note_author_index` adds the lookups the note
//! listing needs (by author, newest published first).
//!
//! Versions are strictly increasing and every pending script runs in one
//! transaction together with its `user_version` bump.

use crate::db::{DbError, DbResult};
use log::{error, info};
use rusqlite::{Connection, Transaction};

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "entities",
        sql: include_str!("0001_entities.sql"),
    },
    Migration {
        version: 2,
        name: "note_author_index",
        sql: include_str!("0002_note_author_index.sql"),
    },
];

/// Schema version this build writes.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Brings the entity tables up to `latest_version()`.
///
/// Refuses databases from a newer build instead of guessing at their
/// columns.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let from = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    let latest = latest_version();
    if from > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: from,
            latest_supported: latest,
        });
    }

    let pending: Vec<&Migration> = MIGRATIONS
        .iter()
        .filter(|migration| migration.version > from)
        .collect();
    if pending.is_empty() {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for migration in pending {
        run_one(&tx, migration)?;
    }
    tx.commit()?;
    info!("event=db_migrate module=db status=ok from={from} to={latest}");
    Ok(())
}

fn run_one(tx: &Transaction<'_>, migration: &Migration) -> DbResult<()> {
    let script = format!(
        "{}\nPRAGMA user_version = {};",
        migration.sql, migration.version
    );
    tx.execute_batch(&script).map_err(|source| {
        error!(
            "event=db_migrate module=db status=error version={} name={} error={source}",
            migration.version, migration.name
        );
        DbError::Migration {
            version: migration.version,
            name: migration.name,
            source,
        }
    })
}
