//! Entity repository and SQLite store client.
//!
//! # Responsibility
//! - Read and insert storage records for every entity kind.
//! - Apply change-sets as field-level partial updates and bulk deletions.
//!
//! # Invariants
//! - Column names always come from declared field specs, never from input.
//! - A partial update touches exactly the columns in the change-set plus
//!   `updated_at`.
//! - A bulk delete is one statement inside one transaction.
//! - Read paths reject persisted values of the wrong shape instead of
//!   masking them.

use crate::changeset::ChangeSet;
use crate::db::DbError;
use crate::model::document::Document;
use crate::model::field::{EntityId, EntityKind, FieldValue, StorageRecord};
use crate::mutation::{StoreClient, StoreError};
use crate::schema::{declared_fields, FieldKind, FieldSpec};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Row, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for entity persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound(EntityId),
    InvalidData(String),
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "entity not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid entity data: {message}"),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "missing required column `{table}.{column}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<RepoError> for StoreError {
    fn from(value: RepoError) -> Self {
        StoreError::new(value.to_string())
    }
}

/// Read/insert contract over persisted entities.
pub trait EntityRepository {
    /// Inserts one record; fields it does not carry are stored as `NULL`.
    fn insert_record(&self, record: &StorageRecord) -> RepoResult<()>;
    /// Loads one record with every declared field present.
    fn get_record(&self, kind: EntityKind, id: EntityId) -> RepoResult<Option<StorageRecord>>;
}

/// SQLite-backed store, bound to one exclusively borrowed connection.
pub struct SqliteEntityStore<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteEntityStore<'conn> {
    /// Constructs a store from a migrated/ready connection.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }

    /// Single `UPDATE` over the change-set columns.
    pub fn update_record_fields(&self, id: EntityId, changes: &ChangeSet) -> RepoResult<()> {
        if changes.is_empty() {
            return Ok(());
        }

        let kind = changes.kind();
        let mut assignments = Vec::with_capacity(changes.len());
        let mut bind_values = Vec::with_capacity(changes.len() + 1);
        for (field, value) in changes.iter() {
            assignments.push(format!("{field} = ?"));
            bind_values.push(to_sql_value(kind, field, value)?);
        }
        bind_values.push(Value::Text(id.to_string()));

        let sql = format!(
            "UPDATE {}
             SET {}, updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?;",
            kind.table(),
            assignments.join(", ")
        );
        let changed = self.conn.execute(&sql, params_from_iter(bind_values))?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    /// Deletes every listed id of `kind` in one transaction.
    pub fn delete_records(&mut self, kind: EntityKind, ids: &[EntityId]) -> RepoResult<usize> {
        if ids.is_empty() {
            return Ok(0);
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!("DELETE FROM {} WHERE id IN ({placeholders});", kind.table());
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let deleted = tx.execute(&sql, params_from_iter(ids.iter().map(Uuid::to_string)))?;
        tx.commit()?;
        Ok(deleted)
    }
}

impl EntityRepository for SqliteEntityStore<'_> {
    fn insert_record(&self, record: &StorageRecord) -> RepoResult<()> {
        let fields = declared_fields(record.kind);
        let mut columns = vec!["id"];
        let mut bind_values = vec![Value::Text(record.id.to_string())];
        for spec in fields {
            let value = record.value_or_null(spec.name);
            if !spec.kind.admits(value) {
                return Err(RepoError::InvalidData(format!(
                    "{}.{} expects {}, found {}",
                    record.kind.table(),
                    spec.name,
                    spec.kind.expected(),
                    value.type_name()
                )));
            }
            columns.push(spec.name);
            bind_values.push(to_sql_value(record.kind, spec.name, value)?);
        }

        let placeholders = vec!["?"; columns.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({placeholders});",
            record.kind.table(),
            columns.join(", ")
        );
        self.conn.execute(&sql, params_from_iter(bind_values))?;
        Ok(())
    }

    fn get_record(&self, kind: EntityKind, id: EntityId) -> RepoResult<Option<StorageRecord>> {
        let fields = declared_fields(kind);
        let columns = fields
            .iter()
            .map(|spec| spec.name)
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT id, {columns} FROM {} WHERE id = ?1;",
            kind.table()
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_record_row(kind, fields, row)?));
        }
        Ok(None)
    }
}

impl StoreClient for SqliteEntityStore<'_> {
    fn update_fields(&mut self, id: EntityId, changes: &ChangeSet) -> Result<(), StoreError> {
        Ok(self.update_record_fields(id, changes)?)
    }

    fn delete_entities(&mut self, kind: EntityKind, ids: &[EntityId]) -> Result<usize, StoreError> {
        Ok(self.delete_records(kind, ids)?)
    }
}

fn parse_record_row(
    kind: EntityKind,
    fields: &[FieldSpec],
    row: &Row<'_>,
) -> RepoResult<StorageRecord> {
    let id_text: String = row.get("id")?;
    let id = Uuid::parse_str(&id_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{id_text}` in {}.id", kind.table()))
    })?;

    let mut record = StorageRecord::new(kind, id);
    for spec in fields {
        let raw: Value = row.get(spec.name)?;
        record.set(spec.name, from_sql_value(kind, spec, raw)?);
    }
    Ok(record)
}

fn to_sql_value(kind: EntityKind, field: &str, value: &FieldValue) -> RepoResult<Value> {
    let to_json = |result: serde_json::Result<String>| {
        result.map(Value::Text).map_err(|err| {
            RepoError::InvalidData(format!("{}.{field}: {err}", kind.table()))
        })
    };

    match value {
        FieldValue::Null => Ok(Value::Null),
        FieldValue::Text(text) | FieldValue::Enum(text) => Ok(Value::Text(text.clone())),
        FieldValue::Integer(number) => Ok(Value::Integer(*number)),
        FieldValue::EnumList(values) => to_json(serde_json::to_string(values)),
        FieldValue::RichText(document) => to_json(document.to_json_string()),
        FieldValue::Image(image) => to_json(serde_json::to_string(image)),
        FieldValue::Reference(id) => Ok(Value::Text(id.to_string())),
    }
}

fn from_sql_value(kind: EntityKind, spec: &FieldSpec, raw: Value) -> RepoResult<FieldValue> {
    let invalid = |detail: String| {
        RepoError::InvalidData(format!("{}.{}: {detail}", kind.table(), spec.name))
    };

    let value = match (spec.kind, raw) {
        (_, Value::Null) => FieldValue::Null,
        (FieldKind::Text, Value::Text(text)) => FieldValue::Text(text),
        (FieldKind::Integer, Value::Integer(number)) => FieldValue::Integer(number),
        (FieldKind::Enum(_), Value::Text(text)) => FieldValue::Enum(text),
        (FieldKind::EnumList(_), Value::Text(json)) => FieldValue::EnumList(
            serde_json::from_str(&json).map_err(|err| invalid(err.to_string()))?,
        ),
        (FieldKind::RichText, Value::Text(json)) => FieldValue::RichText(
            Document::from_json_str(&json).map_err(|err| invalid(err.to_string()))?,
        ),
        (FieldKind::Image, Value::Text(json)) => FieldValue::Image(
            serde_json::from_str(&json).map_err(|err| invalid(err.to_string()))?,
        ),
        (FieldKind::Reference(_), Value::Text(text)) => FieldValue::Reference(
            Uuid::parse_str(&text).map_err(|_| invalid(format!("invalid uuid value `{text}`")))?,
        ),
        (expected, other) => {
            return Err(invalid(format!(
                "expected {}, found sqlite {}",
                expected.expected(),
                other.data_type()
            )))
        }
    };
    Ok(value)
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    for kind in [EntityKind::Profile, EntityKind::Note] {
        let table = kind.table();
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
        for column in std::iter::once("id").chain(declared_fields(kind).iter().map(|spec| spec.name))
        {
            if !table_has_column(conn, table, column)? {
                return Err(RepoError::MissingRequiredColumn { table, column });
            }
        }
    }
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
