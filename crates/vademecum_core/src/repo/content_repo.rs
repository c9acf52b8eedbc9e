//! Content repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist import batches with set-based, all-or-nothing upserts.
//! - Provide the direct-edit CRUD paths (create, get, patch, soft delete).
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - `upsert_batch` writes every chunk inside one IMMEDIATE transaction; any
//!   failure rolls back the whole batch.
//! - Upserts overwrite every data column and clear `is_deleted`.
//! - Read paths only ever return rows with `is_deleted = 0`, in insertion
//!   (rowid) order.
//! - Write paths validate records and patches before SQL mutations.
//!
//! # See also
//! - `crate::schema` for table and column names.

use crate::db::DbError;
use crate::model::family::Family;
use crate::model::record::{ContentRecord, RecordPatch};
use crate::schema::FamilySchema;
use log::{error, info};
use rusqlite::{params_from_iter, Connection, ErrorCode, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{Duration, Instant};

/// Bound parameters per statement; upsert chunks stay under this limit.
const MAX_BIND_PARAMS: usize = 999;

/// Default bound on one batch write, lock acquisition included.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(30);

const NOW_MS_SQL: &str = "(strftime('%s', 'now') * 1000)";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for content persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound { family: Family, id: String },
    AlreadyExists { family: Family, id: String },
    /// Identifier is blank after trimming.
    InvalidIdentifier,
    UnknownColumn { family: Family, column: String },
    /// The key column cannot be changed through a patch.
    ImmutableColumn { column: String },
    /// A required column would be stored blank.
    RequiredColumn { column: String },
    /// The batch write did not finish within the configured bound.
    WriteTimeout { elapsed_ms: u64 },
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { family, id } => write!(f, "{family} record not found: {id}"),
            Self::AlreadyExists { family, id } => {
                write!(f, "{family} record already exists: {id}")
            }
            Self::InvalidIdentifier => write!(f, "identifier must not be blank"),
            Self::UnknownColumn { family, column } => {
                write!(f, "unknown column `{column}` for {family}")
            }
            Self::ImmutableColumn { column } => write!(f, "column `{column}` cannot be updated"),
            Self::RequiredColumn { column } => write!(f, "{column} is required"),
            Self::WriteTimeout { elapsed_ms } => {
                write!(f, "write timed out after {elapsed_ms} ms")
            }
            Self::InvalidData(message) => write!(f, "invalid content data: {message}"),
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

/// Repository interface for content persistence.
pub trait ContentRepository {
    /// Inserts new rows and overwrites existing ones in one transaction.
    ///
    /// Returns the number of records written.
    fn upsert_batch(&mut self, schema: &FamilySchema, records: &[ContentRecord])
        -> RepoResult<usize>;
    /// Lists every active record of a family in insertion order.
    fn find_all(&self, schema: &FamilySchema) -> RepoResult<Vec<ContentRecord>>;
    /// Inserts one record; an active row with the same key is a conflict,
    /// a soft-deleted one is overwritten and revived.
    fn create(&self, schema: &FamilySchema, record: &ContentRecord) -> RepoResult<()>;
    fn get_by_id(&self, schema: &FamilySchema, id: &str) -> RepoResult<Option<ContentRecord>>;
    /// Changes only the columns named in `patch`.
    fn update_fields(&self, schema: &FamilySchema, id: &str, patch: &RecordPatch)
        -> RepoResult<()>;
    fn soft_delete(&self, schema: &FamilySchema, id: &str) -> RepoResult<()>;
    /// Soft-deletes every active row and returns how many were affected.
    fn soft_delete_all(&self, schema: &FamilySchema) -> RepoResult<usize>;
}

/// SQLite-backed content repository.
pub struct SqliteContentRepository<'conn> {
    conn: &'conn mut Connection,
    write_timeout: Duration,
}

impl<'conn> SqliteContentRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self {
            conn,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
        }
    }

    /// Overrides the batch write bound.
    pub fn with_write_timeout(mut self, write_timeout: Duration) -> Self {
        self.write_timeout = write_timeout;
        self
    }
}

impl ContentRepository for SqliteContentRepository<'_> {
    fn upsert_batch(
        &mut self,
        schema: &FamilySchema,
        records: &[ContentRecord],
    ) -> RepoResult<usize> {
        if records.is_empty() {
            return Ok(0);
        }
        for record in records {
            ensure_record_shape(schema, record)?;
            if record.identifier().is_empty() {
                return Err(RepoError::InvalidIdentifier);
            }
            validate_required(schema, record)?;
        }

        // The write bound replaces the connection's busy timeout only for
        // this batch.
        let previous_busy: i64 = self
            .conn
            .query_row("PRAGMA busy_timeout;", [], |row| row.get(0))?;
        self.conn.busy_timeout(self.write_timeout)?;
        let written = write_chunks(self.conn, schema, records, self.write_timeout);
        self.conn
            .busy_timeout(Duration::from_millis(previous_busy.max(0) as u64))?;
        written
    }

    fn find_all(&self, schema: &FamilySchema) -> RepoResult<Vec<ContentRecord>> {
        let sql = format!(
            "{} WHERE is_deleted = 0 ORDER BY rowid ASC;",
            select_sql(schema)
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_record_row(schema, row)?);
        }
        Ok(records)
    }

    fn create(&self, schema: &FamilySchema, record: &ContentRecord) -> RepoResult<()> {
        ensure_record_shape(schema, record)?;
        if record.identifier().is_empty() {
            return Err(RepoError::InvalidIdentifier);
        }
        validate_required(schema, record)?;

        // Only a soft-deleted row is overwritten; an active one leaves
        // `changed == 0`.
        let sql = format!(
            "{} WHERE {table}.is_deleted = 1;",
            upsert_sql(schema, 1).trim_end_matches(';'),
            table = schema.table
        );
        let values = std::iter::once(record.identifier())
            .chain(record.values().iter().map(String::as_str));
        let changed = self.conn.execute(&sql, params_from_iter(values))?;
        if changed == 0 {
            return Err(RepoError::AlreadyExists {
                family: schema.family,
                id: record.identifier().to_string(),
            });
        }
        Ok(())
    }

    fn get_by_id(&self, schema: &FamilySchema, id: &str) -> RepoResult<Option<ContentRecord>> {
        let id = normalize_id(id)?;
        let sql = format!(
            "{} WHERE {} = ?1 AND is_deleted = 0;",
            select_sql(schema),
            schema.key_column
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([id])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_record_row(schema, row)?)),
            None => Ok(None),
        }
    }

    fn update_fields(
        &self,
        schema: &FamilySchema,
        id: &str,
        patch: &RecordPatch,
    ) -> RepoResult<()> {
        let id = normalize_id(id)?;
        validate_patch(schema, patch)?;

        let mut assignments: Vec<String> = patch
            .iter()
            .enumerate()
            .map(|(index, (column, _))| format!("{column} = ?{}", index + 2))
            .collect();
        assignments.push(format!("updated_at = {NOW_MS_SQL}"));

        let sql = format!(
            "UPDATE {} SET {} WHERE {} = ?1 AND is_deleted = 0;",
            schema.table,
            assignments.join(", "),
            schema.key_column
        );
        let values = std::iter::once(id).chain(patch.iter().map(|(_, value)| value));
        let changed = self.conn.execute(&sql, params_from_iter(values))?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                family: schema.family,
                id: id.to_string(),
            });
        }
        Ok(())
    }

    fn soft_delete(&self, schema: &FamilySchema, id: &str) -> RepoResult<()> {
        let id = normalize_id(id)?;
        let sql = format!(
            "UPDATE {} SET is_deleted = 1, updated_at = {NOW_MS_SQL} WHERE {} = ?1 AND is_deleted = 0;",
            schema.table, schema.key_column
        );
        let changed = self.conn.execute(&sql, [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                family: schema.family,
                id: id.to_string(),
            });
        }
        Ok(())
    }

    fn soft_delete_all(&self, schema: &FamilySchema) -> RepoResult<usize> {
        let sql = format!(
            "UPDATE {} SET is_deleted = 1, updated_at = {NOW_MS_SQL} WHERE is_deleted = 0;",
            schema.table
        );
        let changed = self.conn.execute(&sql, [])?;
        info!(
            "event=soft_delete_all module=repo status=ok table={} rows={changed}",
            schema.table
        );
        Ok(changed)
    }
}

/// Builds a multi-row upsert for `rows` records of `schema`.
fn upsert_sql(schema: &FamilySchema, rows: usize) -> String {
    let width = schema.columns.len() + 1;
    let placeholders = format!("({}, 0)", vec!["?"; width].join(", "));
    let values = vec![placeholders.as_str(); rows].join(", ");
    let updates = schema
        .columns
        .iter()
        .map(|column| format!("{column} = excluded.{column}"))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "INSERT INTO {table} ({key}, {columns}, is_deleted) VALUES {values}
         ON CONFLICT({key}) DO UPDATE SET {updates}, is_deleted = 0, updated_at = {NOW_MS_SQL};",
        table = schema.table,
        key = schema.key_column,
        columns = schema.columns.join(", "),
    )
}

fn select_sql(schema: &FamilySchema) -> String {
    format!(
        "SELECT {}, {} FROM {}",
        schema.key_column,
        schema.columns.join(", "),
        schema.table
    )
}

fn parse_record_row(schema: &FamilySchema, row: &rusqlite::Row<'_>) -> RepoResult<ContentRecord> {
    let identifier: String = row.get(0)?;
    let mut values = Vec::with_capacity(schema.columns.len());
    for index in 0..schema.columns.len() {
        values.push(row.get::<_, String>(index + 1)?);
    }
    ContentRecord::from_values(schema.family, identifier, values).ok_or_else(|| {
        RepoError::InvalidData(format!("column count mismatch in {}", schema.table))
    })
}

fn ensure_record_shape(schema: &FamilySchema, record: &ContentRecord) -> RepoResult<()> {
    if record.family() != schema.family {
        return Err(RepoError::InvalidData(format!(
            "{} record passed to {} repository",
            record.family(),
            schema.family
        )));
    }
    Ok(())
}

fn validate_required(schema: &FamilySchema, record: &ContentRecord) -> RepoResult<()> {
    for column in schema.required {
        if record.get(column).map_or(true, str::is_empty) {
            return Err(RepoError::RequiredColumn {
                column: column.to_string(),
            });
        }
    }
    Ok(())
}

fn validate_patch(schema: &FamilySchema, patch: &RecordPatch) -> RepoResult<()> {
    for (column, value) in patch.iter() {
        if column == schema.key_column {
            return Err(RepoError::ImmutableColumn {
                column: column.to_string(),
            });
        }
        if schema.column_index(column).is_none() {
            return Err(RepoError::UnknownColumn {
                family: schema.family,
                column: column.to_string(),
            });
        }
        if value.is_empty() && schema.required.iter().any(|required| *required == column) {
            return Err(RepoError::RequiredColumn {
                column: column.to_string(),
            });
        }
    }
    Ok(())
}

fn normalize_id(id: &str) -> RepoResult<&str> {
    let id = id.trim();
    if id.is_empty() {
        return Err(RepoError::InvalidIdentifier);
    }
    Ok(id)
}

fn is_busy(err: &rusqlite::Error) -> bool {
    matches!(
        err.sqlite_error_code(),
        Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked)
    )
}

/// Writes `records` in bounded chunks inside one IMMEDIATE transaction.
fn write_chunks(
    conn: &mut Connection,
    schema: &FamilySchema,
    records: &[ContentRecord],
    write_timeout: Duration,
) -> RepoResult<usize> {
    let started_at = Instant::now();
    let tx = match conn.transaction_with_behavior(TransactionBehavior::Immediate) {
        Ok(tx) => tx,
        Err(err) if is_busy(&err) => {
            let err = RepoError::WriteTimeout {
                elapsed_ms: elapsed_ms(started_at),
            };
            error!(
                "event=upsert_batch module=repo status=error table={} error_code=write_lock_timeout error={err}",
                schema.table
            );
            return Err(err);
        }
        Err(err) => return Err(err.into()),
    };

    let rows_per_chunk = (MAX_BIND_PARAMS / (schema.columns.len() + 1)).max(1);
    let mut chunks = 0usize;
    for chunk in records.chunks(rows_per_chunk) {
        if started_at.elapsed() >= write_timeout {
            // Dropping `tx` rolls back chunks already written.
            let elapsed_ms = elapsed_ms(started_at);
            error!(
                "event=upsert_batch module=repo status=error table={} chunks_written={chunks} duration_ms={elapsed_ms} error_code=write_timeout",
                schema.table
            );
            return Err(RepoError::WriteTimeout { elapsed_ms });
        }

        let sql = upsert_sql(schema, chunk.len());
        let values = chunk.iter().flat_map(|record| {
            std::iter::once(record.identifier()).chain(record.values().iter().map(String::as_str))
        });
        if let Err(err) = tx.execute(&sql, params_from_iter(values)) {
            error!(
                "event=upsert_batch module=repo status=error table={} chunks_written={chunks} error_code=upsert_failed error={err}",
                schema.table
            );
            return Err(if is_busy(&err) {
                RepoError::WriteTimeout {
                    elapsed_ms: elapsed_ms(started_at),
                }
            } else {
                err.into()
            });
        }
        chunks += 1;
    }
    tx.commit()?;

    info!(
        "event=upsert_batch module=repo status=ok table={} rows={} chunks={chunks} duration_ms={}",
        schema.table,
        records.len(),
        elapsed_ms(started_at)
    );
    Ok(records.len())
}

fn elapsed_ms(started_at: Instant) -> u64 {
    u64::try_from(started_at.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::upsert_sql;
    use crate::model::family::Family;
    use crate::schema::schema_for;

    #[test]
    fn upsert_sql_overwrites_every_column_and_revives() {
        let schema = schema_for(Family::Constitution);
        let sql = upsert_sql(schema, 2);
        assert_eq!(sql.matches("?").count(), 2 * 17);
        assert!(sql.contains("ON CONFLICT(registro_id) DO UPDATE SET"));
        assert!(sql.contains("normativo = excluded.normativo"));
        assert!(sql.contains("is_deleted = 0, updated_at"));
    }

    #[test]
    fn code_families_conflict_on_their_code_column() {
        for family in [Family::Codes, Family::Statutes] {
            let sql = upsert_sql(schema_for(family), 1);
            assert!(sql.contains("ON CONFLICT(idcodigo) DO UPDATE SET"));
            assert!(!sql.contains("idcodigo = excluded.idcodigo"));
        }
    }
}
