//! Persistence session: one SQLite connection plus its pending change set.
//!
//! # Responsibility
//! - Record staged inserts/updates/deletes in staging order.
//! - Apply the whole pending set in one IMMEDIATE transaction on commit.
//! - Overlay staged updates/deletes onto rows read from the store.
//!
//! # Invariants
//! - Commit is all-or-nothing: any failure rolls back every change.
//! - The pending set is emptied by every commit attempt, successful or not.
//! - Staged inserts have no identity and are invisible to reads until
//!   committed; their `PendingId` is filled only after the transaction
//!   commits.

use super::mapping::Persisted;
use super::{RepoError, RepoResult};
use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use crate::model::{EntityId, Planet, Star};
use log::{debug, error, info};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Transaction, TransactionBehavior};
use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ChangeKind {
    Insert,
    Update(EntityId),
    Delete(EntityId),
}

/// Identity of a staged insert, assigned by the store on commit.
///
/// Stays `None` while the insert is pending and when its commit fails.
#[derive(Debug, Clone, Default)]
pub struct PendingId(Rc<Cell<Option<EntityId>>>);

impl PendingId {
    pub fn get(&self) -> Option<EntityId> {
        self.0.get()
    }

    fn assign(&self, id: EntityId) {
        self.0.set(Some(id));
    }
}

struct StagedChange {
    entity: &'static str,
    table: &'static str,
    columns: &'static [&'static str],
    kind: ChangeKind,
    values: Vec<Value>,
    snapshot: Box<dyn Any>,
    assigned: Option<PendingId>,
}

/// Shared storage session owned by a `UnitOfWork`.
pub struct Session {
    conn: Connection,
    pending: RefCell<Vec<StagedChange>>,
}

impl Session {
    /// Wraps a migrated connection.
    ///
    /// # Errors
    /// - `UninitializedConnection` when the schema version is not the latest.
    /// - `MissingRequiredTable`/`MissingRequiredColumn` for a partial schema.
    pub fn try_new(conn: Connection) -> RepoResult<Self> {
        ensure_session_connection_ready(&conn)?;
        Ok(Self {
            conn,
            pending: RefCell::new(Vec::new()),
        })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Number of staged, uncommitted changes.
    pub fn pending_changes(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Drops every staged change and returns how many were dropped.
    pub fn discard(&self) -> usize {
        self.pending.take().len()
    }

    /// Applies all staged changes atomically and returns the affected rows.
    ///
    /// Returns `Ok(0)` without opening a transaction when nothing is staged.
    pub fn commit(&self) -> RepoResult<usize> {
        let changes = self.pending.take();
        if changes.is_empty() {
            debug!("event=session_commit module=session status=skip changes=0");
            return Ok(0);
        }

        let started_at = Instant::now();
        info!(
            "event=session_commit module=session status=start changes={}",
            changes.len()
        );

        match apply_changes(&self.conn, &changes) {
            Ok(rows) => {
                info!(
                    "event=session_commit module=session status=ok changes={} rows={} duration_ms={}",
                    changes.len(),
                    rows,
                    started_at.elapsed().as_millis()
                );
                Ok(rows)
            }
            Err(err) => {
                error!(
                    "event=session_commit module=session status=error changes={} duration_ms={} error={}",
                    changes.len(),
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }

    /// Stages an insert and returns the slot its row id lands in on commit.
    pub(crate) fn stage_insert<T: Persisted>(&self, entity: T) -> PendingId {
        let id = PendingId::default();
        self.push(ChangeKind::Insert, entity, Some(id.clone()));
        id
    }

    pub(crate) fn stage<T: Persisted>(&self, kind: ChangeKind, entity: T) {
        self.push(kind, entity, None);
    }

    fn push<T: Persisted>(&self, kind: ChangeKind, entity: T, assigned: Option<PendingId>) {
        let values = match kind {
            ChangeKind::Delete(_) => Vec::new(),
            ChangeKind::Insert | ChangeKind::Update(_) => entity.to_values(),
        };
        debug!(
            "event=session_stage module=session entity={} kind={:?}",
            T::NAME,
            kind
        );
        self.pending.borrow_mut().push(StagedChange {
            entity: T::NAME,
            table: T::TABLE,
            columns: T::COLUMNS,
            kind,
            values,
            snapshot: Box::new(entity),
            assigned,
        });
    }

    /// Applies staged updates/deletes for `T` to rows read from the store.
    pub(crate) fn overlay<T: Persisted>(&self, mut rows: Vec<T>) -> Vec<T> {
        let pending = self.pending.borrow();
        for change in pending.iter().filter(|change| change.table == T::TABLE) {
            match change.kind {
                ChangeKind::Insert => {}
                ChangeKind::Update(id) => {
                    let staged = change.snapshot.downcast_ref::<T>();
                    let slot = rows.iter_mut().find(|row| row.id() == Some(id));
                    if let (Some(staged), Some(slot)) = (staged, slot) {
                        *slot = staged.clone();
                    }
                }
                ChangeKind::Delete(id) => rows.retain(|row| row.id() != Some(id)),
            }
        }
        rows
    }

    pub(crate) fn into_connection(self) -> Connection {
        self.conn
    }
}

fn apply_changes(conn: &Connection, changes: &[StagedChange]) -> RepoResult<usize> {
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)
        .map_err(|err| RepoError::StorageUnavailable(DbError::Sqlite(err)))?;

    let mut affected = 0;
    let mut inserted = Vec::new();
    for change in changes {
        affected += apply_change(&tx, change)?;
        if let Some(slot) = &change.assigned {
            inserted.push((slot, tx.last_insert_rowid()));
        }
    }

    tx.commit().map_err(RepoError::TransactionFailed)?;
    for (slot, id) in inserted {
        slot.assign(id);
    }
    Ok(affected)
}

fn apply_change(tx: &Transaction<'_>, change: &StagedChange) -> RepoResult<usize> {
    match change.kind {
        ChangeKind::Insert => {
            let placeholders = (1..=change.columns.len())
                .map(|index| format!("?{index}"))
                .collect::<Vec<_>>()
                .join(", ");
            let sql = format!(
                "INSERT INTO {} ({}) VALUES ({placeholders});",
                change.table,
                change.columns.join(", ")
            );
            let rows = tx
                .execute(&sql, params_from_iter(change.values.iter()))
                .map_err(RepoError::TransactionFailed)?;
            debug!(
                "event=session_insert module=session entity={} id={}",
                change.entity,
                tx.last_insert_rowid()
            );
            Ok(rows)
        }
        ChangeKind::Update(id) => {
            let assignments = change
                .columns
                .iter()
                .enumerate()
                .map(|(index, column)| format!("{column} = ?{}", index + 1))
                .collect::<Vec<_>>()
                .join(", ");
            let sql = format!(
                "UPDATE {} SET {assignments} WHERE id = ?{};",
                change.table,
                change.columns.len() + 1
            );
            let id_value = Value::Integer(id);
            let rows = tx
                .execute(
                    &sql,
                    params_from_iter(change.values.iter().chain(std::iter::once(&id_value))),
                )
                .map_err(RepoError::TransactionFailed)?;
            ensure_touched(rows, change.entity, id)
        }
        ChangeKind::Delete(id) => {
            let sql = format!("DELETE FROM {} WHERE id = ?1;", change.table);
            let rows = tx
                .execute(&sql, [id])
                .map_err(RepoError::TransactionFailed)?;
            ensure_touched(rows, change.entity, id)
        }
    }
}

fn ensure_touched(rows: usize, entity: &'static str, id: EntityId) -> RepoResult<usize> {
    if rows == 0 {
        return Err(RepoError::NotFound { entity, id });
    }
    Ok(rows)
}

fn ensure_session_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    ensure_table::<Planet>(conn)?;
    ensure_table::<Star>(conn)?;
    Ok(())
}

fn ensure_table<T: Persisted>(conn: &Connection) -> RepoResult<()> {
    if !table_exists(conn, T::TABLE)? {
        return Err(RepoError::MissingRequiredTable(T::TABLE));
    }

    let present = table_columns(conn, T::TABLE)?;
    for &column in std::iter::once(&"id").chain(T::COLUMNS.iter()) {
        if !present.iter().any(|name| name.as_str() == column) {
            return Err(RepoError::MissingRequiredColumn {
                table: T::TABLE,
                column,
            });
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

fn table_columns(conn: &Connection, table: &str) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    let mut columns = Vec::new();
    while let Some(row) = rows.next()? {
        columns.push(row.get::<_, String>(1)?);
    }
    Ok(columns)
}
