//! Unit of work: one session, one cached repository per entity type, one
//! commit point.
//!
//! # Responsibility
//! - Own the persistence session for the lifetime of a logical operation.
//! - Lazily build and memoize the planet/star repositories on that session.
//! - Commit every change staged through those repositories atomically.
//!
//! # Invariants
//! - One unit of work = one session = one transaction boundary.
//! - Repositories are borrowed from the unit of work and cannot outlive it.
//! - The unit of work is neither `Send` nor `Sync`; staging from several
//!   threads needs external coordination.

use crate::config::{ConfigurationProvider, ConnectionSettings};
use crate::db::{open_db_in_memory, open_db_with};
use crate::repo::{
    RepoError, RepoResult, Session, SqlitePlanetRepository, SqliteRepository,
    SqliteStarRepository,
};
use log::{debug, info, warn};
use once_cell::unsync::OnceCell;
use rusqlite::Connection;
use std::cell::Cell;
use std::rc::Rc;

/// Observable lifecycle of a unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitOfWorkState {
    /// Session open, no repository materialized yet.
    Created,
    /// Repositories in use or changes staged.
    Active,
    /// Last commit succeeded and nothing new is staged.
    Committed,
    /// Last commit failed; none of its changes are durable.
    Failed,
}

pub struct UnitOfWork {
    session: Rc<Session>,
    planets: OnceCell<SqlitePlanetRepository>,
    stars: OnceCell<SqliteStarRepository>,
    last_commit: Cell<Option<UnitOfWorkState>>,
}

impl UnitOfWork {
    /// Binds a unit of work to a migrated connection.
    pub fn new(conn: Connection) -> RepoResult<Self> {
        let session = Session::try_new(conn)?;
        debug!("event=uow_create module=uow status=ok");
        Ok(Self {
            session: Rc::new(session),
            planets: OnceCell::new(),
            stars: OnceCell::new(),
            last_commit: Cell::new(None),
        })
    }

    /// Opens the store named by `provider`'s connection string.
    ///
    /// # Errors
    /// - `Config` when the connection string cannot be parsed.
    /// - `StorageUnavailable` when the store cannot be opened or migrated.
    pub fn open<P>(provider: &P) -> RepoResult<Self>
    where
        P: ConfigurationProvider + ?Sized,
    {
        let settings = ConnectionSettings::parse(&provider.connection_string())?;
        let conn = open_db_with(&settings).map_err(RepoError::StorageUnavailable)?;
        Self::new(conn)
    }

    /// Opens a transient in-memory store.
    pub fn open_in_memory() -> RepoResult<Self> {
        let conn = open_db_in_memory().map_err(RepoError::StorageUnavailable)?;
        Self::new(conn)
    }

    /// Planet repository; built on first access, then reused.
    pub fn planets(&self) -> &SqlitePlanetRepository {
        self.planets
            .get_or_init(|| SqliteRepository::new(Rc::clone(&self.session)))
    }

    /// Star repository; built on first access, then reused.
    pub fn stars(&self) -> &SqliteStarRepository {
        self.stars
            .get_or_init(|| SqliteRepository::new(Rc::clone(&self.session)))
    }

    /// Persists every staged change in one transaction.
    ///
    /// Returns the number of affected rows, `0` when nothing was staged. On
    /// error nothing from this attempt is durable and the staged changes are
    /// dropped.
    pub fn commit(&self) -> RepoResult<usize> {
        match self.session.commit() {
            Ok(rows) => {
                self.last_commit.set(Some(UnitOfWorkState::Committed));
                Ok(rows)
            }
            Err(err) => {
                self.last_commit.set(Some(UnitOfWorkState::Failed));
                Err(err)
            }
        }
    }

    pub fn pending_changes(&self) -> usize {
        self.session.pending_changes()
    }

    pub fn state(&self) -> UnitOfWorkState {
        if self.session.pending_changes() > 0 {
            return UnitOfWorkState::Active;
        }
        if let Some(outcome) = self.last_commit.get() {
            return outcome;
        }
        if self.planets.get().is_some() || self.stars.get().is_some() {
            return UnitOfWorkState::Active;
        }
        UnitOfWorkState::Created
    }

    /// Drops uncommitted changes and closes the underlying connection.
    ///
    /// Dropping the unit of work releases the session too; `close` only adds
    /// error reporting for the final close. While another handle still shares
    /// the session, the close is deferred to that handle's drop.
    pub fn close(self) -> RepoResult<()> {
        let discarded = self.session.discard();
        if discarded > 0 {
            warn!("event=uow_close module=uow status=discard pending={discarded}");
        }

        let Self {
            session,
            planets,
            stars,
            ..
        } = self;
        drop(planets);
        drop(stars);

        match Rc::try_unwrap(session) {
            Ok(session) => {
                session
                    .into_connection()
                    .close()
                    .map_err(|(_, err)| RepoError::StorageUnavailable(err.into()))?;
                info!("event=uow_close module=uow status=ok");
                Ok(())
            }
            Err(session) => {
                warn!(
                    "event=uow_close module=uow status=deferred refs={}",
                    Rc::strong_count(&session)
                );
                Ok(())
            }
        }
    }
}
