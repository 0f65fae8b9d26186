//! SQLite-backed implementation of the generic `Repository` contract.
//!
//! One implementation serves every `Persisted` entity; entity-specific
//! queries live in extension traits implemented for a concrete `T`.

use super::mapping::{select_sql, Persisted};
use super::session::{ChangeKind, PendingId, Session};
use super::{RepoError, RepoResult, Repository};
use crate::model::{EntityId, ValidationError};
use log::debug;
use rusqlite::params_from_iter;
use std::marker::PhantomData;
use std::rc::Rc;

/// Generic repository bound to the session of its unit of work.
pub struct SqliteRepository<T> {
    session: Rc<Session>,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Persisted> SqliteRepository<T> {
    pub(crate) fn new(session: Rc<Session>) -> Self {
        debug!("event=repo_create module=repo entity={}", T::NAME);
        Self {
            session,
            _entity: PhantomData,
        }
    }

    /// Loads rows in ascending identity order, optionally limited to one id,
    /// with staged updates/removals applied.
    fn load(&self, id: Option<EntityId>) -> RepoResult<Vec<T>> {
        let mut sql = select_sql::<T>();
        if id.is_some() {
            sql.push_str(" WHERE id = ?1");
        }
        sql.push_str(" ORDER BY id ASC;");

        let mut stmt = self.session.connection().prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(id))?;
        let mut entities = Vec::new();
        while let Some(row) = rows.next()? {
            entities.push(T::from_row(row)?);
        }

        Ok(self.session.overlay(entities))
    }
}

fn check_insertable<T: Persisted>(entity: &T) -> Result<(), ValidationError> {
    if let Some(id) = entity.id() {
        return Err(ValidationError::UnexpectedIdentity {
            entity: T::NAME,
            id,
        });
    }
    entity.audit().require_creator()?;
    entity.validate()
}

fn require_identity<T: Persisted>(entity: &T) -> Result<EntityId, ValidationError> {
    entity
        .id()
        .ok_or(ValidationError::MissingIdentity { entity: T::NAME })
}

fn check_updatable<T: Persisted>(entity: &T) -> Result<EntityId, ValidationError> {
    let id = require_identity(entity)?;
    entity.validate()?;
    Ok(id)
}

impl<T: Persisted> Repository<T> for SqliteRepository<T> {
    fn add(&self, entity: T) -> RepoResult<PendingId> {
        check_insertable(&entity)?;
        Ok(self.session.stage_insert(entity))
    }

    fn add_range<I>(&self, entities: I) -> RepoResult<Vec<PendingId>>
    where
        I: IntoIterator<Item = T>,
    {
        let batch: Vec<T> = entities.into_iter().collect();
        for entity in &batch {
            check_insertable(entity)?;
        }
        Ok(batch
            .into_iter()
            .map(|entity| self.session.stage_insert(entity))
            .collect())
    }

    fn update(&self, entity: T) -> RepoResult<()> {
        let id = check_updatable(&entity)?;
        self.session.stage(ChangeKind::Update(id), entity);
        Ok(())
    }

    fn update_range<I>(&self, entities: I) -> RepoResult<()>
    where
        I: IntoIterator<Item = T>,
    {
        let batch = entities
            .into_iter()
            .map(|entity| check_updatable(&entity).map(|id| (id, entity)))
            .collect::<Result<Vec<_>, _>>()?;
        for (id, entity) in batch {
            self.session.stage(ChangeKind::Update(id), entity);
        }
        Ok(())
    }

    fn remove(&self, entity: &T) -> RepoResult<()> {
        let id = require_identity(entity)?;
        self.session.stage(ChangeKind::Delete(id), entity.clone());
        Ok(())
    }

    fn remove_range<'a, I>(&self, entities: I) -> RepoResult<()>
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        let batch = entities
            .into_iter()
            .map(|entity| require_identity(entity).map(|id| (id, entity)))
            .collect::<Result<Vec<_>, _>>()?;
        for (id, entity) in batch {
            self.session.stage(ChangeKind::Delete(id), entity.clone());
        }
        Ok(())
    }

    fn get(&self, id: EntityId) -> RepoResult<Option<T>> {
        Ok(self.load(Some(id))?.into_iter().next())
    }

    fn get_single_or_default<P>(&self, predicate: P) -> RepoResult<Option<T>>
    where
        P: Fn(&T) -> bool,
    {
        let mut matches = self.find(predicate)?;
        match matches.len() {
            0 | 1 => Ok(matches.pop()),
            count => Err(RepoError::MultipleResults {
                entity: T::NAME,
                count,
            }),
        }
    }

    fn get_all(&self) -> RepoResult<Vec<T>> {
        self.load(None)
    }

    fn find<P>(&self, predicate: P) -> RepoResult<Vec<T>>
    where
        P: Fn(&T) -> bool,
    {
        Ok(self
            .load(None)?
            .into_iter()
            .filter(|entity| predicate(entity))
            .collect())
    }
}
