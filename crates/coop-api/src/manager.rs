//! # Entity Manager
//!
//! [`Manager<E>`] is the single storage gateway for one entity kind. It
//! validates payloads, performs CRUD with soft delete, runs atomic
//! multi-record batches, paginates, and projects records to their response
//! shape.
//!
//! ## Storage
//!
//! Records live in an in-memory [`Store`]. When a Postgres pool is
//! configured every write is mirrored to the `records` table. A write that
//! fails in Postgres is undone in memory before the error is returned, so a
//! caller never observes a change the database rejected.
//!
//! ## Atomicity
//!
//! Multi-record operations check every id under one write lock before
//! touching anything: either every id is visible and the whole batch
//! applies, or nothing changes. The Postgres mirror of a batch runs in one
//! transaction.
//!
//! Writes of one manager are serialized by an async write gate held from
//! the in-memory change until the mirror commits. Postgres therefore sees
//! writes in the same order as memory, and restoring the prior values after
//! a failed mirror never clobbers a later write.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use coop_core::{paginate, BranchScope, BranchScoped, Page, PageRequest, Record, UserId};
use serde::Serialize;
use sqlx::PgPool;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::db;
use crate::error::AppError;
use crate::extractors::Validate;
use crate::state::{AppState, Store};

/// A record kind served by the API.
pub trait Entity: Record {
    /// Wire-facing projection.
    type Response: Serialize + Send + 'static;

    /// Module name recorded on footsteps.
    const MODULE: &'static str;

    fn to_model(&self) -> Self::Response;

    fn manager(state: &AppState) -> &Manager<Self>;
}

pub struct Manager<E: Entity> {
    store: Store<E>,
    pool: Option<PgPool>,
    write_gate: Arc<Mutex<()>>,
}

impl<E: Entity> Clone for Manager<E> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            pool: self.pool.clone(),
            write_gate: Arc::clone(&self.write_gate),
        }
    }
}

impl<E: Entity> std::fmt::Debug for Manager<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Manager")
            .field("kind", &E::KIND)
            .field("records", &self.store.len())
            .field("persistent", &self.pool.is_some())
            .finish()
    }
}

impl<E: Entity> Manager<E> {
    pub fn new(pool: Option<PgPool>) -> Self {
        Self {
            store: Store::new(),
            pool,
            write_gate: Arc::new(Mutex::new(())),
        }
    }

    pub fn validate<R: Validate>(&self, request: &R) -> Result<(), AppError> {
        request.validate().map_err(AppError::from)
    }

    pub async fn create(&self, record: E) -> Result<E, AppError> {
        let id = record.id();
        let _gate = self.write_gate.lock().await;
        let inserted = self.store.write_with(|map| {
            if map.contains_key(&id) {
                return false;
            }
            map.insert(id, record.clone());
            true
        });
        if !inserted {
            return Err(AppError::Conflict(format!("{} {id} already exists", E::KIND)));
        }

        if let Err(e) = self.persist(std::slice::from_ref(&record)).await {
            self.store.remove(&id);
            return Err(e);
        }

        tracing::debug!(kind = E::KIND, %id, "record created");
        Ok(record)
    }

    /// Fetch a live record regardless of tenant.
    pub fn get_by_id(&self, id: Uuid) -> Result<E, AppError> {
        self.store
            .get(&id)
            .filter(|r| !r.is_deleted())
            .ok_or_else(|| not_found::<E>(id))
    }

    /// Fetch a live record and project it.
    pub fn get_by_id_raw(&self, id: Uuid) -> Result<E::Response, AppError> {
        self.get_by_id(id).map(|r| r.to_model())
    }

    /// Full-replace update of an existing live record.
    pub async fn update_by_id(&self, id: Uuid, record: E) -> Result<E, AppError> {
        if record.id() != id {
            return Err(AppError::Validation(format!(
                "record id {} does not match {id}",
                record.id()
            )));
        }
        self.modify(id, |_| true, move |current| {
            *current = record;
            Ok(())
        })
        .await
    }

    /// Read-validate-update one record atomically.
    ///
    /// `visible` decides whether the caller may see the record; an invisible
    /// record is reported as not found. If `apply` fails the record is left
    /// untouched.
    pub async fn modify(
        &self,
        id: Uuid,
        visible: impl Fn(&E) -> bool,
        apply: impl FnOnce(&mut E) -> Result<(), AppError>,
    ) -> Result<E, AppError> {
        let _gate = self.write_gate.lock().await;
        let (prior, updated) = self.store.write_with(|map| {
            let entry = map
                .get_mut(&id)
                .filter(|r| !r.is_deleted() && visible(r))
                .ok_or_else(|| not_found::<E>(id))?;
            let prior = entry.clone();
            if let Err(e) = apply(&mut *entry) {
                *entry = prior;
                return Err(e);
            }
            Ok((prior, entry.clone()))
        })?;

        if let Err(e) = self.persist(std::slice::from_ref(&updated)).await {
            self.store.restore([(id, prior)]);
            return Err(e);
        }
        Ok(updated)
    }

    /// Soft-delete one visible record.
    pub async fn delete(
        &self,
        id: Uuid,
        visible: impl Fn(&E) -> bool,
        actor: Option<UserId>,
    ) -> Result<E, AppError> {
        let now = Utc::now();
        self.modify(id, visible, |r| {
            r.mark_deleted(actor, now);
            Ok(())
        })
        .await
    }

    /// Soft-delete every id, or none of them.
    pub async fn bulk_delete(
        &self,
        ids: &[Uuid],
        visible: impl Fn(&E) -> bool,
        actor: Option<UserId>,
    ) -> Result<Vec<E>, AppError> {
        let now = Utc::now();
        self.apply_batch(ids, visible, |r| {
            r.mark_deleted(actor, now);
            true
        })
        .await
    }

    /// Apply `f` to every id as one unit of work.
    ///
    /// All ids must be distinct, live and visible; otherwise nothing changes
    /// and the first offending id is reported. `f` returns whether it changed
    /// the record; unchanged records are not written. Returns every targeted
    /// record in request order, after the change.
    pub async fn apply_batch(
        &self,
        ids: &[Uuid],
        visible: impl Fn(&E) -> bool,
        mut f: impl FnMut(&mut E) -> bool,
    ) -> Result<Vec<E>, AppError> {
        let mut seen = HashSet::with_capacity(ids.len());
        if let Some(dup) = ids.iter().find(|id| !seen.insert(**id)) {
            return Err(AppError::Validation(format!("ids contains duplicate id {dup}")));
        }

        let _gate = self.write_gate.lock().await;
        let (priors, changed, all) = self.store.write_with(|map| {
            for id in ids {
                let ok = map
                    .get(id)
                    .is_some_and(|r| !r.is_deleted() && visible(r));
                if !ok {
                    return Err(not_found::<E>(*id));
                }
            }

            let mut priors = Vec::new();
            let mut changed = Vec::new();
            let mut all = Vec::with_capacity(ids.len());
            for id in ids {
                if let Some(entry) = map.get_mut(id) {
                    let before = entry.clone();
                    if f(&mut *entry) {
                        priors.push((*id, before));
                        changed.push(entry.clone());
                    }
                    all.push(entry.clone());
                }
            }
            Ok((priors, changed, all))
        })?;

        if let Err(e) = self.persist(&changed).await {
            self.store.restore(priors);
            return Err(e);
        }

        tracing::debug!(kind = E::KIND, targeted = ids.len(), changed = changed.len(), "batch applied");
        Ok(all)
    }

    /// Apply `f` to every live record matching `select` as one unit of work.
    ///
    /// Selection and change happen under the same write lock, so a record
    /// removed concurrently is simply not selected. Returns the selected
    /// records after the change.
    pub async fn apply_where(
        &self,
        select: impl Fn(&E) -> bool,
        mut f: impl FnMut(&mut E) -> bool,
    ) -> Result<Vec<E>, AppError> {
        let _gate = self.write_gate.lock().await;
        let (priors, changed, all) = self.store.write_with(|map| {
            let mut priors = Vec::new();
            let mut changed = Vec::new();
            let mut all = Vec::new();
            for (id, entry) in map.iter_mut() {
                if entry.is_deleted() || !select(entry) {
                    continue;
                }
                let before = entry.clone();
                if f(&mut *entry) {
                    priors.push((*id, before));
                    changed.push(entry.clone());
                }
                all.push(entry.clone());
            }
            (priors, changed, all)
        });

        if let Err(e) = self.persist(&changed).await {
            self.store.restore(priors);
            return Err(e);
        }

        tracing::debug!(kind = E::KIND, selected = all.len(), changed = changed.len(), "selection applied");
        Ok(all)
    }

    /// Live records matching `filter`, newest first.
    pub fn find(&self, filter: impl Fn(&E) -> bool) -> Vec<E> {
        let mut records = self.store.filter(|r| !r.is_deleted() && filter(r));
        records.sort_by_key(|r| std::cmp::Reverse(r.created_at()));
        records
    }

    pub fn normal_pagination(
        &self,
        request: &PageRequest,
        filter: impl Fn(&E) -> bool,
    ) -> Result<Page<E::Response>, AppError> {
        let models = self.to_models(&self.find(filter));
        Ok(paginate(models, request)?)
    }

    pub fn to_model(&self, record: &E) -> E::Response {
        record.to_model()
    }

    pub fn to_models(&self, records: &[E]) -> Vec<E::Response> {
        records.iter().map(Entity::to_model).collect()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Load persisted records of this kind into memory.
    pub async fn hydrate(&self) -> Result<usize, sqlx::Error> {
        let Some(pool) = &self.pool else {
            return Ok(0);
        };
        let records: Vec<E> = db::records::load_all(pool).await?;
        let count = records.len();
        self.store.restore(records.into_iter().map(|r| (r.id(), r)));
        Ok(count)
    }

    async fn persist(&self, records: &[E]) -> Result<(), AppError> {
        let Some(pool) = &self.pool else {
            return Ok(());
        };
        if records.is_empty() {
            return Ok(());
        }
        db::records::upsert_batch(pool, records).await.map_err(|e| {
            tracing::error!(kind = E::KIND, error = %e, "failed to persist records");
            AppError::Persistence(format!("failed to persist {}: {e}", E::KIND))
        })
    }
}

impl<E: Entity + BranchScoped> Manager<E> {
    /// Fetch a live record visible to `scope`.
    pub fn get_scoped(&self, id: Uuid, scope: &BranchScope) -> Result<E, AppError> {
        self.store
            .get(&id)
            .filter(|r| r.visible_to(scope))
            .ok_or_else(|| not_found::<E>(id))
    }

    /// Every live record of `scope`, newest first.
    pub fn list_scoped(&self, scope: &BranchScope) -> Vec<E> {
        self.find(|r| r.scope() == *scope)
    }
}

fn not_found<E: Record>(id: Uuid) -> AppError {
    AppError::NotFound(format!("{} {id} not found", E::KIND.replace('_', " ")))
}
