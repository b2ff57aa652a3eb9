//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers
//! via the `State` extractor.
//!
//! ## Architecture
//!
//! - One [`Manager`] per entity kind. Managers own their in-memory
//!   [`Store`] and write through to Postgres when a pool is configured.
//! - [`UserSessions`]: the session-bound cache of user records.
//! - [`Footsteps`]: the injected audit emitter.
//!
//! Handlers never touch a `Store` directly; all storage access goes through
//! the managers.

use std::collections::HashMap;
use std::sync::Arc;

use coop_core::model::{
    Bank, Collateral, Funds, MemberAsset, MemberProfile, MemberType, MemberTypeHistory,
    Notification, TagTemplate, User,
};
use parking_lot::RwLock;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::UserSessions;
use crate::config::AppConfig;
use crate::footstep::{Footsteps, MemoryFootsteps};
use crate::manager::Manager;

// -- Generic In-Memory Store --------------------------------------------------

/// Thread-safe, cloneable in-memory key-value store.
///
/// All operations are synchronous (the RwLock is `parking_lot`, not `tokio::sync`)
/// because the lock is never held across `.await` points.
#[derive(Debug)]
pub struct Store<T: Clone + Send + Sync> {
    data: Arc<RwLock<HashMap<Uuid, T>>>,
}

impl<T: Clone + Send + Sync> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
        }
    }
}

impl<T: Clone + Send + Sync> Store<T> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Insert a record, returning the previous value if the key existed.
    pub fn insert(&self, id: Uuid, value: T) -> Option<T> {
        self.data.write().insert(id, value)
    }

    pub fn get(&self, id: &Uuid) -> Option<T> {
        self.data.read().get(id).cloned()
    }

    /// Clone every value matching `predicate`.
    pub fn filter(&self, predicate: impl Fn(&T) -> bool) -> Vec<T> {
        self.data
            .read()
            .values()
            .filter(|v| predicate(v))
            .cloned()
            .collect()
    }

    /// Run `f` with exclusive access to the whole map.
    ///
    /// Multi-record checks and mutations made inside `f` are atomic with
    /// respect to every other store operation.
    pub fn write_with<R>(&self, f: impl FnOnce(&mut HashMap<Uuid, T>) -> R) -> R {
        f(&mut self.data.write())
    }

    /// Put previously captured values back, e.g. after a failed write-through.
    pub fn restore(&self, values: impl IntoIterator<Item = (Uuid, T)>) {
        let mut guard = self.data.write();
        for (id, value) in values {
            guard.insert(id, value);
        }
    }

    pub fn remove(&self, id: &Uuid) -> Option<T> {
        self.data.write().remove(id)
    }

    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone + Send + Sync> Default for Store<T> {
    fn default() -> Self {
        Self::new()
    }
}

// -- Application State --------------------------------------------------------

#[derive(Debug, Clone)]
pub struct AppState {
    pub banks: Manager<Bank>,
    pub collaterals: Manager<Collateral>,
    pub funds: Manager<Funds>,
    pub member_assets: Manager<MemberAsset>,
    pub member_profiles: Manager<MemberProfile>,
    pub member_types: Manager<MemberType>,
    pub member_type_histories: Manager<MemberTypeHistory>,
    pub tag_templates: Manager<TagTemplate>,
    pub notifications: Manager<Notification>,
    pub users: Manager<User>,

    pub sessions: UserSessions,
    pub footsteps: Footsteps,

    /// PostgreSQL pool. `None` means in-memory-only mode.
    pub db_pool: Option<PgPool>,

    pub config: AppConfig,
}

impl AppState {
    /// In-memory state with default configuration and an in-process footstep log.
    pub fn new() -> Self {
        Self::with_config(
            AppConfig::default(),
            Footsteps::new(MemoryFootsteps::new()),
            None,
        )
    }

    pub fn with_config(config: AppConfig, footsteps: Footsteps, db_pool: Option<PgPool>) -> Self {
        Self {
            banks: Manager::new(db_pool.clone()),
            collaterals: Manager::new(db_pool.clone()),
            funds: Manager::new(db_pool.clone()),
            member_assets: Manager::new(db_pool.clone()),
            member_profiles: Manager::new(db_pool.clone()),
            member_types: Manager::new(db_pool.clone()),
            member_type_histories: Manager::new(db_pool.clone()),
            tag_templates: Manager::new(db_pool.clone()),
            notifications: Manager::new(db_pool.clone()),
            users: Manager::new(db_pool.clone()),
            sessions: UserSessions::new(),
            footsteps,
            db_pool,
            config,
        }
    }

    /// Load every persisted record into the in-memory stores.
    ///
    /// No-op in in-memory mode. Called once at start-up, before serving.
    pub async fn hydrate_from_db(&self) -> Result<(), sqlx::Error> {
        if self.db_pool.is_none() {
            return Ok(());
        }

        let banks = self.banks.hydrate().await?;
        let collaterals = self.collaterals.hydrate().await?;
        let funds = self.funds.hydrate().await?;
        let member_assets = self.member_assets.hydrate().await?;
        let member_profiles = self.member_profiles.hydrate().await?;
        let member_types = self.member_types.hydrate().await?;
        let member_type_histories = self.member_type_histories.hydrate().await?;
        let tag_templates = self.tag_templates.hydrate().await?;
        let notifications = self.notifications.hydrate().await?;
        let users = self.users.hydrate().await?;

        tracing::info!(
            banks,
            collaterals,
            funds,
            member_assets,
            member_profiles,
            member_types,
            member_type_histories,
            tag_templates,
            notifications,
            users,
            "Hydrated in-memory stores from database"
        );

        Ok(())
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
