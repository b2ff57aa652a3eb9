//! # Footstep Emitter
//!
//! The audit side channel. Handlers hold a [`Footsteps`] capability (via
//! `AppState`) and call [`Footsteps::conclude`] once per mutating request
//! with the request's outcome. Exactly one event is emitted per call.
//!
//! Emission is best-effort: sinks never return errors to the caller, and a
//! slow or failing database sink cannot fail the request.

use std::sync::Arc;

use chrono::Utc;
use coop_core::footstep::Actor;
use coop_core::{Footstep, FootstepEvent, Operation, GENESIS_HASH};
use parking_lot::Mutex;
use sqlx::PgPool;

use crate::auth::Principal;
use crate::error::AppError;

/// Where footsteps go.
pub trait FootstepSink: Send + Sync + 'static {
    fn record(&self, actor: Actor, event: FootstepEvent);
}

/// Cloneable handle to the configured sink.
#[derive(Clone)]
pub struct Footsteps {
    sink: Arc<dyn FootstepSink>,
}

impl std::fmt::Debug for Footsteps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Footsteps").finish_non_exhaustive()
    }
}

impl Footsteps {
    pub fn new(sink: impl FootstepSink) -> Self {
        Self {
            sink: Arc::new(sink),
        }
    }

    pub fn emit(&self, principal: &Principal, event: FootstepEvent) {
        tracing::info!(
            module = %event.module,
            activity = %event.activity,
            description = %event.description,
            "footstep"
        );
        self.sink.record(principal.actor(), event);
    }

    /// Emit the footstep for `outcome` and hand the outcome back unchanged.
    ///
    /// Success events are described by `describe`; error events carry the
    /// error message.
    pub fn conclude<T>(
        &self,
        principal: &Principal,
        module: &str,
        operation: Operation,
        outcome: Result<T, AppError>,
        describe: impl FnOnce(&T) -> String,
    ) -> Result<T, AppError> {
        let event = match &outcome {
            Ok(value) => FootstepEvent::new(operation.success(), module, describe(value)),
            Err(err) => FootstepEvent::new(
                operation.error(),
                module,
                format!("{module} {} failed: {err}", operation.as_str()),
            ),
        };
        self.emit(principal, event);
        outcome
    }
}

// -- In-process sink ----------------------------------------------------------

/// Chained footstep log kept in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryFootsteps {
    entries: Arc<Mutex<Vec<Footstep>>>,
}

impl MemoryFootsteps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<Footstep> {
        self.entries.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FootstepSink for MemoryFootsteps {
    fn record(&self, actor: Actor, event: FootstepEvent) {
        let mut entries = self.entries.lock();
        let previous = entries
            .last()
            .map(|f| f.event_hash.clone())
            .unwrap_or_else(|| GENESIS_HASH.to_string());
        entries.push(Footstep::chain(&previous, actor, event, Utc::now()));
    }
}

// -- Postgres sink --------------------------------------------------------------

/// Appends footsteps to the `footsteps` table from a spawned task.
#[derive(Debug, Clone)]
pub struct PgFootsteps {
    pool: PgPool,
}

impl PgFootsteps {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl FootstepSink for PgFootsteps {
    fn record(&self, actor: Actor, event: FootstepEvent) {
        let pool = self.pool.clone();
        tokio::spawn(async move {
            let module = event.module.clone();
            let activity = event.activity;
            if let Err(e) = crate::db::footsteps::append(&pool, actor, event).await {
                tracing::warn!(%module, %activity, error = %e, "failed to persist footstep");
            }
        });
    }
}
