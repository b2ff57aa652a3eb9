//! Footstep persistence: an append-only hash chain.
//!
//! Appends are serialized with a transaction-scoped advisory lock so two
//! concurrent writers cannot both chain onto the same predecessor.

use chrono::Utc;
use coop_core::footstep::Actor;
use coop_core::{Footstep, FootstepEvent, GENESIS_HASH};
use sqlx::PgPool;
use uuid::Uuid;

/// Advisory lock key guarding the chain head.
const CHAIN_LOCK_KEY: i64 = 0x636f_6f70_6674_7370;

/// Append one footstep, chaining it to the current head.
pub async fn append(pool: &PgPool, actor: Actor, event: FootstepEvent) -> Result<Uuid, sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(CHAIN_LOCK_KEY)
        .execute(&mut *tx)
        .await?;

    let previous: Option<String> =
        sqlx::query_scalar("SELECT event_hash FROM footsteps ORDER BY seq DESC LIMIT 1")
            .fetch_optional(&mut *tx)
            .await?;
    let previous = previous.as_deref().unwrap_or(GENESIS_HASH);

    let step = Footstep::chain(previous, actor, event, Utc::now());

    sqlx::query(
        "INSERT INTO footsteps (id, user_id, organization_id, branch_id, module, activity,
         description, previous_hash, event_hash, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
    )
    .bind(step.id)
    .bind(step.user_id.map(|u| u.into_uuid()))
    .bind(step.organization_id.map(|o| o.into_uuid()))
    .bind(step.branch_id.map(|b| b.into_uuid()))
    .bind(&step.module)
    .bind(step.activity.as_tag())
    .bind(&step.description)
    .bind(&step.previous_hash)
    .bind(&step.event_hash)
    .bind(step.created_at)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(step.id)
}
