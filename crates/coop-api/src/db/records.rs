//! Generic record persistence.
//!
//! Every entity kind shares the `records` table. The full record is stored
//! as JSONB in `data`; tenant columns and timestamps are duplicated beside
//! it so the table can be indexed and inspected without unpacking JSON.

use coop_core::Record;
use sqlx::{PgPool, Postgres, Transaction};

fn encode<E: Record>(record: &E) -> Result<serde_json::Value, sqlx::Error> {
    serde_json::to_value(record).map_err(|e| {
        tracing::error!(kind = E::KIND, error = %e, "failed to serialize record");
        sqlx::Error::Encode(Box::new(e))
    })
}

async fn upsert_in<E: Record>(
    tx: &mut Transaction<'_, Postgres>,
    record: &E,
) -> Result<(), sqlx::Error> {
    let data = encode(record)?;
    let deleted_at = record.is_deleted().then(chrono::Utc::now);

    sqlx::query(
        "INSERT INTO records (kind, id, organization_id, branch_id, data, created_at, updated_at, deleted_at)
         VALUES ($1, $2, $3, $4, $5, $6, NOW(), $7)
         ON CONFLICT (kind, id) DO UPDATE
         SET data = EXCLUDED.data,
             updated_at = NOW(),
             deleted_at = COALESCE(records.deleted_at, EXCLUDED.deleted_at)",
    )
    .bind(E::KIND)
    .bind(record.id())
    .bind(record.organization_id().map(|o| o.into_uuid()))
    .bind(record.branch_id().map(|b| b.into_uuid()))
    .bind(&data)
    .bind(record.created_at())
    .bind(deleted_at)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Insert or replace `records` in one transaction.
pub async fn upsert_batch<E: Record>(pool: &PgPool, records: &[E]) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    for record in records {
        upsert_in(&mut tx, record).await?;
    }
    tx.commit().await
}

/// Load every record of kind `E`, including soft-deleted ones.
pub async fn load_all<E: Record>(pool: &PgPool) -> Result<Vec<E>, sqlx::Error> {
    let rows: Vec<serde_json::Value> =
        sqlx::query_scalar("SELECT data FROM records WHERE kind = $1 ORDER BY created_at ASC")
            .bind(E::KIND)
            .fetch_all(pool)
            .await?;

    rows.into_iter()
        .map(|data| {
            serde_json::from_value(data).map_err(|e| {
                tracing::error!(kind = E::KIND, error = %e, "failed to decode stored record");
                sqlx::Error::Decode(Box::new(e))
            })
        })
        .collect()
}
