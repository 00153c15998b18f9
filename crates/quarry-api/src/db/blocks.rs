//! Block persistence operations.
//!
//! All functions take a `&PgPool` and operate on the `stone_blocks` table.
//! Lifecycle constraints are enforced at the application layer via
//! [`StoneBlock::dispatch`], with one exception: the dispatch UPDATE is
//! conditional on status, so even a second server instance racing on the
//! same row cannot double-dispatch.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use quarry_core::{BlockId, IdentityToken};
use quarry_state::{BlockStatus, StockAvailability, StoneBlock};

/// Insert a new block record.
///
/// The `identity_token` column is UNIQUE; inserting a duplicate token
/// surfaces as a database error the caller maps to a conflict.
pub async fn insert(pool: &PgPool, block: &StoneBlock) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO stone_blocks (id, identity_token, artifact_ref, name, dimensions,
             category, subcategory, price, price_unit, image_ref, stock_availability,
             stock_quantity, grade, status, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)",
    )
    .bind(block.id.as_uuid())
    .bind(block.identity_token.as_str())
    .bind(&block.artifact_ref)
    .bind(&block.name)
    .bind(&block.dimensions)
    .bind(&block.category)
    .bind(&block.subcategory)
    .bind(block.price)
    .bind(&block.price_unit)
    .bind(&block.image_ref)
    .bind(block.stock_availability.as_str())
    .bind(block.stock_quantity.map(|q| q as i32))
    .bind(&block.grade)
    .bind(block.status.as_str())
    .bind(block.created_at)
    .bind(block.updated_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Delete a block row. Returns whether a row was deleted.
pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM stone_blocks WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Conditionally mark a block dispatched.
///
/// The WHERE clause excludes already-dispatched rows, so the update is
/// atomic at the database: of any number of concurrent dispatch attempts
/// for the same token, exactly one affects a row. Returns whether this
/// attempt was the one.
pub async fn dispatch(
    pool: &PgPool,
    token: &IdentityToken,
    now: DateTime<Utc>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE stone_blocks
         SET status = $1, stock_availability = $2, updated_at = $3
         WHERE identity_token = $4 AND status <> $1",
    )
    .bind(BlockStatus::Dispatched.as_str())
    .bind(StockAvailability::OutOfStock.as_str())
    .bind(now)
    .bind(token.as_str())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Load all blocks from the database into the in-memory store on startup.
pub async fn load_all(pool: &PgPool) -> Result<Vec<StoneBlock>, sqlx::Error> {
    let rows = sqlx::query_as::<_, BlockRow>(
        "SELECT id, identity_token, artifact_ref, name, dimensions, category,
             subcategory, price, price_unit, image_ref, stock_availability,
             stock_quantity, grade, status, created_at, updated_at
         FROM stone_blocks ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().filter_map(BlockRow::into_block).collect())
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct BlockRow {
    id: Uuid,
    identity_token: String,
    artifact_ref: String,
    name: String,
    dimensions: String,
    category: String,
    subcategory: String,
    price: f64,
    price_unit: String,
    image_ref: String,
    stock_availability: String,
    stock_quantity: Option<i32>,
    grade: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl BlockRow {
    /// Convert a row to the domain type.
    ///
    /// Rows with labels no code path can write (a corrupt status or
    /// availability, an empty token) are skipped with an ERROR log rather
    /// than loaded under a guessed state: a block that hydrates as
    /// available when it was dispatched could be dispatched twice.
    fn into_block(self) -> Option<StoneBlock> {
        let status = match BlockStatus::parse(&self.status) {
            Some(status) => status,
            None => {
                tracing::error!(
                    id = %self.id,
                    status = %self.status,
                    "unknown block status in database — skipping row; \
                     investigate: this may indicate prior data corruption"
                );
                return None;
            }
        };

        let stock_availability = match StockAvailability::parse(&self.stock_availability) {
            Some(avail) => avail,
            None => {
                tracing::error!(
                    id = %self.id,
                    stock_availability = %self.stock_availability,
                    "unknown stock availability in database — skipping row"
                );
                return None;
            }
        };

        let identity_token = match IdentityToken::parse(&self.identity_token) {
            Some(token) => token,
            None => {
                tracing::error!(id = %self.id, "empty identity token in database — skipping row");
                return None;
            }
        };

        Some(StoneBlock {
            id: BlockId::from_uuid(self.id),
            identity_token,
            artifact_ref: self.artifact_ref,
            name: self.name,
            dimensions: self.dimensions,
            category: self.category,
            subcategory: self.subcategory,
            price: self.price,
            price_unit: self.price_unit,
            image_ref: self.image_ref,
            stock_availability,
            stock_quantity: self.stock_quantity.map(|q| q as u32),
            grade: self.grade,
            status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
