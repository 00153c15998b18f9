//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers
//! via the `State` extractor.
//!
//! ## Architecture
//!
//! The in-memory [`Store`] is the read path: every list, lookup, and
//! catalog query is answered from it synchronously. When a database pool
//! is configured, writes go through to Postgres as well and the store is
//! hydrated from it once on startup, so a restart resumes with the full
//! inventory.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;
use sqlx::PgPool;
use uuid::Uuid;

use quarry_blob::BlobStore;
use quarry_state::StoneBlock;

// -- Generic In-Memory Store --------------------------------------------------

/// Thread-safe, cloneable in-memory key-value store.
///
/// All operations are synchronous (the RwLock is `parking_lot`, not `tokio::sync`)
/// because we never hold the lock across `.await` points. `parking_lot::RwLock`
/// is non-poisonable — a panicking writer does not permanently corrupt the store.
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

    /// Retrieve a record by ID.
    pub fn get(&self, id: &Uuid) -> Option<T> {
        self.data.read().get(id).cloned()
    }

    /// List all records.
    pub fn list(&self) -> Vec<T> {
        self.data.read().values().cloned().collect()
    }

    /// Find the first record matching a predicate.
    pub fn find(&self, pred: impl Fn(&T) -> bool) -> Option<(Uuid, T)> {
        self.data
            .read()
            .iter()
            .find(|(_, v)| pred(v))
            .map(|(id, v)| (*id, v.clone()))
    }

    /// Atomically read-validate-update a record.
    ///
    /// The closure receives a `&mut T` and may inspect the current state,
    /// validate preconditions, mutate the record, and return `Ok(R)` or
    /// `Err(E)`. The entire operation runs under a single write lock,
    /// eliminating TOCTOU races between read and update.
    ///
    /// Returns `None` if the record doesn't exist, or `Some(result)` with
    /// the closure's `Result`.
    pub fn try_update<R, E>(
        &self,
        id: &Uuid,
        f: impl FnOnce(&mut T) -> Result<R, E>,
    ) -> Option<Result<R, E>> {
        self.data.write().get_mut(id).map(f)
    }

    /// Remove a record by ID.
    pub fn remove(&self, id: &Uuid) -> Option<T> {
        self.data.write().remove(id)
    }

    /// Check if a record exists.
    pub fn contains(&self, id: &Uuid) -> bool {
        self.data.read().contains_key(id)
    }

    /// Return the number of records.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether the store is empty.
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

/// Application configuration.
///
/// Custom `Debug` redacts the `auth_token` to prevent credential leakage in logs.
#[derive(Clone)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Static bearer token for write-endpoint authentication.
    /// If `None`, authentication is disabled.
    pub auth_token: Option<String>,
    /// Root directory for the content-addressed blob store
    /// (block images and identity artifacts).
    pub blob_root: PathBuf,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field(
                "auth_token",
                &self.auth_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("blob_root", &self.blob_root)
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            auth_token: None,
            blob_root: PathBuf::from("uploads"),
        }
    }
}

/// Shared application state accessible to all route handlers.
///
/// Holds the block inventory store, the blob store for images and identity
/// artifacts, the optional database pool, and application configuration.
/// Clone-friendly via `Arc` internals.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The block inventory. Keyed by block UUID.
    pub blocks: Store<StoneBlock>,

    /// Content-addressed storage for block images and QR identity artifacts.
    pub blobs: BlobStore,

    /// PostgreSQL connection pool for durable persistence.
    /// When `Some`, block writes go through to Postgres in addition to the
    /// in-memory store. When `None`, the API operates in in-memory-only mode.
    pub db_pool: Option<PgPool>,

    pub config: AppConfig,
}

impl AppState {
    /// Create a new application state with default configuration and no database.
    pub fn new() -> Self {
        Self::with_config(AppConfig::default(), None)
    }

    /// Create a new application state with the given configuration and
    /// optional database pool.
    pub fn with_config(config: AppConfig, db_pool: Option<PgPool>) -> Self {
        let blobs = BlobStore::new(config.blob_root.clone());
        Self {
            blocks: Store::new(),
            blobs,
            db_pool,
            config,
        }
    }

    /// Look up a block by its identity token.
    pub fn find_by_token(&self, token: &quarry_core::IdentityToken) -> Option<(Uuid, StoneBlock)> {
        self.blocks.find(|b| &b.identity_token == token)
    }

    /// Hydrate the in-memory store from the database.
    ///
    /// Called once on startup when a database pool is available. Loads all
    /// persisted blocks so that read operations remain fast and synchronous.
    pub async fn hydrate_from_db(&self) -> Result<(), String> {
        let pool = match &self.db_pool {
            Some(pool) => pool,
            None => return Ok(()),
        };

        let blocks = crate::db::blocks::load_all(pool)
            .await
            .map_err(|e| format!("failed to load blocks: {e}"))?;
        let block_count = blocks.len();
        for block in blocks {
            self.blocks.insert(*block.id.as_uuid(), block);
        }

        tracing::info!(blocks = block_count, "Hydrated in-memory store from database");

        Ok(())
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use quarry_core::{BlockId, IdentityToken};
    use quarry_state::{BlockStatus, StockAvailability, DEFAULT_GRADE};

    fn sample_block(id: Uuid) -> StoneBlock {
        let now = Utc::now();
        StoneBlock {
            id: BlockId::from_uuid(id),
            identity_token: IdentityToken::from(Uuid::new_v4()),
            artifact_ref: "artifacts/aa.png".to_string(),
            name: "Black Granite".to_string(),
            dimensions: "2x1x1 m".to_string(),
            category: "black".to_string(),
            subcategory: "granite".to_string(),
            price: 120.0,
            price_unit: "per ton".to_string(),
            image_ref: "images/bb.jpg".to_string(),
            stock_availability: StockAvailability::InStock,
            stock_quantity: Some(4),
            grade: DEFAULT_GRADE.to_string(),
            status: BlockStatus::Registered,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn store_insert_and_get_roundtrip() {
        let store = Store::new();
        let id = Uuid::new_v4();
        let prev = store.insert(id, sample_block(id));
        assert!(prev.is_none(), "first insert should return None");

        let retrieved = store.get(&id).unwrap();
        assert_eq!(retrieved.name, "Black Granite");
    }

    #[test]
    fn store_insert_returns_previous_value() {
        let store = Store::new();
        let id = Uuid::new_v4();
        store.insert(id, sample_block(id));
        let prev = store.insert(id, sample_block(id));
        assert!(prev.is_some(), "second insert should return previous value");
    }

    #[test]
    fn store_list_returns_all_items() {
        let store = Store::new();
        let ids: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        for &id in &ids {
            store.insert(id, sample_block(id));
        }
        assert_eq!(store.list().len(), 3);
    }

    #[test]
    fn store_find_matches_predicate() {
        let store = Store::new();
        let id = Uuid::new_v4();
        let block = sample_block(id);
        let token = block.identity_token.clone();
        store.insert(id, block);

        let (found_id, found) = store.find(|b| b.identity_token == token).unwrap();
        assert_eq!(found_id, id);
        assert_eq!(found.identity_token, token);

        assert!(store.find(|b| b.name == "nope").is_none());
    }

    #[test]
    fn store_try_update_runs_under_one_lock() {
        let store = Store::new();
        let id = Uuid::new_v4();
        store.insert(id, sample_block(id));

        let result: Option<Result<(), &str>> = store.try_update(&id, |b| {
            if b.status == BlockStatus::Dispatched {
                return Err("already dispatched");
            }
            b.status = BlockStatus::Dispatched;
            Ok(())
        });
        assert!(matches!(result, Some(Ok(()))));

        let second: Option<Result<(), &str>> = store.try_update(&id, |b| {
            if b.status == BlockStatus::Dispatched {
                return Err("already dispatched");
            }
            Ok(())
        });
        assert!(matches!(second, Some(Err("already dispatched"))));
    }

    #[test]
    fn store_try_update_returns_none_for_missing_key() {
        let store: Store<StoneBlock> = Store::new();
        let result: Option<Result<(), ()>> = store.try_update(&Uuid::new_v4(), |_| Ok(()));
        assert!(result.is_none());
    }

    #[test]
    fn store_remove_deletes_item() {
        let store = Store::new();
        let id = Uuid::new_v4();
        store.insert(id, sample_block(id));
        assert_eq!(store.len(), 1);

        let removed = store.remove(&id);
        assert!(removed.is_some());
        assert!(store.is_empty());
        assert!(store.get(&id).is_none());
    }

    #[test]
    fn store_clone_shares_underlying_data() {
        let store = Store::new();
        let id = Uuid::new_v4();
        store.insert(id, sample_block(id));

        let clone = store.clone();
        assert!(clone.contains(&id));

        let id2 = Uuid::new_v4();
        clone.insert(id2, sample_block(id2));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn app_config_debug_redacts_token() {
        let config = AppConfig {
            auth_token: Some("super-secret".to_string()),
            ..Default::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn app_state_new_creates_empty_store() {
        let state = AppState::new();
        assert!(state.blocks.is_empty());
        assert!(state.db_pool.is_none());
        assert_eq!(state.config.port, 8080);
    }

    #[test]
    fn find_by_token_scans_the_store() {
        let state = AppState::new();
        let id = Uuid::new_v4();
        let block = sample_block(id);
        let token = block.identity_token.clone();
        state.blocks.insert(id, block);

        let (found_id, _) = state.find_by_token(&token).unwrap();
        assert_eq!(found_id, id);

        let other = IdentityToken::from(Uuid::new_v4());
        assert!(state.find_by_token(&other).is_none());
    }
}
