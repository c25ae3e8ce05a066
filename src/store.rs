//! Async handle over the board database.
//!
//! A [`Store`] is created cheaply and opens its database on first use. The
//! open happens at most once per handle: concurrent first callers wait on the
//! same initialization, and its outcome (including failure) is cached for
//! the lifetime of the handle. Every redb call runs on the blocking pool.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{debug, error, info};

use crate::blob_store::BlobStore;
use crate::storage::models::AppState;
use crate::storage::{Database, DatabaseError, PurgeStats};

#[derive(Debug, Error)]
pub enum StoreError {
    /// The database could not be opened. Cached; later calls fail the same way.
    #[error("Storage initialization failed: {0}")]
    Init(Arc<DatabaseError>),
    #[error("Storage operation failed: {0}")]
    Op(#[from] DatabaseError),
    #[error("Invalid blob id: {0:?}")]
    InvalidBlobId(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub struct Store {
    data_dir: PathBuf,
    db: OnceCell<Result<Database, Arc<DatabaseError>>>,
}

impl Store {
    /// Create a handle for the database in `data_dir` without opening it.
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            db: OnceCell::new(),
        }
    }

    /// Create a handle and open the database immediately.
    pub async fn open<P: AsRef<Path>>(data_dir: P) -> Result<Self, StoreError> {
        let store = Self::new(data_dir);
        store.database().await?;
        Ok(store)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn is_initialized(&self) -> bool {
        self.db.initialized()
    }

    async fn database(&self) -> Result<Database, StoreError> {
        let opened = self
            .db
            .get_or_init(|| open_database(self.data_dir.clone()))
            .await;

        opened.clone().map_err(StoreError::Init)
    }

    async fn run<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Database) -> Result<T, DatabaseError> + Send + 'static,
    {
        let db = self.database().await?;
        let value = tokio::task::spawn_blocking(move || op(&db)).await??;
        Ok(value)
    }

    // ========================================================================
    // State
    // ========================================================================

    /// Persist a detached copy of `state` as the single saved board.
    pub async fn save_state(&self, state: &AppState) -> Result<(), StoreError> {
        let snapshot = state.clone();
        self.run(move |db| db.put_app_state(&snapshot)).await?;
        debug!(zones = state.zones.len(), "Saved board state");
        Ok(())
    }

    /// The most recently saved board, or `None` if nothing was ever saved.
    pub async fn load_state(&self) -> Result<Option<AppState>, StoreError> {
        self.run(|db| db.get_app_state()).await
    }

    /// Delete the saved board and every image blob in the database.
    ///
    /// Images held by another [`BlobStore`] backend are not touched.
    pub async fn reset(&self) -> Result<PurgeStats, StoreError> {
        let stats = self.run(|db| db.purge_all()).await?;
        info!(
            states = stats.states,
            images = stats.images,
            "Reset board database"
        );
        Ok(stats)
    }

    // ========================================================================
    // Blobs
    // ========================================================================

    // Blob ids are opaque keys here. Only backends that map ids onto file
    // names restrict their shape.

    pub async fn put_blob(&self, id: &str, data: Bytes) -> Result<(), StoreError> {
        let key = id.to_string();
        let size = data.len();
        self.run(move |db| db.put_image(&key, &data)).await?;
        debug!(blob_id = id, size, "Stored image blob");
        Ok(())
    }

    pub async fn get_blob(&self, id: &str) -> Result<Option<Bytes>, StoreError> {
        let key = id.to_string();
        let data = self.run(move |db| db.get_image(&key)).await?;
        Ok(data.map(Bytes::from))
    }

    /// Delete a blob. Deleting an id that was never stored succeeds.
    pub async fn delete_blob(&self, id: &str) -> Result<(), StoreError> {
        let key = id.to_string();
        let removed = self.run(move |db| db.delete_image(&key)).await?;
        debug!(blob_id = id, removed, "Deleted image blob");
        Ok(())
    }

    pub async fn blob_exists(&self, id: &str) -> Result<bool, StoreError> {
        let key = id.to_string();
        self.run(move |db| db.image_exists(&key)).await
    }

    pub async fn list_blob_ids(&self) -> Result<Vec<String>, StoreError> {
        self.run(|db| db.list_image_ids()).await
    }
}

async fn open_database(data_dir: PathBuf) -> Result<Database, Arc<DatabaseError>> {
    let dir = data_dir.clone();
    let result = match tokio::task::spawn_blocking(move || Database::open(dir)).await {
        Ok(result) => result,
        Err(e) => Err(DatabaseError::Io(std::io::Error::other(e.to_string()))),
    };

    match result {
        Ok(db) => {
            info!(data_dir = %data_dir.display(), "Database opened");
            Ok(db)
        }
        Err(e) => {
            error!(data_dir = %data_dir.display(), error = %e, "Failed to open database");
            Err(Arc::new(e))
        }
    }
}

#[async_trait]
impl BlobStore for Store {
    async fn put(&self, id: &str, data: Bytes) -> Result<(), StoreError> {
        self.put_blob(id, data).await
    }

    async fn get(&self, id: &str) -> Result<Option<Bytes>, StoreError> {
        self.get_blob(id).await
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.delete_blob(id).await
    }

    async fn exists(&self, id: &str) -> Result<bool, StoreError> {
        self.blob_exists(id).await
    }

    async fn list_ids(&self) -> Result<Vec<String>, StoreError> {
        self.list_blob_ids().await
    }
}
