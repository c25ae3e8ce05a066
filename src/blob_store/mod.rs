mod local;

pub use local::LocalBlobStore;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::info;

use crate::storage::models::AppState;
use crate::store::StoreError;

/// Abstraction over image blob backends.
/// Keys are opaque `imageBlobId`s; the bytes are stored exactly as given.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `data` under `id`, replacing any previous blob.
    async fn put(&self, id: &str, data: Bytes) -> Result<(), StoreError>;
    async fn get(&self, id: &str) -> Result<Option<Bytes>, StoreError>;
    /// Remove `id`. Absent ids are not an error.
    async fn delete(&self, id: &str) -> Result<(), StoreError>;
    async fn exists(&self, id: &str) -> Result<bool, StoreError>;
    async fn list_ids(&self) -> Result<Vec<String>, StoreError>;
}

/// Reject ids that could not double as a single file or archive entry name.
pub fn validate_blob_id(id: &str) -> Result<(), StoreError> {
    let invalid = id.is_empty()
        || id == "."
        || id == ".."
        || id.contains(['/', '\\', '\0']);

    if invalid {
        return Err(StoreError::InvalidBlobId(id.to_string()));
    }
    Ok(())
}

/// Stored blob ids that no card in `state` references.
pub async fn orphaned_blob_ids<B>(state: &AppState, blobs: &B) -> Result<Vec<String>, StoreError>
where
    B: BlobStore + ?Sized,
{
    let mut ids = blobs.list_ids().await?;
    ids.retain(|id| !state.is_blob_referenced(id));
    Ok(ids)
}

/// Delete every blob not referenced by `state`. Returns how many were removed.
pub async fn prune_orphaned_blobs<B>(state: &AppState, blobs: &B) -> Result<usize, StoreError>
where
    B: BlobStore + ?Sized,
{
    let orphaned = orphaned_blob_ids(state, blobs).await?;
    for id in &orphaned {
        blobs.delete(id).await?;
    }

    info!(removed = orphaned.len(), "Pruned orphaned image blobs");
    Ok(orphaned.len())
}
