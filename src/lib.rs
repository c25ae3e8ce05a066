//! taskboard - local persistence and data interchange for a zone-based task board
//!
//! This crate provides the storage core behind the board UI:
//! - redb embedded database holding the single AppState record and image blobs
//! - Swappable image blob backends (database table, local directory)
//! - ZIP export/import of the whole board, images included
//! - Deadline countdown text for cards

pub mod archive;
pub mod blob_store;
pub mod config;
pub mod deadline;
pub mod storage;
pub mod store;
#[cfg(test)]
pub mod testutil;

pub use archive::{export_archive, import_archive, ArchiveError};
pub use blob_store::{BlobStore, LocalBlobStore};
pub use deadline::{compute_deadline_info, deadline_info, DeadlineInfo};
pub use storage::models::{create_default_state, AppState};
pub use store::{Store, StoreError};

/// Load the saved board, persisting and returning the default board when
/// nothing has been saved yet.
pub async fn load_or_init_state(store: &Store) -> Result<AppState, StoreError> {
    if let Some(state) = store.load_state().await? {
        return Ok(state);
    }

    tracing::info!("No saved board found, creating the default board");
    let state = create_default_state();
    store.save_state(&state).await?;
    Ok(state)
}
