//! Board export/import as a single ZIP archive.
//!
//! Layout:
//!
//! ```text
//! state.json        the AppState as UTF-8 JSON (required)
//! images/<blob-id>  raw bytes of each image a card references (optional)
//! ```
//!
//! Image bytes are copied verbatim in both directions. Compression and
//! decompression run on the blocking pool; blob reads and writes go through
//! whichever [`BlobStore`] the caller passes in.

use std::io::{Cursor, Read, Write};
use std::path::Path;

use bytes::Bytes;
use thiserror::Error;
use tracing::{info, warn};
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::blob_store::{validate_blob_id, BlobStore};
use crate::storage::models::AppState;
use crate::store::StoreError;

pub const STATE_ENTRY: &str = "state.json";
pub const IMAGES_PREFIX: &str = "images/";

#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Not a readable ZIP container, or no `state.json` inside.
    #[error("Malformed archive: {0}")]
    Malformed(String),
    #[error("Invalid state document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Archive write error: {0}")]
    Zip(#[from] ZipError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Contents of an archive after decoding, before anything is written.
struct DecodedArchive {
    state: AppState,
    images: Vec<(String, Vec<u8>)>,
}

/// Bundle `state` and every image its cards reference into archive bytes.
///
/// A card whose image is missing from `blobs` keeps its `imageBlobId` in
/// the exported JSON; the archive simply has no entry for it.
pub async fn export_archive<B>(state: &AppState, blobs: &B) -> Result<Vec<u8>, ArchiveError>
where
    B: BlobStore + ?Sized,
{
    let state_json = serde_json::to_vec_pretty(state)?;

    let mut images = Vec::new();
    for id in state.referenced_blob_ids() {
        if validate_blob_id(&id).is_err() {
            warn!(blob_id = %id, "Card references an unusable image id; exporting state only");
            continue;
        }
        match blobs.get(&id).await? {
            Some(data) => images.push((id, data)),
            None => warn!(blob_id = %id, "Card references a missing image; exporting state only"),
        }
    }

    let image_count = images.len();
    let archive = tokio::task::spawn_blocking(move || encode(&state_json, &images)).await??;

    info!(
        zones = state.zones.len(),
        images = image_count,
        bytes = archive.len(),
        "Exported board archive"
    );
    Ok(archive)
}

/// Restore a board from archive bytes.
///
/// Every `images/<id>` entry is written to `blobs` under `<id>`, replacing an
/// existing blob with that id. Blobs not in the archive are left alone. The
/// returned state is not persisted; saving it is up to the caller.
pub async fn import_archive<B>(archive: Vec<u8>, blobs: &B) -> Result<AppState, ArchiveError>
where
    B: BlobStore + ?Sized,
{
    let decoded = tokio::task::spawn_blocking(move || decode(archive)).await??;

    let image_count = decoded.images.len();
    for (id, data) in decoded.images {
        blobs.put(&id, Bytes::from(data)).await?;
    }

    info!(
        zones = decoded.state.zones.len(),
        images = image_count,
        "Imported board archive"
    );
    Ok(decoded.state)
}

pub async fn export_archive_to_file<B>(
    state: &AppState,
    blobs: &B,
    path: &Path,
) -> Result<(), ArchiveError>
where
    B: BlobStore + ?Sized,
{
    let archive = export_archive(state, blobs).await?;
    tokio::fs::write(path, archive).await?;
    Ok(())
}

pub async fn import_archive_from_file<B>(path: &Path, blobs: &B) -> Result<AppState, ArchiveError>
where
    B: BlobStore + ?Sized,
{
    let archive = tokio::fs::read(path).await?;
    import_archive(archive, blobs).await
}

fn encode(state_json: &[u8], images: &[(String, Bytes)]) -> Result<Vec<u8>, ArchiveError> {
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

    zip.start_file(STATE_ENTRY, options)?;
    zip.write_all(state_json)?;

    for (id, data) in images {
        zip.start_file(format!("{IMAGES_PREFIX}{id}"), options)?;
        zip.write_all(data)?;
    }

    Ok(zip.finish()?.into_inner())
}

/// Parse the container and the state document. Nothing is written here, so a
/// failure leaves every store untouched.
fn decode(archive: Vec<u8>) -> Result<DecodedArchive, ArchiveError> {
    let mut zip = ZipArchive::new(Cursor::new(archive))
        .map_err(|e| ArchiveError::Malformed(format!("not a zip archive: {e}")))?;

    let state_json = match zip.by_name(STATE_ENTRY) {
        Ok(mut entry) => read_entry(&mut entry, STATE_ENTRY)?,
        Err(ZipError::FileNotFound) => {
            return Err(ArchiveError::Malformed(format!("missing {STATE_ENTRY}")))
        }
        Err(e) => return Err(ArchiveError::Malformed(e.to_string())),
    };
    let state: AppState = serde_json::from_slice(&state_json)?;

    let mut images = Vec::new();
    for index in 0..zip.len() {
        let mut entry = zip
            .by_index(index)
            .map_err(|e| ArchiveError::Malformed(e.to_string()))?;
        if entry.is_dir() {
            continue;
        }

        let name = entry.name().to_string();
        if name == STATE_ENTRY {
            continue;
        }
        let Some(id) = name.strip_prefix(IMAGES_PREFIX) else {
            warn!(entry = %name, "Skipping unexpected archive entry");
            continue;
        };
        if validate_blob_id(id).is_err() {
            warn!(entry = %name, "Skipping image entry with an unusable id");
            continue;
        }

        let data = read_entry(&mut entry, &name)?;
        images.push((id.to_string(), data));
    }

    Ok(DecodedArchive { state, images })
}

fn read_entry(entry: &mut impl Read, name: &str) -> Result<Vec<u8>, ArchiveError> {
    let mut data = Vec::new();
    entry
        .read_to_end(&mut data)
        .map_err(|e| ArchiveError::Malformed(format!("unreadable entry {name}: {e}")))?;
    Ok(data)
}
