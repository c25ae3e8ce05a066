use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};

use super::{validate_blob_id, BlobStore};
use crate::store::StoreError;

/// Image blobs as plain files in one directory, one file per blob id.
pub struct LocalBlobStore {
    base_path: PathBuf,
}

impl LocalBlobStore {
    pub fn new<P: AsRef<Path>>(base_path: P) -> Result<Self, std::io::Error> {
        let base_path = base_path.as_ref().to_path_buf();
        std::fs::create_dir_all(&base_path)?;
        Ok(Self { base_path })
    }

    fn blob_path(&self, id: &str) -> Result<PathBuf, StoreError> {
        validate_blob_id(id)?;
        Ok(self.base_path.join(id))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(&self, id: &str, data: Bytes) -> Result<(), StoreError> {
        let path = self.blob_path(id)?;
        tokio::fs::write(&path, &data).await?;
        tracing::debug!(blob_id = id, size = data.len(), "Stored image blob");
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Bytes>, StoreError> {
        let path = self.blob_path(id)?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let path = self.blob_path(id)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, id: &str) -> Result<bool, StoreError> {
        let path = self.blob_path(id)?;
        Ok(tokio::fs::try_exists(&path).await?)
    }

    async fn list_ids(&self) -> Result<Vec<String>, StoreError> {
        let mut ids = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.base_path).await?;
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                ids.push(name.to_string());
            }
        }
        ids.sort();
        Ok(ids)
    }
}
