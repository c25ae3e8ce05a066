use redb::ReadableTable;

use super::db::{Database, DatabaseError};
use super::tables::IMAGES;

impl Database {
    // ========================================================================
    // Image operations
    // ========================================================================

    /// Store image bytes under the given blob id, overwriting any previous value.
    /// Any string is a valid key, including the empty one.
    pub fn put_image(&self, id: &str, data: &[u8]) -> Result<(), DatabaseError> {
        let write_txn = self.begin_write()?;
        {
            let mut table = write_txn.open_table(IMAGES)?;
            table.insert(id, data)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Get the image bytes stored under a blob id
    pub fn get_image(&self, id: &str) -> Result<Option<Vec<u8>>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(IMAGES)?;

        let data = table.get(id)?.map(|data| data.value().to_vec());
        Ok(data)
    }

    /// Delete an image. Returns whether anything was removed.
    pub fn delete_image(&self, id: &str) -> Result<bool, DatabaseError> {
        let write_txn = self.begin_write()?;
        let mut table = write_txn.open_table(IMAGES)?;
        let removed = table.remove(id)?.is_some();
        drop(table);
        write_txn.commit()?;
        Ok(removed)
    }

    pub fn image_exists(&self, id: &str) -> Result<bool, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(IMAGES)?;
        let exists = table.get(id)?.is_some();
        Ok(exists)
    }

    /// All stored blob ids, in key order
    pub fn list_image_ids(&self) -> Result<Vec<String>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(IMAGES)?;

        let mut ids = Vec::new();
        for result in table.iter()? {
            let (key, _) = result?;
            ids.push(key.value().to_string());
        }

        Ok(ids)
    }
}
