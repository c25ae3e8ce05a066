use super::db::{Database, DatabaseError};
use super::models::AppState;
use super::tables::APP_STATE;

/// Key of the single persisted AppState record.
pub const MAIN_STATE_KEY: &str = "main";

impl Database {
    // ========================================================================
    // State operations
    // ========================================================================

    /// Replace the persisted AppState with the given value
    pub fn put_app_state(&self, state: &AppState) -> Result<(), DatabaseError> {
        let data = rmp_serde::to_vec_named(state)?;

        let write_txn = self.begin_write()?;
        {
            let mut table = write_txn.open_table(APP_STATE)?;
            table.insert(MAIN_STATE_KEY, data.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Get the persisted AppState, if one was ever saved
    pub fn get_app_state(&self) -> Result<Option<AppState>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(APP_STATE)?;

        match table.get(MAIN_STATE_KEY)? {
            Some(data) => {
                let state: AppState = rmp_serde::from_slice(data.value())?;
                Ok(Some(state))
            }
            None => Ok(None),
        }
    }
}
