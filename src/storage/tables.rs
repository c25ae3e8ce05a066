use redb::TableDefinition;

/// Application state: fixed key "main" -> AppState (msgpack)
pub const APP_STATE: TableDefinition<&str, &[u8]> = TableDefinition::new("appState");

/// Image blobs: imageBlobId -> raw image bytes
pub const IMAGES: TableDefinition<&str, &[u8]> = TableDefinition::new("images");
