use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the board database
    pub data_dir: String,
    pub blobs: BlobConfig,
    /// Largest image accepted when attaching to a card, in bytes
    pub max_image_size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlobBackend {
    /// Images live in the board database next to the state
    Redb,
    /// Images live as files in a directory
    Local,
}

#[derive(Debug, Clone)]
pub struct BlobConfig {
    pub backend: BlobBackend,
    /// Directory for the local blob backend
    pub local_path: String,
}

impl Default for BlobConfig {
    fn default() -> Self {
        Self {
            backend: BlobBackend::Redb,
            local_path: "./images".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: "./data".to_string(),
            blobs: BlobConfig::default(),
            max_image_size: 10 * 1024 * 1024, // 10MB
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let data_dir = lookup("DATA_DIR").unwrap_or(defaults.data_dir);

        let backend = match lookup("BLOB_BACKEND")
            .unwrap_or_else(|| "redb".to_string())
            .to_lowercase()
            .as_str()
        {
            "local" => BlobBackend::Local,
            _ => BlobBackend::Redb,
        };

        let local_path = lookup("LOCAL_BLOB_PATH").unwrap_or(defaults.blobs.local_path);

        let max_image_size = lookup("MAX_IMAGE_SIZE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.max_image_size);

        let config = Config {
            data_dir,
            blobs: BlobConfig {
                backend,
                local_path,
            },
            max_image_size,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.data_dir.is_empty() {
            return Err(ConfigError::ValidationError(
                "DATA_DIR cannot be empty".to_string(),
            ));
        }

        if self.blobs.backend == BlobBackend::Local && self.blobs.local_path.is_empty() {
            return Err(ConfigError::ValidationError(
                "LOCAL_BLOB_PATH is required when BLOB_BACKEND=local".to_string(),
            ));
        }

        if self.max_image_size == 0 {
            return Err(ConfigError::ValidationError(
                "MAX_IMAGE_SIZE must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}
