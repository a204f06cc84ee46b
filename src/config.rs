use std::path::{Path, PathBuf};

/// Where the dataset lives when nothing else is configured.
pub const DEFAULT_DB_PATH: &str = "data/flights.sqlite3";

/// Flight store configuration
#[derive(Debug, Clone, PartialEq)]
pub struct StoreConfig {
    /// Path to the SQLite database file. It is always opened read-only, so
    /// a missing file is an error rather than a new empty database.
    pub db_path: PathBuf,
}

impl StoreConfig {
    /// Create a config for the given database path
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }
}
