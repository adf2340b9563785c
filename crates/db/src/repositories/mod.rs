use boa_core::SettingsError;
use thiserror::Error;

pub mod settings;

pub use settings::SqlSettingsStore;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<RepositoryError> for SettingsError {
    fn from(error: RepositoryError) -> Self {
        SettingsError::Backend(error.to_string())
    }
}
