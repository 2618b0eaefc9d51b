use thiserror::Error;

use storefront_core::recommendations::DataAccessError;

pub mod catalog;
pub mod interaction;

pub use catalog::SqlCatalogRepository;
pub use interaction::SqlInteractionRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<RepositoryError> for DataAccessError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::Database(source) => DataAccessError::Unavailable(source.to_string()),
            RepositoryError::Decode(message) => DataAccessError::Decode(message),
        }
    }
}

fn decode_err(error: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::Decode(error.to_string())
}
