pub mod deletion;
pub mod services;
pub mod store;

use std::path::PathBuf;
use thiserror::Error;

pub use deletion::DeletionResolver;
pub use services::{IncomingImage, Ingestor};
pub use store::{ContentStore, StoredImage};

#[derive(Debug, Error)]
pub enum MediaError {
    #[error(transparent)]
    InvalidFormat(#[from] engine::InvalidFormat),

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid category name: {0:?}")]
    InvalidCategory(String),
}

pub type Result<T> = std::result::Result<T, MediaError>;

pub(crate) fn io_error(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> MediaError {
    let path = path.into();
    move |source| MediaError::Io { path, source }
}

pub(crate) fn parse_category(name: &str) -> Result<core_types::Category> {
    core_types::Category::parse(name).ok_or_else(|| MediaError::InvalidCategory(name.to_string()))
}
