pub mod codec;
pub mod crop;
pub mod source;

pub use codec::{decode, encode, DecodedImage, InvalidFormat};
pub use crop::{CropConfig, CropListener, CropTracker, DisplayRect, SourceSize};
pub use source::{SelectedSource, SourceSelector};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Selected file is not an image (content type {content_type:?})")]
    NotAnImage { content_type: String },

    #[error(transparent)]
    InvalidFormat(#[from] InvalidFormat),
}

pub type Result<T> = std::result::Result<T, EngineError>;
