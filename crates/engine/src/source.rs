use std::io::Cursor;
use std::path::Path;

use image::ImageReader;

use crate::codec::encode_with_mime;
use crate::{EngineError, Result};

/// A user-chosen file loaded for local preview.
#[derive(Debug, Clone)]
pub struct SelectedSource {
    pub content_type: String,
    /// Full file contents as an inline payload.
    pub data_uri: String,
    /// Pixel dimensions, when the header is in a format the probe understands.
    pub dimensions: Option<(u32, u32)>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SourceSelector;

impl SourceSelector {
    pub fn new() -> Self {
        Self
    }

    /// Check that `path` is an image and load it as a data URI.
    ///
    /// `declared_type` is the content type reported alongside the file; when
    /// absent it is guessed from the extension. Anything outside `image/*` is
    /// refused before the file is read.
    pub async fn select<P: AsRef<Path>>(
        &self,
        path: P,
        declared_type: Option<&str>,
    ) -> Result<SelectedSource> {
        let path = path.as_ref();
        let content_type = match declared_type {
            Some(declared) => declared.trim().to_string(),
            None => mime_guess::from_path(path)
                .first_raw()
                .unwrap_or("application/octet-stream")
                .to_string(),
        };
        Self::check_content_type(&content_type)?;

        let bytes = tokio::fs::read(path).await?;
        let dimensions = probe_dimensions(&bytes);
        tracing::debug!(
            path = %path.display(),
            %content_type,
            len = bytes.len(),
            ?dimensions,
            "loaded image source"
        );

        Ok(SelectedSource {
            data_uri: encode_with_mime(&content_type, &bytes),
            content_type,
            dimensions,
        })
    }

    pub fn check_content_type(content_type: &str) -> Result<()> {
        if content_type.starts_with("image/") {
            Ok(())
        } else {
            Err(EngineError::NotAnImage {
                content_type: content_type.to_string(),
            })
        }
    }
}

fn probe_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()?
        .into_dimensions()
        .ok()
}
