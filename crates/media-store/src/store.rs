use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use core_types::{Category, ImageFormat, ReferencePath};
use serde::Serialize;
use uuid::Uuid;

use crate::{io_error, parse_category, Result};

/// Outcome of a successful write.
#[derive(Debug, Clone, Serialize)]
pub struct StoredImage {
    pub reference: ReferencePath,
    pub path: PathBuf,
    pub format: ImageFormat,
    pub byte_len: usize,
    pub stored_at: DateTime<Utc>,
}

/// Writes decoded images under `<root>/<category>/<uuid>.<ext>`.
#[derive(Debug, Clone)]
pub struct ContentStore {
    root: PathBuf,
}

impl ContentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn category_dir(&self, category: &Category) -> PathBuf {
        self.root.join(category.as_str())
    }

    /// Persist an inline payload and return its reference path.
    pub fn save(&self, category: &str, payload: &str) -> Result<ReferencePath> {
        Ok(self.store(category, payload)?.reference)
    }

    pub fn store(&self, category: &str, payload: &str) -> Result<StoredImage> {
        let decoded = engine::decode(payload)?;
        let category = parse_category(category)?;

        let stem = Uuid::new_v4().to_string();
        let dir = self.category_dir(&category);
        fs::create_dir_all(&dir).map_err(io_error(&dir))?;

        let path = dir.join(format!("{stem}.{}", decoded.extension()));
        write_new_file(&path, |file| file.write_all(&decoded.bytes))?;

        let reference = ReferencePath::new(&category, &stem, decoded.format);
        tracing::info!(
            %reference,
            path = %path.display(),
            len = decoded.bytes.len(),
            "stored image"
        );

        Ok(StoredImage {
            reference,
            path,
            format: decoded.format,
            byte_len: decoded.bytes.len(),
            stored_at: Utc::now(),
        })
    }

    /// Filesystem location a reference maps to, if it has a filename component.
    pub fn resolve(&self, category: &str, reference: &str) -> Result<Option<PathBuf>> {
        resolve_reference(&self.root, category, reference)
    }
}

/// Maps `reference` to `<root>/<category>/<file name>`.
pub(crate) fn resolve_reference(
    root: &Path,
    category: &str,
    reference: &str,
) -> Result<Option<PathBuf>> {
    let category = parse_category(category)?;
    Ok(ReferencePath::file_name_of(reference)
        .map(|name| root.join(category.as_str()).join(name)))
}

/// Create `path` (which must not exist) and fill it with `write`.
///
/// A failed write removes the partial file before the error is returned.
fn write_new_file<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut File) -> io::Result<()>,
{
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(io_error(path))?;

    if let Err(err) = write(&mut file).and_then(|()| file.flush()) {
        drop(file);
        if let Err(cleanup) = fs::remove_file(path) {
            tracing::warn!(path = %path.display(), "failed to remove partial image: {cleanup}");
        }
        return Err(io_error(path)(err));
    }
    Ok(())
}
