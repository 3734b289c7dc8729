use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::store::resolve_reference;
use crate::{io_error, Result};

/// Removes stored images given the reference an owning record held.
///
/// Deleting something that is already gone succeeds, so callers holding
/// stale references never fail the surrounding operation.
#[derive(Debug, Clone)]
pub struct DeletionResolver {
    root: PathBuf,
}

impl DeletionResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn delete(&self, category: &str, reference: &str) -> Result<()> {
        let Some(path) = resolve_reference(&self.root, category, reference)? else {
            tracing::warn!(%reference, "reference has no file name; nothing to delete");
            return Ok(());
        };

        let metadata = match fs::symlink_metadata(&path) {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "image already absent");
                return Ok(());
            }
            Err(err) => return Err(io_error(&path)(err)),
        };
        if !metadata.is_file() {
            tracing::debug!(path = %path.display(), "not a regular file; leaving in place");
            return Ok(());
        }

        match fs::remove_file(&path) {
            Ok(()) => {
                tracing::info!(path = %path.display(), "deleted image");
                Ok(())
            }
            // lost a race with another delete
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(io_error(&path)(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ContentStore, MediaError};
    use core_types::{ImageFormat, ReferencePath};

    fn saved(root: &Path, category: &str) -> (String, PathBuf) {
        let store = ContentStore::new(root);
        let stored = store
            .store(category, &engine::encode(ImageFormat::Png, b"png bytes"))
            .unwrap();
        (stored.reference.into_string(), stored.path)
    }

    #[test]
    fn delete_removes_file_and_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let (reference, path) = saved(dir.path(), "profile");
        let resolver = DeletionResolver::new(dir.path());

        resolver.delete("profile", &reference).unwrap();
        assert!(!path.exists());
        resolver.delete("profile", &reference).unwrap();
        // the category directory is left behind
        assert!(dir.path().join("profile").is_dir());
    }

    #[test]
    fn missing_category_directory_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        DeletionResolver::new(dir.path())
            .delete("never-written", "/images/never-written/abc.png")
            .unwrap();
    }

    #[test]
    fn reference_without_file_name_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = DeletionResolver::new(dir.path());
        resolver.delete("profile", "").unwrap();
        resolver.delete("profile", "/images/profile/").unwrap();
        resolver.delete("profile", "/images/profile/..").unwrap();
    }

    #[test]
    fn only_the_final_segment_is_used() {
        let dir = tempfile::tempdir().unwrap();
        let (reference, path) = saved(dir.path(), "profile");
        let name = ReferencePath::file_name_of(&reference).unwrap().to_string();

        // a reference recorded under another prefix still resolves by file name
        DeletionResolver::new(dir.path())
            .delete("profile", &format!("/legacy/uploads/{name}"))
            .unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn deletes_exactly_what_the_store_resolves() {
        let dir = tempfile::tempdir().unwrap();
        let (reference, path) = saved(dir.path(), "club-logo");
        let (other, other_path) = saved(dir.path(), "club-logo");

        let resolved = ContentStore::new(dir.path())
            .resolve("club-logo", &reference)
            .unwrap()
            .unwrap();
        assert_eq!(resolved, path);

        DeletionResolver::new(dir.path())
            .delete("club-logo", &reference)
            .unwrap();
        assert!(!resolved.exists());
        assert!(other_path.exists(), "{other} must survive");
    }

    #[test]
    fn directories_are_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("profile").join("keep");
        fs::create_dir_all(&nested).unwrap();

        DeletionResolver::new(dir.path())
            .delete("profile", "/images/profile/keep")
            .unwrap();
        assert!(nested.is_dir());
    }

    #[test]
    fn invalid_category_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = DeletionResolver::new(dir.path())
            .delete("../elsewhere", "/images/x/abc.png")
            .unwrap_err();
        assert!(matches!(err, MediaError::InvalidCategory(_)));
    }
}
