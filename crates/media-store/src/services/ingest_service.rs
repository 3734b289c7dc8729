use std::path::PathBuf;

use core_types::INLINE_IMAGE_PREFIX;

use crate::{ContentStore, DeletionResolver, Result};

/// A raw image field value as received from the owning record's update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncomingImage<'a> {
    /// New content to decode and store.
    Inline(&'a str),
    /// A previously issued reference, or any other caller-opaque string.
    StoredReference(&'a str),
}

impl<'a> IncomingImage<'a> {
    pub fn classify(value: &'a str) -> Self {
        if value.starts_with(INLINE_IMAGE_PREFIX) {
            Self::Inline(value)
        } else {
            Self::StoredReference(value)
        }
    }

    pub fn is_inline(&self) -> bool {
        matches!(self, Self::Inline(_))
    }
}

/// Entry point for the owning CRUD layer.
#[derive(Debug, Clone)]
pub struct Ingestor {
    store: ContentStore,
    resolver: DeletionResolver,
}

impl Ingestor {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            store: ContentStore::new(root.clone()),
            resolver: DeletionResolver::new(root),
        }
    }

    pub fn from_parts(store: ContentStore, resolver: DeletionResolver) -> Self {
        Self { store, resolver }
    }

    pub fn store(&self) -> &ContentStore {
        &self.store
    }

    pub fn resolver(&self) -> &DeletionResolver {
        &self.resolver
    }

    /// Store inline content and pass anything else through untouched.
    ///
    /// Feeding a returned reference back in yields the same reference without
    /// writing anything.
    pub fn process(&self, category: &str, value: Option<&str>) -> Result<Option<String>> {
        let Some(value) = value else {
            return Ok(None);
        };
        match IncomingImage::classify(value) {
            IncomingImage::Inline(payload) => {
                let reference = self.store.save(category, payload)?;
                Ok(Some(reference.into_string()))
            }
            IncomingImage::StoredReference(reference) => Ok(Some(reference.to_string())),
        }
    }

    pub fn delete(&self, category: &str, reference: &str) -> Result<()> {
        self.resolver.delete(category, reference)
    }

    /// Process `incoming` for a field that currently holds `previous`.
    ///
    /// An absent `incoming` leaves the field as it was. When the processed
    /// value differs from `previous`, the old image is deleted, but only after
    /// the new one has been written.
    pub fn replace(
        &self,
        category: &str,
        previous: Option<&str>,
        incoming: Option<&str>,
    ) -> Result<Option<String>> {
        if incoming.is_none() {
            return Ok(previous.map(str::to_string));
        }
        let next = self.process(category, incoming)?;
        if let Some(previous) = previous {
            if next.as_deref() != Some(previous) && !IncomingImage::classify(previous).is_inline()
            {
                self.resolver.delete(category, previous)?;
            }
        }
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MediaError;
    use core_types::ImageFormat;
    use std::fs;

    const JPEG: &[u8] = b"\xff\xd8\xff\xdb valid bytes \xff\xd9";

    fn ingestor() -> (tempfile::TempDir, Ingestor) {
        let dir = tempfile::tempdir().unwrap();
        let ingestor = Ingestor::new(dir.path());
        (dir, ingestor)
    }

    fn file_count(dir: &std::path::Path) -> usize {
        fs::read_dir(dir).map(|entries| entries.count()).unwrap_or(0)
    }

    #[test]
    fn classify_by_prefix() {
        assert!(IncomingImage::classify("data:image/png;base64,AAAA").is_inline());
        assert!(IncomingImage::classify("data:image/gif;base64,AAAA").is_inline());
        assert_eq!(
            IncomingImage::classify("/images/profile/a.png"),
            IncomingImage::StoredReference("/images/profile/a.png")
        );
        assert!(!IncomingImage::classify("https://cdn.example/a.png").is_inline());
    }

    #[test]
    fn absent_value_passes_through() {
        let (dir, ingestor) = ingestor();
        assert_eq!(ingestor.process("profile", None).unwrap(), None);
        assert_eq!(file_count(dir.path()), 0);
    }

    #[test]
    fn processed_reference_is_a_fixed_point() {
        let (dir, ingestor) = ingestor();
        let payload = engine::encode(ImageFormat::Png, JPEG);

        let first = ingestor.process("profile", Some(payload.as_str())).unwrap().unwrap();
        let second = ingestor.process("profile", Some(first.as_str())).unwrap().unwrap();
        assert_eq!(first, second);
        assert_eq!(file_count(&dir.path().join("profile")), 1);
    }

    #[test]
    fn opaque_strings_are_returned_unchanged() {
        let (_dir, ingestor) = ingestor();
        let value = "https://cdn.example/logo.png";
        assert_eq!(
            ingestor.process("club-logo", Some(value)).unwrap().as_deref(),
            Some(value)
        );
    }

    #[test]
    fn bad_inline_payload_is_rejected() {
        let (_dir, ingestor) = ingestor();
        let err = ingestor
            .process("profile", Some("data:image/bmp;base64,Qk0="))
            .unwrap_err();
        assert!(matches!(err, MediaError::InvalidFormat(_)));
    }

    #[test]
    fn jpeg_round_trip_through_profile() {
        let (dir, ingestor) = ingestor();
        let payload = engine::encode(ImageFormat::Jpeg, JPEG);

        let reference = ingestor.process("profile", Some(payload.as_str())).unwrap().unwrap();
        assert!(reference.starts_with("/images/profile/"));
        assert!(reference.ends_with(".jpg"));

        let path = ingestor.store().resolve("profile", &reference).unwrap().unwrap();
        assert!(path.starts_with(dir.path()));
        assert_eq!(fs::read(&path).unwrap(), JPEG);

        ingestor.delete("profile", &reference).unwrap();
        assert!(!path.exists());
        ingestor.delete("profile", &reference).unwrap();
    }

    #[test]
    fn replace_deletes_previous_after_new_write() {
        let (dir, ingestor) = ingestor();
        let old = ingestor
            .process("profile", Some(engine::encode(ImageFormat::Png, b"old").as_str()))
            .unwrap()
            .unwrap();
        let old_path = ingestor.store().resolve("profile", &old).unwrap().unwrap();

        let new = ingestor
            .replace(
                "profile",
                Some(old.as_str()),
                Some(engine::encode(ImageFormat::Png, b"new").as_str()),
            )
            .unwrap()
            .unwrap();
        assert_ne!(new, old);
        assert!(!old_path.exists());
        assert_eq!(file_count(&dir.path().join("profile")), 1);
    }

    #[test]
    fn replace_with_same_reference_keeps_file() {
        let (_dir, ingestor) = ingestor();
        let current = ingestor
            .process("profile", Some(engine::encode(ImageFormat::Png, b"keep").as_str()))
            .unwrap()
            .unwrap();
        let path = ingestor.store().resolve("profile", &current).unwrap().unwrap();

        let next = ingestor
            .replace("profile", Some(current.as_str()), Some(current.as_str()))
            .unwrap();
        assert_eq!(next.as_deref(), Some(current.as_str()));
        assert!(path.exists());

        let untouched = ingestor.replace("profile", Some(current.as_str()), None).unwrap();
        assert_eq!(untouched.as_deref(), Some(current.as_str()));
        assert!(path.exists());
    }

    #[test]
    fn failed_replace_keeps_previous() {
        let (_dir, ingestor) = ingestor();
        let current = ingestor
            .process("profile", Some(engine::encode(ImageFormat::Png, b"keep").as_str()))
            .unwrap()
            .unwrap();
        let path = ingestor.store().resolve("profile", &current).unwrap().unwrap();

        let err = ingestor
            .replace("profile", Some(current.as_str()), Some("data:image/png;base64,???"))
            .unwrap_err();
        assert!(matches!(err, MediaError::InvalidFormat(_)));
        assert!(path.exists());
    }
}
