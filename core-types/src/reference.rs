use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ImageFormat;

/// URL prefix under which stored images are served.
pub const REFERENCE_PREFIX: &str = "/images";

/// Storage namespace, mapped 1:1 to a single directory under the storage root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Category(String);

impl Category {
    /// Returns `None` for names that are empty, `.`/`..`, or contain a path separator.
    pub fn parse(name: &str) -> Option<Self> {
        if name.is_empty() || name == "." || name == ".." {
            return None;
        }
        if name.contains(['/', '\\', '\0']) {
            return None;
        }
        Some(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Category {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("invalid category name: {value:?}"))
    }
}

impl From<Category> for String {
    fn from(value: Category) -> Self {
        value.0
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Durable `/images/<category>/<stem>.<ext>` string held by an owning record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReferencePath(String);

impl ReferencePath {
    pub fn new(category: &Category, stem: &str, format: ImageFormat) -> Self {
        Self(format!(
            "{REFERENCE_PREFIX}/{}/{stem}.{}",
            category.as_str(),
            format.extension()
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Final path segment of any reference-like string.
    ///
    /// Returns `None` when there is nothing after the last `/`, or when that
    /// segment is `.`/`..`.
    pub fn file_name_of(reference: &str) -> Option<&str> {
        let name = reference.rsplit(['/', '\\']).next()?;
        match name {
            "" | "." | ".." => None,
            name => Some(name),
        }
    }

    pub fn file_name(&self) -> Option<&str> {
        Self::file_name_of(&self.0)
    }
}

impl fmt::Display for ReferencePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ReferencePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_rejects_traversal() {
        assert!(Category::parse("profile").is_some());
        assert!(Category::parse("club-logo").is_some());
        assert!(Category::parse("").is_none());
        assert!(Category::parse("..").is_none());
        assert!(Category::parse("a/b").is_none());
        assert!(Category::parse("a\\b").is_none());
    }

    #[test]
    fn reference_format() {
        let category = Category::parse("profile").unwrap();
        let reference = ReferencePath::new(&category, "abc", ImageFormat::Jpeg);
        assert_eq!(reference.as_str(), "/images/profile/abc.jpg");
        assert_eq!(reference.file_name(), Some("abc.jpg"));
    }

    #[test]
    fn file_name_extraction() {
        assert_eq!(ReferencePath::file_name_of("plain.png"), Some("plain.png"));
        assert_eq!(ReferencePath::file_name_of("/images/profile/"), None);
        assert_eq!(ReferencePath::file_name_of(""), None);
        assert_eq!(ReferencePath::file_name_of("/images/.."), None);
    }

    #[test]
    fn category_deserialization_validates() {
        let ok: Result<Category, _> = serde_json::from_str(r#""profile""#);
        assert!(ok.is_ok());
        let bad: Result<Category, _> = serde_json::from_str(r#""../etc""#);
        assert!(bad.is_err());
    }
}
