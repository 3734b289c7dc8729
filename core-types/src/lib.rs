use serde::{Deserialize, Serialize};

/// Leading text shared by every inline image payload.
pub const INLINE_IMAGE_PREFIX: &str = "data:image";

/// Axis-aligned crop region in source-image pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// True when the rectangle lies entirely inside a `width` x `height` source.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.x as u64 + self.width as u64 <= width as u64
            && self.y as u64 + self.height as u64 <= height as u64
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Image subtypes accepted in an inline payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
    Jpeg,
    Jpg,
}

impl ImageFormat {
    pub fn from_subtype(subtype: &str) -> Option<Self> {
        match subtype {
            "png" => Some(Self::Png),
            "jpeg" => Some(Self::Jpeg),
            "jpg" => Some(Self::Jpg),
            _ => None,
        }
    }

    pub fn subtype(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::Jpg => "jpg",
        }
    }

    /// Extension used on disk. `jpeg` is stored as `jpg`.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg | Self::Jpg => "jpg",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg | Self::Jpg => "image/jpeg",
        }
    }
}

impl std::fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.subtype())
    }
}

pub mod reference;

pub use reference::{Category, ReferencePath, REFERENCE_PREFIX};
