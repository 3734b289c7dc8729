use std::sync::OnceLock;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use core_types::ImageFormat;
use regex::Regex;

/// The payload is not `data:image/(png|jpeg|jpg);base64,<standard base64>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid inline image payload: expected data:image/(png|jpeg|jpg);base64,...")]
pub struct InvalidFormat;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
}

impl DecodedImage {
    pub fn extension(&self) -> &'static str {
        self.format.extension()
    }
}

fn payload_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^data:image/(png|jpeg|jpg);base64,(.+)$").expect("static pattern is valid")
    })
}

/// Decode an inline image payload into raw bytes.
///
/// Bytes are returned exactly as encoded; no image validation or re-encoding
/// takes place.
pub fn decode(payload: &str) -> Result<DecodedImage, InvalidFormat> {
    let captures = payload_pattern().captures(payload).ok_or(InvalidFormat)?;
    let format = ImageFormat::from_subtype(&captures[1]).ok_or(InvalidFormat)?;
    let bytes = STANDARD.decode(&captures[2]).map_err(|_| InvalidFormat)?;
    tracing::debug!(%format, len = bytes.len(), "decoded inline image payload");
    Ok(DecodedImage { bytes, format })
}

/// Build an inline payload for `bytes`.
pub fn encode(format: ImageFormat, bytes: &[u8]) -> String {
    encode_with_mime(&format!("image/{}", format.subtype()), bytes)
}

pub(crate) fn encode_with_mime(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}
