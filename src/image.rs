//! Image payloads and base64 data-URI encoding
//!
//! Uploaded bytes are opaque to this crate; the declared format is restricted
//! to the media types the vision endpoint accepts.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};

/// Accepted image media types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpeg,
    Png,
    WebP,
}

impl ImageFormat {
    /// MIME type used in the outbound data URI.
    pub fn mime(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::WebP => "image/webp",
        }
    }

    /// Look up a format from a file extension. Returns `None` for anything
    /// outside the allow-list.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "webp" => Some(Self::WebP),
            _ => None,
        }
    }

    /// Look up a format from a declared MIME type.
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime.to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            "image/webp" => Some(Self::WebP),
            _ => None,
        }
    }
}

/// An uploaded image: raw bytes plus the declared format.
///
/// Immutable once constructed; one payload feeds one or more analysis
/// invocations and is replaced wholesale when a new image is supplied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    bytes: Vec<u8>,
    format: ImageFormat,
}

impl ImagePayload {
    pub fn new(bytes: Vec<u8>, format: ImageFormat) -> Self {
        Self { bytes, format }
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Base64 encoding of the raw bytes (standard alphabet, padded).
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    /// Self-contained `data:` URI carrying the payload's own media type.
    pub fn to_data_uri(&self) -> String {
        self.to_data_uri_as(self.format)
    }

    /// `data:` URI declaring `format` regardless of the payload's own type.
    pub fn to_data_uri_as(&self, format: ImageFormat) -> String {
        format!("data:{};base64,{}", format.mime(), self.to_base64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_lookup() {
        assert_eq!(ImageFormat::from_extension("jpg"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_extension("JPEG"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_extension("png"), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::from_extension("webp"), Some(ImageFormat::WebP));
        assert_eq!(ImageFormat::from_extension("gif"), None);
        assert_eq!(ImageFormat::from_extension(""), None);
    }

    #[test]
    fn test_mime_lookup() {
        assert_eq!(ImageFormat::from_mime("image/jpeg"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_mime("image/jpg"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_mime("image/webp"), Some(ImageFormat::WebP));
        assert_eq!(ImageFormat::from_mime("image/gif"), None);
    }

    #[test]
    fn test_base64_encoding() {
        let payload = ImagePayload::new(b"hello".to_vec(), ImageFormat::Png);
        assert_eq!(payload.to_base64(), "aGVsbG8=");
    }

    #[test]
    fn test_data_uri_preserves_declared_type() {
        let payload = ImagePayload::new(b"x".to_vec(), ImageFormat::WebP);
        assert!(payload.to_data_uri().starts_with("data:image/webp;base64,"));
    }

    #[test]
    fn test_data_uri_with_forced_type() {
        let payload = ImagePayload::new(b"x".to_vec(), ImageFormat::Png);
        let uri = payload.to_data_uri_as(ImageFormat::Jpeg);
        assert!(uri.starts_with("data:image/jpeg;base64,"));
    }

    #[test]
    fn test_empty_payload() {
        let payload = ImagePayload::new(Vec::new(), ImageFormat::Jpeg);
        assert!(payload.is_empty());
        assert_eq!(payload.to_base64(), "");
    }
}
