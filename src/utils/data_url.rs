use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Binary image embedded inline in a backend request.
#[derive(Debug, Clone, PartialEq)]
pub struct InlineImage {
    pub mime_type: String,
    /// Base64 payload, without the `data:` prefix.
    pub data: String,
}

impl InlineImage {
    /// Encodes raw image bytes, sniffing the mime type from the content.
    /// Unknown formats fall back to JPEG, which is what uploads usually are.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mime_type = image::guess_format(bytes)
            .map(|f| f.to_mime_type().to_string())
            .unwrap_or_else(|_| "image/jpeg".to_string());
        Self {
            mime_type,
            data: STANDARD.encode(bytes),
        }
    }

    pub fn to_data_url(&self) -> String {
        to_data_url(&self.mime_type, &self.data)
    }
}

pub fn to_data_url(mime_type: &str, base64_data: &str) -> String {
    format!("data:{};base64,{}", mime_type, base64_data)
}

/// Splits a base64 data URL into `(mime, payload)`.
pub fn parse_data_url(url: &str) -> Option<(&str, &str)> {
    let rest = url.strip_prefix("data:")?;
    let (meta, data) = rest.split_once(',')?;
    let mime = meta.strip_suffix(";base64")?;
    Some((mime, data))
}

/// Decodes the payload of a base64 data URL.
pub fn decode_data_url(url: &str) -> Option<Vec<u8>> {
    let (_, data) = parse_data_url(url)?;
    STANDARD.decode(data.trim()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn tiny_png() -> Vec<u8> {
        let img = image::RgbaImage::from_raw(1, 1, vec![10, 20, 30, 255]).unwrap();
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn test_from_bytes_sniffs_png() {
        let png = tiny_png();
        let inline = InlineImage::from_bytes(&png);
        assert_eq!(inline.mime_type, "image/png");
        assert_eq!(decode_data_url(&inline.to_data_url()).unwrap(), png);
    }

    #[test]
    fn test_unknown_bytes_default_to_jpeg() {
        let inline = InlineImage::from_bytes(b"not an image");
        assert_eq!(inline.mime_type, "image/jpeg");
    }

    #[test]
    fn test_parse_data_url() {
        assert_eq!(parse_data_url("data:image/png;base64,AAAA"), Some(("image/png", "AAAA")));
        assert_eq!(parse_data_url("https://example.com/a.png"), None);
        assert_eq!(parse_data_url("data:image/png,AAAA"), None);
    }
}
