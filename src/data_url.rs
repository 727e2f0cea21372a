//! Decoding of `data:image/...;base64,` payloads used for avatar and recipe
//! image uploads.

use base64::Engine;

/// Parse a base64 image data URL into its content type and raw bytes.
pub fn parse_image_data_url(input: &str) -> Result<(String, Vec<u8>), &'static str> {
    let rest = input
        .strip_prefix("data:")
        .ok_or("Expected a data:image/... URL")?;

    let (content_type, payload) = rest
        .split_once(";base64,")
        .ok_or("Expected base64-encoded image data")?;

    if !content_type.starts_with("image/") || content_type.len() <= "image/".len() {
        return Err("Expected an image content type");
    }

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|_| "Invalid base64 image data")?;

    if bytes.is_empty() {
        return Err("Image data is empty");
    }

    Ok((content_type.to_string(), bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;

    #[test]
    fn test_parse_png_data_url() {
        let encoded = base64::engine::general_purpose::STANDARD.encode([1u8, 2, 3]);
        let (content_type, bytes) =
            parse_image_data_url(&format!("data:image/png;base64,{}", encoded)).unwrap();
        assert_eq!(content_type, "image/png");
        assert_eq!(bytes, vec![1, 2, 3]);
    }

    #[test]
    fn test_rejects_missing_prefix() {
        assert!(parse_image_data_url("image/png;base64,AAAA").is_err());
    }

    #[test]
    fn test_rejects_non_image() {
        let encoded = base64::engine::general_purpose::STANDARD.encode(b"hi");
        assert!(parse_image_data_url(&format!("data:text/plain;base64,{}", encoded)).is_err());
    }

    #[test]
    fn test_rejects_bad_base64() {
        assert!(parse_image_data_url("data:image/png;base64,!!!").is_err());
    }

    #[test]
    fn test_rejects_empty_payload() {
        assert!(parse_image_data_url("data:image/png;base64,").is_err());
    }
}
