use std::io::Read;

use flate2::read::GzDecoder;

use crate::error::ApiError;
use crate::models::chat_request::ChatRequest;

/// Decode a request body into a `ChatRequest`, inflating it first when the
/// client sent it gzip-compressed. No semantic validation happens here: any
/// model name and any message list (including empty) is accepted.
pub fn decode_chat_request(body: &[u8], gzipped: bool) -> Result<ChatRequest, ApiError> {
    if gzipped {
        let mut decoder = GzDecoder::new(body);
        let mut inflated = Vec::new();
        decoder
            .read_to_end(&mut inflated)
            .map_err(ApiError::Decompression)?;
        serde_json::from_slice(&inflated).map_err(ApiError::InvalidBody)
    } else {
        serde_json::from_slice(body).map_err(ApiError::InvalidBody)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use flate2::write::GzEncoder;
    use flate2::Compression;

    use super::*;

    const BODY: &str = r#"{"model":"gpt-4","messages":[{"role":"user","content":"hi"}],"stream":false}"#;

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_decodes_plain_body() {
        let request = decode_chat_request(BODY.as_bytes(), false).unwrap();
        assert_eq!(request.model, "gpt-4");
        assert!(!request.stream);
    }

    #[test]
    fn test_gzip_body_decodes_identically() {
        let plain = decode_chat_request(BODY.as_bytes(), false).unwrap();
        let compressed = decode_chat_request(&gzip(BODY.as_bytes()), true).unwrap();
        assert_eq!(plain.model, compressed.model);
        assert_eq!(plain.messages.len(), compressed.messages.len());
        assert_eq!(plain.messages[0].content, compressed.messages[0].content);
        assert_eq!(plain.stream, compressed.stream);
    }

    #[test]
    fn test_bad_gzip_is_a_decompression_error() {
        let err = decode_chat_request(b"definitely not gzip", true).unwrap_err();
        assert!(matches!(err, ApiError::Decompression(_)));
    }

    #[test]
    fn test_malformed_json_is_an_invalid_body_error() {
        let err = decode_chat_request(b"{not json", false).unwrap_err();
        assert!(matches!(err, ApiError::InvalidBody(_)));
    }

    #[test]
    fn test_valid_gzip_with_malformed_inner_json() {
        let err = decode_chat_request(&gzip(b"{not json"), true).unwrap_err();
        assert!(matches!(err, ApiError::InvalidBody(_)));
    }
}
