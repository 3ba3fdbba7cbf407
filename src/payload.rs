//! Inline image payload decoding and validation
//!
//! Turns a client-submitted `data:image/<type>;base64,<data>` string into an
//! [`InlinePayload`]. Pure: no network or disk access.

use crate::mime;
use crate::models::{ImageMime, InlinePayload};
use crate::{Error, Result};
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;
use chrono::Utc;
use regex::Regex;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::LazyLock;

static DATA_URI: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)^data:(image/(png|jpe?g|gif|webp));base64,(.+)$")
        .expect("invalid data URI pattern")
});

// Clients are not consistent about trailing `=` padding or the alphabet.
const LENIENT_CONFIG: GeneralPurposeConfig =
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent);
const LENIENT_STANDARD: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT_CONFIG);
const LENIENT_URL_SAFE: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT_CONFIG);

static LAST_FILENAME_STAMP: AtomicI64 = AtomicI64::new(0);

/// Decode a data URI and enforce the `max_size` byte limit on the decoded bytes.
pub fn decode_data_uri(input: &str, max_size: usize) -> Result<InlinePayload> {
    let caps = DATA_URI
        .captures(input)
        .ok_or_else(|| Error::InvalidFormat("not a base64 image data URI".to_string()))?;

    let content_type = caps[1].to_ascii_lowercase();
    let mime = ImageMime::from_subtype(&caps[2])
        .ok_or_else(|| Error::InvalidFormat(format!("unsupported subtype '{}'", &caps[2])))?;
    let encoded: String = caps[3]
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();

    // Lower bound on the decoded size; skips decoding obviously oversized input.
    let min_decoded = (encoded.len() / 4 * 3).saturating_sub(2);
    if min_decoded > max_size {
        return Err(Error::PayloadTooLarge {
            size: min_decoded,
            max: max_size,
        });
    }

    let bytes = decode_lenient(&encoded)?;

    if bytes.is_empty() {
        return Err(Error::InvalidFormat("empty image payload".to_string()));
    }
    if bytes.len() > max_size {
        return Err(Error::PayloadTooLarge {
            size: bytes.len(),
            max: max_size,
        });
    }

    mime::warn_on_mismatch(mime, &bytes);

    Ok(InlinePayload {
        mime,
        content_type,
        filename: suggested_filename(mime),
        bytes,
    })
}

fn decode_lenient(encoded: &str) -> Result<Vec<u8>> {
    LENIENT_STANDARD
        .decode(encoded)
        .or_else(|_| LENIENT_URL_SAFE.decode(encoded))
        .map_err(|e| Error::InvalidFormat(format!("base64 decode failed: {}", e)))
}

/// `review-image-<millis>.<ext>`, strictly increasing within the process.
pub fn suggested_filename(mime: ImageMime) -> String {
    format!("review-image-{}.{}", next_stamp(), mime.extension())
}

fn next_stamp() -> i64 {
    let now = Utc::now().timestamp_millis();
    let mut last = LAST_FILENAME_STAMP.load(Ordering::Relaxed);
    loop {
        let next = now.max(last + 1);
        match LAST_FILENAME_STAMP.compare_exchange_weak(
            last,
            next,
            Ordering::Relaxed,
            Ordering::Relaxed,
        ) {
            Ok(_) => return next,
            Err(actual) => last = actual,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use std::collections::HashSet;

    const PNG_BYTES: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

    fn data_uri(subtype: &str, bytes: &[u8]) -> String {
        format!("data:image/{};base64,{}", subtype, STANDARD.encode(bytes))
    }

    #[test]
    fn test_decodes_png() {
        let payload = decode_data_uri(&data_uri("png", &PNG_BYTES), 1024).unwrap();
        assert_eq!(payload.mime, ImageMime::Png);
        assert_eq!(payload.content_type, "image/png");
        assert_eq!(payload.bytes, PNG_BYTES.to_vec());
        assert!(payload.filename.starts_with("review-image-"));
        assert!(payload.filename.ends_with(".png"));
    }

    #[test]
    fn test_jpeg_named_jpg_but_mime_preserved() {
        let payload = decode_data_uri(&data_uri("jpeg", &[0xFF, 0xD8, 0xFF, 0xE0]), 1024).unwrap();
        assert_eq!(payload.mime, ImageMime::Jpeg);
        assert_eq!(payload.content_type, "image/jpeg");
        assert!(payload.filename.ends_with(".jpg"));

        let payload = decode_data_uri(&data_uri("jpg", &[0xFF, 0xD8, 0xFF, 0xE0]), 1024).unwrap();
        assert_eq!(payload.content_type, "image/jpg");
        assert!(payload.filename.ends_with(".jpg"));
    }

    #[test]
    fn test_prefix_is_case_insensitive() {
        let uri = format!("DATA:IMAGE/WEBP;BASE64,{}", STANDARD.encode(b"RIFF0000WEBP"));
        let payload = decode_data_uri(&uri, 1024).unwrap();
        assert_eq!(payload.mime, ImageMime::Webp);
        assert_eq!(payload.content_type, "image/webp");
    }

    #[test]
    fn test_missing_padding_is_accepted() {
        let encoded = STANDARD.encode(b"GIF89a!");
        let uri = format!("data:image/gif;base64,{}", encoded.trim_end_matches('='));
        let payload = decode_data_uri(&uri, 1024).unwrap();
        assert_eq!(payload.bytes, b"GIF89a!".to_vec());
    }

    #[test]
    fn test_url_safe_alphabet_is_accepted() {
        let payload = decode_data_uri("data:image/png;base64,-_8=", 1024).unwrap();
        assert_eq!(payload.bytes, vec![0xFB, 0xFF]);

        let payload = decode_data_uri("data:image/png;base64,+/8=", 1024).unwrap();
        assert_eq!(payload.bytes, vec![0xFB, 0xFF]);
    }

    #[test]
    fn test_whitespace_in_payload_is_skipped() {
        let encoded = STANDARD.encode(PNG_BYTES);
        let (head, tail) = encoded.split_at(4);
        let uri = format!("data:image/png;base64,{} {}\r\n", head, tail);

        let payload = decode_data_uri(&uri, 1024).unwrap();
        assert_eq!(payload.bytes, PNG_BYTES.to_vec());
    }

    #[test]
    fn test_rejects_non_data_uri() {
        let err = decode_data_uri("not-an-image", 1024).unwrap_err();
        assert!(matches!(err, Error::InvalidFormat(_)));
    }

    #[test]
    fn test_rejects_disallowed_formats() {
        for uri in [
            "data:image/svg+xml;base64,PHN2Zz4=",
            "data:image/bmp;base64,Qk0=",
            "data:application/pdf;base64,JVBERg==",
            "data:image/png,rawtext",
            "data:image/png;base64,",
        ] {
            let err = decode_data_uri(uri, 1024).unwrap_err();
            assert!(matches!(err, Error::InvalidFormat(_)), "{}", uri);
        }
    }

    #[test]
    fn test_rejects_invalid_base64() {
        let err = decode_data_uri("data:image/png;base64,!!!not-base64!!!", 1024).unwrap_err();
        assert!(matches!(err, Error::InvalidFormat(_)));
    }

    #[test]
    fn test_enforces_max_size_on_decoded_bytes() {
        let bytes = vec![0u8; 101];
        let err = decode_data_uri(&data_uri("png", &bytes), 100).unwrap_err();
        assert!(matches!(
            err,
            Error::PayloadTooLarge { size: 101, max: 100 }
        ));

        let bytes = vec![0u8; 100];
        assert!(decode_data_uri(&data_uri("png", &bytes), 100).is_ok());
    }

    #[test]
    fn test_oversized_text_rejected_before_decoding() {
        // Not valid base64, so only the length pre-check can produce this error.
        let uri = format!("data:image/png;base64,{}", "*".repeat(4000));
        let err = decode_data_uri(&uri, 100).unwrap_err();
        assert!(matches!(err, Error::PayloadTooLarge { .. }));
    }

    #[test]
    fn test_filenames_are_unique() {
        let names: HashSet<String> = (0..500)
            .map(|_| suggested_filename(ImageMime::Png))
            .collect();
        assert_eq!(names.len(), 500);
    }
}
