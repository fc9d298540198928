//! Character-encoding detection for extracted text bytes.
//!
//! Extraction keeps raw bytes end to end; only here, when the caller
//! asks for a `String`, is an encoding chosen. Valid UTF-8 is taken as
//! is, anything else goes through statistical detection.

use crate::error::{PdfError, Result};
use encoding_rs::Encoding;

/// Detection confidence below this is treated as "no usable guess".
pub const CONFIDENCE_THRESHOLD: f32 = 0.20;

/// Guesses the encoding of a byte buffer.
///
/// Implementations return a WHATWG encoding label and a confidence in
/// `0.0..=1.0`. Swappable so callers with domain knowledge (say, known
/// CJK corpora) can plug in their own detector.
pub trait EncodingDetector: Send + Sync {
    fn detect(&self, data: &[u8]) -> (String, f32);
}

/// Default detector backed by chardet.
#[derive(Debug, Default, Clone, Copy)]
pub struct ChardetDetector;

impl EncodingDetector for ChardetDetector {
    fn detect(&self, data: &[u8]) -> (String, f32) {
        let (charset, confidence, _language) = chardet::detect(data);
        (chardet::charset2encoding(&charset).to_string(), confidence)
    }
}

/// Decode extracted bytes to a `String`.
///
/// Empty input gives an empty string; valid UTF-8 short-circuits the
/// detector entirely, which also keeps pure-ASCII extraction fully
/// deterministic.
pub fn decode_text(data: &[u8], detector: &dyn EncodingDetector) -> Result<String> {
    if data.is_empty() {
        return Ok(String::new());
    }
    if let Ok(s) = std::str::from_utf8(data) {
        return Ok(s.to_owned());
    }

    let (label, confidence) = detector.detect(data);
    if confidence < CONFIDENCE_THRESHOLD {
        return Err(PdfError::UnknownEncoding {
            confidence,
            threshold: CONFIDENCE_THRESHOLD,
        });
    }
    let encoding = Encoding::for_label(label.as_bytes()).ok_or(PdfError::UnknownEncoding {
        confidence,
        threshold: CONFIDENCE_THRESHOLD,
    })?;
    log::debug!("decoding {} bytes as {} ({:.2})", data.len(), encoding.name(), confidence);
    let (text, _, _) = encoding.decode(data);
    Ok(text.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        assert_eq!(decode_text(b"", &ChardetDetector).unwrap(), "");
    }

    #[test]
    fn test_utf8_bypasses_detection() {
        struct Panicky;
        impl EncodingDetector for Panicky {
            fn detect(&self, _data: &[u8]) -> (String, f32) {
                panic!("detector must not run for valid UTF-8");
            }
        }
        assert_eq!(decode_text("héllo\u{2014}".as_bytes(), &Panicky).unwrap(), "héllo\u{2014}");
    }

    #[test]
    fn test_custom_detector_drives_decoding() {
        struct Latin1;
        impl EncodingDetector for Latin1 {
            fn detect(&self, _data: &[u8]) -> (String, f32) {
                ("windows-1252".to_string(), 0.99)
            }
        }
        // 0xe9 is é in windows-1252 and invalid as UTF-8.
        assert_eq!(decode_text(b"caf\xe9", &Latin1).unwrap(), "café");
    }

    #[test]
    fn test_low_confidence_is_unknown_encoding() {
        struct Unsure;
        impl EncodingDetector for Unsure {
            fn detect(&self, _data: &[u8]) -> (String, f32) {
                ("ascii".to_string(), 0.05)
            }
        }
        assert!(matches!(
            decode_text(b"\xff\xfe\x99", &Unsure),
            Err(PdfError::UnknownEncoding { .. })
        ));
    }
}
