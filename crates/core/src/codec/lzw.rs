//! LZWDecode filter, backed by weezl.

use crate::error::{PdfError, Result};
use weezl::{decode::Decoder, BitOrder};

/// Decode LZW data with the PDF parameters (MSB bit order, 8-bit codes,
/// early-change variant).
pub fn decode(data: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = Decoder::with_tiff_size_switch(BitOrder::Msb, 8);
    decoder
        .decode(data)
        .map_err(|e| PdfError::DecodeError(format!("lzw: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use weezl::encode::Encoder;

    #[test]
    fn test_roundtrip() {
        let data = b"aaaaaaabbbbcccd aaaaaaabbbbcccd";
        let encoded = Encoder::with_tiff_size_switch(BitOrder::Msb, 8)
            .encode(data)
            .unwrap();
        assert_eq!(decode(&encoded).unwrap(), data);
    }
}
