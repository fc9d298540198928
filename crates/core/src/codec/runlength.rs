//! RunLengthDecode filter.

use crate::error::{PdfError, Result};

/// Decode run-length data: a length byte 0..=127 copies that many+1
/// literal bytes, 129..=255 repeats the next byte 257-length times, and
/// 128 ends the stream.
pub fn decode(data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(data.len() * 2);
    let mut i = 0usize;
    while i < data.len() {
        let length = data[i];
        i += 1;
        match length {
            128 => break,
            0..=127 => {
                let n = length as usize + 1;
                let chunk = data
                    .get(i..i + n)
                    .ok_or_else(|| PdfError::DecodeError("runlength: truncated literal".into()))?;
                out.extend_from_slice(chunk);
                i += n;
            }
            _ => {
                let b = *data
                    .get(i)
                    .ok_or_else(|| PdfError::DecodeError("runlength: truncated run".into()))?;
                i += 1;
                out.extend(std::iter::repeat(b).take(257 - length as usize));
            }
        }
    }
    Ok(out)
}
