//! ASCII85 and ASCIIHex decoding.

use crate::error::{PdfError, Result};
use crate::utils::is_ws;

/// Decode ASCII85 data. Whitespace is ignored, `z` expands to four zero
/// bytes, and the `~>` terminator (or end of input) ends the stream.
pub fn decode(data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(data.len() * 4 / 5);
    let mut group = [0u8; 5];
    let mut n = 0usize;
    let mut iter = data.iter().copied().peekable();

    while let Some(b) = iter.next() {
        match b {
            b'~' => break,
            b'z' if n == 0 => out.extend_from_slice(&[0, 0, 0, 0]),
            b'!'..=b'u' => {
                group[n] = b - b'!';
                n += 1;
                if n == 5 {
                    push_group(&mut out, &group, 5);
                    n = 0;
                }
            }
            _ if is_ws(b) => {}
            other => {
                return Err(PdfError::DecodeError(format!(
                    "invalid ascii85 byte 0x{:02x}",
                    other
                )))
            }
        }
    }

    // Partial final group: pad with 'u' and drop the padding output bytes.
    if n == 1 {
        return Err(PdfError::DecodeError("ascii85: dangling single digit".into()));
    }
    if n > 1 {
        for slot in group.iter_mut().take(5).skip(n) {
            *slot = 84;
        }
        push_group(&mut out, &group, n);
    }
    Ok(out)
}

fn push_group(out: &mut Vec<u8>, group: &[u8; 5], n: usize) {
    let mut v: u32 = 0;
    for &d in group {
        v = v.wrapping_mul(85).wrapping_add(d as u32);
    }
    out.extend_from_slice(&v.to_be_bytes()[..n - 1]);
}

/// Decode ASCIIHex data, terminated by `>` or end of input. An odd final
/// digit is padded with zero.
pub fn decode_hex(data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(data.len() / 2);
    let mut hi: Option<u8> = None;
    for &b in data {
        let digit = match b {
            b'>' => break,
            b'0'..=b'9' => b - b'0',
            b'a'..=b'f' => b - b'a' + 10,
            b'A'..=b'F' => b - b'A' + 10,
            _ if is_ws(b) => continue,
            other => {
                return Err(PdfError::DecodeError(format!(
                    "invalid hex byte 0x{:02x}",
                    other
                )))
            }
        };
        match hi.take() {
            Some(h) => out.push(h * 16 + digit),
            None => hi = Some(digit),
        }
    }
    if let Some(h) = hi {
        out.push(h * 16);
    }
    Ok(out)
}

#[cfg(test)]
pub(crate) fn encode_for_tests(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    for chunk in data.chunks(4) {
        let mut buf = [0u8; 4];
        buf[..chunk.len()].copy_from_slice(chunk);
        let mut v = u32::from_be_bytes(buf);
        let mut digits = [0u8; 5];
        for d in digits.iter_mut().rev() {
            *d = (v % 85) as u8 + b'!';
            v /= 85;
        }
        out.extend_from_slice(&digits[..chunk.len() + 1]);
    }
    out.extend_from_slice(b"~>");
    out
}
