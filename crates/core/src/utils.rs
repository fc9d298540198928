//! Geometry helpers and text cleanup routines.

/// A 2D point (x, y).
pub type Point = (f64, f64);

/// A rectangle (x0, y0, x1, y1); (x0, y0) is bottom-left, (x1, y1) top-right.
pub type Rect = (f64, f64, f64, f64);

/// A 6-element affine transform (a, b, c, d, e, f).
/// Maps (x, y) to (ax + cy + e, bx + dy + f).
pub type Matrix = (f64, f64, f64, f64, f64, f64);

/// Identity transformation matrix.
pub const MATRIX_IDENTITY: Matrix = (1.0, 0.0, 0.0, 1.0, 0.0, 0.0);

/// Multiplies two matrices: applying the result is m1 first, then m0.
pub fn mult_matrix(m1: Matrix, m0: Matrix) -> Matrix {
    let (a1, b1, c1, d1, e1, f1) = m1;
    let (a0, b0, c0, d0, e0, f0) = m0;
    (
        a0 * a1 + c0 * b1,
        b0 * a1 + d0 * b1,
        a0 * c1 + c0 * d1,
        b0 * c1 + d0 * d1,
        a0 * e1 + c0 * f1 + e0,
        b0 * e1 + d0 * f1 + f0,
    )
}

/// Moves the matrix origin to (x, y) in its own coordinate system.
pub fn translate_matrix(m: Matrix, v: Point) -> Matrix {
    let (a, b, c, d, e, f) = m;
    let (x, y) = v;
    (a, b, c, d, x * a + y * c + e, x * b + y * d + f)
}

/// Applies a matrix to a point.
pub fn apply_matrix_pt(m: Matrix, v: Point) -> Point {
    let (a, b, c, d, e, f) = m;
    let (x, y) = v;
    (a * x + c * y + e, b * x + d * y + f)
}

/// Is `b` an ASCII whitespace byte as PDF and text cleanup see it?
pub(crate) const fn is_ws(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n' | b'\x0c' | b'\x00')
}

/// Collapses runs of whitespace into single spaces and trims the ends.
/// Idempotent: applying it twice gives the same string.
pub fn normalise_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for word in text.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

/// Byte-level counterpart of [`normalise_whitespace`], for callers that
/// skip the decoding step and want cleaned raw output.
pub fn normalise_whitespace_bytes(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    for word in data.split(|&b| is_ws(b)).filter(|w| !w.is_empty()) {
        if !out.is_empty() {
            out.push(b' ');
        }
        out.extend_from_slice(word);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mult_matrix_order() {
        // Scale by 2, then translate by (1, 1).
        let scale = (2.0, 0.0, 0.0, 2.0, 0.0, 0.0);
        let shift = (1.0, 0.0, 0.0, 1.0, 1.0, 1.0);
        let m = mult_matrix(scale, shift);
        assert_eq!(apply_matrix_pt(m, (3.0, 4.0)), (7.0, 9.0));
    }

    #[test]
    fn test_translate_matrix_own_space() {
        let m = (0.0, 1.0, -1.0, 0.0, 10.0, 20.0);
        let t = translate_matrix(m, (2.0, 3.0));
        assert_eq!(
            apply_matrix_pt(t, (0.0, 0.0)),
            apply_matrix_pt(m, (2.0, 3.0))
        );
    }

    #[test]
    fn test_normalise_whitespace_collapses_and_trims() {
        assert_eq!(normalise_whitespace("  a \n\t b \x0c "), "a b");
        let once = normalise_whitespace("x   y\nz");
        assert_eq!(normalise_whitespace(&once), once);
    }

    #[test]
    fn test_normalise_whitespace_bytes_matches_str_cleaner() {
        assert_eq!(normalise_whitespace_bytes(b"  a \n\t b \x0c "), b"a b");
        // Non-ASCII bytes pass through untouched; only the gaps collapse.
        assert_eq!(
            normalise_whitespace_bytes(b"caf\xe9\n\nnoir"),
            b"caf\xe9 noir"
        );
    }
}
