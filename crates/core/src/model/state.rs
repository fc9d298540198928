//! Graphics and text state for content-stream interpretation.

use crate::utils::{Matrix, Point, MATRIX_IDENTITY};

/// Text state: positioning and spacing parameters set by the T* operators.
///
/// Scoped to a single content-stream execution.
#[derive(Debug, Clone)]
pub struct TextState {
    /// Current font resource name (e.g. "F1"), if any.
    pub fontname: Option<String>,
    /// Font size in user units.
    pub fontsize: f64,
    /// Character spacing (Tc).
    pub charspace: f64,
    /// Word spacing (Tw), applied to byte 32.
    pub wordspace: f64,
    /// Horizontal scaling percentage (Tz), 100 = normal.
    pub scaling: f64,
    /// Text leading (TL), stored negated so T* translates by it directly.
    pub leading: f64,
    /// Text rendering mode (Tr).
    pub render: i32,
    /// Text rise (Ts).
    pub rise: f64,
    /// Text line matrix (Tm).
    pub matrix: Matrix,
    /// Position within the current text object.
    pub linematrix: Point,
}

impl TextState {
    pub fn new() -> Self {
        Self {
            fontname: None,
            fontsize: 0.0,
            charspace: 0.0,
            wordspace: 0.0,
            scaling: 100.0,
            leading: 0.0,
            render: 0,
            rise: 0.0,
            matrix: MATRIX_IDENTITY,
            linematrix: (0.0, 0.0),
        }
    }

    /// Reset the text and line matrices, as the BT operator does.
    pub fn reset(&mut self) {
        self.matrix = MATRIX_IDENTITY;
        self.linematrix = (0.0, 0.0);
    }
}

impl Default for TextState {
    fn default() -> Self {
        Self::new()
    }
}

/// Graphics state snapshot: pushed by `q`, popped by `Q`, never mutated
/// across siblings.
#[derive(Debug, Clone)]
pub struct GraphicsState {
    /// Current transformation matrix (page CTM composed with `cm`).
    pub ctm: Matrix,
}

impl GraphicsState {
    pub const fn new(ctm: Matrix) -> Self {
        Self { ctm }
    }
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self::new(MATRIX_IDENTITY)
    }
}
