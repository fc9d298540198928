//! Layout analysis tuning parameters.

/// Geometry thresholds for grouping glyphs, all relative to glyph or
/// line size so they are resolution independent.
#[derive(Debug, Clone)]
pub struct LaParams {
    /// Minimum vertical overlap (fraction of the smaller height) for two
    /// glyphs to share a line.
    pub line_overlap: f64,
    /// Maximum horizontal gap (in glyph widths) inside one line.
    pub char_margin: f64,
    /// Horizontal gap (in glyph widths) that reads as a word break.
    pub word_margin: f64,
    /// Maximum vertical gap (in line heights) inside one text box.
    pub line_margin: f64,
}

impl Default for LaParams {
    fn default() -> Self {
        Self {
            line_overlap: 0.5,
            char_margin: 1.0,
            word_margin: 0.1,
            line_margin: 0.1,
        }
    }
}
