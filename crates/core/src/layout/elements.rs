//! Layout elements, all in normalized page space.

use crate::utils::Rect;

fn union(a: Rect, b: Rect) -> Rect {
    (a.0.min(b.0), a.1.min(b.1), a.2.max(b.2), a.3.max(b.3))
}

/// One glyph: its box and the raw byte it came from.
#[derive(Debug, Clone, Copy)]
pub struct TextChar {
    pub bbox: Rect,
    pub byte: u8,
}

impl TextChar {
    pub fn width(&self) -> f64 {
        self.bbox.2 - self.bbox.0
    }

    pub fn height(&self) -> f64 {
        self.bbox.3 - self.bbox.1
    }
}

/// A horizontal run of glyphs, word gaps already materialized as spaces.
#[derive(Debug, Clone)]
pub struct TextLine {
    pub bbox: Rect,
    pub bytes: Vec<u8>,
}

impl TextLine {
    pub(crate) fn from_chars(chars: &[TextChar]) -> Self {
        let bbox = chars
            .iter()
            .map(|c| c.bbox)
            .reduce(union)
            .unwrap_or((0.0, 0.0, 0.0, 0.0));
        Self {
            bbox,
            bytes: chars.iter().map(|c| c.byte).collect(),
        }
    }

    pub fn height(&self) -> f64 {
        self.bbox.3 - self.bbox.1
    }
}

/// A paragraph-like stack of lines.
#[derive(Debug, Clone)]
pub struct TextBox {
    pub bbox: Rect,
    pub lines: Vec<TextLine>,
}

impl TextBox {
    pub(crate) fn new(first: TextLine) -> Self {
        Self {
            bbox: first.bbox,
            lines: vec![first],
        }
    }

    pub(crate) fn push(&mut self, line: TextLine) {
        self.bbox = union(self.bbox, line.bbox);
        self.lines.push(line);
    }
}

/// Analyzed layout of one page.
#[derive(Debug, Clone)]
pub struct PageLayout {
    pub pageid: u32,
    pub bbox: Rect,
    pub boxes: Vec<TextBox>,
}
