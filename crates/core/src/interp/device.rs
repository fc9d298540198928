//! Device interface between the interpreter and layout analysis.

use crate::document::page::Page;
use crate::utils::{Matrix, Rect};

/// Receives positioned glyphs as the interpreter executes a page.
///
/// Coordinates are in normalized page space: the page CTM has already
/// folded in /Rotate and the /MediaBox origin, so (0, 0) is the lower
/// left of the page as displayed and y increases upward.
pub trait TextDevice {
    fn begin_page(&mut self, page: &Page, ctm: Matrix);

    /// One glyph. `bbox` is its device-space extent, `byte` the raw code
    /// from the string operand; decoding to text happens much later.
    fn render_char(&mut self, bbox: Rect, byte: u8);

    fn end_page(&mut self, page: &Page);
}

/// Device that counts glyphs and does nothing else. Handy for probing
/// whether a page has any text at all.
#[derive(Debug, Default)]
pub struct NullDevice {
    pub chars: usize,
}

impl TextDevice for NullDevice {
    fn begin_page(&mut self, _page: &Page, _ctm: Matrix) {}

    fn render_char(&mut self, _bbox: Rect, _byte: u8) {
        self.chars += 1;
    }

    fn end_page(&mut self, _page: &Page) {}
}
