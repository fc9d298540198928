//! Renders an analyzed page layout to a plain-text byte buffer.

use crate::layout::elements::PageLayout;

/// Form feed separating pages in joined output.
pub const PAGE_SEPARATOR: u8 = 0x0c;

/// Flatten a page layout: every line ends with a newline, the page ends
/// with a form feed. Boxes are already in reading order.
pub fn render_page(layout: &PageLayout) -> Vec<u8> {
    let mut out = Vec::new();
    for tbox in &layout.boxes {
        for line in &tbox.lines {
            out.extend_from_slice(&line.bytes);
            out.push(b'\n');
        }
    }
    out.push(PAGE_SEPARATOR);
    out
}
