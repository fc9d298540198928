//! Grouping glyphs into lines and lines into boxes.

use crate::document::page::Page;
use crate::interp::device::TextDevice;
use crate::layout::elements::{PageLayout, TextBox, TextChar, TextLine};
use crate::layout::params::LaParams;
use crate::utils::{apply_matrix_pt, Matrix, Rect};

/// Collects glyphs for one page and analyzes them on `end_page`.
///
/// Beginning a page discards any previous result, so an aggregator can
/// be driven over a page repeatedly or reused across pages.
pub struct PageAggregator {
    params: LaParams,
    chars: Vec<TextChar>,
    page_bbox: Rect,
    result: Option<PageLayout>,
}

impl PageAggregator {
    pub fn new(params: LaParams) -> Self {
        Self {
            params,
            chars: Vec::new(),
            page_bbox: (0.0, 0.0, 0.0, 0.0),
            result: None,
        }
    }

    /// The layout produced by the last completed page.
    pub fn take_layout(&mut self) -> Option<PageLayout> {
        self.result.take()
    }
}

impl TextDevice for PageAggregator {
    fn begin_page(&mut self, page: &Page, ctm: Matrix) {
        self.chars.clear();
        self.result = None;
        let (x0, y0) = apply_matrix_pt(ctm, (page.mediabox.0, page.mediabox.1));
        let (x1, y1) = apply_matrix_pt(ctm, (page.mediabox.2, page.mediabox.3));
        self.page_bbox = (x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1));
    }

    fn render_char(&mut self, bbox: Rect, byte: u8) {
        self.chars.push(TextChar { bbox, byte });
    }

    fn end_page(&mut self, page: &Page) {
        let lines = build_lines(&self.chars, &self.params);
        let boxes = build_boxes(lines, &self.params);
        self.result = Some(PageLayout {
            pageid: page.pageid,
            bbox: self.page_bbox,
            boxes,
        });
        self.chars.clear();
    }
}

fn voverlap(a: Rect, b: Rect) -> f64 {
    (a.3.min(b.3) - a.1.max(b.1)).max(0.0)
}

/// Vertical distance between two boxes; zero when they overlap.
fn vgap(a: Rect, b: Rect) -> f64 {
    (a.1 - b.3).max(b.1 - a.3).max(0.0)
}

fn hoverlaps(a: Rect, b: Rect) -> bool {
    a.0 <= b.2 && b.0 <= a.2
}

/// Split the glyph run into lines, inserting a space glyph where the
/// horizontal gap reads as a word break.
fn build_lines(chars: &[TextChar], params: &LaParams) -> Vec<TextLine> {
    let mut lines = Vec::new();
    let mut current: Vec<TextChar> = Vec::new();

    for &ch in chars {
        if let Some(&last) = current.last() {
            let size = ch.width().max(ch.height()).max(f64::EPSILON);
            let gap = ch.bbox.0 - last.bbox.2;
            let overlap = voverlap(last.bbox, ch.bbox);
            let min_h = last.height().min(ch.height()).max(f64::EPSILON);
            let same_line = overlap >= params.line_overlap * min_h
                && gap < params.char_margin * size
                && gap > -size;
            if same_line {
                if gap > params.word_margin * size && last.byte != b' ' && ch.byte != b' ' {
                    current.push(TextChar {
                        bbox: (last.bbox.2, ch.bbox.1, ch.bbox.0, ch.bbox.3),
                        byte: b' ',
                    });
                }
                current.push(ch);
                continue;
            }
            lines.push(TextLine::from_chars(&current));
            current.clear();
        }
        current.push(ch);
    }
    if !current.is_empty() {
        lines.push(TextLine::from_chars(&current));
    }
    lines
}

/// Stack consecutive lines into boxes, then order boxes top-to-bottom
/// and left-to-right, lines within a box top-to-bottom.
fn build_boxes(lines: Vec<TextLine>, params: &LaParams) -> Vec<TextBox> {
    let mut boxes: Vec<TextBox> = Vec::new();
    for line in lines {
        let joined = boxes.last().is_some_and(|tbox| {
            let prev = tbox.lines.last().map_or(tbox.bbox, |l| l.bbox);
            let h = line.height().max(f64::EPSILON);
            vgap(prev, line.bbox) <= params.line_margin * h && hoverlaps(prev, line.bbox)
        });
        if joined {
            if let Some(tbox) = boxes.last_mut() {
                tbox.push(line);
                continue;
            }
        }
        boxes.push(TextBox::new(line));
    }

    for tbox in &mut boxes {
        tbox.lines
            .sort_by(|a, b| (-a.bbox.3, a.bbox.0).partial_cmp(&(-b.bbox.3, b.bbox.0)).unwrap_or(std::cmp::Ordering::Equal));
    }
    boxes.sort_by(|a, b| {
        (-a.bbox.3, a.bbox.0)
            .partial_cmp(&(-b.bbox.3, b.bbox.0))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    boxes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ch(x0: f64, y0: f64, x1: f64, y1: f64, byte: u8) -> TextChar {
        TextChar {
            bbox: (x0, y0, x1, y1),
            byte,
        }
    }

    /// Lay out the word's glyphs left to right, 6 units wide, 10 tall.
    fn word(x: f64, y: f64, text: &str) -> Vec<TextChar> {
        text.bytes()
            .enumerate()
            .map(|(i, b)| ch(x + 6.0 * i as f64, y, x + 6.0 * (i + 1) as f64, y + 10.0, b))
            .collect()
    }

    #[test]
    fn test_contiguous_chars_one_line() {
        let chars = word(0.0, 0.0, "Hello");
        let lines = build_lines(&chars, &LaParams::default());
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].bytes, b"Hello");
    }

    #[test]
    fn test_word_gap_inserts_space() {
        let mut chars = word(0.0, 0.0, "Hi");
        chars.extend(word(16.0, 0.0, "there")); // 4-unit gap > word_margin
        let lines = build_lines(&chars, &LaParams::default());
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].bytes, b"Hi there");
    }

    #[test]
    fn test_wide_gap_splits_line() {
        let mut chars = word(0.0, 0.0, "left");
        chars.extend(word(200.0, 0.0, "right")); // far beyond char_margin
        let lines = build_lines(&chars, &LaParams::default());
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn test_different_baselines_split_lines() {
        let mut chars = word(0.0, 100.0, "up");
        chars.extend(word(0.0, 0.0, "down"));
        let lines = build_lines(&chars, &LaParams::default());
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn test_boxes_ordered_top_down_left_right() {
        let params = LaParams::default();
        // Emit bottom text first; ordering must fix it.
        let mut chars = word(0.0, 10.0, "second");
        chars.extend(word(0.0, 500.0, "first"));
        let lines = build_lines(&chars, &params);
        let boxes = build_boxes(lines, &params);
        assert_eq!(boxes.len(), 2);
        assert_eq!(boxes[0].lines[0].bytes, b"first");
        assert_eq!(boxes[1].lines[0].bytes, b"second");
    }

    #[test]
    fn test_adjacent_lines_share_a_box() {
        let params = LaParams::default();
        let mut chars = word(0.0, 10.0, "two");
        chars.extend(word(0.0, 0.0, "one")); // touching vertically
        let lines = build_lines(&chars, &params);
        let boxes = build_boxes(lines, &params);
        assert_eq!(boxes.len(), 1);
        assert_eq!(boxes[0].lines[0].bytes, b"two");
        assert_eq!(boxes[0].lines[1].bytes, b"one");
    }
}
