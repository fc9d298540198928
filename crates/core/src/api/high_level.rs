//! The extraction facade: open a PDF, get its text.

use crate::converter;
use crate::document::catalog::Document;
use crate::encoding::{decode_text, ChardetDetector, EncodingDetector};
use crate::error::Result;
use crate::interp::interpreter::PageInterpreter;
use crate::layout::analysis::PageAggregator;
use crate::layout::params::LaParams;
use crate::model::objects::PdfObject;
use crate::utils::{normalise_whitespace, normalise_whitespace_bytes};
use bytes::Bytes;
use rayon::prelude::*;
use std::collections::HashMap;
use std::ops::Index;

/// Extraction settings. The margins feed straight into layout analysis;
/// see [`LaParams`] for their geometry.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    pub password: String,
    /// Drop the parsed document once text is out, keeping only the page
    /// buffers and metadata.
    pub just_text: bool,
    /// Honor the copy-protection permission bit: a protected document
    /// opens cleanly but yields no pages.
    pub check_extractable: bool,
    pub char_margin: f64,
    pub line_margin: f64,
    pub word_margin: f64,
    /// Stop after this many pages; 0 means all of them.
    pub maxpages: usize,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            password: String::new(),
            just_text: true,
            check_extractable: true,
            char_margin: 1.0,
            line_margin: 0.1,
            word_margin: 0.1,
            maxpages: 0,
        }
    }
}

/// An opened document with its text already extracted, one byte buffer
/// per page (each ending in a form feed).
pub struct Pdf {
    pages: Vec<Vec<u8>>,
    metadata: Option<HashMap<String, PdfObject>>,
    doc: Option<Document>,
}

impl Pdf {
    /// Parse, authenticate and extract every page up front.
    ///
    /// Pages are interpreted in parallel; a page whose content stream is
    /// corrupt contributes whatever was recovered before the damage and
    /// the rest of the document is unaffected.
    pub fn open(data: impl Into<Bytes>, options: &ExtractOptions) -> Result<Self> {
        let doc = Document::new(data, &options.password)?;
        if options.check_extractable && !doc.is_extractable() {
            log::warn!("document forbids text extraction; yielding no pages");
            return Ok(Self {
                pages: Vec::new(),
                metadata: None,
                doc: None,
            });
        }

        let mut pages = doc.get_pages()?;
        if options.maxpages > 0 {
            pages.truncate(options.maxpages);
        }
        let params = LaParams {
            char_margin: options.char_margin,
            line_margin: options.line_margin,
            word_margin: options.word_margin,
            ..LaParams::default()
        };

        let buffers: Vec<Vec<u8>> = pages
            .par_iter()
            .map(|page| {
                let mut aggregator = PageAggregator::new(params.clone());
                let mut interpreter = PageInterpreter::new(&doc, &mut aggregator);
                if let Err(e) = interpreter.process_page(page) {
                    log::warn!("page {}: {}", page.pageid, e);
                }
                aggregator
                    .take_layout()
                    .map(|layout| converter::render_page(&layout))
                    .unwrap_or_else(|| vec![converter::PAGE_SEPARATOR])
            })
            .collect();

        let metadata = doc.info();
        let doc = if options.just_text {
            None
        } else {
            Some(doc)
        };
        Ok(Self {
            pages: buffers,
            metadata,
            doc,
        })
    }

    /// Number of extracted pages.
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Per-page text buffers, raw bytes, form-feed terminated.
    pub fn pages(&self) -> &[Vec<u8>] {
        &self.pages
    }

    /// The /Info dictionary captured at open time, if any.
    pub fn metadata(&self) -> Option<&HashMap<String, PdfObject>> {
        self.metadata.as_ref()
    }

    /// The underlying document, when opened with `just_text = false`.
    pub fn document(&self) -> Option<&Document> {
        self.doc.as_ref()
    }

    /// Release the parsed document and its caches. Page buffers and
    /// metadata stay available.
    pub fn cleanup(&mut self) {
        if let Some(doc) = &self.doc {
            doc.clear_caches();
        }
        self.doc = None;
    }

    /// All pages joined, as raw bytes.
    pub fn raw_bytes(&self) -> Vec<u8> {
        self.pages.concat()
    }

    /// `raw_bytes` with optional whitespace cleanup, never decoding.
    /// The byte-level twin of [`text_with`](Self::text_with).
    pub fn bytes_with(&self, clean: bool) -> Vec<u8> {
        let raw = self.raw_bytes();
        if clean {
            normalise_whitespace_bytes(&raw)
        } else {
            raw
        }
    }

    /// The whole document as one cleaned string: encoding detected, runs
    /// of whitespace collapsed to single spaces.
    pub fn text(&self) -> Result<String> {
        self.text_with(true, &ChardetDetector)
    }

    /// `text` with explicit cleaning and a caller-supplied detector.
    pub fn text_with(&self, clean: bool, detector: &dyn EncodingDetector) -> Result<String> {
        let text = decode_text(&self.raw_bytes(), detector)?;
        Ok(if clean { normalise_whitespace(&text) } else { text })
    }
}

impl Index<usize> for Pdf {
    type Output = [u8];

    fn index(&self, index: usize) -> &[u8] {
        &self.pages[index]
    }
}

/// One-call extraction with default options.
pub fn extract_text(data: impl Into<Bytes>) -> Result<String> {
    Pdf::open(data, &ExtractOptions::default())?.text()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::security::fixtures;
    use crate::error::PdfError;

    const DOCID: &[u8] = b"0123456789abcdef";

    fn hex(data: &[u8]) -> String {
        data.iter().map(|b| format!("{:02x}", b)).collect()
    }

    /// Minimal encrypted document: one empty page, R2 standard handler.
    /// Streams need no real encryption because the tests that use this
    /// never get as far as reading one.
    fn build_encrypted_pdf(user_pw: &str, p: i64) -> Vec<u8> {
        let fix = fixtures::rev2(user_pw, "owner", p, DOCID);
        let encrypt = format!(
            "<< /Filter /Standard /V 1 /R 2 /Length 40 /O <{}> /U <{}> /P {} >>",
            hex(&fix.o),
            hex(&fix.u),
            p
        );
        let objects: Vec<(u32, String)> = vec![
            (1, "<< /Type /Catalog /Pages 2 0 R >>".into()),
            (2, "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".into()),
            (3, "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] >>".into()),
            (4, encrypt),
        ];
        let mut out = b"%PDF-1.4\n".to_vec();
        let mut offsets = Vec::new();
        for (objid, body) in &objects {
            offsets.push((*objid, out.len()));
            out.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", objid, body).as_bytes());
        }
        let xref_pos = out.len();
        out.extend_from_slice(b"xref\n0 1\n0000000000 65535 f \n");
        for (objid, offset) in &offsets {
            out.extend_from_slice(format!("{} 1\n{:010} 00000 n \n", objid, offset).as_bytes());
        }
        out.extend_from_slice(
            format!(
                "trailer\n<< /Size 5 /Root 1 0 R /Encrypt 4 0 R /ID [<{}> <{}>] >>\n",
                hex(DOCID),
                hex(DOCID)
            )
            .as_bytes(),
        );
        out.extend_from_slice(format!("startxref\n{}\n%%EOF\n", xref_pos).as_bytes());
        out
    }

    #[test]
    fn test_wrong_password_is_auth_error() {
        let data = build_encrypted_pdf("letmein", -4);
        let options = ExtractOptions {
            password: "wrong".into(),
            ..ExtractOptions::default()
        };
        assert!(matches!(Pdf::open(data, &options), Err(PdfError::AuthError)));
    }

    #[test]
    fn test_copy_protected_yields_no_pages() {
        // Copy bit cleared: authenticates, but extraction is refused.
        let data = build_encrypted_pdf("", -64);
        let pdf = Pdf::open(data, &ExtractOptions::default()).unwrap();
        assert!(pdf.is_empty());
        assert!(pdf.metadata().is_none());
        assert_eq!(pdf.text().unwrap(), "");
    }

    #[test]
    fn test_copy_protected_ignored_when_not_checking() {
        let data = build_encrypted_pdf("", -64);
        let options = ExtractOptions {
            check_extractable: false,
            ..ExtractOptions::default()
        };
        let pdf = Pdf::open(data, &options).unwrap();
        assert_eq!(pdf.len(), 1);
    }

    #[test]
    fn test_extractable_permission_processes_pages() {
        let data = build_encrypted_pdf("secret", -4);
        let options = ExtractOptions {
            password: "secret".into(),
            ..ExtractOptions::default()
        };
        let pdf = Pdf::open(data, &options).unwrap();
        assert_eq!(pdf.len(), 1);
        assert_eq!(&pdf[0], b"\x0c");
    }
}
