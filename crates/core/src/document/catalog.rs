//! The document container.
//!
//! Owns the raw file bytes, resolves the cross-reference structure
//! (traditional tables, xref streams, hybrid files, and a brute-force
//! scan for files with a damaged trailer), serves indirect objects
//! through a memoized store, and applies standard-handler decryption.

use crate::codec;
use crate::document::page::Page;
use crate::document::security::SecurityHandler;
use crate::error::{PdfError, Result};
use crate::model::objects::{ObjRef, PdfObject, PdfStream};
use crate::parser::{Lexer, ObjectParser, Token};
use crate::utils::is_ws;
use bytes::Bytes;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy)]
enum XrefEntry {
    /// Uncompressed object at a byte offset.
    Offset { pos: usize },
    /// Object number `index` inside the object stream `container`.
    InStream { container: u32, index: usize },
}

/// A parsed PDF document.
///
/// Object resolution is memoized and interior-mutable, so pages can be
/// interpreted from multiple threads over a shared reference.
pub struct Document {
    data: Bytes,
    xref: FxHashMap<u32, XrefEntry>,
    trailer: HashMap<String, PdfObject>,
    cache: Mutex<FxHashMap<u32, Arc<PdfObject>>>,
    decoded: Mutex<FxHashMap<u32, Arc<Vec<u8>>>>,
    security: Option<SecurityHandler>,
    encrypt_objid: Option<u32>,
}

impl Document {
    /// Parse the cross-reference structure and, if the file is encrypted,
    /// authenticate `password` against the standard security handler.
    pub fn new(data: impl Into<Bytes>, password: &str) -> Result<Self> {
        let data = data.into();
        if data.is_empty() {
            return Err(PdfError::MalformedDocument("empty file".into()));
        }
        let head = &data[..data.len().min(1024)];
        if find_bytes(head, b"%PDF-").is_none() {
            log::warn!("no %PDF- header found, continuing anyway");
        }

        let parsed = load_xrefs(&data)
            .map_err(|e| log::warn!("xref parse failed, scanning file: {}", e))
            .ok()
            .filter(|(_, trailer)| trailer.contains_key("Root"));
        let (xref, trailer) = match parsed {
            Some(found) => found,
            None => fallback_scan(&data)?,
        };

        let mut doc = Self {
            data,
            xref,
            trailer,
            cache: Mutex::new(FxHashMap::default()),
            decoded: Mutex::new(FxHashMap::default()),
            security: None,
            encrypt_objid: None,
        };
        doc.init_security(password)?;
        Ok(doc)
    }

    fn init_security(&mut self, password: &str) -> Result<()> {
        let encrypt = match self.trailer.get("Encrypt").cloned() {
            Some(obj) => obj,
            None => return Ok(()),
        };
        self.encrypt_objid = encrypt.as_objref().ok().map(|r| r.objid);
        let encrypt = self.resolve(&encrypt)?;
        let docid = self
            .trailer
            .get("ID")
            .and_then(|id| self.resolve(id).ok())
            .and_then(|id| id.as_array().ok().and_then(|a| a.first().cloned()))
            .and_then(|first| self.resolve(&first).ok())
            .and_then(|first| first.as_string().ok().map(<[u8]>::to_vec))
            .unwrap_or_default();
        self.security = Some(SecurityHandler::new(encrypt.as_dict()?, &docid, password)?);
        // Anything resolved before the handler existed was never decrypted.
        self.cache.lock().unwrap().clear();
        Ok(())
    }

    pub const fn is_encrypted(&self) -> bool {
        self.security.is_some()
    }

    /// Whether text extraction is permitted (always true when unencrypted).
    pub fn is_extractable(&self) -> bool {
        self.security
            .as_ref()
            .map_or(true, SecurityHandler::is_extractable)
    }

    pub fn trailer(&self) -> &HashMap<String, PdfObject> {
        &self.trailer
    }

    /// The document catalog (/Root).
    pub fn catalog(&self) -> Result<HashMap<String, PdfObject>> {
        let root = self
            .trailer
            .get("Root")
            .ok_or_else(|| PdfError::MalformedDocument("trailer has no /Root".into()))?;
        Ok(self.resolve(root)?.as_dict()?.clone())
    }

    /// The /Info dictionary, if present.
    pub fn info(&self) -> Option<HashMap<String, PdfObject>> {
        let info = self.trailer.get("Info")?;
        self.resolve(info).ok()?.as_dict().ok().cloned()
    }

    /// All leaf pages in document order.
    pub fn get_pages(&self) -> Result<Vec<Page>> {
        Page::collect(self)
    }

    /// Fetch an indirect object by number, memoized.
    pub fn get_object(&self, objid: u32) -> Result<Arc<PdfObject>> {
        if let Some(obj) = self.cache.lock().unwrap().get(&objid) {
            return Ok(obj.clone());
        }
        let entry = *self
            .xref
            .get(&objid)
            .ok_or(PdfError::ObjectNotFound(objid))?;
        let obj = match entry {
            XrefEntry::Offset { pos } => {
                let (id, genno, mut obj) = parse_indirect(&self.data, pos, |len| {
                    self.resolve(len).ok()?.as_int().ok()
                })?;
                if id != objid {
                    log::warn!("xref said object {} at offset {}, found {}", objid, pos, id);
                }
                if let Some(handler) = &self.security {
                    if self.encrypt_objid != Some(objid) {
                        decrypt_object(handler, objid, genno, &mut obj);
                    }
                }
                obj
            }
            XrefEntry::InStream { container, index } => {
                self.load_compressed(container, index, objid)?
            }
        };
        let obj = Arc::new(obj);
        self.cache.lock().unwrap().insert(objid, obj.clone());
        Ok(obj)
    }

    /// Follow reference chains until a direct object. Dangling references
    /// resolve to null, as readers conventionally treat them.
    pub fn resolve(&self, obj: &PdfObject) -> Result<PdfObject> {
        let mut current = obj.clone();
        for _ in 0..32 {
            match current {
                PdfObject::Ref(r) => {
                    current = match self.get_object(r.objid) {
                        Ok(o) => (*o).clone(),
                        Err(PdfError::ObjectNotFound(id)) => {
                            log::warn!("dangling reference to object {}", id);
                            PdfObject::Null
                        }
                        Err(e) => return Err(e),
                    };
                }
                other => return Ok(other),
            }
        }
        Err(PdfError::MalformedDocument("reference chain too deep".into()))
    }

    pub fn resolve_ref(&self, r: ObjRef) -> Result<PdfObject> {
        self.resolve(&PdfObject::Ref(r))
    }

    pub(crate) fn resolve_to_ref(&self, obj: &PdfObject) -> Result<ObjRef> {
        obj.as_objref().copied()
    }

    /// Fully decoded stream payload, cached per object id.
    pub fn get_stream_data(&self, stream: &PdfStream) -> Result<Arc<Vec<u8>>> {
        if let Some(objid) = stream.objid {
            if let Some(data) = self.decoded.lock().unwrap().get(&objid) {
                return Ok(data.clone());
            }
        }
        let data = Arc::new(codec::decode_stream(stream, |obj| self.resolve(obj))?);
        if let Some(objid) = stream.objid {
            self.decoded.lock().unwrap().insert(objid, data.clone());
        }
        Ok(data)
    }

    /// Drop memoized objects and decoded payloads. The document remains
    /// usable; subsequent access re-parses from the raw bytes.
    pub fn clear_caches(&self) {
        self.cache.lock().unwrap().clear();
        self.decoded.lock().unwrap().clear();
    }

    /// Load an object stored inside an object stream (/Type /ObjStm).
    fn load_compressed(&self, container: u32, index: usize, objid: u32) -> Result<PdfObject> {
        let cont = self.get_object(container)?;
        let stream = cont.as_stream()?;
        let n = stream
            .get("N")
            .and_then(|v| self.resolve(v).ok())
            .and_then(|v| v.as_int().ok())
            .ok_or_else(|| PdfError::MalformedDocument("object stream missing /N".into()))?
            as usize;
        let first = stream
            .get("First")
            .and_then(|v| self.resolve(v).ok())
            .and_then(|v| v.as_int().ok())
            .ok_or_else(|| PdfError::MalformedDocument("object stream missing /First".into()))?
            as usize;
        let data = self.get_stream_data(stream)?;

        let mut header = ObjectParser::new(&data);
        let mut pairs = Vec::with_capacity(n);
        for _ in 0..n {
            let id = header.parse_object()?.as_int()?;
            let off = header.parse_object()?.as_int()?;
            pairs.push((id as u32, off as usize));
        }
        let (_, off) = pairs
            .get(index)
            .copied()
            .filter(|(id, _)| *id == objid)
            .or_else(|| pairs.iter().copied().find(|(id, _)| *id == objid))
            .ok_or(PdfError::ObjectNotFound(objid))?;
        let start = first + off;
        if start >= data.len() {
            return Err(PdfError::MalformedDocument(format!(
                "object {} offset past end of object stream",
                objid
            )));
        }
        ObjectParser::new(&data[start..]).parse_object()
    }
}

/// Recursively decrypt strings and stream payloads inside an object.
fn decrypt_object(handler: &SecurityHandler, objid: u32, genno: u32, obj: &mut PdfObject) {
    match obj {
        PdfObject::String(s) => *s = handler.decrypt(objid, genno, s),
        PdfObject::Array(items) => {
            for item in items {
                decrypt_object(handler, objid, genno, item);
            }
        }
        PdfObject::Dict(dict) => {
            for value in dict.values_mut() {
                decrypt_object(handler, objid, genno, value);
            }
        }
        PdfObject::Stream(stream) => {
            let plain = handler.decrypt(objid, genno, stream.rawdata());
            stream.set_rawdata(plain);
            for value in stream.attrs.values_mut() {
                decrypt_object(handler, objid, genno, value);
            }
        }
        _ => {}
    }
}

fn find_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn rfind_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).rposition(|w| w == needle)
}

fn skip_ws(data: &[u8], mut pos: usize) -> usize {
    while pos < data.len() && is_ws(data[pos]) {
        pos += 1;
    }
    pos
}

/// Parse `N G obj ... endobj` starting at `pos`, slicing stream payloads
/// out of `data` without copying. `resolve_len` maps an indirect /Length
/// to its value.
fn parse_indirect<F>(data: &Bytes, pos: usize, resolve_len: F) -> Result<(u32, u32, PdfObject)>
where
    F: Fn(&PdfObject) -> Option<i64>,
{
    if pos >= data.len() {
        return Err(PdfError::MalformedDocument(format!(
            "object offset {} past end of file",
            pos
        )));
    }
    let slice = &data[pos..];
    let mut parser = ObjectParser::new(slice);
    let objid = parser.parse_object()?.as_int()? as u32;
    let genno = parser.parse_object()?.as_int()? as u32;
    parser.expect_keyword(b"obj")?;
    let obj = parser.parse_object()?;

    let dict = match obj {
        PdfObject::Dict(dict) => dict,
        other => return Ok((objid, genno, other)),
    };

    // A dict followed by the `stream` keyword is a stream object.
    let consumed = slice.len() - parser.remaining().len();
    let mut p = skip_ws(data, pos + consumed);
    if !data[p..].starts_with(b"stream") {
        return Ok((objid, genno, PdfObject::Dict(dict)));
    }
    p += b"stream".len();
    if data.get(p) == Some(&b'\r') {
        p += 1;
    }
    if data.get(p) == Some(&b'\n') {
        p += 1;
    }

    let length = dict.get("Length").and_then(|l| match l {
        PdfObject::Int(n) => Some(*n),
        other => resolve_len(other),
    });
    let end = length.and_then(|n| {
        let cand = p.checked_add(usize::try_from(n).ok()?)?;
        if cand > data.len() {
            return None;
        }
        let after = skip_ws(data, cand);
        data[after..].starts_with(b"endstream").then_some(cand)
    });
    let end = match end {
        Some(end) => end,
        None => {
            // Bad or missing /Length: trust the endstream marker instead.
            let rel = find_bytes(&data[p..], b"endstream").ok_or_else(|| {
                PdfError::SyntaxError(format!("object {} stream has no endstream", objid))
            })?;
            let mut end = p + rel;
            if end > p && data[end - 1] == b'\n' {
                end -= 1;
            }
            if end > p && data[end - 1] == b'\r' {
                end -= 1;
            }
            end
        }
    };

    let mut stream = PdfStream::new(dict, data.slice(p..end));
    stream.set_objid(objid, genno);
    Ok((objid, genno, PdfObject::Stream(Box::new(stream))))
}

fn find_startxref(data: &[u8]) -> Result<usize> {
    let tail_start = data.len().saturating_sub(4096);
    let rel = rfind_bytes(&data[tail_start..], b"startxref")
        .ok_or_else(|| PdfError::MalformedDocument("startxref not found".into()))?;
    let mut lexer = Lexer::new(&data[tail_start + rel + b"startxref".len()..]);
    match lexer.next_token()? {
        Some(Token::Int(n)) if n >= 0 => Ok(n as usize),
        _ => Err(PdfError::MalformedDocument("bad startxref value".into())),
    }
}

type XrefMap = FxHashMap<u32, XrefEntry>;

/// Walk the xref chain from startxref, newest section first. Entries and
/// trailer keys from newer sections win.
fn load_xrefs(data: &Bytes) -> Result<(XrefMap, HashMap<String, PdfObject>)> {
    let start = find_startxref(data)?;
    let mut xref = XrefMap::default();
    let mut trailer = HashMap::new();
    let mut queue = VecDeque::from([start]);
    let mut seen = FxHashSet::default();

    while let Some(pos) = queue.pop_front() {
        if !seen.insert(pos) {
            continue;
        }
        if pos >= data.len() {
            return Err(PdfError::MalformedDocument(format!(
                "xref offset {} past end of file",
                pos
            )));
        }
        let at = skip_ws(data, pos);
        let section = if data[at..].starts_with(b"xref") {
            parse_xref_table(data, at + b"xref".len(), &mut xref)?
        } else {
            parse_xref_stream(data, at, &mut xref)?
        };
        // Hybrid files point at an xref stream holding entries the table
        // doesn't; it is consulted before /Prev.
        if let Some(stm) = section.get("XRefStm").and_then(|v| v.as_int().ok()) {
            queue.push_back(stm as usize);
        }
        if let Some(prev) = section.get("Prev").and_then(|v| v.as_int().ok()) {
            queue.push_back(prev as usize);
        }
        for (k, v) in section {
            trailer.entry(k).or_insert(v);
        }
    }
    Ok((xref, trailer))
}

/// Traditional `xref` table: subsections of 20-byte entries, then a
/// `trailer` dictionary.
fn parse_xref_table(
    data: &Bytes,
    pos: usize,
    xref: &mut XrefMap,
) -> Result<HashMap<String, PdfObject>> {
    let slice = &data[pos..];
    let mut lexer = Lexer::new(slice);
    loop {
        let tok = lexer
            .next_token()?
            .ok_or_else(|| PdfError::MalformedDocument("xref table ends without trailer".into()))?;
        match tok {
            Token::Keyword(kw) if kw == b"trailer" => {
                let mut parser = ObjectParser::new(&slice[lexer.tell()..]);
                return Ok(parser.parse_object()?.as_dict()?.clone());
            }
            Token::Int(start) => {
                let count = match lexer.next_token()? {
                    Some(Token::Int(n)) if n >= 0 => n,
                    _ => {
                        return Err(PdfError::MalformedDocument(
                            "bad xref subsection header".into(),
                        ))
                    }
                };
                for objid in start..start + count {
                    let offset = match lexer.next_token()? {
                        Some(Token::Int(n)) => n,
                        _ => return Err(PdfError::MalformedDocument("bad xref entry".into())),
                    };
                    let _genno = match lexer.next_token()? {
                        Some(Token::Int(n)) => n,
                        _ => return Err(PdfError::MalformedDocument("bad xref entry".into())),
                    };
                    let in_use = match lexer.next_token()? {
                        Some(Token::Keyword(k)) if k == b"n" => true,
                        Some(Token::Keyword(k)) if k == b"f" => false,
                        _ => return Err(PdfError::MalformedDocument("bad xref entry type".into())),
                    };
                    if in_use && objid >= 0 && offset >= 0 {
                        xref.entry(objid as u32).or_insert(XrefEntry::Offset {
                            pos: offset as usize,
                        });
                    }
                }
            }
            other => {
                return Err(PdfError::MalformedDocument(format!(
                    "unexpected token in xref table: {:?}",
                    other
                )))
            }
        }
    }
}

/// Cross-reference stream (/Type /XRef): binary rows described by /W,
/// ranges described by /Index. Its dictionary doubles as the trailer.
fn parse_xref_stream(
    data: &Bytes,
    pos: usize,
    xref: &mut XrefMap,
) -> Result<HashMap<String, PdfObject>> {
    // /Length must be direct in an xref stream; nothing to resolve yet.
    let (_, _, obj) = parse_indirect(data, pos, |_| None)?;
    let stream = obj.as_stream()?;
    if stream.get("Type").and_then(|t| t.as_name().ok()) != Some("XRef") {
        return Err(PdfError::MalformedDocument(format!(
            "expected xref stream at offset {}",
            pos
        )));
    }
    let decoded = codec::decode_stream(stream, |o| Ok(o.clone()))?;

    let widths: Vec<usize> = stream
        .get("W")
        .and_then(|w| w.as_array().ok())
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_int().ok())
                .map(|n| n.max(0) as usize)
                .collect()
        })
        .ok_or_else(|| PdfError::MalformedDocument("xref stream missing /W".into()))?;
    if widths.len() < 3 {
        return Err(PdfError::MalformedDocument("xref stream /W too short".into()));
    }
    let size = stream
        .get("Size")
        .and_then(|v| v.as_int().ok())
        .ok_or_else(|| PdfError::MalformedDocument("xref stream missing /Size".into()))?;
    let index: Vec<i64> = stream
        .get("Index")
        .and_then(|v| v.as_array().ok())
        .map(|arr| arr.iter().filter_map(|v| v.as_int().ok()).collect())
        .unwrap_or_else(|| vec![0, size]);

    let row_len: usize = widths.iter().sum();
    if row_len == 0 {
        return Err(PdfError::MalformedDocument("xref stream has zero-width rows".into()));
    }
    let mut rows = decoded.chunks_exact(row_len);
    'ranges: for range in index.chunks(2) {
        let (start, count) = match range {
            [s, c] => (*s, *c),
            _ => break,
        };
        for objid in start..start + count {
            let row = match rows.next() {
                Some(row) => row,
                None => break 'ranges,
            };
            let mut fields = [0u64; 3];
            let mut at = 0;
            for (field, &w) in fields.iter_mut().zip(&widths) {
                for &b in &row[at..at + w] {
                    *field = (*field << 8) | b as u64;
                }
                at += w;
            }
            let ftype = if widths[0] == 0 { 1 } else { fields[0] };
            if objid < 0 {
                continue;
            }
            let entry = match ftype {
                1 => XrefEntry::Offset {
                    pos: fields[1] as usize,
                },
                2 => XrefEntry::InStream {
                    container: fields[1] as u32,
                    index: fields[2] as usize,
                },
                _ => continue,
            };
            xref.entry(objid as u32).or_insert(entry);
        }
    }
    Ok(stream.attrs.clone())
}

/// Last resort for files with a broken xref: scan for `N G obj` headers
/// (later definitions shadow earlier ones) and any trailer dictionaries.
fn fallback_scan(data: &Bytes) -> Result<(XrefMap, HashMap<String, PdfObject>)> {
    let obj_re = regex::bytes::Regex::new(r"(?-u)(\d{1,10})\s+(\d{1,5})\s+obj\b")
        .map_err(|e| PdfError::MalformedDocument(format!("scan regex: {}", e)))?;
    let mut xref = XrefMap::default();
    for caps in obj_re.captures_iter(data) {
        let whole = caps.get(0).map(|m| m.start()).unwrap_or(0);
        let objid = caps
            .get(1)
            .and_then(|m| std::str::from_utf8(m.as_bytes()).ok())
            .and_then(|s| s.parse::<u32>().ok());
        if let Some(objid) = objid {
            xref.insert(objid, XrefEntry::Offset { pos: whole });
        }
    }
    if xref.is_empty() {
        return Err(PdfError::MalformedDocument(
            "no indirect objects found in file".into(),
        ));
    }

    let mut trailer = HashMap::new();
    let trailer_re = regex::bytes::Regex::new(r"(?-u)trailer")
        .map_err(|e| PdfError::MalformedDocument(format!("scan regex: {}", e)))?;
    for m in trailer_re.find_iter(data) {
        let mut parser = ObjectParser::new(&data[m.end()..]);
        if let Ok(PdfObject::Dict(dict)) = parser.parse_object() {
            for (k, v) in dict {
                trailer.insert(k, v);
            }
        }
    }

    if !trailer.contains_key("Root") {
        // No usable trailer either: hunt for the catalog itself.
        for (&objid, &entry) in &xref {
            let XrefEntry::Offset { pos } = entry else { continue };
            let Ok((_, genno, obj)) = parse_indirect(data, pos, |_| None) else {
                continue;
            };
            let is_catalog = obj
                .as_dict()
                .ok()
                .and_then(|d| d.get("Type"))
                .and_then(|t| t.as_name().ok())
                == Some("Catalog");
            if is_catalog {
                trailer.insert("Root".into(), PdfObject::Ref(ObjRef::new(objid, genno)));
                break;
            }
        }
    }
    if !trailer.contains_key("Root") {
        return Err(PdfError::MalformedDocument(
            "no /Root found by fallback scan".into(),
        ));
    }
    Ok((xref, trailer))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Assemble a file from object bodies, generating a valid xref table.
    fn build_pdf(objects: &[(u32, &[u8])]) -> Vec<u8> {
        build_pdf_with_trailer(objects, &format!("/Size {} /Root 1 0 R", objects.len() + 1))
    }

    fn build_pdf_with_trailer(objects: &[(u32, &[u8])], trailer: &str) -> Vec<u8> {
        let mut out = b"%PDF-1.4\n".to_vec();
        let mut offsets = Vec::new();
        for (objid, body) in objects {
            offsets.push((*objid, out.len()));
            out.extend_from_slice(format!("{} 0 obj\n", objid).as_bytes());
            out.extend_from_slice(body);
            out.extend_from_slice(b"\nendobj\n");
        }
        let xref_pos = out.len();
        out.extend_from_slice(b"xref\n0 1\n0000000000 65535 f \n");
        for (objid, offset) in &offsets {
            out.extend_from_slice(
                format!("{} 1\n{:010} 00000 n \n", objid, offset).as_bytes(),
            );
        }
        out.extend_from_slice(format!("trailer\n<< {} >>\n", trailer).as_bytes());
        out.extend_from_slice(format!("startxref\n{}\n%%EOF\n", xref_pos).as_bytes());
        out
    }

    const MINIMAL: &[(u32, &[u8])] = &[
        (1, b"<< /Type /Catalog /Pages 2 0 R >>"),
        (2, b"<< /Type /Pages /Kids [3 0 R] /Count 1 >>"),
        (3, b"<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] >>"),
    ];

    #[test]
    fn test_minimal_document_pages() {
        let doc = Document::new(build_pdf(MINIMAL), "").unwrap();
        assert!(!doc.is_encrypted());
        assert!(doc.is_extractable());
        let pages = doc.get_pages().unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].pageid, 3);
        assert_eq!(pages[0].mediabox, (0.0, 0.0, 612.0, 792.0));
        assert_eq!(pages[0].rotate, 0);
    }

    #[test]
    fn test_stream_object_with_indirect_length() {
        let objects: [(u32, &[u8]); 4] = [
            (1, b"<< /Type /Catalog /Pages 2 0 R >>"),
            (2, b"<< /Type /Pages /Kids [] /Count 0 >>"),
            (3, b"<< /Length 4 0 R >>\nstream\nhello world\nendstream"),
            (4, b"11"),
        ];
        let doc = Document::new(build_pdf(&objects), "").unwrap();
        let obj = doc.get_object(3).unwrap();
        let stream = obj.as_stream().unwrap();
        assert_eq!(stream.rawdata(), b"hello world");
        assert_eq!(doc.get_stream_data(stream).unwrap().as_slice(), b"hello world");
    }

    #[test]
    fn test_inherited_rotation_and_mediabox() {
        let objects: [(u32, &[u8]); 4] = [
            (1, b"<< /Type /Catalog /Pages 2 0 R >>"),
            (
                2,
                b"<< /Type /Pages /Kids [3 0 R 4 0 R] /Count 2 /Rotate 90 /MediaBox [0 0 200 100] >>",
            ),
            (3, b"<< /Type /Page /Parent 2 0 R >>"),
            (4, b"<< /Type /Page /Parent 2 0 R /Rotate 270 >>"),
        ];
        let doc = Document::new(build_pdf(&objects), "").unwrap();
        let pages = doc.get_pages().unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].rotate, 90);
        assert_eq!(pages[0].mediabox, (0.0, 0.0, 200.0, 100.0));
        assert_eq!(pages[1].rotate, 270);
    }

    #[test]
    fn test_cyclic_page_tree_is_an_error() {
        let objects: [(u32, &[u8]); 3] = [
            (1, b"<< /Type /Catalog /Pages 2 0 R >>"),
            (2, b"<< /Type /Pages /Kids [3 0 R] /Count 1 >>"),
            (3, b"<< /Type /Pages /Kids [2 0 R] /Count 1 >>"),
        ];
        let doc = Document::new(build_pdf(&objects), "").unwrap();
        assert!(matches!(
            doc.get_pages(),
            Err(PdfError::CyclicPageTree(_))
        ));
    }

    #[test]
    fn test_fallback_scan_recovers_broken_xref() {
        let mut data = build_pdf(MINIMAL);
        // Corrupt the startxref offset.
        let pos = rfind_bytes(&data, b"startxref").unwrap();
        data.truncate(pos);
        data.extend_from_slice(b"startxref\n999999999\n%%EOF\n");
        let doc = Document::new(data, "").unwrap();
        assert_eq!(doc.get_pages().unwrap().len(), 1);
    }

    #[test]
    fn test_missing_object_resolves_to_null() {
        let objects: [(u32, &[u8]); 3] = [
            (1, b"<< /Type /Catalog /Pages 2 0 R >>"),
            (2, b"<< /Type /Pages /Kids [3 0 R] /Count 1 >>"),
            (3, b"<< /Type /Page /Parent 2 0 R /Contents 9 0 R >>"),
        ];
        let doc = Document::new(build_pdf(&objects), "").unwrap();
        let pages = doc.get_pages().unwrap();
        assert!(pages[0].contents.is_empty());
    }

    #[test]
    fn test_xref_stream_and_object_stream() {
        let compressed: [(u32, &[u8]); 3] = [
            (1, b"<< /Type /Catalog /Pages 2 0 R >>"),
            (2, b"<< /Type /Pages /Kids [3 0 R] /Count 1 >>"),
            (3, b"<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] >>"),
        ];
        let mut header = String::new();
        let mut bodies = Vec::new();
        for (objid, body) in compressed {
            header.push_str(&format!("{} {} ", objid, bodies.len()));
            bodies.extend_from_slice(body);
            bodies.push(b' ');
        }
        let first = header.len();
        let mut objstm = header.into_bytes();
        objstm.extend_from_slice(&bodies);

        let mut out = b"%PDF-1.5\n".to_vec();
        let objstm_pos = out.len();
        out.extend_from_slice(
            format!(
                "4 0 obj\n<< /Type /ObjStm /N 3 /First {} /Length {} >>\nstream\n",
                first,
                objstm.len()
            )
            .as_bytes(),
        );
        out.extend_from_slice(&objstm);
        out.extend_from_slice(b"\nendstream\nendobj\n");

        let xref_pos = out.len();
        // /W [1 2 1]: type byte, two-byte field, one-byte field.
        let mut rows: Vec<u8> = vec![0, 0, 0, 0]; // object 0: free
        for index in 0..3u8 {
            rows.extend_from_slice(&[2, 0, 4, index]); // objects 1-3 live in stream 4
        }
        rows.extend_from_slice(&[1, (objstm_pos >> 8) as u8, objstm_pos as u8, 0]);
        rows.extend_from_slice(&[1, (xref_pos >> 8) as u8, xref_pos as u8, 0]);
        out.extend_from_slice(
            format!(
                "5 0 obj\n<< /Type /XRef /Size 6 /W [1 2 1] /Root 1 0 R /Length {} >>\nstream\n",
                rows.len()
            )
            .as_bytes(),
        );
        out.extend_from_slice(&rows);
        out.extend_from_slice(b"\nendstream\nendobj\n");
        out.extend_from_slice(format!("startxref\n{}\n%%EOF\n", xref_pos).as_bytes());

        let doc = Document::new(out, "").unwrap();
        let pages = doc.get_pages().unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].pageid, 3);
        assert_eq!(pages[0].mediabox, (0.0, 0.0, 612.0, 792.0));
    }

    #[test]
    fn test_updated_document_newest_entry_wins() {
        // An incremental update re-defines object 3 and chains via /Prev.
        let mut data = build_pdf(MINIMAL);
        let new_offset = data.len();
        data.extend_from_slice(b"3 0 obj\n<< /Type /Page /Parent 2 0 R /Rotate 180 >>\nendobj\n");
        // "\nxref" so the search does not land inside "startxref".
        let old_xref = rfind_bytes(&data, b"\nxref").unwrap() + 1;
        let xref_pos = data.len();
        data.extend_from_slice(
            format!("xref\n3 1\n{:010} 00000 n \n", new_offset).as_bytes(),
        );
        data.extend_from_slice(
            format!(
                "trailer\n<< /Size 4 /Root 1 0 R /Prev {} >>\nstartxref\n{}\n%%EOF\n",
                old_xref, xref_pos
            )
            .as_bytes(),
        );
        let doc = Document::new(data, "").unwrap();
        let pages = doc.get_pages().unwrap();
        assert_eq!(pages[0].rotate, 180);
    }
}
