//! Lexer and recursive parser for PDF primitive objects.
//!
//! Tokenizes raw bytes into numbers, names, strings, array/dict delimiters
//! and bare keywords, and assembles them into [`PdfObject`] values. Streams
//! are not handled here; the document layer detects the `stream` keyword
//! after a dictionary and slices the payload itself.

use crate::error::{PdfError, Result};
use crate::model::objects::{ObjRef, PdfObject};
use crate::utils::is_ws;
use std::collections::HashMap;

/// A single lexical token.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Int(i64),
    Real(f64),
    Name(String),
    /// Literal or hex string, already unescaped.
    String(Vec<u8>),
    ArrayStart,
    ArrayEnd,
    DictStart,
    DictEnd,
    /// Bare keyword: true/false/null/R/obj/endobj or a content operator.
    Keyword(Vec<u8>),
}

const fn is_delim(b: u8) -> bool {
    matches!(b, b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%')
}

/// Streaming tokenizer over a byte slice.
pub struct Lexer<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub const fn tell(&self) -> usize {
        self.pos
    }

    /// Jump to an absolute offset. Used to skip over embedded binary data.
    pub const fn seek(&mut self, pos: usize) {
        self.pos = pos;
    }

    fn peek(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.data.get(self.pos + offset).copied()
    }

    fn skip_whitespace(&mut self) {
        while let Some(b) = self.peek() {
            if is_ws(b) {
                self.pos += 1;
            } else if b == b'%' {
                // Comment runs to end of line.
                while let Some(c) = self.peek() {
                    self.pos += 1;
                    if c == b'\n' || c == b'\r' {
                        break;
                    }
                }
            } else {
                break;
            }
        }
    }

    /// Next token, or `None` at end of input.
    pub fn next_token(&mut self) -> Result<Option<Token>> {
        self.skip_whitespace();
        let b = match self.peek() {
            Some(b) => b,
            None => return Ok(None),
        };

        let token = match b {
            b'/' => self.lex_name()?,
            b'(' => self.lex_literal_string()?,
            b'<' => {
                if self.peek_at(1) == Some(b'<') {
                    self.pos += 2;
                    Token::DictStart
                } else {
                    self.lex_hex_string()?
                }
            }
            b'>' => {
                if self.peek_at(1) == Some(b'>') {
                    self.pos += 2;
                    Token::DictEnd
                } else {
                    return Err(PdfError::SyntaxError(format!(
                        "stray '>' at offset {}",
                        self.pos
                    )));
                }
            }
            b'[' => {
                self.pos += 1;
                Token::ArrayStart
            }
            b']' => {
                self.pos += 1;
                Token::ArrayEnd
            }
            b'{' | b'}' => {
                // PostScript procedure braces; tokenized as keywords and
                // ignored upstream.
                self.pos += 1;
                Token::Keyword(vec![b])
            }
            b'+' | b'-' | b'.' => self.lex_number()?,
            c if c.is_ascii_digit() => self.lex_number()?,
            _ => self.lex_keyword(),
        };
        Ok(Some(token))
    }

    fn lex_name(&mut self) -> Result<Token> {
        self.pos += 1; // consume '/'
        let mut name = String::new();
        while let Some(b) = self.peek() {
            if is_ws(b) || is_delim(b) {
                break;
            }
            self.pos += 1;
            if b == b'#' {
                let hi = self.peek().and_then(hex_digit);
                let lo = self.peek_at(1).and_then(hex_digit);
                if let (Some(hi), Some(lo)) = (hi, lo) {
                    self.pos += 2;
                    name.push((hi * 16 + lo) as char);
                    continue;
                }
            }
            name.push(b as char);
        }
        Ok(Token::Name(name))
    }

    fn lex_number(&mut self) -> Result<Token> {
        let start = self.pos;
        if matches!(self.peek(), Some(b'+') | Some(b'-')) {
            self.pos += 1;
        }
        let mut is_real = false;
        while let Some(b) = self.peek() {
            if b.is_ascii_digit() {
                self.pos += 1;
            } else if b == b'.' && !is_real {
                is_real = true;
                self.pos += 1;
            } else {
                break;
            }
        }
        let text = std::str::from_utf8(&self.data[start..self.pos])
            .map_err(|_| PdfError::SyntaxError(format!("bad number at {}", start)))?;
        if is_real {
            let v: f64 = text
                .trim_end_matches('.')
                .trim_start_matches('+')
                .parse()
                .or_else(|_| if text == "." { Ok(0.0) } else { Err(()) })
                .map_err(|_| PdfError::SyntaxError(format!("bad real '{}' at {}", text, start)))?;
            Ok(Token::Real(v))
        } else {
            let v: i64 = text
                .trim_start_matches('+')
                .parse()
                .map_err(|_| PdfError::SyntaxError(format!("bad int '{}' at {}", text, start)))?;
            Ok(Token::Int(v))
        }
    }

    fn lex_literal_string(&mut self) -> Result<Token> {
        let start = self.pos;
        self.pos += 1; // consume '('
        let mut out = Vec::new();
        let mut depth = 1usize;
        while let Some(b) = self.peek() {
            self.pos += 1;
            match b {
                b'\\' => {
                    let esc = self.peek().ok_or_else(|| {
                        PdfError::SyntaxError(format!("unterminated string at {}", start))
                    })?;
                    self.pos += 1;
                    match esc {
                        b'n' => out.push(b'\n'),
                        b'r' => out.push(b'\r'),
                        b't' => out.push(b'\t'),
                        b'b' => out.push(0x08),
                        b'f' => out.push(0x0c),
                        b'(' | b')' | b'\\' => out.push(esc),
                        b'\r' => {
                            // Line continuation; swallow a following \n too.
                            if self.peek() == Some(b'\n') {
                                self.pos += 1;
                            }
                        }
                        b'\n' => {}
                        b'0'..=b'7' => {
                            let mut v = (esc - b'0') as u32;
                            for _ in 0..2 {
                                match self.peek() {
                                    Some(d @ b'0'..=b'7') => {
                                        v = v * 8 + (d - b'0') as u32;
                                        self.pos += 1;
                                    }
                                    _ => break,
                                }
                            }
                            out.push((v & 0xff) as u8);
                        }
                        other => out.push(other),
                    }
                }
                b'(' => {
                    depth += 1;
                    out.push(b);
                }
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(Token::String(out));
                    }
                    out.push(b);
                }
                _ => out.push(b),
            }
        }
        Err(PdfError::SyntaxError(format!(
            "unterminated string at {}",
            start
        )))
    }

    fn lex_hex_string(&mut self) -> Result<Token> {
        let start = self.pos;
        self.pos += 1; // consume '<'
        let mut digits = Vec::new();
        loop {
            match self.peek() {
                Some(b'>') => {
                    self.pos += 1;
                    break;
                }
                Some(b) if is_ws(b) => self.pos += 1,
                Some(b) => {
                    self.pos += 1;
                    if hex_digit(b).is_some() {
                        digits.push(b);
                    }
                }
                None => {
                    return Err(PdfError::SyntaxError(format!(
                        "unterminated hex string at {}",
                        start
                    )))
                }
            }
        }
        if digits.len() % 2 == 1 {
            digits.push(b'0');
        }
        let out = digits
            .chunks(2)
            .map(|pair| hex_digit(pair[0]).unwrap_or(0) * 16 + hex_digit(pair[1]).unwrap_or(0))
            .collect();
        Ok(Token::String(out))
    }

    fn lex_keyword(&mut self) -> Token {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if is_ws(b) || is_delim(b) {
                break;
            }
            self.pos += 1;
        }
        Token::Keyword(self.data[start..self.pos].to_vec())
    }
}

fn hex_digit(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Parses complete [`PdfObject`] values from a byte slice.
///
/// Indirect references need two tokens of lookahead (`N G R`), so the
/// parser keeps a small pushback stack above the lexer.
pub struct ObjectParser<'a> {
    lexer: Lexer<'a>,
    pushback: Vec<Token>,
}

impl<'a> ObjectParser<'a> {
    pub const fn new(data: &'a [u8]) -> Self {
        Self {
            lexer: Lexer::new(data),
            pushback: Vec::new(),
        }
    }

    fn next_token(&mut self) -> Result<Option<Token>> {
        if let Some(tok) = self.pushback.pop() {
            return Ok(Some(tok));
        }
        self.lexer.next_token()
    }

    fn push_back(&mut self, tok: Token) {
        self.pushback.push(tok);
    }

    /// Bytes following the last fully parsed object. Used by the document
    /// layer to find a `stream` keyword after a dictionary.
    pub fn remaining(&self) -> &'a [u8] {
        &self.lexer.data[self.lexer.pos..]
    }

    /// Consume the next token, requiring it to be the given bare keyword.
    pub fn expect_keyword(&mut self, kw: &[u8]) -> Result<()> {
        match self.next_token()? {
            Some(Token::Keyword(k)) if k == kw => Ok(()),
            other => Err(PdfError::SyntaxError(format!(
                "expected keyword '{}', got {:?}",
                String::from_utf8_lossy(kw),
                other
            ))),
        }
    }

    /// Parse the next object.
    pub fn parse_object(&mut self) -> Result<PdfObject> {
        let tok = self
            .next_token()?
            .ok_or_else(|| PdfError::SyntaxError("unexpected end of input".into()))?;
        self.parse_from(tok)
    }

    fn parse_from(&mut self, tok: Token) -> Result<PdfObject> {
        match tok {
            Token::Int(n) => self.maybe_reference(n),
            Token::Real(v) => Ok(PdfObject::Real(v)),
            Token::Name(s) => Ok(PdfObject::Name(s)),
            Token::String(s) => Ok(PdfObject::String(s)),
            Token::ArrayStart => self.parse_array(),
            Token::DictStart => self.parse_dict(),
            Token::Keyword(kw) => match kw.as_slice() {
                b"true" => Ok(PdfObject::Bool(true)),
                b"false" => Ok(PdfObject::Bool(false)),
                b"null" => Ok(PdfObject::Null),
                other => Err(PdfError::SyntaxError(format!(
                    "unexpected keyword '{}'",
                    String::from_utf8_lossy(other)
                ))),
            },
            Token::ArrayEnd | Token::DictEnd => {
                Err(PdfError::SyntaxError("unbalanced delimiter".into()))
            }
        }
    }

    /// `N G R` means a reference to object N generation G.
    fn maybe_reference(&mut self, n: i64) -> Result<PdfObject> {
        if (0..=u32::MAX as i64).contains(&n) {
            if let Some(second) = self.next_token()? {
                if let Token::Int(g) = second {
                    if (0..=u32::MAX as i64).contains(&g) {
                        if let Some(third) = self.next_token()? {
                            if third == Token::Keyword(b"R".to_vec()) {
                                return Ok(PdfObject::Ref(ObjRef::new(n as u32, g as u32)));
                            }
                            self.push_back(third);
                        }
                    }
                    self.push_back(Token::Int(g));
                } else {
                    self.push_back(second);
                }
            }
        }
        Ok(PdfObject::Int(n))
    }

    fn parse_array(&mut self) -> Result<PdfObject> {
        let mut items = Vec::new();
        loop {
            let tok = self
                .next_token()?
                .ok_or_else(|| PdfError::SyntaxError("unterminated array".into()))?;
            if tok == Token::ArrayEnd {
                return Ok(PdfObject::Array(items));
            }
            items.push(self.parse_from(tok)?);
        }
    }

    fn parse_dict(&mut self) -> Result<PdfObject> {
        let mut dict = HashMap::new();
        loop {
            let tok = self
                .next_token()?
                .ok_or_else(|| PdfError::SyntaxError("unterminated dict".into()))?;
            match tok {
                Token::DictEnd => return Ok(PdfObject::Dict(dict)),
                Token::Name(key) => {
                    let value = self.parse_object()?;
                    dict.insert(key, value);
                }
                other => {
                    return Err(PdfError::SyntaxError(format!(
                        "expected name key in dict, got {:?}",
                        other
                    )))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(data: &[u8]) -> PdfObject {
        ObjectParser::new(data).parse_object().unwrap()
    }

    #[test]
    fn test_scalars() {
        assert_eq!(parse(b"42"), PdfObject::Int(42));
        assert_eq!(parse(b"-7"), PdfObject::Int(-7));
        assert_eq!(parse(b"3.5"), PdfObject::Real(3.5));
        assert_eq!(parse(b".5"), PdfObject::Real(0.5));
        assert_eq!(parse(b"true"), PdfObject::Bool(true));
        assert_eq!(parse(b"null"), PdfObject::Null);
        assert_eq!(parse(b"/Name"), PdfObject::Name("Name".into()));
        assert_eq!(parse(b"/A#20B"), PdfObject::Name("A B".into()));
    }

    #[test]
    fn test_strings() {
        assert_eq!(parse(b"(hello)"), PdfObject::String(b"hello".to_vec()));
        assert_eq!(parse(b"(a(b)c)"), PdfObject::String(b"a(b)c".to_vec()));
        assert_eq!(
            parse(br"(a\(b\) \n\101)"),
            PdfObject::String(b"a(b) \nA".to_vec())
        );
        assert_eq!(parse(b"<48656C6C6F>"), PdfObject::String(b"Hello".to_vec()));
        assert_eq!(parse(b"<48 65 6>"), PdfObject::String(b"He`".to_vec()));
    }

    #[test]
    fn test_unterminated_string_is_error() {
        assert!(ObjectParser::new(b"(never closed").parse_object().is_err());
    }

    #[test]
    fn test_array_and_dict() {
        let obj = parse(b"[1 2.0 /X (s)]");
        let arr = obj.as_array().unwrap();
        assert_eq!(arr.len(), 4);
        assert_eq!(arr[0], PdfObject::Int(1));

        let obj = parse(b"<< /Type /Page /MediaBox [0 0 612 792] /Parent 2 0 R >>");
        let dict = obj.as_dict().unwrap();
        assert_eq!(dict["Type"], PdfObject::Name("Page".into()));
        assert_eq!(dict["Parent"], PdfObject::Ref(ObjRef::new(2, 0)));
        assert_eq!(dict["MediaBox"].as_array().unwrap().len(), 4);
    }

    #[test]
    fn test_reference_lookahead_restores_tokens() {
        // "1 2 3" is three ints, not a reference.
        let mut parser = ObjectParser::new(b"1 2 3");
        assert_eq!(parser.parse_object().unwrap(), PdfObject::Int(1));
        assert_eq!(parser.parse_object().unwrap(), PdfObject::Int(2));
        assert_eq!(parser.parse_object().unwrap(), PdfObject::Int(3));

        let mut parser = ObjectParser::new(b"1 0 R");
        assert_eq!(
            parser.parse_object().unwrap(),
            PdfObject::Ref(ObjRef::new(1, 0))
        );
    }

    #[test]
    fn test_comments_skipped() {
        assert_eq!(parse(b"% header\n 5"), PdfObject::Int(5));
    }
}
