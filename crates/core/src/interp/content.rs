//! Content-stream tokenization.
//!
//! Splits a decoded content stream into (operands, operator) pairs.
//! Content streams share the object syntax but contain no indirect
//! references, so no lookahead is needed; bare keywords are operators.
//! Inline images (BI .. EI) are skipped wholesale.

use crate::error::{PdfError, Result};
use crate::model::objects::PdfObject;
use crate::parser::{Lexer, Token};
use crate::utils::is_ws;
use std::collections::HashMap;

/// Ceiling on operands per operator; real content never comes close, a
/// longer run means the stream is garbage.
const MAX_OPERANDS: usize = 64;

pub struct ContentParser<'a> {
    data: &'a [u8],
    lexer: Lexer<'a>,
}

impl<'a> ContentParser<'a> {
    pub const fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            lexer: Lexer::new(data),
        }
    }

    /// Next (operands, operator) pair, or `None` at end of stream.
    /// Trailing operands without an operator are dropped with a warning.
    pub fn next_op(&mut self) -> Result<Option<(Vec<PdfObject>, String)>> {
        let mut operands = Vec::new();
        loop {
            let tok = match self.lexer.next_token()? {
                Some(tok) => tok,
                None => {
                    if !operands.is_empty() {
                        log::warn!("content stream ends with {} dangling operands", operands.len());
                    }
                    return Ok(None);
                }
            };
            match tok {
                Token::Keyword(kw) => match kw.as_slice() {
                    b"true" => operands.push(PdfObject::Bool(true)),
                    b"false" => operands.push(PdfObject::Bool(false)),
                    b"null" => operands.push(PdfObject::Null),
                    b"BI" => {
                        self.skip_inline_image()?;
                        operands.clear();
                    }
                    b"{" | b"}" => {}
                    op => {
                        let op = String::from_utf8_lossy(op).into_owned();
                        return Ok(Some((std::mem::take(&mut operands), op)));
                    }
                },
                other => {
                    operands.push(self.object_from(other)?);
                    if operands.len() > MAX_OPERANDS {
                        return Err(PdfError::SyntaxError(
                            "operand stack overflow in content stream".into(),
                        ));
                    }
                }
            }
        }
    }

    fn object_from(&mut self, tok: Token) -> Result<PdfObject> {
        match tok {
            Token::Int(n) => Ok(PdfObject::Int(n)),
            Token::Real(v) => Ok(PdfObject::Real(v)),
            Token::Name(s) => Ok(PdfObject::Name(s)),
            Token::String(s) => Ok(PdfObject::String(s)),
            Token::ArrayStart => {
                let mut items = Vec::new();
                loop {
                    match self.lexer.next_token()? {
                        Some(Token::ArrayEnd) => return Ok(PdfObject::Array(items)),
                        Some(tok) => items.push(self.object_from(tok)?),
                        None => {
                            return Err(PdfError::SyntaxError(
                                "unterminated array in content stream".into(),
                            ))
                        }
                    }
                }
            }
            Token::DictStart => {
                let mut dict = HashMap::new();
                loop {
                    match self.lexer.next_token()? {
                        Some(Token::DictEnd) => return Ok(PdfObject::Dict(dict)),
                        Some(Token::Name(key)) => {
                            let tok = self.lexer.next_token()?.ok_or_else(|| {
                                PdfError::SyntaxError("unterminated dict in content stream".into())
                            })?;
                            let value = self.object_from(tok)?;
                            dict.insert(key, value);
                        }
                        _ => {
                            return Err(PdfError::SyntaxError(
                                "bad dict key in content stream".into(),
                            ))
                        }
                    }
                }
            }
            Token::Keyword(kw) => match kw.as_slice() {
                b"true" => Ok(PdfObject::Bool(true)),
                b"false" => Ok(PdfObject::Bool(false)),
                b"null" => Ok(PdfObject::Null),
                other => Err(PdfError::SyntaxError(format!(
                    "operator '{}' inside a composite operand",
                    String::from_utf8_lossy(other)
                ))),
            },
            Token::ArrayEnd | Token::DictEnd => {
                Err(PdfError::SyntaxError("unbalanced delimiter in content stream".into()))
            }
        }
    }

    /// Skip from just after `BI` past the matching `EI`. The image data is
    /// raw binary, so scan for an `EI` bounded by whitespace.
    fn skip_inline_image(&mut self) -> Result<()> {
        let mut pos = self.lexer.tell();
        while pos + 2 <= self.data.len() {
            if self.data[pos] == b'E'
                && self.data[pos + 1] == b'I'
                && (pos == 0 || is_ws(self.data[pos - 1]))
                && self.data.get(pos + 2).map_or(true, |&b| is_ws(b))
            {
                self.lexer.seek(pos + 2);
                return Ok(());
            }
            pos += 1;
        }
        Err(PdfError::SyntaxError("inline image has no EI terminator".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ops(data: &[u8]) -> Vec<(Vec<PdfObject>, String)> {
        let mut parser = ContentParser::new(data);
        let mut out = Vec::new();
        while let Some(op) = parser.next_op().unwrap() {
            out.push(op);
        }
        out
    }

    #[test]
    fn test_basic_text_ops() {
        let got = ops(b"BT /F1 12 Tf 72 720 Td (Hi) Tj ET");
        let names: Vec<&str> = got.iter().map(|(_, op)| op.as_str()).collect();
        assert_eq!(names, ["BT", "Tf", "Td", "Tj", "ET"]);
        assert_eq!(got[1].0[0], PdfObject::Name("F1".into()));
        assert_eq!(got[1].0[1], PdfObject::Int(12));
        assert_eq!(got[3].0[0], PdfObject::String(b"Hi".to_vec()));
    }

    #[test]
    fn test_tj_array_operand() {
        let got = ops(b"[(A) -120 (B)] TJ");
        assert_eq!(got[0].1, "TJ");
        let arr = got[0].0[0].as_array().unwrap();
        assert_eq!(arr.len(), 3);
        assert_eq!(arr[1], PdfObject::Int(-120));
    }

    #[test]
    fn test_inline_image_skipped() {
        let mut data = b"BI /W 2 /H 2 ID ".to_vec();
        data.extend_from_slice(&[0xff, 0x00, b'(', 0x80, 0x99]); // raw pixels
        data.extend_from_slice(b" EI (after) Tj");
        let got = ops(&data);
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].1, "Tj");
        assert_eq!(got[0].0[0], PdfObject::String(b"after".to_vec()));
    }

    #[test]
    fn test_unterminated_string_is_error() {
        let mut parser = ContentParser::new(b"(never closed Tj");
        assert!(parser.next_op().is_err());
    }
}
