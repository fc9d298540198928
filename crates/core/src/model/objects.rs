//! PDF object types.

use crate::error::{PdfError, Result};
use bytes::Bytes;
use std::collections::HashMap;

/// PDF object - the fundamental value type in a PDF file.
///
/// Immutable once parsed; shared through `Arc` by the document's object
/// store.
#[derive(Debug, Clone, PartialEq)]
pub enum PdfObject {
    Null,
    Bool(bool),
    Int(i64),
    Real(f64),
    /// Name object (e.g., /Type, /Font)
    Name(String),
    /// String (byte array; text encoding is resolved only at the facade)
    String(Vec<u8>),
    Array(Vec<Self>),
    Dict(HashMap<String, Self>),
    /// Stream (dictionary + raw byte payload)
    Stream(Box<PdfStream>),
    /// Indirect object reference
    Ref(ObjRef),
}

impl PdfObject {
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub const fn as_int(&self) -> Result<i64> {
        match self {
            Self::Int(n) => Ok(*n),
            _ => Err(PdfError::TypeError {
                expected: "int",
                got: self.type_name(),
            }),
        }
    }

    /// Numeric value with int coerced to f64.
    pub const fn as_num(&self) -> Result<f64> {
        match self {
            Self::Int(n) => Ok(*n as f64),
            Self::Real(n) => Ok(*n),
            _ => Err(PdfError::TypeError {
                expected: "number",
                got: self.type_name(),
            }),
        }
    }

    pub fn as_name(&self) -> Result<&str> {
        match self {
            Self::Name(s) => Ok(s),
            _ => Err(PdfError::TypeError {
                expected: "name",
                got: self.type_name(),
            }),
        }
    }

    pub fn as_string(&self) -> Result<&[u8]> {
        match self {
            Self::String(s) => Ok(s),
            _ => Err(PdfError::TypeError {
                expected: "string",
                got: self.type_name(),
            }),
        }
    }

    pub const fn as_array(&self) -> Result<&Vec<Self>> {
        match self {
            Self::Array(arr) => Ok(arr),
            _ => Err(PdfError::TypeError {
                expected: "array",
                got: self.type_name(),
            }),
        }
    }

    pub const fn as_dict(&self) -> Result<&HashMap<String, Self>> {
        match self {
            Self::Dict(d) => Ok(d),
            _ => Err(PdfError::TypeError {
                expected: "dict",
                got: self.type_name(),
            }),
        }
    }

    pub fn as_stream(&self) -> Result<&PdfStream> {
        match self {
            Self::Stream(s) => Ok(s),
            _ => Err(PdfError::TypeError {
                expected: "stream",
                got: self.type_name(),
            }),
        }
    }

    pub const fn as_objref(&self) -> Result<&ObjRef> {
        match self {
            Self::Ref(r) => Ok(r),
            _ => Err(PdfError::TypeError {
                expected: "ref",
                got: self.type_name(),
            }),
        }
    }

    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Real(_) => "real",
            Self::Name(_) => "name",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Dict(_) => "dict",
            Self::Stream(_) => "stream",
            Self::Ref(_) => "ref",
        }
    }
}

/// PDF indirect object reference: (object number, generation number).
///
/// Weak-reference semantics: never owns the referenced object, resolved
/// through the document's object store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjRef {
    pub objid: u32,
    pub genno: u32,
}

impl ObjRef {
    pub const fn new(objid: u32, genno: u32) -> Self {
        Self { objid, genno }
    }
}

/// PDF stream - dictionary attributes plus a raw byte payload.
///
/// The payload here is always the on-file (possibly filtered/encrypted)
/// form; the document decodes and caches it on first access.
#[derive(Debug, Clone, PartialEq)]
pub struct PdfStream {
    pub attrs: HashMap<String, PdfObject>,
    rawdata: Bytes,
    /// Object ID, set when the stream is parsed as an indirect object.
    pub objid: Option<u32>,
    pub genno: Option<u32>,
}

impl PdfStream {
    pub fn new(attrs: HashMap<String, PdfObject>, rawdata: impl Into<Bytes>) -> Self {
        Self {
            attrs,
            rawdata: rawdata.into(),
            objid: None,
            genno: None,
        }
    }

    pub const fn set_objid(&mut self, objid: u32, genno: u32) {
        self.objid = Some(objid);
        self.genno = Some(genno);
    }

    /// Raw (undecoded, possibly encrypted) data.
    pub fn rawdata(&self) -> &[u8] {
        self.rawdata.as_ref()
    }

    /// Replace the payload, used after decryption.
    pub fn set_rawdata(&mut self, data: Vec<u8>) {
        self.rawdata = Bytes::from(data);
    }

    pub fn get(&self, name: &str) -> Option<&PdfObject> {
        self.attrs.get(name)
    }
}
