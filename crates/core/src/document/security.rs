//! Standard security handler, revisions 2 and 3 (RC4).
//!
//! Derives the file encryption key from the password and trailer /Encrypt
//! entries, validates it against /U (trying /O as an owner password first),
//! and produces per-object keys for string and stream decryption.

use crate::codec::arcfour;
use crate::error::{PdfError, Result};
use crate::model::objects::PdfObject;
use std::collections::HashMap;

/// Fixed password padding from the PDF specification, Algorithm 2.
const PAD: [u8; 32] = [
    0x28, 0xbf, 0x4e, 0x5e, 0x4e, 0x75, 0x8a, 0x41, 0x64, 0x00, 0x4e, 0x56, 0xff, 0xfa, 0x01,
    0x08, 0x2e, 0x2e, 0x00, 0xb6, 0xd0, 0x68, 0x3e, 0x80, 0x2f, 0x0c, 0xa9, 0xfe, 0x64, 0x53,
    0x69, 0x7a,
];

/// Authenticated standard security handler.
pub struct SecurityHandler {
    key: Vec<u8>,
    p: i64,
}

struct EncryptParams {
    v: i64,
    r: i64,
    length: usize,
    o: Vec<u8>,
    u: Vec<u8>,
    p: i64,
    docid: Vec<u8>,
}

impl SecurityHandler {
    /// Build a handler from the /Encrypt dictionary and document /ID,
    /// authenticating `password` as either the user or owner password.
    pub fn new(
        encrypt: &HashMap<String, PdfObject>,
        docid: &[u8],
        password: &str,
    ) -> Result<Self> {
        let filter = encrypt
            .get("Filter")
            .and_then(|f| f.as_name().ok())
            .unwrap_or("");
        if filter != "Standard" {
            return Err(PdfError::MalformedDocument(format!(
                "unsupported security handler /{}",
                filter
            )));
        }
        let params = EncryptParams {
            v: dict_int(encrypt, "V").unwrap_or(0),
            r: dict_int(encrypt, "R")
                .ok_or_else(|| PdfError::MalformedDocument("missing /R in /Encrypt".into()))?,
            length: (dict_int(encrypt, "Length").unwrap_or(40) / 8) as usize,
            o: dict_bytes(encrypt, "O")?,
            u: dict_bytes(encrypt, "U")?,
            p: dict_int(encrypt, "P")
                .ok_or_else(|| PdfError::MalformedDocument("missing /P in /Encrypt".into()))?,
            docid: docid.to_vec(),
        };
        if !matches!(params.v, 1 | 2) || !matches!(params.r, 2 | 3) {
            return Err(PdfError::MalformedDocument(format!(
                "unsupported encryption V={} R={}",
                params.v, params.r
            )));
        }
        if params.o.len() < 32 || params.u.len() < 32 {
            return Err(PdfError::MalformedDocument("short /O or /U entry".into()));
        }

        // Try the supplied password as an owner password first (recovering
        // the user password from /O), then as a user password. The derived
        // file key is the same either way.
        if let Some(key) = authenticate_owner(password.as_bytes(), &params) {
            return Ok(Self { key, p: params.p });
        }
        if let Some(key) = authenticate_user(password.as_bytes(), &params) {
            return Ok(Self { key, p: params.p });
        }
        Err(PdfError::AuthError)
    }

    /// Text extraction permission (P bit 5).
    pub const fn is_extractable(&self) -> bool {
        self.p & 16 != 0
    }

    /// Decrypt string or stream data belonging to the given object.
    pub fn decrypt(&self, objid: u32, genno: u32, data: &[u8]) -> Vec<u8> {
        let mut material = self.key.clone();
        material.extend_from_slice(&objid.to_le_bytes()[..3]);
        material.extend_from_slice(&genno.to_le_bytes()[..2]);
        let digest = md5::compute(&material);
        let keylen = (self.key.len() + 5).min(16);
        arcfour::apply(&digest.0[..keylen], data)
    }
}

fn dict_int(dict: &HashMap<String, PdfObject>, key: &str) -> Option<i64> {
    dict.get(key).and_then(|v| v.as_int().ok())
}

fn dict_bytes(dict: &HashMap<String, PdfObject>, key: &str) -> Result<Vec<u8>> {
    dict.get(key)
        .and_then(|v| v.as_string().ok())
        .map(<[u8]>::to_vec)
        .ok_or_else(|| PdfError::MalformedDocument(format!("missing /{} in /Encrypt", key)))
}

fn pad_password(password: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    let n = password.len().min(32);
    out[..n].copy_from_slice(&password[..n]);
    out[n..].copy_from_slice(&PAD[..32 - n]);
    out
}

/// Algorithm 2: derive the file key from a (user) password.
fn derive_key(password: &[u8], params: &EncryptParams) -> Vec<u8> {
    let mut material = Vec::with_capacity(84);
    material.extend_from_slice(&pad_password(password));
    material.extend_from_slice(&params.o[..32]);
    material.extend_from_slice(&(params.p as i32).to_le_bytes());
    material.extend_from_slice(&params.docid);
    let mut digest = md5::compute(&material).0;
    let keylen = if params.r >= 3 { params.length.clamp(5, 16) } else { 5 };
    if params.r >= 3 {
        for _ in 0..50 {
            digest = md5::compute(&digest[..keylen]).0;
        }
    }
    digest[..keylen].to_vec()
}

/// Algorithms 4/5: the /U value a given key should produce.
fn compute_u(key: &[u8], params: &EncryptParams) -> Vec<u8> {
    if params.r == 2 {
        return arcfour::apply(key, &PAD);
    }
    let mut material = PAD.to_vec();
    material.extend_from_slice(&params.docid);
    let hash = md5::compute(&material).0;
    let mut u = arcfour::apply(key, &hash);
    for i in 1u8..=19 {
        let k: Vec<u8> = key.iter().map(|&b| b ^ i).collect();
        u = arcfour::apply(&k, &u);
    }
    u
}

fn authenticate_user(password: &[u8], params: &EncryptParams) -> Option<Vec<u8>> {
    let key = derive_key(password, params);
    let expected = compute_u(&key, params);
    let matches = if params.r == 2 {
        expected == params.u[..32]
    } else {
        expected[..16] == params.u[..16]
    };
    matches.then_some(key)
}

/// Algorithm 7: recover the user password from /O, then authenticate it.
fn authenticate_owner(password: &[u8], params: &EncryptParams) -> Option<Vec<u8>> {
    let mut digest = md5::compute(pad_password(password)).0;
    let keylen = if params.r >= 3 { params.length.clamp(5, 16) } else { 5 };
    if params.r >= 3 {
        for _ in 0..50 {
            digest = md5::compute(&digest[..keylen]).0;
        }
    }
    let okey = &digest[..keylen];
    let user_password = if params.r == 2 {
        arcfour::apply(okey, &params.o[..32])
    } else {
        let mut data = params.o[..32].to_vec();
        for i in (0u8..=19).rev() {
            let k: Vec<u8> = okey.iter().map(|&b| b ^ i).collect();
            data = arcfour::apply(&k, &data);
        }
        data
    };
    authenticate_user(&user_password, params)
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Builders that produce valid /Encrypt entries for test documents.

    use super::*;

    pub struct EncryptFixture {
        pub o: Vec<u8>,
        pub u: Vec<u8>,
    }

    /// Compute /O and /U for an R2/V1 (40-bit) standard handler so tests
    /// can assemble encrypted documents that genuinely authenticate.
    pub fn rev2(user_pw: &str, owner_pw: &str, p: i64, docid: &[u8]) -> EncryptFixture {
        let digest = md5::compute(pad_password(owner_pw.as_bytes()));
        let o = arcfour::apply(&digest.0[..5], &pad_password(user_pw.as_bytes()));
        let params = EncryptParams {
            v: 1,
            r: 2,
            length: 5,
            o: o.clone(),
            u: vec![0; 32],
            p,
            docid: docid.to_vec(),
        };
        let key = derive_key(user_pw.as_bytes(), &params);
        let u = compute_u(&key, &params);
        EncryptFixture { o, u }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encrypt_dict(fix: &fixtures::EncryptFixture, p: i64) -> HashMap<String, PdfObject> {
        let mut dict = HashMap::new();
        dict.insert("Filter".into(), PdfObject::Name("Standard".into()));
        dict.insert("V".into(), PdfObject::Int(1));
        dict.insert("R".into(), PdfObject::Int(2));
        dict.insert("Length".into(), PdfObject::Int(40));
        dict.insert("O".into(), PdfObject::String(fix.o.clone()));
        dict.insert("U".into(), PdfObject::String(fix.u.clone()));
        dict.insert("P".into(), PdfObject::Int(p));
        dict
    }

    #[test]
    fn test_user_password_authenticates() {
        let docid = b"0123456789abcdef";
        let fix = fixtures::rev2("open sesame", "hunter2", -4, docid);
        let dict = encrypt_dict(&fix, -4);
        let handler = SecurityHandler::new(&dict, docid, "open sesame").unwrap();
        assert!(handler.is_extractable());
    }

    #[test]
    fn test_owner_password_authenticates() {
        let docid = b"0123456789abcdef";
        let fix = fixtures::rev2("open sesame", "hunter2", -4, docid);
        let dict = encrypt_dict(&fix, -4);
        assert!(SecurityHandler::new(&dict, docid, "hunter2").is_ok());
    }

    #[test]
    fn test_wrong_password_rejected() {
        let docid = b"0123456789abcdef";
        let fix = fixtures::rev2("open sesame", "hunter2", -4, docid);
        let dict = encrypt_dict(&fix, -4);
        assert!(matches!(
            SecurityHandler::new(&dict, docid, "nope"),
            Err(PdfError::AuthError)
        ));
    }

    #[test]
    fn test_copy_protected_permission() {
        let docid = b"0123456789abcdef";
        // All permission bits cleared except the sign bits.
        let p = -64i64; // ...111000000: print/modify/copy cleared
        let fix = fixtures::rev2("", "", p, docid);
        let dict = encrypt_dict(&fix, p);
        let handler = SecurityHandler::new(&dict, docid, "").unwrap();
        assert!(!handler.is_extractable());
    }

    #[test]
    fn test_object_key_decrypts_roundtrip() {
        let docid = b"0123456789abcdef";
        let fix = fixtures::rev2("", "", -4, docid);
        let dict = encrypt_dict(&fix, -4);
        let handler = SecurityHandler::new(&dict, docid, "").unwrap();
        let ct = handler.decrypt(7, 0, b"stream body");
        assert_ne!(ct, b"stream body");
        assert_eq!(handler.decrypt(7, 0, &ct), b"stream body");
    }
}
