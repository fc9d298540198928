//! RC4 stream cipher, as used by the standard security handler
//! revisions 2 and 3.

/// RC4 keystream state.
pub struct Arcfour {
    s: [u8; 256],
    i: u8,
    j: u8,
}

impl Arcfour {
    pub fn new(key: &[u8]) -> Self {
        let mut s = [0u8; 256];
        for (i, slot) in s.iter_mut().enumerate() {
            *slot = i as u8;
        }
        let mut j = 0u8;
        for i in 0..256 {
            j = j
                .wrapping_add(s[i])
                .wrapping_add(key[i % key.len()]);
            s.swap(i, j as usize);
        }
        Self { s, i: 0, j: 0 }
    }

    /// Encrypt or decrypt (the cipher is symmetric).
    pub fn process(&mut self, data: &[u8]) -> Vec<u8> {
        data.iter()
            .map(|&b| {
                self.i = self.i.wrapping_add(1);
                self.j = self.j.wrapping_add(self.s[self.i as usize]);
                self.s.swap(self.i as usize, self.j as usize);
                let k = self.s
                    [(self.s[self.i as usize].wrapping_add(self.s[self.j as usize])) as usize];
                b ^ k
            })
            .collect()
    }
}

/// One-shot convenience.
pub fn apply(key: &[u8], data: &[u8]) -> Vec<u8> {
    Arcfour::new(key).process(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_vector() {
        // RFC 6229-adjacent classic vector.
        assert_eq!(
            apply(b"Key", b"Plaintext"),
            vec![0xbb, 0xf3, 0x16, 0xe8, 0xd9, 0x40, 0xaf, 0x0a, 0xd3]
        );
    }

    #[test]
    fn test_symmetric() {
        let ct = apply(b"secret", b"some stream content");
        assert_eq!(apply(b"secret", &ct), b"some stream content");
    }
}
