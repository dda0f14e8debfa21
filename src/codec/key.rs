//! Order-preserving tuple keys.
//!
//! Strings are written byte for byte with `0x00` escaped as `0x00 0xFF` and
//! closed by `0x00 0x01`; integers as four big-endian bytes with the sign bit
//! flipped. Comparing two encoded keys bytewise gives the same answer as
//! comparing the tuples field by field.

use crate::error::{CodecError, CodecResult};

const ESCAPE: u8 = 0x00;
const ESCAPED_NUL: u8 = 0xFF;
const TERMINATOR: u8 = 0x01;

#[derive(Debug, Default, Clone)]
pub struct KeyBuilder {
    buf: Vec<u8>,
}

impl KeyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_str(mut self, value: &str) -> Self {
        for &byte in value.as_bytes() {
            if byte == ESCAPE {
                self.buf.extend_from_slice(&[ESCAPE, ESCAPED_NUL]);
            } else {
                self.buf.push(byte);
            }
        }
        self.buf.extend_from_slice(&[ESCAPE, TERMINATOR]);
        self
    }

    pub fn push_i32(mut self, value: i32) -> Self {
        let flipped = (value as u32) ^ 0x8000_0000;
        self.buf.extend_from_slice(&flipped.to_be_bytes());
        self
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}

#[derive(Debug)]
pub struct KeyReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> KeyReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn read_str(&mut self) -> CodecResult<String> {
        let mut out = Vec::new();
        loop {
            let byte = *self
                .buf
                .get(self.pos)
                .ok_or(CodecError::InvalidKey("unterminated string"))?;
            self.pos += 1;
            if byte != ESCAPE {
                out.push(byte);
                continue;
            }
            let marker = *self
                .buf
                .get(self.pos)
                .ok_or(CodecError::InvalidKey("dangling escape"))?;
            self.pos += 1;
            match marker {
                ESCAPED_NUL => out.push(0),
                TERMINATOR => break,
                _ => return Err(CodecError::InvalidKey("bad escape")),
            }
        }
        String::from_utf8(out).map_err(|_| CodecError::InvalidUtf8)
    }

    pub fn read_i32(&mut self) -> CodecResult<i32> {
        let bytes = self
            .buf
            .get(self.pos..self.pos + 4)
            .ok_or(CodecError::InvalidKey("truncated integer"))?;
        self.pos += 4;
        let raw = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        Ok((raw ^ 0x8000_0000) as i32)
    }

    pub fn is_empty(&self) -> bool {
        self.pos >= self.buf.len()
    }
}

pub fn encode_tuple(name: &str, a: i32, b: i32) -> Vec<u8> {
    KeyBuilder::new().push_str(name).push_i32(a).push_i32(b).finish()
}

pub fn decode_tuple(bytes: &[u8]) -> CodecResult<(String, i32, i32)> {
    let mut reader = KeyReader::new(bytes);
    let name = reader.read_str()?;
    let a = reader.read_i32()?;
    let b = reader.read_i32()?;
    if !reader.is_empty() {
        return Err(CodecError::InvalidKey("trailing bytes"));
    }
    Ok((name, a, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tuple_round_trip() {
        let cases = [
            ("file:///a.php", 0, 0),
            ("with\0nul", -5, 17),
            ("", i32::MIN, i32::MAX),
        ];
        for (name, a, b) in cases {
            let encoded = encode_tuple(name, a, b);
            assert_eq!(decode_tuple(&encoded).unwrap(), (name.to_string(), a, b));
        }
    }

    #[test]
    fn test_byte_order_matches_tuple_order() {
        let mut tuples = vec![
            ("b".to_string(), 1, 0),
            ("a".to_string(), 10, 3),
            ("a".to_string(), -1, 0),
            ("a\0".to_string(), 0, 0),
            ("ab".to_string(), 0, 0),
            ("a".to_string(), 10, 2),
            ("".to_string(), 0, 0),
        ];
        let mut encoded: Vec<Vec<u8>> = tuples
            .iter()
            .map(|(s, a, b)| encode_tuple(s, *a, *b))
            .collect();

        tuples.sort();
        encoded.sort();

        let decoded: Vec<(String, i32, i32)> = encoded
            .iter()
            .map(|bytes| decode_tuple(bytes).unwrap())
            .collect();
        assert_eq!(decoded, tuples);
    }

    #[test]
    fn test_string_prefix_is_key_prefix() {
        let prefix = KeyBuilder::new().push_str("file:///a.php").finish();
        let key = encode_tuple("file:///a.php", 4, 2);
        let other = encode_tuple("file:///a.php5", 4, 2);
        assert!(key.starts_with(&prefix));
        assert!(!other.starts_with(&prefix));
    }

    #[test]
    fn test_malformed_keys() {
        assert!(decode_tuple(b"abc").is_err());
        assert!(decode_tuple(&[b'a', 0x00, 0x07]).is_err());
        let mut key = encode_tuple("a", 1, 2);
        key.pop();
        assert!(decode_tuple(&key).is_err());
    }
}
