use crate::error::{CodecError, CodecResult};
use crate::symbol::{Location, Range, TypeComposite, TypeName};

/// Cursor over an encoded record. Every read checks the remaining length so
/// a truncated buffer yields [`CodecError::UnexpectedEnd`] rather than a panic.
#[derive(Debug)]
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn finish(&self) -> CodecResult<()> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(CodecError::TrailingBytes(n)),
        }
    }

    fn take(&mut self, len: usize) -> CodecResult<&'a [u8]> {
        if self.remaining() < len {
            return Err(CodecError::UnexpectedEnd {
                needed: len,
                remaining: self.remaining(),
            });
        }
        let slice = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn take_array<const N: usize>(&mut self) -> CodecResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn read_u32(&mut self) -> CodecResult<u32> {
        Ok(u32::from_be_bytes(self.take_array()?))
    }

    pub fn read_i32(&mut self) -> CodecResult<i32> {
        Ok(i32::from_be_bytes(self.take_array()?))
    }

    pub fn read_i64(&mut self) -> CodecResult<i64> {
        Ok(i64::from_be_bytes(self.take_array()?))
    }

    pub fn read_bool(&mut self) -> CodecResult<bool> {
        match self.take(1)?[0] {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(CodecError::InvalidBool(other)),
        }
    }

    pub fn read_str(&mut self) -> CodecResult<String> {
        let len = self.read_u32()? as usize;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| CodecError::InvalidUtf8)
    }

    pub fn read_opt_str(&mut self) -> CodecResult<Option<String>> {
        if self.read_bool()? {
            self.read_str().map(Some)
        } else {
            Ok(None)
        }
    }

    /// Reads a u32 count, rejecting counts that cannot possibly fit in the
    /// rest of the buffer given `min_item_len` bytes per item.
    pub fn read_count(&mut self, min_item_len: usize) -> CodecResult<usize> {
        let count = self.read_u32()? as usize;
        let needed = count.saturating_mul(min_item_len);
        if needed > self.remaining() {
            return Err(CodecError::UnexpectedEnd {
                needed,
                remaining: self.remaining(),
            });
        }
        Ok(count)
    }

    pub fn read_str_list(&mut self) -> CodecResult<Vec<String>> {
        let count = self.read_count(4)?;
        (0..count).map(|_| self.read_str()).collect()
    }

    pub fn read_type_name(&mut self) -> CodecResult<Option<TypeName>> {
        Ok(self.read_opt_str()?.map(|s| TypeName::from_stored(&s)))
    }

    pub fn read_types(&mut self) -> CodecResult<TypeComposite> {
        let count = self.read_count(1)?;
        let mut types = TypeComposite::new();
        for _ in 0..count {
            if let Some(name) = self.read_type_name()? {
                types.push(name);
            }
        }
        Ok(types)
    }

    pub fn read_range(&mut self) -> CodecResult<Range> {
        let start = self.read_i32()? as u32;
        let end = self.read_i32()? as u32;
        Ok(Range::new(start, end))
    }

    pub fn read_opt_range(&mut self) -> CodecResult<Option<Range>> {
        if self.read_bool()? {
            self.read_range().map(Some)
        } else {
            Ok(None)
        }
    }

    pub fn read_location(&mut self) -> CodecResult<Location> {
        if !self.read_bool()? {
            return Ok(Location::empty());
        }
        let uri = self.read_str()?;
        let range = self.read_range()?;
        Ok(Location::new(uri, range))
    }
}
