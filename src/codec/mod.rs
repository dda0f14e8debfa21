//! Binary record format shared by every table.
//!
//! Integers are big-endian, booleans one byte, strings a u32 length followed
//! by UTF-8 bytes. Each stored record starts with a u32 tag naming its kind,
//! so a table holding several kinds can dispatch on read and a row of the
//! wrong kind is rejected instead of misread.

pub mod key;
pub mod reader;
pub mod records;
pub mod writer;

pub use key::{KeyBuilder, KeyReader, decode_tuple, encode_tuple};
pub use reader::Reader;
pub use records::{CompletionEntry, DocumentRecord};
pub use writer::Writer;

use crate::error::CodecResult;

pub trait Encode {
    fn encode(&self, w: &mut Writer);
}

pub trait Decode: Sized {
    fn decode(r: &mut Reader<'_>) -> CodecResult<Self>;
}

pub fn to_bytes<T: Encode + ?Sized>(value: &T) -> Vec<u8> {
    let mut writer = Writer::with_capacity(64);
    value.encode(&mut writer);
    writer.into_bytes()
}

/// Decodes one complete record; leftover bytes are an error.
pub fn from_bytes<T: Decode>(bytes: &[u8]) -> CodecResult<T> {
    let mut reader = Reader::new(bytes);
    let value = T::decode(&mut reader)?;
    reader.finish()?;
    Ok(value)
}
