use crate::symbol::{Location, Range, TypeComposite, TypeName};

/// Append-only big-endian record writer.
#[derive(Debug, Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn write_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub fn write_i32(&mut self, value: i32) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub fn write_i64(&mut self, value: i64) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub fn write_bool(&mut self, value: bool) {
        self.buf.push(u8::from(value));
    }

    pub fn write_str(&mut self, value: &str) {
        self.write_u32(value.len() as u32);
        self.buf.extend_from_slice(value.as_bytes());
    }

    pub fn write_opt_str(&mut self, value: Option<&str>) {
        self.write_bool(value.is_some());
        if let Some(value) = value {
            self.write_str(value);
        }
    }

    pub fn write_str_list(&mut self, values: &[String]) {
        self.write_u32(values.len() as u32);
        for value in values {
            self.write_str(value);
        }
    }

    pub fn write_type_name(&mut self, name: Option<&TypeName>) {
        let stored = name.map(TypeName::to_stored);
        self.write_opt_str(stored.as_deref());
    }

    pub fn write_types(&mut self, types: &TypeComposite) {
        self.write_u32(types.len() as u32);
        for name in types.iter() {
            self.write_type_name(Some(name));
        }
    }

    pub fn write_range(&mut self, range: Range) {
        self.write_i32(range.start as i32);
        self.write_i32(range.end as i32);
    }

    pub fn write_opt_range(&mut self, range: Option<Range>) {
        self.write_bool(range.is_some());
        if let Some(range) = range {
            self.write_range(range);
        }
    }

    /// Half-filled locations are written as absent.
    pub fn write_location(&mut self, location: &Location) {
        match (&location.uri, location.range) {
            (Some(uri), Some(range)) => {
                self.write_bool(true);
                self.write_str(uri);
                self.write_range(range);
            }
            _ => self.write_bool(false),
        }
    }
}
