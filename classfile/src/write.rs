use crate::{ClassError, ClassResult};
use byteorder::{BigEndian, ByteOrder};

/// An append-only big-endian sink, the counterpart of
/// [`ByteParser`](crate::parse::ByteParser).
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    pub fn new() -> Self {
        ByteWriter { buf: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub fn write_u16(&mut self, value: u16) {
        let mut b = [0; 2];
        BigEndian::write_u16(&mut b, value);
        self.write_bytes(&b);
    }

    pub fn write_u32(&mut self, value: u32) {
        let mut b = [0; 4];
        BigEndian::write_u32(&mut b, value);
        self.write_bytes(&b);
    }

    pub fn write_i32(&mut self, value: i32) {
        let mut b = [0; 4];
        BigEndian::write_i32(&mut b, value);
        self.write_bytes(&b);
    }

    pub fn write_i64(&mut self, value: i64) {
        let mut b = [0; 8];
        BigEndian::write_i64(&mut b, value);
        self.write_bytes(&b);
    }

    pub fn write_f32(&mut self, value: f32) {
        self.write_u32(value.to_bits());
    }

    pub fn write_f64(&mut self, value: f64) {
        let mut b = [0; 8];
        BigEndian::write_u64(&mut b, value.to_bits());
        self.write_bytes(&b);
    }

    /// Writes a pool index. Indices handed out by the pool builder always fit.
    pub fn write_index(&mut self, index: usize) -> ClassResult<()> {
        self.write_len_u16(index, "constant pool index")
    }

    pub fn write_len_u8(&mut self, len: usize, what: &'static str) -> ClassResult<()> {
        if len > u8::MAX as usize {
            return Err(ClassError::TooLarge { what, len });
        }
        self.write_u8(len as u8);
        Ok(())
    }

    pub fn write_len_u16(&mut self, len: usize, what: &'static str) -> ClassResult<()> {
        if len > u16::MAX as usize {
            return Err(ClassError::TooLarge { what, len });
        }
        self.write_u16(len as u16);
        Ok(())
    }

    pub fn write_len_u32(&mut self, len: usize, what: &'static str) -> ClassResult<()> {
        if len > u32::MAX as usize {
            return Err(ClassError::TooLarge { what, len });
        }
        self.write_u32(len as u32);
        Ok(())
    }

    /// Writes a zeroed `u32` and returns its position, to be filled in by
    /// [`ByteWriter::patch_len`] once the length of what follows is known.
    pub fn reserve_u32(&mut self) -> usize {
        let position = self.buf.len();
        self.write_u32(0);
        position
    }

    /// Back-patches the `u32` at `position` with the number of bytes written
    /// after it.
    pub fn patch_len(&mut self, position: usize, what: &'static str) -> ClassResult<()> {
        let len = self.buf.len() - position - 4;
        if len > u32::MAX as usize {
            return Err(ClassError::TooLarge { what, len });
        }
        BigEndian::write_u32(&mut self.buf[position..position + 4], len as u32);
        Ok(())
    }
}
