// AMF decoder utilities

use byteorder::{BigEndian, ByteOrder};

/// Cursor over a buffer being decoded
pub struct AMFDecodingCursor<'a> {
    /// Buffer being read
    buffer: &'a [u8],

    /// Current position
    pos: usize,
}

impl<'a> AMFDecodingCursor<'a> {
    /// Creates new cursor for a buffer
    pub fn new(buffer: &'a [u8]) -> AMFDecodingCursor<'a> {
        AMFDecodingCursor { buffer, pos: 0 }
    }

    /// Checks if the cursor position can be incremented by n units
    fn can_increment_pos(&self, n: usize) -> bool {
        match self.pos.checked_add(n) {
            Some(np) => np <= self.buffer.len(),
            None => false,
        }
    }

    /// Reads bytes
    /// Errors on buffer overflow
    pub fn read(&mut self, n: usize) -> Result<&'a [u8], ()> {
        if !self.can_increment_pos(n) {
            return Err(());
        }

        let r: &'a [u8] = &self.buffer[self.pos..(self.pos + n)];

        self.pos += n;

        Ok(r)
    }

    /// Reads byte
    /// Errors on overflow
    pub fn read_byte(&mut self) -> Result<u8, ()> {
        let bytes = self.read(1)?;
        Ok(bytes[0])
    }

    /// Reads a big endian u16
    pub fn read_u16(&mut self) -> Result<u16, ()> {
        Ok(BigEndian::read_u16(self.read(2)?))
    }

    /// Reads a big endian u32
    pub fn read_u32(&mut self) -> Result<u32, ()> {
        Ok(BigEndian::read_u32(self.read(4)?))
    }

    /// Reads a big endian f64
    pub fn read_f64(&mut self) -> Result<f64, ()> {
        Ok(BigEndian::read_f64(self.read(8)?))
    }

    /// Looks at the next byte, without changing the cursor
    pub fn look_byte(&self) -> Result<u8, ()> {
        match self.buffer.get(self.pos) {
            Some(b) => Ok(*b),
            None => Err(()),
        }
    }

    /// Returns true if the cursor is at the end
    pub fn ended(&self) -> bool {
        self.pos >= self.buffer.len()
    }
}
