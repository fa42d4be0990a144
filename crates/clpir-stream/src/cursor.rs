use bytes::Buf;

use crate::error::{IrError, Result};

/// Read position over an in-memory IR buffer.
///
/// Running past the end of the buffer is [`IrError::IncompleteIr`]: the bytes
/// may simply not have arrived yet.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current offset from the start of the buffer.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Move to an absolute offset.
    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos > self.data.len() {
            return Err(IrError::IncompleteIr);
        }
        self.pos = pos;
        Ok(())
    }

    /// Bytes left after the current position.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// The whole underlying buffer.
    pub fn get_ref(&self) -> &'a [u8] {
        self.data
    }

    /// Read exactly `len` bytes without copying.
    pub fn read_exact(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.remaining() < len {
            return Err(IrError::IncompleteIr);
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_exact(1)?.get_u8())
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_exact(1)?.get_i8())
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(self.read_exact(2)?.get_u16())
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(self.read_exact(2)?.get_i16())
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(self.read_exact(4)?.get_i32())
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        Ok(self.read_exact(8)?.get_i64())
    }

    /// Run `f`, rewinding to the starting position if it fails.
    pub(crate) fn transaction<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let start = self.pos;
        let result = f(self);
        if result.is_err() {
            self.pos = start;
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_big_endian_values() {
        let data = [0x7F, 0x01, 0x02, 0xFF, 0xFE, 0x00, 0x00, 0x00, 0x2A];
        let mut cursor = ByteCursor::new(&data);
        assert_eq!(cursor.read_u8().unwrap(), 0x7F);
        assert_eq!(cursor.read_u16().unwrap(), 0x0102);
        assert_eq!(cursor.read_i16().unwrap(), -2);
        assert_eq!(cursor.read_i32().unwrap(), 42);
        assert_eq!(cursor.remaining(), 0);
    }

    #[test]
    fn short_reads_are_incomplete_and_do_not_advance() {
        let data = [0x01, 0x02, 0x03];
        let mut cursor = ByteCursor::new(&data);
        cursor.read_u8().unwrap();
        assert!(matches!(cursor.read_i32(), Err(IrError::IncompleteIr)));
        assert_eq!(cursor.position(), 1);
        assert_eq!(cursor.read_exact(2).unwrap(), &[0x02, 0x03]);
    }

    #[test]
    fn seek_within_bounds() {
        let data = [1, 2, 3];
        let mut cursor = ByteCursor::new(&data);
        cursor.seek(3).unwrap();
        assert_eq!(cursor.remaining(), 0);
        assert!(matches!(cursor.seek(4), Err(IrError::IncompleteIr)));
        cursor.seek(1).unwrap();
        assert_eq!(cursor.read_u8().unwrap(), 2);
    }

    #[test]
    fn transaction_rewinds_on_error() {
        let data = [1, 2];
        let mut cursor = ByteCursor::new(&data);
        let result = cursor.transaction(|c| {
            c.read_u8()?;
            c.read_i64()
        });
        assert!(result.is_err());
        assert_eq!(cursor.position(), 0);
    }
}
