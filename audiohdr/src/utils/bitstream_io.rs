//! Bitstream I/O utilities for header parsing.
//!
//! [`BsIoSliceReader`] is a big-endian bit cursor over a byte slice whose
//! readable length is given in bits, so callers may hand over headers that do
//! not end on a byte boundary. Every read is checked against that bit length.
//! [`BsIoVecWriter`] is the matching writer used to re-emit bits verbatim.

use std::io;
use std::io::SeekFrom;

use bitstream_io::{BigEndian, BitRead, BitReader, BitWrite, BitWriter, UnsignedInteger};

use crate::utils::errors::{HeaderError, InvalidDataKind, Result};

/// Saved reader position, restored with [`BitstreamIoReader::reset_to`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitMark(u64);

impl BitMark {
    pub fn position(&self) -> u64 {
        self.0
    }
}

#[derive(Debug)]
pub struct BitstreamIoReader<R: io::Read + io::Seek> {
    bs: BitReader<R, BigEndian>,
    len: u64,
}

pub type BsIoSliceReader<'a> = BitstreamIoReader<io::Cursor<&'a [u8]>>;

impl<R> BitstreamIoReader<R>
where
    R: io::Read + io::Seek,
{
    pub fn new(read: R, len_bits: u64) -> Self {
        Self {
            bs: BitReader::new(read),
            len: len_bits,
        }
    }

    #[inline(always)]
    pub fn get(&mut self) -> Result<bool> {
        self.ensure(1)?;
        Ok(self.bs.read_bit()?)
    }

    #[inline(always)]
    pub fn get_n<U: UnsignedInteger>(&mut self, n: u32) -> Result<U> {
        self.ensure(n)?;
        Ok(self.bs.read_unsigned_var(n)?)
    }

    /// Reads `n` bits without moving the cursor.
    #[inline(always)]
    pub fn peek_n<U: UnsignedInteger>(&mut self, n: u32) -> Result<U> {
        let mark = self.mark()?;
        let value = self.get_n(n);
        self.reset_to(mark)?;
        value
    }

    /// Like [`peek_n`](Self::peek_n), but bits past the end read as zero.
    pub fn peek_n_padded(&mut self, n: u32) -> Result<u32> {
        let avail = self.available()?.min(n as u64) as u32;
        if avail == 0 {
            return Ok(0);
        }

        let value: u32 = self.peek_n(avail)?;
        Ok(value << (n - avail))
    }

    #[inline(always)]
    pub fn skip_n(&mut self, n: u32) -> Result<()> {
        self.ensure(n)?;
        Ok(self.bs.skip(n)?)
    }

    /// Advances to the next byte boundary. A no-op when already aligned.
    #[inline(always)]
    pub fn byte_align(&mut self) {
        self.bs.byte_align();
    }

    #[inline(always)]
    pub fn position(&mut self) -> Result<u64> {
        Ok(self.bs.position_in_bits()?)
    }

    #[inline(always)]
    pub fn available(&mut self) -> Result<u64> {
        self.position().map(|pos| self.len.saturating_sub(pos))
    }

    pub fn mark(&mut self) -> Result<BitMark> {
        self.position().map(BitMark)
    }

    pub fn reset_to(&mut self, mark: BitMark) -> Result<()> {
        self.bs.seek_bits(SeekFrom::Start(mark.0))?;
        Ok(())
    }

    fn ensure(&mut self, n: u32) -> Result<()> {
        let position = self.position()?;
        let available = self.len.saturating_sub(position);
        if n as u64 > available {
            return Err(HeaderError::InvalidData(InvalidDataKind::UnexpectedEnd {
                position,
                requested: n,
                available,
            }));
        }

        Ok(())
    }
}

impl<'a> BsIoSliceReader<'a> {
    pub fn from_slice(buf: &'a [u8]) -> Self {
        let len = (buf.len() as u64) << 3;
        Self::new(io::Cursor::new(buf), len)
    }

    /// Reader limited to the first `bit_len` bits of `buf`.
    pub fn with_bit_len(buf: &'a [u8], bit_len: u64) -> Result<Self> {
        let available = (buf.len() as u64) << 3;
        if bit_len > available {
            return Err(HeaderError::BufferTooSmall {
                needed: bit_len,
                available,
            });
        }

        Ok(Self::new(io::Cursor::new(buf), bit_len))
    }
}

impl Default for BsIoSliceReader<'_> {
    fn default() -> Self {
        Self::from_slice(&[])
    }
}

/// Bit writer that keeps its own running bit count.
pub struct BitstreamIoWriter<W: io::Write> {
    bs: BitWriter<W, BigEndian>,
    written: u64,
}

impl<W: io::Write> std::fmt::Debug for BitstreamIoWriter<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BitstreamIoWriter")
            .field("written", &self.written)
            .finish_non_exhaustive()
    }
}

pub type BsIoVecWriter = BitstreamIoWriter<Vec<u8>>;

impl<W: io::Write> BitstreamIoWriter<W> {
    pub fn new(write: W) -> Self {
        Self {
            bs: BitWriter::endian(write, BigEndian),
            written: 0,
        }
    }

    #[inline(always)]
    pub fn put(&mut self, bit: bool) -> Result<()> {
        self.bs.write_bit(bit)?;
        self.written += 1;
        Ok(())
    }

    #[inline(always)]
    pub fn put_n<U: UnsignedInteger>(&mut self, n: u32, value: U) -> Result<()> {
        self.bs.write_unsigned_var(n, value)?;
        self.written += n as u64;
        Ok(())
    }

    #[inline(always)]
    pub fn bits_written(&self) -> u64 {
        self.written
    }

    /// Pads with zero bits up to the next byte boundary.
    pub fn byte_align(&mut self) -> Result<()> {
        let pad = (8 - (self.written & 7)) & 7;
        self.bs.byte_align()?;
        self.written += pad;
        Ok(())
    }

    /// Aligns and returns the underlying sink.
    pub fn into_inner(mut self) -> Result<W> {
        self.byte_align()?;
        Ok(self.bs.into_writer())
    }
}

impl BsIoVecWriter {
    pub fn into_bytes(self) -> Result<Vec<u8>> {
        self.into_inner()
    }
}

impl Default for BsIoVecWriter {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bit_length_bounds_reads() {
        let buf = [0xAB, 0xCD];
        let mut reader = BsIoSliceReader::with_bit_len(&buf, 12).unwrap();

        assert_eq!(reader.get_n::<u16>(12).unwrap(), 0xABC);
        assert!(matches!(
            reader.get(),
            Err(HeaderError::InvalidData(InvalidDataKind::UnexpectedEnd {
                position: 12,
                requested: 1,
                available: 0,
            }))
        ));
    }

    #[test]
    fn bit_length_past_buffer() {
        let buf = [0u8; 2];
        assert_eq!(
            BsIoSliceReader::with_bit_len(&buf, 17).unwrap_err(),
            HeaderError::BufferTooSmall {
                needed: 17,
                available: 16
            }
        );
    }

    #[test]
    fn peek_does_not_consume() {
        let buf = [0b1010_0000];
        let mut reader = BsIoSliceReader::from_slice(&buf);

        assert_eq!(reader.peek_n::<u8>(3).unwrap(), 0b101);
        assert_eq!(reader.position().unwrap(), 0);

        // failed peek leaves the cursor where it was
        reader.skip_n(4).unwrap();
        assert!(reader.peek_n::<u8>(5).is_err());
        assert_eq!(reader.position().unwrap(), 4);
    }

    #[test]
    fn padded_peek_zero_fills() {
        let buf = [0b0000_0011];
        let mut reader = BsIoSliceReader::from_slice(&buf);
        reader.skip_n(6).unwrap();

        assert_eq!(reader.peek_n_padded(9).unwrap(), 0b11_0000000);
        assert_eq!(reader.position().unwrap(), 6);
    }

    #[test]
    fn mark_and_reset() {
        let buf = [0xF0, 0x0F];
        let mut reader = BsIoSliceReader::from_slice(&buf);
        reader.skip_n(3).unwrap();

        let mark = reader.mark().unwrap();
        reader.skip_n(9).unwrap();
        reader.reset_to(mark).unwrap();

        assert_eq!(mark.position(), 3);
        assert_eq!(reader.get_n::<u8>(5).unwrap(), 0b10000);
    }

    #[test]
    fn writer_counts_alignment_padding() {
        let mut writer = BsIoVecWriter::default();
        writer.put_n(3, 0b101u8).unwrap();
        writer.byte_align().unwrap();
        assert_eq!(writer.bits_written(), 8);

        writer.put(true).unwrap();
        assert_eq!(writer.bits_written(), 9);
        assert_eq!(
            format!("{writer:?}"),
            "BitstreamIoWriter { written: 9, .. }"
        );

        assert_eq!(writer.into_bytes().unwrap(), [0b1010_0000, 0b1000_0000]);
    }
}
