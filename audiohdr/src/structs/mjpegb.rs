//! MJPEG-B field header.
//!
//! Each field of an MJPEG-B packet starts with a fixed 40-byte header holding
//! offsets to the JPEG segments of that field. Interlaced packets carry a
//! second field whose header is found through the first one.

use log::{debug, trace, warn};

use crate::utils::bitstream_io::BsIoSliceReader;
use crate::utils::errors::{HeaderError, InvalidDataKind, Result};

pub const MJPEGB_TAG: u32 = u32::from_be_bytes(*b"mjpg");

pub const MJPEGB_HEADER_SIZE: usize = 40;

pub const MJPEGB_MAX_PACKET: usize = 1 << 28;

/// Segment offsets are relative to the start of the field header.
/// Zero means the segment is absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MjpegbHeader {
    pub field_size: u32,
    pub second_field_offset: u32,
    pub dqt_offset: u32,
    pub dht_offset: u32,
    pub sof_offset: u32,
    pub sos_offset: u32,
    pub sod_offset: u32,
}

impl MjpegbHeader {
    pub fn read(buf: &[u8]) -> Result<Self> {
        if buf.len() >= MJPEGB_MAX_PACKET {
            return Err(InvalidDataKind::MjpegbPacketTooLarge(buf.len()).into());
        }
        if buf.len() < MJPEGB_HEADER_SIZE {
            return Err(HeaderError::BufferTooSmall {
                needed: (MJPEGB_HEADER_SIZE as u64) << 3,
                available: (buf.len() as u64) << 3,
            });
        }

        let size = buf.len() as u32;
        let mut reader = BsIoSliceReader::from_slice(&buf[..MJPEGB_HEADER_SIZE]);

        // reserved zeros
        reader.skip_n(32)?;

        let tag: u32 = reader.get_n(32)?;
        if tag != MJPEGB_TAG {
            return Err(InvalidDataKind::MjpegbTag(tag).into());
        }

        let field_size = reader.get_n(32)?;
        trace!("field size: {field_size:#X}");

        // padded field size
        reader.skip_n(32)?;

        let mut offset = |name: &str| -> Result<u32> {
            let offs: u32 = reader.get_n(32)?;
            if offs >= size {
                warn!("{name} offset is {offs} and size is {size}");
                return Ok(0);
            }
            trace!("{name} offset: {offs:#X}");
            Ok(offs)
        };

        Ok(Self {
            field_size,
            second_field_offset: offset("second field")?,
            dqt_offset: offset("DQT")?,
            dht_offset: offset("DHT")?,
            sof_offset: offset("SOF")?,
            sos_offset: offset("SOS")?,
            sod_offset: offset("SOD")?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldState {
    Primary,
    Secondary(usize),
    Done,
}

/// Iterator over the field headers of one packet.
///
/// Yields `(segment_offset, header)` where `segment_offset` is the position of
/// the field header within the packet. Iteration stops after the first error.
#[derive(Debug)]
pub struct MjpegbFields<'a> {
    packet: &'a [u8],
    interlaced: bool,
    state: FieldState,
}

impl<'a> MjpegbFields<'a> {
    pub fn new(packet: &'a [u8], interlaced: bool) -> Self {
        Self {
            packet,
            interlaced,
            state: FieldState::Primary,
        }
    }

    fn parse_at(&mut self, segment_offset: usize) -> Result<(usize, MjpegbHeader)> {
        let header = MjpegbHeader::read(&self.packet[segment_offset..]);

        self.state = match &header {
            Ok(hdr) if segment_offset == 0 && self.interlaced && hdr.second_field_offset != 0 => {
                debug!("second field at {:#X}", hdr.second_field_offset);
                FieldState::Secondary(hdr.second_field_offset as usize)
            }
            _ => FieldState::Done,
        };

        header.map(|hdr| (segment_offset, hdr))
    }
}

impl Iterator for MjpegbFields<'_> {
    type Item = Result<(usize, MjpegbHeader)>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.state {
            FieldState::Primary => Some(self.parse_at(0)),
            FieldState::Secondary(offset) => Some(self.parse_at(offset)),
            FieldState::Done => None,
        }
    }
}
