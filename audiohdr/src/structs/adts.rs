//! ADTS frame header.
//!
//! Fixed 56-bit header in front of every AAC frame of an ADTS stream
//! (CRC excluded).

use crate::structs::audio_object_type::AudioObjectType;
use crate::utils::errors::{HeaderError, Result};

#[cfg(feature = "adts")]
use crate::structs::sampling::sample_rate_for_index;
#[cfg(feature = "adts")]
use crate::utils::bitstream_io::BsIoSliceReader;
#[cfg(feature = "adts")]
use crate::utils::errors::InvalidDataKind;

pub const ADTS_HEADER_SIZE: usize = 7;

pub const ADTS_SYNC_WORD: u16 = 0xFFF;

/// Samples per raw data block.
pub const ADTS_FRAME_SAMPLES: u32 = 1024;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdtsHeader {
    pub id: bool,
    pub layer: u8,
    pub crc_absent: bool,
    /// Profile + 1.
    pub object_type: AudioObjectType,
    pub sampling_index: u8,
    pub sample_rate: u32,
    pub private_bit: bool,
    pub chan_config: u8,
    pub original_copy: bool,
    pub home: bool,
    pub copyright_id_bit: bool,
    pub copyright_id_start: bool,
    /// Whole frame in bytes, header included.
    pub frame_length: u16,
    pub buffer_fullness: u16,
    pub num_aac_frames: u8,
    pub samples: u32,
    pub bit_rate: u32,
}

#[cfg(feature = "adts")]
impl AdtsHeader {
    pub fn read(reader: &mut BsIoSliceReader) -> Result<Self> {
        let sync_word: u16 = reader.get_n(12)?;
        if sync_word != ADTS_SYNC_WORD {
            return Err(InvalidDataKind::AdtsSync(sync_word).into());
        }

        let mut hdr = Self {
            id: reader.get()?,
            layer: reader.get_n(2)?,
            crc_absent: reader.get()?,
            object_type: AudioObjectType(reader.get_n::<u8>(2)? + 1),
            sampling_index: reader.get_n(4)?,
            ..Default::default()
        };

        hdr.sample_rate = sample_rate_for_index(hdr.sampling_index)
            .ok_or(InvalidDataKind::ReservedSamplingIndex(hdr.sampling_index))?;

        hdr.private_bit = reader.get()?;
        hdr.chan_config = reader.get_n(3)?;
        hdr.original_copy = reader.get()?;
        hdr.home = reader.get()?;

        hdr.copyright_id_bit = reader.get()?;
        hdr.copyright_id_start = reader.get()?;
        hdr.frame_length = reader.get_n(13)?;
        if (hdr.frame_length as usize) < ADTS_HEADER_SIZE {
            return Err(InvalidDataKind::FrameSize(hdr.frame_length as u32).into());
        }

        hdr.buffer_fullness = reader.get_n(11)?;
        hdr.num_aac_frames = reader.get_n::<u8>(2)? + 1;

        hdr.samples = hdr.num_aac_frames as u32 * ADTS_FRAME_SAMPLES;
        hdr.bit_rate =
            (hdr.frame_length as u64 * 8 * hdr.sample_rate as u64 / hdr.samples as u64) as u32;

        Ok(hdr)
    }

    pub fn parse(buf: &[u8]) -> Result<Self> {
        if buf.len() < ADTS_HEADER_SIZE {
            return Err(HeaderError::BufferTooSmall {
                needed: (ADTS_HEADER_SIZE as u64) << 3,
                available: (buf.len() as u64) << 3,
            });
        }

        Self::read(&mut BsIoSliceReader::from_slice(&buf[..ADTS_HEADER_SIZE]))
    }
}

/// Returns `(samples, frames)` for the ADTS header at the start of `buf`.
#[cfg(feature = "adts")]
pub fn adts_header_parse(buf: &[u8]) -> Result<(u32, u8)> {
    let hdr = AdtsHeader::parse(buf)?;
    Ok((hdr.samples, hdr.num_aac_frames))
}

#[cfg(not(feature = "adts"))]
pub fn adts_header_parse(_buf: &[u8]) -> Result<(u32, u8)> {
    Err(HeaderError::Unsupported("ADTS header parser not built"))
}
