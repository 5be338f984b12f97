//! ALS specific configuration override.
//!
//! Old ALS conformance files carry wrong rate and channel values in the
//! generic configuration; the ALS header is authoritative and replaces them.

use log::trace;

use crate::utils::bitstream_io::BsIoSliceReader;
use crate::utils::errors::{HeaderError, InvalidDataKind, Result};

/// `'A' 'L' 'S' '\0'` read as a big-endian word.
pub const ALS_TAG: u32 = u32::from_be_bytes(*b"ALS\0");

/// Tag, rate, sample count and channel count.
pub const ALS_HEADER_BITS: u64 = 112;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlsFields {
    pub sample_rate: u32,
    /// Explicit channel count, not derived from a channel configuration.
    pub channels: u32,
}

impl AlsFields {
    pub fn read(reader: &mut BsIoSliceReader) -> Result<Self> {
        let available = reader.available()?;
        if available < ALS_HEADER_BITS {
            return Err(HeaderError::BufferTooSmall {
                needed: ALS_HEADER_BITS,
                available,
            });
        }

        let tag: u32 = reader.get_n(32)?;
        if tag != ALS_TAG {
            return Err(InvalidDataKind::AlsTag(tag).into());
        }

        let sample_rate = reader.get_n(32)?;

        // number of samples
        reader.skip_n(32)?;

        // stored as channels - 1
        let channels = reader.get_n::<u32>(16)? + 1;

        trace!("ALS override: {sample_rate} Hz, {channels} channels");

        Ok(Self {
            sample_rate,
            channels,
        })
    }
}
