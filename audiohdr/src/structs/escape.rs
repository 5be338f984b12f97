//! Escape-coded fields of the MPEG-4 audio configuration.
//!
//! Both fields are short codes whose top value signals that the real value
//! follows in additional bits.

use log::trace;

use crate::structs::audio_object_type::AudioObjectType;
use crate::structs::sampling::{SAMPLING_INDEX_ESCAPE, sample_rate_for_index};
use crate::utils::bitstream_io::BsIoSliceReader;
use crate::utils::errors::{InvalidDataKind, Result};

/// Reads a 5-bit object type, extended by 6 bits after the escape value.
///
/// The result is in `0..=30` or `32..=95`.
pub fn decode_object_type(reader: &mut BsIoSliceReader) -> Result<AudioObjectType> {
    let mut object_type: u8 = reader.get_n(5)?;
    if object_type == AudioObjectType::ESCAPE.0 {
        object_type = 32 + reader.get_n::<u8>(6)?;
    }

    Ok(AudioObjectType(object_type))
}

/// Reads a 4-bit sampling index and resolves it to `(rate, index)`.
///
/// Index 15 is followed by the rate itself in 24 bits. Indices 13 and 14 have
/// no table entry and are rejected.
pub fn decode_sample_rate(reader: &mut BsIoSliceReader) -> Result<(u32, u8)> {
    let index: u8 = reader.get_n(4)?;
    if index == SAMPLING_INDEX_ESCAPE {
        let rate: u32 = reader.get_n(24)?;
        trace!("explicit sampling frequency {rate}");
        return Ok((rate, index));
    }

    match sample_rate_for_index(index) {
        Some(rate) => Ok((rate, index)),
        None => Err(InvalidDataKind::ReservedSamplingIndex(index).into()),
    }
}
