//! Sampling frequency and channel configuration tables.
//!
//! Both tables are part of the public contract: callers may index them
//! directly. The lookups below are the bounded way to do so.

/// Sampling frequencies addressed by a 4-bit sampling index.
///
/// Indices 13 and 14 are reserved and 15 escapes to an explicit 24-bit rate,
/// so only 13 entries exist.
pub const SAMPLE_RATES: [u32; 13] = [
    96000, 88200, 64000, 48000, 44100, 32000, 24000, 22050, 16000, 12000, 11025, 8000, 7350,
];

/// Output channel count addressed by channel configuration.
pub const CHANNELS: [u8; 8] = [0, 1, 2, 3, 4, 5, 6, 8];

/// Sampling index that is followed by an explicit 24-bit frequency.
pub const SAMPLING_INDEX_ESCAPE: u8 = 0x0F;

pub fn sample_rate_for_index(index: u8) -> Option<u32> {
    SAMPLE_RATES.get(index as usize).copied()
}

pub fn channels_for_config(config: u8) -> Option<u8> {
    CHANNELS.get(config as usize).copied()
}

#[test]
fn bounded_lookups() {
    assert_eq!(sample_rate_for_index(3), Some(48000));
    assert_eq!(sample_rate_for_index(12), Some(7350));
    assert_eq!(sample_rate_for_index(13), None);
    assert_eq!(sample_rate_for_index(14), None);
    assert_eq!(sample_rate_for_index(SAMPLING_INDEX_ESCAPE), None);

    assert_eq!(channels_for_config(7), Some(8));
    assert_eq!(channels_for_config(8), None);
}
