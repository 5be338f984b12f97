//! MPEG-4 AudioSpecificConfig.
//!
//! ## Layout
//!
//! ```text
//! object_type        5 (+6 when 31)
//! sampling_index     4 (+24 when 15)
//! channel_config     4
//! [SBR/PS extension: ext sampling index, replacement object type,
//!  ext channel config for ER BSAC]
//! [ALS: 5 fill bits, optional 24-bit gap, ALS specific config]
//! ...object type specific payload...
//! [sync extension 0x2B7: ext object type, sbr flag, ext rate, 0x548, ps flag]
//! ```
//!
//! The parser stops at the object type specific payload and reports its bit
//! offset. The trailing sync extension, when the caller allows it, is found by
//! scanning the remaining bits; the reported offset does not move.

use std::fmt::Display;

use log::{debug, trace};

use crate::structs::als::{ALS_TAG, AlsFields};
use crate::structs::audio_object_type::AudioObjectType;
use crate::structs::escape::{decode_object_type, decode_sample_rate};
use crate::structs::sampling::channels_for_config;
use crate::utils::bitstream_io::BsIoSliceReader;
use crate::utils::errors::{HeaderError, InvalidDataKind, Result};

/// Sync word introducing the backward compatible extension block.
pub const SYNC_EXTENSION_TYPE: u16 = 0x2B7;

/// Sync word announcing the PS flag inside the extension block.
pub const SYNC_EXTENSION_PS: u16 = 0x548;

/// Object type, sampling index and channel configuration.
const MIN_CONFIG_BITS: u32 = 5 + 4 + 4;

/// Whether an extension tool is known to be used.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Presence {
    #[default]
    Unknown,
    Absent,
    Present,
}

impl From<bool> for Presence {
    fn from(value: bool) -> Self {
        if value {
            Presence::Present
        } else {
            Presence::Absent
        }
    }
}

impl Display for Presence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Presence::Unknown => write!(f, "unknown"),
            Presence::Absent => write!(f, "absent"),
            Presence::Present => write!(f, "present"),
        }
    }
}

/// Decoder configuration carried by an AudioSpecificConfig.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AudioConfig {
    /// Core object type. With explicit SBR/PS signalling this is the type
    /// that follows the extension, not the SBR/PS type itself.
    pub object_type: AudioObjectType,
    pub sampling_index: u8,
    pub sample_rate: u32,
    pub chan_config: u8,
    /// `None` when `chan_config` is beyond the channel table.
    pub channels: Option<u32>,
    pub sbr: Presence,
    pub ps: Presence,
    /// [`AudioObjectType::NULL`] unless an extension was signalled.
    pub ext_object_type: AudioObjectType,
    pub ext_sampling_index: Option<u8>,
    /// 0 unless an extension with its own rate was signalled.
    pub ext_sample_rate: u32,
    pub ext_chan_config: Option<u8>,
}

impl AudioConfig {
    /// Parses the first `bit_len` bits of `buf`.
    ///
    /// Returns the configuration and the bit offset at which the object type
    /// specific payload starts.
    pub fn parse(buf: &[u8], bit_len: u64, allow_sync_extension: bool) -> Result<(Self, u64)> {
        let reader = &mut BsIoSliceReader::with_bit_len(buf, bit_len)?;
        Self::read(reader, allow_sync_extension)
    }

    pub fn read(reader: &mut BsIoSliceReader, allow_sync_extension: bool) -> Result<(Self, u64)> {
        let position = reader.position()?;
        let available = reader.available()?;
        if available < MIN_CONFIG_BITS as u64 {
            return Err(InvalidDataKind::UnexpectedEnd {
                position,
                requested: MIN_CONFIG_BITS,
                available,
            }
            .into());
        }

        let mut ac = Self {
            object_type: decode_object_type(reader)?,
            ..Default::default()
        };

        (ac.sample_rate, ac.sampling_index) = decode_sample_rate(reader)?;
        ac.chan_config = reader.get_n(4)?;
        ac.channels = channels_for_config(ac.chan_config).map(u32::from);

        trace!(
            "object_type = {}, sample_rate = {}, chan_config = {}",
            ac.object_type, ac.sample_rate, ac.chan_config
        );

        if ac.object_type == AudioObjectType::SBR
            || (ac.object_type == AudioObjectType::PS && !Self::is_mp3_on_mp4(reader)?)
        {
            ac.read_explicit_extension(reader)?;
        } else {
            ac.ext_object_type = AudioObjectType::NULL;
            ac.ext_sample_rate = 0;
        }

        let mut payload_offset = reader.position()?;

        if ac.object_type == AudioObjectType::ALS {
            payload_offset = ac.read_als(reader)?;
        }

        if ac.ext_object_type != AudioObjectType::SBR && allow_sync_extension {
            ac.scan_sync_extension(reader)?;
        }

        ac.resolve_ps();

        Ok((ac, payload_offset))
    }

    /// Rejects PS signalling written by encoders of the W6132 Annex YYYY
    /// MP3onMP4 draft.
    fn is_mp3_on_mp4(reader: &mut BsIoSliceReader) -> Result<bool> {
        let head3 = reader.peek_n_padded(3)?;
        let head9 = reader.peek_n_padded(9)?;

        let matched = head3 & 0x03 != 0 && head9 & 0x3F == 0;
        if matched {
            debug!("PS object type followed by MP3onMP4 pattern, no extension");
        }

        Ok(matched)
    }

    fn read_explicit_extension(&mut self, reader: &mut BsIoSliceReader) -> Result<()> {
        if self.object_type == AudioObjectType::PS {
            self.ps = Presence::Present;
        }

        self.ext_object_type = AudioObjectType::SBR;
        self.sbr = Presence::Present;

        let (rate, index) = decode_sample_rate(reader)?;
        self.ext_sample_rate = rate;
        self.ext_sampling_index = Some(index);

        self.object_type = decode_object_type(reader)?;
        if self.object_type == AudioObjectType::ER_BSAC {
            self.ext_chan_config = Some(reader.get_n(4)?);
        }

        debug!(
            "explicit {} extension, core object type {}",
            if self.ps == Presence::Present { "PS" } else { "SBR" },
            self.object_type
        );

        Ok(())
    }

    /// Applies the ALS header and returns the payload offset it implies.
    fn read_als(&mut self, reader: &mut BsIoSliceReader) -> Result<u64> {
        // fill bits
        reader.skip_n(5)?;

        // some writers leave 24 bits between the fill bits and the tag
        if reader.available()? >= 24 && reader.peek_n::<u32>(24)? != ALS_TAG >> 8 {
            debug!("ALS tag not at fill bits, skipping 24 bits");
            reader.skip_n(24)?;
        }

        let payload_offset = reader.position()?;

        let als = AlsFields::read(reader)?;
        self.sample_rate = als.sample_rate;
        self.chan_config = 0;
        self.channels = Some(als.channels);

        Ok(payload_offset)
    }

    /// Looks for the first sync extension marker in the remaining bits.
    ///
    /// A block cut off by the end of the buffer is dropped and the fields
    /// parsed so far are kept.
    fn scan_sync_extension(&mut self, reader: &mut BsIoSliceReader) -> Result<()> {
        while reader.available()? > 15 {
            if reader.peek_n::<u16>(11)? != SYNC_EXTENSION_TYPE {
                reader.skip_n(1)?;
                continue;
            }

            let mark = reader.mark()?;
            debug!("sync extension at bit {}", mark.position());
            reader.skip_n(11)?;

            let mut ext = self.clone();
            match ext.read_sync_extension(reader) {
                Ok(()) => {
                    *self = ext;
                    return Ok(());
                }
                Err(HeaderError::InvalidData(InvalidDataKind::UnexpectedEnd { .. })) => {
                    debug!("sync extension at bit {} is truncated", mark.position());
                    reader.reset_to(mark)?;
                    break;
                }
                Err(e) => return Err(e),
            }
        }

        // nothing usable signalled where the caller asked us to look
        if self.sbr == Presence::Unknown {
            self.sbr = Presence::Absent;
        }

        Ok(())
    }

    fn read_sync_extension(&mut self, reader: &mut BsIoSliceReader) -> Result<()> {
        self.ext_object_type = decode_object_type(reader)?;
        if self.ext_object_type == AudioObjectType::SBR {
            self.sbr = reader.get()?.into();
            if self.sbr == Presence::Present {
                let (rate, index) = decode_sample_rate(reader)?;
                self.ext_sample_rate = rate;
                self.ext_sampling_index = Some(index);
            }
        }

        if reader.available()? > 11 && reader.get_n::<u16>(11)? == SYNC_EXTENSION_PS {
            self.ps = reader.get()?.into();
        }

        Ok(())
    }

    fn resolve_ps(&mut self) {
        // PS requires SBR
        if self.sbr != Presence::Present {
            self.ps = Presence::Absent;
        }

        // implicit PS only for mono AAC LC
        let multichannel = self.channels.is_some_and(|c| c & !1 != 0);
        if (self.ps == Presence::Unknown && self.object_type != AudioObjectType::AAC_LC)
            || multichannel
        {
            self.ps = Presence::Absent;
        }
    }
}

/// Convenience wrapper over [`AudioConfig::parse`].
pub fn parse_audio_specific_config(
    buf: &[u8],
    bit_len: u64,
    allow_sync_extension: bool,
) -> Result<(AudioConfig, u64)> {
    AudioConfig::parse(buf, bit_len, allow_sync_extension)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::utils::bitstream_io::BsIoVecWriter;

    /// Writes `(width, value)` fields and returns the bytes and bit length.
    fn bits(fields: &[(u32, u32)]) -> (Vec<u8>, u64) {
        let mut writer = BsIoVecWriter::default();
        for &(n, value) in fields {
            writer.put_n(n, value).unwrap();
        }
        let len = writer.bits_written();
        (writer.into_bytes().unwrap(), len)
    }

    #[test]
    fn aac_lc_mono_without_extension() -> anyhow::Result<()> {
        // 00010 0011 0001 + 3 bits of padding
        let buf = [0x11, 0x88];

        let (ac, offset) = AudioConfig::parse(&buf, 16, true)?;
        assert_eq!(ac.object_type, AudioObjectType::AAC_LC);
        assert_eq!(ac.sampling_index, 3);
        assert_eq!(ac.sample_rate, 48000);
        assert_eq!(ac.channels, Some(1));
        assert_eq!(ac.sbr, Presence::Absent);
        assert_eq!(ac.ps, Presence::Absent);
        assert_eq!(ac.ext_object_type, AudioObjectType::NULL);
        assert_eq!(ac.ext_sample_rate, 0);
        assert_eq!(offset, 13);
        Ok(())
    }

    #[test]
    fn implicit_signalling_stays_unknown_without_scan() -> anyhow::Result<()> {
        let buf = [0x11, 0x88];

        let (ac, _) = AudioConfig::parse(&buf, 16, false)?;
        assert_eq!(ac.sbr, Presence::Unknown);
        assert_eq!(ac.ps, Presence::Absent);
        Ok(())
    }

    #[test]
    fn explicit_sbr_with_er_bsac() -> anyhow::Result<()> {
        let (buf, len) = bits(&[(5, 5), (4, 4), (4, 2), (4, 3), (5, 22), (4, 2)]);

        let (ac, offset) = AudioConfig::parse(&buf, len, true)?;
        assert_eq!(ac.object_type, AudioObjectType::ER_BSAC);
        assert_eq!(ac.sample_rate, 44100);
        assert_eq!(ac.ext_object_type, AudioObjectType::SBR);
        assert_eq!(ac.sbr, Presence::Present);
        assert_eq!(ac.ext_sample_rate, 48000);
        assert_eq!(ac.ext_sampling_index, Some(3));
        assert_eq!(ac.ext_chan_config, Some(2));
        assert_eq!(offset, 26);
        Ok(())
    }

    #[test]
    fn explicit_ps_on_mono() -> anyhow::Result<()> {
        let (buf, len) = bits(&[(5, 29), (4, 6), (4, 1), (4, 4), (5, 2), (3, 0)]);

        let (ac, offset) = AudioConfig::parse(&buf, len, false)?;
        assert_eq!(ac.object_type, AudioObjectType::AAC_LC);
        assert_eq!(ac.sbr, Presence::Present);
        assert_eq!(ac.ps, Presence::Present);
        assert_eq!(ac.sample_rate, 24000);
        assert_eq!(ac.ext_sample_rate, 44100);
        assert_eq!(offset, 22);
        Ok(())
    }

    #[test]
    fn explicit_ps_dropped_for_stereo() -> anyhow::Result<()> {
        let (buf, len) = bits(&[(5, 29), (4, 6), (4, 2), (4, 4), (5, 2), (3, 0)]);

        let (ac, _) = AudioConfig::parse(&buf, len, false)?;
        assert_eq!(ac.sbr, Presence::Present);
        assert_eq!(ac.ps, Presence::Absent);
        Ok(())
    }

    #[test]
    fn mp3_on_mp4_is_not_an_extension() -> anyhow::Result<()> {
        let (buf, len) = bits(&[(5, 29), (4, 3), (4, 2), (3, 0b011), (6, 0), (2, 0)]);

        let (ac, offset) = AudioConfig::parse(&buf, len, false)?;
        assert_eq!(ac.object_type, AudioObjectType::PS);
        assert_eq!(ac.ext_object_type, AudioObjectType::NULL);
        assert_eq!(ac.sbr, Presence::Unknown);
        assert_eq!(ac.ps, Presence::Absent);
        assert_eq!(offset, 13);
        Ok(())
    }

    #[test]
    fn sync_extension_signals_sbr_and_ps() -> anyhow::Result<()> {
        let (buf, len) = bits(&[
            (5, 2),
            (4, 7),
            (4, 1),
            (3, 0),
            (11, SYNC_EXTENSION_TYPE as u32),
            (5, 5),
            (1, 1),
            (4, 4),
            (11, SYNC_EXTENSION_PS as u32),
            (1, 1),
            (7, 0),
        ]);

        let (ac, offset) = AudioConfig::parse(&buf, len, true)?;
        assert_eq!(ac.object_type, AudioObjectType::AAC_LC);
        assert_eq!(ac.sample_rate, 22050);
        assert_eq!(ac.ext_object_type, AudioObjectType::SBR);
        assert_eq!(ac.sbr, Presence::Present);
        assert_eq!(ac.ext_sample_rate, 44100);
        assert_eq!(ac.ps, Presence::Present);
        // the scan does not move the payload offset
        assert_eq!(offset, 13);

        let (ac, _) = AudioConfig::parse(&buf, len, false)?;
        assert_eq!(ac.ext_object_type, AudioObjectType::NULL);
        assert_eq!(ac.sbr, Presence::Unknown);
        Ok(())
    }

    #[test]
    fn sync_extension_sbr_flag_clear() -> anyhow::Result<()> {
        let (buf, len) = bits(&[
            (5, 2),
            (4, 4),
            (4, 2),
            (3, 0),
            (11, SYNC_EXTENSION_TYPE as u32),
            (5, 5),
            (1, 0),
            (16, 0),
        ]);

        let (ac, _) = AudioConfig::parse(&buf, len, true)?;
        assert_eq!(ac.ext_object_type, AudioObjectType::SBR);
        assert_eq!(ac.sbr, Presence::Absent);
        assert_eq!(ac.ext_sample_rate, 0);
        assert_eq!(ac.ps, Presence::Absent);
        Ok(())
    }

    #[test]
    fn truncated_sync_extension_keeps_base_config() -> anyhow::Result<()> {
        // escape object type with no room for its 6 extra bits
        let (buf, len) = bits(&[(5, 2), (4, 3), (4, 1), (11, SYNC_EXTENSION_TYPE as u32), (5, 31)]);
        assert_eq!(len, 29);

        let (ac, offset) = AudioConfig::parse(&buf, len, true)?;
        assert_eq!(ac.object_type, AudioObjectType::AAC_LC);
        assert_eq!(ac.sample_rate, 48000);
        assert_eq!(ac.channels, Some(1));
        assert_eq!(ac.ext_object_type, AudioObjectType::NULL);
        assert_eq!(ac.sbr, Presence::Absent);
        assert_eq!(ac.ps, Presence::Absent);
        assert_eq!(offset, 13);

        assert_eq!(AudioConfig::parse(&buf, len, false)?.0.sample_rate, 48000);

        // SBR flag set but the extension sampling index is cut off
        let (buf, len) = bits(&[
            (5, 2),
            (4, 3),
            (4, 1),
            (11, SYNC_EXTENSION_TYPE as u32),
            (5, 5),
            (1, 1),
            (2, 0),
        ]);

        let (ac, _) = AudioConfig::parse(&buf, len, true)?;
        assert_eq!(ac.ext_object_type, AudioObjectType::NULL);
        assert_eq!(ac.ext_sample_rate, 0);
        assert_eq!(ac.sbr, Presence::Absent);
        Ok(())
    }

    fn als_config(gap: bool, extra_bits: u32) -> (Vec<u8>, u64) {
        let mut fields = vec![(5, 31), (6, 4), (4, 3), (4, 2), (5, 0)];
        if gap {
            fields.push((24, 0x00_1234));
        }
        fields.extend([
            (32, ALS_TAG),
            (32, 96000),
            (32, 48000 * 60),
            (16, 7),
        ]);
        if extra_bits > 0 {
            fields.push((extra_bits, 0));
        }
        bits(&fields)
    }

    #[test]
    fn als_overrides_rate_and_channels() -> anyhow::Result<()> {
        let (buf, len) = als_config(false, 0);
        assert_eq!(len, 24 + 112);

        let (ac, offset) = AudioConfig::parse(&buf, len, false)?;
        assert_eq!(ac.object_type, AudioObjectType::ALS);
        assert_eq!(ac.sample_rate, 96000);
        assert_eq!(ac.chan_config, 0);
        assert_eq!(ac.channels, Some(8));
        assert_eq!(offset, 24);
        Ok(())
    }

    #[test]
    fn als_tag_after_gap() -> anyhow::Result<()> {
        let (buf, len) = als_config(true, 0);

        let (ac, offset) = AudioConfig::parse(&buf, len, false)?;
        assert_eq!(ac.sample_rate, 96000);
        assert_eq!(offset, 48);
        Ok(())
    }

    #[test]
    fn als_one_bit_short() {
        let (buf, len) = als_config(false, 0);

        assert_eq!(
            AudioConfig::parse(&buf, len - 1, false).unwrap_err(),
            HeaderError::BufferTooSmall {
                needed: 112,
                available: 111
            }
        );
    }

    #[test]
    fn too_short_for_fixed_fields() {
        let buf = [0x11, 0x88];
        let err = AudioConfig::parse(&buf, 12, true).unwrap_err();
        assert!(matches!(
            err,
            HeaderError::InvalidData(InvalidDataKind::UnexpectedEnd { requested: 13, .. })
        ));
    }

    #[test]
    fn reserved_sampling_index() {
        let (buf, len) = bits(&[(5, 2), (4, 13), (4, 2)]);
        assert_eq!(
            AudioConfig::parse(&buf, len, false).unwrap_err(),
            HeaderError::InvalidData(InvalidDataKind::ReservedSamplingIndex(13))
        );
    }

    #[test]
    fn channel_config_beyond_table() -> anyhow::Result<()> {
        let (buf, len) = bits(&[(5, 2), (4, 3), (4, 9)]);

        let (ac, _) = AudioConfig::parse(&buf, len, false)?;
        assert_eq!(ac.chan_config, 9);
        assert_eq!(ac.channels, None);
        Ok(())
    }

    proptest! {
        #[test]
        fn ps_requires_sbr(buf in proptest::collection::vec(any::<u8>(), 2..24), scan: bool) {
            let len = (buf.len() as u64) << 3;
            if let Ok((ac, offset)) = AudioConfig::parse(&buf, len, scan) {
                if ac.ps == Presence::Present {
                    prop_assert_eq!(ac.sbr, Presence::Present);
                }
                if ac.channels.is_some_and(|c| c & !1 != 0) {
                    prop_assert_eq!(ac.ps, Presence::Absent);
                }
                prop_assert!(offset <= len);

                let again = AudioConfig::parse(&buf, len, scan).unwrap();
                prop_assert_eq!(again, (ac, offset));
            }
        }
    }
}
