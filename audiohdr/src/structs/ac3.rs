//! AC-3 and E-AC-3 sync frame header.

use crate::utils::errors::{HeaderError, Result};

#[cfg(feature = "ac3")]
use log::trace;

#[cfg(feature = "ac3")]
use crate::utils::bitstream_io::BsIoSliceReader;
#[cfg(feature = "ac3")]
use crate::utils::errors::InvalidDataKind;

pub const AC3_SYNC_WORD: u16 = 0x0B77;

pub const AC3_HEADER_SIZE: usize = 7;

/// Highest bitstream id still decodable as AC-3 or E-AC-3.
pub const AC3_MAX_BSID: u8 = 16;

const SAMPLE_RATES: [u32; 3] = [48000, 44100, 32000];

/// Nominal bit rate in kbit/s, indexed by `frmsizecod / 2`.
const BIT_RATES: [u32; 19] = [
    32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 384, 448, 512, 576, 640,
];

/// Frame size in 16-bit words per `[frmsizecod][fscod]`.
const FRAME_WORDS: [[u16; 3]; 38] = [
    [64, 69, 96],
    [64, 70, 96],
    [80, 87, 120],
    [80, 88, 120],
    [96, 104, 144],
    [96, 105, 144],
    [112, 121, 168],
    [112, 122, 168],
    [128, 139, 192],
    [128, 140, 192],
    [160, 174, 240],
    [160, 175, 240],
    [192, 208, 288],
    [192, 209, 288],
    [224, 243, 336],
    [224, 244, 336],
    [256, 278, 384],
    [256, 279, 384],
    [320, 348, 480],
    [320, 349, 480],
    [384, 417, 576],
    [384, 418, 576],
    [448, 487, 672],
    [448, 488, 672],
    [512, 557, 768],
    [512, 558, 768],
    [640, 696, 960],
    [640, 697, 960],
    [768, 835, 1152],
    [768, 836, 1152],
    [896, 975, 1344],
    [896, 976, 1344],
    [1024, 1114, 1536],
    [1024, 1115, 1536],
    [1152, 1253, 1728],
    [1152, 1254, 1728],
    [1280, 1393, 1920],
    [1280, 1394, 1920],
];

/// Full-bandwidth channels per `acmod`.
const ACMOD_CHANNELS: [u8; 8] = [2, 1, 2, 3, 3, 4, 4, 5];

const EAC3_BLOCKS: [u8; 4] = [1, 2, 3, 6];

const CENTER_LEVELS: [u8; 4] = [4, 5, 6, 5];
const SURROUND_LEVELS: [u8; 4] = [4, 6, 7, 6];

const ACMOD_MONO: u8 = 1;
const ACMOD_STEREO: u8 = 2;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FrameType {
    Independent,
    Dependent,
    /// Plain AC-3, or E-AC-3 converted from it.
    #[default]
    Ac3Convert,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ac3HeaderInfo {
    pub crc1: u16,
    pub sr_code: u8,
    pub bitstream_id: u8,
    pub bitstream_mode: u8,
    pub channel_mode: u8,
    pub lfe_on: bool,
    pub frame_type: FrameType,
    pub substream_id: u8,
    pub center_mix_level: u8,
    pub surround_mix_level: u8,
    pub dolby_surround_mode: u8,
    pub num_blocks: u8,
    pub sr_shift: u8,
    pub sample_rate: u32,
    pub bit_rate: u32,
    pub channels: u8,
    /// In bytes.
    pub frame_size: u32,
}

impl Ac3HeaderInfo {
    pub fn is_eac3(&self) -> bool {
        self.bitstream_id > 10
    }

    /// PCM samples per channel carried by one frame.
    pub fn samples(&self) -> u32 {
        self.num_blocks as u32 * 256
    }
}

#[cfg(feature = "ac3")]
impl Ac3HeaderInfo {
    pub fn read(reader: &mut BsIoSliceReader) -> Result<Self> {
        let sync_word: u16 = reader.get_n(16)?;
        if sync_word != AC3_SYNC_WORD {
            return Err(InvalidDataKind::Ac3Sync(sync_word).into());
        }

        // bsid sits at the same position in both syntaxes
        let bitstream_id = (reader.peek_n::<u32>(29)? & 0x1F) as u8;
        if bitstream_id > AC3_MAX_BSID {
            return Err(InvalidDataKind::Ac3BitstreamId(bitstream_id).into());
        }

        let mut hdr = Self {
            bitstream_id,
            num_blocks: 6,
            center_mix_level: 5,
            surround_mix_level: 6,
            ..Default::default()
        };

        if bitstream_id <= 10 {
            hdr.read_ac3(reader)?;
        } else {
            hdr.read_eac3(reader)?;
        }

        hdr.channels = ACMOD_CHANNELS[hdr.channel_mode as usize] + hdr.lfe_on as u8;

        trace!(
            "AC-3 bsid {} acmod {} lfe {} {} Hz {} bps, {} bytes",
            hdr.bitstream_id,
            hdr.channel_mode,
            hdr.lfe_on,
            hdr.sample_rate,
            hdr.bit_rate,
            hdr.frame_size
        );

        Ok(hdr)
    }

    fn read_ac3(&mut self, reader: &mut BsIoSliceReader) -> Result<()> {
        self.crc1 = reader.get_n(16)?;

        self.sr_code = reader.get_n(2)?;
        if self.sr_code == 3 {
            return Err(InvalidDataKind::ReservedSampleRateCode(self.sr_code).into());
        }

        let frame_size_code: u8 = reader.get_n(6)?;
        if frame_size_code > 37 {
            return Err(InvalidDataKind::FrameSize(frame_size_code as u32).into());
        }

        // bsid, already peeked
        reader.skip_n(5)?;

        self.bitstream_mode = reader.get_n(3)?;
        self.channel_mode = reader.get_n(3)?;

        if self.channel_mode == ACMOD_STEREO {
            self.dolby_surround_mode = reader.get_n(2)?;
        } else {
            if self.channel_mode & 1 != 0 && self.channel_mode != ACMOD_MONO {
                self.center_mix_level = CENTER_LEVELS[reader.get_n::<u8>(2)? as usize];
            }
            if self.channel_mode & 4 != 0 {
                self.surround_mix_level = SURROUND_LEVELS[reader.get_n::<u8>(2)? as usize];
            }
        }

        self.lfe_on = reader.get()?;

        self.sr_shift = self.bitstream_id.max(8) - 8;
        self.sample_rate = SAMPLE_RATES[self.sr_code as usize] >> self.sr_shift;
        self.bit_rate = (BIT_RATES[frame_size_code as usize >> 1] * 1000) >> self.sr_shift;
        self.frame_size =
            FRAME_WORDS[frame_size_code as usize][self.sr_code as usize] as u32 * 2;
        self.frame_type = FrameType::Ac3Convert;

        Ok(())
    }

    fn read_eac3(&mut self, reader: &mut BsIoSliceReader) -> Result<()> {
        self.frame_type = match reader.get_n::<u8>(2)? {
            0 => FrameType::Independent,
            1 => FrameType::Dependent,
            2 => FrameType::Ac3Convert,
            _ => return Err(InvalidDataKind::ReservedFrameType.into()),
        };

        self.substream_id = reader.get_n(3)?;

        self.frame_size = (reader.get_n::<u32>(11)? + 1) << 1;
        if (self.frame_size as usize) < AC3_HEADER_SIZE {
            return Err(InvalidDataKind::FrameSize(self.frame_size).into());
        }

        self.sr_code = reader.get_n(2)?;
        if self.sr_code == 3 {
            let sr_code2: u8 = reader.get_n(2)?;
            if sr_code2 == 3 {
                return Err(InvalidDataKind::ReservedSampleRateCode(sr_code2).into());
            }
            self.sample_rate = SAMPLE_RATES[sr_code2 as usize] / 2;
            self.sr_shift = 1;
        } else {
            self.num_blocks = EAC3_BLOCKS[reader.get_n::<u8>(2)? as usize];
            self.sample_rate = SAMPLE_RATES[self.sr_code as usize];
            self.sr_shift = 0;
        }

        self.channel_mode = reader.get_n(3)?;
        self.lfe_on = reader.get()?;

        self.bit_rate = (8 * self.frame_size as u64 * self.sample_rate as u64
            / (self.num_blocks as u64 * 256)) as u32;

        Ok(())
    }
}

/// Parses the sync frame header at the start of `buf`, returning the header
/// and the number of bits consumed.
#[cfg(feature = "ac3")]
pub fn parse_ac3_header(buf: &[u8]) -> Result<(Ac3HeaderInfo, u64)> {
    if buf.len() < AC3_HEADER_SIZE {
        return Err(HeaderError::BufferTooSmall {
            needed: (AC3_HEADER_SIZE as u64) << 3,
            available: (buf.len() as u64) << 3,
        });
    }

    let mut reader = BsIoSliceReader::from_slice(buf);
    let hdr = Ac3HeaderInfo::read(&mut reader)?;
    Ok((hdr, reader.position()?))
}

#[cfg(not(feature = "ac3"))]
pub fn parse_ac3_header(_buf: &[u8]) -> Result<(Ac3HeaderInfo, u64)> {
    Err(HeaderError::Unsupported("AC-3 header parser not built"))
}
