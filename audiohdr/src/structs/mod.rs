//! Header structures of MPEG-4 audio and the sibling formats.
//!
//! Each module owns one syntax element and parses it from a
//! [`BsIoSliceReader`](crate::utils::bitstream_io::BsIoSliceReader) or a byte
//! slice. Parsed values are plain data; nothing is shared between calls.

pub mod ac3;
pub mod adts;
pub mod als;
pub mod audio_object_type;
pub mod audio_specific_config;
pub mod escape;
pub mod mjpegb;
pub mod pce;
pub mod sampling;
