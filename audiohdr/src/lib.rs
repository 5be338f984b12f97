//! Bit-exact parsers for self-describing audio stream headers.
//!
//! ## Technical Overview
//!
//! ### MPEG-4 AudioSpecificConfig
//!
//! The configuration blob carried by containers (MP4 `esds`, Matroska
//! `CodecPrivate`) in front of AAC, HE-AAC, ALS and related payloads.
//! [`AudioConfig::parse`](structs::audio_specific_config::AudioConfig::parse)
//! decodes the object type, sampling rate and channel configuration, detects
//! SBR and PS signalling (explicit, backward-compatible sync extension, or
//! undecided), applies the ALS override and returns the bit offset where the
//! codec specific configuration begins.
//!
//! SBR and PS presence is tri-state: a stream without explicit signalling may
//! still carry SBR, so `Unknown` is distinct from `Absent`.
//!
//! ### Sibling headers
//!
//! - ADTS fixed header ([`structs::adts`])
//! - AC-3 / E-AC-3 sync frame header ([`structs::ac3`])
//! - MJPEG-B field header ([`structs::mjpegb`])
//! - Program config element copy and decode ([`structs::pce`])
//!
//! ## Quick Start
//!
//! ```rust
//! use audiohdr::structs::audio_specific_config::{AudioConfig, Presence};
//!
//! // AAC LC, 44.1 kHz, stereo
//! let (config, offset) = AudioConfig::parse(&[0x12, 0x10], 16, true)?;
//!
//! assert_eq!(config.sample_rate, 44100);
//! assert_eq!(config.chan_config, 2);
//! assert_eq!(config.sbr, Presence::Absent);
//! assert_eq!(offset, 13);
//! # Ok::<(), audiohdr::utils::errors::HeaderError>(())
//! ```
//!
//! Errors carry a negative status code through
//! [`HeaderError::code`](utils::errors::HeaderError::code) for callers that
//! work with integers.

/// Stream level processing.
///
/// - **Frame Scanning** ([`process::scan`]): ADTS and AC-3 frame splitting
pub mod process;

/// Header data structures and their parsers.
///
/// - **Audio Configuration** ([`structs::audio_specific_config`]): MPEG-4 AudioSpecificConfig
/// - **Escape Codes** ([`structs::escape`]): Object type and sampling rate fields
/// - **Tables** ([`structs::sampling`]): Sampling rates and channel counts
/// - **ALS** ([`structs::als`]): ALS configuration override
/// - **PCE** ([`structs::pce`]): Program config element
/// - **Siblings** ([`structs::adts`], [`structs::ac3`], [`structs::mjpegb`])
pub mod structs;

/// Utility functions and supporting infrastructure.
///
/// - **Bitstream I/O** ([`utils::bitstream_io`]): Bit-level reading/writing
/// - **Error Handling** ([`utils::errors`]): Error types
pub mod utils;
