//! Utility functions and supporting infrastructure.
//!
//! Provides bounded bit-level reading and writing and the error types shared
//! by every header parser.

pub mod bitstream_io;
pub mod errors;
