use std::io;

/// Returns `$err` when `$level` is at or above the configured fail level,
/// otherwise logs it at `$level` and continues.
#[macro_export]
macro_rules! log_or_err {
    ($state:expr, $level:expr, $err:expr $(,)?) => {{
        if $level <= $state.fail_level {
            return Err($err);
        } else {
            match $level {
                ::log::Level::Error => ::log::error!("{}", $err),
                ::log::Level::Warn => ::log::warn!("{}", $err),
                ::log::Level::Info => ::log::info!("{}", $err),
                ::log::Level::Debug => ::log::debug!("{}", $err),
                ::log::Level::Trace => ::log::trace!("{}", $err),
            }
        }
    }};
}

pub type Result<T, E = HeaderError> = std::result::Result<T, E>;

/// Status codes shared by every header parser.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidData = -1,
    BufferTooSmall = -2,
    Unsupported = -3,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum HeaderError {
    #[error("Invalid data: {0}")]
    InvalidData(#[from] InvalidDataKind),

    #[error("Buffer too small: {needed} bits required, {available} available")]
    BufferTooSmall { needed: u64, available: u64 },

    #[error("Unsupported: {0}")]
    Unsupported(&'static str),
}

impl HeaderError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            HeaderError::InvalidData(_) => ErrorKind::InvalidData,
            HeaderError::BufferTooSmall { .. } => ErrorKind::BufferTooSmall,
            HeaderError::Unsupported(_) => ErrorKind::Unsupported,
        }
    }

    /// Negative status code for callers that speak integers.
    pub fn code(&self) -> i32 {
        self.kind() as i32
    }
}

impl From<io::Error> for HeaderError {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::UnexpectedEof => HeaderError::InvalidData(InvalidDataKind::Truncated),
            _ => HeaderError::InvalidData(InvalidDataKind::Io(e.to_string())),
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidDataKind {
    #[error("read of {requested} bits at {position} exceeds bitstream ({available} bits left)")]
    UnexpectedEnd {
        position: u64,
        requested: u32,
        available: u64,
    },

    #[error("bitstream ended unexpectedly")]
    Truncated,

    #[error("bitstream i/o: {0}")]
    Io(String),

    #[error("sampling index {0} is reserved")]
    ReservedSamplingIndex(u8),

    #[error("ALS tag mismatch. Read {0:#010X}, expected 0x414C5300")]
    AlsTag(u32),

    #[error("Invalid ADTS syncword. Read {0:#05X}")]
    AdtsSync(u16),

    #[error("Invalid AC-3 syncword. Read {0:#06X}")]
    Ac3Sync(u16),

    #[error("bitstream_id must be <= 16. Read {0}")]
    Ac3BitstreamId(u8),

    #[error("Reserved sample rate code {0}")]
    ReservedSampleRateCode(u8),

    #[error("Invalid frame size: {0}")]
    FrameSize(u32),

    #[error("Reserved E-AC-3 frame type")]
    ReservedFrameType,

    #[error("not MJPEG-B (bad fourcc). Read {0:#010X}")]
    MjpegbTag(u32),

    #[error("MJPEG-B packet too large: {0} bytes")]
    MjpegbPacketTooLarge(usize),
}

#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    #[error("Insufficient buffer data for frame scanning")]
    InsufficientData,

    #[error("Invalid frame header at byte {offset}: {source}")]
    InvalidHeader {
        offset: usize,
        #[source]
        source: HeaderError,
    },
}

#[test]
fn status_codes_are_negative() {
    let errors = [
        HeaderError::InvalidData(InvalidDataKind::AlsTag(0)),
        HeaderError::BufferTooSmall {
            needed: 112,
            available: 111,
        },
        HeaderError::Unsupported("adts"),
    ];

    let codes = errors.iter().map(HeaderError::code).collect::<Vec<_>>();
    assert_eq!(codes, [-1, -2, -3]);
}

#[test]
fn eof_maps_to_invalid_data() {
    let err: HeaderError = io::Error::from(io::ErrorKind::UnexpectedEof).into();
    assert_eq!(err.kind(), ErrorKind::InvalidData);
}
