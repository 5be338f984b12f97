use std::collections::VecDeque;
use std::sync::Arc;

use log::{Level, debug};

use crate::log_or_err;
use crate::structs::ac3::{AC3_HEADER_SIZE, Ac3HeaderInfo};
use crate::structs::adts::{ADTS_HEADER_SIZE, AdtsHeader};
use crate::utils::errors::{HeaderError, ScanError};

const HEADER_SIZE: usize = if ADTS_HEADER_SIZE > AC3_HEADER_SIZE {
    ADTS_HEADER_SIZE
} else {
    AC3_HEADER_SIZE
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Adts,
    Ac3,
}

impl FrameKind {
    fn matches_sync(&self, b0: u8, b1: u8) -> bool {
        match self {
            FrameKind::Adts => b0 == 0xFF && b1 & 0xF0 == 0xF0,
            FrameKind::Ac3 => b0 == 0x0B && b1 == 0x77,
        }
    }
}

impl std::fmt::Display for FrameKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FrameKind::Adts => write!(f, "ADTS"),
            FrameKind::Ac3 => write!(f, "AC-3"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameHeader {
    Adts(AdtsHeader),
    Ac3(Ac3HeaderInfo),
}

impl FrameHeader {
    /// Whole frame in bytes.
    pub fn frame_size(&self) -> usize {
        match self {
            FrameHeader::Adts(hdr) => hdr.frame_length as usize,
            FrameHeader::Ac3(hdr) => hdr.frame_size as usize,
        }
    }

    pub fn samples(&self) -> u32 {
        match self {
            FrameHeader::Adts(hdr) => hdr.samples,
            FrameHeader::Ac3(hdr) => hdr.samples(),
        }
    }

    pub fn sample_rate(&self) -> u32 {
        match self {
            FrameHeader::Adts(hdr) => hdr.sample_rate,
            FrameHeader::Ac3(hdr) => hdr.sample_rate,
        }
    }

    pub fn bit_rate(&self) -> u32 {
        match self {
            FrameHeader::Adts(hdr) => hdr.bit_rate,
            FrameHeader::Ac3(hdr) => hdr.bit_rate,
        }
    }
}

/// Splits an ADTS or AC-3 elementary stream into frames.
///
/// The first valid frame locks the scanner to its stream kind; later sync
/// words of the other kind are ignored.
///
/// # Example
///
/// ```rust,no_run
/// use audiohdr::process::scan::Scanner;
///
/// let mut scanner = Scanner::default();
/// scanner.push_bytes(&std::fs::read("stream.aac")?);
///
/// for frame in scanner.by_ref().flatten() {
///     println!("{} frame, {} bytes", frame.kind, frame.as_ref().len());
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct Scanner {
    buffer: VecDeque<u8>,
    kind: Option<FrameKind>,
    io_counter: usize,
    consumed: usize,
    frames_found: usize,
    skipped: usize,
    fail_level: Level,
}

impl Default for Scanner {
    fn default() -> Self {
        Self {
            buffer: VecDeque::with_capacity(16_384),
            kind: None,
            io_counter: 0,
            consumed: 0,
            frames_found: 0,
            skipped: 0,
            fail_level: Level::Error,
        }
    }
}

impl Scanner {
    pub fn push_bytes(&mut self, data: &[u8]) {
        self.buffer.extend(data);
        self.io_counter += 1;
    }

    /// Findings at or above `level` are returned as errors instead of logged.
    /// Skipped sync candidates are reported at `Warn`.
    pub fn set_fail_level(&mut self, level: Level) {
        self.fail_level = level;
    }

    pub fn kind(&self) -> Option<FrameKind> {
        self.kind
    }

    pub fn frames_found(&self) -> usize {
        self.frames_found
    }

    /// Sync candidates rejected by the header parser.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Bytes buffered but not yet part of a frame.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    fn consume_front(&mut self, cnt: usize) {
        self.buffer.drain(..cnt);
        self.consumed += cnt;
    }

    fn sync_kind(&self, b0: u8, b1: u8) -> Option<FrameKind> {
        match self.kind {
            Some(kind) => kind.matches_sync(b0, b1).then_some(kind),
            None => [FrameKind::Adts, FrameKind::Ac3]
                .into_iter()
                .find(|kind| kind.matches_sync(b0, b1)),
        }
    }

    /// Drops bytes up to the next sync word and returns its kind.
    fn seek_sync(&mut self) -> Option<FrameKind> {
        let found = (0..self.buffer.len().saturating_sub(1)).find_map(|i| {
            self.sync_kind(self.buffer[i], self.buffer[i + 1])
                .map(|kind| (i, kind))
        });

        match found {
            Some((offset, kind)) => {
                self.consume_front(offset);
                Some(kind)
            }
            None => {
                // the last byte may start a sync word
                self.consume_front(self.buffer.len().saturating_sub(1));
                None
            }
        }
    }

    #[cfg_attr(
        not(any(feature = "adts", feature = "ac3")),
        allow(unused_variables)
    )]
    fn parse_header(kind: FrameKind, head: &[u8]) -> Result<FrameHeader, HeaderError> {
        match kind {
            #[cfg(feature = "adts")]
            FrameKind::Adts => AdtsHeader::parse(head).map(FrameHeader::Adts),
            #[cfg(feature = "ac3")]
            FrameKind::Ac3 => {
                crate::structs::ac3::parse_ac3_header(head).map(|(hdr, _)| FrameHeader::Ac3(hdr))
            }
            #[allow(unreachable_patterns)]
            _ => Err(HeaderError::Unsupported("frame kind not built")),
        }
    }

    /// `Ok(None)` when more input is needed.
    fn next_frame(&mut self) -> Result<Option<Frame>, ScanError> {
        loop {
            let Some(kind) = self.seek_sync() else {
                return Ok(None);
            };

            if self.buffer.len() < HEADER_SIZE {
                return Ok(None);
            }

            let head = self.buffer.range(..HEADER_SIZE).copied().collect::<Vec<_>>();
            let header = match Self::parse_header(kind, &head) {
                Ok(header) => header,
                Err(HeaderError::Unsupported(what)) => {
                    debug!("{kind} sync at byte {}: {what}", self.consumed);
                    self.consume_front(1);
                    continue;
                }
                Err(source) => {
                    let offset = self.consumed;
                    self.consume_front(1);
                    self.skipped += 1;
                    log_or_err!(self, Level::Warn, ScanError::InvalidHeader { offset, source });
                    continue;
                }
            };

            let frame_size = header.frame_size();
            if self.buffer.len() < frame_size {
                return Ok(None);
            }

            let offset = self.consumed;
            let data: Arc<[u8]> = self.buffer.range(..frame_size).copied().collect();
            self.consume_front(frame_size);

            self.kind = Some(kind);
            self.frames_found += 1;

            return Ok(Some(Frame {
                kind,
                offset,
                header,
                data,
            }));
        }
    }
}

impl Iterator for Scanner {
    type Item = Result<Frame, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.io_counter == 0 {
            return None;
        }

        match self.next_frame() {
            Ok(Some(frame)) => Some(Ok(frame)),
            Ok(None) => {
                self.io_counter -= 1;
                Some(Err(ScanError::InsufficientData))
            }
            Err(e) => Some(Err(e)),
        }
    }
}

/// One complete frame, header included.
#[derive(Debug, Clone)]
pub struct Frame {
    pub kind: FrameKind,
    /// Stream position of the first byte.
    pub offset: usize,
    pub header: FrameHeader,
    pub data: Arc<[u8]>,
}

impl AsRef<[u8]> for Frame {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

#[cfg(all(test, feature = "adts", feature = "ac3"))]
mod tests {
    use super::*;
    use crate::structs::ac3::tests::ac3_header;
    use crate::structs::adts::tests::adts_header;

    fn adts_frame(frame_length: u16) -> Vec<u8> {
        let mut frame = adts_header(4, frame_length, 0);
        frame.resize(frame_length as usize, 0);
        frame
    }

    fn collect(scanner: &mut Scanner) -> (Vec<Frame>, Vec<ScanError>) {
        let mut frames = Vec::new();
        let mut errors = Vec::new();
        for result in scanner {
            match result {
                Ok(frame) => frames.push(frame),
                Err(e) => errors.push(e),
            }
        }
        (frames, errors)
    }

    #[test]
    fn adts_frames_across_pushes() {
        let stream = [adts_frame(20), adts_frame(24), adts_frame(20)].concat();
        let mut scanner = Scanner::default();

        scanner.push_bytes(&stream[..50]);
        let (frames, errors) = collect(&mut scanner);
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].offset, 20);
        assert_eq!(frames[1].as_ref().len(), 24);
        assert!(matches!(errors[..], [ScanError::InsufficientData]));

        scanner.push_bytes(&stream[50..]);
        let (frames, _) = collect(&mut scanner);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].offset, 44);
        assert_eq!(frames[0].header.samples(), 1024);
        assert_eq!(scanner.kind(), Some(FrameKind::Adts));
        assert_eq!(scanner.frames_found(), 3);
        assert_eq!(scanner.pending(), 0);
    }

    #[test]
    fn skips_garbage_and_bad_candidates() {
        let stream = [
            vec![0x00, 0x12, 0x34],
            adts_header(4, 3, 0),
            adts_frame(20),
            adts_frame(20),
        ]
        .concat();

        let mut scanner = Scanner::default();
        scanner.push_bytes(&stream);

        let (frames, errors) = collect(&mut scanner);
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].offset, 10);
        assert_eq!(errors.len(), 1);
        assert_eq!(scanner.skipped(), 1);
    }

    #[test]
    fn strict_reports_bad_candidates() {
        let stream = [adts_header(4, 3, 0), adts_frame(20)].concat();

        let mut scanner = Scanner::default();
        scanner.set_fail_level(Level::Warn);
        scanner.push_bytes(&stream);

        assert!(matches!(
            scanner.next(),
            Some(Err(ScanError::InvalidHeader { offset: 0, .. }))
        ));
        assert!(matches!(scanner.next(), Some(Ok(frame)) if frame.offset == 7));
    }

    #[test]
    fn ac3_frames_lock_the_stream_kind() {
        // 32 kHz, 32 kbit/s: 96 words
        let mut frame = ac3_header(2, 0, 1, false);
        frame.resize(192, 0);

        // the trailing ADTS frame is not a candidate once locked to AC-3
        let stream = [frame.clone(), frame, adts_frame(20)].concat();

        let mut scanner = Scanner::default();
        scanner.push_bytes(&stream);

        let (frames, errors) = collect(&mut scanner);
        assert_eq!(frames.len(), 2);
        assert!(frames.iter().all(|f| f.kind == FrameKind::Ac3));
        assert_eq!(frames[1].header.frame_size(), 192);
        assert_eq!(frames[1].header.sample_rate(), 32000);
        assert_eq!(scanner.skipped(), 0);
        assert!(matches!(errors[..], [ScanError::InsufficientData]));
    }

    #[test]
    fn incomplete_frame_waits_for_data() {
        let frame = adts_frame(40);

        let mut scanner = Scanner::default();
        scanner.push_bytes(&frame[..30]);
        assert!(matches!(
            scanner.next(),
            Some(Err(ScanError::InsufficientData))
        ));
        assert!(scanner.next().is_none());

        scanner.push_bytes(&frame[30..]);
        assert!(matches!(scanner.next(), Some(Ok(f)) if f.as_ref() == frame.as_slice()));
    }
}

#[cfg(all(test, not(any(feature = "adts", feature = "ac3"))))]
#[test]
fn frame_kinds_not_built() {
    let head = [0xFF, 0xF1, 0x50, 0x80, 0x02, 0x9F, 0xFC];
    for kind in [FrameKind::Adts, FrameKind::Ac3] {
        assert!(matches!(
            Scanner::parse_header(kind, &head),
            Err(HeaderError::Unsupported(_))
        ));
    }
}
