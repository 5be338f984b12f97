use anyhow::Result;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use audiohdr::process::scan::{Frame, FrameHeader, Scanner};
use audiohdr::utils::errors::ScanError;

use super::command::{Cli, ScanArgs};
use crate::input::InputReader;

pub fn cmd_scan(args: &ScanArgs, cli: &Cli, multi: Option<&MultiProgress>) -> Result<()> {
    let mut input_reader = InputReader::new(&args.input)?;
    log::info!("Scanning stream: {}", input_reader.name());

    let mut scanner = Scanner::default();
    scanner.set_fail_level(cli.fail_level());

    let mut context = ScanContext::default();

    if let Some(multi) = multi {
        let pb = multi.add(ProgressBar::new_spinner());
        pb.set_style(ProgressStyle::with_template("{spinner:.green} {msg}")?);
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb.set_message("Scanning frames...");
        context.pb = Some(pb);
    }

    input_reader.process_chunks(64 * 1024, |chunk| {
        context.total_bytes += chunk.len();
        scanner.push_bytes(chunk);

        for frame_result in scanner.by_ref() {
            match frame_result {
                Ok(frame) => context.process_frame(&frame),
                Err(ScanError::InsufficientData) => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Ok(true)
    })?;

    if let Some(pb) = context.pb.take() {
        pb.finish_and_clear();
    }

    if scanner.pending() > 0 {
        log::warn!("{} trailing bytes do not form a frame", scanner.pending());
    }

    match context.first {
        Some(ref first) => display_summary(first, &context, &scanner),
        None => {
            println!("No ADTS or AC-3 frame found in the input.");
        }
    }

    Ok(())
}

#[derive(Default)]
struct ScanContext {
    first: Option<Frame>,
    frame_count: usize,
    frame_bytes: usize,
    total_samples: u64,
    total_bytes: usize,
    pb: Option<ProgressBar>,
}

impl ScanContext {
    fn process_frame(&mut self, frame: &Frame) {
        if self.first.is_none() {
            let display = || display_first_header(frame);
            match &self.pb {
                Some(pb) => pb.suspend(display),
                None => display(),
            }
            self.first = Some(frame.clone());
        }

        self.frame_count += 1;
        self.frame_bytes += frame.as_ref().len();
        self.total_samples += frame.header.samples() as u64;

        if self.frame_count.is_multiple_of(100) {
            if let Some(ref pb) = self.pb {
                pb.set_message(format!("Scanning frames...        {}", self.frame_count));
                pb.tick();
            }
        }
    }
}

fn display_first_header(frame: &Frame) {
    println!();
    println!("{} Stream Information", frame.kind);
    println!("=========================");
    println!();

    match &frame.header {
        FrameHeader::Adts(hdr) => {
            println!("  Object type               {}", hdr.object_type);
            println!("  MPEG version              {}", if hdr.id { 2 } else { 4 });
            println!("  CRC present               {}", !hdr.crc_absent);
            println!("  Channel config            {}", hdr.chan_config);
            println!("  Raw data blocks           {}", hdr.num_aac_frames);
        }
        FrameHeader::Ac3(hdr) => {
            println!("  Bitstream id              {}", hdr.bitstream_id);
            println!("  Bitstream mode            {}", hdr.bitstream_mode);
            println!("  Channel mode              {}", hdr.channel_mode);
            println!("  LFE                       {}", hdr.lfe_on);
            println!("  Channels                  {}", hdr.channels);
            if hdr.is_eac3() {
                println!("  Frame type                {:?}", hdr.frame_type);
                println!("  Substream id              {}", hdr.substream_id);
            }
            println!("  Audio blocks              {}", hdr.num_blocks);
        }
    }

    println!("  Sampling rate             {} Hz", frame.header.sample_rate());
    println!("  Bit rate                  {} kbps", frame.header.bit_rate() / 1000);
    println!("  Frame size                {} bytes", frame.header.frame_size());
    println!();
}

fn display_summary(first: &Frame, context: &ScanContext, scanner: &Scanner) {
    println!("Scan Summary");
    println!("  Frames                    {}", scanner.frames_found());

    let size_mb = context.total_bytes as f64 / 1_000_000.0;
    println!(
        "  Size                      {size_mb:.2} MB ({} bytes)",
        context.total_bytes
    );
    if scanner.skipped() > 0 {
        println!("  Skipped sync candidates   {}", scanner.skipped());
    }

    let sample_rate = first.header.sample_rate();
    if sample_rate > 0 {
        let duration_secs = context.total_samples as f64 / sample_rate as f64;
        println!("  Duration                  {}", duration_str(duration_secs));

        if duration_secs > 0.0 {
            let avg_kbps = (context.frame_bytes as f64 * 8.0) / (duration_secs * 1000.0);
            println!("  Average bit rate          {avg_kbps:.1} kbps");
        }
    }

    println!();
}

/// `HH:MM:SS.mmm`; hours widen past 99.
fn duration_str(secs: f64) -> String {
    let total_ms = (secs * 1000.0).round() as u64;
    let (hours, rem) = (total_ms / 3_600_000, total_ms % 3_600_000);
    let (minutes, rem) = (rem / 60_000, rem % 60_000);
    let (seconds, millis) = (rem / 1000, rem % 1000);

    format!("{hours:02}:{minutes:02}:{seconds:02}.{millis:03}")
}

#[test]
fn duration_formatting() {
    assert_eq!(duration_str(0.0), "00:00:00.000");
    assert_eq!(duration_str(61.5), "00:01:01.500");
    assert_eq!(duration_str(360_000.021), "100:00:00.021");
}
