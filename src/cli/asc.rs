use anyhow::{Context, Result};
use serde::Serialize;

use audiohdr::structs::audio_object_type::AudioObjectType;
use audiohdr::structs::audio_specific_config::AudioConfig;

use super::command::{AscArgs, Cli, OutputFormat};
use crate::input::{InputReader, parse_hex};

pub fn cmd_asc(args: &AscArgs, _cli: &Cli) -> Result<()> {
    let data = match (&args.hex, &args.file) {
        (Some(hex), _) => parse_hex(hex)?,
        (None, Some(path)) => InputReader::new(path)?.read_all()?,
        (None, None) => anyhow::bail!("either HEX or --file is required"),
    };

    let bits = args.bits.unwrap_or((data.len() as u64) << 3);
    log::debug!(
        "Parsing {bits} bits of AudioSpecificConfig (sync extension {})",
        if args.sync_extension { "on" } else { "off" }
    );

    let (config, offset) = AudioConfig::parse(&data, bits, args.sync_extension)
        .with_context(|| format!("cannot parse AudioSpecificConfig {}", hex::encode(&data)))?;

    let report = AscReport::new(&config, offset, bits);
    match args.format {
        OutputFormat::Plain => report.display(),
        OutputFormat::Yaml => print!("{}", serde_yaml_ng::to_string(&report)?),
    }

    Ok(())
}

#[derive(Debug, Serialize)]
struct ObjectTypeReport {
    id: u8,
    name: Option<&'static str>,
}

impl From<AudioObjectType> for ObjectTypeReport {
    fn from(object_type: AudioObjectType) -> Self {
        Self {
            id: object_type.0,
            name: object_type.name(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ExtensionReport {
    object_type: ObjectTypeReport,
    sampling_index: Option<u8>,
    sample_rate: u32,
    chan_config: Option<u8>,
}

#[derive(Debug, Serialize)]
struct AscReport {
    object_type: ObjectTypeReport,
    sampling_index: u8,
    sample_rate: u32,
    chan_config: u8,
    channels: Option<u32>,
    sbr: String,
    ps: String,
    extension: Option<ExtensionReport>,
    specific_config_offset: u64,
    bit_length: u64,
}

impl AscReport {
    fn new(config: &AudioConfig, offset: u64, bit_length: u64) -> Self {
        let extension = (config.ext_object_type != AudioObjectType::NULL).then(|| ExtensionReport {
            object_type: config.ext_object_type.into(),
            sampling_index: config.ext_sampling_index,
            sample_rate: config.ext_sample_rate,
            chan_config: config.ext_chan_config,
        });

        Self {
            object_type: config.object_type.into(),
            sampling_index: config.sampling_index,
            sample_rate: config.sample_rate,
            chan_config: config.chan_config,
            channels: config.channels,
            sbr: config.sbr.to_string(),
            ps: config.ps.to_string(),
            extension,
            specific_config_offset: offset,
            bit_length,
        }
    }

    fn display(&self) {
        println!();
        println!("AudioSpecificConfig");
        println!("===================");
        println!();

        let object_type = |ot: &ObjectTypeReport| match ot.name {
            Some(name) => format!("{name} ({})", ot.id),
            None => format!("Reserved ({})", ot.id),
        };

        println!("  Object type               {}", object_type(&self.object_type));
        println!(
            "  Sampling rate             {} Hz (index {})",
            self.sample_rate, self.sampling_index
        );
        match self.channels {
            Some(channels) => println!(
                "  Channels                  {channels} (config {})",
                self.chan_config
            ),
            None => println!("  Channels                  unknown (config {})", self.chan_config),
        }
        println!("  SBR                       {}", self.sbr);
        println!("  PS                        {}", self.ps);

        if let Some(ext) = &self.extension {
            println!();
            println!("Extension");
            println!("  Object type               {}", object_type(&ext.object_type));
            if ext.sample_rate != 0 {
                println!("  Sampling rate             {} Hz", ext.sample_rate);
            }
            if let Some(chan_config) = ext.chan_config {
                println!("  Channel config            {chan_config}");
            }
        }

        println!();
        println!(
            "  Specific config at bit    {} of {}",
            self.specific_config_offset, self.bit_length
        );
        println!();
    }
}
