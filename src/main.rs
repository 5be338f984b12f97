use anyhow::Result;
use clap::Parser as ClapParser;
use indicatif::MultiProgress;
use indicatif_log_bridge::LogWrapper;

use cli::asc::cmd_asc;
use cli::command::{Cli, Commands, LogFormat};
use cli::pce::cmd_pce;
use cli::scan::cmd_scan;

mod cli;
mod input;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let base_level = cli.loglevel.to_level_filter();

    let multi = MultiProgress::new();

    let mut env_builder = env_logger::Builder::from_default_env();
    env_builder.filter_level(base_level);
    match cli.log_format {
        LogFormat::Plain => {
            env_builder.format_timestamp_secs();
        }
        LogFormat::Json => {
            env_builder.format(|buf, record| {
                use std::io::Write;
                let line = json_record(
                    &buf.timestamp().to_string(),
                    record.level(),
                    record.target(),
                    &record.args().to_string(),
                );
                writeln!(buf, "{line}")
            });
        }
    }

    let pb = if cli.progress {
        let logger = env_builder.build();
        LogWrapper::new(multi.clone(), logger).try_init()?;
        Some(&multi)
    } else {
        env_builder.try_init()?;
        None
    };

    match cli.command {
        Commands::Asc(ref args) => cmd_asc(args, &cli)?,
        Commands::Scan(ref args) => cmd_scan(args, &cli, pb)?,
        Commands::Pce(ref args) => cmd_pce(args, &cli)?,
    }

    Ok(())
}

fn json_record(ts: &str, level: log::Level, target: &str, msg: &str) -> serde_json::Value {
    serde_json::json!({
        "ts": ts,
        "lvl": level.as_str(),
        "target": target,
        "msg": msg,
    })
}

#[test]
fn json_record_escapes_message() -> Result<()> {
    let line = json_record(
        "2025-01-01T00:00:00Z",
        log::Level::Warn,
        "audiohdr::process::scan",
        "bad header \u{1b}[31m \"quoted\"\n",
    )
    .to_string();

    assert!(line.contains(r#""msg":"bad header \u001b[31m \"quoted\"\n""#));

    let parsed: serde_json::Value = serde_json::from_str(&line)?;
    assert_eq!(parsed["lvl"], "WARN");
    assert_eq!(parsed["msg"], "bad header \u{1b}[31m \"quoted\"\n");
    Ok(())
}
