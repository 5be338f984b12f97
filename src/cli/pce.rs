use anyhow::{Context, Result};
use serde::Serialize;

use audiohdr::structs::pce::{ChannelElement, ProgramConfigElement, copy_pce};
use audiohdr::utils::bitstream_io::{BsIoSliceReader, BsIoVecWriter};

use super::command::{Cli, PceArgs};
use crate::input::parse_hex;

pub fn cmd_pce(args: &PceArgs, _cli: &Cli) -> Result<()> {
    let data = parse_hex(&args.hex)?;

    let mut reader = BsIoSliceReader::from_slice(&data);
    let mut writer = BsIoVecWriter::default();
    let bits = copy_pce(&mut writer, &mut reader).context("cannot copy program config element")?;
    let copied = writer.into_bytes()?;

    log::debug!("Copied {bits} bits from {} input bytes", data.len());

    let pce = ProgramConfigElement::read(&mut BsIoSliceReader::from_slice(&copied))
        .context("copied element does not parse")?;

    println!("Bits written                {bits}");
    println!("Copied bytes                {}", hex::encode(&copied));
    println!("Output channels             {}", pce.channel_count());
    println!();
    print!("{}", serde_yaml_ng::to_string(&PceReport::from(&pce))?);

    if let Some(path) = &args.output {
        std::fs::write(path, &copied)
            .with_context(|| format!("cannot write {}", path.display()))?;
        log::info!("Wrote {} bytes to {}", copied.len(), path.display());
    }

    Ok(())
}

#[derive(Debug, Serialize)]
struct PceReport {
    element_instance_tag: u8,
    object_type: u8,
    sampling_index: u8,
    front: Vec<String>,
    side: Vec<String>,
    back: Vec<String>,
    lfe: Vec<u8>,
    assoc_data: Vec<u8>,
    coupling: Vec<u8>,
    mono_mixdown: Option<u8>,
    stereo_mixdown: Option<u8>,
    matrix_mixdown: Option<u8>,
    pseudo_surround: bool,
    comment: String,
}

fn element_label(ce: &ChannelElement) -> String {
    format!("{}{}", if ce.is_cpe { "CPE" } else { "SCE" }, ce.tag_select)
}

impl From<&ProgramConfigElement> for PceReport {
    fn from(pce: &ProgramConfigElement) -> Self {
        let labels = |elements: &[ChannelElement]| -> Vec<String> {
            elements.iter().map(element_label).collect()
        };

        Self {
            element_instance_tag: pce.element_instance_tag,
            object_type: pce.object_type,
            sampling_index: pce.sampling_index,
            front: labels(&pce.front),
            side: labels(&pce.side),
            back: labels(&pce.back),
            lfe: pce.lfe.clone(),
            assoc_data: pce.assoc_data.clone(),
            coupling: pce.coupling.iter().map(|cc| cc.tag_select).collect(),
            mono_mixdown: pce.mono_mixdown,
            stereo_mixdown: pce.stereo_mixdown,
            matrix_mixdown: pce.matrix_mixdown.map(|mm| mm.index),
            pseudo_surround: pce.matrix_mixdown.is_some_and(|mm| mm.pseudo_surround),
            comment: String::from_utf8_lossy(&pce.comment).into_owned(),
        }
    }
}
