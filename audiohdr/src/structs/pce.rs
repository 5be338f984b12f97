//! Program Config Element.
//!
//! [`copy_pce`] re-emits a PCE bit for bit into another bitstream, e.g. when
//! moving it from an AudioSpecificConfig into an ADTS or LATM payload. It only
//! decodes the counts needed to know how many bits follow.
//! [`ProgramConfigElement`] decodes the same layout into named fields.

use std::io;

use log::trace;

use crate::utils::bitstream_io::{BitstreamIoWriter, BsIoSliceReader};
use crate::utils::errors::Result;

#[inline(always)]
fn copy_bits<W: io::Write>(
    writer: &mut BitstreamIoWriter<W>,
    reader: &mut BsIoSliceReader,
    n: u32,
) -> Result<u32> {
    let value: u32 = reader.get_n(n)?;
    writer.put_n(n, value)?;
    Ok(value)
}

/// Copies one PCE from `reader` to `writer` and returns the bits written,
/// alignment padding included.
///
/// Element lists are copied as opaque payload: front, side, back and coupling
/// entries are 5 bits each, LFE and data entries 4 bits each. Both sides are
/// byte aligned before the comment field, as the syntax requires.
pub fn copy_pce<W: io::Write>(
    writer: &mut BitstreamIoWriter<W>,
    reader: &mut BsIoSliceReader,
) -> Result<u64> {
    let offset = writer.bits_written();

    // tag, object type, sampling index
    copy_bits(writer, reader, 10)?;

    let mut five_bit_ch = copy_bits(writer, reader, 4)?; // front
    five_bit_ch += copy_bits(writer, reader, 4)?; // side
    five_bit_ch += copy_bits(writer, reader, 4)?; // back
    let mut four_bit_ch = copy_bits(writer, reader, 2)?; // lfe
    four_bit_ch += copy_bits(writer, reader, 3)?; // data
    five_bit_ch += copy_bits(writer, reader, 4)?; // coupling

    // mono, stereo, matrix mixdown
    for width in [4, 4, 3] {
        if copy_bits(writer, reader, 1)? != 0 {
            copy_bits(writer, reader, width)?;
        }
    }

    let mut bits = five_bit_ch * 5 + four_bit_ch * 4;
    trace!("PCE element payload: {bits} bits");
    while bits > 16 {
        copy_bits(writer, reader, 16)?;
        bits -= 16;
    }
    if bits > 0 {
        copy_bits(writer, reader, bits)?;
    }

    writer.byte_align()?;
    reader.byte_align();

    let comment_size = copy_bits(writer, reader, 8)?;
    for _ in 0..comment_size {
        copy_bits(writer, reader, 8)?;
    }

    Ok(writer.bits_written() - offset)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelElement {
    pub is_cpe: bool,
    pub tag_select: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CouplingElement {
    pub is_ind_sw: bool,
    pub tag_select: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatrixMixdown {
    pub index: u8,
    pub pseudo_surround: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramConfigElement {
    pub element_instance_tag: u8,
    pub object_type: u8,
    pub sampling_index: u8,
    pub front: Vec<ChannelElement>,
    pub side: Vec<ChannelElement>,
    pub back: Vec<ChannelElement>,
    pub lfe: Vec<u8>,
    pub assoc_data: Vec<u8>,
    pub coupling: Vec<CouplingElement>,
    pub mono_mixdown: Option<u8>,
    pub stereo_mixdown: Option<u8>,
    pub matrix_mixdown: Option<MatrixMixdown>,
    pub comment: Vec<u8>,
}

impl ProgramConfigElement {
    pub fn read(reader: &mut BsIoSliceReader) -> Result<Self> {
        let mut pce = Self {
            element_instance_tag: reader.get_n(4)?,
            object_type: reader.get_n(2)?,
            sampling_index: reader.get_n(4)?,
            ..Default::default()
        };

        let num_front: u8 = reader.get_n(4)?;
        let num_side: u8 = reader.get_n(4)?;
        let num_back: u8 = reader.get_n(4)?;
        let num_lfe: u8 = reader.get_n(2)?;
        let num_assoc_data: u8 = reader.get_n(3)?;
        let num_coupling: u8 = reader.get_n(4)?;

        if reader.get()? {
            pce.mono_mixdown = Some(reader.get_n(4)?);
        }
        if reader.get()? {
            pce.stereo_mixdown = Some(reader.get_n(4)?);
        }
        if reader.get()? {
            pce.matrix_mixdown = Some(MatrixMixdown {
                index: reader.get_n(2)?,
                pseudo_surround: reader.get()?,
            });
        }

        pce.front = Self::read_channel_elements(reader, num_front)?;
        pce.side = Self::read_channel_elements(reader, num_side)?;
        pce.back = Self::read_channel_elements(reader, num_back)?;
        pce.lfe = (0..num_lfe)
            .map(|_| reader.get_n::<u8>(4))
            .collect::<Result<_>>()?;
        pce.assoc_data = (0..num_assoc_data)
            .map(|_| reader.get_n::<u8>(4))
            .collect::<Result<_>>()?;
        pce.coupling = (0..num_coupling)
            .map(|_| -> Result<CouplingElement> {
                Ok(CouplingElement {
                    is_ind_sw: reader.get()?,
                    tag_select: reader.get_n(4)?,
                })
            })
            .collect::<Result<_>>()?;

        reader.byte_align();

        let comment_size: u8 = reader.get_n(8)?;
        pce.comment = (0..comment_size)
            .map(|_| reader.get_n::<u8>(8))
            .collect::<Result<_>>()?;

        Ok(pce)
    }

    fn read_channel_elements(
        reader: &mut BsIoSliceReader,
        count: u8,
    ) -> Result<Vec<ChannelElement>> {
        (0..count)
            .map(|_| -> Result<ChannelElement> {
                Ok(ChannelElement {
                    is_cpe: reader.get()?,
                    tag_select: reader.get_n(4)?,
                })
            })
            .collect()
    }

    /// Writes the element. Counts are taken from the list lengths and must
    /// fit their fields.
    pub fn write<W: io::Write>(&self, writer: &mut BitstreamIoWriter<W>) -> Result<()> {
        writer.put_n(4, self.element_instance_tag)?;
        writer.put_n(2, self.object_type)?;
        writer.put_n(4, self.sampling_index)?;

        writer.put_n(4, self.front.len() as u8)?;
        writer.put_n(4, self.side.len() as u8)?;
        writer.put_n(4, self.back.len() as u8)?;
        writer.put_n(2, self.lfe.len() as u8)?;
        writer.put_n(3, self.assoc_data.len() as u8)?;
        writer.put_n(4, self.coupling.len() as u8)?;

        for mixdown in [self.mono_mixdown, self.stereo_mixdown] {
            writer.put(mixdown.is_some())?;
            if let Some(element) = mixdown {
                writer.put_n(4, element)?;
            }
        }
        writer.put(self.matrix_mixdown.is_some())?;
        if let Some(mm) = self.matrix_mixdown {
            writer.put_n(2, mm.index)?;
            writer.put(mm.pseudo_surround)?;
        }

        for ce in self.front.iter().chain(&self.side).chain(&self.back) {
            writer.put(ce.is_cpe)?;
            writer.put_n(4, ce.tag_select)?;
        }
        for &tag in self.lfe.iter().chain(&self.assoc_data) {
            writer.put_n(4, tag)?;
        }
        for cc in &self.coupling {
            writer.put(cc.is_ind_sw)?;
            writer.put_n(4, cc.tag_select)?;
        }

        writer.byte_align()?;

        writer.put_n(8, self.comment.len() as u8)?;
        for &byte in &self.comment {
            writer.put_n(8, byte)?;
        }

        Ok(())
    }

    /// Output channels: two per CPE, one per SCE and LFE.
    pub fn channel_count(&self) -> usize {
        let elements = self
            .front
            .iter()
            .chain(&self.side)
            .chain(&self.back)
            .map(|ce| if ce.is_cpe { 2 } else { 1 })
            .sum::<usize>();

        elements + self.lfe.len()
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::utils::bitstream_io::BsIoVecWriter;

    fn stereo_plus_center_lfe() -> ProgramConfigElement {
        ProgramConfigElement {
            element_instance_tag: 0,
            object_type: 1,
            sampling_index: 3,
            front: vec![
                ChannelElement {
                    is_cpe: true,
                    tag_select: 0,
                },
                ChannelElement {
                    is_cpe: false,
                    tag_select: 1,
                },
            ],
            lfe: vec![0],
            comment: b"abc".to_vec(),
            ..Default::default()
        }
    }

    fn encode(pce: &ProgramConfigElement, lead_bits: u32) -> Vec<u8> {
        let mut writer = BsIoVecWriter::default();
        if lead_bits > 0 {
            writer.put_n(lead_bits, 0u32).unwrap();
        }
        pce.write(&mut writer).unwrap();
        writer.into_bytes().unwrap()
    }

    #[test]
    fn copy_is_bit_exact() -> anyhow::Result<()> {
        let pce = stereo_plus_center_lfe();
        let src = encode(&pce, 0);

        let mut reader = BsIoSliceReader::from_slice(&src);
        let mut writer = BsIoVecWriter::default();
        let bits = copy_pce(&mut writer, &mut reader)?;

        // 10 + 21 counts + 3 flags + 14 payload, aligned, + 8 + 3 * 8
        assert_eq!(bits, 80);
        assert_eq!(reader.available()?, 0);

        let copied = writer.into_bytes()?;
        assert_eq!(copied, src);

        let reparsed = ProgramConfigElement::read(&mut BsIoSliceReader::from_slice(&copied))?;
        assert_eq!(reparsed, pce);
        assert_eq!(reparsed.channel_count(), 4);
        Ok(())
    }

    #[test]
    fn copy_pads_to_destination_alignment() -> anyhow::Result<()> {
        let pce = ProgramConfigElement {
            mono_mixdown: Some(2),
            matrix_mixdown: Some(MatrixMixdown {
                index: 3,
                pseudo_surround: true,
            }),
            ..stereo_plus_center_lfe()
        };
        let src = encode(&pce, 0);

        let mut writer = BsIoVecWriter::default();
        writer.put_n(3, 0b111u8)?;

        let mut reader = BsIoSliceReader::from_slice(&src);
        let bits = copy_pce(&mut writer, &mut reader)?;
        assert_eq!(writer.bits_written(), 3 + bits);
        assert_eq!(writer.bits_written() % 8, 0);

        let copied = writer.into_bytes()?;
        let mut reader = BsIoSliceReader::from_slice(&copied);
        reader.skip_n(3)?;
        assert_eq!(ProgramConfigElement::read(&mut reader)?, pce);
        Ok(())
    }

    #[test]
    fn truncated_comment() {
        let pce = stereo_plus_center_lfe();
        let src = encode(&pce, 0);

        let mut reader = BsIoSliceReader::from_slice(&src[..src.len() - 1]);
        let mut writer = BsIoVecWriter::default();
        assert!(copy_pce(&mut writer, &mut reader).is_err());
    }

    fn channel_elements(max: usize) -> impl Strategy<Value = Vec<ChannelElement>> {
        proptest::collection::vec(
            (any::<bool>(), 0u8..16).prop_map(|(is_cpe, tag_select)| ChannelElement {
                is_cpe,
                tag_select,
            }),
            0..=max,
        )
    }

    prop_compose! {
        fn any_pce()(
            element_instance_tag in 0u8..16,
            object_type in 0u8..4,
            sampling_index in 0u8..16,
            front in channel_elements(15),
            side in channel_elements(15),
            back in channel_elements(15),
            lfe in proptest::collection::vec(0u8..16, 0..=3),
            assoc_data in proptest::collection::vec(0u8..16, 0..=7),
            coupling in proptest::collection::vec(
                (any::<bool>(), 0u8..16).prop_map(|(is_ind_sw, tag_select)| CouplingElement {
                    is_ind_sw,
                    tag_select,
                }),
                0..=15,
            ),
            mono_mixdown in proptest::option::of(0u8..16),
            stereo_mixdown in proptest::option::of(0u8..16),
            matrix_mixdown in proptest::option::of(
                (0u8..4, any::<bool>()).prop_map(|(index, pseudo_surround)| MatrixMixdown {
                    index,
                    pseudo_surround,
                }),
            ),
            comment in proptest::collection::vec(any::<u8>(), 0..=32),
        ) -> ProgramConfigElement {
            ProgramConfigElement {
                element_instance_tag,
                object_type,
                sampling_index,
                front,
                side,
                back,
                lfe,
                assoc_data,
                coupling,
                mono_mixdown,
                stereo_mixdown,
                matrix_mixdown,
                comment,
            }
        }
    }

    proptest! {
        #[test]
        fn copy_preserves_every_bit(pce in any_pce(), lead_bits in 0u32..8) {
            let src = encode(&pce, lead_bits);

            let mut reader = BsIoSliceReader::from_slice(&src);
            let mut writer = BsIoVecWriter::default();
            if lead_bits > 0 {
                reader.skip_n(lead_bits).unwrap();
                writer.put_n(lead_bits, 0u32).unwrap();
            }

            let bits = copy_pce(&mut writer, &mut reader).unwrap();
            prop_assert_eq!(bits + lead_bits as u64, (src.len() as u64) << 3);
            prop_assert_eq!(writer.into_bytes().unwrap(), src);
        }
    }
}
