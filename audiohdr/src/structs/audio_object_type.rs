//! MPEG-4 audio object types.

use std::fmt::Display;

/// Audio object type as carried in an AudioSpecificConfig.
///
/// Kept as a raw value rather than an exhaustive enum: escape-coded types
/// span 32..=95 and most of that range is reserved, but a parser still has to
/// carry whatever was signalled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AudioObjectType(pub u8);

impl AudioObjectType {
    pub const NULL: Self = Self(0);
    pub const AAC_MAIN: Self = Self(1);
    pub const AAC_LC: Self = Self(2);
    pub const AAC_SSR: Self = Self(3);
    pub const AAC_LTP: Self = Self(4);
    pub const SBR: Self = Self(5);
    pub const AAC_SCALABLE: Self = Self(6);
    pub const TWINVQ: Self = Self(7);
    pub const CELP: Self = Self(8);
    pub const HVXC: Self = Self(9);
    pub const TTSI: Self = Self(12);
    pub const MAIN_SYNTH: Self = Self(13);
    pub const WAVE_SYNTH: Self = Self(14);
    pub const MIDI: Self = Self(15);
    pub const SAFX: Self = Self(16);
    pub const ER_AAC_LC: Self = Self(17);
    pub const ER_AAC_LTP: Self = Self(19);
    pub const ER_AAC_SCALABLE: Self = Self(20);
    pub const ER_TWINVQ: Self = Self(21);
    pub const ER_BSAC: Self = Self(22);
    pub const ER_AAC_LD: Self = Self(23);
    pub const ER_CELP: Self = Self(24);
    pub const ER_HVXC: Self = Self(25);
    pub const ER_HILN: Self = Self(26);
    pub const ER_PARAM: Self = Self(27);
    pub const SSC: Self = Self(28);
    pub const PS: Self = Self(29);
    pub const SURROUND: Self = Self(30);
    /// 5-bit sentinel; the real type follows in 6 more bits.
    pub const ESCAPE: Self = Self(31);
    pub const L1: Self = Self(32);
    pub const L2: Self = Self(33);
    pub const L3: Self = Self(34);
    pub const DST: Self = Self(35);
    pub const ALS: Self = Self(36);
    pub const SLS: Self = Self(37);
    pub const SLS_NON_CORE: Self = Self(38);
    pub const ER_AAC_ELD: Self = Self(39);
    pub const SMR_SIMPLE: Self = Self(40);
    pub const SMR_MAIN: Self = Self(41);

    pub fn name(&self) -> Option<&'static str> {
        let name = match *self {
            Self::NULL => "Null",
            Self::AAC_MAIN => "AAC Main",
            Self::AAC_LC => "AAC LC",
            Self::AAC_SSR => "AAC SSR",
            Self::AAC_LTP => "AAC LTP",
            Self::SBR => "SBR",
            Self::AAC_SCALABLE => "AAC Scalable",
            Self::TWINVQ => "TwinVQ",
            Self::CELP => "CELP",
            Self::HVXC => "HVXC",
            Self::TTSI => "TTSI",
            Self::MAIN_SYNTH => "Main Synthetic",
            Self::WAVE_SYNTH => "Wavetable Synthesis",
            Self::MIDI => "General MIDI",
            Self::SAFX => "Algorithmic Synthesis and Audio FX",
            Self::ER_AAC_LC => "ER AAC LC",
            Self::ER_AAC_LTP => "ER AAC LTP",
            Self::ER_AAC_SCALABLE => "ER AAC Scalable",
            Self::ER_TWINVQ => "ER TwinVQ",
            Self::ER_BSAC => "ER BSAC",
            Self::ER_AAC_LD => "ER AAC LD",
            Self::ER_CELP => "ER CELP",
            Self::ER_HVXC => "ER HVXC",
            Self::ER_HILN => "ER HILN",
            Self::ER_PARAM => "ER Parametric",
            Self::SSC => "SSC",
            Self::PS => "PS",
            Self::SURROUND => "MPEG Surround",
            Self::ESCAPE => "Escape",
            Self::L1 => "Layer-1",
            Self::L2 => "Layer-2",
            Self::L3 => "Layer-3",
            Self::DST => "DST",
            Self::ALS => "ALS",
            Self::SLS => "SLS",
            Self::SLS_NON_CORE => "SLS non-core",
            Self::ER_AAC_ELD => "ER AAC ELD",
            Self::SMR_SIMPLE => "SMR Simple",
            Self::SMR_MAIN => "SMR Main",
            _ => return None,
        };

        Some(name)
    }
}

impl From<u8> for AudioObjectType {
    fn from(value: u8) -> Self {
        Self(value)
    }
}

impl From<AudioObjectType> for u8 {
    fn from(value: AudioObjectType) -> Self {
        value.0
    }
}

impl Display for AudioObjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{name} ({})", self.0),
            None => write!(f, "Reserved ({})", self.0),
        }
    }
}

#[test]
fn display_object_type() {
    assert_eq!(AudioObjectType::AAC_LC.to_string(), "AAC LC (2)");
    assert_eq!(AudioObjectType(42).to_string(), "Reserved (42)");
}
