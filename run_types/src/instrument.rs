//! Instrument catalog: chemistry, dye channels, i5 orientation and flowcell
//! geometry for each supported sequencer.

use crate::run::{RunCycles, FALLBACK_CYCLES};
use anyhow::{Context, Result};
use index_seq::{Base, IndexSeq};
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use strum_macros::{Display, EnumString};

const BUILTIN_CATALOG: &str = include_str!("../instruments.toml");

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
pub enum ChemistryType {
    #[default]
    #[serde(rename = "2-color")]
    #[strum(serialize = "2-color")]
    TwoColor,
    #[serde(rename = "4-color")]
    #[strum(serialize = "4-color")]
    FourColor,
}

/// How the instrument reads the i5 index relative to the sample sheet.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
pub enum I5Orientation {
    #[default]
    #[serde(rename = "forward")]
    #[strum(serialize = "forward")]
    Forward,
    #[serde(rename = "reverse-complement")]
    #[strum(serialize = "reverse-complement")]
    ReverseComplement,
}

impl I5Orientation {
    /// The i5 bases in the order the sequencer sees them.
    pub fn as_read(self, i5: &IndexSeq) -> IndexSeq {
        match self {
            I5Orientation::Forward => *i5,
            I5Orientation::ReverseComplement => i5.revcomp(),
        }
    }
}

/// Dye channels of a two-color chemistry, plus the run's i5 orientation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentChannelConfig {
    pub channel1_name: String,
    pub channel1_bases: Vec<Base>,
    pub channel2_name: String,
    pub channel2_bases: Vec<Base>,
    /// Detected by neither channel.
    pub dark_base: Base,
    #[serde(default)]
    pub sbs_chemistry: String,
    #[serde(default)]
    pub i5_orientation: I5Orientation,
}

impl InstrumentChannelConfig {
    /// XLEAP-SBS blue/green chemistry.
    pub fn xleap(i5_orientation: I5Orientation) -> Self {
        InstrumentChannelConfig {
            channel1_name: "Blue".to_string(),
            channel1_bases: vec![Base::A, Base::C],
            channel2_name: "Green".to_string(),
            channel2_bases: vec![Base::C, Base::T],
            dark_base: Base::G,
            sbs_chemistry: "XLEAP-SBS".to_string(),
            i5_orientation,
        }
    }

    /// Original red/green SBS chemistry.
    pub fn red_green(i5_orientation: I5Orientation) -> Self {
        InstrumentChannelConfig {
            channel1_name: "Red".to_string(),
            channel1_bases: vec![Base::A, Base::C],
            channel2_name: "Green".to_string(),
            channel2_bases: vec![Base::A, Base::T],
            dark_base: Base::G,
            sbs_chemistry: "SBS".to_string(),
            i5_orientation,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowcellDef {
    #[serde(default = "default_lanes")]
    pub lanes: usize,
    #[serde(default)]
    pub reagent_kits: Vec<usize>,
}

fn default_lanes() -> usize {
    1
}

fn default_channel1_name() -> String {
    "Channel 1".to_string()
}

fn default_channel2_name() -> String {
    "Channel 2".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentDef {
    /// Platform name written into sample sheets.
    #[serde(default)]
    pub samplesheet_name: Option<String>,
    #[serde(default)]
    pub chemistry_type: ChemistryType,
    #[serde(default)]
    pub color_balance_enabled: bool,
    #[serde(default)]
    pub i5_read_orientation: I5Orientation,
    /// Orientation BCL Convert expects for i5 in a v2 sample sheet.
    #[serde(default)]
    pub samplesheet_v2_i5_orientation: Option<I5Orientation>,
    #[serde(default)]
    pub bclconvert_version: Option<String>,
    /// Whether the instrument still takes the IEM (v1) sample sheet.
    #[serde(default)]
    pub samplesheet_v1: bool,
    #[serde(default)]
    pub sbs_chemistry: String,
    #[serde(default = "default_channel1_name")]
    pub channel1_name: String,
    #[serde(default)]
    pub channel1_bases: Vec<Base>,
    #[serde(default = "default_channel2_name")]
    pub channel2_name: String,
    #[serde(default)]
    pub channel2_bases: Vec<Base>,
    #[serde(default)]
    pub dark_base: Option<Base>,
    #[serde(default)]
    pub flowcells: BTreeMap<String, FlowcellDef>,
}

impl InstrumentDef {
    /// Dye channel layout, for two-color instruments with color balance
    /// analysis enabled and channel bases configured.
    pub fn channel_config(&self) -> Option<InstrumentChannelConfig> {
        if self.chemistry_type != ChemistryType::TwoColor
            || !self.color_balance_enabled
            || self.channel1_bases.is_empty()
        {
            return None;
        }
        let dark_base = self.dark_base.or_else(|| {
            Base::ACGT.into_iter().find(|b| {
                !self.channel1_bases.contains(b) && !self.channel2_bases.contains(b)
            })
        });
        let Some(dark_base) = dark_base else {
            warn!("every base is detected by a dye channel; no dark base can be derived");
            return None;
        };
        Some(InstrumentChannelConfig {
            channel1_name: self.channel1_name.clone(),
            channel1_bases: self.channel1_bases.clone(),
            channel2_name: self.channel2_name.clone(),
            channel2_bases: self.channel2_bases.clone(),
            dark_base,
            sbs_chemistry: self.sbs_chemistry.clone(),
            i5_orientation: self.i5_read_orientation,
        })
    }

    pub fn samplesheet_v2_i5_orientation(&self) -> I5Orientation {
        self.samplesheet_v2_i5_orientation
            .unwrap_or(self.i5_read_orientation)
    }
}

/// All known instruments plus catalog-wide defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentCatalog {
    #[serde(default)]
    pub instruments: BTreeMap<String, InstrumentDef>,
    /// Keyed by reagent kit size in cycles.
    #[serde(default)]
    pub default_cycles: BTreeMap<String, RunCycles>,
}

impl InstrumentCatalog {
    /// The catalog compiled into this crate.
    pub fn builtin() -> Result<Self> {
        Self::from_toml_str(BUILTIN_CATALOG).context("built-in instrument catalog")
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Load a catalog file.
    pub fn load(path: &Path) -> Result<Self> {
        let s = std::fs::read_to_string(path).with_context(|| path.display().to_string())?;
        Self::from_toml_str(&s).with_context(|| path.display().to_string())
    }

    /// Load `path` when given, else the built-in catalog.
    pub fn load_or_builtin(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Self::builtin(),
        }
    }

    pub fn instrument(&self, name: &str) -> Option<&InstrumentDef> {
        self.instruments.get(name)
    }

    pub fn instrument_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.instruments.keys().map(String::as_str)
    }

    /// Lanes on a flowcell; unknown instruments and flowcells have one.
    pub fn lanes_for_flowcell(&self, instrument: &str, flowcell: &str) -> usize {
        match self
            .instrument(instrument)
            .and_then(|i| i.flowcells.get(flowcell))
        {
            Some(fc) => fc.lanes,
            None => {
                warn!("unknown flowcell '{flowcell}' for instrument '{instrument}', assuming 1 lane");
                1
            }
        }
    }

    pub fn channel_config(&self, instrument: &str) -> Option<InstrumentChannelConfig> {
        self.instrument(instrument)?.channel_config()
    }

    pub fn i5_orientation(&self, instrument: &str) -> I5Orientation {
        self.instrument(instrument)
            .map(|i| i.i5_read_orientation)
            .unwrap_or_default()
    }

    pub fn samplesheet_v2_i5_orientation(&self, instrument: &str) -> I5Orientation {
        self.instrument(instrument)
            .map(InstrumentDef::samplesheet_v2_i5_orientation)
            .unwrap_or_default()
    }

    pub fn supports_samplesheet_v1(&self, instrument: &str) -> bool {
        self.instrument(instrument)
            .is_some_and(|i| i.samplesheet_v1)
    }

    /// Default cycle plan for a reagent kit size: the catalog entry when there
    /// is one, else [`FALLBACK_CYCLES`] with both reads shortened to fit.
    pub fn default_cycles(&self, reagent_kit_cycles: usize) -> RunCycles {
        match self.default_cycles.get(&reagent_kit_cycles.to_string()) {
            Some(cycles) => *cycles,
            None => FALLBACK_CYCLES.fit_to(reagent_kit_cycles),
        }
    }
}
