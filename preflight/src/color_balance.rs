//! Per-cycle channel balance of the index bases pooled in a lane.

use crate::lanes::LaneGroups;
use index_seq::{Base, IndexSeq};
use run_types::{IndexRead, InstrumentChannelConfig, Sample};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum_macros::Display;

/// Below this share of signal a channel is considered weak.
pub const LOW_SIGNAL_PERCENT: f64 = 25.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ColorBalanceStatus {
    Ok,
    Warning,
    Error,
}

/// Base composition and channel signal at one index cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorBalancePosition {
    /// 1-based cycle within the index read.
    pub position: usize,
    pub a_count: usize,
    pub c_count: usize,
    pub g_count: usize,
    pub t_count: usize,
    pub channel1_percent: f64,
    pub channel2_percent: f64,
    pub status: ColorBalanceStatus,
}

impl ColorBalancePosition {
    fn new(
        position: usize,
        column: impl Iterator<Item = u8>,
        channel: &InstrumentChannelConfig,
    ) -> Self {
        let mut counts = [0usize; 4];
        for b in column {
            if let Some(i) = Base::ACGT.iter().position(|base| base.as_byte() == b) {
                counts[i] += 1;
            }
        }
        let count = |base: Base| {
            Base::ACGT
                .iter()
                .position(|&b| b == base)
                .map_or(0, |i| counts[i])
        };
        let channel_count = |bases: &[Base]| bases.iter().map(|&b| count(b)).sum::<usize>();

        let total: usize = counts.iter().sum();
        let ch1 = channel_count(&channel.channel1_bases);
        let ch2 = channel_count(&channel.channel2_bases);
        let percent = |n: usize| {
            if total == 0 {
                0.0
            } else {
                100.0 * n as f64 / total as f64
            }
        };
        let (channel1_percent, channel2_percent) = (percent(ch1), percent(ch2));

        let status = if total == 0 {
            ColorBalanceStatus::Ok
        } else if ch1 == 0 || ch2 == 0 {
            ColorBalanceStatus::Error
        } else if channel1_percent < LOW_SIGNAL_PERCENT
            || channel2_percent < LOW_SIGNAL_PERCENT
        {
            ColorBalanceStatus::Warning
        } else {
            ColorBalanceStatus::Ok
        };

        ColorBalancePosition {
            position,
            a_count: counts[0],
            c_count: counts[1],
            g_count: counts[2],
            t_count: counts[3],
            channel1_percent,
            channel2_percent,
            status,
        }
    }

    pub fn total(&self) -> usize {
        self.a_count + self.c_count + self.g_count + self.t_count
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexColorBalance {
    pub index_type: IndexRead,
    pub positions: Vec<ColorBalancePosition>,
}

impl IndexColorBalance {
    pub fn has_issues(&self) -> bool {
        self.positions
            .iter()
            .any(|p| p.status != ColorBalanceStatus::Ok)
    }

    pub fn count(&self, status: ColorBalanceStatus) -> usize {
        self.positions.iter().filter(|p| p.status == status).count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaneColorBalance {
    pub lane: usize,
    pub sample_count: usize,
    pub i7_balance: Option<IndexColorBalance>,
    pub i5_balance: Option<IndexColorBalance>,
}

impl LaneColorBalance {
    pub fn has_issues(&self) -> bool {
        [&self.i7_balance, &self.i5_balance]
            .into_iter()
            .flatten()
            .any(IndexColorBalance::has_issues)
    }
}

/// Balance at every cycle up to the longest sequence. Shorter sequences stop
/// contributing once they run out of bases.
pub fn analyze_index(
    index_type: IndexRead,
    sequences: &[IndexSeq],
    channel: &InstrumentChannelConfig,
) -> IndexColorBalance {
    let max_len = sequences.iter().map(IndexSeq::len).max().unwrap_or(0);
    let positions = (0..max_len)
        .map(|pos| {
            let column = sequences
                .iter()
                .filter(move |s| pos < s.len())
                .map(move |s| s[pos]);
            ColorBalancePosition::new(pos + 1, column, channel)
        })
        .collect();
    IndexColorBalance {
        index_type,
        positions,
    }
}

/// Color balance of one lane. i5 sequences are analyzed as the instrument
/// reads them.
pub fn analyze_lane(
    lane: usize,
    samples: &[&Sample],
    channel: &InstrumentChannelConfig,
) -> LaneColorBalance {
    let i7: Vec<IndexSeq> = samples.iter().filter_map(|s| s.i7().copied()).collect();
    let i5: Vec<IndexSeq> = samples
        .iter()
        .filter_map(|s| s.i5())
        .map(|seq| channel.i5_orientation.as_read(seq))
        .collect();
    let balance = |index_type, seqs: &[IndexSeq]| {
        (!seqs.is_empty()).then(|| analyze_index(index_type, seqs, channel))
    };
    LaneColorBalance {
        lane,
        sample_count: samples.len(),
        i7_balance: balance(IndexRead::I7, &i7),
        i5_balance: balance(IndexRead::I5, &i5),
    }
}

pub fn color_balance(
    groups: &LaneGroups<'_>,
    channel: &InstrumentChannelConfig,
) -> BTreeMap<usize, LaneColorBalance> {
    groups
        .iter()
        .filter(|(_, samples)| !samples.is_empty())
        .map(|(&lane, samples)| (lane, analyze_lane(lane, samples, channel)))
        .collect()
}
