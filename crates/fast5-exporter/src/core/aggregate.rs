//! Cumulative per-channel counters.

use std::collections::BTreeMap;
use std::sync::RwLock;

use serde::Serialize;

use super::error::MergeInvariantViolation;
use super::extraction::ExtractedStat;

/// Cumulative statistics of one channel since process start.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChannelAggregate {
    pub channel: String,
    pub read_count: u64,
    pub raw_data_length_sum: u64,
    pub raw_data_length_max: u64,
}

/// Outcome of merging one batch of records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub merged: usize,
    pub dropped: usize,
}

#[derive(Debug, Clone, Copy, Default)]
struct Counters {
    read_count: u64,
    sum: u64,
    max: u64,
}

/// Process-wide store of per-channel aggregates.
///
/// Counters only ever grow; channels are never evicted. A whole batch is
/// merged under one write lock and snapshots copy the table under the read
/// lock, so readers never see a batch or a record half applied.
#[derive(Debug, Default)]
pub struct AggregateStore {
    channels: RwLock<BTreeMap<String, Counters>>,
}

impl AggregateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds every record of `stats` to its channel.
    ///
    /// Records violating an invariant are dropped and logged; the remaining
    /// records are still merged.
    pub fn merge(&self, stats: &[ExtractedStat]) -> MergeReport {
        let mut report = MergeReport::default();
        let mut channels = self.channels.write().expect("poisoned");

        for stat in stats {
            match apply(&mut channels, stat) {
                Ok(()) => report.merged += 1,
                Err(violation) => {
                    tracing::warn!(
                        channel = %stat.channel,
                        raw_data_length = stat.raw_data_length,
                        error = %violation,
                        "dropping record"
                    );
                    report.dropped += 1;
                }
            }
        }

        report
    }

    /// Point-in-time copy of all channels, ordered by channel.
    pub fn snapshot(&self) -> Vec<ChannelAggregate> {
        self.channels
            .read()
            .expect("poisoned")
            .iter()
            .map(|(channel, counters)| ChannelAggregate {
                channel: channel.clone(),
                read_count: counters.read_count,
                raw_data_length_sum: counters.sum,
                raw_data_length_max: counters.max,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.channels.read().expect("poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn apply(
    channels: &mut BTreeMap<String, Counters>,
    stat: &ExtractedStat,
) -> Result<(), MergeInvariantViolation> {
    let length =
        u64::try_from(stat.raw_data_length).map_err(|_| MergeInvariantViolation::NegativeLength {
            channel: stat.channel.clone(),
            length: stat.raw_data_length,
        })?;
    let overflow = || MergeInvariantViolation::Overflow {
        channel: stat.channel.clone(),
    };

    let current = channels.get(&stat.channel).copied().unwrap_or_default();
    let next = Counters {
        read_count: current.read_count.checked_add(1).ok_or_else(overflow)?,
        sum: current.sum.checked_add(length).ok_or_else(overflow)?,
        max: current.max.max(length),
    };
    channels.insert(stat.channel.clone(), next);
    Ok(())
}
