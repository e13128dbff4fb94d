use ais::RawBatch;
use anyhow::Result;
use chrono::Duration;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::records::dedupe;
use crate::{
    extract, filter, find_closest, load, ClosestPair, PositionRecord, RegionConfig,
    TrajectorySegment,
};

/// How to pick the final answer once every batch has been reduced to its trajectory windows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GlobalSelection {
    /// Search again over the union of all retained windows. This can find a pair made of vessels
    /// from different batches, as long as both were retained.
    Rederive,
    /// Take the best per-batch winner as-is.
    TrustBatchWinners,
}

/// The widest trajectory window accepted, on each side of the rendezvous
pub const MAX_HALF_WINDOW_MINUTES: i64 = 366 * 24 * 60;

#[derive(Clone, Debug, PartialEq)]
pub struct RunConfig {
    pub region: RegionConfig,
    /// Trajectories cover this much time on each side of the rendezvous
    pub half_window: Duration,
    pub selection: GlobalSelection,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            region: RegionConfig::default(),
            half_window: Duration::minutes(10),
            selection: GlobalSelection::Rederive,
        }
    }
}

impl RunConfig {
    pub fn validate(&self) -> Result<()> {
        self.region.validate()?;
        if self.half_window < Duration::zero() {
            bail!("The trajectory window can't be negative");
        }
        if self.half_window > Duration::minutes(MAX_HALF_WINDOW_MINUTES) {
            bail!(
                "The trajectory window can be at most {MAX_HALF_WINDOW_MINUTES} minutes, not {}",
                self.half_window.num_minutes()
            );
        }
        Ok(())
    }
}

/// What one batch contributed
#[derive(Clone, Debug, PartialEq)]
pub struct BatchOutcome {
    pub label: String,
    /// Records that survived loading
    pub loaded: usize,
    /// Malformed, out-of-bounds, or duplicate rows
    pub dropped: usize,
    pub in_region: usize,
    pub winner: Option<ClosestPair>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SkippedBatch {
    /// Position in the input sequence
    pub index: usize,
    pub error: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Rendezvous {
    pub pair: ClosestPair,
    pub trajectory_a: TrajectorySegment,
    pub trajectory_b: TrajectorySegment,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RunReport {
    pub batches: Vec<BatchOutcome>,
    pub skipped: Vec<SkippedBatch>,
    /// Number of records retained between the two phases
    pub pool_size: usize,
    /// None if no batch had two vessels reporting at the same time inside the region
    pub rendezvous: Option<Rendezvous>,
}

/// Finds the rendezvous over many batches without ever comparing all of them at once.
///
/// Each batch is loaded, filtered to the region, and searched for its own closest pair. Only the
/// two winning vessels' records within the trajectory window are kept. The final answer comes
/// from those retained windows, so a close approach that doesn't fall inside the window of any
/// batch's winner is never seen. That's the price of bounded memory, not a bug.
pub struct Aggregator {
    config: RunConfig,
}

// The running state of the fold over batches. Each step consumes the previous state and returns
// the next one.
#[derive(Default)]
struct Accumulated {
    batches: Vec<BatchOutcome>,
    skipped: Vec<SkippedBatch>,
    pool: Vec<PositionRecord>,
}

impl Accumulated {
    fn add(mut self, index: usize, result: Result<(BatchOutcome, Vec<PositionRecord>)>) -> Self {
        match result {
            Ok((outcome, candidates)) => {
                self.batches.push(outcome);
                self.pool.extend(candidates);
            }
            Err(err) => {
                warn!("Skipping batch {index}: {err:#}");
                self.skipped.push(SkippedBatch {
                    index,
                    error: format!("{err:#}"),
                });
            }
        }
        self
    }
}

impl Aggregator {
    pub fn new(config: RunConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Phase one for a single batch: its summary, plus the records of its winning pair inside the
    /// trajectory window. No winner means nothing is retained.
    pub fn process_batch(&self, batch: &RawBatch) -> (BatchOutcome, Vec<PositionRecord>) {
        let loaded = load(batch);
        let num_loaded = loaded.records.len();
        let records = filter(loaded.records, &self.config.region);
        let winner = find_closest(&records);

        let mut candidates = Vec::new();
        match winner {
            Some(ref pair) => {
                for vessel in [&pair.vessel_a, &pair.vessel_b] {
                    candidates.extend(
                        extract(&records, vessel, pair.timestamp, self.config.half_window)
                            .into_records(),
                    );
                }
                info!(
                    "{}: {} and {} were {:.3}km apart at {}, keeping {} records",
                    batch.label,
                    pair.vessel_a,
                    pair.vessel_b,
                    pair.distance_km,
                    pair.timestamp,
                    candidates.len()
                );
            }
            None => {
                info!(
                    "{}: no two vessels reported at the same time inside the region",
                    batch.label
                );
            }
        }

        let outcome = BatchOutcome {
            label: loaded.label,
            loaded: num_loaded,
            dropped: loaded.dropped + loaded.duplicates,
            in_region: records.len(),
            winner,
        };
        (outcome, candidates)
    }

    /// Processes batches one at a time, so only one raw batch is in memory at once. Batches that
    /// failed to load are skipped and reported.
    pub fn run<I: IntoIterator<Item = Result<RawBatch>>>(&self, batches: I) -> RunReport {
        let acc = batches
            .into_iter()
            .enumerate()
            .fold(Accumulated::default(), |acc, (index, batch)| {
                acc.add(index, batch.map(|b| self.process_batch(&b)))
            });
        self.finish(acc)
    }

    /// Same result as `run`, but processes all batches concurrently.
    pub fn run_parallel(&self, batches: Vec<Result<RawBatch>>) -> RunReport {
        let results: Vec<Result<(BatchOutcome, Vec<PositionRecord>)>> = batches
            .into_par_iter()
            .map(|batch| batch.map(|b| self.process_batch(&b)))
            .collect();
        // Combine in input order, so the report looks the same as the sequential one
        let acc = results
            .into_iter()
            .enumerate()
            .fold(Accumulated::default(), |acc, (index, result)| {
                acc.add(index, result)
            });
        self.finish(acc)
    }

    fn finish(&self, acc: Accumulated) -> RunReport {
        let pool = dedupe(acc.pool);
        info!(
            "Retained {} records from {} batches ({} skipped)",
            pool.len(),
            acc.batches.len(),
            acc.skipped.len()
        );

        let winner = match self.config.selection {
            GlobalSelection::Rederive => find_closest(&pool),
            GlobalSelection::TrustBatchWinners => acc
                .batches
                .iter()
                .filter_map(|b| b.winner.clone())
                .reduce(ClosestPair::best),
        };

        let rendezvous = winner.map(|pair| {
            let half_window = self.config.half_window;
            Rendezvous {
                trajectory_a: extract(&pool, &pair.vessel_a, pair.timestamp, half_window),
                trajectory_b: extract(&pool, &pair.vessel_b, pair.timestamp, half_window),
                pair,
            }
        });

        RunReport {
            batches: acc.batches,
            skipped: acc.skipped,
            pool_size: pool.len(),
            rendezvous,
        }
    }
}
