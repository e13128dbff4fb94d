use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{PositionRecord, VesselID};

/// The closest same-timestamp pairing of two different vessels found in some set of records.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClosestPair {
    /// Always sorts before `vessel_b`, regardless of which record was seen first
    pub vessel_a: VesselID,
    pub vessel_b: VesselID,
    pub timestamp: NaiveDateTime,
    pub distance_km: f64,
}

impl ClosestPair {
    fn new(a: &PositionRecord, b: &PositionRecord) -> Self {
        let (first, second) = if a.vessel <= b.vessel { (a, b) } else { (b, a) };
        Self {
            vessel_a: first.vessel.clone(),
            vessel_b: second.vessel.clone(),
            timestamp: a.timestamp,
            distance_km: first.pos.dist_km(&second.pos),
        }
    }

    /// Total order used to pick a winner: smallest distance, then earliest timestamp, then the
    /// vessel IDs lexically. Two pairs that compare `Equal` here are indistinguishable, so the
    /// result of a min over this order never depends on the order candidates are visited in.
    pub fn rank(&self, other: &ClosestPair) -> Ordering {
        self.distance_km
            .total_cmp(&other.distance_km)
            .then_with(|| self.timestamp.cmp(&other.timestamp))
            .then_with(|| self.vessel_a.cmp(&other.vessel_a))
            .then_with(|| self.vessel_b.cmp(&other.vessel_b))
    }

    /// The better of two candidates by `rank`
    pub fn best(self, other: ClosestPair) -> ClosestPair {
        if other.rank(&self) == Ordering::Less {
            other
        } else {
            self
        }
    }

    pub fn involves(&self, vessel: &VesselID) -> bool {
        &self.vessel_a == vessel || &self.vessel_b == vessel
    }
}

/// Finds the globally closest pair of distinct vessels reporting at exactly the same timestamp.
/// None if no timestamp has reports from at least two different vessels.
///
/// Every group of k records sharing a timestamp costs O(k^2) distance calculations, so this is
/// only reasonable after region filtering has kept groups small. Groups are evaluated in
/// parallel and combined with `ClosestPair::best`, which is commutative and associative.
pub fn find_closest(records: &[PositionRecord]) -> Option<ClosestPair> {
    let mut per_timestamp: BTreeMap<NaiveDateTime, Vec<&PositionRecord>> = BTreeMap::new();
    for rec in records {
        per_timestamp
            .entry(rec.timestamp)
            .or_insert_with(Vec::new)
            .push(rec);
    }

    let comparisons: usize = per_timestamp
        .values()
        .map(|group| group.len() * group.len().saturating_sub(1) / 2)
        .sum();
    debug!(
        "Comparing {} records in {} timestamp groups, at most {comparisons} pairs",
        records.len(),
        per_timestamp.len()
    );

    per_timestamp
        .into_par_iter()
        .filter_map(|(_, group)| closest_in_group(&group))
        .reduce_with(ClosestPair::best)
}

// Self-join within one timestamp. Each unordered pair of records is visited once; ClosestPair
// puts the vessels in canonical order, so (A, B) and (B, A) are the same candidate anyway.
fn closest_in_group(group: &[&PositionRecord]) -> Option<ClosestPair> {
    let mut best: Option<ClosestPair> = None;
    for (idx, a) in group.iter().enumerate() {
        for b in &group[idx + 1..] {
            // Also covers a record paired with a copy of itself
            if a.vessel == b.vessel {
                continue;
            }
            let candidate = ClosestPair::new(a, b);
            best = Some(match best {
                Some(current) => current.best(candidate),
                None => candidate,
            });
        }
    }
    best
}
