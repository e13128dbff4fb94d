use chrono::{Duration, NaiveDateTime};

use crate::{LatLon, PositionRecord, VesselID};

/// One vessel's reports around some moment, ordered by time.
#[derive(Clone, Debug, PartialEq)]
pub struct TrajectorySegment {
    pub vessel: VesselID,
    pub center_time: NaiveDateTime,
    pub half_window: Duration,
    // Every record here belongs to `vessel` and lies in [center_time - half_window, center_time
    // + half_window]
    records: Vec<PositionRecord>,
}

impl TrajectorySegment {
    pub fn records(&self) -> &[PositionRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<PositionRecord> {
        self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn points(&self) -> Vec<(NaiveDateTime, LatLon)> {
        self.records
            .iter()
            .map(|rec| (rec.timestamp, rec.pos))
            .collect()
    }

    pub fn start_time(&self) -> NaiveDateTime {
        window_bounds(self.center_time, self.half_window).0
    }

    pub fn end_time(&self) -> NaiveDateTime {
        window_bounds(self.center_time, self.half_window).1
    }
}

// Clamps to chrono's representable range instead of overflowing
fn window_bounds(
    center_time: NaiveDateTime,
    half_window: Duration,
) -> (NaiveDateTime, NaiveDateTime) {
    (
        center_time
            .checked_sub_signed(half_window)
            .unwrap_or(NaiveDateTime::MIN),
        center_time
            .checked_add_signed(half_window)
            .unwrap_or(NaiveDateTime::MAX),
    )
}

/// All of `vessel`'s records within `half_window` of `center_time`, inclusive on both ends.
pub fn extract(
    records: &[PositionRecord],
    vessel: &VesselID,
    center_time: NaiveDateTime,
    half_window: Duration,
) -> TrajectorySegment {
    let (start, end) = window_bounds(center_time, half_window);
    let mut matches: Vec<PositionRecord> = records
        .iter()
        .filter(|rec| &rec.vessel == vessel && rec.timestamp >= start && rec.timestamp <= end)
        .cloned()
        .collect();
    // Stable, so simultaneous reports keep their pool order
    matches.sort_by_key(|rec| rec.timestamp);
    TrajectorySegment {
        vessel: vessel.clone(),
        center_time,
        half_window,
        records: matches,
    }
}
