use ais::{RawBatch, RawRow};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::{LatLon, VesselID};

/// How the `# Timestamp` column is written
pub const TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// One validated AIS report. Never modified after loading.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PositionRecord {
    pub timestamp: NaiveDateTime,
    pub vessel: VesselID,
    pub pos: LatLon,
    pub name: Option<String>,
}

impl PositionRecord {
    // Bitwise, so exact duplicates collapse and nothing else does. Adding 0.0 turns -0.0 into
    // 0.0.
    fn dedupe_key(&self) -> (NaiveDateTime, &VesselID, u64, u64, Option<&str>) {
        (
            self.timestamp,
            &self.vessel,
            (self.pos.lat + 0.0).to_bits(),
            (self.pos.lon + 0.0).to_bits(),
            self.name.as_deref(),
        )
    }
}

pub struct LoadedBatch {
    pub label: String,
    /// Sorted by (timestamp, vessel), with no exact duplicates
    pub records: Vec<PositionRecord>,
    /// Rows that were malformed or out of bounds, including ones the CSV layer rejected
    pub dropped: usize,
    pub duplicates: usize,
}

/// Turns raw rows into typed records. Anything that doesn't parse or has impossible coordinates
/// is dropped; real AIS feeds are noisy, so that's never an error.
pub fn load(batch: &RawBatch) -> LoadedBatch {
    let mut records = Vec::new();
    let mut dropped = batch.undecodable;
    for row in &batch.rows {
        match parse_row(row) {
            Some(rec) => records.push(rec),
            None => dropped += 1,
        }
    }

    let before = records.len();
    let records = dedupe(records);
    let duplicates = before - records.len();

    debug!(
        "{}: kept {} records, dropped {dropped} bad rows and {duplicates} duplicates",
        batch.label,
        records.len()
    );
    LoadedBatch {
        label: batch.label.clone(),
        records,
        dropped,
        duplicates,
    }
}

fn parse_row(row: &RawRow) -> Option<PositionRecord> {
    let timestamp = NaiveDateTime::parse_from_str(row.timestamp.trim(), TIMESTAMP_FORMAT).ok()?;
    let vessel = row.mmsi.trim();
    if vessel.is_empty() {
        return None;
    }
    let lat: f64 = row.latitude.trim().parse().ok()?;
    let lon: f64 = row.longitude.trim().parse().ok()?;
    let pos = LatLon::new(lat, lon);
    if !pos.is_valid() {
        return None;
    }
    let name = row
        .name
        .as_ref()
        .map(|x| x.trim())
        .filter(|x| !x.is_empty())
        .map(|x| x.to_string());

    Some(PositionRecord {
        timestamp,
        vessel: VesselID(vessel.to_string()),
        pos,
        name,
    })
}

/// Removes exact duplicates and sorts by (timestamp, vessel).
pub(crate) fn dedupe(mut records: Vec<PositionRecord>) -> Vec<PositionRecord> {
    records.sort_by(|a, b| a.dedupe_key().cmp(&b.dedupe_key()));
    records.dedup_by(|a, b| a.dedupe_key() == b.dedupe_key());
    records
}
