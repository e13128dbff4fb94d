//! Finds the rendezvous in a multi-day stream of AIS position reports: the two distinct vessels
//! that came closest to each other at an exactly shared timestamp inside a circular region, plus
//! each vessel's trajectory around that moment.
//!
//! The pipeline per batch (usually one day) is `records::load` -> `region::filter` ->
//! `closest::find_closest` -> `trajectory::extract`. `aggregate::Aggregator` runs that for every
//! batch, keeps only the trajectory windows around each local winner, and picks the global
//! winner from those.

#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

mod aggregate;
mod closest;
mod distance;
mod records;
mod region;
mod trajectory;

use serde::{Deserialize, Serialize};

pub use self::aggregate::{
    Aggregator, BatchOutcome, GlobalSelection, Rendezvous, RunConfig, RunReport, SkippedBatch,
    MAX_HALF_WINDOW_MINUTES,
};
pub use self::closest::{find_closest, ClosestPair};
pub use self::distance::{distance_km, EARTH_RADIUS_KM};
pub use self::records::{load, LoadedBatch, PositionRecord, TIMESTAMP_FORMAT};
pub use self::region::{filter, RegionConfig};
pub use self::trajectory::{extract, TrajectorySegment};

/// The MMSI, kept as opaque text. Nothing does arithmetic on it.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VesselID(pub String);

impl std::fmt::Display for VesselID {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// WGS84 degrees
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Both coordinates finite and inside [-90, 90] x [-180, 180]
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lon)
    }

    pub fn dist_km(&self, other: &LatLon) -> f64 {
        distance_km(self.lat, self.lon, other.lat, other.lon)
    }
}
