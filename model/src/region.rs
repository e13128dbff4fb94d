use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::{LatLon, PositionRecord};

/// A circle on the globe. Fixed for the whole run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegionConfig {
    pub center: LatLon,
    pub radius_km: f64,
}

impl Default for RegionConfig {
    fn default() -> Self {
        // Around Bornholm
        Self {
            center: LatLon::new(55.225, 14.245),
            radius_km: 50.0,
        }
    }
}

impl RegionConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.center.is_valid() {
            bail!(
                "Region center ({}, {}) isn't a valid position",
                self.center.lat,
                self.center.lon
            );
        }
        if !self.radius_km.is_finite() || self.radius_km <= 0.0 {
            bail!("Region radius must be positive, not {}", self.radius_km);
        }
        Ok(())
    }

    /// Inclusive of the boundary
    pub fn contains(&self, pos: &LatLon) -> bool {
        pos.dist_km(&self.center) <= self.radius_km
    }
}

/// Keeps only records inside the region. Order is preserved, though nothing relies on that.
pub fn filter(records: Vec<PositionRecord>, region: &RegionConfig) -> Vec<PositionRecord> {
    records
        .into_iter()
        .filter(|rec| region.contains(&rec.pos))
        .collect()
}
