use std::path::Path;

use anyhow::Result;
use serde::Deserialize;

use model::{GlobalSelection, LatLon, RegionConfig, RunConfig, MAX_HALF_WINDOW_MINUTES};

/// Everything is optional; anything missing falls back to `RunConfig::default()`.
#[derive(Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub center_lat: Option<f64>,
    pub center_lon: Option<f64>,
    pub radius_km: Option<f64>,
    pub window_minutes: Option<i64>,
    pub selection: Option<GlobalSelection>,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs_err::read(path)?;
        serde_json::from_slice(&bytes)
            .map_err(|err| anyhow!("{}: bad settings: {err}", path.display()))
    }

    /// Anything set in `flags` wins over this.
    pub fn with_overrides(self, flags: Settings) -> Settings {
        Settings {
            center_lat: flags.center_lat.or(self.center_lat),
            center_lon: flags.center_lon.or(self.center_lon),
            radius_km: flags.radius_km.or(self.radius_km),
            window_minutes: flags.window_minutes.or(self.window_minutes),
            selection: flags.selection.or(self.selection),
        }
    }

    pub fn to_run_config(&self) -> Result<RunConfig> {
        let defaults = RunConfig::default();
        let half_window = match self.window_minutes {
            Some(minutes) => {
                // Checked here, since chrono panics on durations it can't represent
                if !(0..=MAX_HALF_WINDOW_MINUTES).contains(&minutes) {
                    bail!("window_minutes must be 0 to {MAX_HALF_WINDOW_MINUTES}, not {minutes}");
                }
                chrono::Duration::minutes(minutes)
            }
            None => defaults.half_window,
        };
        Ok(RunConfig {
            region: RegionConfig {
                center: LatLon::new(
                    self.center_lat.unwrap_or(defaults.region.center.lat),
                    self.center_lon.unwrap_or(defaults.region.center.lon),
                ),
                radius_km: self.radius_km.unwrap_or(defaults.region.radius_km),
            },
            half_window,
            selection: self.selection.unwrap_or(defaults.selection),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        assert_eq!(
            Settings::default().to_run_config().unwrap(),
            RunConfig::default()
        );
        let config = RunConfig::default();
        assert_eq!(config.region.center, LatLon::new(55.225, 14.245));
        assert_eq!(config.region.radius_km, 50.0);
        assert_eq!(config.half_window, chrono::Duration::minutes(10));
    }

    #[test]
    fn test_partial_file() {
        let settings: Settings =
            serde_json::from_str(r#"{"radius_km": 20, "selection": "trust_batch_winners"}"#)
                .unwrap();
        let config = settings.to_run_config().unwrap();
        assert_eq!(config.region.radius_km, 20.0);
        assert_eq!(config.region.center, LatLon::new(55.225, 14.245));
        assert_eq!(config.selection, GlobalSelection::TrustBatchWinners);
    }

    #[test]
    fn test_typos_rejected() {
        assert!(serde_json::from_str::<Settings>(r#"{"radius": 20}"#).is_err());
    }

    #[test]
    fn test_flags_override_file() {
        let file: Settings = serde_json::from_str(
            r#"{"center_lat": 56.0, "radius_km": 20, "window_minutes": 5,
                "selection": "rederive"}"#,
        )
        .unwrap();
        let flags = Settings {
            radius_km: Some(75.0),
            selection: Some(GlobalSelection::TrustBatchWinners),
            ..Settings::default()
        };
        let config = file.with_overrides(flags).to_run_config().unwrap();
        assert_eq!(config.region.radius_km, 75.0);
        assert_eq!(config.selection, GlobalSelection::TrustBatchWinners);
        // Untouched by flags
        assert_eq!(config.region.center, LatLon::new(56.0, 14.245));
        assert_eq!(config.half_window, chrono::Duration::minutes(5));
    }

    #[test]
    fn test_window_out_of_range() {
        for minutes in [-1, MAX_HALF_WINDOW_MINUTES + 1, 10_000_000_000_000_000] {
            let settings = Settings {
                window_minutes: Some(minutes),
                ..Settings::default()
            };
            assert!(settings.to_run_config().is_err(), "{minutes}");
        }
        let settings = Settings {
            window_minutes: Some(MAX_HALF_WINDOW_MINUTES),
            ..Settings::default()
        };
        assert!(settings.to_run_config().is_ok());
    }
}
