#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

mod render;
mod settings;

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use structopt::StructOpt;

use model::{Aggregator, GlobalSelection, RunReport};

use self::settings::Settings;

/// Finds the two vessels that came closest to each other inside a region, across many days of
/// AIS data, and writes both trajectories around that moment as GeoJSON.
#[derive(StructOpt)]
#[structopt(name = "rendezvous")]
struct Args {
    /// A .zip of daily CSV files, a directory of them, or a single CSV file
    #[structopt(parse(from_os_str))]
    input: PathBuf,
    /// A JSON file with any of center_lat, center_lon, radius_km, window_minutes, selection.
    /// Flags below override it.
    #[structopt(long, parse(from_os_str))]
    config: Option<PathBuf>,
    /// Latitude of the region's center
    #[structopt(long, allow_hyphen_values = true)]
    center_lat: Option<f64>,
    /// Longitude of the region's center
    #[structopt(long, allow_hyphen_values = true)]
    center_lon: Option<f64>,
    /// Radius of the region in kilometers
    #[structopt(long)]
    radius_km: Option<f64>,
    /// Trajectories cover this many minutes before and after the rendezvous
    #[structopt(long)]
    window_minutes: Option<i64>,
    /// Use the best per-day winner, instead of searching the retained trajectories again
    #[structopt(long)]
    trust_batch_winners: bool,
    /// Process all files at once. Holds every file in memory.
    #[structopt(long)]
    parallel: bool,
    /// Where to write the trajectories
    #[structopt(long, default_value = "vessel_trajectories.geojson", parse(from_os_str))]
    output: PathBuf,
}

impl Args {
    fn settings(&self) -> Result<Settings> {
        let file = match self.config {
            Some(ref path) => Settings::load(path)?,
            None => Settings::default(),
        };
        let flags = Settings {
            center_lat: self.center_lat,
            center_lon: self.center_lon,
            radius_km: self.radius_km,
            window_minutes: self.window_minutes,
            selection: if self.trust_batch_winners {
                Some(GlobalSelection::TrustBatchWinners)
            } else {
                None
            },
        };
        Ok(file.with_overrides(flags))
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::from_args();
    let aggregator = Aggregator::new(args.settings()?.to_run_config()?)?;
    let region = &aggregator.config().region;
    info!(
        "Looking within {}km of ({}, {})",
        region.radius_km, region.center.lat, region.center.lon
    );

    let batches = ais::open(&args.input)?;
    let report = if args.parallel {
        aggregator.run_parallel(batches.collect())
    } else {
        aggregator.run(batches)
    };

    summarize(&mut std::io::stdout().lock(), &report)?;
    if let Some(ref rendezvous) = report.rendezvous {
        render::write_geojson(&args.output, rendezvous, region)?;
        info!("Wrote trajectories to {}", args.output.display());
    }
    Ok(())
}

fn summarize<W: Write>(out: &mut W, report: &RunReport) -> Result<()> {
    for skipped in &report.skipped {
        writeln!(out, "Skipped input #{}: {}", skipped.index + 1, skipped.error)?;
    }
    match report.rendezvous {
        Some(ref rendezvous) => {
            let pair = &rendezvous.pair;
            writeln!(out, "Two closest vessels: {} and {}", pair.vessel_a, pair.vessel_b)?;
            writeln!(
                out,
                "{:.3}km apart at {}, out of {} files",
                pair.distance_km,
                pair.timestamp.format(model::TIMESTAMP_FORMAT),
                report.batches.len()
            )?;
        }
        None => {
            writeln!(out, "No rendezvous found in {} files", report.batches.len())?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use ais::{RawBatch, RawRow};
    use model::RunConfig;

    use super::*;

    fn summary(report: &RunReport) -> String {
        let mut out = Vec::new();
        summarize(&mut out, report).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn row(mmsi: &str, lat: f64) -> RawRow {
        RawRow {
            timestamp: "01/12/2021 12:00:00".to_string(),
            mmsi: mmsi.to_string(),
            latitude: lat.to_string(),
            longitude: "14.245".to_string(),
            name: None,
        }
    }

    #[test]
    fn test_summary_without_rendezvous() {
        let aggregator = Aggregator::new(RunConfig::default()).unwrap();
        let report = aggregator.run(vec![
            Ok(RawBatch::new("day1", vec![row("1", 55.2)])),
            Err(anyhow!("day2.csv: missing column \"MMSI\"")),
        ]);
        assert_eq!(
            summary(&report),
            "Skipped input #2: day2.csv: missing column \"MMSI\"\nNo rendezvous found in 1 files\n"
        );
    }

    #[test]
    fn test_summary_with_rendezvous() {
        let aggregator = Aggregator::new(RunConfig::default()).unwrap();
        let report = aggregator.run(vec![Ok(RawBatch::new(
            "day1",
            vec![row("2", 55.2), row("1", 55.21)],
        ))]);
        let text = summary(&report);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Two closest vessels: 1 and 2");
        assert!(lines[1].starts_with("1.112km apart at 01/12/2021 12:00:00"));
    }
}
