//! Reads raw AIS position reports, one batch per daily CSV file. Nothing here interprets the
//! values; see the `model` crate for that.

#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

mod source;

use anyhow::Result;
use serde::Deserialize;

pub use source::{open, ZipBatches};

/// The header names we need. The Danish Maritime Authority dumps carry many more columns, which
/// are ignored.
pub const REQUIRED_COLUMNS: [&str; 4] = ["# Timestamp", "MMSI", "Latitude", "Longitude"];

/// One row, exactly as it appeared in the file
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct RawRow {
    #[serde(rename = "# Timestamp")]
    pub timestamp: String,
    #[serde(rename = "MMSI")]
    pub mmsi: String,
    #[serde(rename = "Latitude")]
    pub latitude: String,
    #[serde(rename = "Longitude")]
    pub longitude: String,
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
}

/// All the rows from one file, usually covering one calendar day.
#[derive(Clone, Debug)]
pub struct RawBatch {
    pub label: String,
    pub rows: Vec<RawRow>,
    /// Rows the CSV layer couldn't decode at all
    pub undecodable: usize,
}

impl RawBatch {
    pub fn new(label: impl Into<String>, rows: Vec<RawRow>) -> Self {
        Self {
            label: label.into(),
            rows,
            undecodable: 0,
        }
    }
}

/// Decodes one CSV file. A missing required column or an I/O failure fails the whole batch;
/// individual broken rows are just counted.
pub fn read_batch<R: std::io::Read>(label: impl Into<String>, reader: R) -> Result<RawBatch> {
    let label = label.into();
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = reader
        .headers()
        .map_err(|err| anyhow!("{label}: can't read header: {err}"))?
        .clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            bail!("{label}: missing column {column:?}");
        }
    }

    let mut rows: Vec<RawRow> = Vec::new();
    let mut undecodable = 0;
    for rec in reader.deserialize() {
        match rec {
            Ok(row) => rows.push(row),
            Err(err) => {
                if let csv::ErrorKind::Io(_) = err.kind() {
                    bail!("{label}: {err}");
                }
                undecodable += 1;
                debug!("{label}: skipping row: {err}");
            }
        }
    }
    if undecodable > 0 {
        warn!("{label}: {undecodable} rows couldn't be decoded");
    }

    Ok(RawBatch {
        label,
        rows,
        undecodable,
    })
}
