use std::io::{Read, Seek};
use std::path::Path;

use anyhow::Result;
use zip::ZipArchive;

use crate::{read_batch, RawBatch};

/// Lazily yields one batch per CSV file found at `path`, which may be a .zip archive, a
/// directory, or a single CSV file. Files are visited in name order. A file that can't be read
/// shows up as an `Err` in its place, so callers can skip it and keep going.
pub fn open(path: &Path) -> Result<Box<dyn Iterator<Item = Result<RawBatch>>>> {
    if path.is_dir() {
        let mut paths = Vec::new();
        for entry in fs_err::read_dir(path)? {
            let entry_path = entry?.path();
            if entry_path.is_file() && is_csv(&entry_path.to_string_lossy()) {
                paths.push(entry_path);
            }
        }
        paths.sort();
        info!("Found {} CSV files in {}", paths.len(), path.display());
        return Ok(Box::new(paths.into_iter().map(|p| read_file(&p))));
    }

    let is_zip = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("zip"))
        .unwrap_or(false);
    if is_zip {
        let batches = ZipBatches::new(fs_err::File::open(path)?)
            .map_err(|err| anyhow!("{}: {err}", path.display()))?;
        info!("Found {} CSV files in {}", batches.len(), path.display());
        return Ok(Box::new(batches));
    }

    let path = path.to_path_buf();
    Ok(Box::new(std::iter::once_with(move || read_file(&path))))
}

fn read_file(path: &Path) -> Result<RawBatch> {
    let label = path
        .file_name()
        .map(|x| x.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());
    read_batch(label, fs_err::File::open(path)?)
}

fn is_csv(name: &str) -> bool {
    name.to_ascii_lowercase().ends_with(".csv")
}

/// Every CSV entry of a zip archive, decompressed one at a time.
pub struct ZipBatches<R> {
    archive: ZipArchive<R>,
    names: Vec<String>,
    next: usize,
}

impl<R: Read + Seek> ZipBatches<R> {
    pub fn new(reader: R) -> Result<Self> {
        let archive = ZipArchive::new(reader)?;
        let mut names: Vec<String> = archive
            .file_names()
            .filter(|name| !name.ends_with('/') && is_csv(name))
            .map(|name| name.to_string())
            .collect();
        names.sort();
        Ok(Self {
            archive,
            names,
            next: 0,
        })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    fn read_entry(&mut self, name: &str) -> Result<RawBatch> {
        let file = self
            .archive
            .by_name(name)
            .map_err(|err| anyhow!("{name}: {err}"))?;
        // Labels shouldn't depend on how the archive was packed
        let label = name.rsplit('/').next().unwrap_or(name).to_string();
        read_batch(label, file)
    }
}

impl<R: Read + Seek> Iterator for ZipBatches<R> {
    type Item = Result<RawBatch>;

    fn next(&mut self) -> Option<Self::Item> {
        let name = self.names.get(self.next)?.clone();
        self.next += 1;
        Some(self.read_entry(&name))
    }
}
