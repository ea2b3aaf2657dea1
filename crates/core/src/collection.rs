//! On-disk layout of a persisted collection.
//!
//! ```text
//! <index_path>/
//!   records.json   every EmbeddingRecord, in insertion order
//!   manifest.json  IndexManifest, written last
//! ```
//!
//! The manifest is the commit marker: a directory without one is treated as
//! no index at all.

use crate::{EmbeddingRecord, IndexError, IndexManifest};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE: &str = "manifest.json";
pub const RECORDS_FILE: &str = "records.json";

pub fn manifest_path(root: &Path) -> PathBuf {
    root.join(MANIFEST_FILE)
}

pub fn records_path(root: &Path) -> PathBuf {
    root.join(RECORDS_FILE)
}

pub fn exists(root: &Path) -> bool {
    manifest_path(root).is_file()
}

pub fn read_manifest(root: &Path) -> Result<IndexManifest, IndexError> {
    let reader = BufReader::new(File::open(manifest_path(root))?);
    Ok(serde_json::from_reader(reader)?)
}

pub fn read_records(root: &Path) -> Result<Vec<EmbeddingRecord>, IndexError> {
    let reader = BufReader::new(File::open(records_path(root))?);
    Ok(serde_json::from_reader(reader)?)
}

pub fn write(
    root: &Path,
    manifest: &IndexManifest,
    records: &[EmbeddingRecord],
) -> Result<(), IndexError> {
    fs::create_dir_all(root)?;

    let mut writer = BufWriter::new(File::create(records_path(root))?);
    serde_json::to_writer(&mut writer, records)?;
    writer.flush()?;

    let mut writer = BufWriter::new(File::create(manifest_path(root))?);
    serde_json::to_writer_pretty(&mut writer, manifest)?;
    writer.flush()?;
    Ok(())
}

/// Deletes the whole tree at `root`, if any.
pub fn destroy(root: &Path) -> Result<(), IndexError> {
    match fs::remove_dir_all(root) {
        Ok(()) => Ok(()),
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(error) => Err(IndexError::Filesystem(error)),
    }
}
