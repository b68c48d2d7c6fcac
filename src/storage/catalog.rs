// C3: Partition Catalog. Scans a table's Hive-style directory tree
// (`<table>/<key>=<value>/*.<ext>`) and builds the in-memory inventory
// the pruner (C4) and feature extractor (C5) work from.
//
// Grounded on the teacher's `PartitionStatistics` (storage/partitioning/
// types.rs) for the per-partition record shape, rescoped to what a
// filesystem scan can actually produce (no row counts, no min/max —
// those require reading file footers, out of scope per spec §1).

use crate::error::{Result, RouterError};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// One `key=value` partition directory and the files found in it.
/// Per spec §3 every entry in a catalog shares the same partitioning
/// column — this is a single-level scan, not a multi-column tree.
#[derive(Debug, Clone)]
pub struct PartitionEntry {
    pub path: PathBuf,
    pub column: String,
    pub value: String,
    pub file_count: usize,
    pub size_bytes: u64,
    pub newest_mtime: Option<SystemTime>,
}

/// Inventory of a single table's partitions, built by one filesystem
/// scan. Immutable once built; call [`PartitionCatalog::scan`] again to
/// pick up filesystem changes.
#[derive(Debug, Clone)]
pub struct PartitionCatalog {
    pub table: String,
    pub root: PathBuf,
    /// The partitioning column name, inferred from the first
    /// `key=value` directory seen during the scan. `None` if the table
    /// root holds no partition directories at all.
    pub partition_column: Option<String>,
    pub entries: Vec<PartitionEntry>,
}

impl PartitionCatalog {
    /// Scans `<data_root>/<table>/` for `key=value` partition
    /// directories one level deep, counting files matching
    /// `extension`. Tolerant of concurrent mutation: entries that
    /// disappear mid-scan (deleted partitions, renamed files) are
    /// skipped rather than treated as a hard failure, since the catalog
    /// only has to reflect a reasonably recent state, per spec §4.3.
    pub fn scan(data_root: &str, table: &str, extension: &str) -> Result<Self> {
        let root = Path::new(data_root).join(table);
        if !root.is_dir() {
            return Err(RouterError::CatalogMissing(root.display().to_string()));
        }

        let mut entries = Vec::new();
        let mut partition_column = None;
        scan_level(&root, extension, &mut partition_column, &mut entries);

        Ok(Self {
            table: table.to_string(),
            root,
            partition_column,
            entries,
        })
    }

    pub fn total_size_bytes(&self) -> u64 {
        self.entries.iter().map(|e| e.size_bytes).sum()
    }

    pub fn total_files(&self) -> usize {
        self.entries.iter().map(|e| e.file_count).sum()
    }
}

/// Scans one level of `key=value` directories under `dir`, collecting
/// a [`PartitionEntry`] for each one holding matching data files and
/// recording the first key name seen as the catalog's partition
/// column. A directory nested inside a partition directory (a stray
/// further `key=value` level) is not descended into — spec §3 models
/// one partitioning column per table.
fn scan_level(
    dir: &Path,
    extension: &str,
    partition_column: &mut Option<String>,
    out: &mut Vec<PartitionEntry>,
) {
    let Ok(read_dir) = std::fs::read_dir(dir) else {
        return;
    };

    for dir_entry in read_dir.flatten() {
        let path = dir_entry.path();
        let Ok(file_type) = dir_entry.file_type() else {
            continue;
        };
        if !file_type.is_dir() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let Some((key, value)) = name.split_once('=') else {
            continue;
        };

        if partition_column.is_none() {
            *partition_column = Some(key.to_string());
        }

        let (file_count, size_bytes, newest_mtime) = summarize_files(&path, extension);
        if file_count > 0 {
            out.push(PartitionEntry {
                path,
                column: key.to_string(),
                value: value.to_string(),
                file_count,
                size_bytes,
                newest_mtime,
            });
        }
    }
}

fn summarize_files(dir: &Path, extension: &str) -> (usize, u64, Option<SystemTime>) {
    let Ok(read_dir) = std::fs::read_dir(dir) else {
        return (0, 0, None);
    };

    let mut count = 0usize;
    let mut size = 0u64;
    let mut newest: Option<SystemTime> = None;

    for entry in read_dir.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some(extension) {
            continue;
        }
        let Ok(metadata) = entry.metadata() else {
            continue;
        };
        if !metadata.is_file() {
            continue;
        }
        count += 1;
        size += metadata.len();
        if let Ok(mtime) = metadata.modified() {
            newest = Some(newest.map_or(mtime, |n: SystemTime| n.max(mtime)));
        }
    }

    (count, size, newest)
}
