//! Local snapshot cache
//!
//! One JSON file per collection under a cache directory, so repeated site
//! builds can skip the API entirely. The cache is all-or-nothing: if any
//! file is missing or unreadable the whole directory is wiped and the
//! caller falls back to a fresh fetch.

use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::api::{RawTables, Result};
use offerbook_core::RawRows;

const APPLICANTS_FILE: &str = "applicants.json";
const DATAPOINTS_FILE: &str = "datapoints.json";
const PROGRAMS_FILE: &str = "programs.json";
const MAJORS_FILE: &str = "majors.json";

/// On-disk cache of one raw snapshot.
#[derive(Debug, Clone)]
pub struct SnapshotCache {
    dir: PathBuf,
}

impl SnapshotCache {
    /// Cache rooted at `dir`. Nothing is touched until load or save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        SnapshotCache { dir: dir.into() }
    }

    /// Directory this cache lives in.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Load the cached snapshot, or `None` when there is no usable cache.
    /// A partially-readable cache is wiped before returning `None`.
    pub fn load(&self) -> Option<RawTables> {
        if !self.dir.is_dir() {
            return None;
        }
        match self.try_load() {
            Ok(tables) => {
                info!("loaded snapshot from cache at {}", self.dir.display());
                Some(tables)
            }
            Err(err) => {
                warn!("discarding unreadable cache: {}", err);
                if let Err(err) = fs::remove_dir_all(&self.dir) {
                    warn!("failed to wipe cache directory: {}", err);
                }
                None
            }
        }
    }

    fn try_load(&self) -> Result<RawTables> {
        Ok(RawTables {
            applicants: self.read_rows(APPLICANTS_FILE)?,
            datapoints: self.read_rows(DATAPOINTS_FILE)?,
            programs: self.read_rows(PROGRAMS_FILE)?,
            majors: self.read_rows(MAJORS_FILE)?,
        })
    }

    fn read_rows(&self, file_name: &str) -> Result<RawRows> {
        let text = fs::read_to_string(self.dir.join(file_name))?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Write the snapshot, creating the directory as needed.
    pub fn save(&self, tables: &RawTables) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        self.write_rows(APPLICANTS_FILE, &tables.applicants)?;
        self.write_rows(DATAPOINTS_FILE, &tables.datapoints)?;
        self.write_rows(PROGRAMS_FILE, &tables.programs)?;
        self.write_rows(MAJORS_FILE, &tables.majors)?;
        Ok(())
    }

    fn write_rows(&self, file_name: &str, rows: &RawRows) -> Result<()> {
        let text = serde_json::to_string(rows)?;
        fs::write(self.dir.join(file_name), text)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_tables() -> RawTables {
        let mut tables = RawTables::default();
        tables
            .applicants
            .insert("a1".into(), json!({"ID": "A-1", "GPA": 3.5}));
        tables.datapoints.insert("d1".into(), json!({"Year": 2024}));
        tables
            .programs
            .insert("p1".into(), json!({"School": "MIT"}));
        tables.majors.insert("m1".into(), json!({"Major": "CS"}));
        tables
    }

    #[test]
    fn test_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = SnapshotCache::new(tmp.path().join("snapshot"));

        assert!(cache.load().is_none());

        let tables = sample_tables();
        cache.save(&tables).unwrap();
        let loaded = cache.load().expect("cache should load");

        assert_eq!(loaded.applicants, tables.applicants);
        assert_eq!(loaded.datapoints, tables.datapoints);
        assert_eq!(loaded.programs, tables.programs);
        assert_eq!(loaded.majors, tables.majors);
    }

    #[test]
    fn test_corrupt_cache_is_wiped() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("snapshot");
        let cache = SnapshotCache::new(&dir);
        cache.save(&sample_tables()).unwrap();

        fs::write(dir.join(DATAPOINTS_FILE), "not json").unwrap();

        assert!(cache.load().is_none());
        assert!(!dir.exists());
    }

    #[test]
    fn test_missing_file_is_a_miss() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("snapshot");
        let cache = SnapshotCache::new(&dir);
        cache.save(&sample_tables()).unwrap();

        fs::remove_file(dir.join(MAJORS_FILE)).unwrap();

        assert!(cache.load().is_none());
    }
}
