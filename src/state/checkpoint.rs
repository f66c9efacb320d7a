//! Region work list and completed-regions checkpoint
//!
//! Both files are UTF-8 JSON objects `region_name -> entry_url`, rewritten in
//! full on every update. Writes go to a sibling temporary file that is then
//! renamed over the target, so a reader never sees a torn file.

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors reading or writing checkpoint files
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },

    #[error("Malformed JSON in {path}: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },
}

pub type CheckpointResult<T> = Result<T, CheckpointError>;

/// One region of the work list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionCheckpoint {
    pub region_name: String,
    pub entry_url: String,
}

impl RegionCheckpoint {
    pub fn new(region_name: impl Into<String>, entry_url: impl Into<String>) -> Self {
        Self {
            region_name: region_name.into(),
            entry_url: entry_url.into(),
        }
    }
}

/// The resume set: regions whose pagination chain was fully walked
#[derive(Debug, Clone, Default)]
pub struct CompletedRegions {
    regions: IndexMap<String, String>,
}

impl CompletedRegions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, region_name: &str) -> bool {
        self.regions.contains_key(region_name)
    }

    pub fn mark_completed(&mut self, region: &RegionCheckpoint) {
        self.regions
            .insert(region.region_name.clone(), region.entry_url.clone());
    }

    pub fn entry_url(&self, region_name: &str) -> Option<&str> {
        self.regions.get(region_name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

/// Reads and writes the two checkpoint files
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    regions_path: PathBuf,
    completed_path: PathBuf,
}

impl CheckpointStore {
    pub fn new(regions_path: impl Into<PathBuf>, completed_path: impl Into<PathBuf>) -> Self {
        Self {
            regions_path: regions_path.into(),
            completed_path: completed_path.into(),
        }
    }

    /// Loads the full work list in file order
    pub fn load_regions(&self) -> CheckpointResult<Vec<RegionCheckpoint>> {
        let regions: IndexMap<String, String> = read_json(&self.regions_path)?;
        Ok(regions
            .iter()
            .map(|(name, url)| RegionCheckpoint::new(name, url.as_str()))
            .collect())
    }

    /// Replaces the work list
    pub fn write_regions(&self, regions: &[RegionCheckpoint]) -> CheckpointResult<()> {
        let map: IndexMap<String, String> = regions
            .iter()
            .map(|r| (r.region_name.clone(), r.entry_url.clone()))
            .collect();
        write_json_atomic(&self.regions_path, &map)
    }

    /// Loads the completed set; a missing file means nothing is completed yet
    pub fn load_completed(&self) -> CheckpointResult<CompletedRegions> {
        if !self.completed_path.exists() {
            tracing::info!(
                "No checkpoint at {}, starting with no completed regions",
                self.completed_path.display()
            );
            return Ok(CompletedRegions::new());
        }

        let regions = read_json(&self.completed_path)?;
        Ok(CompletedRegions { regions })
    }

    /// Rewrites the completed set
    pub fn persist_completed(&self, completed: &CompletedRegions) -> CheckpointResult<()> {
        write_json_atomic(&self.completed_path, &completed.regions)?;
        tracing::debug!(
            "Persisted {} completed regions to {}",
            completed.len(),
            self.completed_path.display()
        );
        Ok(())
    }

    pub fn regions_path(&self) -> &Path {
        &self.regions_path
    }

    pub fn completed_path(&self) -> &Path {
        &self.completed_path
    }
}

/// Loads the `region_name -> state` lookup used to fill location records
pub fn load_region_states(path: &Path) -> CheckpointResult<IndexMap<String, String>> {
    read_json(path)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> CheckpointResult<T> {
    let content = std::fs::read_to_string(path).map_err(|source| CheckpointError::Read {
        path: path.display().to_string(),
        source,
    })?;

    serde_json::from_str(&content).map_err(|source| CheckpointError::Json {
        path: path.display().to_string(),
        source,
    })
}

fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> CheckpointResult<()> {
    let write_err = |source: std::io::Error| CheckpointError::Write {
        path: path.display().to_string(),
        source,
    };

    let json = serde_json::to_string_pretty(value).map_err(|source| CheckpointError::Json {
        path: path.display().to_string(),
        source,
    })?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "checkpoint".to_string());
    let tmp_path = path.with_file_name(format!(".{}.tmp", file_name));

    std::fs::write(&tmp_path, json).map_err(write_err)?;
    std::fs::rename(&tmp_path, path).map_err(write_err)?;
    Ok(())
}
