//! Checkpoints of the best policy seen so far
//!
//! Each save writes a binary record `gen_NNNN_best.ckpt` (named after the
//! generation it was saved at) plus a human-readable `best.ron` summary
//! under `<output_dir>/checkpoints`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Persisted best policy of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointRecord {
    pub generation_index: usize,
    pub best_fitness: f64,
    /// Opaque policy encoding from the population
    pub policy_blob: Vec<u8>,
}

/// Contents of `best.ron`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointSummary {
    pub saved_at: usize,
    pub generation_index: usize,
    pub best_fitness: f64,
    pub pipes_passed: u32,
    pub blob_len: usize,
    pub file: String,
}

pub struct CheckpointStore {
    dir: PathBuf,
}

impl CheckpointStore {
    pub fn new(output_dir: impl AsRef<Path>) -> Self {
        Self {
            dir: output_dir.as_ref().join("checkpoints"),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, generation_index: usize) -> PathBuf {
        self.dir
            .join(format!("gen_{:04}_best.ckpt", generation_index))
    }

    /// Write `record` at generation `saved_at` and refresh the summary,
    /// returning the record's path
    pub fn save(
        &self,
        saved_at: usize,
        record: &CheckpointRecord,
        pipes_passed: u32,
    ) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir).context("Failed to create checkpoint directory")?;

        let path = self.path_for(saved_at);
        let data = bincode_next::serde::encode_to_vec(record, bincode_next::config::standard())
            .context("Failed to serialize checkpoint")?;
        std::fs::write(&path, data).context("Failed to write checkpoint file")?;

        let summary = CheckpointSummary {
            saved_at,
            generation_index: record.generation_index,
            best_fitness: record.best_fitness,
            pipes_passed,
            blob_len: record.policy_blob.len(),
            file: path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
        };
        let text = ron::ser::to_string_pretty(&summary, ron::ser::PrettyConfig::default())
            .context("Failed to serialize checkpoint summary")?;
        std::fs::write(self.dir.join("best.ron"), text)
            .context("Failed to write checkpoint summary")?;

        log::info!(
            "Saved checkpoint {} (fitness {:.2})",
            path.display(),
            record.best_fitness
        );
        Ok(path)
    }

    pub fn load(path: &Path) -> Result<CheckpointRecord> {
        let data = std::fs::read(path)
            .with_context(|| format!("Failed to read checkpoint {}", path.display()))?;
        let (record, _): (CheckpointRecord, usize) =
            bincode_next::serde::decode_from_slice(&data, bincode_next::config::standard())
                .map_err(|e| anyhow::anyhow!("Failed to deserialize checkpoint: {:?}", e))?;
        Ok(record)
    }

    pub fn load_summary(&self) -> Result<CheckpointSummary> {
        let path = self.dir.join("best.ron");
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        ron::from_str(&text).context("Failed to parse checkpoint summary")
    }
}

/// Cumulative best over a run; never gets worse
#[derive(Debug, Default)]
pub struct BestTracker {
    best: Option<CheckpointRecord>,
    pipes_passed: u32,
}

impl BestTracker {
    /// Replace the best if `fitness` beats it, returning whether it did
    ///
    /// `blob` is only called on improvement.
    pub fn offer(
        &mut self,
        generation_index: usize,
        fitness: f64,
        pipes_passed: u32,
        blob: impl FnOnce() -> Result<Vec<u8>>,
    ) -> Result<bool> {
        if self.best.as_ref().is_some_and(|b| fitness <= b.best_fitness) {
            return Ok(false);
        }
        self.best = Some(CheckpointRecord {
            generation_index,
            best_fitness: fitness,
            policy_blob: blob()?,
        });
        self.pipes_passed = pipes_passed;
        Ok(true)
    }

    pub fn best(&self) -> Option<&CheckpointRecord> {
        self.best.as_ref()
    }

    pub fn best_fitness(&self) -> Option<f64> {
        self.best.as_ref().map(|b| b.best_fitness)
    }

    /// Pipes passed by the current best
    pub fn pipes_passed(&self) -> u32 {
        self.pipes_passed
    }
}
