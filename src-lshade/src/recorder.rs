use std::fs::create_dir_all;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use crate::error::Result;
use crate::solver::{CallbackAction, GenerationSnapshot};
use crate::Callback;

/// Records optimization progress via the generation callback
#[derive(Debug, Clone)]
pub struct GenerationRecorder {
    /// Function name (used for CSV filename)
    function_name: String,
    /// Shared records storage
    records: Arc<Mutex<Vec<GenerationRecord>>>,
}

/// Summary of one generation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationRecord {
    pub generation: usize,
    pub nfev: usize,
    pub population_size: usize,
    /// Best fitness over the whole run so far
    pub best_fitness: f64,
    /// Minimum fitness of this generation's population
    pub current_min: f64,
    /// Number of trials that replaced their parent
    pub successes: usize,
    pub archive_size: usize,
    pub memory_cursor: usize,
    pub mean_memory_cr: f64,
    pub mean_memory_f: f64,
    pub countdown: usize,
}

impl GenerationRecord {
    pub fn from_snapshot(snapshot: &GenerationSnapshot<'_>) -> Self {
        Self {
            generation: snapshot.generation,
            nfev: snapshot.nfev,
            population_size: snapshot.population.nrows(),
            best_fitness: snapshot.best_fitness,
            current_min: snapshot.current_min(),
            successes: snapshot.success_indexes.len(),
            archive_size: snapshot.archive.len(),
            memory_cursor: snapshot.memory_cursor,
            mean_memory_cr: snapshot.memory_cr.mean().unwrap_or(f64::NAN),
            mean_memory_f: snapshot.memory_f.mean().unwrap_or(f64::NAN),
            countdown: snapshot.countdown,
        }
    }
}

impl GenerationRecorder {
    /// Create a new recorder for the given function
    pub fn new(function_name: impl Into<String>) -> Self {
        Self { function_name: function_name.into(), records: Arc::new(Mutex::new(Vec::new())) }
    }

    pub fn function_name(&self) -> &str {
        &self.function_name
    }

    /// Create a callback that appends one record per generation and never stops the run
    pub fn create_callback(&self) -> Callback {
        let records = self.records.clone();
        Box::new(move |snapshot: &GenerationSnapshot<'_>| -> CallbackAction {
            records.lock().push(GenerationRecord::from_snapshot(snapshot));
            CallbackAction::Continue
        })
    }

    /// Write all records to `<output_dir>/<function_name>.csv`, returning the path
    pub fn save_to_csv(&self, output_dir: impl AsRef<Path>) -> Result<PathBuf> {
        let output_dir = output_dir.as_ref();
        create_dir_all(output_dir)?;
        let path = output_dir.join(format!("{}.csv", self.function_name));

        let mut writer = csv::Writer::from_path(&path)?;
        for record in self.records.lock().iter() {
            writer.serialize(record)?;
        }
        writer.flush()?;
        Ok(path)
    }

    /// Get a copy of all recorded generations
    pub fn get_records(&self) -> Vec<GenerationRecord> {
        self.records.lock().clone()
    }

    pub fn num_generations(&self) -> usize {
        self.records.lock().len()
    }

    pub fn clear(&self) {
        self.records.lock().clear();
    }

    /// Last record, if any generation completed
    pub fn last(&self) -> Option<GenerationRecord> {
        self.records.lock().last().cloned()
    }
}
