//! Recording wrapper around [`lshade`](crate::minimize::lshade) for benchmarking and analysis

use std::path::{Path, PathBuf};

use log::info;
use ndarray::Array1;

use crate::error::Result;
use crate::minimize::lshade;
use crate::recorder::GenerationRecorder;
use crate::{LShadeConfig, LShadeReport};

/// Run L-SHADE with one CSV row per generation.
///
/// Any callback already present in `config` is replaced by the recorder's.
/// Returns the report and the path of `<output_dir>/<function_name>.csv`.
pub fn run_recorded_lshade<F>(
    function_name: &str,
    func: &F,
    bounds: &[(f64, f64)],
    mut config: LShadeConfig,
    output_dir: impl AsRef<Path>,
) -> Result<(LShadeReport, PathBuf)>
where
    F: Fn(&Array1<f64>) -> f64 + Sync,
{
    let recorder = GenerationRecorder::new(function_name);
    config.callback = Some(recorder.create_callback());

    let report = lshade(func, bounds, config)?;
    let csv_path = recorder.save_to_csv(output_dir)?;
    info!(
        "{}: {} generations recorded to {}",
        function_name,
        recorder.num_generations(),
        csv_path.display()
    );

    Ok((report, csv_path))
}
