//! Shared pipeline logic behind the `fit` and `project` commands.
//!
//! Load -> build horizon regressions -> fit -> (project) -> report.
//!
//! The stages borrow from each other, so a run is executed inside one call and
//! only owned outputs (tables, rendered summary, JSON payload) leave it.

use tracing::info;

use crate::domain::{CoefficientTable, ForecastTable, Frame, ResultsFile, RunConfig};
use crate::error::Result;
use crate::fit::{FitOptions, QuantileProj};
use crate::io::{read_frame_csv, write_coefficients_csv, write_forecasts_csv, write_results_json};
use crate::solver::{IrlsSolver, SolverOptions};

/// All computed outputs of a single run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub summary: String,
    pub coefficients: CoefficientTable,
    pub forecasts: Option<ForecastTable>,
    pub results: ResultsFile,
}

/// Estimation options implied by a run configuration.
pub fn fit_options(config: &RunConfig) -> FitOptions {
    FitOptions {
        alpha: config.alpha,
        solver: SolverOptions {
            max_iter: config.max_iter,
            p_tol: config.p_tol,
            tolerate_non_convergence: config.tolerate_non_convergence,
        },
        parallel: config.parallel,
    }
}

/// Load the input files named by `config` and run the pipeline on them.
pub fn run_pipeline(config: &RunConfig) -> Result<RunOutput> {
    let data = read_frame_csv(&config.data_path)?;
    let cond = config.cond_path.as_deref().map(read_frame_csv).transpose()?;
    run_on_frames(config, &data, cond.as_ref())
}

/// Run the pipeline on in-memory frames; `cond` switches projection on.
pub fn run_on_frames(config: &RunConfig, data: &Frame, cond: Option<&Frame>) -> Result<RunOutput> {
    let proj = QuantileProj::new(&config.depvar, &config.indvars, data, &config.horizons)?;
    let fit = proj.fit_with(&config.quantiles, &fit_options(config), &IrlsSolver)?;

    let forecasts = match cond {
        Some(frame) => Some(fit.project(frame)?.into_table()),
        None => None,
    };

    let summary = crate::report::format_run_summary(&fit);
    let coefficients = fit.coefficients().clone();
    let results = ResultsFile {
        tool: "qlp".to_string(),
        depvar: proj.depvar().to_string(),
        indvars: proj.indvars().to_vec(),
        horizons: proj.horizons().to_vec(),
        quantiles: fit.quantiles().to_vec(),
        alpha: fit.alpha(),
        dropped_rows: proj.dropped_rows(),
        coefficients: coefficients.rows().to_vec(),
        forecasts: forecasts.as_ref().map(|t| t.rows().to_vec()),
    };

    Ok(RunOutput {
        summary,
        coefficients,
        forecasts,
        results,
    })
}

/// Write the exports requested by `config`.
pub fn write_exports(config: &RunConfig, run: &RunOutput) -> Result<()> {
    if let Some(path) = &config.export {
        match &run.forecasts {
            Some(forecasts) => write_forecasts_csv(path, forecasts)?,
            None => write_coefficients_csv(path, &run.coefficients)?,
        }
        info!(path = %path.display(), "wrote CSV export");
    }
    if let Some(path) = &config.export_coefficients {
        write_coefficients_csv(path, &run.coefficients)?;
        info!(path = %path.display(), "wrote coefficient export");
    }
    if let Some(path) = &config.export_json {
        write_results_json(path, &run.results)?;
        info!(path = %path.display(), "wrote JSON export");
    }
    Ok(())
}
