//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - runs the fit / projection pipeline
//! - prints reports
//! - writes optional exports

use clap::Parser;
use tracing::info;

use crate::cli::{Command, FitArgs, ProjectArgs, SimulateArgs};
use crate::data::{SampleConfig, generate_sample};
use crate::domain::RunConfig;
use crate::error::Result;

pub mod pipeline;

/// Entry point for the `qlp` binary.
pub fn run() -> Result<()> {
    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::Fit(args) => handle_fit(&args),
        Command::Project(args) => handle_project(&args),
        Command::Simulate(args) => handle_simulate(&args),
    }
}

fn handle_fit(args: &FitArgs) -> Result<()> {
    let config = run_config_from_args(args);
    let run = pipeline::run_pipeline(&config)?;

    print!("{}", run.summary);
    println!("{}", crate::report::format_coefficients(&run.coefficients));

    pipeline::write_exports(&config, &run)
}

fn handle_project(args: &ProjectArgs) -> Result<()> {
    let mut config = run_config_from_args(&args.fit);
    config.cond_path = Some(args.cond.clone());
    config.export_coefficients = args.export_coefficients.clone();
    let run = pipeline::run_pipeline(&config)?;

    print!("{}", run.summary);
    if let Some(forecasts) = &run.forecasts {
        println!("{}", crate::report::format_forecasts(forecasts));
    }

    pipeline::write_exports(&config, &run)
}

fn handle_simulate(args: &SimulateArgs) -> Result<()> {
    let frame = generate_sample(&SampleConfig {
        rows: args.rows,
        seed: args.seed,
        missing_rate: args.missing_rate,
    })?;
    crate::io::write_frame_csv(&args.out, &frame)?;
    info!(path = %args.out.display(), rows = frame.n_rows(), "wrote synthetic dataset");
    Ok(())
}

pub fn run_config_from_args(args: &FitArgs) -> RunConfig {
    RunConfig {
        data_path: args.data.clone(),
        depvar: args.depvar.clone(),
        indvars: args.indvars.clone(),
        horizons: args.horizons.clone(),
        quantiles: args.quantiles.clone(),
        alpha: args.alpha,
        max_iter: args.max_iter,
        p_tol: args.p_tol,
        tolerate_non_convergence: !args.strict_convergence,
        parallel: !args.sequential,
        cond_path: None,
        export: args.export.clone(),
        export_coefficients: None,
        export_json: args.export_json.clone(),
    }
}
