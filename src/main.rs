//! Pension Projector CLI
//!
//! Loads the versioned technical basis, reads a simulation request as JSON
//! (file or stdin), and prints the result as JSON.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use pension_projector::basis::{TechnicalBasis, DEFAULT_BASIS_PATH};
use pension_projector::dispatch::SimulationDispatcher;
use pension_projector::simulation::SimulationInput;

#[derive(Debug, Parser)]
#[command(name = "pension_projector", about = "Family pension benefit projection")]
struct Cli {
    /// Path to a simulation request JSON file; reads stdin when omitted
    #[arg(long)]
    input: Option<PathBuf>,

    /// Directory holding the technical basis files
    #[arg(long, default_value = DEFAULT_BASIS_PATH)]
    data_dir: PathBuf,

    /// Pretty-print the result JSON
    #[arg(long)]
    pretty: bool,

    /// Run on the calling thread instead of the worker pool
    #[arg(long)]
    sync: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let basis = TechnicalBasis::from_csv_path(&cli.data_dir)
        .map_err(|err| anyhow::anyhow!("{err}"))
        .with_context(|| format!("loading technical basis from {}", cli.data_dir.display()))?;
    log::info!(
        "projection horizon: {} months, rate {:.2}%",
        basis.projection_months(),
        basis.metadata().interest_rate_effective_annual * 100.0
    );

    let raw = match &cli.input {
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?
        }
        None => std::io::read_to_string(std::io::stdin()).context("reading stdin")?,
    };
    let input: SimulationInput =
        serde_json::from_str(&raw).context("parsing simulation request")?;

    let dispatcher = SimulationDispatcher::new(Arc::new(basis));
    let result = if cli.sync {
        dispatcher.run_synchronous(&input)?
    } else {
        dispatcher.run(&input)?
    };

    let rendered = if cli.pretty {
        serde_json::to_string_pretty(&result)?
    } else {
        serde_json::to_string(&result)?
    };
    println!("{rendered}");

    Ok(())
}
