//! Command-line front end: runs a single exchange or the sweep analysis and
//! prints the JSON response.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::Value;

use bb84::api::{self, AnalysisRequest, ErrorPayload, RunRequest};
use bb84::config::Config;

#[derive(Debug, Parser)]
#[command(
    name = "bb84",
    about = "BB84 quantum key distribution simulator",
    version,
    propagate_version = true
)]
struct Cli {
    /// Global: path to config (TOML)
    #[arg(long = "config", value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Global: seed for a reproducible random source
    #[arg(long = "seed", value_name = "SEED", global = true)]
    seed: Option<u64>,

    /// Global: single-line JSON instead of pretty output
    #[arg(long = "compact", global = true)]
    compact: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run one BB84 exchange
    Simulate {
        /// Number of qubits sent
        #[arg(short = 'n', long = "qubits")]
        qubits: Option<usize>,
        /// Channel bit-flip probability
        #[arg(long = "noise")]
        noise: Option<f64>,
        /// Fraction of qubits intercepted
        #[arg(long = "eve")]
        eve: Option<f64>,
    },
    /// Sweep noise and interception levels and report averaged metrics
    Analyze {
        /// Runs per sweep level
        #[arg(short = 'r', long = "runs")]
        runs: Option<usize>,
        /// Number of qubits per run
        #[arg(short = 'n', long = "qubits")]
        qubits: Option<usize>,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let compact = cli.compact;

    let (value, ok) = match run(cli) {
        Ok(value) => {
            let ok = value.get("error").is_none();
            (value, ok)
        }
        Err(err) => (ErrorPayload::new(format!("{:#}", err)).to_value(), false),
    };

    let rendered = if compact {
        serde_json::to_string(&value)
    } else {
        serde_json::to_string_pretty(&value)
    };
    match rendered {
        Ok(text) => println!("{}", text),
        Err(err) => eprintln!("failed to render response: {}", err),
    }

    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn run(cli: Cli) -> Result<Value> {
    let config = match &cli.config {
        Some(path) => {
            let config = Config::load(path)?;
            info!("Loaded configuration from {}", path.display());
            config
        }
        None => Config::default(),
    };

    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let value = match cli.cmd {
        Command::Simulate { qubits, noise, eve } => {
            let request = RunRequest {
                qubit_count: qubits,
                noise_probability: noise,
                eavesdropper_probability: eve,
            };
            info!("Running BB84 exchange: {:?}", request);
            api::respond(api::handle_run(&request, &config, &mut rng))
        }
        Command::Analyze { runs, qubits } => {
            let request = AnalysisRequest {
                runs_per_level: runs,
                qubit_count: qubits,
            };
            info!("Collecting sweep metrics: {:?}", request);
            api::respond(api::handle_analysis(&request, &config, &mut rng))
        }
    };

    Ok(value)
}
