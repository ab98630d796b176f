//! Command-line interface for the reaction network simulator
//!
//! This binary loads JSON model documents and simulates them:
//! - Integrating a model over a time span
//! - Running the pulse schedule stored in a model
//! - Inspecting declarations and compiled rates
//!
//! # Usage
//!
//! ```bash
//! # Simulate from t = 0 to t = 25 and write the trace as CSV
//! biosystem run --path model.json --from 0 --to 25 --output trace.csv
//!
//! # Run the pulse schedule of the model with RK5
//! biosystem pulses --path model.json --integrator rk5
//!
//! # Show constants, compositors, parts and compiled rates
//! biosystem inspect --path model.json
//! ```
//!
//! Set `RUST_LOG=info` to follow pulse segments, `RUST_LOG=debug` for compilation and
//! grid details.

use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
    process,
};

use biosystem::{
    io::load_system,
    prelude::{BioSystem, ModelDocument, PulseTrace, SimulationSetup, Trace},
    simulation::{RK4, RK5},
};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;

/// Main CLI configuration struct
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
enum Commands {
    /// Simulate a model over a time span
    Run {
        /// Path to the model document
        #[arg(short, long)]
        path: PathBuf,

        /// Start of the time span
        #[arg(long, default_value_t = 0.0)]
        from: f64,

        /// End of the time span
        #[arg(long)]
        to: f64,

        /// Path to write the CSV trace to, stdout if omitted
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Integrator to use
        #[arg(short, long, value_enum, default_value_t = Integrator::Rk4)]
        integrator: Integrator,
    },
    /// Run the pulse schedule stored in a model
    Pulses {
        /// Path to the model document
        #[arg(short, long)]
        path: PathBuf,

        /// Path to write the CSV trace to, stdout if omitted
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Integrator to use
        #[arg(short, long, value_enum, default_value_t = Integrator::Rk4)]
        integrator: Integrator,
    },
    /// Print the declarations and compiled rates of a model
    Inspect {
        /// Path to the model document
        #[arg(short, long)]
        path: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Integrator {
    Rk4,
    Rk5,
}

/// Main entry point for the CLI application
pub fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Run {
            path,
            from,
            to,
            output,
            integrator,
        } => run(path, [*from, *to], output.as_deref(), *integrator),
        Commands::Pulses {
            path,
            output,
            integrator,
        } => pulses(path, output.as_deref(), *integrator),
        Commands::Inspect { path } => inspect(path),
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".bold().red(), e);
        process::exit(1);
    }
}

fn run(
    path: &Path,
    t_span: [f64; 2],
    output: Option<&Path>,
    integrator: Integrator,
) -> Result<(), Box<dyn std::error::Error>> {
    let (mut system, doc) = load_system(path)?;
    let setup = setup_of(&doc);

    let trace = match integrator {
        Integrator::Rk4 => system.run_with(t_span, &setup, RK4)?,
        Integrator::Rk5 => system.run_with(t_span, &setup, RK5::default())?,
    };

    write_trace(&trace, output)?;
    report(&trace, output);

    Ok(())
}

fn pulses(
    path: &Path,
    output: Option<&Path>,
    integrator: Integrator,
) -> Result<(), Box<dyn std::error::Error>> {
    let (mut system, doc) = load_system(path)?;
    let setup = setup_of(&doc);

    let result: PulseTrace = match integrator {
        Integrator::Rk4 => system.run_pulses_with(&doc.pulses, &setup, RK4)?,
        Integrator::Rk5 => system.run_pulses_with(&doc.pulses, &setup, RK5::default())?,
    };

    write_trace(&result.trace, output)?;
    eprintln!(
        "{} {} segment(s)",
        "Simulated".bold().green(),
        result.segments.len()
    );
    report(&result.trace, output);

    Ok(())
}

fn inspect(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let (mut system, _) = load_system(path)?;
    compile_or_warn(&mut system);
    println!("{}", system);

    Ok(())
}

fn compile_or_warn(system: &mut BioSystem) {
    if let Err(e) = system.compile() {
        eprintln!("{} {}", "Warning:".bold().yellow(), e);
    }
}

fn setup_of(doc: &ModelDocument) -> SimulationSetup {
    doc.setup.clone().unwrap_or_default()
}

fn write_trace(trace: &Trace, output: Option<&Path>) -> io::Result<()> {
    match output {
        Some(path) => trace.write_csv(BufWriter::new(File::create(path)?)),
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            trace.write_csv(&mut handle)?;
            handle.flush()
        }
    }
}

fn report(trace: &Trace, output: Option<&Path>) {
    if let Some(path) = output {
        eprintln!(
            "{} {} sample(s) of {} to {}",
            "Wrote".bold().green(),
            trace.len(),
            trace.names().join(", "),
            path.display()
        );
    }
}
