use clap::{Args, Parser, Subcommand};
use log::{error, warn};

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use dynaload::driver::{self, FileError, Options};
use dynaload::dyna::table::CountEncoding;
use dynaload::docs;

#[derive(Parser)]
#[command(name = "dynaload")]
#[command(about = "Generates dynaload tables and loaders from annotated C sources", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
    #[command(flatten)]
    policy: Policy,
}

#[derive(Args)]
struct Policy {
    /// Write counts as decimal digits instead of octal escapes
    #[arg(long, global = true)]
    decimal_counts: bool,
    /// Give native properties loader arms
    #[arg(long, global = true)]
    dispatch_properties: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Print the dynaload table
    GenDynaload { source: PathBuf },
    /// Print the loader function
    GenLoader {
        source: PathBuf,
        /// Prefix of native entry names (defaults to the package name)
        #[arg(long)]
        prefix: Option<String>,
    },
    /// Print the whole side file
    GenBoth {
        source: PathBuf,
        #[arg(long)]
        prefix: Option<String>,
    },
    /// Print HTML documentation
    GenDocs { source: PathBuf },
    /// Write dyna_<package>.h beside each source and include it
    Write {
        #[arg(required = true)]
        sources: Vec<PathBuf>,
        #[arg(long)]
        prefix: Option<String>,
        /// Report failing files and carry on with the rest
        #[arg(long)]
        keep_going: bool,
    },
}

fn options(policy: &Policy, prefix: Option<String>) -> Options {
    Options {
        prefix,
        count_encoding: if policy.decimal_counts { CountEncoding::Decimal } else { CountEncoding::Octal },
        dispatch_properties: policy.dispatch_properties,
    }
}

fn write_all(sources: &[PathBuf], options: &Options, keep_going: bool) -> Result<usize, FileError> {
    let mut failed = 0;
    for path in sources {
        match driver::generate(path, options).and_then(|a| driver::write_outputs(path, &a)) {
            Ok(_) => {}
            Err(e) if keep_going => {
                warn!("skipping {e}");
                failed += 1;
            }
            Err(e) => return Err(e),
        }
    }
    Ok(failed)
}

fn print_docs(path: &Path) -> Result<(), FileError> {
    let package = driver::scan_file(path)?;
    print!("{}", docs::Docs(&package));
    Ok(())
}

fn run(cli: Cli) -> Result<bool, FileError> {
    let policy = cli.policy;
    match cli.command {
        Command::GenDynaload { source } => {
            let a = driver::generate(&source, &options(&policy, None))?;
            print!("{}", a.table);
        }
        Command::GenLoader { source, prefix } => {
            let a = driver::generate(&source, &options(&policy, prefix))?;
            print!("{}", a.loader);
        }
        Command::GenBoth { source, prefix } => {
            let a = driver::generate(&source, &options(&policy, prefix))?;
            print!("{}", a.side_file());
        }
        Command::GenDocs { source } => print_docs(&source)?,
        Command::Write { sources, prefix, keep_going } => {
            let failed = write_all(&sources, &options(&policy, prefix), keep_going)?;
            if failed > 0 {
                error!("{failed} of {} files failed", sources.len());
                return Ok(false);
            }
        }
    }
    Ok(true)
}

fn main() -> ExitCode {
    env_logger::init();
    match run(Cli::parse()) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
