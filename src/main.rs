use clap::Parser;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod check;
mod cli;
mod config;
mod context;
mod differ;
mod error;
mod executor;
mod pipeline;
mod registry;
mod tool;
mod tree;
mod variation;

use check::{Checker, FAILURE_EXIT_CODE};
use cli::RootArgs;
use config::ConfigFile;
use differ::ExternalDiffer;
use error::CheckError;
use registry::VariationRegistry;
use tool::SystemToolRunner;

fn main() {
    let args = RootArgs::parse();
    let cwd = std::env::current_dir();
    let file = match &cwd {
        Ok(cwd) => config::load(args.config.as_deref(), cwd),
        Err(err) => Err(CheckError::Setup(format!("resolve current directory: {err}"))),
    };
    let verbosity = args
        .verbosity
        .or_else(|| file.as_ref().ok().and_then(|file| file.basics.verbosity))
        .unwrap_or(0);
    init_tracing(verbosity);

    let result = match (file, cwd) {
        (Ok(file), Ok(cwd)) => run(&args, &file, &cwd),
        (Err(err), _) => Err(err),
        (_, Err(err)) => Err(CheckError::Setup(format!("resolve current directory: {err}"))),
    };
    let code = match result {
        Ok(code) => code,
        Err(err) => {
            tracing::error!("{err}");
            FAILURE_EXIT_CODE
        }
    };
    std::process::exit(code);
}

fn run(args: &RootArgs, file: &ConfigFile, cwd: &Path) -> Result<i32, CheckError> {
    let registry = VariationRegistry::standard(Arc::new(SystemToolRunner));
    let settings = config::resolve(args, &file.basics, &registry, ambient_env(), cwd)?;

    let differ = ExternalDiffer::new(settings.diff_tool);
    differ.ensure_available()?;

    let outcome = Checker::new(&registry, &differ).check(&settings.request);
    tracing::info!(?outcome, "check finished");
    Ok(outcome.exit_code())
}

/// The environment both builds start from, byte for byte.
fn ambient_env() -> BTreeMap<OsString, OsString> {
    std::env::vars_os().collect()
}

/// Map `--verbosity` onto a default filter; `RUST_LOG` takes precedence.
fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .init();
}
