//! Swagger from source - command-line tool for generating Swagger documents.
//!
//! # Usage
//!
//! ```bash
//! swagger-from-source [OPTIONS] <PACKAGE>
//! ```
//!
//! # Examples
//!
//! Generate JSON for the package at `services/api`:
//! ```bash
//! swagger-from-source -s ./workspace services/api -o swagger.json
//! ```
//!
//! Generate YAML with short definition names, skipping vendored crates:
//! ```bash
//! swagger-from-source services/api -f yaml -n simple -i vendor,third_party
//! ```

use anyhow::Result;
use clap::Parser;
use log::info;
use swagger_from_source::cli;

fn main() -> Result<()> {
    // Parse once to read the verbose flag before the logger exists
    let args = cli::CliArgs::parse();

    let log_level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(log_level)
        .parse_env("RUST_LOG")
        .init();

    info!("Swagger from source starting...");

    let config = cli::parse_args_from_parsed(args)?;
    cli::run(config)?;

    Ok(())
}
