// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! CLI tool: run a siting estimate for a scenario file
//!
//! The scenario is a JSON document with the parcel, its neighbors, road
//! centrelines, an optional elevation grid, the customer selection and an
//! optional `config` block overriding the default tables.
//!
//! Usage:
//!   parcela-report <scenario.json> [--json-logs] [--output <path>]

use anyhow::{bail, Context, Result};
use parcela_siting::{SiteEstimator, SiteInput, SitingConfig};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Deserialize)]
struct Scenario {
    #[serde(flatten)]
    site: SiteInput,
    #[serde(default)]
    config: SitingConfig,
}

struct Options {
    scenario: PathBuf,
    output: Option<PathBuf>,
    json_logs: bool,
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage();
        return Ok(());
    }

    let options = parse_args(&args)?;
    init_logging(options.json_logs);

    let raw = fs::read_to_string(&options.scenario)
        .with_context(|| format!("cannot read scenario '{}'", options.scenario.display()))?;
    let scenario: Scenario = serde_json::from_str(&raw)
        .with_context(|| format!("invalid scenario '{}'", options.scenario.display()))?;

    tracing::info!(
        scenario = %options.scenario.display(),
        neighbors = scenario.site.neighbors.len(),
        roads = scenario.site.roads.len(),
        raster = scenario.site.raster.is_some(),
        "scenario loaded"
    );

    let estimator = SiteEstimator::new(scenario.config).context("invalid configuration")?;
    let estimate = estimator
        .estimate(&scenario.site)
        .context("siting estimate failed")?;

    let report = serde_json::to_string_pretty(&estimate).context("cannot encode estimate")?;
    match &options.output {
        Some(path) => {
            fs::write(path, report)
                .with_context(|| format!("cannot write report '{}'", path.display()))?;
            tracing::info!(output = %path.display(), "report written");
        }
        None => println!("{report}"),
    }

    Ok(())
}

fn parse_args(args: &[String]) -> Result<Options> {
    let mut options = Options {
        scenario: PathBuf::from(&args[1]),
        output: None,
        json_logs: false,
    };

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--output" => {
                i += 1;
                let Some(path) = args.get(i) else {
                    bail!("--output needs a path");
                };
                options.output = Some(PathBuf::from(path));
            }
            "--json-logs" => {
                options.json_logs = true;
            }
            other => {
                print_usage();
                bail!("unknown option: {other}");
            }
        }
        i += 1;
    }

    Ok(options)
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // Logs go to stderr so stdout carries only the report
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn print_usage() {
    eprintln!("Usage: parcela-report <scenario.json> [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --output <path>   Write the JSON estimate to a file instead of stdout");
    eprintln!("  --json-logs       Emit logs as JSON lines");
    eprintln!();
    eprintln!("Log level follows RUST_LOG (default: info).");
}
