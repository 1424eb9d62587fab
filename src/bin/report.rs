use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use offerbook_client::{ClientConfig, StoreClient};
use offerbook_core::models::{Datapoint, Program};
use offerbook_core::report::{scan_datapoints, scan_programs};
use offerbook_core::RowId;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Report duplicate and incomplete records in the base")]
struct Args {
    /// API key for the remote base
    #[clap(long, env = "OFFERBOOK_API_KEY")]
    api_key: String,

    /// Base URL of the remote API
    #[clap(long, env = "OFFERBOOK_API_BASE", default_value = offerbook_client::api::DEFAULT_API_BASE)]
    api_base: String,

    /// Report file; issues are appended
    #[clap(long, default_value = "output/issues.log")]
    output: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "info"),
    );

    let args = Args::parse();

    let client = StoreClient::connect(ClientConfig::new(args.api_base.clone(), args.api_key))
        .await
        .context("failed to connect to the base")?;

    let program_rows = client
        .fetch_rows(&client.config().tables.programs)
        .await
        .context("failed to fetch programs")?;
    let programs: BTreeMap<RowId, Program> = program_rows
        .iter()
        .map(|(id, row)| (id.clone(), Program::from_row(id, row)))
        .collect();
    let program_issues = scan_programs(&programs);

    let datapoint_rows = client
        .fetch_rows(&client.config().tables.datapoints)
        .await
        .context("failed to fetch datapoints")?;
    let datapoints: BTreeMap<RowId, Datapoint> = datapoint_rows
        .iter()
        .map(|(id, row)| (id.clone(), Datapoint::from_row(id, row)))
        .collect();
    let datapoint_issues = scan_datapoints(&datapoints);

    if program_issues.duplicates.is_empty() {
        eprintln!("No duplicate programs found.");
    }
    if program_issues.incomplete.is_empty() {
        eprintln!("No incomplete programs found.");
    }
    if datapoint_issues.is_empty() {
        eprintln!("No duplicate datapoints found.");
    }
    if program_issues.is_empty() && datapoint_issues.is_empty() {
        return Ok(());
    }

    let report = format!("{}{}", program_issues, datapoint_issues);
    eprint!("{}", report);

    if let Some(parent) = args.output.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut log = fs::read_to_string(&args.output).unwrap_or_default();
    log.push_str(&report);
    fs::write(&args.output, log).context("failed to write report")?;

    Ok(())
}
