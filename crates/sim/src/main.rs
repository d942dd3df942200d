//! Cashus split simulator.
//!
//! Replays a scenario file of participant edits, authority refreshes and
//! scripted gateway failures against a [`cashus_split::ParticipantWeightStore`],
//! printing the optimistic state after every step.

use std::path::PathBuf;

use anyhow::Result;
use cashus_split::SplitConfig;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod gateway;
mod runner;
mod scenario;

/// Simulator command line arguments.
#[derive(Parser, Debug)]
#[command(name = "cashus-sim")]
#[command(about = "Replay participant weight edits against an in-memory sync gateway")]
struct Args {
	/// Scenario file (TOML)
	#[arg(value_name = "SCENARIO")]
	scenario: PathBuf,

	/// Split config overriding the scenario's `[config]` table
	#[arg(short, long, value_name = "PATH")]
	config: Option<PathBuf>,

	/// Verbose logging
	#[arg(short, long)]
	verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
	let args = Args::parse();

	let default_level = if args.verbose { "debug" } else { "info" };
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.init();

	let scenario = scenario::Scenario::load(&args.scenario)?;
	let config = match &args.config {
		Some(path) => SplitConfig::load(path)?,
		None => scenario.config,
	};
	info!(
		scenario = %args.scenario.display(),
		debounce_ms = config.debounce.as_millis() as u64,
		sync_timeout_ms = config.sync_timeout.as_millis() as u64,
		"sim.start"
	);

	let mut stdout = std::io::stdout().lock();
	let report = runner::run(&scenario, config, &mut stdout).await?;
	info!(
		requests = report.requests,
		notices = report.notices.len(),
		sent = report.snapshot.stats.syncs_sent,
		failed = report.snapshot.stats.syncs_failed,
		stored = report.stored.as_ref().map(|weights| weights.key()).unwrap_or_default(),
		"sim.done"
	);
	Ok(())
}
