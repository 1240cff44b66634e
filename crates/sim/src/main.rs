//! Focus fog session simulator.
//!
//! Replays a scripted editor session (see [`session`]) through the fog
//! controller against an in-memory host and prints every renderer and status
//! bar call with its virtual timestamp.

mod replay;
mod session;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use focusfog::config::FogConfig;
use tracing::info;

use crate::session::Session;

/// Simulator command line arguments.
#[derive(Parser, Debug)]
#[command(name = "focusfog-sim")]
#[command(about = "Replay a scripted editor session through focus fog")]
struct Args {
	/// Session file to replay
	#[arg(value_name = "SESSION")]
	session: PathBuf,

	/// Base settings file (`[focusFog]` table); the session's own settings win
	#[arg(short, long, value_name = "PATH")]
	config: Option<PathBuf>,

	/// Verbose logging
	#[arg(short, long)]
	verbose: bool,
}

fn main() -> anyhow::Result<()> {
	let args = Args::parse();

	setup_tracing(args.verbose);

	let base = match &args.config {
		Some(path) => FogConfig::load(path)?,
		None => FogConfig::default(),
	};
	let session = Session::load(&args.session)?;
	info!(session = %args.session.display(), documents = session.documents.len(), "loaded session");

	// Virtual time: waits in the session cost nothing and timestamps are exact.
	let runtime = tokio::runtime::Builder::new_current_thread()
		.enable_time()
		.start_paused(true)
		.build()
		.context("failed to build runtime")?;

	let lines = runtime.block_on(replay::run(&session, base))?;
	for line in lines {
		println!("{line}");
	}

	Ok(())
}

fn setup_tracing(verbose: bool) {
	use std::fs::OpenOptions;

	use tracing_subscriber::EnvFilter;
	use tracing_subscriber::prelude::*;

	let filter = || {
		EnvFilter::try_from_env("FOCUSFOG_LOG").unwrap_or_else(|_| {
			if verbose {
				EnvFilter::new("focusfog=trace,focusfog_sim=debug,info")
			} else {
				EnvFilter::new("warn")
			}
		})
	};

	// Support FOCUSFOG_LOG_DIR for keeping traces of a run
	if let Some(log_dir) = std::env::var("FOCUSFOG_LOG_DIR").ok().map(PathBuf::from)
		&& std::fs::create_dir_all(&log_dir).is_ok()
	{
		let log_path = log_dir.join(format!("focusfog-sim.{}.log", std::process::id()));

		if let Ok(file) = OpenOptions::new().create(true).append(true).open(&log_path) {
			let file_layer = tracing_subscriber::fmt::layer()
				.with_writer(file)
				.with_ansi(false)
				.with_target(true);

			tracing_subscriber::registry().with(filter()).with(file_layer).init();

			tracing::info!(path = ?log_path, "simulator tracing initialized");
			return;
		}
	}

	tracing_subscriber::fmt()
		.with_env_filter(filter())
		.with_writer(std::io::stderr)
		.init();
}
