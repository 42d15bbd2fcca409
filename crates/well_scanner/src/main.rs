use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::Parser;
use rayon::prelude::*;
use tracing::{error, info};
use well_analytics::{LevelEstimator, PumpStateAnalyzer, SensorReading};

use crate::{config::Config, report::FileReport};

mod chart;
mod config;
mod plot;
mod report;

/// Detects pump-off intervals and static/dynamic water levels in well sensor dumps.
#[derive(Parser)]
#[command(name = "well-scanner")]
struct Args {
	/// Path to the TOML configuration.
	#[arg(long, default_value = "config.toml")]
	config: PathBuf,

	/// CSV files to scan. Overrides `[input].paths`.
	paths: Vec<PathBuf>,
}

fn main() -> anyhow::Result<()> {
	tracing_subscriber::fmt()
		.with_env_filter(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
		)
		.init();

	let args = Args::parse();

	let mut config = Config::load(&args.config).context("Failed to load configuration")?;
	info!("✅ Configuration loaded");

	if !args.paths.is_empty() {
		config.input.paths = args.paths;
	}
	if config.input.paths.is_empty() {
		bail!("No input files: pass CSV paths as arguments or set [input].paths");
	}

	info!(files = config.input.paths.len(), "✅ Scanning sensor files");

	let results: Vec<(&PathBuf, anyhow::Result<FileReport>)> =
		config.input.paths.par_iter().map(|path| (path, scan_file(&config, path))).collect();

	let mut failures = 0usize;
	for (path, result) in results {
		let report = match result {
			Ok(report) => report,
			Err(error) => {
				error!(path = %path.display(), "{error:#}");
				failures += 1;
				continue;
			},
		};

		println!("{}\n", report.format());

		if let Some(dir) = &config.output.chart_dir
			&& let Err(error) = chart::write_chart(dir, &report).and_then(|_| plot::write_png(dir, &report))
		{
			error!(path = %path.display(), "{error:#}");
			failures += 1;
		}
	}

	if failures > 0 {
		bail!("{failures} of {} files failed", config.input.paths.len());
	}

	Ok(())
}

/// Reads, filters and analyzes one file with analyzers of its own.
fn scan_file(config: &Config, path: &Path) -> anyhow::Result<FileReport> {
	let readings = sensor_data::read_readings(path)?;
	let readings = filter_by_date(config, readings);

	let analyzer = PumpStateAnalyzer::new(config.pump)?;
	let estimator = LevelEstimator::new(config.levels)?;

	let analysis = analyzer.analyze(&readings);
	let levels = estimator.estimate(&readings);
	info!(
		path = %path.display(),
		intervals = analysis.intervals.len(),
		static_level = ?levels.static_level,
		dynamic_level = ?levels.dynamic_level,
		"Sensor file analyzed"
	);

	Ok(FileReport { path: path.to_path_buf(), readings, analysis, levels })
}

fn filter_by_date(config: &Config, readings: Vec<SensorReading>) -> Vec<SensorReading> {
	match (config.input.start_date, config.input.end_date) {
		(Some(start), Some(end)) => sensor_data::between(start, end, &readings),
		(Some(start), None) => sensor_data::after(start, &readings),
		(None, Some(end)) => sensor_data::between(chrono::DateTime::<chrono::Utc>::MIN_UTC, end, &readings),
		(None, None) => readings,
	}
}
