use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use well_analytics::{LevelEstimate, PumpOffInterval, PumpThresholds, SensorReading};

use crate::report::FileReport;

/// Input for the plotting front end: raw and smoothed series plus the detected intervals and levels.
#[derive(Debug, Serialize)]
pub struct ChartData<'a> {
	pub source: String,
	pub readings: &'a [SensorReading],
	pub smoothed: Vec<ChartPoint>,
	pub thresholds: Option<PumpThresholds>,
	pub intervals: &'a [PumpOffInterval],
	pub levels: LevelEstimate,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChartPoint {
	pub timestamp: DateTime<Utc>,
	pub value: f64,
}

impl<'a> ChartData<'a> {
	pub fn from_report(report: &'a FileReport) -> Self {
		Self {
			source: report.path.display().to_string(),
			readings: &report.readings,
			smoothed: smoothed_points(report),
			thresholds: report.analysis.thresholds,
			intervals: &report.analysis.intervals,
			levels: report.levels,
		}
	}
}

/// Smoothed values paired with the timestamps of the readings they belong to.
pub fn smoothed_points(report: &FileReport) -> Vec<ChartPoint> {
	let smoothed = &report.analysis.smoothed;

	report
		.readings
		.iter()
		.skip(smoothed.offset)
		.zip(&smoothed.values)
		.map(|(reading, &value)| ChartPoint { timestamp: reading.timestamp, value })
		.collect()
}

/// `<dir>/<input file stem>.<extension>`, creating `dir` if needed.
pub fn output_path(dir: &Path, report: &FileReport, extension: &str) -> anyhow::Result<PathBuf> {
	fs::create_dir_all(dir).with_context(|| format!("Failed to create chart directory: {}", dir.display()))?;

	let stem = report.path.file_stem().map_or_else(|| String::from("chart"), |stem| stem.to_string_lossy().into_owned());

	Ok(dir.join(format!("{stem}.{extension}")))
}

/// Writes `<dir>/<input file stem>.json` and returns its path.
pub fn write_chart(dir: &Path, report: &FileReport) -> anyhow::Result<PathBuf> {
	let target = output_path(dir, report, "json")?;

	let json = serde_json::to_string_pretty(&ChartData::from_report(report)).context("Failed to serialize chart data")?;
	fs::write(&target, json).with_context(|| format!("Failed to write chart data: {}", target.display()))?;

	info!(path = %target.display(), "Chart data written");

	Ok(target)
}

#[cfg(test)]
mod tests {
	use well_analytics::{IntervalClosure, PumpAnalysis, SmoothedSeries};

	use super::*;

	fn report() -> FileReport {
		let readings: Vec<SensorReading> =
			(0..4).map(|i| SensorReading::new(DateTime::from_timestamp(i * 60, 0).unwrap(), i as f64)).collect();

		FileReport {
			path: PathBuf::from("data/well-105.csv"),
			analysis: PumpAnalysis {
				thresholds: Some(PumpThresholds { start: -0.001, stop: 0.002 }),
				smoothed: SmoothedSeries { values: vec![0.5, 1.5, 2.5], offset: 1 },
				intervals: vec![PumpOffInterval {
					start_time: readings[1].timestamp,
					end_time: readings[3].timestamp,
					closure: IntervalClosure::EndOfData,
				}],
			},
			readings,
			levels: LevelEstimate::default(),
		}
	}

	#[test]
	fn smoothed_points_are_aligned_with_readings() {
		let report = report();
		let chart = ChartData::from_report(&report);

		assert_eq!(chart.smoothed.len(), 3);
		assert_eq!(chart.smoothed[0], ChartPoint { timestamp: report.readings[1].timestamp, value: 0.5 });
		assert_eq!(chart.smoothed[2].timestamp, report.readings[3].timestamp);
	}

	#[test]
	fn test_chart_json() {
		let report = report();
		let json = serde_json::to_value(ChartData::from_report(&report)).unwrap();

		assert_eq!(json["source"], "data/well-105.csv");
		assert_eq!(json["readings"].as_array().unwrap().len(), 4);
		assert_eq!(json["readings"][1]["timestamp"], "1970-01-01T00:01:00Z");
		assert_eq!(json["intervals"][0]["closure"], "end_of_data");
		assert_eq!(json["thresholds"]["stop"], 0.002);
		assert!(json["levels"]["static_level"].is_null());
	}

	#[test]
	fn writes_chart_named_after_input() {
		let dir = std::env::temp_dir().join(format!("well_scanner_chart_{}", std::process::id()));
		let target = write_chart(&dir, &report()).unwrap();

		assert_eq!(target, dir.join("well-105.json"));
		let written: serde_json::Value = serde_json::from_str(&fs::read_to_string(&target).unwrap()).unwrap();
		assert_eq!(written["smoothed"].as_array().unwrap().len(), 3);

		fs::remove_dir_all(&dir).unwrap();
	}
}
