use std::path::PathBuf;

use well_analytics::{LevelEstimate, PumpAnalysis, SensorReading};

/// Everything derived from one sensor file.
pub struct FileReport {
	pub path: PathBuf,
	pub readings: Vec<SensorReading>,
	pub analysis: PumpAnalysis,
	pub levels: LevelEstimate,
}

impl FileReport {
	pub fn format(&self) -> String {
		let sections = [self.format_header(), self.format_thresholds(), self.levels.to_string(), self.format_intervals()];

		sections.join("\n\n")
	}

	fn format_header(&self) -> String {
		let name = self.path.display();

		match (self.readings.first(), self.readings.last()) {
			(Some(first), Some(last)) => format!(
				"📄 {name} | {} readings ({} → {})",
				self.readings.len(),
				first.timestamp.format("%Y-%m-%d %H:%M:%S"),
				last.timestamp.format("%Y-%m-%d %H:%M:%S"),
			),
			_ => format!("📄 {name} | no readings"),
		}
	}

	fn format_thresholds(&self) -> String {
		self.analysis.thresholds.map_or_else(
			|| String::from("Thresholds: not available"),
			|thresholds| format!("Thresholds: start {:.6}/s, stop {:.6}/s", thresholds.start, thresholds.stop),
		)
	}

	fn format_intervals(&self) -> String {
		if self.analysis.intervals.is_empty() {
			return String::from("No pump-off intervals detected");
		}

		self.analysis.intervals.iter().map(ToString::to_string).collect::<Vec<_>>().join("\n")
	}
}

#[cfg(test)]
mod tests {
	use chrono::DateTime;
	use well_analytics::{IntervalClosure, PumpOffInterval, PumpThresholds};

	use super::*;

	fn reading(secs: i64, value: f64) -> SensorReading {
		SensorReading::new(DateTime::from_timestamp(secs, 0).unwrap(), value)
	}

	#[test]
	fn test_format_report() {
		let report = FileReport {
			path: PathBuf::from("well-105.csv"),
			readings: vec![reading(1_754_438_400, 8.0), reading(1_754_445_600, 5.0)],
			analysis: PumpAnalysis {
				thresholds: Some(PumpThresholds { start: -0.001, stop: 0.0025 }),
				intervals: vec![
					PumpOffInterval {
						start_time: DateTime::from_timestamp(1_754_439_000, 0).unwrap(),
						end_time: DateTime::from_timestamp(1_754_440_200, 0).unwrap(),
						closure: IntervalClosure::PumpStarted,
					},
					PumpOffInterval {
						start_time: DateTime::from_timestamp(1_754_445_000, 0).unwrap(),
						end_time: DateTime::from_timestamp(1_754_445_600, 0).unwrap(),
						closure: IntervalClosure::EndOfData,
					},
				],
				..PumpAnalysis::default()
			},
			levels: LevelEstimate { static_level: Some(8.0), dynamic_level: None },
		};

		assert_eq!(
			report.format(),
			"📄 well-105.csv | 2 readings (2025-08-06 00:00:00 → 2025-08-06 02:00:00)\n\n\
			Thresholds: start -0.001000/s, stop 0.002500/s\n\n\
			Static level: 8.00\n\
			Dynamic level: not found\n\n\
			Pump off from 00:10:00 to 00:30:00\n\
			Pump off from 01:50:00 to 02:00:00 (end of data)"
		);
	}

	#[test]
	fn empty_report() {
		let report = FileReport {
			path: PathBuf::from("empty.csv"),
			readings: Vec::new(),
			analysis: PumpAnalysis::default(),
			levels: LevelEstimate::default(),
		};

		let text = report.format();
		assert!(text.starts_with("📄 empty.csv | no readings"));
		assert!(text.contains("Thresholds: not available"));
		assert!(text.ends_with("No pump-off intervals detected"));
	}
}
