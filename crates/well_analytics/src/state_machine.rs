use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::rate::rate_series;
use crate::settings::AnalyzerSettings;
use crate::smoothing::SmoothedSeries;
use crate::thresholds::PumpThresholds;
use crate::types::{IntervalClosure, PumpOffInterval, PumpState, SensorReading};

/// Everything a scan carries from one rate sample to the next.
///
/// Only the counter belonging to the current state ever advances; the other stays at zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanState {
	state: PumpState,
	on_counter: usize,
	off_counter: usize,
	pending_off_start: Option<DateTime<Utc>>,
	pending_off_end: Option<DateTime<Utc>>,
	open_interval_start: Option<DateTime<Utc>>,
	intervals: Vec<PumpOffInterval>,
}

impl ScanState {
	#[must_use]
	pub const fn state(&self) -> PumpState {
		self.state
	}

	/// Intervals confirmed so far; the one still open is not included.
	#[must_use]
	pub fn intervals(&self) -> &[PumpOffInterval] {
		&self.intervals
	}

	#[must_use]
	pub const fn open_interval_start(&self) -> Option<DateTime<Utc>> {
		self.open_interval_start
	}

	fn reset_counters(&mut self) {
		self.on_counter = 0;
		self.off_counter = 0;
		self.pending_off_start = None;
		self.pending_off_end = None;
	}
}

/// Hysteresis state machine with debounce over a rate series.
///
/// Holds configuration only, so one instance can scan any number of sequences; each scan threads its
/// own [`ScanState`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PumpStateMachine {
	thresholds: PumpThresholds,
	min_consecutive_points: usize,
}

impl PumpStateMachine {
	#[must_use]
	pub const fn new(thresholds: PumpThresholds, min_consecutive_points: usize) -> Self {
		Self { thresholds, min_consecutive_points }
	}

	#[must_use]
	pub const fn thresholds(&self) -> PumpThresholds {
		self.thresholds
	}

	/// Starts a scan. A first rate above the stop threshold means the well is already recovering, so the
	/// scan begins inside an off interval opened at `first_time`.
	///
	/// With adaptive thresholds the stop threshold is the upper rate percentile, so a dataset that begins
	/// mid-recovery usually still starts `On`.
	#[must_use]
	pub fn initial(&self, first_rate: f64, first_time: DateTime<Utc>) -> ScanState {
		let (state, open_interval_start) =
			if first_rate > self.thresholds.stop { (PumpState::Off, Some(first_time)) } else { (PumpState::On, None) };

		ScanState {
			state,
			on_counter: 0,
			off_counter: 0,
			pending_off_start: None,
			pending_off_end: None,
			open_interval_start,
			intervals: Vec::new(),
		}
	}

	/// Feeds one rate sample. `at` is the timestamp of the reading that starts the sample's interval.
	#[must_use]
	pub fn step(&self, mut scan: ScanState, rate: f64, at: DateTime<Utc>) -> ScanState {
		match scan.state {
			PumpState::Off => {
				if rate < self.thresholds.start {
					let candidate = *scan.pending_off_end.get_or_insert(at);
					scan.on_counter += 1;

					if scan.on_counter >= self.min_consecutive_points {
						if let Some(start_time) = scan.open_interval_start.take() {
							scan.intervals.push(PumpOffInterval {
								start_time,
								end_time: candidate,
								closure: IntervalClosure::PumpStarted,
							});
						}

						debug!(at = %candidate, rate, "Pump turned on");
						scan.state = PumpState::On;
						scan.reset_counters();
					}
				} else {
					scan.on_counter = 0;
					scan.pending_off_end = None;
				}
			},
			PumpState::On => {
				if rate > self.thresholds.stop {
					let candidate = *scan.pending_off_start.get_or_insert(at);
					scan.off_counter += 1;

					if scan.off_counter >= self.min_consecutive_points {
						debug!(at = %candidate, rate, "Pump turned off");
						scan.open_interval_start = Some(candidate);
						scan.state = PumpState::Off;
						scan.reset_counters();
					}
				} else {
					scan.off_counter = 0;
					scan.pending_off_start = None;
				}
			},
		}

		scan
	}

	/// Ends a scan, closing an interval that is still open at `last_time`.
	#[must_use]
	pub fn finish(&self, mut scan: ScanState, last_time: DateTime<Utc>) -> Vec<PumpOffInterval> {
		if let Some(start_time) = scan.open_interval_start.take() {
			scan.intervals.push(PumpOffInterval { start_time, end_time: last_time, closure: IntervalClosure::EndOfData });
		}

		scan.intervals
	}

	/// Scans a whole rate series. `timestamps` are the readings the rates were computed from, so
	/// `timestamps.len() == rates.len() + 1`.
	#[must_use]
	pub fn run(&self, rates: &[f64], timestamps: &[DateTime<Utc>]) -> Vec<PumpOffInterval> {
		let (Some(&first_rate), Some(&first_time), Some(&last_time)) = (rates.first(), timestamps.first(), timestamps.last())
		else {
			return Vec::new();
		};

		let scan = rates
			.iter()
			.zip(timestamps)
			.fold(self.initial(first_rate, first_time), |scan, (&rate, &at)| self.step(scan, rate, at));

		self.finish(scan, last_time)
	}
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PumpAnalysis {
	pub thresholds: Option<PumpThresholds>,
	#[serde(skip)]
	pub smoothed: SmoothedSeries,
	pub intervals: Vec<PumpOffInterval>,
}

/// Smoothing, rates, thresholds and the state machine wired together for one batch of readings.
#[derive(Debug, Clone, Default)]
pub struct PumpStateAnalyzer {
	settings: AnalyzerSettings,
}

impl PumpStateAnalyzer {
	pub fn new(settings: AnalyzerSettings) -> anyhow::Result<Self> {
		settings.validate()?;

		Ok(Self { settings })
	}

	#[must_use]
	pub const fn settings(&self) -> &AnalyzerSettings {
		&self.settings
	}

	/// `records` must be sorted by timestamp.
	#[must_use]
	pub fn analyze(&self, records: &[SensorReading]) -> PumpAnalysis {
		if records.len() < 2 {
			debug!(records = records.len(), "Not enough readings to detect pump state");
			return PumpAnalysis::default();
		}

		let values: Vec<f64> = records.iter().map(|r| r.value).collect();
		let smoothed = SmoothedSeries::from_smoother(&self.settings.smoothing, &values);

		if smoothed.len() < 2 {
			debug!(records = records.len(), smoothed = smoothed.len(), "Readings shorter than the smoothing window");
			return PumpAnalysis { smoothed, ..PumpAnalysis::default() };
		}

		let timestamps: Vec<DateTime<Utc>> =
			records[smoothed.offset..].iter().take(smoothed.len()).map(|r| r.timestamp).collect();
		let rates = rate_series(&smoothed.values, &timestamps);

		let Some(thresholds) = self.settings.thresholds.resolve(&rates) else {
			return PumpAnalysis { smoothed, ..PumpAnalysis::default() };
		};

		let intervals = PumpStateMachine::new(thresholds, self.settings.min_consecutive_points).run(&rates, &timestamps);

		PumpAnalysis { thresholds: Some(thresholds), smoothed, intervals }
	}

	#[must_use]
	pub fn detect_pump_off_intervals(&self, records: &[SensorReading]) -> Vec<PumpOffInterval> {
		self.analyze(records).intervals
	}
}
