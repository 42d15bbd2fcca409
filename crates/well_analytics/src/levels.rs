//! Static and dynamic water level estimation.
//!
//! The smoothed series is binned into a histogram whose two most populated local maxima give rough
//! static (higher) and dynamic (lower) levels. Points where the level is barely moving are then
//! assigned to the nearer rough level and summarized: the 95th percentile for the static level, the
//! median for the dynamic one.

use anyhow::bail;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use crate::percentile::{median, percentile};
use crate::rate::rate_of_change;
use crate::smoothing::{ExponentialSmoother, Smoother};
use crate::types::{LevelEstimate, SensorReading};

const LEVEL_SMOOTHING_ALPHA: f64 = 0.2;

const UPPER_STABILITY_FLOOR: f64 = 0.001;
const LOWER_STABILITY_FLOOR: f64 = -0.001;
const UPPER_STABILITY_PERCENTILE: usize = 80;
const LOWER_STABILITY_PERCENTILE: usize = 5;

const STATIC_LEVEL_PERCENTILE: usize = 95;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LevelSettings {
	pub bin_count: usize,
	/// A histogram bin must hold more points than this to count as a peak.
	pub minimum_point_count: usize,
}

impl Default for LevelSettings {
	fn default() -> Self {
		Self { bin_count: 10, minimum_point_count: 50 }
	}
}

impl LevelSettings {
	pub fn validate(&self) -> anyhow::Result<()> {
		if self.bin_count < 2 {
			bail!("bin_count must be at least 2, got {}", self.bin_count);
		}

		Ok(())
	}
}

/// Equal-width histogram spanning the value range. Bins are closed on the right, except the first,
/// which also includes the minimum.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
	lower: f64,
	upper: f64,
	counts: Vec<usize>,
}

impl Histogram {
	/// `None` for empty input or zero bins. A range of zero width is widened to one unit around the value.
	pub fn new(values: &[f64], bin_count: usize) -> Option<Self> {
		if values.is_empty() || bin_count == 0 {
			return None;
		}

		let mut lower = values.iter().copied().fold(f64::INFINITY, f64::min);
		let mut upper = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
		if upper <= lower {
			lower -= 0.5;
			upper += 0.5;
		}

		let mut histogram = Self { lower, upper, counts: vec![0; bin_count] };
		for &value in values {
			let bin = histogram.bin_of(value);
			histogram.counts[bin] += 1;
		}

		Some(histogram)
	}

	fn bin_of(&self, value: f64) -> usize {
		let position = ((value - self.lower) / self.bin_width()).ceil();
		let bin = if position > 0.0 { position as usize - 1 } else { 0 };

		bin.min(self.counts.len() - 1)
	}

	#[must_use]
	pub fn counts(&self) -> &[usize] {
		&self.counts
	}

	#[must_use]
	pub fn bin_width(&self) -> f64 {
		(self.upper - self.lower) / self.counts.len() as f64
	}

	#[must_use]
	pub fn midpoint(&self, bin: usize) -> f64 {
		(bin as f64 + 0.5).mul_add(self.bin_width(), self.lower)
	}

	/// Bins whose count beats every neighbour and exceeds `minimum_point_count`.
	#[must_use]
	pub fn peaks(&self, minimum_point_count: usize) -> Vec<usize> {
		let counts = &self.counts;
		if counts.len() < 2 {
			return Vec::new();
		}

		(0..counts.len())
			.filter(|&i| {
				let count = counts[i];
				let above_left = i == 0 || count > counts[i - 1];
				let above_right = i + 1 == counts.len() || count > counts[i + 1];

				count > minimum_point_count && above_left && above_right
			})
			.collect()
	}
}

#[derive(Debug, Clone, Default)]
pub struct LevelEstimator {
	settings: LevelSettings,
}

impl LevelEstimator {
	pub fn new(settings: LevelSettings) -> anyhow::Result<Self> {
		settings.validate()?;

		Ok(Self { settings })
	}

	/// `records` must be sorted by timestamp. Levels that cannot be estimated are left empty.
	#[must_use]
	pub fn estimate(&self, records: &[SensorReading]) -> LevelEstimate {
		self.try_estimate(records).unwrap_or_default()
	}

	fn try_estimate(&self, records: &[SensorReading]) -> Option<LevelEstimate> {
		if records.len() < 2 {
			debug!(records = records.len(), "Not enough readings to estimate levels");
			return None;
		}

		let values: Vec<f64> = records.iter().map(|r| r.value).collect();
		let smoothed = ExponentialSmoother::new(LEVEL_SMOOTHING_ALPHA).smooth(&values);
		let timestamps: Vec<DateTime<Utc>> = records.iter().map(|r| r.timestamp).collect();

		let (approx_static, approx_dynamic) = self.approximate_levels(&smoothed)?;

		let upper_stability = UPPER_STABILITY_FLOOR.max(percentile(&smoothed, UPPER_STABILITY_PERCENTILE)?);
		let lower_stability = LOWER_STABILITY_FLOOR.min(percentile(&smoothed, LOWER_STABILITY_PERCENTILE)?);
		debug!(approx_static, approx_dynamic, upper_stability, lower_stability, "Level stability band");

		let mut static_points = Vec::new();
		let mut dynamic_points = Vec::new();

		for i in 1..smoothed.len() {
			let rate = rate_of_change(&smoothed, &timestamps, i);
			let is_stable = (rate >= 0.0 && rate < upper_stability) || (rate <= 0.0 && rate > lower_stability);
			if !is_stable {
				continue;
			}

			let level = smoothed[i];
			if (level - approx_static).abs() < (level - approx_dynamic).abs() {
				static_points.push(level);
			} else {
				dynamic_points.push(level);
			}
		}

		debug!(static_points = static_points.len(), dynamic_points = dynamic_points.len(), "Stable points classified");

		Some(LevelEstimate {
			static_level: percentile(&static_points, STATIC_LEVEL_PERCENTILE),
			dynamic_level: median(&dynamic_points),
		})
	}

	/// Midpoints of the two most populated histogram peaks, as `(static, dynamic)`.
	fn approximate_levels(&self, smoothed: &[f64]) -> Option<(f64, f64)> {
		let histogram = Histogram::new(smoothed, self.settings.bin_count)?;
		let mut peaks = histogram.peaks(self.settings.minimum_point_count);

		if peaks.len() < 2 {
			debug!(peaks = peaks.len(), counts = ?histogram.counts(), "Level histogram is not bimodal");
			return None;
		}

		let counts = histogram.counts();
		peaks.sort_by(|&a, &b| counts[b].cmp(&counts[a]));

		let first = histogram.midpoint(peaks[0]);
		let second = histogram.midpoint(peaks[1]);

		Some((first.max(second), first.min(second)))
	}
}
