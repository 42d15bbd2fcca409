use serde::Serialize;
use tracing::info;

use crate::percentile::percentile;
use crate::settings::ThresholdMode;

/// Ceiling for the start threshold, so a very flat dataset never yields a zero or positive one.
pub const START_THRESHOLD_CAP: f64 = -0.0001;

/// Rate thresholds in level change per second.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PumpThresholds {
	/// Falling faster than this means the pump is drawing the well down.
	pub start: f64,
	/// Rising faster than this means the well is recovering with the pump off.
	pub stop: f64,
}

/// Derives thresholds from the empirical rate distribution of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThresholdEstimator {
	lower_percentile: usize,
	upper_percentile: usize,
}

impl ThresholdEstimator {
	#[must_use]
	pub const fn new(lower_percentile: usize, upper_percentile: usize) -> Self {
		Self { lower_percentile, upper_percentile }
	}

	pub fn estimate(&self, rates: &[f64]) -> Option<PumpThresholds> {
		let start = percentile(rates, self.lower_percentile)?.min(START_THRESHOLD_CAP);
		let stop = percentile(rates, self.upper_percentile)?;

		Some(PumpThresholds { start, stop })
	}
}

impl ThresholdMode {
	/// Thresholds for this run. `None` only when adaptive thresholds are requested for an empty series.
	pub fn resolve(&self, rates: &[f64]) -> Option<PumpThresholds> {
		let thresholds = match *self {
			Self::Adaptive { lower_percentile, upper_percentile } => {
				ThresholdEstimator::new(lower_percentile, upper_percentile).estimate(rates)?
			},
			Self::Fixed { start, stop } => PumpThresholds { start, stop },
		};

		info!(start = thresholds.start, stop = thresholds.stop, rates = rates.len(), "Pump thresholds resolved");

		Some(thresholds)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_adaptive_thresholds() {
		let rates: Vec<f64> = (0..=100).map(|i| f64::from(i - 50) * 0.001).collect();
		let thresholds = ThresholdEstimator::new(0, 100).estimate(&rates).unwrap();

		assert!((thresholds.start + 0.05).abs() < 1e-12);
		assert!((thresholds.stop - 0.05).abs() < 1e-12);
	}

	#[test]
	fn start_threshold_is_capped_below_zero() {
		let rates = vec![0.0; 40];
		let thresholds = ThresholdEstimator::new(20, 95).estimate(&rates).unwrap();

		assert_eq!(thresholds.start, START_THRESHOLD_CAP);
		assert_eq!(thresholds.stop, 0.0);
	}

	#[test]
	fn positive_lower_percentile_is_capped() {
		let rates = vec![0.5, 0.6, 0.7, 0.8];
		let thresholds = ThresholdEstimator::new(20, 95).estimate(&rates).unwrap();

		assert_eq!(thresholds.start, START_THRESHOLD_CAP);
		assert!(thresholds.stop > 0.7);
	}

	#[test]
	fn empty_rates_have_no_adaptive_thresholds() {
		assert!(ThresholdMode::default().resolve(&[]).is_none());
	}

	#[test]
	fn fixed_thresholds_ignore_rates() {
		let mode = ThresholdMode::Fixed { start: -0.002, stop: 0.003 };

		assert_eq!(mode.resolve(&[]), Some(PumpThresholds { start: -0.002, stop: 0.003 }));
		assert_eq!(mode.resolve(&[1.0, 2.0]), Some(PumpThresholds { start: -0.002, stop: 0.003 }));
	}
}
