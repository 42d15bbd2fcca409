use anyhow::bail;
use serde::Deserialize;

use crate::smoothing::SmoothingMethod;

const fn default_lower_percentile() -> usize {
	20
}

const fn default_upper_percentile() -> usize {
	95
}

/// Where the pump start/stop thresholds come from.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ThresholdMode {
	/// Derived once per run from the percentiles of the whole rate series.
	Adaptive {
		#[serde(default = "default_lower_percentile")]
		lower_percentile: usize,
		#[serde(default = "default_upper_percentile")]
		upper_percentile: usize,
	},
	/// Supplied by the caller, in level change per second.
	Fixed { start: f64, stop: f64 },
}

impl Default for ThresholdMode {
	fn default() -> Self {
		Self::Adaptive { lower_percentile: default_lower_percentile(), upper_percentile: default_upper_percentile() }
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct AnalyzerSettings {
	pub smoothing: SmoothingMethod,
	/// Consecutive threshold crossings required before a state change is confirmed.
	pub min_consecutive_points: usize,
	pub thresholds: ThresholdMode,
}

impl Default for AnalyzerSettings {
	fn default() -> Self {
		Self { smoothing: SmoothingMethod::default(), min_consecutive_points: 5, thresholds: ThresholdMode::default() }
	}
}

impl AnalyzerSettings {
	pub fn validate(&self) -> anyhow::Result<()> {
		match self.smoothing {
			SmoothingMethod::Exponential { alpha } => {
				if !(alpha > 0.0 && alpha <= 1.0) {
					bail!("smoothing alpha must be in (0, 1], got {alpha}");
				}
			},
			SmoothingMethod::MovingAverage { window } => {
				if window == 0 {
					bail!("moving average window must be at least 1");
				}
			},
		}

		if self.min_consecutive_points == 0 {
			bail!("min_consecutive_points must be at least 1");
		}

		match self.thresholds {
			ThresholdMode::Adaptive { lower_percentile, upper_percentile } => {
				if lower_percentile > 100 || upper_percentile > 100 {
					bail!("percentiles must be between 0 and 100, got {lower_percentile} and {upper_percentile}");
				}

				if lower_percentile >= upper_percentile {
					bail!("lower_percentile ({lower_percentile}) must be below upper_percentile ({upper_percentile})");
				}
			},
			ThresholdMode::Fixed { start, stop } => {
				if !start.is_finite() || !stop.is_finite() {
					bail!("pump thresholds must be finite");
				}

				if start >= stop {
					bail!("pump start threshold ({start}) must be below the stop threshold ({stop})");
				}
			},
		}

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defaults_are_valid() {
		let settings = AnalyzerSettings::default();

		assert!(settings.validate().is_ok());
		assert_eq!(settings.min_consecutive_points, 5);
		assert_eq!(settings.smoothing, SmoothingMethod::Exponential { alpha: 0.2 });
		assert_eq!(settings.thresholds, ThresholdMode::Adaptive { lower_percentile: 20, upper_percentile: 95 });
	}

	#[test]
	fn rejects_alpha_out_of_range() {
		for alpha in [0.0, -0.5, 1.5, f64::NAN] {
			let settings = AnalyzerSettings { smoothing: SmoothingMethod::Exponential { alpha }, ..Default::default() };
			assert!(settings.validate().is_err(), "alpha {alpha} should be rejected");
		}

		let settings = AnalyzerSettings { smoothing: SmoothingMethod::Exponential { alpha: 1.0 }, ..Default::default() };
		assert!(settings.validate().is_ok());
	}

	#[test]
	fn rejects_zero_consecutive_points() {
		let settings = AnalyzerSettings { min_consecutive_points: 0, ..Default::default() };
		let error = settings.validate().unwrap_err();

		assert!(error.to_string().contains("min_consecutive_points"));
	}

	#[test]
	fn rejects_empty_moving_average() {
		let settings = AnalyzerSettings { smoothing: SmoothingMethod::MovingAverage { window: 0 }, ..Default::default() };
		assert!(settings.validate().is_err());
	}

	#[test]
	fn rejects_inverted_percentiles() {
		let settings = AnalyzerSettings {
			thresholds: ThresholdMode::Adaptive { lower_percentile: 95, upper_percentile: 20 },
			..Default::default()
		};
		assert!(settings.validate().is_err());

		let settings = AnalyzerSettings {
			thresholds: ThresholdMode::Adaptive { lower_percentile: 20, upper_percentile: 101 },
			..Default::default()
		};
		assert!(settings.validate().is_err());
	}

	#[test]
	fn fixed_thresholds_need_hysteresis() {
		let settings =
			AnalyzerSettings { thresholds: ThresholdMode::Fixed { start: 0.001, stop: -0.001 }, ..Default::default() };
		assert!(settings.validate().is_err());

		let settings =
			AnalyzerSettings { thresholds: ThresholdMode::Fixed { start: -0.001, stop: 0.001 }, ..Default::default() };
		assert!(settings.validate().is_ok());
	}
}
