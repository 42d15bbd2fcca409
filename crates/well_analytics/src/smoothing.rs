use std::collections::VecDeque;

use serde::Deserialize;

/// A smoothing strategy over a batch of raw values.
///
/// Output index `i` corresponds to input index `i + warmup()`. Strategies that need a full window
/// before emitting anything return a shorter sequence and report the shift through `warmup`.
pub trait Smoother {
	fn smooth(&self, values: &[f64]) -> Vec<f64>;

	/// Number of leading input samples that produce no output.
	fn warmup(&self) -> usize {
		0
	}
}

/// Smoothed values together with the input offset of the first value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SmoothedSeries {
	pub values: Vec<f64>,
	pub offset: usize,
}

impl SmoothedSeries {
	pub fn from_smoother(smoother: &impl Smoother, values: &[f64]) -> Self {
		Self { values: smoother.smooth(values), offset: smoother.warmup() }
	}

	pub fn len(&self) -> usize {
		self.values.len()
	}

	pub fn is_empty(&self) -> bool {
		self.values.is_empty()
	}
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExponentialSmoother {
	alpha: f64,
}

impl ExponentialSmoother {
	/// `alpha` closer to 1 means less smoothing. Callers validate the range; see `AnalyzerSettings`.
	#[must_use]
	pub const fn new(alpha: f64) -> Self {
		Self { alpha }
	}
}

impl Smoother for ExponentialSmoother {
	fn smooth(&self, values: &[f64]) -> Vec<f64> {
		let mut smoothed = Vec::with_capacity(values.len());
		let Some(&first) = values.first() else {
			return smoothed;
		};

		smoothed.push(first);
		let mut previous = first;
		for &value in &values[1..] {
			previous = self.alpha * value + (1.0 - self.alpha) * previous;
			smoothed.push(previous);
		}

		smoothed
	}
}

/// Trailing simple moving average.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovingAverage {
	window: usize,
}

impl MovingAverage {
	#[must_use]
	pub const fn new(window: usize) -> Self {
		Self { window }
	}
}

impl Smoother for MovingAverage {
	fn smooth(&self, values: &[f64]) -> Vec<f64> {
		if self.window == 0 || values.len() < self.window {
			return Vec::new();
		}

		let mut buffer = VecDeque::with_capacity(self.window);
		let mut sum = 0.0;
		let mut smoothed = Vec::with_capacity(values.len() + 1 - self.window);

		for &value in values {
			buffer.push_back(value);
			sum += value;

			if buffer.len() > self.window
				&& let Some(dropped) = buffer.pop_front()
			{
				sum -= dropped;
			}

			if buffer.len() == self.window {
				smoothed.push(sum / self.window as f64);
			}
		}

		smoothed
	}

	fn warmup(&self) -> usize {
		self.window.saturating_sub(1)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum SmoothingMethod {
	Exponential { alpha: f64 },
	MovingAverage { window: usize },
}

impl Default for SmoothingMethod {
	fn default() -> Self {
		Self::Exponential { alpha: 0.2 }
	}
}

impl Smoother for SmoothingMethod {
	fn smooth(&self, values: &[f64]) -> Vec<f64> {
		match *self {
			Self::Exponential { alpha } => ExponentialSmoother::new(alpha).smooth(values),
			Self::MovingAverage { window } => MovingAverage::new(window).smooth(values),
		}
	}

	fn warmup(&self) -> usize {
		match *self {
			Self::Exponential { .. } => 0,
			Self::MovingAverage { window } => MovingAverage::new(window).warmup(),
		}
	}
}


#[cfg(test)]
mod proptests {
	use super::*;
	use proptest::prelude::*;

	proptest! {
		#[test]
		fn prop_exponential_preserves_length(
			values in prop::collection::vec(-1000.0f64..1000.0, 1..300),
			alpha in 0.01f64..=1.0
		) {
			let smoothed = ExponentialSmoother::new(alpha).smooth(&values);
			prop_assert_eq!(smoothed.len(), values.len());
		}

		#[test]
		fn prop_alpha_one_is_identity(values in prop::collection::vec(-1000.0f64..1000.0, 1..300)) {
			let smoothed = ExponentialSmoother::new(1.0).smooth(&values);
			prop_assert_eq!(smoothed, values);
		}
	}
}
