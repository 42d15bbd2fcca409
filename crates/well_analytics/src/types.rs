use chrono::{DateTime, Utc};
use serde::Serialize;

/// A single water-level measurement. Sequences of readings are expected to be sorted by time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SensorReading {
	pub timestamp: DateTime<Utc>,
	pub value: f64,
}

impl SensorReading {
	#[must_use]
	pub const fn new(timestamp: DateTime<Utc>, value: f64) -> Self {
		Self { timestamp, value }
	}

	/// Builds a reading from a UTC epoch in milliseconds. Returns `None` when the epoch is outside the
	/// range chrono can represent.
	#[must_use]
	pub fn from_epoch_millis(epoch_millis: i64, value: f64) -> Option<Self> {
		DateTime::from_timestamp_millis(epoch_millis).map(|timestamp| Self { timestamp, value })
	}

	#[must_use]
	pub fn epoch_millis(&self) -> i64 {
		self.timestamp.timestamp_millis()
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PumpState {
	On,
	Off,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IntervalClosure {
	/// The scan confirmed the pump starting again.
	PumpStarted,
	/// Data ran out while the pump was still off; the interval was closed at the last reading.
	EndOfData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PumpOffInterval {
	pub start_time: DateTime<Utc>,
	pub end_time: DateTime<Utc>,
	pub closure: IntervalClosure,
}

impl std::fmt::Display for PumpOffInterval {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "Pump off from {} to {}", self.start_time.format("%H:%M:%S"), self.end_time.format("%H:%M:%S"))?;
		if self.closure == IntervalClosure::EndOfData {
			write!(f, " (end of data)")?;
		}
		Ok(())
	}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LevelEstimate {
	pub static_level: Option<f64>,
	pub dynamic_level: Option<f64>,
}

impl std::fmt::Display for LevelEstimate {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let format = |level: Option<f64>| level.map_or_else(|| String::from("not found"), |value| format!("{value:.2}"));

		write!(f, "Static level: {}\nDynamic level: {}", format(self.static_level), format(self.dynamic_level))
	}
}
