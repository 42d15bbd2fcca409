use chrono::{DateTime, Utc};
use tracing::debug;
use well_analytics::SensorReading;

/// Readings taken at or after `start`.
pub fn after(start: DateTime<Utc>, readings: &[SensorReading]) -> Vec<SensorReading> {
	let kept: Vec<SensorReading> = readings.iter().filter(|r| r.timestamp >= start).copied().collect();
	debug!(%start, kept = kept.len(), dropped = readings.len() - kept.len(), "Readings filtered by start date");

	kept
}

/// Readings taken within `start..=end`.
pub fn between(start: DateTime<Utc>, end: DateTime<Utc>, readings: &[SensorReading]) -> Vec<SensorReading> {
	let kept: Vec<SensorReading> =
		readings.iter().filter(|r| r.timestamp >= start && r.timestamp <= end).copied().collect();
	debug!(%start, %end, kept = kept.len(), dropped = readings.len() - kept.len(), "Readings filtered by date range");

	kept
}
