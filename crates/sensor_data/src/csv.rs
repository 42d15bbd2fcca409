use std::fs;
use std::path::Path;

use anyhow::{Context, bail};
use tracing::{info, warn};
use well_analytics::SensorReading;

const VALUE_COLUMN: &str = "value";
const EPOCH_COLUMN: &str = "epoch_milliseconds";

/// Reads a sensor dump. The file needs a header naming `value` and `epoch_milliseconds` columns;
/// other columns are ignored.
pub fn read_readings(path: impl AsRef<Path>) -> anyhow::Result<Vec<SensorReading>> {
	let path = path.as_ref();
	let content = fs::read_to_string(path).with_context(|| format!("Failed to read sensor file: {}", path.display()))?;

	let readings = parse_readings(&content).with_context(|| format!("Failed to parse sensor file: {}", path.display()))?;
	info!(path = %path.display(), readings = readings.len(), "Sensor readings loaded");

	Ok(readings)
}

pub fn parse_readings(content: &str) -> anyhow::Result<Vec<SensorReading>> {
	let mut lines = content.lines().enumerate().filter(|(_, line)| !line.trim().is_empty());

	let Some((_, header)) = lines.next() else {
		bail!("Sensor data is empty");
	};
	let columns = Columns::from_header(header)?;

	let mut readings: Vec<SensorReading> = Vec::new();
	let mut out_of_order = 0usize;

	for (index, line) in lines {
		let line_number = index + 1;
		let reading = columns.parse_line(line).with_context(|| format!("Invalid reading on line {line_number}"))?;

		if readings.last().is_some_and(|previous| reading.timestamp < previous.timestamp) {
			out_of_order += 1;
		}
		readings.push(reading);
	}

	if out_of_order > 0 {
		warn!(out_of_order, "Sensor readings are not sorted by time; pump detection assumes ascending timestamps");
	}

	Ok(readings)
}

struct Columns {
	value: usize,
	epoch_millis: usize,
}

impl Columns {
	fn from_header(header: &str) -> anyhow::Result<Self> {
		let fields = split_fields(header);
		let position = |name: &str| fields.iter().position(|field| field.trim().eq_ignore_ascii_case(name));

		let Some(value) = position(VALUE_COLUMN) else {
			bail!("Header has no '{VALUE_COLUMN}' column: {header}");
		};
		let Some(epoch_millis) = position(EPOCH_COLUMN) else {
			bail!("Header has no '{EPOCH_COLUMN}' column: {header}");
		};

		Ok(Self { value, epoch_millis })
	}

	fn parse_line(&self, line: &str) -> anyhow::Result<SensorReading> {
		let fields = split_fields(line);
		let field = |index: usize, name: &str| {
			fields.get(index).map(|f| f.trim()).with_context(|| format!("Missing '{name}' column"))
		};

		let raw_value = field(self.value, VALUE_COLUMN)?;
		let value: f64 = raw_value.parse().with_context(|| format!("Invalid value: {raw_value}"))?;
		if !value.is_finite() {
			bail!("Value is not finite: {raw_value}");
		}

		let raw_epoch = field(self.epoch_millis, EPOCH_COLUMN)?;
		let epoch_millis: i64 = raw_epoch.parse().with_context(|| format!("Invalid epoch milliseconds: {raw_epoch}"))?;

		SensorReading::from_epoch_millis(epoch_millis, value)
			.with_context(|| format!("Epoch milliseconds out of range: {epoch_millis}"))
	}
}

/// Splits a CSV line on commas outside double quotes, unescaping `""`.
fn split_fields(line: &str) -> Vec<String> {
	let mut fields = Vec::new();
	let mut current = String::new();
	let mut in_quotes = false;
	let mut chars = line.chars().peekable();

	while let Some(ch) = chars.next() {
		match ch {
			'"' if in_quotes && chars.peek() == Some(&'"') => {
				current.push('"');
				chars.next();
			},
			'"' => in_quotes = !in_quotes,
			',' if !in_quotes => fields.push(std::mem::take(&mut current)),
			_ => current.push(ch),
		}
	}
	fields.push(current);

	fields
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_parse_readings() {
		let content = "value,epoch_milliseconds\n12.5,1754438400000\n12.4,1754438460000\n";
		let readings = parse_readings(content).unwrap();

		assert_eq!(readings.len(), 2);
		assert_eq!(readings[0].value, 12.5);
		assert_eq!(readings[0].epoch_millis(), 1_754_438_400_000);
		assert_eq!(readings[1].epoch_millis(), 1_754_438_460_000);
	}

	#[test]
	fn columns_are_found_by_name() {
		let content = "sensor,\"epoch_milliseconds\",Value\nwell-105,1000,3.25\n\nwell-105,2000,3.5\n";
		let readings = parse_readings(content).unwrap();

		assert_eq!(readings.len(), 2);
		assert_eq!(readings[1].value, 3.5);
		assert_eq!(readings[1].epoch_millis(), 2000);
	}

	#[test]
	fn header_only_has_no_readings() {
		assert!(parse_readings("value,epoch_milliseconds\n").unwrap().is_empty());
	}

	#[test]
	fn empty_content_is_an_error() {
		assert!(parse_readings("").is_err());
		assert!(parse_readings("\n\n").is_err());
	}

	#[test]
	fn missing_column_is_an_error() {
		let error = parse_readings("value,time\n1.0,2\n").unwrap_err();
		assert!(error.to_string().contains("epoch_milliseconds"));
	}

	#[test]
	fn bad_value_reports_line_number() {
		let error = parse_readings("value,epoch_milliseconds\n1.0,1000\nabc,2000\n").unwrap_err();
		assert_eq!(error.to_string(), "Invalid reading on line 3");
	}

	#[test]
	fn non_finite_value_is_rejected() {
		assert!(parse_readings("value,epoch_milliseconds\nNaN,1000\n").is_err());
		assert!(parse_readings("value,epoch_milliseconds\ninf,1000\n").is_err());
	}

	#[test]
	fn short_line_is_rejected() {
		assert!(parse_readings("epoch_milliseconds,value\n1000\n").is_err());
	}

	#[test]
	fn unsorted_readings_are_kept_in_file_order() {
		let readings = parse_readings("value,epoch_milliseconds\n1.0,2000\n2.0,1000\n").unwrap();

		assert_eq!(readings[0].epoch_millis(), 2000);
		assert_eq!(readings[1].epoch_millis(), 1000);
	}

	#[test]
	fn test_split_fields_with_quotes() {
		assert_eq!(split_fields(r#"a,"b,c","d""e""#), vec!["a", "b,c", "d\"e"]);
		assert_eq!(split_fields("1,,2"), vec!["1", "", "2"]);
	}
}
