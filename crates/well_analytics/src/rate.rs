use chrono::{DateTime, Utc};

/// Level change per second between smoothed points `i - 1` and `i`.
///
/// `smoothed` and `timestamps` must be index-aligned and `1 <= i < smoothed.len()`. A zero time delta
/// yields 0 instead of dividing by zero.
pub fn rate_of_change(smoothed: &[f64], timestamps: &[DateTime<Utc>], i: usize) -> f64 {
	let value_delta = smoothed[i] - smoothed[i - 1];
	let elapsed_ms = (timestamps[i] - timestamps[i - 1]).num_milliseconds();

	if elapsed_ms == 0 {
		return 0.0;
	}

	value_delta / (elapsed_ms as f64 / 1000.0)
}

/// All rates of an aligned series. `rates[k]` describes the transition ending at index `k + 1`.
pub fn rate_series(smoothed: &[f64], timestamps: &[DateTime<Utc>]) -> Vec<f64> {
	let len = smoothed.len().min(timestamps.len());

	(1..len).map(|i| rate_of_change(smoothed, timestamps, i)).collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn at_secs(secs: &[i64]) -> Vec<DateTime<Utc>> {
		secs.iter().map(|&s| DateTime::from_timestamp(s, 0).unwrap()).collect()
	}

	#[test]
	fn test_rate_per_second() {
		let timestamps = at_secs(&[0, 60, 90]);
		let smoothed = [10.0, 9.4, 9.7];

		assert!((rate_of_change(&smoothed, &timestamps, 1) + 0.01).abs() < 1e-12);
		assert!((rate_of_change(&smoothed, &timestamps, 2) - 0.01).abs() < 1e-12);
	}

	#[test]
	fn zero_time_delta_is_flat() {
		let timestamps = at_secs(&[100, 100]);
		assert_eq!(rate_of_change(&[1.0, 50.0], &timestamps, 1), 0.0);
	}

	#[test]
	fn sub_second_deltas_keep_millisecond_precision() {
		let timestamps = vec![DateTime::from_timestamp_millis(0).unwrap(), DateTime::from_timestamp_millis(250).unwrap()];
		assert!((rate_of_change(&[0.0, 1.0], &timestamps, 1) - 4.0).abs() < 1e-12);
	}

	#[test]
	fn series_is_one_shorter_than_input() {
		let timestamps = at_secs(&[0, 1, 2, 3]);
		let rates = rate_series(&[0.0, 1.0, 3.0, 3.0], &timestamps);

		assert_eq!(rates, vec![1.0, 2.0, 0.0]);
	}

	#[test]
	fn series_of_single_point_is_empty() {
		assert!(rate_series(&[5.0], &at_secs(&[0])).is_empty());
		assert!(rate_series(&[], &[]).is_empty());
	}
}
