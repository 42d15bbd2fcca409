//! Order statistics shared by thresholding and level estimation.
//!
//! Both use statrs' quantile estimator (R8, approximately median-unbiased linear interpolation) so
//! boundary values agree between call sites.

use statrs::statistics::{Data, Median, OrderStatistics};

/// `p`-th percentile (0..=100) of `values`, or `None` for an empty slice.
pub fn percentile(values: &[f64], p: usize) -> Option<f64> {
	if values.is_empty() || p > 100 {
		return None;
	}

	Some(Data::new(values.to_vec()).percentile(p))
}

pub fn median(values: &[f64]) -> Option<f64> {
	if values.is_empty() {
		return None;
	}

	Some(Data::new(values.to_vec()).median())
}
