mod levels;
mod percentile;
mod rate;
mod settings;
mod smoothing;
mod state_machine;
mod thresholds;
mod types;

pub use levels::{Histogram, LevelEstimator, LevelSettings};
pub use percentile::{median, percentile};
pub use rate::{rate_of_change, rate_series};
pub use settings::{AnalyzerSettings, ThresholdMode};
pub use smoothing::{ExponentialSmoother, MovingAverage, SmoothedSeries, Smoother, SmoothingMethod};
pub use state_machine::{PumpAnalysis, PumpStateAnalyzer, PumpStateMachine, ScanState};
pub use thresholds::{PumpThresholds, START_THRESHOLD_CAP, ThresholdEstimator};
pub use types::{IntervalClosure, LevelEstimate, PumpOffInterval, PumpState, SensorReading};
