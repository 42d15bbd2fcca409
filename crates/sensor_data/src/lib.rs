mod csv;
mod filter;

pub use csv::{parse_readings, read_readings};
pub use filter::{after, between};
