use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use well_analytics::{AnalyzerSettings, LevelSettings};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
	pub input: InputConfig,
	pub pump: AnalyzerSettings,
	pub levels: LevelSettings,
	pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct InputConfig {
	pub paths: Vec<PathBuf>,
	pub start_date: Option<DateTime<Utc>>,
	pub end_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
	pub chart_dir: Option<PathBuf>,
}

impl Config {
	pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
		let path = path.as_ref();
		let content =
			fs::read_to_string(path).with_context(|| format!("Failed to read config file: {}", path.display()))?;

		Self::parse(&content)
	}

	pub fn parse(content: &str) -> anyhow::Result<Self> {
		let config: Self = toml::from_str(content).context("Failed to parse config file")?;
		config.validate()?;

		Ok(config)
	}

	fn validate(&self) -> anyhow::Result<()> {
		self.pump.validate().context("Invalid [pump] section")?;
		self.levels.validate().context("Invalid [levels] section")?;

		if let (Some(start), Some(end)) = (self.input.start_date, self.input.end_date)
			&& start > end
		{
			bail!("[input] start_date {start} is after end_date {end}");
		}

		Ok(())
	}
}
