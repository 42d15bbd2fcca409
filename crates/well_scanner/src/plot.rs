//! PNG rendering of a scanned file: raw and smoothed level series over green pump-off spans, with the
//! estimated static and dynamic levels as horizontal lines.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Utc};
use tracing::info;

use crate::chart::{output_path, smoothed_points};
use crate::report::FileReport;

pub const WIDTH: u32 = 1200;
pub const HEIGHT: u32 = 600;
const MARGIN: u32 = 40;
/// Share of the value range left empty above and below the series.
const VALUE_PADDING: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba(pub [u8; 4]);

impl Rgba {
	pub const BACKGROUND: Self = Self([255, 255, 255, 255]);
	pub const AXIS: Self = Self([90, 90, 90, 255]);
	pub const PUMP_OFF: Self = Self([198, 239, 206, 255]);
	pub const RAW: Self = Self([180, 180, 180, 255]);
	pub const SMOOTHED: Self = Self([31, 119, 180, 255]);
	pub const STATIC_LEVEL: Self = Self([44, 160, 44, 255]);
	pub const DYNAMIC_LEVEL: Self = Self([214, 39, 40, 255]);
}

/// RGBA pixel buffer, row-major without padding.
pub struct Canvas {
	width: u32,
	height: u32,
	pixels: Vec<u8>,
}

impl Canvas {
	pub fn new(width: u32, height: u32, background: Rgba) -> Self {
		let pixels = background.0.repeat(width as usize * height as usize);

		Self { width, height, pixels }
	}

	pub const fn width(&self) -> u32 {
		self.width
	}

	pub const fn height(&self) -> u32 {
		self.height
	}

	pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
		if x >= self.width || y >= self.height {
			return None;
		}

		let offset = self.offset(x, y);
		let mut color = [0; 4];
		color.copy_from_slice(&self.pixels[offset..offset + 4]);

		Some(Rgba(color))
	}

	fn offset(&self, x: u32, y: u32) -> usize {
		(y as usize * self.width as usize + x as usize) * 4
	}

	fn set_pixel(&mut self, x: i64, y: i64, color: Rgba) {
		if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
			return;
		}

		let offset = self.offset(x as u32, y as u32);
		self.pixels[offset..offset + 4].copy_from_slice(&color.0);
	}

	/// Fills `x0..x1` by `y0..y1`, clipped to the canvas.
	fn fill_rect(&mut self, (x0, x1): (u32, u32), (y0, y1): (u32, u32), color: Rgba) {
		for y in y0..y1.min(self.height) {
			for x in x0..x1.min(self.width) {
				self.set_pixel(i64::from(x), i64::from(y), color);
			}
		}
	}

	/// Bresenham line, endpoints included.
	fn draw_line(&mut self, (mut x, mut y): (i64, i64), (x1, y1): (i64, i64), color: Rgba) {
		let dx = (x1 - x).abs();
		let dy = -(y1 - y).abs();
		let step_x = if x < x1 { 1 } else { -1 };
		let step_y = if y < y1 { 1 } else { -1 };
		let mut error = dx + dy;

		loop {
			self.set_pixel(x, y, color);
			if x == x1 && y == y1 {
				break;
			}

			let doubled = 2 * error;
			if doubled >= dy {
				error += dy;
				x += step_x;
			}
			if doubled <= dx {
				error += dx;
				y += step_y;
			}
		}
	}

	pub fn encode_png(&self) -> anyhow::Result<Vec<u8>> {
		let mut buffer = Vec::new();

		{
			let mut encoder = png::Encoder::new(&mut buffer, self.width, self.height);
			encoder.set_color(png::ColorType::Rgba);
			encoder.set_depth(png::BitDepth::Eight);

			let mut writer = encoder.write_header().context("Failed to write PNG header")?;
			writer.write_image_data(&self.pixels).context("Failed to encode PNG data")?;
		}

		Ok(buffer)
	}
}

/// Maps timestamps and levels onto the plot area inside the margins.
struct Frame {
	start_millis: i64,
	span_millis: i64,
	lower: f64,
	upper: f64,
}

impl Frame {
	const LEFT: u32 = MARGIN;
	const RIGHT: u32 = WIDTH - MARGIN;
	const TOP: u32 = MARGIN;
	const BOTTOM: u32 = HEIGHT - MARGIN;

	fn new(report: &FileReport) -> Self {
		let (start_millis, end_millis) = match (report.readings.first(), report.readings.last()) {
			(Some(first), Some(last)) => (first.epoch_millis(), last.epoch_millis()),
			_ => (0, 0),
		};

		let values = report.readings.iter().map(|r| r.value).chain(report.analysis.smoothed.values.iter().copied());
		let (mut lower, mut upper) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
		if !lower.is_finite() || !upper.is_finite() {
			(lower, upper) = (0.0, 1.0);
		}
		if upper <= lower {
			lower -= 0.5;
			upper += 0.5;
		}
		let padding = (upper - lower) * VALUE_PADDING;

		Self {
			start_millis,
			span_millis: (end_millis - start_millis).max(1),
			lower: lower - padding,
			upper: upper + padding,
		}
	}

	fn x(&self, at: DateTime<Utc>) -> i64 {
		let fraction = (at.timestamp_millis() - self.start_millis) as f64 / self.span_millis as f64;

		i64::from(Self::LEFT) + (fraction * f64::from(Self::RIGHT - Self::LEFT)).round() as i64
	}

	fn y(&self, value: f64) -> i64 {
		let fraction = (value - self.lower) / (self.upper - self.lower);

		i64::from(Self::BOTTOM) - (fraction * f64::from(Self::BOTTOM - Self::TOP)).round() as i64
	}

	/// Horizontal pixel range `start..end` covered by `from..=to`, at least one pixel wide.
	fn span(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> (u32, u32) {
		let clamp = |x: i64| x.clamp(i64::from(Self::LEFT), i64::from(Self::RIGHT)) as u32;
		let start = clamp(self.x(from));

		(start, clamp(self.x(to)).max(start + 1))
	}
}

/// Pixel columns shaded for each pump-off interval, in interval order.
pub fn pump_off_spans(report: &FileReport) -> Vec<(u32, u32)> {
	let frame = Frame::new(report);

	report.analysis.intervals.iter().map(|interval| frame.span(interval.start_time, interval.end_time)).collect()
}

pub fn render_chart(report: &FileReport) -> Canvas {
	let frame = Frame::new(report);
	let mut canvas = Canvas::new(WIDTH, HEIGHT, Rgba::BACKGROUND);

	for span in pump_off_spans(report) {
		canvas.fill_rect(span, (Frame::TOP, Frame::BOTTOM), Rgba::PUMP_OFF);
	}

	for (level, color) in [(report.levels.static_level, Rgba::STATIC_LEVEL), (report.levels.dynamic_level, Rgba::DYNAMIC_LEVEL)] {
		if let Some(level) = level {
			let y = frame.y(level);
			canvas.draw_line((i64::from(Frame::LEFT), y), (i64::from(Frame::RIGHT), y), color);
		}
	}

	let raw: Vec<(i64, i64)> = report.readings.iter().map(|r| (frame.x(r.timestamp), frame.y(r.value))).collect();
	draw_polyline(&mut canvas, &raw, Rgba::RAW);

	let smoothed: Vec<(i64, i64)> =
		smoothed_points(report).iter().map(|p| (frame.x(p.timestamp), frame.y(p.value))).collect();
	draw_polyline(&mut canvas, &smoothed, Rgba::SMOOTHED);

	let (left, right, top, bottom) =
		(i64::from(Frame::LEFT), i64::from(Frame::RIGHT), i64::from(Frame::TOP), i64::from(Frame::BOTTOM));
	canvas.draw_line((left, bottom), (right, bottom), Rgba::AXIS);
	canvas.draw_line((left, top), (left, bottom), Rgba::AXIS);

	canvas
}

fn draw_polyline(canvas: &mut Canvas, points: &[(i64, i64)], color: Rgba) {
	match points {
		[] => {},
		[single] => canvas.set_pixel(single.0, single.1, color),
		_ => {
			for pair in points.windows(2) {
				canvas.draw_line(pair[0], pair[1], color);
			}
		},
	}
}

/// Writes `<dir>/<input file stem>.png` and returns its path.
pub fn write_png(dir: &Path, report: &FileReport) -> anyhow::Result<PathBuf> {
	let target = output_path(dir, report, "png")?;

	let bytes = render_chart(report).encode_png()?;
	fs::write(&target, bytes).with_context(|| format!("Failed to write chart image: {}", target.display()))?;

	info!(path = %target.display(), intervals = report.analysis.intervals.len(), "Chart image written");

	Ok(target)
}
