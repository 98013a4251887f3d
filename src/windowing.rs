use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use chrono::NaiveDate;

use crate::series::Frame;
use crate::tags::{
    parse_first_number, Derived, TagMap, COLUMNS, CONTENT_DATE, CONTENT_TIME, PIXEL_SPACING, ROWS,
    STUDY_DATE, STUDY_TIME, WINDOW_CENTER, WINDOW_WIDTH,
};

pub const CENTER_RANGE: RangeInclusive<f64> = -1024.0..=3000.0;
pub const WIDTH_RANGE: RangeInclusive<f64> = 1.0..=4000.0;

/// Soft-tissue window used whenever the embedded window/level is unusable.
pub const FALLBACK_WINDOW: WindowSpec = WindowSpec {
    center: 40.0,
    width: 400.0,
};

const DEFAULT_GEOMETRY: f64 = 512.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowSpec {
    pub center: f64,
    pub width: f64,
}

impl WindowSpec {
    pub const fn new(center: f64, width: f64) -> Self {
        Self { center, width }
    }

    /// Width by magnitude into `WIDTH_RANGE`, center into `CENTER_RANGE`.
    pub fn clamped(self) -> Self {
        Self {
            center: self.center.clamp(*CENTER_RANGE.start(), *CENTER_RANGE.end()),
            width: self.width.abs().clamp(*WIDTH_RANGE.start(), *WIDTH_RANGE.end()),
        }
    }

    pub fn bounds(self) -> (f64, f64) {
        let half = self.width / 2.0;
        (self.center - half, self.center + half)
    }

    fn is_valid(self) -> bool {
        CENTER_RANGE.contains(&self.center) && WIDTH_RANGE.contains(&self.width)
    }
}

impl fmt::Display for WindowSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "W {} / L {}", self.width, self.center)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Preset {
    Standard,
    SoftTissue,
    ContrastEnhanced,
    Perfusion,
}

impl Preset {
    pub const ALL: [Preset; 4] = [
        Preset::Standard,
        Preset::SoftTissue,
        Preset::ContrastEnhanced,
        Preset::Perfusion,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Preset::Standard => "Standard",
            Preset::SoftTissue => "Soft Tissue",
            Preset::ContrastEnhanced => "Contrast Enhanced",
            Preset::Perfusion => "Perfusion",
        }
    }

    pub fn window(self) -> WindowSpec {
        match self {
            Preset::Standard => WindowSpec::new(40.0, 400.0),
            Preset::SoftTissue => WindowSpec::new(50.0, 450.0),
            Preset::ContrastEnhanced => WindowSpec::new(100.0, 700.0),
            Preset::Perfusion => WindowSpec::new(150.0, 800.0),
        }
    }
}

impl FromStr for Preset {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        let token = value
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        Preset::ALL
            .into_iter()
            .find(|preset| preset.label().replace(' ', "").to_ascii_lowercase() == token)
            .ok_or_else(|| anyhow!("Unknown window preset '{value}'"))
    }
}

/// Window selection as made in the controls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WindowChoice {
    Preset(Preset),
    Custom(WindowSpec),
}

impl WindowChoice {
    /// Custom sliders still sitting on the DICOM-derived defaults mean "show
    /// the original values".
    pub fn is_pass_through(&self, default: WindowSpec) -> bool {
        matches!(self, WindowChoice::Custom(spec) if *spec == default)
    }

    pub fn window(&self) -> WindowSpec {
        match self {
            WindowChoice::Preset(preset) => preset.window(),
            WindowChoice::Custom(spec) => *spec,
        }
    }

    pub fn label(&self, default: WindowSpec) -> String {
        match self {
            _ if self.is_pass_through(default) => "Original Values".to_string(),
            WindowChoice::Preset(preset) => format!("{} ({})", preset.label(), preset.window()),
            WindowChoice::Custom(spec) => spec.clamped().to_string(),
        }
    }
}

/// Display-ready 8-bit grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrayFrame {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Windowed {
    Gray(GrayFrame),
    /// Untouched intensities, shown as "Original Values".
    Original(Frame),
}

impl Windowed {
    pub fn is_original(&self) -> bool {
        matches!(self, Windowed::Original(_))
    }

    pub fn size(&self) -> [usize; 2] {
        match self {
            Windowed::Gray(gray) => [gray.width, gray.height],
            Windowed::Original(frame) => [frame.width(), frame.height()],
        }
    }
}

/// Linear window/level into 0..=255. A degenerate range hands back the
/// frame unchanged.
pub fn normalize(frame: &Frame, center: f64, width: f64) -> Derived<Windowed> {
    let window = WindowSpec::new(center, width).clamped();
    let (low, high) = window.bounds();
    let range = high - low;
    if !(range > 0.0) {
        let reason = format!("degenerate window range [{low}, {high}]");
        log::warn!("Windowing skipped: {reason}");
        return Derived::fallback(pass_through(frame), reason);
    }

    let pixels = frame
        .pixels()
        .iter()
        .map(|&sample| {
            let clamped = (sample as f64).clamp(low, high);
            ((clamped - low) / range * 255.0).round() as u8
        })
        .collect();

    Derived::Parsed(Windowed::Gray(GrayFrame {
        width: frame.width(),
        height: frame.height(),
        pixels,
    }))
}

pub fn pass_through(frame: &Frame) -> Windowed {
    Windowed::Original(frame.clone())
}

/// Applies the user's window choice against the slice's default window.
pub fn apply_window(frame: &Frame, choice: &WindowChoice, default: WindowSpec) -> Windowed {
    if choice.is_pass_through(default) {
        return pass_through(frame);
    }
    let window = choice.window();
    normalize(frame, window.center, window.width).into_value()
}

pub fn default_window_level(tags: &TagMap) -> Derived<WindowSpec> {
    let center = tags.get(WINDOW_CENTER).and_then(parse_first_number);
    let width = tags.get(WINDOW_WIDTH).and_then(parse_first_number);
    match (center, width) {
        (Some(center), Some(width)) => {
            let spec = WindowSpec::new(center, width);
            if spec.is_valid() {
                Derived::Parsed(spec)
            } else {
                Derived::fallback(
                    FALLBACK_WINDOW,
                    format!("embedded window {spec} is outside the supported range"),
                )
            }
        }
        _ => Derived::fallback(FALLBACK_WINDOW, "window center/width missing or unreadable"),
    }
}

/// Display aspect from pixel spacing, else from the image geometry.
pub fn aspect_ratio(tags: &TagMap) -> Derived<f64> {
    if let Some(ratio) = tags.trimmed(PIXEL_SPACING).and_then(spacing_ratio) {
        return Derived::Parsed(ratio);
    }

    let rows = geometry(tags, ROWS);
    let columns = geometry(tags, COLUMNS);
    match (rows, columns) {
        (Some(rows), Some(columns)) if rows > 0.0 && columns > 0.0 => {
            Derived::fallback(rows / columns, "pixel spacing missing or unreadable")
        }
        _ => Derived::fallback(1.0, "pixel spacing and image geometry unusable"),
    }
}

fn spacing_ratio(value: &str) -> Option<f64> {
    let mut parts = value.split('\\').map(|part| part.trim().parse::<f64>());
    let row_spacing = parts.next()?.ok()?;
    let column_spacing = parts.next()?.ok()?;
    let ratio = column_spacing / row_spacing;
    (ratio.is_finite() && ratio > 0.0).then_some(ratio)
}

fn geometry(tags: &TagMap, code: &str) -> Option<f64> {
    match tags.trimmed(code) {
        None => Some(DEFAULT_GEOMETRY),
        Some(value) => value.parse::<f64>().ok(),
    }
}

/// `"Jun 15, 2023 | 14:32:05"` from content (or study) date and time, or an
/// empty string.
pub fn format_capture_moment(tags: &TagMap) -> String {
    capture_moment(tags).unwrap_or_default()
}

fn capture_moment(tags: &TagMap) -> Option<String> {
    let date = tags.first_present(&[CONTENT_DATE, STUDY_DATE])?;
    let time = tags.first_present(&[CONTENT_TIME, STUDY_TIME])?;

    let date = NaiveDate::parse_from_str(date, "%Y%m%d").ok()?;
    let clock = time.get(0..6).filter(|hms| hms.bytes().all(|b| b.is_ascii_digit()))?;

    Some(format!(
        "{} | {}:{}:{}",
        date.format("%b %d, %Y"),
        &clock[0..2],
        &clock[2..4],
        &clock[4..6]
    ))
}
