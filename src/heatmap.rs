//! # Heatmap color scale
//! Two-segment linear ramp teal → yellow → red for per-country mention counts.
//!
//! `percent = min(count / max(max_count, 1), 1)`; below 0.5 the color runs
//! LOW→MEDIUM, from 0.5 up it runs MEDIUM→HIGH. A zero count is "no data",
//! not LOW.

use serde::{Serialize, Serializer};
use std::fmt;

use crate::aggregate::CountryCount;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// `rgb(r, g, b)`, the form chart consumers take as a fill.
impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({}, {}, {})", self.r, self.g, self.b)
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

/// Dark blue-grey (`#2D3748`) for countries without mentions.
pub const NO_DATA_COLOR: Rgb = Rgb::new(45, 55, 72);
pub const LOW_COLOR: Rgb = Rgb::new(75, 192, 192);
pub const MEDIUM_COLOR: Rgb = Rgb::new(255, 206, 86);
pub const HIGH_COLOR: Rgb = Rgb::new(255, 99, 132);

pub fn color_for(count: u64, max_count: u64) -> Rgb {
    if count == 0 {
        return NO_DATA_COLOR;
    }

    let percent = (count as f64 / max_count.max(1) as f64).min(1.0);
    if percent < 0.5 {
        lerp_rgb(LOW_COLOR, MEDIUM_COLOR, percent * 2.0)
    } else {
        lerp_rgb(MEDIUM_COLOR, HIGH_COLOR, (percent - 0.5) * 2.0)
    }
}

fn lerp_rgb(a: Rgb, b: Rgb, t: f64) -> Rgb {
    Rgb {
        r: lerp_channel(a.r, b.r, t),
        g: lerp_channel(a.g, b.g, t),
        b: lerp_channel(a.b, b.b, t),
    }
}

fn lerp_channel(a: u8, b: u8, t: f64) -> u8 {
    let (a, b) = (f64::from(a), f64::from(b));
    (a + (b - a) * t).round().clamp(0.0, 255.0) as u8
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeatmapCell {
    pub country: String,
    pub count: usize,
    pub color: Rgb,
}

/// Color every country against the hottest one (max floored at 1).
pub fn heatmap(counts: &[CountryCount]) -> Vec<HeatmapCell> {
    let max = counts.iter().map(|c| c.count).max().unwrap_or(0).max(1) as u64;
    counts
        .iter()
        .map(|c| HeatmapCell {
            country: c.country.clone(),
            count: c.count,
            color: color_for(c.count as u64, max),
        })
        .collect()
}
