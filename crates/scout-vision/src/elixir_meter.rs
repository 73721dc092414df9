use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::region::{crop_region, regions, ScreenRegion};

/// The meter is drawn as ten pips; the first also carries the digit label.
pub const SEGMENT_COUNT: usize = 10;
/// Width of the first segment in units of a regular segment
const LEAD_SEGMENT_UNITS: u32 = 2;
const TOTAL_UNITS: u32 = LEAD_SEGMENT_UNITS + (SEGMENT_COUNT as u32 - 1);

/// Colour band and fill thresholds for reading the elixir meter.
///
/// These are calibration values: the lead-segment threshold in particular
/// needs tuning against real captures (0.75 is the other value seen in use).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeterCalibration {
    /// Hue band in degrees, inclusive
    pub hue_min: f64,
    pub hue_max: f64,
    pub min_saturation: f64,
    pub min_value: f64,
    /// Purple fraction above which the lead segment counts as full
    pub lead_segment_threshold: f64,
    /// Purple fraction above which any other segment counts as full
    pub segment_threshold: f64,
}

impl Default for MeterCalibration {
    fn default() -> Self {
        Self {
            hue_min: 265.0,
            hue_max: 320.0,
            min_saturation: 0.35,
            min_value: 0.30,
            lead_segment_threshold: 0.85,
            segment_threshold: 0.60,
        }
    }
}

/// One reading of the meter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElixirReading {
    /// Number of full segments, 0-10
    pub level: u8,
    /// Purple fraction per segment, left to right
    pub fill: [f64; SEGMENT_COUNT],
}

/// Read the player's elixir from a full game frame using the reference bar region.
pub fn read_elixir(frame: &RgbaImage, calibration: &MeterCalibration) -> ElixirReading {
    read_elixir_in(frame, &regions::elixir_bar(), calibration)
}

pub fn read_elixir_in(
    frame: &RgbaImage,
    region: &ScreenRegion,
    calibration: &MeterCalibration,
) -> ElixirReading {
    let roi = crop_region(frame, region);
    read_elixir_bar(&roi, calibration)
}

/// Count full segments in an image that contains only the elixir bar.
pub fn read_elixir_bar(roi: &RgbaImage, calibration: &MeterCalibration) -> ElixirReading {
    let mut fill = [0.0; SEGMENT_COUNT];
    let (w, h) = roi.dimensions();
    if w < TOTAL_UNITS || h == 0 {
        debug!("Elixir ROI too small ({}x{})", w, h);
        return ElixirReading { level: 0, fill };
    }

    let mut level = 0u8;
    for (i, (x_start, x_end)) in segment_bounds(w).into_iter().enumerate() {
        let mut purple = 0u32;
        for y in 0..h {
            for x in x_start..x_end {
                if is_elixir_purple(roi.get_pixel(x, y), calibration) {
                    purple += 1;
                }
            }
        }
        let total = (x_end - x_start) * h;
        fill[i] = purple as f64 / total.max(1) as f64;

        let threshold = if i == 0 {
            calibration.lead_segment_threshold
        } else {
            calibration.segment_threshold
        };
        if fill[i] > threshold {
            level += 1;
        }
    }

    debug!("Elixir meter: {} full segments", level);
    ElixirReading { level, fill }
}

/// Pixel column ranges `[start, end)` for each segment of a bar `width` wide.
/// The lead segment spans two units, the other nine one unit each.
pub fn segment_bounds(width: u32) -> [(u32, u32); SEGMENT_COUNT] {
    let boundary = |units: u32| (width as u64 * units as u64 / TOTAL_UNITS as u64) as u32;
    let mut bounds = [(0, 0); SEGMENT_COUNT];
    let mut units = 0;
    for (i, b) in bounds.iter_mut().enumerate() {
        let span = if i == 0 { LEAD_SEGMENT_UNITS } else { 1 };
        *b = (boundary(units), boundary(units + span));
        units += span;
    }
    bounds
}

fn is_elixir_purple(px: &Rgba<u8>, cal: &MeterCalibration) -> bool {
    let (h, s, v) = rgb_to_hsv(px[0], px[1], px[2]);
    h >= cal.hue_min && h <= cal.hue_max && s >= cal.min_saturation && v >= cal.min_value
}

/// Hue in degrees [0, 360), saturation and value in [0, 1]
fn rgb_to_hsv(r: u8, g: u8, b: u8) -> (f64, f64, f64) {
    let (r, g, b) = (r as f64 / 255.0, g as f64 / 255.0, b as f64 / 255.0);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let hue = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * ((g - b) / delta).rem_euclid(6.0)
    } else if max == g {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };
    let saturation = if max == 0.0 { 0.0 } else { delta / max };

    (hue, saturation, max)
}
