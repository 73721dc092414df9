use image::RgbaImage;
use serde::{Deserialize, Serialize};

/// Normalized screen region (0.0-1.0 coordinates relative to the game frame)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenRegion {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Well-known regions of the portrait 450x800 reference frame
pub mod regions {
    use super::ScreenRegion;

    /// Own elixir bar along the bottom edge, right of the next-card preview
    pub fn elixir_bar() -> ScreenRegion {
        ScreenRegion {
            x: 0.236,
            y: 0.958,
            width: 0.740,
            height: 0.022,
        }
    }
}

/// Crop a region from a frame using normalized coordinates
pub fn crop_region(frame: &RgbaImage, region: &ScreenRegion) -> RgbaImage {
    let (w, h) = (frame.width(), frame.height());
    let x = (region.x * w as f64) as u32;
    let y = (region.y * h as f64) as u32;
    let rw = (region.width * w as f64) as u32;
    let rh = (region.height * h as f64) as u32;

    // Clamp to image bounds
    let x = x.min(w.saturating_sub(1));
    let y = y.min(h.saturating_sub(1));
    let rw = rw.min(w.saturating_sub(x));
    let rh = rh.min(h.saturating_sub(y));

    image::imageops::crop_imm(frame, x, y, rw, rh).to_image()
}
