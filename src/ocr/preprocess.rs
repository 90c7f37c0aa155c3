use image::imageops;
use image::{Rgba, RgbaImage};

use crate::config::RelativeRect;

/// A single pixel transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transform {
    /// BT.709 luminance written back to all three channels.
    Grayscale,
    /// Per-channel gamma correction.
    Gamma { red: f64, green: f64, blue: f64 },
    /// Positive values stretch `[a, 255 - a]` onto the full range, negative
    /// values squeeze the full range into `[-a, 255 + a]`.
    Contrast(i32),
    Invert,
    /// Channels at or above the cutoff become 255, the rest 0.
    Threshold(u8),
    /// Adds a constant to every channel.
    Brightness(i32),
}

/// An ordered chain of transforms tuned for one kind of field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Recipe {
    pub name: &'static str,
    pub steps: &'static [Transform],
}

impl Recipe {
    /// Item names: white text on a coloured banner.
    pub const NAME: Recipe = Recipe {
        name: "name",
        steps: &[
            Transform::Gamma {
                red: 0.2,
                green: 0.2,
                blue: 0.2,
            },
            Transform::Grayscale,
            Transform::Invert,
        ],
    };

    /// "Lv. current/max" text.
    pub const LEVEL: Recipe = Recipe {
        name: "level",
        steps: &[Transform::Grayscale, Transform::Invert, Transform::Contrast(100)],
    };

    pub const REFINEMENT: Recipe = Recipe {
        name: "refinement",
        steps: &[Transform::Invert, Transform::Grayscale],
    };

    /// "Equipped: <name>" footer.
    pub const OWNER: Recipe = Recipe {
        name: "owner",
        steps: &[Transform::Grayscale, Transform::Contrast(60)],
    };

    /// Inventory "current/total" counter.
    pub const ITEM_COUNT: Recipe = Recipe {
        name: "item_count",
        steps: &[Transform::Grayscale, Transform::Contrast(60), Transform::Invert],
    };

    pub fn apply(&self, img: &RgbaImage) -> RgbaImage {
        let mut out = img.clone();
        for step in self.steps {
            step.apply_in_place(&mut out);
        }
        out
    }
}

impl Transform {
    pub fn apply_in_place(&self, img: &mut RgbaImage) {
        match *self {
            Transform::Grayscale => {
                for pixel in img.pixels_mut() {
                    let [r, g, b, a] = pixel.0;
                    let luma = 0.2125 * r as f64 + 0.7154 * g as f64 + 0.0721 * b as f64;
                    let v = luma.round().min(255.0) as u8;
                    *pixel = Rgba([v, v, v, a]);
                }
            }
            Transform::Gamma { red, green, blue } => {
                let luts = [gamma_table(red), gamma_table(green), gamma_table(blue)];
                map_channels(img, |c, v| luts[c][v as usize]);
            }
            Transform::Contrast(amount) => {
                let lut = contrast_table(amount);
                map_channels(img, |_, v| lut[v as usize]);
            }
            Transform::Invert => imageops::invert(img),
            Transform::Threshold(cutoff) => {
                map_channels(img, |_, v| if v >= cutoff { 255 } else { 0 })
            }
            Transform::Brightness(delta) => *img = imageops::brighten(&*img, delta),
        }
    }
}

/// Applies `f(channel_index, value)` to R, G and B; alpha is left alone.
fn map_channels(img: &mut RgbaImage, f: impl Fn(usize, u8) -> u8) {
    for pixel in img.pixels_mut() {
        for c in 0..3 {
            pixel.0[c] = f(c, pixel.0[c]);
        }
    }
}

/// `255 * (x / 255)^(1 / gamma)`, rounded and capped at 255.
fn gamma_table(gamma: f64) -> [u8; 256] {
    let mut table = [0u8; 256];
    for (i, entry) in table.iter_mut().enumerate() {
        let v = 255.0 * (i as f64 / 255.0).powf(1.0 / gamma) + 0.5;
        *entry = v.min(255.0) as u8;
    }
    table
}

fn contrast_table(amount: i32) -> [u8; 256] {
    let amount = amount.clamp(-127, 127);
    let mut table = [0u8; 256];
    for (i, entry) in table.iter_mut().enumerate() {
        let v = i as f64;
        let mapped = if amount >= 0 {
            let low = amount as f64;
            let high = 255.0 - low;
            (v - low) * 255.0 / (high - low)
        } else {
            let low = -amount as f64;
            let high = 255.0 - low;
            low + v * (high - low) / 255.0
        };
        *entry = mapped.round().clamp(0.0, 255.0) as u8;
    }
    table
}

/// Crops a sub-region from an image using relative coordinates.
///
/// Converts the relative rect (0.0–1.0) to absolute pixel coordinates,
/// clamps to image bounds, and returns the cropped sub-image.
pub fn crop_region(img: &RgbaImage, region: &RelativeRect) -> RgbaImage {
    let (w, h) = img.dimensions();
    let rect = region.to_pixels(w, h);
    image::imageops::crop_imm(img, rect.x, rect.y, rect.width, rect.height).to_image()
}
