//! Scanner configuration.
//!
//! Loaded from config.json at startup. Holds the OCR engine settings, the
//! screen geometry of the inventory card and grid, automation delays and the
//! rarity colours. Every field has a default, so a partial file is fine.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// A rectangle in relative coordinates (0.0 to 1.0) of some parent image.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RelativeRect {
    /// X position of top-left corner (0.0 = left edge, 1.0 = right edge)
    pub x: f32,
    /// Y position of top-left corner (0.0 = top edge, 1.0 = bottom edge)
    pub y: f32,
    /// Width as fraction of parent width
    pub width: f32,
    /// Height as fraction of parent height
    pub height: f32,
}

impl RelativeRect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Converts to pixels inside a parent of the given size, clamped to it.
    pub fn to_pixels(&self, parent_width: u32, parent_height: u32) -> PixelRect {
        let x = ((self.x * parent_width as f32) as u32).min(parent_width);
        let y = ((self.y * parent_height as f32) as u32).min(parent_height);
        let width = ((self.width * parent_width as f32) as u32).min(parent_width - x);
        let height = ((self.height * parent_height as f32) as u32).min(parent_height - y);
        PixelRect { x, y, width, height }
    }
}

impl Default for RelativeRect {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.1, 0.1)
    }
}

/// A rectangle in window pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// A point in relative coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RelativePoint {
    pub x: f32,
    pub y: f32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrSettings {
    /// Explicit tesseract executable; searched for when absent.
    pub tesseract: Option<PathBuf>,
    /// Directory holding the trained model data.
    pub tessdata_dir: Option<PathBuf>,
    /// Model identifier passed as the tesseract language.
    pub model: String,
    /// Number of pooled engines.
    pub pool_capacity: usize,
    /// Give up waiting for a pooled engine after this long. Waits forever when absent.
    pub checkout_timeout_ms: Option<u64>,
}

impl OcrSettings {
    pub fn checkout_timeout(&self) -> Option<Duration> {
        self.checkout_timeout_ms.map(Duration::from_millis)
    }
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            tesseract: None,
            tessdata_dir: None,
            model: "eng".to_string(),
            pool_capacity: 8,
            checkout_timeout_ms: None,
        }
    }
}

/// Where the parts of the item detail card are on screen.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CardLayout {
    /// Detail card, relative to the window.
    pub card: RelativeRect,
    /// Sub-regions, relative to the card.
    pub name: RelativeRect,
    pub level: RelativeRect,
    pub refinement: RelativeRect,
    pub owner: RelativeRect,
    /// Pixel of the name region sampled for the rarity colour.
    pub rarity_sample: (u32, u32),
    /// "current/total" item counter, relative to the window.
    pub item_count: RelativeRect,
}

impl Default for CardLayout {
    fn default() -> Self {
        // Measured on a 1280x720 client area
        Self {
            card: RelativeRect::new(0.6734, 0.1111, 0.2539, 0.7778),
            name: RelativeRect::new(0.0308, 0.0125, 0.9385, 0.0446),
            level: RelativeRect::new(0.0585, 0.3679, 0.2708, 0.0339),
            refinement: RelativeRect::new(0.0585, 0.4179, 0.0738, 0.0357),
            owner: RelativeRect::new(0.1538, 0.9446, 0.8462, 0.0446),
            rarity_sample: (5, 5),
            item_count: RelativeRect::new(0.8281, 0.0278, 0.1133, 0.0347),
        }
    }
}

/// Inventory grid geometry.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct GridLayout {
    pub columns: u32,
    pub rows: u32,
    /// Centre of the first cell, relative to the window.
    pub origin: RelativePoint,
    /// Distance between cell centres, relative to the window.
    pub step_x: f32,
    pub step_y: f32,
    /// Scroll steps that reveal the next `rows * columns` items.
    pub scroll_steps: u32,
}

impl Default for GridLayout {
    fn default() -> Self {
        Self {
            columns: 7,
            rows: 5,
            origin: RelativePoint {
                x: 21.0 / 160.0,
                y: 14.0 / 90.0,
            },
            step_x: 12.25 / 160.0,
            step_y: 14.5 / 90.0,
            scroll_steps: 50,
        }
    }
}

/// Pauses between automation steps, in milliseconds.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Delays {
    /// After clicking an item, before capturing its card.
    pub select_item_ms: u64,
    /// Between single scroll steps.
    pub scroll_step_ms: u64,
}

impl Delays {
    pub fn select_item(&self) -> Duration {
        Duration::from_millis(self.select_item_ms)
    }

    pub fn scroll_step(&self) -> Duration {
        Duration::from_millis(self.scroll_step_ms)
    }
}

impl Default for Delays {
    fn default() -> Self {
        Self {
            select_item_ms: 150,
            scroll_step_ms: 5,
        }
    }
}

/// Sampled colours of the rarity banner, [R, G, B].
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RarityColors {
    pub five_star: [u8; 3],
    pub four_star: [u8; 3],
    pub three_star: [u8; 3],
    /// A channel matches when it differs by less than this.
    pub tolerance: u8,
}

impl Default for RarityColors {
    fn default() -> Self {
        Self {
            five_star: [188, 105, 50],
            four_star: [161, 86, 224],
            three_star: [81, 127, 203],
            tolerance: 10,
        }
    }
}

/// Complete scanner configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    pub ocr: OcrSettings,
    pub card: CardLayout,
    pub grid: GridLayout,
    pub delays: Delays,
    pub rarity: RarityColors,
    /// Threads consuming recognition tasks.
    pub workers: usize,
    /// Stop the traversal at the first enhancement ore (weapon lists end with them).
    pub stop_at_enhancement_ore: bool,
}

impl ScannerConfig {
    pub fn worker_count(&self) -> usize {
        self.workers.max(1)
    }

    /// Loads configuration from `path`, or from config.json next to the
    /// executable. Falls back to defaults when the file is missing or invalid.
    pub fn load(path: Option<&Path>) -> Self {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => crate::paths::get_exe_dir().join("config.json"),
        };

        tracing::info!("Looking for config at: {}", config_path.display());

        if !config_path.exists() {
            tracing::info!("config.json not found. Using default config.");
            return Self::default();
        }

        match fs::read_to_string(&config_path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    tracing::info!("Config loaded from {}", config_path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse config.json: {}. Using defaults.", e);
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read config.json: {}. Using defaults.", e);
                Self::default()
            }
        }
    }
}
