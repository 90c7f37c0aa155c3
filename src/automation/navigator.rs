//! Driving the game window: pointer input and screen capture.
//!
//! All navigation goes through the [`Navigator`] trait so the scheduler can
//! run against a live window or against saved screenshots.

use image::RgbaImage;
use std::path::Path;
use std::time::Duration;

use crate::config::PixelRect;
use crate::error::ScanError;

/// Client area of the game window in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowGeometry {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Pointer and screen access. Only one thread drives it at a time.
pub trait Navigator {
    fn geometry(&self) -> WindowGeometry;

    /// Captures a region given in window pixels.
    fn capture_region(&mut self, region: PixelRect) -> Result<RgbaImage, ScanError>;

    /// Moves the pointer to screen coordinates.
    fn move_to(&mut self, x: i32, y: i32) -> Result<(), ScanError>;

    fn click(&mut self) -> Result<(), ScanError>;

    /// Scrolls the wheel; negative values scroll down.
    fn scroll(&mut self, lines: i32) -> Result<(), ScanError>;

    fn wait(&mut self, duration: Duration);
}

/// One recorded navigator call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    MoveTo(i32, i32),
    Click,
    Scroll(i32),
    Wait(Duration),
    Capture(PixelRect),
}

/// Serves saved window screenshots instead of a live window.
///
/// The first frame is on screen before anything is clicked and stays there
/// for the first click; every later click shows the next frame. Waits return
/// immediately. Every call is recorded.
pub struct ReplayNavigator {
    frames: Vec<RgbaImage>,
    clicks: usize,
    actions: Vec<Action>,
}

impl ReplayNavigator {
    pub fn new(frames: Vec<RgbaImage>) -> Result<Self, ScanError> {
        if frames.is_empty() {
            return Err(ScanError::Capture("no frames to replay".to_string()));
        }
        Ok(Self {
            frames,
            clicks: 0,
            actions: Vec::new(),
        })
    }

    /// Loads every PNG in `dir`, in file name order.
    pub fn from_dir(dir: &Path) -> Result<Self, ScanError> {
        let entries = std::fs::read_dir(dir)
            .map_err(|e| ScanError::Capture(format!("{}: {}", dir.display(), e)))?;
        let mut paths: Vec<_> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| {
                p.extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("png"))
            })
            .collect();
        paths.sort();

        let mut frames = Vec::with_capacity(paths.len());
        for path in &paths {
            let frame = image::open(path)
                .map_err(|e| ScanError::Capture(format!("{}: {}", path.display(), e)))?
                .to_rgba8();
            frames.push(frame);
        }
        tracing::info!("Loaded {} replay frames from {}", frames.len(), dir.display());
        Self::new(frames)
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn scroll_count(&self) -> usize {
        self.actions
            .iter()
            .filter(|a| matches!(a, Action::Scroll(_)))
            .count()
    }

    fn current_frame(&self) -> Result<&RgbaImage, ScanError> {
        let index = self.clicks.saturating_sub(1);
        self.frames
            .get(index)
            .ok_or_else(|| ScanError::Capture(format!("replay has no frame {}", index)))
    }
}

impl Navigator for ReplayNavigator {
    fn geometry(&self) -> WindowGeometry {
        let (width, height) = self.frames[0].dimensions();
        WindowGeometry {
            x: 0,
            y: 0,
            width,
            height,
        }
    }

    fn capture_region(&mut self, region: PixelRect) -> Result<RgbaImage, ScanError> {
        self.actions.push(Action::Capture(region));
        let frame = self.current_frame()?;
        let (w, h) = frame.dimensions();
        if region.x + region.width > w || region.y + region.height > h {
            return Err(ScanError::Capture(format!(
                "region {:?} outside {}x{} frame",
                region, w, h
            )));
        }
        Ok(image::imageops::crop_imm(frame, region.x, region.y, region.width, region.height).to_image())
    }

    fn move_to(&mut self, x: i32, y: i32) -> Result<(), ScanError> {
        self.actions.push(Action::MoveTo(x, y));
        Ok(())
    }

    fn click(&mut self) -> Result<(), ScanError> {
        self.actions.push(Action::Click);
        self.clicks += 1;
        Ok(())
    }

    fn scroll(&mut self, lines: i32) -> Result<(), ScanError> {
        self.actions.push(Action::Scroll(lines));
        Ok(())
    }

    fn wait(&mut self, duration: Duration) {
        self.actions.push(Action::Wait(duration));
    }
}
