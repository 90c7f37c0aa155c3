//! Progress reporting out of a scan session.
//!
//! The session never talks to a UI directly. It reports through a
//! [`ScanObserver`], which may log, write preview images, or update counters
//! that another thread polls.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use image::RgbaImage;
use parking_lot::Mutex;

pub trait ScanObserver: Send + Sync {
    /// `done` of `total` items have been captured.
    fn progress(&self, _done: usize, _total: usize) {}

    /// Current high-level step, e.g. "Scrolling".
    fn status(&self, _message: &str) {}

    /// A preprocessed field image and the text read from it.
    fn preview(&self, _field: &str, _image: &RgbaImage, _text: &str) {}

    /// A non-fatal problem, such as a field that did not resolve.
    fn warning(&self, _message: &str) {}
}

impl<T: ScanObserver + ?Sized> ScanObserver for Arc<T> {
    fn progress(&self, done: usize, total: usize) {
        (**self).progress(done, total)
    }

    fn status(&self, message: &str) {
        (**self).status(message)
    }

    fn preview(&self, field: &str, image: &RgbaImage, text: &str) {
        (**self).preview(field, image, text)
    }

    fn warning(&self, message: &str) {
        (**self).warning(message)
    }
}

/// Observer that ignores everything.
pub struct NullObserver;

impl ScanObserver for NullObserver {}

/// Writes everything to the log.
pub struct TracingObserver;

impl ScanObserver for TracingObserver {
    fn progress(&self, done: usize, total: usize) {
        tracing::info!("Captured {}/{}", done, total);
    }

    fn status(&self, message: &str) {
        tracing::info!("{}", message);
    }

    fn preview(&self, field: &str, _image: &RgbaImage, text: &str) {
        tracing::debug!("{}: {:?}", field, text.trim());
    }

    fn warning(&self, message: &str) {
        tracing::warn!("{}", message);
    }
}

/// Saves every preview image as a numbered PNG.
pub struct PreviewDump {
    dir: PathBuf,
    counter: AtomicU64,
}

impl PreviewDump {
    pub fn new(dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            counter: AtomicU64::new(0),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ScanObserver for PreviewDump {
    fn preview(&self, field: &str, image: &RgbaImage, _text: &str) {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        let path = self.dir.join(format!("{:05}_{}.png", n, field));
        if let Err(e) = image.save(&path) {
            tracing::warn!("Failed to save preview {}: {}", path.display(), e);
        }
    }
}

/// Counters another thread can poll while a scan runs.
#[derive(Default)]
pub struct ProgressCounters {
    done: AtomicUsize,
    total: AtomicUsize,
    warnings: AtomicUsize,
    status: Mutex<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub done: usize,
    pub total: usize,
    pub warnings: usize,
    pub status: String,
}

impl ProgressCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            done: self.done.load(Ordering::SeqCst),
            total: self.total.load(Ordering::SeqCst),
            warnings: self.warnings.load(Ordering::SeqCst),
            status: self.status.lock().clone(),
        }
    }
}

impl ScanObserver for ProgressCounters {
    fn progress(&self, done: usize, total: usize) {
        self.total.store(total, Ordering::SeqCst);
        self.done.store(done, Ordering::SeqCst);
    }

    fn status(&self, message: &str) {
        *self.status.lock() = message.to_string();
    }

    fn warning(&self, _message: &str) {
        self.warnings.fetch_add(1, Ordering::SeqCst);
    }
}

/// Forwards every event to each inner observer in turn.
#[derive(Default)]
pub struct Observers(Vec<Box<dyn ScanObserver>>);

impl Observers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, observer: impl ScanObserver + 'static) -> Self {
        self.0.push(Box::new(observer));
        self
    }
}

impl ScanObserver for Observers {
    fn progress(&self, done: usize, total: usize) {
        self.0.iter().for_each(|o| o.progress(done, total));
    }

    fn status(&self, message: &str) {
        self.0.iter().for_each(|o| o.status(message));
    }

    fn preview(&self, field: &str, image: &RgbaImage, text: &str) {
        self.0.iter().for_each(|o| o.preview(field, image, text));
    }

    fn warning(&self, message: &str) {
        self.0.iter().for_each(|o| o.warning(message));
    }
}
