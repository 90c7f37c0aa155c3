//! Inventory automation.
//!
//! This module provides:
//! - The navigator seam over pointer input and screen capture
//! - Grid traversal and item counter reading
//! - The capture scheduler, recognition workers and the session runner

pub mod count;
pub mod grid;
pub mod navigator;
pub mod queue;
pub mod runner;
pub mod scheduler;
pub mod worker;

pub use count::{detect_item_count, parse_item_count};
pub use grid::GridCursor;
pub use navigator::{Navigator, ReplayNavigator, WindowGeometry};
pub use runner::{save_report, ScanReport, ScanSession};
pub use scheduler::{CaptureScheduler, SchedulerState};
