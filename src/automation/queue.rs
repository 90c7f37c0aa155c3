//! Work queue between the capture scheduler and the recognition workers.
//!
//! Uses a std::sync::mpsc channel. The scheduler sends captured cards in
//! inventory order; workers share the receiver and may finish out of order,
//! so every task carries its sequence id.

use chrono::{DateTime, Local};
use std::sync::mpsc::{channel, Receiver, Sender};

use crate::scan::{CardCapture, ItemKind};

/// A captured card waiting to be recognized.
#[derive(Debug)]
pub struct RecognitionTask {
    /// Position in the inventory, counted from 0.
    pub id: u64,
    pub kind: ItemKind,
    pub capture: CardCapture,
    /// Timestamp when the card was captured
    pub captured_at: DateTime<Local>,
}

impl RecognitionTask {
    pub fn new(id: u64, kind: ItemKind, capture: CardCapture) -> Self {
        Self {
            id,
            kind,
            capture,
            captured_at: Local::now(),
        }
    }
}

/// Creates a new work queue.
///
/// The channel is unbounded: captured cards queue up if recognition is
/// slower than navigation.
pub fn create_work_queue() -> (Sender<RecognitionTask>, Receiver<RecognitionTask>) {
    channel()
}
