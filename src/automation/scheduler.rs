//! Capture scheduler for walking the inventory grid.
//!
//! Sequences through: select item → capture card → enqueue → advance, with a
//! scroll whenever a screen of items has been passed. Each step checks the
//! cancellation flag first. Runs on a single thread; recognition happens on
//! the workers.

use std::sync::mpsc::Sender;

use crate::automation::grid::GridCursor;
use crate::automation::navigator::Navigator;
use crate::automation::queue::RecognitionTask;
use crate::config::ScannerConfig;
use crate::error::ScanError;
use crate::scan::{is_enhancement_ore, CardCapture, ItemKind, ScanContext};

/// Scheduler states.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerState {
    /// Still walking the grid
    Running,
    /// Every requested item was enqueued
    Complete,
    /// Reached the enhancement ores at the end of the weapon list
    ReachedEnhancementOre,
    /// Cancellation was requested
    Aborted,
}

impl std::fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchedulerState::Running => write!(f, "Running"),
            SchedulerState::Complete => write!(f, "Complete"),
            SchedulerState::ReachedEnhancementOre => write!(f, "Reached enhancement ore"),
            SchedulerState::Aborted => write!(f, "Aborted"),
        }
    }
}

pub struct CaptureScheduler<'a> {
    config: &'a ScannerConfig,
    ctx: &'a ScanContext<'a>,
    kind: ItemKind,
    target: u64,
    cursor: GridCursor,
    sender: Sender<RecognitionTask>,
    state: SchedulerState,
    enqueued: u64,
    scrolls: u64,
}

impl<'a> CaptureScheduler<'a> {
    pub fn new(
        config: &'a ScannerConfig,
        ctx: &'a ScanContext<'a>,
        kind: ItemKind,
        target: u64,
        sender: Sender<RecognitionTask>,
    ) -> Self {
        Self {
            config,
            ctx,
            kind,
            target,
            cursor: GridCursor::new(&config.grid),
            sender,
            state: SchedulerState::Running,
            enqueued: 0,
            scrolls: 0,
        }
    }

    pub fn state(&self) -> &SchedulerState {
        &self.state
    }

    pub fn enqueued(&self) -> u64 {
        self.enqueued
    }

    pub fn scrolls(&self) -> u64 {
        self.scrolls
    }

    /// Captures and enqueues one item.
    ///
    /// Returns `Ok(true)` while there are items left, `Ok(false)` once the
    /// scheduler has stopped. Navigation and capture failures are returned
    /// as errors and end the traversal.
    pub fn step(&mut self, navigator: &mut dyn Navigator) -> Result<bool, ScanError> {
        if self.state != SchedulerState::Running {
            return Ok(false);
        }
        if self.ctx.cancel.is_cancelled() {
            tracing::info!("Cancellation requested, stopping at item {}", self.enqueued);
            self.state = SchedulerState::Aborted;
            return Ok(false);
        }
        if self.enqueued >= self.target {
            self.state = SchedulerState::Complete;
            return Ok(false);
        }

        let window = navigator.geometry();
        let (x, y) = self.cursor.position(&self.config.grid, &window);
        navigator.move_to(x, y)?;
        navigator.click()?;
        navigator.wait(self.config.delays.select_item());

        let card_region = self.config.card.card.to_pixels(window.width, window.height);
        let card = navigator.capture_region(card_region)?;
        let capture = CardCapture::segment(&card, &self.config.card)?;

        if self.kind == ItemKind::Weapon
            && self.config.stop_at_enhancement_ore
            && is_enhancement_ore(self.ctx, &capture.name)?
        {
            tracing::info!("Item {} is an enhancement ore, end of weapons", self.enqueued);
            self.state = SchedulerState::ReachedEnhancementOre;
            return Ok(false);
        }

        let id = self.enqueued;
        if self
            .sender
            .send(RecognitionTask::new(id, self.kind, capture))
            .is_err()
        {
            // Every worker has exited
            return Err(ScanError::Cancelled);
        }
        self.enqueued += 1;
        self.ctx
            .observer
            .progress(self.enqueued as usize, self.target as usize);

        if self.cursor.advance() {
            self.scroll(navigator)?;
        }

        if self.enqueued >= self.target {
            self.state = SchedulerState::Complete;
            return Ok(false);
        }
        Ok(true)
    }

    fn scroll(&mut self, navigator: &mut dyn Navigator) -> Result<(), ScanError> {
        self.ctx.observer.status("Scrolling");
        for _ in 0..self.config.grid.scroll_steps {
            navigator.scroll(-1)?;
            navigator.wait(self.config.delays.scroll_step());
        }
        self.scrolls += 1;
        Ok(())
    }

    /// Runs until the scheduler stops, then closes the queue.
    pub fn run(mut self, navigator: &mut dyn Navigator) -> Result<SchedulerSummary, ScanError> {
        tracing::info!("Capturing {} {:?} items", self.target, self.kind);
        while self.step(navigator)? {}
        tracing::info!(
            "Capture finished ({}): {} items, {} scrolls",
            self.state,
            self.enqueued,
            self.scrolls
        );
        Ok(SchedulerSummary {
            state: self.state,
            enqueued: self.enqueued,
            scrolls: self.scrolls,
        })
    }
}

/// How a traversal ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerSummary {
    pub state: SchedulerState,
    pub enqueued: u64,
    pub scrolls: u64,
}
