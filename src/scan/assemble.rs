//! Joining the four field scans of a card into one record.

use chrono::{DateTime, Local};
use serde::Serialize;
use std::thread::{self, ScopedJoinHandle};

use super::card::{CardCapture, ItemKind, Rarity};
use super::field::{scan_level, scan_name, scan_owner, scan_refinement, FieldResult, Level, ScanContext};
use crate::config::RarityColors;
use crate::error::ScanError;

/// A finished weapon or artifact.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemRecord {
    /// Position in the inventory, counted from 0.
    pub id: u64,
    pub kind: ItemKind,
    pub rarity: Option<Rarity>,
    pub name: FieldResult<String>,
    pub level: FieldResult<Level>,
    pub refinement: FieldResult<u8>,
    pub owner: FieldResult<Option<String>>,
    pub captured_at: DateTime<Local>,
}

impl ItemRecord {
    /// Below three stars; nothing was scanned.
    pub fn is_skipped(&self) -> bool {
        self.rarity.is_none()
    }

    /// Every field resolved.
    pub fn is_complete(&self) -> bool {
        self.name.is_resolved()
            && self.level.is_resolved()
            && self.refinement.is_resolved()
            && self.owner.is_resolved()
    }
}

/// Scans the four fields of a card on their own threads and builds its record.
///
/// Cards without a recognized rarity tier are returned with every field
/// `Skipped` and no OCR is run. If any field scan fails, the first failure
/// (in name, level, refinement, owner order) is returned once all four
/// have finished.
pub fn scan_card(
    ctx: &ScanContext<'_>,
    id: u64,
    kind: ItemKind,
    capture: CardCapture,
    colors: &RarityColors,
    captured_at: DateTime<Local>,
) -> Result<ItemRecord, ScanError> {
    let Some(rarity) = capture.rarity(colors) else {
        tracing::debug!("Item {} is below three stars, skipping", id);
        return Ok(ItemRecord {
            id,
            kind,
            rarity: None,
            name: FieldResult::Skipped,
            level: FieldResult::Skipped,
            refinement: FieldResult::Skipped,
            owner: FieldResult::Skipped,
            captured_at,
        });
    };

    let (name, level, refinement, owner) = thread::scope(|s| {
        let name = s.spawn(|| scan_name(ctx, &capture.name, kind));
        let level = s.spawn(|| scan_level(ctx, &capture.level));
        let refinement = s.spawn(|| scan_refinement(ctx, &capture.refinement));
        let owner = s.spawn(|| scan_owner(ctx, &capture.owner));
        (join(name), join(level), join(refinement), join(owner))
    });
    drop(capture);

    let record = ItemRecord {
        id,
        kind,
        rarity: Some(rarity),
        name: name?,
        level: level?,
        refinement: refinement?,
        owner: owner?,
        captured_at,
    };
    tracing::debug!(
        "Item {}: {:?} {:?} r{:?} {:?}",
        id,
        record.name.resolved(),
        record.level.resolved(),
        record.refinement.resolved(),
        record.owner.resolved()
    );
    Ok(record)
}

/// Waits for a field scan, re-raising its panic on this thread.
fn join<T>(handle: ScopedJoinHandle<'_, T>) -> T {
    handle
        .join()
        .unwrap_or_else(|payload| std::panic::resume_unwind(payload))
}
