//! Scan session - main entry point for a full inventory scan.
//!
//! Coordinates the capture scheduler and the recognition workers. The
//! scheduler runs on the calling thread, workers run on scoped threads and
//! share the engine pool.

use anyhow::{Context, Result};
use chrono::Local;
use parking_lot::Mutex;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use crate::automation::count::detect_item_count;
use crate::automation::navigator::Navigator;
use crate::automation::queue::create_work_queue;
use crate::automation::scheduler::{CaptureScheduler, SchedulerState};
use crate::automation::worker::{run_recognition_worker, ResultSink, TaskFailure};
use crate::catalog::CatalogSet;
use crate::config::ScannerConfig;
use crate::error::PoolError;
use crate::observer::ScanObserver;
use crate::ocr::{Cancellation, EngineFactory, EnginePool};
use crate::scan::{ItemKind, ItemRecord, ScanContext};

/// Outcome of one scan.
#[derive(Debug, Serialize)]
pub struct ScanReport {
    pub kind: ItemKind,
    /// How the traversal ended.
    pub state: SchedulerState,
    /// Sorted by id.
    pub records: Vec<ItemRecord>,
    pub failures: Vec<TaskFailure>,
    pub enqueued: u64,
    /// Records below three stars.
    pub skipped: usize,
    pub scrolls: u64,
}

/// Everything a scan needs that outlives a single run.
pub struct ScanSession {
    config: ScannerConfig,
    pool: EnginePool,
    catalogs: CatalogSet,
    observer: Arc<dyn ScanObserver>,
    /// Token for the current or next run. Replaced once a run ends cancelled.
    cancel: Mutex<Cancellation>,
}

impl ScanSession {
    pub fn new(
        config: ScannerConfig,
        factory: Arc<dyn EngineFactory>,
        catalogs: CatalogSet,
        observer: Arc<dyn ScanObserver>,
    ) -> Result<Self, PoolError> {
        let pool = EnginePool::new(config.ocr.pool_capacity, factory)?;
        Ok(Self {
            config,
            pool,
            catalogs,
            observer,
            cancel: Mutex::new(Cancellation::new()),
        })
    }

    /// Handle for stopping the current or next run from another thread.
    pub fn cancellation(&self) -> Cancellation {
        self.cancel.lock().clone()
    }

    pub fn pool(&self) -> &EnginePool {
        &self.pool
    }

    pub fn catalogs(&self) -> &CatalogSet {
        &self.catalogs
    }

    /// Scans `target` items of `kind`, reading the item counter when no
    /// target is given.
    ///
    /// # Errors
    /// Returns an error if:
    /// - The item counter cannot be read
    /// - Navigation or capture fails
    /// - A worker hits a fatal error, such as a missing catalog entry
    pub fn run(
        &self,
        navigator: &mut dyn Navigator,
        kind: ItemKind,
        target: Option<u64>,
    ) -> Result<ScanReport> {
        let cancel = self.cancellation();
        let result = self.run_with(navigator, kind, target, &cancel);

        // A stopped run must not leave the session stopped for the next one.
        if cancel.is_cancelled() {
            let mut current = self.cancel.lock();
            if current.is_cancelled() {
                *current = Cancellation::new();
            }
        }
        result
    }

    fn run_with(
        &self,
        navigator: &mut dyn Navigator,
        kind: ItemKind,
        target: Option<u64>,
        cancel: &Cancellation,
    ) -> Result<ScanReport> {
        let target = match target {
            Some(target) => target,
            None => detect_item_count(
                navigator,
                &self.config.card,
                self.pool.factory(),
                self.observer.as_ref(),
            )
            .context("Failed to read the item count")?,
        };

        self.observer.status("Scanning");
        let ctx = ScanContext {
            pool: &self.pool,
            catalogs: &self.catalogs,
            observer: self.observer.as_ref(),
            cancel,
            timeout: self.config.ocr.checkout_timeout(),
        };
        let (sender, receiver) = create_work_queue();
        let receiver = Mutex::new(receiver);
        let sink = ResultSink::new();
        let workers = self.config.worker_count();

        tracing::info!("Starting scan: {} items, {} workers", target, workers);

        let traversal = thread::scope(|s| {
            for worker in 0..workers {
                let (receiver, ctx, sink, colors) = (&receiver, &ctx, &sink, &self.config.rarity);
                s.spawn(move || run_recognition_worker(worker, receiver, ctx, colors, sink));
            }

            // The scheduler owns the sender; it is dropped when the traversal
            // ends, which lets the workers drain the queue and exit.
            let result = CaptureScheduler::new(&self.config, &ctx, kind, target, sender).run(navigator);
            if result.is_err() {
                cancel.cancel();
            }
            tracing::info!("Waiting for recognition workers to finish...");
            result
        });

        let (records, failures, fatal) = sink.into_parts();
        if let Some(error) = fatal {
            return Err(anyhow::Error::new(error).context("Scan stopped"));
        }
        let summary = traversal.context("Capture failed")?;

        let skipped = records.iter().filter(|r| r.is_skipped()).count();
        tracing::info!(
            "Scan finished: {} records, {} failures, {} skipped",
            records.len(),
            failures.len(),
            skipped
        );
        self.observer.status("Done");

        Ok(ScanReport {
            kind,
            state: summary.state,
            records,
            failures,
            enqueued: summary.enqueued,
            skipped,
            scrolls: summary.scrolls,
        })
    }
}

/// Writes `records.json` into a new timestamped folder under `output_dir`:
/// `output/YYYYMMDD_HHMMSS/records.json`.
pub fn save_report(report: &ScanReport, output_dir: &Path) -> Result<PathBuf> {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let session_dir = output_dir.join(&timestamp);
    fs::create_dir_all(&session_dir)
        .with_context(|| format!("Failed to create session directory {}", session_dir.display()))?;

    let path = session_dir.join("records.json");
    let json = serde_json::to_string_pretty(report)?;
    fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!("Results saved to {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automation::navigator::ReplayNavigator;
    use crate::config::GridLayout;
    use crate::error::ScanError;
    use crate::observer::{NullObserver, ProgressCounters};
    use crate::ocr::{OcrRequest, PageMode};
    use crate::scan::{FieldResult, Level, Rarity};
    use crate::test_util::{catalogs, ScriptedFactory};
    use image::{Rgba, RgbaImage};
    use std::sync::atomic::{AtomicBool, Ordering};
    use tempfile::tempdir;

    const FIVE_STAR: Rgba<u8> = Rgba([188, 105, 50, 255]);

    fn small_grid() -> ScannerConfig {
        ScannerConfig {
            grid: GridLayout {
                columns: 3,
                rows: 2,
                scroll_steps: 4,
                ..GridLayout::default()
            },
            workers: 3,
            ..ScannerConfig::default()
        }
    }

    /// Reads the item counter first, then answers by field.
    fn inventory_script(count: &'static str) -> ScriptedFactory {
        let counted = Arc::new(AtomicBool::new(false));
        ScriptedFactory::new(move |_, request| {
            let text = match request.page_mode {
                PageMode::SparseText => "Equipped: Bennett",
                _ if *request == OcrRequest::FRACTION => {
                    if counted.swap(true, Ordering::SeqCst) {
                        "90/90"
                    } else {
                        count
                    }
                }
                _ if *request == OcrRequest::DIGITS => "5",
                _ => "Skyward Harp",
            };
            Ok(text.to_string())
        })
    }

    #[test]
    fn test_replay_session_end_to_end() {
        let mut frames: Vec<RgbaImage> = (0..8)
            .map(|_| RgbaImage::from_pixel(640, 360, FIVE_STAR))
            .collect();
        // Grey banner: below three stars
        frames[3] = RgbaImage::from_pixel(640, 360, Rgba([120, 120, 120, 255]));
        let mut nav = ReplayNavigator::new(frames).unwrap();

        let counters = Arc::new(ProgressCounters::new());
        let session = ScanSession::new(
            small_grid(),
            Arc::new(inventory_script("8/2000")),
            catalogs(),
            counters.clone(),
        )
        .unwrap();

        let report = session.run(&mut nav, ItemKind::Weapon, None).unwrap();

        assert_eq!(report.state, SchedulerState::Complete);
        assert_eq!(report.enqueued, 8);
        assert_eq!(report.scrolls, 1);
        assert_eq!(nav.scroll_count(), 4);
        assert_eq!(report.skipped, 1);
        assert!(report.failures.is_empty());
        assert_eq!(
            report.records.iter().map(|r| r.id).collect::<Vec<_>>(),
            (0..8).collect::<Vec<_>>()
        );

        let skipped = &report.records[3];
        assert!(skipped.is_skipped());
        assert_eq!(skipped.name, FieldResult::Skipped);

        let first = &report.records[0];
        assert_eq!(first.rarity, Some(Rarity::FiveStar));
        assert_eq!(first.name, FieldResult::Resolved("SkywardHarp".to_string()));
        assert_eq!(
            first.level,
            FieldResult::Resolved(Level {
                current: 90,
                ascended: true
            })
        );
        assert_eq!(first.refinement, FieldResult::Resolved(5));
        assert_eq!(first.owner, FieldResult::Resolved(Some("Bennett".to_string())));
        assert!(report.records.iter().filter(|r| !r.is_skipped()).all(ItemRecord::is_complete));

        assert_eq!(counters.snapshot().done, 8);
        assert_eq!(session.pool().stats().leased, 0);
    }

    #[test]
    fn test_explicit_target_skips_counter() {
        let frames = (0..2).map(|_| RgbaImage::from_pixel(640, 360, FIVE_STAR)).collect();
        let mut nav = ReplayNavigator::new(frames).unwrap();
        // Every fraction read is a level once the counter is skipped
        let factory = ScriptedFactory::new(|_, request| {
            Ok(if *request == OcrRequest::FRACTION { "20/40" } else { "" }.to_string())
        });
        let session =
            ScanSession::new(small_grid(), Arc::new(factory), catalogs(), Arc::new(NullObserver)).unwrap();

        let report = session.run(&mut nav, ItemKind::Artifact, Some(2)).unwrap();
        assert_eq!(report.records.len(), 2);
        assert_eq!(
            report.records[1].level,
            FieldResult::Resolved(Level {
                current: 20,
                ascended: false
            })
        );
        assert_eq!(report.records[1].name, FieldResult::NoText);
    }

    #[test]
    fn test_missing_traveler_entry_is_fatal() {
        use crate::catalog::{CatalogSource, CharacterRecord};
        use crate::catalog::loader::NameMap;
        use crate::error::CatalogError;
        use crate::test_util::MemorySource;
        use std::collections::BTreeMap;

        struct NoTraveler;
        impl CatalogSource for NoTraveler {
            fn load_weapons(&self) -> Result<NameMap, CatalogError> {
                MemorySource.load_weapons()
            }
            fn load_artifacts(&self) -> Result<NameMap, CatalogError> {
                MemorySource.load_artifacts()
            }
            fn load_materials(&self) -> Result<NameMap, CatalogError> {
                MemorySource.load_materials()
            }
            fn load_dev_materials(&self) -> Result<NameMap, CatalogError> {
                MemorySource.load_dev_materials()
            }
            fn load_all_materials(&self) -> Result<NameMap, CatalogError> {
                MemorySource.load_all_materials()
            }
            fn load_characters(&self) -> Result<BTreeMap<String, CharacterRecord>, CatalogError> {
                let mut records = MemorySource.load_characters()?;
                records.remove("traveler");
                Ok(records)
            }
        }

        let frames = (0..4).map(|_| RgbaImage::from_pixel(640, 360, FIVE_STAR)).collect();
        let mut nav = ReplayNavigator::new(frames).unwrap();
        let session = ScanSession::new(
            small_grid(),
            Arc::new(inventory_script("4/2000")),
            CatalogSet::load(&NoTraveler).unwrap(),
            Arc::new(NullObserver),
        )
        .unwrap();

        let handle = session.cancellation();
        let err = session.run(&mut nav, ItemKind::Weapon, None).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ScanError>(),
            Some(ScanError::Catalog(CatalogError::MissingEntry(_)))
        ));
        assert!(handle.is_cancelled());
        assert!(!session.cancellation().is_cancelled());
    }

    #[test]
    fn test_cancelled_before_start() {
        let frames = (0..3).map(|_| RgbaImage::from_pixel(640, 360, FIVE_STAR)).collect();
        let mut nav = ReplayNavigator::new(frames).unwrap();
        let session = ScanSession::new(
            small_grid(),
            Arc::new(ScriptedFactory::fixed("")),
            catalogs(),
            Arc::new(NullObserver),
        )
        .unwrap();
        session.cancellation().cancel();

        let report = session.run(&mut nav, ItemKind::Artifact, Some(3)).unwrap();
        assert_eq!(report.state, SchedulerState::Aborted);
        assert!(report.records.is_empty());
    }

    #[test]
    fn test_next_run_after_cancel_completes() {
        let frames = || (0..3).map(|_| RgbaImage::from_pixel(640, 360, FIVE_STAR)).collect();
        let session = ScanSession::new(
            small_grid(),
            Arc::new(ScriptedFactory::fixed("")),
            catalogs(),
            Arc::new(NullObserver),
        )
        .unwrap();

        let stale = session.cancellation();
        stale.cancel();
        let mut nav = ReplayNavigator::new(frames()).unwrap();
        let aborted = session.run(&mut nav, ItemKind::Artifact, Some(3)).unwrap();
        assert_eq!(aborted.state, SchedulerState::Aborted);

        let mut nav = ReplayNavigator::new(frames()).unwrap();
        let report = session.run(&mut nav, ItemKind::Artifact, Some(3)).unwrap();
        assert_eq!(report.state, SchedulerState::Complete);
        assert_eq!(report.records.len(), 3);
        assert!(stale.is_cancelled());
    }

    #[test]
    fn test_save_report_writes_json() {
        let dir = tempdir().unwrap();
        let report = ScanReport {
            kind: ItemKind::Artifact,
            state: SchedulerState::Complete,
            records: Vec::new(),
            failures: vec![TaskFailure {
                id: 2,
                error: "OCR engine error: crashed".to_string(),
            }],
            enqueued: 3,
            skipped: 0,
            scrolls: 0,
        };

        let path = save_report(&report, dir.path()).unwrap();
        assert!(path.ends_with("records.json"));
        let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["kind"], "artifact");
        assert_eq!(json["state"], "complete");
        assert_eq!(json["failures"][0]["id"], 2);
    }
}
