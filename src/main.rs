//! Inventory Scanner command line.
//!
//! Runs a scan against saved window screenshots, or reads single cards,
//! counters and names for checking a layout and a catalog.

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use inventory_scanner::automation::{
    detect_item_count, save_report, ReplayNavigator, ScanSession,
};
use inventory_scanner::catalog::{CatalogKind, CatalogSet, JsonCatalogDir};
use inventory_scanner::config::ScannerConfig;
use inventory_scanner::observer::{Observers, PreviewDump, TracingObserver};
use inventory_scanner::ocr::{locate, Cancellation, EngineFactory, EnginePool, TesseractFactory};
use inventory_scanner::resolve::{normalize, resolve, CharClass};
use inventory_scanner::scan::{
    scan_card, scan_material_name, CardCapture, ItemKind, MaterialKind, ScanContext,
};
use inventory_scanner::{logging, paths};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (defaults to config.json next to the executable)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory with the catalog JSON files
    #[arg(long, global = true)]
    catalogs: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan an inventory tab from a folder of window screenshots
    Scan {
        #[arg(short, long, default_value = "weapon")]
        kind: ItemKind,
        /// Screenshots in click order
        #[arg(short, long)]
        frames: PathBuf,
        /// Number of items; read from the counter when absent
        #[arg(long)]
        count: Option<u64>,
        /// Save every preprocessed field image
        #[arg(long)]
        previews: bool,
    },
    /// Recognize a single detail card image
    Card {
        image: PathBuf,
        #[arg(short, long, default_value = "weapon")]
        kind: ItemKind,
    },
    /// Read the material name from a detail card image
    Material {
        image: PathBuf,
        /// Resolve against the development materials
        #[arg(long)]
        development: bool,
    },
    /// Resolve a piece of text against a catalog
    Resolve {
        #[arg(long, default_value = "weapons")]
        catalog: CatalogKind,
        text: String,
    },
    /// Read the item counter from a window screenshot
    Count { screenshot: PathBuf },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Err(e) = paths::ensure_directories() {
        tracing::warn!("Failed to create output directories: {}", e);
    }

    let config = ScannerConfig::load(cli.config.as_deref());
    let catalog_dir = cli.catalogs.clone().unwrap_or_else(paths::get_catalog_dir);

    match cli.command {
        Command::Scan {
            kind,
            frames,
            count,
            previews,
        } => run_scan(config, &catalog_dir, kind, &frames, count, previews),
        Command::Card { image, kind } => run_card(&config, &catalog_dir, &image, kind),
        Command::Material { image, development } => {
            run_material(&config, &catalog_dir, &image, development)
        }
        Command::Resolve { catalog, text } => run_resolve(&catalog_dir, catalog, &text),
        Command::Count { screenshot } => run_count(&config, &screenshot),
    }
}

fn load_catalogs(dir: &Path) -> Result<CatalogSet> {
    CatalogSet::load(&JsonCatalogDir::new(dir))
        .with_context(|| format!("Failed to load catalogs from {}", dir.display()))
}

fn engine_factory(config: &ScannerConfig) -> Result<Arc<TesseractFactory>> {
    let tesseract = locate(&config.ocr).context("Tesseract is not available")?;
    Ok(Arc::new(TesseractFactory::new(tesseract, &config.ocr.model)))
}

fn load_image(path: &Path) -> Result<image::RgbaImage> {
    Ok(image::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?
        .to_rgba8())
}

fn run_scan(
    config: ScannerConfig,
    catalog_dir: &Path,
    kind: ItemKind,
    frames: &Path,
    count: Option<u64>,
    previews: bool,
) -> Result<()> {
    let catalogs = load_catalogs(catalog_dir)?;
    let factory = engine_factory(&config)?;
    let mut navigator = ReplayNavigator::from_dir(frames)?;

    let mut observers = Observers::new().with(TracingObserver);
    if previews {
        let dir = paths::get_previews_dir().join(Local::now().format("%Y%m%d_%H%M%S").to_string());
        observers = observers.with(PreviewDump::new(&dir)?);
        tracing::info!("Previews: {}", dir.display());
    }

    let session = ScanSession::new(config, factory, catalogs, Arc::new(observers))?;
    let report = session.run(&mut navigator, kind, count)?;
    let path = save_report(&report, &paths::get_output_dir())?;

    println!(
        "{} records ({} skipped, {} failed) written to {}",
        report.records.len(),
        report.skipped,
        report.failures.len(),
        path.display()
    );
    Ok(())
}

fn run_card(config: &ScannerConfig, catalog_dir: &Path, image: &Path, kind: ItemKind) -> Result<()> {
    let catalogs = load_catalogs(catalog_dir)?;
    let factory: Arc<dyn EngineFactory> = engine_factory(config)?;
    let pool = EnginePool::new(config.ocr.pool_capacity, factory)?;
    let cancel = Cancellation::new();
    let ctx = ScanContext {
        pool: &pool,
        catalogs: &catalogs,
        observer: &TracingObserver,
        cancel: &cancel,
        timeout: config.ocr.checkout_timeout(),
    };

    let capture = CardCapture::segment(&load_image(image)?, &config.card)?;
    let record = scan_card(&ctx, 0, kind, capture, &config.rarity, Local::now())?;
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

fn run_material(
    config: &ScannerConfig,
    catalog_dir: &Path,
    image: &Path,
    development: bool,
) -> Result<()> {
    let catalogs = load_catalogs(catalog_dir)?;
    let factory: Arc<dyn EngineFactory> = engine_factory(config)?;
    let pool = EnginePool::new(1, factory)?;
    let cancel = Cancellation::new();
    let ctx = ScanContext {
        pool: &pool,
        catalogs: &catalogs,
        observer: &TracingObserver,
        cancel: &cancel,
        timeout: config.ocr.checkout_timeout(),
    };

    let kind = if development {
        MaterialKind::Development
    } else {
        MaterialKind::Material
    };
    let capture = CardCapture::segment(&load_image(image)?, &config.card)?;
    let name = scan_material_name(&ctx, &capture.name, kind)?;
    println!("{}", serde_json::to_string_pretty(&name)?);
    Ok(())
}

fn run_resolve(catalog_dir: &Path, kind: CatalogKind, text: &str) -> Result<()> {
    let catalogs = load_catalogs(catalog_dir)?;
    let class = match kind {
        CatalogKind::Characters => CharClass::Word,
        _ => CharClass::Alphanumeric,
    };
    let normalized = normalize(text, class);
    let resolution = resolve(&normalized, &catalogs.get(kind));
    println!("{:?}", resolution);

    if kind == CatalogKind::Characters {
        let element = resolution
            .value()
            .and_then(|name| catalogs.characters.record_for_display_name(name))
            .and_then(|record| record.element.as_deref());
        if let Some(element) = element {
            println!("Element: {}", element);
        }
    }
    Ok(())
}

fn run_count(config: &ScannerConfig, screenshot: &Path) -> Result<()> {
    let factory = engine_factory(config)?;
    let mut navigator = ReplayNavigator::new(vec![load_image(screenshot)?])?;
    let count = detect_item_count(&mut navigator, &config.card, factory.as_ref(), &TracingObserver)?;
    println!("{}", count);
    Ok(())
}
