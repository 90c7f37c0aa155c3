//! Well-known directories, all resolved next to the executable so a portable
//! install carries its logs, results and bundled OCR data with it.

use std::path::PathBuf;
use std::sync::OnceLock;

static EXE_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Directory of the running binary; `.` when it cannot be determined.
pub fn get_exe_dir() -> &'static PathBuf {
    EXE_DIR.get_or_init(|| {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("."))
    })
}

/// `logs/`: the tracing file layer appends `inventory_scanner.log` here.
pub fn get_logs_dir() -> PathBuf {
    get_exe_dir().join("logs")
}

/// `previews/`: preprocessed field images written by `scan --previews`,
/// for checking recipes and card layout against what the engine saw.
pub fn get_previews_dir() -> PathBuf {
    get_exe_dir().join("previews")
}

/// `output/`: one timestamped folder per scan holding `records.json`.
pub fn get_output_dir() -> PathBuf {
    get_exe_dir().join("output")
}

/// `tesseract/`: a bundled engine, tried before the system `PATH`.
pub fn get_tesseract_dir() -> PathBuf {
    get_exe_dir().join("tesseract")
}

/// `catalogs/`: default reference database when `--catalogs` is not given.
pub fn get_catalog_dir() -> PathBuf {
    get_exe_dir().join("catalogs")
}

/// Creates the directories the scanner writes to. Catalogs and the bundled
/// engine are read-only inputs and are not created.
pub fn ensure_directories() -> std::io::Result<()> {
    for dir in [get_logs_dir(), get_previews_dir(), get_output_dir()] {
        std::fs::create_dir_all(dir)?;
    }
    Ok(())
}
