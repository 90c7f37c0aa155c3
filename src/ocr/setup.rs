//! Locating the tesseract executable and its model data.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::config::OcrSettings;
use crate::error::OcrError;
use crate::paths::get_tesseract_dir;

/// Resolved locations handed to every engine instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TesseractPaths {
    pub executable: PathBuf,
    pub tessdata: PathBuf,
}

/// Resolves the executable and the data directory holding `settings.model`.
/// Called once at startup; failure aborts the session.
pub fn locate(settings: &OcrSettings) -> Result<TesseractPaths, OcrError> {
    let executable = find_tesseract_executable(settings.tesseract.as_deref())?;
    let tessdata = find_tessdata_dir(settings.tessdata_dir.as_deref(), &settings.model)?;
    tracing::info!(
        "Using tesseract {} with model '{}' from {}",
        executable.display(),
        settings.model,
        tessdata.display()
    );
    Ok(TesseractPaths {
        executable,
        tessdata,
    })
}

/// Local data directory used when nothing else is configured.
pub fn user_tessdata_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("inventory-scanner")
        .join("tessdata")
}

/// Finds the Tesseract executable: explicit path, our local dir, PATH, then
/// common install locations.
pub fn find_tesseract_executable(explicit: Option<&Path>) -> Result<PathBuf, OcrError> {
    if let Some(path) = explicit {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        return Err(OcrError::NotFound(format!(
            "configured tesseract {} does not exist",
            path.display()
        )));
    }

    let tesseract_dir = get_tesseract_dir();
    for name in ["tesseract", "tesseract.exe"] {
        let local_exe = tesseract_dir.join(name);
        if local_exe.exists() {
            return Ok(local_exe);
        }
    }

    // Check PATH
    if let Ok(output) = Command::new("tesseract").arg("--version").output() {
        if output.status.success() {
            return Ok(PathBuf::from("tesseract"));
        }
    }

    let common_paths = [
        r"C:\Program Files\Tesseract-OCR\tesseract.exe",
        r"C:\Program Files (x86)\Tesseract-OCR\tesseract.exe",
        "/usr/bin/tesseract",
        "/usr/local/bin/tesseract",
        "/opt/homebrew/bin/tesseract",
    ];

    common_paths
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
        .ok_or_else(|| OcrError::NotFound("tesseract executable".to_string()))
}

/// Finds a directory containing `<model>.traineddata`.
pub fn find_tessdata_dir(explicit: Option<&Path>, model: &str) -> Result<PathBuf, OcrError> {
    let file = format!("{model}.traineddata");

    if let Some(dir) = explicit {
        if dir.join(&file).exists() {
            return Ok(dir.to_path_buf());
        }
        return Err(OcrError::NotFound(format!("{} in {}", file, dir.display())));
    }

    let mut candidates = vec![get_tesseract_dir().join("tessdata"), user_tessdata_dir()];

    // Check TESSDATA_PREFIX environment variable
    if let Ok(prefix) = std::env::var("TESSDATA_PREFIX") {
        candidates.push(PathBuf::from(&prefix));
        candidates.push(PathBuf::from(&prefix).join("tessdata"));
    }

    candidates.extend(
        [
            r"C:\Program Files\Tesseract-OCR\tessdata",
            r"C:\Program Files (x86)\Tesseract-OCR\tessdata",
            "/usr/share/tesseract-ocr/5/tessdata",
            "/usr/share/tesseract-ocr/4.00/tessdata",
            "/usr/share/tessdata",
            "/usr/local/share/tessdata",
        ]
        .iter()
        .map(PathBuf::from),
    );

    candidates
        .into_iter()
        .find(|dir| dir.join(&file).exists())
        .ok_or_else(|| OcrError::NotFound(format!("tessdata directory with {file}")))
}
