use image::RgbaImage;
use std::process::Command;
use tempfile::TempDir;

use super::setup::TesseractPaths;
use crate::error::OcrError;

/// Tesseract page segmentation modes used by the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageMode {
    /// Assume a single uniform block of text
    SingleBlock,
    SingleLine,
    SingleWord,
    /// Find as much text as possible in no particular order
    SparseText,
}

impl PageMode {
    pub fn psm(self) -> u8 {
        match self {
            PageMode::SingleBlock => 6,
            PageMode::SingleLine => 7,
            PageMode::SingleWord => 8,
            PageMode::SparseText => 11,
        }
    }
}

/// How a single image should be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OcrRequest {
    pub page_mode: PageMode,
    /// Characters the engine may emit; anything when absent.
    pub whitelist: Option<&'static str>,
}

impl OcrRequest {
    pub const LINE: OcrRequest = OcrRequest {
        page_mode: PageMode::SingleLine,
        whitelist: None,
    };
    pub const SPARSE: OcrRequest = OcrRequest {
        page_mode: PageMode::SparseText,
        whitelist: None,
    };
    pub const DIGITS: OcrRequest = OcrRequest {
        page_mode: PageMode::SingleLine,
        whitelist: Some("0123456789"),
    };
    pub const FRACTION: OcrRequest = OcrRequest {
        page_mode: PageMode::SingleLine,
        whitelist: Some("0123456789/"),
    };
}

/// One OCR engine instance. Instances are not shared; the pool hands each
/// one to a single caller at a time.
pub trait OcrEngine: Send {
    fn recognize(&mut self, image: &RgbaImage, request: &OcrRequest) -> Result<String, OcrError>;
}

/// Creates engine instances for the pool and for one-shot numeric reads.
pub trait EngineFactory: Send + Sync {
    fn create(&self) -> Result<Box<dyn OcrEngine>, OcrError>;

    /// Engine for short numeric reads, built and dropped per call.
    fn create_numeric(&self) -> Result<Box<dyn OcrEngine>, OcrError> {
        self.create()
    }
}

/// Runs a single read on a fresh engine that is dropped afterwards.
pub fn read_numeric(
    factory: &dyn EngineFactory,
    image: &RgbaImage,
    request: &OcrRequest,
) -> Result<String, OcrError> {
    let mut engine = factory.create_numeric()?;
    engine.recognize(image, request)
}

/// Tesseract driven through its command line.
///
/// Each instance owns a scratch directory for its input images, so two
/// instances never touch the same files. Dropping the engine removes it.
pub struct TesseractEngine {
    paths: TesseractPaths,
    model: String,
    scratch: TempDir,
}

impl TesseractEngine {
    pub fn new(paths: TesseractPaths, model: &str) -> Result<Self, OcrError> {
        let scratch = tempfile::Builder::new().prefix("ocr-engine-").tempdir()?;
        Ok(Self {
            paths,
            model: model.to_string(),
            scratch,
        })
    }
}

impl OcrEngine for TesseractEngine {
    fn recognize(&mut self, image: &RgbaImage, request: &OcrRequest) -> Result<String, OcrError> {
        let input = self.scratch.path().join("input.png");
        image.save(&input)?;

        let mut command = Command::new(&self.paths.executable);
        command
            .arg(&input)
            .arg("stdout")
            .arg("--tessdata-dir")
            .arg(&self.paths.tessdata)
            .arg("-l")
            .arg(&self.model)
            .arg("--psm")
            .arg(request.page_mode.psm().to_string());
        if let Some(whitelist) = request.whitelist {
            command
                .arg("-c")
                .arg(format!("tessedit_char_whitelist={whitelist}"));
        }

        let output = command.output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::Engine(format!("Tesseract failed: {}", stderr.trim())));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

impl Drop for TesseractEngine {
    fn drop(&mut self) {
        tracing::trace!("Disposing engine at {}", self.scratch.path().display());
    }
}

/// Builds [`TesseractEngine`]s for the configured model.
#[derive(Debug, Clone)]
pub struct TesseractFactory {
    paths: TesseractPaths,
    model: String,
}

impl TesseractFactory {
    pub fn new(paths: TesseractPaths, model: &str) -> Self {
        Self {
            paths,
            model: model.to_string(),
        }
    }
}

impl EngineFactory for TesseractFactory {
    fn create(&self) -> Result<Box<dyn OcrEngine>, OcrError> {
        Ok(Box::new(TesseractEngine::new(self.paths.clone(), &self.model)?))
    }

    /// Numeric reads use the stock English model, which is enough for digits.
    fn create_numeric(&self) -> Result<Box<dyn OcrEngine>, OcrError> {
        Ok(Box::new(TesseractEngine::new(self.paths.clone(), "eng")?))
    }
}
