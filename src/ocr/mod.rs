pub mod engine;
pub mod pool;
pub mod preprocess;
pub mod setup;

pub use engine::{read_numeric, EngineFactory, OcrEngine, OcrRequest, PageMode, TesseractFactory};
pub use pool::{Cancellation, EnginePool, Lease, PoolStats};
pub use preprocess::{crop_region, Recipe, Transform};
pub use setup::{locate, TesseractPaths};

use image::RgbaImage;
use std::time::Duration;

use crate::error::ScanError;

/// High-level read: preprocess with `recipe`, borrow a pooled engine, run OCR.
///
/// Returns the preprocessed image alongside the text so callers can show
/// what the engine actually saw. The engine goes back to the pool on every
/// path out of this function.
pub fn read_pooled(
    pool: &EnginePool,
    image: &RgbaImage,
    recipe: &Recipe,
    request: &OcrRequest,
    timeout: Option<Duration>,
    cancel: &Cancellation,
) -> Result<(RgbaImage, String), ScanError> {
    let prepared = recipe.apply(image);
    let mut engine = pool.checkout_with(timeout, cancel)?;
    let text = engine.recognize(&prepared, request)?;
    tracing::trace!("OCR {} -> {:?}", recipe.name, text.trim());
    Ok((prepared, text))
}

/// Like [`read_pooled`] but on a throwaway engine instead of the pool.
pub fn read_unpooled(
    factory: &dyn EngineFactory,
    image: &RgbaImage,
    recipe: &Recipe,
    request: &OcrRequest,
) -> Result<(RgbaImage, String), ScanError> {
    let prepared = recipe.apply(image);
    let text = read_numeric(factory, &prepared, request)?;
    tracing::trace!("OCR {} (unpooled) -> {:?}", recipe.name, text.trim());
    Ok((prepared, text))
}
