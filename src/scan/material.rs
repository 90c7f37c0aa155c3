//! Material names and the enhancement-ore check that ends a weapon scan.

use image::RgbaImage;

use super::field::{FieldResult, ScanContext};
use crate::catalog::is_enhancement_material;
use crate::error::ScanError;
use crate::ocr::{read_pooled, OcrRequest, Recipe};
use crate::resolve::{normalize, resolve_with_fallback, CharClass};

/// Which material catalog to try first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialKind {
    Material,
    Development,
}

/// Resolves a material name, trying the combined material catalog when the
/// specific one has no match.
pub fn resolve_material(ctx: &ScanContext<'_>, raw: &str, kind: MaterialKind) -> FieldResult<String> {
    let text = normalize(raw, CharClass::Alphanumeric);
    if text.is_empty() {
        return FieldResult::NoText;
    }
    let primary = match kind {
        MaterialKind::Material => &ctx.catalogs.materials,
        MaterialKind::Development => &ctx.catalogs.dev_materials,
    };
    match resolve_with_fallback(&text, primary, &ctx.catalogs.all_materials).into_value() {
        Ok(value) => FieldResult::Resolved(value),
        Err(text) => FieldResult::OutOfDomain(text),
    }
}

pub fn scan_material_name(
    ctx: &ScanContext<'_>,
    image: &RgbaImage,
    kind: MaterialKind,
) -> Result<FieldResult<String>, ScanError> {
    let (prepared, raw) = read_pooled(
        ctx.pool,
        image,
        &Recipe::NAME,
        &OcrRequest::LINE,
        ctx.timeout,
        ctx.cancel,
    )?;
    ctx.observer.preview("material", &prepared, &raw);
    Ok(ctx.report("material", resolve_material(ctx, &raw, kind)))
}

/// Whether a card's name image shows a weapon enhancement item.
///
/// Only an exact name counts. Weapon lists end with these items, so a loose
/// match would cut a scan short.
pub fn is_enhancement_ore(ctx: &ScanContext<'_>, name_image: &RgbaImage) -> Result<bool, ScanError> {
    let (_, raw) = read_pooled(
        ctx.pool,
        name_image,
        &Recipe::NAME,
        &OcrRequest::LINE,
        ctx.timeout,
        ctx.cancel,
    )?;
    let text = normalize(&raw, CharClass::Alphanumeric);
    Ok(is_enhancement_material(&text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::NullObserver;
    use crate::ocr::{Cancellation, EnginePool};
    use crate::test_util::{catalogs, ScriptedFactory};
    use std::sync::Arc;

    #[test]
    fn test_material_falls_back_to_all_materials() {
        let pool = EnginePool::new(1, Arc::new(ScriptedFactory::fixed(""))).unwrap();
        let catalogs = catalogs();
        let cancel = Cancellation::new();
        let ctx = ScanContext {
            pool: &pool,
            catalogs: &catalogs,
            observer: &NullObserver,
            cancel: &cancel,
            timeout: None,
        };

        assert_eq!(
            resolve_material(&ctx, "Hero's Wit", MaterialKind::Development),
            FieldResult::Resolved("HerosWit".into())
        );
        // Nothing in the ore-only material catalog is within reach of this name.
        assert_eq!(
            resolve_material(&ctx, "Hero's Wit", MaterialKind::Material),
            FieldResult::Resolved("HerosWit".into())
        );
        assert_eq!(resolve_material(&ctx, " ", MaterialKind::Material), FieldResult::NoText);
    }

    #[test]
    fn test_enhancement_ore_needs_exact_name() {
        let factory = ScriptedFactory::new(|_, _| Ok("Mystic Enhancement Ore\n".to_string()));
        let pool = EnginePool::new(1, Arc::new(factory)).unwrap();
        let catalogs = catalogs();
        let cancel = Cancellation::new();
        let ctx = ScanContext {
            pool: &pool,
            catalogs: &catalogs,
            observer: &NullObserver,
            cancel: &cancel,
            timeout: None,
        };
        assert!(is_enhancement_ore(&ctx, &RgbaImage::new(4, 4)).unwrap());

        let factory = ScriptedFactory::new(|_, _| Ok("Mystic Enhancement".to_string()));
        let pool = EnginePool::new(1, Arc::new(factory)).unwrap();
        let ctx = ScanContext { pool: &pool, ..ctx };
        assert!(!is_enhancement_ore(&ctx, &RgbaImage::new(4, 4)).unwrap());
    }
}
