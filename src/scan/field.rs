//! Field scanners: preprocess, OCR, normalize, resolve.
//!
//! A field that cannot be read is not an error. It comes back as one of the
//! [`FieldResult`] outcomes and is reported to the observer as a warning.
//! `Err` is kept for the pool, the engine and missing catalog data.

use image::RgbaImage;
use regex::Regex;
use serde::Serialize;
use std::time::Duration;

use crate::catalog::{CatalogSet, TRAVELER_KEY};
use crate::error::ScanError;
use crate::observer::ScanObserver;
use crate::ocr::{read_pooled, Cancellation, EnginePool, OcrRequest, Recipe};
use crate::resolve::{normalize, resolve, resolve_strict, CharClass, Resolution};

use super::card::ItemKind;

/// Outcome of scanning one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum FieldResult<T> {
    Resolved(T),
    /// The engine produced nothing usable.
    NoText,
    /// Text was read but has the wrong shape.
    Unparseable(String),
    /// Text was read but matches nothing in the catalog.
    OutOfDomain(String),
    /// Not scanned, e.g. a low-rarity card.
    Skipped,
}

impl<T> FieldResult<T> {
    pub fn is_resolved(&self) -> bool {
        matches!(self, FieldResult::Resolved(_))
    }

    pub fn resolved(&self) -> Option<&T> {
        match self {
            FieldResult::Resolved(v) => Some(v),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> FieldResult<U> {
        match self {
            FieldResult::Resolved(v) => FieldResult::Resolved(f(v)),
            FieldResult::NoText => FieldResult::NoText,
            FieldResult::Unparseable(t) => FieldResult::Unparseable(t),
            FieldResult::OutOfDomain(t) => FieldResult::OutOfDomain(t),
            FieldResult::Skipped => FieldResult::Skipped,
        }
    }
}

/// Item level as shown on the card, "current/max".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Level {
    pub current: u8,
    /// Current equals max: the item sits at a cap and must ascend to go further.
    pub ascended: bool,
}

/// Everything a field scan needs from the session.
#[derive(Clone, Copy)]
pub struct ScanContext<'a> {
    pub pool: &'a EnginePool,
    pub catalogs: &'a CatalogSet,
    pub observer: &'a dyn ScanObserver,
    pub cancel: &'a Cancellation,
    pub timeout: Option<Duration>,
}

impl ScanContext<'_> {
    fn read(
        &self,
        field: &str,
        image: &RgbaImage,
        recipe: &Recipe,
        request: &OcrRequest,
    ) -> Result<String, ScanError> {
        let (prepared, text) = read_pooled(self.pool, image, recipe, request, self.timeout, self.cancel)?;
        self.observer.preview(field, &prepared, &text);
        Ok(text)
    }

    /// Warns about anything that did not resolve.
    pub(crate) fn report<T>(&self, field: &str, result: FieldResult<T>) -> FieldResult<T> {
        match &result {
            FieldResult::NoText => self.observer.warning(&format!("{field}: no text recognized")),
            FieldResult::Unparseable(text) => self
                .observer
                .warning(&format!("{field}: could not parse '{text}'")),
            FieldResult::OutOfDomain(text) => self
                .observer
                .warning(&format!("{field}: '{text}' is not in the catalog")),
            FieldResult::Resolved(_) | FieldResult::Skipped => {}
        }
        result
    }
}

fn from_resolution(resolution: Resolution) -> FieldResult<String> {
    match resolution.into_value() {
        Ok(value) => FieldResult::Resolved(value),
        Err(text) if text.is_empty() => FieldResult::NoText,
        Err(text) => FieldResult::OutOfDomain(text),
    }
}

/// Item name, resolved against the catalog for `kind`.
pub fn scan_name(
    ctx: &ScanContext<'_>,
    image: &RgbaImage,
    kind: ItemKind,
) -> Result<FieldResult<String>, ScanError> {
    let raw = ctx.read("name", image, &Recipe::NAME, &OcrRequest::LINE)?;
    let text = normalize(&raw, CharClass::Letters);
    let catalog = kind.catalog(ctx.catalogs);
    Ok(ctx.report("name", from_resolution(resolve(&text, &catalog))))
}

/// Parses "current/max" text that has already been reduced to digits and slashes.
pub fn parse_level(text: &str) -> FieldResult<Level> {
    if text.is_empty() {
        return FieldResult::NoText;
    }
    let Some((current, max)) = text.split_once('/') else {
        return FieldResult::Unparseable(text.to_string());
    };
    match (current.parse::<u8>(), max.parse::<u8>()) {
        (Ok(level), Ok(_)) => FieldResult::Resolved(Level {
            current: level,
            ascended: current == max,
        }),
        _ => FieldResult::Unparseable(text.to_string()),
    }
}

pub fn scan_level(ctx: &ScanContext<'_>, image: &RgbaImage) -> Result<FieldResult<Level>, ScanError> {
    let raw = ctx.read("level", image, &Recipe::LEVEL, &OcrRequest::FRACTION)?;
    let text: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '/')
        .collect();
    Ok(ctx.report("level", parse_level(&text)))
}

pub fn scan_refinement(ctx: &ScanContext<'_>, image: &RgbaImage) -> Result<FieldResult<u8>, ScanError> {
    let raw = ctx.read("refinement", image, &Recipe::REFINEMENT, &OcrRequest::DIGITS)?;
    let text: String = raw.chars().filter(char::is_ascii_digit).collect();
    let result = if text.is_empty() {
        FieldResult::NoText
    } else {
        text.parse::<u8>()
            .map_or_else(|_| FieldResult::Unparseable(text.clone()), FieldResult::Resolved)
    };
    Ok(ctx.report("refinement", result))
}

/// Marker in front of the owner's name on equipped items.
const EQUIPPED_PATTERN: &str = r"Equipped:";

/// Equipping character. `Resolved(None)` means the item is not equipped.
pub fn scan_owner(
    ctx: &ScanContext<'_>,
    image: &RgbaImage,
) -> Result<FieldResult<Option<String>>, ScanError> {
    let raw = ctx.read("owner", image, &Recipe::OWNER, &OcrRequest::SPARSE)?;
    let result = resolve_owner(ctx.catalogs, &raw)?;
    Ok(ctx.report("owner", result))
}

/// Owner text to character name, registering the protagonist on first sight.
pub fn resolve_owner(
    catalogs: &CatalogSet,
    raw: &str,
) -> Result<FieldResult<Option<String>>, ScanError> {
    let equipped = Regex::new(EQUIPPED_PATTERN)?;
    if !equipped.is_match(raw) {
        return Ok(FieldResult::Resolved(None));
    }

    let after_colon = raw.split(':').nth(1).unwrap_or_default().replace('\n', "");
    let text = normalize(&after_colon, CharClass::Word);
    if text.is_empty() {
        return Ok(FieldResult::NoText);
    }

    let characters = &catalogs.characters;
    let traveler = characters.traveler_display_name()?;
    let full = resolve(&text, &characters.snapshot());
    if characters.protagonist().is_none()
        && full.value() == Some(traveler)
        && text != TRAVELER_KEY
    {
        characters.register_protagonist(&text)?;
    }

    // OCR often appends stray characters after the name.
    let snapshot = characters.snapshot();
    let mut candidate = text.as_str();
    while !candidate.is_empty() {
        if let Some(value) = resolve_strict(candidate, &snapshot).value() {
            return Ok(FieldResult::Resolved(Some(value.to_string())));
        }
        let end = candidate.char_indices().last().map_or(0, |(i, _)| i);
        candidate = &candidate[..end];
    }

    Ok(from_resolution(full).map(Some))
}
