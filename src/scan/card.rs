//! Splitting a captured detail card into its field images.

use image::RgbaImage;
use serde::Serialize;

use crate::catalog::{Catalog, CatalogSet};
use crate::config::{CardLayout, RarityColors};
use crate::error::ScanError;
use crate::ocr::crop_region;
use std::sync::Arc;

/// What the inventory tab being scanned holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Weapon,
    Artifact,
}

impl ItemKind {
    /// Catalog item names are resolved against.
    pub fn catalog(self, catalogs: &CatalogSet) -> Arc<Catalog> {
        match self {
            ItemKind::Weapon => Arc::clone(&catalogs.weapons),
            ItemKind::Artifact => Arc::clone(&catalogs.artifacts),
        }
    }
}

impl std::str::FromStr for ItemKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "weapon" | "weapons" => Ok(ItemKind::Weapon),
            "artifact" | "artifacts" => Ok(ItemKind::Artifact),
            other => Err(format!("Unknown item kind: '{other}'")),
        }
    }
}

/// Rarity tiers worth scanning. Anything below three stars has no tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Rarity {
    ThreeStar,
    FourStar,
    FiveStar,
}

impl Rarity {
    pub fn stars(self) -> u8 {
        match self {
            Rarity::ThreeStar => 3,
            Rarity::FourStar => 4,
            Rarity::FiveStar => 5,
        }
    }

    /// Matches a sampled banner colour against the configured tiers.
    pub fn classify(sample: [u8; 3], colors: &RarityColors) -> Option<Rarity> {
        let close = |reference: [u8; 3]| {
            sample
                .iter()
                .zip(reference)
                .all(|(&a, b)| a.abs_diff(b) < colors.tolerance)
        };

        if close(colors.five_star) {
            Some(Rarity::FiveStar)
        } else if close(colors.four_star) {
            Some(Rarity::FourStar)
        } else if close(colors.three_star) {
            Some(Rarity::ThreeStar)
        } else {
            None
        }
    }
}

/// The four field images of one card plus its rarity sample.
#[derive(Debug, Clone)]
pub struct CardCapture {
    pub name: RgbaImage,
    pub level: RgbaImage,
    pub refinement: RgbaImage,
    pub owner: RgbaImage,
    /// Banner colour, `None` when the sample point lies outside the name image.
    pub rarity_sample: Option<[u8; 3]>,
}

impl CardCapture {
    /// Cuts a card image into its sub-regions.
    pub fn segment(card: &RgbaImage, layout: &CardLayout) -> Result<Self, ScanError> {
        let (w, h) = card.dimensions();
        if w == 0 || h == 0 {
            return Err(ScanError::Capture("empty card image".to_string()));
        }

        let name = crop_region(card, &layout.name);
        let (sx, sy) = layout.rarity_sample;
        let rarity_sample = name.get_pixel_checked(sx, sy).map(|p| [p[0], p[1], p[2]]);

        Ok(Self {
            level: crop_region(card, &layout.level),
            refinement: crop_region(card, &layout.refinement),
            owner: crop_region(card, &layout.owner),
            name,
            rarity_sample,
        })
    }

    pub fn rarity(&self, colors: &RarityColors) -> Option<Rarity> {
        self.rarity_sample
            .and_then(|sample| Rarity::classify(sample, colors))
    }
}
