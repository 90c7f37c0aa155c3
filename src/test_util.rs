//! Fakes shared by unit tests: a scripted OCR engine and in-memory catalogs.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use image::RgbaImage;

use crate::catalog::loader::NameMap;
use crate::catalog::{CatalogSet, CatalogSource, CharacterRecord};
use crate::error::{CatalogError, OcrError};
use crate::ocr::engine::{EngineFactory, OcrEngine, OcrRequest};

type Script = dyn Fn(&RgbaImage, &OcrRequest) -> Result<String, OcrError> + Send + Sync;

/// Engine factory whose engines answer from a closure.
#[derive(Clone)]
pub struct ScriptedFactory {
    script: Arc<Script>,
    created: Arc<AtomicUsize>,
}

impl ScriptedFactory {
    pub fn new(
        script: impl Fn(&RgbaImage, &OcrRequest) -> Result<String, OcrError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            script: Arc::new(script),
            created: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Engines that always read `text`.
    pub fn fixed(text: &'static str) -> Self {
        Self::new(move |_, _| Ok(text.to_string()))
    }

    /// Number of engines created so far.
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

struct ScriptedEngine {
    script: Arc<Script>,
}

impl OcrEngine for ScriptedEngine {
    fn recognize(&mut self, image: &RgbaImage, request: &OcrRequest) -> Result<String, OcrError> {
        (self.script)(image, request)
    }
}

impl EngineFactory for ScriptedFactory {
    fn create(&self) -> Result<Box<dyn OcrEngine>, OcrError> {
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedEngine {
            script: Arc::clone(&self.script),
        }))
    }
}

/// Small fixed reference database.
pub struct MemorySource;

fn names(pairs: &[(&str, &str)]) -> NameMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

impl CatalogSource for MemorySource {
    fn load_weapons(&self) -> Result<NameMap, CatalogError> {
        Ok(names(&[
            ("skywardharp", "SkywardHarp"),
            ("favoniussword", "FavoniusSword"),
            ("dullblade", "DullBlade"),
            ("thecatch", "TheCatch"),
        ]))
    }

    fn load_artifacts(&self) -> Result<NameMap, CatalogError> {
        Ok(names(&[
            ("gladiatorsfinale", "GladiatorsFinale"),
            ("wandererstroupe", "WanderersTroupe"),
        ]))
    }

    fn load_materials(&self) -> Result<NameMap, CatalogError> {
        Ok(names(&[("mysticenhancementore", "MysticEnhancementOre")]))
    }

    fn load_dev_materials(&self) -> Result<NameMap, CatalogError> {
        Ok(names(&[("heroswit", "HerosWit")]))
    }

    fn load_all_materials(&self) -> Result<NameMap, CatalogError> {
        Ok(names(&[
            ("mysticenhancementore", "MysticEnhancementOre"),
            ("fineenhancementore", "FineEnhancementOre"),
            ("heroswit", "HerosWit"),
            ("sweetflower", "SweetFlower"),
        ]))
    }

    fn load_characters(&self) -> Result<BTreeMap<String, CharacterRecord>, CatalogError> {
        let mut records = BTreeMap::new();
        for (key, display, element) in [
            ("traveler", "Traveler", None),
            ("bennett", "Bennett", Some("Pyro")),
            ("xiangling", "Xiangling", Some("Pyro")),
            ("kamisatoayaka", "KamisatoAyaka", Some("Cryo")),
        ] {
            records.insert(
                key.to_string(),
                CharacterRecord {
                    display_name: display.to_string(),
                    element: element.map(str::to_string),
                },
            );
        }
        Ok(records)
    }
}

pub fn catalogs() -> CatalogSet {
    CatalogSet::load(&MemorySource).expect("in-memory catalogs load")
}
