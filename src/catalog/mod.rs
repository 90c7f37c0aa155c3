//! Reference catalogs mapping normalized names to canonical values.
//!
//! Catalogs are loaded once through a [`CatalogSource`] and never change
//! afterwards, with one exception: the character catalog's `traveler`
//! placeholder is re-keyed to the player's protagonist name the first time it
//! is observed. That swap is guarded by a `OnceLock` so concurrent owner scans
//! register at most one name.

pub mod loader;
pub mod tables;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::str::FromStr;
use std::sync::{Arc, OnceLock};

use crate::error::CatalogError;

pub use loader::{CatalogSource, JsonCatalogDir};
pub use tables::is_enhancement_material;

/// Key of the generic protagonist entry in the character catalog.
pub const TRAVELER_KEY: &str = "traveler";

/// An immutable mapping from normalized name to canonical value.
///
/// Entries are kept sorted so that fuzzy resolution, which keeps the first
/// best candidate it sees, is deterministic.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    name: String,
    entries: BTreeMap<String, String>,
    values: HashSet<String>,
}

impl Catalog {
    pub fn new<I, K, V>(name: &str, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let entries: BTreeMap<String, String> = entries
            .into_iter()
            .map(|(k, v)| (k.into().to_lowercase(), v.into()))
            .collect();
        let values = entries.values().cloned().collect();
        Self {
            name: name.to_string(),
            entries,
            values,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn contains_value(&self, value: &str) -> bool {
        self.values.contains(value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Moves the value stored under `from` to the key `to`.
    fn rekey(&mut self, from: &str, to: &str) {
        if let Some(value) = self.entries.remove(from) {
            self.entries.insert(to.to_string(), value);
        }
    }
}

/// Structured entry of the character catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterRecord {
    /// Canonical display name, the value produced by resolution.
    pub display_name: String,
    #[serde(default)]
    pub element: Option<String>,
}

/// Character catalog with the one-shot protagonist registration.
#[derive(Debug)]
pub struct CharacterCatalog {
    records: BTreeMap<String, CharacterRecord>,
    snapshot: RwLock<Arc<Catalog>>,
    protagonist: OnceLock<String>,
}

impl CharacterCatalog {
    pub fn new(records: BTreeMap<String, CharacterRecord>) -> Self {
        let records: BTreeMap<String, CharacterRecord> = records
            .into_iter()
            .map(|(k, v)| (k.to_lowercase(), v))
            .collect();
        let catalog = Catalog::new(
            "characters",
            records
                .iter()
                .map(|(k, r)| (k.clone(), r.display_name.clone())),
        );
        Self {
            records,
            snapshot: RwLock::new(Arc::new(catalog)),
            protagonist: OnceLock::new(),
        }
    }

    /// Current name → display-name view, including the protagonist once set.
    pub fn snapshot(&self) -> Arc<Catalog> {
        Arc::clone(&self.snapshot.read())
    }

    /// Record for a catalog key. The registered protagonist name maps to the
    /// placeholder record.
    pub fn record(&self, key: &str) -> Option<&CharacterRecord> {
        match self.protagonist.get() {
            Some(name) if name == key => self.records.get(TRAVELER_KEY),
            Some(_) if key == TRAVELER_KEY => None,
            _ => self.records.get(key),
        }
    }

    /// Display name of the placeholder entry.
    pub fn traveler_display_name(&self) -> Result<&str, CatalogError> {
        self.records
            .get(TRAVELER_KEY)
            .map(|r| r.display_name.as_str())
            .ok_or_else(|| CatalogError::MissingEntry(TRAVELER_KEY.to_string()))
    }

    /// Record behind a resolved display name, e.g. to report a character's element.
    pub fn record_for_display_name(&self, display_name: &str) -> Option<&CharacterRecord> {
        let snapshot = self.snapshot();
        let key = snapshot
            .iter()
            .find(|(_, value)| *value == display_name)
            .map(|(key, _)| key.to_string())?;
        self.record(&key)
    }

    pub fn protagonist(&self) -> Option<&str> {
        self.protagonist.get().map(String::as_str)
    }

    /// Registers the observed protagonist name in place of the placeholder.
    ///
    /// Returns `Ok(true)` only for the single call that wins the gate; every
    /// other call, concurrent or later, returns `Ok(false)` and changes
    /// nothing. Fails when the catalog has no placeholder entry.
    pub fn register_protagonist(&self, name: &str) -> Result<bool, CatalogError> {
        self.traveler_display_name()?;
        if name.is_empty() || self.protagonist.get().is_some() {
            return Ok(false);
        }
        if self.protagonist.set(name.to_string()).is_err() {
            return Ok(false);
        }

        let mut snapshot = self.snapshot.write();
        if !snapshot.contains_key(name) {
            let mut updated = Catalog::clone(&snapshot);
            updated.rekey(TRAVELER_KEY, name);
            *snapshot = Arc::new(updated);
        }
        tracing::info!("Registered protagonist name '{}'", name);
        Ok(true)
    }
}

/// Catalogs addressable by name, e.g. from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogKind {
    Weapons,
    Artifacts,
    Materials,
    DevMaterials,
    AllMaterials,
    Characters,
    Elements,
    Stats,
}

impl FromStr for CatalogKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "weapons" => Ok(CatalogKind::Weapons),
            "artifacts" => Ok(CatalogKind::Artifacts),
            "materials" => Ok(CatalogKind::Materials),
            "devmaterials" => Ok(CatalogKind::DevMaterials),
            "allmaterials" => Ok(CatalogKind::AllMaterials),
            "characters" => Ok(CatalogKind::Characters),
            "elements" => Ok(CatalogKind::Elements),
            "stats" => Ok(CatalogKind::Stats),
            other => Err(format!("Unknown catalog: '{other}'")),
        }
    }
}

/// All reference data used by a scan session.
#[derive(Debug)]
pub struct CatalogSet {
    pub weapons: Arc<Catalog>,
    pub artifacts: Arc<Catalog>,
    pub materials: Arc<Catalog>,
    pub dev_materials: Arc<Catalog>,
    pub all_materials: Arc<Catalog>,
    pub characters: CharacterCatalog,
    pub elements: Arc<Catalog>,
    pub stats: Arc<Catalog>,
}

impl CatalogSet {
    /// Loads every catalog from `source`. Any failure aborts the load.
    pub fn load(source: &dyn CatalogSource) -> Result<Self, CatalogError> {
        let set = Self {
            weapons: Arc::new(Catalog::new("weapons", source.load_weapons()?)),
            artifacts: Arc::new(Catalog::new("artifacts", source.load_artifacts()?)),
            materials: Arc::new(Catalog::new("materials", source.load_materials()?)),
            dev_materials: Arc::new(Catalog::new(
                "devmaterials",
                source.load_dev_materials()?,
            )),
            all_materials: Arc::new(Catalog::new(
                "allmaterials",
                source.load_all_materials()?,
            )),
            characters: CharacterCatalog::new(source.load_characters()?),
            elements: Arc::new(tables::elements()),
            stats: Arc::new(tables::stats()),
        };
        tracing::info!(
            "Loaded catalogs: {} weapons, {} artifacts, {} materials, {} characters",
            set.weapons.len(),
            set.artifacts.len(),
            set.all_materials.len(),
            set.characters.records.len()
        );
        Ok(set)
    }

    pub fn get(&self, kind: CatalogKind) -> Arc<Catalog> {
        match kind {
            CatalogKind::Weapons => Arc::clone(&self.weapons),
            CatalogKind::Artifacts => Arc::clone(&self.artifacts),
            CatalogKind::Materials => Arc::clone(&self.materials),
            CatalogKind::DevMaterials => Arc::clone(&self.dev_materials),
            CatalogKind::AllMaterials => Arc::clone(&self.all_materials),
            CatalogKind::Characters => self.characters.snapshot(),
            CatalogKind::Elements => Arc::clone(&self.elements),
            CatalogKind::Stats => Arc::clone(&self.stats),
        }
    }
}
