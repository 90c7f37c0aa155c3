//! Loading catalogs from the reference database.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use super::CharacterRecord;
use crate::error::CatalogError;

pub type NameMap = BTreeMap<String, String>;

/// Provider of the raw catalog tables.
pub trait CatalogSource {
    fn load_weapons(&self) -> Result<NameMap, CatalogError>;
    fn load_artifacts(&self) -> Result<NameMap, CatalogError>;
    fn load_materials(&self) -> Result<NameMap, CatalogError>;
    fn load_dev_materials(&self) -> Result<NameMap, CatalogError>;
    fn load_all_materials(&self) -> Result<NameMap, CatalogError>;
    fn load_characters(&self) -> Result<BTreeMap<String, CharacterRecord>, CatalogError>;
}

/// A directory of JSON files, one object per catalog.
#[derive(Debug, Clone)]
pub struct JsonCatalogDir {
    dir: PathBuf,
}

impl JsonCatalogDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn read<T: DeserializeOwned>(&self, file: &str) -> Result<T, CatalogError> {
        let path = self.dir.join(file);
        tracing::debug!("Loading catalog {}", path.display());
        read_json(&path)
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CatalogError> {
    let contents = fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| CatalogError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

impl CatalogSource for JsonCatalogDir {
    fn load_weapons(&self) -> Result<NameMap, CatalogError> {
        self.read("weapons.json")
    }

    fn load_artifacts(&self) -> Result<NameMap, CatalogError> {
        self.read("artifacts.json")
    }

    fn load_materials(&self) -> Result<NameMap, CatalogError> {
        self.read("materials.json")
    }

    fn load_dev_materials(&self) -> Result<NameMap, CatalogError> {
        self.read("devmaterials.json")
    }

    fn load_all_materials(&self) -> Result<NameMap, CatalogError> {
        self.read("allmaterials.json")
    }

    fn load_characters(&self) -> Result<BTreeMap<String, CharacterRecord>, CatalogError> {
        self.read("characters.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogSet;
    use tempfile::tempdir;

    fn write(dir: &Path, name: &str, contents: &str) {
        fs::write(dir.join(name), contents).unwrap();
    }

    #[test]
    fn test_load_catalog_dir() {
        let dir = tempdir().unwrap();
        write(dir.path(), "weapons.json", r#"{"dullblade": "DullBlade"}"#);
        write(dir.path(), "artifacts.json", r#"{"gladiatorsfinale": "GladiatorsFinale"}"#);
        write(dir.path(), "materials.json", "{}");
        write(dir.path(), "devmaterials.json", "{}");
        write(dir.path(), "allmaterials.json", r#"{"mysticenhancementore": "MysticEnhancementOre"}"#);
        write(
            dir.path(),
            "characters.json",
            r#"{"traveler": {"display_name": "Traveler"}, "amber": {"display_name": "Amber", "element": "Pyro"}}"#,
        );

        let set = CatalogSet::load(&JsonCatalogDir::new(dir.path())).unwrap();
        assert_eq!(set.weapons.get("dullblade"), Some("DullBlade"));
        assert_eq!(set.characters.snapshot().get("amber"), Some("Amber"));
        assert_eq!(set.characters.record("amber").unwrap().element.as_deref(), Some("Pyro"));
        assert!(set.materials.is_empty());
    }

    #[test]
    fn test_missing_file_reports_path() {
        let dir = tempdir().unwrap();
        let err = JsonCatalogDir::new(dir.path()).load_weapons().unwrap_err();
        match err {
            CatalogError::Io { path, .. } => assert!(path.ends_with("weapons.json")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let dir = tempdir().unwrap();
        write(dir.path(), "artifacts.json", "[1, 2");
        assert!(matches!(
            JsonCatalogDir::new(dir.path()).load_artifacts(),
            Err(CatalogError::Parse { .. })
        ));
    }
}
