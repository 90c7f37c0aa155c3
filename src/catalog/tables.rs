//! Small fixed tables that ship with the scanner rather than the database.

use super::Catalog;

const ELEMENTS: [&str; 7] = ["pyro", "hydro", "dendro", "electro", "anemo", "cryo", "geo"];

const STATS: [(&str, &str); 18] = [
    ("hp", "hp"),
    ("hp%", "hp_"),
    ("atk", "atk"),
    ("atk%", "atk_"),
    ("def", "def"),
    ("def%", "def_"),
    ("energyrecharge", "enerRech_"),
    ("elementalmastery", "eleMas"),
    ("healingbonus", "heal_"),
    ("critrate", "critRate_"),
    ("critdmg", "critDMG_"),
    ("physicaldmgbonus", "physical_dmg_"),
    ("anemodmgbonus", "anemo_dmg_"),
    ("pyrodmgbonus", "pyro_dmg_"),
    ("electrodmgbonus", "electro_dmg_"),
    ("cryodmgbonus", "cryo_dmg_"),
    ("hydrodmgbonus", "hydro_dmg_"),
    ("geodmgbonus", "geo_dmg_"),
];

const ENHANCEMENT_MATERIALS: [&str; 5] = [
    "enhancementore",
    "fineenhancementore",
    "mysticenhancementore",
    "sanctifyingunction",
    "sanctifyingessence",
];

/// Element names keyed by their lowercase form, valued capitalized.
pub fn elements() -> Catalog {
    Catalog::new(
        "elements",
        ELEMENTS.iter().map(|e| {
            let mut chars = e.chars();
            let capitalized = match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            };
            (e.to_string(), capitalized)
        }),
    )
}

pub fn stats() -> Catalog {
    Catalog::new("stats", STATS)
}

/// Whether a normalized material key is one of the weapon enhancement items.
pub fn is_enhancement_material(key: &str) -> bool {
    ENHANCEMENT_MATERIALS.contains(&key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elements_are_capitalized() {
        let elements = elements();
        assert_eq!(elements.get("pyro"), Some("Pyro"));
        assert_eq!(elements.get("dendro"), Some("Dendro"));
        assert_eq!(elements.len(), 7);
    }

    #[test]
    fn test_stats_lookup() {
        let stats = stats();
        assert_eq!(stats.get("critrate"), Some("critRate_"));
        assert!(stats.contains_value("eleMas"));
    }

    #[test]
    fn test_enhancement_materials() {
        assert!(is_enhancement_material("mysticenhancementore"));
        assert!(!is_enhancement_material("dullblade"));
    }
}
