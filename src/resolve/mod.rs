//! Normalization of raw OCR text and resolution against a catalog.
//!
//! Resolution tries, in order: an exact key or value match, a unique
//! substring match for longer inputs, and finally the closest key by bounded
//! edit distance. The same resolver serves every catalog.

pub mod distance;

use crate::catalog::Catalog;

/// Starting edit-distance threshold for fuzzy resolution.
pub const MAX_EDITS: usize = 15;

/// Inputs at most this long never use the substring shortcut.
const SUBSTRING_MIN_LEN: usize = 5;

/// Characters a field is allowed to contain after normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharClass {
    Letters,
    Alphanumeric,
    /// Letters, digits and underscore.
    Word,
}

impl CharClass {
    fn allows(self, c: char) -> bool {
        match self {
            CharClass::Letters => c.is_alphabetic(),
            CharClass::Alphanumeric => c.is_alphanumeric(),
            CharClass::Word => c.is_alphanumeric() || c == '_',
        }
    }
}

/// Strips disallowed characters, trims and lowercases.
pub fn normalize(raw: &str, class: CharClass) -> String {
    raw.chars()
        .filter(|&c| class.allows(c))
        .collect::<String>()
        .trim()
        .to_lowercase()
}

/// How a piece of text was matched to a catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Exact(String),
    Substring(String),
    Fuzzy { value: String, distance: usize },
    /// Nothing matched; carries the normalized input.
    Unresolved(String),
}

impl Resolution {
    /// The canonical value, if one was found.
    pub fn value(&self) -> Option<&str> {
        match self {
            Resolution::Exact(v) | Resolution::Substring(v) => Some(v),
            Resolution::Fuzzy { value, .. } => Some(value),
            Resolution::Unresolved(_) => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        !matches!(self, Resolution::Unresolved(_))
    }

    pub fn into_value(self) -> Result<String, String> {
        match self {
            Resolution::Exact(v) | Resolution::Substring(v) => Ok(v),
            Resolution::Fuzzy { value, .. } => Ok(value),
            Resolution::Unresolved(text) => Err(text),
        }
    }
}

/// Exact and substring matching only.
pub fn resolve_strict(text: &str, catalog: &Catalog) -> Resolution {
    if text.is_empty() {
        return Resolution::Unresolved(String::new());
    }
    if let Some(value) = catalog.get(text) {
        return Resolution::Exact(value.to_string());
    }
    if catalog.contains_value(text) {
        return Resolution::Exact(text.to_string());
    }

    if text.chars().count() > SUBSTRING_MIN_LEN {
        let mut containing = catalog.iter().filter(|(key, _)| key.contains(text));
        if let (Some((_, value)), None) = (containing.next(), containing.next()) {
            return Resolution::Substring(value.to_string());
        }
    }

    Resolution::Unresolved(text.to_string())
}

/// Full resolution: exact, unique substring, then closest key within
/// [`MAX_EDITS`].
pub fn resolve(text: &str, catalog: &Catalog) -> Resolution {
    let strict = resolve_strict(text, catalog);
    if strict.is_resolved() || text.is_empty() {
        return strict;
    }

    match closest_key(text, catalog) {
        Some((key, distance)) => {
            let value = catalog.get(key).unwrap_or(key).to_string();
            tracing::trace!("'{}' resolved to '{}' at distance {}", text, value, distance);
            Resolution::Fuzzy { value, distance }
        }
        None => Resolution::Unresolved(text.to_string()),
    }
}

/// Tries `primary`, then `fallback` if nothing matched.
pub fn resolve_with_fallback(text: &str, primary: &Catalog, fallback: &Catalog) -> Resolution {
    match resolve(text, primary) {
        Resolution::Unresolved(_) => resolve(text, fallback),
        found => found,
    }
}

/// Closest catalog key strictly below the shrinking threshold.
fn closest_key<'a>(text: &str, catalog: &'a Catalog) -> Option<(&'a str, usize)> {
    let mut threshold = MAX_EDITS;
    let mut best = None;

    for key in catalog.keys() {
        if let Some(edits) = distance::bounded(text, key, threshold) {
            if edits < threshold {
                best = Some((key, edits));
                threshold = edits;
            }
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weapons() -> Catalog {
        Catalog::new(
            "weapons",
            [
                ("dullblade", "DullBlade"),
                ("skywardblade", "SkywardBlade"),
                ("skywardpride", "SkywardPride"),
                ("harbingerofdawn", "HarbingerOfDawn"),
                ("prototyperancour", "PrototypeRancour"),
                ("prototypearchaic", "PrototypeArchaic"),
            ],
        )
    }

    #[test]
    fn test_normalize_letters() {
        assert_eq!(normalize(" Skyward Blade\n", CharClass::Letters), "skywardblade");
        assert_eq!(normalize("Lv. 90/90", CharClass::Letters), "lv");
        assert_eq!(normalize("Hu_Tao 2", CharClass::Word), "hu_tao2");
        assert_eq!(normalize("a-b 3!", CharClass::Alphanumeric), "ab3");
    }

    #[test]
    fn test_exact_key_wins() {
        assert_eq!(
            resolve("dullblade", &weapons()),
            Resolution::Exact("DullBlade".into())
        );
    }

    #[test]
    fn test_exact_value_is_accepted() {
        assert_eq!(
            resolve("SkywardPride", &weapons()),
            Resolution::Exact("SkywardPride".into())
        );
    }

    #[test]
    fn test_exact_match_beats_closer_neighbor() {
        // "sword" is one edit from the key "swords" but is itself a canonical value.
        let catalog = Catalog::new("t", [("longsword", "sword"), ("swords", "Swords")]);
        assert_eq!(resolve("sword", &catalog), Resolution::Exact("sword".into()));
        assert_eq!(resolve("swords", &catalog), Resolution::Exact("Swords".into()));
    }

    #[test]
    fn test_unique_substring() {
        assert_eq!(
            resolve("harbinger", &weapons()),
            Resolution::Substring("HarbingerOfDawn".into())
        );
    }

    #[test]
    fn test_ambiguous_substring_falls_through_to_fuzzy() {
        // Both prototype weapons contain "prototype"; fuzzy picks the first closest key.
        let resolution = resolve("prototype", &weapons());
        assert!(matches!(resolution, Resolution::Fuzzy { .. }));
    }

    #[test]
    fn test_short_text_skips_substring() {
        // "dull" is a unique substring but too short for the shortcut
        assert_eq!(
            resolve("dull", &weapons()),
            Resolution::Fuzzy {
                value: "DullBlade".into(),
                distance: 5
            }
        );
    }

    #[test]
    fn test_fuzzy_picks_closest() {
        assert_eq!(
            resolve("skywardb1ade", &weapons()),
            Resolution::Fuzzy {
                value: "SkywardBlade".into(),
                distance: 1
            }
        );
        assert_eq!(
            resolve("skywardprdie", &weapons()),
            Resolution::Fuzzy {
                value: "SkywardPride".into(),
                distance: 1
            }
        );
    }

    #[test]
    fn test_too_far_is_unresolved() {
        let text = "zzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzz";
        assert_eq!(resolve(text, &weapons()), Resolution::Unresolved(text.into()));
    }

    #[test]
    fn test_empty_input_is_unresolved() {
        assert_eq!(resolve("", &weapons()), Resolution::Unresolved(String::new()));
        assert_eq!(resolve("", &Catalog::default()), Resolution::Unresolved(String::new()));
    }

    #[test]
    fn test_resolve_strict_never_fuzzes() {
        assert_eq!(
            resolve_strict("skywardb1ade", &weapons()),
            Resolution::Unresolved("skywardb1ade".into())
        );
    }

    #[test]
    fn test_fallback_catalog() {
        let primary = Catalog::new("materials", [("mora", "Mora")]);
        let fallback = Catalog::new("all", [("mysticenhancementore", "MysticEnhancementOre")]);
        assert_eq!(
            resolve_with_fallback("mysticenhancementore", &primary, &fallback),
            Resolution::Exact("MysticEnhancementOre".into())
        );
        assert_eq!(
            resolve_with_fallback("mora", &primary, &fallback).value(),
            Some("Mora")
        );
    }

    #[test]
    fn test_resolution_is_total_over_letters() {
        // Any letters-only input yields a value or the unresolved sentinel.
        for text in ["a", "abcdefghijklmnopqrstuvwxyz", "blade", "qqq"] {
            let normalized = normalize(text, CharClass::Letters);
            match resolve(&normalized, &weapons()) {
                Resolution::Unresolved(t) => assert_eq!(t, normalized),
                found => assert!(found.value().is_some()),
            }
        }
    }
}
