//! HTML entity catalogs and the recognizer for already-escaped references.

use crate::errors::{Error, Result};
use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// Selects which set of characters gets escaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EscapeMode {
    /// Only the five characters that matter for HTML parsing and XSS.
    #[default]
    Essential,
    /// Essential plus typographic, currency, fraction, math and arrow symbols.
    Extended,
}

impl EscapeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            EscapeMode::Essential => "essential",
            EscapeMode::Extended => "extended",
        }
    }
}

impl fmt::Display for EscapeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EscapeMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "essential" => Ok(EscapeMode::Essential),
            "extended" => Ok(EscapeMode::Extended),
            _ => Err(Error::InvalidMode(s.to_string())),
        }
    }
}

/// Characters that must always be escaped.
pub const ESSENTIAL_ENTITIES: &[(char, &str)] = &[
    ('&', "&amp;"),
    ('<', "&lt;"),
    ('>', "&gt;"),
    ('"', "&quot;"),
    ('\'', "&#39;"),
];

/// Characters escaped on top of [`ESSENTIAL_ENTITIES`] in extended mode.
pub const ADDITIONAL_ENTITIES: &[(char, &str)] = &[
    ('©', "&copy;"),
    ('®', "&reg;"),
    ('™', "&trade;"),
    // Typography
    ('—', "&mdash;"),
    ('–', "&ndash;"),
    ('\u{00A0}', "&nbsp;"),
    ('…', "&hellip;"),
    ('§', "&sect;"),
    ('¶', "&para;"),
    ('°', "&deg;"),
    // Currency
    ('€', "&euro;"),
    ('£', "&pound;"),
    ('¥', "&yen;"),
    ('¢', "&cent;"),
    // Fractions
    ('½', "&frac12;"),
    ('¼', "&frac14;"),
    ('¾', "&frac34;"),
    // Math & logic
    ('×', "&times;"),
    ('÷', "&divide;"),
    ('±', "&plusmn;"),
    ('∞', "&infin;"),
    ('≠', "&ne;"),
    ('≈', "&asymp;"),
    ('≤', "&le;"),
    ('≥', "&ge;"),
    // Arrows
    ('←', "&larr;"),
    ('→', "&rarr;"),
    ('↑', "&uarr;"),
    ('↓', "&darr;"),
];

/// An immutable, ordered mapping from a literal character to its entity.
///
/// Insertion order is kept so enumeration is deterministic. Escaping itself
/// only ever does point lookups, so order has no effect on its output.
#[derive(Debug)]
pub struct EntityCatalog {
    mode: EscapeMode,
    entries: IndexMap<char, &'static str>,
}

impl EntityCatalog {
    fn build(mode: EscapeMode, tables: &[&[(char, &'static str)]]) -> Self {
        let entries = tables
            .iter()
            .flat_map(|table| table.iter().copied())
            .collect();
        Self { mode, entries }
    }

    /// The mode this catalog belongs to.
    pub fn mode(&self) -> EscapeMode {
        self.mode
    }

    /// Returns the entity string for `ch`, if `ch` is escaped in this catalog.
    pub fn get(&self, ch: char) -> Option<&'static str> {
        self.entries.get(&ch).copied()
    }

    pub fn contains(&self, ch: char) -> bool {
        self.entries.contains_key(&ch)
    }

    /// Iterates `(character, entity)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (char, &'static str)> + '_ {
        self.entries.iter().map(|(ch, entity)| (*ch, *entity))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

static ESSENTIAL: LazyLock<EntityCatalog> =
    LazyLock::new(|| EntityCatalog::build(EscapeMode::Essential, &[ESSENTIAL_ENTITIES]));

static EXTENDED: LazyLock<EntityCatalog> = LazyLock::new(|| {
    EntityCatalog::build(
        EscapeMode::Extended,
        &[ESSENTIAL_ENTITIES, ADDITIONAL_ENTITIES],
    )
});

/// Returns the catalog for the given mode.
pub fn get_entity_map(mode: EscapeMode) -> &'static EntityCatalog {
    match mode {
        EscapeMode::Essential => &ESSENTIAL,
        EscapeMode::Extended => &EXTENDED,
    }
}

const ESCAPED_ENTITY: &str = r"&(?:#[0-9]+|#x[0-9a-fA-F]+|[a-zA-Z]+);";

static ESCAPED_ENTITY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(ESCAPED_ENTITY).expect("entity pattern is valid"));

static WHOLE_ESCAPED_ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("^{ESCAPED_ENTITY}$")).expect("entity pattern is valid")
});

/// Matches anything that looks like an existing entity reference:
/// `&#123;`, `&#x1F;` or `&name;`.
///
/// Any alphabetic name is accepted, so `&bogus;` is treated as escaped too.
pub fn escaped_entity_pattern() -> &'static Regex {
    &ESCAPED_ENTITY_PATTERN
}

/// Returns `true` if `text` is exactly one entity reference.
pub fn is_escaped_entity(text: &str) -> bool {
    WHOLE_ESCAPED_ENTITY.is_match(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_essential_catalog_contents() {
        let catalog = get_entity_map(EscapeMode::Essential);

        assert_eq!(catalog.len(), 5);
        assert_eq!(catalog.get('&'), Some("&amp;"));
        assert_eq!(catalog.get('<'), Some("&lt;"));
        assert_eq!(catalog.get('>'), Some("&gt;"));
        assert_eq!(catalog.get('"'), Some("&quot;"));
        assert_eq!(catalog.get('\''), Some("&#39;"));
        assert!(!catalog.contains('©'));
    }

    #[test]
    fn test_extended_is_superset_of_essential() {
        let essential = get_entity_map(EscapeMode::Essential);
        let extended = get_entity_map(EscapeMode::Extended);

        for (ch, entity) in essential.iter() {
            assert_eq!(extended.get(ch), Some(entity), "mismatch for {ch:?}");
        }
        assert_eq!(
            extended.len(),
            ESSENTIAL_ENTITIES.len() + ADDITIONAL_ENTITIES.len()
        );
    }

    #[test]
    fn test_extended_symbols_present() {
        let extended = get_entity_map(EscapeMode::Extended);
        for ch in [
            '©', '®', '™', '—', '–', '\u{00A0}', '…', '§', '¶', '°', '€', '£', '¥', '¢', '½',
            '¼', '¾', '×', '÷', '±', '∞', '≠', '≈', '≤', '≥', '←', '→', '↑', '↓',
        ] {
            assert!(extended.contains(ch), "missing {ch:?}");
        }
        assert_eq!(extended.get('\u{00A0}'), Some("&nbsp;"));
    }

    #[test]
    fn test_catalog_order_is_insertion_order() {
        let first: Vec<char> = get_entity_map(EscapeMode::Extended)
            .iter()
            .take(6)
            .map(|(ch, _)| ch)
            .collect();
        assert_eq!(first, vec!['&', '<', '>', '"', '\'', '©']);
    }

    #[test]
    fn test_get_entity_map_returns_shared_instances() {
        let a = get_entity_map(EscapeMode::Extended);
        let b = get_entity_map(EscapeMode::Extended);
        assert!(std::ptr::eq(a, b));
        assert_eq!(a.mode(), EscapeMode::Extended);
        assert_eq!(get_entity_map(EscapeMode::Essential).mode(), EscapeMode::Essential);
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("essential".parse::<EscapeMode>().unwrap(), EscapeMode::Essential);
        assert_eq!("extended".parse::<EscapeMode>().unwrap(), EscapeMode::Extended);
        assert!("Extended".parse::<EscapeMode>().is_err());
        let err = "loose".parse::<EscapeMode>().unwrap_err();
        assert!(matches!(err, Error::InvalidMode(ref m) if m == "loose"));
        assert_eq!(EscapeMode::default(), EscapeMode::Essential);
        assert_eq!(EscapeMode::Extended.to_string(), "extended");
    }

    #[test]
    fn test_recognizer_accepts_entity_forms() {
        for text in ["&amp;", "&#39;", "&#x1F600;", "&#XFF;", "&bogus;", "&NBSP;"] {
            let expected = text != "&#XFF;";
            assert_eq!(is_escaped_entity(text), expected, "{text}");
        }
    }

    #[test]
    fn test_recognizer_rejects_partial_forms() {
        for text in ["&", "&amp", "&;", "&#;", "&#x;", "&a1;", "& amp;", "x&amp;"] {
            assert!(!is_escaped_entity(text), "{text}");
        }
    }

    #[test]
    fn test_pattern_scans_non_overlapping() {
        let found: Vec<&str> = escaped_entity_pattern()
            .find_iter("&amp;&lt;&&gt;")
            .map(|m| m.as_str())
            .collect();
        assert_eq!(found, vec!["&amp;", "&lt;", "&gt;"]);
    }
}
