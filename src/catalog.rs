//! Maps free-text set names from collection exports to TCGdex set codes
//!
//! A static alias table covers the sets seen in real exports; it is extended
//! once per run with the full set list fetched from the API, so newly
//! released sets resolve without a code change.

use std::collections::HashMap;

use crate::api::TcgdexClient;
use crate::error::Result;

/// Known set name -> set code aliases.
///
/// Collection exports spell these inconsistently; the table is consulted
/// after normalization so casing and punctuation do not matter.
static SET_ALIASES: &[(&str, &str)] = &[
    ("Scarlet & Violet", "sv01"),
    ("Paldea Evolved", "sv02"),
    ("Obsidian Flames", "sv03"),
    ("151", "sv03.5"),
    ("Paradox Rift", "sv04"),
    ("Paldean Fates", "sv04.5"),
    ("Temporal Forces", "sv05"),
    ("Twilight Masquerade", "sv06"),
    ("Shrouded Fable", "sv06.5"),
    ("Stellar Crown", "sv07"),
    ("Surging Sparks", "sv08"),
    ("Prismatic Evolutions", "sv08.5"),
    ("Journey Together", "sv09"),
    ("Destined Rivals", "sv10"),
    ("Black Bolt", "sv10.5b"),
    ("White Flare", "sv10.5w"),
    ("Phantasmal Flames", "me02"),
    ("Promo", "svp"),
    ("Black Star Promo", "svp"),
    ("SVP Black Star Promos", "svp"),
    ("Sword & Shield", "swsh01"),
    ("Rebel Clash", "swsh02"),
    ("Darkness Ablaze", "swsh03"),
    ("Champion's Path", "swsh03.5"),
    ("Vivid Voltage", "swsh04"),
    ("Shining Fates", "swsh04.5"),
    ("Battle Styles", "swsh05"),
    ("Chilling Reign", "swsh06"),
    ("Evolving Skies", "swsh07"),
    ("Fusion Strike", "swsh08"),
    ("Brilliant Stars", "swsh09"),
    ("Astral Radiance", "swsh10"),
    ("Pokemon Go", "pgo"),
    ("Lost Origin", "swsh11"),
    ("Silver Tempest", "swsh12"),
    ("Crown Zenith", "swsh12.5"),
];

/// Normalize a set name for lookup: case-fold, fold common diacritics,
/// drop punctuation and collapse whitespace.
pub fn normalize_set_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.to_lowercase().chars() {
        match c {
            'á' | 'à' | 'â' | 'ä' | 'ã' => out.push('a'),
            'é' | 'è' | 'ê' | 'ë' => out.push('e'),
            'í' | 'ì' | 'î' | 'ï' => out.push('i'),
            'ó' | 'ò' | 'ô' | 'ö' | 'õ' => out.push('o'),
            'ú' | 'ù' | 'û' | 'ü' => out.push('u'),
            'ñ' => out.push('n'),
            'ç' => out.push('c'),
            c if c.is_alphanumeric() => out.push(c),
            _ => out.push(' '),
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strip the leading "Pokemon" brand word exports prefix set names with
fn strip_brand(name: &str) -> &str {
    let trimmed = name.trim();
    for prefix in ["Pokemon", "Pokémon", "pokemon"] {
        if let Some(rest) = trimmed.strip_prefix(prefix) {
            return rest.trim_start();
        }
    }
    trimmed
}

/// Lookup table from normalized set names to canonical set codes.
///
/// Built once before entry resolution starts and read-only afterwards, so
/// concurrent enrichment tasks can share it behind an `Arc` without locking.
pub struct SetCatalog {
    by_name: HashMap<String, String>,
}

impl SetCatalog {
    /// Catalog seeded from the static alias table only (no network)
    pub fn builtin() -> Self {
        let mut catalog = Self {
            by_name: HashMap::new(),
        };
        for (name, code) in SET_ALIASES {
            catalog.insert(name, code);
        }
        catalog
    }

    /// Build the full catalog: static aliases plus the set list fetched from
    /// the API. The fetch happens once per run; failure here is fatal since
    /// nothing can be resolved without a set catalog.
    pub async fn warm_up(client: &TcgdexClient) -> Result<Self> {
        let mut catalog = Self::builtin();
        let sets = client.fetch_sets().await?;
        log::info!("Fetched {} sets from card database", sets.len());
        for set in &sets {
            catalog.insert(&set.name, &set.id);
        }
        Ok(catalog)
    }

    fn insert(&mut self, name: &str, code: &str) {
        self.by_name
            .insert(normalize_set_name(name), code.to_string());
        // canonical codes resolve to themselves ("sv08.5" -> "sv08.5")
        self.by_name
            .entry(normalize_set_name(code))
            .or_insert_with(|| code.to_string());
    }

    /// Resolve a free-text set/console name to a set code.
    ///
    /// Exact normalized lookup first, then a substring scan (longest alias
    /// wins) for names like "Pokemon Journey Together Booster".
    pub fn resolve(&self, console_name: &str) -> Option<&str> {
        let needle = normalize_set_name(strip_brand(console_name));
        if needle.is_empty() {
            return None;
        }

        if let Some(code) = self.by_name.get(&needle) {
            return Some(code.as_str());
        }

        self.by_name
            .iter()
            .filter(|(name, _)| needle.contains(name.as_str()))
            .max_by_key(|(name, _)| name.len())
            .map(|(_, code)| code.as_str())
    }

    /// Number of known aliases
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_set_name() {
        assert_eq!(normalize_set_name("Prismatic Evolutions"), "prismatic evolutions");
        assert_eq!(normalize_set_name("sv08.5"), "sv08 5");
        assert_eq!(normalize_set_name("Champion's  Path"), "champion s path");
        assert_eq!(normalize_set_name("Pokémon"), "pokemon");
    }

    #[test]
    fn test_alias_and_code_resolve_to_same_set() {
        let catalog = SetCatalog::builtin();
        let by_alias = catalog.resolve("Prismatic Evolutions").unwrap();
        let by_code = catalog.resolve("sv08.5").unwrap();
        assert_eq!(by_alias, by_code);
        assert_eq!(by_alias, "sv08.5");
    }

    #[test]
    fn test_resolve_case_and_punctuation_insensitive() {
        let catalog = SetCatalog::builtin();
        assert_eq!(catalog.resolve("champions path"), Some("swsh03.5"));
        assert_eq!(catalog.resolve("SURGING SPARKS"), Some("sv08"));
    }

    #[test]
    fn test_resolve_strips_brand_prefix() {
        let catalog = SetCatalog::builtin();
        assert_eq!(catalog.resolve("Pokemon Journey Together"), Some("sv09"));
    }

    #[test]
    fn test_resolve_substring_match() {
        let catalog = SetCatalog::builtin();
        assert_eq!(
            catalog.resolve("Pokemon Surging Sparks Booster Box"),
            Some("sv08")
        );
    }

    #[test]
    fn test_resolve_unknown_set() {
        let catalog = SetCatalog::builtin();
        assert_eq!(catalog.resolve("Definitely Not A Real Set"), None);
        assert_eq!(catalog.resolve(""), None);
    }

    #[test]
    fn test_dynamic_entries_extend_builtin() {
        let mut catalog = SetCatalog::builtin();
        catalog.insert("Mega Evolution", "me01");
        assert_eq!(catalog.resolve("Mega Evolution"), Some("me01"));
        assert_eq!(catalog.resolve("me01"), Some("me01"));
    }
}
