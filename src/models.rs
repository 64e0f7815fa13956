use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;

lazy_static! {
    /// "Pikachu ex - 123/456" style product names
    static ref NAME_WITH_FRACTION: Regex = Regex::new(r"^(.+?)\s*-\s*(\d+)/\d+").unwrap();
}

/// One row of the collection CSV export.
///
/// Column names follow the PriceCharting collection export format.
#[derive(Debug, Deserialize, Clone)]
pub struct CollectionEntry {
    pub id: String,
    #[serde(rename = "product-name")]
    pub product_name: String,
    #[serde(rename = "console-name")]
    pub console_name: String,
    #[serde(rename = "price-in-pennies", default)]
    pub price_in_pennies: i64,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(rename = "condition-string", default)]
    pub condition: String,
    #[serde(rename = "date-entered", default)]
    pub date_entered: String,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    /// Price override loaded from prices.json, not part of the CSV
    #[serde(skip)]
    pub custom_price: Option<f64>,
}

fn default_quantity() -> u32 {
    1
}

impl CollectionEntry {
    /// Price in dollars, preferring a custom override when set
    pub fn price_dollars(&self) -> f64 {
        match self.custom_price {
            Some(price) => price,
            None => self.price_in_pennies as f64 / 100.0,
        }
    }

    /// Card name without the trailing number markers.
    ///
    /// "Pikachu ex - 123/456" -> "Pikachu ex", "Mew #151" -> "Mew".
    pub fn card_name(&self) -> &str {
        if let Some(caps) = NAME_WITH_FRACTION.captures(&self.product_name) {
            return caps.get(1).map(|m| m.as_str()).unwrap_or(&self.product_name);
        }
        if let Some(idx) = self.product_name.find('#') {
            return self.product_name[..idx].trim_end();
        }
        &self.product_name
    }

    /// Collector number extracted from the product name, empty if absent.
    ///
    /// "Pikachu ex - 123/456" -> "123", "Mew #151" -> "151".
    pub fn card_number(&self) -> &str {
        if let Some(caps) = NAME_WITH_FRACTION.captures(&self.product_name) {
            return caps.get(2).map(|m| m.as_str()).unwrap_or("");
        }
        if let Some(idx) = self.product_name.rfind('#') {
            return self.product_name[idx + 1..].trim();
        }
        ""
    }

    /// Basic energy cards have no entry in the external catalog and must
    /// never be sent to the resolvers.
    pub fn is_basic_energy(&self) -> bool {
        let name = self.product_name.to_lowercase();
        (name.contains("basic") && name.contains("energy"))
            || self.console_name.to_lowercase().contains("energy")
    }
}

impl std::fmt::Display for CollectionEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({}) - ${:.2} x{}",
            self.product_name,
            self.console_name,
            self.price_dollars(),
            self.quantity
        )
    }
}

/// A collection entry eligible for the catalog, with the copy count offered
/// for sale (one copy is kept when filtering at quantity >= 2).
#[derive(Debug, Clone)]
pub struct SaleableEntry {
    pub entry: CollectionEntry,
    pub quantity_for_sale: u32,
}

impl SaleableEntry {
    /// Total value of all offered copies
    pub fn total_value(&self) -> f64 {
        self.entry.price_dollars() * self.quantity_for_sale as f64
    }
}

/// The entire parsed collection
#[derive(Debug, Default)]
pub struct Collection {
    pub entries: Vec<CollectionEntry>,
}

impl Collection {
    pub fn new(entries: Vec<CollectionEntry>) -> Self {
        Self { entries }
    }

    /// Entries with quantity >= min_quantity.
    ///
    /// At min_quantity 1 every copy is offered; above that one copy of each
    /// card is kept back and the rest are for sale.
    pub fn saleable(&self, min_quantity: u32) -> Vec<SaleableEntry> {
        self.entries
            .iter()
            .filter(|e| e.quantity >= min_quantity.max(1))
            .map(|e| SaleableEntry {
                entry: e.clone(),
                quantity_for_sale: if min_quantity <= 1 {
                    e.quantity
                } else {
                    e.quantity - 1
                },
            })
            .collect()
    }

    /// Unique set names, sorted
    pub fn unique_sets(&self) -> Vec<&str> {
        let mut sets: Vec<&str> = self
            .entries
            .iter()
            .map(|e| e.console_name.as_str())
            .collect();
        sets.sort_unstable();
        sets.dedup();
        sets
    }

    /// Entries belonging to a given set name
    pub fn by_set(&self, set_name: &str) -> Vec<&CollectionEntry> {
        self.entries
            .iter()
            .filter(|e| e.console_name == set_name)
            .collect()
    }

    /// Number of distinct rows
    pub fn total_unique(&self) -> usize {
        self.entries.len()
    }

    /// Number of physical cards, counting duplicates
    pub fn total_cards(&self) -> u32 {
        self.entries.iter().map(|e| e.quantity).sum()
    }

    /// Combined value of the whole collection
    pub fn total_value(&self) -> f64 {
        self.entries
            .iter()
            .map(|e| e.price_dollars() * e.quantity as f64)
            .sum()
    }
}

/// Catalog sort orders
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SortOrder {
    /// By set name, then collector number
    Set,
    /// Alphabetically by card name
    Name,
    /// Most expensive first
    Price,
}

/// Sort saleable entries for catalog layout
pub fn sort_saleable(entries: &mut [SaleableEntry], order: SortOrder) {
    match order {
        SortOrder::Name => {
            entries.sort_by(|a, b| {
                a.entry
                    .card_name()
                    .to_lowercase()
                    .cmp(&b.entry.card_name().to_lowercase())
            });
        }
        SortOrder::Price => {
            entries.sort_by(|a, b| {
                b.entry
                    .price_dollars()
                    .partial_cmp(&a.entry.price_dollars())
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
        }
        SortOrder::Set => {
            entries.sort_by(|a, b| {
                let num = |e: &CollectionEntry| e.card_number().parse::<u32>().unwrap_or(0);
                (a.entry.console_name.to_lowercase(), num(&a.entry))
                    .cmp(&(b.entry.console_name.to_lowercase(), num(&b.entry)))
            });
        }
    }
}
