//! Poke Catalog - PDF catalog generator for Pokemon TCG collections
//!
//! Reads a collection CSV export, optionally enriches entries with card
//! images from TCGdex, and renders a printable PDF catalog.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use poke_catalog::models::sort_saleable;
use poke_catalog::{
    config, read_collection, CollectionEntry, Enricher, EnrichmentResult, ImageCache,
    NotFoundLogger, PdfGenerator, PdfOptions, SortOrder, StoreConfig, TcgdexClient,
};

/// Pokemon TCG collection catalog generator
#[derive(Parser, Debug)]
#[command(name = "poke_catalog")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a PDF catalog from a collection CSV
    Generate {
        /// Path to the collection CSV file
        #[arg(short, long, default_value = "collection.csv")]
        csv: PathBuf,

        /// Output PDF path (default: catalogs/catalog_<timestamp>.pdf)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Download card images from TCGdex
        #[arg(long)]
        enrich: bool,

        /// Show prices in the catalog
        #[arg(long)]
        prices: bool,

        /// Catalog title (default: from store configuration)
        #[arg(short, long)]
        title: Option<String>,

        /// Include all cards, not just those with spare copies
        #[arg(short, long)]
        all: bool,

        /// Minimum quantity for a card to be included
        #[arg(short, long, default_value_t = 2)]
        min_qty: u32,

        /// Sort order for the catalog
        #[arg(short, long, value_enum, default_value_t = SortOrder::Set)]
        sort: SortOrder,
    },

    /// List cards in the collection
    List {
        /// Path to the collection CSV file
        #[arg(short, long, default_value = "collection.csv")]
        csv: PathBuf,

        /// Show only cards with spare copies (qty >= 2)
        #[arg(long)]
        saleable: bool,

        /// Filter by set name (substring match)
        #[arg(long)]
        set: Option<String>,
    },

    /// Show collection statistics
    Stats {
        /// Path to the collection CSV file
        #[arg(short, long, default_value = "collection.csv")]
        csv: PathBuf,
    },

    /// Set a custom price for a card
    SetPrice {
        /// Card name to search for
        name: String,

        /// New price in dollars
        price: f64,

        /// Path to the collection CSV file
        #[arg(short, long, default_value = "collection.csv")]
        csv: PathBuf,
    },

    /// Clear the image cache
    ClearCache,

    /// View or edit store configuration
    Config {
        /// Configuration key to view or set
        key: Option<String>,

        /// New value for the key
        value: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Generate {
            csv,
            output,
            enrich,
            prices,
            title,
            all,
            min_qty,
            sort,
        } => cmd_generate(csv, output, enrich, prices, title, all, min_qty, sort).await,
        Command::List { csv, saleable, set } => cmd_list(csv, saleable, set),
        Command::Stats { csv } => cmd_stats(csv),
        Command::SetPrice { name, price, csv } => cmd_set_price(name, price, csv),
        Command::ClearCache => cmd_clear_cache(),
        Command::Config { key, value } => cmd_config(key, value),
    };

    if let Err(e) = result {
        log::error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

#[allow(clippy::too_many_arguments)]
async fn cmd_generate(
    csv: PathBuf,
    output: Option<PathBuf>,
    enrich: bool,
    prices: bool,
    title: Option<String>,
    all: bool,
    min_qty: u32,
    sort: SortOrder,
) -> Result<()> {
    let mut collection =
        read_collection(&csv).with_context(|| format!("Failed to load {:?}", csv))?;
    config::apply_prices(
        &mut collection,
        &config::load_prices(&config::default_prices_path()),
    );

    let min_quantity = if all { 1 } else { min_qty };
    let mut saleable = collection.saleable(min_quantity);
    if saleable.is_empty() {
        println!("No cards with quantity >= {} found.", min_quantity);
        return Ok(());
    }
    sort_saleable(&mut saleable, sort);

    let store_config = StoreConfig::load();

    let mut results: HashMap<String, EnrichmentResult> = HashMap::new();
    let mut enrich_summary = None;
    if enrich {
        let enricher = Enricher::warm_up(
            TcgdexClient::new(),
            ImageCache::new(),
            store_config.enrich_options(),
        )
        .await
        .context("Set catalog warm-up failed, cannot enrich")?;

        let entries: Vec<CollectionEntry> = saleable.iter().map(|s| s.entry.clone()).collect();
        let report = enricher.enrich(&entries).await;

        if let Some(path) = NotFoundLogger::new(config::logs_dir()).log(&report.not_found_entries)
        {
            println!("Not-found log: {}", path.display());
        }
        for (entry, reason) in report.not_found_entries.iter().take(10) {
            println!("  not found: {} ({})", entry.card_name(), reason);
        }
        if report.not_found_entries.len() > 10 {
            println!("  ... and {} more", report.not_found_entries.len() - 10);
        }

        enrich_summary = Some((report.found, report.not_found));
        results = report.results;
    }

    let output = output.unwrap_or_else(|| {
        let timestamp = chrono::Local::now().format("%Y-%m-%d_%H%M%S");
        PathBuf::from("catalogs").join(format!("catalog_{}.pdf", timestamp))
    });
    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {:?}", parent))?;
    }

    let pdf_options = PdfOptions {
        title: title.unwrap_or_else(|| store_config.catalog_title.clone()),
        show_prices: prices,
    };
    let generator = PdfGenerator::new(store_config);
    let (catalog_path, warnings) =
        generator.generate_catalog(&saleable, &results, &pdf_options, &output)?;

    for warning in warnings {
        println!("Warning: {}", warning);
    }

    println!(
        "Loaded {} unique cards ({} total)",
        collection.total_unique(),
        collection.total_cards()
    );
    println!(
        "Included {} cards (quantity >= {})",
        saleable.len(),
        min_quantity
    );
    if let Some((found, not_found)) = enrich_summary {
        println!("Enriched: {} found, {} not found", found, not_found);
    }
    println!("Catalog: {}", catalog_path.display());
    println!("Total collection value: ${:.2}", collection.total_value());
    Ok(())
}

fn cmd_list(csv: PathBuf, saleable_only: bool, set_filter: Option<String>) -> Result<()> {
    let mut collection =
        read_collection(&csv).with_context(|| format!("Failed to load {:?}", csv))?;
    config::apply_prices(
        &mut collection,
        &config::load_prices(&config::default_prices_path()),
    );

    let min_quantity = if saleable_only { 2 } else { 1 };
    let mut entries = collection.saleable(min_quantity);
    if let Some(filter) = &set_filter {
        let filter = filter.to_lowercase();
        entries.retain(|s| s.entry.console_name.to_lowercase().contains(&filter));
    }

    println!(
        "{:<40} {:<30} {:>4} {:>9} {:>9}",
        "Name", "Set", "Qty", "Price", "Total"
    );
    for saleable in &entries {
        let entry = &saleable.entry;
        println!(
            "{:<40} {:<30} {:>4} {:>9} {:>9}",
            entry.card_name().chars().take(40).collect::<String>(),
            entry.console_name.chars().take(30).collect::<String>(),
            saleable.quantity_for_sale,
            format!("${:.2}", entry.price_dollars()),
            format!("${:.2}", saleable.total_value()),
        );
    }
    println!("{} cards", entries.len());
    Ok(())
}

fn cmd_stats(csv: PathBuf) -> Result<()> {
    let mut collection =
        read_collection(&csv).with_context(|| format!("Failed to load {:?}", csv))?;
    config::apply_prices(
        &mut collection,
        &config::load_prices(&config::default_prices_path()),
    );

    let saleable = collection.saleable(2);
    let saleable_copies: u32 = saleable.iter().map(|s| s.quantity_for_sale).sum();
    let saleable_value: f64 = saleable.iter().map(|s| s.total_value()).sum();

    println!("Unique cards:            {}", collection.total_unique());
    println!("Total cards:             {}", collection.total_cards());
    println!("Saleable cards (unique): {}", saleable.len());
    println!("Saleable copies:         {}", saleable_copies);
    println!("Saleable value:          ${:.2}", saleable_value);
    println!("Collection value:        ${:.2}", collection.total_value());

    let sets = collection.unique_sets();
    println!("\nSets in collection: {}", sets.len());
    for set_name in sets {
        println!("  {} ({} cards)", set_name, collection.by_set(set_name).len());
    }
    Ok(())
}

fn cmd_set_price(name: String, price: f64, csv: PathBuf) -> Result<()> {
    let collection =
        read_collection(&csv).with_context(|| format!("Failed to load {:?}", csv))?;

    let needle = name.to_lowercase();
    let matches: Vec<&CollectionEntry> = collection
        .entries
        .iter()
        .filter(|e| e.product_name.to_lowercase().contains(&needle))
        .collect();

    match matches.len() {
        0 => bail!("No cards found matching: {}", name),
        1 => {
            let entry = matches[0];
            config::save_price(&config::default_prices_path(), &entry.id, price)
                .context("Failed to save price")?;
            println!("Updated price for {}: ${:.2}", entry.product_name, price);
            Ok(())
        }
        n => {
            println!("Found {} matching cards:", n);
            for entry in &matches {
                println!("  {} ({})", entry.product_name, entry.console_name);
            }
            bail!("Be more specific to match exactly one card");
        }
    }
}

fn cmd_clear_cache() -> Result<()> {
    let cache = ImageCache::new();
    let freed = cache.clear().context("Failed to clear image cache")?;
    println!("Cache cleared ({:.2} MB freed)", freed as f64 / 1024.0 / 1024.0);
    Ok(())
}

fn cmd_config(key: Option<String>, value: Option<String>) -> Result<()> {
    let config_path = config::default_config_path();
    let mut store_config = StoreConfig::load_from(&config_path);

    match (key, value) {
        (None, _) => {
            println!("Config file: {}", config_path.display());
            for key in config::CONFIG_KEYS {
                println!("  {} = {}", key, store_config.get(key).unwrap_or_default());
            }
            if !store_config.social_networks.is_empty() {
                println!("  social_networks:");
                for network in &store_config.social_networks {
                    println!(
                        "    {}: {} ({})",
                        network.platform, network.handle, network.url
                    );
                }
            }
            println!("\nUse 'poke_catalog config <key> <value>' to update a setting.");
            println!("Edit the config file directly to change social networks.");
        }
        (Some(key), None) => match store_config.get(&key) {
            Some(value) => println!("{} = {}", key, value),
            None => bail!(
                "Unknown key: {} (available: {})",
                key,
                config::CONFIG_KEYS.join(", ")
            ),
        },
        (Some(key), Some(value)) => {
            let old = store_config.get(&key);
            if !store_config.set(&key, &value) {
                bail!(
                    "Cannot set {} to {:?} (available keys: {})",
                    key,
                    value,
                    config::CONFIG_KEYS.join(", ")
                );
            }
            store_config
                .save_to(&config_path)
                .context("Failed to save config")?;
            println!("Updated {}", key);
            if let Some(old) = old {
                println!("  old: {}", old);
            }
            println!("  new: {}", value);
        }
    }
    Ok(())
}
