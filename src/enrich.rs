//! Concurrent enrichment of collection entries with card images
//!
//! Resolves each entry through set catalog -> card listing -> image cache,
//! with a shared semaphore bounding in-flight API work. A permit is held for
//! an entry's whole resolution chain, so no more than the configured number
//! of requests are ever outstanding. Each entry succeeds or fails on its
//! own; only the initial set-catalog warm-up can abort a run.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, Semaphore};

use crate::api::{CardResume, TcgdexClient};
use crate::cache::{fetch_image_cached, ImageCache};
use crate::catalog::SetCatalog;
use crate::error::{CatalogError, FailReason, Result};
use crate::matching::find_best_match;
use crate::models::CollectionEntry;

/// Tuning knobs for an enrichment run
#[derive(Debug, Clone)]
pub struct EnrichOptions {
    /// Maximum simultaneous in-flight API requests
    pub max_concurrent: usize,
    /// Per-entry resolution deadline in seconds
    pub timeout_secs: u64,
}

impl Default for EnrichOptions {
    fn default() -> Self {
        Self {
            max_concurrent: 20,
            timeout_secs: 30,
        }
    }
}

/// Outcome of enriching one collection entry
#[derive(Debug, Clone)]
pub enum EnrichmentResult {
    /// The card image is available at this local path
    Enriched { image_path: PathBuf },
    /// The entry could not be resolved to an image
    NotFound { reason: FailReason },
}

impl EnrichmentResult {
    pub fn is_enriched(&self) -> bool {
        matches!(self, EnrichmentResult::Enriched { .. })
    }

    pub fn image_path(&self) -> Option<&Path> {
        match self {
            EnrichmentResult::Enriched { image_path } => Some(image_path),
            EnrichmentResult::NotFound { .. } => None,
        }
    }
}

/// Aggregate outcome of an enrichment run
#[derive(Debug, Default)]
pub struct EnrichmentReport {
    /// One result per entry, keyed by the entry's catalog id
    pub results: HashMap<String, EnrichmentResult>,
    pub found: usize,
    pub not_found: usize,
    /// Consolidated list for the not-found log
    pub not_found_entries: Vec<(CollectionEntry, FailReason)>,
}

impl EnrichmentReport {
    pub fn result_for(&self, entry: &CollectionEntry) -> Option<&EnrichmentResult> {
        self.results.get(&entry.id)
    }
}

/// Shared state for concurrent entry resolution. The catalog is built once
/// during warm-up and read-only afterwards.
struct Shared {
    client: TcgdexClient,
    catalog: SetCatalog,
    cache: ImageCache,
    semaphore: Semaphore,
    timeout: Duration,
    /// Per-set card listings, fetched at most once per run
    set_cards: Mutex<HashMap<String, Arc<Vec<CardResume>>>>,
}

/// Enrichment pipeline over a warmed-up set catalog
pub struct Enricher {
    shared: Arc<Shared>,
}

impl Enricher {
    /// Build the pipeline: fetches the set list once. Failure here is fatal
    /// to the run since no entry can be resolved without the set catalog.
    pub async fn warm_up(
        client: TcgdexClient,
        cache: ImageCache,
        options: EnrichOptions,
    ) -> Result<Self> {
        let catalog = SetCatalog::warm_up(&client).await?;
        log::info!(
            "Set catalog ready: {} aliases, concurrency limit {}",
            catalog.len(),
            options.max_concurrent
        );
        Ok(Self {
            shared: Arc::new(Shared {
                client,
                catalog,
                cache,
                semaphore: Semaphore::new(options.max_concurrent.max(1)),
                timeout: Duration::from_secs(options.timeout_secs),
                set_cards: Mutex::new(HashMap::new()),
            }),
        })
    }

    /// Enrich a batch of entries. Returns exactly one result per entry,
    /// keyed by entry id; completion order is invisible to the caller.
    pub async fn enrich(&self, entries: &[CollectionEntry]) -> EnrichmentReport {
        let mut report = EnrichmentReport::default();
        let mut handles = Vec::new();

        for entry in entries {
            // Basic energy cards do not exist in the external catalog;
            // checked before any resolver is consulted.
            if entry.is_basic_energy() {
                log::debug!("Skipping basic energy: {}", entry.product_name);
                report.results.insert(
                    entry.id.clone(),
                    EnrichmentResult::NotFound {
                        reason: FailReason::NotEnrichable,
                    },
                );
                report
                    .not_found_entries
                    .push((entry.clone(), FailReason::NotEnrichable));
                continue;
            }

            let shared = Arc::clone(&self.shared);
            let entry = entry.clone();
            handles.push(tokio::spawn(async move {
                let outcome = resolve_entry(&shared, &entry).await;
                (entry, outcome)
            }));
        }

        for handle in handles {
            match handle.await {
                Ok((entry, Ok(image_path))) => {
                    log::info!("Enriched {} -> {:?}", entry.product_name, image_path);
                    report
                        .results
                        .insert(entry.id.clone(), EnrichmentResult::Enriched { image_path });
                }
                Ok((entry, Err(reason))) => {
                    log::debug!("Not found: {} ({})", entry.product_name, reason);
                    report.results.insert(
                        entry.id.clone(),
                        EnrichmentResult::NotFound {
                            reason: reason.clone(),
                        },
                    );
                    report.not_found_entries.push((entry, reason));
                }
                Err(e) => {
                    log::error!("Enrichment task failed: {}", e);
                }
            }
        }

        report.found = report.results.values().filter(|r| r.is_enriched()).count();
        report.not_found = report.results.len() - report.found;
        log::info!(
            "Enrichment complete: {} found, {} not found",
            report.found,
            report.not_found
        );
        report
    }
}

/// Resolve one entry, gated by the shared semaphore. The permit covers the
/// whole chain (set listing fetch + image download), keeping total in-flight
/// requests within the configured ceiling.
async fn resolve_entry(
    shared: &Shared,
    entry: &CollectionEntry,
) -> std::result::Result<PathBuf, FailReason> {
    let _permit = shared.semaphore.acquire().await.unwrap();

    match tokio::time::timeout(shared.timeout, resolve_chain(shared, entry)).await {
        Ok(outcome) => outcome,
        Err(_) => {
            log::warn!("Timed out resolving {}", entry.product_name);
            Err(FailReason::Timeout)
        }
    }
}

async fn resolve_chain(
    shared: &Shared,
    entry: &CollectionEntry,
) -> std::result::Result<PathBuf, FailReason> {
    let set_code = shared
        .catalog
        .resolve(&entry.console_name)
        .ok_or_else(|| FailReason::SetNotFound(entry.console_name.clone()))?;

    let cards = set_cards(shared, set_code).await.map_err(|e| {
        // network failure and absent card are distinct, but both end the
        // entry; the reason string keeps the distinction for the log
        FailReason::CardNotFound(format!("{} ({})", entry.card_name(), e))
    })?;

    let card = find_best_match(entry.card_name(), entry.card_number(), &cards)
        .ok_or_else(|| FailReason::CardNotFound(entry.card_name().to_string()))?;

    let url = card
        .image_url()
        .ok_or_else(|| FailReason::ImageDownloadFailed(format!("no image asset: {}", card.name)))?;

    fetch_image_cached(&shared.cache, &shared.client, set_code, &card.local_id, &url)
        .await
        .map_err(|e| match e {
            CatalogError::ImageDownloadFailed(detail) => FailReason::ImageDownloadFailed(detail),
            other => FailReason::ImageDownloadFailed(other.to_string()),
        })
}

/// Card listing for a set, fetched once per run and shared across entries.
/// Two entries racing on a cold set may both fetch; the first insert wins.
async fn set_cards(shared: &Shared, set_code: &str) -> Result<Arc<Vec<CardResume>>> {
    {
        let listings = shared.set_cards.lock().await;
        if let Some(cards) = listings.get(set_code) {
            return Ok(Arc::clone(cards));
        }
    }

    let detail = shared.client.fetch_set(set_code).await?;
    log::debug!("Fetched {} cards for set {}", detail.cards.len(), set_code);

    let mut listings = shared.set_cards.lock().await;
    let cards = listings
        .entry(set_code.to_string())
        .or_insert_with(|| Arc::new(detail.cards));
    Ok(Arc::clone(cards))
}

#[cfg(test)]
#[path = "enrich_tests.rs"]
mod tests;
