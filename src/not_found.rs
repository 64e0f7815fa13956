//! Per-run log of entries that could not be enriched
//!
//! Best-effort by design: catalog generation must never fail because the
//! not-found log could not be written, so every failure here degrades to a
//! console warning.

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::FailReason;
use crate::models::CollectionEntry;

/// Writes timestamped not-found logs into a directory
pub struct NotFoundLogger {
    logs_dir: PathBuf,
}

impl NotFoundLogger {
    pub fn new<P: Into<PathBuf>>(logs_dir: P) -> Self {
        Self {
            logs_dir: logs_dir.into(),
        }
    }

    /// Write one consolidated log for a run. Returns the log path, or `None`
    /// if nothing needed logging or the write failed.
    pub fn log(&self, entries: &[(CollectionEntry, FailReason)]) -> Option<PathBuf> {
        if entries.is_empty() {
            return None;
        }

        let now = chrono::Local::now();
        let path = self
            .logs_dir
            .join(format!("not_found_{}.txt", now.format("%Y-%m-%d_%H%M%S")));

        match self.write_log(&path, &now, entries) {
            Ok(()) => {
                log::info!("Not-found log written: {:?}", path);
                Some(path)
            }
            Err(e) => {
                log::warn!("Could not write not-found log: {}", e);
                None
            }
        }
    }

    fn write_log(
        &self,
        path: &Path,
        now: &chrono::DateTime<chrono::Local>,
        entries: &[(CollectionEntry, FailReason)],
    ) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.logs_dir)?;
        let mut file = std::fs::File::create(path)?;

        writeln!(file, "Cards not found - {}", now.format("%Y-%m-%d %H:%M:%S"))?;
        writeln!(file, "Total: {}", entries.len())?;
        writeln!(file, "{}", "-".repeat(50))?;
        writeln!(file)?;
        for (entry, reason) in entries {
            writeln!(
                file,
                "{} | {} | #{} | {}",
                entry.card_name(),
                entry.console_name,
                entry.card_number(),
                reason
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(product: &str, console: &str) -> CollectionEntry {
        CollectionEntry {
            id: "1".to_string(),
            product_name: product.to_string(),
            console_name: console.to_string(),
            price_in_pennies: 0,
            quantity: 1,
            condition: String::new(),
            date_entered: String::new(),
            sku: None,
            notes: None,
            custom_price: None,
        }
    }

    #[test]
    fn test_log_writes_entries_with_reasons() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let logger = NotFoundLogger::new(temp_dir.path());

        let path = logger
            .log(&[
                (
                    entry("Nonexistent Card", "sv99"),
                    FailReason::SetNotFound("sv99".to_string()),
                ),
                (entry("Basic Energy Fire", ""), FailReason::NotEnrichable),
            ])
            .unwrap();

        let content = std::fs::read_to_string(path).unwrap();
        assert!(content.contains("Total: 2"));
        assert!(content.contains("Nonexistent Card | sv99"));
        assert!(content.contains("set not found: sv99"));
        assert!(content.contains("basic energy"));
    }

    #[test]
    fn test_log_empty_list_writes_nothing() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let logger = NotFoundLogger::new(temp_dir.path());

        assert!(logger.log(&[]).is_none());
        assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_log_failure_degrades_to_none() {
        // a file where the logs directory should be makes the write fail
        let temp_dir = tempfile::TempDir::new().unwrap();
        let blocker = temp_dir.path().join("logs");
        std::fs::write(&blocker, b"").unwrap();

        let logger = NotFoundLogger::new(&blocker);
        let result = logger.log(&[(entry("Card", "Set"), FailReason::Timeout)]);
        assert!(result.is_none());
    }
}
