use std::path::Path;

use crate::error::Result;
use crate::models::{Collection, CollectionEntry};

/// Read a collection CSV export.
///
/// Rows that fail to parse are logged and skipped so a single malformed line
/// does not lose the rest of the file.
pub fn read_collection<P: AsRef<Path>>(path: P) -> Result<Collection> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let mut entries = Vec::new();
    for (i, result) in rdr.deserialize().enumerate() {
        match result {
            Ok(entry) => {
                let entry: CollectionEntry = entry;
                entries.push(entry);
            }
            Err(e) => {
                log::warn!("Skipping row {}: {}", i + 2, e);
            }
        }
    }

    log::info!("Loaded {} collection entries", entries.len());
    Ok(Collection::new(entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_collection() {
        let csv_content = "\
id,product-name,console-name,price-in-pennies,quantity,condition-string,date-entered
12345,Pikachu ex - 57/191,Pokemon Surging Sparks,450,3,Normal wear,2025-01-15
67890,Mew #151,Pokemon 151,1200,1,Normal wear,2025-02-01";

        let mut temp_file = tempfile::NamedTempFile::new().unwrap();
        write!(temp_file, "{}", csv_content).unwrap();

        let collection = read_collection(temp_file.path()).unwrap();
        assert_eq!(collection.total_unique(), 2);
        assert_eq!(collection.entries[0].id, "12345");
        assert_eq!(collection.entries[0].card_name(), "Pikachu ex");
        assert_eq!(collection.entries[0].quantity, 3);
        assert_eq!(collection.entries[1].price_in_pennies, 1200);
    }

    #[test]
    fn test_read_collection_skips_bad_rows() {
        // second row is missing required columns entirely
        let csv_content = "\
id,product-name,console-name,price-in-pennies,quantity
1,Pikachu,Surging Sparks,100,1
2,Squirtle,Base,not-a-number,also-not
3,Charmander,Base,200,2";

        let mut temp_file = tempfile::NamedTempFile::new().unwrap();
        write!(temp_file, "{}", csv_content).unwrap();

        let collection = read_collection(temp_file.path()).unwrap();
        assert_eq!(collection.total_unique(), 2);
        assert_eq!(collection.entries[1].product_name, "Charmander");
    }
}
