//! End-to-end tests: collection CSV through enrichment to PDF and log output.

use std::io::Write;

use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use poke_catalog::models::sort_saleable;
use poke_catalog::{
    read_collection, EnrichOptions, Enricher, ImageCache, NotFoundLogger, PdfGenerator,
    PdfOptions, SortOrder, StoreConfig, TcgdexClient,
};

fn write_collection_csv() -> tempfile::NamedTempFile {
    let csv_content = "\
id,product-name,console-name,price-in-pennies,quantity,condition-string,date-entered
1001,Pikachu ex - 57/191,Pokemon Surging Sparks,450,3,Normal wear,2025-01-15
1002,Basic Energy Fire,,10,10,Normal wear,2025-01-15
1003,Unknown Card,Mystery Set,200,2,Normal wear,2025-02-01
1004,Single Copy Card,Pokemon Surging Sparks,900,1,Normal wear,2025-02-01";

    let mut temp_file = tempfile::NamedTempFile::new().unwrap();
    write!(temp_file, "{}", csv_content).unwrap();
    temp_file
}

async fn mount_api(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/sets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "id": "sv08", "name": "Surging Sparks" }
        ])))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/sets/sv08"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "sv08",
            "name": "Surging Sparks",
            "cards": [{
                "id": "sv08-057",
                "localId": "057",
                "name": "Pikachu ex",
                "image": format!("{}/assets/sv08/057", server.uri())
            }]
        })))
        .mount(server)
        .await;

    // not a decodable JPEG; embedding degrades to a catalog warning
    Mock::given(method("GET"))
        .and(path_regex(r"^/assets/.+/high\.jpg$"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xFF, 0xD8, 0xFF, 0xE0]))
        .mount(server)
        .await;
}

#[tokio::test]
async fn full_run_produces_catalog_and_not_found_log() {
    let server = MockServer::start().await;
    mount_api(&server).await;

    let work_dir = tempfile::TempDir::new().unwrap();
    let csv_file = write_collection_csv();

    // load and filter like the generate command does
    let collection = read_collection(csv_file.path()).unwrap();
    assert_eq!(collection.total_unique(), 4);

    let mut saleable = collection.saleable(2);
    assert_eq!(saleable.len(), 3, "single-copy card filtered out");
    sort_saleable(&mut saleable, SortOrder::Set);

    // enrich against the mock API
    let enricher = Enricher::warm_up(
        TcgdexClient::with_base_url(&server.uri()),
        ImageCache::with_dir(work_dir.path().join("images")),
        EnrichOptions {
            max_concurrent: 4,
            timeout_secs: 10,
        },
    )
    .await
    .unwrap();

    let entries: Vec<_> = saleable.iter().map(|s| s.entry.clone()).collect();
    let report = enricher.enrich(&entries).await;

    assert_eq!(report.results.len(), 3);
    assert_eq!(report.found, 1);
    assert_eq!(report.not_found, 2);

    // not-found log names the energy card and the unknown set
    let log_path = NotFoundLogger::new(work_dir.path().join("logs"))
        .log(&report.not_found_entries)
        .unwrap();
    let log_content = std::fs::read_to_string(log_path).unwrap();
    assert!(log_content.contains("Basic Energy Fire"));
    assert!(log_content.contains("Unknown Card | Mystery Set"));
    assert!(!log_content.contains("Pikachu"));

    // the catalog is still produced; the undecodable image becomes a warning
    let output = work_dir.path().join("catalog.pdf");
    let generator = PdfGenerator::new(StoreConfig::default());
    let (pdf_path, warnings) = generator
        .generate_catalog(
            &saleable,
            &report.results,
            &PdfOptions {
                title: "Test Catalog".to_string(),
                show_prices: true,
            },
            &output,
        )
        .unwrap();

    assert!(std::fs::read(pdf_path).unwrap().starts_with(b"%PDF"));
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("Pikachu ex"));
}

#[tokio::test]
async fn catalog_without_enrichment_needs_no_network() {
    let work_dir = tempfile::TempDir::new().unwrap();
    let csv_file = write_collection_csv();

    let collection = read_collection(csv_file.path()).unwrap();
    let mut saleable = collection.saleable(1);
    sort_saleable(&mut saleable, SortOrder::Price);

    let output = work_dir.path().join("catalog.pdf");
    let generator = PdfGenerator::new(StoreConfig::default());
    let (pdf_path, warnings) = generator
        .generate_catalog(
            &saleable,
            &std::collections::HashMap::new(),
            &PdfOptions {
                title: "Plain Catalog".to_string(),
                show_prices: false,
            },
            &output,
        )
        .unwrap();

    assert!(warnings.is_empty());
    assert!(std::fs::read(pdf_path).unwrap().starts_with(b"%PDF"));
}
