//! Integration tests for the Bioindex conversion pipeline.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use serde_json::{json, Value};
use tempfile::TempDir;

use bioindex::{
    Bioindex, BioindexError, ConvertConfig, Converter, Delimiter, DelimitedSink, DimensionName,
    ExportSink, FailingTaxonomyService, InvalidRecordError, JsonSink, Locale, MemorySink,
    ResolverConfig, SinkError, StaticTaxonomyService, TableSet,
};

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data/two_samples.json")
}

fn fixture() -> Bioindex {
    Bioindex::from_path(fixture_path()).expect("Failed to load fixture")
}

fn offline() -> Converter {
    Converter::with_config(ConvertConfig::default().with_resolve_taxonomies(false))
}

fn names_service() -> StaticTaxonomyService {
    StaticTaxonomyService::new()
        .with_name("9606", "Homo sapiens")
        .with_name("5507", "Fusarium oxysporum")
}

// =============================================================================
// Tabular Shape Tests
// =============================================================================

#[tokio::test]
async fn test_convert_fixture_without_resolution() {
    let conversion = offline().convert(fixture()).await.expect("Conversion failed");
    let tables = &conversion.tables;

    assert!(conversion.resolution.is_none());
    assert!(conversion.warnings.is_empty());
    assert_eq!(tables.info.version, 4);
    assert_eq!(tables.samples(), vec!["S1", "S2"]);
    assert_eq!(tables.by_dimension.len(), 8);
    assert_eq!(tables.by_process.len(), 8);
    assert_eq!(tables.diversity.len(), 6);
    assert_eq!(tables.community_composition.len(), 4);
    assert!(tables.community_composition.iter().all(|r| r.taxon.is_none()));
}

#[tokio::test]
async fn test_spec_example_single_sample() {
    let record = json!({
        "id": "bx",
        "hash": "h",
        "version": 1,
        "updatedAt": "2024-01-01",
        "results": [{
            "sample": "S1",
            "ggh": 0.8,
            "diversity": {
                "statistics": { "faithPd": {}, "shannon": {}, "richness": {} },
                "communityComposition": [
                    { "key": "9606", "keyType": "taxid", "count": 3, "isPathogenic": false }
                ]
            },
            "byDimension": {
                "biodiversity": { "ggh": 0.5, "byProcess": [{ "process": "P1", "ggh": 0.5 }] },
                "biologicalAgents": { "ggh": 0.0, "byProcess": [] },
                "biologicalFertility": { "ggh": 0.0, "byProcess": [] },
                "phytosanitaryRisk": { "ggh": 0.0, "byProcess": [] }
            }
        }]
    });
    let bioindex: Bioindex = serde_json::from_value(record).unwrap();

    let unresolved = offline().convert(bioindex.clone()).await.unwrap();
    let doc = unresolved.tables.to_document().unwrap();
    assert_eq!(doc["by_sample"], json!([{ "sample": "S1", "ggh": 0.8 }]));
    assert_eq!(
        doc["by_process"][0],
        json!({ "sample": "S1", "dimension": "biodiversity", "process": "P1", "ggh": 0.5 })
    );
    assert_eq!(
        doc["community_composition"],
        json!([{
            "sample": "S1",
            "key": "9606",
            "keyType": "taxid",
            "count": 3,
            "isPathogenic": false,
            "taxon": null
        }])
    );

    let resolved = Converter::new()
        .with_taxonomy_service(names_service())
        .convert(bioindex)
        .await
        .unwrap();
    let doc = resolved.tables.to_document().unwrap();
    assert_eq!(doc["community_composition"][0]["taxon"], json!("Homo sapiens"));
}

#[tokio::test]
async fn test_document_has_expected_top_level_shape() {
    let conversion = offline().convert(fixture()).await.unwrap();
    let doc = conversion.tables.to_document().unwrap();

    let keys: Vec<_> = doc.as_object().unwrap().keys().cloned().collect();
    assert_eq!(keys, TableSet::TABLE_NAMES.to_vec());
    assert!(doc["info"].is_object());
    for table in &TableSet::TABLE_NAMES[1..] {
        assert!(doc[*table].is_array(), "{} should be a list", table);
    }
    assert_eq!(doc["info"]["updatedAt"], json!("2024-05-02T10:15:00Z"));
}

#[tokio::test]
async fn test_group_column_only_for_biological_fertility() {
    let conversion = offline().convert(fixture()).await.unwrap();
    let doc = conversion.tables.to_document().unwrap();

    for row in doc["by_process"].as_array().unwrap() {
        let fertility = row["dimension"] == json!("biologicalFertility");
        if !fertility {
            assert!(row.get("group").is_none(), "unexpected group in {}", row);
        }
    }
    let groups: Vec<_> = conversion
        .tables
        .by_process
        .iter()
        .filter(|r| r.dimension == DimensionName::BiologicalFertility)
        .map(|r| r.group.clone())
        .collect();
    assert_eq!(
        groups,
        vec![
            Some("nitrogen".to_string()),
            Some("phosphorus".to_string()),
            Some("nitrogen".to_string()),
            None
        ]
    );
}

// =============================================================================
// Taxonomy Resolution Tests
// =============================================================================

#[tokio::test]
async fn test_resolution_fills_known_taxa_only() {
    let service = Arc::new(names_service());
    let conversion = Converter::new()
        .with_shared_taxonomy_service(service.clone())
        .convert(fixture())
        .await
        .unwrap();

    let taxa: Vec<_> = conversion
        .tables
        .community_composition
        .iter()
        .map(|r| (r.sample.as_str(), r.key.as_str(), r.taxon.as_deref()))
        .collect();
    assert_eq!(
        taxa,
        vec![
            ("S1", "9606", Some("Homo sapiens")),
            ("S1", "5507", Some("Fusarium oxysporum")),
            ("S1", "1423", None),
            ("S2", "5507", Some("Fusarium oxysporum")),
        ]
    );

    // Three unique keys, one batch, no repeated lookups for 5507.
    assert_eq!(service.batch_count(), 1);
    assert_eq!(service.keys_requested(), 3);

    let report = conversion.resolution.unwrap();
    assert_eq!(report.requested, 3);
    assert_eq!(report.resolved, 2);
    assert!(conversion.warnings.is_empty());
}

#[tokio::test]
async fn test_small_batches_are_all_issued() {
    let service = Arc::new(names_service());
    let config = ConvertConfig::default()
        .with_resolver(ResolverConfig::default().with_batch_size(1).with_concurrency(2));
    let conversion = Converter::with_config(config)
        .with_shared_taxonomy_service(service.clone())
        .convert(fixture())
        .await
        .unwrap();

    assert_eq!(service.batch_count(), 3);
    assert_eq!(conversion.resolution.unwrap().resolved, 2);
}

#[tokio::test(start_paused = true)]
async fn test_composition_order_independent_of_batch_completion() {
    use std::time::Duration;

    // Batches finish in reverse order of issue.
    let service = names_service()
        .with_name("1423", "Bacillus subtilis")
        .with_key_delay("9606", Duration::from_millis(30))
        .with_key_delay("5507", Duration::from_millis(20))
        .with_key_delay("1423", Duration::from_millis(10));
    let config = ConvertConfig::default()
        .with_resolver(ResolverConfig::default().with_batch_size(1).with_concurrency(3));

    let conversion = Converter::with_config(config)
        .with_taxonomy_service(service)
        .convert(fixture())
        .await
        .unwrap();

    let rows: Vec<(&str, &str, Option<&str>)> = conversion
        .tables
        .community_composition
        .iter()
        .map(|r| (r.sample.as_str(), r.key.as_str(), r.taxon.as_deref()))
        .collect();
    assert_eq!(
        rows,
        vec![
            ("S1", "9606", Some("Homo sapiens")),
            ("S1", "5507", Some("Fusarium oxysporum")),
            ("S1", "1423", Some("Bacillus subtilis")),
            ("S2", "5507", Some("Fusarium oxysporum")),
        ]
    );
}

#[tokio::test]
async fn test_failing_service_degrades_to_unresolved() {
    let conversion = Converter::new()
        .with_taxonomy_service(FailingTaxonomyService::new())
        .convert(fixture())
        .await
        .expect("Degraded resolution must not fail the conversion");

    assert!(conversion.tables.community_composition.iter().all(|r| r.taxon.is_none()));
    assert_eq!(conversion.warnings.len(), 1);
    assert!(conversion.warnings[0].contains("3 of 3 taxa left unresolved"));
}

#[tokio::test]
async fn test_failed_resolution_matches_disabled_resolution() {
    let failed = Converter::new()
        .with_taxonomy_service(FailingTaxonomyService::new())
        .convert(fixture())
        .await
        .unwrap();
    let disabled = offline().convert(fixture()).await.unwrap();

    assert_eq!(
        failed.tables.to_json_pretty().unwrap(),
        disabled.tables.to_json_pretty().unwrap()
    );
}

#[tokio::test]
async fn test_strict_mode_surfaces_resolution_error() {
    let config = ConvertConfig::default().with_strict_resolution(true);
    let err = Converter::with_config(config)
        .with_taxonomy_service(FailingTaxonomyService::new())
        .convert(fixture())
        .await
        .unwrap_err();

    assert!(matches!(err, BioindexError::Resolution(_)));
}

#[tokio::test]
async fn test_invalid_endpoint_warns_unless_strict() {
    let lenient = Converter::with_config(ConvertConfig::default().with_taxonomy_url("not a url"))
        .convert(fixture())
        .await
        .unwrap();
    assert!(lenient.resolution.is_none());
    assert_eq!(lenient.warnings.len(), 1);
    assert!(lenient.tables.community_composition.iter().all(|r| r.taxon.is_none()));

    let strict = Converter::with_config(
        ConvertConfig::default()
            .with_taxonomy_url("not a url")
            .with_strict_resolution(true),
    )
    .convert(fixture())
    .await;
    assert!(matches!(strict, Err(BioindexError::Resolution(_))));
}

#[tokio::test(start_paused = true)]
async fn test_resolver_timeout_degrades() {
    let slow = names_service().with_delay(std::time::Duration::from_secs(120));
    let config = ConvertConfig::default()
        .with_strict_resolution(true)
        .with_timeout(Some(std::time::Duration::from_secs(5)));

    let conversion = Converter::with_config(config)
        .with_taxonomy_service(slow)
        .convert(fixture())
        .await
        .expect("A timeout degrades even in strict mode");

    assert!(conversion.resolution.unwrap().timed_out);
    assert!(conversion.tables.community_composition.iter().all(|r| r.taxon.is_none()));
}

// =============================================================================
// Structural Error Tests
// =============================================================================

#[tokio::test]
async fn test_invalid_record_is_rejected_before_resolution() {
    let mut bioindex = fixture();
    bioindex.results[1].sample = "S1".to_string();
    let service = Arc::new(names_service());

    let err = Converter::new()
        .with_shared_taxonomy_service(service.clone())
        .convert(bioindex)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        BioindexError::InvalidRecord(InvalidRecordError::DuplicateSample { .. })
    ));
    assert_eq!(service.batch_count(), 0);
}

#[tokio::test]
async fn test_missing_dimension_is_rejected() {
    let content = fs::read_to_string(fixture_path()).unwrap();
    let mut value: Value = serde_json::from_str(&content).unwrap();
    value["results"][0]["byDimension"]
        .as_object_mut()
        .unwrap()
        .remove("biologicalAgents");
    let bioindex: Bioindex = serde_json::from_value(value).unwrap();

    let err = offline().convert(bioindex).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Invalid record: sample 'S1' is missing dimension 'biologicalAgents'"
    );
}

#[test]
fn test_malformed_input_reports_json_error() {
    assert!(matches!(
        Bioindex::from_json("{\"id\": 1}"),
        Err(BioindexError::Json(_))
    ));
    assert!(matches!(
        Bioindex::from_path("does/not/exist.json"),
        Err(BioindexError::Io { .. })
    ));
}

// =============================================================================
// Export Tests
// =============================================================================

#[tokio::test]
async fn test_json_sink_round_trips_document() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("out/tables.json");
    let conversion = offline().convert(fixture()).await.unwrap();

    conversion.export(&mut JsonSink::new(&path)).unwrap();

    let written: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(written, conversion.tables.to_document().unwrap());
    assert_eq!(TableSet::from_document(written).unwrap(), conversion.tables);
}

#[tokio::test]
async fn test_json_sink_translates_columns() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tables.json");
    let conversion = offline().convert(fixture()).await.unwrap();

    conversion
        .export(&mut JsonSink::new(&path).with_locale(Locale::PtBr))
        .unwrap();

    let written: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(written["by_sample"][0], json!({ "amostra": "S1", "ggh": 0.8 }));
    assert_eq!(written["info"]["versao"], json!(4));
    // The in-memory tables keep their original column names.
    assert_eq!(conversion.tables.to_document().unwrap()["by_sample"][0]["sample"], json!("S1"));
}

#[tokio::test]
async fn test_delimited_sink_writes_one_file_per_table() {
    let dir = TempDir::new().unwrap();
    let conversion = offline().convert(fixture()).await.unwrap();
    let mut sink = DelimitedSink::new(dir.path().join("tables"), Delimiter::Tab);

    conversion.export(&mut sink).unwrap();

    for table in TableSet::TABLE_NAMES {
        assert!(sink.table_path(table).exists(), "missing {}", table);
    }

    let by_process = fs::read_to_string(sink.table_path("by_process")).unwrap();
    let lines: Vec<_> = by_process.lines().collect();
    assert_eq!(lines[0], "sample\tdimension\tprocess\tggh\tgroup");
    assert_eq!(lines[1], "S1\tbiodiversity\tP1\t0.5\t");
    assert_eq!(lines[4], "S1\tbiologicalFertility\tNitrogen fixation\t0.66\tnitrogen");
    assert_eq!(lines.len(), 1 + 8);

    let composition = fs::read_to_string(sink.table_path("community_composition")).unwrap();
    assert_eq!(
        composition.lines().nth(1),
        Some("S1\t9606\ttaxid\t3\tfalse\t")
    );
}

#[tokio::test]
async fn test_csv_sink_with_locale() {
    let dir = TempDir::new().unwrap();
    let conversion = offline().convert(fixture()).await.unwrap();
    let mut sink = DelimitedSink::new(dir.path(), Delimiter::Comma).with_locale(Locale::PtBr);

    conversion.export(&mut sink).unwrap();

    let info = fs::read_to_string(dir.path().join("info.csv")).unwrap();
    assert_eq!(info.lines().next(), Some("id,hash,versao,atualizadoEm"));
}

struct BrokenSink {
    attempts: usize,
}

impl ExportSink for BrokenSink {
    fn write(&mut self, _tables: &TableSet) -> Result<(), SinkError> {
        self.attempts += 1;
        Err(SinkError::Io {
            path: PathBuf::from("/dev/full"),
            source: std::io::Error::other("disk full"),
        })
    }
}

#[tokio::test]
async fn test_sink_failure_keeps_tables_for_retry() {
    let conversion = offline().convert(fixture()).await.unwrap();
    let mut broken = BrokenSink { attempts: 0 };

    let err = conversion.export(&mut broken).unwrap_err();
    assert!(matches!(err, BioindexError::Sink(_)));
    assert!(err.to_string().starts_with("Export failed"));

    let mut memory = MemorySink::new();
    conversion.export(&mut memory).unwrap();
    assert_eq!(memory.tables(), Some(&conversion.tables));
    assert_eq!(broken.attempts, 1);
}
