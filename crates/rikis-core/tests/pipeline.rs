//! End-to-end runs over stub documents: extraction, segmentation, mapping
//! and aggregation.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use image::DynamicImage;
use rikis_core::error::OcrError;
use rikis_core::extraction::{DocumentSource, ExtractionStrategy, OcrStrategy, TableStrategy};
use rikis_core::mapping::{aggregate_tables, normalize_files, read_tables};
use rikis_core::models::config::{ExtractionConfig, MappingConfig, OcrConfig, PdfConfig};
use rikis_core::{
    Coordinator, LedgerPipeline, LedgerTable, MappingStore, MinistryMatcher, NormalizedCategory,
    OcrBackend, PageRenderer, RikisConfig, Segmenter,
};

const PAGE_ONE: &str = "Fjármálaráðuneyti\nLaun\nAðalskrifstofa 12.400\nRekstur 3.100";
const PAGE_TWO: &str = "Heilbrigðisráðuneyti\nSjúkrahús\nLandspítali 45.000";

struct ScannedSource {
    pages: u32,
}

impl DocumentSource for ScannedSource {
    fn page_count(&self, _path: &Path) -> rikis_core::Result<u32> {
        Ok(self.pages)
    }

    fn tables(&self, _path: &Path) -> rikis_core::Result<Vec<LedgerTable>> {
        Ok(Vec::new())
    }
}

/// Encodes the page number in the image width so the backend knows which
/// page it is reading.
struct WidthRenderer;

impl PageRenderer for WidthRenderer {
    fn render(&self, _pdf: &Path, page: u32, _dpi: u32) -> Result<DynamicImage, OcrError> {
        Ok(DynamicImage::new_luma8(page, 1))
    }
}

struct CountingBackend {
    calls: Arc<AtomicUsize>,
}

impl OcrBackend for CountingBackend {
    fn name(&self) -> &'static str {
        "counting"
    }

    fn recognize(&self, image: &DynamicImage, _language: &str) -> Result<String, OcrError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(match image.width() {
            1 => PAGE_ONE.to_string(),
            _ => PAGE_TWO.to_string(),
        })
    }
}

fn coordinator(calls: &Arc<AtomicUsize>, preview: bool) -> Coordinator {
    Coordinator::new(
        Box::new(ScannedSource { pages: 2 }),
        vec![
            Box::new(TableStrategy::new(PdfConfig::default())) as Box<dyn ExtractionStrategy>,
            Box::new(OcrStrategy::new(
                Box::new(WidthRenderer),
                Box::new(CountingBackend {
                    calls: Arc::clone(calls),
                }),
                OcrConfig::default(),
            )),
        ],
        ExtractionConfig {
            preview,
            ..ExtractionConfig::default()
        },
    )
}

fn input_dir(names: &[&str]) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    for name in names {
        std::fs::write(dir.path().join(name), b"%PDF-1.4").unwrap();
    }
    dir
}

fn write_mapping(dir: &Path) -> PathBuf {
    let path = dir.join("mappings.csv");
    std::fs::write(
        &path,
        "LineCode,Ministry,Category\n\
         09,Fjármálaráðuneyti,Finance & Economy\n\
         08,Heilbrigðisráðuneyti,Health\n",
    )
    .unwrap();
    path
}

#[test]
fn test_rerun_does_no_ocr_work() {
    let input = input_dir(&["Rikisreikningur2009.pdf"]);
    let output = tempfile::tempdir().unwrap();
    let calls = Arc::new(AtomicUsize::new(0));

    let first = coordinator(&calls, false).run(input.path(), output.path()).unwrap();
    assert_eq!(first.ocr, 1);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    let text_path = output.path().join("Rikisreikningur2009.txt");
    let text = std::fs::read_to_string(&text_path).unwrap();

    calls.store(0, Ordering::SeqCst);
    let second = coordinator(&calls, false).run(input.path(), output.path()).unwrap();

    assert_eq!(second.skipped, 1);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(std::fs::read_to_string(&text_path).unwrap(), text);
}

#[test]
fn test_preview_then_full_run_covers_each_page_once() {
    let input = input_dir(&["Rikisreikningur2010.pdf"]);
    let output = tempfile::tempdir().unwrap();
    let calls = Arc::new(AtomicUsize::new(0));

    coordinator(&calls, true).run(input.path(), output.path()).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    coordinator(&calls, false).run(input.path(), output.path()).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    let text = std::fs::read_to_string(output.path().join("Rikisreikningur2010.txt")).unwrap();
    assert_eq!(text.matches("=== PAGE 1 ===").count(), 1);
    assert_eq!(text.matches("=== PAGE 2 ===").count(), 1);
}

#[test]
fn test_ocr_text_to_aggregated_table() {
    let input = input_dir(&["Rikisreikningur2009.pdf"]);
    let work = tempfile::tempdir().unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    coordinator(&calls, false).run(input.path(), work.path()).unwrap();

    // Segment and resolve the OCR text
    let text = std::fs::read_to_string(work.path().join("Rikisreikningur2009.txt")).unwrap();
    let items = Segmenter::default().segment_document(&text, "Rikisreikningur2009.txt");
    assert_eq!(items.len(), 3);
    assert!(items.iter().all(|i| i.year == Some(2009)));
    assert_eq!(items[0].ministry.as_deref(), Some("Fjármálaráðuneyti"));
    assert_eq!(items[0].subcategory.as_deref(), Some("Laun"));
    assert_eq!(items[2].ministry.as_deref(), Some("Heilbrigðisráðuneyti"));

    let parsed = work.path().join("Rikisreikningur2009_parsed.csv");
    LedgerTable::from_line_items(&items).write_csv(&parsed).unwrap();

    // Normalize against the mapping and aggregate
    let mapping_path = write_mapping(work.path());
    let mut store = MappingStore::load(&mapping_path).unwrap();
    let clean_dir = work.path().join("clean");
    let summary = normalize_files(
        &[parsed],
        &clean_dir,
        &mut store,
        None,
        &MappingConfig::default(),
    )
    .unwrap();
    assert!(summary.unmapped.is_empty());
    assert_eq!(summary.rows(), 3);

    let tables = read_tables(&[clean_dir.join("Rikisreikningur2009_parsed_clean.csv")]);
    let master = aggregate_tables(tables);
    assert_eq!(master.len(), 3);
    let category = master
        .headers
        .iter()
        .position(|h| h == "normalized_category")
        .unwrap();
    assert_eq!(master.cell(2, category), "Health");
}

#[test]
fn test_pipeline_canonicalizes_against_mapping() {
    let dir = tempfile::tempdir().unwrap();
    let store = MappingStore::load(&write_mapping(dir.path())).unwrap();
    let pipeline = LedgerPipeline::new(&RikisConfig::default(), &store);

    let records = pipeline.process_text("Heilbrigdisraduneyti\nLandspítali 45.000\n", "2011.txt");

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].item.ministry.as_deref(), Some("Heilbrigðisráðuneyti"));
    assert!(matches!(records[0].normalized_category, NormalizedCategory::Mapped(_)));
}

#[test]
fn test_unmapped_names_appended_once() {
    let dir = tempfile::tempdir().unwrap();
    let mapping_path = write_mapping(dir.path());

    let csv_a = dir.path().join("2009_parsed.csv");
    let csv_b = dir.path().join("2010_parsed.csv");
    for path in [&csv_a, &csv_b] {
        std::fs::write(
            path,
            "Ministry,LineItem,Amount_thousands_ISK\n\
             Utanríkisráðuneyti,Sendiráð 200,200\n\
             Fjármálaráðuneyti,Laun 100,100\n",
        )
        .unwrap();
    }

    let config = MappingConfig::default();
    let clean = dir.path().join("clean");
    for _ in 0..2 {
        let mut store = MappingStore::load(&mapping_path).unwrap();
        let summary = normalize_files(
            &[csv_a.clone(), csv_b.clone()],
            &clean,
            &mut store,
            None,
            &config,
        )
        .unwrap();
        let files: Vec<_> = summary.unmapped["Utanríkisráðuneyti"].iter().cloned().collect();
        assert_eq!(files, vec!["2009_parsed.csv", "2010_parsed.csv"]);
    }

    let store = MappingStore::load(&mapping_path).unwrap();
    assert_eq!(store.len(), 3);
    assert_eq!(store.resolve("Utanríkisráðuneyti"), NormalizedCategory::Unmapped);
    let listed = std::fs::read_to_string(dir.path().join("unmapped_categories.csv")).unwrap();
    assert_eq!(listed, "Unmapped_Ministry\nUtanríkisráðuneyti\n");
}

#[test]
fn test_matcher_over_extracted_text() {
    let dir = tempfile::tempdir().unwrap();
    let store = MappingStore::load(&write_mapping(dir.path())).unwrap();
    let config = RikisConfig::default();
    let matcher = MinistryMatcher::new(store.names(), &config.matching);

    let found = matcher.scan_lines("Fjarmalaraduneyti\nSamtals\n15.500\n");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].ministry, "Fjármálaráðuneyti");
    assert_eq!(found[0].amount, rust_decimal::Decimal::from(15_500));
}
