//! OCR text → normalized records.

use tracing::debug;

use super::matcher::MinistryMatcher;
use super::segmenter::Segmenter;
use crate::mapping::MappingStore;
use crate::models::{NormalizedCategory, NormalizedRecord, RikisConfig};

/// Segments a document, canonicalizes ministry headings and resolves their
/// categories against a mapping table.
pub struct LedgerPipeline<'a> {
    segmenter: Segmenter,
    matcher: Option<MinistryMatcher>,
    store: &'a MappingStore,
}

impl<'a> LedgerPipeline<'a> {
    pub fn new(config: &RikisConfig, store: &'a MappingStore) -> Self {
        let matcher = config
            .matching
            .canonicalize_before_mapping
            .then(|| MinistryMatcher::new(store.names(), &config.matching));

        Self {
            segmenter: Segmenter::new(&config.segmentation),
            matcher,
            store,
        }
    }

    /// Process the OCR text of one document.
    pub fn process_text(&self, text: &str, source: &str) -> Vec<NormalizedRecord> {
        let records: Vec<NormalizedRecord> = self
            .segmenter
            .segment_document(text, source)
            .into_iter()
            .map(|mut item| {
                let category = match item.ministry.as_deref() {
                    Some(raw) => {
                        let name = match &self.matcher {
                            Some(matcher) => matcher.canonicalize(raw),
                            None => raw.trim().to_string(),
                        };
                        let category = self.store.resolve(&name);
                        item.ministry = Some(name);
                        category
                    }
                    None => NormalizedCategory::Unmapped,
                };
                NormalizedRecord::new(item, category)
            })
            .collect();

        debug!(
            "{}: {} records, {} resolved",
            source,
            records.len(),
            records.iter().filter(|r| r.normalized_category.is_resolved()).count()
        );
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, LineItem};
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;

    fn store(dir: &std::path::Path) -> MappingStore {
        let path = dir.join("mappings.csv");
        std::fs::write(
            &path,
            "LineCode,Ministry,Category\n09,Fjármálaráðuneyti,Finance & Economy\n",
        )
        .unwrap();
        MappingStore::load(&path).unwrap()
    }

    #[test]
    fn test_end_to_end_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        let pipeline = LedgerPipeline::new(&RikisConfig::default(), &store);

        let records = pipeline.process_text("Fjármálaráðuneyti\nLaun\n1.500.000\n", "doc.txt");

        assert_eq!(
            records,
            vec![NormalizedRecord::new(
                LineItem {
                    ministry: Some("Fjármálaráðuneyti".to_string()),
                    subcategory: Some("Laun".to_string()),
                    line_text: "1.500.000".to_string(),
                    amount: Decimal::from(1_500_000),
                    year: None,
                    source_document: "doc.txt".to_string(),
                },
                NormalizedCategory::Mapped(Category::FinanceEconomy),
            )]
        );
    }

    #[test]
    fn test_noisy_heading_is_canonicalized() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        let pipeline = LedgerPipeline::new(&RikisConfig::default(), &store);

        let records = pipeline.process_text("Fjarmala raduneyti\nRekstur 200\n", "doc.txt");
        assert_eq!(records[0].item.ministry.as_deref(), Some("Fjármálaráðuneyti"));
        assert!(records[0].normalized_category.is_resolved());
    }

    #[test]
    fn test_without_canonicalization() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        let mut config = RikisConfig::default();
        config.matching.canonicalize_before_mapping = false;
        let pipeline = LedgerPipeline::new(&config, &store);

        let records = pipeline.process_text("Fjarmala raduneyti\nRekstur 200\n", "doc.txt");
        assert_eq!(records[0].normalized_category, NormalizedCategory::Unmapped);
    }
}
