//! Ministry → category mapping, normalization and aggregation.

pub mod aggregate;
pub mod classifier;
pub mod normalize;
pub mod store;

pub use aggregate::{aggregate_tables, concat_tables, read_tables};
pub use classifier::{suggest_categories, CategoryClassifier};
pub use normalize::{collect_ministry_names, normalize_files, NormalizeSummary, Normalizer};
pub use store::{render_unknown_report, MappingEntry, MappingStore, MergeReport};
