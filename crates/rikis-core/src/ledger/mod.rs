//! Ledger text processing: amounts, segmentation and ministry resolution.

pub mod matcher;
pub mod pipeline;
pub mod rules;
pub mod segmenter;

pub use matcher::{similarity_ratio, MatchOutcome, MinistryAmount, MinistryMatcher};
pub use pipeline::LedgerPipeline;
pub use segmenter::{segment_lines, LineKind, SegmentState, Segmenter};
