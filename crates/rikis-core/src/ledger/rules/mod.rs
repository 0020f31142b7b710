//! Rule-based extractors for state-accounts text.

pub mod amounts;
pub mod names;
pub mod patterns;

pub use amounts::{
    format_locale_amount, parse_cell_amount, parse_locale_amount, scan_amounts, AmountExtractor,
    AmountScan,
};
pub use names::{is_ministry, is_probable_ministry, name_key, normalize_text};
pub use patterns::*;

/// Trait for field extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the field from text.
    fn extract(&self, text: &str) -> Option<Self::Output>;

    /// Extract all occurrences of the field.
    fn extract_all(&self, text: &str) -> Vec<Self::Output>;
}

/// Extraction context with confidence scores.
#[derive(Debug, Clone)]
pub struct ExtractionMatch<T> {
    /// Extracted value.
    pub value: T,
    /// Confidence score (0.0 - 1.0).
    pub confidence: f32,
    /// Position in source text.
    pub position: Option<(usize, usize)>,
    /// Source text that was matched.
    pub source: String,
}

impl<T> ExtractionMatch<T> {
    pub fn new(value: T, confidence: f32, source: impl Into<String>) -> Self {
        Self {
            value,
            confidence,
            position: None,
            source: source.into(),
        }
    }

    pub fn with_position(mut self, start: usize, end: usize) -> Self {
        self.position = Some((start, end));
        self
    }
}

/// Extract the report year from a document name (e.g. `Rikisreikn2009.txt`).
pub fn year_from_name(name: &str) -> Option<i32> {
    YEAR_IN_NAME
        .captures(name)
        .and_then(|caps| caps[1].parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_year_from_name() {
        assert_eq!(year_from_name("Rikisreikn2009Heildaryfirlit.txt"), Some(2009));
        assert_eq!(year_from_name("rikisreikningur_1998.pdf"), Some(1998));
        assert_eq!(year_from_name("yfirlit.txt"), None);
    }
}
