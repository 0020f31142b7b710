//! Line segmentation of OCR text into ledger line items.
//!
//! OCR output loses the table layout of the state accounts, so structure is
//! recovered from line patterns alone: a line naming a ministry opens a
//! block, a short line without figures names a subcategory, and a line with
//! figures is a line item. Context is carried in [`SegmentState`], which is
//! threaded through the lines as a fold.

use tracing::{debug, trace};

use super::rules::{normalize_text, scan_amounts, year_from_name, PAGE_MARKER};
use crate::models::config::SegmentationConfig;
use crate::models::LineItem;

/// Heading context in effect while reading a document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SegmentState {
    pub ministry: Option<String>,
    pub subcategory: Option<String>,
}

/// How a single line was classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    PageMarker,
    Ministry,
    Subcategory,
    Amount,
    Malformed,
    Other,
}

/// Line classifier and state machine.
#[derive(Debug, Clone)]
pub struct Segmenter {
    keywords: Vec<String>,
    subcategory_max_tokens: usize,
}

impl Segmenter {
    pub fn new(config: &SegmentationConfig) -> Self {
        Self {
            keywords: config
                .ministry_keywords
                .iter()
                .map(|k| normalize_text(k))
                .filter(|k| !k.is_empty())
                .collect(),
            subcategory_max_tokens: config.subcategory_max_tokens,
        }
    }

    // Compared folded so OCR output without diacritics still matches
    fn is_ministry_line(&self, line: &str) -> bool {
        let folded = normalize_text(line);
        self.keywords.iter().any(|k| folded.contains(k.as_str()))
    }

    /// Classify a trimmed line against the current state.
    pub fn classify(&self, state: &SegmentState, line: &str) -> LineKind {
        if PAGE_MARKER.is_match(line) {
            return LineKind::PageMarker;
        }
        if self.is_ministry_line(line) {
            return LineKind::Ministry;
        }

        let scan = scan_amounts(line);
        if scan.has_amount() {
            return if scan.rightmost().is_some() {
                LineKind::Amount
            } else {
                LineKind::Malformed
            };
        }
        if scan.malformed_tail {
            return LineKind::Malformed;
        }
        if state.ministry.is_some() && line.split_whitespace().count() < self.subcategory_max_tokens {
            return LineKind::Subcategory;
        }
        LineKind::Other
    }

    /// Advance the state by one line, possibly emitting a line item.
    pub fn step(
        &self,
        state: SegmentState,
        line: &str,
        source: &str,
        year: Option<i32>,
    ) -> (SegmentState, Option<LineItem>) {
        let line = line.trim();
        if line.is_empty() {
            return (state, None);
        }

        match self.classify(&state, line) {
            LineKind::Ministry => {
                trace!("ministry heading: {}", line);
                (
                    SegmentState {
                        ministry: Some(line.to_string()),
                        subcategory: None,
                    },
                    None,
                )
            }
            LineKind::Subcategory => {
                trace!("subcategory heading: {}", line);
                (
                    SegmentState {
                        subcategory: Some(line.to_string()),
                        ..state
                    },
                    None,
                )
            }
            LineKind::Amount => {
                let Some(amount) = scan_amounts(line).rightmost() else {
                    return (state, None);
                };
                let item = LineItem {
                    ministry: state.ministry.clone(),
                    subcategory: state.subcategory.clone(),
                    line_text: line.to_string(),
                    amount,
                    year,
                    source_document: source.to_string(),
                };
                (state, Some(item))
            }
            LineKind::Malformed => {
                trace!("skipping line with malformed amount: {}", line);
                (state, None)
            }
            LineKind::PageMarker | LineKind::Other => (state, None),
        }
    }

    /// Segment ordered lines from one document.
    pub fn segment_lines<'a, I>(&self, lines: I, source: &str, year: Option<i32>) -> Vec<LineItem>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let (_, items) = lines.into_iter().fold(
            (SegmentState::default(), Vec::new()),
            |(state, mut items), line| {
                let (next, item) = self.step(state, line, source, year);
                items.extend(item);
                (next, items)
            },
        );
        items
    }

    /// Segment a whole OCR text file. The year is taken from `source`.
    pub fn segment_document(&self, text: &str, source: &str) -> Vec<LineItem> {
        let year = year_from_name(source);
        let items = self.segment_lines(text.lines(), source, year);
        debug!("{}: {} line items (year {:?})", source, items.len(), year);
        items
    }
}

impl Default for Segmenter {
    fn default() -> Self {
        Self::new(&SegmentationConfig::default())
    }
}

/// Segment lines with the default configuration.
pub fn segment_lines<'a, I>(lines: I, source: &str, year: Option<i32>) -> Vec<LineItem>
where
    I: IntoIterator<Item = &'a str>,
{
    Segmenter::default().segment_lines(lines, source, year)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;

    #[test]
    fn test_ministry_subcategory_amount() {
        let items = segment_lines(
            ["Fjármálaráðuneyti", "Laun", "1.500.000"],
            "Rikisreikn2009.txt",
            Some(2009),
        );

        assert_eq!(
            items,
            vec![LineItem {
                ministry: Some("Fjármálaráðuneyti".to_string()),
                subcategory: Some("Laun".to_string()),
                line_text: "1.500.000".to_string(),
                amount: Decimal::from(1_500_000),
                year: Some(2009),
                source_document: "Rikisreikn2009.txt".to_string(),
            }]
        );
    }

    #[test]
    fn test_ministry_clears_subcategory() {
        let items = segment_lines(
            [
                "Fjármálaráðuneyti",
                "Laun",
                "Rekstur 120",
                "Utanríkisráðuneyti",
                "Sendiráð 4.500",
            ],
            "doc.txt",
            None,
        );

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].subcategory.as_deref(), Some("Laun"));
        assert_eq!(items[1].ministry.as_deref(), Some("Utanríkisráðuneyti"));
        assert_eq!(items[1].subcategory, None);
        assert_eq!(items[1].amount, Decimal::from(4500));
    }

    #[test]
    fn test_amount_before_any_heading() {
        let items = segment_lines(["Yfirlit 1.200"], "doc.txt", None);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].ministry, None);
        assert_eq!(items[0].subcategory, None);
    }

    #[test]
    fn test_short_line_without_ministry_is_ignored() {
        let segmenter = Segmenter::default();
        let state = SegmentState::default();
        assert_eq!(segmenter.classify(&state, "Laun"), LineKind::Other);
    }

    #[test]
    fn test_long_line_is_not_subcategory() {
        let segmenter = Segmenter::default();
        let state = SegmentState {
            ministry: Some("Fjármálaráðuneyti".to_string()),
            subcategory: None,
        };
        assert_eq!(
            segmenter.classify(&state, "Laun og önnur gjöld vegna starfsmanna ríkisins"),
            LineKind::Other
        );
    }

    #[test]
    fn test_malformed_line_is_skipped() {
        let items = segment_lines(
            ["Fjármálaráðuneyti", "Laun", "Rekstur 12,,34", "Tekjur 900"],
            "doc.txt",
            None,
        );
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].amount, Decimal::from(900));
        assert_eq!(items[0].subcategory.as_deref(), Some("Laun"));
    }

    #[test]
    fn test_heading_with_year_or_code_is_subcategory() {
        let items = segment_lines(
            ["Fjármálaráðuneyti", "Fjárlög 2009", "Laun 1.500", "Liður 3.1", "Rekstur 800"],
            "doc.txt",
            None,
        );

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].subcategory.as_deref(), Some("Fjárlög 2009"));
        assert_eq!(items[0].amount, Decimal::from(1500));
        assert_eq!(items[1].subcategory.as_deref(), Some("Liður 3.1"));
        assert_eq!(items[1].amount, Decimal::from(800));
    }

    #[test]
    fn test_page_markers_are_skipped() {
        let text = "=== PAGE 1 ===\nFjármálaráðuneyti\n\n=== PAGE 2 ===\nLaun\n1.500\n";
        let items = Segmenter::default().segment_document(text, "Rikisreikn1999.txt");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].subcategory.as_deref(), Some("Laun"));
        assert_eq!(items[0].year, Some(1999));
    }

    #[test]
    fn test_keyword_is_case_insensitive() {
        let segmenter = Segmenter::default();
        let state = SegmentState::default();
        assert_eq!(
            segmenter.classify(&state, "MENNTAMÁLARÁÐUNEYTI"),
            LineKind::Ministry
        );
        assert_eq!(segmenter.classify(&state, "Fjarmala raduneyti"), LineKind::Ministry);
    }
}
