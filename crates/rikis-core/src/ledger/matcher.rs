//! Fuzzy resolution of noisy ministry names.
//!
//! OCR renders the same ministry with dropped diacritics, split words and
//! stray characters. Lines are folded with [`normalize_text`] and compared
//! against a canonical list with an indel similarity ratio on a 0-100 scale.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::rules::{format_locale_amount, normalize_text, scan_amounts, PAGE_MARKER};
use crate::models::config::MatchingConfig;

/// Indel similarity of two strings on a 0-100 scale.
///
/// `200 * LCS / (|a| + |b|)`, counted in characters.
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 100.0;
    }

    // Single-row LCS table
    let mut row = vec![0usize; b.len() + 1];
    for ca in &a {
        let mut diagonal = 0;
        for (j, cb) in b.iter().enumerate() {
            let above = row[j + 1];
            row[j + 1] = if ca == cb {
                diagonal + 1
            } else {
                above.max(row[j])
            };
            diagonal = above;
        }
    }

    200.0 * row[b.len()] as f64 / total as f64
}

/// Outcome of resolving one string.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    /// Best candidate reached the threshold.
    Matched { name: String, score: f64 },
    /// Nothing reached the threshold.
    NoMatch { best_score: f64 },
}

/// A ministry figure found by scanning text or table rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinistryAmount {
    #[serde(rename = "Ministry")]
    pub ministry: String,

    #[serde(rename = "Raw Category")]
    pub section: String,

    #[serde(rename = "Amount")]
    pub amount: Decimal,

    #[serde(skip)]
    pub score: f64,
}

#[derive(Debug, Clone)]
struct Candidate {
    name: String,
    folded: String,
}

/// Resolver over a canonical ministry list.
#[derive(Debug, Clone)]
pub struct MinistryMatcher {
    candidates: Vec<Candidate>,
    threshold: f64,
    lookahead_lines: usize,
    section_label: String,
}

impl MinistryMatcher {
    /// Build a matcher. Candidates are ordered longest first, which is also
    /// the tie-break order.
    pub fn new<I, S>(names: I, config: &MatchingConfig) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut candidates: Vec<Candidate> = Vec::new();
        for name in names {
            let name = name.into();
            let folded = normalize_text(&name);
            if folded.is_empty() || candidates.iter().any(|c| c.folded == folded) {
                continue;
            }
            candidates.push(Candidate { name, folded });
        }
        candidates.sort_by(|a, b| b.folded.chars().count().cmp(&a.folded.chars().count()));

        debug!("ministry matcher: {} canonical names", candidates.len());
        Self {
            candidates,
            threshold: config.threshold,
            lookahead_lines: config.lookahead_lines,
            section_label: config.section_label.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Best candidate and its score. Ties keep the earlier candidate.
    pub fn best_match(&self, text: &str) -> Option<(&str, f64)> {
        let folded = normalize_text(text);
        if folded.is_empty() {
            return None;
        }

        let mut best: Option<(&str, f64)> = None;
        for candidate in &self.candidates {
            let score = similarity_ratio(&folded, &candidate.folded);
            if best.is_none_or(|(_, s)| score > s) {
                best = Some((candidate.name.as_str(), score));
            }
        }
        best
    }

    /// Resolve a string against the threshold.
    pub fn resolve(&self, text: &str) -> MatchOutcome {
        match self.best_match(text) {
            Some((name, score)) if score >= self.threshold => MatchOutcome::Matched {
                name: name.to_string(),
                score,
            },
            Some((_, score)) => MatchOutcome::NoMatch { best_score: score },
            None => MatchOutcome::NoMatch { best_score: 0.0 },
        }
    }

    /// Canonical spelling of `name`, or `name` itself when nothing matches.
    pub fn canonicalize(&self, name: &str) -> String {
        match self.resolve(name) {
            MatchOutcome::Matched { name, .. } => name,
            MatchOutcome::NoMatch { .. } => name.trim().to_string(),
        }
    }

    /// Scan OCR text for ministry lines and pick up the figure that follows.
    ///
    /// The amount is the last number in the matched line and the next
    /// `lookahead_lines` lines. Page markers are dropped before the window
    /// is built, so a page number is never read as a figure.
    pub fn scan_lines(&self, text: &str) -> Vec<MinistryAmount> {
        let lines: Vec<(usize, &str)> = text
            .lines()
            .enumerate()
            .filter(|(_, line)| !PAGE_MARKER.is_match(line.trim()))
            .collect();
        let mut results = Vec::new();

        for (i, &(line_no, line)) in lines.iter().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let MatchOutcome::Matched { name, score } = self.resolve(line) else {
                continue;
            };

            let end = (i + 1 + self.lookahead_lines).min(lines.len());
            let window = lines[i..end]
                .iter()
                .map(|(_, l)| *l)
                .collect::<Vec<_>>()
                .join(" ");
            if let Some(amount) = scan_amounts(&window).amounts.last() {
                trace!(
                    "line {}: {} ({:.1}) -> {}",
                    line_no + 1,
                    name,
                    score,
                    format_locale_amount(amount.value)
                );
                results.push(self.record(name, amount.value, score));
            }
        }

        results
    }

    /// Same procedure over table rows. Figures come from the row itself.
    pub fn scan_table_rows(&self, rows: &[Vec<String>]) -> Vec<MinistryAmount> {
        let mut results = Vec::new();

        for row in rows {
            let text = row
                .iter()
                .map(|c| c.trim())
                .filter(|c| !c.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            if text.is_empty() {
                continue;
            }
            let MatchOutcome::Matched { name, score } = self.resolve(&text) else {
                continue;
            };
            if let Some(amount) = scan_amounts(&text).amounts.last() {
                results.push(self.record(name, amount.value, score));
            }
        }

        results
    }

    fn record(&self, ministry: String, amount: Decimal, score: f64) -> MinistryAmount {
        MinistryAmount {
            ministry,
            section: self.section_label.clone(),
            amount,
            score,
        }
    }
}
