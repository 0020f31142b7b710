//! Amount extraction for Icelandic-formatted ledger lines.
//!
//! Amounts use `.` as the thousands separator and `,` as the decimal
//! separator (`1.234.567`, `123.456,78`). Figures in the state accounts are
//! stated in thousands of ISK.

use rust_decimal::Decimal;
use std::str::FromStr;

use super::patterns::{AMOUNT_CANDIDATE, AMOUNT_TOKEN};
use super::{ExtractionMatch, FieldExtractor};

/// Amount field extractor.
pub struct AmountExtractor;

impl AmountExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Scan a line, keeping valid amounts and noting a malformed trailing run.
    pub fn scan(&self, text: &str) -> AmountScan {
        let mut amounts = Vec::new();
        let mut malformed_tail = false;

        for m in AMOUNT_CANDIDATE.find_iter(text) {
            // Sentence punctuation is not part of the number
            let token = m.as_str().trim_end_matches(['.', ',']);
            match parse_locale_amount(token) {
                Some(amount) => {
                    amounts.push(
                        ExtractionMatch::new(amount, 0.8, token)
                            .with_position(m.start(), m.start() + token.len()),
                    );
                    malformed_tail = false;
                }
                // Years and line codes ("2009", "3.1") are not figures at all
                None if looks_like_amount(token) => malformed_tail = true,
                None => {}
            }
        }

        AmountScan {
            amounts,
            malformed_tail,
        }
    }
}

impl Default for AmountExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for AmountExtractor {
    type Output = ExtractionMatch<Decimal>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next_back()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        self.scan(text).amounts
    }
}

/// Amounts found on one line.
#[derive(Debug, Clone, Default)]
pub struct AmountScan {
    /// Valid amounts, left to right.
    pub amounts: Vec<ExtractionMatch<Decimal>>,
    /// The rightmost numeric run failed to parse.
    pub malformed_tail: bool,
}

impl AmountScan {
    /// Whether the line holds at least one valid amount.
    pub fn has_amount(&self) -> bool {
        !self.amounts.is_empty()
    }

    /// Rightmost amount, unless the rightmost numeric run was malformed.
    ///
    /// Trailing columns hold totals while leading numbers are line codes,
    /// so the last figure on a line wins.
    pub fn rightmost(&self) -> Option<Decimal> {
        if self.malformed_tail {
            return None;
        }
        self.amounts.last().map(|m| m.value)
    }
}

/// Whether a run that failed to parse was meant as a grouped amount.
///
/// Doubled separators, several commas, or `.` groupings that go past three
/// digits or repeat count as a broken figure. Plain digit runs and short
/// dotted codes do not.
fn looks_like_amount(token: &str) -> bool {
    if !token.contains(['.', ',']) {
        return false;
    }
    if ["..", ",,", ".,", ",."].iter().any(|sep| token.contains(sep)) {
        return true;
    }
    if token.matches(',').count() > 1 {
        return true;
    }
    let integer_part = token.split(',').next().unwrap_or(token);
    let groups: Vec<&str> = integer_part.split('.').collect();
    groups.len() > 2 || groups.iter().skip(1).any(|g| g.len() > 3)
}

/// Scan a line for Icelandic-formatted amounts.
pub fn scan_amounts(line: &str) -> AmountScan {
    AmountExtractor::new().scan(line)
}

/// Parse an Icelandic-formatted amount (e.g., "1.234.567" or "123.456,78").
///
/// Returns `None` for anything that does not match the grouping rules.
pub fn parse_locale_amount(s: &str) -> Option<Decimal> {
    let s = s.trim();
    if !AMOUNT_TOKEN.is_match(s) {
        return None;
    }

    let normalized = s.replace('.', "").replace(',', ".");
    Decimal::from_str(&normalized).ok()
}

/// Parse a numeric table cell written either plainly ("1500000", "12.5")
/// or in Icelandic format.
pub fn parse_cell_amount(s: &str) -> Option<Decimal> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    parse_locale_amount(s).or_else(|| Decimal::from_str(s).ok())
}

/// Format amount in Icelandic style (1.234.567,89).
pub fn format_locale_amount(amount: Decimal) -> String {
    let s = amount.normalize().to_string();
    let (sign, s) = match s.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", s.as_str()),
    };
    let (integer_part, decimal_part) = match s.split_once('.') {
        Some((i, d)) => (i, Some(d)),
        None => (s, None),
    };

    // Add thousand separators
    let chars: Vec<char> = integer_part.chars().collect();
    let mut formatted = String::new();

    for (i, c) in chars.iter().enumerate() {
        if i > 0 && (chars.len() - i) % 3 == 0 {
            formatted.push('.');
        }
        formatted.push(*c);
    }

    match decimal_part {
        Some(d) => format!("{}{},{}", sign, formatted, d),
        None => format!("{}{}", sign, formatted),
    }
}
