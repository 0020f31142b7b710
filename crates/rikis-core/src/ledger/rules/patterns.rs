//! Common regex patterns for state-accounts extraction.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Any run that starts with a digit and continues through digits and
    // separators. Validated afterwards against AMOUNT_TOKEN.
    pub static ref AMOUNT_CANDIDATE: Regex = Regex::new(
        r"\d[\d.,]*"
    ).unwrap();

    // Icelandic formatted number: 1.234.567 or 123.456,78
    pub static ref AMOUNT_TOKEN: Regex = Regex::new(
        r"^\d{1,3}(?:\.\d{3})*(?:,\d+)?$"
    ).unwrap();

    // Page marker written by the OCR strategy
    pub static ref PAGE_MARKER: Regex = Regex::new(
        r"^=+\s*PAGE\s+(\d+)\s*=+$"
    ).unwrap();

    // Report year embedded in a file name
    pub static ref YEAR_IN_NAME: Regex = Regex::new(
        r"(?:^|\D)((?:19|20)\d{2})(?:\D|$)"
    ).unwrap();

    // Institution words accepted for names seen in data
    pub static ref INSTITUTION_KEYWORD: Regex = Regex::new(
        r"(?i)(ráðuneyti|stofnun|skóli|ráð|stofn|fyrirtæki|deild|svið|embætti|miðstöð|samtök)"
    ).unwrap();

    // Institution words accepted for rows in extracted tables
    pub static ref TABLE_INSTITUTION_KEYWORD: Regex = Regex::new(
        r"(?i)(ráðuneyti|stofnun|skóli|ráð|stofn|háskóli|deild|dómstóll|samtök)"
    ).unwrap();

    // Cell separator in text-layer tables: a tab or two or more spaces
    pub static ref CELL_SEPARATOR: Regex = Regex::new(
        r"\t+|\s{2,}"
    ).unwrap();
}

/// Narrative terms that disqualify a table cell as a ministry name (substring match).
pub const NARRATIVE_TERMS: &[&str] = &[
    "rekstrarreikningur",
    "heildargjöld",
    "tekjur",
    "gjöld",
    "millj.",
    "kr.",
    "samtals",
    "ráðstöfun",
    "yfirlit",
];

/// Short narrative words that disqualify a cell only as whole words.
pub const NARRATIVE_WORDS: &[&str] = &[
    "yfir", "skiptust", "námu", "af", "hafa", "með", "á", "eða", "eru",
];
