//! Ledger record models: line items, categories and normalized records.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// High-level budget classification a ministry is mapped into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Health")]
    Health,
    #[serde(rename = "Social & Labour")]
    SocialLabour,
    #[serde(rename = "Agriculture & Fisheries")]
    AgricultureFisheries,
    #[serde(rename = "Education & Culture")]
    EducationCulture,
    #[serde(rename = "Infrastructure")]
    Infrastructure,
    #[serde(rename = "Finance & Economy")]
    FinanceEconomy,
    #[serde(rename = "Central Administration")]
    CentralAdministration,
    /// Catch-all for anything that could not be placed.
    #[serde(rename = "Misc/Missing")]
    MiscMissing,
}

impl Category {
    /// Every category, in presentation order.
    pub const ALL: [Category; 8] = [
        Category::Health,
        Category::SocialLabour,
        Category::AgricultureFisheries,
        Category::EducationCulture,
        Category::Infrastructure,
        Category::FinanceEconomy,
        Category::CentralAdministration,
        Category::MiscMissing,
    ];

    /// Label as written in mapping files.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Health => "Health",
            Category::SocialLabour => "Social & Labour",
            Category::AgricultureFisheries => "Agriculture & Fisheries",
            Category::EducationCulture => "Education & Culture",
            Category::Infrastructure => "Infrastructure",
            Category::FinanceEconomy => "Finance & Economy",
            Category::CentralAdministration => "Central Administration",
            Category::MiscMissing => "Misc/Missing",
        }
    }

    /// Parse an exact label (surrounding whitespace ignored).
    pub fn from_label(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL.into_iter().find(|c| c.label() == s)
    }

    /// Parse a label, coercing anything outside the set to `MiscMissing`.
    pub fn coerce(s: &str) -> Self {
        Self::from_label(s).unwrap_or(Category::MiscMissing)
    }

    /// All labels, for prompting a classifier.
    pub fn labels() -> Vec<&'static str> {
        Self::ALL.iter().map(|c| c.label()).collect()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of looking a ministry up in the mapping table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NormalizedCategory {
    /// The ministry has a category.
    Mapped(Category),
    /// No mapping (or an empty one) exists yet.
    Unmapped,
}

impl NormalizedCategory {
    /// Sentinel written for unmapped names.
    pub const UNMAPPED_LABEL: &'static str = "unmapped";

    pub fn label(&self) -> &'static str {
        match self {
            NormalizedCategory::Mapped(c) => c.label(),
            NormalizedCategory::Unmapped => Self::UNMAPPED_LABEL,
        }
    }

    /// Parse a value read back from a normalized table.
    pub fn from_label(s: &str) -> Self {
        match Category::from_label(s) {
            Some(c) => NormalizedCategory::Mapped(c),
            None => NormalizedCategory::Unmapped,
        }
    }

    /// True for a real category other than the Misc/Missing catch-all.
    pub fn is_resolved(&self) -> bool {
        matches!(self, NormalizedCategory::Mapped(c) if *c != Category::MiscMissing)
    }
}

impl fmt::Display for NormalizedCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for NormalizedCategory {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for NormalizedCategory {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(NormalizedCategory::from_label(&s))
    }
}

/// A ledger line segmented out of one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// Ministry heading in effect when the line was read.
    #[serde(rename = "Ministry")]
    pub ministry: Option<String>,

    /// Subcategory heading in effect when the line was read.
    #[serde(rename = "Subcategory")]
    pub subcategory: Option<String>,

    /// Full text of the source line.
    #[serde(rename = "LineItem")]
    pub line_text: String,

    /// Rightmost amount on the line, in thousands of ISK.
    #[serde(rename = "Amount_thousands_ISK")]
    pub amount: Decimal,

    /// Report year taken from the document name.
    #[serde(rename = "Year")]
    pub year: Option<i32>,

    /// Document the line came from.
    #[serde(rename = "Source")]
    pub source_document: String,
}

impl LineItem {
    /// CSV column order for line items.
    pub const HEADERS: [&'static str; 6] = [
        "Ministry",
        "Subcategory",
        "LineItem",
        "Amount_thousands_ISK",
        "Year",
        "Source",
    ];

    /// Cells in [`LineItem::HEADERS`] order. Missing values are empty.
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.ministry.clone().unwrap_or_default(),
            self.subcategory.clone().unwrap_or_default(),
            self.line_text.clone(),
            self.amount.normalize().to_string(),
            self.year.map(|y| y.to_string()).unwrap_or_default(),
            self.source_document.clone(),
        ]
    }
}

/// A line item with its resolved category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    #[serde(flatten)]
    pub item: LineItem,

    pub normalized_category: NormalizedCategory,
}

impl NormalizedRecord {
    /// Column holding the category in normalized tables.
    pub const CATEGORY_COLUMN: &'static str = "normalized_category";

    pub fn new(item: LineItem, normalized_category: NormalizedCategory) -> Self {
        Self {
            item,
            normalized_category,
        }
    }
}
