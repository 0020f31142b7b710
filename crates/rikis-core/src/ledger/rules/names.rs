//! Ministry name normalization and plausibility filters.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use super::patterns::{
    INSTITUTION_KEYWORD, NARRATIVE_TERMS, NARRATIVE_WORDS, TABLE_INSTITUTION_KEYWORD,
};

/// Fold a string for fuzzy comparison: lower-case, ASCII-ish, single spaces.
///
/// Letters without a decomposition (`ð`, `þ`, `æ`, `ø`) are transliterated.
pub fn normalize_text(text: &str) -> String {
    let lowered = text.to_lowercase();
    let mut folded = String::with_capacity(lowered.len());

    for c in lowered.nfkd().filter(|c| !is_combining_mark(*c)) {
        match c {
            'ð' | 'đ' => folded.push('d'),
            'þ' => folded.push_str("th"),
            'æ' => folded.push_str("ae"),
            'ø' => folded.push('o'),
            'ß' => folded.push_str("ss"),
            'ł' => folded.push('l'),
            _ => folded.push(c),
        }
    }

    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Key used for uniqueness in the mapping table: trimmed, lower-cased,
/// single-spaced. Diacritics are kept.
pub fn name_key(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn is_numeric_only(s: &str) -> bool {
    let digits: String = s.chars().filter(|c| *c != '.' && *c != ',').collect();
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

fn has_narrative(s: &str) -> bool {
    let lowered = s.to_lowercase();
    if NARRATIVE_TERMS.iter().any(|t| lowered.contains(t)) {
        return true;
    }
    lowered
        .split(|c: char| !c.is_alphanumeric())
        .any(|w| NARRATIVE_WORDS.contains(&w))
}

/// Whether a table cell plausibly names a ministry or institution.
///
/// Used to filter rows of extracted tables: at most 50 characters and five
/// spaces, not a number, no narrative wording, and an institution word.
pub fn is_ministry(value: &str) -> bool {
    let s = value.trim();
    if s.is_empty() || s.chars().count() > 50 {
        return false;
    }
    if s.matches(' ').count() > 5 {
        return false;
    }
    if is_numeric_only(s) || has_narrative(s) {
        return false;
    }
    TABLE_INSTITUTION_KEYWORD.is_match(s)
}

/// Whether a name seen in extracted data is probably a real ministry.
///
/// Keeps OCR and table noise out of the unmapped report: between 5 and 60
/// characters, at most 35% digits, not a number, and an institution word.
pub fn is_probable_ministry(value: &str) -> bool {
    let s = value.trim();
    let len = s.chars().count();
    if !(5..=60).contains(&len) {
        return false;
    }
    let digits = s.chars().filter(|c| c.is_ascii_digit()).count();
    if digits as f64 > len as f64 * 0.35 {
        return false;
    }
    if is_numeric_only(s) {
        return false;
    }
    INSTITUTION_KEYWORD.is_match(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("  Fjármálaráðuneyti "), "fjarmalaraduneyti");
        assert_eq!(normalize_text("Þjóðminjasafn   Íslands"), "thjodminjasafn islands");
        assert_eq!(normalize_text("Sjávarútvegs- og LANDBÚNAÐARráðuneyti"), "sjavarutvegs- og landbunadarraduneyti");
        assert_eq!(normalize_text("Tæknistofnun"), "taeknistofnun");
    }

    #[test]
    fn test_name_key() {
        assert_eq!(name_key("  Forsætis   Ráðuneyti "), "forsætis ráðuneyti");
    }

    #[test]
    fn test_is_ministry() {
        assert!(is_ministry("Fjármálaráðuneyti"));
        assert!(is_ministry("Hafrannsóknastofnun"));
        assert!(is_ministry("Háskóli Íslands"));

        assert!(!is_ministry("1.234.567"));
        assert!(!is_ministry("12,5"));
        assert!(!is_ministry(""));
        assert!(!is_ministry("Samtals gjöld ráðuneyta"));
        assert!(!is_ministry("Gjöld ráðuneyta námu alls á árinu"));
        assert!(!is_ministry("Veðurstofa"));
        assert!(!is_ministry(&"stofnun ".repeat(8)));
    }

    #[test]
    fn test_is_probable_ministry() {
        assert!(is_probable_ministry("Umhverfisráðuneyti"));
        assert!(is_probable_ministry("Vegagerðin - framkvæmdasvið"));

        assert!(!is_probable_ministry("1.234.567"));
        assert!(!is_probable_ministry("--- ., ---"));
        assert!(!is_probable_ministry("ráð"));
        assert!(!is_probable_ministry("12345 stofnun 67890"));
        assert!(!is_probable_ministry("Laun og launatengd gjöld"));
    }
}
