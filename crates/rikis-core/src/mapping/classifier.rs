//! Category suggestions from an external classifier.

use tracing::{debug, warn};

use crate::error::MappingError;
use crate::models::Category;

/// Something that can pick a category label for a ministry name.
///
/// The answer is free text; anything outside the category set is coerced to
/// [`Category::MiscMissing`] by [`suggest_categories`].
pub trait CategoryClassifier {
    fn classify(&self, name: &str, categories: &[Category]) -> Result<String, MappingError>;
}

/// Prompt sent to a language-model classifier.
pub fn classification_prompt(name: &str, categories: &[Category]) -> String {
    let labels: Vec<&str> = categories.iter().map(|c| c.label()).collect();
    format!(
        "Given these categories: {}, choose the single most appropriate category for the \
         Icelandic ministry or institution below. Ministry/Institution: \"{}\" \
         Answer ONLY with the category name from the provided list.",
        labels.join(", "),
        name
    )
}

/// Extract the label from classifier output.
///
/// Accepts either a JSON object with a `response` field or plain text.
/// Surrounding quotes and a trailing period are dropped.
pub fn parse_classifier_output(raw: &str) -> String {
    let raw = raw.trim();
    let text = serde_json::from_str::<serde_json::Value>(raw)
        .ok()
        .and_then(|v| v.get("response").and_then(|r| r.as_str()).map(str::to_string))
        .unwrap_or_else(|| raw.to_string());

    text.trim()
        .trim_matches(|c| c == '"' || c == '\'' || c == '`')
        .trim_end_matches('.')
        .trim()
        .to_string()
}

/// Ask the classifier about each name. Failures and unknown labels map to
/// [`Category::MiscMissing`].
pub fn suggest_categories<'a, I>(
    names: I,
    classifier: &dyn CategoryClassifier,
) -> Vec<(String, Category)>
where
    I: IntoIterator<Item = &'a str>,
{
    names
        .into_iter()
        .map(|name| {
            let category = match classifier.classify(name, &Category::ALL) {
                Ok(label) => {
                    let category = Category::coerce(&parse_classifier_output(&label));
                    debug!("{} => {}", name, category);
                    category
                }
                Err(e) => {
                    warn!("classifier failed for {:?}: {}", name, e);
                    Category::MiscMissing
                }
            };
            (name.to_string(), category)
        })
        .collect()
}
