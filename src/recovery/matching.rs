use std::collections::HashSet;
use std::sync::LazyLock;

use super::lexicon::{canonical, singular, words};

/// Decides whether an ingredient accounts for a food mentioned in the
/// instructions.
pub trait IngredientMatcher: Send + Sync {
    /// Comparison form of a name: lowercase, singular, descriptors removed
    fn normalize(&self, name: &str) -> String;

    /// Whether `ingredient` covers `mention`
    fn covers(&self, ingredient: &str, mention: &str) -> bool;
}

/// Words that describe preparation or size rather than the food itself
static DESCRIPTORS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "fresh", "freshly", "chopped", "diced", "minced", "sliced", "grated", "shredded",
        "crushed", "large", "small", "medium", "whole", "finely", "roughly", "thinly", "melted",
        "softened", "cold", "warm", "hot", "room", "temperature", "unsalted", "salted", "dried",
        "ripe", "peeled", "boneless", "skinless", "extra", "virgin", "organic", "cooked", "raw",
        "frozen", "packed", "light", "dark", "of", "the", "a", "an", "and", "or", "some",
    ]
    .into_iter()
    .collect()
});

/// Normalization plus word containment, with synonyms folded through the
/// food lexicon. A multi-word name covers its head noun, so "olive oil"
/// covers "oil".
#[derive(Debug, Clone, Copy, Default)]
pub struct LexiconMatcher;

impl LexiconMatcher {
    fn canonical_words(&self, name: &str) -> Vec<String> {
        let normalized = self.normalize(name);
        match canonical(&normalized) {
            Some(term) => term.split(' ').map(str::to_string).collect(),
            None => normalized.split(' ').filter(|w| !w.is_empty()).map(str::to_string).collect(),
        }
    }
}

/// Whether `needle` appears as a contiguous run of words in `haystack`
fn contains_words(haystack: &[String], needle: &[String]) -> bool {
    !needle.is_empty()
        && needle.len() <= haystack.len()
        && haystack.windows(needle.len()).any(|window| window == needle)
}

impl IngredientMatcher for LexiconMatcher {
    fn normalize(&self, name: &str) -> String {
        words(name)
            .into_iter()
            .map(|(word, _)| word)
            .filter(|word| !DESCRIPTORS.contains(word.as_str()))
            .map(|word| singular(&word))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn covers(&self, ingredient: &str, mention: &str) -> bool {
        let ingredient = self.canonical_words(ingredient);
        let mention = self.canonical_words(mention);
        if ingredient.is_empty() || mention.is_empty() {
            return false;
        }
        contains_words(&ingredient, &mention) || contains_words(&mention, &ingredient)
    }
}
