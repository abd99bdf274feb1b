use std::collections::HashMap;

use super::lexicon::{singular, words, Mention};
use super::matching::IngredientMatcher;
use crate::model::{Inconsistency, InconsistencyKind, Ingredient};

/// Instruction text prepared once for repeated lookups
pub struct InstructionIndex {
    pub mentions: Vec<Mention>,
    words: Vec<String>,
}

impl InstructionIndex {
    pub fn new(text: &str) -> Self {
        InstructionIndex {
            mentions: super::lexicon::find_mentions(text),
            words: words(text).into_iter().map(|(w, _)| singular(&w)).collect(),
        }
    }

    /// Whether the ingredient shows up in the text, either through a lexicon
    /// mention it covers or by its head noun appearing as a word
    pub fn mentions_ingredient(&self, matcher: &dyn IngredientMatcher, name: &str) -> bool {
        if self.mentions.iter().any(|m| matcher.covers(name, m.term)) {
            return true;
        }
        let normalized = matcher.normalize(name);
        normalized
            .rsplit(' ')
            .next()
            .filter(|head| !head.is_empty())
            .is_some_and(|head| self.words.iter().any(|w| w == head))
    }
}

/// One finding per normalized name listed more than once
pub fn duplicates(ingredients: &[Ingredient], matcher: &dyn IngredientMatcher) -> Vec<Inconsistency> {
    let mut counts: HashMap<String, (usize, &str)> = HashMap::new();
    let mut order = Vec::new();
    for ingredient in ingredients {
        let key = matcher.normalize(&ingredient.name);
        if key.is_empty() {
            continue;
        }
        let entry = counts.entry(key.clone()).or_insert_with(|| {
            order.push(key);
            (0, ingredient.name.as_str())
        });
        entry.0 += 1;
    }

    order
        .into_iter()
        .filter_map(|key| {
            let (count, name) = counts[&key];
            (count > 1).then(|| Inconsistency {
                kind: InconsistencyKind::DuplicateIngredient,
                ingredient_name: name.trim().to_string(),
                detail: format!("listed {} times", count),
            })
        })
        .collect()
}

/// Listed ingredients the instructions never use. Optional entries are
/// exempt. Callers pass only the originally listed ingredients.
pub fn missing_in_steps(
    ingredients: &[Ingredient],
    index: &InstructionIndex,
    matcher: &dyn IngredientMatcher,
) -> Vec<Inconsistency> {
    ingredients
        .iter()
        .filter(|i| !i.optional)
        .filter(|i| !index.mentions_ingredient(matcher, &i.name))
        .map(|i| Inconsistency {
            kind: InconsistencyKind::MissingInSteps,
            ingredient_name: i.name.clone(),
            detail: "not mentioned in the instructions".to_string(),
        })
        .collect()
}

/// Foods the instructions use that nothing in the list covers and that were
/// not already reported as missing
pub fn unused_mentions(
    ingredients: &[Ingredient],
    missing: &[String],
    index: &InstructionIndex,
    matcher: &dyn IngredientMatcher,
) -> Vec<Inconsistency> {
    let mut seen: Vec<&str> = Vec::new();
    let mut found = Vec::new();
    for mention in &index.mentions {
        if seen.contains(&mention.term) {
            continue;
        }
        seen.push(mention.term);
        let covered = ingredients.iter().any(|i| matcher.covers(&i.name, mention.term));
        if !covered && !missing.iter().any(|m| m == mention.term) {
            found.push(Inconsistency {
                kind: InconsistencyKind::UnusedIngredient,
                ingredient_name: mention.term.to_string(),
                detail: "used in the instructions but not in the ingredient list".to_string(),
            });
        }
    }
    found
}
