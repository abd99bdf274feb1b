//! Cross-checking parsed ingredients against the instructions.
//!
//! Recovery adds ingredients the steps use but the list forgot, fills in
//! quantities, flags inconsistencies and scores the result. It never fails:
//! on bad input it returns the original list with a fixed confidence.

pub mod consistency;
pub mod lexicon;
pub mod matching;
pub mod quantity;

use log::{debug, info, warn};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, LazyLock};
use thiserror::Error;

use crate::model::{Ingredient, RecoveryResult};
use crate::providers::CompletionProvider;
use consistency::InstructionIndex;
pub use matching::{IngredientMatcher, LexiconMatcher};

const DEGRADED_CONFIDENCE: f64 = 0.5;
const MIN_CONFIDENCE: f64 = 0.05;
const MAX_CONFIDENCE: f64 = 0.95;
const INCONSISTENCY_PENALTY: f64 = 0.05;

static OPTIONAL_QUALIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(if desired|optional|optionally|to taste|if you like|for garnish)\b").unwrap()
});

static SENTENCE_END: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[.!?;\n]+").unwrap());

fn default_true() -> bool {
    true
}

fn default_max_inferred() -> usize {
    5
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveryOptions {
    #[serde(default = "default_true")]
    pub detect_missing: bool,
    #[serde(default = "default_true")]
    pub infer_quantities: bool,
    #[serde(default = "default_true")]
    pub check_consistency: bool,
    #[serde(default = "default_true")]
    pub infer_optional: bool,
    #[serde(default)]
    pub use_ai_for_inference: bool,
    #[serde(default = "default_max_inferred")]
    pub max_inferred_ingredients: usize,
}

impl Default for RecoveryOptions {
    fn default() -> Self {
        RecoveryOptions {
            detect_missing: true,
            infer_quantities: true,
            check_consistency: true,
            infer_optional: true,
            use_ai_for_inference: false,
            max_inferred_ingredients: default_max_inferred(),
        }
    }
}

#[derive(Error, Debug)]
enum RecoveryError {
    #[error("ingredient '{0}' has a non-finite confidence")]
    NonFiniteConfidence(String),
}

pub struct IngredientRecovery {
    matcher: Arc<dyn IngredientMatcher>,
    completion: Option<Arc<dyn CompletionProvider>>,
}

impl Default for IngredientRecovery {
    fn default() -> Self {
        Self::new()
    }
}

impl IngredientRecovery {
    pub fn new() -> Self {
        IngredientRecovery {
            matcher: Arc::new(LexiconMatcher),
            completion: None,
        }
    }

    pub fn with_matcher(mut self, matcher: Arc<dyn IngredientMatcher>) -> Self {
        self.matcher = matcher;
        self
    }

    /// Enables AI quantity inference when `use_ai_for_inference` is set
    pub fn with_completion_provider(mut self, provider: Arc<dyn CompletionProvider>) -> Self {
        self.completion = Some(provider);
        self
    }

    pub async fn recover(
        &self,
        ingredients: &[Ingredient],
        instruction_lines: &[String],
        raw_text: &str,
        options: &RecoveryOptions,
    ) -> RecoveryResult {
        match self
            .try_recover(ingredients, instruction_lines, raw_text, options)
            .await
        {
            Ok(result) => result,
            Err(e) => {
                warn!("Ingredient recovery skipped: {}", e);
                RecoveryResult {
                    original_ingredients: ingredients.to_vec(),
                    recovered_ingredients: ingredients.to_vec(),
                    missing_ingredients: Vec::new(),
                    inferred_quantities: Vec::new(),
                    inconsistencies: Vec::new(),
                    confidence: DEGRADED_CONFIDENCE,
                    recovery_notes: vec![format!("Recovery skipped: {}", e)],
                }
            }
        }
    }

    async fn try_recover(
        &self,
        ingredients: &[Ingredient],
        instruction_lines: &[String],
        raw_text: &str,
        options: &RecoveryOptions,
    ) -> Result<RecoveryResult, RecoveryError> {
        if let Some(bad) = ingredients.iter().find(|i| !i.confidence.is_finite()) {
            return Err(RecoveryError::NonFiniteConfidence(bad.name.clone()));
        }

        let matcher = self.matcher.as_ref();
        let instructions = instruction_lines.join("\n");
        let index = InstructionIndex::new(&instructions);
        let mut recovered = ingredients.to_vec();
        let mut notes = Vec::new();

        // 1. ingredients the steps use but the list lacks
        let mut missing = Vec::new();
        if options.detect_missing {
            missing = self.missing_candidates(ingredients, &index, options.max_inferred_ingredients);
            for (term, mentions) in &missing {
                let confidence = (0.4 + 0.1 * *mentions as f64).min(0.8);
                let mut ingredient = Ingredient::new(*term).with_confidence(confidence);
                ingredient.inferred = true;
                recovered.push(ingredient);
            }
            if !missing.is_empty() {
                let names: Vec<&str> = missing.iter().map(|(t, _)| *t).collect();
                notes.push(format!(
                    "Added {} ingredient(s) mentioned in the instructions: {}",
                    names.len(),
                    names.join(", ")
                ));
            }
        }
        let missing_names: Vec<String> = missing.iter().map(|(t, _)| t.to_string()).collect();

        // 2. quantities
        let mut inferred_quantities = Vec::new();
        if options.infer_quantities {
            for ingredient in recovered.iter_mut().filter(|i| i.quantity.is_none()) {
                let name_words = matcher.normalize(&ingredient.name);
                let mut found = quantity::infer_from_text(&ingredient.name, &name_words, &instructions);

                if found.is_none() && options.use_ai_for_inference {
                    if let Some(provider) = &self.completion {
                        match quantity::infer_with_ai(provider.as_ref(), &ingredient.name, raw_text).await {
                            Ok(q) => found = Some(q),
                            Err(e) => notes.push(format!(
                                "Could not infer a quantity for {}: {}",
                                ingredient.name, e
                            )),
                        }
                    }
                }

                if let Some(q) = found {
                    ingredient.quantity = Some(q.quantity);
                    ingredient.unit = q.unit.clone();
                    ingredient.inferred = true;
                    ingredient.confidence = ingredient.confidence.min(q.confidence);
                    notes.push(format!("Inferred quantity for {}", ingredient.name));
                    inferred_quantities.push(q);
                }
            }
        }

        // 3. optional markers in the steps
        if options.infer_optional {
            let sentences: Vec<&str> = SENTENCE_END
                .split(&instructions)
                .filter(|s| OPTIONAL_QUALIFIER.is_match(s))
                .collect();
            for sentence in sentences {
                let sentence_index = InstructionIndex::new(sentence);
                for ingredient in recovered.iter_mut().filter(|i| !i.optional) {
                    if sentence_index.mentions_ingredient(matcher, &ingredient.name) {
                        ingredient.optional = true;
                        notes.push(format!("Marked {} as optional", ingredient.name));
                    }
                }
            }
        }

        // 4. consistency
        let mut inconsistencies = Vec::new();
        if options.check_consistency {
            inconsistencies.extend(consistency::duplicates(ingredients, matcher));
            inconsistencies.extend(consistency::missing_in_steps(
                &recovered[..ingredients.len()],
                &index,
                matcher,
            ));
            inconsistencies.extend(consistency::unused_mentions(
                &recovered,
                &missing_names,
                &index,
                matcher,
            ));
        }

        // 5. score
        let cross_validated = ingredients
            .iter()
            .filter(|i| index.mentions_ingredient(matcher, &i.name))
            .count();
        let confidence = aggregate_confidence(ingredients, cross_validated, inconsistencies.len());
        debug!(
            "Recovery: {} original, {} recovered, {} issues, confidence {:.2}",
            ingredients.len(),
            recovered.len(),
            inconsistencies.len(),
            confidence
        );
        if !missing_names.is_empty() || !inferred_quantities.is_empty() {
            info!(
                "Recovered {} ingredient(s) and {} quantity(ies)",
                missing_names.len(),
                inferred_quantities.len()
            );
        }

        Ok(RecoveryResult {
            original_ingredients: ingredients.to_vec(),
            recovered_ingredients: recovered,
            missing_ingredients: missing_names,
            inferred_quantities,
            inconsistencies,
            confidence,
            recovery_notes: notes,
        })
    }

    /// Uncovered food mentions ranked by mention count, then first
    /// appearance, capped at `limit`
    fn missing_candidates(
        &self,
        ingredients: &[Ingredient],
        index: &InstructionIndex,
        limit: usize,
    ) -> Vec<(&'static str, usize)> {
        let mut candidates: Vec<(&'static str, usize, usize)> = Vec::new();
        for mention in &index.mentions {
            if let Some(entry) = candidates.iter_mut().find(|(t, _, _)| *t == mention.term) {
                entry.1 += 1;
                continue;
            }
            let covered = ingredients
                .iter()
                .any(|i| self.matcher.covers(&i.name, mention.term));
            if !covered {
                candidates.push((mention.term, 1, mention.position));
            }
        }
        // Covered terms never enter the list, so counts only track uncovered ones
        candidates.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
        candidates.truncate(limit);
        candidates.into_iter().map(|(t, n, _)| (t, n)).collect()
    }
}

/// `0.1 + 0.45 * mean + 0.45 * ratio - 0.05 * issues`, kept inside
/// `[0.05, 0.95]`
fn aggregate_confidence(originals: &[Ingredient], cross_validated: usize, issues: usize) -> f64 {
    let (mean, ratio) = if originals.is_empty() {
        (0.0, 0.0)
    } else {
        let n = originals.len() as f64;
        let mean = originals.iter().map(|i| i.confidence.clamp(0.0, 1.0)).sum::<f64>() / n;
        (mean, cross_validated as f64 / n)
    };
    (0.1 + 0.45 * mean + 0.45 * ratio - INCONSISTENCY_PENALTY * issues as f64)
        .clamp(MIN_CONFIDENCE, MAX_CONFIDENCE)
}
