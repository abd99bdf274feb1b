use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

/// Shorter trimmed text is rejected outright
pub const MIN_TEXT_LENGTH: usize = 10;
/// Longer text is accepted with a warning
pub const MAX_TEXT_LENGTH: usize = 50_000;

const KEYWORD_WEIGHT: f64 = 0.3;
const BULLET_WEIGHT: f64 = 0.15;
const NUMBERED_WEIGHT: f64 = 0.15;
const MEASUREMENT_WEIGHT: f64 = 0.25;
const BASE_TEXT_CONFIDENCE: f64 = 0.1;
const MAX_TEXT_CONFIDENCE: f64 = 0.95;

static KEYWORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(ingredients?|instructions?|directions|method|steps?|serves|servings|yield|prep(aration)? time|cook(ing)? time)\b",
    )
    .unwrap()
});

static BULLET_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*[-*•·▪◦]\s+\S").unwrap());

static NUMBERED_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?mi)^\s*(\d{1,2}[.)]|step\s+\d{1,2}:?)\s+\S").unwrap());

static MEASUREMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(\d+(?:[./]\d+)?|[½⅓⅔¼¾⅛])\s*(cups?|tbsps?|tablespoons?|tsps?|teaspoons?|oz|ounces?|lbs?|pounds?|g|grams?|kg|kilograms?|ml|milliliters?|l|liters?|litres?|pinch(es)?|cloves?|cans?|sticks?|dash(es)?)\b",
    )
    .unwrap()
});

/// Recipe-shape signals found in free text
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextSignals {
    pub has_recipe_structure: bool,
    pub bullet_points: usize,
    pub numbered_steps: usize,
    pub measurements: usize,
}

impl TextSignals {
    pub fn analyze(text: &str) -> Self {
        TextSignals {
            has_recipe_structure: KEYWORDS.is_match(text),
            bullet_points: BULLET_LINE.find_iter(text).count(),
            numbered_steps: NUMBERED_LINE.find_iter(text).count(),
            measurements: MEASUREMENT.find_iter(text).count(),
        }
    }

    /// Each signal category present adds its fixed increment
    pub fn confidence(&self, text: &str) -> f64 {
        if text.trim().is_empty() {
            return 0.0;
        }

        let mut score = BASE_TEXT_CONFIDENCE;
        if self.has_recipe_structure {
            score += KEYWORD_WEIGHT;
        }
        if self.bullet_points > 0 {
            score += BULLET_WEIGHT;
        }
        if self.numbered_steps > 0 {
            score += NUMBERED_WEIGHT;
        }
        if self.measurements > 0 {
            score += MEASUREMENT_WEIGHT;
        }
        score.min(MAX_TEXT_CONFIDENCE)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TextValidation {
    pub is_valid: bool,
    pub issues: Vec<String>,
    pub warnings: Vec<String>,
}

/// Check pasted text before it enters the pipeline
pub fn validate_text(text: &str) -> TextValidation {
    let trimmed = text.trim();
    let length = trimmed.chars().count();
    let mut issues = Vec::new();
    let mut warnings = Vec::new();

    if trimmed.is_empty() {
        issues.push("Text is empty".to_string());
    } else if length < MIN_TEXT_LENGTH {
        issues.push(format!(
            "Text is too short ({} characters, minimum {})",
            length, MIN_TEXT_LENGTH
        ));
    }

    if length > MAX_TEXT_LENGTH {
        warnings.push(format!(
            "Text is very long ({} characters); only part of it may be a recipe",
            length
        ));
    }

    if issues.is_empty() && !TextSignals::analyze(trimmed).has_recipe_structure {
        warnings.push("No recipe section headings found".to_string());
    }

    TextValidation {
        is_valid: issues.is_empty(),
        issues,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECIPE: &str = "Pancakes\n\nIngredients:\n- 2 cups flour\n- 1 tbsp sugar\n\nInstructions:\n1. Mix everything.\n2. Fry.";

    #[test]
    fn test_signals_counted() {
        let signals = TextSignals::analyze(RECIPE);
        assert!(signals.has_recipe_structure);
        assert_eq!(signals.bullet_points, 2);
        assert_eq!(signals.numbered_steps, 2);
        assert_eq!(signals.measurements, 2);
    }

    #[test]
    fn test_confidence_capped() {
        let signals = TextSignals::analyze(RECIPE);
        assert!((signals.confidence(RECIPE) - MAX_TEXT_CONFIDENCE).abs() < 1e-9);
    }

    #[test]
    fn test_empty_text_has_zero_confidence() {
        assert_eq!(TextSignals::analyze("").confidence(""), 0.0);
        assert_eq!(TextSignals::analyze("  \n ").confidence("  \n "), 0.0);
    }

    #[test]
    fn test_plain_prose_gets_base_score() {
        let text = "I went to the market yesterday";
        assert_eq!(TextSignals::analyze(text).confidence(text), BASE_TEXT_CONFIDENCE);
    }

    #[test]
    fn test_short_text_rejected() {
        let result = validate_text("hi there");
        assert!(!result.is_valid);
        assert!(result.issues[0].contains("too short"));
    }

    #[test]
    fn test_long_text_warns_but_valid() {
        let text = format!("Ingredients: {}", "flour ".repeat(10_000));
        let result = validate_text(&text);
        assert!(result.is_valid);
        assert!(result.warnings.iter().any(|w| w.contains("very long")));
    }
}
