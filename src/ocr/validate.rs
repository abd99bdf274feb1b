use serde::Serialize;

use crate::model::OcrResult;

const MIN_TEXT_CHARS: usize = 20;
const MIN_CONFIDENCE: f64 = 0.6;
const MAX_ARTIFACT_DENSITY: f64 = 0.10;
const MIN_WORDS: usize = 5;
const SINGLE_LINE_HINT_CHARS: usize = 200;

/// Punctuation that shows up in ordinary recipe text
const EXPECTED_PUNCTUATION: &str = ".,;:!?'\"()-/%&+*#°½¼¾⅓⅔⅛";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OcrValidation {
    pub is_valid: bool,
    pub issues: Vec<String>,
    pub suggestions: Vec<String>,
}

pub fn validate(result: &OcrResult) -> OcrValidation {
    let text = result.text.trim();
    let mut issues = Vec::new();
    let mut suggestions = Vec::new();

    let char_count = text.chars().count();
    if char_count < MIN_TEXT_CHARS {
        issues.push(format!("Recognized text is very short ({} characters)", char_count));
        suggestions.push("Use a clearer or closer image of the recipe".to_string());
    }

    if result.confidence < MIN_CONFIDENCE {
        issues.push(format!(
            "Low recognition confidence ({:.0}%)",
            result.confidence * 100.0
        ));
        suggestions.push("Retake the photo with better lighting and focus".to_string());
    }

    let density = artifact_density(text);
    if density > MAX_ARTIFACT_DENSITY {
        issues.push(format!(
            "Text contains many unexpected characters ({:.0}%)",
            density * 100.0
        ));
        suggestions.push("Enable preprocessing or try another OCR provider".to_string());
    }

    let words = text.split_whitespace().count();
    if words < MIN_WORDS {
        issues.push(format!("Only {} words recognized", words));
    }

    let is_valid = issues.is_empty();

    if char_count > SINGLE_LINE_HINT_CHARS && !text.contains('\n') {
        suggestions.push(
            "Text has no line breaks; the layout may have been lost, check ingredient lists"
                .to_string(),
        );
    }

    OcrValidation {
        is_valid,
        issues,
        suggestions,
    }
}

/// Share of non-whitespace characters that are neither alphanumeric nor
/// expected punctuation
fn artifact_density(text: &str) -> f64 {
    let mut visible = 0usize;
    let mut artifacts = 0usize;
    for c in text.chars().filter(|c| !c.is_whitespace()) {
        visible += 1;
        if !c.is_alphanumeric() && !EXPECTED_PUNCTUATION.contains(c) {
            artifacts += 1;
        }
    }
    if visible == 0 {
        return 0.0;
    }
    artifacts as f64 / visible as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ImageSize, OcrMetadata};

    fn result(text: &str, confidence: f64) -> OcrResult {
        OcrResult {
            text: text.to_string(),
            confidence,
            metadata: OcrMetadata {
                provider: "test".to_string(),
                processing_time_ms: 0,
                image_size: ImageSize::default(),
                preprocessing_applied: vec![],
                language: "eng".to_string(),
            },
        }
    }

    #[test]
    fn test_good_result_is_valid() {
        let validation = validate(&result(
            "Ingredients\n2 cups flour\n1 tsp salt\nMix and bake for 20 minutes.",
            0.92,
        ));
        assert!(validation.is_valid);
        assert!(validation.issues.is_empty());
    }

    #[test]
    fn test_short_low_confidence() {
        let validation = validate(&result("flour", 0.4));
        assert!(!validation.is_valid);
        assert_eq!(validation.issues.len(), 3);
        assert!(validation.issues[0].contains("very short"));
        assert!(validation.issues[1].contains("Low recognition confidence"));
    }

    #[test]
    fn test_artifact_density() {
        let validation = validate(&result("~~ }{ flour ]] sugar @@ eggs ^^ butter ¬¬ milk", 0.9));
        assert!(!validation.is_valid);
        assert!(validation.issues.iter().any(|i| i.contains("unexpected characters")));
    }

    #[test]
    fn test_single_line_hint_does_not_invalidate() {
        let text = "mix the flour and the sugar together ".repeat(8);
        let validation = validate(&result(&text, 0.9));
        assert!(validation.is_valid);
        assert!(validation.suggestions.iter().any(|s| s.contains("line breaks")));
    }
}
