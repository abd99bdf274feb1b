//! Filling in missing ingredient quantities.

use log::{debug, warn};
use regex::Regex;
use serde::Deserialize;

use crate::model::{InferenceSource, InferredQuantity};
use crate::parser::quantity::{canonical_unit, parse_quantity, QUANTITY_PATTERN, UNIT_PATTERN};
use crate::providers::{ChatMessage, CompletionProvider};

pub const TEXT_CONFIDENCE: f64 = 0.7;
const AI_DEFAULT_CONFIDENCE: f64 = 0.5;
const AI_MAX_CONFIDENCE: f64 = 0.9;
const MAX_PROMPT_CHARS: usize = 4000;

const SYSTEM_PROMPT: &str = "You estimate missing ingredient quantities for recipes. \
Reply with a single JSON object and nothing else: \
{\"quantity\": number, \"unit\": string or null, \"confidence\": number between 0 and 1, \
\"reasoning\": short string}.";

/// Search instruction text for "number [unit] [of] [adjective] name".
///
/// `name_words` is the normalized ingredient name. The full name is tried
/// first, then its head noun.
pub fn infer_from_text(ingredient_name: &str, name_words: &str, text: &str) -> Option<InferredQuantity> {
    let mut candidates = vec![name_words.to_string()];
    if let Some(head) = name_words.rsplit(' ').next() {
        if head != name_words && !head.is_empty() {
            candidates.push(head.to_string());
        }
    }

    for candidate in candidates.iter().filter(|c| !c.is_empty()) {
        let name_pattern = candidate
            .split(' ')
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(r"\s+");
        let pattern = format!(
            r"(?i)(?P<qty>{q})\s*(?:(?P<unit>{u})\.?\s+)?(?:of\s+)?(?:[a-z]+\s+)?{name}(?:e?s)?\b",
            q = QUANTITY_PATTERN,
            u = *UNIT_PATTERN,
            name = name_pattern
        );
        let Ok(regex) = Regex::new(&pattern) else {
            continue;
        };

        if let Some(caps) = regex.captures(text) {
            let Some(quantity) = parse_quantity(&caps["qty"]) else {
                continue;
            };
            let unit = caps
                .name("unit")
                .and_then(|u| canonical_unit(u.as_str()))
                .map(str::to_string);
            debug!("Found {} {:?} for {} in instructions", quantity, unit, ingredient_name);
            return Some(InferredQuantity {
                ingredient_name: ingredient_name.to_string(),
                quantity,
                unit,
                confidence: TEXT_CONFIDENCE,
                source: InferenceSource::InstructionText,
                reasoning: Some(format!("mentioned as \"{}\" in the instructions", caps[0].trim())),
            });
        }
    }
    None
}

#[derive(Debug, Deserialize)]
struct AiQuantity {
    quantity: f64,
    unit: Option<String>,
    confidence: Option<f64>,
    reasoning: Option<String>,
}

/// Pull the JSON object out of a reply that may be wrapped in a code fence
/// or surrounded by prose
fn json_object(reply: &str) -> Option<&str> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    (end > start).then(|| &reply[start..=end])
}

pub fn parse_ai_reply(ingredient_name: &str, reply: &str) -> Result<InferredQuantity, String> {
    let json = json_object(reply).ok_or_else(|| "reply contains no JSON object".to_string())?;
    let parsed: AiQuantity =
        serde_json::from_str(json).map_err(|e| format!("malformed JSON reply: {}", e))?;

    if !parsed.quantity.is_finite() || parsed.quantity <= 0.0 {
        return Err(format!("unusable quantity {}", parsed.quantity));
    }

    let confidence = parsed
        .confidence
        .filter(|c| c.is_finite())
        .unwrap_or(AI_DEFAULT_CONFIDENCE)
        .clamp(0.0, AI_MAX_CONFIDENCE);
    let unit = parsed
        .unit
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .map(|u| canonical_unit(&u).map(str::to_string).unwrap_or(u));

    Ok(InferredQuantity {
        ingredient_name: ingredient_name.to_string(),
        quantity: parsed.quantity,
        unit,
        confidence,
        source: InferenceSource::Ai,
        reasoning: parsed.reasoning,
    })
}

pub async fn infer_with_ai(
    provider: &dyn CompletionProvider,
    ingredient_name: &str,
    raw_text: &str,
) -> Result<InferredQuantity, String> {
    let excerpt: String = raw_text.chars().take(MAX_PROMPT_CHARS).collect();
    let messages = [
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::user(format!(
            "Recipe:\n{}\n\nIngredient: {}\nHow much {} does this recipe use?",
            excerpt, ingredient_name, ingredient_name
        )),
    ];

    let reply = provider.complete(&messages).await.map_err(|e| {
        warn!("AI quantity inference for {} failed: {}", ingredient_name, e);
        format!("provider error: {}", e)
    })?;
    parse_ai_reply(ingredient_name, &reply)
}
