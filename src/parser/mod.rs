//! Line-based recipe parser turning raw extracted text into a draft recipe.

pub mod quantity;

use log::debug;
use regex::Regex;
use std::sync::LazyLock;

use crate::model::{DraftRecipe, Ingredient};
use quantity::leading_amount;

const CONFIDENCE_WITH_UNIT: f64 = 0.9;
const CONFIDENCE_QUANTITY_ONLY: f64 = 0.8;
const CONFIDENCE_NAME_ONLY: f64 = 0.7;

static INGREDIENT_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\W*(ingredients?|you(?:'|’)ll need|you will need)\W*$").unwrap());

static INSTRUCTION_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\W*(instructions?|directions?|method|steps?|preparation|how to make it)\W*$")
        .unwrap()
});

static TITLE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:title|recipe)\s*:\s*(?P<title>.+)$").unwrap());

static LIST_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:[-*•·▪◦]\s*|\d{1,2}[.)]\s+|step\s+\d{1,2}\s*[:.)-]?\s*)").unwrap()
});

static NUMBERED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*(?:\d{1,2}[.)]|step\s+\d{1,2})\s").unwrap());

static OPTIONAL_MARK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\(?\b(optional|if desired)\b\)?").unwrap());

/// Lines that describe the recipe rather than being part of it
static META_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(serves|servings|yield|prep time|cook time|total time|by|author|source|image)\b\s*:?")
        .unwrap()
});

#[derive(PartialEq, Clone, Copy)]
enum Section {
    Preamble,
    Ingredients,
    Instructions,
}

pub struct RecipeParser;

impl RecipeParser {
    pub fn parse(raw_text: &str) -> DraftRecipe {
        let lines: Vec<&str> = raw_text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();

        let has_headers = lines
            .iter()
            .any(|l| INGREDIENT_HEADER.is_match(l) || INSTRUCTION_HEADER.is_match(l));

        let mut title = String::new();
        let mut ingredients = Vec::new();
        let mut instructions = Vec::new();
        let mut section = Section::Preamble;

        for line in lines {
            if let Some(caps) = TITLE_LINE.captures(line) {
                if title.is_empty() {
                    title = caps["title"].trim().to_string();
                }
                continue;
            }
            if INGREDIENT_HEADER.is_match(line) {
                section = Section::Ingredients;
                continue;
            }
            if INSTRUCTION_HEADER.is_match(line) {
                section = Section::Instructions;
                continue;
            }
            if META_LINE.is_match(line) {
                continue;
            }

            let section_for_line = if has_headers {
                section
            } else {
                guess_section(line)
            };

            match section_for_line {
                Section::Preamble => {
                    if title.is_empty() {
                        title = strip_marker(line).to_string();
                    }
                }
                Section::Ingredients => {
                    if let Some(ingredient) = parse_ingredient_line(line) {
                        ingredients.push(ingredient);
                    }
                }
                Section::Instructions => {
                    let step = strip_marker(line);
                    if !step.is_empty() {
                        instructions.push(step.to_string());
                    }
                }
            }
        }

        debug!(
            "Parsed draft recipe '{}' with {} ingredients and {} steps",
            title,
            ingredients.len(),
            instructions.len()
        );

        DraftRecipe {
            title,
            ingredients,
            instructions,
        }
    }
}

/// Without headers: amounts mean ingredients, numbered lines and sentences
/// mean steps, and the first short line before either is the title.
fn guess_section(line: &str) -> Section {
    if NUMBERED.is_match(line) {
        return Section::Instructions;
    }
    let stripped = strip_marker(line);
    if leading_amount(stripped).is_some() {
        return Section::Ingredients;
    }
    let words = stripped.split_whitespace().count();
    if words >= 5 || stripped.ends_with('.') {
        Section::Instructions
    } else if line != stripped {
        // Bulleted short line without an amount, e.g. "- salt"
        Section::Ingredients
    } else {
        Section::Preamble
    }
}

fn strip_marker(line: &str) -> &str {
    match LIST_MARKER.find(line) {
        Some(m) if m.start() == 0 => line[m.end()..].trim(),
        _ => line.trim(),
    }
}

/// Parse one ingredient line such as "1 1/2 cups flour, sifted"
pub fn parse_ingredient_line(line: &str) -> Option<Ingredient> {
    let line = strip_marker(line);
    if line.is_empty() {
        return None;
    }

    let optional = OPTIONAL_MARK.is_match(line);
    let without_optional = OPTIONAL_MARK.replace_all(line, "");

    let (quantity, unit, rest) = match leading_amount(&without_optional) {
        Some(amount) => (
            Some(amount.quantity),
            amount.unit,
            without_optional[amount.rest_offset..].to_string(),
        ),
        None => (None, None, without_optional.to_string()),
    };

    let mut name = rest
        .trim_start_matches(|c: char| c == '.' || c == ',' || c.is_whitespace())
        .trim_start_matches("of ")
        .to_string();
    // Preparation notes after a comma are not part of the name
    if let Some((head, _)) = name.split_once(',') {
        name = head.to_string();
    }
    let name = name
        .trim()
        .trim_end_matches(|c: char| c == ',' || c == ';' || c == ':')
        .trim()
        .to_string();

    if name.is_empty() {
        return None;
    }

    let confidence = match (quantity, unit) {
        (Some(_), Some(_)) => CONFIDENCE_WITH_UNIT,
        (Some(_), None) => CONFIDENCE_QUANTITY_ONLY,
        _ => CONFIDENCE_NAME_ONLY,
    };

    Some(Ingredient {
        name,
        quantity,
        unit: unit.map(String::from),
        optional,
        confidence,
        inferred: false,
    })
}
