//! Quantity and unit recognition shared by the parser and recovery stages.

use regex::Regex;
use std::sync::LazyLock;

/// Spellings mapped to a canonical unit, longest spellings first so that
/// "tablespoons" is tried before "tb".
const UNIT_ALIASES: &[(&str, &str)] = &[
    ("fluid ounces", "fl oz"),
    ("fluid ounce", "fl oz"),
    ("tablespoons", "tbsp"),
    ("milliliters", "ml"),
    ("millilitres", "ml"),
    ("tablespoon", "tbsp"),
    ("milliliter", "ml"),
    ("millilitre", "ml"),
    ("kilograms", "kg"),
    ("teaspoons", "tsp"),
    ("kilogram", "kg"),
    ("teaspoon", "tsp"),
    ("packages", "package"),
    ("handfuls", "handful"),
    ("package", "package"),
    ("handful", "handful"),
    ("bunches", "bunch"),
    ("pinches", "pinch"),
    ("ounces", "oz"),
    ("pounds", "lb"),
    ("liters", "l"),
    ("litres", "l"),
    ("cloves", "clove"),
    ("slices", "slice"),
    ("sticks", "stick"),
    ("sprigs", "sprig"),
    ("dashes", "dash"),
    ("grams", "g"),
    ("ounce", "oz"),
    ("pound", "lb"),
    ("liter", "l"),
    ("litre", "l"),
    ("clove", "clove"),
    ("slice", "slice"),
    ("stick", "stick"),
    ("sprig", "sprig"),
    ("bunch", "bunch"),
    ("pinch", "pinch"),
    ("fl oz", "fl oz"),
    ("cups", "cup"),
    ("tbsp", "tbsp"),
    ("tbs", "tbsp"),
    ("tsp", "tsp"),
    ("gram", "g"),
    ("cans", "can"),
    ("jars", "jar"),
    ("lbs", "lb"),
    ("cup", "cup"),
    ("can", "can"),
    ("jar", "jar"),
    ("dash", "dash"),
    ("lb", "lb"),
    ("oz", "oz"),
    ("kg", "kg"),
    ("mg", "mg"),
    ("ml", "ml"),
    ("g", "g"),
    ("l", "l"),
];

const VULGAR_FRACTIONS: &[(char, f64)] = &[
    ('½', 0.5),
    ('⅓', 1.0 / 3.0),
    ('⅔', 2.0 / 3.0),
    ('¼', 0.25),
    ('¾', 0.75),
    ('⅛', 0.125),
    ('⅜', 0.375),
    ('⅝', 0.625),
    ('⅞', 0.875),
];

/// A single amount: mixed number, fraction, decimal, integer or vulgar fraction
pub const QUANTITY_PATTERN: &str =
    r"(?:\d+\s+\d+/\d+|\d+\s*[½⅓⅔¼¾⅛⅜⅝⅞]|\d+/\d+|\d+(?:[.,]\d+)?|[½⅓⅔¼¾⅛⅜⅝⅞])";

/// Alternation of every unit spelling, longest first
pub static UNIT_PATTERN: LazyLock<String> = LazyLock::new(|| {
    UNIT_ALIASES
        .iter()
        .map(|(alias, _)| regex::escape(alias))
        .collect::<Vec<_>>()
        .join("|")
});

/// Amount (optionally a range) and unit at the start of an ingredient line
static LEADING_AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)^\s*(?P<qty>{q})(?:\s*(?:-|–|to)\s*{q})?\s*(?:(?P<unit>{u})\.?\b)?",
        q = QUANTITY_PATTERN,
        u = *UNIT_PATTERN
    ))
    .unwrap()
});

/// Parse one amount such as "2", "1.5", "1/2", "1 1/2", "1½" or "¾"
pub fn parse_quantity(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Some((whole, frac)) = text.split_once(char::is_whitespace) {
        if let (Some(w), Some(f)) = (parse_quantity(whole), parse_quantity(frac)) {
            return Some(w + f);
        }
    }

    if let Some(last) = text.chars().last() {
        if let Some(value) = vulgar_value(last) {
            let whole = &text[..text.len() - last.len_utf8()];
            return if whole.trim().is_empty() {
                Some(value)
            } else {
                whole.trim().parse::<f64>().ok().map(|w| w + value)
            };
        }
    }

    if let Some((num, den)) = text.split_once('/') {
        let num: f64 = num.trim().parse().ok()?;
        let den: f64 = den.trim().parse().ok()?;
        return if den == 0.0 { None } else { Some(num / den) };
    }

    text.replace(',', ".").parse::<f64>().ok()
}

fn vulgar_value(c: char) -> Option<f64> {
    VULGAR_FRACTIONS
        .iter()
        .find(|(fraction, _)| *fraction == c)
        .map(|(_, value)| *value)
}

/// Map any unit spelling to its canonical form
pub fn canonical_unit(unit: &str) -> Option<&'static str> {
    let unit = unit.trim().trim_end_matches('.').to_lowercase();
    UNIT_ALIASES
        .iter()
        .find(|(alias, _)| *alias == unit)
        .map(|(_, canonical)| *canonical)
}

/// Leading amount found on a line, with the byte offset where the rest begins
#[derive(Debug, Clone, PartialEq)]
pub struct LeadingAmount {
    pub quantity: f64,
    pub unit: Option<&'static str>,
    pub rest_offset: usize,
}

pub fn leading_amount(line: &str) -> Option<LeadingAmount> {
    let caps = LEADING_AMOUNT.captures(line)?;
    let quantity = parse_quantity(caps.name("qty")?.as_str())?;
    let unit = caps.name("unit").and_then(|u| canonical_unit(u.as_str()));
    let rest_offset = caps.get(0).map(|m| m.end()).unwrap_or(0);
    Some(LeadingAmount {
        quantity,
        unit,
        rest_offset,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_quantity_forms() {
        assert_eq!(parse_quantity("2"), Some(2.0));
        assert_eq!(parse_quantity("1.5"), Some(1.5));
        assert_eq!(parse_quantity("1,5"), Some(1.5));
        assert_eq!(parse_quantity("1/2"), Some(0.5));
        assert_eq!(parse_quantity("1 1/2"), Some(1.5));
        assert_eq!(parse_quantity("½"), Some(0.5));
        assert_eq!(parse_quantity("2½"), Some(2.5));
        assert_eq!(parse_quantity("1/0"), None);
        assert_eq!(parse_quantity("a few"), None);
    }

    #[test]
    fn test_canonical_unit() {
        assert_eq!(canonical_unit("Tablespoons"), Some("tbsp"));
        assert_eq!(canonical_unit("cups"), Some("cup"));
        assert_eq!(canonical_unit("oz."), Some("oz"));
        assert_eq!(canonical_unit("handful"), Some("handful"));
        assert_eq!(canonical_unit("bowl"), None);
    }

    #[test]
    fn test_leading_amount_with_unit() {
        let line = "2 cups all-purpose flour";
        let amount = leading_amount(line).unwrap();
        assert_eq!(amount.quantity, 2.0);
        assert_eq!(amount.unit, Some("cup"));
        assert_eq!(line[amount.rest_offset..].trim(), "all-purpose flour");
    }

    #[test]
    fn test_leading_amount_unit_not_prefix_of_word() {
        // "g" must not swallow the start of "garlic"
        let line = "3 garlic cloves";
        let amount = leading_amount(line).unwrap();
        assert_eq!(amount.quantity, 3.0);
        assert_eq!(amount.unit, None);
        assert_eq!(line[amount.rest_offset..].trim(), "garlic cloves");
    }

    #[test]
    fn test_leading_range_takes_lower_bound() {
        let amount = leading_amount("2-3 tbsp olive oil").unwrap();
        assert_eq!(amount.quantity, 2.0);
        assert_eq!(amount.unit, Some("tbsp"));
    }

    #[test]
    fn test_no_leading_amount() {
        assert!(leading_amount("salt and pepper").is_none());
    }
}
