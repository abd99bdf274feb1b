//! Food nouns recognized in instruction text.

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Canonical food terms, singular
const FOOD_TERMS: &[&str] = &[
    // multi-word
    "all purpose flour", "baking powder", "baking soda", "bell pepper", "brown sugar",
    "chicken breast", "chicken stock", "beef stock", "vegetable stock", "chili flake",
    "coconut milk", "cream cheese", "green onion", "heavy cream", "lemon juice", "lime juice",
    "maple syrup", "olive oil", "powdered sugar", "red onion", "sesame oil", "soy sauce",
    "sour cream", "tomato paste", "vanilla extract", "vegetable oil", "fish sauce",
    "ground beef", "parmesan cheese", "cheddar cheese",
    // single word
    "almond", "apple", "avocado", "bacon", "banana", "basil", "bean", "beef", "bread",
    "breadcrumb", "broccoli", "broth", "butter", "buttermilk", "cabbage", "carrot", "cauliflower",
    "celery", "cheddar", "cheese", "chicken", "chickpea", "chili", "chive", "chocolate",
    "cinnamon", "cocoa", "coriander", "corn", "cornstarch", "cream", "cucumber", "cumin", "dill",
    "egg", "eggplant", "feta", "flour", "garlic", "ginger", "honey", "kale", "ketchup", "leek",
    "lemon", "lentil", "lettuce", "lime", "mayonnaise", "milk", "mint", "mozzarella", "mushroom",
    "mustard", "noodle", "nutmeg", "oat", "oil", "onion", "oregano", "paprika", "parmesan",
    "parsley", "pasta", "pea", "peanut", "pepper", "pork", "potato", "rice", "rosemary", "salmon",
    "salt", "sausage", "shallot", "shrimp", "spinach", "stock", "sugar", "thyme", "tofu",
    "tomato", "tortilla", "turmeric", "vinegar", "walnut", "yeast", "yogurt", "zucchini",
];

/// Regional or variant names mapped to a canonical term
const SYNONYMS: &[(&str, &str)] = &[
    ("scallion", "green onion"),
    ("spring onion", "green onion"),
    ("cilantro", "coriander"),
    ("courgette", "zucchini"),
    ("aubergine", "eggplant"),
    ("capsicum", "bell pepper"),
    ("garbanzo", "chickpea"),
    ("prawn", "shrimp"),
    ("double cream", "heavy cream"),
    ("icing sugar", "powdered sugar"),
    ("confectioners sugar", "powdered sugar"),
    ("bicarbonate of soda", "baking soda"),
    ("black pepper", "pepper"),
    ("sea salt", "salt"),
    ("kosher salt", "salt"),
    ("plain flour", "all purpose flour"),
    ("cornflour", "cornstarch"),
    ("yoghurt", "yogurt"),
    ("stock cube", "stock"),
];

pub const MAX_PHRASE_WORDS: usize = 3;

/// Every known spelling (term or synonym) to its canonical term
static LOOKUP: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    let mut lookup: HashMap<&'static str, &'static str> =
        FOOD_TERMS.iter().map(|term| (*term, *term)).collect();
    lookup.extend(SYNONYMS.iter().copied());
    lookup
});

static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[a-z]+").unwrap());

#[derive(Debug, Clone, PartialEq)]
pub struct Mention {
    pub term: &'static str,
    /// Byte offset in the lowercased text
    pub position: usize,
}

/// Lowercase words and their byte offsets
pub fn words(text: &str) -> Vec<(String, usize)> {
    let lowered = text.to_lowercase();
    WORD.find_iter(&lowered)
        .map(|m| (m.as_str().to_string(), m.start()))
        .collect()
}

/// Simple plural folding: "tomatoes" -> "tomato", "berries" -> "berry",
/// "eggs" -> "egg". Words ending in "ss" or "us" are left alone.
pub fn singular(word: &str) -> String {
    if word.len() > 4 && word.ends_with("ies") {
        return format!("{}y", &word[..word.len() - 3]);
    }
    if word.len() > 3 && word.ends_with("oes") {
        return word[..word.len() - 2].to_string();
    }
    if word.len() > 3
        && (word.ends_with("ches") || word.ends_with("shes") || word.ends_with("xes"))
    {
        return word[..word.len() - 2].to_string();
    }
    if word.len() > 2 && word.ends_with('s') && !word.ends_with("ss") && !word.ends_with("us") {
        return word[..word.len() - 1].to_string();
    }
    word.to_string()
}

/// Canonical term for a phrase, trying it as written and with the last
/// word singularized
pub fn canonical(phrase: &str) -> Option<&'static str> {
    if let Some(term) = LOOKUP.get(phrase) {
        return Some(*term);
    }
    let (head, last) = match phrase.rsplit_once(' ') {
        Some((head, last)) => (Some(head), last),
        None => (None, phrase),
    };
    let folded = singular(last);
    let candidate = match head {
        Some(head) => format!("{} {}", head, folded),
        None => folded,
    };
    LOOKUP.get(candidate.as_str()).copied()
}

/// Food mentions in reading order. Longer phrases win over the words they
/// contain, so "olive oil" is one mention rather than "olive" plus "oil".
pub fn find_mentions(text: &str) -> Vec<Mention> {
    let words = words(text);
    let mut mentions = Vec::new();
    let mut i = 0;

    while i < words.len() {
        let mut matched = None;
        for len in (1..=MAX_PHRASE_WORDS.min(words.len() - i)).rev() {
            let phrase = words[i..i + len]
                .iter()
                .map(|(w, _)| w.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            if let Some(term) = canonical(&phrase) {
                matched = Some((term, len));
                break;
            }
        }

        match matched {
            Some((term, len)) => {
                mentions.push(Mention {
                    term,
                    position: words[i].1,
                });
                i += len;
            }
            None => i += 1,
        }
    }
    mentions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_singular() {
        assert_eq!(singular("tomatoes"), "tomato");
        assert_eq!(singular("berries"), "berry");
        assert_eq!(singular("eggs"), "egg");
        assert_eq!(singular("peaches"), "peach");
        assert_eq!(singular("hummus"), "hummus");
        assert_eq!(singular("glass"), "glass");
        assert_eq!(singular("asparagus"), "asparagus");
    }

    #[test]
    fn test_multi_word_first() {
        let terms: Vec<&str> = find_mentions("Heat the olive oil, then add onions and 2 Eggs.")
            .into_iter()
            .map(|m| m.term)
            .collect();
        assert_eq!(terms, vec!["olive oil", "onion", "egg"]);
    }

    #[test]
    fn test_synonyms_map_to_canonical() {
        let terms: Vec<&str> = find_mentions("Top with scallions, cilantro and black pepper")
            .into_iter()
            .map(|m| m.term)
            .collect();
        assert_eq!(terms, vec!["green onion", "coriander", "pepper"]);
    }

    #[test]
    fn test_positions_are_byte_offsets() {
        let mentions = find_mentions("Mix flour with salt");
        assert_eq!(mentions[0].position, 4);
        assert_eq!(mentions[1].position, 15);
    }
}
