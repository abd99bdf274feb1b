use regex::Regex;
use std::sync::LazyLock;

static INLINE_WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t\u{a0}]+").unwrap());
static BLANK_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

/// Fixed set of common misrecognitions: (pattern, replacement)
static SUBSTITUTIONS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        // "f|our" -> "flour"
        (r"([A-Za-z])\|([A-Za-z])", "${1}l${2}"),
        // "|emon" -> "lemon"
        (r"(^|\s)\|([a-z]{2,})", "${1}l${2}"),
        // "t0mato" -> "tomato"
        (r"([A-Za-z])0([A-Za-z])", "${1}o${2}"),
        // "2 1bs" -> "2 lbs"
        (r"(\d)\s+1b(s?)\b", "${1} lb${2}"),
        // "8 0z" -> "8 oz"
        (r"(\d)\s+0z\b", "${1} oz"),
    ]
    .into_iter()
    .map(|(pattern, replacement)| (Regex::new(pattern).unwrap(), replacement))
    .collect()
});

/// Clean raw provider text: squeeze whitespace, collapse blank lines, fix
/// common misreads.
pub fn clean_text(raw: &str) -> String {
    let normalized = raw.replace("\r\n", "\n").replace('\r', "\n");
    let lines: Vec<String> = normalized
        .lines()
        .map(|line| INLINE_WHITESPACE.replace_all(line, " ").trim().to_string())
        .collect();
    let joined = lines.join("\n");
    let mut text = BLANK_RUNS.replace_all(&joined, "\n\n").trim().to_string();

    for (pattern, replacement) in SUBSTITUTIONS.iter() {
        // Matches cannot overlap, so "a|b|c" needs a second pass
        for _ in 0..2 {
            let replaced = pattern.replace_all(&text, *replacement).into_owned();
            if replaced == text {
                break;
            }
            text = replaced;
        }
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_whitespace_and_blank_lines() {
        let raw = "Pancakes   \t mix\n\n\n\n2  cups\tflour\n";
        assert_eq!(clean_text(raw), "Pancakes mix\n\n2 cups flour");
    }

    #[test]
    fn test_fixes_vertical_bar() {
        assert_eq!(clean_text("1 cup f|our"), "1 cup flour");
        assert_eq!(clean_text("juice of 1 |emon"), "juice of 1 lemon");
        assert_eq!(clean_text("a|b|c"), "alblc");
    }

    #[test]
    fn test_fixes_zero_and_pounds() {
        assert_eq!(clean_text("2 t0matoes"), "2 tomatoes");
        assert_eq!(clean_text("2 1bs beef"), "2 lbs beef");
        assert_eq!(clean_text("8 0z cheese"), "8 oz cheese");
    }

    #[test]
    fn test_leaves_numbers_alone() {
        assert_eq!(clean_text("Bake at 180C for 20 minutes"), "Bake at 180C for 20 minutes");
        assert_eq!(clean_text("Table | Chair"), "Table | Chair");
    }
}
