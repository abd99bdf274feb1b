use async_trait::async_trait;
use log::debug;
use scraper::{Html, Selector};

use super::{compose_recipe_text, element_text};
use crate::error::StrategyError;
use crate::extraction::{ExtractionContext, ExtractionStrategy, StrategyOutput};

const CONFIDENCE: f64 = 0.8;

/// Class names used by common recipe card plugins (WPRM, Tasty, Mediavine
/// and friends)
const INGREDIENT_CLASSES: &[&str] = &[
    "wprm-recipe-ingredients-container",
    "wprm-recipe-ingredients",
    "tasty-recipes-ingredients",
    "mv-create-ingredients",
    "recipe-ingredients",
    "recipe-ingredient-list",
    "recipe-card-ingredients",
    "wpzoom-recipe-ingredients",
    "structured-ingredients",
    "recipe_ingredients",
];

const INSTRUCTION_CLASSES: &[&str] = &[
    "wprm-recipe-instructions-container",
    "wprm-recipe-instructions",
    "tasty-recipes-instructions",
    "mv-create-instructions",
    "recipe-instructions",
    "recipe-instruction-list",
    "recipe-card-instructions",
    "wpzoom-recipe-instructions",
    "structured-instructions",
    "recipe_instructions",
    "recipe-directions",
    "directions",
];

const INGREDIENT_FUZZY: &[&str] = &["ingredient"];
const INSTRUCTION_FUZZY: &[&str] = &["instruction", "direction", "method", "step"];

/// Page title, Open Graph fields and recipe-looking lists.
pub struct HtmlHeuristic;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageScan {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
}

impl PageScan {
    fn is_useful(&self) -> bool {
        self.description.is_some() || !self.ingredients.is_empty() || !self.instructions.is_empty()
    }
}

#[async_trait]
impl ExtractionStrategy for HtmlHeuristic {
    fn name(&self) -> &'static str {
        "html-heuristic"
    }

    async fn attempt(&self, ctx: &mut ExtractionContext) -> Result<StrategyOutput, StrategyError> {
        let page = ctx.page().await?;
        let scan = scan_page(&page);
        if !scan.is_useful() {
            return Err(StrategyError::NoContent(
                "no description or recipe lists on page".to_string(),
            ));
        }

        Ok(StrategyOutput {
            text: compose_recipe_text(
                scan.title.as_deref(),
                scan.description.as_deref(),
                &scan.ingredients,
                &scan.instructions,
            ),
            confidence: CONFIDENCE,
            title: scan.title,
            creator: None,
            image: scan.image,
            ..Default::default()
        })
    }
}

fn meta_content(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .filter_map(|el| el.value().attr("content"))
        .map(|c| c.split_whitespace().collect::<Vec<_>>().join(" "))
        .find(|c| !c.is_empty())
}

fn first_text(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .map(element_text)
        .find(|t| !t.is_empty())
}

/// `li` items under the first matching container, exact class names before
/// substring matches
fn list_items(document: &Html, exact: &[&str], fuzzy: &[&str]) -> Vec<String> {
    let selectors = exact
        .iter()
        .map(|class| format!(".{} li", class))
        .chain(fuzzy.iter().map(|pattern| format!("[class*='{}'] li", pattern)));

    for selector_str in selectors {
        let Ok(selector) = Selector::parse(&selector_str) else {
            continue;
        };
        let mut items: Vec<String> = document
            .select(&selector)
            .map(element_text)
            .filter(|t| !t.is_empty())
            .collect();
        items.dedup();
        if !items.is_empty() {
            debug!("Found {} list items with {}", items.len(), selector_str);
            return items;
        }
    }
    Vec::new()
}

pub fn scan_page(html: &str) -> PageScan {
    let document = Html::parse_document(html);

    let title = meta_content(&document, "meta[property='og:title']")
        .or_else(|| first_text(&document, "title"))
        .or_else(|| first_text(&document, "h1"));
    let description = meta_content(&document, "meta[property='og:description']")
        .or_else(|| meta_content(&document, "meta[name='description']"));
    let image = meta_content(&document, "meta[property='og:image']");

    let ingredients = list_items(&document, INGREDIENT_CLASSES, INGREDIENT_FUZZY);
    let instructions = list_items(&document, INSTRUCTION_CLASSES, INSTRUCTION_FUZZY);

    PageScan {
        title,
        description,
        image,
        ingredients,
        instructions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_graph_and_plugin_lists() {
        let html = r#"<html><head>
            <title>Ignored title</title>
            <meta property="og:title" content="Best  Brownies">
            <meta property="og:description" content="Fudgy brownies.">
            <meta property="og:image" content="https://example.com/brownie.jpg">
            </head><body>
            <div class="wprm-recipe-ingredients-container">
              <ul><li>1 cup <b>butter</b></li><li>2 cups sugar</li></ul>
            </div>
            <div class="recipe-instructions"><ol><li>Melt butter.</li><li>Bake.</li></ol></div>
            </body></html>"#;

        let scan = scan_page(html);
        assert_eq!(scan.title.as_deref(), Some("Best Brownies"));
        assert_eq!(scan.description.as_deref(), Some("Fudgy brownies."));
        assert_eq!(scan.image.as_deref(), Some("https://example.com/brownie.jpg"));
        assert_eq!(scan.ingredients, vec!["1 cup butter", "2 cups sugar"]);
        assert_eq!(scan.instructions, vec!["Melt butter.", "Bake."]);
    }

    #[test]
    fn test_fuzzy_class_and_title_fallbacks() {
        let html = r#"<html><body>
            <h1>Grandma's Stew</h1>
            <section class="my-ingredient-box"><ul><li>2 carrots</li></ul></section>
            </body></html>"#;

        let scan = scan_page(html);
        assert_eq!(scan.title.as_deref(), Some("Grandma's Stew"));
        assert_eq!(scan.ingredients, vec!["2 carrots"]);
        assert!(scan.instructions.is_empty());
        assert!(scan.is_useful());
    }

    #[test]
    fn test_title_only_is_not_useful() {
        let scan = scan_page("<html><head><title>Home</title></head><body></body></html>");
        assert_eq!(scan.title.as_deref(), Some("Home"));
        assert!(!scan.is_useful());
    }
}
