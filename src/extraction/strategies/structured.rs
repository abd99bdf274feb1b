use async_trait::async_trait;
use html_escape::decode_html_entities;
use log::debug;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::LazyLock;

use super::{compose_recipe_text, element_text};
use crate::error::StrategyError;
use crate::extraction::{ExtractionContext, ExtractionStrategy, StrategyOutput};

const CONFIDENCE: f64 = 0.9;

static TRAILING_COMMA: LazyLock<Regex> = LazyLock::new(|| Regex::new(r",\s*([}\]])").unwrap());
static HTML_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());

const NUTRITION_LABELS: &[(&str, &str)] = &[
    ("calories", "calories"),
    ("fatContent", "fat"),
    ("saturatedFatContent", "saturated fat"),
    ("transFatContent", "trans fat"),
    ("unsaturatedFatContent", "unsaturated fat"),
    ("cholesterolContent", "cholesterol"),
    ("carbohydrateContent", "carbohydrates"),
    ("sugarContent", "sugar"),
    ("fiberContent", "fiber"),
    ("proteinContent", "protein"),
    ("sodiumContent", "sodium"),
    ("servingSize", "serving size"),
];

/// Schema.org recipe data embedded in the page, JSON-LD first, then
/// microdata.
pub struct StructuredData;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructuredRecipe {
    pub title: Option<String>,
    pub description: Option<String>,
    pub creator: Option<String>,
    pub image: Option<String>,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
    pub nutrition: BTreeMap<String, String>,
}

impl StructuredRecipe {
    fn has_content(&self) -> bool {
        !self.ingredients.is_empty() || !self.instructions.is_empty()
    }

    pub fn to_text(&self) -> String {
        compose_recipe_text(
            self.title.as_deref(),
            self.description.as_deref(),
            &self.ingredients,
            &self.instructions,
        )
    }
}

#[async_trait]
impl ExtractionStrategy for StructuredData {
    fn name(&self) -> &'static str {
        "structured-data"
    }

    async fn attempt(&self, ctx: &mut ExtractionContext) -> Result<StrategyOutput, StrategyError> {
        let page = ctx.page().await?;
        let recipe = find_structured_recipe(&page)
            .ok_or_else(|| StrategyError::NoContent("no JSON-LD or microdata recipe".to_string()))?;

        Ok(StrategyOutput {
            text: recipe.to_text(),
            confidence: CONFIDENCE,
            title: recipe.title,
            creator: recipe.creator,
            image: recipe.image,
            nutrition: recipe.nutrition,
            fallback_used: false,
        })
    }
}

pub fn find_structured_recipe(html: &str) -> Option<StructuredRecipe> {
    let document = Html::parse_document(html);
    from_json_ld(&document).or_else(|| from_microdata(&document))
}

fn from_json_ld(document: &Html) -> Option<StructuredRecipe> {
    let selector = Selector::parse("script[type='application/ld+json']").unwrap();

    for (index, script) in document.select(&selector).enumerate() {
        let raw = script.inner_html();
        let json: Value = match serde_json::from_str(raw.trim()) {
            Ok(json) => json,
            Err(_) => match serde_json::from_str(&TRAILING_COMMA.replace_all(raw.trim(), "$1")) {
                Ok(json) => json,
                Err(e) => {
                    debug!("Skipping unparseable JSON-LD block {}: {}", index, e);
                    continue;
                }
            },
        };

        if let Some(node) = find_recipe_node(&json) {
            let recipe = recipe_from_json(node);
            if recipe.has_content() {
                debug!("Found JSON-LD recipe in block {}", index);
                return Some(recipe);
            }
        }
    }
    None
}

/// Depth-first search through arrays and `@graph` containers
fn find_recipe_node(value: &Value) -> Option<&Value> {
    match value {
        Value::Array(items) => items.iter().find_map(find_recipe_node),
        Value::Object(map) => {
            if is_recipe_type(value) {
                Some(value)
            } else {
                map.get("@graph").and_then(find_recipe_node)
            }
        }
        _ => None,
    }
}

fn is_recipe_type(value: &Value) -> bool {
    let names_recipe = |t: &str| {
        t.rsplit(['/', ':'])
            .next()
            .is_some_and(|name| name.eq_ignore_ascii_case("recipe"))
    };
    match value.get("@type") {
        Some(Value::String(t)) => names_recipe(t),
        Some(Value::Array(types)) => types.iter().filter_map(Value::as_str).any(names_recipe),
        _ => false,
    }
}

fn recipe_from_json(node: &Value) -> StructuredRecipe {
    let ingredients_value = node
        .get("recipeIngredient")
        .or_else(|| node.get("ingredients"));
    let mut ingredients = Vec::new();
    if let Some(value) = ingredients_value {
        collect_ingredients(value, &mut ingredients);
    }

    let mut instructions = Vec::new();
    if let Some(value) = node.get("recipeInstructions") {
        collect_steps(value, &mut instructions);
    }

    StructuredRecipe {
        title: node.get("name").and_then(Value::as_str).and_then(clean),
        description: node.get("description").and_then(|d| match d {
            Value::String(s) => clean(s),
            other => other.get("text").and_then(Value::as_str).and_then(clean),
        }),
        creator: node.get("author").and_then(author_name),
        image: node.get("image").and_then(image_url),
        ingredients,
        instructions,
        nutrition: node.get("nutrition").map(nutrition_facts).unwrap_or_default(),
    }
}

fn nutrition_label(property: &str) -> String {
    NUTRITION_LABELS
        .iter()
        .find(|(name, _)| *name == property)
        .map(|(_, label)| label.to_string())
        .unwrap_or_else(|| property.to_string())
}

/// Labelled values of a NutritionInformation object. JSON-LD keywords and
/// values that are not text or numbers are skipped.
fn nutrition_facts(value: &Value) -> BTreeMap<String, String> {
    let Some(map) = value.as_object() else {
        return BTreeMap::new();
    };
    map.iter()
        .filter(|(key, _)| !key.starts_with('@'))
        .filter_map(|(key, value)| {
            let text = match value {
                Value::String(s) => clean(s)?,
                Value::Number(n) => n.to_string(),
                _ => return None,
            };
            Some((nutrition_label(key), text))
        })
        .collect()
}

fn collect_ingredients(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) => out.extend(s.lines().filter_map(clean)),
        Value::Array(items) => items.iter().for_each(|item| collect_ingredients(item, out)),
        Value::Object(_) => {
            let name = value.get("name").and_then(Value::as_str).and_then(clean);
            let amount = value.get("amount").and_then(Value::as_str).and_then(clean);
            match (amount, name) {
                (Some(amount), Some(name)) => out.push(format!("{} {}", amount, name)),
                (None, Some(name)) => out.push(name),
                _ => {}
            }
        }
        _ => {}
    }
}

/// Flatten plain strings, HowToStep objects and HowToSection lists
fn collect_steps(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) => out.extend(s.lines().filter_map(clean)),
        Value::Array(items) => items.iter().for_each(|item| collect_steps(item, out)),
        Value::Object(_) => {
            if let Some(items) = value.get("itemListElement") {
                collect_steps(items, out);
                return;
            }
            let text = value
                .get("text")
                .or_else(|| value.get("name"))
                .and_then(Value::as_str)
                .and_then(clean);
            out.extend(text);
        }
        _ => {}
    }
}

fn author_name(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => clean(s),
        Value::Array(items) => {
            let names: Vec<String> = items.iter().filter_map(author_name).collect();
            if names.is_empty() {
                None
            } else {
                Some(names.join(", "))
            }
        }
        other => other.get("name").and_then(Value::as_str).and_then(clean),
    }
}

fn image_url(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => clean(s),
        Value::Array(items) => items.iter().find_map(image_url),
        other => other.get("url").and_then(Value::as_str).and_then(clean),
    }
}

/// Decode entities (some sites double-encode), strip tags, squeeze
/// whitespace. Empty results become None.
fn clean(text: &str) -> Option<String> {
    let decoded = decode_html_entities(&decode_html_entities(text)).into_owned();
    let stripped = HTML_TAG.replace_all(&decoded, " ");
    let squeezed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
    if squeezed.is_empty() {
        None
    } else {
        Some(squeezed)
    }
}

fn find_microdata_container(document: &Html) -> Option<ElementRef<'_>> {
    let selector = Selector::parse("[itemscope][itemtype]").unwrap();
    document.select(&selector).find(|element| {
        element.value().attr("itemtype").is_some_and(|itemtype| {
            itemtype
                .split_whitespace()
                .any(|t| t.trim_end_matches('/').to_ascii_lowercase().ends_with("/recipe"))
        })
    })
}

/// `content` attribute for meta-style props, otherwise visible text
fn itemprop_value(element: ElementRef) -> Option<String> {
    element
        .value()
        .attr("content")
        .and_then(clean)
        .or_else(|| Some(element_text(element)).filter(|t| !t.is_empty()))
}

fn itemprops<'a>(root: ElementRef<'a>, prop: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(&format!("[itemprop='{}']", prop)) {
        Ok(selector) => root.select(&selector).collect(),
        Err(_) => Vec::new(),
    }
}

fn from_microdata(document: &Html) -> Option<StructuredRecipe> {
    let container = find_microdata_container(document)?;
    let first = |prop: &str| itemprops(container, prop).into_iter().find_map(itemprop_value);

    let mut ingredients: Vec<String> = itemprops(container, "recipeIngredient")
        .into_iter()
        .filter_map(itemprop_value)
        .collect();
    if ingredients.is_empty() {
        ingredients = itemprops(container, "ingredients")
            .into_iter()
            .filter_map(itemprop_value)
            .collect();
    }

    let li = Selector::parse("li").unwrap();
    let mut instructions = Vec::new();
    for element in itemprops(container, "recipeInstructions") {
        let items: Vec<String> = element
            .select(&li)
            .map(element_text)
            .filter(|t| !t.is_empty())
            .collect();
        if items.is_empty() {
            instructions.extend(itemprop_value(element));
        } else {
            instructions.extend(items);
        }
    }

    let image = itemprops(container, "image").into_iter().find_map(|el| {
        el.value()
            .attr("src")
            .or_else(|| el.value().attr("content"))
            .and_then(clean)
    });

    let name_selector = Selector::parse("[itemprop='name']").unwrap();
    let creator = itemprops(container, "author").into_iter().find_map(|author| {
        let target = author.select(&name_selector).next().unwrap_or(author);
        itemprop_value(target)
    });

    // The recipe's own name, not one nested inside the author
    let title = itemprops(container, "name")
        .into_iter()
        .find(|el| {
            !el.ancestors()
                .filter_map(ElementRef::wrap)
                .take_while(|a| a.id() != container.id())
                .any(|a| a.value().attr("itemprop") == Some("author"))
        })
        .and_then(itemprop_value);

    let item_prop = Selector::parse("[itemprop]").unwrap();
    let mut nutrition = BTreeMap::new();
    for block in itemprops(container, "nutrition") {
        for fact in block.select(&item_prop) {
            if let (Some(key), Some(value)) = (fact.value().attr("itemprop"), itemprop_value(fact)) {
                nutrition.entry(nutrition_label(key)).or_insert(value);
            }
        }
    }

    let recipe = StructuredRecipe {
        title,
        description: first("description"),
        creator,
        image,
        ingredients,
        instructions,
        nutrition,
    };
    recipe.has_content().then_some(recipe)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(json_ld: &str) -> String {
        format!(
            r#"<!DOCTYPE html><html><head>
            <script type="application/ld+json">{json_ld}</script>
            </head><body></body></html>"#
        )
    }

    #[test]
    fn test_top_level_recipe() {
        let html = page(
            r#"{
                "@context": "https://schema.org/",
                "@type": "Recipe",
                "name": "Mac &amp; Cheese",
                "author": {"@type": "Person", "name": "Jane"},
                "image": ["https://example.com/a.jpg", "https://example.com/b.jpg"],
                "recipeIngredient": ["2 cups macaroni", "1 cup cheddar"],
                "recipeInstructions": [
                    {"@type": "HowToStep", "text": "Boil the macaroni."},
                    {"@type": "HowToStep", "text": "Stir in the <b>cheddar</b> well."}
                ]
            }"#,
        );
        let recipe = find_structured_recipe(&html).unwrap();
        assert_eq!(recipe.title.as_deref(), Some("Mac & Cheese"));
        assert_eq!(recipe.creator.as_deref(), Some("Jane"));
        assert_eq!(recipe.image.as_deref(), Some("https://example.com/a.jpg"));
        assert_eq!(recipe.ingredients, vec!["2 cups macaroni", "1 cup cheddar"]);
        assert_eq!(recipe.instructions, vec!["Boil the macaroni.", "Stir in the cheddar well."]);
    }

    #[test]
    fn test_graph_and_type_array() {
        let html = page(
            r#"{
                "@context": "https://schema.org",
                "@graph": [
                    {"@type": "WebPage", "name": "Site"},
                    {"@type": ["RECIPE", "NewsArticle"], "name": "Soup",
                     "recipeIngredient": ["1 onion"],
                     "recipeInstructions": [{"@type": "HowToSection", "name": "Prep",
                        "itemListElement": [{"@type": "HowToStep", "text": "Chop the onion."}]}]}
                ]
            }"#,
        );
        let recipe = find_structured_recipe(&html).unwrap();
        assert_eq!(recipe.title.as_deref(), Some("Soup"));
        assert_eq!(recipe.instructions, vec!["Chop the onion."]);
    }

    #[test]
    fn test_array_root_and_trailing_comma() {
        let html = page(
            r#"[{"@type": "Organization", "name": "Org"},
                {"@type": "Recipe", "name": "Toast", "recipeIngredient": ["1 slice bread",],}]"#,
        );
        let recipe = find_structured_recipe(&html).unwrap();
        assert_eq!(recipe.ingredients, vec!["1 slice bread"]);
    }

    #[test]
    fn test_microdata_recipe() {
        let html = r#"<html><body>
            <div itemscope itemtype="http://schema.org/Recipe">
              <h1 itemprop="name">Lemonade</h1>
              <span itemprop="author" itemscope itemtype="http://schema.org/Person">
                <span itemprop="name">Sam</span>
              </span>
              <img itemprop="image" src="https://example.com/lemon.jpg">
              <ul>
                <li itemprop="recipeIngredient">4 lemons</li>
                <li itemprop="recipeIngredient">1 cup sugar</li>
              </ul>
              <ol itemprop="recipeInstructions">
                <li>Squeeze the lemons.</li>
                <li>Stir in sugar and water.</li>
              </ol>
            </div></body></html>"#;
        let recipe = find_structured_recipe(html).unwrap();
        assert_eq!(recipe.title.as_deref(), Some("Lemonade"));
        assert_eq!(recipe.creator.as_deref(), Some("Sam"));
        assert_eq!(recipe.image.as_deref(), Some("https://example.com/lemon.jpg"));
        assert_eq!(recipe.ingredients, vec!["4 lemons", "1 cup sugar"]);
        assert_eq!(
            recipe.instructions,
            vec!["Squeeze the lemons.", "Stir in sugar and water."]
        );
    }

    #[test]
    fn test_json_ld_nutrition() {
        let html = page(
            r#"{
                "@type": "Recipe",
                "name": "Granola",
                "recipeIngredient": ["3 cups oats"],
                "nutrition": {
                    "@type": "NutritionInformation",
                    "calories": "270 calories",
                    "proteinContent": "6 g",
                    "servingSize": 1,
                    "fatContent": "",
                    "sugarContent": {"value": 9}
                }
            }"#,
        );
        let recipe = find_structured_recipe(&html).unwrap();
        let facts: Vec<(&str, &str)> = recipe
            .nutrition
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        assert_eq!(
            facts,
            vec![("calories", "270 calories"), ("protein", "6 g"), ("serving size", "1")]
        );
    }

    #[test]
    fn test_microdata_nutrition() {
        let html = r#"<html><body>
            <div itemscope itemtype="https://schema.org/Recipe">
              <h1 itemprop="name">Flapjacks</h1>
              <span itemprop="recipeIngredient">2 cups oats</span>
              <div itemprop="nutrition" itemscope itemtype="https://schema.org/NutritionInformation">
                <span itemprop="calories">310 kcal</span>
                <meta itemprop="fatContent" content="14 g">
              </div>
            </div></body></html>"#;
        let recipe = find_structured_recipe(html).unwrap();
        assert_eq!(recipe.nutrition.len(), 2);
        assert_eq!(recipe.nutrition["calories"], "310 kcal");
        assert_eq!(recipe.nutrition["fat"], "14 g");
    }

    #[test]
    fn test_no_recipe() {
        let html = page(r#"{"@type": "WebSite", "name": "Blog"}"#);
        assert!(find_structured_recipe(&html).is_none());
        assert!(find_structured_recipe("<html><body><p>hi</p></body></html>").is_none());
    }
}
