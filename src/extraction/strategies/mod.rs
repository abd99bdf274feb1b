mod html_heuristic;
mod oembed;
mod reader_proxy;
mod structured;

pub use html_heuristic::{scan_page, HtmlHeuristic, PageScan};
pub use oembed::PlatformOembed;
pub use reader_proxy::ReaderProxy;
pub use structured::{find_structured_recipe, StructuredData, StructuredRecipe};

use scraper::ElementRef;

/// Visible text of an element with whitespace runs collapsed
pub(crate) fn element_text(element: ElementRef) -> String {
    element.text().collect::<Vec<_>>().join(" ").split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lay recipe parts out the way the line parser expects them
pub(crate) fn compose_recipe_text(
    title: Option<&str>,
    description: Option<&str>,
    ingredients: &[String],
    instructions: &[String],
) -> String {
    let mut blocks = Vec::new();

    if let Some(title) = title.filter(|t| !t.is_empty()) {
        blocks.push(title.to_string());
    }
    if let Some(description) = description.filter(|d| !d.is_empty()) {
        blocks.push(description.to_string());
    }
    if !ingredients.is_empty() {
        let mut block = String::from("Ingredients");
        for item in ingredients {
            block.push_str("\n- ");
            block.push_str(item);
        }
        blocks.push(block);
    }
    if !instructions.is_empty() {
        let mut block = String::from("Instructions");
        for (i, step) in instructions.iter().enumerate() {
            block.push_str(&format!("\n{}. {}", i + 1, step));
        }
        blocks.push(block);
    }

    blocks.join("\n\n")
}
