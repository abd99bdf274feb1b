use mockito::Server;

use recipe_ingest::config::PipelineConfig;
use recipe_ingest::{BinaryFileRef, ImportError, InputType, Platform, RecipeImporter};

const PAGE: &str = r#"<html><head>
<script type="application/ld+json">
{"@context": "https://schema.org", "@graph": [
  {"@type": "WebPage", "name": "Lemon Bars | Example Kitchen"},
  {"@type": ["Recipe"], "name": "Lemon Bars",
   "nutrition": {"@type": "NutritionInformation", "calories": "210 calories"},
   "recipeIngredient": ["1 cup flour", "1/2 cup butter", "2 eggs"],
   "recipeInstructions": [
     {"@type": "HowToStep", "text": "Press the flour and butter into a pan."},
     {"@type": "HowToStep", "text": "Whisk the eggs with sugar and lemon juice."},
     {"@type": "HowToStep", "text": "Bake until set."}
   ]}
]}
</script></head><body></body></html>"#;

fn offline_config() -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.extraction.retry_attempts = 0;
    config.extraction.reader_proxy_url = String::new();
    config
}

#[tokio::test]
async fn test_url_import_end_to_end() {
    let mut server = Server::new_async().await;
    let _m = server
        .mock("GET", "/lemon-bars")
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body(PAGE)
        .create();

    let recipe = RecipeImporter::builder()
        .url(format!("{}/lemon-bars?utm_source=newsletter", server.url()))
        .config(offline_config())
        .build()
        .unwrap()
        .import()
        .await
        .unwrap();

    assert_eq!(recipe.detection.input_type, InputType::Url);
    assert_eq!(recipe.extraction.platform, Some(Platform::Generic));
    assert_eq!(recipe.extraction.source, format!("{}/lemon-bars", server.url()));
    assert_eq!(recipe.draft.title, "Lemon Bars");
    assert_eq!(recipe.draft.ingredients.len(), 3);
    assert_eq!(recipe.draft.instructions.len(), 3);

    for name in ["sugar", "lemon juice"] {
        assert!(
            recipe.recovery.missing_ingredients.iter().any(|m| m == name),
            "{} should be missing, got {:?}",
            name,
            recipe.recovery.missing_ingredients
        );
    }

    let json = serde_json::to_value(&recipe).unwrap();
    assert_eq!(json["detection"]["type"], "url");
    assert!(json["recovery"]["recovered_ingredients"].is_array());
    assert_eq!(json["extraction"]["nutrition"]["calories"], "210 calories");
}

#[tokio::test]
async fn test_unreachable_url_fails_extraction() {
    let mut server = Server::new_async().await;
    let _m = server.mock("GET", "/gone").with_status(404).create();

    let result = RecipeImporter::builder()
        .url(format!("{}/gone", server.url()))
        .config(offline_config())
        .build()
        .unwrap()
        .import()
        .await;

    assert!(matches!(result, Err(ImportError::ExtractionFailed { .. })));
}

#[tokio::test]
async fn test_text_file_import() {
    let text = "Iced Tea\n\nIngredients\n- 4 cups water\n- 2 tea bags\n\nInstructions\n1. Steep the tea bags in hot water.\n2. Chill and serve with lemon if desired.";
    let file = BinaryFileRef::new(text.as_bytes().to_vec()).with_name("tea.txt");

    let recipe = RecipeImporter::builder()
        .file(file)
        .config(offline_config())
        .build()
        .unwrap()
        .import()
        .await
        .unwrap();

    assert_eq!(recipe.detection.input_type, InputType::Text);
    assert_eq!(recipe.extraction.source, "tea.txt");
    assert_eq!(recipe.draft.title, "Iced Tea");
    assert_eq!(recipe.recovery.missing_ingredients, vec!["lemon"]);
    assert!(recipe.extraction.nutrition.is_empty());

    let lemon = recipe
        .recovery
        .recovered_ingredients
        .iter()
        .find(|i| i.name == "lemon")
        .unwrap();
    assert!(lemon.optional);
    assert!(lemon.inferred);
}

#[tokio::test]
async fn test_empty_text_is_invalid() {
    let result = RecipeImporter::builder()
        .text("   ")
        .build()
        .unwrap()
        .import()
        .await;
    assert!(matches!(result, Err(ImportError::InvalidInput(_))));
}
