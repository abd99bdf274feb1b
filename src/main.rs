use log::{debug, error};
use std::env;
use std::path::Path;

use recipe_ingest::{BinaryFileRef, PipelineConfig, RecipeImporter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let input = args
        .get(1)
        .ok_or("Usage: recipe-ingest <url|text|path>")?;

    let config = PipelineConfig::load()?;
    let builder = RecipeImporter::builder().config(config);

    let path = Path::new(input);
    let builder = if path.is_file() {
        let data = tokio::fs::read(path).await?;
        let mut file = BinaryFileRef::new(data);
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            file = file.with_name(name);
        }
        debug!("Reading recipe from file {}", path.display());
        builder.file(file)
    } else {
        builder.text(input.as_str())
    };

    match builder.build()?.import().await {
        Ok(recipe) => {
            println!("{}", serde_json::to_string_pretty(&recipe)?);
            Ok(())
        }
        Err(e) => {
            error!("Import failed: {}", e);
            Err(e.into())
        }
    }
}
