use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;

use crate::classifier::{validate_text, InputClassifier};
use crate::config::PipelineConfig;
use crate::error::ImportError;
use crate::extraction::ContentExtractor;
use crate::model::{BinaryFileRef, ImportInput, ImportedRecipe, InputType};
use crate::ocr::{OcrEngine, OcrOptions};
use crate::parser::RecipeParser;
use crate::providers::{CompletionProvider, FallbackProvider};
use crate::recovery::{IngredientRecovery, RecoveryOptions};

/// Represents the input source for a recipe
#[derive(Debug, Clone)]
pub enum InputSource {
    /// Must classify as a URL
    Url(String),
    /// Free text; a pasted link is still treated as a URL
    Text(String),
    /// Uploaded photo, screenshot, video or text file
    File(BinaryFileRef),
}

impl InputSource {
    fn to_input(&self) -> ImportInput {
        match self {
            InputSource::Url(url) => ImportInput::Text(url.clone()),
            InputSource::Text(text) => ImportInput::Text(text.clone()),
            InputSource::File(file) => ImportInput::File(file.clone()),
        }
    }
}

/// Builder for configuring a recipe import
#[derive(Default)]
pub struct RecipeImporterBuilder {
    source: Option<InputSource>,
    config: Option<PipelineConfig>,
    completion: Option<Arc<dyn CompletionProvider>>,
    ocr_engine: Option<OcrEngine>,
    recovery_options: Option<RecoveryOptions>,
    timeout: Option<Duration>,
}

impl RecipeImporterBuilder {
    /// Import from a URL
    ///
    /// # Example
    /// ```
    /// use recipe_ingest::RecipeImporter;
    ///
    /// let builder = RecipeImporter::builder()
    ///     .url("https://example.com/recipe");
    /// ```
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.source = Some(InputSource::Url(url.into()));
        self
    }

    /// Import from pasted text
    ///
    /// # Example
    /// ```
    /// use recipe_ingest::RecipeImporter;
    ///
    /// let builder = RecipeImporter::builder()
    ///     .text("Ingredients\n- 2 eggs\n- 1 cup flour\n\nInstructions\n1. Mix and bake.");
    /// ```
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.source = Some(InputSource::Text(text.into()));
        self
    }

    /// Import from an uploaded file. Images go through OCR.
    pub fn file(mut self, file: BinaryFileRef) -> Self {
        self.source = Some(InputSource::File(file));
        self
    }

    /// Use this configuration instead of the defaults
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Inject the AI capability used for quantity inference.
    ///
    /// Without one, a provider chain is built from the `ai` configuration
    /// when `use_ai_for_inference` is enabled.
    pub fn completion_provider(mut self, provider: Arc<dyn CompletionProvider>) -> Self {
        self.completion = Some(provider);
        self
    }

    /// Replace the OCR engine built from the `ocr` configuration
    pub fn ocr_engine(mut self, engine: OcrEngine) -> Self {
        self.ocr_engine = Some(engine);
        self
    }

    pub fn recovery_options(mut self, options: RecoveryOptions) -> Self {
        self.recovery_options = Some(options);
        self
    }

    /// Set a timeout for HTTP requests
    ///
    /// # Example
    /// ```
    /// use recipe_ingest::RecipeImporter;
    /// use std::time::Duration;
    ///
    /// let builder = RecipeImporter::builder()
    ///     .url("https://example.com/recipe")
    ///     .timeout(Duration::from_secs(30));
    /// ```
    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    /// Validate the builder and assemble the pipeline
    ///
    /// # Errors
    /// Returns `ImportError::BuilderError` if no input source was specified,
    /// or `ImportError::FetchError` if the HTTP client cannot be created.
    pub fn build(self) -> Result<RecipeImporter, ImportError> {
        let source = self.source.ok_or_else(|| {
            ImportError::BuilderError(
                "No input source specified. Use .url(), .text() or .file()".to_string(),
            )
        })?;

        let mut config = self.config.unwrap_or_default();
        if let Some(timeout) = self.timeout {
            config.extraction.timeout = timeout.as_secs().max(1);
        }
        if let Some(options) = self.recovery_options {
            config.recovery = options;
        }

        let ocr = self
            .ocr_engine
            .unwrap_or_else(|| OcrEngine::from_config(&config.ocr));
        let extractor =
            ContentExtractor::new(&config.extraction, ocr, OcrOptions::from_config(&config.ocr))?;

        let completion = match self.completion {
            Some(provider) => Some(provider),
            None if config.recovery.use_ai_for_inference => {
                match FallbackProvider::new(&config.ai) {
                    Ok(provider) => Some(Arc::new(provider) as Arc<dyn CompletionProvider>),
                    Err(e) => {
                        warn!("AI inference disabled, no completion provider: {}", e);
                        None
                    }
                }
            }
            None => None,
        };
        let mut recovery = IngredientRecovery::new();
        if let Some(provider) = completion {
            recovery = recovery.with_completion_provider(provider);
        }

        Ok(RecipeImporter {
            source,
            extractor,
            recovery,
            recovery_options: config.recovery,
        })
    }
}

/// A configured import, ready to run
pub struct RecipeImporter {
    source: InputSource,
    extractor: ContentExtractor,
    recovery: IngredientRecovery,
    recovery_options: RecoveryOptions,
}

impl RecipeImporter {
    /// Creates a new builder for importing recipes
    ///
    /// # Example
    /// ```
    /// use recipe_ingest::RecipeImporter;
    ///
    /// let builder = RecipeImporter::builder();
    /// ```
    pub fn builder() -> RecipeImporterBuilder {
        RecipeImporterBuilder::default()
    }

    /// Run classify, extract, parse and recover
    ///
    /// # Errors
    /// - `InvalidInput` when text fails validation or a `.url()` source is
    ///   not a URL
    /// - `ExtractionFailed` when no strategy produced text
    /// - `OcrFailed` when no OCR provider could read the image
    ///
    /// # Example
    /// ```no_run
    /// # use recipe_ingest::RecipeImporter;
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let recipe = RecipeImporter::builder()
    ///     .url("https://example.com/recipe")
    ///     .build()?
    ///     .import()
    ///     .await?;
    /// println!("{}", recipe.draft.title);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn import(&self) -> Result<ImportedRecipe, ImportError> {
        let input = self.source.to_input();
        let detection = InputClassifier::classify(&input);

        if matches!(self.source, InputSource::Url(_)) && detection.input_type != InputType::Url {
            return Err(ImportError::InvalidInput(
                "the given source is not a web URL".to_string(),
            ));
        }

        if detection.input_type == InputType::Text {
            let text = match &input {
                ImportInput::Text(text) => text.clone(),
                ImportInput::File(file) => String::from_utf8_lossy(&file.data).into_owned(),
            };
            let validation = validate_text(&text);
            for warning in &validation.warnings {
                warn!("{}", warning);
            }
            if !validation.is_valid {
                return Err(ImportError::InvalidInput(validation.issues.join("; ")));
            }
        }

        let extraction = self.extractor.extract(&input, &detection).await?;
        debug!(
            "Extracted {} characters via {:?}",
            extraction.raw_text.len(),
            extraction.metadata.extraction_methods
        );

        let draft = RecipeParser::parse(&extraction.raw_text);
        let recovery = self
            .recovery
            .recover(
                &draft.ingredients,
                &draft.instructions,
                &extraction.raw_text,
                &self.recovery_options,
            )
            .await;
        info!(
            "Imported '{}' with {} ingredients (confidence {:.2})",
            draft.title,
            recovery.recovered_ingredients.len(),
            recovery.confidence
        );

        Ok(ImportedRecipe {
            detection,
            fallback_used: extraction.fallback_used,
            extraction: extraction.metadata,
            draft,
            recovery,
        })
    }
}

/// Import a URL or pasted text using `config.toml` and the environment
///
/// # Example
/// ```no_run
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let recipe = recipe_ingest::import_recipe("https://example.com/recipe").await?;
/// # Ok(())
/// # }
/// ```
pub async fn import_recipe(input: &str) -> Result<ImportedRecipe, ImportError> {
    RecipeImporter::builder()
        .text(input)
        .config(PipelineConfig::load()?)
        .build()?
        .import()
        .await
}
