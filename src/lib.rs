//! Recipe ingestion: turn a URL, pasted text or an uploaded image into a
//! structured, confidence-scored recipe.
//!
//! The stages run in order: [`InputClassifier`] decides what the input is,
//! [`ContentExtractor`] turns it into raw text (OCR for images),
//! [`RecipeParser`] drafts a recipe, and [`IngredientRecovery`] cross-checks
//! the ingredients against the instructions. [`RecipeImporter`] drives them.

pub mod classifier;
pub mod config;
pub mod error;
pub mod extraction;
pub mod model;
pub mod ocr;
pub mod parser;
pub mod pipeline;
pub mod providers;
pub mod recovery;

pub use classifier::{validate_text, InputClassifier, TextValidation};
pub use config::PipelineConfig;
pub use error::{ImportError, StrategyError};
pub use extraction::{ContentExtractor, ExtractionStrategy};
pub use model::{
    BinaryFileRef, DetectionResult, DraftRecipe, ExtractionResult, ImportInput, ImportedRecipe,
    Ingredient, InputType, OcrResult, Platform, RecoveryResult,
};
pub use ocr::{OcrEngine, OcrOptions, OcrProvider};
pub use parser::RecipeParser;
pub use pipeline::{import_recipe, InputSource, RecipeImporter, RecipeImporterBuilder};
pub use providers::{ChatMessage, CompletionProvider};
pub use recovery::{IngredientMatcher, IngredientRecovery, LexiconMatcher, RecoveryOptions};
