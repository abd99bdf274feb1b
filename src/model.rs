use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Raw artifact handed to the importer
#[derive(Debug, Clone)]
pub enum ImportInput {
    /// A URL, a bare domain, or free-form recipe text
    Text(String),
    /// An uploaded file (photo, screenshot, video)
    File(BinaryFileRef),
}

impl ImportInput {
    pub fn text(text: impl Into<String>) -> Self {
        ImportInput::Text(text.into())
    }
}

/// Reference to an uploaded binary file
#[derive(Debug, Clone, Default)]
pub struct BinaryFileRef {
    pub name: Option<String>,
    /// Declared media type, e.g. "image/jpeg"
    pub mime_type: Option<String>,
    pub size: Option<u64>,
    pub data: Vec<u8>,
}

impl BinaryFileRef {
    pub fn new(data: Vec<u8>) -> Self {
        let size = Some(data.len() as u64);
        Self {
            size,
            data,
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    Url,
    Text,
    Image,
    Video,
}

/// Sites with a known URL signature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Tiktok,
    Instagram,
    Youtube,
    Facebook,
    Pinterest,
    Allrecipes,
    FoodNetwork,
    BbcGoodFood,
    SeriousEats,
    Epicurious,
    BonAppetit,
    NytCooking,
    Tasty,
    Generic,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Tiktok => "tiktok",
            Platform::Instagram => "instagram",
            Platform::Youtube => "youtube",
            Platform::Facebook => "facebook",
            Platform::Pinterest => "pinterest",
            Platform::Allrecipes => "allrecipes",
            Platform::FoodNetwork => "food_network",
            Platform::BbcGoodFood => "bbc_good_food",
            Platform::SeriousEats => "serious_eats",
            Platform::Epicurious => "epicurious",
            Platform::BonAppetit => "bon_appetit",
            Platform::NytCooking => "nyt_cooking",
            Platform::Tasty => "tasty",
            Platform::Generic => "generic",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<Platform>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_video_url: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_social_media: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_recipe_structure: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bullet_points: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numbered_steps: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub measurements: Option<usize>,
    /// Normalized URL, set for `InputType::Url`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Classification of a raw input. Produced once and never re-scored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    #[serde(rename = "type")]
    pub input_type: InputType,
    /// Heuristic score in `[0, 1]`
    pub confidence: f64,
    pub metadata: DetectionMetadata,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionMetadata {
    /// Every method attempted, in order, including failed ones
    pub extraction_methods: Vec<String>,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<Platform>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Nutrition facts from the page's structured data, e.g. `fat: 24.1 g`
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub nutrition: BTreeMap<String, String>,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub raw_text: String,
    pub metadata: ExtractionMetadata,
    pub fallback_used: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrMetadata {
    pub provider: String,
    pub processing_time_ms: u64,
    pub image_size: ImageSize,
    pub preprocessing_applied: Vec<String>,
    pub language: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrResult {
    pub text: String,
    /// Scaled into `[0, 1]` from the provider's 0-100 score
    pub confidence: f64,
    pub metadata: OcrMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default)]
    pub optional: bool,
    pub confidence: f64,
    /// Set only by the recovery stage
    #[serde(default)]
    pub inferred: bool,
}

impl Ingredient {
    pub fn new(name: impl Into<String>) -> Self {
        Ingredient {
            name: name.into(),
            quantity: None,
            unit: None,
            optional: false,
            confidence: 1.0,
            inferred: false,
        }
    }

    pub fn with_quantity(mut self, quantity: f64, unit: Option<&str>) -> Self {
        self.quantity = Some(quantity);
        self.unit = unit.map(String::from);
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InconsistencyKind {
    MissingInSteps,
    DuplicateIngredient,
    UnusedIngredient,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inconsistency {
    #[serde(rename = "type")]
    pub kind: InconsistencyKind,
    pub ingredient_name: String,
    pub detail: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InferenceSource {
    InstructionText,
    Ai,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferredQuantity {
    pub ingredient_name: String,
    pub quantity: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub confidence: f64,
    pub source: InferenceSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveryResult {
    pub original_ingredients: Vec<Ingredient>,
    /// Superset of the originals plus anything inferred
    pub recovered_ingredients: Vec<Ingredient>,
    pub missing_ingredients: Vec<String>,
    pub inferred_quantities: Vec<InferredQuantity>,
    pub inconsistencies: Vec<Inconsistency>,
    pub confidence: f64,
    pub recovery_notes: Vec<String>,
}

/// Structured recipe as produced by the parser, before recovery
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DraftRecipe {
    pub title: String,
    pub ingredients: Vec<Ingredient>,
    pub instructions: Vec<String>,
}

/// Final artifact of one import
#[derive(Debug, Clone, Serialize)]
pub struct ImportedRecipe {
    pub detection: DetectionResult,
    pub extraction: ExtractionMetadata,
    pub fallback_used: bool,
    pub draft: DraftRecipe,
    pub recovery: RecoveryResult,
}
