use image::{DynamicImage, GrayImage, ImageFormat, Luma};
use mockito::{Matcher, Server};
use std::io::Cursor;
use std::sync::Arc;

use recipe_ingest::config::ExtractionConfig;
use recipe_ingest::ocr::{validate, GoogleVisionProvider, TesseractProvider};
use recipe_ingest::{
    BinaryFileRef, ContentExtractor, ImportError, ImportInput, InputClassifier, OcrEngine,
    OcrOptions,
};

const VISION_REPLY: &str = r#"{"responses": [{"fullTextAnnotation": {
    "text": "Pancakes\n\nIngredients\n2 cups flour\n1 cup milk\n\nMix and fry in butter.",
    "pages": [{"confidence": 0.9}]
}}]}"#;

fn recipe_png() -> Vec<u8> {
    let img = GrayImage::from_fn(60, 40, |x, y| Luma([if (x + y) % 5 == 0 { 20 } else { 230 }]));
    let mut out = Vec::new();
    DynamicImage::ImageLuma8(img)
        .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
        .unwrap();
    out
}

fn engine(endpoint: &str) -> OcrEngine {
    OcrEngine::new()
        .with_provider(Arc::new(TesseractProvider::with_command(
            "tesseract-binary-that-does-not-exist",
        )))
        .with_provider(Arc::new(GoogleVisionProvider::with_endpoint("test-key", endpoint)))
}

#[tokio::test]
async fn test_google_vision_with_full_preprocessing() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/images:annotate")
        .match_query(Matcher::UrlEncoded("key".into(), "test-key".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(VISION_REPLY)
        .create();

    let result = engine(&server.url())
        .recognize(&recipe_png(), &OcrOptions::default())
        .await
        .unwrap();

    mock.assert();
    assert_eq!(result.metadata.provider, "google_vision");
    assert_eq!(
        result.metadata.preprocessing_applied,
        vec!["contrast", "denoise", "sharpen", "resize"]
    );
    assert_eq!(result.metadata.image_size.width, 60);
    assert_eq!(result.metadata.language, "eng");
    assert!((0.0..=1.0).contains(&result.confidence));
    assert!((result.confidence - 0.9).abs() < 1e-9);
    assert!(result.text.starts_with("Pancakes"));
    assert!(validate(&result).is_valid);
}

#[tokio::test]
async fn test_every_provider_failing() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/v1/images:annotate")
        .match_query(Matcher::Any)
        .with_status(500)
        .with_body("backend error")
        .create();

    let result = engine(&server.url())
        .recognize(&recipe_png(), &OcrOptions::default())
        .await;

    match result {
        Err(ImportError::OcrFailed { attempts }) => {
            assert_eq!(attempts.len(), 2);
            assert!(attempts[0].starts_with("google_vision"));
            assert!(attempts[1].starts_with("tesseract"));
        }
        other => panic!("expected OcrFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_image_upload_goes_through_ocr() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/v1/images:annotate")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(VISION_REPLY)
        .create();

    let extractor = ContentExtractor::new(
        &ExtractionConfig::default(),
        engine(&server.url()),
        OcrOptions::default(),
    )
    .unwrap();
    let input = ImportInput::File(
        BinaryFileRef::new(recipe_png())
            .with_name("card.png")
            .with_mime_type("image/png"),
    );
    let detection = InputClassifier::classify(&input);

    let result = extractor.extract(&input, &detection).await.unwrap();
    assert_eq!(result.metadata.extraction_methods, vec!["image-ocr"]);
    assert_eq!(result.metadata.source, "card.png");
    assert!(result.raw_text.contains("2 cups flour"));
}
