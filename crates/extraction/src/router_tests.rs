use redactflow_core::test_support::fake_clock_at;

use super::*;
use crate::clients::{FakeDocumentExtractorClient, FakeOcrClient, OcrOutput};

#[tokio::test]
async fn plain_text_routes_to_direct() {
    let document_client = FakeDocumentExtractorClient { result: Ok(String::new()) };
    let ocr_client = FakeOcrClient {
        result: Ok(OcrOutput {
            text: String::new(),
            stderr: String::new(),
        }),
    };
    let clock = fake_clock_at(0);
    let router = ExtractionRouter::new(&document_client, &ocr_client, &clock);

    let result = router.route(b"hello there", "txt", "text/plain").await;
    assert_eq!(result.method, Some(ExtractionMethod::Direct));
    assert_eq!(result.text, "hello there");
}

#[tokio::test]
async fn malformed_pdf_falls_through_to_document() {
    let document_client = FakeDocumentExtractorClient {
        result: Ok("recovered via document extractor".to_string()),
    };
    let ocr_client = FakeOcrClient {
        result: Ok(OcrOutput {
            text: String::new(),
            stderr: String::new(),
        }),
    };
    let clock = fake_clock_at(0);
    let router = ExtractionRouter::new(&document_client, &ocr_client, &clock);

    let result = router.route(b"not actually a pdf", "pdf", "application/pdf").await;
    assert_eq!(result.method, Some(ExtractionMethod::PdfFallbackDocument));
    assert_eq!(result.text, "recovered via document extractor");
}

#[tokio::test]
async fn ocr_failure_falls_back_to_document() {
    let document_client = FakeDocumentExtractorClient {
        result: Ok("document recovered the scan".to_string()),
    };
    let ocr_client = FakeOcrClient {
        result: Err("tesseract crashed".to_string()),
    };
    let clock = fake_clock_at(0);
    let router = ExtractionRouter::new(&document_client, &ocr_client, &clock);

    let result = router.route(b"image bytes", "png", "image/png").await;
    assert_eq!(result.text, "document recovered the scan");
}

#[tokio::test]
async fn every_strategy_failing_produces_the_failed_artifact() {
    let document_client = FakeDocumentExtractorClient {
        result: Err("extractor down".to_string()),
    };
    let ocr_client = FakeOcrClient {
        result: Err("ocr down".to_string()),
    };
    let clock = fake_clock_at(1_700_000_000_000);
    let router = ExtractionRouter::new(&document_client, &ocr_client, &clock);

    let result = router.route(b"image bytes", "png", "image/png").await;
    assert_eq!(result.method, Some(ExtractionMethod::Failed));
    assert_eq!(result.confidence, 0.0);
    assert_eq!(result.text, "");
    assert!(result.metadata.contains_key("error"));
    assert_eq!(result.metadata.get("timestamp"), Some(&"1700000000000".to_string()));
}

#[tokio::test]
async fn oversized_text_is_truncated_with_a_marker() {
    let document_client = FakeDocumentExtractorClient {
        result: Ok("x".repeat(100)),
    };
    let ocr_client = FakeOcrClient {
        result: Ok(OcrOutput {
            text: String::new(),
            stderr: String::new(),
        }),
    };
    let clock = fake_clock_at(0);
    let router = ExtractionRouter::new(&document_client, &ocr_client, &clock).with_max_text_length(10);

    let result = router.route(b"bytes", "docx", "application/vnd.openxmlformats-officedocument.wordprocessingml.document").await;
    assert!(result.truncated);
    assert_eq!(result.original_length, Some(100));
    assert!(result.text.ends_with("[TRUNCATED]"));
}

#[tokio::test]
async fn explicit_hybrid_request_bypasses_strategy_selection() {
    let document_client = FakeDocumentExtractorClient {
        result: Ok("short doc".to_string()),
    };
    let ocr_client = FakeOcrClient {
        result: Ok(OcrOutput {
            text: "a considerably longer ocr transcription of the page".to_string(),
            stderr: String::new(),
        }),
    };
    let clock = fake_clock_at(0);
    let router = ExtractionRouter::new(&document_client, &ocr_client, &clock);

    let result = router.route_hybrid(b"bytes", "application/pdf").await;
    assert_eq!(result.method, Some(ExtractionMethod::Hybrid));
    assert!(result.text.starts_with("a considerably longer"));
}
