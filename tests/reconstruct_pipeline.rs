//! Integration tests for the RECONSTRUCT, CHAT and ANALYZE pipelines.
//!
//! Uses a scripted in-process backend; no network. One live test at the
//! bottom runs against real Gemini when GEMINI_API_KEY is set.

mod backend_helpers;

use backend_helpers::{sample_images, FakeBackend, BATCH_QC_REPLY};
use industrial_reconstruct_lib::llm::gemini::GeminiBackend;
use industrial_reconstruct_lib::llm::prompts::CHAT_ERROR_REPLY;
use industrial_reconstruct_lib::llm::request::GenerationMode;
use industrial_reconstruct_lib::llm::{
    analyze_screenshot, chat, reconstruct, BackendFailure, ChatMessage, KeySource, LlmError,
    ReconstructionResult, ResultSource,
};

const MODEL: &str = "gemini-test";

#[tokio::test]
async fn zero_images_never_reach_the_backend() {
    let backend = FakeBackend::replying(BATCH_QC_REPLY);

    let err = reconstruct(&backend, MODEL, &[], Some("anything"))
        .await
        .unwrap_err();

    assert!(matches!(err, LlmError::NoImages));
    assert_eq!(err.to_string(), "No files uploaded");
    assert_eq!(backend.call_count(), 0);
}

#[tokio::test]
async fn zero_images_win_over_missing_credentials() {
    let backend = FakeBackend::unconfigured();
    let err = reconstruct(&backend, MODEL, &[], None).await.unwrap_err();
    assert!(matches!(err, LlmError::NoImages));
}

#[tokio::test]
async fn batch_qc_reconstruction_is_live() {
    let backend = FakeBackend::replying(BATCH_QC_REPLY);
    let images = sample_images(3);

    let outcome = reconstruct(&backend, MODEL, &images, Some("Batch QC workflow"))
        .await
        .unwrap();

    assert_eq!(outcome.source, ResultSource::Live);
    let numbers: Vec<u32> = outcome.result.steps.iter().map(|s| s.step).collect();
    assert_eq!(numbers, vec![1, 2, 3, 4]);
    assert!(!outcome.result.process_overview.goal.trim().is_empty());
    assert_eq!(outcome.result.process_overview.process_name, "Batch QC Release");
    assert!(outcome.result.script_alignment().is_aligned());

    let request = backend.last_request().unwrap();
    assert_eq!(request.model, MODEL);
    assert_eq!(request.image_count(), 3);
    let prompt = request.text().unwrap();
    assert!(prompt.contains("3 screenshots"));
    assert!(prompt.contains("Batch QC workflow"));
    assert!(matches!(request.mode, GenerationMode::SchemaConstrained(_)));
    assert!(!request.relaxed_safety);

    // Images follow the prompt in capture order.
    let sent: Vec<&str> = request.images().map(|i| i.data.as_str()).collect();
    let expected: Vec<&str> = images.iter().map(|i| i.data.as_str()).collect();
    assert_eq!(sent, expected);
}

#[tokio::test]
async fn fenced_reply_parses_like_bare_json() {
    let fenced = format!("```json\n{}\n```", BATCH_QC_REPLY);
    let bare = reconstruct(&FakeBackend::replying(BATCH_QC_REPLY), MODEL, &sample_images(1), None)
        .await
        .unwrap();
    let wrapped = reconstruct(&FakeBackend::replying(fenced), MODEL, &sample_images(1), None)
        .await
        .unwrap();

    assert_eq!(wrapped.source, ResultSource::Live);
    assert_eq!(wrapped.result, bare.result);
}

#[tokio::test]
async fn backend_failures_yield_the_exact_fallback() {
    // Every other field present and well-typed; only the steps are missing.
    let mut stepless: serde_json::Value = serde_json::from_str(BATCH_QC_REPLY).unwrap();
    stepless["steps"] = serde_json::json!([]);
    let stepless = stepless.to_string();

    let backends = [
        FakeBackend::failing_with_status(500),
        // Deadline exceeded upstream.
        FakeBackend::failing_with_status(504),
        FakeBackend::with(|| Err(LlmError::BackendCall(BackendFailure::EmptyResponse))),
        FakeBackend::with(|| {
            Err(LlmError::BackendCall(BackendFailure::Blocked(
                "SAFETY".to_string(),
            )))
        }),
        FakeBackend::replying("Sure, here's the JSON: {not valid}"),
        FakeBackend::replying(r#"{"steps": []}"#),
        FakeBackend::replying(stepless),
    ];

    for backend in &backends {
        let outcome = reconstruct(backend, MODEL, &sample_images(2), None)
            .await
            .unwrap();
        assert_eq!(outcome.source, ResultSource::Fallback);
        assert_eq!(outcome.result, ReconstructionResult::fallback());
        assert_eq!(backend.call_count(), 1);
    }
}

#[tokio::test]
async fn unreachable_gemini_falls_back() {
    // Nothing listens on port 1; the real adapter fails at transport level.
    let backend = GeminiBackend::new("http://127.0.0.1:1", KeySource::Fixed("k".to_string()));
    let outcome = reconstruct(&backend, MODEL, &sample_images(1), None)
        .await
        .unwrap();
    assert_eq!(outcome.source, ResultSource::Fallback);
    assert_eq!(outcome.result.process_overview.process_name, "Quality Control Inspection Log");
}

#[tokio::test]
async fn missing_credentials_propagate_from_reconstruct() {
    let backend = FakeBackend::unconfigured();
    let err = reconstruct(&backend, MODEL, &sample_images(1), None)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "GEMINI_API_KEY is not defined");
}

#[tokio::test]
async fn result_round_trips_through_json() {
    let backend = FakeBackend::replying(BATCH_QC_REPLY);
    let outcome = reconstruct(&backend, MODEL, &sample_images(1), None)
        .await
        .unwrap();

    let original: serde_json::Value = serde_json::from_str(BATCH_QC_REPLY).unwrap();
    let reserialized = serde_json::to_value(&outcome.result).unwrap();
    assert_eq!(reserialized, original);
}

#[tokio::test]
async fn chat_failure_becomes_apology() {
    let backend = FakeBackend::failing_with_status(503);
    let reply = chat(&backend, MODEL, "What does step 2 do?", &sample_images(2), &[])
        .await
        .unwrap();
    assert_eq!(reply, CHAT_ERROR_REPLY);
}

#[tokio::test]
async fn chat_is_single_turn_with_relaxed_safety() {
    let backend = FakeBackend::replying("Step 2 checks assay results.");
    let history = vec![
        ChatMessage::user("earlier question"),
        ChatMessage::model("earlier answer"),
    ];

    let reply = chat(&backend, MODEL, "What does step 2 do?", &sample_images(2), &history)
        .await
        .unwrap();
    assert_eq!(reply, "Step 2 checks assay results.");

    let request = backend.last_request().unwrap();
    assert_eq!(request.text(), Some("What does step 2 do?"));
    assert_eq!(request.image_count(), 2);
    assert!(request.relaxed_safety);
    assert!(matches!(request.mode, GenerationMode::BestEffort));
    let prompt_text: Vec<&str> = request
        .parts
        .iter()
        .filter_map(|p| match p {
            industrial_reconstruct_lib::llm::request::Part::Text(t) => Some(t.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(prompt_text, vec!["What does step 2 do?"]);
}

#[tokio::test]
async fn chat_without_credentials_is_an_error() {
    let backend = FakeBackend::unconfigured();
    let err = chat(&backend, MODEL, "hi", &[], &[]).await.unwrap_err();
    assert!(matches!(err, LlmError::Configuration(_)));
}

#[tokio::test]
async fn analyze_propagates_malformed_output() {
    let backend = FakeBackend::replying("no json here");
    let err = analyze_screenshot(&backend, MODEL, sample_images(1).remove(0))
        .await
        .unwrap_err();
    assert!(matches!(err, LlmError::MalformedResponse { .. }));
}

#[tokio::test]
async fn analyze_parses_sop_data() {
    let backend = FakeBackend::replying(
        r#"{
          "overview": {"processName": "Goods Receipt", "role": "Clerk", "systemType": "ERP", "goal": "Book delivery"},
          "steps": ["Open MIGO", "Enter PO", "Post"],
          "risks": [{"check": "PO matches delivery note", "risk": "Booking against the wrong PO"}],
          "checklist": ["PO checked"],
          "loomScript": [{"step": "Step 1", "narration": "We open MIGO.", "focus": "Transaction field"}]
        }"#,
    );
    let sop = analyze_screenshot(&backend, MODEL, sample_images(1).remove(0))
        .await
        .unwrap();
    assert_eq!(sop.overview.process_name, "Goods Receipt");
    assert_eq!(sop.steps.len(), 3);
}

fn load_env() {
    let manifest_dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR"));
    for env_file in [".env.local", ".env"] {
        let path = manifest_dir.join(env_file);
        if path.exists() {
            let _ = dotenvy::from_path(&path);
            eprintln!("[TEST] Loaded {}", path.display());
            break;
        }
    }
}

#[tokio::test]
async fn live_gemini_reconstruction() {
    load_env();
    let key_present = std::env::var("GEMINI_API_KEY")
        .map(|k| !k.is_empty())
        .unwrap_or(false);
    if !key_present {
        eprintln!("SKIP: No GEMINI_API_KEY");
        return;
    }

    let png = backend_helpers::png_bytes();
    let image = industrial_reconstruct_lib::capture::CapturedImage::png_from_bytes(&png).to_part();
    let backend = GeminiBackend::new(
        industrial_reconstruct_lib::llm::gemini::DEFAULT_API_BASE,
        KeySource::Environment,
    );

    let start = std::time::Instant::now();
    let outcome = reconstruct(
        &backend,
        industrial_reconstruct_lib::llm::prompts::DEFAULT_MODEL,
        &[image],
        Some("Blank test screen"),
    )
    .await
    .unwrap();
    eprintln!(
        "[TEST] Reconstruct returned {:?} in {}ms: '{}'",
        outcome.source,
        start.elapsed().as_millis(),
        outcome.result.process_overview.process_name
    );
}
