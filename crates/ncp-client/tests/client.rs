use std::time::Duration;

use axum::extract::Path;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use ncp_client::error::{CONNECTION_MESSAGE, FALLBACK_MESSAGE, TIMEOUT_MESSAGE};
use ncp_client::{ClientError, GenerationOutcome, NcpClient};
use ncp_core::models::assessment::{AssessmentInput, ManualAssessment};
use ncp_core::models::care_plan::{CarePlan, CarePlanSections, CarePlanUpdate, FormatType};
use ncp_core::models::transaction::ProviderKind;

fn sample_plan() -> CarePlan {
    let mut sections = CarePlanSections::default();
    sections.assessment = "- Patient reports sharp pain in the lower back".to_string();
    sections.diagnosis = "Acute Pain related to tissue injury".to_string();
    CarePlan::new("NCP: Acute Pain", FormatType::Four, sections)
}

fn diagnosis_json() -> Value {
    json!({
        "entry": null,
        "reasoning": "No suitable diagnoses matched the assessment",
        "fallback": false
    })
}

async fn generate(Json(body): Json<Value>) -> impl IntoResponse {
    let plan = serde_json::to_value(sample_plan()).unwrap();
    match body["format"]["type"].as_str() {
        Some("5") => Json(json!({ "diagnosis": diagnosis_json(), "status": "partial", "message": "partial only" })),
        Some("6") => Json(json!({ "ncp": plan })),
        _ => Json(json!({
            "request_id": "1b4e28ba-2fa1-4d3b-a3f5-ef19b5a7633b",
            "status": "completed",
            "diagnosis": diagnosis_json(),
            "generatedNCP": plan
        })),
    }
}

async fn health(headers: HeaderMap) -> Json<Value> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    Json(json!({ "status": "healthy", "auth": auth }))
}

async fn spawn_stub() -> String {
    let app = Router::new()
        .route("/generate-ncp", post(generate))
        .route(
            "/validate-ncp",
            post(|| async {
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(json!({
                        "detail": "Assessment data is required",
                        "errors": { "subjective": "Subjective data is required" }
                    })),
                )
            }),
        )
        .route("/ncps", get(|| async { Json(json!([])) }))
        .route(
            "/ncps/{id}",
            get(|Path(_id): Path<String>| async {
                (StatusCode::NOT_FOUND, Json(json!({ "detail": "NCP not found" })))
            }),
        )
        .route(
            "/ncps/{id}/explanation",
            get(|| async {
                (
                    StatusCode::NOT_FOUND,
                    Json(json!({ "detail": "No explanation has been generated for this NCP" })),
                )
            }),
        )
        .route("/health", get(health))
        .route(
            "/api/admin/ai-provider",
            get(|| async {
                (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "message": "provider store offline" })))
            })
            .put(|| async { (StatusCode::BAD_GATEWAY, "not json") }),
        )
        .route(
            "/api/admin/dashboard-stats",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(json!({}))
            }),
        );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn payload(format: FormatType) -> ncp_core::models::assessment::AssessmentPayload {
    AssessmentInput::Manual(ManualAssessment {
        subjective: "Patient reports sharp pain in the lower back".to_string(),
        objective: "Guarding behaviour noted on movement".to_string(),
    })
    .to_payload(format)
}

#[tokio::test]
async fn generated_plan_is_a_complete_outcome() {
    let client = NcpClient::new(spawn_stub().await).unwrap();

    let outcome = client.generate_ncp(&payload(FormatType::Seven)).await.unwrap();

    assert!(outcome.is_complete());
    assert_eq!(outcome.plan().unwrap().title, "NCP: Acute Pain");
    match outcome {
        GenerationOutcome::Complete { request_id, .. } => assert!(request_id.is_some()),
        other => panic!("expected complete, got {other:?}"),
    }
}

#[tokio::test]
async fn plan_under_ncp_key_is_also_complete() {
    let client = NcpClient::new(spawn_stub().await).unwrap();

    let outcome = client.generate_ncp(&payload(FormatType::Six)).await.unwrap();

    assert!(outcome.is_complete());
    assert!(outcome.diagnosis().is_none());
}

#[tokio::test]
async fn diagnosis_without_plan_is_partial() {
    let client = NcpClient::new(spawn_stub().await).unwrap();

    let outcome = client.generate_ncp(&payload(FormatType::Five)).await.unwrap();

    assert!(!outcome.is_complete());
    assert!(outcome.plan().is_none());
    match outcome {
        GenerationOutcome::Partial { diagnosis, message, .. } => {
            assert_eq!(message.as_deref(), Some("partial only"));
            assert!(diagnosis.unwrap().entry.is_none());
        }
        other => panic!("expected partial, got {other:?}"),
    }
}

#[test]
fn body_without_plan_or_diagnosis_is_rejected() {
    let err = GenerationOutcome::from_response(json!({ "status": "completed" })).unwrap_err();
    assert!(matches!(err, ClientError::Decode(_)));
}

#[test]
fn null_plan_falls_through_to_partial() {
    let outcome = GenerationOutcome::from_response(json!({
        "generatedNCP": null,
        "diagnosis": diagnosis_json()
    }))
    .unwrap();
    assert!(!outcome.is_complete());
}

#[tokio::test]
async fn unprocessable_entity_becomes_field_errors() {
    let client = NcpClient::new(spawn_stub().await).unwrap();

    let err = client.validate_ncp(&Default::default()).await.unwrap_err();

    assert_eq!(err.status(), Some(422));
    assert_eq!(err.user_message(), "Assessment data is required");
    let fields = err.field_errors().unwrap();
    assert_eq!(fields["subjective"], "Subjective data is required");
}

#[tokio::test]
async fn invalid_form_never_reaches_the_network() {
    // Nothing listens here; a request would fail with a connection error.
    let client = NcpClient::new("http://127.0.0.1:9").unwrap();
    let input = AssessmentInput::Manual(ManualAssessment {
        subjective: "too short".to_string(),
        objective: "Guarding behaviour noted on movement".to_string(),
    });

    let err = client.generate_from_input(&input, FormatType::Seven).await.unwrap_err();

    let fields = err.field_errors().unwrap();
    assert!(fields.contains_key("subjective"));
    assert!(!fields.contains_key("objective"));
}

#[tokio::test]
async fn backend_detail_is_surfaced() {
    let client = NcpClient::new(spawn_stub().await).unwrap();

    let err = client.get_ncp(uuid::Uuid::new_v4()).await.unwrap_err();

    assert_eq!(err.status(), Some(404));
    assert_eq!(err.user_message(), "NCP not found");
}

#[tokio::test]
async fn message_field_is_used_when_detail_is_absent() {
    let client = NcpClient::new(spawn_stub().await).unwrap();

    let err = client.ai_provider().await.unwrap_err();

    assert_eq!(err.status(), Some(500));
    assert_eq!(err.user_message(), "provider store offline");
}

#[tokio::test]
async fn non_json_error_uses_fallback_message() {
    let client = NcpClient::new(spawn_stub().await).unwrap();

    let err = client.set_ai_provider(ProviderKind::Gemini).await.unwrap_err();

    assert_eq!(err.status(), Some(502));
    assert_eq!(err.user_message(), FALLBACK_MESSAGE);
}

#[tokio::test]
async fn missing_explanation_is_none() {
    let client = NcpClient::new(spawn_stub().await).unwrap();

    let explanation = client.get_explanation(uuid::Uuid::new_v4()).await.unwrap();

    assert!(explanation.is_none());
}

#[tokio::test]
async fn bearer_token_is_attached() {
    let base = spawn_stub().await;

    let anonymous = NcpClient::new(base.clone()).unwrap();
    let body = anonymous.health().await.unwrap();
    assert_eq!(body["auth"], "");

    let client = NcpClient::new(base).unwrap().with_token("abc.def.ghi");
    let body = client.health().await.unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["auth"], "Bearer abc.def.ghi");
}

#[tokio::test]
async fn empty_title_is_rejected_locally() {
    let client = NcpClient::new("http://127.0.0.1:9").unwrap();
    let update = CarePlanUpdate {
        title: Some("   ".to_string()),
        ..Default::default()
    };

    let err = client.update_ncp(uuid::Uuid::new_v4(), &update).await.unwrap_err();

    assert_eq!(err.user_message(), "Title cannot be empty");
}

#[tokio::test]
async fn unknown_export_format_is_rejected_locally() {
    let client = NcpClient::new("http://127.0.0.1:9").unwrap();

    let err = client.export_ncp(uuid::Uuid::new_v4(), "xlsx", true).await.unwrap_err();

    assert!(matches!(err, ClientError::InvalidRequest(_)));
}

#[tokio::test]
async fn slow_backend_times_out() {
    let client = NcpClient::with_timeout(spawn_stub().await, Duration::from_millis(200)).unwrap();

    let err = client.dashboard_stats().await.unwrap_err();

    assert!(matches!(err, ClientError::Timeout));
    assert_eq!(err.user_message(), TIMEOUT_MESSAGE);
}

#[tokio::test]
async fn unreachable_backend_is_a_connection_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let client = NcpClient::new(format!("http://{addr}")).unwrap();

    let err = client.list_ncps().await.unwrap_err();

    assert!(matches!(err, ClientError::Connection(_)));
    assert_eq!(err.user_message(), CONNECTION_MESSAGE);
}
