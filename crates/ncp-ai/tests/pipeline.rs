use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use ncp_ai::error::AiError;
use ncp_ai::generator::{BoxFuture, Completion, GenerationConfig, TextGenerator};
use ncp_ai::pipeline::{
    generate_care_plan, generate_explanation, match_candidate, select_diagnosis,
    FALLBACK_REASONING, MAX_SELECTION_ATTEMPTS, NO_CANDIDATES_REASONING,
};
use ncp_ai::provider::ProviderRegistry;
use ncp_ai::transaction::CallLog;
use ncp_core::models::assessment::{AssessmentInput, ManualAssessment};
use ncp_core::models::care_plan::{CarePlan, CarePlanSections, FormatType, Section};
use ncp_core::models::diagnosis::{DiagnosisCandidate, NnnEntry};
use ncp_core::models::transaction::{PipelineStep, ProviderKind};
use ncp_core::models::usage::TokenCount;

/// Replays canned replies in order and records the prompts it saw.
struct Scripted {
    kind: ProviderKind,
    config: GenerationConfig,
    replies: Mutex<VecDeque<Result<String, String>>>,
    prompts: Mutex<Vec<String>>,
}

impl Scripted {
    fn new(kind: ProviderKind, replies: Vec<Result<&str, &str>>) -> Self {
        Self {
            kind,
            config: GenerationConfig::new("claude-sonnet-4-test"),
            replies: Mutex::new(
                replies
                    .into_iter()
                    .map(|r| r.map(str::to_string).map_err(str::to_string))
                    .collect(),
            ),
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl TextGenerator for Scripted {
    fn provider(&self) -> ProviderKind {
        self.kind
    }

    fn config(&self) -> &GenerationConfig {
        &self.config
    }

    fn complete<'a>(&'a self, _system: &'a str, prompt: &'a str) -> BoxFuture<'a, Result<Completion, AiError>> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err("script exhausted".to_string()));
        Box::pin(async move {
            reply
                .map(|text| Completion {
                    text,
                    tokens: TokenCount { input: 100, output: 20 },
                })
                .map_err(AiError::Invocation)
        })
    }
}

fn payload() -> ncp_core::models::assessment::AssessmentPayload {
    AssessmentInput::Manual(ManualAssessment {
        subjective: "Patient reports sharp pain 8/10".to_string(),
        objective: "Guarding of the right lower quadrant".to_string(),
    })
    .to_payload(FormatType::Four)
}

fn candidate(name: &str, score: f32) -> DiagnosisCandidate {
    DiagnosisCandidate {
        entry: NnnEntry {
            id: name.to_lowercase(),
            diagnosis: name.to_string(),
            definition: None,
            defining_characteristics: vec![],
            related_factors: vec![],
            risk_factors: vec![],
            suggested_outcomes: vec!["Pain Level".to_string()],
            suggested_interventions: vec!["Pain Management".to_string()],
        },
        score,
    }
}

fn candidates() -> Vec<DiagnosisCandidate> {
    vec![candidate("Acute Pain", 3.2), candidate("Anxiety", 1.1)]
}

#[test]
fn candidate_match_is_case_insensitive_and_exact() {
    let list = candidates();
    assert!(match_candidate("  acute PAIN ", &list).is_some());
    assert!(match_candidate("Acute", &list).is_none());
    assert!(match_candidate("Acute Pain related to injury", &list).is_none());
}

#[tokio::test]
async fn no_candidates_selects_nothing_without_calling_model() {
    let ai = Scripted::new(ProviderKind::Claude, vec![]);
    let mut log = CallLog::default();
    let selected = select_diagnosis(&ai, &payload(), &[], &mut log).await;

    assert!(selected.entry.is_none());
    assert_eq!(selected.reasoning, NO_CANDIDATES_REASONING);
    assert!(log.calls.is_empty());
}

#[tokio::test]
async fn valid_selection_returns_candidate_with_reasoning() {
    let ai = Scripted::new(
        ProviderKind::Claude,
        vec![Ok("```json\n{\"diagnosis\": \"anxiety\", \"reasoning\": \"Worry dominates\"}\n```")],
    );
    let mut log = CallLog::default();
    let selected = select_diagnosis(&ai, &payload(), &candidates(), &mut log).await;

    assert_eq!(selected.name(), Some("Anxiety"));
    assert_eq!(selected.reasoning, "Worry dominates");
    assert!(!selected.fallback);
    assert_eq!(log.calls.len(), 1);
    assert_eq!(log.calls[0].step, PipelineStep::SelectDiagnosis);
    assert_eq!(log.calls[0].context["attempt"], 1);
}

#[tokio::test]
async fn invalid_pick_tightens_prompt_then_succeeds() {
    let ai = Scripted::new(
        ProviderKind::Claude,
        vec![
            Ok("{\"diagnosis\": \"Chronic Pain\", \"reasoning\": \"x\"}"),
            Ok("{\"diagnosis\": \"Acute Pain\", \"reasoning\": \"Guarding and 8/10 pain\"}"),
        ],
    );
    let mut log = CallLog::default();
    let selected = select_diagnosis(&ai, &payload(), &candidates(), &mut log).await;

    assert_eq!(selected.name(), Some("Acute Pain"));
    let prompts = ai.prompts();
    assert_eq!(prompts.len(), 2);
    assert!(!prompts[0].contains("WAS INVALID"));
    assert!(prompts[1].contains("YOUR LAST SELECTION \"Chronic Pain\" WAS INVALID!"));
    assert!(prompts[1].contains("\"Acute Pain\", \"Anxiety\""));
}

#[tokio::test]
async fn exhausted_attempts_fall_back_to_first_candidate() {
    let ai = Scripted::new(
        ProviderKind::Claude,
        vec![
            Ok("I cannot decide."),
            Err("throttled"),
            Ok("{\"diagnosis\": \"Something Else\"}"),
        ],
    );
    let mut log = CallLog::default();
    let selected = select_diagnosis(&ai, &payload(), &candidates(), &mut log).await;

    assert_eq!(selected.name(), Some("Acute Pain"));
    assert_eq!(selected.reasoning, FALLBACK_REASONING);
    assert!(selected.fallback);
    assert_eq!(log.calls.len(), MAX_SELECTION_ATTEMPTS);
    assert!(!log.calls[1].success);
    assert_eq!(log.calls[1].error.as_deref(), Some("model invocation failed: throttled"));
    // Failed calls carry no tokens.
    assert_eq!(log.tokens(), TokenCount { input: 200, output: 40 });
}

#[tokio::test]
async fn care_plan_sections_accept_strings_and_lists() {
    let reply = r#"{
        "assessment": "Pain 8/10 with guarding",
        "diagnosis": "Acute Pain related to inflammation",
        "outcomes": ["Pain below 3/10 within 4 hours"],
        "interventions": ["- Assess pain every 2 hours", "Give analgesia as ordered"],
        "rationale": "",
        "unknown": "ignored"
    }"#;
    let ai = Scripted::new(ProviderKind::Claude, vec![Ok(reply)]);
    let mut log = CallLog::default();
    let entry = candidates().remove(0).entry;

    let sections = generate_care_plan(&ai, &payload(), &entry, "Guarding", &mut log)
        .await
        .unwrap();

    assert_eq!(sections.outcomes, "- Pain below 3/10 within 4 hours");
    assert_eq!(
        sections.interventions,
        "- Assess pain every 2 hours\n- Give analgesia as ordered"
    );
    assert_eq!(log.calls[0].step, PipelineStep::GenerateNcp);
    assert!(ai.prompts()[0].contains("Pain Management"));
}

#[tokio::test]
async fn care_plan_missing_required_section_fails() {
    let ai = Scripted::new(
        ProviderKind::Claude,
        vec![Ok("{\"assessment\": \"a\", \"diagnosis\": \"b\", \"outcomes\": \"c\"}")],
    );
    let mut log = CallLog::default();
    let entry = candidates().remove(0).entry;
    let err = generate_care_plan(&ai, &payload(), &entry, "", &mut log)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("interventions"));
}

#[tokio::test]
async fn explanation_keeps_only_visible_sections() {
    let mut sections = CarePlanSections::default();
    for s in Section::ALL {
        sections.set(s, format!("{} text", s.title()));
    }
    let plan = CarePlan::new("Plan", FormatType::Four, sections);

    let part = r#"{"clinical_reasoning": "r", "evidence_based_support": "e", "student_guidance": "g"}"#;
    let reply = format!(
        r#"{{"assessment": {part}, "diagnosis": {part}, "outcomes": {part}, "interventions": {part}, "evaluation": {part}}}"#
    );
    let ai = Scripted::new(ProviderKind::Claude, vec![Ok(reply.as_str())]);
    let mut log = CallLog::default();

    let explanation = generate_explanation(&ai, &plan, &mut log).await.unwrap();
    assert_eq!(explanation.ncp_id, plan.id);
    assert_eq!(explanation.sections.len(), 4);
    assert!(explanation.get(Section::Evaluation).is_none());
    assert!(explanation.missing(FormatType::Four).is_empty());
    assert_eq!(explanation.model_id.as_deref(), Some("claude-sonnet-4-test"));
}

#[tokio::test]
async fn registry_restores_and_switches() {
    let claude: Arc<dyn TextGenerator> = Arc::new(Scripted::new(ProviderKind::Claude, vec![]));
    let registry = ProviderRegistry::new([claude]);

    // Gemini saved but not configured: fall back to Claude.
    assert_eq!(registry.restore(Some(ProviderKind::Gemini)).await, ProviderKind::Claude);
    assert_eq!(registry.available(), vec![ProviderKind::Claude]);

    let err = registry.set(ProviderKind::Gemini).await.unwrap_err();
    assert_eq!(err.to_string(), "Gemini API is not configured");

    let err = registry.set_by_name("openai").await.unwrap_err();
    assert_eq!(err.to_string(), "Invalid provider: openai. Must be 'claude' or 'gemini'");

    let status = registry.status().await;
    assert_eq!(status.provider, ProviderKind::Claude);
    assert_eq!(status.config.unwrap().max_tokens, 20_000);
}

#[tokio::test]
async fn registry_switches_between_configured_providers() {
    let claude: Arc<dyn TextGenerator> = Arc::new(Scripted::new(ProviderKind::Claude, vec![]));
    let gemini: Arc<dyn TextGenerator> = Arc::new(Scripted::new(ProviderKind::Gemini, vec![]));
    let registry = ProviderRegistry::new([claude, gemini]);

    assert_eq!(registry.restore(Some(ProviderKind::Gemini)).await, ProviderKind::Gemini);
    assert_eq!(registry.set_by_name("Claude").await.unwrap(), ProviderKind::Claude);
    assert_eq!(registry.active().await.unwrap().provider(), ProviderKind::Claude);
    assert_eq!(registry.available(), vec![ProviderKind::Claude, ProviderKind::Gemini]);
}

#[tokio::test]
async fn failed_persist_keeps_previous_provider() {
    let claude: Arc<dyn TextGenerator> = Arc::new(Scripted::new(ProviderKind::Claude, vec![]));
    let gemini: Arc<dyn TextGenerator> = Arc::new(Scripted::new(ProviderKind::Gemini, vec![]));
    let registry = ProviderRegistry::new([claude, gemini]);

    let err = registry
        .set_persisted(ProviderKind::Gemini, |_| async {
            Err::<(), _>(AiError::Invocation("settings bucket unreachable".to_string()))
        })
        .await
        .unwrap_err();
    assert!(err.to_string().contains("settings bucket unreachable"));
    assert_eq!(registry.current().await, ProviderKind::Claude);

    let mut saved = None;
    let previous = registry
        .set_persisted(ProviderKind::Gemini, |kind| {
            saved = Some(kind);
            async { Ok::<(), AiError>(()) }
        })
        .await
        .unwrap();
    assert_eq!(previous, ProviderKind::Claude);
    assert_eq!(saved, Some(ProviderKind::Gemini));
    assert_eq!(registry.current().await, ProviderKind::Gemini);
}
