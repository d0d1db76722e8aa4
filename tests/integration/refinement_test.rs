//! Refinement Loop Integration Tests
//!
//! Exercises the full controller against scripted mock services: budget
//! enforcement, early termination, the edit-mode reference invariant,
//! fail-open judging, and fatal failure semantics.

use std::sync::Arc;

use tokio::sync::mpsc;

use atelier_engine::models::{Dimensions, GenerationIntent, RefinementConfig};
use atelier_engine::services::media::{NarrationResponse, ServiceError};
use atelier_engine::services::refinement::{RefinementEngine, RefinementEvent};
use atelier_engine::utils::error::EngineError;

use crate::support::{
    reference_artifact, satisfied_reply, unsatisfied_reply, MockMediaServices,
};

fn config(max_iterations: u32) -> RefinementConfig {
    RefinementConfig {
        max_iterations,
        ..Default::default()
    }
}

// ============================================================================
// Budget and early termination
// ============================================================================

#[tokio::test]
async fn test_satisfied_on_third_iteration() {
    let services = Arc::new(MockMediaServices::new().with_judge_replies(&[
        &unsatisfied_reply("hat is missing", "add the hat"),
        &unsatisfied_reply("hat is the wrong color", "make the hat red"),
        &satisfied_reply(),
    ]));
    let engine = RefinementEngine::new(services.clone());

    let result = engine
        .run(GenerationIntent::create("add a hat"), config(3), None)
        .await
        .unwrap();

    assert!(result.success);
    assert_eq!(result.total_iterations, 3);
    assert_eq!(result.iterations.len(), 3);
    assert_eq!(services.generate_call_count(), 3);
    assert_eq!(services.judge_call_count(), 3);
}

#[tokio::test]
async fn test_budget_exhausted_returns_last_artifact() {
    let services = Arc::new(MockMediaServices::new().with_judge_replies(&[
        &unsatisfied_reply("still wrong", ""),
        &unsatisfied_reply("still wrong", ""),
    ]));
    let engine = RefinementEngine::new(services.clone());

    let result = engine
        .run(GenerationIntent::create("add a hat"), config(2), None)
        .await
        .unwrap();

    assert!(!result.success);
    assert_eq!(result.total_iterations, 2);
    assert_eq!(result.iterations.len(), 2);

    let produced = services.produced_ids.lock().unwrap().clone();
    assert_eq!(produced.len(), 2);
    assert_eq!(result.final_artifact.id, produced[1]);
}

#[tokio::test]
async fn test_early_termination_stops_all_calls() {
    let services = Arc::new(MockMediaServices::new().with_judge_replies(&[&satisfied_reply()]));
    let engine = RefinementEngine::new(services.clone());

    let result = engine
        .run(GenerationIntent::create("a sunset"), config(5), None)
        .await
        .unwrap();

    assert!(result.success);
    assert_eq!(result.total_iterations, 1);
    assert_eq!(services.generate_call_count(), 1);
    assert_eq!(services.judge_call_count(), 1);
    // No planner or analysis calls in a satisfied create run.
    assert_eq!(services.narrate_call_count(), 0);
}

#[tokio::test]
async fn test_iteration_numbers_are_sequential() {
    let services = Arc::new(MockMediaServices::new().with_judge_replies(&[
        &unsatisfied_reply("issue", ""),
        &unsatisfied_reply("issue", ""),
        &unsatisfied_reply("issue", ""),
    ]));
    let engine = RefinementEngine::new(services);

    let result = engine
        .run(GenerationIntent::create("a sunset"), config(3), None)
        .await
        .unwrap();

    let numbers: Vec<u32> = result.iterations.iter().map(|i| i.number).collect();
    assert_eq!(numbers, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_max_iterations_is_clamped() {
    let services = Arc::new(
        MockMediaServices::new().with_judge_replies(&[&unsatisfied_reply("never good", "")]),
    );
    let engine = RefinementEngine::new(services.clone());

    // Zero is below the valid range; the run still executes one iteration.
    let result = engine
        .run(GenerationIntent::create("a sunset"), config(0), None)
        .await
        .unwrap();

    assert_eq!(result.total_iterations, 1);
    assert_eq!(services.generate_call_count(), 1);
}

// ============================================================================
// Edit-mode invariants
// ============================================================================

#[tokio::test]
async fn test_edit_iterations_always_use_original_references() {
    let reference_a = reference_artifact(1024, 768);
    let reference_b = reference_artifact(1024, 768);
    let original_ids = vec![reference_a.id.clone(), reference_b.id.clone()];

    let services = Arc::new(MockMediaServices::new().with_judge_replies(&[
        &unsatisfied_reply("hat is missing", "add the hat"),
        &unsatisfied_reply("hat is crooked", "straighten the hat"),
        &unsatisfied_reply("hat is too small", "enlarge the hat"),
    ]));
    let engine = RefinementEngine::new(services.clone());

    let intent = GenerationIntent::edit("add a hat", vec![reference_a, reference_b]);
    let result = engine.run(intent, config(3), None).await.unwrap();

    assert!(!result.success);

    // Every generate call conditioned on exactly the original references,
    // never a prior iteration's output.
    let reference_history = services.generate_references.lock().unwrap().clone();
    assert_eq!(reference_history.len(), 3);
    for passed in &reference_history {
        assert_eq!(passed, &original_ids);
    }
}

#[tokio::test]
async fn test_edit_run_analyzes_exactly_once() {
    let services = Arc::new(MockMediaServices::new().with_judge_replies(&[
        &unsatisfied_reply("hat is missing", "add the hat"),
        &unsatisfied_reply("hat is crooked", ""),
        &satisfied_reply(),
    ]));
    let engine = RefinementEngine::new(services.clone());

    let intent = GenerationIntent::edit("add a hat", vec![reference_artifact(640, 480)]);
    let result = engine.run(intent, config(3), None).await.unwrap();

    assert!(result.success);
    // One narrate call total: the pre-analysis. (No planning model is
    // configured, so the planner used its deterministic fallback.)
    assert_eq!(services.narrate_call_count(), 1);

    // The analysis rides on the first trace record only.
    assert!(result.iterations[0].analysis.is_some());
    assert!(result.iterations[1].analysis.is_none());
    assert!(result.iterations[2].analysis.is_none());
}

#[tokio::test]
async fn test_edit_generation_preserves_reference_dimensions() {
    let services = Arc::new(
        MockMediaServices::new().with_judge_replies(&[&satisfied_reply()]),
    );
    let engine = RefinementEngine::new(services.clone());

    let intent = GenerationIntent::edit("add a hat", vec![reference_artifact(1920, 1080)]);
    engine.run(intent, config(1), None).await.unwrap();

    let dimensions = services.generate_dimensions.lock().unwrap().clone();
    assert_eq!(dimensions, vec![Some(Dimensions::new(1920, 1080))]);
}

#[tokio::test]
async fn test_edit_judge_sees_references_plus_candidate() {
    let services = Arc::new(
        MockMediaServices::new().with_judge_replies(&[&satisfied_reply()]),
    );
    let engine = RefinementEngine::new(services.clone());

    let intent = GenerationIntent::edit(
        "add a hat",
        vec![reference_artifact(640, 480), reference_artifact(640, 480)],
    );
    engine.run(intent, config(1), None).await.unwrap();

    // Two references + the newly produced artifact.
    let counts = services.judged_artifact_counts.lock().unwrap().clone();
    assert_eq!(counts, vec![3]);
}

#[tokio::test]
async fn test_create_judge_sees_only_candidate() {
    let services = Arc::new(
        MockMediaServices::new().with_judge_replies(&[&satisfied_reply()]),
    );
    let engine = RefinementEngine::new(services.clone());

    engine
        .run(GenerationIntent::create("a sunset"), config(1), None)
        .await
        .unwrap();

    let counts = services.judged_artifact_counts.lock().unwrap().clone();
    assert_eq!(counts, vec![1]);
}

// ============================================================================
// Failure semantics
// ============================================================================

#[tokio::test]
async fn test_pre_analysis_failure_is_fatal() {
    let services = Arc::new(MockMediaServices::new().with_narrate_error(
        ServiceError::NetworkError {
            message: "connection reset".to_string(),
        },
    ));
    let engine = RefinementEngine::new(services.clone());

    let intent = GenerationIntent::edit("add a hat", vec![reference_artifact(640, 480)]);
    let err = engine.run(intent, config(3), None).await.unwrap_err();

    assert!(matches!(err, EngineError::Service(_)));
    // The run aborted before any generation happened.
    assert_eq!(services.generate_call_count(), 0);
}

#[tokio::test]
async fn test_generate_failure_propagates() {
    let services = Arc::new(MockMediaServices::new().with_generate_error(
        ServiceError::RateLimited {
            message: "too many requests".to_string(),
            retry_after: Some(30),
        },
    ));
    let engine = RefinementEngine::new(services);

    let err = engine
        .run(GenerationIntent::create("a sunset"), config(3), None)
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::Service(_)));
}

#[tokio::test]
async fn test_prose_judgment_fails_open() {
    let services = Arc::new(
        MockMediaServices::new()
            .with_judge_replies(&["Looks wonderful, exactly what was asked for!"]),
    );
    let engine = RefinementEngine::new(services.clone());

    let result = engine
        .run(GenerationIntent::create("a sunset"), config(3), None)
        .await
        .unwrap();

    // Undecodable judgment counts as satisfied rather than blocking the run.
    assert!(result.success);
    assert_eq!(result.total_iterations, 1);
    assert!(result.iterations[0].verification.issues.is_empty());
}

#[tokio::test]
async fn test_empty_intent_is_rejected() {
    let services = Arc::new(MockMediaServices::new());
    let engine = RefinementEngine::new(services.clone());

    let err = engine
        .run(GenerationIntent::create("   "), config(3), None)
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::Validation(_)));
    assert_eq!(services.generate_call_count(), 0);
}

#[tokio::test]
async fn test_cancellation_aborts_before_first_iteration() {
    let services = Arc::new(MockMediaServices::new());
    let engine = RefinementEngine::new(services.clone());
    engine.cancel();

    let err = engine
        .run(GenerationIntent::create("a sunset"), config(3), None)
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::Cancelled));
    assert_eq!(services.generate_call_count(), 0);
}

// ============================================================================
// Planner integration and progress events
// ============================================================================

#[tokio::test]
async fn test_planned_prompt_drives_second_iteration() {
    let services = Arc::new(
        MockMediaServices::new()
            .with_judge_replies(&[
                &unsatisfied_reply("hat is missing", "add a tall red hat"),
                &satisfied_reply(),
            ])
            // Pre-analysis, initial-prompt, then next-prompt replies.
            .with_narrate_reply(NarrationResponse::text("a woman by a window"))
            .with_narrate_reply(NarrationResponse::text(
                "Add a hat to the woman, keep everything else unchanged.",
            ))
            .with_narrate_reply(NarrationResponse::text(
                "Add a tall red hat, keep everything else unchanged.",
            )),
    );
    let engine = RefinementEngine::new(services.clone());

    let intent = GenerationIntent::edit("add a hat", vec![reference_artifact(640, 480)]);
    let mut run_config = config(3);
    run_config.planning_model = Some("gemini-2.5-flash".to_string());

    let result = engine.run(intent, run_config, None).await.unwrap();

    assert!(result.success);
    assert_eq!(result.total_iterations, 2);
    assert_eq!(
        result.iterations[0].prompt_used,
        "Add a hat to the woman, keep everything else unchanged."
    );
    assert_eq!(
        result.iterations[1].prompt_used,
        "Add a tall red hat, keep everything else unchanged."
    );
    // Pre-analysis + initial prompt + one next-prompt planning call.
    assert_eq!(services.narrate_call_count(), 3);
}

#[tokio::test]
async fn test_progress_events_are_emitted_in_order() {
    let services = Arc::new(MockMediaServices::new().with_judge_replies(&[
        &unsatisfied_reply("hat is missing", "add the hat"),
        &satisfied_reply(),
    ]));
    let engine = RefinementEngine::new(services);

    let (tx, mut rx) = mpsc::unbounded_channel();
    let result = engine
        .run(GenerationIntent::create("add a hat"), config(3), Some(tx))
        .await
        .unwrap();
    assert!(result.success);

    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }

    assert!(matches!(events.first(), Some(RefinementEvent::Started { .. })));
    assert!(matches!(
        events.last(),
        Some(RefinementEvent::Completed {
            success: true,
            total_iterations: 2
        })
    ));
    assert!(events
        .iter()
        .any(|e| matches!(e, RefinementEvent::IterationStarted { iteration: 2 })));
    assert!(events
        .iter()
        .any(|e| matches!(e, RefinementEvent::PromptPlanned { iteration: 1, .. })));
    assert!(events
        .iter()
        .any(|e| matches!(e, RefinementEvent::ArtifactProduced { .. })));
}

#[tokio::test]
async fn test_dropped_event_receiver_does_not_break_run() {
    let services = Arc::new(MockMediaServices::new().with_judge_replies(&[&satisfied_reply()]));
    let engine = RefinementEngine::new(services);

    let (tx, rx) = mpsc::unbounded_channel();
    drop(rx);

    let result = engine
        .run(GenerationIntent::create("a sunset"), config(1), Some(tx))
        .await
        .unwrap();
    assert!(result.success);
}
