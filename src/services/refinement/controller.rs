//! Iteration Controller
//!
//! Drives the generate → verify → re-plan loop for one refinement run.
//! The run's mode (create vs. edit) is fixed before the loop starts and
//! never changes: edit iterations always condition on the run's ORIGINAL
//! reference artifacts, never on a prior iteration's output, so every
//! attempt starts from the same ground truth and only the instruction
//! text evolves. A create run that fails an iteration does not adopt its
//! own output as a reference.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::models::{
    ArtifactAnalysis, GenerationIntent, Iteration, RefinementConfig, RunMode, RunResult,
};
use crate::services::media::MediaServices;
use crate::utils::error::{EngineError, EngineResult};

use super::events::RefinementEvent;
use super::{analysis, planner, verifier};

/// Closed-loop refinement engine.
///
/// Entirely sequential within a run: one generator call, one verifier
/// call, and at most one planner call per iteration. Iteration N's prompt
/// depends on iteration N-1's verdict, so there is no parallelism to
/// exploit and the trace is only ever appended to by this single control
/// path.
pub struct RefinementEngine {
    services: Arc<dyn MediaServices>,
    cancellation_token: CancellationToken,
}

impl RefinementEngine {
    /// Create an engine over the given media services.
    pub fn new(services: Arc<dyn MediaServices>) -> Self {
        Self {
            services,
            cancellation_token: CancellationToken::new(),
        }
    }

    /// Get the cancellation token
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation_token.clone()
    }

    /// Cancel the run at the next iteration boundary
    pub fn cancel(&self) {
        self.cancellation_token.cancel();
    }

    /// Run one refinement loop from intent to terminal result.
    ///
    /// `event_tx` receives progress notifications; pass None to run
    /// silently. Returns an error on transport or pre-analysis failure,
    /// with no partial result exposed.
    pub async fn run(
        &self,
        intent: GenerationIntent,
        config: RefinementConfig,
        event_tx: Option<mpsc::UnboundedSender<RefinementEvent>>,
    ) -> EngineResult<RunResult> {
        if intent.text.trim().is_empty() {
            return Err(EngineError::validation("intent text is empty"));
        }

        let max_iterations = config.effective_max_iterations();
        if max_iterations != config.max_iterations {
            warn!(
                requested = config.max_iterations,
                clamped = max_iterations,
                "max_iterations outside valid range, clamped"
            );
        }

        // Mode is fixed for the entire run.
        let mode = if intent.is_edit() {
            RunMode::Edit
        } else {
            RunMode::Create
        };

        info!(%mode, max_iterations, "starting refinement run");
        emit(
            &event_tx,
            RefinementEvent::Started {
                mode,
                max_iterations,
            },
        );

        // Edit runs are analyzed exactly once, before the loop. A failure
        // here is fatal: editing without preservation constraints risks
        // uncontrolled drift.
        let reference_analysis: Option<ArtifactAnalysis> = match mode {
            RunMode::Edit => {
                let analysis = analysis::analyze(
                    self.services.as_ref(),
                    &config.verification_model,
                    &intent.references,
                    &intent.text,
                )
                .await?;
                emit(
                    &event_tx,
                    RefinementEvent::AnalysisCompleted {
                        subject_count: analysis.subject_count(),
                    },
                );
                Some(analysis)
            }
            RunMode::Create => None,
        };

        let mut prompt = match (&mode, &reference_analysis) {
            (RunMode::Edit, Some(analysis)) => {
                planner::initial_prompt(
                    self.services.as_ref(),
                    config.planning_model.as_deref(),
                    &intent.text,
                    analysis,
                )
                .await
            }
            _ => intent.text.clone(),
        };

        let reference_dimensions = intent.reference_dimensions();
        let mut iterations: Vec<Iteration> = Vec::new();

        for i in 1..=max_iterations {
            if self.cancellation_token.is_cancelled() {
                info!(iteration = i, "run cancelled");
                return Err(EngineError::Cancelled);
            }

            let started_at = chrono::Utc::now().to_rfc3339();
            emit(&event_tx, RefinementEvent::IterationStarted { iteration: i });
            debug!(iteration = i, prompt = %prompt, "generating artifact");

            let artifact = match mode {
                RunMode::Create => {
                    self.services
                        .generate(&prompt, None, None, &config.generation_model)
                        .await?
                }
                RunMode::Edit => {
                    self.services
                        .generate(
                            &prompt,
                            Some(&intent.references),
                            reference_dimensions,
                            &config.generation_model,
                        )
                        .await?
                }
            };
            emit(
                &event_tx,
                RefinementEvent::ArtifactProduced {
                    iteration: i,
                    artifact_id: artifact.id.clone(),
                },
            );

            // Edit mode shows the judge the originals alongside the new
            // artifact so before/after changes are visible.
            let judged: Vec<_> = match mode {
                RunMode::Create => vec![artifact.clone()],
                RunMode::Edit => intent
                    .references
                    .iter()
                    .cloned()
                    .chain(std::iter::once(artifact.clone()))
                    .collect(),
            };
            let verification = verifier::verify(
                self.services.as_ref(),
                &config.verification_model,
                &judged,
                &intent.text,
                mode == RunMode::Edit,
            )
            .await?;
            emit(
                &event_tx,
                RefinementEvent::VerificationCompleted {
                    iteration: i,
                    satisfied: verification.satisfied,
                    issue_count: verification.issues.len(),
                },
            );

            iterations.push(Iteration {
                number: i,
                artifact: artifact.clone(),
                prompt_used: prompt.clone(),
                verification: verification.clone(),
                analysis: (i == 1).then(|| reference_analysis.clone()).flatten(),
                started_at,
            });

            if verification.satisfied {
                info!(iteration = i, "verifier satisfied, run succeeded");
                emit(
                    &event_tx,
                    RefinementEvent::Completed {
                        success: true,
                        total_iterations: i,
                    },
                );
                return Ok(RunResult {
                    final_artifact: artifact,
                    iterations,
                    success: true,
                    total_iterations: i,
                });
            }

            if i < max_iterations {
                info!(
                    iteration = i,
                    strategy = %verification.recommended_strategy,
                    "iteration unsatisfied, planning next prompt"
                );
                prompt = planner::next_prompt(
                    self.services.as_ref(),
                    config.planning_model.as_deref(),
                    &intent.text,
                    &verification,
                    reference_analysis.as_ref(),
                )
                .await;
                emit(
                    &event_tx,
                    RefinementEvent::PromptPlanned {
                        iteration: i,
                        strategy: verification.recommended_strategy,
                    },
                );
            }
        }

        info!(max_iterations, "iteration budget exhausted");
        emit(
            &event_tx,
            RefinementEvent::Completed {
                success: false,
                total_iterations: max_iterations,
            },
        );

        let final_artifact = iterations
            .last()
            .map(|it| it.artifact.clone())
            .ok_or_else(|| EngineError::internal("no iterations executed"))?;

        Ok(RunResult {
            final_artifact,
            iterations,
            success: false,
            total_iterations: max_iterations,
        })
    }
}

/// Send a notification, ignoring a closed or absent receiver.
fn emit(event_tx: &Option<mpsc::UnboundedSender<RefinementEvent>>, event: RefinementEvent) {
    if let Some(tx) = event_tx {
        let _ = tx.send(event);
    }
}
