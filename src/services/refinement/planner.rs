//! Prompt Planner
//!
//! Synthesizes the next iteration's edit instruction from the original
//! intent, the latest verdict, and the pre-analysis. Planning is the one
//! model call the loop can always survive: refusals, empty replies, and
//! transport failures all collapse to a deterministic fallback prompt, so
//! these functions return a plain `String` and never fail.

use tracing::warn;

use crate::models::{ArtifactAnalysis, VerificationResult};
use crate::services::media::MediaServices;

/// Soft word cap quoted in the planning instruction. Not enforced by
/// truncation; over-length prompts still work, they just cost quality.
const SOFT_WORD_CAP: usize = 60;

/// Case-insensitive markers of a refusal or apology reply.
const REFUSAL_MARKERS: &[&str] = &["cannot", "unable", "sorry", "apologize", "i can't", "i won't"];

/// True for replies that cannot be used as a generation prompt.
fn is_unusable(text: &str) -> bool {
    if text.trim().is_empty() {
        return true;
    }
    let lowered = text.to_lowercase();
    REFUSAL_MARKERS.iter().any(|m| lowered.contains(m))
}

/// Deterministic quality-enhancement prompt derived from the intent alone.
fn enhancement_prompt(intent_text: &str) -> String {
    format!(
        "{}. Enhance visual quality: improve lighting, composition, detail, color.",
        intent_text
    )
}

/// The fallback used when planning is unavailable or unusable: prefer the
/// verifier's own suggested edit, else synthesize from the intent.
pub fn fallback_prompt(intent_text: &str, verification: &VerificationResult) -> String {
    let suggested = verification.suggested_edit.trim();
    if !suggested.is_empty() {
        return suggested.to_string();
    }
    enhancement_prompt(intent_text)
}

/// System instruction for the planning model.
fn planning_instruction() -> String {
    format!(
        "You write single-instruction edit prompts for an image generator. \
         Reply with ONE instruction of at most {} words. Lead with the required \
         change; defer preservation to a generic closing phrase such as \
         'keep everything else unchanged'. No preamble, no quotes, no lists.",
        SOFT_WORD_CAP
    )
}

/// User context for a next-iteration planning call.
fn planning_context(
    intent_text: &str,
    verification: &VerificationResult,
    analysis: Option<&ArtifactAnalysis>,
) -> String {
    let mut context = format!("Original request: {}\n", intent_text);

    if !verification.issues.is_empty() {
        context.push_str("Issues found in the latest attempt:\n");
        for issue in &verification.issues {
            context.push_str(&format!("- {}\n", issue));
        }
    }
    if !verification.suggested_edit.trim().is_empty() {
        context.push_str(&format!(
            "Judge's suggested edit: {}\n",
            verification.suggested_edit.trim()
        ));
    }
    if let Some(analysis) = analysis {
        context.push_str(&format!(
            "Preservation constraints: {}\n",
            analysis.preservation_instructions
        ));
    }

    context.push_str("Write the next edit instruction.");
    context
}

/// Derive the next iteration's prompt.
///
/// Never returns an empty string and never errors; the loop can always
/// proceed to its next iteration.
pub async fn next_prompt(
    services: &dyn MediaServices,
    planning_model: Option<&str>,
    intent_text: &str,
    verification: &VerificationResult,
    analysis: Option<&ArtifactAnalysis>,
) -> String {
    let Some(model) = planning_model else {
        return fallback_prompt(intent_text, verification);
    };

    let instruction = planning_instruction();
    let context = planning_context(intent_text, verification, analysis);

    match services.narrate(&instruction, &context, None, model).await {
        Ok(response) => {
            let text = response.primary_text().trim().to_string();
            if is_unusable(&text) {
                warn!("planning reply unusable, using fallback prompt");
                fallback_prompt(intent_text, verification)
            } else {
                text
            }
        }
        Err(e) => {
            warn!(error = %e, "planning call failed, using fallback prompt");
            fallback_prompt(intent_text, verification)
        }
    }
}

/// Seed prompt for the first iteration of an edit run.
///
/// With a planning model configured, asks it to phrase the edit with the
/// analysis's constraints folded in; otherwise (or on refusal/failure)
/// uses the analysis's own preservation instructions.
pub async fn initial_prompt(
    services: &dyn MediaServices,
    planning_model: Option<&str>,
    intent_text: &str,
    analysis: &ArtifactAnalysis,
) -> String {
    let Some(model) = planning_model else {
        return seed_from_analysis(intent_text, analysis);
    };

    let instruction = planning_instruction();
    let context = format!(
        "Original request: {}\nPreservation constraints: {}\nWrite the first edit instruction.",
        intent_text, analysis.preservation_instructions
    );

    match services.narrate(&instruction, &context, None, model).await {
        Ok(response) => {
            let text = response.primary_text().trim().to_string();
            if is_unusable(&text) {
                warn!("initial planning reply unusable, seeding from analysis");
                seed_from_analysis(intent_text, analysis)
            } else {
                text
            }
        }
        Err(e) => {
            warn!(error = %e, "initial planning call failed, seeding from analysis");
            seed_from_analysis(intent_text, analysis)
        }
    }
}

fn seed_from_analysis(intent_text: &str, analysis: &ArtifactAnalysis) -> String {
    let instructions = analysis.preservation_instructions.trim();
    if instructions.is_empty() {
        return enhancement_prompt(intent_text);
    }
    instructions.to_string()
}
