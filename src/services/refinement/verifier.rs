//! Vision Verifier
//!
//! Sends the current artifact(s) plus the original intent to a
//! vision-capable model and parses a structured verdict out of whatever
//! text comes back. Decoding is defensive: fences are stripped and the
//! first balanced JSON object is used. When decoding fails entirely the
//! verifier fails open (`satisfied = true`) — blocking the whole run
//! because the judge replied in prose is worse than one false-positive
//! "good enough", and the caller can still inspect the artifact.

use serde::Deserialize;
use tracing::{debug, warn};

use atelier_core::parse::decode_json;

use crate::models::{Artifact, VerificationResult};
use crate::services::media::MediaServices;
use crate::utils::error::EngineResult;

use super::strategy;

/// The JSON shape the judge model is instructed to emit.
///
/// `recommendedStrategy` is intentionally absent: the strategy is derived
/// locally from the issues, not trusted from the model.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VerdictWire {
    satisfied: bool,
    #[serde(default)]
    issues: Vec<String>,
    #[serde(default)]
    suggested_edit: String,
}

/// Build the structured-judgment instruction for the judge model.
pub fn judgment_instruction(intent_text: &str, comparing_references: bool) -> String {
    let comparison_note = if comparing_references {
        "The earlier image(s) are the ORIGINAL references; the last image is the edited result. \
         Compare them: anything that changed without being requested is an issue.\n\n"
    } else {
        ""
    };

    format!(
        r#"You are a strict visual quality judge. Decide whether the final image fulfils this request:

"{}"

{}Respond with ONLY a JSON object in this exact format:
{{
  "satisfied": false,
  "issues": ["most important issue first", "next issue"],
  "suggestedEdit": "one concrete edit instruction that would fix the issues"
}}

If the request is fulfilled with no outstanding issues, respond:
{{
  "satisfied": true,
  "issues": [],
  "suggestedEdit": ""
}}"#,
        intent_text, comparison_note
    )
}

/// Judge `artifacts` against the original intent.
///
/// Transport failures propagate; decode failures do not.
pub async fn verify(
    services: &dyn MediaServices,
    model: &str,
    artifacts: &[Artifact],
    intent_text: &str,
    comparing_references: bool,
) -> EngineResult<VerificationResult> {
    let instruction = judgment_instruction(intent_text, comparing_references);
    let reply = services.judge(artifacts, &instruction, model).await?;
    Ok(parse_verdict(&reply))
}

/// Decode the judge's reply into a normalized [`VerificationResult`].
///
/// Fails open on any decode failure.
pub fn parse_verdict(reply: &str) -> VerificationResult {
    match decode_json::<VerdictWire>(reply) {
        Ok(wire) => {
            let recommended_strategy = strategy::classify(&wire.issues);
            debug!(
                satisfied = wire.satisfied,
                issue_count = wire.issues.len(),
                %recommended_strategy,
                "decoded judgment"
            );
            VerificationResult {
                satisfied: wire.satisfied,
                issues: wire.issues,
                suggested_edit: wire.suggested_edit,
                recommended_strategy,
            }
            .normalize()
        }
        Err(e) => {
            warn!(error = %e, "judgment decode failed, failing open");
            VerificationResult::satisfied()
        }
    }
}
