//! Reference Pre-Analysis
//!
//! Before an edit run's first iteration, the reference artifact is
//! described once by a vision model: subjects, clothing, background,
//! salient objects. The description seeds preservation constraints for
//! every planner call in the run.
//!
//! Parsing is a chain of fallback tiers — direct JSON decode, decode from
//! the reasoning channel, regex best-effort extraction — ending in a
//! minimal single-subject analysis. Only a transport failure of the
//! narration call itself is fatal: an edit must not proceed without
//! ground-truth preservation constraints, but a scruffy description is
//! still better than none.

use regex::Regex;
use tracing::{debug, warn};

use atelier_core::parse::decode_json;

use crate::models::{Artifact, ArtifactAnalysis, AttachedItem, SubjectDescription};
use crate::services::media::{MediaServices, NarrationResponse};
use crate::utils::error::EngineResult;

/// Salient object nouns recognized by the tier-3 extractor.
const OBJECT_TERMS: &[&str] = &[
    "car", "tree", "table", "chair", "building", "dog", "cat", "flower", "mountain", "beach",
    "window", "door", "guitar", "book", "cup", "lamp", "bridge", "boat",
];

/// System instruction asking the vision model for the analysis JSON shape.
fn extraction_instruction() -> String {
    r#"Describe the supplied image(s) for a photo editor. Respond with ONLY a JSON object in this exact format:
{
  "hasSubjects": true,
  "subjects": [{"id": "subject-1", "location": "left third", "description": "woman in her thirties"}],
  "attachedItems": [{"item": "shirt", "attribute": "red", "location": "on subject-1"}],
  "backgroundDescription": "city street at dusk",
  "salientObjects": ["bicycle", "street lamp"]
}
List every person as a subject. List clothing and accessories as attached items. Do not add fields."#
        .to_string()
}

/// Analyze the reference artifacts for an edit run.
///
/// Transport failure is returned as an error (fatal to the run); every
/// parsing failure degrades through the fallback tiers instead.
pub async fn analyze(
    services: &dyn MediaServices,
    model: &str,
    references: &[Artifact],
    intent_text: &str,
) -> EngineResult<ArtifactAnalysis> {
    let instruction = extraction_instruction();
    let response = services
        .narrate(&instruction, intent_text, Some(references), model)
        .await?;
    Ok(build_analysis(&response, intent_text))
}

/// Run the parse tiers over a narration response.
pub fn build_analysis(response: &NarrationResponse, intent_text: &str) -> ArtifactAnalysis {
    let primary = response.primary_text();
    let reasoning = response.reasoning_text();

    // Tier 1: direct decode of the answer channel.
    if !primary.trim().is_empty() {
        if let Ok(analysis) = decode_json::<ArtifactAnalysis>(primary) {
            debug!("analysis decoded from answer channel");
            return finalize(analysis, intent_text);
        }
    } else if !reasoning.trim().is_empty() {
        // Tier 2: some models leave the answer channel empty and put the
        // JSON in the reasoning channel instead.
        if let Ok(analysis) = decode_json::<ArtifactAnalysis>(reasoning) {
            debug!("analysis decoded from reasoning channel");
            return finalize(analysis, intent_text);
        }
    }

    // Tier 3: regex best-effort extraction from whatever text exists.
    let text = if primary.trim().is_empty() {
        reasoning
    } else {
        primary
    };
    if let Some(analysis) = heuristic_analysis(text) {
        warn!("analysis JSON unusable, extracted heuristically");
        return finalize(analysis, intent_text);
    }

    // Terminal fallback: a minimal one-subject analysis.
    warn!("all analysis tiers failed, using minimal analysis");
    let preservation = synthesize_preservation(intent_text, &[]);
    ArtifactAnalysis::minimal(preservation)
}

/// Normalize a decoded analysis and attach synthesized preservation
/// instructions.
fn finalize(mut analysis: ArtifactAnalysis, intent_text: &str) -> ArtifactAnalysis {
    analysis.has_subjects = !analysis.subjects.is_empty();
    analysis.preservation_instructions = synthesize_preservation(intent_text, &analysis.subjects);
    analysis
}

/// Build the preservation instruction for the run.
///
/// With more than one subject, the co-occurring subjects are named
/// explicitly so multi-subject edits call out what must remain unchanged.
pub fn synthesize_preservation(intent_text: &str, subjects: &[SubjectDescription]) -> String {
    let mut out = format!(
        "{}. Preserve original clothing, hair, pose, and background exactly. Do not alter other elements.",
        intent_text
    );

    if subjects.len() > 1 {
        let names: Vec<&str> = subjects
            .iter()
            .map(|s| {
                if s.description.is_empty() {
                    s.id.as_str()
                } else {
                    s.description.as_str()
                }
            })
            .collect();
        out.push_str(&format!(
            " The scene contains {} subjects ({}); keep every subject not named in the instruction unchanged.",
            subjects.len(),
            names.join(", ")
        ));
    }

    out
}

/// Tier-3 extraction: pull subject counts, clothing color-item pairs, and
/// salient object names out of unstructured prose. Returns None when
/// nothing at all was recognized.
fn heuristic_analysis(text: &str) -> Option<ArtifactAnalysis> {
    if text.trim().is_empty() {
        return None;
    }

    let subjects = extract_subjects(text);
    let attached_items = extract_attached_items(text);
    let salient_objects = extract_salient_objects(text);

    if subjects.is_empty() && attached_items.is_empty() && salient_objects.is_empty() {
        return None;
    }

    Some(ArtifactAnalysis {
        has_subjects: !subjects.is_empty(),
        subjects,
        attached_items,
        background_description: String::new(),
        salient_objects,
        preservation_instructions: String::new(),
    })
}

fn extract_subjects(text: &str) -> Vec<SubjectDescription> {
    let counted = Regex::new(
        r"(?i)\b(one|two|three|four|five|six|\d+)\s+(person|people|man|men|woman|women|subject|subjects|figure|figures|child|children)\b",
    )
    .ok();
    let bare = Regex::new(r"(?i)\b(person|man|woman|child|figure)\b").ok();

    let mut count = 0usize;
    let mut noun = String::new();

    if let Some(re) = counted {
        for caps in re.captures_iter(text) {
            let n = word_to_count(&caps[1]);
            if n > count {
                count = n;
                noun = caps[2].to_lowercase();
            }
        }
    }
    if count == 0 {
        if let Some(re) = bare {
            if let Some(caps) = re.captures(text) {
                count = 1;
                noun = caps[1].to_lowercase();
            }
        }
    }

    (1..=count)
        .map(|i| SubjectDescription {
            id: format!("subject-{}", i),
            location: String::new(),
            description: noun.clone(),
        })
        .collect()
}

fn extract_attached_items(text: &str) -> Vec<AttachedItem> {
    let re = Regex::new(
        r"(?i)\b(red|blue|green|black|white|yellow|orange|purple|pink|brown|gray|grey|gold|silver)\s+(shirt|t-shirt|dress|jacket|coat|hat|pants|trousers|skirt|shoes|scarf|tie|suit|sweater|top)\b",
    )
    .ok();

    let Some(re) = re else {
        return Vec::new();
    };

    let mut items = Vec::new();
    for caps in re.captures_iter(text) {
        let attribute = caps[1].to_lowercase();
        let item = caps[2].to_lowercase();
        let duplicate = items
            .iter()
            .any(|existing: &AttachedItem| existing.item == item && existing.attribute == attribute);
        if !duplicate {
            items.push(AttachedItem {
                item,
                attribute,
                location: String::new(),
            });
        }
    }
    items
}

fn extract_salient_objects(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    OBJECT_TERMS
        .iter()
        .filter(|term| lowered.contains(*term))
        .map(|term| term.to_string())
        .collect()
}

fn word_to_count(word: &str) -> usize {
    match word.to_lowercase().as_str() {
        "one" => 1,
        "two" => 2,
        "three" => 3,
        "four" => 4,
        "five" => 5,
        "six" => 6,
        other => other.parse().unwrap_or(0),
    }
}
