//! Continuation Strategy Selector
//!
//! Maps verifier-reported issues to a continuation strategy using
//! rule-based keyword tables, evaluated in fixed priority order with
//! first match winning. Pure function: no model calls, no state, fully
//! testable independent of the controller.
//!
//! Identity drift is the highest-severity failure, so subject-related
//! issues always classify as `Fresh` (restart from the original
//! references) before any other rule is consulted.

use crate::models::ContinuationStrategy;

/// Subject/identity terms. Rule 1: any hit restarts fresh.
const SUBJECT_TERMS: &[&str] = &[
    "face", "facial", "identity", "person", "people", "subject", "body", "head", "expression",
    "likeness",
];

/// Background/setting terms. Rule 2: fresh.
const BACKGROUND_TERMS: &[&str] = &[
    "background",
    "backdrop",
    "setting",
    "environment",
    "scene",
    "surroundings",
];

/// Clothing terms. Rule 3: fresh.
const CLOTHING_TERMS: &[&str] = &[
    "clothing", "clothes", "outfit", "garment", "shirt", "dress", "jacket", "wearing",
];

/// Quality/lighting terms. Rule 4: progressive polish.
const QUALITY_TERMS: &[&str] = &[
    "quality",
    "lighting",
    "brightness",
    "contrast",
    "sharpness",
    "blurry",
    "blur",
    "dark",
    "dim",
    "exposure",
    "overexposed",
    "underexposed",
    "saturation",
    "color",
    "colour",
    "noise",
    "grain",
];

/// Classification rules in priority order.
const RULES: &[(&[&str], ContinuationStrategy)] = &[
    (SUBJECT_TERMS, ContinuationStrategy::Fresh),
    (BACKGROUND_TERMS, ContinuationStrategy::Fresh),
    (CLOTHING_TERMS, ContinuationStrategy::Fresh),
    (QUALITY_TERMS, ContinuationStrategy::Progressive),
];

/// Classify verifier issues into a continuation strategy.
///
/// The default is `Fresh`: when the issues match no table (or there are
/// none), restarting from the original references is the safe choice.
pub fn classify(issues: &[String]) -> ContinuationStrategy {
    let lowered: Vec<String> = issues.iter().map(|i| i.to_lowercase()).collect();

    for (terms, strategy) in RULES {
        let hit = lowered
            .iter()
            .any(|issue| terms.iter().any(|term| issue.contains(term)));
        if hit {
            return *strategy;
        }
    }

    ContinuationStrategy::Fresh
}
