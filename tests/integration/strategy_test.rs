//! Continuation Strategy Classification Tests
//!
//! The selector is entirely rule-based — no model calls are made. These
//! tests cover each keyword table, the priority ordering, and the safe
//! default.

use atelier_engine::models::ContinuationStrategy;
use atelier_engine::services::refinement::classify;

fn issues(texts: &[&str]) -> Vec<String> {
    texts.iter().map(|t| t.to_string()).collect()
}

#[test]
fn test_identity_issues_restart_fresh() {
    for issue in [
        "face looks wrong",
        "the person appears older",
        "subject identity drifted",
        "facial features changed",
        "body proportions are off",
    ] {
        assert_eq!(
            classify(&issues(&[issue])),
            ContinuationStrategy::Fresh,
            "expected Fresh for {:?}",
            issue
        );
    }
}

#[test]
fn test_background_issues_restart_fresh() {
    for issue in [
        "the background was replaced",
        "setting moved indoors",
        "environment looks different",
        "scene no longer matches",
    ] {
        assert_eq!(classify(&issues(&[issue])), ContinuationStrategy::Fresh);
    }
}

#[test]
fn test_clothing_issues_restart_fresh() {
    for issue in [
        "clothing changed completely",
        "wrong outfit on the left subject",
        "the shirt is now long-sleeved",
    ] {
        assert_eq!(classify(&issues(&[issue])), ContinuationStrategy::Fresh);
    }
}

#[test]
fn test_quality_issues_continue_progressively() {
    for issue in [
        "slightly dark lighting",
        "low quality output",
        "too much contrast",
        "image is blurry",
        "colors look washed out from low saturation",
    ] {
        assert_eq!(
            classify(&issues(&[issue])),
            ContinuationStrategy::Progressive,
            "expected Progressive for {:?}",
            issue
        );
    }
}

#[test]
fn test_empty_issue_list_defaults_fresh() {
    assert_eq!(classify(&[]), ContinuationStrategy::Fresh);
}

#[test]
fn test_unrecognized_issue_defaults_fresh() {
    assert_eq!(
        classify(&issues(&["the requested text overlay is absent"])),
        ContinuationStrategy::Fresh
    );
}

#[test]
fn test_priority_order_subject_beats_quality() {
    assert_eq!(
        classify(&issues(&["lighting too dim", "face looks wrong"])),
        ContinuationStrategy::Fresh
    );
}

#[test]
fn test_priority_order_background_beats_quality() {
    assert_eq!(
        classify(&issues(&["brightness is off", "background swapped"])),
        ContinuationStrategy::Fresh
    );
}

#[test]
fn test_classification_is_deterministic() {
    let input = issues(&["slightly dark lighting"]);
    let first = classify(&input);
    for _ in 0..10 {
        assert_eq!(classify(&input), first);
    }
}
