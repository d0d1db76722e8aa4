//! Defensive JSON Extraction
//!
//! Vision and planning models are asked to reply with a bare JSON object,
//! but in practice the object arrives wrapped in markdown fences, prefixed
//! with prose, or followed by commentary. This module pulls the first
//! balanced brace-delimited object out of whatever text the model produced.

use serde::de::DeserializeOwned;

use crate::error::{CoreError, CoreResult};

/// Extract the first JSON object embedded anywhere in `text`.
///
/// Tries, in order:
/// 1. A ```` ```json ```` fenced block
/// 2. Any fenced block whose content starts with `{`
/// 3. The first balanced `{...}` span in the raw text
pub fn extract_json_object(text: &str) -> Option<String> {
    if let Some(start) = text.find("```json") {
        let after_fence = &text[start + 7..];
        if let Some(end) = after_fence.find("```") {
            let content = after_fence[..end].trim();
            if !content.is_empty() {
                return Some(content.to_string());
            }
        }
    }
    if let Some(start) = text.find("```") {
        let after_fence = &text[start + 3..];
        let after_lang = if let Some(nl) = after_fence.find('\n') {
            &after_fence[nl + 1..]
        } else {
            after_fence
        };
        if let Some(end) = after_lang.find("```") {
            let content = after_lang[..end].trim();
            if content.starts_with('{') {
                return Some(content.to_string());
            }
        }
    }
    first_balanced_object(text)
}

/// Scan for the first `{` and return the span up to its matching `}`.
///
/// Braces inside string literals are ignored, so a value like
/// `{"note": "use {braces} sparingly"}` extracts correctly.
fn first_balanced_object(text: &str) -> Option<String> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(text[start..start + offset + ch.len_utf8()].to_string());
                }
            }
            _ => {}
        }
    }
    None
}

/// Extract and decode the first JSON object in `text` into `T`.
pub fn decode_json<T: DeserializeOwned>(text: &str) -> CoreResult<T> {
    let json_str = extract_json_object(text)
        .ok_or_else(|| CoreError::parse("no JSON object found in model output"))?;
    Ok(serde_json::from_str(&json_str)?)
}
