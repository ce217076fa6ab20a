//! JSON Extraction
//!
//! Helpers for pulling a JSON payload out of an LLM response. Models asked
//! for JSON routinely wrap it in markdown fences or surround it with prose,
//! so parsing goes through these helpers before `serde_json`.

/// Extract the first JSON object from a text that may contain markdown fences.
///
/// Tries, in order: a ```json fenced block, a generic fenced block whose
/// content starts with `{`, and finally the slice from the first `{` to the
/// last `}`.
pub fn extract_json_object(text: &str) -> Option<String> {
    if let Some(start) = text.find("```json") {
        let after_fence = &text[start + 7..];
        if let Some(end) = after_fence.find("```") {
            return Some(after_fence[..end].trim().to_string());
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
    if let Some(start) = text.find('{') {
        if let Some(end) = text.rfind('}') {
            if end > start {
                return Some(text[start..=end].to_string());
            }
        }
    }
    None
}

/// Extract and parse a JSON object in one step.
pub fn parse_json_object(text: &str) -> Option<serde_json::Value> {
    let raw = extract_json_object(text)?;
    serde_json::from_str(&raw).ok()
}

/// Strip a single surrounding markdown code fence, if present.
///
/// Used for generated code snippets, where the payload is not JSON and the
/// whole fenced body should be kept as-is.
pub fn strip_code_fences(text: &str) -> String {
    let trimmed = text.trim();
    if let Some(rest) = trimmed.strip_prefix("```") {
        let body = match rest.find('\n') {
            Some(nl) => &rest[nl + 1..],
            None => rest,
        };
        if let Some(end) = body.rfind("```") {
            return body[..end].trim().to_string();
        }
    }
    trimmed.to_string()
}
