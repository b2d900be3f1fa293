// Response sanitization.
// LLM output is untrusted text. Everything that reaches the merge engine
// goes through `extract_json` first.

use serde_json::Value;
use thiserror::Error;

use crate::models::resume::Section;

#[derive(Debug, Error)]
pub enum SanitizeError {
    #[error("no JSON found in model output")]
    NoJson,

    #[error("failed to parse model output as JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("parsed object contains no recognized resume section")]
    NoRecognizedSection,
}

/// Extracts a JSON Resume candidate from raw model output.
///
/// Strips markdown code fences, slices out the outermost object when the
/// model wrapped it in prose, parses, and rejects objects that carry no
/// recognized top-level section key. Bare arrays pass through; the
/// normalizer wraps them under the suggested section.
pub fn extract_json(raw: &str) -> Result<Value, SanitizeError> {
    let text = strip_json_fences(raw);

    let candidate = if text.starts_with('{') || text.starts_with('[') {
        text
    } else {
        let start = text.find('{').ok_or(SanitizeError::NoJson)?;
        let end = text.rfind('}').ok_or(SanitizeError::NoJson)?;
        if end <= start {
            return Err(SanitizeError::NoJson);
        }
        &text[start..=end]
    };

    let value: Value = serde_json::from_str(candidate)?;

    if let Value::Object(map) = &value {
        let recognized = Section::ALL.iter().any(|s| map.contains_key(s.key()));
        if !recognized {
            return Err(SanitizeError::NoRecognizedSection);
        }
    }

    Ok(value)
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}
