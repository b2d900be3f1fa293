// Additive merge of extraction candidates into the stored document.
// The candidate is assumed normalized (see normalize.rs). Merging never
// removes or shrinks existing content; an empty candidate value for a path
// is ignored.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::models::resume::{ResumeDocument, Section};

/// How list entries are recognized as duplicates of each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicateMatch {
    /// Identity fields (work: name+position, education: institution+studyType,
    /// most others: name) compared case-insensitively after trimming.
    #[default]
    ExactCaseInsensitive,
}

#[derive(Debug, Clone, Default)]
pub struct MergePolicy {
    pub duplicate_match: DuplicateMatch,
}

#[derive(Debug, Error)]
pub enum MergeError {
    #[error("merged document no longer matches the resume shape: {0}")]
    Shape(#[from] serde_json::Error),
}

/// Merges a candidate into the typed document.
pub fn merge_documents(
    current: &ResumeDocument,
    candidate: &Value,
    policy: &MergePolicy,
) -> Result<ResumeDocument, MergeError> {
    let current_value = serde_json::to_value(current)?;
    let merged = merge_value_documents(&current_value, candidate, policy);
    Ok(serde_json::from_value(merged)?)
}

/// Pure value-level merge. For every recognized section present with
/// non-empty value in the candidate: adopt it wholesale when the current
/// slot is empty, otherwise add to it (append non-duplicate list entries,
/// fill gaps in basics). Unrecognized keys are ignored.
pub fn merge_value_documents(current: &Value, candidate: &Value, policy: &MergePolicy) -> Value {
    let mut out = match current {
        Value::Object(map) => map.clone(),
        _ => Map::new(),
    };
    let Value::Object(cand) = candidate else {
        return Value::Object(out);
    };

    for (key, cand_value) in cand {
        if is_empty_value(cand_value) {
            continue;
        }
        let Some(section) = Section::parse(key) else {
            continue;
        };

        let slot_empty = out.get(key).map_or(true, is_empty_value);
        if slot_empty {
            out.insert(key.clone(), cand_value.clone());
            continue;
        }
        if let Some(existing) = out.get(key).cloned() {
            let merged = if section == Section::Basics {
                merge_scalar_object(&existing, cand_value)
            } else {
                merge_entries(section, &existing, cand_value, policy)
            };
            out.insert(key.clone(), merged);
        }
    }

    Value::Object(out)
}

/// Field-by-field merge for basics: existing non-empty scalars win, gaps
/// fill from the candidate, nested objects recurse, nested arrays append
/// entries not already present.
fn merge_scalar_object(existing: &Value, candidate: &Value) -> Value {
    let (Value::Object(exist), Value::Object(cand)) = (existing, candidate) else {
        return existing.clone();
    };

    let mut out = exist.clone();
    for (key, cand_value) in cand {
        if is_empty_value(cand_value) {
            continue;
        }
        let slot_empty = out.get(key).map_or(true, is_empty_value);
        if slot_empty {
            out.insert(key.clone(), cand_value.clone());
            continue;
        }
        if let Some(have) = out.get(key).cloned() {
            if have.is_object() && cand_value.is_object() {
                out.insert(key.clone(), merge_scalar_object(&have, cand_value));
            } else if have.is_array() && cand_value.is_array() {
                out.insert(key.clone(), append_unique(&have, cand_value));
            }
        }
    }
    Value::Object(out)
}

fn merge_entries(
    section: Section,
    existing: &Value,
    candidate: &Value,
    policy: &MergePolicy,
) -> Value {
    let (Value::Array(current), Value::Array(incoming)) = (existing, candidate) else {
        return existing.clone();
    };

    let mut out = current.clone();
    for entry in incoming {
        if is_empty_value(entry) {
            continue;
        }
        let duplicate = out
            .iter()
            .any(|have| entries_match(section, have, entry, policy));
        if !duplicate {
            out.push(entry.clone());
        }
    }
    Value::Array(out)
}

fn append_unique(existing: &Value, candidate: &Value) -> Value {
    let (Value::Array(current), Value::Array(incoming)) = (existing, candidate) else {
        return existing.clone();
    };
    let mut out = current.clone();
    for entry in incoming {
        if !is_empty_value(entry) && !out.contains(entry) {
            out.push(entry.clone());
        }
    }
    Value::Array(out)
}

fn entries_match(section: Section, a: &Value, b: &Value, policy: &MergePolicy) -> bool {
    if a == b {
        return true;
    }
    match policy.duplicate_match {
        DuplicateMatch::ExactCaseInsensitive => identity_fields_match(section, a, b),
    }
}

/// Two entries are the same logical item when every identity field agrees
/// case-insensitively and at least one identity field is actually present.
fn identity_fields_match(section: Section, a: &Value, b: &Value) -> bool {
    let mut any_present = false;
    for field in identity_fields(section) {
        let left = normalized_field(a, field);
        let right = normalized_field(b, field);
        if !left.is_empty() || !right.is_empty() {
            any_present = true;
        }
        if left != right {
            return false;
        }
    }
    any_present
}

fn normalized_field(entry: &Value, field: &str) -> String {
    entry
        .get(field)
        .and_then(Value::as_str)
        .map(|s| s.trim().to_lowercase())
        .unwrap_or_default()
}

const fn identity_fields(section: Section) -> &'static [&'static str] {
    match section {
        Section::Work => &["name", "position"],
        Section::Education => &["institution", "studyType"],
        Section::Volunteer => &["organization", "position"],
        Section::Awards => &["title"],
        Section::Languages => &["language"],
        Section::Skills
        | Section::Projects
        | Section::Interests
        | Section::Publications
        | Section::References => &["name"],
        Section::Basics => &[],
    }
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn policy() -> MergePolicy {
        MergePolicy::default()
    }

    #[test]
    fn test_adopts_sections_into_empty_document() {
        let merged = merge_value_documents(
            &json!({}),
            &json!({ "work": [{ "name": "Acme Corp", "position": "Engineer" }] }),
            &policy(),
        );
        assert_eq!(merged["work"][0]["name"], "Acme Corp");
    }

    #[test]
    fn test_appends_new_list_entries() {
        let current = json!({ "work": [{ "name": "Acme Corp", "position": "Engineer" }] });
        let candidate = json!({ "work": [{ "name": "Globex", "position": "Manager" }] });
        let merged = merge_value_documents(&current, &candidate, &policy());
        let work = merged["work"].as_array().unwrap();
        assert_eq!(work.len(), 2);
        assert_eq!(work[0]["name"], "Acme Corp");
        assert_eq!(work[1]["name"], "Globex");
    }

    #[test]
    fn test_skips_case_insensitive_duplicate() {
        let current = json!({ "work": [{ "name": "Acme Corp", "position": "Engineer" }] });
        let candidate = json!({
            "work": [{ "name": "acme corp", "position": "ENGINEER", "summary": "again" }]
        });
        let merged = merge_value_documents(&current, &candidate, &policy());
        let work = merged["work"].as_array().unwrap();
        assert_eq!(work.len(), 1);
        assert!(work[0].get("summary").is_none());
    }

    #[test]
    fn test_same_employer_different_position_is_not_duplicate() {
        let current = json!({ "work": [{ "name": "Acme Corp", "position": "Engineer" }] });
        let candidate = json!({ "work": [{ "name": "Acme Corp", "position": "Manager" }] });
        let merged = merge_value_documents(&current, &candidate, &policy());
        assert_eq!(merged["work"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_idempotent_re_merge() {
        let current = json!({ "skills": [{ "name": "Rust" }] });
        let candidate = json!({
            "skills": [{ "name": "Python", "keywords": ["Django"] }],
            "work": [{ "name": "Acme Corp", "position": "Engineer" }]
        });
        let once = merge_value_documents(&current, &candidate, &policy());
        let twice = merge_value_documents(&once, &candidate, &policy());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_empty_candidate_values_never_shrink() {
        let current = json!({
            "work": [{ "name": "Acme Corp", "position": "Engineer" }],
            "basics": { "name": "Jane Doe" }
        });
        let candidate = json!({ "work": [], "basics": null, "education": "" });
        let merged = merge_value_documents(&current, &candidate, &policy());
        assert_eq!(merged, current);
    }

    #[test]
    fn test_basics_fills_gaps_and_keeps_existing() {
        let current = json!({ "basics": { "name": "Jane Doe", "email": "jane@example.com" } });
        let candidate = json!({
            "basics": { "name": "Janet", "phone": "555-123-4567", "label": "Engineer" }
        });
        let merged = merge_value_documents(&current, &candidate, &policy());
        assert_eq!(merged["basics"]["name"], "Jane Doe");
        assert_eq!(merged["basics"]["phone"], "555-123-4567");
        assert_eq!(merged["basics"]["label"], "Engineer");
    }

    #[test]
    fn test_basics_location_merges_recursively() {
        let current = json!({ "basics": { "name": "Jane", "location": { "city": "Berlin" } } });
        let candidate = json!({
            "basics": { "location": { "city": "Munich", "countryCode": "DE" } }
        });
        let merged = merge_value_documents(&current, &candidate, &policy());
        assert_eq!(merged["basics"]["location"]["city"], "Berlin");
        assert_eq!(merged["basics"]["location"]["countryCode"], "DE");
    }

    #[test]
    fn test_basics_profiles_append_without_exact_duplicates() {
        let github = json!({ "network": "GitHub", "username": "jane" });
        let current = json!({ "basics": { "name": "Jane", "profiles": [github.clone()] } });
        let candidate = json!({
            "basics": { "profiles": [github, { "network": "LinkedIn", "username": "jane" }] }
        });
        let merged = merge_value_documents(&current, &candidate, &policy());
        assert_eq!(merged["basics"]["profiles"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_unrecognized_keys_ignored() {
        let merged = merge_value_documents(
            &json!({}),
            &json!({ "metadata": { "model": "x" }, "skills": [{ "name": "Rust" }] }),
            &policy(),
        );
        assert!(merged.get("metadata").is_none());
        assert_eq!(merged["skills"][0]["name"], "Rust");
    }

    #[test]
    fn test_entries_without_identity_fields_fall_back_to_exact_equality() {
        let current = json!({ "work": [{ "summary": "built things" }] });
        let same = json!({ "work": [{ "summary": "built things" }] });
        let different = json!({ "work": [{ "summary": "other things" }] });
        let merged = merge_value_documents(&current, &same, &policy());
        assert_eq!(merged["work"].as_array().unwrap().len(), 1);
        let merged = merge_value_documents(&merged, &different, &policy());
        assert_eq!(merged["work"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_typed_merge_drops_unknown_keys() {
        let current = ResumeDocument::default();
        let candidate = json!({
            "work": [{ "name": "Acme Corp", "position": "Engineer" }],
            "junk": true
        });
        let merged = merge_documents(&current, &candidate, &policy()).unwrap();
        assert_eq!(merged.work.len(), 1);
        assert_eq!(merged.work[0].name.as_deref(), Some("Acme Corp"));
    }
}
