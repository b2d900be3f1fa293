// Candidate normalization.
// Every extraction candidate (LLM or rule-based) passes through here before
// the merge engine sees it. After normalization a key is present if and only
// if it carries real content.

use serde_json::{json, Map, Value};

use crate::models::resume::Section;

/// Values models emit when they have nothing to say. Treated as absent.
const PLACEHOLDER_SENTINELS: &[&str] = &[
    "Company Name",
    "University Name",
    "Institution Name",
    "Job Title",
    "Project Name",
    "Field of Study",
    "Degree",
    "Unknown",
    "N/A",
    "Not specified",
];

/// Normalizes a raw candidate into document shape: wraps bare arrays under
/// the suggested section, scrubs nulls and placeholder values, promotes
/// section keys the model nested inside entries, and coerces each section
/// to its expected shape.
pub fn normalize_candidate(candidate: Value, section: Section) -> Value {
    let wrapped = wrap_candidate(candidate, section);
    let scrubbed = scrub(wrapped);
    let promoted = promote_nested_sections(scrubbed);
    coerce_section_shapes(scrub(promoted))
}

/// True when a normalized candidate carries nothing worth merging.
pub fn is_empty_candidate(value: &Value) -> bool {
    is_absent(value)
}

fn wrap_candidate(candidate: Value, section: Section) -> Value {
    match candidate {
        Value::Array(_) if section.is_list() => json!({ section.key(): candidate }),
        Value::Object(_) => candidate,
        _ => json!({}),
    }
}

/// Removes nulls, empty strings, placeholder sentinels, and then empty
/// containers bottom-up.
fn scrub(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut out = Map::new();
            for (key, inner) in map {
                let cleaned = scrub(inner);
                if !is_absent(&cleaned) {
                    out.insert(key, cleaned);
                }
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(scrub)
                .filter(|item| !is_absent(item))
                .collect(),
        ),
        other => other,
    }
}

fn is_absent(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => {
            let trimmed = s.trim();
            trimmed.is_empty()
                || PLACEHOLDER_SENTINELS.contains(&trimmed)
                || trimmed == "string"
                || trimmed.starts_with("string (")
        }
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Models sometimes bury one section inside another ("education" inside a
/// work entry). Any section key found below the top level is removed from
/// its nesting site and hoisted into the matching top-level slot, provided
/// that slot is still empty. Later occurrences are discarded.
fn promote_nested_sections(doc: Value) -> Value {
    let mut top = match doc {
        Value::Object(map) => map,
        other => return other,
    };

    let mut found: Vec<(String, Value)> = Vec::new();
    for value in top.values_mut() {
        collect_nested(value, &mut found);
    }

    for (key, value) in found {
        let slot_open = top.get(&key).map_or(true, is_absent);
        if slot_open && !is_absent(&value) {
            top.insert(key, value);
        }
    }

    Value::Object(top)
}

fn collect_nested(value: &mut Value, found: &mut Vec<(String, Value)>) {
    match value {
        Value::Object(map) => {
            let section_keys: Vec<String> = map
                .keys()
                .filter(|k| Section::parse(k).is_some())
                .cloned()
                .collect();
            for key in section_keys {
                if let Some(mut nested) = map.remove(&key) {
                    collect_nested(&mut nested, found);
                    found.push((key, nested));
                }
            }
            for inner in map.values_mut() {
                collect_nested(inner, found);
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                collect_nested(item, found);
            }
        }
        _ => {}
    }
}

/// Forces each recognized section into its canonical shape: list sections
/// become arrays of objects (lone objects become singletons, bare strings
/// become minimal entries where that makes sense), basics must be an object.
/// Values that cannot be coerced are dropped.
fn coerce_section_shapes(doc: Value) -> Value {
    let Value::Object(top) = doc else {
        return json!({});
    };

    let mut out = Map::new();
    for (key, value) in top {
        match Section::parse(&key) {
            Some(section) => {
                let coerced = coerce_section(section, value);
                if !is_absent(&coerced) {
                    out.insert(key, coerced);
                }
            }
            None => {
                out.insert(key, value);
            }
        }
    }
    Value::Object(out)
}

fn coerce_section(section: Section, value: Value) -> Value {
    if section == Section::Basics {
        return match value {
            Value::Object(_) => value,
            _ => Value::Null,
        };
    }
    match value {
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .filter_map(|item| coerce_entry(section, item))
                .collect(),
        ),
        Value::Object(_) => Value::Array(vec![value]),
        _ => Value::Null,
    }
}

fn coerce_entry(section: Section, item: Value) -> Option<Value> {
    match item {
        Value::Object(_) => Some(item),
        Value::String(s) => match section {
            Section::Skills | Section::Interests => Some(json!({ "name": s })),
            Section::Languages => Some(json!({ "language": s })),
            _ => None,
        },
        _ => None,
    }
}
