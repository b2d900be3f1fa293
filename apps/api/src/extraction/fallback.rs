// Rule-based extraction for when no LLM provider produces usable output.
// Deliberately conservative: a field is emitted only when a pattern attests
// it. Missing information stays missing; the checklist asks for it later.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{json, Map, Value};

use crate::models::resume::Section;

const NAME_STOPWORDS: &[&str] = &[
    "i", "i'm", "im", "my", "the", "hi", "hello", "this", "it", "he", "she", "we", "they",
];

/// Extracts a resume candidate from a raw statement without an LLM.
///
/// Returns a full-document shaped value, or an empty object when the
/// statement does not carry enough to fill the section's essential fields.
pub fn extract(section: Section, raw_input: &str) -> Value {
    let entry = match section {
        Section::Work => extract_work(raw_input).map(|e| json!({ "work": [e] })),
        Section::Education => extract_education(raw_input).map(|e| json!({ "education": [e] })),
        Section::Skills => extract_skills(raw_input).map(|e| json!({ "skills": [e] })),
        Section::Projects => extract_projects(raw_input).map(|e| json!({ "projects": [e] })),
        Section::Basics => extract_basics(raw_input).map(|b| json!({ "basics": b })),
        _ => None,
    };
    entry.unwrap_or_else(|| json!({}))
}

// ────────────────────────────────────────────────────────────────────────────
// Per-section extractors
// ────────────────────────────────────────────────────────────────────────────

fn extract_work(raw_input: &str) -> Option<Value> {
    let caps = at_split_re().captures(raw_input)?;
    let position = clean_position(caps.get(1)?.as_str())?;
    let employer = clean_trailing(caps.get(2)?.as_str())?;

    let mut entry = Map::new();
    entry.insert("name".to_string(), json!(title_case(&employer)));
    entry.insert("position".to_string(), json!(position));
    entry.insert("summary".to_string(), json!(raw_input.trim()));

    let years: Vec<&str> = year_re()
        .find_iter(raw_input)
        .map(|m| m.as_str())
        .collect();
    if let Some(start) = years.first() {
        entry.insert("startDate".to_string(), json!(start));
        if let Some(end) = years.get(1) {
            entry.insert("endDate".to_string(), json!(end));
        } else if mentions_present(raw_input) {
            entry.insert("endDate".to_string(), json!("Present"));
        }
    }

    Some(Value::Object(entry))
}

fn extract_education(raw_input: &str) -> Option<Value> {
    let lower = raw_input.to_lowercase();
    let study_type = if lower.contains("bachelor") {
        Some("Bachelor's")
    } else if lower.contains("master") {
        Some("Master's")
    } else if lower.contains("phd") || lower.contains("doctorate") {
        Some("PhD")
    } else {
        None
    };

    let institution = institution_by_keyword(raw_input).or_else(|| {
        at_split_re()
            .captures(raw_input)
            .and_then(|c| c.get(2))
            .and_then(|m| clean_trailing(m.as_str()))
            .map(|s| title_case(&s))
    });

    if study_type.is_none() && institution.is_none() {
        return None;
    }

    let mut entry = Map::new();
    if let Some(inst) = institution {
        entry.insert("institution".to_string(), json!(inst));
    }
    if let Some(st) = study_type {
        entry.insert("studyType".to_string(), json!(st));
        if let Some(area) = extract_area(raw_input) {
            entry.insert("area".to_string(), json!(area));
        }
    }
    Some(Value::Object(entry))
}

fn extract_skills(raw_input: &str) -> Option<Value> {
    let mut rest = raw_input.trim();
    for prefix in [
        "i know",
        "my skills are",
        "my skills include",
        "i am skilled in",
        "i'm skilled in",
        "skills:",
    ] {
        if let Some(stripped) = strip_prefix_ci(rest, prefix) {
            rest = stripped.trim_start();
            break;
        }
    }

    let parts: Vec<&str> = rest
        .split(',')
        .flat_map(|p| p.split(" and "))
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();

    let (name, keywords) = parts.split_first()?;
    let mut entry = Map::new();
    entry.insert("name".to_string(), json!(name));
    if !keywords.is_empty() {
        entry.insert("keywords".to_string(), json!(keywords));
    }
    Some(Value::Object(entry))
}

fn extract_projects(raw_input: &str) -> Option<Value> {
    let caps = project_name_re().captures(raw_input)?;
    let tail = caps.get(1)?.as_str();
    let cut = project_cut_re().replace(tail, "");
    let name = cut
        .trim()
        .trim_matches(|c: char| matches!(c, '.' | ',' | '!' | '?' | ';' | ':'))
        .trim();
    if name.is_empty() {
        return None;
    }
    Some(json!({ "name": name, "description": raw_input.trim() }))
}

fn extract_basics(raw_input: &str) -> Option<Value> {
    let mut basics = Map::new();
    if let Some(m) = email_re().find(raw_input) {
        basics.insert("email".to_string(), json!(m.as_str()));
    }
    if let Some(m) = phone_re().find(raw_input) {
        basics.insert("phone".to_string(), json!(m.as_str().trim()));
    }
    if let Some(name) = extract_name(raw_input) {
        basics.insert("name".to_string(), json!(name));
    }
    if basics.is_empty() {
        None
    } else {
        Some(Value::Object(basics))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Pattern helpers
// ────────────────────────────────────────────────────────────────────────────

fn clean_position(segment: &str) -> Option<String> {
    let mut rest = segment.trim();
    for prefix in ["i worked as", "i work as", "i was", "i am", "i'm"] {
        if let Some(stripped) = strip_prefix_ci(rest, prefix) {
            rest = stripped.trim_start();
            break;
        }
    }
    for article in ["a ", "an "] {
        if let Some(stripped) = strip_prefix_ci(rest, article) {
            rest = stripped;
            break;
        }
    }
    let rest = rest.trim();
    let starts_with_pronoun = rest.eq_ignore_ascii_case("i")
        || rest.get(..2).is_some_and(|p| p.eq_ignore_ascii_case("i "));
    if rest.is_empty() || starts_with_pronoun {
        return None;
    }
    Some(title_case(rest))
}

/// Drops a trailing qualifier clause ("from 2019", "since March", ...) and
/// surrounding punctuation from a captured segment.
fn clean_trailing(segment: &str) -> Option<String> {
    let head = segment.split(',').next().unwrap_or(segment);
    let cut = trail_cut_re().replace(head, "");
    let cleaned = cut
        .trim()
        .trim_matches(|c: char| matches!(c, '.' | ',' | '!' | '?' | ';' | ':'))
        .trim();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}

fn institution_by_keyword(raw_input: &str) -> Option<String> {
    let words: Vec<&str> = raw_input.split_whitespace().collect();
    for (i, word) in words.iter().enumerate() {
        let bare = trim_word(word);
        if ["university", "college", "institute"].contains(&bare.to_lowercase().as_str()) && i > 0 {
            let prev = trim_word(words[i - 1]);
            if prev.is_empty() {
                return None;
            }
            return Some(format!("{} {}", title_case(prev), title_case(bare)));
        }
    }
    None
}

fn extract_area(raw_input: &str) -> Option<String> {
    let caps = area_re().captures(raw_input)?;
    clean_trailing(caps.get(1)?.as_str()).map(|s| title_case(&s))
}

fn extract_name(raw_input: &str) -> Option<String> {
    if let Some(caps) = name_intro_re().captures(raw_input) {
        let words: Vec<&str> = caps
            .get(1)?
            .as_str()
            .split_whitespace()
            .take(2)
            .map(trim_word)
            .filter(|w| !w.is_empty())
            .collect();
        if !words.is_empty() {
            return Some(words.join(" "));
        }
        return None;
    }

    let mut words = raw_input.split_whitespace();
    let first = trim_word(words.next()?);
    let second = trim_word(words.next()?);
    if NAME_STOPWORDS.contains(&first.to_lowercase().as_str()) {
        return None;
    }
    if looks_like_name(first) && looks_like_name(second) {
        Some(format!("{first} {second}"))
    } else {
        None
    }
}

fn looks_like_name(word: &str) -> bool {
    let mut chars = word.chars();
    matches!(chars.next(), Some(c) if c.is_uppercase())
        && word.chars().all(|c| c.is_alphabetic() || c == '\'' || c == '-')
}

fn mentions_present(raw_input: &str) -> bool {
    let lower = raw_input.to_lowercase();
    lower.contains("present") || lower.contains("currently")
}

fn strip_prefix_ci<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    text.get(..prefix.len())
        .filter(|head| head.eq_ignore_ascii_case(prefix))
        .map(|_| &text[prefix.len()..])
}

fn trim_word(word: &str) -> &str {
    word.trim_matches(|c: char| !(c.is_alphanumeric() || c == '\'' || c == '-'))
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let all_caps = word.chars().any(|c| c.is_uppercase())
                && word.chars().all(|c| c.is_uppercase() || !c.is_alphabetic());
            if all_caps {
                return word.to_string();
            }
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// ────────────────────────────────────────────────────────────────────────────
// Compiled patterns
// ────────────────────────────────────────────────────────────────────────────

fn at_split_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^(.*?)\s+at\s+(.+)$").expect("valid at-split regex"))
}

fn trail_cut_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\s+(from|since|for|between|in|until|till|where)\b.*$")
            .expect("valid trailing-clause regex")
    })
}

fn project_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(?:called|named)\s+(.+)$").expect("valid project-name regex")
    })
}

fn project_cut_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\s+(that|which|using|to|for|in|from|with|where)\b.*$")
            .expect("valid project-clause regex")
    })
}

fn area_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bin\s+(.+)$").expect("valid area regex"))
}

fn name_intro_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bmy name is\s+(.+)$").expect("valid name-intro regex"))
}

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b")
            .expect("valid email regex")
    })
}

fn phone_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(\+?1?[-.\s]?)?\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}")
            .expect("valid phone regex")
    })
}

fn year_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(19|20)\d{2}\b").expect("valid year regex"))
}
