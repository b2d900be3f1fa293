// Field-level completeness checklist.
// Drives the orchestrator's next question: every expected field of the
// merged document gets a status, keyed by dotted/indexed path
// ("basics.email", "work[0].highlights"). Pure: the same document and skip
// set always produce the same checklist.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::models::resume::{Location, ResumeDocument};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldStatus {
    Ok,
    Missing,
    LowQuality,
    Skipped,
}

/// Strings shorter than this (after trimming) count as low quality.
const MIN_ANSWER_CHARS: usize = 3;

const SKIP_PHRASES: &[&str] = &[
    "skip",
    "don't want to provide",
    "do not want to provide",
    "not comfortable sharing",
    "prefer not to say",
    "rather not say",
    "no comment",
    "leave blank",
];

/// Field paths and the utterance keywords that select them for skipping.
const FIELD_KEYWORDS: &[(&str, &[&str])] = &[
    ("basics.name", &["my name"]),
    ("basics.email", &["email", "e-mail"]),
    ("basics.phone", &["phone"]),
    ("basics.summary", &["summary", "about me"]),
    ("basics.location", &["location", "address", "city"]),
    ("work", &["work history", "job", "employment", "company"]),
    ("education", &["education", "degree", "school", "university"]),
    ("skills", &["skill"]),
    ("projects", &["project"]),
];

/// Scans an utterance for skip intent. A field is marked only when a skip
/// phrase and one of the field's keywords co-occur in the same utterance.
pub fn detect_skip_signals(raw_input: &str) -> BTreeSet<String> {
    let lower = raw_input.to_lowercase();
    let mut skips = BTreeSet::new();
    if !SKIP_PHRASES.iter().any(|phrase| lower.contains(phrase)) {
        return skips;
    }
    for (path, keywords) in FIELD_KEYWORDS {
        if keywords.iter().any(|kw| lower.contains(kw)) {
            skips.insert((*path).to_string());
        }
    }
    skips
}

/// Builds the checklist for a document. Basics fields are always reported,
/// present list entries report their expected fields per index, and skipped
/// paths override whatever the walk found.
pub fn build_checklist(
    document: &ResumeDocument,
    skips: &BTreeSet<String>,
) -> BTreeMap<String, FieldStatus> {
    let mut out = BTreeMap::new();

    let basics = document.basics.as_ref();
    out.insert(
        "basics.name".to_string(),
        status_of_text(basics.and_then(|b| b.name.as_deref())),
    );
    out.insert(
        "basics.label".to_string(),
        status_of_text(basics.and_then(|b| b.label.as_deref())),
    );
    out.insert(
        "basics.email".to_string(),
        status_of_text(basics.and_then(|b| b.email.as_deref())),
    );
    out.insert(
        "basics.phone".to_string(),
        status_of_text(basics.and_then(|b| b.phone.as_deref())),
    );
    out.insert(
        "basics.summary".to_string(),
        status_of_text(basics.and_then(|b| b.summary.as_deref())),
    );
    out.insert(
        "basics.location".to_string(),
        status_of_location(basics.and_then(|b| b.location.as_ref())),
    );

    for (i, entry) in document.work.iter().enumerate() {
        out.insert(path("work", i, "name"), status_of_text(entry.name.as_deref()));
        out.insert(
            path("work", i, "position"),
            status_of_text(entry.position.as_deref()),
        );
        out.insert(
            path("work", i, "startDate"),
            status_of_text(entry.start_date.as_deref()),
        );
        out.insert(
            path("work", i, "endDate"),
            status_of_text(entry.end_date.as_deref()),
        );
        out.insert(
            path("work", i, "summary"),
            status_of_text(entry.summary.as_deref()),
        );
        out.insert(path("work", i, "highlights"), status_of_list(&entry.highlights));
    }

    for (i, entry) in document.education.iter().enumerate() {
        out.insert(
            path("education", i, "institution"),
            status_of_text(entry.institution.as_deref()),
        );
        out.insert(path("education", i, "area"), status_of_text(entry.area.as_deref()));
        out.insert(
            path("education", i, "studyType"),
            status_of_text(entry.study_type.as_deref()),
        );
        out.insert(
            path("education", i, "startDate"),
            status_of_text(entry.start_date.as_deref()),
        );
        out.insert(
            path("education", i, "endDate"),
            status_of_text(entry.end_date.as_deref()),
        );
    }

    for (i, entry) in document.skills.iter().enumerate() {
        out.insert(path("skills", i, "name"), status_of_text(entry.name.as_deref()));
        out.insert(path("skills", i, "level"), status_of_text(entry.level.as_deref()));
        out.insert(path("skills", i, "keywords"), status_of_list(&entry.keywords));
    }

    for (i, entry) in document.projects.iter().enumerate() {
        out.insert(path("projects", i, "name"), status_of_text(entry.name.as_deref()));
        out.insert(
            path("projects", i, "description"),
            status_of_text(entry.description.as_deref()),
        );
        out.insert(
            path("projects", i, "highlights"),
            status_of_list(&entry.highlights),
        );
        out.insert(path("projects", i, "url"), status_of_text(entry.url.as_deref()));
    }

    for (i, entry) in document.awards.iter().enumerate() {
        out.insert(path("awards", i, "title"), status_of_text(entry.title.as_deref()));
        out.insert(path("awards", i, "date"), status_of_text(entry.date.as_deref()));
        out.insert(
            path("awards", i, "awarder"),
            status_of_text(entry.awarder.as_deref()),
        );
    }

    for (i, entry) in document.languages.iter().enumerate() {
        out.insert(
            path("languages", i, "language"),
            status_of_text(entry.language.as_deref()),
        );
        out.insert(
            path("languages", i, "fluency"),
            status_of_text(entry.fluency.as_deref()),
        );
    }

    for (i, entry) in document.interests.iter().enumerate() {
        out.insert(
            path("interests", i, "name"),
            status_of_text(entry.name.as_deref()),
        );
    }

    for (i, entry) in document.volunteer.iter().enumerate() {
        out.insert(
            path("volunteer", i, "organization"),
            status_of_text(entry.organization.as_deref()),
        );
        out.insert(
            path("volunteer", i, "position"),
            status_of_text(entry.position.as_deref()),
        );
        out.insert(
            path("volunteer", i, "startDate"),
            status_of_text(entry.start_date.as_deref()),
        );
        out.insert(
            path("volunteer", i, "endDate"),
            status_of_text(entry.end_date.as_deref()),
        );
    }

    for (i, entry) in document.publications.iter().enumerate() {
        out.insert(
            path("publications", i, "name"),
            status_of_text(entry.name.as_deref()),
        );
        out.insert(
            path("publications", i, "publisher"),
            status_of_text(entry.publisher.as_deref()),
        );
        out.insert(
            path("publications", i, "releaseDate"),
            status_of_text(entry.release_date.as_deref()),
        );
    }

    for (i, entry) in document.references.iter().enumerate() {
        out.insert(
            path("references", i, "name"),
            status_of_text(entry.name.as_deref()),
        );
        out.insert(
            path("references", i, "reference"),
            status_of_text(entry.reference.as_deref()),
        );
    }

    for skipped in skips {
        out.insert(skipped.clone(), FieldStatus::Skipped);
    }

    out
}

fn path(section: &str, index: usize, field: &str) -> String {
    format!("{section}[{index}].{field}")
}

fn status_of_text(value: Option<&str>) -> FieldStatus {
    match value {
        None => FieldStatus::Missing,
        Some(s) if s.trim().is_empty() => FieldStatus::Missing,
        Some(s) if s.trim().chars().count() < MIN_ANSWER_CHARS => FieldStatus::LowQuality,
        Some(_) => FieldStatus::Ok,
    }
}

fn status_of_list(values: &[String]) -> FieldStatus {
    if values.iter().all(|v| v.trim().is_empty()) {
        FieldStatus::Missing
    } else {
        FieldStatus::Ok
    }
}

fn status_of_location(location: Option<&Location>) -> FieldStatus {
    match location {
        None => FieldStatus::Missing,
        Some(loc) => {
            let filled = [&loc.address, &loc.city, &loc.region, &loc.postal_code, &loc.country_code]
                .into_iter()
                .any(|f| f.as_deref().is_some_and(|s| !s.trim().is_empty()));
            if filled {
                FieldStatus::Ok
            } else {
                FieldStatus::Missing
            }
        }
    }
}
