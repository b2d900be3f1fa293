// Advisory schema validation.
// Issues flag business-rule violations, warnings flag things worth asking
// the user about. Neither ever blocks persistence: a partially-invalid
// document is the normal state mid-conversation.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::resume::ResumeDocument;

const MAX_SUMMARY_CHARS: usize = 500;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub issues: Vec<String>,
    pub warnings: Vec<String>,
}

enum DateFormat {
    Full,
    YearOnly,
    Invalid,
}

pub fn validate_document(document: &ResumeDocument) -> ValidationReport {
    let mut issues = Vec::new();
    let mut warnings = Vec::new();

    match document.basics.as_ref() {
        None => {
            issues.push("basics.name is required".to_string());
            issues.push("basics.email is required".to_string());
        }
        Some(basics) => {
            require(&mut issues, "basics.name", basics.name.as_deref());
            require(&mut issues, "basics.email", basics.email.as_deref());
            if let Some(email) = basics.email.as_deref() {
                if !email.trim().is_empty() && !email_re().is_match(email.trim()) {
                    issues.push("basics.email is not a valid email address".to_string());
                }
            }
            if let Some(summary) = basics.summary.as_deref() {
                if summary.chars().count() > MAX_SUMMARY_CHARS {
                    warnings.push(format!(
                        "basics.summary exceeds recommended length ({MAX_SUMMARY_CHARS} characters)"
                    ));
                }
            }
        }
    }

    for (i, entry) in document.work.iter().enumerate() {
        require(&mut issues, &format!("work[{i}].name"), entry.name.as_deref());
        require(
            &mut issues,
            &format!("work[{i}].position"),
            entry.position.as_deref(),
        );
        require(
            &mut issues,
            &format!("work[{i}].startDate"),
            entry.start_date.as_deref(),
        );
        check_date_pair(
            &format!("work[{i}]"),
            entry.start_date.as_deref(),
            entry.end_date.as_deref(),
            false,
            &mut warnings,
        );
    }

    for (i, entry) in document.education.iter().enumerate() {
        require(
            &mut issues,
            &format!("education[{i}].institution"),
            entry.institution.as_deref(),
        );
        require(
            &mut issues,
            &format!("education[{i}].area"),
            entry.area.as_deref(),
        );
        require(
            &mut issues,
            &format!("education[{i}].studyType"),
            entry.study_type.as_deref(),
        );
        // Education dates are year-precision by convention.
        check_date_pair(
            &format!("education[{i}]"),
            entry.start_date.as_deref(),
            entry.end_date.as_deref(),
            true,
            &mut warnings,
        );
    }

    for (i, entry) in document.skills.iter().enumerate() {
        require(&mut issues, &format!("skills[{i}].name"), entry.name.as_deref());
    }

    for (i, entry) in document.projects.iter().enumerate() {
        require(
            &mut issues,
            &format!("projects[{i}].name"),
            entry.name.as_deref(),
        );
        check_date_pair(
            &format!("projects[{i}]"),
            entry.start_date.as_deref(),
            entry.end_date.as_deref(),
            false,
            &mut warnings,
        );
    }

    for (i, entry) in document.awards.iter().enumerate() {
        require(&mut issues, &format!("awards[{i}].title"), entry.title.as_deref());
        check_date(
            &format!("awards[{i}].date"),
            entry.date.as_deref(),
            false,
            &mut warnings,
        );
    }

    for (i, entry) in document.languages.iter().enumerate() {
        require(
            &mut issues,
            &format!("languages[{i}].language"),
            entry.language.as_deref(),
        );
    }

    for (i, entry) in document.interests.iter().enumerate() {
        require(
            &mut issues,
            &format!("interests[{i}].name"),
            entry.name.as_deref(),
        );
    }

    for (i, entry) in document.volunteer.iter().enumerate() {
        require(
            &mut issues,
            &format!("volunteer[{i}].organization"),
            entry.organization.as_deref(),
        );
        check_date_pair(
            &format!("volunteer[{i}]"),
            entry.start_date.as_deref(),
            entry.end_date.as_deref(),
            false,
            &mut warnings,
        );
    }

    for (i, entry) in document.publications.iter().enumerate() {
        require(
            &mut issues,
            &format!("publications[{i}].name"),
            entry.name.as_deref(),
        );
        check_date(
            &format!("publications[{i}].releaseDate"),
            entry.release_date.as_deref(),
            false,
            &mut warnings,
        );
    }

    for (i, entry) in document.references.iter().enumerate() {
        require(
            &mut issues,
            &format!("references[{i}].name"),
            entry.name.as_deref(),
        );
        require(
            &mut issues,
            &format!("references[{i}].reference"),
            entry.reference.as_deref(),
        );
    }

    ValidationReport {
        is_valid: issues.is_empty(),
        issues,
        warnings,
    }
}

fn require(issues: &mut Vec<String>, path: &str, value: Option<&str>) {
    if value.map_or(true, |s| s.trim().is_empty()) {
        issues.push(format!("{path} is required"));
    }
}

// Date problems are warnings, never issues. Fallback extraction produces
// year-only dates on purpose and the conversation refines them later.
fn check_date_pair(
    prefix: &str,
    start: Option<&str>,
    end: Option<&str>,
    year_precision: bool,
    warnings: &mut Vec<String>,
) {
    check_date(&format!("{prefix}.startDate"), start, year_precision, warnings);
    check_date(&format!("{prefix}.endDate"), end, year_precision, warnings);

    // Lexicographic comparison is correct for zero-padded ISO-style dates.
    if let (Some(start), Some(end)) = (start, end) {
        let comparable = !end.trim().eq_ignore_ascii_case("present")
            && !matches!(classify_date(start), DateFormat::Invalid)
            && !matches!(classify_date(end), DateFormat::Invalid);
        if comparable && end.trim() < start.trim() {
            warnings.push(format!("{prefix}.endDate precedes its startDate"));
        }
    }
}

fn check_date(path: &str, value: Option<&str>, year_precision: bool, warnings: &mut Vec<String>) {
    let Some(value) = value else { return };
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("present") {
        return;
    }
    match classify_date(trimmed) {
        DateFormat::Full => {}
        DateFormat::YearOnly if year_precision => {}
        DateFormat::YearOnly => {
            warnings.push(format!("{path} uses year-only precision"));
        }
        DateFormat::Invalid => {
            warnings.push(format!(
                "{path} is not a valid date (use YYYY-MM or YYYY-MM-DD)"
            ));
        }
    }
}

fn classify_date(value: &str) -> DateFormat {
    if full_date_re().is_match(value) {
        DateFormat::Full
    } else if year_re().is_match(value) {
        DateFormat::YearOnly
    } else {
        DateFormat::Invalid
    }
}

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("valid email regex")
    })
}

fn full_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{4}-\d{2}(-\d{2})?$").expect("valid date regex"))
}

fn year_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{4}$").expect("valid year regex"))
}
