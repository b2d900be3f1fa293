//! Section classifier — decides which resume section an utterance concerns.
//!
//! Default path is a keyword-bucket heuristic: cheap, deterministic, no network.
//! An optional LLM escalation refines the guess but its answer is only accepted
//! when it parses to a literal section name; anything else silently falls back
//! to the keyword result.

use tracing::debug;

use crate::extraction::prompts::build_classifier_prompt;
use crate::llm_client::LlmGateway;
use crate::models::resume::{ResumeDocument, Section};

const WORK_KEYWORDS: &[&str] = &[
    "work",
    "job",
    "company",
    "position",
    "employer",
    "manager",
    "engineer",
    "developer",
    "analyst",
    "designer",
    "consultant",
    "intern",
    "experience",
    "role",
];

const EDUCATION_KEYWORDS: &[&str] = &[
    "study",
    "university",
    "college",
    "school",
    "degree",
    "bachelor",
    "master",
    "phd",
    "gpa",
    "education",
    "course",
    "graduated",
];

const SKILLS_KEYWORDS: &[&str] = &[
    "skill",
    "proficient",
    "expertise",
    "languages",
    "tools",
    "framework",
    "technology",
    "competency",
];

const PROJECTS_KEYWORDS: &[&str] = &[
    "project",
    "built",
    "created",
    "developed",
    "launched",
    "side project",
    "portfolio",
];

const AWARDS_KEYWORDS: &[&str] = &["award", "honor", "prize", "recognition", "achievement"];

const LANGUAGES_KEYWORDS: &[&str] = &[
    "language",
    "fluent",
    "bilingual",
    "multilingual",
    "native speaker",
];

const INTERESTS_KEYWORDS: &[&str] = &["interest", "hobby", "passion", "enjoy", "like to"];

const VOLUNTEER_KEYWORDS: &[&str] = &[
    "volunteer",
    "volunteering",
    "nonprofit",
    "charity",
    "community service",
];

const PUBLICATIONS_KEYWORDS: &[&str] = &[
    "publication",
    "published",
    "paper",
    "article",
    "journal",
];

const REFERENCES_KEYWORDS: &[&str] = &["reference", "referee", "recommendation"];

/// Buckets in priority order — the first bucket with a hit wins. Work comes
/// first because employment vocabulary dominates ambiguous statements.
const KEYWORD_BUCKETS: &[(Section, &[&str])] = &[
    (Section::Work, WORK_KEYWORDS),
    (Section::Education, EDUCATION_KEYWORDS),
    (Section::Skills, SKILLS_KEYWORDS),
    (Section::Projects, PROJECTS_KEYWORDS),
    (Section::Awards, AWARDS_KEYWORDS),
    (Section::Languages, LANGUAGES_KEYWORDS),
    (Section::Interests, INTERESTS_KEYWORDS),
    (Section::Volunteer, VOLUNTEER_KEYWORDS),
    (Section::Publications, PUBLICATIONS_KEYWORDS),
    (Section::References, REFERENCES_KEYWORDS),
];

/// Keyword-bucket classification. Substring matching on the lowercased input,
/// so "studied" hits "study" and "worked" hits "work". Defaults to `basics`
/// when nothing matches — basics absorbs names, contact details, and summaries.
pub fn classify_keywords(raw_input: &str) -> Section {
    let text = raw_input.to_lowercase();
    for (section, keywords) in KEYWORD_BUCKETS {
        if keywords.iter().any(|k| text.contains(k)) {
            return *section;
        }
    }
    Section::Basics
}

/// LLM-escalated classification. The answer must parse to a literal section
/// name; any provider failure or off-enum answer falls back to the keyword
/// result, so this never produces a section outside the known eleven.
pub async fn classify_with_llm(
    gateway: &LlmGateway,
    raw_input: &str,
    current: &ResumeDocument,
) -> Section {
    let prompt = build_classifier_prompt(raw_input, current);
    match gateway.generate(&prompt, parse_section_answer).await {
        Ok(generated) => {
            debug!(
                provider = generated.provider,
                section = %generated.output,
                "section classified via LLM"
            );
            generated.output
        }
        Err(e) => {
            debug!("LLM section classification unavailable ({e}); using keyword heuristic");
            classify_keywords(raw_input)
        }
    }
}

/// Accepts a classification answer only when, after trimming quotes and
/// terminal punctuation, it is exactly one of the eleven section names.
fn parse_section_answer(raw: &str) -> Option<Section> {
    let answer = raw.trim().trim_matches(|c| matches!(c, '"' | '\'' | '.' | '`'));
    Section::parse(answer)
}
