// Conversation guidance read-model.
// Summarizes how far along the resume is and what the orchestrator should
// ask next. Derived entirely from the stored document.

use serde::{Deserialize, Serialize};

use crate::models::resume::{
    Basics, Education, Project, ResumeDocument, Section, Skill, WorkExperience,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionState {
    Empty,
    Partial,
    Complete,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionGuidance {
    pub section: Section,
    pub state: SectionState,
    pub missing_fields: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuidanceReport {
    pub completeness_percent: u32,
    pub sections: Vec<SectionGuidance>,
    pub conversation_priority: Vec<String>,
    pub next_questions: Vec<String>,
}

const SECTION_WEIGHTS: &[(Section, f64)] = &[
    (Section::Basics, 0.25),
    (Section::Work, 0.30),
    (Section::Education, 0.20),
    (Section::Skills, 0.15),
    (Section::Projects, 0.10),
];

const SECTION_QUESTIONS: &[(Section, &[&str])] = &[
    (
        Section::Basics,
        &[
            "What is your full name?",
            "What email address should appear on the resume?",
            "Would you like to add a short professional summary?",
        ],
    ),
    (
        Section::Work,
        &[
            "Tell me about your most recent job: employer, title, and when you worked there.",
            "What were your main achievements in that role?",
            "Are there earlier positions you would like to add?",
        ],
    ),
    (
        Section::Education,
        &[
            "Where did you study, and what degree did you earn?",
            "What field did you study?",
            "When did you start and finish?",
        ],
    ),
    (
        Section::Skills,
        &[
            "What are your strongest technical skills?",
            "Any tools or frameworks you use alongside them?",
            "How would you rate your proficiency?",
        ],
    ),
    (
        Section::Projects,
        &[
            "Is there a project you are proud of? Tell me its name and what it does.",
            "What technologies did the project use?",
            "Is the project available online somewhere?",
        ],
    ),
];

pub fn build_guidance(document: &ResumeDocument) -> GuidanceReport {
    let mut sections = Vec::new();
    let mut weighted_score_sum = 0.0;

    for (section, weight) in SECTION_WEIGHTS {
        let (score, missing_fields) = match section {
            Section::Basics => basics_progress(document.basics.as_ref()),
            Section::Work => list_progress(&document.work, WORK_ESSENTIALS),
            Section::Education => list_progress(&document.education, EDUCATION_ESSENTIALS),
            Section::Skills => list_progress(&document.skills, SKILL_ESSENTIALS),
            Section::Projects => list_progress(&document.projects, PROJECT_ESSENTIALS),
            _ => (0.0, Vec::new()),
        };

        let state = if score >= 1.0 {
            SectionState::Complete
        } else if score > 0.0 {
            SectionState::Partial
        } else {
            SectionState::Empty
        };

        weighted_score_sum += score * weight;
        sections.push(SectionGuidance {
            section: *section,
            state,
            missing_fields,
        });
    }

    let total_weight: f64 = SECTION_WEIGHTS.iter().map(|(_, w)| w).sum();
    let completeness_percent = if total_weight > 0.0 {
        ((weighted_score_sum / total_weight) * 100.0).round().clamp(0.0, 100.0) as u32
    } else {
        0
    };

    let conversation_priority: Vec<String> = sections
        .iter()
        .filter(|s| s.state != SectionState::Complete)
        .map(|s| s.section.key().to_string())
        .collect();

    let next_questions = sections
        .iter()
        .find(|s| s.state != SectionState::Complete)
        .map(|s| questions_for(s.section))
        .unwrap_or_default();

    GuidanceReport {
        completeness_percent,
        sections,
        conversation_priority,
        next_questions,
    }
}

fn questions_for(section: Section) -> Vec<String> {
    SECTION_QUESTIONS
        .iter()
        .find(|(s, _)| *s == section)
        .map(|(_, qs)| qs.iter().take(3).map(|q| (*q).to_string()).collect())
        .unwrap_or_default()
}

const WORK_ESSENTIALS: &[(&str, fn(&WorkExperience) -> bool)] = &[
    ("name", |e| filled(&e.name)),
    ("position", |e| filled(&e.position)),
    ("startDate", |e| filled(&e.start_date)),
];

const EDUCATION_ESSENTIALS: &[(&str, fn(&Education) -> bool)] = &[
    ("institution", |e| filled(&e.institution)),
    ("area", |e| filled(&e.area)),
    ("studyType", |e| filled(&e.study_type)),
];

const SKILL_ESSENTIALS: &[(&str, fn(&Skill) -> bool)] = &[("name", |e| filled(&e.name))];

const PROJECT_ESSENTIALS: &[(&str, fn(&Project) -> bool)] = &[
    ("name", |e| filled(&e.name)),
    ("description", |e| filled(&e.description)),
];

fn basics_progress(basics: Option<&Basics>) -> (f64, Vec<String>) {
    let Some(basics) = basics else {
        return (
            0.0,
            vec!["name".to_string(), "email".to_string(), "summary".to_string()],
        );
    };
    let essentials: [(&str, bool); 3] = [
        ("name", filled(&basics.name)),
        ("email", filled(&basics.email)),
        ("summary", filled(&basics.summary)),
    ];
    progress_of(&essentials)
}

fn list_progress<T>(entries: &[T], essentials: &[(&str, fn(&T) -> bool)]) -> (f64, Vec<String>) {
    if entries.is_empty() {
        return (
            0.0,
            essentials.iter().map(|(f, _)| (*f).to_string()).collect(),
        );
    }

    let mut score_sum = 0.0;
    let mut missing = Vec::new();
    for entry in entries {
        let checks: Vec<(&str, bool)> = essentials
            .iter()
            .map(|(field, present)| (*field, present(entry)))
            .collect();
        let (score, entry_missing) = progress_of(&checks);
        score_sum += score;
        for field in entry_missing {
            if !missing.contains(&field) {
                missing.push(field);
            }
        }
    }
    (score_sum / entries.len() as f64, missing)
}

fn progress_of(checks: &[(&str, bool)]) -> (f64, Vec<String>) {
    let filled_count = checks.iter().filter(|(_, present)| *present).count();
    let missing = checks
        .iter()
        .filter(|(_, present)| !present)
        .map(|(field, _)| (*field).to_string())
        .collect();
    (filled_count as f64 / checks.len() as f64, missing)
}

fn filled(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|s| !s.trim().is_empty())
}
