// Extraction prompt templates.
// All prompts for the extraction pipeline are defined here.

use crate::models::resume::{ResumeDocument, Section};

/// Placeholder skeleton of the complete JSON Resume document. The model always
/// sees every top-level key, so it can place content under the right section
/// even when the classifier's suggestion was wrong.
const SCHEMA_SKELETON: &str = r#"{
  "basics": {
    "name": "string (full name)",
    "label": "string (professional title)",
    "email": "string (email address)",
    "phone": "string (phone number)",
    "url": "string (personal website)",
    "summary": "string (2-3 sentence professional summary)",
    "location": {
      "address": "string",
      "city": "string",
      "region": "string (state/province)",
      "postalCode": "string",
      "countryCode": "string"
    },
    "profiles": [{ "network": "string", "username": "string", "url": "string" }]
  },
  "work": [{
    "name": "string (company name)",
    "position": "string (job title)",
    "startDate": "YYYY-MM",
    "endDate": "YYYY-MM or 'Present'",
    "summary": "string (brief description)",
    "highlights": ["string (achievement)"]
  }],
  "education": [{
    "institution": "string (school name)",
    "area": "string (field of study)",
    "studyType": "string (Bachelor, Master, PhD)",
    "startDate": "YYYY",
    "endDate": "YYYY",
    "score": "string (GPA)",
    "courses": ["string"]
  }],
  "skills": [{
    "name": "string (skill name)",
    "level": "string (Beginner, Intermediate, Advanced, Expert)",
    "keywords": ["string (related tools)"]
  }],
  "projects": [{
    "name": "string (project name)",
    "description": "string",
    "highlights": ["string"],
    "keywords": ["string (technology)"],
    "startDate": "YYYY-MM",
    "endDate": "YYYY-MM",
    "url": "string"
  }],
  "awards": [{ "title": "string", "date": "YYYY-MM", "awarder": "string", "summary": "string" }],
  "languages": [{ "language": "string", "fluency": "string" }],
  "interests": [{ "name": "string", "keywords": ["string"] }],
  "volunteer": [{
    "organization": "string",
    "position": "string",
    "startDate": "YYYY-MM",
    "endDate": "YYYY-MM",
    "summary": "string",
    "highlights": ["string"]
  }],
  "publications": [{
    "name": "string",
    "publisher": "string",
    "releaseDate": "YYYY-MM",
    "url": "string",
    "summary": "string"
  }],
  "references": [{ "name": "string", "reference": "string" }]
}"#;

/// A worked example the model can imitate. Spans several sections: the output
/// is a whole document, not a fragment.
const WORKED_EXAMPLE: &str = r#"{
  "work": [{
    "name": "Tech Company Inc.",
    "position": "Senior Software Engineer",
    "startDate": "2022-01",
    "endDate": "Present",
    "summary": "Led development of scalable web applications",
    "highlights": ["Reduced API response time by 40% through optimization"]
  }],
  "education": [{
    "institution": "Stanford University",
    "studyType": "Bachelor",
    "area": "Computer Science",
    "startDate": "2018",
    "endDate": "2022",
    "score": "3.8"
  }],
  "skills": [{ "name": "Python", "level": "Advanced", "keywords": ["Django", "Flask"] }]
}"#;

const ACTION_VERBS: &str = "Managed, Led, Developed, Implemented, Created, Designed, Analyzed, \
Optimized, Increased, Improved, Coordinated, Established, Generated, Streamlined, Enhanced";

const EXTRACTION_PROMPT: &str = r#"You are an expert resume writer specializing in the JSON Resume format. Convert the user's statement into structured resume content.

CONTEXT:
- Suggested section: {section}
- User statement: "{raw_input}"

STYLE GUIDELINES:
{style_hint}

SECTION BEST PRACTICES:
{best_practices}

ACTION VERBS:
{action_verbs}

CURRENT RESUME (for continuity; do not repeat entries that are already here):
{current_document}

TARGET SHAPE (the complete JSON Resume document; place content under the correct top-level key even if it differs from the suggested section):
{schema_skeleton}

EXAMPLE OUTPUT:
{worked_example}

CRITICAL INSTRUCTIONS:
1. Return ONLY a valid JSON object. No explanations, no markdown fences, no additional text.
2. Include only information the user actually stated. OMIT empty or unknown fields; never emit null values or placeholder text such as "Company Name".
3. Use YYYY-MM format for work dates and YYYY for education dates. Never invent a date that was not stated.
4. Add to the existing resume content; never contradict or restate it.
5. Use strong action verbs and keep any numbers the user gave.

Return ONLY the JSON object:"#;

const CLASSIFIER_PROMPT: &str = r#"Given the following user statement and current resume context, decide which JSON Resume section the statement best belongs to.

Statement: "{raw_input}"

Resume context:
{current_document}

Respond with exactly one word from this list: basics, work, education, skills, projects, awards, languages, interests, volunteer, publications, references."#;

/// Renders the extraction prompt. The user statement is substituted last;
/// template tokens inside it are never re-expanded.
pub fn build_extraction_prompt(
    section: Section,
    raw_input: &str,
    style_hint: &str,
    current: &ResumeDocument,
) -> String {
    EXTRACTION_PROMPT
        .replace("{section}", section.key())
        .replace("{style_hint}", style_hint)
        .replace("{best_practices}", best_practices(section))
        .replace("{action_verbs}", ACTION_VERBS)
        .replace("{schema_skeleton}", SCHEMA_SKELETON)
        .replace("{worked_example}", WORKED_EXAMPLE)
        .replace("{current_document}", &document_snapshot(current))
        .replace("{raw_input}", raw_input)
}

/// Renders the constrained section-classification prompt.
pub fn build_classifier_prompt(raw_input: &str, current: &ResumeDocument) -> String {
    CLASSIFIER_PROMPT
        .replace("{current_document}", &document_snapshot(current))
        .replace("{raw_input}", raw_input)
}

fn document_snapshot(current: &ResumeDocument) -> String {
    serde_json::to_string_pretty(current).unwrap_or_else(|_| "{}".to_string())
}

fn best_practices(section: Section) -> &'static str {
    match section {
        Section::Work => {
            "Focus on achievements and measurable results. Use strong action verbs. \
             Quantify impact with numbers and percentages."
        }
        Section::Education => {
            "Include degree, institution, and graduation date. Add GPA only if 3.5 or higher. \
             Include relevant coursework for recent graduates."
        }
        Section::Skills => {
            "Group related tools as keywords under one named skill. \
             Include a proficiency level when stated."
        }
        Section::Projects => {
            "Describe impact and technologies used. Use metrics to show results."
        }
        Section::Basics => {
            "Capture name, email, phone, and location exactly as stated. \
             Keep the summary concise (2-3 sentences)."
        }
        _ => "Capture exactly what the user stated, professionally worded.",
    }
}
