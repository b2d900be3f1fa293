//! Style guideline lookup — maps a template style name to a short tone hint
//! injected into the extraction prompt. Stands in for the retrieval-backed
//! guideline service; the pipeline only needs a best-effort string.

/// Hint used when the requested style is unknown or absent.
pub const DEFAULT_STYLE_HINT: &str =
    "Use clear, professional resume language with concrete details.";

const STYLE_HINTS: &[(&str, &str)] = &[
    (
        "professional",
        "Use formal, achievement-oriented language with strong action verbs.",
    ),
    (
        "modern",
        "Use concise, energetic phrasing that leads with impact.",
    ),
    (
        "creative",
        "Let personality show while keeping accomplishments concrete.",
    ),
    (
        "minimal",
        "Keep wording spare and factual with no ornamentation.",
    ),
    (
        "executive",
        "Emphasize leadership scope, strategy, and business outcomes.",
    ),
    (
        "technical",
        "Lead with technologies, scale, and measurable engineering outcomes.",
    ),
];

/// Returns the tone hint for a template style name. Case-insensitive;
/// unknown names get the generic default so the pipeline never blocks on style.
pub fn style_hint(name: &str) -> &'static str {
    let name = name.trim().to_lowercase();
    STYLE_HINTS
        .iter()
        .find(|(style, _)| *style == name)
        .map(|(_, hint)| *hint)
        .unwrap_or(DEFAULT_STYLE_HINT)
}
