// Utterance-to-resume extraction pipeline.
// Implements: section classification, prompt building, candidate
// sanitization, rule-based fallback, and per-turn orchestration.
// All LLM calls go through llm_client — no provider SDK calls here.

pub mod classifier;
pub mod fallback;
pub mod handlers;
pub mod pipeline;
pub mod prompts;
pub mod sanitizer;
