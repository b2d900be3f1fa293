// Document engine: normalization and merge of extraction candidates, plus
// the read-models derived from the stored resume (checklist, validation,
// guidance).

pub mod checklist;
pub mod guidance;
pub mod handlers;
pub mod merge;
pub mod normalize;
pub mod validation;
