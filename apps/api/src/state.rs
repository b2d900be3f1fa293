use std::sync::Arc;

use crate::config::Config;
use crate::document::merge::MergePolicy;
use crate::llm_client::LlmGateway;
use crate::storage::ResumeStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ResumeStore>,
    pub gateway: Arc<LlmGateway>,
    pub merge_policy: MergePolicy,
    pub config: Config,
}
