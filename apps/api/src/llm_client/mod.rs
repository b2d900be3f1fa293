/// LLM Gateway — the single point of entry for all text-generation calls.
///
/// ARCHITECTURAL RULE: No other module may call a provider HTTP API directly.
/// All LLM interactions MUST go through this module.
///
/// Providers are tried in order of observed success rate (untried providers
/// rank highest, configured order breaks ties). A provider "succeeds" only
/// when the caller's acceptor extracts something usable from its output;
/// anything else counts as a failure and the gateway advances.
use std::sync::atomic::AtomicU64;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Config;

pub mod gemini;
pub mod openai;

use gemini::GeminiProvider;
use openai::OpenAiProvider;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("LLM call timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("provider {provider} produced no usable output")]
    Rejected { provider: &'static str },

    #[error("no LLM providers configured")]
    NoProviders,
}

/// A single upstream text-generation service.
#[async_trait]
pub trait TextGenerationProvider: Send + Sync {
    fn name(&self) -> &'static str;
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;
}

/// Advisory per-provider counters. Eventually consistent under concurrency;
/// fallback ordering does not depend on exact counts.
#[derive(Debug, Default)]
pub struct ProviderStats {
    successes: AtomicU64,
    failures: AtomicU64,
}

impl ProviderStats {
    fn record_success(&self) {
        self.successes
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
    }

    fn record_failure(&self) {
        self.failures
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
    }

    /// Untried providers score a full 1.0 so new configuration gets a chance.
    fn success_rate(&self) -> f64 {
        let successes = self.successes.load(std::sync::atomic::Ordering::Relaxed);
        let failures = self.failures.load(std::sync::atomic::Ordering::Relaxed);
        let attempts = successes + failures;
        if attempts == 0 {
            1.0
        } else {
            successes as f64 / attempts as f64
        }
    }
}

/// Output accepted by the gateway, tagged with the provider that produced it.
#[derive(Debug)]
pub struct Generated<T> {
    pub output: T,
    pub provider: &'static str,
}

struct ProviderSlot {
    provider: Arc<dyn TextGenerationProvider>,
    stats: ProviderStats,
}

pub struct LlmGateway {
    providers: Vec<ProviderSlot>,
}

impl LlmGateway {
    pub fn new(providers: Vec<Arc<dyn TextGenerationProvider>>) -> Self {
        Self {
            providers: providers
                .into_iter()
                .map(|provider| ProviderSlot {
                    provider,
                    stats: ProviderStats::default(),
                })
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|s| s.provider.name()).collect()
    }

    /// Calls providers until one produces output the acceptor can use.
    /// Rejected output is recorded as a failure just like a transport error.
    pub async fn generate<T>(
        &self,
        prompt: &str,
        accept: impl Fn(&str) -> Option<T>,
    ) -> Result<Generated<T>, LlmError> {
        if self.providers.is_empty() {
            return Err(LlmError::NoProviders);
        }

        let mut last_error: Option<LlmError> = None;
        for index in self.ranked_indices() {
            let slot = &self.providers[index];
            let name = slot.provider.name();

            match slot.provider.generate(prompt).await {
                Ok(raw) => {
                    if let Some(output) = accept(&raw) {
                        slot.stats.record_success();
                        debug!("provider {} produced usable output", name);
                        return Ok(Generated {
                            output,
                            provider: name,
                        });
                    }
                    slot.stats.record_failure();
                    warn!("provider {} output rejected by acceptor", name);
                    last_error = Some(LlmError::Rejected { provider: name });
                }
                Err(e) => {
                    slot.stats.record_failure();
                    warn!("provider {} failed: {}", name, e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or(LlmError::NoProviders))
    }

    /// Stable sort by success rate keeps the configured order as tie-break.
    fn ranked_indices(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.providers.len()).collect();
        order.sort_by(|&a, &b| {
            let rate_a = self.providers[a].stats.success_rate();
            let rate_b = self.providers[b].stats.success_rate();
            rate_b
                .partial_cmp(&rate_a)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        order
    }
}

/// Builds the gateway from configuration. Providers without an API key are
/// left out; an empty gateway is valid and routes every turn to the
/// rule-based path.
pub fn build_gateway(config: &Config) -> LlmGateway {
    let mut providers: Vec<Arc<dyn TextGenerationProvider>> = Vec::new();
    if let Some(key) = &config.gemini_api_key {
        providers.push(Arc::new(GeminiProvider::new(
            key.clone(),
            config.gemini_model.clone(),
            config.llm_timeout_secs,
        )));
    }
    if let Some(key) = &config.openai_api_key {
        providers.push(Arc::new(OpenAiProvider::new(
            key.clone(),
            config.openai_model.clone(),
            config.llm_timeout_secs,
        )));
    }
    LlmGateway::new(providers)
}

#[cfg(test)]
pub struct StubProvider {
    name: &'static str,
    replies: std::sync::Mutex<std::collections::VecDeque<Result<String, LlmError>>>,
}

#[cfg(test)]
impl StubProvider {
    pub fn new(replies: Vec<Result<String, LlmError>>) -> Self {
        Self::named("stub", replies)
    }

    pub fn named(name: &'static str, replies: Vec<Result<String, LlmError>>) -> Self {
        Self {
            name,
            replies: std::sync::Mutex::new(replies.into()),
        }
    }
}

#[cfg(test)]
#[async_trait]
impl TextGenerationProvider for StubProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn generate(&self, _prompt: &str) -> Result<String, LlmError> {
        self.replies
            .lock()
            .expect("stub replies lock")
            .pop_front()
            .unwrap_or(Err(LlmError::EmptyContent))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accept_json(raw: &str) -> Option<String> {
        raw.trim().starts_with('{').then(|| raw.to_string())
    }

    #[test]
    fn test_untried_providers_rank_full() {
        let stats = ProviderStats::default();
        assert_eq!(stats.success_rate(), 1.0);
        stats.record_failure();
        assert_eq!(stats.success_rate(), 0.0);
        stats.record_success();
        assert_eq!(stats.success_rate(), 0.5);
    }

    #[tokio::test]
    async fn test_first_provider_wins_when_usable() {
        let gateway = LlmGateway::new(vec![
            Arc::new(StubProvider::named("a", vec![Ok("{\"x\":1}".to_string())])),
            Arc::new(StubProvider::named("b", vec![Ok("{\"y\":2}".to_string())])),
        ]);
        let got = gateway.generate("prompt", accept_json).await.unwrap();
        assert_eq!(got.provider, "a");
    }

    #[tokio::test]
    async fn test_advances_past_provider_error() {
        let gateway = LlmGateway::new(vec![
            Arc::new(StubProvider::named(
                "a",
                vec![Err(LlmError::Api {
                    status: 500,
                    message: "boom".to_string(),
                })],
            )),
            Arc::new(StubProvider::named("b", vec![Ok("{\"y\":2}".to_string())])),
        ]);
        let got = gateway.generate("prompt", accept_json).await.unwrap();
        assert_eq!(got.provider, "b");
    }

    #[tokio::test]
    async fn test_rejected_output_advances_like_a_failure() {
        let gateway = LlmGateway::new(vec![
            Arc::new(StubProvider::named(
                "a",
                vec![Ok("I'm sorry, I can't help with that.".to_string())],
            )),
            Arc::new(StubProvider::named("b", vec![Ok("{\"y\":2}".to_string())])),
        ]);
        let got = gateway.generate("prompt", accept_json).await.unwrap();
        assert_eq!(got.provider, "b");
    }

    #[tokio::test]
    async fn test_exhausted_gateway_reports_last_error() {
        let gateway = LlmGateway::new(vec![Arc::new(StubProvider::named(
            "a",
            vec![Ok("no json here".to_string())],
        ))]);
        let err = gateway.generate("prompt", accept_json).await.unwrap_err();
        assert!(matches!(err, LlmError::Rejected { provider: "a" }));
    }

    #[tokio::test]
    async fn test_empty_gateway_is_no_providers() {
        let gateway = LlmGateway::new(vec![]);
        let err = gateway.generate("prompt", accept_json).await.unwrap_err();
        assert!(matches!(err, LlmError::NoProviders));
    }

    #[tokio::test]
    async fn test_failing_provider_falls_behind_untried_one() {
        let gateway = LlmGateway::new(vec![
            Arc::new(StubProvider::named(
                "a",
                vec![
                    Ok("garbage".to_string()),
                    Ok("{\"from\":\"a\"}".to_string()),
                ],
            )),
            Arc::new(StubProvider::named(
                "b",
                vec![
                    Ok("{\"from\":\"b\"}".to_string()),
                    Ok("{\"from\":\"b\"}".to_string()),
                ],
            )),
        ]);

        // First turn: a is tried first and rejected, b rescues the turn.
        let first = gateway.generate("prompt", accept_json).await.unwrap();
        assert_eq!(first.provider, "b");

        // Second turn: b now outranks a (1.0 vs 0.0).
        let second = gateway.generate("prompt", accept_json).await.unwrap();
        assert_eq!(second.provider, "b");
    }
}
