//! services/resolver.rs
//! Ordered fallback chains: try each strategy in turn, keep the first
//! acceptable result, record every attempt.

use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Why a strategy produced nothing usable. Never leaves the resolver.
#[derive(Debug, thiserror::Error)]
pub enum StrategyError {
    #[error("not configured: {0}")]
    NotConfigured(&'static str),
    #[error("no result")]
    NoResult,
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("could not decode response: {0}")]
    Decode(String),
    #[error("unsupported input: {0}")]
    Unsupported(String),
}

pub type StrategyResult<T> = Result<T, StrategyError>;

/// One way of producing `T` from `I`. Implementations are tried in order by [`resolve`].
pub trait Strategy<I: ?Sized, T> {
    fn name(&self) -> &str;
    fn attempt(&self, input: &I) -> StrategyResult<T>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Accepted,
    /// Returned a value that failed the acceptance predicate.
    Rejected,
    Unavailable,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attempt {
    pub strategy: String,
    pub outcome: Outcome,
    pub latency_ms: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Resolution<T> {
    pub value: Option<T>,
    pub strategy: Option<String>,
    pub attempts: Vec<Attempt>,
}

impl<T> Resolution<T> {
    pub fn resolved(&self) -> bool {
        self.value.is_some()
    }
}

pub type Chain<I, T> = Vec<Box<dyn Strategy<I, T>>>;

/// Run `chain` in order. The first value passing `accept` wins and no later
/// strategy is invoked. Errors are logged and treated as unavailable.
pub fn resolve<I, T, F>(task: &str, input: &I, chain: &[Box<dyn Strategy<I, T>>], accept: F) -> Resolution<T>
where
    I: ?Sized,
    F: Fn(&I, &T) -> bool,
{
    let mut attempts = Vec::with_capacity(chain.len());
    for strategy in chain {
        let t0 = Instant::now();
        let result = strategy.attempt(input);
        let latency_ms = t0.elapsed().as_secs_f64() * 1000.0;
        let name = strategy.name().to_string();

        match result {
            Ok(value) if accept(input, &value) => {
                tracing::debug!(task, strategy = %name, latency_ms, "accepted");
                attempts.push(Attempt {
                    strategy: name.clone(),
                    outcome: Outcome::Accepted,
                    latency_ms,
                    detail: None,
                });
                return Resolution {
                    value: Some(value),
                    strategy: Some(name),
                    attempts,
                };
            }
            Ok(_) => {
                tracing::debug!(task, strategy = %name, latency_ms, "result rejected");
                attempts.push(Attempt {
                    strategy: name,
                    outcome: Outcome::Rejected,
                    latency_ms,
                    detail: None,
                });
            }
            Err(err) => {
                tracing::warn!(task, strategy = %name, error = %err, "strategy unavailable");
                attempts.push(Attempt {
                    strategy: name,
                    outcome: Outcome::Unavailable,
                    latency_ms,
                    detail: Some(err.to_string()),
                });
            }
        }
    }
    tracing::warn!(task, tried = attempts.len(), "all strategies exhausted");
    Resolution {
        value: None,
        strategy: None,
        attempts,
    }
}
