//! services/remote.rs
//! Shared HTTP plumbing for the remote translation and categorization strategies.

use anyhow::{Context, Result};
use reqwest::blocking::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

use crate::config::RemoteConfig;
use crate::services::resolver::{StrategyError, StrategyResult};

/// Blocking client with the configured request timeout.
pub fn build_client(cfg: &RemoteConfig) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(cfg.timeout_secs.max(1)))
        .user_agent(concat!("voices-core/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("building HTTP client")
}

/// Non-2xx responses become [`StrategyError::Status`].
pub fn expect_success(resp: Response) -> StrategyResult<Response> {
    let status = resp.status();
    if !status.is_success() {
        return Err(StrategyError::Status(status.as_u16()));
    }
    Ok(resp)
}

pub fn decode<T: DeserializeOwned>(resp: Response) -> StrategyResult<T> {
    let body = expect_success(resp)?;
    body.json::<T>().map_err(|e| StrategyError::Decode(e.to_string()))
}

/// A model-hosting endpoint that takes `POST <base><model>` with a JSON body,
/// the HuggingFace Inference API shape. Also used for self-hosted servers.
#[derive(Clone)]
pub struct InferenceEndpoint {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl InferenceEndpoint {
    pub fn new(client: Client, base_url: impl Into<String>, api_key: Option<String>) -> Self {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self {
            client,
            base_url,
            api_key,
        }
    }

    pub fn model_url(&self, model: &str) -> String {
        format!("{}{}", self.base_url, model)
    }

    pub fn call(&self, model: &str, payload: &Value) -> StrategyResult<Value> {
        let mut req = self.client.post(self.model_url(model)).json(payload);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        decode(req.send()?)
    }
}
