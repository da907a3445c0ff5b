//! Agent backends — where an invocation is actually executed.
//!
//! The gateway never runs agent logic itself. A request is either forwarded
//! to a graph server (`UpstreamAgent`) or answered with a configuration error
//! (`Backend::Unconfigured`).

use std::future::Future;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use berth_common::{AgentInput, GatewayConfig};
use serde::Serialize;
use serde_json::Value;

/// Executes one agent run and returns the formatted answer.
pub trait AgentBackend: Send + Sync + 'static {
    fn invoke(&self, input: &AgentInput) -> impl Future<Output = Result<String>> + Send;
}

/// Forwards runs to a graph server's `POST /runs/wait` endpoint.
pub struct UpstreamAgent {
    client: reqwest::Client,
    base_url: String,
    graph_id: String,
}

#[derive(Serialize)]
struct RunRequest<'a> {
    assistant_id: &'a str,
    input: &'a AgentInput,
}

impl UpstreamAgent {
    /// Create an upstream client for `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(base_url: &str, graph_id: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build upstream HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            graph_id: graph_id.to_string(),
        })
    }

    fn runs_url(&self) -> String {
        format!("{}/runs/wait", self.base_url)
    }
}

impl AgentBackend for UpstreamAgent {
    async fn invoke(&self, input: &AgentInput) -> Result<String> {
        let body = RunRequest {
            assistant_id: &self.graph_id,
            input,
        };
        let resp = self
            .client
            .post(self.runs_url())
            .json(&body)
            .send()
            .await
            .context("agent upstream unreachable")?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            bail!("agent upstream returned {status}: {}", text.trim());
        }

        let values: Value = resp
            .json()
            .await
            .context("agent upstream returned invalid JSON")?;
        formatted_response(&values)
    }
}

/// Pull the final answer out of a run's output state.
fn formatted_response(values: &Value) -> Result<String> {
    if let Some(text) = values
        .get("formatted_response")
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty())
    {
        return Ok(text.to_string());
    }
    if let Some(error) = values.get("error").and_then(Value::as_str) {
        bail!("{error}");
    }
    bail!("agent run finished without a formatted_response")
}

/// Backend selected from `GatewayConfig`.
pub enum Backend {
    Upstream(UpstreamAgent),
    Unconfigured,
}

impl Backend {
    /// # Errors
    ///
    /// Returns an error if the upstream client cannot be constructed.
    pub fn from_config(config: &GatewayConfig) -> Result<Self> {
        match config.upstream_url() {
            Some(url) => Ok(Self::Upstream(UpstreamAgent::new(
                url,
                &config.agent_graph_id,
                Duration::from_secs(config.agent_upstream_timeout_secs),
            )?)),
            None => Ok(Self::Unconfigured),
        }
    }
}

impl AgentBackend for Backend {
    async fn invoke(&self, input: &AgentInput) -> Result<String> {
        match self {
            Self::Upstream(agent) => agent.invoke(input).await,
            Self::Unconfigured => bail!("agent upstream not configured"),
        }
    }
}
