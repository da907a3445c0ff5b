use serde::Deserialize;

/// API key accepted when `AGENT_API_KEY` is not set.
pub const DEFAULT_API_KEY: &str = "yield-agent-secret-key";

/// Graph invoked on the upstream when `AGENT_GRAPH_ID` is not set.
pub const DEFAULT_GRAPH_ID: &str = "yield_agent";

/// Agent gateway settings.
///
/// Field names match the environment variables once upper-cased
/// (`AGENT_API_KEY`, `AGENT_UPSTREAM_URL`, ...), so the struct can be
/// filled by `envy` from a captured environment.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct GatewayConfig {
    /// Value the `X-API-Key` header must carry.
    #[serde(default = "default_api_key")]
    pub agent_api_key: String,

    /// Base URL of the graph server that executes the agent.
    #[serde(default)]
    pub agent_upstream_url: Option<String>,

    /// Graph (assistant) id requested from the upstream.
    #[serde(default = "default_graph_id")]
    pub agent_graph_id: String,

    /// Upper bound for one upstream run, in seconds.
    #[serde(default = "default_upstream_timeout_secs")]
    pub agent_upstream_timeout_secs: u64,
}

fn default_api_key() -> String {
    DEFAULT_API_KEY.to_string()
}

fn default_graph_id() -> String {
    DEFAULT_GRAPH_ID.to_string()
}

fn default_upstream_timeout_secs() -> u64 {
    120
}

impl GatewayConfig {
    /// True when the built-in API key is in effect.
    #[must_use]
    pub fn uses_default_api_key(&self) -> bool {
        self.agent_api_key == DEFAULT_API_KEY
    }

    /// Upstream URL with surrounding whitespace removed; empty counts as unset.
    #[must_use]
    pub fn upstream_url(&self) -> Option<&str> {
        self.agent_upstream_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            agent_api_key: default_api_key(),
            agent_upstream_url: None,
            agent_graph_id: default_graph_id(),
            agent_upstream_timeout_secs: default_upstream_timeout_secs(),
        }
    }
}
