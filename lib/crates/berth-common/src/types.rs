use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Display name reported by the gateway's informational endpoints.
pub const AGENT_NAME: &str = "Cross-Chain Yield Intelligence Agent";

/// Version reported by the gateway's informational endpoints.
pub const AGENT_VERSION: &str = "1.0.0";

/// Minimum pool TVL (USD) applied when a request does not set one.
pub const DEFAULT_MIN_TVL: f64 = 100_000.0;

/// User's risk appetite for yield strategies.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RiskTolerance {
    Conservative,
    #[default]
    Moderate,
    Aggressive,
}

impl RiskTolerance {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Conservative => "conservative",
            Self::Moderate => "moderate",
            Self::Aggressive => "aggressive",
        }
    }
}

impl fmt::Display for RiskTolerance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown risk tolerance '{0}': expected conservative, moderate or aggressive")]
pub struct UnknownRiskTolerance(pub String);

impl FromStr for RiskTolerance {
    type Err = UnknownRiskTolerance;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "conservative" => Ok(Self::Conservative),
            "moderate" => Ok(Self::Moderate),
            "aggressive" => Ok(Self::Aggressive),
            _ => Err(UnknownRiskTolerance(s.to_string())),
        }
    }
}

/// Body of `POST /invoke` and `POST /chat`.
///
/// Every field except `query` may be omitted or sent as `null`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentRequest {
    pub query: String,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub current_chain: Option<String>,
    #[serde(default = "default_risk_tolerance")]
    pub risk_tolerance: Option<String>,
    #[serde(default)]
    pub preferred_chains: Option<Vec<String>>,
    #[serde(default)]
    pub excluded_protocols: Option<Vec<String>>,
    #[serde(default = "default_min_tvl")]
    pub min_tvl: Option<f64>,
}

#[allow(clippy::unnecessary_wraps)] // serde default must match the field type
fn default_risk_tolerance() -> Option<String> {
    Some(RiskTolerance::default().as_str().to_string())
}

#[allow(clippy::unnecessary_wraps)]
fn default_min_tvl() -> Option<f64> {
    Some(DEFAULT_MIN_TVL)
}

impl AgentRequest {
    /// Request carrying only a query; every other field takes its default.
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            amount: None,
            token: None,
            current_chain: None,
            risk_tolerance: default_risk_tolerance(),
            preferred_chains: None,
            excluded_protocols: None,
            min_tvl: default_min_tvl(),
        }
    }

    /// Parse `risk_tolerance`, treating `null` as the default.
    pub fn risk_tolerance(&self) -> Result<RiskTolerance, UnknownRiskTolerance> {
        self.risk_tolerance
            .as_deref()
            .map_or(Ok(RiskTolerance::default()), str::parse::<RiskTolerance>)
    }
}

/// Input state handed to the agent graph.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentInput {
    pub messages: Vec<ChatMessage>,
    pub user_query: String,
    pub amount: Option<f64>,
    pub token: Option<String>,
    pub current_chain: Option<String>,
    pub risk_tolerance: RiskTolerance,
    pub preferred_chains: Vec<String>,
    pub excluded_protocols: Vec<String>,
    pub min_tvl: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl AgentInput {
    /// Validate a request and convert it into graph input.
    pub fn from_request(request: &AgentRequest) -> Result<Self, UnknownRiskTolerance> {
        Ok(Self {
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: request.query.clone(),
            }],
            user_query: request.query.clone(),
            amount: request.amount,
            token: request.token.clone(),
            current_chain: request.current_chain.clone(),
            risk_tolerance: request.risk_tolerance()?,
            preferred_chains: request.preferred_chains.clone().unwrap_or_default(),
            excluded_protocols: request.excluded_protocols.clone().unwrap_or_default(),
            min_tvl: request.min_tvl.unwrap_or(DEFAULT_MIN_TVL),
        })
    }
}

/// Response of `POST /invoke` and `POST /chat`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AgentResponse {
    pub success: bool,
    pub response: String,
    pub error: Option<String>,
}

impl AgentResponse {
    #[must_use]
    pub fn ok(response: impl Into<String>) -> Self {
        Self {
            success: true,
            response: response.into(),
            error: None,
        }
    }

    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            response: String::new(),
            error: Some(error.into()),
        }
    }
}

/// Body of `GET /` and `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: String,
    pub agent: String,
    pub version: String,
}

impl HealthResponse {
    fn with_status(status: &str) -> Self {
        Self {
            status: status.to_string(),
            agent: AGENT_NAME.to_string(),
            version: AGENT_VERSION.to_string(),
        }
    }

    #[must_use]
    pub fn online() -> Self {
        Self::with_status("online")
    }

    #[must_use]
    pub fn healthy() -> Self {
        Self::with_status("healthy")
    }
}

/// Error body used for authentication failures.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorDetail {
    pub detail: String,
}
