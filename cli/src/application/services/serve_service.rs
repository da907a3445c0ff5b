//! Application service — resolve a compiled-in application by identifier.
//!
//! `berth serve` hosts applications linked into the binary instead of an
//! external interpreter. Resolution happens before any socket is bound.

use std::collections::BTreeMap;

use anyhow::Result;
use axum::Router;
use berth_common::GatewayConfig;

use crate::domain::{AppIdentifier, LaunchError};

/// Builds an application's router from gateway settings.
pub type AppFactory = fn(&GatewayConfig) -> Result<Router>;

/// Identifier → factory table of applications `serve` can host.
pub struct AppRegistry {
    apps: BTreeMap<String, AppFactory>,
}

impl AppRegistry {
    #[must_use]
    pub fn empty() -> Self {
        Self {
            apps: BTreeMap::new(),
        }
    }

    /// Registry with every application linked into this binary.
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register(agent_gateway::APP_IDENTIFIER, agent_gateway::app);
        registry
    }

    pub fn register(&mut self, identifier: &str, factory: AppFactory) {
        self.apps.insert(identifier.to_string(), factory);
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.apps.keys().map(String::as_str)
    }

    /// # Errors
    ///
    /// Returns `LaunchError::UnknownApplication` naming the known identifiers.
    pub fn resolve(&self, app: &AppIdentifier) -> Result<AppFactory, LaunchError> {
        self.apps
            .get(&app.to_string())
            .copied()
            .ok_or_else(|| LaunchError::UnknownApplication {
                app: app.to_string(),
                available: self.identifiers().collect::<Vec<_>>().join(", "),
            })
    }

    /// Resolve `app` and build its router.
    ///
    /// # Errors
    ///
    /// Returns an error if the identifier is unknown or the factory fails.
    pub fn build(&self, app: &AppIdentifier, gateway: &GatewayConfig) -> Result<Router> {
        let factory = self.resolve(app)?;
        factory(gateway)
    }
}
