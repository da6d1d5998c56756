//! Liveness and readiness tracking
//!
//! Two components are tracked: the model artifact (did it load?) and the
//! adapter (does the model fit the schema, and is inference succeeding?).
//! The app stays up without a model so it can show the setup hint; health
//! and readiness report the failure instead.

use crate::error::AdapterError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Health status of a component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Healthy,
    /// Serving, but recent predictions failed
    Degraded,
    /// Cannot serve predictions
    Unhealthy,
}

/// Current state of one component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub status: ComponentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Unix timestamp of the last status change
    pub since: i64,
}

/// `/healthz` body: worst status wins
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: ComponentStatus,
    pub components: BTreeMap<String, ComponentHealth>,
}

/// `/readyz` body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Component names
pub mod components {
    pub const MODEL: &str = "model";
    pub const ADAPTER: &str = "adapter";
}

#[derive(Debug, Default)]
struct RegistryState {
    components: BTreeMap<String, ComponentHealth>,
    initialized: bool,
}

/// Shared component health; clones observe the same state
#[derive(Debug, Clone, Default)]
pub struct HealthRegistry {
    state: Arc<RwLock<RegistryState>>,
}

impl HealthRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a component, starting healthy
    pub async fn register(&self, name: &str) {
        self.mark(name, ComponentStatus::Healthy, None).await;
    }

    pub async fn set_healthy(&self, name: &str) {
        self.mark(name, ComponentStatus::Healthy, None).await;
    }

    pub async fn set_degraded(&self, name: &str, message: impl Into<String>) {
        self.mark(name, ComponentStatus::Degraded, Some(message.into()))
            .await;
    }

    pub async fn set_unhealthy(&self, name: &str, message: impl Into<String>) {
        self.mark(name, ComponentStatus::Unhealthy, Some(message.into()))
            .await;
    }

    /// Blame a model setup failure on the right component.
    ///
    /// Artifact errors land on `model` with the operator hint; anything else
    /// (a model that loaded but does not fit the schema) on `adapter`.
    pub async fn record_setup_error(&self, err: &AdapterError) {
        match err.remediation() {
            Some(hint) if err.is_artifact() => self.set_unhealthy(components::MODEL, hint).await,
            _ => self.set_unhealthy(components::ADAPTER, err.to_string()).await,
        }
    }

    async fn mark(&self, name: &str, status: ComponentStatus, message: Option<String>) {
        let mut state = self.state.write().await;
        let since = match state.components.get(name) {
            Some(current) if current.status == status => current.since,
            _ => chrono::Utc::now().timestamp(),
        };
        state.components.insert(
            name.to_string(),
            ComponentHealth {
                status,
                message,
                since,
            },
        );
    }

    pub async fn set_ready(&self, ready: bool) {
        self.state.write().await.initialized = ready;
    }

    pub async fn health(&self) -> HealthResponse {
        let components = self.state.read().await.components.clone();
        let status = components
            .values()
            .map(|c| c.status)
            .max_by_key(|s| match s {
                ComponentStatus::Healthy => 0,
                ComponentStatus::Degraded => 1,
                ComponentStatus::Unhealthy => 2,
            })
            .unwrap_or(ComponentStatus::Healthy);
        HealthResponse { status, components }
    }

    /// Ready once initialized, and only while no component is unhealthy
    pub async fn readiness(&self) -> ReadinessResponse {
        let state = self.state.read().await;
        if !state.initialized {
            return ReadinessResponse {
                ready: false,
                reason: Some("App not yet initialized".to_string()),
            };
        }

        let blocking = state
            .components
            .iter()
            .find(|(_, c)| c.status == ComponentStatus::Unhealthy);
        match blocking {
            Some((name, component)) => ReadinessResponse {
                ready: false,
                reason: Some(match &component.message {
                    Some(msg) => format!("{} unhealthy: {}", name, msg),
                    None => format!("{} unhealthy", name),
                }),
            },
            None => ReadinessResponse {
                ready: true,
                reason: None,
            },
        }
    }
}
