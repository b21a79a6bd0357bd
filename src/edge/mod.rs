//! Edge server in front of the page renderer.
//!
//! Every request passes through [`gate::evaluate`] first; what the gate lets
//! through is either served here (`/health`, `/api/revalidate`) or forwarded
//! to the upstream renderer by [`proxy::Upstream`].

pub mod gate;
mod health;
pub mod proxy;
pub mod revalidate;
mod server;

pub use gate::{EdgeRequest, GateConfig, GateDecision, evaluate};
pub use proxy::Upstream;
pub use revalidate::{LogRevalidator, Revalidate};
pub use server::{router, serve};

use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;

/// Shared state for every edge handler.
pub struct EdgeState {
    gate: GateConfig,
    upstream: Upstream,
    revalidation_secret: Option<SecretString>,
    revalidator: Arc<dyn Revalidate>,
}

impl EdgeState {
    #[must_use]
    pub fn new(gate: GateConfig, upstream: Upstream) -> Self {
        Self {
            gate,
            upstream,
            revalidation_secret: None,
            revalidator: Arc::new(LogRevalidator),
        }
    }

    #[must_use]
    pub fn with_revalidation(
        mut self,
        secret: Option<SecretString>,
        revalidator: Arc<dyn Revalidate>,
    ) -> Self {
        self.revalidation_secret = secret;
        self.revalidator = revalidator;
        self
    }

    #[must_use]
    pub const fn gate(&self) -> &GateConfig {
        &self.gate
    }

    #[must_use]
    pub const fn upstream(&self) -> &Upstream {
        &self.upstream
    }

    /// Configured revalidation secret; an empty value counts as unset.
    #[must_use]
    pub fn revalidation_secret(&self) -> Option<&str> {
        self.revalidation_secret
            .as_ref()
            .map(|secret| secret.expose_secret())
            .filter(|secret| !secret.is_empty())
    }

    #[must_use]
    pub fn revalidator(&self) -> &dyn Revalidate {
        self.revalidator.as_ref()
    }
}
