use anyhow::Result;
use prometheus::Registry;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::metrics;

pub struct Observability {
    pub registry: Registry,
}

impl Observability {
    /// Register the binding metrics and install the global subscriber.
    ///
    /// `LOG_FORMAT=json` switches the fmt layer to JSON lines.
    pub fn init() -> Result<Self> {
        let registry = Self::registry()?;

        let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "reqbind=debug,reqbind_api=debug".into());
        let json = std::env::var("LOG_FORMAT").map_or(false, |format| format.eq_ignore_ascii_case("json"));

        tracing_subscriber::registry()
            .with(env_filter)
            .with(json.then(|| tracing_subscriber::fmt::layer().json()))
            .with((!json).then(|| tracing_subscriber::fmt::layer()))
            .try_init()?;

        tracing::info!("Observability stack initialized (Prometheus + tracing, json={})", json);
        Ok(Self { registry })
    }

    /// A fresh registry with every binding metric registered
    pub fn registry() -> Result<Registry> {
        let registry = Registry::new_custom(Some("reqbind".into()), None)?;
        metrics::register_all(&registry)?;
        Ok(registry)
    }

    pub fn gather(&self) -> String {
        metrics::gather_metrics(&self.registry)
    }
}
