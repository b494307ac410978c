use serde::{Deserialize, Serialize};

/// Prometheus exporter settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Port the `/metrics` listener binds to on all interfaces.
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

impl MetricsConfig {
    /// Default port of the metrics listener.
    pub const DEFAULT_PORT: u16 = 9000;
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            port: default_metrics_port(),
        }
    }
}

fn default_metrics_port() -> u16 {
    MetricsConfig::DEFAULT_PORT
}
