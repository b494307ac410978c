use std::net::{IpAddr, Ipv6Addr, SocketAddr};

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use sweep_config::shared::MetricsConfig;

/// Installs the global metrics recorder and starts an HTTP listener serving `/metrics`.
///
/// The listener binds `[::]:{port}` so Prometheus can scrape a long-running sweep. The bucket
/// being swept is attached to every series as a global label.
pub fn init_metrics(config: &MetricsConfig, bucket: &str) -> Result<(), BuildError> {
    PrometheusBuilder::new()
        .with_http_listener(SocketAddr::new(
            IpAddr::V6(Ipv6Addr::UNSPECIFIED),
            config.port,
        ))
        .add_global_label("bucket", bucket)
        .install()
}
