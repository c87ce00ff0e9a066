/// Initialize the tracing subscriber once. `RUST_LOG` wins over `default_level`.
///
/// Output goes to stderr; stdout belongs to the stdio transport.
pub fn init(default_level: &str) {
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| default_level.to_string());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Log a metric line and record it through the `metrics` facade.
pub fn log_metric(tool: &str, metric: &str, value: f64) {
    tracing::info!(tool = tool, metric = metric, value = value, "metric");
    metrics::histogram!(format!("mcp.{metric}"), "tool" => tool.to_string()).record(value);
}
