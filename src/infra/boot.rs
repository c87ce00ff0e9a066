use crate::api::server::McpServer;
use crate::infra::config::Config;
use crate::tools::{demo_tools, thermostat::Thermostat};

/// Runs the server with the demo tools until ctrl-c or, for stdio, end of input.
pub async fn run_server(cfg: Config) -> anyhow::Result<()> {
    cfg.validate()?;
    tracing::info!(
        mode = %cfg.mode,
        port = cfg.port,
        max_tools = cfg.max_tools,
        "BOOT esp-mcp-gateway"
    );

    let mut server = build_server(&cfg)?;
    server.start(cfg.port).await?;
    if let Some(addr) = server.local_addr() {
        tracing::info!(%addr, "listening");
    }

    tokio::select! {
        res = tokio::signal::ctrl_c() => {
            res?;
            tracing::info!("shutdown requested");
        }
        _ = server.closed() => tracing::info!("transport closed"),
    }

    server.stop().await?;
    server.destroy();
    Ok(())
}

/// Server for `cfg` with the demo tools registered.
pub fn build_server(cfg: &Config) -> anyhow::Result<McpServer> {
    let mut server = McpServer::from_config(cfg);
    server.register_tools(demo_tools(&Thermostat::default()))?;
    Ok(server)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_server_registers_demo_tools() {
        let server = build_server(&Config::default()).unwrap();
        assert_eq!(server.tool_count(), 3);
        assert!(server.has_tool("set_thermostat"));
    }

    #[test]
    fn build_server_fails_when_capacity_is_too_small() {
        let cfg = Config { max_tools: 2, ..Config::default() };
        assert!(build_server(&cfg).is_err());
    }

    #[tokio::test]
    async fn run_server_rejects_invalid_config() {
        let cfg = Config { mode: "uart".into(), ..Config::default() };
        assert!(run_server(cfg).await.is_err());
    }
}
