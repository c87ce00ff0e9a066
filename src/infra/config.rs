use std::path::Path;

use anyhow::{bail, Context};
use serde::Deserialize;

use crate::core::mcp::ServerInfo;
use crate::tools::registry::DEFAULT_CAPACITY;

pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub mode: String, // "server" (HTTP) or "stdio"
    pub port: u16,
    pub max_tools: usize,
    pub server_name: String,
    pub server_version: String,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        let info = ServerInfo::default();
        Self {
            mode: "server".into(),
            port: DEFAULT_PORT,
            max_tools: DEFAULT_CAPACITY,
            server_name: info.name,
            server_version: info.version,
            log_level: "info".into(),
        }
    }
}

/// `[server]` table of the optional TOML file. Every key is optional.
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    #[serde(default)]
    server: FileServer,
}

#[derive(Debug, Default, Deserialize)]
struct FileServer {
    mode: Option<String>,
    port: Option<u16>,
    max_tools: Option<usize>,
    name: Option<String>,
    version: Option<String>,
    log_level: Option<String>,
}

impl Config {
    /// Defaults overridden by the environment. Unparseable numbers keep the default.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        cfg.apply_env();
        cfg
    }

    /// File named by `MCP_CONFIG` (if set), then the environment on top.
    pub fn load() -> anyhow::Result<Self> {
        let mut cfg = match std::env::var("MCP_CONFIG") {
            Ok(path) if !path.is_empty() => Self::from_file(&path)?,
            _ => Self::default(),
        };
        cfg.apply_env();
        Ok(cfg)
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let file: FileConfig = toml::from_str(&text)
            .with_context(|| format!("parsing config file {}", path.display()))?;

        let mut cfg = Self::default();
        let s = file.server;
        if let Some(v) = s.mode {
            cfg.mode = v;
        }
        if let Some(v) = s.port {
            cfg.port = v;
        }
        if let Some(v) = s.max_tools {
            cfg.max_tools = v;
        }
        if let Some(v) = s.name {
            cfg.server_name = v;
        }
        if let Some(v) = s.version {
            cfg.server_version = v;
        }
        if let Some(v) = s.log_level {
            cfg.log_level = v;
        }
        Ok(cfg)
    }

    fn apply_env(&mut self) {
        if let Ok(v) = std::env::var("MODE") {
            self.mode = v;
        }
        if let Some(v) = std::env::var("PORT").ok().and_then(|s| s.parse::<u16>().ok()) {
            self.port = v;
        }
        if let Some(v) = std::env::var("MCP_MAX_TOOLS").ok().and_then(|s| s.parse::<usize>().ok()) {
            self.max_tools = v;
        }
        if let Ok(v) = std::env::var("MCP_SERVER_NAME") {
            self.server_name = v;
        }
        if let Ok(v) = std::env::var("MCP_SERVER_VERSION") {
            self.server_version = v;
        }
        if let Ok(v) = std::env::var("RUST_LOG") {
            self.log_level = v;
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !matches!(self.mode.as_str(), "server" | "stdio") {
            bail!("Invalid MODE: {}. Must be 'server' or 'stdio'", self.mode);
        }
        if self.mode == "server" && self.port == 0 {
            bail!("PORT cannot be 0");
        }
        if self.max_tools == 0 {
            bail!("MCP_MAX_TOOLS cannot be 0");
        }
        Ok(())
    }

    pub fn is_stdio(&self) -> bool {
        self.mode == "stdio"
    }

    pub fn server_info(&self) -> ServerInfo {
        ServerInfo {
            name: self.server_name.clone(),
            version: self.server_version.clone(),
        }
    }
}
