use clap::{Parser, Subcommand};
use std::process::ExitCode;

use crate::clients::rpc::RpcClient;
use crate::infra::config::Config;

#[derive(Parser)]
#[command(name = "esp-mcp-gateway")]
#[command(about = "ESP MCP Gateway - tool server and admin CLI")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the server with the demo tools (default)
    Serve,
    /// List the tools a running server advertises
    Tools {
        /// Server URL
        #[arg(short, long, default_value = "http://localhost:3000/")]
        url: String,
    },
    /// Invoke one tool on a running server
    Call {
        /// Server URL
        #[arg(short, long, default_value = "http://localhost:3000/")]
        url: String,
        /// Tool name
        #[arg(short, long)]
        name: String,
        /// Tool arguments as a JSON object
        #[arg(short, long, default_value = "{}")]
        args: String,
    },
    /// Validate configuration
    Config {
        /// Validate config without starting service
        #[arg(long)]
        validate: bool,
    },
}

pub async fn run() -> ExitCode {
    let cli = Cli::parse();

    run_commands(cli.command.unwrap_or(Commands::Serve)).await
}

pub async fn run_commands(command: Commands) -> ExitCode {
    match command {
        Commands::Serve => match serve().await {
            Ok(_) => ExitCode::SUCCESS,
            Err(e) => {
                tracing::error!(error = %e, "server failed");
                eprintln!("❌ Server failed: {:#}", e);
                ExitCode::FAILURE
            }
        },
        Commands::Tools { url } => match list_tools(&url).await {
            Ok(_) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("❌ Listing tools failed: {:#}", e);
                ExitCode::FAILURE
            }
        },
        Commands::Call { url, name, args } => match call_tool(&url, &name, &args).await {
            Ok(_) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("❌ Tool call failed: {:#}", e);
                ExitCode::FAILURE
            }
        },
        Commands::Config { validate } => match check_config(validate) {
            Ok(_) => {
                println!("✅ Configuration is valid");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("❌ Configuration validation failed: {:#}", e);
                ExitCode::FAILURE
            }
        },
    }
}

async fn serve() -> anyhow::Result<()> {
    let cfg = Config::load()?;
    crate::infra::logging::init(&cfg.log_level);
    crate::infra::boot::run_server(cfg).await
}

async fn list_tools(url: &str) -> anyhow::Result<()> {
    let client = RpcClient::new(url)?;
    let tools = client.list_tools().await?;

    println!("🔧 {} tool(s):", tools.len());
    for tool in &tools {
        let name = tool.get("name").and_then(|v| v.as_str()).unwrap_or("?");
        match tool.get("description").and_then(|v| v.as_str()) {
            Some(d) => println!("  - {name}: {d}"),
            None => println!("  - {name}"),
        }
    }
    Ok(())
}

async fn call_tool(url: &str, name: &str, args: &str) -> anyhow::Result<()> {
    let arguments: serde_json::Value = serde_json::from_str(args)
        .map_err(|e| anyhow::anyhow!("--args is not valid JSON: {e}"))?;
    let client = RpcClient::new(url)?;
    let payload = client.call_tool(name, arguments).await?;

    // A tool failure is a successful RPC carrying {"error": ..}.
    if let Some(msg) = payload.get("error").and_then(|v| v.as_str()) {
        anyhow::bail!("{name}: {msg}");
    }
    let texts = payload
        .get("content")
        .and_then(|c| c.as_array())
        .into_iter()
        .flatten()
        .filter_map(|item| item.get("text").and_then(|t| t.as_str()));
    for text in texts {
        println!("{text}");
    }
    Ok(())
}

fn check_config(validate: bool) -> anyhow::Result<()> {
    let cfg = Config::load()?;
    if validate {
        cfg.validate()?;
    }
    println!("📋 Configuration:");
    println!("  Mode: {}", cfg.mode);
    println!("  Port: {}", cfg.port);
    println!("  Max tools: {}", cfg.max_tools);
    println!("  Server: {} {}", cfg.server_name, cfg.server_version);
    println!("  Log Level: {}", cfg.log_level);
    Ok(())
}
