use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    esp_mcp_gateway::cli::run().await
}
