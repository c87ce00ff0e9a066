use std::net::{IpAddr, Ipv4Addr};

use serde_json::json;

use esp_mcp_gateway::api::dispatch::SessionState;
use esp_mcp_gateway::api::server::McpServer;
use esp_mcp_gateway::clients::rpc::{ClientError, RpcClient};
use esp_mcp_gateway::core::mcp::ServerInfo;
use esp_mcp_gateway::infra::http_app::HttpTransport;
use esp_mcp_gateway::tools::demo_tools;
use esp_mcp_gateway::tools::thermostat::Thermostat;

async fn running_server(thermostat: &Thermostat) -> (McpServer, String) {
    let transport = HttpTransport::new(IpAddr::V4(Ipv4Addr::LOCALHOST));
    let mut server = McpServer::new(Box::new(transport), ServerInfo::default(), 32);
    server.register_tools(demo_tools(thermostat)).unwrap();
    server.start(0).await.unwrap();
    let addr = server.local_addr().expect("bound address");
    (server, format!("http://{addr}/"))
}

#[tokio::test]
async fn client_talks_to_a_live_server() {
    let thermostat = Thermostat::default();
    let (mut server, url) = running_server(&thermostat).await;
    let client = RpcClient::new(url).unwrap();

    let init = client.initialize("e2e").await.unwrap();
    assert_eq!(init["serverInfo"]["name"], "ESP32 MCP Server");
    let session = server.session();
    assert_eq!(session.state, SessionState::Ready);
    assert_eq!(session.client_name.as_deref(), Some("e2e"));

    let tools = client.list_tools().await.unwrap();
    assert_eq!(tools.len(), 3);

    let temp = client.call_tool("get_temperature", json!({})).await.unwrap();
    let reading: serde_json::Value =
        serde_json::from_str(temp["content"][0]["text"].as_str().unwrap()).unwrap();
    let t = reading["temperature"].as_f64().unwrap();
    assert!((40.0..=80.0).contains(&t));
    assert_eq!(reading["unit"], "F");

    let set = client
        .call_tool("set_thermostat", json!({"temperature": 80}))
        .await
        .unwrap();
    assert!(set.get("content").is_some());
    assert_eq!(thermostat.setpoint(), 80.0);

    match client.call_tool("missing_tool", json!({})).await {
        Err(ClientError::Rpc(e)) => assert_eq!(e.code, -32602),
        other => panic!("expected rpc error, got {other:?}"),
    }

    server.stop().await.unwrap();
}

#[tokio::test]
async fn preflight_and_headers_over_the_wire() {
    let (server, url) = running_server(&Thermostat::default()).await;
    let http = reqwest::Client::new();

    let pre = http.request(reqwest::Method::OPTIONS, &url).send().await.unwrap();
    assert_eq!(pre.status(), 204);
    assert_eq!(pre.headers()["access-control-allow-origin"], "*");
    assert_eq!(pre.headers()["access-control-max-age"], "86400");

    let resp = http
        .post(&url)
        .body(r#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers()["content-type"], "application/json");
    assert_eq!(resp.headers()["access-control-allow-origin"], "*");

    let big = http.post(&url).body(vec![b' '; 5000]).send().await.unwrap();
    assert_eq!(big.status(), 500);

    server.destroy();
}
