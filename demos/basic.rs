//! Basic SSC Example
//!
//! Connects a shared counter document to a synchronization server and
//! mirrors every refresh to stdout.
//!
//! Run with: cargo run --example basic -- ws://localhost:8080 http://localhost:8080/auth/

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use ssc_client::{ClientOptions, SharedStateClient, StateCallbacks};
use ssc_core::{ContentId, Operation, PresenceRecord, ServerConfig, SharedState};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Counter {
    count: i64,
}

impl SharedState for Counter {
    fn seed() -> Self {
        Counter { count: 0 }
    }
}

struct Console;

#[async_trait::async_trait]
impl StateCallbacks<Counter> for Console {
    async fn on_refresh(&self, data: Counter) {
        println!("count = {}", data.count);
    }

    async fn on_connected(&self, data: Counter) {
        println!("connected, count = {}", data.count);
    }

    async fn on_deleted(&self) {
        println!("document was deleted");
    }

    async fn on_error(&self, message: &str) {
        eprintln!("transport error: {}", message);
    }

    async fn on_refresh_presences(
        &self,
        presences: std::collections::HashMap<String, PresenceRecord>,
    ) {
        let names: Vec<&str> = presences.values().map(|p| p.name.as_str()).collect();
        println!("here now: {}", names.join(", "));
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let mut args = std::env::args().skip(1);
    let server_url = args
        .next()
        .unwrap_or_else(|| "ws://localhost:8080".to_string());
    let auth_endpoint = args
        .next()
        .unwrap_or_else(|| "http://localhost:8080/auth/".to_string());

    println!("SSC Basic Example\n");
    println!("server: {}", server_url);
    println!("auth:   {}\n", auth_endpoint);

    let config = ServerConfig::new(server_url, auth_endpoint);
    let client: SharedStateClient<Counter> = SharedStateClient::connect(
        &config,
        ContentId::new("demo-counter")?,
        Arc::new(Console),
        ClientOptions {
            enable_presence: true,
            ..ClientOptions::default()
        },
    )?;

    // Bump the counter every few seconds until interrupted
    let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(3));
    loop {
        tokio::select! {
            _ = interval.tick() => {
                let op = Operation::from_value(serde_json::json!([{"p": ["count"], "na": 1}]));
                if let Err(e) = client.submit_op(op).await {
                    eprintln!("submit failed: {}", e);
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    println!("shutting down");
    client.close().await;
    Ok(())
}
