//! Gateway bootstrap for a fictional taskboard application.
//!
//! Runs a Huddle gateway and simulates the application's REST side: a
//! background task pushes a status change for task `1` every few
//! seconds, the same way HTTP handlers would after a write commits.
//!
//! A demo token is printed on startup, so any WebSocket client can
//! watch the traffic:
//!
//! ```text
//! websocat 'ws://127.0.0.1:8080/?token=<printed token>'
//! {"event":"join:task","data":{"id":"1"}}
//! ```

use std::time::Duration;

use huddle::prelude::*;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::json;
use tracing_subscriber::EnvFilter;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_owned())
}

fn jwt_secret() -> Vec<u8> {
    match std::env::var("HUDDLE_JWT_SECRET") {
        Ok(secret) => secret.into_bytes(),
        Err(_) => {
            tracing::warn!("HUDDLE_JWT_SECRET not set, using the dev secret");
            b"dev-secret".to_vec()
        }
    }
}

fn demo_token(secret: &[u8], sub: &str) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = Claims::for_subject(sub);
    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret))
}

// ---------------------------------------------------------------------------
// Simulated REST layer
// ---------------------------------------------------------------------------

/// The frame a REST handler pushes after updating a task.
fn task_update_frame(task_id: &str, status: &str) -> Frame {
    Frame::new(
        EntityScope::Task.updated_event(),
        json!({
            "type": "task",
            "entityId": task_id,
            "data": { "status": status },
            "timestamp": now_millis(),
        }),
    )
}

/// Walks task `1` through its statuses forever, one push every five
/// seconds. Only clients that joined the task's room see these.
async fn simulate_rest_updates(hub: HubHandle) {
    const STATUSES: [&str; 4] = ["todo", "in_progress", "review", "done"];

    for round in 0.. {
        tokio::time::sleep(Duration::from_secs(5)).await;
        let status = STATUSES[round % STATUSES.len()];
        tracing::info!(status, "pushing simulated task update");

        let pushed = hub
            .broadcast_to_room(
                EntityScope::Task.room("1"),
                task_update_frame("1", status),
                None,
            )
            .await;
        if pushed.is_err() {
            // Hub gone, the server is shutting down.
            return;
        }
    }
}

// ---------------------------------------------------------------------------
// Server bootstrap
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let addr = env_or("HUDDLE_ADDR", "127.0.0.1:8080");
    let secret = jwt_secret();

    let server = HuddleServerBuilder::new()
        .bind(&addr)
        .build(JwtAuthenticator::new(&secret))
        .await?;

    tokio::spawn(simulate_rest_updates(server.hub()));

    let token = demo_token(&secret, "demo-user")?;
    tracing::info!(%addr, "taskboard gateway listening");
    println!("connect with: ws://{addr}/?token={token}");
    println!(r#"then join the demo task: {{"event":"join:task","data":{{"id":"1"}}}}"#);

    server.run().await?;
    Ok(())
}
