//! The append-only application log served by /logs, plus the noise that
//! feeds it: a sampled request logger and a third-party joke fetch.

use std::path::PathBuf;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use chrono::Utc;
use tokio::io::AsyncWriteExt;

use crate::state::SharedState;

const JOKE_URL: &str = "https://api.chucknorris.io/jokes/random";
const LOG_SAMPLE_RATE: f64 = 0.2; // 1 in 5 requests

pub struct Logbook {
    path: PathBuf,
    client: reqwest::Client,
}

impl Logbook {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            client: reqwest::Client::new(),
        }
    }

    /// Append one line. Logging failures are swallowed unconditionally.
    pub async fn append(&self, line: &str) {
        if let Some(parent) = self.path.parent() {
            let _ = tokio::fs::create_dir_all(parent).await;
        }
        let open = tokio::fs::OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)
            .await;
        if let Ok(mut file) = open {
            let _ = file.write_all(format!("{line}\n").as_bytes()).await;
        }
    }

    /// Last `limit` lines of the log; a missing file reads as empty.
    pub async fn tail(&self, limit: usize) -> String {
        let content = tokio::fs::read_to_string(&self.path).await.unwrap_or_default();
        let lines: Vec<&str> = content.lines().collect();
        let start = lines.len().saturating_sub(limit);
        lines[start..].join("\n")
    }

    /// Fetch a random joke. Any failure yields a placeholder, never an error.
    pub async fn fetch_joke(&self) -> String {
        let value = async {
            let body: serde_json::Value = self
                .client
                .get(JOKE_URL)
                .send()
                .await
                .ok()?
                .json()
                .await
                .ok()?;
            body.get("value")?.as_str().map(str::to_string)
        }
        .await;
        value.unwrap_or_else(|| "Joke fetch failed".to_string())
    }
}

/// Collapse whitespace and clip a joke to 200 characters for a log line.
pub fn squash(joke: &str) -> String {
    joke.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(200)
        .collect()
}

/// Roughly one request in five gets a joke-decorated line appended to the
/// app log. Fire-and-forget so the response is never delayed.
pub async fn random_logger(
    State(state): State<SharedState>,
    req: Request,
    next: Next,
) -> Response {
    if rand::random::<f64>() < LOG_SAMPLE_RATE {
        let method = req.method().clone();
        let path = req
            .uri()
            .path_and_query()
            .map(|p| p.to_string())
            .unwrap_or_else(|| req.uri().path().to_string());
        let state = state.clone();
        tokio::spawn(async move {
            let joke = state.logbook.fetch_joke().await;
            let fake_hash: [u8; 32] = rand::random();
            let line = format!(
                "{} {} {} FAKE_HASH={} JOKE=\"{}\"",
                Utc::now().to_rfc3339(),
                method,
                path,
                hex::encode(fake_hash),
                squash(&joke),
            );
            state.logbook.append(&line).await;
        });
    }
    next.run(req).await
}
