use std::net::SocketAddr;

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use tempfile::TempDir;

use vulnlogin::config::Config;
use vulnlogin::state::SharedState;

/// A running test server instance backed by throwaway data/log directories.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub state: SharedState,
    _dirs: TempDir,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn register(&self, email: &str, password: &str) -> (Value, StatusCode) {
        self.post(
            "/register",
            &json!({ "email": email, "password": password }),
        )
        .await
    }

    pub async fn login(&self, email: &str, password: &str) -> (Value, StatusCode) {
        self.post("/login", &json!({ "email": email, "password": password }))
            .await
    }

    pub async fn request_reset(&self, email: &str) -> (Value, StatusCode) {
        self.post("/request-reset", &json!({ "email": email })).await
    }

    pub async fn reset_password(
        &self,
        email: &str,
        token: &str,
        new_password: &str,
    ) -> (Value, StatusCode) {
        self.post(
            "/reset-password",
            &json!({ "email": email, "token": token, "newPassword": new_password }),
        )
        .await
    }

    pub async fn check_token(&self, email: &str, token: &str) -> (Value, StatusCode) {
        self.get(&format!("/check-token/{email}/{token}")).await
    }

    pub async fn post(&self, path: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("post request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn get(&self, path: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("get request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with_debug(false).await
}

/// Spawn the real app on an ephemeral port with fresh temp directories.
pub async fn spawn_app_with_debug(debug_tokens: bool) -> TestApp {
    let dirs = TempDir::new().expect("failed to create temp dir");

    let config = Config {
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        data_dir: dirs.path().join("data"),
        logs_dir: dirs.path().join("logs"),
        public_dir: dirs.path().join("public"),
        log_level: "warn".to_string(),
        debug_tokens,
        admin_email: "admin@example.com".to_string(),
        admin_password: "win95!".to_string(),
    };

    let state = vulnlogin::build_state(config);
    tokio::fs::create_dir_all(&state.config.data_dir)
        .await
        .expect("failed to create data dir");
    tokio::fs::create_dir_all(&state.config.logs_dir)
        .await
        .expect("failed to create logs dir");
    state.store.ensure_file().await.expect("failed to seed users file");

    let app = vulnlogin::build_app(state.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind test listener");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("test server failed");
    });

    TestApp {
        addr,
        client: Client::new(),
        state,
        _dirs: dirs,
    }
}
