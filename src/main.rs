use std::net::SocketAddr;
use std::time::Duration;

use chrono::Utc;
use tokio::signal;
use tracing_subscriber::EnvFilter;

use vulnlogin::config::Config;
use vulnlogin::hash;
use vulnlogin::logbook;
use vulnlogin::state::SharedState;
use vulnlogin::store::User;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    let config = Config::from_env().expect("Failed to load configuration");

    // Init tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    tracing::info!("Starting vulnlogin");

    let state = vulnlogin::build_state(config.clone());

    tokio::fs::create_dir_all(&state.config.data_dir).await?;
    tokio::fs::create_dir_all(&state.config.logs_dir).await?;
    state.store.ensure_file().await?;
    ensure_admin_user(&state).await?;

    let addr = SocketAddr::new(config.host, config.port);
    let app = vulnlogin::build_app(state.clone());

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let local_addr = listener.local_addr()?;
    tracing::info!("Listening on {local_addr}");

    spawn_admin_heartbeat(state.clone(), local_addr.port());
    spawn_noise_logger(state);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Register the bootstrap admin user if it is not present yet.
async fn ensure_admin_user(state: &SharedState) -> std::io::Result<()> {
    let email = &state.config.admin_email;
    if state.store.find_by_email(email).await?.is_some() {
        return Ok(());
    }
    let password_hash = hash::encode(email, &state.config.admin_password);
    state
        .store
        .append(User {
            email: email.clone(),
            password_hash,
        })
        .await?;
    tracing::info!("admin user created: {email}");
    Ok(())
}

/// POST the admin credentials to /login shortly after boot and then every
/// minute. Pure traffic noise; failures are ignored.
fn spawn_admin_heartbeat(state: SharedState, port: u16) {
    tokio::spawn(async move {
        let client = reqwest::Client::new();
        let url = format!("http://localhost:{port}/login");
        let body = serde_json::json!({
            "email": state.config.admin_email,
            "password": state.config.admin_password,
        });

        tokio::time::sleep(Duration::from_millis(1500)).await;
        loop {
            let _ = client.post(&url).json(&body).send().await;
            tokio::time::sleep(Duration::from_secs(60)).await;
        }
    });
}

/// Append a joke heartbeat line to the app log every 10 seconds.
fn spawn_noise_logger(state: SharedState) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(10));
        // The first tick completes immediately.
        interval.tick().await;
        loop {
            interval.tick().await;
            let joke = state.logbook.fetch_joke().await;
            let line = format!(
                "{} NOISE heartbeat JOKE=\"{}\"",
                Utc::now().to_rfc3339(),
                logbook::squash(&joke),
            );
            state.logbook.append(&line).await;
        }
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
