use std::net::IpAddr;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub data_dir: PathBuf,
    pub logs_dir: PathBuf,
    pub public_dir: PathBuf,
    pub log_level: String,
    /// When set, /request-reset echoes the raw token as `debug_token`.
    pub debug_tokens: bool,
    pub admin_email: String,
    pub admin_password: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let host: IpAddr = env_or("VULNLOGIN_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid VULNLOGIN_HOST: {e}"))?;

        let port: u16 = env_or("PORT", "3000")
            .parse()
            .map_err(|e| format!("Invalid PORT: {e}"))?;

        let data_dir = PathBuf::from(env_or("VULNLOGIN_DATA_DIR", "data"));
        let logs_dir = PathBuf::from(env_or("VULNLOGIN_LOGS_DIR", "logs"));
        let public_dir = PathBuf::from(env_or("VULNLOGIN_PUBLIC_DIR", "public"));

        let log_level = env_or("VULNLOGIN_LOG_LEVEL", "info");
        let debug_tokens = env_flag("VULNLOGIN_DEBUG_TOKENS");

        let admin_email = env_or("ADMIN_EMAIL", "admin@example.com");
        let admin_password = env_or("ADMIN_PASSWORD", "win95!");

        Ok(Config {
            host,
            port,
            data_dir,
            logs_dir,
            public_dir,
            log_level,
            debug_tokens,
            admin_email,
            admin_password,
        })
    }

    pub fn users_file(&self) -> PathBuf {
        self.data_dir.join("users.json")
    }

    pub fn log_file(&self) -> PathBuf {
        self.logs_dir.join("app.log")
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_flag(key: &str) -> bool {
    let value = env_or(key, "");
    let value = value.trim();
    value == "1" || value.eq_ignore_ascii_case("true")
}
