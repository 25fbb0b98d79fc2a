use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub database_url: String,
    pub database_max_connections: u32,
    pub agora_app_id: String,
    pub agora_app_certificate: String,
    pub call_token_ttl_seconds: u64,
    pub default_max_members: i64,
    pub room_code_max_attempts: u32,
    pub log_format: LogFormat,
}

/// Output format of the tracing subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Config {
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidPort)?,
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://roomcall.db?mode=rwc".to_string()),
            database_max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .unwrap_or(5),
            agora_app_id: require("AGORA_APP_ID")?,
            agora_app_certificate: require("AGORA_APP_CERTIFICATE")?,
            call_token_ttl_seconds: env::var("CALL_TOKEN_TTL_SECONDS")
                .unwrap_or_else(|_| "3600".to_string())
                .parse()
                .unwrap_or(3600),
            default_max_members: env::var("DEFAULT_MAX_MEMBERS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .ok()
                .filter(|n: &i64| *n >= 1)
                .unwrap_or(10),
            room_code_max_attempts: env::var("ROOM_CODE_MAX_ATTEMPTS")
                .unwrap_or_else(|_| "32".to_string())
                .parse()
                .ok()
                .filter(|n: &u32| *n >= 1)
                .unwrap_or(32),
            log_format: match env::var("LOG_FORMAT").as_deref() {
                Ok("json") => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
        })
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

fn require(key: &'static str) -> Result<String, ConfigError> {
    env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::MissingVar(key))
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid server port")]
    InvalidPort,
    #[error("{0} environment variable is required")]
    MissingVar(&'static str),
}
