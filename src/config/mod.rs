use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreBackend {
    Memory,
    Postgres,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub port: u16,
    pub request_timeout_ms: u64,
    pub enable_request_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: StoreBackend,
    pub url: Option<String>,
    pub name: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
    pub ensure_schema: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Profile defaults chosen by `APP_ENV`, then per-key overrides
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let environment = match lookup("APP_ENV").as_deref() {
            Some("production") | Some("prod") => Environment::Production,
            Some("staging") | Some("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_overrides(lookup)
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        // Server overrides
        if let Some(v) = lookup("BIND_ADDR") {
            self.server.bind_addr = v;
        }
        if let Some(v) = lookup("BIRDS_API_PORT").or_else(|| lookup("PORT")) {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }
        if let Some(v) = lookup("API_REQUEST_TIMEOUT_MS") {
            self.server.request_timeout_ms = v.parse().unwrap_or(self.server.request_timeout_ms);
        }
        if let Some(v) = lookup("API_ENABLE_REQUEST_LOGGING") {
            self.server.enable_request_logging =
                v.parse().unwrap_or(self.server.enable_request_logging);
        }

        // Database overrides
        match lookup("STORE_BACKEND").as_deref() {
            Some("memory") => self.database.backend = StoreBackend::Memory,
            Some("postgres") | Some("postgresql") => self.database.backend = StoreBackend::Postgres,
            _ => {}
        }
        if let Some(v) = lookup("DATABASE_URL") {
            self.database.url = Some(v);
        }
        if let Some(v) = lookup("DATABASE_NAME") {
            self.database.name = Some(v);
        }
        if let Some(v) = lookup("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Some(v) = lookup("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout =
                v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Some(v) = lookup("DATABASE_ENSURE_SCHEMA") {
            self.database.ensure_schema = v.parse().unwrap_or(self.database.ensure_schema);
        }

        // Security overrides
        if let Some(v) = lookup("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Some(v) = lookup("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                bind_addr: "0.0.0.0".to_string(),
                port: 3000,
                request_timeout_ms: 30_000,
                enable_request_logging: true,
            },
            database: DatabaseConfig {
                backend: StoreBackend::Memory,
                url: None,
                name: None,
                max_connections: 10,
                connection_timeout: 30,
                ensure_schema: true,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: Vec::new(), // permissive
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                bind_addr: "0.0.0.0".to_string(),
                port: 3000,
                request_timeout_ms: 10_000,
                enable_request_logging: true,
            },
            database: DatabaseConfig {
                backend: StoreBackend::Postgres,
                url: None,
                name: None,
                max_connections: 20,
                connection_timeout: 10,
                ensure_schema: true,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                bind_addr: "0.0.0.0".to_string(),
                port: 3000,
                request_timeout_ms: 5_000,
                enable_request_logging: false,
            },
            database: DatabaseConfig {
                backend: StoreBackend::Postgres,
                url: None,
                name: None,
                max_connections: 50,
                connection_timeout: 5,
                ensure_schema: false,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

pub fn config() -> &'static AppConfig {
    &CONFIG
}
