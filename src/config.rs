use anyhow::Context;
use axum::http::HeaderValue;

const DEFAULT_ORIGINS: &str = "http://localhost:5173";

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub max_connections: u32,
    pub cors_origins: Vec<HeaderValue>,
    pub jwt: JwtConfig,
}

impl AppConfig {
    /// Reads the process environment. A missing `JWT_SECRET` or `DATABASE_URL`
    /// is fatal: the server must not start without them.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let secret = var("JWT_SECRET").context("JWT_SECRET must be set")?;
        anyhow::ensure!(!secret.trim().is_empty(), "JWT_SECRET must not be empty");

        let database_url = var("DATABASE_URL").context("DATABASE_URL must be set")?;

        let port = match var("APP_PORT") {
            Some(v) => v
                .parse::<u16>()
                .with_context(|| format!("APP_PORT is not a valid port: {v}"))?,
            None => 8000,
        };

        let origins = var("CORS_ALLOWED_ORIGINS").unwrap_or_else(|| DEFAULT_ORIGINS.into());
        let cors_origins = parse_origins(&origins).context("CORS_ALLOWED_ORIGINS")?;

        Ok(Self {
            host: var("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            database_url,
            max_connections: var("DATABASE_MAX_CONNECTIONS")
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(10),
            cors_origins,
            jwt: JwtConfig { secret },
        })
    }

    /// Configuration for running against the in-memory store.
    pub fn local(secret: &str) -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0,
            database_url: String::new(),
            max_connections: 1,
            cors_origins: vec![HeaderValue::from_static(DEFAULT_ORIGINS)],
            jwt: JwtConfig {
                secret: secret.into(),
            },
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Splits a comma separated origin list into header values, skipping blanks.
/// Origins must be listed explicitly; `*` is refused.
pub fn parse_origins(raw: &str) -> anyhow::Result<Vec<HeaderValue>> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(|o| {
            anyhow::ensure!(o != "*", "wildcard origin is not allowed, list origins explicitly");
            HeaderValue::from_str(o).with_context(|| format!("invalid CORS origin: {o:?}"))
        })
        .collect()
}
