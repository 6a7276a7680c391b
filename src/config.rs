use std::env;

const LOCAL_JWT_SECRET: &str = "super-secure-test-secret-value-local";

/// AppConfig
///
/// Holds the application's configuration. Loaded once at startup, immutable afterwards,
/// and pulled into handlers and extractors through `FromRef`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Postgres connection string. `None` only in local mode, where it selects the in-memory store.
    pub db_url: Option<String>,
    // Upper bound for the Postgres pool.
    pub db_max_connections: u32,
    // TCP port the HTTP server binds on 0.0.0.0.
    pub port: u16,
    // Runtime environment marker. Controls log format and the `x-user-id` dev bypass.
    pub env: Env,
    // HMAC secret for validating bearer tokens.
    pub jwt_secret: String,
}

/// Env
///
/// Local enables developer conveniences (pretty logs, header bypass, optional
/// database); Production hardens all of them.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// Non-panicking values for test scaffolding.
    fn default() -> Self {
        Self {
            db_url: None,
            db_max_connections: 5,
            port: 3000,
            env: Env::Local,
            jwt_secret: LOCAL_JWT_SECRET.to_string(),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables.
    ///
    /// # Panics
    /// Panics in production when `DATABASE_URL` or `JWT_SECRET` is missing, and in any
    /// mode when `PORT` or `DB_MAX_CONNECTIONS` is set but not a number. The service must
    /// not start half-configured.
    pub fn load() -> Self {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        let port = env::var("PORT")
            .map(|p| p.parse().expect("FATAL: PORT must be a valid port number"))
            .unwrap_or(3000);

        let db_max_connections = env::var("DB_MAX_CONNECTIONS")
            .map(|n| n.parse().expect("FATAL: DB_MAX_CONNECTIONS must be a number"))
            .unwrap_or(5);

        match env {
            Env::Local => Self {
                env,
                db_url: env::var("DATABASE_URL").ok(),
                db_max_connections,
                port,
                jwt_secret: env::var("JWT_SECRET").unwrap_or_else(|_| LOCAL_JWT_SECRET.to_string()),
            },
            Env::Production => Self {
                env,
                db_url: Some(
                    env::var("DATABASE_URL").expect("FATAL: DATABASE_URL required in prod"),
                ),
                db_max_connections,
                port,
                jwt_secret: env::var("JWT_SECRET").expect("FATAL: JWT_SECRET must be set in production."),
            },
        }
    }
}
