use std::env;

/// AppConfig
///
/// Holds the application's entire configuration state. This struct is designed to be
/// immutable once loaded, ensuring consistency across all threads and services.
/// It is pulled into the application state via FromRef, embodying the "immutable AppConfig"
/// part of the Unified State Pattern.
#[derive(Clone)]
pub struct AppConfig {
    // Database connection string (SQLite, e.g. "sqlite://blog.db").
    pub db_url: String,
    // Secret key used to sign and validate the session cookie token.
    pub secret_key: String,
    // Runtime environment marker. Controls logging format and secret fallbacks.
    pub env: Env,
}

/// Env
///
/// Defines the runtime context, used to switch between development conveniences
/// (pretty logs, secret fallback) and hardened production behavior (JSON logs,
/// mandatory secrets).
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// default
    ///
    /// Provides a safe, non-panicking AppConfig instance primarily used for test setup.
    /// This allows us to instantiate the configuration without needing to set environment
    /// variables for lightweight unit or integration testing state scaffolding.
    fn default() -> Self {
        Self {
            db_url: "sqlite::memory:".to_string(),
            secret_key: "insecure-local-test-secret".to_string(),
            env: Env::Local,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// The canonical function for initializing the application configuration at startup.
    /// It reads all parameters from environment variables and implements the **fail-fast**
    /// principle.
    ///
    /// # Panics
    /// Panics if a critical environment variable required for the current runtime
    /// environment (especially Production) is not found. This prevents the application
    /// from starting with an incomplete or insecure configuration.
    pub fn load() -> Self {
        let env_str = env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
        let env = match env_str.as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        // Session Secret Resolution
        // The production secret is mandatory and must be explicitly set: a guessable
        // signing key would let anyone forge a session cookie for the admin.
        let secret_key = match env {
            Env::Production => {
                env::var("SECRET_KEY").expect("FATAL: SECRET_KEY must be set in production.")
            }
            // In local, we provide a fallback so the app can be booted without a .env file,
            // though the developer should ideally set a real value.
            _ => {
                env::var("SECRET_KEY").unwrap_or_else(|_| "insecure-local-test-secret".to_string())
            }
        };

        // The database URL is mandatory in every environment; there is no sensible
        // default path to write a production database to.
        let db_url =
            env::var("DATABASE_URL").expect("FATAL: DATABASE_URL required (e.g. sqlite://blog.db)");

        Self {
            db_url,
            secret_key,
            env,
        }
    }
}
