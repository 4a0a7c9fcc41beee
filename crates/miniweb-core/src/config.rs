//! Application configuration.
//!
//! Configuration is read once into an [`AppConfig`] value and passed to the
//! components that need it; nothing in the framework reads environment
//! variables lazily at use sites.

/// Externally-supplied application configuration.
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    /// URL-style database connection string (`DATABASE_URL`).
    pub database_url: String,
    /// Session signing secret (`SESSION_SECRET`). Required by the session
    /// layer; its absence is a fatal configuration error there.
    pub session_secret: Option<String>,
    /// Session cookie domain override (`SESSION_DOMAIN`). Falls back to
    /// the request host when unset.
    pub session_domain: Option<String>,
    /// Production mode (`ENV=production`). Gates statement logging and
    /// error verbosity.
    pub production: bool,
    /// Application display name (`APP_NAME`), exposed to views.
    pub app_name: Option<String>,
}

impl AppConfig {
    /// Create an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read configuration from the process environment.
    pub fn from_env() -> Self {
        let non_empty = |key: &str| std::env::var(key).ok().filter(|v| !v.is_empty());
        Self {
            database_url: non_empty("DATABASE_URL").unwrap_or_default(),
            session_secret: non_empty("SESSION_SECRET"),
            session_domain: non_empty("SESSION_DOMAIN"),
            production: std::env::var("ENV").as_deref() == Ok("production"),
            app_name: non_empty("APP_NAME"),
        }
    }

    /// Set the database URL.
    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = url.into();
        self
    }

    /// Set the session signing secret.
    pub fn session_secret(mut self, secret: impl Into<String>) -> Self {
        self.session_secret = Some(secret.into());
        self
    }

    /// Set the session cookie domain override.
    pub fn session_domain(mut self, domain: impl Into<String>) -> Self {
        self.session_domain = Some(domain.into());
        self
    }

    /// Set the production flag.
    pub fn production(mut self, production: bool) -> Self {
        self.production = production;
        self
    }

    /// Set the application name.
    pub fn app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = Some(name.into());
        self
    }
}
