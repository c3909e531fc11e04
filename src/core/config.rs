use dotenv::dotenv;
use std::env;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub stream_api_key: String,
    pub stream_api_secret: String,
    pub server_host: String,
    pub server_port: u16,
    pub max_connections: u32,
    pub client_url: String,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub rate_limit_max_requests: u32,
    pub rate_limit_window_secs: u64,
    pub app_env: String,
}

impl Config {
    /// Carica la configurazione dalle variabili d'ambiente
    /// Chiama dotenv() automaticamente
    pub fn from_env() -> Result<Self, String> {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").unwrap_or_else(|_| {
            warn!("DATABASE_URL not set, using local sqlite file");
            "sqlite://streamify.db?mode=rwc".to_string()
        });

        let jwt_secret = required("JWT_SECRET_KEY")?;
        let stream_api_key = required("STREAM_API_KEY")?;
        let stream_api_secret = required("STREAM_API_SECRET")?;

        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

        let server_port = parse_or("PORT", 5001u16)?;
        let max_connections = parse_or("MAX_DB_CONNECTIONS", 5u32)?;

        let client_url =
            env::var("CLIENT_URL").unwrap_or_else(|_| "http://localhost:5173".to_string());

        let upload_dir = PathBuf::from(env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string()));
        let max_upload_bytes = parse_or("MAX_UPLOAD_BYTES", 10 * 1024 * 1024usize)?;

        let rate_limit_max_requests = parse_or("RATE_LIMIT_MAX_REQUESTS", 100u32)?;
        let rate_limit_window_secs = parse_or("RATE_LIMIT_WINDOW_SECS", 15 * 60u64)?;

        let app_env = env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        Ok(Config {
            database_url,
            jwt_secret,
            stream_api_key,
            stream_api_secret,
            server_host,
            server_port,
            max_connections,
            client_url,
            upload_dir,
            max_upload_bytes,
            rate_limit_max_requests,
            rate_limit_window_secs,
            app_env,
        })
    }

    pub fn is_production(&self) -> bool {
        self.app_env.eq_ignore_ascii_case("production")
    }

    /// Logga la configurazione (nascondendo i segreti)
    pub fn print_info(&self) {
        info!("Server Configuration:");
        info!("  Environment: {}", self.app_env);
        info!("  Server Address: {}:{}", self.server_host, self.server_port);
        info!("  Database: {}", Self::mask_url(&self.database_url));
        info!("  Max DB Connections: {}", self.max_connections);
        info!("  CORS origin: {}", self.client_url);
        info!("  Upload dir: {} (max {} bytes)", self.upload_dir.display(), self.max_upload_bytes);
        info!(
            "  Rate limit: {} requests / {}s",
            self.rate_limit_max_requests, self.rate_limit_window_secs
        );
        info!("  Stream API key: {}", Self::mask_secret(&self.stream_api_key));
    }

    /// Maschera l'URL del database per il logging
    fn mask_url(url: &str) -> String {
        if let Some(at_pos) = url.find('@') {
            if let Some(scheme_end) = url.find("://") {
                let scheme = &url[..scheme_end + 3];
                let after_at = &url[at_pos..];
                return format!("{}***{}", scheme, after_at);
            }
        }
        url.to_string()
    }

    fn mask_secret(secret: &str) -> String {
        let visible: String = secret.chars().take(4).collect();
        format!("{}***", visible)
    }
}

fn required(key: &str) -> Result<String, String> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(format!("{} must be set in .env file", key)),
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> Result<T, String> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| format!("Invalid {}: '{}' is not a valid number", key, raw)),
        Err(_) => Ok(default),
    }
}
