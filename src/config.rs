use std::env;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} is not a valid {expected}: {value}")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Runtime settings, read once at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub media_dir: PathBuf,
    pub session_secret: String,
    pub session_ttl_hours: i64,
    pub admin_email: String,
    pub admin_password: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            database_url: "sqlite://data.sqlite".to_string(),
            media_dir: PathBuf::from("media"),
            session_secret: "change_this_secret".to_string(),
            session_ttl_hours: 8,
            admin_email: "admin@example.com".to_string(),
            admin_password: "Admin123!".to_string(),
        }
    }
}

impl Config {
    /// Unset variables fall back to [`Config::default`].
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = match env::var("PORT") {
            Ok(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                expected: "port number",
                value: raw,
            })?,
            Err(_) => defaults.port,
        };

        Ok(Self {
            port,
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            media_dir: env::var("MEDIA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.media_dir),
            session_secret: env::var("SESSION_SECRET").unwrap_or(defaults.session_secret),
            session_ttl_hours: defaults.session_ttl_hours,
            admin_email: env::var("ADMIN_EMAIL")
                .unwrap_or(defaults.admin_email)
                .to_lowercase(),
            admin_password: env::var("ADMIN_PASSWORD").unwrap_or(defaults.admin_password),
        })
    }
}
