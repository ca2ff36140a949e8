//! Configuration management

use anyhow::{Context, Result};

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection string
    pub database_url: String,

    /// OpenRouteService base URL (matrix and geocoding)
    pub ors_url: String,

    /// OpenRouteService API key; without one the worker falls back to
    /// Haversine matrix estimation and geocoding is unavailable
    pub ors_api_key: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let database_url = std::env::var("DATABASE_URL")
            .context("DATABASE_URL must be set")?;

        let ors_url = std::env::var("ORS_URL")
            .unwrap_or_else(|_| "https://api.openrouteservice.org".to_string());

        let ors_api_key = std::env::var("ORS_API_KEY").ok().filter(|k| !k.is_empty());

        Ok(Self {
            database_url,
            ors_url,
            ors_api_key,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[ignore] // requires --test-threads=1 due to env var race
    fn test_config_ors_url_defaults_to_public() {
        std::env::remove_var("ORS_URL");
        std::env::set_var("DATABASE_URL", "postgres://test");

        let config = Config::from_env().unwrap();
        assert_eq!(config.ors_url, "https://api.openrouteservice.org");
    }

    #[test]
    fn test_config_ors_url_uses_local_when_set() {
        std::env::set_var("ORS_URL", "http://localhost:8080/ors");
        std::env::set_var("DATABASE_URL", "postgres://test");

        let config = Config::from_env().unwrap();
        assert_eq!(config.ors_url, "http://localhost:8080/ors");

        // Cleanup
        std::env::remove_var("ORS_URL");
    }

    #[test]
    #[ignore] // requires --test-threads=1 due to env var race
    fn test_config_empty_api_key_treated_as_absent() {
        std::env::set_var("ORS_API_KEY", "");
        std::env::set_var("DATABASE_URL", "postgres://test");

        let config = Config::from_env().unwrap();
        assert!(config.ors_api_key.is_none());

        std::env::remove_var("ORS_API_KEY");
    }
}
