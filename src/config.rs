//! Configuration management

use anyhow::{Context, Result};

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Directions API base URL (optional — heuristic-only when unset)
    pub directions_api_url: Option<String>,

    /// Directions API key
    pub directions_api_key: Option<String>,

    /// Directions request timeout in seconds
    pub directions_timeout_seconds: u64,

    /// Assumed average speed in km/h for the local heuristic
    pub average_speed_kmh: f64,

    /// Fixed per-stop service time in minutes for arrival projection
    pub stop_service_minutes: f64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let directions_api_url = std::env::var("DIRECTIONS_API_URL").ok();
        let directions_api_key = std::env::var("DIRECTIONS_API_KEY").ok();

        let directions_timeout_seconds = match std::env::var("DIRECTIONS_TIMEOUT_SECONDS") {
            Ok(v) => v
                .parse()
                .context("DIRECTIONS_TIMEOUT_SECONDS must be an integer number of seconds")?,
            Err(_) => 10,
        };

        let average_speed_kmh = match std::env::var("AVERAGE_SPEED_KMH") {
            Ok(v) => {
                let speed: f64 = v.parse().context("AVERAGE_SPEED_KMH must be a number")?;
                if speed <= 0.0 {
                    anyhow::bail!("AVERAGE_SPEED_KMH must be positive (got {})", speed);
                }
                speed
            }
            Err(_) => 30.0,
        };

        let stop_service_minutes = match std::env::var("STOP_SERVICE_MINUTES") {
            Ok(v) => {
                let minutes: f64 = v.parse().context("STOP_SERVICE_MINUTES must be a number")?;
                if minutes < 0.0 {
                    anyhow::bail!("STOP_SERVICE_MINUTES must not be negative (got {})", minutes);
                }
                minutes
            }
            Err(_) => 15.0,
        };

        Ok(Self {
            directions_api_url,
            directions_api_key,
            directions_timeout_seconds,
            average_speed_kmh,
            stop_service_minutes,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            directions_api_url: None,
            directions_api_key: None,
            directions_timeout_seconds: 10,
            average_speed_kmh: 30.0,
            stop_service_minutes: 15.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.directions_api_url.is_none());
        assert!(config.directions_api_key.is_none());
        assert_eq!(config.directions_timeout_seconds, 10);
        assert!((config.average_speed_kmh - 30.0).abs() < f64::EPSILON);
        assert!((config.stop_service_minutes - 15.0).abs() < f64::EPSILON);
    }

    #[test]
    #[ignore] // requires --test-threads=1 due to env var race
    fn test_config_directions_key_some_when_set() {
        std::env::set_var("DIRECTIONS_API_KEY", "test-key");

        let config = Config::from_env().unwrap();
        assert_eq!(config.directions_api_key, Some("test-key".to_string()));

        // Cleanup
        std::env::remove_var("DIRECTIONS_API_KEY");
    }

    #[test]
    #[ignore] // requires --test-threads=1 due to env var race
    fn test_config_rejects_non_numeric_speed() {
        std::env::set_var("AVERAGE_SPEED_KMH", "fast");

        let result = Config::from_env();
        assert!(result.is_err());

        // Cleanup
        std::env::remove_var("AVERAGE_SPEED_KMH");
    }
}
