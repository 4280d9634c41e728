use crate::engine::TiePolicy;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_path: String,
    pub feed_api_url: String,
    /// Fixed offset defining what "local midnight" means for cycle windows.
    pub utc_offset_minutes: i32,
    pub tie_policy: TiePolicy,
    /// How far before a requested range ingestion fetches, in milliseconds.
    pub lookback_ms: i64,
    /// Default product set for the deals digest.
    pub watched_products: Vec<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = env_map
            .get("PORT")
            .map(|s| s.as_str())
            .unwrap_or("8080")
            .parse::<u16>()
            .map_err(|_| {
                ConfigError::InvalidValue("PORT".to_string(), "must be a valid u16".to_string())
            })?;

        let database_path = env_map
            .get("DATABASE_PATH")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("DATABASE_PATH".to_string()))?;

        let feed_api_url = env_map
            .get("FEED_API_URL")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("FEED_API_URL".to_string()))?;

        let utc_offset_minutes = env_map
            .get("UTC_OFFSET_MINUTES")
            .map(|s| s.as_str())
            .unwrap_or("0")
            .parse::<i32>()
            .ok()
            .filter(|m| (-840..=840).contains(m))
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "UTC_OFFSET_MINUTES".to_string(),
                    "must be an integer within +/-840".to_string(),
                )
            })?;

        let tie_policy = match env_map
            .get("TIE_POLICY")
            .map(|s| s.as_str())
            .unwrap_or("all")
        {
            "all" => TiePolicy::All,
            "earliest" => TiePolicy::Earliest,
            other => {
                return Err(ConfigError::InvalidValue(
                    "TIE_POLICY".to_string(),
                    format!("must be all or earliest, got {}", other),
                ))
            }
        };

        let lookback_ms = env_map
            .get("LOOKBACK_MS")
            .map(|s| s.as_str())
            .unwrap_or("1209600000")
            .parse::<i64>()
            .map_err(|_| {
                ConfigError::InvalidValue(
                    "LOOKBACK_MS".to_string(),
                    "must be a valid i64".to_string(),
                )
            })?;

        let watched_products = parse_watched_products_from_map(&env_map)?;

        Ok(Config {
            port,
            database_path,
            feed_api_url,
            utc_offset_minutes,
            tie_policy,
            lookback_ms,
            watched_products,
        })
    }

    /// The configured local-midnight offset as a chrono FixedOffset.
    pub fn utc_offset(&self) -> chrono::FixedOffset {
        use chrono::Offset;
        // Validated to +/-14h in from_env_map, so construction cannot fail.
        chrono::FixedOffset::east_opt(self.utc_offset_minutes * 60)
            .unwrap_or_else(|| chrono::Utc.fix())
    }
}

fn parse_watched_products_from_map(
    env_map: &HashMap<String, String>,
) -> Result<Vec<String>, ConfigError> {
    if let Some(products_str) = env_map.get("WATCHED_PRODUCTS") {
        Ok(products_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect())
    } else if let Some(file_path) = env_map.get("WATCHED_PRODUCTS_FILE") {
        let content = std::fs::read_to_string(file_path).map_err(|_| {
            ConfigError::InvalidValue(
                "WATCHED_PRODUCTS_FILE".to_string(),
                "file not found or unreadable".to_string(),
            )
        })?;
        Ok(content
            .lines()
            .map(|line| line.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect())
    } else {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_required_env() -> HashMap<String, String> {
        let mut map = HashMap::new();
        map.insert("DATABASE_PATH".to_string(), "/tmp/test.db".to_string());
        map.insert(
            "FEED_API_URL".to_string(),
            "https://feed.example.com".to_string(),
        );
        map
    }

    #[test]
    fn test_defaults_applied() {
        let config = Config::from_env_map(setup_required_env()).expect("config failed");
        assert_eq!(config.port, 8080);
        assert_eq!(config.utc_offset_minutes, 0);
        assert_eq!(config.tie_policy, TiePolicy::All);
        assert_eq!(config.lookback_ms, 1_209_600_000);
        assert!(config.watched_products.is_empty());
    }

    #[test]
    fn test_missing_database_path() {
        let mut env_map = setup_required_env();
        env_map.remove("DATABASE_PATH");
        let result = Config::from_env_map(env_map);
        match result {
            Err(ConfigError::MissingEnv(s)) => assert_eq!(s, "DATABASE_PATH"),
            _ => panic!("Expected MissingEnv error"),
        }
    }

    #[test]
    fn test_missing_feed_api_url() {
        let mut env_map = setup_required_env();
        env_map.remove("FEED_API_URL");
        let result = Config::from_env_map(env_map);
        match result {
            Err(ConfigError::MissingEnv(s)) => assert_eq!(s, "FEED_API_URL"),
            _ => panic!("Expected MissingEnv error"),
        }
    }

    #[test]
    fn test_invalid_port() {
        let mut env_map = setup_required_env();
        env_map.insert("PORT".to_string(), "not_a_number".to_string());
        let result = Config::from_env_map(env_map);
        match result {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "PORT"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_invalid_tie_policy() {
        let mut env_map = setup_required_env();
        env_map.insert("TIE_POLICY".to_string(), "closest".to_string());
        let result = Config::from_env_map(env_map);
        match result {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "TIE_POLICY"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_offset_out_of_range_rejected() {
        let mut env_map = setup_required_env();
        env_map.insert("UTC_OFFSET_MINUTES".to_string(), "900".to_string());
        let result = Config::from_env_map(env_map);
        match result {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "UTC_OFFSET_MINUTES"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_offset_converts_to_fixed_offset() {
        let mut env_map = setup_required_env();
        env_map.insert("UTC_OFFSET_MINUTES".to_string(), "-120".to_string());
        let config = Config::from_env_map(env_map).unwrap();
        assert_eq!(config.utc_offset().local_minus_utc(), -120 * 60);
    }

    #[test]
    fn test_watched_products_parsed() {
        let mut env_map = setup_required_env();
        env_map.insert(
            "WATCHED_PRODUCTS".to_string(),
            "milk, bread,, eggs".to_string(),
        );
        let config = Config::from_env_map(env_map).unwrap();
        assert_eq!(config.watched_products, vec!["milk", "bread", "eggs"]);
    }
}
