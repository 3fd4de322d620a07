use serde::Deserialize;
use std::env;

use crate::services::voting_engine::EngineSettings;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub host: String,
    pub allowed_origins: Vec<String>,
    pub vote_window_secs: i64,
    pub vote_score: i64,
    pub articles_per_page: usize,
    pub group_cache_ttl_secs: i64,
    pub sweep_interval_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        let defaults = EngineSettings::default();

        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .unwrap_or(3000),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            allowed_origins: env::var("ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "http://localhost:3000,http://localhost:5173".to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            vote_window_secs: parse_or("VOTE_WINDOW_SECS", defaults.vote_window_secs),
            vote_score: parse_or("VOTE_SCORE", defaults.vote_score),
            articles_per_page: parse_or("ARTICLES_PER_PAGE", defaults.articles_per_page),
            group_cache_ttl_secs: parse_or("GROUP_CACHE_TTL_SECS", defaults.group_cache_ttl_secs),
            sweep_interval_secs: parse_or("SWEEP_INTERVAL_SECS", 60),
        })
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            vote_window_secs: self.vote_window_secs,
            vote_score: self.vote_score,
            articles_per_page: self.articles_per_page,
            group_cache_ttl_secs: self.group_cache_ttl_secs,
        }
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_settings_mirror_config() {
        let config = Config {
            port: 3000,
            host: "127.0.0.1".to_string(),
            allowed_origins: vec![],
            vote_window_secs: 10,
            vote_score: 5,
            articles_per_page: 3,
            group_cache_ttl_secs: 1,
            sweep_interval_secs: 60,
        };

        let settings = config.engine_settings();
        assert_eq!(settings.vote_window_secs, 10);
        assert_eq!(settings.vote_score, 5);
        assert_eq!(settings.articles_per_page, 3);
        assert_eq!(settings.group_cache_ttl_secs, 1);
    }
}
