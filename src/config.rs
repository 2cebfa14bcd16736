use std::env;
use std::path::PathBuf;
use std::str::FromStr;

const DEFAULT_PAGE_SIZE: u32 = 200;
const DEFAULT_CACHE_MAX_AGE: u32 = 60;

#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres document store. The in-memory store is used when unset.
    pub database_url: Option<String>,
    /// JSON seed for the in-memory store: `{ "<collection>": [doc, ...] }`
    pub seed_file: Option<PathBuf>,

    pub host: String,
    pub port: u16,
    pub frontend_url: String,
    pub cors_extra_origins: Vec<String>,

    /// Documents per page when scanning a date range
    pub stats_page_size: u32,
    /// Seconds a private cache may reuse a stats response
    pub stats_cache_max_age: u32,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").ok().filter(|s| !s.is_empty()),
            seed_file: env::var("SEED_FILE")
                .ok()
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),

            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: parse_or("PORT", 8080),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".into()),
            cors_extra_origins: env::var("CORS_EXTRA_ORIGINS")
                .map(|extra| {
                    extra
                        .split(',')
                        .map(|o| o.trim().to_string())
                        .filter(|o| !o.is_empty())
                        .collect()
                })
                .unwrap_or_default(),

            stats_page_size: match parse_or("STATS_PAGE_SIZE", DEFAULT_PAGE_SIZE) {
                0 => {
                    tracing::warn!("STATS_PAGE_SIZE must be positive, using {}", DEFAULT_PAGE_SIZE);
                    DEFAULT_PAGE_SIZE
                }
                n => n,
            },
            stats_cache_max_age: parse_or("STATS_CACHE_MAX_AGE", DEFAULT_CACHE_MAX_AGE),
        }
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            seed_file: None,
            host: "127.0.0.1".into(),
            port: 8080,
            frontend_url: "http://localhost:3000".into(),
            cors_extra_origins: Vec::new(),
            stats_page_size: DEFAULT_PAGE_SIZE,
            stats_cache_max_age: DEFAULT_CACHE_MAX_AGE,
        }
    }
}

fn parse_or<T>(key: &str, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "Invalid number, using default {}", default);
            default
        }),
        Err(_) => default,
    }
}
