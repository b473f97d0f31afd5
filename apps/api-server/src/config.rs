//! Application configuration loaded from environment variables.

use std::env;
use std::fmt::Display;
use std::str::FromStr;

use adboard_infra::{DatabaseConfig, JwtConfig};

/// Default cap on simultaneously open advertisements per user.
pub const DEFAULT_MAX_OPEN_ADVERTISEMENTS: u64 = 10;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// `None` runs the server on the in-memory store.
    pub database: Option<DatabaseConfig>,
    pub max_open_advertisements: u64,
    pub jwt: JwtConfig,
    pub throttle: ThrottleConfig,
}

/// Request budgets per minute, one for anonymous clients (keyed by IP) and
/// one for authenticated users (keyed by user id).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottleConfig {
    pub anon_per_minute: u32,
    pub user_per_minute: u32,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key/value source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let database = lookup("DATABASE_URL").map(|url| {
            let defaults = DatabaseConfig::new(url);
            DatabaseConfig {
                max_connections: parsed(&lookup, "DB_MAX_CONNECTIONS", defaults.max_connections),
                min_connections: parsed(&lookup, "DB_MIN_CONNECTIONS", defaults.min_connections),
                ..defaults
            }
        });

        let jwt_defaults = JwtConfig::default();
        let jwt = JwtConfig {
            secret: lookup("JWT_SECRET").unwrap_or(jwt_defaults.secret),
            expiration_hours: parsed(
                &lookup,
                "JWT_EXPIRATION_HOURS",
                jwt_defaults.expiration_hours,
            ),
            issuer: lookup("JWT_ISSUER").unwrap_or(jwt_defaults.issuer),
        };

        Self {
            host: lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parsed(&lookup, "PORT", 8080),
            database,
            max_open_advertisements: parsed(
                &lookup,
                "MAX_OPEN_ADVERTISEMENTS",
                DEFAULT_MAX_OPEN_ADVERTISEMENTS,
            ),
            jwt,
            throttle: ThrottleConfig {
                anon_per_minute: parsed(&lookup, "THROTTLE_ANON_PER_MINUTE", 60),
                user_per_minute: parsed(&lookup, "THROTTLE_USER_PER_MINUTE", 600),
            },
        }
    }
}

/// Parse `key` or fall back to `default`, warning when a value is present but unusable.
fn parsed<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|e| {
            tracing::warn!(key, value = %raw, error = %e, fallback = %default, "Ignoring invalid setting");
            default
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]);

        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert!(config.database.is_none());
        assert_eq!(config.max_open_advertisements, 10);
        assert!(config.jwt.uses_default_secret());
        assert_eq!(
            config.throttle,
            ThrottleConfig {
                anon_per_minute: 60,
                user_per_minute: 600
            }
        );
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("PORT", "9000"),
            ("DATABASE_URL", "postgres://localhost/adboard"),
            ("DB_MAX_CONNECTIONS", "20"),
            ("MAX_OPEN_ADVERTISEMENTS", "3"),
            ("JWT_SECRET", "s3cret"),
            ("THROTTLE_USER_PER_MINUTE", "5"),
        ]);

        assert_eq!(config.port, 9000);
        let database = config.database.unwrap();
        assert_eq!(database.url, "postgres://localhost/adboard");
        assert_eq!(database.max_connections, 20);
        assert_eq!(database.min_connections, 10);
        assert_eq!(config.max_open_advertisements, 3);
        assert_eq!(config.jwt.secret, "s3cret");
        assert_eq!(config.throttle.user_per_minute, 5);
    }

    #[test]
    fn test_invalid_number_falls_back_to_default() {
        let config = config(&[("MAX_OPEN_ADVERTISEMENTS", "ten"), ("PORT", "-1")]);

        assert_eq!(config.max_open_advertisements, 10);
        assert_eq!(config.port, 8080);
    }
}
