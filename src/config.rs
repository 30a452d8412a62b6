// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Settings are read from the environment once at startup and are immutable
//! afterwards.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `JWT_SECRET` | HMAC secret for bearer tokens and session cookies | Required |
//! | `JWT_ISSUER` | Issuer claim embedded in and required of tokens | Unset |
//! | `JWT_AUDIENCE` | Audience claim embedded in and required of tokens | Unset |
//! | `JWT_EXPIRY_DAYS` | Bearer token lifetime in days, at most 3650 | `7` |
//! | `SESSION_IDLE_MINUTES` | Sliding session idle timeout, at most 1440 | `20` |
//! | `SESSION_MAX_HOURS` | Absolute session lifetime, at most 720 | `8` |
//! | `SESSION_COOKIE_NAME` | Session cookie name | `rx_session` |
//! | `SESSION_COOKIE_SECURE` | Mark the cookie `Secure` | `false` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |
//! | `SEED_ADMIN_EMAIL` | Bootstrap admin account email | Unset |
//! | `SEED_ADMIN_PASSWORD` | Bootstrap admin account password | Unset |

use std::str::FromStr;

use chrono::Duration;
use thiserror::Error;

pub const JWT_SECRET_ENV: &str = "JWT_SECRET";
pub const JWT_ISSUER_ENV: &str = "JWT_ISSUER";
pub const JWT_AUDIENCE_ENV: &str = "JWT_AUDIENCE";
pub const JWT_EXPIRY_DAYS_ENV: &str = "JWT_EXPIRY_DAYS";
pub const SESSION_IDLE_MINUTES_ENV: &str = "SESSION_IDLE_MINUTES";
pub const SESSION_MAX_HOURS_ENV: &str = "SESSION_MAX_HOURS";
pub const SESSION_COOKIE_NAME_ENV: &str = "SESSION_COOKIE_NAME";
pub const SESSION_COOKIE_SECURE_ENV: &str = "SESSION_COOKIE_SECURE";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";
pub const SEED_ADMIN_EMAIL_ENV: &str = "SEED_ADMIN_EMAIL";
pub const SEED_ADMIN_PASSWORD_ENV: &str = "SEED_ADMIN_PASSWORD";

/// Bearer tokens live for a week unless configured otherwise.
pub const DEFAULT_TOKEN_EXPIRY_DAYS: i64 = 7;
pub const DEFAULT_SESSION_IDLE_MINUTES: i64 = 20;
pub const DEFAULT_SESSION_MAX_HOURS: i64 = 8;
pub const DEFAULT_SESSION_COOKIE_NAME: &str = "rx_session";

/// Upper bounds for the duration variables.
pub const MAX_TOKEN_EXPIRY_DAYS: i64 = 3650;
pub const MAX_SESSION_IDLE_MINUTES: i64 = 24 * 60;
pub const MAX_SESSION_MAX_HOURS: i64 = 30 * 24;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{JWT_SECRET_ENV} must be set to a non-empty value")]
    MissingSecret,

    #[error("invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}

/// Bearer token settings.
#[derive(Clone)]
pub struct TokenSettings {
    pub secret: String,
    pub issuer: Option<String>,
    pub audience: Option<String>,
    pub lifetime: Duration,
}

impl TokenSettings {
    /// Settings with only a secret and the default lifetime.
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            issuer: None,
            audience: None,
            lifetime: Duration::days(DEFAULT_TOKEN_EXPIRY_DAYS),
        }
    }
}

impl std::fmt::Debug for TokenSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSettings")
            .field("secret", &"<redacted>")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("lifetime", &self.lifetime)
            .finish()
    }
}

/// Cookie session settings.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
    pub cookie_name: String,
    pub secure_cookie: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::minutes(DEFAULT_SESSION_IDLE_MINUTES),
            max_lifetime: Duration::hours(DEFAULT_SESSION_MAX_HOURS),
            cookie_name: DEFAULT_SESSION_COOKIE_NAME.to_string(),
            secure_cookie: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub log_format: LogFormat,
}

/// Optional bootstrap admin account.
#[derive(Clone)]
pub struct SeedAdmin {
    pub email: String,
    pub password: String,
}

/// Everything read from the environment at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub token: TokenSettings,
    pub session: SessionSettings,
    pub server: ServerSettings,
    pub seed_admin: Option<SeedAdmin>,
}

impl std::fmt::Debug for SeedAdmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeedAdmin")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let secret = non_empty(JWT_SECRET_ENV).ok_or(ConfigError::MissingSecret)?;
        let token = TokenSettings {
            secret,
            issuer: non_empty(JWT_ISSUER_ENV),
            audience: non_empty(JWT_AUDIENCE_ENV),
            lifetime: duration_or(
                &lookup,
                JWT_EXPIRY_DAYS_ENV,
                DEFAULT_TOKEN_EXPIRY_DAYS,
                MAX_TOKEN_EXPIRY_DAYS,
                Duration::try_days,
            )?,
        };

        let session = SessionSettings {
            idle_timeout: duration_or(
                &lookup,
                SESSION_IDLE_MINUTES_ENV,
                DEFAULT_SESSION_IDLE_MINUTES,
                MAX_SESSION_IDLE_MINUTES,
                Duration::try_minutes,
            )?,
            max_lifetime: duration_or(
                &lookup,
                SESSION_MAX_HOURS_ENV,
                DEFAULT_SESSION_MAX_HOURS,
                MAX_SESSION_MAX_HOURS,
                Duration::try_hours,
            )?,
            cookie_name: non_empty(SESSION_COOKIE_NAME_ENV)
                .unwrap_or_else(|| DEFAULT_SESSION_COOKIE_NAME.to_string()),
            secure_cookie: parse_or(&lookup, SESSION_COOKIE_SECURE_ENV, false)?,
        };

        let log_format = match non_empty(LOG_FORMAT_ENV).as_deref() {
            None | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => return Err(invalid(LOG_FORMAT_ENV, other)),
        };
        let server = ServerSettings {
            host: non_empty(HOST_ENV).unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&lookup, PORT_ENV, 8080)?,
            log_format,
        };

        let seed_admin = match (non_empty(SEED_ADMIN_EMAIL_ENV), lookup(SEED_ADMIN_PASSWORD_ENV)) {
            (Some(email), Some(password)) if !password.is_empty() => {
                Some(SeedAdmin { email, password })
            }
            _ => None,
        };

        Ok(Self {
            token,
            session,
            server,
            seed_admin,
        })
    }
}

fn invalid(var: &'static str, value: impl ToString) -> ConfigError {
    ConfigError::Invalid {
        var,
        value: value.to_string(),
    }
}

fn parse_or<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(var) {
        None => Ok(default),
        Some(raw) if raw.trim().is_empty() => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| invalid(var, raw)),
    }
}

/// Read a whole number of units in `1..=max` and turn it into a duration.
fn duration_or<F>(
    lookup: &F,
    var: &'static str,
    default: i64,
    max: i64,
    unit: fn(i64) -> Option<Duration>,
) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let count: i64 = parse_or(lookup, var, default)?;
    if !(1..=max).contains(&count) {
        return Err(invalid(var, count));
    }
    unit(count).ok_or_else(|| invalid(var, count))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn settings(vars: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn missing_secret_is_an_error() {
        assert_eq!(settings(&[]).unwrap_err(), ConfigError::MissingSecret);
        assert_eq!(
            settings(&[(JWT_SECRET_ENV, "   ")]).unwrap_err(),
            ConfigError::MissingSecret
        );
    }

    #[test]
    fn defaults_apply() {
        let s = settings(&[(JWT_SECRET_ENV, "s3cret")]).unwrap();
        assert_eq!(s.token.lifetime, Duration::days(7));
        assert!(s.token.issuer.is_none());
        assert_eq!(s.session.idle_timeout, Duration::minutes(20));
        assert_eq!(s.session.max_lifetime, Duration::hours(8));
        assert_eq!(s.session.cookie_name, "rx_session");
        assert!(!s.session.secure_cookie);
        assert_eq!(s.server.port, 8080);
        assert_eq!(s.server.log_format, LogFormat::Pretty);
        assert!(s.seed_admin.is_none());
    }

    #[test]
    fn overrides_are_read() {
        let s = settings(&[
            (JWT_SECRET_ENV, "s3cret"),
            (JWT_ISSUER_ENV, "rx-portal"),
            (JWT_AUDIENCE_ENV, "rx-clients"),
            (JWT_EXPIRY_DAYS_ENV, "2"),
            (SESSION_COOKIE_SECURE_ENV, "true"),
            (LOG_FORMAT_ENV, "json"),
            (SEED_ADMIN_EMAIL_ENV, "root@rx.test"),
            (SEED_ADMIN_PASSWORD_ENV, "changeme"),
        ])
        .unwrap();
        assert_eq!(s.token.issuer.as_deref(), Some("rx-portal"));
        assert_eq!(s.token.audience.as_deref(), Some("rx-clients"));
        assert_eq!(s.token.lifetime, Duration::days(2));
        assert!(s.session.secure_cookie);
        assert_eq!(s.server.log_format, LogFormat::Json);
        assert_eq!(s.seed_admin.map(|a| a.email).as_deref(), Some("root@rx.test"));
    }

    #[test]
    fn bad_numbers_are_rejected() {
        let err = settings(&[(JWT_SECRET_ENV, "s"), (JWT_EXPIRY_DAYS_ENV, "seven")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: JWT_EXPIRY_DAYS_ENV, .. }));

        let err = settings(&[(JWT_SECRET_ENV, "s"), (JWT_EXPIRY_DAYS_ENV, "0")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: JWT_EXPIRY_DAYS_ENV, .. }));

        let err = settings(&[(JWT_SECRET_ENV, "s"), (LOG_FORMAT_ENV, "xml")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: LOG_FORMAT_ENV, .. }));
    }

    #[test]
    fn oversized_durations_are_rejected() {
        for (var, value) in [
            (JWT_EXPIRY_DAYS_ENV, "200000000000"),
            (JWT_EXPIRY_DAYS_ENV, "1000000000"),
            (SESSION_IDLE_MINUTES_ENV, "9223372036854775807"),
            (SESSION_MAX_HOURS_ENV, "721"),
        ] {
            let err = settings(&[(JWT_SECRET_ENV, "s"), (var, value)]).unwrap_err();
            assert_eq!(
                err,
                ConfigError::Invalid {
                    var,
                    value: value.to_string()
                }
            );
        }

        let s = settings(&[(JWT_SECRET_ENV, "s"), (JWT_EXPIRY_DAYS_ENV, "3650")]).unwrap();
        assert_eq!(s.token.lifetime, Duration::days(MAX_TOKEN_EXPIRY_DAYS));
    }

    #[test]
    fn debug_redacts_secret() {
        let s = settings(&[(JWT_SECRET_ENV, "hunter2")]).unwrap();
        assert!(!format!("{s:?}").contains("hunter2"));
    }
}
