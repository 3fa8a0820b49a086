use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;
use time::macros::{format_description, time};
use time::Time;

/// `DATABASE_URL` value that selects the in-memory store.
pub const MEMORY_DATABASE_URL: &str = "memory";

/// Upper bound for the day-count booking settings.
pub const MAX_WINDOW_DAYS: i64 = 366;

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub mail: MailConfig,
    pub booking: BookingConfig,
    pub app: AppConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
}

impl DatabaseConfig {
    pub fn is_memory(&self) -> bool {
        self.url == MEMORY_DATABASE_URL
    }
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub from_address: String,
}

/// Slot catalog and booking windows.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingConfig {
    /// Daily bookable times, in any order; the slot catalog sorts them.
    pub slots: Vec<Time>,
    /// How many days ahead of today an admin may block.
    pub block_horizon_days: i64,
    /// How many days after a blocked date are scanned for alternatives.
    pub suggestion_days: i64,
    pub max_suggestions: usize,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            slots: vec![
                time!(10:00),
                time!(11:00),
                time!(12:00),
                time!(14:00),
                time!(15:00),
                time!(16:00),
                time!(17:00),
                time!(18:00),
            ],
            block_horizon_days: 15,
            suggestion_days: 7,
            max_suggestions: 5,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub name: String,
    pub environment: Environment,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
                port: 8000,
            },
            database: DatabaseConfig {
                url: MEMORY_DATABASE_URL.to_string(),
                max_connections: Some(10),
                min_connections: Some(1),
            },
            mail: MailConfig {
                from_address: "appointments@styliste.local".to_string(),
            },
            booking: BookingConfig::default(),
            app: AppConfig {
                name: "Styliste Backend".to_string(),
                environment: Environment::Development,
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let defaults = Config::default();

        // Server configuration
        let host = env::var("SERVER_HOST")
            .unwrap_or_else(|_| "0.0.0.0".to_string())
            .parse::<IpAddr>()
            .context("Failed to parse SERVER_HOST")?;

        let port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse::<u16>()
            .context("Failed to parse SERVER_PORT")?;

        // Database configuration
        let db_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let db_max_connections = match env::var("DATABASE_MAX_CONNECTIONS") {
            Ok(val) => Some(val.parse().context("Failed to parse DATABASE_MAX_CONNECTIONS")?),
            Err(_) => Some(10),
        };
        let db_min_connections = match env::var("DATABASE_MIN_CONNECTIONS") {
            Ok(val) => Some(val.parse().context("Failed to parse DATABASE_MIN_CONNECTIONS")?),
            Err(_) => Some(1),
        };

        let from_address = env::var("MAIL_FROM").unwrap_or(defaults.mail.from_address);

        // Booking rules
        let slots = match env::var("BOOKING_SLOTS") {
            Ok(val) => parse_slots(&val)?,
            Err(_) => defaults.booking.slots,
        };
        let block_horizon_days = match env::var("BOOKING_BLOCK_HORIZON_DAYS") {
            Ok(val) => parse_days("BOOKING_BLOCK_HORIZON_DAYS", &val)?,
            Err(_) => defaults.booking.block_horizon_days,
        };
        let suggestion_days = match env::var("BOOKING_SUGGESTION_DAYS") {
            Ok(val) => parse_days("BOOKING_SUGGESTION_DAYS", &val)?,
            Err(_) => defaults.booking.suggestion_days,
        };
        let max_suggestions = match env::var("BOOKING_MAX_SUGGESTIONS") {
            Ok(val) => val.parse().context("Failed to parse BOOKING_MAX_SUGGESTIONS")?,
            Err(_) => defaults.booking.max_suggestions,
        };

        // App configuration
        let environment = env::var("APP_ENVIRONMENT")
            .ok()
            .and_then(|val| val.parse().ok())
            .unwrap_or_default();
        let app_name = env::var("APP_NAME").unwrap_or(defaults.app.name);

        Ok(Config {
            server: ServerConfig { host, port },
            database: DatabaseConfig {
                url: db_url,
                max_connections: db_max_connections,
                min_connections: db_min_connections,
            },
            mail: MailConfig { from_address },
            booking: BookingConfig {
                slots,
                block_horizon_days,
                suggestion_days,
                max_suggestions,
            },
            app: AppConfig {
                name: app_name,
                environment,
            },
        })
    }

    pub fn server_addr(&self) -> SocketAddr {
        SocketAddr::new(self.server.host, self.server.port)
    }
}

/// Parses a comma separated list of `HH:MM` times.
pub fn parse_slots(raw: &str) -> Result<Vec<Time>> {
    let slots = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            Time::parse(s, format_description!("[hour]:[minute]"))
                .with_context(|| format!("Invalid slot time in BOOKING_SLOTS: {}", s))
        })
        .collect::<Result<Vec<_>>>()?;

    if slots.is_empty() {
        anyhow::bail!("BOOKING_SLOTS must list at least one time");
    }
    Ok(slots)
}

/// Parses a day count between 0 and `MAX_WINDOW_DAYS`.
pub fn parse_days(name: &str, raw: &str) -> Result<i64> {
    let days: i64 = raw
        .trim()
        .parse()
        .with_context(|| format!("Failed to parse {}", name))?;
    if !(0..=MAX_WINDOW_DAYS).contains(&days) {
        anyhow::bail!("{} must be between 0 and {}, got {}", name, MAX_WINDOW_DAYS, days);
    }
    Ok(days)
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "production" => Ok(Environment::Production),
            "staging" => Ok(Environment::Staging),
            "development" => Ok(Environment::Development),
            _ => Err(format!("Unknown environment: {}", s)),
        }
    }
}

// Use once_cell for a global config instance that's initialized once
use once_cell::sync::OnceCell;

static CONFIG: OnceCell<Config> = OnceCell::new();

pub fn init() -> Result<&'static Config> {
    CONFIG.get_or_try_init(Config::from_env)
}
