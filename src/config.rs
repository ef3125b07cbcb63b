use chrono::Duration;
use dotenv::dotenv;
use std::env;
use std::net::{IpAddr, SocketAddr};
use std::num::NonZeroU16;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

use crate::services::lifecycle::SchedulingPolicy;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} has an invalid value {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("{0} must be set in production")]
    MissingInProduction(&'static str),
}

/// Runtime settings, read once at start-up.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub data_dir: PathBuf,
    pub is_production: bool,
    pub gateway_secret: Option<String>,
    pub signature_max_skew_secs: i64,
    pub notification_webhook_url: Option<String>,
    pub notification_signing_key: Option<String>,
    pub utc_offset_minutes: i32,
    pub cancellation_cutoff: Duration,
    pub reschedule_cutoff: Duration,
    pub slot_duration_minutes: NonZeroU16,
    pub request_timeout_secs: u64,
    pub concurrency_limit: usize,
}

fn optional(name: &'static str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn parsed<T>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match optional(name) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
            value,
        }),
    }
}

fn non_negative(name: &'static str, value: i64) -> Result<i64, ConfigError> {
    if value < 0 {
        return Err(ConfigError::Invalid {
            name,
            value: value.to_string(),
            reason: "must not be negative".to_string(),
        });
    }
    Ok(value)
}

// Minutes before the start after which customers may no longer act
fn cutoff(name: &'static str, default_minutes: i64) -> Result<Duration, ConfigError> {
    let minutes = non_negative(name, parsed(name, default_minutes)?)?;
    Duration::try_minutes(minutes).ok_or_else(|| ConfigError::Invalid {
        name,
        value: minutes.to_string(),
        reason: "is out of range".to_string(),
    })
}

impl Config {
    /// Reads the process environment, loading `.env` first when present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();

        let is_production = optional("ENVIRONMENT")
            .map(|val| val.to_lowercase() == "production")
            .unwrap_or(false);

        let gateway_secret = optional("GATEWAY_SECRET");
        if is_production && gateway_secret.is_none() {
            return Err(ConfigError::MissingInProduction("GATEWAY_SECRET"));
        }

        let utc_offset_minutes = parsed("SHOP_UTC_OFFSET_MINUTES", 0i32)?;
        if utc_offset_minutes.abs() >= 24 * 60 {
            return Err(ConfigError::Invalid {
                name: "SHOP_UTC_OFFSET_MINUTES",
                value: utc_offset_minutes.to_string(),
                reason: "must be less than a day".to_string(),
            });
        }

        Ok(Self {
            host: parsed("HOST", IpAddr::from([0, 0, 0, 0]))?,
            port: parsed("PORT", 3000u16)?,
            data_dir: optional("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("/app/data")),
            is_production,
            gateway_secret,
            signature_max_skew_secs: non_negative(
                "SIGNATURE_MAX_SKEW_SECS",
                parsed("SIGNATURE_MAX_SKEW_SECS", 300i64)?,
            )?,
            notification_webhook_url: optional("NOTIFICATION_WEBHOOK_URL"),
            notification_signing_key: optional("NOTIFICATION_SIGNING_KEY"),
            utc_offset_minutes,
            cancellation_cutoff: cutoff("CANCELLATION_CUTOFF_MINUTES", 120)?,
            reschedule_cutoff: cutoff("RESCHEDULE_CUTOFF_MINUTES", 240)?,
            slot_duration_minutes: parsed(
                "SLOT_DURATION_MINUTES",
                NonZeroU16::new(30).unwrap_or(NonZeroU16::MIN),
            )?,
            request_timeout_secs: parsed("REQUEST_TIMEOUT_SECS", 10u64)?,
            concurrency_limit: parsed("CONCURRENCY_LIMIT", 64usize)?,
        })
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn scheduling_policy(&self) -> SchedulingPolicy {
        SchedulingPolicy {
            cancellation_cutoff: self.cancellation_cutoff,
            reschedule_cutoff: self.reschedule_cutoff,
            slot_duration: self.slot_duration_minutes,
        }
    }
}
