use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use dotenvy::dotenv;

use crate::attendance::WorkflowSettings;
use crate::geo::distance::{DEFAULT_RADIUS_METERS, DEFAULT_STORE_LAT, DEFAULT_STORE_LON};
use crate::geo::{GeoCoordinate, Geofence};

pub const DEFAULT_PORTAL_URL: &str = "https://portal.flaneurglobal.com/api/index.php";

#[derive(Clone)]
pub struct Config {
    pub jwt_secret: String,
    pub server_addr: String,
    pub access_token_ttl: usize,
    /// Sessions are dropped after this much inactivity.
    pub session_idle: Duration,

    pub portal_url: String,

    // Geofence
    pub store_lat: f64,
    pub store_lon: f64,
    pub geofence_radius_m: f64,

    pub location_timeout: Duration,
    pub submit_timeout: Duration,
    pub success_display: Duration,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_protected_per_min: u32,

    pub api_prefix: String,

    pub log_dir: String,
    pub log_level: tracing::Level,
}

fn required(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("{key} must be set"))
}

fn or_default<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw:?}")),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let config = Self {
            server_addr: required("SERVER_ADDR")?,
            jwt_secret: required("JWT_SECRET")?,
            access_token_ttl: or_default("ACCESS_TOKEN_TTL", 43_200)?, // 12h, one shift
            session_idle: Duration::from_secs(or_default("SESSION_IDLE_SECS", 300)?),

            portal_url: env::var("PORTAL_URL").unwrap_or_else(|_| DEFAULT_PORTAL_URL.to_string()),

            store_lat: or_default("STORE_LAT", DEFAULT_STORE_LAT)?,
            store_lon: or_default("STORE_LON", DEFAULT_STORE_LON)?,
            geofence_radius_m: or_default("GEOFENCE_RADIUS_M", DEFAULT_RADIUS_METERS)?,

            location_timeout: Duration::from_secs(or_default("LOCATION_TIMEOUT_SECS", 10)?),
            submit_timeout: Duration::from_secs(or_default("SUBMIT_TIMEOUT_SECS", 15)?),
            success_display: Duration::from_millis(or_default("SUCCESS_REDIRECT_DELAY_MS", 2000)?),

            rate_login_per_min: or_default("RATE_LOGIN_PER_MIN", 10)?,
            rate_protected_per_min: or_default("RATE_PROTECTED_PER_MIN", 600)?,

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),

            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),
            log_level: or_default("LOG_LEVEL", tracing::Level::DEBUG)?,
        };

        anyhow::ensure!(
            config.geofence_radius_m > 0.0,
            "GEOFENCE_RADIUS_M must be positive"
        );
        anyhow::ensure!(
            (-90.0..=90.0).contains(&config.store_lat)
                && (-180.0..=180.0).contains(&config.store_lon),
            "STORE_LAT/STORE_LON out of range"
        );

        Ok(config)
    }

    pub fn geofence(&self) -> Geofence {
        Geofence::new(
            GeoCoordinate::new(self.store_lat, self.store_lon),
            self.geofence_radius_m,
        )
    }

    pub fn workflow_settings(&self) -> WorkflowSettings {
        WorkflowSettings {
            geofence: self.geofence(),
            location_timeout: self.location_timeout,
            submit_timeout: self.submit_timeout,
            success_display: self.success_display,
            ..WorkflowSettings::default()
        }
    }
}

#[cfg(test)]
impl Config {
    pub fn for_tests() -> Self {
        Self {
            jwt_secret: "test-secret".to_string(),
            server_addr: "127.0.0.1:0".to_string(),
            access_token_ttl: 3600,
            session_idle: Duration::from_secs(300),
            portal_url: "http://127.0.0.1:9/api/index.php".to_string(),
            store_lat: DEFAULT_STORE_LAT,
            store_lon: DEFAULT_STORE_LON,
            geofence_radius_m: DEFAULT_RADIUS_METERS,
            location_timeout: Duration::from_secs(1),
            submit_timeout: Duration::from_secs(1),
            success_display: Duration::from_millis(2000),
            rate_login_per_min: 1000,
            rate_protected_per_min: 1000,
            api_prefix: "/api".to_string(),
            log_dir: "logs".to_string(),
            log_level: tracing::Level::DEBUG,
        }
    }
}
