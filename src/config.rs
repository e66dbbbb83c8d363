use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use crate::models::{FilterConfig, RoomPolicy};

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub geocoder: GeocoderSettings,
    #[serde(default)]
    pub analysis: AnalysisSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub acquire_timeout_secs: Option<u64>,
    pub idle_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CacheSettings {
    /// Shared L2 cache; geocoding results stay in-process only when unset
    pub redis_url: Option<String>,
    pub ttl_secs: Option<u64>,
    pub l1_cache_size: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeocoderSettings {
    #[serde(default = "default_geocoder_enabled")]
    pub enabled: bool,
    #[serde(default = "default_geocoder_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_country")]
    pub country: String,
    #[serde(default = "default_geocoder_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_min_interval_ms")]
    pub min_request_interval_ms: u64,
}

impl Default for GeocoderSettings {
    fn default() -> Self {
        Self {
            enabled: default_geocoder_enabled(),
            endpoint: default_geocoder_endpoint(),
            user_agent: default_user_agent(),
            country: default_country(),
            timeout_secs: default_geocoder_timeout(),
            max_retries: default_max_retries(),
            min_request_interval_ms: default_min_interval_ms(),
        }
    }
}

fn default_geocoder_enabled() -> bool { true }
fn default_geocoder_endpoint() -> String { "https://nominatim.openstreetmap.org/search".to_string() }
fn default_user_agent() -> String { format!("fair-rent/{}", env!("CARGO_PKG_VERSION")) }
fn default_country() -> String { "Russia".to_string() }
fn default_geocoder_timeout() -> u64 { 10 }
fn default_max_retries() -> u32 { 3 }
fn default_min_interval_ms() -> u64 { 1000 }

/// Default similarity filter parameters, overridable per request
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisSettings {
    #[serde(default = "default_area_tolerance")]
    pub area_tolerance_percent: f64,
    #[serde(default = "default_price_tolerance")]
    pub price_tolerance_percent: f64,
    #[serde(default)]
    pub include_same_floor: bool,
    #[serde(default = "default_max_distance_km")]
    pub max_distance_km: f64,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    #[serde(default)]
    pub room_policy: RoomPolicy,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            area_tolerance_percent: default_area_tolerance(),
            price_tolerance_percent: default_price_tolerance(),
            include_same_floor: false,
            max_distance_km: default_max_distance_km(),
            max_results: default_max_results(),
            room_policy: RoomPolicy::default(),
        }
    }
}

impl From<&AnalysisSettings> for FilterConfig {
    fn from(settings: &AnalysisSettings) -> Self {
        FilterConfig {
            area_tolerance_percent: settings.area_tolerance_percent,
            price_tolerance_percent: settings.price_tolerance_percent,
            include_same_floor: settings.include_same_floor,
            max_distance_km: settings.max_distance_km,
            max_results: settings.max_results,
            room_policy: settings.room_policy,
        }
    }
}

fn default_area_tolerance() -> f64 { 20.0 }
fn default_price_tolerance() -> f64 { 30.0 }
fn default_max_distance_km() -> f64 { 10.0 }
fn default_max_results() -> usize { 50 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Environment variables (prefixed with FAIR_RENT_)
    pub fn load() -> Result<Self, ConfigError> {
        let mut settings = Config::builder()
            // Add default config file
            .add_source(File::with_name("config/default").required(false))
            // Add local config file (for development overrides)
            .add_source(File::with_name("config/local").required(false))
            // e.g., FAIR_RENT__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("FAIR_RENT")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings = apply_database_url(settings)?;

        settings.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("FAIR_RENT")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }

    /// Filter defaults applied when a request carries no overrides
    pub fn filter_defaults(&self) -> FilterConfig {
        FilterConfig::from(&self.analysis)
    }
}

/// The conventional DATABASE_URL variable wins over the config file
fn apply_database_url(settings: Config) -> Result<Config, ConfigError> {
    match std::env::var("DATABASE_URL") {
        Ok(url) => Config::builder()
            .add_source(settings)
            .set_override("database.url", url)?
            .build(),
        Err(_) => Ok(settings),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_analysis_settings() {
        let settings = AnalysisSettings::default();
        let filters = FilterConfig::from(&settings);
        assert_eq!(filters, FilterConfig::default());
    }

    #[test]
    fn test_default_logging() {
        let level = default_log_level();
        let format = default_log_format();
        assert_eq!(level, "info");
        assert_eq!(format, "json");
    }

    #[test]
    fn test_default_geocoder() {
        let geocoder = GeocoderSettings::default();
        assert!(geocoder.enabled);
        assert_eq!(geocoder.max_retries, 3);
        assert_eq!(geocoder.min_request_interval_ms, 1000);
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("fair-rent-{}.toml", std::process::id()));
        std::fs::write(
            &path,
            r#"
[server]
host = "127.0.0.1"
port = 8080

[database]
url = "postgres://localhost/fair_rent"

[analysis]
max_distance_km = 5.0
room_policy = "adjacent"
"#,
        )
        .unwrap();

        let settings = Settings::load_from(&path).unwrap();
        std::fs::remove_file(&path).ok();

        let filters = settings.filter_defaults();
        assert_eq!(filters.max_distance_km, 5.0);
        assert_eq!(filters.room_policy, RoomPolicy::Adjacent);
        assert_eq!(filters.area_tolerance_percent, 20.0);
        assert!(settings.cache.redis_url.is_none());
    }
}
