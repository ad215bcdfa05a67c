//! Configuration management for the CharityMap project map.
//!
//! This module provides a configuration system that supports:
//! - Loading from YAML files
//! - Environment variable overrides (`CHARITYMAP__SECTION__KEY`)
//! - Validation of all settings
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! working configuration pointed at a local backend.

use crate::error::{ConfigError, Result};
use crate::types::Coordinate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::Level;

/// Main application configuration.
///
/// # Examples
///
/// ```
/// use charitymap_core::config::AppConfig;
///
/// let config = AppConfig::from_yaml("search:\n  debounce_ms: 250\n").unwrap();
/// assert_eq!(config.search.debounce_ms, 250);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Backend REST API settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Map surface settings
    #[serde(default)]
    pub map: MapConfig,

    /// Free-text search settings
    #[serde(default)]
    pub search: SearchConfig,

    /// Near-Me radius settings
    #[serde(default)]
    pub near_me: NearMeConfig,

    /// Device location settings
    #[serde(default)]
    pub geolocation: GeolocationConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.display().to_string(),
            }
            .into());
        }

        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        Self::from_yaml(&contents)
    }

    /// Loads configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML cannot be parsed.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(yaml).map_err(|e| {
            ConfigError::InvalidFormat {
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// Loads configuration using the `config` crate, layering environment
    /// variables (`CHARITYMAP__API__BASE_URL=...`) over the file.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded or merged.
    pub fn from_config_builder<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let config = config::Config::builder()
            .add_source(config::File::from(path).required(false))
            .add_source(
                config::Environment::with_prefix("CHARITYMAP")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| ConfigError::LoadFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        config.try_deserialize().map_err(|e| {
            ConfigError::InvalidFormat {
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns the first invalid field found.
    pub fn validate(&self) -> Result<()> {
        self.api.validate()?;
        self.map.validate()?;
        self.near_me.validate()?;
        self.logging.parse_level()?;
        Ok(())
    }
}

/// Backend REST API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL the `/api/...` paths are appended to
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// `limit` sent with every project list request
    #[serde(default = "default_project_limit")]
    pub project_limit: u32,

    /// JSON file holding the stored token and user object
    #[serde(default)]
    pub credentials_path: Option<PathBuf>,
}

fn default_base_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_project_limit() -> u32 {
    5000
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            project_limit: default_project_limit(),
            credentials_path: None,
        }
    }
}

impl ApiConfig {
    /// Validates API configuration.
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::invalid_value("api.base_url", "must not be empty").into());
        }
        if self.project_limit == 0 {
            return Err(
                ConfigError::invalid_value("api.project_limit", "must be greater than 0").into(),
            );
        }
        Ok(())
    }

    /// Request timeout as a Duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Map surface configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapConfig {
    /// Initial and "reset" viewport center
    #[serde(default = "default_center")]
    pub default_center: Coordinate,

    #[serde(default = "default_zoom")]
    pub default_zoom: f64,

    #[serde(default)]
    pub min_zoom: f64,

    #[serde(default = "default_max_zoom")]
    pub max_zoom: f64,

    /// Viewport size in pixels, used for fitting and hit-testing
    #[serde(default = "default_viewport_width")]
    pub viewport_width: u32,

    #[serde(default = "default_viewport_height")]
    pub viewport_height: u32,

    /// Margin kept around search results when fitting the viewport
    #[serde(default = "default_fit_padding")]
    pub fit_padding_px: f64,

    /// Zoom used when a search returns exactly one located project
    #[serde(default = "default_single_result_zoom")]
    pub single_result_zoom: f64,

    /// Upper bound on the zoom chosen by a multi-result fit
    #[serde(default = "default_fit_max_zoom")]
    pub fit_max_zoom: f64,

    /// Duration of animated viewport transitions
    #[serde(default = "default_animation_ms")]
    pub animation_ms: u64,

    /// Zoom used for inbound "center on" instructions
    #[serde(default = "default_focus_zoom")]
    pub focus_zoom: f64,

    #[serde(default)]
    pub base_layers: BaseLayersConfig,
}

fn default_center() -> Coordinate {
    Coordinate::new(-1.2921, 36.7758)
}

fn default_zoom() -> f64 {
    10.0
}

fn default_max_zoom() -> f64 {
    24.0
}

fn default_viewport_width() -> u32 {
    1280
}

fn default_viewport_height() -> u32 {
    800
}

fn default_fit_padding() -> f64 {
    50.0
}

fn default_single_result_zoom() -> f64 {
    15.0
}

fn default_fit_max_zoom() -> f64 {
    16.0
}

fn default_animation_ms() -> u64 {
    1000
}

fn default_focus_zoom() -> f64 {
    15.0
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            default_center: default_center(),
            default_zoom: default_zoom(),
            min_zoom: 0.0,
            max_zoom: default_max_zoom(),
            viewport_width: default_viewport_width(),
            viewport_height: default_viewport_height(),
            fit_padding_px: default_fit_padding(),
            single_result_zoom: default_single_result_zoom(),
            fit_max_zoom: default_fit_max_zoom(),
            animation_ms: default_animation_ms(),
            focus_zoom: default_focus_zoom(),
            base_layers: BaseLayersConfig::default(),
        }
    }
}

impl MapConfig {
    /// Validates map configuration.
    pub fn validate(&self) -> Result<()> {
        if !self.default_center.is_valid() {
            return Err(ConfigError::invalid_value(
                "map.default_center",
                format!("not a valid coordinate: {}", self.default_center),
            )
            .into());
        }
        if self.min_zoom < 0.0 || self.min_zoom > self.max_zoom {
            return Err(ConfigError::invalid_value(
                "map.min_zoom",
                format!("must be within 0..={}", self.max_zoom),
            )
            .into());
        }
        if !(self.min_zoom..=self.max_zoom).contains(&self.default_zoom) {
            return Err(ConfigError::invalid_value(
                "map.default_zoom",
                format!("must be within {}..={}", self.min_zoom, self.max_zoom),
            )
            .into());
        }
        if self.viewport_width == 0 || self.viewport_height == 0 {
            return Err(
                ConfigError::invalid_value("map.viewport", "width and height must be non-zero")
                    .into(),
            );
        }
        if self.fit_padding_px < 0.0 {
            return Err(
                ConfigError::invalid_value("map.fit_padding_px", "must not be negative").into(),
            );
        }
        Ok(())
    }

    /// Animation duration as a Duration.
    pub fn animation(&self) -> Duration {
        Duration::from_millis(self.animation_ms)
    }
}

/// Raster tile sources for the three base layers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaseLayersConfig {
    #[serde(default = "default_street_source")]
    pub default: TileSourceConfig,

    #[serde(default = "default_satellite_source")]
    pub satellite: TileSourceConfig,

    #[serde(default = "default_terrain_source")]
    pub terrain: TileSourceConfig,
}

impl Default for BaseLayersConfig {
    fn default() -> Self {
        Self {
            default: default_street_source(),
            satellite: default_satellite_source(),
            terrain: default_terrain_source(),
        }
    }
}

/// A raster tile source consumed as an opaque URL template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileSourceConfig {
    /// URL template with `{z}`, `{x}`, `{y}` placeholders
    pub url: String,

    #[serde(default = "default_tile_max_zoom")]
    pub max_zoom: u8,

    #[serde(default)]
    pub attribution: String,

    /// Number of lower-resolution levels to preload
    #[serde(default = "default_preload")]
    pub preload: u8,

    /// Cross-origin mode for tile requests
    #[serde(default = "default_cross_origin")]
    pub cross_origin: String,
}

fn default_tile_max_zoom() -> u8 {
    19
}

fn default_preload() -> u8 {
    4
}

fn default_cross_origin() -> String {
    "anonymous".to_string()
}

fn default_street_source() -> TileSourceConfig {
    TileSourceConfig {
        url: "https://tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
        max_zoom: default_tile_max_zoom(),
        attribution: "© OpenStreetMap contributors".to_string(),
        preload: default_preload(),
        cross_origin: default_cross_origin(),
    }
}

fn default_satellite_source() -> TileSourceConfig {
    TileSourceConfig {
        url: "https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/{z}/{y}/{x}"
            .to_string(),
        max_zoom: 20,
        attribution: "Tiles © Esri".to_string(),
        preload: default_preload(),
        cross_origin: default_cross_origin(),
    }
}

fn default_terrain_source() -> TileSourceConfig {
    TileSourceConfig {
        url: "https://mt1.google.com/vt/lyrs=p&x={x}&y={y}&z={z}".to_string(),
        max_zoom: 24,
        attribution: "Map data © Google".to_string(),
        preload: default_preload(),
        cross_origin: default_cross_origin(),
    }
}

/// Free-text search configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Quiet period after the last keystroke before a search is sent
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_debounce_ms() -> u64 {
    300
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl SearchConfig {
    /// Debounce window as a Duration.
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// Near-Me radius bounds, in kilometers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NearMeConfig {
    #[serde(default = "default_radius_km")]
    pub default_radius_km: f64,

    #[serde(default = "default_min_radius_km")]
    pub min_radius_km: f64,

    #[serde(default = "default_max_radius_km")]
    pub max_radius_km: f64,
}

fn default_radius_km() -> f64 {
    10.0
}

fn default_min_radius_km() -> f64 {
    0.1
}

fn default_max_radius_km() -> f64 {
    1000.0
}

impl Default for NearMeConfig {
    fn default() -> Self {
        Self {
            default_radius_km: default_radius_km(),
            min_radius_km: default_min_radius_km(),
            max_radius_km: default_max_radius_km(),
        }
    }
}

impl NearMeConfig {
    /// Validates radius bounds: `0 < min <= default <= max`.
    pub fn validate(&self) -> Result<()> {
        let ordered = self.min_radius_km > 0.0
            && self.min_radius_km <= self.default_radius_km
            && self.default_radius_km <= self.max_radius_km;

        if !ordered {
            return Err(ConfigError::invalid_value(
                "near_me",
                format!(
                    "radius bounds must satisfy 0 < min ({}) <= default ({}) <= max ({})",
                    self.min_radius_km, self.default_radius_km, self.max_radius_km
                ),
            )
            .into());
        }
        Ok(())
    }
}

/// Device location request options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeolocationConfig {
    #[serde(default = "default_true")]
    pub enable_high_accuracy: bool,

    /// Hard timeout for a single position request
    #[serde(default = "default_geo_timeout_ms")]
    pub timeout_ms: u64,

    /// How old a cached fix may be and still be reused
    #[serde(default = "default_maximum_age_ms")]
    pub maximum_age_ms: u64,

    /// Position reported by the headless location provider
    #[serde(default)]
    pub fixed_position: Option<Coordinate>,
}

fn default_true() -> bool {
    true
}

fn default_geo_timeout_ms() -> u64 {
    10_000
}

fn default_maximum_age_ms() -> u64 {
    300_000
}

impl Default for GeolocationConfig {
    fn default() -> Self {
        Self {
            enable_high_accuracy: true,
            timeout_ms: default_geo_timeout_ms(),
            maximum_age_ms: default_maximum_age_ms(),
            fixed_position: None,
        }
    }
}

impl GeolocationConfig {
    /// Request timeout as a Duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Cache tolerance as a Duration.
    pub fn maximum_age(&self) -> Duration {
        Duration::from_millis(self.maximum_age_ms)
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: "text" or "json"
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> LogFormat {
    LogFormat::Text
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::Text,
        }
    }
}

impl LoggingConfig {
    /// Parses the log level string to a tracing Level.
    pub fn parse_level(&self) -> Result<Level> {
        self.level.parse().map_err(|_| {
            ConfigError::InvalidValue {
                field: "logging.level".to_string(),
                reason: format!("Invalid log level: {}", self.level),
            }
            .into()
        })
    }
}

/// Log format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable text format
    Text,
    /// JSON format for structured logging
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CharityMapError;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.api.project_limit, 5000);
        assert_eq!(config.map.default_zoom, 10.0);
        assert_eq!(config.map.default_center, Coordinate::new(-1.2921, 36.7758));
        assert_eq!(config.search.debounce(), Duration::from_millis(300));
        assert_eq!(config.near_me.default_radius_km, 10.0);
        assert_eq!(config.geolocation.timeout(), Duration::from_secs(10));
        assert_eq!(config.geolocation.maximum_age(), Duration::from_secs(300));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_base_layer_defaults() {
        let layers = BaseLayersConfig::default();
        assert_eq!(layers.satellite.max_zoom, 20);
        assert_eq!(layers.terrain.max_zoom, 24);
        assert_eq!(layers.default.preload, 4);
        assert_eq!(layers.terrain.cross_origin, "anonymous");
    }

    #[test]
    fn test_config_from_yaml() {
        let yaml = r#"
api:
  base_url: "https://projects.example.org"
  project_limit: 250
near_me:
  default_radius_km: 25
logging:
  level: debug
  format: json
"#;

        let config = AppConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.api.base_url, "https://projects.example.org");
        assert_eq!(config.api.project_limit, 250);
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.near_me.default_radius_km, 25.0);
        assert_eq!(config.near_me.max_radius_km, 1000.0);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_yaml_is_default() {
        let config = AppConfig::from_yaml("   \n").unwrap();
        assert_eq!(config.api.base_url, "http://localhost:5000");
    }

    #[test]
    fn test_invalid_yaml() {
        let result = AppConfig::from_yaml("api: [not, a, map");
        assert!(matches!(
            result,
            Err(CharityMapError::Config(ConfigError::InvalidFormat { .. }))
        ));
    }

    #[test]
    fn test_radius_validation() {
        let mut config = AppConfig::default();
        config.near_me.default_radius_km = 2000.0;
        assert!(config.validate().is_err());

        config.near_me.default_radius_km = 10.0;
        config.near_me.min_radius_km = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_map_validation() {
        let mut config = AppConfig::default();
        config.map.viewport_width = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.map.min_zoom = 30.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_api_validation() {
        let mut config = AppConfig::default();
        config.api.base_url = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "search:\n  debounce_ms: 150").unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.search.debounce_ms, 150);

        let via_builder = AppConfig::from_config_builder(file.path()).unwrap();
        assert_eq!(via_builder.search.debounce_ms, 150);
    }

    #[test]
    fn test_missing_file() {
        let result = AppConfig::from_file("/nonexistent/charitymap.yaml");
        assert!(matches!(
            result,
            Err(CharityMapError::Config(ConfigError::FileNotFound { .. }))
        ));
    }

    #[test]
    fn test_logging_parse_level() {
        let mut logging = LoggingConfig::default();
        assert_eq!(logging.parse_level().unwrap(), Level::INFO);

        logging.level = "warn".to_string();
        assert_eq!(logging.parse_level().unwrap(), Level::WARN);

        logging.level = "loud".to_string();
        assert!(logging.parse_level().is_err());
    }

    #[test]
    fn test_validate_rejects_unknown_log_level() {
        let config = AppConfig::from_yaml("logging:\n  level: loud\n").unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("logging.level"));

        let config = AppConfig::from_yaml("logging:\n  level: DEBUG\n").unwrap();
        assert!(config.validate().is_ok());
    }
}
