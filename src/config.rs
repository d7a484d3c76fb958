use config::{Config, ConfigError, Environment, File};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::services::orders::OrderSettings;
use crate::services::pricing::ShippingPolicy;

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_PORT: u16 = 3000;
const CONFIG_DIR: &str = "config";
const DEFAULT_ORDER_NUMBER_PREFIX: &str = "SJ";
const DEFAULT_CURRENCY: &str = "UAH";
const DEFAULT_FREE_SHIPPING_THRESHOLD: i64 = 2000;
const DEFAULT_FLAT_SHIPPING_FEE: i64 = 80;
const DEV_DEFAULT_JWT_SECRET: &str = "development_only_access_secret_rotate_before_deploying_9f3k";

/// Application configuration structure with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Database connection URL
    #[validate(length(min = 1))]
    pub database_url: String,

    /// Server host address
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Application environment
    #[validate(length(min = 1))]
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    #[validate(custom = "validate_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Whether to run database migrations on startup
    #[serde(default)]
    pub auto_migrate: bool,

    /// DB pool: max connections
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,

    /// DB pool: min connections
    #[serde(default = "default_db_min_connections")]
    pub db_min_connections: u32,

    /// DB timeouts (seconds)
    #[serde(default = "default_db_connect_timeout_secs")]
    pub db_connect_timeout_secs: u64,
    #[serde(default = "default_db_idle_timeout_secs")]
    pub db_idle_timeout_secs: u64,
    #[serde(default = "default_db_acquire_timeout_secs")]
    pub db_acquire_timeout_secs: u64,

    /// Per-request timeout applied by the HTTP stack
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// CORS: comma-separated list of allowed origins (the storefront URL in production)
    #[serde(default)]
    pub cors_allowed_origins: Option<String>,

    /// Secret used to sign access tokens
    #[validate(custom = "validate_jwt_secret")]
    pub jwt_secret: String,

    /// Secret used to sign refresh tokens
    #[validate(custom = "validate_jwt_secret")]
    pub jwt_refresh_secret: String,

    /// JWT issuer name
    #[serde(default = "default_jwt_issuer")]
    pub jwt_issuer: String,

    /// Access token lifetime in seconds
    #[serde(default = "default_access_token_ttl_secs")]
    #[validate(range(min = 60, max = 86400))]
    pub access_token_ttl_secs: u64,

    /// Refresh token lifetime in seconds
    #[serde(default = "default_refresh_token_ttl_secs")]
    #[validate(range(min = 3600, max = 2592000))]
    pub refresh_token_ttl_secs: u64,

    /// Prefix of human-readable order numbers (`SJ-2024-05-01-0001`)
    #[serde(default = "default_order_number_prefix")]
    #[validate(custom = "validate_order_number_prefix")]
    pub order_number_prefix: String,

    /// Currency recorded on every order
    #[serde(default = "default_currency")]
    #[validate(length(equal = 3))]
    pub currency: String,

    /// Orders with a subtotal at or above this amount ship for free
    #[serde(default = "default_free_shipping_threshold")]
    #[validate(custom = "validate_non_negative_amount")]
    pub free_shipping_threshold: Decimal,

    /// Shipping fee charged below the free shipping threshold
    #[serde(default = "default_flat_shipping_fee")]
    #[validate(custom = "validate_non_negative_amount")]
    pub flat_shipping_fee: Decimal,

    /// Decrement variant stock when an order is placed
    #[serde(default)]
    pub reserve_stock_on_order: bool,
}

impl AppConfig {
    /// Creates a configuration with defaults for everything but the essentials
    pub fn new(
        database_url: String,
        jwt_secret: String,
        jwt_refresh_secret: String,
        host: String,
        port: u16,
        environment: String,
    ) -> Self {
        Self {
            database_url,
            host,
            port,
            environment,
            log_level: default_log_level(),
            log_json: false,
            auto_migrate: false,
            db_max_connections: default_db_max_connections(),
            db_min_connections: default_db_min_connections(),
            db_connect_timeout_secs: default_db_connect_timeout_secs(),
            db_idle_timeout_secs: default_db_idle_timeout_secs(),
            db_acquire_timeout_secs: default_db_acquire_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            cors_allowed_origins: None,
            jwt_secret,
            jwt_refresh_secret,
            jwt_issuer: default_jwt_issuer(),
            access_token_ttl_secs: default_access_token_ttl_secs(),
            refresh_token_ttl_secs: default_refresh_token_ttl_secs(),
            order_number_prefix: default_order_number_prefix(),
            currency: default_currency(),
            free_shipping_threshold: default_free_shipping_threshold(),
            flat_shipping_fee: default_flat_shipping_fee(),
            reserve_stock_on_order: false,
        }
    }

    /// Gets database URL reference
    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    /// Checks if running in production environment
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    /// Checks if running in development environment
    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }

    /// Configured CORS origins, trimmed and without blanks
    pub fn cors_origins(&self) -> Vec<String> {
        self.cors_allowed_origins
            .as_deref()
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn shipping_policy(&self) -> ShippingPolicy {
        ShippingPolicy::new(self.free_shipping_threshold, self.flat_shipping_fee)
    }

    pub fn order_settings(&self) -> OrderSettings {
        OrderSettings {
            number_prefix: self.order_number_prefix.clone(),
            currency: self.currency.clone(),
            shipping: self.shipping_policy(),
            reserve_stock: self.reserve_stock_on_order,
        }
    }

    fn validate_additional_constraints(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if !self.is_development() && self.cors_origins().is_empty() {
            let mut err = ValidationError::new("cors_allowed_origins_required");
            err.message = Some(
                "Set APP__CORS_ALLOWED_ORIGINS to the storefront origin outside development"
                    .into(),
            );
            errors.add("cors_allowed_origins", err);
        }

        if !self.is_development() && self.jwt_secret.trim() == DEV_DEFAULT_JWT_SECRET {
            let mut err = ValidationError::new("jwt_secret_default_dev");
            err.message = Some(
                "The bundled development JWT secret must not be used outside development".into(),
            );
            errors.add("jwt_secret", err);
        }

        if self.jwt_secret == self.jwt_refresh_secret {
            let mut err = ValidationError::new("jwt_refresh_secret_reused");
            err.message = Some("Access and refresh tokens must use different secrets".into());
            errors.add("jwt_refresh_secret", err);
        }

        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Configuration loading failed: {0}")]
    Load(#[from] ConfigError),

    #[error("Configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Default value functions
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_db_max_connections() -> u32 {
    10
}
fn default_db_min_connections() -> u32 {
    1
}
fn default_db_connect_timeout_secs() -> u64 {
    8
}
fn default_db_idle_timeout_secs() -> u64 {
    300
}
fn default_db_acquire_timeout_secs() -> u64 {
    8
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_jwt_issuer() -> String {
    "silver-jewelry-api".to_string()
}

fn default_access_token_ttl_secs() -> u64 {
    15 * 60
}

fn default_refresh_token_ttl_secs() -> u64 {
    7 * 24 * 60 * 60
}

fn default_order_number_prefix() -> String {
    DEFAULT_ORDER_NUMBER_PREFIX.to_string()
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

fn default_free_shipping_threshold() -> Decimal {
    Decimal::from(DEFAULT_FREE_SHIPPING_THRESHOLD)
}

fn default_flat_shipping_fee() -> Decimal {
    Decimal::from(DEFAULT_FLAT_SHIPPING_FEE)
}

/// Validates log level values
fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if valid_levels.contains(&level.to_lowercase().as_str()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("log_level");
        err.message = Some("Must be one of: trace, debug, info, warn, error".into());
        Err(err)
    }
}

fn validate_jwt_secret(secret: &str) -> Result<(), ValidationError> {
    let trimmed = secret.trim();

    if trimmed.len() < 32 {
        let mut err = ValidationError::new("jwt_secret");
        err.message = Some("JWT secrets must be at least 32 characters".into());
        return Err(err);
    }

    const DISALLOWED: [&str; 3] = ["change-this-secret", "your-secret-key", "default-secret-key"];
    if DISALLOWED
        .iter()
        .any(|&bad| trimmed.eq_ignore_ascii_case(bad))
    {
        let mut err = ValidationError::new("jwt_secret");
        err.message = Some("JWT secret must be overridden with a secure random value".into());
        return Err(err);
    }

    let unique_chars: std::collections::HashSet<char> = trimmed.chars().collect();
    if unique_chars.len() < 10 {
        let mut err = ValidationError::new("jwt_secret");
        err.message = Some("JWT secret must have at least 10 unique characters".into());
        return Err(err);
    }

    Ok(())
}

fn validate_order_number_prefix(prefix: &str) -> Result<(), ValidationError> {
    let valid = !prefix.is_empty()
        && prefix.len() <= 8
        && prefix.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit());
    if valid {
        Ok(())
    } else {
        let mut err = ValidationError::new("order_number_prefix");
        err.message = Some("Order number prefix must be 1-8 uppercase letters or digits".into());
        Err(err)
    }
}

fn validate_non_negative_amount(amount: &Decimal) -> Result<(), ValidationError> {
    if amount.is_sign_negative() {
        let mut err = ValidationError::new("amount");
        err.message = Some("Amount must not be negative".into());
        return Err(err);
    }
    Ok(())
}

/// Initializes tracing using the provided log level as the default filter
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_directive = format!("silver_jewelry_api={},tower_http=debug", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    let filter = EnvFilter::new(filter_directive);
    if json {
        let _ = fmt().with_env_filter(filter).json().try_init();
    } else {
        let _ = fmt().with_env_filter(filter).try_init();
    }
}

/// Loads application configuration
///
/// Layers configuration sources in this order:
/// 1. Built-in defaults
/// 2. Default config (config/default.toml)
/// 3. Environment-specific config (config/{env}.toml)
/// 4. Environment variables (APP__*)
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    let run_env = env::var("APP_ENV").unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    if !Path::new(CONFIG_DIR).exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            CONFIG_DIR
        );
    }

    let mut builder = Config::builder()
        .set_default("database_url", "sqlite://silver_jewelry.db?mode=rwc")?
        .set_default("host", "0.0.0.0")?
        .set_default("port", i64::from(DEFAULT_PORT))?
        .set_default("environment", run_env.as_str())?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?;

    // Development gets usable secrets out of the box; everything else must configure them.
    if run_env.eq_ignore_ascii_case(DEFAULT_ENV) {
        builder = builder
            .set_default("jwt_secret", DEV_DEFAULT_JWT_SECRET)?
            .set_default(
                "jwt_refresh_secret",
                "development_only_refresh_secret_rotate_before_deploying_2hq7",
            )?;
    }

    let config = builder
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    for key in ["jwt_secret", "jwt_refresh_secret"] {
        if config.get_string(key).is_err() {
            error!(
                "{} is not configured. Set APP__{} to a secure random string (minimum 32 characters).",
                key,
                key.to_uppercase()
            );
            return Err(AppConfigError::Load(ConfigError::NotFound(format!(
                "{} is required but not configured",
                key
            ))));
        }
    }

    let app_config: AppConfig = config.try_deserialize()?;

    app_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    app_config.validate_additional_constraints().map_err(|e| {
        error!("Configuration security validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    info!("Configuration loaded successfully");
    Ok(app_config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn base_config() -> AppConfig {
        AppConfig::new(
            "sqlite://silver_jewelry.db?mode=memory".into(),
            "access_secret_for_tests_0123456789abcdefghij".into(),
            "refresh_secret_for_tests_0123456789abcdefghij".into(),
            "127.0.0.1".into(),
            3000,
            "production".into(),
        )
    }

    #[test]
    fn defaults_match_storefront_policy() {
        let cfg = base_config();
        assert_eq!(cfg.order_number_prefix, "SJ");
        assert_eq!(cfg.currency, "UAH");
        assert_eq!(cfg.free_shipping_threshold, dec!(2000));
        assert_eq!(cfg.flat_shipping_fee, dec!(80));
        assert_eq!(cfg.access_token_ttl_secs, 900);
        assert_eq!(cfg.refresh_token_ttl_secs, 604_800);
        assert!(!cfg.reserve_stock_on_order);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn non_dev_requires_cors_origins() {
        let cfg = base_config();
        assert!(cfg.validate_additional_constraints().is_err());
    }

    #[test]
    fn non_dev_with_origins_passes() {
        let mut cfg = base_config();
        cfg.cors_allowed_origins = Some("https://shop.example.com, ".into());
        assert!(cfg.validate_additional_constraints().is_ok());
        assert_eq!(cfg.cors_origins(), vec!["https://shop.example.com".to_string()]);
    }

    #[test]
    fn development_allows_missing_origins() {
        let mut cfg = base_config();
        cfg.environment = "development".into();
        assert!(cfg.validate_additional_constraints().is_ok());
    }

    #[test]
    fn shared_access_and_refresh_secret_is_rejected() {
        let mut cfg = base_config();
        cfg.environment = "development".into();
        cfg.jwt_refresh_secret = cfg.jwt_secret.clone();
        let errors = cfg.validate_additional_constraints().unwrap_err();
        assert!(errors.field_errors().contains_key("jwt_refresh_secret"));
    }

    #[test]
    fn negative_shipping_fee_fails_validation() {
        let mut cfg = base_config();
        cfg.flat_shipping_fee = dec!(-1);
        let errors = cfg.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("flat_shipping_fee"));
    }

    #[test]
    fn order_number_prefix_must_be_uppercase() {
        assert!(validate_order_number_prefix("SJ").is_ok());
        assert!(validate_order_number_prefix("sj").is_err());
        assert!(validate_order_number_prefix("").is_err());
        assert!(validate_order_number_prefix("SJ-1").is_err());
    }

    #[test]
    fn short_jwt_secret_is_rejected() {
        assert!(validate_jwt_secret("short").is_err());
        assert!(validate_jwt_secret(&"a".repeat(40)).is_err());
    }
}
