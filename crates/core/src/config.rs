use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const CONFIG_FILE_NAMES: [&str; 2] = ["brandex.toml", "config/brandex.toml"];

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub catalog: CatalogConfig,
    pub offer: OfferConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct CatalogConfig {
    pub source: CatalogSourceKind,
    pub file_path: PathBuf,
    pub cache_ttl_secs: u64,
    pub feed: FeedConfig,
}

#[derive(Clone, Debug)]
pub struct FeedConfig {
    pub url: Option<String>,
    pub username: Option<String>,
    pub password: Option<SecretString>,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct OfferConfig {
    pub validity_days: u32,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogSourceKind {
    File,
    Feed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub catalog_source: Option<CatalogSourceKind>,
    pub catalog_file_path: Option<PathBuf>,
    pub feed_url: Option<String>,
    pub feed_username: Option<String>,
    pub feed_password: Option<String>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read `{path}`: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("`{path}` is not valid TOML: {source}")]
    Parse { path: PathBuf, source: toml::de::Error },
    #[error("config file `{0}` does not exist")]
    FileNotFound(PathBuf),
    #[error("`${{{var}}}` refers to an unset environment variable")]
    UnsetVariable { var: String },
    #[error("`${{` placeholder is never closed")]
    UnclosedPlaceholder,
    #[error("environment variable {key} has unusable value `{value}`")]
    BadEnvValue { key: String, value: String },
    #[error("invalid configuration: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            catalog: CatalogConfig {
                source: CatalogSourceKind::File,
                file_path: PathBuf::from("produkty.xlsx"),
                cache_ttl_secs: 600,
                feed: FeedConfig { url: None, username: None, password: None, timeout_secs: 20 },
            },
            offer: OfferConfig { validity_days: 14 },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for CatalogSourceKind {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(Self::File),
            "feed" => Ok(Self::Feed),
            other => Err(ConfigError::Validation(format!(
                "unsupported catalog source `{other}` (expected file|feed)"
            ))),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAMES[0]));
            return Err(ConfigError::FileNotFound(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        let ConfigPatch { catalog, offer, logging } = patch;

        if let Some(catalog) = catalog {
            let target = &mut self.catalog;
            target.source = catalog.source.unwrap_or(target.source);
            target.file_path = catalog.file_path.unwrap_or_else(|| target.file_path.clone());
            target.cache_ttl_secs = catalog.cache_ttl_secs.unwrap_or(target.cache_ttl_secs);

            if let Some(feed) = catalog.feed {
                let target = &mut target.feed;
                target.url = feed.url.or(target.url.take());
                target.username = feed.username.or(target.username.take());
                target.password = feed.password.map(SecretString::from).or(target.password.take());
                target.timeout_secs = feed.timeout_secs.unwrap_or(target.timeout_secs);
            }
        }

        if let Some(days) = offer.and_then(|offer| offer.validity_days) {
            self.offer.validity_days = days;
        }

        if let Some(logging) = logging {
            self.logging.level = logging.level.unwrap_or_else(|| self.logging.level.clone());
            self.logging.format = logging.format.unwrap_or(self.logging.format);
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        let catalog = &mut self.catalog;
        if let Some(source) = env_value::<CatalogSourceKind>("BRANDEX_CATALOG_SOURCE")? {
            catalog.source = source;
        }
        if let Some(path) = read_env("BRANDEX_CATALOG_FILE_PATH") {
            catalog.file_path = PathBuf::from(path);
        }
        if let Some(ttl) = env_value::<u64>("BRANDEX_CATALOG_CACHE_TTL_SECS")? {
            catalog.cache_ttl_secs = ttl;
        }

        let feed = &mut catalog.feed;
        feed.url = read_env("BRANDEX_FEED_URL").or(feed.url.take());
        feed.username = read_env("BRANDEX_FEED_USERNAME").or(feed.username.take());
        if let Some(password) = read_env("BRANDEX_FEED_PASSWORD") {
            feed.password = Some(SecretString::from(password));
        }
        if let Some(timeout) = env_value::<u64>("BRANDEX_FEED_TIMEOUT_SECS")? {
            feed.timeout_secs = timeout;
        }

        if let Some(days) = env_value::<u32>("BRANDEX_OFFER_VALIDITY_DAYS")? {
            self.offer.validity_days = days;
        }

        // The short BRANDEX_LOG_* names are accepted as aliases.
        if let Some(level) = read_env("BRANDEX_LOGGING_LEVEL").or_else(|| read_env("BRANDEX_LOG_LEVEL")) {
            self.logging.level = level;
        }
        if let Some(format) =
            read_env("BRANDEX_LOGGING_FORMAT").or_else(|| read_env("BRANDEX_LOG_FORMAT"))
        {
            self.logging.format = format.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(source) = overrides.catalog_source {
            self.catalog.source = source;
        }
        if let Some(file_path) = overrides.catalog_file_path {
            self.catalog.file_path = file_path;
        }
        let feed = &mut self.catalog.feed;
        feed.url = overrides.feed_url.or(feed.url.take());
        feed.username = overrides.feed_username.or(feed.username.take());
        if let Some(password) = overrides.feed_password {
            feed.password = Some(SecretString::from(password));
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_catalog(&self.catalog)?;
        validate_offer(&self.offer)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    match explicit_path {
        Some(path) => path.is_file().then(|| path.to_path_buf()),
        None => CONFIG_FILE_NAMES.iter().map(PathBuf::from).find(|path| path.is_file()),
    }
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let contents = fs::read_to_string(path)
        .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
    let expanded = expand_placeholders(&contents)?;
    toml::from_str(&expanded).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
}

/// Replaces every `${NAME}` with the value of the environment variable `NAME`.
fn expand_placeholders(input: &str) -> Result<String, ConfigError> {
    let mut expanded = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(open) = rest.find("${") {
        expanded.push_str(&rest[..open]);
        let tail = &rest[open + 2..];
        let close = tail.find('}').ok_or(ConfigError::UnclosedPlaceholder)?;
        let var = &tail[..close];
        let value =
            env::var(var).map_err(|_| ConfigError::UnsetVariable { var: var.to_owned() })?;
        expanded.push_str(&value);
        rest = &tail[close + 1..];
    }

    expanded.push_str(rest);
    Ok(expanded)
}

fn validate_catalog(catalog: &CatalogConfig) -> Result<(), ConfigError> {
    if catalog.cache_ttl_secs == 0 {
        return Err(ConfigError::Validation(
            "catalog.cache_ttl_secs must be greater than zero".to_string(),
        ));
    }

    let feed = &catalog.feed;
    if feed.timeout_secs == 0 || feed.timeout_secs > 120 {
        return Err(ConfigError::Validation(
            "catalog.feed.timeout_secs must be in range 1..=120".to_string(),
        ));
    }

    match catalog.source {
        CatalogSourceKind::File => {
            if catalog.file_path.as_os_str().is_empty() {
                return Err(ConfigError::Validation(
                    "catalog.file_path is required when catalog.source = \"file\"".to_string(),
                ));
            }
        }
        CatalogSourceKind::Feed => {
            let url = feed.url.as_deref().map(str::trim).unwrap_or_default();
            if url.is_empty() {
                return Err(ConfigError::Validation(
                    "catalog.feed.url is required when catalog.source = \"feed\"".to_string(),
                ));
            }
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigError::Validation(
                    "catalog.feed.url must start with http:// or https://".to_string(),
                ));
            }
        }
    }

    let has_password =
        feed.password.as_ref().map(|value| !value.expose_secret().is_empty()).unwrap_or(false);
    if has_password && feed.username.is_none() {
        return Err(ConfigError::Validation(
            "catalog.feed.password is set but catalog.feed.username is missing".to_string(),
        ));
    }

    Ok(())
}

fn validate_offer(offer: &OfferConfig) -> Result<(), ConfigError> {
    if offer.validity_days == 0 || offer.validity_days > 365 {
        return Err(ConfigError::Validation(
            "offer.validity_days must be in range 1..=365".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
    if LEVELS.iter().any(|level| logging.level.trim().eq_ignore_ascii_case(level)) {
        Ok(())
    } else {
        Err(ConfigError::Validation(format!(
            "logging.level `{}` is not one of {}",
            logging.level,
            LEVELS.join("|")
        )))
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().map(|value| value.trim().to_owned()).filter(|value| !value.is_empty())
}

fn env_value<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
{
    read_env(key)
        .map(|value| {
            value.parse::<T>().map_err(|_| ConfigError::BadEnvValue { key: key.to_owned(), value })
        })
        .transpose()
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    catalog: Option<CatalogPatch>,
    offer: Option<OfferPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct CatalogPatch {
    source: Option<CatalogSourceKind>,
    file_path: Option<PathBuf>,
    cache_ttl_secs: Option<u64>,
    feed: Option<FeedPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct FeedPatch {
    url: Option<String>,
    username: Option<String>,
    password: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct OfferPatch {
    validity_days: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
