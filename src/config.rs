//! Backend address resolution. The base URL is looked up by environment name in a
//! domain-names mapping (a JSON object of `environment -> base url`), and an explicit
//! base URL override wins over the mapping. Blank override values are ignored so an
//! empty environment variable does not erase a working default.
//! Configuration values are public; do not store secrets here.

use serde::Deserialize;
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    time::Duration,
};
use thiserror::Error;
use url::Url;

pub const DEFAULT_ENVIRONMENT: &str = "local";
pub const DEFAULT_LOCAL_BASE_URL: &str = "http://localhost:8080";
/// Default request timeout applied to backend calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown environment '{environment}' (known: {known})")]
    UnknownEnvironment { environment: String, known: String },
    #[error("failed to read domain names from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid domain names mapping: {0}")]
    Invalid(#[from] serde_json::Error),
    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

/// Environment-keyed backend addresses.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct DomainNames(BTreeMap<String, String>);

impl Default for DomainNames {
    fn default() -> Self {
        Self(BTreeMap::from([(
            DEFAULT_ENVIRONMENT.to_string(),
            DEFAULT_LOCAL_BASE_URL.to_string(),
        )]))
    }
}

impl DomainNames {
    /// # Errors
    /// Returns an error if `json` is not an object of string values.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// # Errors
    /// Returns an error if the file cannot be read or does not hold a valid mapping.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    #[must_use]
    pub fn get(&self, environment: &str) -> Option<&str> {
        self.0.get(environment).map(String::as_str)
    }

    fn known(&self) -> String {
        self.0.keys().cloned().collect::<Vec<_>>().join(", ")
    }
}

/// Values supplied at runtime (CLI flags or their environment variables).
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub environment: Option<String>,
    pub domain_names: Option<PathBuf>,
    pub api_base_url: Option<String>,
    pub timeout: Option<Duration>,
}

/// Resolved console configuration.
#[derive(Clone, Debug)]
pub struct ConsoleConfig {
    pub environment: String,
    pub api_base_url: Url,
    pub request_timeout: Duration,
}

impl ConsoleConfig {
    /// Resolves the backend address from the mapping and applies overrides.
    ///
    /// # Errors
    /// Returns an error if the mapping cannot be loaded, the environment is unknown
    /// (and no base URL override was given), or the base URL is invalid.
    pub fn resolve(overrides: ConfigOverrides) -> Result<Self, ConfigError> {
        let environment = overrides
            .environment
            .as_deref()
            .and_then(normalize_runtime_value)
            .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string());

        let base_url = match overrides
            .api_base_url
            .as_deref()
            .and_then(normalize_runtime_value)
        {
            Some(url) => url,
            None => {
                let domain_names = match &overrides.domain_names {
                    Some(path) => DomainNames::load(path)?,
                    None => DomainNames::default(),
                };
                domain_names
                    .get(&environment)
                    .map(str::to_string)
                    .ok_or_else(|| ConfigError::UnknownEnvironment {
                        environment: environment.clone(),
                        known: domain_names.known(),
                    })?
            }
        };

        Ok(Self {
            environment,
            api_base_url: parse_base_url(&base_url)?,
            request_timeout: overrides.timeout.unwrap_or(DEFAULT_TIMEOUT),
        })
    }
}

/// Parses a backend base URL, accepting only http(s) URLs that can carry a path.
///
/// # Errors
/// Returns an error if the URL does not parse, uses another scheme, or cannot be a base.
pub fn parse_base_url(value: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidBaseUrl {
        url: value.to_string(),
        reason,
    };

    let url = Url::parse(value.trim()).map_err(|err| invalid(err.to_string()))?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(invalid(format!("unsupported scheme {scheme}"))),
    }

    if url.cannot_be_a_base() {
        return Err(invalid("cannot be a base".to_string()));
    }

    Ok(url)
}

fn normalize_runtime_value(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
