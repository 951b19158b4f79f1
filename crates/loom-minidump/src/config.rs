// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Reporter configuration.
//!
//! Sources, lowest precedence first:
//! 1. Built-in defaults
//! 2. An optional TOML file
//! 3. `LOOM_MINIDUMP_*` environment variables
//!
//! Callers (e.g. the CLI) apply their own overrides on top and then call
//! [`ReporterConfig::validate`].

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;
use crate::reporter::DEFAULT_PRODUCT_ID;

/// Default timeout for one whole submission request.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

pub const ENV_PROXY: &str = "LOOM_MINIDUMP_PROXY";
pub const ENV_TIMEOUT_SECS: &str = "LOOM_MINIDUMP_TIMEOUT_SECS";
pub const ENV_PRODUCT_ID: &str = "LOOM_MINIDUMP_PRODUCT_ID";

/// Configuration for a [`crate::MinidumpReporter`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReporterConfig {
	/// Timeout for the HTTP exchange, in seconds.
	pub request_timeout_secs: u64,
	/// Explicit proxy URL. When unset the system proxy environment is used.
	pub proxy: Option<String>,
	/// Value of the `ProductID` annotation added to every report.
	pub product_id: String,
}

impl Default for ReporterConfig {
	fn default() -> Self {
		Self {
			request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
			proxy: None,
			product_id: DEFAULT_PRODUCT_ID.to_string(),
		}
	}
}

impl ReporterConfig {
	/// Loads defaults, then `path` if given, then environment overrides.
	pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
		let mut config = match path {
			Some(path) => Self::from_file(path)?,
			None => Self::default(),
		};
		config.apply_env()?;
		config.validate()?;
		Ok(config)
	}

	/// Parses a TOML config file. Missing keys keep their defaults.
	pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
			path: path.to_path_buf(),
			source,
		})?;
		let config = toml::from_str(&contents).map_err(|source| ConfigError::TomlParse {
			path: path.to_path_buf(),
			source,
		})?;
		debug!(path = %path.display(), "Loaded reporter config file");
		Ok(config)
	}

	/// Applies `LOOM_MINIDUMP_*` overrides from the process environment.
	pub fn apply_env(&mut self) -> Result<(), ConfigError> {
		self.apply_env_from(|key| std::env::var(key).ok())
	}

	/// Applies overrides using `lookup` in place of the process environment.
	pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		if let Some(proxy) = lookup(ENV_PROXY) {
			self.proxy = if proxy.is_empty() { None } else { Some(proxy) };
		}

		if let Some(timeout) = lookup(ENV_TIMEOUT_SECS) {
			self.request_timeout_secs = timeout.trim().parse().map_err(|_| {
				ConfigError::invalid_value(ENV_TIMEOUT_SECS, format!("expected seconds, got {timeout:?}"))
			})?;
		}

		if let Some(product_id) = lookup(ENV_PRODUCT_ID) {
			self.product_id = product_id;
		}

		Ok(())
	}

	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.request_timeout_secs == 0 {
			return Err(ConfigError::invalid_value(
				"request_timeout_secs",
				"must be greater than zero",
			));
		}

		if self.product_id.trim().is_empty() {
			return Err(ConfigError::invalid_value("product_id", "must not be empty"));
		}

		if let Some(proxy) = &self.proxy {
			url::Url::parse(proxy)
				.map_err(|e| ConfigError::invalid_value("proxy", format!("{proxy:?}: {e}")))?;
		}

		Ok(())
	}

	pub fn request_timeout(&self) -> Duration {
		Duration::from_secs(self.request_timeout_secs)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::HashMap;
	use std::io::Write;

	fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
		let map: HashMap<String, String> = pairs
			.iter()
			.map(|(k, v)| (k.to_string(), v.to_string()))
			.collect();
		move |key: &str| map.get(key).cloned()
	}

	#[test]
	fn defaults_are_valid() {
		let config = ReporterConfig::default();
		assert_eq!(config.request_timeout(), Duration::from_secs(60));
		assert_eq!(config.product_id, DEFAULT_PRODUCT_ID);
		assert!(config.proxy.is_none());
		config.validate().unwrap();
	}

	#[test]
	fn file_overrides_defaults() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, "request_timeout_secs = 15").unwrap();
		writeln!(file, r#"proxy = "http://proxy.internal:3128""#).unwrap();

		let config = ReporterConfig::from_file(file.path()).unwrap();
		assert_eq!(config.request_timeout_secs, 15);
		assert_eq!(config.proxy.as_deref(), Some("http://proxy.internal:3128"));
		assert_eq!(config.product_id, DEFAULT_PRODUCT_ID);
	}

	#[test]
	fn unknown_keys_are_rejected() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, "retries = 3").unwrap();
		assert!(matches!(
			ReporterConfig::from_file(file.path()),
			Err(ConfigError::TomlParse { .. })
		));
	}

	#[test]
	fn missing_file_is_a_read_error() {
		let dir = tempfile::tempdir().unwrap();
		assert!(matches!(
			ReporterConfig::from_file(dir.path().join("reporter.toml")),
			Err(ConfigError::Read { .. })
		));
	}

	#[test]
	fn env_overrides_file_values() {
		let mut config = ReporterConfig {
			request_timeout_secs: 15,
			proxy: Some("http://file-proxy:3128".to_string()),
			product_id: "file".to_string(),
		};
		config
			.apply_env_from(env(&[
				(ENV_TIMEOUT_SECS, " 5 "),
				(ENV_PROXY, ""),
				(ENV_PRODUCT_ID, "{app-id}"),
			]))
			.unwrap();

		assert_eq!(config.request_timeout_secs, 5);
		assert_eq!(config.proxy, None);
		assert_eq!(config.product_id, "{app-id}");
	}

	#[test]
	fn invalid_env_timeout_names_the_variable() {
		let mut config = ReporterConfig::default();
		let err = config
			.apply_env_from(env(&[(ENV_TIMEOUT_SECS, "soon")]))
			.unwrap_err();
		assert!(err.to_string().contains(ENV_TIMEOUT_SECS));
	}

	#[test]
	fn validation_rejects_bad_values() {
		let zero_timeout = ReporterConfig {
			request_timeout_secs: 0,
			..Default::default()
		};
		assert!(zero_timeout.validate().is_err());

		let empty_product = ReporterConfig {
			product_id: " ".to_string(),
			..Default::default()
		};
		assert!(empty_product.validate().is_err());

		let bad_proxy = ReporterConfig {
			proxy: Some("not a url".to_string()),
			..Default::default()
		};
		assert!(bad_proxy.validate().is_err());
	}
}
