// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for reporter construction and configuration.
//!
//! Submission failures are [`loom_minidump_core::SubmitError`]; the errors here
//! can only occur before a reporter exists.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// I/O error reading a config file
	#[error("failed to read config file {}: {source}", path.display())]
	Read {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	/// TOML parsing error
	#[error("TOML parse error in {}: {source}", path.display())]
	TomlParse {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},

	/// Invalid value
	#[error("Invalid value for {field}: {message}")]
	InvalidValue { field: String, message: String },
}

impl ConfigError {
	/// Create an invalid value error
	pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
		Self::InvalidValue {
			field: field.into(),
			message: message.into(),
		}
	}
}

/// Errors that can occur while building a [`crate::MinidumpReporter`].
#[derive(Debug, Error)]
pub enum ReporterError {
	#[error("configuration error: {0}")]
	Config(#[from] ConfigError),

	#[error("failed to build HTTP client: {0}")]
	HttpClient(#[from] reqwest::Error),

	/// The HTTP connector drives requests on a tokio runtime.
	#[error("no tokio runtime available for the HTTP connector")]
	NoRuntime,
}
