// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Command-line arguments.

use std::path::{Path, PathBuf};

use clap::Parser;
use loom_minidump::{Annotation, DeviceMetadata, ReporterConfig};

/// Submit a minidump crash report to a collection server.
///
/// The server URL is read from the `ServerURL` entry of the extras file.
#[derive(Parser, Debug)]
#[command(name = "loom-minidump", version)]
pub struct Args {
	/// Minidump file to submit
	pub minidump: PathBuf,

	/// Extras (annotations) file [default: the minidump path with `.extra`]
	#[arg(long, short = 'e')]
	pub extras: Option<PathBuf>,

	/// Application name sent as `ProductName`
	#[arg(long, env = "LOOM_MINIDUMP_APP_NAME")]
	pub app_name: String,

	/// Extra device annotation, as NAME=VALUE (repeatable)
	#[arg(long = "annotation", short = 'a', value_parser = parse_annotation)]
	pub annotations: Vec<(Annotation, String)>,

	/// TOML configuration file
	#[arg(long, env = "LOOM_MINIDUMP_CONFIG")]
	pub config: Option<PathBuf>,

	/// Proxy URL, overriding configuration
	#[arg(long)]
	pub proxy: Option<String>,

	/// Request timeout in seconds, overriding configuration
	#[arg(long)]
	pub timeout_secs: Option<u64>,

	/// Product ID, overriding configuration
	#[arg(long)]
	pub product_id: Option<String>,

	/// Print the sanitized annotations and target URL without sending
	#[arg(long)]
	pub dry_run: bool,

	/// Print the SHA-256 of the minidump
	#[arg(long)]
	pub print_hash: bool,

	/// Print results as JSON
	#[arg(long)]
	pub json: bool,
}

impl Args {
	pub fn extras_path(&self) -> PathBuf {
		self.extras
			.clone()
			.unwrap_or_else(|| default_extras_path(&self.minidump))
	}

	pub fn device_metadata(&self) -> DeviceMetadata {
		self.annotations.iter().cloned().collect()
	}

	/// Applies flag overrides on top of file and environment configuration.
	pub fn apply_overrides(&self, config: &mut ReporterConfig) {
		if let Some(proxy) = &self.proxy {
			config.proxy = Some(proxy.clone());
		}
		if let Some(timeout) = self.timeout_secs {
			config.request_timeout_secs = timeout;
		}
		if let Some(product_id) = &self.product_id {
			config.product_id = product_id.clone();
		}
	}
}

/// Parses `NAME=VALUE` where NAME is a known annotation.
pub fn parse_annotation(raw: &str) -> Result<(Annotation, String), String> {
	let (name, value) = raw
		.split_once('=')
		.ok_or_else(|| format!("expected NAME=VALUE, got {raw:?}"))?;
	let annotation =
		Annotation::from_name(name.trim()).ok_or_else(|| format!("unknown annotation {name:?}"))?;
	Ok((annotation, value.to_string()))
}

/// The crash handler writes `<id>.extra` next to `<id>.dmp`.
pub fn default_extras_path(minidump: &Path) -> PathBuf {
	match minidump.extension() {
		Some(ext) if ext == "dmp" => minidump.with_extension("extra"),
		_ => {
			let mut path = minidump.as_os_str().to_owned();
			path.push(".extra");
			PathBuf::from(path)
		}
	}
}
