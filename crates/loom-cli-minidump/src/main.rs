// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! `loom-minidump`: submits a minidump crash report from the command line.

use anyhow::Context;
use clap::Parser;
use loom_minidump::{minidump_sha256, MinidumpReporter, ReporterConfig};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod args;

use args::Args;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let args = Args::parse();

	// Logs go to stderr so stdout carries only results
	tracing_subscriber::registry()
		.with(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| "info".into()),
		)
		.with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
		.init();

	let mut config =
		ReporterConfig::load(args.config.as_deref()).context("failed to load reporter configuration")?;
	args.apply_overrides(&mut config);
	config.validate().context("invalid reporter configuration")?;

	let extras = args.extras_path();
	let metadata = args.device_metadata();

	if args.print_hash {
		let hash = minidump_sha256(&args.minidump)
			.with_context(|| format!("failed to hash {}", args.minidump.display()))?;
		if args.json {
			println!("{}", serde_json::json!({ "sha256": hash }));
		} else {
			println!("sha256: {hash}");
		}
	}

	let reporter = MinidumpReporter::builder()
		.config(config)
		.build()
		.context("failed to create minidump reporter")?;

	if args.dry_run {
		let request = reporter.prepare(&args.minidump, &extras, &args.app_name, &metadata)?;
		let annotations: serde_json::Value = serde_json::from_str(&request.annotations.to_json())?;
		if args.json {
			println!(
				"{}",
				serde_json::json!({
					"server_url": request.server_url,
					"minidump": request.minidump,
					"annotations": annotations,
				})
			);
		} else {
			println!("server: {}", request.server_url);
			println!("minidump: {}", request.minidump.display());
			println!("annotations: {}", serde_json::to_string_pretty(&annotations)?);
		}
		return Ok(());
	}

	info!(minidump = %args.minidump.display(), extras = %extras.display(), "Submitting crash report");

	let report = reporter
		.submit(args.minidump.clone(), extras, args.app_name.clone(), metadata)
		.await?;

	if args.json {
		println!("{}", serde_json::to_string(&report)?);
	} else {
		println!("{}", report.crash_id);
		if let Some(view_url) = &report.view_url {
			println!("view: {view_url}");
		}
	}

	Ok(())
}
