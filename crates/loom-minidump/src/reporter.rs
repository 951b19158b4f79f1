// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Minidump reporter: turns a crash on disk into a submitted report.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use loom_minidump_core::{
	Annotation, AnnotationSet, Boundary, DeviceMetadata, MultipartEncoder, SanitizedAnnotations,
	SubmitError, SubmittedReport,
};
use tracing::{debug, info, warn};

use crate::config::ReporterConfig;
use crate::connector::{Connector, ReqwestConnector};
use crate::error::ReporterError;
use crate::upload::Uploader;

/// Product ID sent when the configuration does not name one.
pub const DEFAULT_PRODUCT_ID: &str = "{eeb82917-e434-4870-8148-5c03d4caa81b}";

/// Outcome of one submission.
pub type SubmissionResult = Result<SubmittedReport, SubmitError>;

/// Everything needed to transmit one report, derived from a crash on disk.
#[derive(Debug, Clone)]
pub struct SubmissionRequest {
	/// `ServerURL` as found in the annotations, not yet decoded.
	pub server_url: String,
	pub annotations: SanitizedAnnotations,
	pub minidump: PathBuf,
}

/// Builder for constructing a [`MinidumpReporter`].
pub struct MinidumpReporterBuilder {
	config: ReporterConfig,
	connector: Option<Arc<dyn Connector>>,
}

impl MinidumpReporterBuilder {
	pub fn new() -> Self {
		Self {
			config: ReporterConfig::default(),
			connector: None,
		}
	}

	/// Replaces the whole configuration.
	pub fn config(mut self, config: ReporterConfig) -> Self {
		self.config = config;
		self
	}

	/// Sets the `ProductID` annotation added to every report.
	pub fn product_id(mut self, product_id: impl Into<String>) -> Self {
		self.config.product_id = product_id.into();
		self
	}

	/// Sets the HTTP request timeout.
	pub fn request_timeout(mut self, timeout: Duration) -> Self {
		self.config.request_timeout_secs = timeout.as_secs().max(1);
		self
	}

	/// Routes requests through an explicit proxy.
	pub fn proxy(mut self, proxy: impl Into<String>) -> Self {
		self.config.proxy = Some(proxy.into());
		self
	}

	/// Uses `connector` instead of building a [`ReqwestConnector`].
	pub fn connector(mut self, connector: Arc<dyn Connector>) -> Self {
		self.connector = Some(connector);
		self
	}

	/// Builds the reporter.
	///
	/// Without an explicit connector this must run inside a tokio runtime.
	pub fn build(self) -> Result<MinidumpReporter, ReporterError> {
		self.config.validate()?;

		let connector = match self.connector {
			Some(connector) => connector,
			None => Arc::new(ReqwestConnector::from_config(&self.config)?),
		};

		info!(
			product_id = %self.config.product_id,
			proxy = ?self.config.proxy,
			timeout_secs = self.config.request_timeout_secs,
			"Minidump reporter initialized"
		);

		Ok(MinidumpReporter {
			inner: Arc::new(MinidumpReporterInner {
				product_id: self.config.product_id,
				uploader: Uploader::new(connector),
			}),
		})
	}
}

impl Default for MinidumpReporterBuilder {
	fn default() -> Self {
		Self::new()
	}
}

struct MinidumpReporterInner {
	product_id: String,
	uploader: Uploader,
}

/// Submits minidump crash reports.
///
/// Cheap to clone; clones share configuration and connector but no per-report
/// state, so any number of submissions may run at once.
#[derive(Clone)]
pub struct MinidumpReporter {
	inner: Arc<MinidumpReporterInner>,
}

impl MinidumpReporter {
	pub fn builder() -> MinidumpReporterBuilder {
		MinidumpReporterBuilder::new()
	}

	pub fn product_id(&self) -> &str {
		&self.inner.product_id
	}

	/// Submits a crash on the blocking thread pool.
	///
	/// Dropping the returned future does not stop a transmission already under
	/// way; its connection is still released when it ends.
	pub async fn submit(
		&self,
		minidump: impl Into<PathBuf>,
		extras: impl Into<PathBuf>,
		app_name: impl Into<String>,
		metadata: DeviceMetadata,
	) -> SubmissionResult {
		let reporter = self.clone();
		let minidump = minidump.into();
		let extras = extras.into();
		let app_name = app_name.into();

		tokio::task::spawn_blocking(move || {
			reporter.submit_blocking(&minidump, &extras, &app_name, &metadata)
		})
		.await
		.map_err(|e| SubmitError::TransmissionFailure(io::Error::other(e)))?
	}

	/// Submits a crash on the calling thread.
	pub fn submit_blocking(
		&self,
		minidump: &Path,
		extras: &Path,
		app_name: &str,
		metadata: &DeviceMetadata,
	) -> SubmissionResult {
		let request = self.prepare(minidump, extras, app_name, metadata)?;
		self.send(&request)
	}

	/// Loads and merges the annotations of a crash and sanitizes them.
	///
	/// Fails with [`SubmitError::MissingServerUrl`] before any network I/O
	/// when the crash names no server.
	pub fn prepare(
		&self,
		minidump: &Path,
		extras: &Path,
		app_name: &str,
		metadata: &DeviceMetadata,
	) -> Result<SubmissionRequest, SubmitError> {
		let mut annotations = AnnotationSet::load(extras)?;
		debug!(extras = %extras.display(), count = annotations.len(), "Crash annotations loaded");

		annotations.put(Annotation::ProductName, app_name);
		annotations.put(Annotation::ProductId, self.inner.product_id.as_str());
		annotations.merge_metadata(metadata);

		let server_url = annotations
			.get_string(Annotation::ServerUrl)
			.map(str::to_string)
			.ok_or(SubmitError::MissingServerUrl)?;

		let annotations = annotations.into_sanitized();
		debug!(count = annotations.len(), "Crash annotations sanitized");

		Ok(SubmissionRequest {
			server_url,
			annotations,
			minidump: minidump.to_path_buf(),
		})
	}

	/// Encodes and transmits a prepared report.
	pub fn send(&self, request: &SubmissionRequest) -> SubmissionResult {
		let encoder = MultipartEncoder::new(Boundary::generate());
		let content_type = encoder.boundary().content_type();

		let result = self
			.inner
			.uploader
			.post(&request.server_url, content_type, |sink| {
				encoder.encode(sink, &request.annotations, &request.minidump)
			});
		debug!(minidump = %request.minidump.display(), "Crash report sent");

		match &result {
			Ok(report) => info!(crash_id = %report.crash_id, "Crash report submitted"),
			Err(e) if e.is_server_rejection() => warn!(error = %e, "Crash report rejected"),
			Err(e) => warn!(error = %e, "Crash report submission failed"),
		}
		result
	}
}
