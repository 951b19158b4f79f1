// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Minidump crash report submission for Loom.
//!
//! Sends a crash captured by a native crash handler (a minidump plus its JSON
//! extras file) to a Socorro-style collection server and returns the crash ID
//! the server assigned.
//!
//! # Example
//!
//! ```ignore
//! use loom_minidump::{DeviceMetadata, MinidumpReporter};
//!
//! let reporter = MinidumpReporter::builder().build()?;
//!
//! let report = reporter
//!     .submit("/data/crashes/3f2a.dmp", "/data/crashes/3f2a.extra", "Fenix", DeviceMetadata::new())
//!     .await?;
//! println!("submitted as {}", report.crash_id);
//! ```

pub mod config;
pub mod connector;
pub mod error;
pub mod reporter;
pub mod upload;

#[cfg(test)]
pub(crate) mod testing;

pub use config::ReporterConfig;
pub use connector::{Connection, Connector, HttpResponse, ReqwestConnector, UploadRequest};
pub use error::{ConfigError, ReporterError};
pub use reporter::{
	MinidumpReporter, MinidumpReporterBuilder, SubmissionRequest, SubmissionResult,
	DEFAULT_PRODUCT_ID,
};
pub use upload::{normalize_server_url, Uploader};

pub use loom_minidump_core::{
	minidump_sha256, Annotation, AnnotationSet, CrashId, DeviceMetadata, RejectReason,
	SanitizedAnnotations, SubmitError, SubmittedReport,
};
