// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for crash report submission.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for a single submission.
pub type Result<T> = std::result::Result<T, SubmitError>;

/// Why the collection server refused a report it received.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
	/// The server answered with a non-200 status.
	HttpStatus,
	/// The server answered 200 but did not assign a crash ID.
	MissingCrashId,
}

impl fmt::Display for RejectReason {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			RejectReason::HttpStatus => write!(f, "failure HTTP status"),
			RejectReason::MissingCrashId => write!(f, "no crash ID in response"),
		}
	}
}

/// Terminal failures of a crash report submission.
///
/// Every stage of the pipeline reports through this one type; none of these
/// are retried internally.
#[derive(Debug, Error)]
pub enum SubmitError {
	/// The extras file is missing, unreadable or not a JSON object.
	#[error("malformed annotations in {}: {message}", path.display())]
	MalformedAnnotations {
		/// Path of the extras file.
		path: PathBuf,
		/// What was wrong with it.
		message: String,
	},

	/// The annotations carry no `ServerURL`. No network I/O was attempted.
	#[error("no server URL present in crash annotations")]
	MissingServerUrl,

	/// The `ServerURL` annotation could not be decoded or normalized.
	#[error("invalid server URL {url:?}: {message}")]
	InvalidServerUrl {
		/// The URL as found in the annotations.
		url: String,
		/// Why it was rejected.
		message: String,
	},

	/// I/O failed while connecting, writing the body or reading the response.
	#[error("failed to transmit crash report: {0}")]
	TransmissionFailure(#[from] std::io::Error),

	/// The report was transmitted but the server refused it.
	#[error("server rejected crash report (status {status}): {reason}")]
	ServerRejected {
		/// HTTP status code of the response.
		status: u16,
		/// Why the response counts as a rejection.
		reason: RejectReason,
	},
}

impl SubmitError {
	pub fn malformed_annotations(path: impl Into<PathBuf>, message: impl fmt::Display) -> Self {
		Self::MalformedAnnotations {
			path: path.into(),
			message: message.to_string(),
		}
	}

	pub fn invalid_server_url(url: impl Into<String>, message: impl fmt::Display) -> Self {
		Self::InvalidServerUrl {
			url: url.into(),
			message: message.to_string(),
		}
	}

	/// Returns true if the server received the report and answered.
	pub fn is_server_rejection(&self) -> bool {
		matches!(self, SubmitError::ServerRejected { .. })
	}
}
