// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The collection server's response format.
//!
//! The body is plain text with one `key=value` pair per line. Values use a
//! minimal escaping scheme: `\\`, `\n` and `\t` only.

use std::collections::HashMap;
use std::fmt;
use std::io::{self, BufRead};

use serde::Serialize;

use crate::error::{RejectReason, Result, SubmitError};

const CRASH_ID_KEY: &str = "CrashID";
const VIEW_URL_KEY: &str = "ViewURL";
const STOP_SENDING_REPORTS_FOR_KEY: &str = "StopSendingReportsFor";

/// Identifier the collection server assigned to an accepted report.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct CrashId(String);

impl CrashId {
	/// Wraps a server-assigned ID. Returns `None` for an empty string.
	pub fn new(id: impl Into<String>) -> Option<Self> {
		let id = id.into();
		if id.is_empty() {
			None
		} else {
			Some(Self(id))
		}
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}

	pub fn into_inner(self) -> String {
		self.0
	}
}

impl fmt::Display for CrashId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// A report the server accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmittedReport {
	pub crash_id: CrashId,
	/// Where the processed report can be viewed, if the server said.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub view_url: Option<String>,
	/// Version for which the server asks clients to stop sending reports.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub stop_sending_reports_for: Option<String>,
}

/// Parsed `key=value` response body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerResponse {
	fields: HashMap<String, String>,
}

impl ServerResponse {
	/// Reads and parses a response body.
	///
	/// Lines without `=` are ignored, a trailing `\r` is dropped, and a later
	/// occurrence of a key replaces an earlier one.
	pub fn parse<R: BufRead>(mut reader: R) -> io::Result<Self> {
		let mut fields = HashMap::new();
		let mut line = Vec::new();

		loop {
			line.clear();
			if reader.read_until(b'\n', &mut line)? == 0 {
				break;
			}
			let text = String::from_utf8_lossy(&line);
			let text = text.trim_end_matches('\n').trim_end_matches('\r');
			if let Some((key, value)) = text.split_once('=') {
				fields.insert(key.to_string(), unescape(value));
			}
		}

		Ok(Self { fields })
	}

	pub fn get(&self, key: &str) -> Option<&str> {
		self.fields.get(key).map(String::as_str)
	}

	pub fn len(&self) -> usize {
		self.fields.len()
	}

	pub fn is_empty(&self) -> bool {
		self.fields.is_empty()
	}

	/// The assigned crash ID, if present and non-empty.
	pub fn crash_id(&self) -> Option<CrashId> {
		self.get(CRASH_ID_KEY).and_then(CrashId::new)
	}

	pub fn view_url(&self) -> Option<&str> {
		self.get(VIEW_URL_KEY)
	}

	pub fn stop_sending_reports_for(&self) -> Option<&str> {
		self.get(STOP_SENDING_REPORTS_FOR_KEY)
	}

	/// Interprets the body of a 200 response.
	pub fn into_submitted_report(self, status: u16) -> Result<SubmittedReport> {
		let crash_id = self.crash_id().ok_or(SubmitError::ServerRejected {
			status,
			reason: RejectReason::MissingCrashId,
		})?;

		Ok(SubmittedReport {
			crash_id,
			view_url: self.view_url().map(str::to_string),
			stop_sending_reports_for: self.stop_sending_reports_for().map(str::to_string),
		})
	}
}

/// Undoes the server's value escaping.
///
/// The three sequences are replaced in turn: `\\` first, then `\n`, then
/// `\t`. A `\\n` on the wire therefore becomes a newline. Any other
/// backslash is literal.
pub fn unescape(value: &str) -> String {
	value
		.replace(r"\\", r"\")
		.replace(r"\n", "\n")
		.replace(r"\t", "\t")
}
