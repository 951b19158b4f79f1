// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Gzip-compressed `POST` of a report body and interpretation of the answer.

use std::io::{self, Write};
use std::sync::Arc;

use flate2::write::GzEncoder;
use flate2::Compression;
use loom_minidump_core::{RejectReason, Result, ServerResponse, SubmitError, SubmittedReport};
use percent_encoding::percent_decode_str;
use tracing::debug;
use url::Url;

use crate::connector::{Connector, UploadRequest};

const GZIP_ENCODING: &str = "gzip";
const HTTP_OK: u16 = 200;

/// Percent-decodes a server URL and re-parses it.
///
/// Only absolute `http` and `https` URLs with a host are accepted. A `+` is
/// left as is.
pub fn normalize_server_url(raw: &str) -> Result<Url> {
	let decoded = percent_decode_str(raw)
		.decode_utf8()
		.map_err(|e| SubmitError::invalid_server_url(raw, format!("not valid UTF-8 once decoded: {e}")))?;

	let url = Url::parse(decoded.trim()).map_err(|e| SubmitError::invalid_server_url(raw, e))?;

	match url.scheme() {
		"http" | "https" => {}
		other => {
			return Err(SubmitError::invalid_server_url(
				raw,
				format!("unsupported scheme {other:?}"),
			))
		}
	}

	if url.host_str().map_or(true, str::is_empty) {
		return Err(SubmitError::invalid_server_url(raw, "missing host"));
	}

	Ok(url)
}

/// Sends one report body to the collection server.
#[derive(Clone)]
pub struct Uploader {
	connector: Arc<dyn Connector>,
}

impl Uploader {
	pub fn new(connector: Arc<dyn Connector>) -> Self {
		Self { connector }
	}

	/// Posts the body produced by `write_body` to `server_url`.
	///
	/// The whole body is written and compressed before the response is read.
	/// The connection is dropped, and so released, on every return path.
	pub fn post<F>(&self, server_url: &str, content_type: String, write_body: F) -> Result<SubmittedReport>
	where
		F: FnOnce(&mut dyn Write) -> io::Result<()>,
	{
		let url = normalize_server_url(server_url)?;
		let request = UploadRequest {
			url,
			content_type,
			content_encoding: GZIP_ENCODING,
		};

		let connection = self.connector.open(&request)?;

		let mut body = GzEncoder::new(connection, Compression::default());
		write_body(&mut body)?;
		let connection = body.finish()?;

		let response = connection.finish()?;
		debug!(url = %request.url, status = response.status, "Crash report transmitted");

		if response.status != HTTP_OK {
			return Err(SubmitError::ServerRejected {
				status: response.status,
				reason: RejectReason::HttpStatus,
			});
		}

		ServerResponse::parse(response.body)?.into_submitted_report(response.status)
	}
}
