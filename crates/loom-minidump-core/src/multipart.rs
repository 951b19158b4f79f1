// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! `multipart/form-data` encoding of a crash report.
//!
//! A report body has exactly two parts: the sanitized annotations as
//! `extra.json`, then the raw minidump. The minidump is streamed from disk into
//! the sink and never held in memory.

use std::fmt;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use tracing::debug;

use crate::annotations::SanitizedAnnotations;

/// Form field name of the annotations part.
pub const EXTRA_PART_NAME: &str = "extra";
/// Form field name of the minidump part.
pub const MINIDUMP_PART_NAME: &str = "upload_file_minidump";

const EXTRA_FILE_NAME: &str = "extra.json";
const BOUNDARY_PREFIX: &str = "---------------------------";

/// A multipart boundary token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Boundary(String);

impl Boundary {
	/// Generates a fresh boundary with 64 random bits.
	pub fn generate() -> Self {
		Self(format!(
			"{BOUNDARY_PREFIX}{:08X}{:08X}",
			fastrand::u32(..),
			fastrand::u32(..)
		))
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Value for the request's `Content-Type` header.
	pub fn content_type(&self) -> String {
		format!("multipart/form-data; boundary={}", self.0)
	}
}

impl fmt::Display for Boundary {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// Writes crash report bodies for one boundary.
#[derive(Debug, Clone)]
pub struct MultipartEncoder {
	boundary: Boundary,
}

impl MultipartEncoder {
	pub fn new(boundary: Boundary) -> Self {
		Self { boundary }
	}

	pub fn boundary(&self) -> &Boundary {
		&self.boundary
	}

	/// Writes the full report body to `sink`.
	///
	/// On error the sink holds a partial body and must be discarded.
	pub fn encode<W: Write + ?Sized>(
		&self,
		sink: &mut W,
		annotations: &SanitizedAnnotations,
		minidump: &Path,
	) -> io::Result<()> {
		let boundary = self.boundary.as_str();

		write!(
			sink,
			"--{boundary}\r\n\
			 Content-Disposition: form-data; name=\"{EXTRA_PART_NAME}\"; filename=\"{EXTRA_FILE_NAME}\"\r\n\
			 Content-Type: application/json\r\n\
			 \r\n"
		)?;
		sink.write_all(annotations.to_json().as_bytes())?;
		sink.write_all(b"\n")?;

		let mut file = File::open(minidump)?;
		write!(
			sink,
			"\r\n--{boundary}\r\n\
			 Content-Disposition: form-data; name=\"{MINIDUMP_PART_NAME}\"; filename=\"{}\"\r\n\
			 Content-Type: application/octet-stream\r\n\
			 \r\n",
			file_name(minidump)
		)?;
		let copied = io::copy(&mut file, sink)?;

		write!(sink, "\r\n--{boundary}--\r\n")?;

		debug!(
			minidump = %minidump.display(),
			minidump_bytes = copied,
			annotations = annotations.len(),
			"Encoded crash report body"
		);
		Ok(())
	}
}

/// Basename of the minidump, with quotes percent-encoded so the header stays
/// well formed.
fn file_name(path: &Path) -> String {
	path
		.file_name()
		.map(|name| name.to_string_lossy().replace('"', "%22"))
		.unwrap_or_default()
}
