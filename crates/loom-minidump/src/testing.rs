// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! In-memory [`Connector`] for unit tests.

use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use flate2::read::GzDecoder;

use crate::connector::{Connection, Connector, HttpResponse, UploadRequest};

#[derive(Default)]
struct Recorded {
	opens: usize,
	closes: usize,
	requests: Vec<UploadRequest>,
	bodies: Vec<Vec<u8>>,
}

enum Behavior {
	Respond { status: u16, body: Vec<u8> },
	RefuseOpen,
	FailWrites,
}

/// Records every request and answers with a canned response.
pub(crate) struct RecordingConnector {
	behavior: Behavior,
	response_delay: Duration,
	recorded: Arc<Mutex<Recorded>>,
}

impl RecordingConnector {
	pub fn responding(status: u16, body: &str) -> Self {
		Self::with(Behavior::Respond {
			status,
			body: body.as_bytes().to_vec(),
		})
	}

	/// Every `open` fails as if the server were unreachable.
	pub fn refusing() -> Self {
		Self::with(Behavior::RefuseOpen)
	}

	/// Connections open but every body write fails.
	pub fn failing_writes() -> Self {
		Self::with(Behavior::FailWrites)
	}

	fn with(behavior: Behavior) -> Self {
		Self {
			behavior,
			response_delay: Duration::ZERO,
			recorded: Arc::new(Mutex::new(Recorded::default())),
		}
	}

	/// Holds every response back for `delay` after the body is sent.
	pub fn delaying_responses(mut self, delay: Duration) -> Self {
		self.response_delay = delay;
		self
	}

	pub fn opens(&self) -> usize {
		self.recorded.lock().unwrap().opens
	}

	pub fn closes(&self) -> usize {
		self.recorded.lock().unwrap().closes
	}

	pub fn requests(&self) -> Vec<UploadRequest> {
		self.recorded.lock().unwrap().requests.clone()
	}

	/// The last request body, gunzipped.
	pub fn last_body(&self) -> Vec<u8> {
		let recorded = self.recorded.lock().unwrap();
		let compressed = recorded.bodies.last().expect("no request body recorded");
		let mut body = Vec::new();
		GzDecoder::new(compressed.as_slice())
			.read_to_end(&mut body)
			.expect("request body is not gzip");
		body
	}
}

impl Connector for RecordingConnector {
	fn open(&self, request: &UploadRequest) -> io::Result<Box<dyn Connection>> {
		let (status, body, fail_writes) = match &self.behavior {
			Behavior::RefuseOpen => {
				return Err(io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused"))
			}
			Behavior::FailWrites => (0, Vec::new(), true),
			Behavior::Respond { status, body } => (*status, body.clone(), false),
		};

		let mut recorded = self.recorded.lock().unwrap();
		recorded.opens += 1;
		recorded.requests.push(request.clone());

		Ok(Box::new(RecordingConnection {
			status,
			delay: self.response_delay,
			response: body,
			fail_writes,
			sent: Vec::new(),
			recorded: self.recorded.clone(),
		}))
	}
}

struct RecordingConnection {
	status: u16,
	delay: Duration,
	response: Vec<u8>,
	fail_writes: bool,
	sent: Vec<u8>,
	recorded: Arc<Mutex<Recorded>>,
}

impl Write for RecordingConnection {
	fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
		if self.fail_writes {
			return Err(io::Error::new(io::ErrorKind::BrokenPipe, "stream closed early"));
		}
		self.sent.extend_from_slice(buf);
		Ok(buf.len())
	}

	fn flush(&mut self) -> io::Result<()> {
		Ok(())
	}
}

impl Connection for RecordingConnection {
	fn finish(mut self: Box<Self>) -> io::Result<HttpResponse> {
		std::thread::sleep(self.delay);
		let body = std::mem::take(&mut self.response);
		Ok(HttpResponse {
			status: self.status,
			body: Box::new(io::Cursor::new(body)),
		})
	}
}

impl Drop for RecordingConnection {
	fn drop(&mut self) {
		let mut recorded = self.recorded.lock().unwrap();
		recorded.closes += 1;
		recorded.bodies.push(std::mem::take(&mut self.sent));
	}
}
