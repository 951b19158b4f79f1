// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Connections to the crash collection server.
//!
//! The uploader does not open sockets itself. It asks a [`Connector`] for a
//! [`Connection`], streams the request body into it and then reads the
//! response. [`ReqwestConnector`] is the production implementation; tests
//! substitute an in-memory one.

use std::io::{self, BufRead, Write};

use bytes::Bytes;
use futures::channel::mpsc;
use futures::SinkExt;
use reqwest::header::{CONTENT_ENCODING, CONTENT_TYPE};
use reqwest::{Body, Client};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::debug;
use url::Url;

use crate::config::ReporterConfig;
use crate::error::ReporterError;

/// Body chunks that may be queued ahead of the HTTP client.
const BODY_CHANNEL_CAPACITY: usize = 16;

/// A `POST` of a crash report body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
	pub url: Url,
	pub content_type: String,
	pub content_encoding: &'static str,
}

/// Status and body of the server's answer.
pub struct HttpResponse {
	pub status: u16,
	pub body: Box<dyn BufRead + Send>,
}

/// One request in flight. Writes go to the request body.
///
/// Dropping a connection without calling [`Connection::finish`] must release
/// it.
pub trait Connection: Write + Send {
	/// Ends the request body and waits for the response.
	fn finish(self: Box<Self>) -> io::Result<HttpResponse>;
}

/// Opens connections, resolving any proxy on the way.
pub trait Connector: Send + Sync {
	fn open(&self, request: &UploadRequest) -> io::Result<Box<dyn Connection>>;
}

/// [`Connector`] backed by a `reqwest` client.
///
/// Requests run on a tokio runtime while the body is written from a blocking
/// thread, so this connector must be used off the async executor (the reporter
/// does so via `spawn_blocking`).
#[derive(Clone)]
pub struct ReqwestConnector {
	client: Client,
	runtime: Handle,
}

impl ReqwestConnector {
	pub fn new(client: Client, runtime: Handle) -> Self {
		Self { client, runtime }
	}

	/// Builds a client from `config` and binds it to the current runtime.
	pub fn from_config(config: &ReporterConfig) -> Result<Self, ReporterError> {
		let runtime = Handle::try_current().map_err(|_| ReporterError::NoRuntime)?;

		let builder = match &config.proxy {
			Some(proxy) => loom_common_http::builder_with_proxy(proxy)?,
			None => loom_common_http::builder(),
		};
		let client = builder.timeout(config.request_timeout()).build()?;

		Ok(Self::new(client, runtime))
	}
}

impl Connector for ReqwestConnector {
	fn open(&self, request: &UploadRequest) -> io::Result<Box<dyn Connection>> {
		let (sender, receiver) = mpsc::channel::<io::Result<Bytes>>(BODY_CHANNEL_CAPACITY);

		let pending = self
			.client
			.post(request.url.clone())
			.header(CONTENT_TYPE, request.content_type.as_str())
			.header(CONTENT_ENCODING, request.content_encoding)
			.body(Body::wrap_stream(receiver));

		let exchange = self.runtime.spawn(async move {
			let response = pending.send().await?;
			let status = response.status().as_u16();
			let body = response.bytes().await?;
			Ok((status, body))
		});

		debug!(url = %request.url, "Opened crash report request");

		Ok(Box::new(ReqwestConnection {
			sender: Some(sender),
			exchange: Some(exchange),
			runtime: self.runtime.clone(),
		}))
	}
}

type Exchange = JoinHandle<reqwest::Result<(u16, Bytes)>>;

struct ReqwestConnection {
	sender: Option<mpsc::Sender<io::Result<Bytes>>>,
	exchange: Option<Exchange>,
	runtime: Handle,
}

impl ReqwestConnection {
	fn wait_for_exchange(&mut self) -> io::Result<(u16, Bytes)> {
		let exchange = self
			.exchange
			.take()
			.ok_or_else(|| io::Error::other("request already completed"))?;

		match self.runtime.block_on(exchange) {
			Ok(Ok(answer)) => Ok(answer),
			Ok(Err(e)) => Err(io::Error::other(e)),
			Err(e) => Err(io::Error::other(e)),
		}
	}

	/// The request ended while the body was still being written.
	fn body_rejected(&mut self) -> io::Error {
		self.sender = None;
		match self.wait_for_exchange() {
			Err(e) => e,
			Ok((status, _)) => io::Error::new(
				io::ErrorKind::BrokenPipe,
				format!("server answered with status {status} before the request body was sent"),
			),
		}
	}
}

impl Write for ReqwestConnection {
	fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
		let Some(sender) = self.sender.as_mut() else {
			return Err(io::Error::new(
				io::ErrorKind::BrokenPipe,
				"request body already closed",
			));
		};

		let chunk = Bytes::copy_from_slice(buf);
		if futures::executor::block_on(sender.send(Ok(chunk))).is_err() {
			return Err(self.body_rejected());
		}
		Ok(buf.len())
	}

	fn flush(&mut self) -> io::Result<()> {
		Ok(())
	}
}

impl Connection for ReqwestConnection {
	fn finish(mut self: Box<Self>) -> io::Result<HttpResponse> {
		// Dropping the sender ends the body stream.
		self.sender = None;
		let (status, body) = self.wait_for_exchange()?;
		debug!(status, body_bytes = body.len(), "Received crash report response");
		Ok(HttpResponse {
			status,
			body: Box::new(io::Cursor::new(body)),
		})
	}
}

impl Drop for ReqwestConnection {
	fn drop(&mut self) {
		if let Some(exchange) = self.exchange.take() {
			exchange.abort();
		}
	}
}
