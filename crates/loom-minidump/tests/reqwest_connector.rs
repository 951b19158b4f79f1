// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! End-to-end submissions through the reqwest connector against a mock
//! collection server.

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use flate2::read::GzDecoder;
use loom_minidump::{
	DeviceMetadata, MinidumpReporter, RejectReason, ReporterError, ReqwestConnector, SubmitError,
};
use tempfile::TempDir;
use tokio::runtime::Handle;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DUMP: &[u8] = b"MDMP\x93\xa7\x00\x00minidump-streams";

struct Crash {
	_dir: TempDir,
	minidump: PathBuf,
	extras: PathBuf,
}

fn crash(server_url: &str) -> Crash {
	let dir = tempfile::tempdir().unwrap();
	let minidump = dir.path().join("crash.dmp");
	let extras = dir.path().join("crash.extra");
	std::fs::write(&minidump, DUMP).unwrap();
	std::fs::write(
		&extras,
		serde_json::json!({ "ServerURL": server_url, "Version": "121.0" }).to_string(),
	)
	.unwrap();
	Crash {
		_dir: dir,
		minidump,
		extras,
	}
}

/// A reporter that ignores any proxy configured in the test environment.
fn reporter() -> MinidumpReporter {
	let client = reqwest::Client::builder().no_proxy().build().unwrap();
	let connector = ReqwestConnector::new(client, Handle::current());
	MinidumpReporter::builder()
		.connector(Arc::new(connector))
		.build()
		.unwrap()
}

async fn submit(reporter: &MinidumpReporter, crash: &Crash) -> Result<loom_minidump::SubmittedReport, SubmitError> {
	reporter
		.submit(
			crash.minidump.clone(),
			crash.extras.clone(),
			"Fenix",
			DeviceMetadata::new(),
		)
		.await
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_submit_sends_gzip_multipart_and_returns_crash_id() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.and(path("/submit"))
		.and(header("content-encoding", "gzip"))
		.respond_with(
			ResponseTemplate::new(200)
				.set_body_string("CrashID=bp-6c1e2a\nViewURL=https://crash-stats.example.com/report/bp-6c1e2a\n"),
		)
		.expect(1)
		.mount(&server)
		.await;

	let crash = crash(&format!("{}/submit", server.uri()));
	let report = submit(&reporter(), &crash).await.unwrap();

	assert_eq!(report.crash_id.as_str(), "bp-6c1e2a");
	assert_eq!(
		report.view_url.as_deref(),
		Some("https://crash-stats.example.com/report/bp-6c1e2a")
	);

	let requests = server.received_requests().await.unwrap();
	let request = &requests[0];
	let content_type = request
		.headers
		.get("content-type")
		.unwrap()
		.to_str()
		.unwrap()
		.to_string();
	assert!(content_type.starts_with("multipart/form-data; boundary=---------------------------"));

	let mut body = Vec::new();
	GzDecoder::new(request.body.as_slice())
		.read_to_end(&mut body)
		.unwrap();
	let boundary = content_type.split("boundary=").nth(1).unwrap();
	assert!(body.starts_with(format!("--{boundary}\r\n").as_bytes()));
	assert!(body.windows(DUMP.len()).any(|w| w == DUMP));
	assert!(!String::from_utf8_lossy(&body).contains("ServerURL"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_server_error_is_rejection_with_status() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.respond_with(ResponseTemplate::new(500).set_body_string("CrashID=ignored\n"))
		.mount(&server)
		.await;

	let crash = crash(&format!("{}/submit", server.uri()));
	let err = submit(&reporter(), &crash).await.unwrap_err();

	assert!(matches!(
		err,
		SubmitError::ServerRejected {
			status: 500,
			reason: RejectReason::HttpStatus
		}
	));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_unreachable_server_is_transmission_failure() {
	let crash = crash("http://127.0.0.1:1/submit");
	let err = submit(&reporter(), &crash).await.unwrap_err();

	assert!(matches!(err, SubmitError::TransmissionFailure(_)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_default_builder_uses_current_runtime() {
	assert!(MinidumpReporter::builder().build().is_ok());
}

#[test]
fn test_default_builder_requires_runtime() {
	assert!(matches!(
		MinidumpReporter::builder().build(),
		Err(ReporterError::NoRuntime)
	));
}
