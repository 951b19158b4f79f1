// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Shared HTTP client with consistent User-Agent header.

use reqwest::{Client, ClientBuilder, Proxy};
use tracing::debug;

/// Platform string in `{os}-{arch}` format, e.g. "linux-x86_64".
pub fn platform() -> String {
	format!("{}-{}", std::env::consts::OS, std::env::consts::ARCH)
}

/// Creates a new HTTP client builder with the standard Loom User-Agent header.
///
/// Proxies come from the system environment (`HTTP_PROXY`, `HTTPS_PROXY`,
/// `NO_PROXY`) unless one is set explicitly.
///
/// # Example
/// ```ignore
/// let client = loom_common_http::builder()
///     .timeout(Duration::from_secs(30))
///     .build()?;
/// ```
pub fn builder() -> ClientBuilder {
	Client::builder().user_agent(user_agent())
}

/// Creates a client builder that sends every request through `proxy_url`.
///
/// Fails if the proxy URL cannot be parsed.
pub fn builder_with_proxy(proxy_url: &str) -> reqwest::Result<ClientBuilder> {
	let proxy = Proxy::all(proxy_url)?;
	debug!(proxy = %proxy_url, "Using explicit HTTP proxy");
	Ok(builder().proxy(proxy))
}

/// Returns the standard Loom User-Agent string.
///
/// Format: `loom/{platform}/{version}`
pub fn user_agent() -> String {
	format!("loom/{}/{}", platform(), env!("CARGO_PKG_VERSION"))
}
