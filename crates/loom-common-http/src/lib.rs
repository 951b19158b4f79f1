// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Shared HTTP utilities for Loom.
//!
//! This crate provides a pre-configured HTTP client builder with a consistent
//! User-Agent header and optional explicit proxy.

mod client;

pub use client::{builder, builder_with_proxy, platform, user_agent};
