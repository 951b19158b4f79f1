// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types for submitting native minidump crash reports.
//!
//! This crate holds everything about a report that does not touch the network
//! and is shared by the `loom-minidump` SDK and its CLI:
//! - The closed set of crash annotations and their report allow-list
//! - Loading, merging and sanitizing the extras file of a crash
//! - The `multipart/form-data` body encoder for a report
//! - The line-oriented `key=value` response format of the collection server
//! - The error taxonomy of a submission

pub mod annotations;
pub mod error;
pub mod hash;
pub mod multipart;
pub mod response;

pub use annotations::{Annotation, AnnotationSet, DeviceMetadata, SanitizedAnnotations};
pub use error::{RejectReason, Result, SubmitError};
pub use hash::minidump_sha256;
pub use multipart::{Boundary, MultipartEncoder, EXTRA_PART_NAME, MINIDUMP_PART_NAME};
pub use response::{CrashId, ServerResponse, SubmittedReport};
