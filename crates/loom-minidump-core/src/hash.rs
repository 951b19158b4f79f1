// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Minidump content hashing.
//!
//! The hash is not part of a submission; callers use it to recognise the same
//! dump across local records.

use std::fs::File;
use std::io;
use std::path::Path;

use sha2::{Digest, Sha256};

/// Lower-case hex SHA-256 of the minidump, streamed from disk.
pub fn minidump_sha256(path: impl AsRef<Path>) -> io::Result<String> {
	let mut file = File::open(path)?;
	let mut hasher = Sha256::new();
	io::copy(&mut file, &mut hasher)?;
	Ok(hex::encode(hasher.finalize()))
}
