// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Crash annotations and the extras file that carries them.
//!
//! The set of annotations is closed: every name that may appear in a report is
//! a member of [`Annotation`], and each member carries a static flag saying
//! whether it may ever leave the device. [`AnnotationSet::sanitize`] enforces
//! that flag and also drops names that are not members at all.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::error::{Result, SubmitError};

/// Host and device facts supplied by the platform layer, keyed by annotation.
pub type DeviceMetadata = BTreeMap<Annotation, String>;

/// A named field of a crash report.
///
/// This is the full wire vocabulary: an extras entry whose name is not listed
/// here is stripped by [`AnnotationSet::sanitize`] and never sent. Forwarding a
/// new annotation means adding it here and to the table below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Annotation {
	AdapterDeviceId,
	AdapterVendorId,
	AndroidBoard,
	AndroidBrand,
	AndroidCpuAbi,
	AndroidCpuAbi2,
	AndroidDevice,
	AndroidDisplay,
	AndroidFingerprint,
	AndroidHardware,
	AndroidManufacturer,
	AndroidModel,
	AndroidPackageName,
	AndroidVersion,
	AvailablePageFile,
	AvailablePhysicalMemory,
	AvailableVirtualMemory,
	BuildId,
	Comments,
	CrashTime,
	InstallTime,
	MozCrashReason,
	Notes,
	ProcessType,
	ProductId,
	ProductName,
	ReleaseChannel,
	ServerUrl,
	StackTraces,
	StartupTime,
	SubmittedFrom,
	SystemMemoryUsePercentage,
	TelemetryClientId,
	TelemetryProfileGroupId,
	TelemetryServerUrl,
	TelemetrySessionId,
	Throttleable,
	TotalPageFile,
	TotalPhysicalMemory,
	TotalVirtualMemory,
	UptimeTs,
	Url,
	Vendor,
	Version,
}

/// Static description of one annotation.
#[derive(Debug, Clone, Copy)]
struct AnnotationInfo {
	annotation: Annotation,
	name: &'static str,
	allowed_in_report: bool,
}

const fn info(annotation: Annotation, name: &'static str, allowed_in_report: bool) -> AnnotationInfo {
	AnnotationInfo {
		annotation,
		name,
		allowed_in_report,
	}
}

/// Indexed by discriminant; order must match the enum declaration.
const ANNOTATIONS: [AnnotationInfo; 44] = [
	info(Annotation::AdapterDeviceId, "AdapterDeviceID", true),
	info(Annotation::AdapterVendorId, "AdapterVendorID", true),
	info(Annotation::AndroidBoard, "Android_Board", true),
	info(Annotation::AndroidBrand, "Android_Brand", true),
	info(Annotation::AndroidCpuAbi, "Android_CPU_ABI", true),
	info(Annotation::AndroidCpuAbi2, "Android_CPU_ABI2", true),
	info(Annotation::AndroidDevice, "Android_Device", true),
	info(Annotation::AndroidDisplay, "Android_Display", true),
	info(Annotation::AndroidFingerprint, "Android_Fingerprint", true),
	info(Annotation::AndroidHardware, "Android_Hardware", true),
	info(Annotation::AndroidManufacturer, "Android_Manufacturer", true),
	info(Annotation::AndroidModel, "Android_Model", true),
	info(Annotation::AndroidPackageName, "Android_PackageName", true),
	info(Annotation::AndroidVersion, "Android_Version", true),
	info(Annotation::AvailablePageFile, "AvailablePageFile", true),
	info(Annotation::AvailablePhysicalMemory, "AvailablePhysicalMemory", true),
	info(Annotation::AvailableVirtualMemory, "AvailableVirtualMemory", true),
	info(Annotation::BuildId, "BuildID", true),
	info(Annotation::Comments, "Comments", true),
	info(Annotation::CrashTime, "CrashTime", true),
	info(Annotation::InstallTime, "InstallTime", true),
	info(Annotation::MozCrashReason, "MozCrashReason", true),
	info(Annotation::Notes, "Notes", true),
	info(Annotation::ProcessType, "ProcessType", true),
	info(Annotation::ProductId, "ProductID", true),
	info(Annotation::ProductName, "ProductName", true),
	info(Annotation::ReleaseChannel, "ReleaseChannel", true),
	info(Annotation::ServerUrl, "ServerURL", false),
	info(Annotation::StackTraces, "StackTraces", false),
	info(Annotation::StartupTime, "StartupTime", true),
	info(Annotation::SubmittedFrom, "SubmittedFrom", true),
	info(Annotation::SystemMemoryUsePercentage, "SystemMemoryUsePercentage", true),
	info(Annotation::TelemetryClientId, "TelemetryClientId", false),
	info(Annotation::TelemetryProfileGroupId, "TelemetryProfileGroupId", false),
	info(Annotation::TelemetryServerUrl, "TelemetryServerURL", false),
	info(Annotation::TelemetrySessionId, "TelemetrySessionId", false),
	info(Annotation::Throttleable, "Throttleable", true),
	info(Annotation::TotalPageFile, "TotalPageFile", true),
	info(Annotation::TotalPhysicalMemory, "TotalPhysicalMemory", true),
	info(Annotation::TotalVirtualMemory, "TotalVirtualMemory", true),
	info(Annotation::UptimeTs, "UptimeTS", true),
	info(Annotation::Url, "URL", true),
	info(Annotation::Vendor, "Vendor", true),
	info(Annotation::Version, "Version", true),
];

impl Annotation {
	/// Iterates over every member of the enumeration.
	pub fn all() -> impl Iterator<Item = Annotation> {
		ANNOTATIONS.iter().map(|i| i.annotation)
	}

	fn info(self) -> &'static AnnotationInfo {
		&ANNOTATIONS[self as usize]
	}

	/// The key used for this annotation in the extras file and on the wire.
	pub fn name(self) -> &'static str {
		self.info().name
	}

	/// Whether this annotation may be sent to the collection server.
	pub fn allowed_in_report(self) -> bool {
		self.info().allowed_in_report
	}

	/// Looks up an annotation by its exact wire name.
	pub fn from_name(name: &str) -> Option<Annotation> {
		ANNOTATIONS
			.iter()
			.find(|i| i.name == name)
			.map(|i| i.annotation)
	}
}

impl fmt::Display for Annotation {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

/// A name that is not a member of [`Annotation`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown crash annotation: {0}")]
pub struct UnknownAnnotation(pub String);

impl FromStr for Annotation {
	type Err = UnknownAnnotation;

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		Annotation::from_name(s).ok_or_else(|| UnknownAnnotation(s.to_string()))
	}
}

/// The annotations of one crash, as loaded from its extras file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnotationSet {
	entries: Map<String, Value>,
}

impl AnnotationSet {
	pub fn new() -> Self {
		Self::default()
	}

	/// Loads the extras file at `path`, which must hold a JSON object.
	pub fn load(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref();
		let contents = std::fs::read(path)
			.map_err(|e| SubmitError::malformed_annotations(path, format!("failed to read: {e}")))?;

		let set = Self::from_slice(&contents)
			.map_err(|message| SubmitError::malformed_annotations(path, message))?;

		debug!(path = %path.display(), count = set.len(), "Loaded crash annotations");
		Ok(set)
	}

	/// Parses a JSON object into an annotation set.
	pub fn from_slice(contents: &[u8]) -> std::result::Result<Self, String> {
		match serde_json::from_slice::<Value>(contents) {
			Ok(Value::Object(entries)) => Ok(Self { entries }),
			Ok(_) => Err("expected a JSON object".to_string()),
			Err(e) => Err(format!("invalid JSON: {e}")),
		}
	}

	/// Inserts or overwrites a value.
	pub fn put(&mut self, annotation: Annotation, value: impl Into<Value>) {
		self.entries.insert(annotation.name().to_string(), value.into());
	}

	/// Merges every entry of `metadata`, overwriting existing values.
	pub fn merge_metadata(&mut self, metadata: &DeviceMetadata) {
		for (annotation, value) in metadata {
			self.put(*annotation, value.as_str());
		}
	}

	pub fn get(&self, annotation: Annotation) -> Option<&Value> {
		self.entries.get(annotation.name())
	}

	/// Returns the value if it is present and a JSON string.
	pub fn get_string(&self, annotation: Annotation) -> Option<&str> {
		self.get(annotation).and_then(Value::as_str)
	}

	/// Returns true if an entry with this raw name exists.
	pub fn contains_name(&self, name: &str) -> bool {
		self.entries.contains_key(name)
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Removes every entry that may not leave the device, returning how many
	/// were removed. Names that are not annotations are removed too.
	pub fn sanitize(&mut self) -> usize {
		let rejected: Vec<String> = self
			.entries
			.keys()
			.filter(|name| !Annotation::from_name(name).is_some_and(Annotation::allowed_in_report))
			.cloned()
			.collect();

		for name in &rejected {
			self.entries.remove(name);
		}

		if !rejected.is_empty() {
			debug!(removed = ?rejected, "Stripped annotations not allowed in report");
		}
		rejected.len()
	}

	/// Sanitizes the set and seals it for transmission.
	pub fn into_sanitized(mut self) -> SanitizedAnnotations {
		self.sanitize();
		SanitizedAnnotations {
			entries: self.entries,
		}
	}
}

/// Annotations that passed [`AnnotationSet::sanitize`].
///
/// This is the only annotation type the report encoder accepts.
#[derive(Debug, Clone, PartialEq)]
pub struct SanitizedAnnotations {
	entries: Map<String, Value>,
}

impl SanitizedAnnotations {
	/// Compact JSON encoding of the annotations.
	pub fn to_json(&self) -> String {
		Value::Object(self.entries.clone()).to_string()
	}

	pub fn get(&self, annotation: Annotation) -> Option<&Value> {
		self.entries.get(annotation.name())
	}

	pub fn names(&self) -> impl Iterator<Item = &str> {
		self.entries.keys().map(String::as_str)
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}
