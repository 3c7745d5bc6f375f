// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error taxonomy for ACL compilation, lookup and authorization.
//!
//! Sentinel errors keep stable message text so they can be recognised after
//! crossing a boundary that flattens errors into strings; use the `is_err_*`
//! helpers rather than matching variants when the error may have been
//! serialized.

use std::fmt;

use thiserror::Error;

use crate::access::AccessLevel;
use crate::resource::Resource;

pub const ERR_NOT_FOUND: &str = "ACL not found";
pub const ERR_ROOT_DENIED: &str = "Cannot resolve root ACL";
pub const ERR_DISABLED: &str = "ACL support disabled";
pub const ERR_PERMISSION_DENIED: &str = "Permission denied";
pub const ERR_INVALID_PARENT: &str = "Invalid Parent";

/// Errors produced by the ACL engine.
#[derive(Debug, Error)]
pub enum AclError {
	#[error("ACL not found")]
	NotFound,

	#[error("Cannot resolve root ACL")]
	RootDenied,

	#[error("ACL support disabled")]
	Disabled,

	#[error("Invalid Parent")]
	InvalidParent,

	#[error(transparent)]
	PermissionDenied(#[from] PermissionDeniedError),

	#[error("{0:?} is not a valid access level")]
	InvalidAccessLevel(String),

	#[error("Invalid {kind} policy: {detail}")]
	InvalidPolicy { kind: String, detail: String },

	#[error("Invalid ACL resource requested: {0:?}")]
	InvalidResource(String),

	#[error("Invalid access level for {resource} resource: {access}")]
	InvalidOperation { resource: Resource, access: String },

	#[error("Failed to parse ACL rules: {0}")]
	Parse(String),

	#[error("failed to fault in ACL {id:?}: {message}")]
	FaultIn { id: String, message: String },

	#[error("{0} cache size must be greater than zero")]
	InvalidCacheSize(&'static str),
}

impl From<serde_json::Error> for AclError {
	fn from(err: serde_json::Error) -> Self {
		AclError::Parse(err.to_string())
	}
}

pub type Result<T> = std::result::Result<T, AclError>;

/// Structured authorization failure suitable for audit logging.
///
/// The resource name may be withheld (see [`PermissionDeniedError::unnamed`])
/// when disclosing it to the caller would leak information.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionDeniedError {
	pub cause: Option<String>,
	pub accessor_id: Option<String>,
	pub resource: Option<Resource>,
	pub access: Option<AccessLevel>,
	pub resource_name: Option<String>,
}

impl PermissionDeniedError {
	pub fn new(
		accessor_id: Option<&str>,
		resource: Resource,
		access: AccessLevel,
		resource_name: impl Into<String>,
	) -> Self {
		Self {
			cause: None,
			accessor_id: accessor_id.map(str::to_string),
			resource: Some(resource),
			access: Some(access),
			resource_name: Some(resource_name.into()),
		}
	}

	pub fn unnamed(accessor_id: Option<&str>, resource: Resource, access: AccessLevel) -> Self {
		Self {
			cause: None,
			accessor_id: accessor_id.map(str::to_string),
			resource: Some(resource),
			access: Some(access),
			resource_name: None,
		}
	}

	pub fn with_cause(cause: impl Into<String>) -> Self {
		Self {
			cause: Some(cause.into()),
			..Default::default()
		}
	}
}

impl fmt::Display for PermissionDeniedError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(ERR_PERMISSION_DENIED)?;
		if let Some(cause) = &self.cause {
			return write!(f, ": {cause}");
		}

		match self.accessor_id.as_deref().filter(|id| !id.is_empty()) {
			Some(id) => write!(f, ": token with AccessorID '{id}'")?,
			None => f.write_str(": provided token")?,
		}

		let resource = self.resource.map(|r| r.as_str()).unwrap_or_default();
		let access = self.access.unwrap_or_default();
		write!(f, " lacks permission '{resource}:{access}'")?;

		if let Some(name) = self.resource_name.as_deref().filter(|n| !n.is_empty()) {
			write!(f, " on {name}")?;
		}
		Ok(())
	}
}

impl std::error::Error for PermissionDeniedError {}

fn message_contains<E: fmt::Display + ?Sized>(err: &E, needle: &str) -> bool {
	err.to_string().contains(needle)
}

pub fn is_err_not_found<E: fmt::Display + ?Sized>(err: &E) -> bool {
	message_contains(err, ERR_NOT_FOUND)
}

pub fn is_err_root_denied<E: fmt::Display + ?Sized>(err: &E) -> bool {
	message_contains(err, ERR_ROOT_DENIED)
}

pub fn is_err_disabled<E: fmt::Display + ?Sized>(err: &E) -> bool {
	message_contains(err, ERR_DISABLED)
}

pub fn is_err_permission_denied<E: fmt::Display + ?Sized>(err: &E) -> bool {
	message_contains(err, ERR_PERMISSION_DENIED)
}

pub fn is_err_invalid_parent<E: fmt::Display + ?Sized>(err: &E) -> bool {
	message_contains(err, ERR_INVALID_PARENT)
}
