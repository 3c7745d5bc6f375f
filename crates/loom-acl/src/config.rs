// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! ACL cache configuration.

use std::sync::Arc;

use loom_acl_core::{is_root_authorizer, root_authorizer, Authorizer};
use serde::Deserialize;

use crate::error::ConfigError;

pub const DEFAULT_POLICY: &str = "deny";
pub const DEFAULT_ACL_CACHE_SIZE: usize = 10_240;
pub const DEFAULT_POLICY_CACHE_SIZE: usize = 1_024;
pub const DEFAULT_AUTHORIZER_CACHE_SIZE: usize = 1_024;

/// ACL configuration (runtime, fully resolved).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AclConfig {
	/// Root authorizer used when an identity has no parent: `allow`, `deny`
	/// or `manage`.
	pub default_policy: String,
	/// Compiled authorizers cached per identity.
	pub acl_cache_size: usize,
	/// Parsed rule sets cached per rule-text hash.
	pub policy_cache_size: usize,
	/// Compiled authorizers cached per parent and rule-text hash.
	pub authorizer_cache_size: usize,
}

impl Default for AclConfig {
	fn default() -> Self {
		Self {
			default_policy: DEFAULT_POLICY.to_string(),
			acl_cache_size: DEFAULT_ACL_CACHE_SIZE,
			policy_cache_size: DEFAULT_POLICY_CACHE_SIZE,
			authorizer_cache_size: DEFAULT_AUTHORIZER_CACHE_SIZE,
		}
	}
}

impl AclConfig {
	/// The root authorizer named by `default_policy`.
	pub fn default_authorizer(&self) -> Option<Arc<dyn Authorizer>> {
		root_authorizer(&self.default_policy)
	}

	pub fn validate(&self) -> Result<(), ConfigError> {
		if !is_root_authorizer(&self.default_policy) {
			return Err(ConfigError::invalid_value(
				"default_policy",
				format!(
					"'{}' is not one of allow, deny, manage",
					self.default_policy
				),
			));
		}

		for (key, size) in [
			("acl_cache_size", self.acl_cache_size),
			("policy_cache_size", self.policy_cache_size),
			("authorizer_cache_size", self.authorizer_cache_size),
		] {
			if size == 0 {
				return Err(ConfigError::validation(format!(
					"{key} must be greater than zero"
				)));
			}
		}

		Ok(())
	}
}

/// ACL configuration layer (partial, for merging).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AclConfigLayer {
	#[serde(default)]
	pub default_policy: Option<String>,
	#[serde(default)]
	pub acl_cache_size: Option<usize>,
	#[serde(default)]
	pub policy_cache_size: Option<usize>,
	#[serde(default)]
	pub authorizer_cache_size: Option<usize>,
}

impl AclConfigLayer {
	pub fn merge(&mut self, other: AclConfigLayer) {
		if other.default_policy.is_some() {
			self.default_policy = other.default_policy;
		}
		if other.acl_cache_size.is_some() {
			self.acl_cache_size = other.acl_cache_size;
		}
		if other.policy_cache_size.is_some() {
			self.policy_cache_size = other.policy_cache_size;
		}
		if other.authorizer_cache_size.is_some() {
			self.authorizer_cache_size = other.authorizer_cache_size;
		}
	}

	pub fn finalize(self) -> AclConfig {
		AclConfig {
			default_policy: self
				.default_policy
				.map(|p| p.trim().to_lowercase())
				.unwrap_or_else(|| DEFAULT_POLICY.to_string()),
			acl_cache_size: self.acl_cache_size.unwrap_or(DEFAULT_ACL_CACHE_SIZE),
			policy_cache_size: self.policy_cache_size.unwrap_or(DEFAULT_POLICY_CACHE_SIZE),
			authorizer_cache_size: self
				.authorizer_cache_size
				.unwrap_or(DEFAULT_AUTHORIZER_CACHE_SIZE),
		}
	}
}
