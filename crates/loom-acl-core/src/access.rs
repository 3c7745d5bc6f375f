// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Access levels and enforcement decisions.
//!
//! An [`AccessLevel`] is what a rule grants; an [`EnforcementDecision`] is
//! what a single authorizer concludes for one request. [`enforce`] maps the
//! former onto the latter for a required level.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AclError;

/// The access level granted by a rule.
///
/// `Unset` means no rule matched. Precedence used when merging policies is
/// `Deny > Write > List > Read > Unset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
	#[default]
	Unset,
	Deny,
	Read,
	List,
	Write,
}

impl AccessLevel {
	pub const ALL: [AccessLevel; 5] = [
		AccessLevel::Unset,
		AccessLevel::Deny,
		AccessLevel::Read,
		AccessLevel::List,
		AccessLevel::Write,
	];

	pub fn as_str(&self) -> &'static str {
		match self {
			AccessLevel::Unset => "unset",
			AccessLevel::Deny => "deny",
			AccessLevel::Read => "read",
			AccessLevel::List => "list",
			AccessLevel::Write => "write",
		}
	}

	pub fn is_set(&self) -> bool {
		*self != AccessLevel::Unset
	}

	/// Rank in the merge order. Higher wins.
	pub fn precedence(self) -> u8 {
		match self {
			AccessLevel::Unset => 0,
			AccessLevel::Read => 1,
			AccessLevel::List => 2,
			AccessLevel::Write => 3,
			AccessLevel::Deny => 4,
		}
	}

	/// Returns true when `self` strictly outranks `other`.
	pub fn takes_precedence_over(self, other: AccessLevel) -> bool {
		self.precedence() > other.precedence()
	}

	/// Lenient conversion used when ranking raw rule strings: anything that
	/// is not a known level ranks as `Unset`.
	pub fn from_policy_str(policy: &str) -> AccessLevel {
		policy.parse().unwrap_or_default()
	}
}

impl fmt::Display for AccessLevel {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for AccessLevel {
	type Err = AclError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"deny" => Ok(AccessLevel::Deny),
			"read" => Ok(AccessLevel::Read),
			"list" => Ok(AccessLevel::List),
			"write" => Ok(AccessLevel::Write),
			other => Err(AclError::InvalidAccessLevel(other.to_string())),
		}
	}
}

/// Outcome of evaluating one authorizer for one request.
///
/// `Default` carries no opinion; chains move on to the next authorizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnforcementDecision {
	Allow,
	Deny,
	Default,
}

impl EnforcementDecision {
	pub fn is_allow(&self) -> bool {
		*self == EnforcementDecision::Allow
	}

	pub fn is_default(&self) -> bool {
		*self == EnforcementDecision::Default
	}

	pub fn from_bool(allow: bool) -> Self {
		if allow {
			EnforcementDecision::Allow
		} else {
			EnforcementDecision::Deny
		}
	}
}

impl fmt::Display for EnforcementDecision {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			EnforcementDecision::Allow => "Allow",
			EnforcementDecision::Deny => "Deny",
			EnforcementDecision::Default => "Default",
		})
	}
}

/// Decides whether a rule granting `rule` satisfies a request for `required`.
///
/// Write implies list and read, list implies read, deny never recurses and
/// an unset rule defers.
///
/// # Example
///
/// ```
/// use loom_acl_core::access::{enforce, AccessLevel, EnforcementDecision};
///
/// assert_eq!(enforce(AccessLevel::List, AccessLevel::Read), EnforcementDecision::Allow);
/// assert_eq!(enforce(AccessLevel::List, AccessLevel::Write), EnforcementDecision::Deny);
/// assert_eq!(enforce(AccessLevel::Unset, AccessLevel::Read), EnforcementDecision::Default);
/// ```
pub fn enforce(rule: AccessLevel, required: AccessLevel) -> EnforcementDecision {
	match rule {
		AccessLevel::Write => EnforcementDecision::Allow,
		AccessLevel::List => EnforcementDecision::from_bool(matches!(
			required,
			AccessLevel::List | AccessLevel::Read
		)),
		AccessLevel::Read => EnforcementDecision::from_bool(required == AccessLevel::Read),
		AccessLevel::Deny => EnforcementDecision::Deny,
		AccessLevel::Unset => EnforcementDecision::Default,
	}
}

/// Collapses `Default` into `Allow`, leaving `Deny` untouched.
pub fn default_is_allow(decision: EnforcementDecision) -> EnforcementDecision {
	match decision {
		EnforcementDecision::Allow | EnforcementDecision::Default => EnforcementDecision::Allow,
		EnforcementDecision::Deny => EnforcementDecision::Deny,
	}
}
