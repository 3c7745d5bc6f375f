// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AclError;

/// Resource kinds an authorizer can be asked about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
	Acl,
	Agent,
	Event,
	Intention,
	Key,
	Keyring,
	Node,
	Operator,
	Mesh,
	Query,
	Service,
	Session,
	Peering,
}

impl Resource {
	pub const ALL: [Resource; 13] = [
		Resource::Acl,
		Resource::Agent,
		Resource::Event,
		Resource::Intention,
		Resource::Key,
		Resource::Keyring,
		Resource::Node,
		Resource::Operator,
		Resource::Mesh,
		Resource::Query,
		Resource::Service,
		Resource::Session,
		Resource::Peering,
	];

	pub fn as_str(&self) -> &'static str {
		match self {
			Resource::Acl => "acl",
			Resource::Agent => "agent",
			Resource::Event => "event",
			Resource::Intention => "intention",
			Resource::Key => "key",
			Resource::Keyring => "keyring",
			Resource::Node => "node",
			Resource::Operator => "operator",
			Resource::Mesh => "mesh",
			Resource::Query => "query",
			Resource::Service => "service",
			Resource::Session => "session",
			Resource::Peering => "peering",
		}
	}
}

impl fmt::Display for Resource {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for Resource {
	type Err = AclError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Resource::ALL
			.into_iter()
			.find(|r| r.as_str() == s)
			.ok_or_else(|| AclError::InvalidResource(s.to_string()))
	}
}
