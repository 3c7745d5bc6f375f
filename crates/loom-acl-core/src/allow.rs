// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error-returning view over an authorizer.
//!
//! Handlers that want a `Result` rather than a decision wrap their
//! authorizer in an [`AllowAuthorizer`]; anything short of `Allow` becomes
//! a [`PermissionDeniedError`] naming what was missing.

use crate::access::EnforcementDecision;
use crate::authorizer::{Authorizer, Operation};
use crate::context::AuthorizerContext;
use crate::error::{AclError, PermissionDeniedError, Result};

/// Wraps an authorizer and the accessor id of the token it was built for.
#[derive(Debug, Clone, Copy)]
pub struct AllowAuthorizer<'a> {
	authorizer: &'a dyn Authorizer,
	accessor_id: Option<&'a str>,
}

macro_rules! named_checks {
	($($method:ident => $op:ident;)*) => {
		$(
			pub fn $method(&self, name: &str, ctx: &AuthorizerContext) -> Result<()> {
				self.require(Operation::$op, name, ctx)
			}
		)*
	};
}

macro_rules! unnamed_checks {
	($($method:ident => $op:ident;)*) => {
		$(
			pub fn $method(&self, ctx: &AuthorizerContext) -> Result<()> {
				self.require(Operation::$op, "", ctx)
			}
		)*
	};
}

impl<'a> AllowAuthorizer<'a> {
	pub fn new(authorizer: &'a dyn Authorizer) -> Self {
		Self {
			authorizer,
			accessor_id: None,
		}
	}

	pub fn with_accessor_id(mut self, accessor_id: &'a str) -> Self {
		self.accessor_id = Some(accessor_id);
		self
	}

	/// Ok when `op` is allowed, otherwise a permission-denied error.
	pub fn require(&self, op: Operation, name: &str, ctx: &AuthorizerContext) -> Result<()> {
		match self.authorizer.check(op, name, ctx) {
			EnforcementDecision::Allow => Ok(()),
			_ => Err(AclError::PermissionDenied(self.denied(op, name))),
		}
	}

	fn denied(&self, op: Operation, name: &str) -> PermissionDeniedError {
		let resource = op.resource();
		let access = op.access();
		match op {
			Operation::IntentionDefaultAllow => {
				PermissionDeniedError::with_cause("Denied by intention default")
			}
			Operation::NodeReadAll => {
				PermissionDeniedError::new(self.accessor_id, resource, access, "all nodes")
			}
			Operation::ServiceReadAll => {
				PermissionDeniedError::new(self.accessor_id, resource, access, "all services")
			}
			Operation::ServiceWriteAny => {
				PermissionDeniedError::new(self.accessor_id, resource, access, "any service")
			}
			op if op.takes_name() => {
				PermissionDeniedError::new(self.accessor_id, resource, access, name)
			}
			_ => PermissionDeniedError::unnamed(self.accessor_id, resource, access),
		}
	}

	unnamed_checks! {
		acl_read_allowed => AclRead;
		acl_write_allowed => AclWrite;
		intention_default_allow_allowed => IntentionDefaultAllow;
		keyring_read_allowed => KeyringRead;
		keyring_write_allowed => KeyringWrite;
		mesh_read_allowed => MeshRead;
		mesh_write_allowed => MeshWrite;
		peering_read_allowed => PeeringRead;
		peering_write_allowed => PeeringWrite;
		node_read_all_allowed => NodeReadAll;
		operator_read_allowed => OperatorRead;
		operator_write_allowed => OperatorWrite;
		service_read_all_allowed => ServiceReadAll;
		service_write_any_allowed => ServiceWriteAny;
		snapshot_allowed => Snapshot;
	}

	named_checks! {
		agent_read_allowed => AgentRead;
		agent_write_allowed => AgentWrite;
		event_read_allowed => EventRead;
		event_write_allowed => EventWrite;
		intention_read_allowed => IntentionRead;
		intention_write_allowed => IntentionWrite;
		key_list_allowed => KeyList;
		key_read_allowed => KeyRead;
		key_write_allowed => KeyWrite;
		key_write_prefix_allowed => KeyWritePrefix;
		node_read_allowed => NodeRead;
		node_write_allowed => NodeWrite;
		prepared_query_read_allowed => PreparedQueryRead;
		prepared_query_write_allowed => PreparedQueryWrite;
		service_read_allowed => ServiceRead;
		service_write_allowed => ServiceWrite;
		session_read_allowed => SessionRead;
		session_write_allowed => SessionWrite;
	}
}
