// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The authorizer capability.
//!
//! Every authorizer implements one method, [`Authorizer::check`], which
//! takes an [`Operation`]. The per-verb methods (`key_read`, `service_write`
//! and so on) live on [`AuthorizerExt`] and forward to `check`. The string
//! entry point used by request handlers is [`enforce`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::access::{AccessLevel, EnforcementDecision};
use crate::context::AuthorizerContext;
use crate::error::{AclError, Result};
use crate::resource::Resource;

/// Every question an authorizer can answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
	AclRead,
	AclWrite,
	AgentRead,
	AgentWrite,
	EventRead,
	EventWrite,
	IntentionDefaultAllow,
	IntentionRead,
	IntentionWrite,
	KeyList,
	KeyRead,
	KeyWrite,
	KeyWritePrefix,
	KeyringRead,
	KeyringWrite,
	MeshRead,
	MeshWrite,
	PeeringRead,
	PeeringWrite,
	NodeRead,
	NodeReadAll,
	NodeWrite,
	OperatorRead,
	OperatorWrite,
	PreparedQueryRead,
	PreparedQueryWrite,
	ServiceRead,
	ServiceReadAll,
	ServiceWrite,
	ServiceWriteAny,
	SessionRead,
	SessionWrite,
	Snapshot,
}

impl Operation {
	pub const ALL: [Operation; 33] = [
		Operation::AclRead,
		Operation::AclWrite,
		Operation::AgentRead,
		Operation::AgentWrite,
		Operation::EventRead,
		Operation::EventWrite,
		Operation::IntentionDefaultAllow,
		Operation::IntentionRead,
		Operation::IntentionWrite,
		Operation::KeyList,
		Operation::KeyRead,
		Operation::KeyWrite,
		Operation::KeyWritePrefix,
		Operation::KeyringRead,
		Operation::KeyringWrite,
		Operation::MeshRead,
		Operation::MeshWrite,
		Operation::PeeringRead,
		Operation::PeeringWrite,
		Operation::NodeRead,
		Operation::NodeReadAll,
		Operation::NodeWrite,
		Operation::OperatorRead,
		Operation::OperatorWrite,
		Operation::PreparedQueryRead,
		Operation::PreparedQueryWrite,
		Operation::ServiceRead,
		Operation::ServiceReadAll,
		Operation::ServiceWrite,
		Operation::ServiceWriteAny,
		Operation::SessionRead,
		Operation::SessionWrite,
		Operation::Snapshot,
	];

	/// The resource kind reported when this operation is denied.
	pub fn resource(self) -> Resource {
		use Operation::*;
		match self {
			AclRead | AclWrite | Snapshot => Resource::Acl,
			AgentRead | AgentWrite => Resource::Agent,
			EventRead | EventWrite => Resource::Event,
			IntentionDefaultAllow | IntentionRead | IntentionWrite => Resource::Intention,
			KeyList | KeyRead | KeyWrite | KeyWritePrefix => Resource::Key,
			KeyringRead | KeyringWrite => Resource::Keyring,
			MeshRead | MeshWrite => Resource::Mesh,
			PeeringRead | PeeringWrite => Resource::Peering,
			NodeRead | NodeReadAll | NodeWrite => Resource::Node,
			OperatorRead | OperatorWrite => Resource::Operator,
			PreparedQueryRead | PreparedQueryWrite => Resource::Query,
			ServiceRead | ServiceReadAll | ServiceWrite | ServiceWriteAny => Resource::Service,
			SessionRead | SessionWrite => Resource::Session,
		}
	}

	/// The access level this operation requires.
	pub fn access(self) -> AccessLevel {
		use Operation::*;
		match self {
			KeyList => AccessLevel::List,
			AclWrite | AgentWrite | EventWrite | IntentionWrite | KeyWrite | KeyWritePrefix
			| KeyringWrite | MeshWrite | PeeringWrite | NodeWrite | OperatorWrite
			| PreparedQueryWrite | ServiceWrite | ServiceWriteAny | SessionWrite | Snapshot => {
				AccessLevel::Write
			}
			AclRead | AgentRead | EventRead | IntentionDefaultAllow | IntentionRead | KeyRead
			| KeyringRead | MeshRead | PeeringRead | NodeRead | NodeReadAll | OperatorRead
			| PreparedQueryRead | ServiceRead | ServiceReadAll | SessionRead => AccessLevel::Read,
		}
	}

	/// Operations that manage the ACL system itself.
	pub fn is_management(self) -> bool {
		matches!(
			self,
			Operation::AclRead | Operation::AclWrite | Operation::Snapshot
		)
	}

	/// Whether the operation is asked about a named resource.
	pub fn takes_name(self) -> bool {
		use Operation::*;
		matches!(
			self,
			AgentRead
				| AgentWrite | EventRead | EventWrite
				| IntentionRead | IntentionWrite
				| KeyList | KeyRead | KeyWrite | KeyWritePrefix
				| NodeRead | NodeWrite
				| PreparedQueryRead | PreparedQueryWrite
				| ServiceRead | ServiceWrite
				| SessionRead | SessionWrite
		)
	}

	/// Maps a resource kind and lowercased access string onto an operation.
	///
	/// Keys additionally accept `list` and `write-prefix`.
	pub fn from_parts(resource: Resource, access: &str) -> Option<Operation> {
		use Operation::*;
		let op = match (resource, access) {
			(Resource::Acl, "read") => AclRead,
			(Resource::Acl, "write") => AclWrite,
			(Resource::Agent, "read") => AgentRead,
			(Resource::Agent, "write") => AgentWrite,
			(Resource::Event, "read") => EventRead,
			(Resource::Event, "write") => EventWrite,
			(Resource::Intention, "read") => IntentionRead,
			(Resource::Intention, "write") => IntentionWrite,
			(Resource::Key, "read") => KeyRead,
			(Resource::Key, "list") => KeyList,
			(Resource::Key, "write") => KeyWrite,
			(Resource::Key, "write-prefix") => KeyWritePrefix,
			(Resource::Keyring, "read") => KeyringRead,
			(Resource::Keyring, "write") => KeyringWrite,
			(Resource::Mesh, "read") => MeshRead,
			(Resource::Mesh, "write") => MeshWrite,
			(Resource::Node, "read") => NodeRead,
			(Resource::Node, "write") => NodeWrite,
			(Resource::Operator, "read") => OperatorRead,
			(Resource::Operator, "write") => OperatorWrite,
			(Resource::Query, "read") => PreparedQueryRead,
			(Resource::Query, "write") => PreparedQueryWrite,
			(Resource::Service, "read") => ServiceRead,
			(Resource::Service, "write") => ServiceWrite,
			(Resource::Session, "read") => SessionRead,
			(Resource::Session, "write") => SessionWrite,
			(Resource::Peering, "read") => PeeringRead,
			(Resource::Peering, "write") => PeeringWrite,
			_ => return None,
		};
		Some(op)
	}
}

impl fmt::Display for Operation {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}:{}", self.resource(), self.access())
	}
}

/// A source of authorization decisions.
///
/// `segment` is the resource name for operations that take one and is
/// ignored otherwise. Implementations must be immutable after construction.
pub trait Authorizer: Send + Sync + fmt::Debug {
	fn check(&self, op: Operation, segment: &str, ctx: &AuthorizerContext)
		-> EnforcementDecision;
}

macro_rules! named_verbs {
	($($(#[$meta:meta])* $method:ident => $op:ident;)*) => {
		$(
			$(#[$meta])*
			fn $method(&self, name: &str, ctx: &AuthorizerContext) -> EnforcementDecision {
				self.check(Operation::$op, name, ctx)
			}
		)*
	};
}

macro_rules! unnamed_verbs {
	($($(#[$meta:meta])* $method:ident => $op:ident;)*) => {
		$(
			$(#[$meta])*
			fn $method(&self, ctx: &AuthorizerContext) -> EnforcementDecision {
				self.check(Operation::$op, "", ctx)
			}
		)*
	};
}

/// Named per-verb methods for every [`Authorizer`].
pub trait AuthorizerExt: Authorizer {
	unnamed_verbs! {
		/// Listing ACLs.
		acl_read => AclRead;
		/// Modifying ACLs.
		acl_write => AclWrite;
		/// Default outcome when no intention matches a connection.
		intention_default_allow => IntentionDefaultAllow;
		keyring_read => KeyringRead;
		keyring_write => KeyringWrite;
		mesh_read => MeshRead;
		mesh_write => MeshWrite;
		peering_read => PeeringRead;
		peering_write => PeeringWrite;
		/// Reading every node.
		node_read_all => NodeReadAll;
		operator_read => OperatorRead;
		operator_write => OperatorWrite;
		/// Reading every service.
		service_read_all => ServiceReadAll;
		/// Writing at least one service.
		service_write_any => ServiceWriteAny;
		/// Taking and restoring snapshots.
		snapshot => Snapshot;
	}

	named_verbs! {
		/// Reading agent endpoints of a node.
		agent_read => AgentRead;
		/// Changing a node through its agent endpoints.
		agent_write => AgentWrite;
		event_read => EventRead;
		/// Firing an event.
		event_write => EventWrite;
		/// Reading intentions for a destination; `*` asks about any.
		intention_read => IntentionRead;
		/// Changing intentions for a destination; `*` asks about all.
		intention_write => IntentionWrite;
		key_list => KeyList;
		key_read => KeyRead;
		key_write => KeyWrite;
		/// Writing every key under a prefix.
		key_write_prefix => KeyWritePrefix;
		node_read => NodeRead;
		/// Registering a node.
		node_write => NodeWrite;
		/// Reading a prepared query definition (not executing it).
		prepared_query_read => PreparedQueryRead;
		prepared_query_write => PreparedQueryWrite;
		service_read => ServiceRead;
		/// Registering a service.
		service_write => ServiceWrite;
		session_read => SessionRead;
		/// Creating sessions on a node.
		session_write => SessionWrite;
	}
}

impl<T: Authorizer + ?Sized> AuthorizerExt for T {}

/// Resolves a resource kind and access string against `authz`.
///
/// The access string is matched case-insensitively. Unknown resources and
/// unsupported access levels are errors rather than denials.
///
/// # Example
///
/// ```
/// use loom_acl_core::{allow_all, enforce, AuthorizerContext, EnforcementDecision};
///
/// let ctx = AuthorizerContext::default();
/// let decision = enforce(allow_all().as_ref(), "key", "foo/bar", "WRITE", &ctx).unwrap();
/// assert_eq!(decision, EnforcementDecision::Allow);
///
/// assert!(enforce(allow_all().as_ref(), "key", "foo", "admin", &ctx).is_err());
/// ```
pub fn enforce<A: Authorizer + ?Sized>(
	authz: &A,
	resource: &str,
	segment: &str,
	access: &str,
	ctx: &AuthorizerContext,
) -> Result<EnforcementDecision> {
	let resource: Resource = resource.parse()?;
	let op = Operation::from_parts(resource, &access.to_lowercase()).ok_or_else(|| {
		AclError::InvalidOperation {
			resource,
			access: access.to_string(),
		}
	})?;
	Ok(authz.check(op, segment, ctx))
}
