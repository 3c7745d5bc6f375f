// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Constant authorizers used to terminate chains.
//!
//! Each is built once per process; every call returns the same shared
//! instance, so `Arc::ptr_eq` holds between calls.

use std::sync::{Arc, OnceLock};

use crate::access::EnforcementDecision;
use crate::authorizer::{Authorizer, Operation};
use crate::context::AuthorizerContext;

/// Root authorizer id for [`allow_all`].
pub const ALLOW_ALL_ID: &str = "allow";
/// Root authorizer id for [`deny_all`].
pub const DENY_ALL_ID: &str = "deny";
/// Root authorizer id for [`manage_all`].
pub const MANAGE_ALL_ID: &str = "manage";

/// Answers every operation the same way, with ACL management
/// (`acl:read`, `acl:write`, snapshots) decided separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticAuthorizer {
	allow_manage: bool,
	default_allow: bool,
}

impl StaticAuthorizer {
	pub const fn new(allow_manage: bool, default_allow: bool) -> Self {
		Self {
			allow_manage,
			default_allow,
		}
	}
}

impl Authorizer for StaticAuthorizer {
	fn check(&self, op: Operation, _segment: &str, _ctx: &AuthorizerContext) -> EnforcementDecision {
		if op.is_management() {
			EnforcementDecision::from_bool(self.allow_manage)
		} else {
			EnforcementDecision::from_bool(self.default_allow)
		}
	}
}

static ALLOW_ALL: OnceLock<Arc<dyn Authorizer>> = OnceLock::new();
static DENY_ALL: OnceLock<Arc<dyn Authorizer>> = OnceLock::new();
static MANAGE_ALL: OnceLock<Arc<dyn Authorizer>> = OnceLock::new();

/// Allows everything except ACL management.
pub fn allow_all() -> Arc<dyn Authorizer> {
	Arc::clone(ALLOW_ALL.get_or_init(|| Arc::new(StaticAuthorizer::new(false, true))))
}

/// Denies everything.
pub fn deny_all() -> Arc<dyn Authorizer> {
	Arc::clone(DENY_ALL.get_or_init(|| Arc::new(StaticAuthorizer::new(false, false))))
}

/// Allows everything, ACL management included.
pub fn manage_all() -> Arc<dyn Authorizer> {
	Arc::clone(MANAGE_ALL.get_or_init(|| Arc::new(StaticAuthorizer::new(true, true))))
}

/// Looks up a root authorizer by id: `allow`, `deny` or `manage`.
pub fn root_authorizer(id: &str) -> Option<Arc<dyn Authorizer>> {
	match id {
		ALLOW_ALL_ID => Some(allow_all()),
		DENY_ALL_ID => Some(deny_all()),
		MANAGE_ALL_ID => Some(manage_all()),
		_ => None,
	}
}

pub fn is_root_authorizer(id: &str) -> bool {
	matches!(id, ALLOW_ALL_ID | DENY_ALL_ID | MANAGE_ALL_ID)
}
