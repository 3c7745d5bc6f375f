// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use crate::access::EnforcementDecision;
use crate::authorizer::{Authorizer, Operation};
use crate::context::AuthorizerContext;

/// Consults authorizers in order and returns the first decision that is not
/// `Default`.
///
/// An empty chain, or one where every member defers, denies.
///
/// # Example
///
/// ```
/// use loom_acl_core::{allow_all, deny_all, AuthorizerContext, AuthorizerExt, ChainedAuthorizer};
///
/// let chain = ChainedAuthorizer::new(vec![deny_all(), allow_all()]);
/// assert!(!chain.key_read("foo", &AuthorizerContext::default()).is_allow());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ChainedAuthorizer {
	chain: Vec<Arc<dyn Authorizer>>,
}

impl ChainedAuthorizer {
	pub fn new(chain: Vec<Arc<dyn Authorizer>>) -> Self {
		Self { chain }
	}
}

impl Authorizer for ChainedAuthorizer {
	fn check(&self, op: Operation, segment: &str, ctx: &AuthorizerContext) -> EnforcementDecision {
		self.chain
			.iter()
			.map(|authz| authz.check(op, segment, ctx))
			.find(|decision| !decision.is_default())
			.unwrap_or(EnforcementDecision::Deny)
	}
}
