// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Extension seam for deployment-specific rule attributes.
//!
//! Rules may carry extra attributes beyond their access level. The engine
//! stores them verbatim in an [`ExtensionRule`] and hands them to the
//! configured [`PolicyExtension`] where a decision can be refined. The
//! default [`NoopExtension`] never has an opinion.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::access::EnforcementDecision;
use crate::context::AuthorizerContext;

/// Opaque attributes attached to a rule, kept in key order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtensionRule {
	#[serde(flatten)]
	pub fields: BTreeMap<String, serde_json::Value>,
}

impl ExtensionRule {
	pub fn is_empty(&self) -> bool {
		self.fields.is_empty()
	}

	pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
		self.fields.get(key)
	}

	pub fn with_field(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
		self.fields.insert(key.into(), value);
		self
	}
}

/// Refines decisions using [`ExtensionRule`] attributes.
///
/// Returning `Default` means the extension has no opinion. Key writes treat
/// that as allowed.
pub trait PolicyExtension: Send + Sync + fmt::Debug {
	fn enforce(&self, rule: &ExtensionRule, ctx: &AuthorizerContext) -> EnforcementDecision;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopExtension;

impl PolicyExtension for NoopExtension {
	fn enforce(&self, _rule: &ExtensionRule, _ctx: &AuthorizerContext) -> EnforcementDecision {
		EnforcementDecision::Default
	}
}

/// Construction-time options for compiled authorizers.
#[derive(Debug, Clone)]
pub struct AuthorizerConfig {
	pub extension: Arc<dyn PolicyExtension>,
}

impl AuthorizerConfig {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_extension(mut self, extension: Arc<dyn PolicyExtension>) -> Self {
		self.extension = extension;
		self
	}
}

impl Default for AuthorizerConfig {
	fn default() -> Self {
		Self {
			extension: Arc::new(NoopExtension),
		}
	}
}
