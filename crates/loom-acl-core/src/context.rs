// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde::{Deserialize, Serialize};

/// Per-request information passed through every authorizer call.
///
/// Only `peer` affects decisions in this crate. Namespace and partition are
/// carried for [`PolicyExtension`](crate::extension::PolicyExtension)
/// implementations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizerContext {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub peer: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub namespace: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub partition: Option<String>,
}

impl AuthorizerContext {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_peer(mut self, peer: impl Into<String>) -> Self {
		self.peer = Some(peer.into());
		self
	}

	pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
		self.namespace = Some(namespace.into());
		self
	}

	pub fn with_partition(mut self, partition: impl Into<String>) -> Self {
		self.partition = Some(partition.into());
		self
	}

	pub fn peer_or_empty(&self) -> &str {
		self.peer.as_deref().unwrap_or_default()
	}

	/// True when the request concerns resources imported from a peer cluster.
	pub fn is_peered(&self) -> bool {
		!self.peer_or_empty().is_empty()
	}
}
