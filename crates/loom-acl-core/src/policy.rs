// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The rule model: a parsed, not yet compiled, policy.
//!
//! Policies are written as JSON objects. Singleton resources take a level
//! string; prefix-matchable resources take an object keyed by selector:
//!
//! ```json
//! {
//!   "operator": "read",
//!   "key_prefix": { "app/": { "policy": "write" }, "app/secret/": { "policy": "deny" } },
//!   "service": { "web": { "policy": "write", "intentions": "read" } }
//! }
//! ```
//!
//! Access levels stay as strings here. They are checked by
//! [`PolicyRules::validate`] when parsed and converted to
//! [`AccessLevel`](crate::access::AccessLevel) at compile time.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};
use tracing::debug;

use crate::access::AccessLevel;
use crate::error::{AclError, Result};
use crate::extension::ExtensionRule;

/// A single selector rule for a category other than services.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Rule {
	#[serde(skip)]
	pub selector: String,
	pub policy: String,
	#[serde(flatten)]
	pub extension: ExtensionRule,
}

impl Rule {
	pub fn new(selector: impl Into<String>, policy: impl Into<String>) -> Self {
		Self {
			selector: selector.into(),
			policy: policy.into(),
			extension: ExtensionRule::default(),
		}
	}

	pub fn level(&self) -> AccessLevel {
		AccessLevel::from_policy_str(&self.policy)
	}
}

/// A service rule. `intentions` governs intentions whose destination is the
/// matched service; when absent it is derived from `policy`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ServiceRule {
	#[serde(skip)]
	pub selector: String,
	pub policy: String,
	#[serde(default)]
	pub intentions: Option<String>,
	#[serde(flatten)]
	pub extension: ExtensionRule,
}

impl ServiceRule {
	pub fn new(selector: impl Into<String>, policy: impl Into<String>) -> Self {
		Self {
			selector: selector.into(),
			policy: policy.into(),
			intentions: None,
			extension: ExtensionRule::default(),
		}
	}

	pub fn with_intentions(mut self, intentions: impl Into<String>) -> Self {
		self.intentions = Some(intentions.into());
		self
	}

	pub fn level(&self) -> AccessLevel {
		AccessLevel::from_policy_str(&self.policy)
	}

	pub fn intentions_level(&self) -> AccessLevel {
		self.intentions
			.as_deref()
			.map(AccessLevel::from_policy_str)
			.unwrap_or_default()
	}

	/// The intentions level this rule compiles to.
	pub fn effective_intentions(&self) -> &str {
		match self.intentions.as_deref() {
			Some(intentions) if !intentions.is_empty() => intentions,
			_ => match self.policy.as_str() {
				"read" | "write" => "read",
				_ => "deny",
			},
		}
	}
}

trait Selected {
	fn set_selector(&mut self, selector: String);
}

impl Selected for Rule {
	fn set_selector(&mut self, selector: String) {
		self.selector = selector;
	}
}

impl Selected for ServiceRule {
	fn set_selector(&mut self, selector: String) {
		self.selector = selector;
	}
}

fn keyed<'de, D, R>(deserializer: D) -> std::result::Result<Vec<R>, D::Error>
where
	D: Deserializer<'de>,
	R: Selected + Deserialize<'de>,
{
	let map = BTreeMap::<String, R>::deserialize(deserializer)?;
	Ok(map
		.into_iter()
		.map(|(selector, mut rule)| {
			rule.set_selector(selector);
			rule
		})
		.collect())
}

/// Every rule a policy grants, grouped by category.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PolicyRules {
	pub acl: Option<String>,
	#[serde(rename = "agent", deserialize_with = "keyed")]
	pub agents: Vec<Rule>,
	#[serde(rename = "agent_prefix", deserialize_with = "keyed")]
	pub agent_prefixes: Vec<Rule>,
	#[serde(rename = "key", deserialize_with = "keyed")]
	pub keys: Vec<Rule>,
	#[serde(rename = "key_prefix", deserialize_with = "keyed")]
	pub key_prefixes: Vec<Rule>,
	#[serde(rename = "node", deserialize_with = "keyed")]
	pub nodes: Vec<Rule>,
	#[serde(rename = "node_prefix", deserialize_with = "keyed")]
	pub node_prefixes: Vec<Rule>,
	#[serde(rename = "service", deserialize_with = "keyed")]
	pub services: Vec<ServiceRule>,
	#[serde(rename = "service_prefix", deserialize_with = "keyed")]
	pub service_prefixes: Vec<ServiceRule>,
	#[serde(rename = "session", deserialize_with = "keyed")]
	pub sessions: Vec<Rule>,
	#[serde(rename = "session_prefix", deserialize_with = "keyed")]
	pub session_prefixes: Vec<Rule>,
	#[serde(rename = "event", deserialize_with = "keyed")]
	pub events: Vec<Rule>,
	#[serde(rename = "event_prefix", deserialize_with = "keyed")]
	pub event_prefixes: Vec<Rule>,
	#[serde(rename = "query", deserialize_with = "keyed")]
	pub prepared_queries: Vec<Rule>,
	#[serde(rename = "query_prefix", deserialize_with = "keyed")]
	pub prepared_query_prefixes: Vec<Rule>,
	pub keyring: Option<String>,
	pub operator: Option<String>,
	pub mesh: Option<String>,
	pub peering: Option<String>,
}

fn is_policy_valid(policy: &str) -> bool {
	matches!(policy, "deny" | "read" | "write")
}

fn is_key_policy_valid(policy: &str) -> bool {
	policy == "list" || is_policy_valid(policy)
}

fn invalid_rule(kind: &str, selector: &str, policy: &str) -> AclError {
	AclError::InvalidPolicy {
		kind: kind.to_string(),
		detail: format!("{selector:?} => {policy:?}"),
	}
}

fn validate_rules(kind: &str, rules: &[Rule], valid: fn(&str) -> bool) -> Result<()> {
	match rules.iter().find(|r| !valid(&r.policy)) {
		Some(r) => Err(invalid_rule(kind, &r.selector, &r.policy)),
		None => Ok(()),
	}
}

fn validate_service_rules(kind: &str, rules: &[ServiceRule]) -> Result<()> {
	for rule in rules {
		if !is_policy_valid(&rule.policy) {
			return Err(invalid_rule(kind, &rule.selector, &rule.policy));
		}
		if let Some(intentions) = rule.intentions.as_deref() {
			if !intentions.is_empty() && !is_policy_valid(intentions) {
				return Err(invalid_rule(
					&format!("{kind} intentions"),
					&rule.selector,
					intentions,
				));
			}
		}
	}
	Ok(())
}

fn validate_scalar(kind: &str, value: &Option<String>) -> Result<()> {
	match value.as_deref() {
		Some(policy) if !policy.is_empty() && !is_policy_valid(policy) => {
			Err(AclError::InvalidPolicy {
				kind: kind.to_string(),
				detail: format!("{policy:?}"),
			})
		}
		_ => Ok(()),
	}
}

impl PolicyRules {
	/// Checks every level string. Keys additionally accept `list`.
	pub fn validate(&self) -> Result<()> {
		validate_scalar("acl", &self.acl)?;
		validate_rules("agent", &self.agents, is_policy_valid)?;
		validate_rules("agent_prefix", &self.agent_prefixes, is_policy_valid)?;
		validate_rules("key", &self.keys, is_key_policy_valid)?;
		validate_rules("key_prefix", &self.key_prefixes, is_key_policy_valid)?;
		validate_rules("node", &self.nodes, is_policy_valid)?;
		validate_rules("node_prefix", &self.node_prefixes, is_policy_valid)?;
		validate_service_rules("service", &self.services)?;
		validate_service_rules("service_prefix", &self.service_prefixes)?;
		validate_rules("session", &self.sessions, is_policy_valid)?;
		validate_rules("session_prefix", &self.session_prefixes, is_policy_valid)?;
		validate_rules("event", &self.events, is_policy_valid)?;
		validate_rules("event_prefix", &self.event_prefixes, is_policy_valid)?;
		validate_rules("query", &self.prepared_queries, is_policy_valid)?;
		validate_rules("query_prefix", &self.prepared_query_prefixes, is_policy_valid)?;
		validate_scalar("keyring", &self.keyring)?;
		validate_scalar("operator", &self.operator)?;
		validate_scalar("mesh", &self.mesh)?;
		validate_scalar("peering", &self.peering)?;
		Ok(())
	}

	/// Total number of selector rules across all categories.
	pub fn rule_count(&self) -> usize {
		[
			&self.agents,
			&self.agent_prefixes,
			&self.keys,
			&self.key_prefixes,
			&self.nodes,
			&self.node_prefixes,
			&self.sessions,
			&self.session_prefixes,
			&self.events,
			&self.event_prefixes,
			&self.prepared_queries,
			&self.prepared_query_prefixes,
		]
		.iter()
		.map(|rules| rules.len())
		.sum::<usize>()
			+ self.services.len()
			+ self.service_prefixes.len()
	}
}

/// A named, versioned set of rules.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Policy {
	pub id: String,
	pub revision: u64,
	pub rules: PolicyRules,
}

impl Policy {
	pub fn new(id: impl Into<String>, revision: u64, rules: PolicyRules) -> Self {
		Self {
			id: id.into(),
			revision,
			rules,
		}
	}

	/// Parses and validates JSON rule text.
	///
	/// Empty (or whitespace-only) text yields a policy with no rules.
	///
	/// # Example
	///
	/// ```
	/// use loom_acl_core::Policy;
	///
	/// let policy = Policy::from_json("ops", 1, r#"{"operator": "read"}"#).unwrap();
	/// assert_eq!(policy.rules.operator.as_deref(), Some("read"));
	///
	/// assert!(Policy::from_json("bad", 1, r#"{"operator": "admin"}"#).is_err());
	/// ```
	pub fn from_json(id: impl Into<String>, revision: u64, source: &str) -> Result<Self> {
		let id = id.into();
		if source.trim().is_empty() {
			return Ok(Self::new(id, revision, PolicyRules::default()));
		}

		let rules: PolicyRules = serde_json::from_str(source)?;
		rules.validate()?;
		debug!(policy_id = %id, revision, rules = rules.rule_count(), "parsed policy");
		Ok(Self::new(id, revision, rules))
	}
}
