// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Merging several policies held by one subject into a single rule model.
//!
//! For every scalar and every selector the level ranked highest by
//! `deny > write > list > read > unset` wins. On ties the value seen first
//! is kept. Service intentions are merged separately from
//! the service level.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use sha2::{Digest, Sha256};

use crate::access::AccessLevel;
use crate::policy::{Policy, PolicyRules, Rule, ServiceRule};

/// Content identity of an ordered list of policies.
///
/// Hashes each policy's id followed by its revision as big-endian bytes.
pub fn multi_policy_id(policies: &[Policy]) -> String {
	let mut hasher = Sha256::new();
	for policy in policies {
		hasher.update(policy.id.as_bytes());
		hasher.update(policy.revision.to_be_bytes());
	}
	hex::encode(hasher.finalize())
}

fn merge_scalar(merged: &mut Option<String>, candidate: &Option<String>) {
	let current = merged
		.as_deref()
		.map(AccessLevel::from_policy_str)
		.unwrap_or_default();
	let next = candidate
		.as_deref()
		.map(AccessLevel::from_policy_str)
		.unwrap_or_default();
	if next.takes_precedence_over(current) {
		merged.clone_from(candidate);
	}
}

fn merge_rules(merged: &mut BTreeMap<String, Rule>, rules: &[Rule]) {
	for rule in rules {
		match merged.entry(rule.selector.clone()) {
			Entry::Vacant(slot) => {
				slot.insert(rule.clone());
			}
			Entry::Occupied(mut slot) => {
				if rule.level().takes_precedence_over(slot.get().level()) {
					slot.insert(rule.clone());
				}
			}
		}
	}
}

fn merge_service_rules(merged: &mut BTreeMap<String, ServiceRule>, rules: &[ServiceRule]) {
	for rule in rules {
		match merged.entry(rule.selector.clone()) {
			Entry::Vacant(slot) => {
				slot.insert(rule.clone());
			}
			Entry::Occupied(mut slot) => {
				let existing = slot.get_mut();
				if rule.level().takes_precedence_over(existing.level()) {
					existing.policy.clone_from(&rule.policy);
					existing.extension.clone_from(&rule.extension);
				}
				if rule.intentions_level().takes_precedence_over(existing.intentions_level()) {
					existing.intentions.clone_from(&rule.intentions);
				}
			}
		}
	}
}

#[derive(Default)]
struct Merger {
	acl: Option<String>,
	keyring: Option<String>,
	operator: Option<String>,
	mesh: Option<String>,
	peering: Option<String>,
	agents: BTreeMap<String, Rule>,
	agent_prefixes: BTreeMap<String, Rule>,
	keys: BTreeMap<String, Rule>,
	key_prefixes: BTreeMap<String, Rule>,
	nodes: BTreeMap<String, Rule>,
	node_prefixes: BTreeMap<String, Rule>,
	services: BTreeMap<String, ServiceRule>,
	service_prefixes: BTreeMap<String, ServiceRule>,
	sessions: BTreeMap<String, Rule>,
	session_prefixes: BTreeMap<String, Rule>,
	events: BTreeMap<String, Rule>,
	event_prefixes: BTreeMap<String, Rule>,
	prepared_queries: BTreeMap<String, Rule>,
	prepared_query_prefixes: BTreeMap<String, Rule>,
}

impl Merger {
	fn add(&mut self, rules: &PolicyRules) {
		merge_scalar(&mut self.acl, &rules.acl);
		merge_scalar(&mut self.keyring, &rules.keyring);
		merge_scalar(&mut self.operator, &rules.operator);
		merge_scalar(&mut self.mesh, &rules.mesh);
		merge_scalar(&mut self.peering, &rules.peering);
		merge_rules(&mut self.agents, &rules.agents);
		merge_rules(&mut self.agent_prefixes, &rules.agent_prefixes);
		merge_rules(&mut self.keys, &rules.keys);
		merge_rules(&mut self.key_prefixes, &rules.key_prefixes);
		merge_rules(&mut self.nodes, &rules.nodes);
		merge_rules(&mut self.node_prefixes, &rules.node_prefixes);
		merge_service_rules(&mut self.services, &rules.services);
		merge_service_rules(&mut self.service_prefixes, &rules.service_prefixes);
		merge_rules(&mut self.sessions, &rules.sessions);
		merge_rules(&mut self.session_prefixes, &rules.session_prefixes);
		merge_rules(&mut self.events, &rules.events);
		merge_rules(&mut self.event_prefixes, &rules.event_prefixes);
		merge_rules(&mut self.prepared_queries, &rules.prepared_queries);
		merge_rules(
			&mut self.prepared_query_prefixes,
			&rules.prepared_query_prefixes,
		);
	}

	fn finish(self) -> PolicyRules {
		PolicyRules {
			acl: self.acl,
			agents: self.agents.into_values().collect(),
			agent_prefixes: self.agent_prefixes.into_values().collect(),
			keys: self.keys.into_values().collect(),
			key_prefixes: self.key_prefixes.into_values().collect(),
			nodes: self.nodes.into_values().collect(),
			node_prefixes: self.node_prefixes.into_values().collect(),
			services: self.services.into_values().collect(),
			service_prefixes: self.service_prefixes.into_values().collect(),
			sessions: self.sessions.into_values().collect(),
			session_prefixes: self.session_prefixes.into_values().collect(),
			events: self.events.into_values().collect(),
			event_prefixes: self.event_prefixes.into_values().collect(),
			prepared_queries: self.prepared_queries.into_values().collect(),
			prepared_query_prefixes: self.prepared_query_prefixes.into_values().collect(),
			keyring: self.keyring,
			operator: self.operator,
			mesh: self.mesh,
			peering: self.peering,
		}
	}
}

/// Merges rule sets, keeping the highest-precedence level per field and
/// per selector. Rules in the result are sorted by selector.
pub fn merge_rules_of<'a>(rules: impl IntoIterator<Item = &'a PolicyRules>) -> PolicyRules {
	let mut merger = Merger::default();
	for r in rules {
		merger.add(r);
	}
	merger.finish()
}

/// Merges policies into one whose id is [`multi_policy_id`] of the inputs.
///
/// # Example
///
/// ```
/// use loom_acl_core::{merge_policies, Policy};
///
/// let a = Policy::from_json("a", 1, r#"{"operator": "write"}"#).unwrap();
/// let b = Policy::from_json("b", 1, r#"{"operator": "deny"}"#).unwrap();
/// let merged = merge_policies(&[a, b]);
/// assert_eq!(merged.rules.operator.as_deref(), Some("deny"));
/// ```
pub fn merge_policies(policies: &[Policy]) -> Policy {
	Policy {
		id: multi_policy_id(policies),
		revision: 0,
		rules: merge_rules_of(policies.iter().map(|p| &p.rules)),
	}
}
