// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Compiled policy authorizer.
//!
//! Each prefix-matchable category is compiled into a [`PrefixTree`] whose
//! nodes hold at most one exact rule and one prefix rule. A lookup walks
//! from the root towards the requested name: an exact rule on the name
//! itself wins, otherwise the longest prefix rule seen on the way applies.
//! A policy that has nothing to say answers `Default`.

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::access::{default_is_allow, enforce, AccessLevel, EnforcementDecision};
use crate::authorizer::{Authorizer, Operation};
use crate::chained::ChainedAuthorizer;
use crate::context::AuthorizerContext;
use crate::error::Result;
use crate::extension::{AuthorizerConfig, ExtensionRule, PolicyExtension};
use crate::merge::merge_rules_of;
use crate::policy::{Policy, PolicyRules, Rule, ServiceRule};
use crate::tree::PrefixTree;

#[derive(Debug, Clone)]
struct CompiledRule {
	access: AccessLevel,
	extension: ExtensionRule,
}

impl CompiledRule {
	fn compile(policy: &str, extension: &ExtensionRule) -> Result<Self> {
		Ok(Self {
			access: policy.parse()?,
			extension: extension.clone(),
		})
	}
}

#[derive(Debug, Clone, Default)]
struct RuleNode {
	exact: Option<CompiledRule>,
	prefix: Option<CompiledRule>,
}

type RuleTree = PrefixTree<RuleNode>;

fn insert_rule(
	tree: &mut RuleTree,
	selector: &str,
	policy: &str,
	extension: &ExtensionRule,
	prefix: bool,
) -> Result<()> {
	let rule = CompiledRule::compile(policy, extension).inspect_err(|err| {
		warn!(selector, policy, error = %err, "rejecting rule with invalid access level");
	})?;
	let node = tree.get_or_insert_with(selector, RuleNode::default);
	if prefix {
		node.prefix = Some(rule);
	} else {
		node.exact = Some(rule);
	}
	Ok(())
}

fn load_rules(tree: &mut RuleTree, rules: &[Rule], prefix: bool) -> Result<()> {
	for rule in rules {
		insert_rule(tree, &rule.selector, &rule.policy, &rule.extension, prefix)?;
	}
	Ok(())
}

fn load_service_rules(
	services: &mut RuleTree,
	intentions: &mut RuleTree,
	rules: &[ServiceRule],
	prefix: bool,
) -> Result<()> {
	for rule in rules {
		insert_rule(services, &rule.selector, &rule.policy, &rule.extension, prefix)?;
		insert_rule(
			intentions,
			&rule.selector,
			rule.effective_intentions(),
			&rule.extension,
			prefix,
		)?;
	}
	Ok(())
}

fn compile_scalar(policy: &Option<String>) -> Result<Option<CompiledRule>> {
	match policy.as_deref() {
		Some(level) if !level.is_empty() => {
			CompiledRule::compile(level, &ExtensionRule::default()).map(Some)
		}
		_ => Ok(None),
	}
}

/// The rule that governs `segment`: an exact rule on `segment` itself,
/// otherwise the longest prefix rule on the path to it.
fn get_policy<'a>(tree: &'a RuleTree, segment: &str) -> Option<&'a CompiledRule> {
	let mut found = None;
	for (path, node) in tree.walk_path(segment) {
		if path == segment {
			if let Some(exact) = &node.exact {
				return Some(exact);
			}
		}
		if let Some(prefix) = &node.prefix {
			found = Some(prefix);
		}
	}
	found
}

fn scalar_decision(rule: &Option<CompiledRule>, required: AccessLevel) -> EnforcementDecision {
	rule.as_ref()
		.map(|r| enforce(r.access, required))
		.unwrap_or(EnforcementDecision::Default)
}

fn tree_decision(tree: &RuleTree, segment: &str, required: AccessLevel) -> EnforcementDecision {
	get_policy(tree, segment)
		.map(|r| enforce(r.access, required))
		.unwrap_or(EnforcementDecision::Default)
}

fn prefix_decision(node: &RuleNode, required: AccessLevel) -> EnforcementDecision {
	node.prefix
		.as_ref()
		.map(|r| enforce(r.access, required))
		.unwrap_or(EnforcementDecision::Default)
}

/// Allow if any rule in `tree` would allow `required`.
///
/// A catch-all (`""`) prefix rule that allows settles the question at once.
/// When nothing allows, the catch-all's own decision is returned.
fn any_allowed(tree: &RuleTree, required: AccessLevel) -> EnforcementDecision {
	let mut decision = EnforcementDecision::Default;
	if let Some(root) = tree.get("") {
		decision = prefix_decision(root, required);
		if decision.is_allow() {
			return EnforcementDecision::Allow;
		}
	}

	let allows = |node: &RuleNode| {
		let decision = prefix_decision(node, required);
		if decision.is_allow() {
			return true;
		}
		node.exact
			.as_ref()
			.is_some_and(|r| enforce(r.access, required).is_allow())
	};

	if tree.walk().any(|(_, node)| allows(node)) {
		return EnforcementDecision::Allow;
	}
	decision
}

/// Deny if any rule in `tree` would deny `required`.
///
/// A catch-all (`""`) prefix rule that denies settles the question at once.
/// When nothing denies, the catch-all's own decision is returned.
fn all_allowed(tree: &RuleTree, required: AccessLevel) -> EnforcementDecision {
	let mut decision = EnforcementDecision::Default;
	if let Some(root) = tree.get("") {
		decision = prefix_decision(root, required);
		if decision == EnforcementDecision::Deny {
			return EnforcementDecision::Deny;
		}
	}

	let denies = |node: &RuleNode| {
		prefix_decision(node, required) == EnforcementDecision::Deny
			|| node
				.exact
				.as_ref()
				.is_some_and(|r| enforce(r.access, required) == EnforcementDecision::Deny)
	};

	if tree.walk().any(|(_, node)| denies(node)) {
		return EnforcementDecision::Deny;
	}
	decision
}

/// Decisions for one compiled policy (or a merged set of policies).
#[derive(Debug)]
pub struct PolicyAuthorizer {
	acl_rule: Option<CompiledRule>,
	agent_rules: RuleTree,
	intention_rules: RuleTree,
	key_rules: RuleTree,
	node_rules: RuleTree,
	service_rules: RuleTree,
	session_rules: RuleTree,
	event_rules: RuleTree,
	prepared_query_rules: RuleTree,
	keyring_rule: Option<CompiledRule>,
	operator_rule: Option<CompiledRule>,
	mesh_rule: Option<CompiledRule>,
	peering_rule: Option<CompiledRule>,
	extension: Arc<dyn PolicyExtension>,
}

impl PolicyAuthorizer {
	/// Merges `policies` and compiles the result.
	pub fn new(policies: &[Policy], config: &AuthorizerConfig) -> Result<Self> {
		let merged = merge_rules_of(policies.iter().map(|p| &p.rules));
		Self::from_rules(&merged, config)
	}

	/// Compiles a single rule set.
	///
	/// Fails on the first access level string that is not `deny`, `read`,
	/// `list` or `write`. Within one category a later rule for the same
	/// selector replaces an earlier one.
	#[instrument(level = "debug", skip(rules, config), fields(rules = rules.rule_count()))]
	pub fn from_rules(rules: &PolicyRules, config: &AuthorizerConfig) -> Result<Self> {
		let mut authz = Self {
			acl_rule: None,
			agent_rules: RuleTree::new(),
			intention_rules: RuleTree::new(),
			key_rules: RuleTree::new(),
			node_rules: RuleTree::new(),
			service_rules: RuleTree::new(),
			session_rules: RuleTree::new(),
			event_rules: RuleTree::new(),
			prepared_query_rules: RuleTree::new(),
			keyring_rule: None,
			operator_rule: None,
			mesh_rule: None,
			peering_rule: None,
			extension: Arc::clone(&config.extension),
		};
		authz.load(rules)?;

		debug!(
			agents = authz.agent_rules.len(),
			intentions = authz.intention_rules.len(),
			keys = authz.key_rules.len(),
			nodes = authz.node_rules.len(),
			services = authz.service_rules.len(),
			sessions = authz.session_rules.len(),
			events = authz.event_rules.len(),
			queries = authz.prepared_query_rules.len(),
			"compiled policy authorizer"
		);
		Ok(authz)
	}

	/// Compiles `policies` and chains the result in front of `default`, so
	/// that requests the policies say nothing about fall through to it.
	///
	/// # Example
	///
	/// ```
	/// use loom_acl_core::{
	///     deny_all, AuthorizerConfig, AuthorizerContext, AuthorizerExt, Policy, PolicyAuthorizer,
	/// };
	///
	/// let policy = Policy::from_json("p", 1, r#"{"key_prefix": {"app/": {"policy": "read"}}}"#)
	///     .unwrap();
	/// let authz =
	///     PolicyAuthorizer::with_defaults(deny_all(), &[policy], &AuthorizerConfig::default())
	///         .unwrap();
	///
	/// let ctx = AuthorizerContext::default();
	/// assert!(authz.key_read("app/config", &ctx).is_allow());
	/// assert!(!authz.key_read("other", &ctx).is_allow());
	/// ```
	pub fn with_defaults(
		default: Arc<dyn Authorizer>,
		policies: &[Policy],
		config: &AuthorizerConfig,
	) -> Result<ChainedAuthorizer> {
		let compiled: Arc<dyn Authorizer> = Arc::new(Self::new(policies, config)?);
		Ok(ChainedAuthorizer::new(vec![compiled, default]))
	}

	fn load(&mut self, rules: &PolicyRules) -> Result<()> {
		load_rules(&mut self.agent_rules, &rules.agents, false)?;
		load_rules(&mut self.agent_rules, &rules.agent_prefixes, true)?;
		load_rules(&mut self.key_rules, &rules.keys, false)?;
		load_rules(&mut self.key_rules, &rules.key_prefixes, true)?;
		load_rules(&mut self.node_rules, &rules.nodes, false)?;
		load_rules(&mut self.node_rules, &rules.node_prefixes, true)?;
		load_service_rules(
			&mut self.service_rules,
			&mut self.intention_rules,
			&rules.services,
			false,
		)?;
		load_service_rules(
			&mut self.service_rules,
			&mut self.intention_rules,
			&rules.service_prefixes,
			true,
		)?;
		load_rules(&mut self.session_rules, &rules.sessions, false)?;
		load_rules(&mut self.session_rules, &rules.session_prefixes, true)?;
		load_rules(&mut self.event_rules, &rules.events, false)?;
		load_rules(&mut self.event_rules, &rules.event_prefixes, true)?;
		load_rules(&mut self.prepared_query_rules, &rules.prepared_queries, false)?;
		load_rules(
			&mut self.prepared_query_rules,
			&rules.prepared_query_prefixes,
			true,
		)?;

		self.acl_rule = compile_scalar(&rules.acl)?;
		self.keyring_rule = compile_scalar(&rules.keyring)?;
		self.operator_rule = compile_scalar(&rules.operator)?;
		self.mesh_rule = compile_scalar(&rules.mesh)?;
		self.peering_rule = compile_scalar(&rules.peering)?;
		Ok(())
	}

	fn decide_key_write(&self, key: &str, ctx: &AuthorizerContext) -> EnforcementDecision {
		match get_policy(&self.key_rules, key) {
			Some(rule) => match enforce(rule.access, AccessLevel::Write) {
				EnforcementDecision::Allow => {
					default_is_allow(self.extension.enforce(&rule.extension, ctx))
				}
				other => other,
			},
			None => EnforcementDecision::Default,
		}
	}

	/// Write access to everything under `prefix`.
	///
	/// The longest prefix rule on the path to `prefix` must grant write, and
	/// no rule at or below `prefix` may grant less. Without an applicable
	/// prefix rule and with nothing below objecting the answer is `Default`.
	fn decide_key_write_prefix(&self, prefix: &str) -> EnforcementDecision {
		let mut base = EnforcementDecision::Default;
		for (_, node) in self.key_rules.walk_path(prefix) {
			if let Some(rule) = &node.prefix {
				base = EnforcementDecision::from_bool(rule.access == AccessLevel::Write);
			}
		}
		if base == EnforcementDecision::Deny {
			return EnforcementDecision::Deny;
		}

		let objects = |rule: &Option<CompiledRule>| {
			rule.as_ref()
				.is_some_and(|r| r.access != AccessLevel::Write)
		};
		if self
			.key_rules
			.walk_prefix(prefix)
			.any(|(_, node)| objects(&node.prefix) || objects(&node.exact))
		{
			return EnforcementDecision::Deny;
		}

		base
	}

	/// Reads of nodes and services imported from a peer are allowed for
	/// locally authenticated services (write on any service) and for callers
	/// that may read every local resource of that kind.
	fn peered_read(&self, read_all: Operation) -> EnforcementDecision {
		if any_allowed(&self.service_rules, AccessLevel::Write).is_allow() {
			return EnforcementDecision::Allow;
		}
		self.check(read_all, "", &AuthorizerContext::default())
	}
}

impl Authorizer for PolicyAuthorizer {
	fn check(&self, op: Operation, segment: &str, ctx: &AuthorizerContext) -> EnforcementDecision {
		use Operation::*;
		let required = op.access();
		match op {
			AclRead | AclWrite | Snapshot => scalar_decision(&self.acl_rule, required),
			KeyringRead | KeyringWrite => scalar_decision(&self.keyring_rule, required),
			OperatorRead | OperatorWrite => scalar_decision(&self.operator_rule, required),
			MeshRead | MeshWrite => match &self.mesh_rule {
				Some(rule) => enforce(rule.access, required),
				None => scalar_decision(&self.operator_rule, required),
			},
			PeeringRead | PeeringWrite => match &self.peering_rule {
				Some(rule) => enforce(rule.access, required),
				None => scalar_decision(&self.operator_rule, required),
			},

			AgentRead | AgentWrite => tree_decision(&self.agent_rules, segment, required),
			EventRead | EventWrite => tree_decision(&self.event_rules, segment, required),
			SessionRead | SessionWrite => tree_decision(&self.session_rules, segment, required),
			PreparedQueryRead | PreparedQueryWrite => {
				tree_decision(&self.prepared_query_rules, segment, required)
			}

			// Decided further up the chain.
			IntentionDefaultAllow => EnforcementDecision::Default,
			IntentionRead if segment == "*" => any_allowed(&self.intention_rules, required),
			IntentionWrite if segment == "*" => all_allowed(&self.intention_rules, required),
			IntentionRead | IntentionWrite => {
				tree_decision(&self.intention_rules, segment, required)
			}

			KeyRead | KeyList => tree_decision(&self.key_rules, segment, required),
			KeyWrite => self.decide_key_write(segment, ctx),
			KeyWritePrefix => self.decide_key_write_prefix(segment),

			NodeRead if ctx.is_peered() => self.peered_read(NodeReadAll),
			NodeRead | NodeWrite => tree_decision(&self.node_rules, segment, required),
			NodeReadAll => all_allowed(&self.node_rules, required),

			ServiceRead if ctx.is_peered() => self.peered_read(ServiceReadAll),
			ServiceRead | ServiceWrite => tree_decision(&self.service_rules, segment, required),
			ServiceReadAll => all_allowed(&self.service_rules, required),
			ServiceWriteAny => any_allowed(&self.service_rules, required),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::authorizer::AuthorizerExt;
	use crate::static_authorizer::allow_all;
	use proptest::prelude::*;

	use EnforcementDecision::{Allow, Default as Defer, Deny};

	fn compile(rules: PolicyRules) -> PolicyAuthorizer {
		PolicyAuthorizer::from_rules(&rules, &AuthorizerConfig::default()).unwrap()
	}

	fn ctx() -> AuthorizerContext {
		AuthorizerContext::default()
	}

	mod lookup {
		use super::*;

		#[test]
		fn test_empty_policy_has_no_opinion() {
			let authz = compile(PolicyRules::default());
			for op in Operation::ALL {
				assert_eq!(authz.check(op, "anything", &ctx()), Defer, "{op:?}");
			}
		}

		#[test]
		fn test_prefer_exact_matches() {
			let authz = compile(PolicyRules {
				agents: vec![Rule::new("foo", "write")],
				agent_prefixes: vec![Rule::new("foo", "read"), Rule::new("", "deny")],
				..Default::default()
			});

			assert_eq!(authz.agent_write("foo", &ctx()), Allow);
			assert_eq!(authz.agent_write("foobar", &ctx()), Deny);
			assert_eq!(authz.agent_read("foobar", &ctx()), Allow);
			assert_eq!(authz.agent_read("bar", &ctx()), Deny);
		}

		#[test]
		fn test_exact_wins_regardless_of_load_order() {
			let authz = compile(PolicyRules {
				key_prefixes: vec![Rule::new("foo", "deny")],
				keys: vec![Rule::new("foo", "write")],
				..Default::default()
			});
			assert_eq!(authz.key_write("foo", &ctx()), Allow);
			assert_eq!(authz.key_write("foo2", &ctx()), Deny);
		}

		#[test]
		fn test_exact_rule_does_not_apply_to_descendants() {
			let authz = compile(PolicyRules {
				keys: vec![Rule::new("foo", "deny")],
				key_prefixes: vec![Rule::new("", "read")],
				..Default::default()
			});
			assert_eq!(authz.key_read("foo", &ctx()), Deny);
			assert_eq!(authz.key_read("foo/bar", &ctx()), Allow);
		}

		#[test]
		fn test_longest_prefix_wins() {
			let authz = compile(PolicyRules {
				key_prefixes: vec![
					Rule::new("", "read"),
					Rule::new("foo/", "write"),
					Rule::new("foo/priv/", "deny"),
				],
				..Default::default()
			});
			assert_eq!(authz.key_write("foo/a", &ctx()), Allow);
			assert_eq!(authz.key_read("foo/priv/a", &ctx()), Deny);
			assert_eq!(authz.key_write("bar", &ctx()), Deny);
			assert_eq!(authz.key_read("bar", &ctx()), Allow);
		}

		#[test]
		fn test_later_rule_for_same_selector_overwrites() {
			let authz = compile(PolicyRules {
				nodes: vec![Rule::new("n1", "read"), Rule::new("n1", "write")],
				..Default::default()
			});
			assert_eq!(authz.node_write("n1", &ctx()), Allow);
		}

		#[test]
		fn test_key_list() {
			let authz = compile(PolicyRules {
				key_prefixes: vec![Rule::new("foo/", "list"), Rule::new("bar/", "read")],
				..Default::default()
			});
			assert_eq!(authz.key_list("foo/x", &ctx()), Allow);
			assert_eq!(authz.key_read("foo/x", &ctx()), Allow);
			assert_eq!(authz.key_write("foo/x", &ctx()), Deny);
			assert_eq!(authz.key_list("bar/x", &ctx()), Deny);
		}

		#[test]
		fn test_invalid_level_fails_compilation() {
			let result = PolicyAuthorizer::from_rules(
				&PolicyRules {
					sessions: vec![Rule::new("s", "admin")],
					..Default::default()
				},
				&AuthorizerConfig::default(),
			);
			assert!(matches!(
				result,
				Err(crate::AclError::InvalidAccessLevel(ref level)) if level == "admin"
			));

			let result = PolicyAuthorizer::from_rules(
				&PolicyRules {
					operator: Some("full".into()),
					..Default::default()
				},
				&AuthorizerConfig::default(),
			);
			assert!(result.is_err());
		}
	}

	mod scalars {
		use super::*;

		#[test]
		fn test_acl_and_snapshot() {
			let read = compile(PolicyRules {
				acl: Some("read".into()),
				..Default::default()
			});
			assert_eq!(read.acl_read(&ctx()), Allow);
			assert_eq!(read.acl_write(&ctx()), Deny);
			assert_eq!(read.snapshot(&ctx()), Deny);

			let write = compile(PolicyRules {
				acl: Some("write".into()),
				..Default::default()
			});
			assert_eq!(write.snapshot(&ctx()), Allow);
		}

		#[test]
		fn test_mesh_and_peering_fall_back_to_operator() {
			let authz = compile(PolicyRules {
				operator: Some("write".into()),
				..Default::default()
			});
			assert_eq!(authz.mesh_write(&ctx()), Allow);
			assert_eq!(authz.peering_write(&ctx()), Allow);

			let authz = compile(PolicyRules {
				operator: Some("write".into()),
				mesh: Some("read".into()),
				peering: Some("deny".into()),
				..Default::default()
			});
			assert_eq!(authz.mesh_read(&ctx()), Allow);
			assert_eq!(authz.mesh_write(&ctx()), Deny);
			assert_eq!(authz.peering_read(&ctx()), Deny);
			assert_eq!(authz.operator_write(&ctx()), Allow);
		}

		#[test]
		fn test_keyring() {
			let authz = compile(PolicyRules {
				keyring: Some("read".into()),
				..Default::default()
			});
			assert_eq!(authz.keyring_read(&ctx()), Allow);
			assert_eq!(authz.keyring_write(&ctx()), Deny);
		}

		#[test]
		fn test_intention_default_allow_is_never_decided() {
			let authz = compile(PolicyRules {
				acl: Some("write".into()),
				operator: Some("write".into()),
				service_prefixes: vec![ServiceRule::new("", "write")],
				..Default::default()
			});
			assert_eq!(authz.intention_default_allow(&ctx()), Defer);
		}
	}

	mod key_write_prefix {
		use super::*;

		fn scenario() -> PolicyAuthorizer {
			compile(PolicyRules {
				key_prefixes: vec![
					Rule::new("foo/", "write"),
					Rule::new("foo/priv/", "deny"),
					Rule::new("bar/", "deny"),
					Rule::new("zip/", "read"),
				],
				..Default::default()
			})
		}

		#[test]
		fn test_subtree_with_deny_is_denied() {
			let authz = scenario();
			assert_eq!(authz.key_write_prefix("", &ctx()), Deny);
			assert_eq!(authz.key_write_prefix("foo/", &ctx()), Deny);
			assert_eq!(authz.key_write_prefix("foo/pub/", &ctx()), Allow);
			assert_eq!(authz.key_write_prefix("zip/", &ctx()), Deny);
		}

		#[test]
		fn test_no_applicable_rule_is_default() {
			let authz = scenario();
			assert_eq!(authz.key_write_prefix("nothing/", &ctx()), Defer);
		}

		#[test]
		fn test_exact_rule_below_prefix_objects() {
			let authz = compile(PolicyRules {
				key_prefixes: vec![Rule::new("app/", "write")],
				keys: vec![Rule::new("app/lock", "read")],
				..Default::default()
			});
			assert_eq!(authz.key_write_prefix("app/", &ctx()), Deny);
			assert_eq!(authz.key_write_prefix("app/other/", &ctx()), Allow);
		}

		#[test]
		fn test_exact_rule_on_path_is_not_a_base() {
			let authz = compile(PolicyRules {
				keys: vec![Rule::new("app", "write")],
				..Default::default()
			});
			assert_eq!(authz.key_write_prefix("app/x", &ctx()), Defer);
		}

		#[test]
		fn test_write_everywhere_allows_root() {
			let authz = compile(PolicyRules {
				key_prefixes: vec![Rule::new("", "write"), Rule::new("a/", "write")],
				keys: vec![Rule::new("a/b", "write")],
				..Default::default()
			});
			assert_eq!(authz.key_write_prefix("", &ctx()), Allow);
		}
	}

	mod aggregation {
		use super::*;

		#[test]
		fn test_catch_all_deny_with_child_write() {
			let authz = compile(PolicyRules {
				service_prefixes: vec![ServiceRule::new("", "deny"), ServiceRule::new("foo", "write")],
				..Default::default()
			});
			assert_eq!(any_allowed(&authz.service_rules, AccessLevel::Write), Allow);
			assert_eq!(all_allowed(&authz.service_rules, AccessLevel::Write), Deny);
			assert_eq!(authz.service_write_any(&ctx()), Allow);
			assert_eq!(authz.service_read_all(&ctx()), Deny);
		}

		#[test]
		fn test_catch_all_allow_short_circuits_any() {
			let authz = compile(PolicyRules {
				node_prefixes: vec![Rule::new("", "read"), Rule::new("secret", "deny")],
				..Default::default()
			});
			assert_eq!(any_allowed(&authz.node_rules, AccessLevel::Read), Allow);
			assert_eq!(authz.node_read_all(&ctx()), Deny);
		}

		#[test]
		fn test_any_returns_catch_all_decision_when_nothing_allows() {
			let authz = compile(PolicyRules {
				node_prefixes: vec![Rule::new("", "deny"), Rule::new("a", "read")],
				..Default::default()
			});
			assert_eq!(any_allowed(&authz.node_rules, AccessLevel::Write), Deny);
		}

		#[test]
		fn test_empty_tree_is_default() {
			let authz = compile(PolicyRules::default());
			assert_eq!(any_allowed(&authz.node_rules, AccessLevel::Read), Defer);
			assert_eq!(all_allowed(&authz.node_rules, AccessLevel::Read), Defer);
		}

		#[test]
		fn test_any_without_allowing_rule_or_catch_all_is_default() {
			let authz = compile(PolicyRules {
				nodes: vec![Rule::new("a", "deny")],
				services: vec![ServiceRule::new("web", "read")],
				..Default::default()
			});
			assert_eq!(any_allowed(&authz.node_rules, AccessLevel::Read), Defer);
			assert_eq!(authz.node_read_all(&ctx()), Deny);
			assert_eq!(any_allowed(&authz.service_rules, AccessLevel::Write), Defer);
			assert_eq!(authz.service_write_any(&ctx()), Defer);
		}

		#[test]
		fn test_all_allowed_without_catch_all_is_default() {
			let authz = compile(PolicyRules {
				nodes: vec![Rule::new("a", "read")],
				..Default::default()
			});
			assert_eq!(authz.node_read_all(&ctx()), Defer);
		}

		#[test]
		fn test_all_allowed_with_catch_all_read() {
			let authz = compile(PolicyRules {
				node_prefixes: vec![Rule::new("", "read")],
				nodes: vec![Rule::new("a", "write")],
				..Default::default()
			});
			assert_eq!(authz.node_read_all(&ctx()), Allow);
		}

		#[test]
		fn test_catch_all_exact_rule_is_not_a_catch_all() {
			let authz = compile(PolicyRules {
				nodes: vec![Rule::new("", "deny")],
				node_prefixes: vec![Rule::new("a", "read")],
				..Default::default()
			});
			assert_eq!(authz.node_read_all(&ctx()), Deny);
			assert_eq!(any_allowed(&authz.node_rules, AccessLevel::Read), Allow);
		}
	}

	mod intentions {
		use super::*;

		#[test]
		fn test_derived_from_service_policy() {
			let authz = compile(PolicyRules {
				services: vec![ServiceRule::new("web", "write"), ServiceRule::new("db", "deny")],
				service_prefixes: vec![ServiceRule::new("api", "read").with_intentions("write")],
				..Default::default()
			});
			assert_eq!(authz.intention_read("web", &ctx()), Allow);
			assert_eq!(authz.intention_write("web", &ctx()), Deny);
			assert_eq!(authz.intention_read("db", &ctx()), Deny);
			assert_eq!(authz.intention_write("api-v2", &ctx()), Allow);
			assert_eq!(authz.intention_read("other", &ctx()), Defer);
		}

		#[test]
		fn test_wildcard_uses_aggregation() {
			let authz = compile(PolicyRules {
				service_prefixes: vec![
					ServiceRule::new("", "read").with_intentions("write"),
					ServiceRule::new("db", "read").with_intentions("deny"),
				],
				..Default::default()
			});
			assert_eq!(authz.intention_read("*", &ctx()), Allow);
			assert_eq!(authz.intention_write("*", &ctx()), Deny);
		}
	}

	mod peering {
		use super::*;

		fn peered() -> AuthorizerContext {
			AuthorizerContext::default().with_peer("cluster-02")
		}

		#[test]
		fn test_service_write_on_any_service_allows_imported_reads() {
			let authz = compile(PolicyRules {
				services: vec![ServiceRule::new("web", "write")],
				..Default::default()
			});
			assert_eq!(authz.service_read("anything", &peered()), Allow);
			assert_eq!(authz.node_read("anything", &peered()), Allow);
		}

		#[test]
		fn test_read_all_allows_imported_reads() {
			let authz = compile(PolicyRules {
				service_prefixes: vec![ServiceRule::new("", "read")],
				node_prefixes: vec![Rule::new("", "read")],
				..Default::default()
			});
			assert_eq!(authz.service_read("imported", &peered()), Allow);
			assert_eq!(authz.node_read("imported", &peered()), Allow);
		}

		#[test]
		fn test_single_name_read_does_not_cover_imports() {
			let authz = compile(PolicyRules {
				services: vec![ServiceRule::new("web", "read")],
				nodes: vec![Rule::new("n1", "read")],
				..Default::default()
			});
			assert_eq!(authz.service_read("web", &ctx()), Allow);
			assert_eq!(authz.service_read("web", &peered()), Defer);
			assert_eq!(authz.node_read("n1", &peered()), Defer);
		}

		#[test]
		fn test_denied_subset_denies_imports() {
			let authz = compile(PolicyRules {
				node_prefixes: vec![Rule::new("", "read"), Rule::new("secret", "deny")],
				..Default::default()
			});
			assert_eq!(authz.node_read("imported", &peered()), Deny);
		}
	}

	mod extension {
		use super::*;

		#[derive(Debug)]
		struct RequireApproval;

		impl PolicyExtension for RequireApproval {
			fn enforce(&self, rule: &ExtensionRule, _ctx: &AuthorizerContext) -> EnforcementDecision {
				match rule.get("approved") {
					Some(serde_json::Value::Bool(false)) => Deny,
					Some(serde_json::Value::Bool(true)) => Allow,
					_ => Defer,
				}
			}
		}

		fn rules() -> PolicyRules {
			let blocked = Rule {
				extension: ExtensionRule::default().with_field("approved", serde_json::json!(false)),
				..Rule::new("locked/", "write")
			};
			PolicyRules {
				key_prefixes: vec![Rule::new("open/", "write"), blocked],
				..Default::default()
			}
		}

		#[test]
		fn test_extension_can_restrict_key_writes() {
			let config = AuthorizerConfig::default().with_extension(Arc::new(RequireApproval));
			let authz = PolicyAuthorizer::from_rules(&rules(), &config).unwrap();
			assert_eq!(authz.key_write("locked/a", &ctx()), Deny);
			assert_eq!(authz.key_write("open/a", &ctx()), Allow);
			assert_eq!(authz.key_read("locked/a", &ctx()), Allow);
		}

		#[test]
		fn test_noop_extension_keeps_write() {
			let authz = compile(rules());
			assert_eq!(authz.key_write("locked/a", &ctx()), Allow);
		}
	}

	mod chaining {
		use super::*;

		#[test]
		fn test_scenario_with_allow_all_parent() {
			let policy = Policy::new(
				"scenario",
				1,
				PolicyRules {
					key_prefixes: vec![
						Rule::new("foo/", "write"),
						Rule::new("foo/priv/", "deny"),
						Rule::new("bar/", "deny"),
						Rule::new("zip/", "read"),
					],
					..Default::default()
				},
			);
			let authz =
				PolicyAuthorizer::with_defaults(allow_all(), &[policy], &AuthorizerConfig::default())
					.unwrap();

			assert!(authz.key_read("zip/test", &ctx()).is_allow());
			assert!(!authz.key_write("zip/test", &ctx()).is_allow());
			assert!(authz.key_write_prefix("foo/test", &ctx()).is_allow());
			assert_eq!(authz.key_write_prefix("foo/", &ctx()), Deny);
			assert_eq!(authz.key_write_prefix("", &ctx()), Deny);
			assert!(authz.key_read("other", &ctx()).is_allow());
			assert!(authz.key_write_prefix("other", &ctx()).is_allow());
		}

		#[test]
		fn test_new_merges_policies() {
			let a = Policy::from_json("a", 1, r#"{"node_prefix": {"": {"policy": "write"}}}"#)
				.unwrap();
			let b = Policy::from_json("b", 1, r#"{"node_prefix": {"": {"policy": "deny"}}}"#)
				.unwrap();
			let authz = PolicyAuthorizer::new(&[a, b], &AuthorizerConfig::default()).unwrap();
			assert_eq!(authz.check(Operation::NodeWrite, "n", &ctx()), Deny);
		}
	}

	proptest! {
		#[test]
		fn prefix_rule_governs_undecorated_descendants(
			prefix in "[a-c/]{0,4}",
			suffix in "[a-c/]{0,4}",
			level in prop::sample::select(vec!["deny", "read", "list", "write"]),
			required in prop::sample::select(vec![AccessLevel::Read, AccessLevel::List, AccessLevel::Write]),
		) {
			let authz = compile(PolicyRules {
				key_prefixes: vec![Rule::new(prefix.clone(), level)],
				..Default::default()
			});
			let key = format!("{prefix}{suffix}");
			let expected = enforce(level.parse().unwrap(), required);
			prop_assert_eq!(tree_decision(&authz.key_rules, &key, required), expected);
		}

		#[test]
		fn exact_overrides_prefix_at_same_selector(
			selector in "[a-c]{0,3}",
			exact in prop::sample::select(vec!["deny", "read", "write"]),
			prefix in prop::sample::select(vec!["deny", "read", "write"]),
			exact_first in any::<bool>(),
		) {
			let mut rules = PolicyRules::default();
			if exact_first {
				rules.agents.push(Rule::new(selector.clone(), exact));
				rules.agent_prefixes.push(Rule::new(selector.clone(), prefix));
			} else {
				rules.agent_prefixes.push(Rule::new(selector.clone(), prefix));
				rules.agents.push(Rule::new(selector.clone(), exact));
			}
			let authz = compile(rules);
			let expected = enforce(exact.parse().unwrap(), AccessLevel::Write);
			prop_assert_eq!(authz.agent_write(&selector, &ctx()), expected);
		}
	}
}
