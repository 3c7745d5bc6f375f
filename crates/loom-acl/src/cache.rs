// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Identity-keyed cache of compiled authorizers.
//!
//! Three LRU maps sit behind one [`AclCache`]:
//!
//! - identity id to the compiled authorizer built for it;
//! - rule-text hash to the parsed [`Policy`], so identities sharing rule text
//!   parse it once;
//! - parent instance and rule-text hash to the compiled authorizer, so
//!   identities sharing a parent and rule text share one engine. A parent
//!   that is faulted in again compiles to a new instance, so its children
//!   are rebuilt on top of it rather than reusing the old chain.
//!
//! On a miss the embedding application's [`PolicyFaulter`] supplies the
//! parent id and rule text. Locks are held only around map access; parsing
//! and compilation happen outside them, so two threads missing on the same
//! id may both compile. Either result is correct and the later insert wins.

use std::sync::Arc;

use loom_acl_core::{
	root_authorizer, AclError, Authorizer, AuthorizerConfig, ChainedAuthorizer, Policy,
	PolicyAuthorizer, Result,
};
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use tracing::{debug, info, trace, warn};

use crate::config::AclConfig;
use crate::lru::LruCache;

/// Hex SHA-256 of rule text, used as the policy cache key.
pub fn rule_id(rules: &str) -> String {
	hex::encode(Sha256::digest(rules.as_bytes()))
}

/// What the embedding application knows about an identity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FaultedAcl {
	/// Identity (or root authorizer id) to consult when the rules say
	/// nothing. Empty means the configured default policy.
	pub parent: String,
	/// Raw rule text.
	pub rules: String,
}

impl FaultedAcl {
	pub fn new(parent: impl Into<String>, rules: impl Into<String>) -> Self {
		Self {
			parent: parent.into(),
			rules: rules.into(),
		}
	}
}

/// Fetches the parent and rule text for an identity on a cache miss.
///
/// May block; it is called synchronously from [`AclCache::get_acl`].
pub trait PolicyFaulter: Send + Sync {
	fn fault(&self, id: &str) -> Result<FaultedAcl>;
}

impl<F> PolicyFaulter for F
where
	F: Fn(&str) -> Result<FaultedAcl> + Send + Sync,
{
	fn fault(&self, id: &str) -> Result<FaultedAcl> {
		self(id)
	}
}

/// Turns rule text into a [`Policy`].
pub trait RuleParser: Send + Sync {
	fn parse(&self, rule_id: &str, rules: &str) -> Result<Policy>;
}

/// Parses the JSON rule format.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRuleParser;

impl RuleParser for JsonRuleParser {
	fn parse(&self, rule_id: &str, rules: &str) -> Result<Policy> {
		Policy::from_json(rule_id, 0, rules)
	}
}

#[derive(Debug, Clone)]
struct CachedAcl {
	authorizer: Arc<dyn Authorizer>,
	parent: String,
	rule_id: String,
}

/// Entry counts of the three caches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
	pub acls: usize,
	pub policies: usize,
	pub authorizers: usize,
}

pub struct AclCache {
	faulter: Box<dyn PolicyFaulter>,
	parser: Box<dyn RuleParser>,
	authorizer_config: AuthorizerConfig,
	default_policy: String,
	default_parent: Arc<dyn Authorizer>,
	acls: Mutex<LruCache<String, CachedAcl>>,
	policies: Mutex<LruCache<String, Arc<Policy>>>,
	authorizers: Mutex<LruCache<String, Arc<dyn Authorizer>>>,
}

impl std::fmt::Debug for AclCache {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("AclCache")
			.field("default_policy", &self.default_policy)
			.field("stats", &self.stats())
			.finish_non_exhaustive()
	}
}

impl AclCache {
	/// Builds a cache sized by `config`, parsing rule text as JSON.
	///
	/// # Example
	///
	/// ```
	/// use loom_acl::{AclCache, AclConfig, FaultedAcl};
	/// use loom_acl_core::{AclError, AuthorizerContext, AuthorizerExt};
	///
	/// let cache = AclCache::new(&AclConfig::default(), |_id: &str| {
	///     Ok::<_, AclError>(FaultedAcl::new(
	///         "",
	///         r#"{"key_prefix": {"app/": {"policy": "read"}}}"#,
	///     ))
	/// })
	/// .unwrap();
	///
	/// let authz = cache.get_acl("token-1").unwrap();
	/// assert!(authz.key_read("app/config", &AuthorizerContext::default()).is_allow());
	/// ```
	pub fn new(config: &AclConfig, faulter: impl PolicyFaulter + 'static) -> Result<Self> {
		if config.acl_cache_size == 0 {
			return Err(AclError::InvalidCacheSize("acl"));
		}
		if config.policy_cache_size == 0 {
			return Err(AclError::InvalidCacheSize("policy"));
		}
		if config.authorizer_cache_size == 0 {
			return Err(AclError::InvalidCacheSize("authorizer"));
		}
		let default_parent = config.default_authorizer().ok_or(AclError::RootDenied)?;

		Ok(Self {
			faulter: Box::new(faulter),
			parser: Box::new(JsonRuleParser),
			authorizer_config: AuthorizerConfig::default(),
			default_policy: config.default_policy.clone(),
			default_parent,
			acls: Mutex::new(LruCache::new(config.acl_cache_size)),
			policies: Mutex::new(LruCache::new(config.policy_cache_size)),
			authorizers: Mutex::new(LruCache::new(config.authorizer_cache_size)),
		})
	}

	pub fn with_parser(mut self, parser: impl RuleParser + 'static) -> Self {
		self.parser = Box::new(parser);
		self
	}

	pub fn with_authorizer_config(mut self, config: AuthorizerConfig) -> Self {
		self.authorizer_config = config;
		self
	}

	/// The compiled authorizer for `id`, faulting it in on a miss.
	///
	/// Repeated calls return the same `Arc` until the entry is evicted or
	/// invalidated.
	pub fn get_acl(&self, id: &str) -> Result<Arc<dyn Authorizer>> {
		let mut resolving = Vec::new();
		self.get_acl_inner(id, &mut resolving)
	}

	fn get_acl_inner(&self, id: &str, resolving: &mut Vec<String>) -> Result<Arc<dyn Authorizer>> {
		if let Some(cached) = self.acls.lock().get(id) {
			trace!(acl_id = id, "acl cache hit");
			return Ok(cached.authorizer);
		}
		debug!(acl_id = id, "acl cache miss");

		let faulted = self.fault(id)?;
		let parent_id = self.effective_parent(&faulted.parent);
		if parent_id == id || resolving.iter().any(|seen| seen == parent_id) {
			warn!(acl_id = id, parent_id, "acl parent refers back to itself");
			return Err(AclError::InvalidParent);
		}

		resolving.push(id.to_string());
		let parent = if faulted.parent.is_empty() {
			Arc::clone(&self.default_parent)
		} else {
			match root_authorizer(parent_id) {
				Some(root) => root,
				None => self.get_acl_inner(parent_id, resolving)?,
			}
		};
		resolving.pop();

		let rule_id = rule_id(&faulted.rules);
		let policy = self.policy(&rule_id, &faulted.rules)?;
		let authorizer = self.compiled(parent_id, parent, &rule_id, &policy)?;

		self.acls.lock().insert(
			id.to_string(),
			CachedAcl {
				authorizer: Arc::clone(&authorizer),
				parent: faulted.parent,
				rule_id,
			},
		);
		Ok(authorizer)
	}

	/// The parent id and parsed rules for `id`.
	///
	/// Served from cache when `id` and its rules are both cached, otherwise
	/// faulted in again. Does not compile an authorizer.
	pub fn get_acl_policy(&self, id: &str) -> Result<(String, Arc<Policy>)> {
		let cached = self.acls.lock().get(id);
		if let Some(cached) = cached {
			if let Some(policy) = self.policies.lock().get(&cached.rule_id) {
				trace!(acl_id = id, rule_id = %cached.rule_id, "acl policy cache hit");
				return Ok((cached.parent, policy));
			}
		}

		let faulted = self.fault(id)?;
		let rule_id = rule_id(&faulted.rules);
		let policy = self.policy(&rule_id, &faulted.rules)?;
		Ok((faulted.parent, policy))
	}

	/// Drops the cached authorizer for `id`; the next lookup faults it in.
	pub fn clear_acl(&self, id: &str) {
		let removed = self.acls.lock().remove(id).is_some();
		debug!(acl_id = id, removed, "cleared acl");
	}

	/// Drops every cached identity and compiled authorizer. Parsed policies
	/// are keyed by content and survive.
	pub fn purge(&self) {
		self.acls.lock().clear();
		self.authorizers.lock().clear();
		info!("purged acl cache");
	}

	pub fn stats(&self) -> CacheStats {
		CacheStats {
			acls: self.acls.lock().len(),
			policies: self.policies.lock().len(),
			authorizers: self.authorizers.lock().len(),
		}
	}

	fn effective_parent<'a>(&'a self, parent: &'a str) -> &'a str {
		if parent.is_empty() {
			&self.default_policy
		} else {
			parent
		}
	}

	fn fault(&self, id: &str) -> Result<FaultedAcl> {
		self.faulter.fault(id).inspect_err(|err| {
			warn!(acl_id = id, error = %err, "failed to fault in acl");
		})
	}

	fn policy(&self, rule_id: &str, rules: &str) -> Result<Arc<Policy>> {
		if let Some(policy) = self.policies.lock().get(rule_id) {
			trace!(rule_id, "policy cache hit");
			return Ok(policy);
		}

		let policy = Arc::new(self.parser.parse(rule_id, rules).inspect_err(|err| {
			warn!(rule_id, error = %err, "failed to parse acl rules");
		})?);
		self.policies
			.lock()
			.insert(rule_id.to_string(), Arc::clone(&policy));
		debug!(rule_id, "cached policy");
		Ok(policy)
	}

	fn compiled(
		&self,
		parent_id: &str,
		parent: Arc<dyn Authorizer>,
		rule_id: &str,
		policy: &Policy,
	) -> Result<Arc<dyn Authorizer>> {
		// Entries hold their parent, so its address is not reused while the
		// key is live.
		let key = format!("{:p}:{rule_id}", Arc::as_ptr(&parent).cast::<()>());
		if let Some(authz) = self.authorizers.lock().get(&key) {
			trace!(parent_id, rule_id, "authorizer cache hit");
			return Ok(authz);
		}

		let compiled: Arc<dyn Authorizer> = Arc::new(PolicyAuthorizer::from_rules(
			&policy.rules,
			&self.authorizer_config,
		)?);
		let authz: Arc<dyn Authorizer> = Arc::new(ChainedAuthorizer::new(vec![compiled, parent]));
		self.authorizers.lock().insert(key, Arc::clone(&authz));
		debug!(parent_id, rule_id, "compiled authorizer");
		Ok(authz)
	}
}
