// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Cached ACL authorizers for Loom.
//!
//! This crate provides:
//! - [`AclCache`], which faults identities in through a caller-supplied
//!   [`PolicyFaulter`] and memoizes parsed rules and compiled authorizers
//! - Layered configuration from defaults, a TOML file and the environment
//!   (`LOOM_ACL_*`)
//!
//! Decision logic lives in `loom-acl-core`.
//!
//! # Usage
//!
//! ```ignore
//! use loom_acl::{load_config, AclCache, FaultedAcl};
//!
//! let config = load_config()?;
//! let cache = AclCache::new(&config, |id: &str| store.fetch_acl(id))?;
//! let authz = cache.get_acl(token_id)?;
//! ```

pub mod cache;
pub mod config;
pub mod error;
mod lru;
pub mod sources;

pub use cache::{rule_id, AclCache, CacheStats, FaultedAcl, JsonRuleParser, PolicyFaulter, RuleParser};
pub use config::{AclConfig, AclConfigLayer};
pub use error::ConfigError;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use tracing::{debug, info};

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`LOOM_ACL_*`)
/// 2. Config file (`/etc/loom/acl.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<AclConfig, ConfigError> {
	load_from(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	])
}

/// Load configuration from environment only (for testing or simple deployments).
pub fn load_config_from_env() -> Result<AclConfig, ConfigError> {
	load_from(vec![Box::new(DefaultsSource), Box::new(EnvSource)])
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<AclConfig, ConfigError> {
	load_from(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	])
}

fn load_from(mut sources: Vec<Box<dyn ConfigSource>>) -> Result<AclConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = AclConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	finalize(merged)
}

/// Finalize configuration layer into resolved config.
fn finalize(layer: AclConfigLayer) -> Result<AclConfig, ConfigError> {
	let config = layer.finalize();
	config.validate()?;

	info!(
		default_policy = %config.default_policy,
		acl_cache_size = config.acl_cache_size,
		policy_cache_size = config.policy_cache_size,
		authorizer_cache_size = config.authorizer_cache_size,
		"ACL configuration loaded"
	);

	Ok(config)
}

#[cfg(test)]
mod tests {
	use super::*;

	/// Fixed layer at a chosen precedence.
	struct Fixed(Precedence, AclConfigLayer);

	impl ConfigSource for Fixed {
		fn name(&self) -> &'static str {
			"fixed"
		}

		fn precedence(&self) -> Precedence {
			self.0
		}

		fn load(&self) -> Result<AclConfigLayer, ConfigError> {
			Ok(self.1.clone())
		}
	}

	fn policy(p: &str) -> AclConfigLayer {
		AclConfigLayer {
			default_policy: Some(p.to_string()),
			..Default::default()
		}
	}

	#[test]
	fn test_higher_precedence_wins_regardless_of_order() {
		let config = load_from(vec![
			Box::new(Fixed(Precedence::Environment, policy("manage"))),
			Box::new(Fixed(Precedence::ConfigFile, policy("allow"))),
			Box::new(Fixed(Precedence::Defaults, policy("deny"))),
		])
		.unwrap();
		assert_eq!(config.default_policy, "manage");
	}

	#[test]
	fn test_invalid_merged_config_fails() {
		let err = load_from(vec![Box::new(Fixed(
			Precedence::ConfigFile,
			AclConfigLayer {
				acl_cache_size: Some(0),
				..Default::default()
			},
		))])
		.unwrap_err();
		assert!(matches!(err, ConfigError::Validation(_)));
	}
}
