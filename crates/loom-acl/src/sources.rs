// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: defaults, TOML files and environment variables.

use std::path::PathBuf;

use serde::Deserialize;
use tracing::{debug, trace};

use crate::config::AclConfigLayer;
use crate::error::ConfigError;

pub const ENV_DEFAULT_POLICY: &str = "LOOM_ACL_DEFAULT_POLICY";
pub const ENV_CACHE_SIZE: &str = "LOOM_ACL_CACHE_SIZE";
pub const ENV_POLICY_CACHE_SIZE: &str = "LOOM_ACL_POLICY_CACHE_SIZE";
pub const ENV_AUTHORIZER_CACHE_SIZE: &str = "LOOM_ACL_AUTHORIZER_CACHE_SIZE";

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

/// Trait for configuration sources.
pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<AclConfigLayer, ConfigError>;
}

/// Built-in defaults source.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<AclConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(AclConfigLayer::default())
	}
}

/// Shape of a config file: settings live under an `[acl]` table.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
	#[serde(default)]
	acl: AclConfigLayer,
}

/// TOML file configuration source.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn system() -> Self {
		Self::new("/etc/loom/acl.toml")
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<AclConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(AclConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let file: ConfigFile = toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
			path: self.path.clone(),
			source: e,
		})?;

		trace!("parsed config layer from TOML");
		Ok(file.acl)
	}
}

/// Environment variable source.
///
/// Convention: LOOM_ACL_<FIELD>
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<AclConfigLayer, ConfigError> {
		debug!("loading environment variables");
		Ok(AclConfigLayer {
			default_policy: env_var(ENV_DEFAULT_POLICY),
			acl_cache_size: env_usize(ENV_CACHE_SIZE)?,
			policy_cache_size: env_usize(ENV_POLICY_CACHE_SIZE)?,
			authorizer_cache_size: env_usize(ENV_AUTHORIZER_CACHE_SIZE)?,
		})
	}
}

fn env_var(name: &str) -> Option<String> {
	std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_usize(name: &str) -> Result<Option<usize>, ConfigError> {
	match env_var(name) {
		Some(v) => v.trim().parse().map(Some).map_err(|_| ConfigError::InvalidValue {
			key: name.to_string(),
			message: format!("invalid usize value '{v}'"),
		}),
		None => Ok(None),
	}
}
