// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration error types.

use std::path::PathBuf;

/// Errors that can occur while loading or validating ACL configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	/// An environment variable or file field held an unusable value
	#[error("Invalid value for {key}: {message}")]
	InvalidValue { key: String, message: String },

	/// TOML parsing error
	#[error("TOML parse error in {}: {source}", .path.display())]
	TomlParse {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},

	/// I/O error reading a config file
	#[error("Failed to read {}: {source}", .path.display())]
	FileRead {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	/// Cross-field validation error
	#[error("Validation error: {0}")]
	Validation(String),
}

impl ConfigError {
	pub fn validation(msg: impl Into<String>) -> Self {
		Self::Validation(msg.into())
	}

	pub fn invalid_value(key: impl Into<String>, message: impl Into<String>) -> Self {
		Self::InvalidValue {
			key: key.into(),
			message: message.into(),
		}
	}
}
