// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types for the Loom access control list engine.
//!
//! This crate compiles declarative rule sets into immutable authorizers and
//! answers access questions against them. Caching and configuration live in
//! `loom-acl`; everything here is synchronous and free of I/O.
//!
//! # Overview
//!
//! - [`Policy`] holds parsed rules; [`merge_policies`] folds several into one
//!   using deny-wins precedence.
//! - [`PolicyAuthorizer`] compiles rules into prefix trees and answers
//!   exact-match and longest-prefix questions.
//! - [`ChainedAuthorizer`] consults several authorizers, falling through on
//!   `Default`; the static authorizers ([`allow_all`], [`deny_all`],
//!   [`manage_all`]) terminate chains.
//! - [`AllowAuthorizer`] turns decisions into [`PermissionDeniedError`]s.
//!
//! # Example
//!
//! ```
//! use loom_acl_core::{
//!     deny_all, AuthorizerConfig, AuthorizerContext, AuthorizerExt, Policy, PolicyAuthorizer,
//! };
//!
//! let policy = Policy::from_json(
//!     "web-team",
//!     1,
//!     r#"{
//!         "key_prefix": { "web/": { "policy": "write" } },
//!         "service": { "web": { "policy": "write" } }
//!     }"#,
//! )
//! .unwrap();
//!
//! let authz =
//!     PolicyAuthorizer::with_defaults(deny_all(), &[policy], &AuthorizerConfig::default()).unwrap();
//! let ctx = AuthorizerContext::default();
//!
//! assert!(authz.key_write("web/config", &ctx).is_allow());
//! assert!(!authz.key_read("db/config", &ctx).is_allow());
//! assert!(authz.service_write("web", &ctx).is_allow());
//! ```

pub mod access;
pub mod allow;
pub mod authorizer;
pub mod chained;
pub mod context;
pub mod error;
pub mod extension;
pub mod merge;
pub mod policy;
pub mod policy_authorizer;
pub mod resource;
pub mod static_authorizer;
pub mod tree;

pub use access::{default_is_allow, AccessLevel, EnforcementDecision};
pub use allow::AllowAuthorizer;
pub use authorizer::{enforce, Authorizer, AuthorizerExt, Operation};
pub use chained::ChainedAuthorizer;
pub use context::AuthorizerContext;
pub use error::{
	is_err_disabled, is_err_invalid_parent, is_err_not_found, is_err_permission_denied,
	is_err_root_denied, AclError, PermissionDeniedError, Result,
};
pub use extension::{AuthorizerConfig, ExtensionRule, NoopExtension, PolicyExtension};
pub use merge::{merge_policies, merge_rules_of, multi_policy_id};
pub use policy::{Policy, PolicyRules, Rule, ServiceRule};
pub use policy_authorizer::PolicyAuthorizer;
pub use resource::Resource;
pub use static_authorizer::{
	allow_all, deny_all, is_root_authorizer, manage_all, root_authorizer, StaticAuthorizer,
};
pub use tree::PrefixTree;
