// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Ordered prefix tree keyed by selector strings.
//!
//! Keys are held in a sorted map, which gives the three walks the engine
//! needs:
//!
//! - [`PrefixTree::walk_path`] visits every stored key that is a prefix of
//!   a lookup key, shortest first.
//! - [`PrefixTree::walk_prefix`] visits every stored key that starts with a
//!   prefix, the prefix itself first.
//! - [`PrefixTree::walk`] visits everything in key order.

use std::collections::BTreeMap;
use std::ops::Bound;

#[derive(Debug, Clone)]
pub struct PrefixTree<V> {
	nodes: BTreeMap<String, V>,
}

impl<V> Default for PrefixTree<V> {
	fn default() -> Self {
		Self {
			nodes: BTreeMap::new(),
		}
	}
}

impl<V> PrefixTree<V> {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	pub fn get(&self, key: &str) -> Option<&V> {
		self.nodes.get(key)
	}

	/// Inserts or overwrites the value stored at `key`.
	pub fn insert(&mut self, key: impl Into<String>, value: V) -> Option<V> {
		self.nodes.insert(key.into(), value)
	}

	pub fn get_or_insert_with(&mut self, key: &str, make: impl FnOnce() -> V) -> &mut V {
		self.nodes.entry(key.to_string()).or_insert_with(make)
	}

	/// Stored entries whose key is a prefix of `key`, ancestors first.
	pub fn walk_path<'a, 'k>(&'a self, key: &'k str) -> impl Iterator<Item = (&'a str, &'a V)> + 'k
	where
		'a: 'k,
	{
		(0..=key.len())
			.filter(move |&end| key.is_char_boundary(end))
			.filter_map(move |end| {
				self.nodes
					.get_key_value(&key[..end])
					.map(|(k, v)| (k.as_str(), v))
			})
	}

	/// Stored entries whose key starts with `prefix`, in key order.
	pub fn walk_prefix<'a, 'k>(
		&'a self,
		prefix: &'k str,
	) -> impl Iterator<Item = (&'a str, &'a V)> + 'k
	where
		'a: 'k,
	{
		self.nodes
			.range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
			.take_while(move |(k, _)| k.starts_with(prefix))
			.map(|(k, v)| (k.as_str(), v))
	}

	pub fn walk(&self) -> impl Iterator<Item = (&str, &V)> {
		self.nodes.iter().map(|(k, v)| (k.as_str(), v))
	}
}
