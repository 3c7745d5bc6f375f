// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::borrow::Borrow;
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

#[derive(Debug)]
struct Slot<V> {
	value: V,
	last_used: u64,
}

/// Bounded map that evicts the least recently used entry when full.
///
/// Not synchronized; callers wrap it in a lock. `order` maps each entry's
/// last-use tick back to its key; its first entry is the next to evict.
#[derive(Debug)]
pub(crate) struct LruCache<K, V> {
	entries: HashMap<K, Slot<V>>,
	order: BTreeMap<u64, K>,
	capacity: usize,
	tick: u64,
}

impl<K: Hash + Eq + Clone, V: Clone> LruCache<K, V> {
	pub(crate) fn new(capacity: usize) -> Self {
		Self {
			entries: HashMap::new(),
			order: BTreeMap::new(),
			capacity,
			tick: 0,
		}
	}

	fn next_tick(&mut self) -> u64 {
		self.tick += 1;
		self.tick
	}

	pub(crate) fn get<Q>(&mut self, key: &Q) -> Option<V>
	where
		K: Borrow<Q>,
		Q: Hash + Eq + ?Sized,
	{
		let tick = self.next_tick();
		let slot = self.entries.get_mut(key)?;
		let previous = std::mem::replace(&mut slot.last_used, tick);
		if let Some(owner) = self.order.remove(&previous) {
			self.order.insert(tick, owner);
		}
		Some(slot.value.clone())
	}

	pub(crate) fn insert(&mut self, key: K, value: V) {
		if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
			self.evict_lru();
		}
		let last_used = self.next_tick();
		self.order.insert(last_used, key.clone());
		if let Some(replaced) = self.entries.insert(key, Slot { value, last_used }) {
			self.order.remove(&replaced.last_used);
		}
	}

	pub(crate) fn remove<Q>(&mut self, key: &Q) -> Option<V>
	where
		K: Borrow<Q>,
		Q: Hash + Eq + ?Sized,
	{
		let slot = self.entries.remove(key)?;
		self.order.remove(&slot.last_used);
		Some(slot.value)
	}

	pub(crate) fn clear(&mut self) {
		self.entries.clear();
		self.order.clear();
	}

	pub(crate) fn len(&self) -> usize {
		self.entries.len()
	}

	fn evict_lru(&mut self) {
		if let Some((_, oldest)) = self.order.pop_first() {
			self.entries.remove(&oldest);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn test_insert_and_get() {
		let mut cache = LruCache::new(2);
		cache.insert("a".to_string(), 1);
		assert_eq!(cache.get("a"), Some(1));
		assert_eq!(cache.get("b"), None);
	}

	#[test]
	fn test_lru_eviction() {
		let mut cache = LruCache::new(3);
		cache.insert("a".to_string(), 1);
		cache.insert("b".to_string(), 2);
		cache.insert("c".to_string(), 3);

		cache.get("a");
		cache.get("c");

		cache.insert("d".to_string(), 4);

		assert!(cache.get("b").is_none());
		assert!(cache.get("a").is_some());
		assert!(cache.get("c").is_some());
		assert!(cache.get("d").is_some());
	}

	#[test]
	fn test_replacing_does_not_evict() {
		let mut cache = LruCache::new(2);
		cache.insert("a".to_string(), 1);
		cache.insert("b".to_string(), 2);
		cache.insert("a".to_string(), 10);

		assert_eq!(cache.len(), 2);
		assert_eq!(cache.get("a"), Some(10));
		assert_eq!(cache.get("b"), Some(2));
	}

	#[test]
	fn test_remove_and_clear() {
		let mut cache = LruCache::new(4);
		cache.insert("a".to_string(), 1);
		cache.insert("b".to_string(), 2);

		assert_eq!(cache.remove("a"), Some(1));
		assert_eq!(cache.remove("a"), None);
		assert_eq!(cache.len(), 1);

		cache.clear();
		assert_eq!(cache.len(), 0);
	}

	#[test]
	fn test_eviction_follows_access_order() {
		let mut cache = LruCache::new(3);
		cache.insert("a".to_string(), 1);
		cache.insert("b".to_string(), 2);
		cache.insert("c".to_string(), 3);
		cache.get("a");
		cache.insert("b".to_string(), 20);

		cache.insert("d".to_string(), 4);
		assert!(cache.get("c").is_none());

		cache.insert("e".to_string(), 5);
		assert!(cache.get("a").is_none());

		assert_eq!(cache.get("b"), Some(20));
		assert_eq!(cache.order.len(), cache.entries.len());
	}

	#[derive(Debug, Clone)]
	enum Step {
		Insert(u8),
		Get(u8),
		Remove(u8),
	}

	fn step() -> impl Strategy<Value = Step> {
		prop_oneof![
			(0u8..12).prop_map(Step::Insert),
			(0u8..12).prop_map(Step::Get),
			(0u8..12).prop_map(Step::Remove),
		]
	}

	proptest! {
		#[test]
		fn evicts_like_recency_list(capacity in 1usize..6, steps in prop::collection::vec(step(), 0..96)) {
			let mut cache = LruCache::new(capacity);
			// Most recently used last.
			let mut recency: Vec<u8> = Vec::new();
			for step in steps {
				match step {
					Step::Insert(key) => {
						cache.insert(key, key);
						if let Some(pos) = recency.iter().position(|k| *k == key) {
							recency.remove(pos);
						} else if recency.len() >= capacity {
							recency.remove(0);
						}
						recency.push(key);
					}
					Step::Get(key) => {
						let hit = cache.get(&key);
						let pos = recency.iter().position(|k| *k == key);
						prop_assert_eq!(hit.is_some(), pos.is_some());
						if let Some(pos) = pos {
							recency.remove(pos);
							recency.push(key);
						}
					}
					Step::Remove(key) => {
						let removed = cache.remove(&key);
						let pos = recency.iter().position(|k| *k == key);
						prop_assert_eq!(removed.is_some(), pos.is_some());
						if let Some(pos) = pos {
							recency.remove(pos);
						}
					}
				}
				prop_assert_eq!(cache.len(), recency.len());
				prop_assert_eq!(cache.order.len(), cache.entries.len());
				let ordered: Vec<u8> = cache.order.values().copied().collect();
				prop_assert_eq!(&ordered, &recency);
			}
		}

		#[test]
		fn never_exceeds_capacity(capacity in 1usize..16, keys in prop::collection::vec(0u8..32, 0..128)) {
			let mut cache = LruCache::new(capacity);
			for key in keys {
				cache.insert(key, key);
				prop_assert!(cache.len() <= capacity);
				prop_assert_eq!(cache.get(&key), Some(key));
			}
		}
	}
}
