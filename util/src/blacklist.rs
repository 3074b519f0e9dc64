// Copyright 2026 The Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A bounded, insertion-order-evicted mapping from item to expiry time.
//!
//! Used to remember "blocked until" facts (banned addresses, double-spend
//! notification senders, ...) without growing without bound: once `max_size`
//! entries are held, the earliest-inserted entry is evicted to make room for
//! a new one, regardless of whether it has expired yet.

use std::collections::{HashMap, VecDeque};
use std::hash::Hash;
use std::time::{Duration, Instant};

/// Error produced when `add` is asked not to update an existing entry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BlacklistError {
	#[error("item is already blacklisted")]
	AlreadyExists,
}

pub struct TimeLimitedBlacklist<K: Eq + Hash + Clone> {
	max_size: usize,
	// insertion order, oldest first. May contain stale keys already removed
	// from `entries` by a lazy expiry purge; these are skipped on eviction.
	order: VecDeque<K>,
	entries: HashMap<K, Instant>,
}

impl<K: Eq + Hash + Clone> TimeLimitedBlacklist<K> {
	pub fn new(max_size: usize) -> Self {
		TimeLimitedBlacklist {
			max_size,
			order: VecDeque::new(),
			entries: HashMap::new(),
		}
	}

	pub fn max_size(&self) -> usize {
		self.max_size
	}

	/// Number of entries currently tracked (including expired-but-not-yet-purged).
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Inserts or refreshes `item`'s expiry, computed as `now + ttl`.
	pub fn add_for(
		&mut self,
		item: K,
		ttl: Duration,
		update_if_exists: bool,
	) -> Result<(), BlacklistError> {
		self.add(item, Instant::now() + ttl, update_if_exists)
	}

	/// Inserts or refreshes `item`'s expiry to the given instant. If `item`
	/// is already present and `update_if_exists` is false, the call fails
	/// and the map is unchanged.
	pub fn add(
		&mut self,
		item: K,
		until: Instant,
		update_if_exists: bool,
	) -> Result<(), BlacklistError> {
		if self.entries.contains_key(&item) {
			if !update_if_exists {
				return Err(BlacklistError::AlreadyExists);
			}
			self.entries.insert(item, until);
			return Ok(());
		}

		if self.entries.len() >= self.max_size {
			self.evict_oldest();
		}

		self.order.push_back(item.clone());
		self.entries.insert(item, until);
		Ok(())
	}

	/// Existence regardless of expiry.
	pub fn contains(&self, item: &K) -> bool {
		self.entries.contains_key(item)
	}

	/// True iff `item` is present and not yet expired. An expired entry is
	/// purged as a side effect of this lookup -- until it is looked up,
	/// `contains` may still report it as present.
	pub fn is_blacklisted(&mut self, item: &K) -> bool {
		let expired = match self.entries.get(item) {
			Some(until) => *until <= Instant::now(),
			None => return false,
		};
		if expired {
			self.entries.remove(item);
			false
		} else {
			true
		}
	}

	fn evict_oldest(&mut self) {
		while let Some(oldest) = self.order.pop_front() {
			if self.entries.remove(&oldest).is_some() {
				return;
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::thread::sleep;

	#[test]
	fn evicts_earliest_inserted_entry_on_overflow() {
		let mut bl = TimeLimitedBlacklist::new(3);
		let long = Duration::from_secs(60);
		bl.add_for(1, long, true).unwrap();
		bl.add_for(2, long, true).unwrap();
		bl.add_for(3, long, true).unwrap();
		bl.add_for(4, long, true).unwrap();

		assert!(!bl.contains(&1));
		assert!(bl.contains(&2));
		assert!(bl.contains(&3));
		assert!(bl.contains(&4));
		assert_eq!(bl.len(), 3);
	}

	#[test]
	fn add_without_update_rejects_existing() {
		let mut bl = TimeLimitedBlacklist::new(3);
		bl.add_for("x", Duration::from_secs(60), true).unwrap();
		let err = bl.add_for("x", Duration::from_secs(60), false).unwrap_err();
		assert_eq!(err, BlacklistError::AlreadyExists);
	}

	#[test]
	fn contains_survives_expiry_until_lookup_purges_it() {
		let mut bl = TimeLimitedBlacklist::new(3);
		bl.add_for("x", Duration::from_millis(10), true).unwrap();
		sleep(Duration::from_millis(30));

		assert!(bl.contains(&"x"));
		assert!(!bl.is_blacklisted(&"x"));
		assert!(!bl.contains(&"x"));
	}
}
