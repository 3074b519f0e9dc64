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

//! `Journal`: a concurrently-readable, doubly-indexed ordered sequence of
//! mempool transactions (by identity, and by insertion position), with a
//! single exclusive writer. Built on `IndexMap` rather than a hand-rolled
//! linked list plus hash map: it already gives us key -> stable insertion
//! order with O(1) identity lookup, `shift_remove` that preserves the order
//! of everything else, and `shift_insert` for the REORG prepend case.

use indexmap::IndexMap;
use log::warn;
use parking_lot::RwLock;

use peernet_core::Hash;

use crate::journal_entry::JournalEntry;
use crate::time::now_micros;
use crate::{JournalOperation, JournalUpdateReason};

pub(crate) struct JournalInner<Txn: Clone> {
	pub(crate) entries: IndexMap<Hash, JournalEntry<Txn>>,
	pub(crate) last_invalidating_time_micros: i64,
}

pub struct Journal<Txn: Clone> {
	pub(crate) inner: RwLock<JournalInner<Txn>>,
}

impl<Txn: Clone> Journal<Txn> {
	pub fn new() -> Self {
		Journal {
			inner: RwLock::new(JournalInner {
				entries: IndexMap::new(),
				last_invalidating_time_micros: now_micros(),
			}),
		}
	}

	pub fn size(&self) -> usize {
		self.inner.read().entries.len()
	}

	pub fn last_invalidating_time_micros(&self) -> i64 {
		self.inner.read().last_invalidating_time_micros
	}

	/// Applies a batch of staged operations under the writer-exclusive lock.
	/// `ops` is assumed already sorted (by `JournalChangeSet::apply`) when
	/// `reason` calls for it. A no-op on an empty batch: in particular it
	/// does not touch the invalidating time, so a `ChangeSet` destructor
	/// that never staged anything has no effect on live iterators.
	pub(crate) fn apply_changes(
		&self,
		reason: JournalUpdateReason,
		tail_append_only: bool,
		ops: Vec<(JournalOperation, JournalEntry<Txn>)>,
	) {
		if ops.is_empty() {
			return;
		}

		let mut inner = self.inner.write();
		let is_reorg = reason == JournalUpdateReason::Reorg;
		// Count of REORG adds inserted so far == the current position of the
		// element that was the journal's head before this batch started.
		// Advancing it on every prepend keeps new adds landing, in order,
		// just before that boundary; removing an item before the boundary
		// shrinks it by one, standing in for "advance the bookmark" over an
		// iterator-based index.
		let mut head_boundary = 0usize;

		for (op, entry) in ops {
			match op {
				JournalOperation::Add => {
					if is_reorg {
						inner.entries.shift_insert(head_boundary, entry.txid, entry);
						head_boundary += 1;
					} else {
						inner.entries.insert(entry.txid, entry);
					}
				}
				JournalOperation::Remove => {
					if let Some(pos) = inner.entries.get_index_of(&entry.txid) {
						if is_reorg && pos < head_boundary {
							head_boundary -= 1;
						}
						inner.entries.shift_remove(&entry.txid);
					} else {
						warn!("journal: txn {} not found for removal, ignoring", entry.txid);
					}
				}
			}
		}

		if !tail_append_only {
			inner.last_invalidating_time_micros = now_micros();
		}
	}
}

impl<Txn: Clone> Default for Journal<Txn> {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::journal_change_set::JournalChangeSet;
	use crate::journal_index::JournalIndex;
	use peernet_core::Hash;

	fn entry(journal_seed: u8, ancestor_count: u64) -> JournalEntry<&'static str> {
		let mut bytes = [0u8; 32];
		bytes[0] = journal_seed;
		JournalEntry::new("tx", Hash::from_slice(&bytes), ancestor_count, 0)
	}

	#[test]
	fn basic_add_appends_and_keeps_existing_iterator_valid() {
		let journal = Journal::new();
		{
			let mut cs = JournalChangeSet::new(&journal, JournalUpdateReason::NewTxn);
			cs.add_operation(JournalOperation::Add, entry(1, 0));
		}
		let idx = JournalIndex::begin(&journal);

		{
			let mut cs = JournalChangeSet::new(&journal, JournalUpdateReason::NewTxn);
			cs.add_operation(JournalOperation::Add, entry(2, 0));
		}

		assert!(idx.valid());
		assert_eq!(journal.size(), 2);
	}

	#[test]
	fn reorg_prepends_and_invalidates_existing_iterators() {
		let journal = Journal::new();
		{
			let mut cs = JournalChangeSet::new(&journal, JournalUpdateReason::NewTxn);
			cs.add_operation(JournalOperation::Add, entry(1, 0));
			cs.add_operation(JournalOperation::Add, entry(2, 0));
		}
		let idx = JournalIndex::begin(&journal);

		{
			let mut cs = JournalChangeSet::new(&journal, JournalUpdateReason::Reorg);
			cs.add_operation(JournalOperation::Add, entry(3, 0));
			cs.add_operation(JournalOperation::Add, entry(4, 0));
		}

		assert!(!idx.valid());
		let order: Vec<u8> = journal.inner.read().entries.keys().map(|h| h.0[0]).collect();
		assert_eq!(order, vec![3, 4, 1, 2]);
	}
}
