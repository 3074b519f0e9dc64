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

//! `JournalChangeSet`: a transactional batch of `(ADD|REMOVE, entry)`
//! operations staged against a `Journal`. RAII-style: `apply()` runs
//! unconditionally on drop, so a change set abandoned mid-construction
//! (an early return, a panic unwind) still lands whatever it staged.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::journal::Journal;
use crate::journal_entry::JournalEntry;
use crate::{JournalOperation, JournalUpdateReason};

pub struct JournalChangeSet<'j, Txn: Clone> {
	journal: &'j Journal<Txn>,
	reason: JournalUpdateReason,
	tail_append_only: AtomicBool,
	staged: Mutex<Vec<(JournalOperation, JournalEntry<Txn>)>>,
}

impl<'j, Txn: Clone> JournalChangeSet<'j, Txn> {
	pub fn new(journal: &'j Journal<Txn>, reason: JournalUpdateReason) -> Self {
		// REORGs remove as well as add, and add to the front rather than the
		// tail, so they start out not tail-append-only.
		let tail_append_only = reason != JournalUpdateReason::Reorg;
		JournalChangeSet {
			journal,
			reason,
			tail_append_only: AtomicBool::new(tail_append_only),
			staged: Mutex::new(Vec::new()),
		}
	}

	pub fn reason(&self) -> JournalUpdateReason {
		self.reason
	}

	pub fn tail_append_only(&self) -> bool {
		self.tail_append_only.load(Ordering::SeqCst)
	}

	/// Stages one operation. For a "basic" reason (`NEW_TXN`, `REMOVE_TXN`,
	/// `REPLACE_TXN`, `INIT`, `UNKNOWN`) this immediately applies everything
	/// staged so far, to minimise the window before the change is visible.
	/// Other reasons (`NEW_BLOCK`, `REORG`, `RESET`) accumulate until
	/// `apply()` is called or the change set is dropped.
	pub fn add_operation(&self, op: JournalOperation, entry: JournalEntry<Txn>) {
		self.staged.lock().push((op, entry));
		if op == JournalOperation::Remove {
			self.tail_append_only.store(false, Ordering::SeqCst);
		}
		if self.reason.is_basic() {
			self.apply();
		}
	}

	/// Applies everything staged so far. A no-op if nothing is staged, so
	/// calling this twice (explicitly, then again from `Drop`) is safe.
	pub fn apply(&self) {
		let mut batch = {
			let mut staged = self.staged.lock();
			if staged.is_empty() {
				return;
			}
			std::mem::take(&mut *staged)
		};

		// REORG and RESET batches arrive in whatever order their caller
		// produced them; re-sort by ancestor count so dependencies always
		// land before their descendants.
		if matches!(self.reason, JournalUpdateReason::Reorg | JournalUpdateReason::Reset) {
			batch.sort_by_key(|(_, entry)| entry.ancestor_count);
		}

		self.journal.apply_changes(self.reason, self.tail_append_only(), batch);
	}

	/// Discards everything staged so far without applying it.
	pub fn clear(&self) {
		self.staged.lock().clear();
	}
}

impl<'j, Txn: Clone> Drop for JournalChangeSet<'j, Txn> {
	fn drop(&mut self) {
		self.apply();
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use peernet_core::Hash;

	fn entry(seed: u8, ancestor_count: u64) -> JournalEntry<&'static str> {
		let mut bytes = [0u8; 32];
		bytes[0] = seed;
		JournalEntry::new("tx", Hash::from_slice(&bytes), ancestor_count, 0)
	}

	#[test]
	fn basic_reason_applies_on_every_operation() {
		let journal: Journal<&'static str> = Journal::new();
		let cs = JournalChangeSet::new(&journal, JournalUpdateReason::NewTxn);
		cs.add_operation(JournalOperation::Add, entry(1, 0));
		assert_eq!(journal.size(), 1);
		cs.add_operation(JournalOperation::Add, entry(2, 0));
		assert_eq!(journal.size(), 2);
	}

	#[test]
	fn non_basic_reason_accumulates_until_drop() {
		let journal: Journal<&'static str> = Journal::new();
		{
			let cs = JournalChangeSet::new(&journal, JournalUpdateReason::NewBlock);
			cs.add_operation(JournalOperation::Add, entry(1, 0));
			cs.add_operation(JournalOperation::Add, entry(2, 0));
			assert_eq!(journal.size(), 0);
		}
		assert_eq!(journal.size(), 2);
	}

	#[test]
	fn reorg_and_reset_sort_by_ancestor_count_before_applying() {
		let journal: Journal<&'static str> = Journal::new();
		{
			let cs = JournalChangeSet::new(&journal, JournalUpdateReason::Reorg);
			cs.add_operation(JournalOperation::Add, entry(1, 5));
			cs.add_operation(JournalOperation::Add, entry(2, 1));
			cs.add_operation(JournalOperation::Add, entry(3, 3));
		}
		let order: Vec<u8> = journal.inner.read().entries.keys().map(|h| h.0[0]).collect();
		assert_eq!(order, vec![2, 3, 1]);
	}

	#[test]
	fn a_remove_clears_tail_append_only_even_for_a_basic_reason() {
		let journal: Journal<&'static str> = Journal::new();
		let cs = JournalChangeSet::new(&journal, JournalUpdateReason::RemoveTxn);
		assert!(cs.tail_append_only());
		cs.add_operation(JournalOperation::Remove, entry(1, 0));
		assert!(!cs.tail_append_only());
	}
}
