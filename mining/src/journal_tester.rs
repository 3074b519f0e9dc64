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

//! `JournalTester`: a read-locked snapshot copy of a `Journal`, rebuilt into
//! a form that favours fast repeated ordering queries over update speed --
//! appropriate for tests, which query the same snapshot many times and never
//! mutate it.

use indexmap::IndexMap;

use peernet_core::Hash;

use crate::journal::Journal;
use crate::journal_entry::JournalEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxnOrder {
	Before,
	After,
	NotFound,
	DuplicateTx,
	/// Reserved for parity with the source enum; never produced by
	/// `check_txn_ordering`.
	Unknown,
}

pub struct JournalTester<Txn: Clone> {
	entries: IndexMap<Hash, JournalEntry<Txn>>,
}

impl<Txn: Clone> JournalTester<Txn> {
	/// Takes a snapshot copy of `journal` under its read lock.
	pub fn new(journal: &Journal<Txn>) -> Self {
		let inner = journal.inner.read();
		JournalTester {
			entries: inner.entries.clone(),
		}
	}

	pub fn size(&self) -> usize {
		self.entries.len()
	}

	pub fn check_txn_exists(&self, txid: &Hash) -> bool {
		self.entries.contains_key(txid)
	}

	pub fn check_txn_ordering(&self, a: &Hash, b: &Hash) -> TxnOrder {
		if a == b {
			return if self.entries.contains_key(a) {
				TxnOrder::DuplicateTx
			} else {
				TxnOrder::NotFound
			};
		}

		match (self.entries.get_index_of(a), self.entries.get_index_of(b)) {
			(Some(pa), Some(pb)) if pa < pb => TxnOrder::Before,
			(Some(_), Some(_)) => TxnOrder::After,
			_ => TxnOrder::NotFound,
		}
	}

	pub fn dump_contents(&self) -> Vec<JournalEntry<Txn>> {
		self.entries.values().cloned().collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::journal_change_set::JournalChangeSet;
	use crate::{JournalOperation, JournalUpdateReason};

	fn entry(seed: u8) -> JournalEntry<&'static str> {
		let mut bytes = [0u8; 32];
		bytes[0] = seed;
		JournalEntry::new("tx", Hash::from_slice(&bytes), 0, 0)
	}

	#[test]
	fn reports_ordering_between_two_known_txns() {
		let journal: Journal<&'static str> = Journal::new();
		{
			let cs = JournalChangeSet::new(&journal, JournalUpdateReason::NewTxn);
			cs.add_operation(JournalOperation::Add, entry(1));
			cs.add_operation(JournalOperation::Add, entry(2));
		}

		let tester = JournalTester::new(&journal);
		assert_eq!(tester.size(), 2);
		assert_eq!(tester.check_txn_ordering(&entry(1).txid, &entry(2).txid), TxnOrder::Before);
		assert_eq!(tester.check_txn_ordering(&entry(2).txid, &entry(1).txid), TxnOrder::After);
		assert_eq!(tester.check_txn_ordering(&entry(1).txid, &entry(1).txid), TxnOrder::DuplicateTx);
	}

	#[test]
	fn unknown_txn_is_not_found() {
		let journal: Journal<&'static str> = Journal::new();
		let tester = JournalTester::new(&journal);
		assert_eq!(tester.check_txn_ordering(&entry(1).txid, &entry(2).txid), TxnOrder::NotFound);
		assert!(!tester.check_txn_exists(&entry(1).txid));
	}

	#[test]
	fn snapshot_does_not_see_changes_made_after_construction() {
		let journal: Journal<&'static str> = Journal::new();
		{
			let cs = JournalChangeSet::new(&journal, JournalUpdateReason::NewTxn);
			cs.add_operation(JournalOperation::Add, entry(1));
		}
		let tester = JournalTester::new(&journal);
		{
			let cs = JournalChangeSet::new(&journal, JournalUpdateReason::NewTxn);
			cs.add_operation(JournalOperation::Add, entry(2));
		}
		assert_eq!(tester.size(), 1);
	}
}
