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

//! `JournalIndex`: a stable-ish iterator over a `Journal`'s key-1 (insertion
//! position) order. Valid until the journal undergoes any change that isn't
//! tail-append-only -- at that point every position in the journal may have
//! shifted underneath it, so it reports itself invalid rather than risk
//! returning a stale or wrong entry.

use thiserror::Error;

use crate::journal::Journal;
use crate::journal_entry::JournalEntry;
use crate::time::now_micros;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum JournalIndexError {
	#[error("cannot reset an invalidated journal index")]
	Invalidated,
}

pub struct JournalIndex<'j, Txn: Clone> {
	journal: &'j Journal<Txn>,
	valid_time_micros: i64,
	pos: usize,
	previous: Option<usize>,
}

impl<'j, Txn: Clone> JournalIndex<'j, Txn> {
	/// An index positioned at the current head of the journal.
	pub fn begin(journal: &'j Journal<Txn>) -> Self {
		JournalIndex {
			journal,
			valid_time_micros: now_micros(),
			pos: 0,
			previous: None,
		}
	}

	pub fn valid(&self) -> bool {
		self.valid_time_micros > self.journal.last_invalidating_time_micros()
	}

	/// The entry at the current position, or `None` at the end.
	pub fn current(&self) -> Option<JournalEntry<Txn>> {
		self.journal.inner.read().entries.get_index(self.pos).map(|(_, e)| e.clone())
	}

	/// Advances one position, returning the entry that was current.
	pub fn next(&mut self) -> Option<JournalEntry<Txn>> {
		let entry = self.current();
		self.previous = Some(self.pos);
		self.pos += 1;
		entry
	}

	/// If this index previously ran off the end and items have since
	/// arrived, advances `current` onto the first unread one. A no-op if
	/// there's nothing new. Errors if the index has since been invalidated.
	pub fn reset(&mut self) -> Result<(), JournalIndexError> {
		if !self.valid() {
			return Err(JournalIndexError::Invalidated);
		}

		let len = self.journal.inner.read().entries.len();
		if self.pos >= len {
			match self.previous {
				Some(p) if p + 1 < len => self.pos = p + 1,
				None if len > 0 => self.pos = 0,
				_ => {}
			}
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::journal_change_set::JournalChangeSet;
	use crate::{JournalOperation, JournalUpdateReason};
	use peernet_core::Hash;

	fn entry(seed: u8) -> JournalEntry<&'static str> {
		let mut bytes = [0u8; 32];
		bytes[0] = seed;
		JournalEntry::new("tx", Hash::from_slice(&bytes), 0, 0)
	}

	#[test]
	fn iterates_in_insertion_order() {
		let journal: Journal<&'static str> = Journal::new();
		{
			let cs = JournalChangeSet::new(&journal, JournalUpdateReason::NewTxn);
			cs.add_operation(JournalOperation::Add, entry(1));
			cs.add_operation(JournalOperation::Add, entry(2));
		}

		let mut idx = JournalIndex::begin(&journal);
		assert_eq!(idx.next().unwrap().txid, entry(1).txid);
		assert_eq!(idx.next().unwrap().txid, entry(2).txid);
		assert!(idx.next().is_none());
	}

	#[test]
	fn reset_picks_up_items_added_after_running_off_the_end() {
		let journal: Journal<&'static str> = Journal::new();
		{
			let cs = JournalChangeSet::new(&journal, JournalUpdateReason::NewTxn);
			cs.add_operation(JournalOperation::Add, entry(1));
		}

		let mut idx = JournalIndex::begin(&journal);
		assert_eq!(idx.next().unwrap().txid, entry(1).txid);
		assert!(idx.next().is_none());

		{
			let cs = JournalChangeSet::new(&journal, JournalUpdateReason::NewTxn);
			cs.add_operation(JournalOperation::Add, entry(2));
		}

		idx.reset().unwrap();
		assert_eq!(idx.next().unwrap().txid, entry(2).txid);
	}

	#[test]
	fn reset_on_an_invalidated_index_is_an_error() {
		let journal: Journal<&'static str> = Journal::new();
		{
			let cs = JournalChangeSet::new(&journal, JournalUpdateReason::NewTxn);
			cs.add_operation(JournalOperation::Add, entry(1));
		}

		let mut idx = JournalIndex::begin(&journal);
		{
			let cs = JournalChangeSet::new(&journal, JournalUpdateReason::Reorg);
			cs.add_operation(JournalOperation::Add, entry(2));
		}

		assert!(!idx.valid());
		assert_eq!(idx.reset().unwrap_err(), JournalIndexError::Invalidated);
	}
}
