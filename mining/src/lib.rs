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

#![deny(non_upper_case_globals)]
#![deny(non_camel_case_types)]
#![deny(non_snake_case)]
#![deny(unused_mut)]

//! Block download tracking and the mempool journal used to build block
//! templates: the two globally-shared structures that sit downstream of the
//! association/stream layer.

pub mod block_download_tracker;
pub mod journal;
pub mod journal_change_set;
pub mod journal_entry;
pub mod journal_index;
pub mod journal_tester;
mod time;

pub use block_download_tracker::{
	BlockCheckOutcome, BlockDownloadTracker, BlockPunish, InFlightBlock, PeerBlockState,
	QueuedBlock, QueuedBlockSlot, RejectRecord, TrackerError, ValidationState,
};
pub use journal::Journal;
pub use journal_change_set::JournalChangeSet;
pub use journal_entry::JournalEntry;
pub use journal_index::{JournalIndex, JournalIndexError};
pub use journal_tester::{JournalTester, TxnOrder};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JournalOperation {
	Add,
	Remove,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JournalUpdateReason {
	NewTxn,
	RemoveTxn,
	ReplaceTxn,
	NewBlock,
	Reorg,
	Init,
	Reset,
	Unknown,
}

impl JournalUpdateReason {
	/// A "basic" reason can be applied to the journal incrementally, one
	/// operation at a time, to minimise the window before a change lands.
	/// The others accumulate a full batch (`NEW_BLOCK`, `REORG`, `RESET`
	/// need every operation together: `REORG`/`RESET` to sort by ancestor
	/// count, `NEW_BLOCK` to land its removals atomically with its adds).
	pub fn is_basic(self) -> bool {
		!matches!(
			self,
			JournalUpdateReason::NewBlock | JournalUpdateReason::Reorg | JournalUpdateReason::Reset
		)
	}
}
