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

//! A `JournalEntry` is an immutable handle to a mempool transaction plus its
//! precomputed ancestor/descendant counts. Generic over the transaction
//! handle type `Txn` -- the journal never inspects it beyond cloning it, so
//! callers can hand in an `Arc<Transaction>` or similar cheap-to-clone ref.

use peernet_core::Hash;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalEntry<Txn: Clone> {
	pub txn: Txn,
	pub txid: Hash,
	pub ancestor_count: u64,
	pub descendant_count: u64,
}

impl<Txn: Clone> JournalEntry<Txn> {
	pub fn new(txn: Txn, txid: Hash, ancestor_count: u64, descendant_count: u64) -> Self {
		JournalEntry {
			txn,
			txid,
			ancestor_count,
			descendant_count,
		}
	}
}
