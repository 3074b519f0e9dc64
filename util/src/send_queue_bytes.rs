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

//! Per-stream outbound queue byte counter that also maintains a process-wide
//! total, used upstream for admission control over how much unsent data the
//! process is willing to hold in memory.

use std::sync::atomic::{AtomicI64, Ordering};

static TOTAL_SEND_QUEUE_BYTES: AtomicI64 = AtomicI64::new(0);

/// Returns the total number of bytes queued for send across every
/// `SendQueueBytes` instance currently alive in the process.
pub fn total_send_queue_bytes() -> i64 {
	TOTAL_SEND_QUEUE_BYTES.load(Ordering::Relaxed)
}

pub struct SendQueueBytes {
	bytes: i64,
}

impl SendQueueBytes {
	pub fn new() -> Self {
		SendQueueBytes { bytes: 0 }
	}

	pub fn bytes(&self) -> i64 {
		self.bytes
	}

	pub fn add(&mut self, n: i64) {
		self.bytes += n;
		TOTAL_SEND_QUEUE_BYTES.fetch_add(n, Ordering::Relaxed);
	}

	pub fn sub(&mut self, n: i64) {
		self.bytes -= n;
		TOTAL_SEND_QUEUE_BYTES.fetch_sub(n, Ordering::Relaxed);
	}
}

impl Default for SendQueueBytes {
	fn default() -> Self {
		Self::new()
	}
}

impl Drop for SendQueueBytes {
	fn drop(&mut self) {
		TOTAL_SEND_QUEUE_BYTES.fetch_sub(self.bytes, Ordering::Relaxed);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn drop_returns_bytes_to_the_process_total() {
		let before = total_send_queue_bytes();
		{
			let mut q = SendQueueBytes::new();
			q.add(128);
			assert_eq!(total_send_queue_bytes(), before + 128);
		}
		assert_eq!(total_send_queue_bytes(), before);
	}
}
