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

//! Linear-drain rate limiter: a fill level that drains at a fixed rate and
//! saturates at a capacity, used to pace things like double-spend
//! notification sends without pulling in a full token-bucket crate.

use std::time::{Duration, Instant};

pub struct LeakyBucket {
	capacity: f64,
	fill_level: f64,
	drain_per_sec: f64,
	last_drain: Instant,
}

impl LeakyBucket {
	/// `drain_amount` units drain every `drain_period`, e.g. `(1, 1ms)` for a
	/// drain rate of one unit per millisecond.
	pub fn new(capacity: u64, drain_amount: u64, drain_period: Duration) -> Self {
		LeakyBucket {
			capacity: capacity as f64,
			fill_level: 0.0,
			drain_per_sec: drain_amount as f64 / drain_period.as_secs_f64(),
			last_drain: Instant::now(),
		}
	}

	fn drain(&mut self) {
		let now = Instant::now();
		let elapsed = now.saturating_duration_since(self.last_drain);
		self.last_drain = now;
		let drained = elapsed.as_secs_f64() * self.drain_per_sec;
		self.fill_level = (self.fill_level - drained).max(0.0);
	}

	/// Current fill level, after draining for elapsed time.
	pub fn fill_level(&mut self) -> u64 {
		self.drain();
		self.fill_level.round() as u64
	}

	/// Attempts to add `amount` to the bucket. Returns `true` if the addition
	/// would have exceeded capacity -- in that case the bucket is left
	/// unchanged (the call is rejected, not clamped).
	pub fn add(&mut self, amount: u64) -> bool {
		self.drain();
		let prospective = self.fill_level + amount as f64;
		if prospective > self.capacity {
			true
		} else {
			self.fill_level = prospective;
			false
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::thread::sleep;

	#[test]
	fn fills_and_drains_linearly() {
		let mut b = LeakyBucket::new(1000, 1, Duration::from_millis(1));
		assert!(!b.add(500));

		sleep(Duration::from_millis(520));
		assert_eq!(b.fill_level(), 0);
	}

	#[test]
	fn second_add_past_capacity_overflows_and_is_rejected() {
		let mut b = LeakyBucket::new(1000, 1, Duration::from_millis(1));
		assert!(!b.add(1000));
		assert!(b.add(1000));
		assert_eq!(b.fill_level(), 1000);
	}
}
