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

//! Rolling bandwidth measurement: a fixed-capacity ring of `bytes/sec` spot
//! samples, one per measurement tick, reduced to a simple mean.

use std::collections::VecDeque;
use std::time::Instant;

/// One sample per tick for a minute at the default one-second tick cadence.
pub const DEFAULT_RING_CAPACITY: usize = 60;

pub struct BandwidthMeter {
	capacity: usize,
	samples: VecDeque<f64>,
	bytes_this_spot: u64,
	last_spot: Instant,
}

impl BandwidthMeter {
	pub fn new(capacity: usize) -> Self {
		BandwidthMeter {
			capacity,
			samples: VecDeque::with_capacity(capacity),
			bytes_this_spot: 0,
			last_spot: Instant::now(),
		}
	}

	/// Accumulates bytes transferred since the last tick.
	pub fn record_bytes(&mut self, n: u64) {
		self.bytes_this_spot += n;
	}

	/// Takes a spot sample of `bytes / elapsed_secs` and appends it to the
	/// ring, evicting the oldest sample if the ring is full. A tick with no
	/// elapsed time contributes nothing (division by zero is avoided, not
	/// sampled).
	pub fn tick(&mut self) {
		let now = Instant::now();
		let elapsed = now.saturating_duration_since(self.last_spot);
		self.last_spot = now;

		let secs = elapsed.as_secs_f64();
		if secs <= 0.0 {
			self.bytes_this_spot = 0;
			return;
		}

		let sample = self.bytes_this_spot as f64 / secs;
		self.bytes_this_spot = 0;

		if self.samples.len() >= self.capacity {
			self.samples.pop_front();
		}
		self.samples.push_back(sample);
	}

	/// Mean bytes/sec over the ring, and the number of samples it rests on.
	/// `(0.0, 0)` if no samples have been taken yet.
	pub fn average(&self) -> (f64, usize) {
		if self.samples.is_empty() {
			return (0.0, 0);
		}
		let sum: f64 = self.samples.iter().sum();
		(sum / self.samples.len() as f64, self.samples.len())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::thread::sleep;
	use std::time::Duration;

	#[test]
	fn no_samples_reports_zero_over_zero() {
		let m = BandwidthMeter::new(DEFAULT_RING_CAPACITY);
		assert_eq!(m.average(), (0.0, 0));
	}

	#[test]
	fn ring_evicts_oldest_sample_past_capacity() {
		let mut m = BandwidthMeter::new(2);
		m.record_bytes(100);
		m.tick();
		sleep(Duration::from_millis(5));
		m.record_bytes(100);
		m.tick();
		sleep(Duration::from_millis(5));
		m.record_bytes(100);
		m.tick();

		let (_, count) = m.average();
		assert_eq!(count, 2);
	}
}
