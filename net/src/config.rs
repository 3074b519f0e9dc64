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

//! Runtime-tunable knobs for the association/stream layer and the block
//! download tracker. Deliberately small and `Copy`-able: instances are read
//! far more often than written, on the hot socket-service path.

use std::time::Duration;

/// How many peers the tracker keeps elected as compact-block announcers.
pub const MAX_ANNOUNCING_PEERS: usize = 3;

#[derive(Debug, Clone, Copy)]
pub struct P2PConfig {
	/// Largest payload length accepted before a frame is treated as a
	/// bannable protocol violation.
	pub max_message_size: u32,
	/// Scratch buffer size used per non-blocking `recv` call.
	pub recv_buffer_size: usize,
	/// Bytes queued (complete + in-progress) on a stream's inbound side
	/// above which the stream is paused (left out of the readable set).
	pub recv_queue_cap: usize,
	/// Soft back-off applied by `PeerTooBusy`.
	pub too_busy_retry_delay: Duration,
	/// Capacity of the rolling bandwidth sample ring.
	pub bandwidth_ring_capacity: usize,
}

impl Default for P2PConfig {
	fn default() -> Self {
		P2PConfig {
			max_message_size: 32 * 1024 * 1024,
			recv_buffer_size: 64 * 1024,
			recv_queue_cap: 16 * 1024 * 1024,
			too_busy_retry_delay: Duration::from_secs(120),
			bandwidth_ring_capacity: 60,
		}
	}
}
