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

//! Pluggable dispatch strategy: given an outbound message, chooses which
//! stream carries it; given a set of streams, picks inbound read priority.
//!
//! One virtual-dispatch site per message, on the hot path, so the two
//! concrete strategies are a tagged enum rather than a trait object -- the
//! trait exists for callers that want to be generic over the strategy (e.g.
//! tests), but `Association` stores the enum directly.

use crate::stream_type::StreamType;

/// Commands routed to the priority stream under `BlockPriority`. Anything
/// not listed here, and not separately tagged as block-payload traffic,
/// goes to `GENERAL`.
const BLOCK_PRIORITY_COMMANDS: &[&str] = &[
	"block",
	"cmpctblock",
	"blocktxn",
	"getblocktxn",
	"headers",
	"getheaders",
	"ping",
	"pong",
];

pub trait StreamPolicy: Send + Sync {
	/// Which stream type should carry an outbound message. `is_block_payload`
	/// is set by the caller for messages whose payload is itself tagged as
	/// block data, independent of their command name.
	fn outbound_stream_for(&self, command: &str, is_block_payload: bool) -> StreamType;

	/// Stream types to poll for inbound messages, in priority order.
	fn inbound_priority(&self) -> &'static [StreamType];

	/// Stream types (beyond the always-present `GENERAL`) this policy wants
	/// opened on a fresh `Association`.
	fn extra_stream_types(&self) -> &'static [StreamType];
}

/// Single `GENERAL` stream, equal priority for every message.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPolicy;

impl StreamPolicy for DefaultPolicy {
	fn outbound_stream_for(&self, _command: &str, _is_block_payload: bool) -> StreamType {
		StreamType::General
	}

	fn inbound_priority(&self) -> &'static [StreamType] {
		&[StreamType::General]
	}

	fn extra_stream_types(&self) -> &'static [StreamType] {
		&[]
	}
}

/// Adds a `DATA1` stream that carries block and ping/pong traffic, so it can
/// overtake queued relay traffic on `GENERAL`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockPriorityPolicy;

impl StreamPolicy for BlockPriorityPolicy {
	fn outbound_stream_for(&self, command: &str, is_block_payload: bool) -> StreamType {
		if is_block_payload || BLOCK_PRIORITY_COMMANDS.contains(&command) {
			StreamType::Data1
		} else {
			StreamType::General
		}
	}

	fn inbound_priority(&self) -> &'static [StreamType] {
		&[StreamType::Data1, StreamType::General]
	}

	fn extra_stream_types(&self) -> &'static [StreamType] {
		&[StreamType::Data1]
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn default_policy_sends_everything_to_general() {
		let p = DefaultPolicy;
		assert_eq!(p.outbound_stream_for("block", true), StreamType::General);
		assert_eq!(p.outbound_stream_for("tx", false), StreamType::General);
		assert_eq!(p.inbound_priority(), &[StreamType::General]);
		assert!(p.extra_stream_types().is_empty());
	}

	#[test]
	fn block_priority_routes_block_traffic_to_data1() {
		let p = BlockPriorityPolicy;
		assert_eq!(p.outbound_stream_for("block", false), StreamType::Data1);
		assert_eq!(p.outbound_stream_for("cmpctblock", false), StreamType::Data1);
		assert_eq!(p.outbound_stream_for("ping", false), StreamType::Data1);
		assert_eq!(p.outbound_stream_for("tx", false), StreamType::General);
		assert_eq!(p.outbound_stream_for("version", true), StreamType::Data1);
	}

	#[test]
	fn block_priority_reads_data1_before_general() {
		let p = BlockPriorityPolicy;
		assert_eq!(p.inbound_priority(), &[StreamType::Data1, StreamType::General]);
		assert_eq!(p.extra_stream_types(), &[StreamType::Data1]);
	}
}
