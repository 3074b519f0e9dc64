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

//! Message frame header and the incremental parser that reassembles frames
//! out of arbitrarily-chunked byte arrivals.
//!
//! The wire layout is treated as an opaque collaborator: 4-byte magic,
//! 12-byte null-padded command name, 4-byte little-endian payload length,
//! 4-byte checksum, then the payload.

use std::collections::VecDeque;
use std::io::Read;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

/// Commands that get their own per-direction byte counter; anything else is
/// folded into the `*other*` bucket. Kept small and domain-specific rather
/// than open-ended, matching the wire's own small command vocabulary.
const COUNTED_COMMANDS: &[&str] = &[
	"version", "verack", "ping", "pong", "addr", "inv", "getdata", "tx", "block", "headers",
	"getheaders", "cmpctblock", "getblocktxn", "blocktxn", "sendcmpct",
];

pub const OTHER_BUCKET: &str = "*other*";

/// Buckets a command name for per-direction byte counters, shared by
/// `Stream` (per-stream totals) and `Association` (aggregate totals).
pub fn counter_bucket(command: &str) -> &'static str {
	COUNTED_COMMANDS
		.iter()
		.find(|c| **c == command)
		.copied()
		.unwrap_or(OTHER_BUCKET)
}

/// Outcome of feeding bytes to the frame parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecvStatus {
	Ok,
	/// Declared payload length exceeds the configured maximum -- a bannable
	/// offence, not a transient condition.
	BadLength,
	/// The frame is otherwise unparsable.
	Fail,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageHeader {
	pub magic: [u8; 4],
	pub command: [u8; 12],
	pub length: u32,
	pub checksum: [u8; 4],
}

impl MessageHeader {
	pub const LEN: usize = 4 + 12 + 4 + 4;

	pub fn new(magic: [u8; 4], command: &str, length: u32, checksum: [u8; 4]) -> Self {
		let mut cmd = [0u8; 12];
		let bytes = command.as_bytes();
		let n = bytes.len().min(12);
		cmd[..n].copy_from_slice(&bytes[..n]);
		MessageHeader {
			magic,
			command: cmd,
			length,
			checksum,
		}
	}

	/// Command name with trailing NUL padding stripped.
	pub fn command_str(&self) -> String {
		let end = self
			.command
			.iter()
			.position(|&b| b == 0)
			.unwrap_or(self.command.len());
		String::from_utf8_lossy(&self.command[..end]).into_owned()
	}

	fn parse(mut buf: &[u8]) -> MessageHeader {
		debug_assert_eq!(buf.len(), Self::LEN);
		let mut magic = [0u8; 4];
		buf.read_exact(&mut magic).expect("length checked by caller");
		let mut command = [0u8; 12];
		buf.read_exact(&mut command).expect("length checked by caller");
		let length = buf.read_u32::<LittleEndian>().expect("length checked by caller");
		let mut checksum = [0u8; 4];
		buf.read_exact(&mut checksum).expect("length checked by caller");
		MessageHeader {
			magic,
			command,
			length,
			checksum,
		}
	}

	pub fn write_to(&self, out: &mut Vec<u8>) {
		out.extend_from_slice(&self.magic);
		out.extend_from_slice(&self.command);
		out.write_u32::<LittleEndian>(self.length).expect("Vec<u8> writes never fail");
		out.extend_from_slice(&self.checksum);
	}

	pub fn to_bytes(&self) -> Vec<u8> {
		let mut out = Vec::with_capacity(Self::LEN);
		self.write_to(&mut out);
		out
	}
}

/// A single frame being reassembled: header bytes first, then payload bytes.
struct InFlightFrame {
	header_buf: Vec<u8>,
	header: Option<MessageHeader>,
	payload: Vec<u8>,
}

impl InFlightFrame {
	fn new() -> Self {
		InFlightFrame {
			header_buf: Vec::with_capacity(MessageHeader::LEN),
			header: None,
			payload: Vec::new(),
		}
	}

	fn is_complete(&self) -> bool {
		match &self.header {
			Some(h) => self.payload.len() as u64 == h.length as u64,
			None => false,
		}
	}

	fn pending_len(&self) -> usize {
		self.header_buf.len() + self.payload.len()
	}

	/// Consumes as many leading bytes of `bytes` as apply to this frame
	/// (header first, then payload), returning how many were consumed.
	fn feed(&mut self, bytes: &[u8], max_message_size: u32) -> (usize, RecvStatus) {
		let mut consumed = 0;
		let mut rest = bytes;

		if self.header.is_none() {
			let need = MessageHeader::LEN - self.header_buf.len();
			let take = need.min(rest.len());
			self.header_buf.extend_from_slice(&rest[..take]);
			consumed += take;
			rest = &rest[take..];

			if self.header_buf.len() == MessageHeader::LEN {
				let header = MessageHeader::parse(&self.header_buf);
				if header.length > max_message_size {
					return (consumed, RecvStatus::BadLength);
				}
				self.payload.reserve(header.length as usize);
				self.header = Some(header);
			} else {
				return (consumed, RecvStatus::Ok);
			}
		}

		if let Some(header) = &self.header {
			let need = header.length as usize - self.payload.len();
			let take = need.min(rest.len());
			self.payload.extend_from_slice(&rest[..take]);
			consumed += take;
		}

		(consumed, RecvStatus::Ok)
	}

	fn into_parts(self) -> (MessageHeader, Vec<u8>) {
		(
			self.header.expect("feed() guarantees a parsed header before completion"),
			self.payload,
		)
	}
}

/// Incremental frame reassembler driven by `receive_bytes`. Feeding the same
/// byte sequence split into any chunking yields the same sequence of
/// complete frames as feeding it in one call.
pub struct FrameParser {
	in_progress: Option<InFlightFrame>,
	complete: VecDeque<(MessageHeader, Vec<u8>)>,
}

impl FrameParser {
	pub fn new() -> Self {
		FrameParser {
			in_progress: None,
			complete: VecDeque::new(),
		}
	}

	pub fn receive_bytes(&mut self, mut bytes: &[u8], max_message_size: u32) -> RecvStatus {
		while !bytes.is_empty() {
			let frame = self.in_progress.get_or_insert_with(InFlightFrame::new);
			let (consumed, status) = frame.feed(bytes, max_message_size);
			if status != RecvStatus::Ok {
				return status;
			}
			if frame.is_complete() {
				let done = self.in_progress.take().unwrap();
				self.complete.push_back(done.into_parts());
			}
			if consumed == 0 {
				// Nothing fit (zero-length payload edge case already
				// handled by is_complete); avoid spinning.
				break;
			}
			bytes = &bytes[consumed..];
		}
		RecvStatus::Ok
	}

	pub fn pop_complete(&mut self) -> Option<(MessageHeader, Vec<u8>)> {
		self.complete.pop_front()
	}

	pub fn has_complete(&self) -> bool {
		!self.complete.is_empty()
	}

	/// Bytes currently buffered, complete or not -- used to compute the
	/// pause-receive threshold.
	pub fn queued_bytes(&self) -> usize {
		let in_progress = self.in_progress.as_ref().map_or(0, |f| f.pending_len());
		let complete: usize = self
			.complete
			.iter()
			.map(|(_, payload)| MessageHeader::LEN + payload.len())
			.sum();
		in_progress + complete
	}
}

impl Default for FrameParser {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn sample_message(command: &str, payload: &[u8]) -> Vec<u8> {
		let header = MessageHeader::new([0xab, 0xcd, 0xef, 0x01], command, payload.len() as u32, [0u8; 4]);
		let mut bytes = header.to_bytes();
		bytes.extend_from_slice(payload);
		bytes
	}

	#[test]
	fn parses_a_single_message_fed_whole() {
		let msg = sample_message("ping", b"hello");
		let mut parser = FrameParser::new();
		assert_eq!(parser.receive_bytes(&msg, 1 << 20), RecvStatus::Ok);
		let (header, payload) = parser.pop_complete().expect("one complete frame");
		assert_eq!(header.command_str(), "ping");
		assert_eq!(payload, b"hello");
		assert!(!parser.has_complete());
	}

	#[test]
	fn chunking_is_irrelevant_to_the_resulting_frames() {
		let mut whole = sample_message("block", b"0123456789");
		whole.extend(sample_message("tx", b"abc"));

		for split in 1..whole.len() {
			let (a, b) = whole.split_at(split);
			let mut parser = FrameParser::new();
			parser.receive_bytes(a, 1 << 20);
			parser.receive_bytes(b, 1 << 20);

			let (h1, p1) = parser.pop_complete().unwrap();
			let (h2, p2) = parser.pop_complete().unwrap();
			assert_eq!(h1.command_str(), "block");
			assert_eq!(p1, b"0123456789");
			assert_eq!(h2.command_str(), "tx");
			assert_eq!(p2, b"abc");
			assert!(!parser.has_complete());
		}
	}

	#[test]
	fn byte_at_a_time_matches_whole_message_feed() {
		let whole = sample_message("headers", b"zyxwvutsr");
		let mut parser = FrameParser::new();
		for b in &whole {
			assert_eq!(parser.receive_bytes(std::slice::from_ref(b), 1 << 20), RecvStatus::Ok);
		}
		let (header, payload) = parser.pop_complete().unwrap();
		assert_eq!(header.command_str(), "headers");
		assert_eq!(payload, b"zyxwvutsr");
	}

	#[test]
	fn oversized_declared_length_is_bad_length() {
		let header = MessageHeader::new([0, 0, 0, 0], "block", 100, [0u8; 4]);
		let mut parser = FrameParser::new();
		assert_eq!(parser.receive_bytes(&header.to_bytes(), 10), RecvStatus::BadLength);
	}
}
