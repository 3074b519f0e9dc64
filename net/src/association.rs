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

//! `Association`: the logical peer connection. Owns a `StreamType`-keyed set
//! of streams, an optional `AssociationID`, the peer's reported local
//! address, and the aggregate per-command counters summed across streams.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use log::error;
use parking_lot::Mutex;

use crate::association_id::AssociationID;
use crate::config::P2PConfig;
use crate::error::{Error, Result};
use crate::message::{counter_bucket, MessageHeader};
use crate::stream::{Socket, Stream};
use crate::stream_policy::StreamPolicy;
use crate::stream_type::StreamType;

/// Aggregate counters derived from every stream owned by an association, as
/// returned by `copy_stats`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssociationStats {
	pub last_send: Option<Instant>,
	pub last_recv: Option<Instant>,
	pub send_bytes: u64,
	pub recv_bytes: u64,
	pub send_queue_size: i64,
	pub avg_bandwidth: f64,
}

/// Sum of `service_socket` results across every stream on this association.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssociationServiceResult {
	pub got_messages: bool,
	pub bytes_recv: u64,
	pub bytes_sent: u64,
}

pub struct Association<S: Socket> {
	remote_addr: SocketAddr,
	local_addr: Mutex<Option<SocketAddr>>,
	association_id: Mutex<Option<AssociationID>>,
	streams: Mutex<HashMap<StreamType, Stream<S>>>,
	policy: Box<dyn StreamPolicy>,
	send_totals: Mutex<HashMap<String, u64>>,
	recv_totals: Mutex<HashMap<String, u64>>,
	config: P2PConfig,
	shut_down: AtomicBool,
}

impl<S: Socket> Association<S> {
	/// Opens the mandatory `GENERAL` stream over `general_socket`. Any extra
	/// stream types the policy wants (e.g. `BlockPriority`'s `DATA1`) are
	/// added later via `add_stream`, once the corresponding connection has
	/// been negotiated.
	pub fn new(
		remote_addr: SocketAddr,
		general_socket: S,
		policy: Box<dyn StreamPolicy>,
		config: P2PConfig,
	) -> Self {
		let mut streams = HashMap::new();
		streams.insert(
			StreamType::General,
			Stream::new(StreamType::General, general_socket, &config),
		);
		Association {
			remote_addr,
			local_addr: Mutex::new(None),
			association_id: Mutex::new(None),
			streams: Mutex::new(streams),
			policy,
			send_totals: Mutex::new(HashMap::new()),
			recv_totals: Mutex::new(HashMap::new()),
			config,
			shut_down: AtomicBool::new(false),
		}
	}

	pub fn remote_addr(&self) -> SocketAddr {
		self.remote_addr
	}

	pub fn policy(&self) -> &dyn StreamPolicy {
		self.policy.as_ref()
	}

	/// Opens a new stream under `stream_type`. Fails if one already exists
	/// under that type.
	pub fn add_stream(&self, stream_type: StreamType, socket: S) -> Result<()> {
		let mut streams = self.streams.lock();
		if streams.contains_key(&stream_type) {
			return Err(Error::StreamTypeOccupied(stream_type));
		}
		streams.insert(stream_type, Stream::new(stream_type, socket, &self.config));
		Ok(())
	}

	pub fn stream_count(&self) -> usize {
		self.streams.lock().len()
	}

	pub fn has_stream(&self, stream_type: StreamType) -> bool {
		self.streams.lock().contains_key(&stream_type)
	}

	pub fn association_id(&self) -> Option<AssociationID> {
		*self.association_id.lock()
	}

	/// One-shot: a second call while an id is already set logs and leaves
	/// the existing id untouched.
	pub fn set_association_id(&self, id: AssociationID) {
		let mut guard = self.association_id.lock();
		if guard.is_some() {
			error!("association id already set for {}, ignoring", self.remote_addr);
			return;
		}
		*guard = Some(id);
	}

	pub fn clear_association_id(&self) {
		*self.association_id.lock() = None;
	}

	pub fn local_addr(&self) -> Option<SocketAddr> {
		*self.local_addr.lock()
	}

	/// One-shot, matching `AssociationID`'s set-once semantics.
	pub fn set_local_addr(&self, addr: SocketAddr) {
		let mut guard = self.local_addr.lock();
		if guard.is_some() {
			error!("local address already set for {}, ignoring", self.remote_addr);
			return;
		}
		*guard = Some(addr);
	}

	/// Atomically transfers the sole stream of `self` to `target` under
	/// `new_type`. Both associations' stream-set locks are acquired in a
	/// fixed order (by `self`/`target` memory address) regardless of which
	/// side the call is made from, so two concurrent moves between the same
	/// pair of associations cannot deadlock.
	pub fn move_stream(&self, new_type: StreamType, target: &Association<S>) -> Result<()> {
		let self_ptr = self as *const Self as usize;
		let target_ptr = target as *const Self as usize;
		debug_assert!(self_ptr != target_ptr, "move_stream target must differ from source");

		let (mut lower, mut higher) = if self_ptr < target_ptr {
			(self.streams.lock(), target.streams.lock())
		} else {
			(target.streams.lock(), self.streams.lock())
		};
		let (self_streams, target_streams) = if self_ptr < target_ptr {
			(&mut lower, &mut higher)
		} else {
			(&mut higher, &mut lower)
		};

		if self_streams.len() != 1 {
			return Err(Error::NotSingleStream);
		}
		if target_streams.contains_key(&new_type) {
			return Err(Error::StreamTypeOccupied(new_type));
		}

		let only_type = *self_streams.keys().next().expect("checked len() == 1 above");
		let stream = self_streams.remove(&only_type).expect("key just observed present");
		target_streams.insert(new_type, stream);
		Ok(())
	}

	/// Sends `payload` under `header` on the stream `requested` names, or on
	/// whichever stream the policy chooses if `requested` is `UNKNOWN`.
	/// `is_block_payload` lets callers tag messages whose payload is block
	/// data independent of their command name, per `BlockPriority`.
	pub fn push_message_to(
		&self,
		requested: StreamType,
		header: &MessageHeader,
		payload: &[u8],
		is_block_payload: bool,
	) -> Result<u64> {
		let command = header.command_str();
		let stream_type = if requested.is_known() {
			requested
		} else {
			self.policy.outbound_stream_for(&command, is_block_payload)
		};

		let sent = {
			let mut streams = self.streams.lock();
			let stream = streams
				.get_mut(&stream_type)
				.ok_or_else(|| Error::NoSuchStream {
					requested: stream_type,
					command: command.clone(),
				})?;
			stream.push_message(header, payload)
		};

		let bucket = counter_bucket(&command).to_string();
		*self.send_totals.lock().entry(bucket).or_insert(0) +=
			(MessageHeader::LEN + payload.len()) as u64;
		Ok(sent)
	}

	/// Convenience for the common case of no specific stream preference.
	pub fn push_message(&self, header: &MessageHeader, payload: &[u8], is_block_payload: bool) -> Result<u64> {
		self.push_message_to(StreamType::Unknown, header, payload, is_block_payload)
	}

	/// Drains every complete inbound frame from every stream into `out`,
	/// updating the association-level per-command receive totals as it goes.
	pub fn get_new_msgs(&self, out: &mut Vec<(MessageHeader, Vec<u8>)>) {
		let mut streams = self.streams.lock();
		let mut recv_totals = self.recv_totals.lock();
		for stream in streams.values_mut() {
			loop {
				let (msg, more) = stream.get_next_message(&self.config);
				match msg {
					Some((header, payload)) => {
						let bucket = counter_bucket(&header.command_str()).to_string();
						*recv_totals.entry(bucket).or_insert(0) +=
							(MessageHeader::LEN + payload.len()) as u64;
						out.push((header, payload));
					}
					None => break,
				}
				if !more {
					break;
				}
			}
		}
	}

	/// Services readiness for every stream's socket. `readiness` is queried
	/// once per stream with its `StreamType` and should return
	/// `(readable, writable, errored)` as observed by the I/O thread's
	/// readiness multiplexer for that socket.
	pub fn service_sockets<F>(&self, readiness: F) -> AssociationServiceResult
	where
		F: Fn(StreamType) -> (bool, bool, bool),
	{
		let mut total = AssociationServiceResult::default();
		let mut streams = self.streams.lock();
		for (&stype, stream) in streams.iter_mut() {
			let (readable, writable, errored) = readiness(stype);
			let result = stream.service_socket(readable, writable, errored, &self.config);
			total.got_messages |= result.got_messages;
			total.bytes_recv += result.bytes_recv;
			total.bytes_sent += result.bytes_sent;
		}
		total
	}

	/// Any stream flagged its owning socket for disconnect.
	pub fn should_disconnect(&self) -> bool {
		self.streams.lock().values().any(|s| s.should_disconnect())
	}

	/// Any stream saw a bannable protocol violation (malformed/oversized
	/// frame), as distinct from a plain disconnect.
	pub fn should_ban(&self) -> bool {
		self.streams.lock().values().any(|s| s.should_ban())
	}

	/// The socket-service call site's translation of stream-level ban state
	/// into the peer-bannable error the caller acts on (disconnect + ban).
	pub fn check_bannable(&self) -> Result<()> {
		if self.should_ban() {
			Err(Error::Bannable)
		} else {
			Ok(())
		}
	}

	pub fn copy_stats(&self) -> AssociationStats {
		let streams = self.streams.lock();
		let mut stats = AssociationStats::default();
		let mut weighted_bandwidth = 0.0;
		let mut total_samples = 0usize;

		for stream in streams.values() {
			let s = stream.copy_stats();
			stats.last_send = max_opt(stats.last_send, s.last_send);
			stats.last_recv = max_opt(stats.last_recv, s.last_recv);
			stats.send_bytes += s.bytes_sent;
			stats.recv_bytes += s.bytes_recv;
			stats.send_queue_size += s.send_queue_size;
			weighted_bandwidth += s.avg_bandwidth * s.avg_bandwidth_samples as f64;
			total_samples += s.avg_bandwidth_samples;
		}

		if total_samples > 0 {
			stats.avg_bandwidth = weighted_bandwidth / total_samples as f64;
		}
		stats
	}

	/// Idempotent: shuts down every stream. Safe to call from a teardown
	/// path that may race with an in-flight `service_sockets` call.
	pub fn shutdown(&self) {
		if self.shut_down.swap(true, Ordering::SeqCst) {
			return;
		}
		let mut streams = self.streams.lock();
		for stream in streams.values_mut() {
			stream.shutdown();
		}
	}

	pub fn is_shut_down(&self) -> bool {
		self.shut_down.load(Ordering::SeqCst)
	}
}

fn max_opt(a: Option<Instant>, b: Option<Instant>) -> Option<Instant> {
	match (a, b) {
		(Some(a), Some(b)) => Some(a.max(b)),
		(Some(a), None) => Some(a),
		(None, b) => b,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::message::MessageHeader;
	use crate::stream_policy::{BlockPriorityPolicy, DefaultPolicy};
	use std::io;

	struct MockSocket;

	impl Socket for MockSocket {
		fn recv(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
			Err(io::Error::new(io::ErrorKind::WouldBlock, "no data"))
		}
		fn send(&mut self, buf: &[u8]) -> io::Result<usize> {
			Ok(buf.len())
		}
		fn shutdown(&mut self) {}
	}

	/// Yields one chunk of queued bytes, then behaves like `MockSocket`.
	struct OneShotSocket {
		pending: Option<Vec<u8>>,
	}

	impl Socket for OneShotSocket {
		fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
			match self.pending.take() {
				Some(chunk) => {
					let n = chunk.len().min(buf.len());
					buf[..n].copy_from_slice(&chunk[..n]);
					Ok(n)
				}
				None => Err(io::Error::new(io::ErrorKind::WouldBlock, "no data")),
			}
		}
		fn send(&mut self, buf: &[u8]) -> io::Result<usize> {
			Ok(buf.len())
		}
		fn shutdown(&mut self) {}
	}

	fn addr(port: u16) -> SocketAddr {
		format!("127.0.0.1:{}", port).parse().unwrap()
	}

	fn assoc(port: u16, policy: Box<dyn StreamPolicy>) -> Association<MockSocket> {
		Association::new(addr(port), MockSocket, policy, P2PConfig::default())
	}

	#[test]
	fn association_id_is_set_once() {
		let a = assoc(1, Box::new(DefaultPolicy));
		let id = AssociationID::new_uuid();
		a.set_association_id(id);
		let other = AssociationID::new_uuid();
		a.set_association_id(other);
		assert_eq!(a.association_id(), Some(id));
	}

	#[test]
	fn move_stream_requires_exactly_one_source_stream() {
		let a = assoc(2, Box::new(BlockPriorityPolicy));
		a.add_stream(StreamType::Data1, MockSocket).unwrap();
		let b = assoc(3, Box::new(DefaultPolicy));

		let err = a.move_stream(StreamType::Data1, &b).unwrap_err();
		assert!(matches!(err, Error::NotSingleStream));
		assert_eq!(a.stream_count(), 2);
		assert_eq!(b.stream_count(), 1);
	}

	#[test]
	fn move_stream_fails_if_target_slot_occupied() {
		let a = assoc(4, Box::new(DefaultPolicy));
		let b = assoc(5, Box::new(DefaultPolicy));

		let err = a.move_stream(StreamType::General, &b).unwrap_err();
		assert!(matches!(err, Error::StreamTypeOccupied(StreamType::General)));
	}

	#[test]
	fn move_stream_transfers_the_sole_stream() {
		let a = assoc(6, Box::new(DefaultPolicy));
		let b = assoc(7, Box::new(BlockPriorityPolicy));

		a.move_stream(StreamType::Data1, &b).unwrap();
		assert_eq!(a.stream_count(), 0);
		assert_eq!(b.stream_count(), 2);
		assert!(b.has_stream(StreamType::Data1));
	}

	#[test]
	fn push_message_fails_for_a_stream_type_that_does_not_exist() {
		let a = assoc(8, Box::new(DefaultPolicy));
		let header = MessageHeader::new([0; 4], "ping", 0, [0; 4]);
		let err = a
			.push_message_to(StreamType::Data1, &header, &[], false)
			.unwrap_err();
		assert!(matches!(err, Error::NoSuchStream { .. }));
	}

	#[test]
	fn shutdown_is_idempotent() {
		let a = assoc(9, Box::new(DefaultPolicy));
		a.shutdown();
		a.shutdown();
		assert!(a.is_shut_down());
	}

	#[test]
	fn an_oversized_frame_makes_check_bannable_fail() {
		let config = P2PConfig::default();
		let header = MessageHeader::new([0; 4], "block", config.max_message_size + 1, [0; 4]);
		let socket = OneShotSocket {
			pending: Some(header.to_bytes()),
		};
		let a = Association::new(addr(10), socket, Box::new(DefaultPolicy), config);

		a.service_sockets(|_| (true, false, false));

		assert!(a.should_ban());
		assert!(matches!(a.check_bannable(), Err(Error::Bannable)));
	}
}
