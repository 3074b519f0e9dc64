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

//! A `Stream` owns one socket: it parses inbound bytes into message frames,
//! queues outbound messages, and tracks the counters a readiness-driven I/O
//! loop needs to decide what to poll for next.

use std::collections::{HashMap, VecDeque};
use std::io;
use std::time::Instant;

use log::{debug, error};
use peernet_util::{BandwidthMeter, SendQueueBytes};

use crate::config::P2PConfig;
use crate::message::{counter_bucket, FrameParser, MessageHeader, RecvStatus};
use crate::stream_type::StreamType;

/// Abstraction over a non-blocking socket, so the stream's framing and
/// bookkeeping logic can be exercised without a real file descriptor.
pub trait Socket: Send {
	/// Non-blocking read. `Ok(0)` means the peer closed the connection.
	/// `Err` with `ErrorKind::WouldBlock`/`Interrupted` is transient.
	fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize>;
	/// Non-blocking write; returns the number of bytes actually written.
	fn send(&mut self, buf: &[u8]) -> io::Result<usize>;
	fn shutdown(&mut self);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StreamStats {
	pub bytes_recv: u64,
	pub bytes_sent: u64,
	pub send_queue_size: i64,
	pub last_send: Option<Instant>,
	pub last_recv: Option<Instant>,
	pub avg_bandwidth: f64,
	pub avg_bandwidth_samples: usize,
}

/// Result of one `ServiceSocket` pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct ServiceResult {
	pub got_messages: bool,
	pub bytes_recv: u64,
	pub bytes_sent: u64,
}

pub struct Stream<S: Socket> {
	stream_type: StreamType,
	socket: Option<S>,
	parser: FrameParser,
	send_queue: VecDeque<Vec<u8>>,
	send_offset: usize,
	send_queue_bytes: SendQueueBytes,
	bandwidth: BandwidthMeter,
	ready: VecDeque<(MessageHeader, Vec<u8>)>,
	recv_bytes_total: HashMap<String, u64>,
	sent_bytes_total: HashMap<String, u64>,
	last_send: Option<Instant>,
	last_recv: Option<Instant>,
	paused_recv: bool,
	node_flagged_for_disconnect: bool,
	node_flagged_for_ban: bool,
	shut_down: bool,
}

impl<S: Socket> Stream<S> {
	pub fn new(stream_type: StreamType, socket: S, config: &P2PConfig) -> Self {
		Stream {
			stream_type,
			socket: Some(socket),
			parser: FrameParser::new(),
			send_queue: VecDeque::new(),
			send_offset: 0,
			send_queue_bytes: SendQueueBytes::new(),
			bandwidth: BandwidthMeter::new(config.bandwidth_ring_capacity),
			ready: VecDeque::new(),
			recv_bytes_total: HashMap::new(),
			sent_bytes_total: HashMap::new(),
			last_send: None,
			last_recv: None,
			paused_recv: false,
			node_flagged_for_disconnect: false,
			node_flagged_for_ban: false,
			shut_down: false,
		}
	}

	pub fn stream_type(&self) -> StreamType {
		self.stream_type
	}

	pub fn is_paused_recv(&self) -> bool {
		self.paused_recv
	}

	pub fn should_disconnect(&self) -> bool {
		self.node_flagged_for_disconnect
	}

	/// A bannable protocol violation (malformed/oversized frame) was seen on
	/// this stream, as distinct from a plain disconnect (EOF, socket error).
	pub fn should_ban(&self) -> bool {
		self.node_flagged_for_ban
	}

	fn queued_recv_bytes(&self) -> usize {
		let ready: usize = self
			.ready
			.iter()
			.map(|(_, payload)| MessageHeader::LEN + payload.len())
			.sum();
		self.parser.queued_bytes() + ready
	}

	fn recompute_paused_recv(&mut self, config: &P2PConfig) {
		self.paused_recv = self.queued_recv_bytes() > config.recv_queue_cap;
	}

	/// Services readiness for this stream's socket: reads available bytes if
	/// readable or errored, writes queued bytes if writable.
	pub fn service_socket(
		&mut self,
		readable: bool,
		writable: bool,
		errored: bool,
		config: &P2PConfig,
	) -> ServiceResult {
		let mut result = ServiceResult::default();

		if self.shut_down || self.socket.is_none() {
			return result;
		}

		if readable || errored {
			let mut buf = vec![0u8; config.recv_buffer_size];
			loop {
				let n = {
					let socket = self.socket.as_mut().unwrap();
					socket.recv(&mut buf)
				};
				match n {
					Ok(0) => {
						self.node_flagged_for_disconnect = true;
						break;
					}
					Ok(n) => {
						result.bytes_recv += n as u64;
						let status = self.receive_bytes(&buf[..n], config);
						if status != RecvStatus::Ok {
							error!(
								"stream {}: bannable frame parse error {:?}, flagging for ban",
								self.stream_type, status
							);
							self.node_flagged_for_ban = true;
							self.node_flagged_for_disconnect = true;
							break;
						}
						if n < buf.len() {
							break;
						}
					}
					Err(e) if is_transient(&e) => break,
					Err(_) => {
						self.node_flagged_for_disconnect = true;
						break;
					}
				}
			}
			if !self.ready.is_empty() {
				result.got_messages = true;
			}
		}

		if writable {
			result.bytes_sent += self.socket_send_data();
		}

		result
	}

	/// Feeds received bytes to the frame parser, updates recv counters and
	/// the rolling bandwidth sample, and recomputes the pause-receive flag.
	fn receive_bytes(&mut self, bytes: &[u8], config: &P2PConfig) -> RecvStatus {
		let status = self.parser.receive_bytes(bytes, config.max_message_size);
		self.last_recv = Some(Instant::now());
		self.bandwidth.record_bytes(bytes.len() as u64);

		while let Some((header, payload)) = self.parser.pop_complete() {
			let bucket = counter_bucket(&header.command_str()).to_string();
			*self.recv_bytes_total.entry(bucket).or_insert(0) +=
				(MessageHeader::LEN + payload.len()) as u64;
			self.ready.push_back((header, payload));
		}
		self.recompute_paused_recv(config);
		status
	}

	fn socket_send_data(&mut self) -> u64 {
		let mut sent = 0u64;
		while let Some(msg) = self.send_queue.front() {
			let socket = match self.socket.as_mut() {
				Some(s) => s,
				None => break,
			};
			match socket.send(&msg[self.send_offset..]) {
				Ok(0) => break,
				Ok(n) => {
					sent += n as u64;
					self.send_offset += n;
					self.send_queue_bytes.sub(n as i64);
					if self.send_offset == msg.len() {
						self.send_queue.pop_front();
						self.send_offset = 0;
					} else {
						break;
					}
				}
				Err(e) if is_transient(&e) => break,
				Err(_) => {
					self.node_flagged_for_disconnect = true;
					break;
				}
			}
		}
		if sent > 0 {
			self.last_send = Some(Instant::now());
		}
		sent
	}

	/// Enqueues a header and payload for send. If the send queue was empty
	/// before this call, attempts an immediate optimistic write so a small
	/// message can go out without waiting for the next writable readiness
	/// event.
	pub fn push_message(&mut self, header: &MessageHeader, payload: &[u8]) -> u64 {
		let mut bytes = Vec::with_capacity(MessageHeader::LEN + payload.len());
		header.write_to(&mut bytes);
		bytes.extend_from_slice(payload);

		let command = header.command_str();
		let bucket = counter_bucket(&command).to_string();
		*self.sent_bytes_total.entry(bucket).or_insert(0) += bytes.len() as u64;

		let was_empty = self.send_queue.is_empty();
		self.send_queue_bytes.add(bytes.len() as i64);
		self.send_queue.push_back(bytes);

		if was_empty {
			self.socket_send_data()
		} else {
			0
		}
	}

	/// Dequeues one complete inbound frame, if any, along with whether more
	/// remain queued.
	pub fn get_next_message(
		&mut self,
		config: &P2PConfig,
	) -> (Option<(MessageHeader, Vec<u8>)>, bool) {
		let next = self.ready.pop_front();
		self.recompute_paused_recv(config);
		(next, !self.ready.is_empty())
	}

	/// Takes a bandwidth spot sample from bytes accumulated since the last
	/// call, appending it to the rolling ring.
	pub fn avg_bandwidth_calc(&mut self) {
		self.bandwidth.tick();
	}

	pub fn get_average_bandwidth(&self) -> (f64, usize) {
		self.bandwidth.average()
	}

	pub fn copy_stats(&self) -> StreamStats {
		let total_recv: u64 = self.recv_bytes_total.values().sum();
		let total_sent: u64 = self.sent_bytes_total.values().sum();
		let (avg, samples) = self.bandwidth.average();
		StreamStats {
			bytes_recv: total_recv,
			bytes_sent: total_sent,
			send_queue_size: self.send_queue_bytes.bytes(),
			last_send: self.last_send,
			last_recv: self.last_recv,
			avg_bandwidth: avg,
			avg_bandwidth_samples: samples,
		}
	}

	/// Idempotent teardown: closes the socket if still open.
	pub fn shutdown(&mut self) {
		if self.shut_down {
			return;
		}
		if let Some(socket) = self.socket.as_mut() {
			socket.shutdown();
		}
		debug!("stream {} shut down", self.stream_type);
		self.shut_down = true;
	}

	pub fn is_shut_down(&self) -> bool {
		self.shut_down
	}
}

fn is_transient(e: &io::Error) -> bool {
	matches!(
		e.kind(),
		io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
	)
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::VecDeque as Queue;

	struct MockSocket {
		inbound: Queue<Vec<u8>>,
		outbound: Vec<u8>,
		closed: bool,
	}

	impl MockSocket {
		fn new() -> Self {
			MockSocket {
				inbound: Queue::new(),
				outbound: Vec::new(),
				closed: false,
			}
		}

		fn push_inbound(&mut self, bytes: Vec<u8>) {
			self.inbound.push_back(bytes);
		}
	}

	impl Socket for MockSocket {
		fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
			match self.inbound.pop_front() {
				Some(chunk) => {
					let n = chunk.len().min(buf.len());
					buf[..n].copy_from_slice(&chunk[..n]);
					Ok(n)
				}
				None => Err(io::Error::new(io::ErrorKind::WouldBlock, "no data")),
			}
		}

		fn send(&mut self, buf: &[u8]) -> io::Result<usize> {
			self.outbound.extend_from_slice(buf);
			Ok(buf.len())
		}

		fn shutdown(&mut self) {
			self.closed = true;
		}
	}

	fn sample_message(command: &str, payload: &[u8]) -> Vec<u8> {
		let header = MessageHeader::new([1, 2, 3, 4], command, payload.len() as u32, [0; 4]);
		let mut bytes = header.to_bytes();
		bytes.extend_from_slice(payload);
		bytes
	}

	#[test]
	fn service_socket_surfaces_a_complete_message() {
		let config = P2PConfig::default();
		let mut socket = MockSocket::new();
		socket.push_inbound(sample_message("ping", b"abc"));
		let mut stream = Stream::new(StreamType::General, socket, &config);

		let result = stream.service_socket(true, false, false, &config);
		assert!(result.got_messages);

		let (msg, more) = stream.get_next_message(&config);
		let (header, payload) = msg.expect("a complete message");
		assert_eq!(header.command_str(), "ping");
		assert_eq!(payload, b"abc");
		assert!(!more);
	}

	#[test]
	fn push_message_does_an_optimistic_write_when_queue_was_empty() {
		let config = P2PConfig::default();
		let socket = MockSocket::new();
		let mut stream = Stream::new(StreamType::General, socket, &config);

		let header = MessageHeader::new([1, 2, 3, 4], "ping", 0, [0; 4]);
		let sent = stream.push_message(&header, &[]);
		assert_eq!(sent, MessageHeader::LEN as u64);
		assert_eq!(stream.copy_stats().send_queue_size, 0);
	}

	#[test]
	fn shutdown_is_idempotent() {
		let config = P2PConfig::default();
		let socket = MockSocket::new();
		let mut stream = Stream::new(StreamType::General, socket, &config);
		stream.shutdown();
		stream.shutdown();
		assert!(stream.is_shut_down());
	}

	#[test]
	fn zero_byte_read_flags_peer_for_disconnect() {
		let config = P2PConfig::default();
		let mut socket = MockSocket::new();
		socket.push_inbound(Vec::new());
		let mut stream = Stream::new(StreamType::General, socket, &config);
		stream.service_socket(true, false, false, &config);
		assert!(stream.should_disconnect());
		assert!(!stream.should_ban());
	}

	#[test]
	fn oversized_frame_flags_peer_for_ban_not_just_disconnect() {
		let config = P2PConfig::default();
		let mut socket = MockSocket::new();
		let header = MessageHeader::new([0; 4], "block", config.max_message_size + 1, [0; 4]);
		socket.push_inbound(header.to_bytes());
		let mut stream = Stream::new(StreamType::General, socket, &config);
		stream.service_socket(true, false, false, &config);
		assert!(stream.should_ban());
		assert!(stream.should_disconnect());
	}
}
