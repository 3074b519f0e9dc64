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

//! `BlockDownloadTracker`: bookkeeping for which blocks are currently being
//! downloaded, from which peers, so the caller can avoid requesting the same
//! block twice and can punish peers that send invalid ones.
//!
//! Each peer's queue of in-flight blocks is a `PeerBlockState`; the tracker
//! itself mirrors those entries into a hash-indexed-by-block-hash map so
//! "which peer(s) is this block in flight from" doesn't require scanning
//! every peer. `QueuedBlock`'s position in the owning peer's queue is kept
//! stable across removal of earlier entries by using an `IndexMap` keyed on
//! a monotonically increasing per-peer slot counter rather than a `Vec`
//! index -- the slot survives even when other entries are removed out from
//! under it, the same guarantee a linked-list iterator gives in the source
//! this was built from.

use std::collections::HashMap;

use indexmap::IndexMap;
use log::warn;
use parking_lot::Mutex;
use thiserror::Error;

use peernet_core::{BlockSource, Hash, PeerId};

use crate::time::now_micros;

/// Maximum reject-reason length retained on a `RejectRecord`.
pub const MAX_REJECT_MESSAGE_LEN: usize = 111;

/// Cap on the LRU of peers elected to announce new blocks via compact
/// blocks (BIP152-style): only a bounded handful get the low-latency path.
pub const MAX_ANNOUNCING_PEERS: usize = 3;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TrackerError {
	#[error("no in-flight record for block {hash} from peer {peer}")]
	BlockNotInFlight { hash: Hash, peer: PeerId },
}

pub type Result<T> = std::result::Result<T, TrackerError>;

/// A block queued for download from a particular peer. `H` is an opaque
/// pointer into the caller's header index (e.g. a block-index handle); `B`
/// is an opaque partially-downloaded-block builder, created only when the
/// caller wants one (compact block reconstruction).
#[derive(Debug, Clone)]
pub struct QueuedBlock<H: Clone, B: Clone> {
	pub hash: Hash,
	pub header: H,
	pub validated_headers: bool,
	pub partial_block: Option<B>,
}

/// A stable handle to one `QueuedBlock` sitting in a `PeerBlockState`'s
/// queue -- the slot key survives removal of earlier entries in the same
/// queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueuedBlockSlot(u64);

/// Per-peer download bookkeeping. One of these lives alongside each
/// connected peer's other connection state.
pub struct PeerBlockState<H: Clone, B: Clone> {
	queue: IndexMap<QueuedBlockSlot, QueuedBlock<H, B>>,
	next_slot: u64,
	pub blocks_in_flight: u32,
	pub blocks_in_flight_valid_headers: u32,
	pub downloading_since_micros: i64,
	pub stalling_since_micros: i64,
	pub next_send_threshold_micros: i64,
	pub rejects: Vec<RejectRecord>,
}

impl<H: Clone, B: Clone> PeerBlockState<H, B> {
	pub fn new() -> Self {
		PeerBlockState {
			queue: IndexMap::new(),
			next_slot: 0,
			blocks_in_flight: 0,
			blocks_in_flight_valid_headers: 0,
			downloading_since_micros: 0,
			stalling_since_micros: 0,
			next_send_threshold_micros: 0,
			rejects: Vec::new(),
		}
	}

	pub fn queue_len(&self) -> usize {
		self.queue.len()
	}

	fn push(&mut self, block: QueuedBlock<H, B>) -> QueuedBlockSlot {
		let slot = QueuedBlockSlot(self.next_slot);
		self.next_slot += 1;
		self.queue.insert(slot, block);
		slot
	}

	fn is_front(&self, slot: QueuedBlockSlot) -> bool {
		self.queue.get_index(0).map(|(k, _)| *k) == Some(slot)
	}

	fn remove(&mut self, slot: QueuedBlockSlot) -> Option<QueuedBlock<H, B>> {
		self.queue.shift_remove(&slot)
	}
}

impl<H: Clone, B: Clone> Default for PeerBlockState<H, B> {
	fn default() -> Self {
		Self::new()
	}
}

/// Record of a rejected block, kept on the peer's state for the caller to
/// act on (e.g. decide whether to ban).
#[derive(Debug, Clone)]
pub struct RejectRecord {
	pub reject_code: u8,
	pub reason: String,
	pub hash: Hash,
}

impl RejectRecord {
	pub fn new(reject_code: u8, reason: &str, hash: Hash) -> Self {
		let mut reason = reason.to_string();
		reason.truncate(MAX_REJECT_MESSAGE_LEN);
		RejectRecord {
			reject_code,
			reason,
			hash,
		}
	}
}

/// One entry in the tracker's hash-indexed view of in-flight blocks: which
/// peer it's in flight from, the slot in that peer's queue, and when the
/// request was made.
#[derive(Debug, Clone, Copy)]
pub struct InFlightBlock {
	pub peer: PeerId,
	slot: QueuedBlockSlot,
	pub requested_at_micros: i64,
}

/// Who a downloaded block's bytes came from, and whether to punish that
/// peer if validation turns up a `DoS`-worthy problem.
#[derive(Debug, Clone, Copy)]
pub struct BlockPunish {
	pub peer: PeerId,
	pub punish: bool,
}

/// Result of validating a downloaded block, as reported to `block_checked`.
#[derive(Debug, Clone)]
pub enum ValidationState {
	Valid,
	Invalid {
		dos_score: i32,
		reject_code: u8,
		reject_reason: String,
	},
}

/// What the tracker did in response to `block_checked`, for a single
/// sending peer -- the caller uses this to decide whether to ban or to
/// promote the peer to compact-block announcer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockCheckOutcome {
	/// Validation failed with a rejectable code; caller should send a
	/// `reject` message and, if `should_punish`, apply misbehaviour scoring.
	/// `reject_code`/`reject_reason` are handed back so the caller can build
	/// a `RejectRecord` on the peer's own state.
	Rejected {
		should_punish: bool,
		dos_score: i32,
		reject_code: u8,
		reject_reason: String,
	},
	/// Block was valid, not in IBD, and was the sole block in flight: this
	/// peer is a candidate for compact-block announcement. `evicted` is the
	/// peer pushed out of the announcing LRU to make room, if any -- the
	/// caller must send it SENDCMPCT(false, 1).
	PromoteAnnouncer { evicted: Option<PeerId> },
	/// Nothing notable: valid but not eligible for promotion, or no dos-
	/// worthy rejection.
	None,
}

struct AnnouncingPeers {
	order: IndexMap<PeerId, ()>,
}

impl AnnouncingPeers {
	fn new() -> Self {
		AnnouncingPeers {
			order: IndexMap::new(),
		}
	}

	/// Returns `(evicted, announce_full_cmpct)` describing the SENDCMPCT
	/// messages the caller must push: `evicted` gets SENDCMPCT(false, 1) if
	/// present, `peer` always gets SENDCMPCT(true, 1).
	fn touch(&mut self, peer: PeerId) -> Option<PeerId> {
		if self.order.shift_remove(&peer).is_some() {
			self.order.insert(peer, ());
			return None;
		}

		let evicted = if self.order.len() >= MAX_ANNOUNCING_PEERS {
			self.order.shift_remove_index(0).map(|(p, _)| p)
		} else {
			None
		};

		self.order.insert(peer, ());
		evicted
	}
}

pub struct BlockDownloadTracker<H: Clone, B: Clone> {
	inner: Mutex<TrackerInner<H, B>>,
}

struct TrackerInner<H: Clone, B: Clone> {
	blocks_in_flight: HashMap<Hash, Vec<InFlightBlock>>,
	block_sender: HashMap<Hash, Vec<BlockPunish>>,
	peers_with_validated_downloads: i32,
	announcing: AnnouncingPeers,
	_marker: std::marker::PhantomData<(H, B)>,
}

impl<H: Clone, B: Clone> BlockDownloadTracker<H, B> {
	pub fn new() -> Self {
		BlockDownloadTracker {
			inner: Mutex::new(TrackerInner {
				blocks_in_flight: HashMap::new(),
				block_sender: HashMap::new(),
				peers_with_validated_downloads: 0,
				announcing: AnnouncingPeers::new(),
				_marker: std::marker::PhantomData,
			}),
		}
	}

	/// Records that `source.hash` is now being requested from `source.peer`,
	/// storing `header` and (if the caller wants partial-block
	/// reconstruction) `partial_block` on the peer's queue.
	///
	/// Returns `false` without changing any state if this exact
	/// (block, peer) pair is already in flight.
	pub fn mark_block_as_in_flight(
		&self,
		source: BlockSource,
		peer_state: &mut PeerBlockState<H, B>,
		header: H,
		partial_block: Option<B>,
	) -> bool {
		let BlockSource { hash, peer } = source;
		let mut inner = self.inner.lock();

		if let Some(existing) = inner.blocks_in_flight.get(&hash) {
			if existing.iter().any(|b| b.peer == peer) {
				return false;
			}
		}

		let validated_headers = true;
		let slot = peer_state.push(QueuedBlock {
			hash,
			header,
			validated_headers,
			partial_block,
		});

		peer_state.blocks_in_flight += 1;
		peer_state.blocks_in_flight_valid_headers += 1;
		if peer_state.blocks_in_flight == 1 {
			peer_state.downloading_since_micros = now_micros();
		}
		if peer_state.blocks_in_flight_valid_headers == 1 {
			inner.peers_with_validated_downloads += 1;
		}

		inner.blocks_in_flight.entry(hash).or_insert_with(Vec::new).push(InFlightBlock {
			peer,
			slot,
			requested_at_micros: now_micros(),
		});

		true
	}

	/// Notification that a block's bytes have arrived and are about to be
	/// validated. Records the sender (and whether to punish them if
	/// validation fails) and removes the in-flight record.
	pub fn mark_block_as_received(&self, source: BlockSource, punish: bool, peer_state: &mut PeerBlockState<H, B>) -> bool {
		let BlockSource { hash, peer } = source;
		let mut inner = self.inner.lock();
		inner.block_sender.entry(hash).or_insert_with(Vec::new).push(BlockPunish { peer, punish });
		remove_from_block_map(&mut inner, hash, peer, peer_state)
	}

	/// Notification that an in-flight download was cancelled, timed out, or
	/// otherwise failed.
	pub fn mark_block_as_failed(&self, source: BlockSource, peer_state: &mut PeerBlockState<H, B>) -> bool {
		let mut inner = self.inner.lock();
		remove_from_block_map(&mut inner, source.hash, source.peer, peer_state)
	}

	/// Notification that a received block has finished validation.
	/// `is_ibd` and `provides_header_and_ids` describe node-global and
	/// per-peer state the tracker itself doesn't own. Returns one outcome
	/// per peer that had sent this block's bytes.
	pub fn block_checked(
		&self,
		hash: Hash,
		state: &ValidationState,
		is_ibd: bool,
		provides_header_and_ids: impl Fn(PeerId) -> bool,
	) -> Vec<(PeerId, BlockCheckOutcome)> {
		let mut inner = self.inner.lock();

		let senders: Vec<BlockPunish> = inner.block_sender.get(&hash).cloned().unwrap_or_default();

		let still_only_block_in_flight =
			inner.blocks_in_flight.contains_key(&hash) && unique_block_count(&inner.blocks_in_flight) == 1;

		let mut outcomes = Vec::new();
		for sender in &senders {
			let outcome = match state {
				ValidationState::Invalid {
					dos_score,
					reject_code,
					reject_reason,
				} => {
					if *reject_code > 0 {
						BlockCheckOutcome::Rejected {
							should_punish: sender.punish && *dos_score > 0,
							dos_score: *dos_score,
							reject_code: *reject_code,
							reject_reason: reject_reason.clone(),
						}
					} else {
						BlockCheckOutcome::None
					}
				}
				ValidationState::Valid => {
					if !is_ibd && still_only_block_in_flight {
						let evicted = if provides_header_and_ids(sender.peer) {
							inner.announcing.touch(sender.peer)
						} else {
							None
						};
						BlockCheckOutcome::PromoteAnnouncer { evicted }
					} else {
						BlockCheckOutcome::None
					}
				}
			};
			outcomes.push((sender.peer, outcome));
		}

		if let Some(list) = inner.block_sender.get_mut(&hash) {
			list.retain(|s| !senders.iter().any(|removed| removed.peer == s.peer && removed.punish == s.punish));
			if list.is_empty() {
				inner.block_sender.remove(&hash);
			}
		}

		outcomes
	}

	/// Clears every in-flight record for `peer` -- used when the peer tells
	/// us it's too busy to keep sending blocks right now.
	pub fn peer_too_busy(&self, peer: PeerId, peer_state: &mut PeerBlockState<H, B>, too_busy_retry_delay_micros: i64) {
		peer_state.next_send_threshold_micros = now_micros() + too_busy_retry_delay_micros;

		let mut inner = self.inner.lock();
		while let Some((_, front)) = peer_state.queue.get_index(0) {
			let hash = front.hash;
			remove_from_block_map(&mut inner, hash, peer, peer_state);
		}
	}

	/// Clears all bookkeeping for a peer that has disconnected. If this was
	/// the last tracked peer, the tracker should now be empty -- callers in
	/// debug builds may want to assert that themselves.
	pub fn clear_peer(&self, peer: PeerId, peer_state: &mut PeerBlockState<H, B>) {
		let mut inner = self.inner.lock();

		for (_, queued) in peer_state.queue.drain(..) {
			if let Some(list) = inner.blocks_in_flight.get_mut(&queued.hash) {
				list.retain(|b| b.peer != peer);
				if list.is_empty() {
					inner.blocks_in_flight.remove(&queued.hash);
				}
			}
		}

		if peer_state.blocks_in_flight_valid_headers != 0 {
			inner.peers_with_validated_downloads -= 1;
		}
		if inner.peers_with_validated_downloads < 0 {
			warn!("block download tracker: peers_with_validated_downloads went negative, clamping");
			inner.peers_with_validated_downloads = 0;
		}

		for list in inner.block_sender.values_mut() {
			list.retain(|s| s.peer != peer);
		}
		inner.block_sender.retain(|_, list| !list.is_empty());

		peer_state.blocks_in_flight = 0;
		peer_state.blocks_in_flight_valid_headers = 0;
	}

	pub fn is_in_flight(&self, hash: Hash) -> bool {
		self.inner.lock().blocks_in_flight.contains_key(&hash)
	}

	pub fn is_in_flight_from(&self, source: BlockSource) -> bool {
		self.inner
			.lock()
			.blocks_in_flight
			.get(&source.hash)
			.map(|list| list.iter().any(|b| b.peer == source.peer))
			.unwrap_or(false)
	}

	/// The first peer (by request order) this block is in flight from, if
	/// any.
	pub fn get_peer_for_block(&self, hash: Hash) -> Option<PeerId> {
		self.inner.lock().blocks_in_flight.get(&hash).and_then(|list| list.first()).map(|b| b.peer)
	}

	pub fn is_only_block_in_flight(&self, hash: Hash) -> bool {
		let inner = self.inner.lock();
		unique_block_count(&inner.blocks_in_flight) == 1 && inner.blocks_in_flight.contains_key(&hash)
	}

	/// Details of the in-flight download of `source.hash` from `source.peer`.
	pub fn get_block_details(&self, source: BlockSource) -> Result<InFlightBlock> {
		self.inner
			.lock()
			.blocks_in_flight
			.get(&source.hash)
			.and_then(|list| list.iter().find(|b| b.peer == source.peer).copied())
			.ok_or(TrackerError::BlockNotInFlight {
				hash: source.hash,
				peer: source.peer,
			})
	}

	/// Details of every in-flight download of `hash`, one per requesting
	/// peer.
	pub fn get_block_details_all(&self, hash: Hash) -> Vec<InFlightBlock> {
		self.inner.lock().blocks_in_flight.get(&hash).cloned().unwrap_or_default()
	}

	pub fn get_peers_with_validated_downloads_count(&self) -> i32 {
		self.inner.lock().peers_with_validated_downloads
	}

	pub fn unique_block_count(&self) -> usize {
		unique_block_count(&self.inner.lock().blocks_in_flight)
	}
}

impl<H: Clone, B: Clone> Default for BlockDownloadTracker<H, B> {
	fn default() -> Self {
		Self::new()
	}
}

fn unique_block_count(blocks_in_flight: &HashMap<Hash, Vec<InFlightBlock>>) -> usize {
	blocks_in_flight.len()
}

fn remove_from_block_map<H: Clone, B: Clone>(
	inner: &mut TrackerInner<H, B>,
	hash: Hash,
	peer: PeerId,
	peer_state: &mut PeerBlockState<H, B>,
) -> bool {
	let list = match inner.blocks_in_flight.get_mut(&hash) {
		Some(list) => list,
		None => return false,
	};

	let pos = match list.iter().position(|b| b.peer == peer) {
		Some(pos) => pos,
		None => return false,
	};

	let in_flight = list.remove(pos);
	if list.is_empty() {
		inner.blocks_in_flight.remove(&hash);
	}

	let was_front = peer_state.is_front(in_flight.slot);
	if let Some(queued) = peer_state.remove(in_flight.slot) {
		peer_state.blocks_in_flight_valid_headers -= queued.validated_headers as u32;
		if peer_state.blocks_in_flight_valid_headers == 0 && queued.validated_headers {
			inner.peers_with_validated_downloads -= 1;
		}
	}
	if was_front {
		peer_state.downloading_since_micros = peer_state.downloading_since_micros.max(now_micros());
	}
	peer_state.blocks_in_flight -= 1;
	peer_state.stalling_since_micros = 0;

	true
}
