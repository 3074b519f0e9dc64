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

//! Small identity types shared between the networking and mining layers.

use crate::hash::Hash;
use std::fmt;

use serde_derive::{Deserialize, Serialize};

/// Identifies a connected peer for the lifetime of its connection. Node ids
/// are assigned by the connection manager (an external collaborator) and are
/// never reused while a connection is live.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PeerId(pub i64);

impl fmt::Display for PeerId {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// A block identified by hash together with the peer it is being requested
/// from. Uniquely identifies one in-flight download.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockSource {
	pub hash: Hash,
	pub peer: PeerId,
}

impl BlockSource {
	pub fn new(hash: Hash, peer: PeerId) -> Self {
		BlockSource { hash, peer }
	}
}
