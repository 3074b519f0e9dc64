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

//! Identity hash used to key blocks and mempool transactions.

use std::fmt;

use serde_derive::{Deserialize, Serialize};

/// A 32-byte identity hash, used to key blocks and transactions throughout
/// the association, tracker and journal layers. Opaque beyond equality,
/// ordering and hex display -- the hashing algorithm that produced it is an
/// external collaborator.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Hash(pub [u8; 32]);

pub const ZERO_HASH: Hash = Hash([0; 32]);

impl Hash {
	/// Builds a hash from a byte slice, panicking if it isn't exactly 32 bytes.
	pub fn from_slice(v: &[u8]) -> Hash {
		let mut a = [0u8; 32];
		a.copy_from_slice(v);
		Hash(a)
	}

	pub fn to_vec(&self) -> Vec<u8> {
		self.0.to_vec()
	}

	pub fn as_bytes(&self) -> &[u8] {
		&self.0
	}
}

impl fmt::Display for Hash {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		for b in self.0.iter() {
			write!(f, "{:02x}", b)?;
		}
		Ok(())
	}
}

impl From<[u8; 32]> for Hash {
	fn from(a: [u8; 32]) -> Hash {
		Hash(a)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn display_is_lowercase_hex() {
		let h = Hash::from_slice(&[0xab; 32]);
		assert_eq!(h.to_string(), "ab".repeat(32));
	}

	#[test]
	fn zero_hash_displays_as_zeros() {
		assert_eq!(ZERO_HASH.to_string(), "00".repeat(32));
	}

	#[test]
	fn round_trips_through_json() {
		let h = Hash::from_slice(&[7u8; 32]);
		let json = serde_json::to_string(&h).unwrap();
		assert_eq!(serde_json::from_str::<Hash>(&json).unwrap(), h);
	}
}
