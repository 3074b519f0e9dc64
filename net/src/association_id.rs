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

//! `AssociationID`: a small tagged envelope identifying a peer across
//! reconnects. A tagged enum stands in for the single-virtual-dispatch
//! class hierarchy the wire format otherwise implies -- one variant per id
//! type, equality derived from the tag and payload together.

use thiserror::Error;

pub const NULL_ID_STR: &str = "Not-Set";
pub const MAX_ASSOCIATION_ID_LENGTH: usize = 129;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AssociationIdError {
	#[error("unknown association id type byte {0}")]
	UnknownType(u8),
	#[error("association id length {0} out of range [2, 129]")]
	BadLength(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Uuid(pub [u8; 16]);

impl Uuid {
	pub fn new_v4() -> Self {
		Uuid(*uuid::Uuid::new_v4().as_bytes())
	}
}

/// One variant per supported id type. `UUID` is the only one currently
/// defined on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssociationID {
	Uuid(Uuid),
}

impl AssociationID {
	const TYPE_UUID: u8 = 0;

	pub fn new_uuid() -> Self {
		AssociationID::Uuid(Uuid::new_v4())
	}

	fn type_byte(&self) -> u8 {
		match self {
			AssociationID::Uuid(_) => Self::TYPE_UUID,
		}
	}

	fn payload(&self) -> &[u8] {
		match self {
			AssociationID::Uuid(u) => &u.0,
		}
	}

	/// `[type: u8][payload]`, 2..129 bytes total.
	pub fn get_bytes(&self) -> Vec<u8> {
		let mut out = Vec::with_capacity(1 + self.payload().len());
		out.push(self.type_byte());
		out.extend_from_slice(self.payload());
		out
	}

	/// Parses the wire form. Empty input is the null id, not an error;
	/// anything else must fall in `[2, MAX_ASSOCIATION_ID_LENGTH]` bytes and
	/// carry a recognised type byte.
	pub fn make(bytes: &[u8]) -> Result<Option<AssociationID>, AssociationIdError> {
		if bytes.is_empty() {
			return Ok(None);
		}
		if bytes.len() < 2 || bytes.len() > MAX_ASSOCIATION_ID_LENGTH {
			return Err(AssociationIdError::BadLength(bytes.len()));
		}
		match bytes[0] {
			Self::TYPE_UUID => {
				if bytes.len() - 1 != 16 {
					return Err(AssociationIdError::BadLength(bytes.len()));
				}
				let mut payload = [0u8; 16];
				payload.copy_from_slice(&bytes[1..]);
				Ok(Some(AssociationID::Uuid(Uuid(payload))))
			}
			other => Err(AssociationIdError::UnknownType(other)),
		}
	}
}

impl std::fmt::Display for AssociationID {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		for b in self.get_bytes() {
			write!(f, "{:02x}", b)?;
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn round_trips_through_bytes() {
		let id = AssociationID::new_uuid();
		let bytes = id.get_bytes();
		assert_eq!(AssociationID::make(&bytes).unwrap(), Some(id));
	}

	#[test]
	fn empty_input_is_null_id_not_an_error() {
		assert_eq!(AssociationID::make(&[]).unwrap(), None);
	}

	#[test]
	fn unknown_type_byte_errors() {
		let bytes = vec![0xff; 17];
		assert_eq!(
			AssociationID::make(&bytes),
			Err(AssociationIdError::UnknownType(0xff))
		);
	}

	#[test]
	fn bad_length_errors() {
		assert!(AssociationID::make(&[0u8]).is_err());
		let too_long = vec![0u8; MAX_ASSOCIATION_ID_LENGTH + 1];
		assert!(AssociationID::make(&too_long).is_err());
	}
}
