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

//! Wire codec for the double-spend notification callback message embedded in
//! a double-spend-proof output script. The script layout itself --
//! `OP_FALSE OP_RETURN "dsnt" <callback bytes>` -- is the only thing the core
//! needs to produce; everything past the callback bytes (authority lookup,
//! HTTP delivery) is an external collaborator.

use std::net::IpAddr;

use thiserror::Error;

/// 4-byte ASCII protocol tag pushed ahead of the callback bytes.
pub const DSNT_TAG: &[u8; 4] = b"dsnt";

const OP_FALSE: u8 = 0x00;
const OP_RETURN: u8 = 0x6a;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DsCallbackError {
	#[error("address list must contain at least one address")]
	EmptyAddressList,
	#[error("addresses must all be the same IP version")]
	MixedAddressFamily,
	#[error("message ended before a complete field was read")]
	UnexpectedEnd,
	#[error("{0} trailing byte(s) after a fully parsed message")]
	TrailingBytes(usize),
	#[error("unsupported message version {0}")]
	UnsupportedVersion(u8),
}

const VERSION: u8 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DsCallbackMsg {
	pub addresses: Vec<IpAddr>,
	pub input_indexes: Vec<u32>,
}

impl DsCallbackMsg {
	pub fn new(addresses: Vec<IpAddr>, input_indexes: Vec<u32>) -> Result<Self, DsCallbackError> {
		if addresses.is_empty() {
			return Err(DsCallbackError::EmptyAddressList);
		}
		let is_v4 = addresses[0].is_ipv4();
		if addresses.iter().any(|a| a.is_ipv4() != is_v4) {
			return Err(DsCallbackError::MixedAddressFamily);
		}
		Ok(DsCallbackMsg {
			addresses,
			input_indexes,
		})
	}

	pub fn serialize(&self) -> Vec<u8> {
		let mut out = Vec::new();
		out.push(VERSION);
		out.push(self.addresses.len() as u8);
		for addr in &self.addresses {
			match addr {
				IpAddr::V4(v4) => {
					out.push(4);
					out.extend_from_slice(&v4.octets());
				}
				IpAddr::V6(v6) => {
					out.push(6);
					out.extend_from_slice(&v6.octets());
				}
			}
		}
		out.push(self.input_indexes.len() as u8);
		for idx in &self.input_indexes {
			out.extend_from_slice(&idx.to_le_bytes());
		}
		out
	}

	pub fn deserialize(bytes: &[u8]) -> Result<Self, DsCallbackError> {
		let mut cursor = bytes;

		let version = take_u8(&mut cursor)?;
		if version != VERSION {
			return Err(DsCallbackError::UnsupportedVersion(version));
		}

		let addr_count = take_u8(&mut cursor)?;
		if addr_count == 0 {
			return Err(DsCallbackError::EmptyAddressList);
		}

		let mut addresses = Vec::with_capacity(addr_count as usize);
		let mut family_is_v4 = None;
		for _ in 0..addr_count {
			let family = take_u8(&mut cursor)?;
			let addr = match family {
				4 => IpAddr::V4(take_ipv4(&mut cursor)?),
				6 => IpAddr::V6(take_ipv6(&mut cursor)?),
				_ => return Err(DsCallbackError::UnexpectedEnd),
			};
			let is_v4 = family == 4;
			match family_is_v4 {
				None => family_is_v4 = Some(is_v4),
				Some(expected) if expected != is_v4 => {
					return Err(DsCallbackError::MixedAddressFamily)
				}
				_ => {}
			}
			addresses.push(addr);
		}

		let idx_count = take_u8(&mut cursor)?;
		let mut input_indexes = Vec::with_capacity(idx_count as usize);
		for _ in 0..idx_count {
			input_indexes.push(take_u32(&mut cursor)?);
		}

		if !cursor.is_empty() {
			return Err(DsCallbackError::TrailingBytes(cursor.len()));
		}

		Ok(DsCallbackMsg {
			addresses,
			input_indexes,
		})
	}

	/// `OP_FALSE OP_RETURN "dsnt" <callback bytes>`, as embedded in the
	/// output script carrying this notification.
	pub fn embed_in_script(&self) -> Vec<u8> {
		let mut out = Vec::new();
		out.push(OP_FALSE);
		out.push(OP_RETURN);
		out.extend_from_slice(DSNT_TAG);
		out.extend_from_slice(&self.serialize());
		out
	}
}

fn take_u8(cursor: &mut &[u8]) -> Result<u8, DsCallbackError> {
	let (first, rest) = cursor.split_first().ok_or(DsCallbackError::UnexpectedEnd)?;
	*cursor = rest;
	Ok(*first)
}

fn take_u32(cursor: &mut &[u8]) -> Result<u32, DsCallbackError> {
	if cursor.len() < 4 {
		return Err(DsCallbackError::UnexpectedEnd);
	}
	let (bytes, rest) = cursor.split_at(4);
	*cursor = rest;
	Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

fn take_ipv4(cursor: &mut &[u8]) -> Result<std::net::Ipv4Addr, DsCallbackError> {
	if cursor.len() < 4 {
		return Err(DsCallbackError::UnexpectedEnd);
	}
	let (bytes, rest) = cursor.split_at(4);
	*cursor = rest;
	Ok(std::net::Ipv4Addr::new(bytes[0], bytes[1], bytes[2], bytes[3]))
}

fn take_ipv6(cursor: &mut &[u8]) -> Result<std::net::Ipv6Addr, DsCallbackError> {
	if cursor.len() < 16 {
		return Err(DsCallbackError::UnexpectedEnd);
	}
	let (bytes, rest) = cursor.split_at(16);
	*cursor = rest;
	let mut octets = [0u8; 16];
	octets.copy_from_slice(bytes);
	Ok(std::net::Ipv6Addr::from(octets))
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::net::{Ipv4Addr, Ipv6Addr};

	#[test]
	fn round_trips_through_bytes() {
		let msg = DsCallbackMsg::new(
			vec![IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)), IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2))],
			vec![0, 3],
		)
		.unwrap();
		let bytes = msg.serialize();
		assert_eq!(DsCallbackMsg::deserialize(&bytes).unwrap(), msg);
	}

	#[test]
	fn round_trips_ipv6() {
		let msg = DsCallbackMsg::new(vec![IpAddr::V6(Ipv6Addr::LOCALHOST)], vec![1]).unwrap();
		assert_eq!(DsCallbackMsg::deserialize(&msg.serialize()).unwrap(), msg);
	}

	#[test]
	fn empty_address_list_is_rejected_at_construction() {
		assert_eq!(
			DsCallbackMsg::new(vec![], vec![0]).unwrap_err(),
			DsCallbackError::EmptyAddressList
		);
	}

	#[test]
	fn mixed_address_family_is_rejected_at_construction() {
		let err = DsCallbackMsg::new(
			vec![IpAddr::V4(Ipv4Addr::new(1, 2, 3, 4)), IpAddr::V6(Ipv6Addr::LOCALHOST)],
			vec![0],
		)
		.unwrap_err();
		assert_eq!(err, DsCallbackError::MixedAddressFamily);
	}

	#[test]
	fn trailing_bytes_are_rejected() {
		let msg = DsCallbackMsg::new(vec![IpAddr::V4(Ipv4Addr::new(1, 2, 3, 4))], vec![]).unwrap();
		let mut bytes = msg.serialize();
		bytes.push(0xff);
		assert!(matches!(
			DsCallbackMsg::deserialize(&bytes),
			Err(DsCallbackError::TrailingBytes(1))
		));
	}

	#[test]
	fn truncated_message_is_rejected() {
		let msg = DsCallbackMsg::new(vec![IpAddr::V4(Ipv4Addr::new(1, 2, 3, 4))], vec![9]).unwrap();
		let bytes = msg.serialize();
		assert!(matches!(
			DsCallbackMsg::deserialize(&bytes[..bytes.len() - 1]),
			Err(DsCallbackError::UnexpectedEnd)
		));
	}

	#[test]
	fn embeds_behind_the_op_false_op_return_dsnt_tag() {
		let msg = DsCallbackMsg::new(vec![IpAddr::V4(Ipv4Addr::new(1, 2, 3, 4))], vec![0]).unwrap();
		let script = msg.embed_in_script();
		assert_eq!(&script[0..2], &[OP_FALSE, OP_RETURN]);
		assert_eq!(&script[2..6], DSNT_TAG);
		assert_eq!(&script[6..], &msg.serialize()[..]);
	}
}
