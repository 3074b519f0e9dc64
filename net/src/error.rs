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

//! Error taxonomy for the association/stream layer. Recoverable conditions
//! are returned as `Err`; invariant violations are still `Err` values (never
//! panics) but are documented as programming errors the caller should treat
//! as fatal to the connection.

use crate::stream_type::StreamType;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	/// A caller asked for an exact stream type that doesn't exist on this
	/// association, for the given message command.
	#[error("no stream available of type {requested} for message of type {command}")]
	NoSuchStream {
		requested: StreamType,
		command: String,
	},

	/// `MoveStream` precondition: source association must own exactly one
	/// stream.
	#[error("association does not own exactly one stream, cannot move")]
	NotSingleStream,

	/// `MoveStream` precondition: target association must not already have a
	/// stream of the requested type.
	#[error("target association already has a stream of type {0}")]
	StreamTypeOccupied(StreamType),

	/// The peer sent a malformed or oversized frame -- a bannable offence.
	/// Raised by `Association::check_bannable` at the socket-service call
	/// site, which translates it into a disconnect + ban action.
	#[error("bannable protocol violation from peer")]
	Bannable,
}

pub type Result<T> = std::result::Result<T, Error>;
