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

#![deny(non_upper_case_globals)]
#![deny(non_camel_case_types)]
#![deny(non_snake_case)]
#![deny(unused_mut)]

//! Association/Stream layer: one `Stream` per socket, multiplexed by an
//! `Association` per peer under a pluggable `StreamPolicy`, plus the
//! message framing and association-id wire types the pair depend on.

pub mod association;
pub mod association_id;
pub mod config;
pub mod dsnt;
pub mod error;
pub mod message;
pub mod stream;
pub mod stream_policy;
pub mod stream_type;

pub use association::{Association, AssociationStats};
pub use association_id::{AssociationID, AssociationIdError};
pub use config::P2PConfig;
pub use dsnt::{DsCallbackError, DsCallbackMsg};
pub use error::{Error, Result};
pub use message::{FrameParser, MessageHeader, RecvStatus};
pub use stream::{ServiceResult, Socket, Stream, StreamStats};
pub use stream_policy::{BlockPriorityPolicy, DefaultPolicy, StreamPolicy};
pub use stream_type::StreamType;
