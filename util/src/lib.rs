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

//! Ambient utilities shared by the networking and mining crates: logging
//! setup, a bounded time-limited blacklist, a leaky-bucket rate limiter,
//! rolling bandwidth measurement, and the process-wide send-queue tally.

#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate log;
#[macro_use]
extern crate serde_derive;

pub use parking_lot::{Mutex, RwLock};

pub mod logger;
pub use logger::{init_logger, init_test_logger};

pub mod types;
pub use types::{LogLevel, LoggingConfig};

pub mod blacklist;
pub use blacklist::TimeLimitedBlacklist;

pub mod leaky_bucket;
pub use leaky_bucket::LeakyBucket;

pub mod bandwidth;
pub use bandwidth::BandwidthMeter;

pub mod send_queue_bytes;
pub use send_queue_bytes::SendQueueBytes;
