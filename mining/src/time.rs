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

//! Wall-clock microsecond timestamps, used only for the journal's
//! invalidating-time and in-flight-block request times. The time utilities
//! proper are an external collaborator; this is the minimal sliver the core
//! needs.

use std::time::{SystemTime, UNIX_EPOCH};

pub fn now_micros() -> i64 {
	SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.map(|d| d.as_micros() as i64)
		.unwrap_or(0)
}
