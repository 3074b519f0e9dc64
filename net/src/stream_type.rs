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

//! The stream types a policy may route messages across.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StreamType {
	Unknown,
	General,
	Data1,
	Data2,
	Data3,
	Data4,
}

impl StreamType {
	pub fn is_known(self) -> bool {
		self != StreamType::Unknown
	}
}

impl std::fmt::Display for StreamType {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		let s = match self {
			StreamType::Unknown => "UNKNOWN",
			StreamType::General => "GENERAL",
			StreamType::Data1 => "DATA1",
			StreamType::Data2 => "DATA2",
			StreamType::Data3 => "DATA3",
			StreamType::Data4 => "DATA4",
		};
		write!(f, "{}", s)
	}
}
