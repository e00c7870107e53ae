// Copyright 2025 eraflo
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

//! A binary cache of compiled program microcode.
//!
//! Every variable-length field is written as a `u64` little-endian length
//! followed by its bytes, and constant definitions as fixed-size records,
//! so a blob reads back field by field in the order it was written.

mod entry;
mod store;

pub use entry::{decode_entry, encode_entry, DelegateInfo, MicrocodeEntry, OperationType};
pub use store::{source_hash, MicrocodeCache, MicrocodeKey};

/// An error raised while encoding or decoding cache data.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Failed to encode microcode: {0}")]
    Encode(#[from] bincode::error::EncodeError),
    #[error("Failed to decode microcode: {0}")]
    Decode(#[from] bincode::error::DecodeError),
    #[error("Microcode blob has {trailing} trailing bytes")]
    TrailingBytes { trailing: usize },
}

use bincode::config::{Configuration, Fixint, Limit, LittleEndian, NoLimit};

/// Upper bound on the decoded size of a single entry.
pub const MAX_ENTRY_BYTES: usize = 64 << 20;
/// Upper bound on the decoded size of a whole cache file.
pub const MAX_CACHE_BYTES: usize = 1 << 30;

/// The wire configuration: fixed-width little-endian integers.
fn wire_config() -> Configuration<LittleEndian, Fixint, NoLimit> {
    bincode::config::legacy()
}

/// Length prefixes read from untrusted data are checked against the limit
/// before anything is allocated for them.
fn entry_read_config() -> Configuration<LittleEndian, Fixint, Limit<MAX_ENTRY_BYTES>> {
    wire_config().with_limit::<MAX_ENTRY_BYTES>()
}

fn cache_read_config() -> Configuration<LittleEndian, Fixint, Limit<MAX_CACHE_BYTES>> {
    wire_config().with_limit::<MAX_CACHE_BYTES>()
}
