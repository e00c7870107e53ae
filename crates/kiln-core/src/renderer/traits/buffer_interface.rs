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

use crate::renderer::api::buffer::{MappingState, UnmapOptions};
use crate::renderer::error::ResourceError;
use std::fmt::Debug;

/// The backend half of a packed buffer.
///
/// A `BufferInterface` performs the raw transfers; all state validation is
/// done by [`BufferPacked`](crate::renderer::BufferPacked), which owns its
/// interface privately. Offsets and lengths are in bytes and already include
/// the buffer's internal start.
pub trait BufferInterface: Send + Debug {
    /// Total size of the backing storage in bytes.
    fn size_bytes(&self) -> usize;

    /// Copies `data` into the backing storage at `offset`.
    fn upload(&mut self, data: &[u8], offset: usize) -> Result<(), ResourceError>;

    /// Makes `offset..offset + len` CPU-writable.
    ///
    /// `previous` is the mapping state before this call, so an
    /// implementation can skip work when a persistent mapping is re-requested.
    fn map(
        &mut self,
        offset: usize,
        len: usize,
        previous: MappingState,
        requested: MappingState,
    ) -> Result<(), ResourceError>;

    /// Returns the currently mapped bytes in `offset..offset + len`.
    fn mapped_range(&mut self, offset: usize, len: usize) -> Result<&mut [u8], ResourceError>;

    /// Ends the active mapping.
    fn unmap(&mut self, options: UnmapOptions) -> Result<(), ResourceError>;
}
