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

//! Defines data structures related to packed GPU buffer resources.

use std::borrow::Cow;
use std::fmt;

/// The usage class of a packed buffer, fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferType {
    /// Written once at creation from initial data and never again.
    Immutable,
    /// GPU-resident; written through [`upload`](crate::renderer::BufferPacked::upload) only.
    Default,
    /// CPU-writable every frame through [`map`](crate::renderer::BufferPacked::map).
    Dynamic,
}

/// The mapping state of a packed buffer.
///
/// The persistent states carry how coherency between CPU writes and GPU
/// reads is achieved, and may be re-requested while already active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MappingState {
    /// Not mapped; `upload` is allowed.
    Unmapped,
    /// Mapped for a single use, dropped on the next unmap.
    Mapped,
    /// Persistently mapped; writes must be flushed explicitly.
    PersistentIncoherent,
    /// Persistently mapped; writes are visible to the GPU automatically.
    PersistentCoherent,
}

impl MappingState {
    /// Returns `true` for the two persistent states.
    pub const fn is_persistent(&self) -> bool {
        matches!(
            self,
            MappingState::PersistentIncoherent | MappingState::PersistentCoherent
        )
    }
}

impl fmt::Display for MappingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MappingState::Unmapped => "unmapped",
            MappingState::Mapped => "mapped",
            MappingState::PersistentIncoherent => "persistent-incoherent",
            MappingState::PersistentCoherent => "persistent-coherent",
        };
        f.write_str(name)
    }
}

/// What an unmap request should do with a persistent mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnmapOptions {
    /// Keep persistent mappings alive; only a plain mapping is dropped.
    KeepPersistent,
    /// Drop the mapping whatever its persistence.
    UnmapAll,
}

/// The binding role of a packed buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferPackedKind {
    /// Per-vertex attribute data.
    Vertex,
    /// Index data.
    Index,
    /// Uniform / constant block data.
    Constant,
    /// Texture buffer data.
    Texture,
    /// Unordered-access (storage) data.
    Uav,
}

/// A descriptor used to create a [`BufferPacked`](crate::renderer::BufferPacked).
#[derive(Debug, Clone)]
pub struct BufferPackedDescriptor<'a> {
    /// An optional debug label for the buffer.
    pub label: Option<Cow<'a, str>>,
    /// The binding role of the buffer.
    pub kind: BufferPackedKind,
    /// Number of elements in the buffer.
    pub num_elements: usize,
    /// Size of one element in bytes.
    pub bytes_per_element: usize,
    /// The usage class.
    pub buffer_type: BufferType,
    /// Element offset of this buffer inside a larger shared allocation.
    pub internal_buffer_start: usize,
    /// If `true`, a CPU-side copy of the contents is kept in sync.
    pub keep_shadow_copy: bool,
}

impl BufferPackedDescriptor<'_> {
    /// Total size of the buffer in bytes.
    pub fn total_size_bytes(&self) -> usize {
        self.num_elements * self.bytes_per_element
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persistent_states() {
        assert!(!MappingState::Unmapped.is_persistent());
        assert!(!MappingState::Mapped.is_persistent());
        assert!(MappingState::PersistentIncoherent.is_persistent());
        assert!(MappingState::PersistentCoherent.is_persistent());
    }

    #[test]
    fn test_descriptor_size() {
        let desc = BufferPackedDescriptor {
            label: Some(Cow::Borrowed("Vertices")),
            kind: BufferPackedKind::Vertex,
            num_elements: 12,
            bytes_per_element: 32,
            buffer_type: BufferType::Default,
            internal_buffer_start: 0,
            keep_shadow_copy: false,
        };
        assert_eq!(desc.total_size_bytes(), 384);
    }
}
