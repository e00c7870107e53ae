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

//! A CPU-backed [`BufferInterface`] for the null backend and tests.

use kiln_core::renderer::{
    BufferInterface, BufferPackedDescriptor, MappingState, ResourceError, UnmapOptions,
};

/// Backing storage that lives in system memory.
///
/// The store tracks its own mapping window so that writes through
/// [`BufferInterface::mapped_range`] are rejected once the buffer is unmapped,
/// the way a driver would invalidate the pointer.
#[derive(Debug, Clone)]
pub struct SystemMemoryBufferInterface {
    storage: Vec<u8>,
    mapping: MappingState,
    mapped_offset: usize,
    mapped_len: usize,
}

impl SystemMemoryBufferInterface {
    /// Creates a zero-filled store of `size_bytes`.
    pub fn new(size_bytes: usize) -> Self {
        Self {
            storage: vec![0; size_bytes],
            mapping: MappingState::Unmapped,
            mapped_offset: 0,
            mapped_len: 0,
        }
    }

    /// Creates a store large enough for `desc`, including the elements that
    /// precede its internal start inside the shared allocation.
    pub fn for_descriptor(desc: &BufferPackedDescriptor<'_>) -> Self {
        Self::new((desc.internal_buffer_start + desc.num_elements) * desc.bytes_per_element)
    }

    /// The raw bytes currently held by the store.
    pub fn contents(&self) -> &[u8] {
        &self.storage
    }

    pub fn mapping_state(&self) -> MappingState {
        self.mapping
    }

    fn check_range(&self, offset: usize, len: usize) -> Result<(), ResourceError> {
        let size = self.storage.len();
        match offset.checked_add(len) {
            Some(end) if end <= size => Ok(()),
            _ => Err(ResourceError::RangeOutOfBounds { offset, len, size }),
        }
    }
}

impl BufferInterface for SystemMemoryBufferInterface {
    fn size_bytes(&self) -> usize {
        self.storage.len()
    }

    fn upload(&mut self, data: &[u8], offset: usize) -> Result<(), ResourceError> {
        self.check_range(offset, data.len())?;
        self.storage[offset..offset + data.len()].copy_from_slice(data);
        log::trace!(
            "SystemMemoryBufferInterface: uploaded {} bytes at {}",
            data.len(),
            offset
        );
        Ok(())
    }

    fn map(
        &mut self,
        offset: usize,
        len: usize,
        previous: MappingState,
        requested: MappingState,
    ) -> Result<(), ResourceError> {
        self.check_range(offset, len)?;
        // A persistent re-map reuses the window opened by the first call.
        if previous == MappingState::Unmapped || self.mapping == MappingState::Unmapped {
            self.mapped_offset = offset;
            self.mapped_len = len;
        }
        self.mapping = requested;
        log::trace!(
            "SystemMemoryBufferInterface: {} -> {} ({}..{})",
            previous,
            requested,
            offset,
            offset + len
        );
        Ok(())
    }

    fn mapped_range(&mut self, offset: usize, len: usize) -> Result<&mut [u8], ResourceError> {
        if self.mapping == MappingState::Unmapped {
            return Err(ResourceError::NotMapped);
        }
        let inside = offset >= self.mapped_offset
            && offset
                .checked_add(len)
                .is_some_and(|end| end <= self.mapped_offset + self.mapped_len);
        if !inside {
            return Err(ResourceError::RangeOutOfBounds {
                offset,
                len,
                size: self.storage.len(),
            });
        }
        Ok(&mut self.storage[offset..offset + len])
    }

    fn unmap(&mut self, options: UnmapOptions) -> Result<(), ResourceError> {
        if self.mapping == MappingState::Unmapped {
            return Err(ResourceError::NotMapped);
        }
        if options == UnmapOptions::UnmapAll || !self.mapping.is_persistent() {
            self.mapping = MappingState::Unmapped;
            self.mapped_offset = 0;
            self.mapped_len = 0;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_bounds() {
        let mut store = SystemMemoryBufferInterface::new(8);
        store.upload(&[1, 2, 3, 4], 4).unwrap();
        assert_eq!(store.contents(), &[0, 0, 0, 0, 1, 2, 3, 4]);

        let err = store.upload(&[9, 9], 7).unwrap_err();
        assert!(matches!(
            err,
            ResourceError::RangeOutOfBounds {
                offset: 7,
                len: 2,
                size: 8
            }
        ));
    }

    #[test]
    fn test_mapped_range_requires_mapping() {
        let mut store = SystemMemoryBufferInterface::new(16);
        assert!(matches!(
            store.mapped_range(0, 4),
            Err(ResourceError::NotMapped)
        ));

        store
            .map(4, 8, MappingState::Unmapped, MappingState::Mapped)
            .unwrap();
        store.mapped_range(4, 8).unwrap().fill(7);
        assert!(store.mapped_range(0, 4).is_err());

        store.unmap(UnmapOptions::KeepPersistent).unwrap();
        assert_eq!(store.mapping_state(), MappingState::Unmapped);
        assert_eq!(&store.contents()[4..12], &[7; 8]);
    }

    #[test]
    fn test_persistent_mapping_survives_keep_persistent() {
        let mut store = SystemMemoryBufferInterface::new(16);
        store
            .map(0, 16, MappingState::Unmapped, MappingState::PersistentCoherent)
            .unwrap();
        store.unmap(UnmapOptions::KeepPersistent).unwrap();
        assert_eq!(store.mapping_state(), MappingState::PersistentCoherent);

        // Re-mapping a sub-range keeps the original window.
        store
            .map(
                2,
                4,
                MappingState::PersistentCoherent,
                MappingState::PersistentCoherent,
            )
            .unwrap();
        assert!(store.mapped_range(8, 8).is_ok());

        store.unmap(UnmapOptions::UnmapAll).unwrap();
        assert_eq!(store.mapping_state(), MappingState::Unmapped);
        assert!(matches!(
            store.unmap(UnmapOptions::UnmapAll),
            Err(ResourceError::NotMapped)
        ));
    }
}
