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

//! The packed GPU buffer and its mapping state machine.
//!
//! A [`BufferPacked`] validates every CPU access against its usage class and
//! current mapping before forwarding it to a backend [`BufferInterface`].
//!
//! ```text
//!              map(flag)                    map(same flag, sub-region)
//!  Unmapped ──────────────► Mapped / Persistent* ◄──────────────┐
//!     ▲                          │         │                    │
//!     │  unmap(UnmapAll)         │         └────────────────────┘
//!     └──────────────────────────┘
//!        unmap(KeepPersistent) only leaves a plain `Mapped` state
//! ```
//!
//! The interface is owned privately, so [`upload`](BufferPacked::upload) is
//! the only write path for buffers that can carry a shadow copy. The shadow
//! copy therefore cannot drift from the GPU contents.

use crate::renderer::api::buffer::{
    BufferPackedDescriptor, BufferPackedKind, BufferType, MappingState, UnmapOptions,
};
use crate::renderer::error::BufferError;
use crate::renderer::traits::BufferInterface;

/// A GPU buffer of fixed-size elements with a validated mapping lifecycle.
#[derive(Debug)]
pub struct BufferPacked {
    label: String,
    kind: BufferPackedKind,
    num_elements: usize,
    bytes_per_element: usize,
    buffer_type: BufferType,
    internal_buffer_start: usize,
    mapping_state: MappingState,
    last_mapping_start: usize,
    last_mapping_count: usize,
    shadow_copy: Option<Vec<u8>>,
    interface: Box<dyn BufferInterface>,
}

impl BufferPacked {
    /// Creates a packed buffer on top of `interface`.
    ///
    /// # Errors
    ///
    /// - [`BufferError::ImmutableWithoutData`] if an immutable buffer has no
    ///   initial data.
    /// - [`BufferError::DynamicWithShadowCopy`] if a dynamic buffer asks for
    ///   a shadow copy.
    /// - [`BufferError::DataSizeMismatch`] if `initial_data` does not cover
    ///   the whole buffer.
    pub fn new(
        desc: &BufferPackedDescriptor<'_>,
        initial_data: Option<&[u8]>,
        mut interface: Box<dyn BufferInterface>,
    ) -> Result<Self, BufferError> {
        let label = desc
            .label
            .as_deref()
            .map(str::to_owned)
            .unwrap_or_else(|| format!("{:?}", desc.kind));

        if desc.buffer_type == BufferType::Immutable && initial_data.is_none() {
            return Err(BufferError::ImmutableWithoutData { label });
        }
        if desc.buffer_type == BufferType::Dynamic && desc.keep_shadow_copy {
            return Err(BufferError::DynamicWithShadowCopy { label });
        }

        let total = desc.total_size_bytes();
        if let Some(data) = initial_data {
            if data.len() != total {
                return Err(BufferError::DataSizeMismatch {
                    label,
                    expected: total,
                    actual: data.len(),
                });
            }
            interface.upload(data, desc.internal_buffer_start * desc.bytes_per_element)?;
        }

        let shadow_copy = desc.keep_shadow_copy.then(|| match initial_data {
            Some(data) => data.to_vec(),
            None => vec![0; total],
        });

        log::debug!(
            "BufferPacked({}): created {:?} {:?} buffer, {} x {} bytes",
            label,
            desc.buffer_type,
            desc.kind,
            desc.num_elements,
            desc.bytes_per_element
        );

        Ok(Self {
            label,
            kind: desc.kind,
            num_elements: desc.num_elements,
            bytes_per_element: desc.bytes_per_element,
            buffer_type: desc.buffer_type,
            internal_buffer_start: desc.internal_buffer_start,
            mapping_state: MappingState::Unmapped,
            last_mapping_start: 0,
            last_mapping_count: 0,
            shadow_copy,
            interface,
        })
    }

    fn check_range(&self, element_start: usize, element_count: usize) -> Result<(), BufferError> {
        let in_bounds = element_start
            .checked_add(element_count)
            .is_some_and(|end| end <= self.num_elements);
        if in_bounds {
            Ok(())
        } else {
            Err(BufferError::OutOfBounds {
                label: self.label.clone(),
                element_start,
                element_count,
                num_elements: self.num_elements,
            })
        }
    }

    fn byte_offset(&self, element_start: usize) -> usize {
        (self.internal_buffer_start + element_start) * self.bytes_per_element
    }

    /// Writes `data` over `element_start..element_start + element_count`.
    ///
    /// The shadow copy, if any, receives exactly the same bytes; everything
    /// outside the range is left untouched.
    ///
    /// # Errors
    ///
    /// Fails on immutable buffers, while mapped, on out-of-range elements, or
    /// if `data` is not `element_count * bytes_per_element` long.
    pub fn upload(
        &mut self,
        data: &[u8],
        element_start: usize,
        element_count: usize,
    ) -> Result<(), BufferError> {
        if self.buffer_type == BufferType::Immutable {
            return Err(BufferError::UploadToImmutable {
                label: self.label.clone(),
            });
        }
        if self.mapping_state != MappingState::Unmapped {
            return Err(BufferError::UploadWhileMapped {
                label: self.label.clone(),
                state: self.mapping_state,
            });
        }
        self.check_range(element_start, element_count)?;

        let expected = element_count * self.bytes_per_element;
        if data.len() != expected {
            return Err(BufferError::DataSizeMismatch {
                label: self.label.clone(),
                expected,
                actual: data.len(),
            });
        }

        self.interface.upload(data, self.byte_offset(element_start))?;

        if let Some(shadow) = self.shadow_copy.as_mut() {
            let start = element_start * self.bytes_per_element;
            shadow[start..start + expected].copy_from_slice(data);
        }
        Ok(())
    }

    /// Uploads a slice of plain-old-data values starting at `element_start`.
    ///
    /// The element count is derived from the byte length of `data`.
    pub fn upload_pod<T: bytemuck::Pod>(
        &mut self,
        data: &[T],
        element_start: usize,
    ) -> Result<(), BufferError> {
        let bytes: &[u8] = bytemuck::cast_slice(data);
        if self.bytes_per_element == 0 || bytes.len() % self.bytes_per_element != 0 {
            return Err(BufferError::DataSizeMismatch {
                label: self.label.clone(),
                expected: self.bytes_per_element,
                actual: bytes.len(),
            });
        }
        self.upload(bytes, element_start, bytes.len() / self.bytes_per_element)
    }

    /// Maps `element_start..element_start + element_count` for CPU writes.
    ///
    /// While a mapping is active, the same persistence flag may be requested
    /// again; for persistent mappings the new range must lie inside the
    /// range of the original map call.
    ///
    /// # Errors
    ///
    /// Fails on non-dynamic buffers, when `flag` is
    /// [`MappingState::Unmapped`], on a flag mismatch with the active
    /// mapping, or when a persistent re-map leaves the mapped region.
    pub fn map(
        &mut self,
        element_start: usize,
        element_count: usize,
        flag: MappingState,
    ) -> Result<&mut [u8], BufferError> {
        if self.buffer_type != BufferType::Dynamic {
            return Err(BufferError::MapNonDynamic {
                label: self.label.clone(),
                buffer_type: self.buffer_type,
            });
        }
        if flag == MappingState::Unmapped {
            return Err(BufferError::InvalidPersistenceFlag {
                label: self.label.clone(),
            });
        }
        self.check_range(element_start, element_count)?;

        let previous = self.mapping_state;
        if previous != MappingState::Unmapped {
            if previous != flag {
                return Err(BufferError::MappingMismatch {
                    label: self.label.clone(),
                    current: previous,
                    requested: flag,
                });
            }
            let contained = element_start >= self.last_mapping_start
                && element_start + element_count
                    <= self.last_mapping_start + self.last_mapping_count;
            if previous.is_persistent() && !contained {
                return Err(BufferError::SubRegionOutsideMapping {
                    label: self.label.clone(),
                    element_start,
                    element_count,
                    mapped_start: self.last_mapping_start,
                    mapped_count: self.last_mapping_count,
                });
            }
        }

        let offset = self.byte_offset(element_start);
        let len = element_count * self.bytes_per_element;
        self.interface.map(offset, len, previous, flag)?;

        if previous == MappingState::Unmapped {
            self.last_mapping_start = element_start;
            self.last_mapping_count = element_count;
        }
        self.mapping_state = flag;
        log::trace!(
            "BufferPacked({}): {} -> {} ({}..{})",
            self.label,
            previous,
            flag,
            element_start,
            element_start + element_count
        );

        self.interface
            .mapped_range(offset, len)
            .map_err(BufferError::from)
    }

    /// Ends the active mapping.
    ///
    /// With [`UnmapOptions::KeepPersistent`] a persistent mapping stays
    /// active and only a plain [`MappingState::Mapped`] returns to unmapped.
    pub fn unmap(&mut self, options: UnmapOptions) -> Result<(), BufferError> {
        if self.mapping_state == MappingState::Unmapped {
            return Err(BufferError::NotMapped {
                label: self.label.clone(),
            });
        }

        self.interface.unmap(options)?;

        if options == UnmapOptions::UnmapAll || self.mapping_state == MappingState::Mapped {
            self.mapping_state = MappingState::Unmapped;
        }
        Ok(())
    }

    /// The buffer's debug label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The binding role of the buffer.
    pub fn kind(&self) -> BufferPackedKind {
        self.kind
    }

    /// The usage class.
    pub fn buffer_type(&self) -> BufferType {
        self.buffer_type
    }

    /// Number of elements.
    pub fn num_elements(&self) -> usize {
        self.num_elements
    }

    /// Size of one element in bytes.
    pub fn bytes_per_element(&self) -> usize {
        self.bytes_per_element
    }

    /// Total size in bytes.
    pub fn total_size_bytes(&self) -> usize {
        self.num_elements * self.bytes_per_element
    }

    /// The current mapping state.
    pub fn mapping_state(&self) -> MappingState {
        self.mapping_state
    }

    /// First element of the most recent mapping started from unmapped.
    pub fn last_mapping_start(&self) -> usize {
        self.last_mapping_start
    }

    /// Element count of the most recent mapping started from unmapped.
    pub fn last_mapping_count(&self) -> usize {
        self.last_mapping_count
    }

    /// The CPU-side mirror of the buffer, if one is kept.
    pub fn shadow_copy(&self) -> Option<&[u8]> {
        self.shadow_copy.as_deref()
    }

    /// Reads `element_count` elements from the shadow copy.
    pub fn read_shadow(&self, element_start: usize, element_count: usize) -> Option<&[u8]> {
        self.check_range(element_start, element_count).ok()?;
        let start = element_start * self.bytes_per_element;
        let end = start + element_count * self.bytes_per_element;
        self.shadow_copy.as_deref().map(|shadow| &shadow[start..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::error::ResourceError;
    use std::borrow::Cow;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Debug, Default)]
    struct Counters {
        uploads: AtomicUsize,
        maps: AtomicUsize,
        unmaps: AtomicUsize,
    }

    #[derive(Debug)]
    struct MockInterface {
        storage: Vec<u8>,
        counters: Arc<Counters>,
    }

    impl MockInterface {
        fn boxed(size: usize) -> (Box<dyn BufferInterface>, Arc<Counters>) {
            let counters = Arc::new(Counters::default());
            let iface = MockInterface {
                storage: vec![0; size],
                counters: Arc::clone(&counters),
            };
            (Box::new(iface), counters)
        }
    }

    impl BufferInterface for MockInterface {
        fn size_bytes(&self) -> usize {
            self.storage.len()
        }

        fn upload(&mut self, data: &[u8], offset: usize) -> Result<(), ResourceError> {
            self.counters.uploads.fetch_add(1, Ordering::Relaxed);
            self.storage[offset..offset + data.len()].copy_from_slice(data);
            Ok(())
        }

        fn map(
            &mut self,
            _offset: usize,
            _len: usize,
            _previous: MappingState,
            _requested: MappingState,
        ) -> Result<(), ResourceError> {
            self.counters.maps.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }

        fn mapped_range(&mut self, offset: usize, len: usize) -> Result<&mut [u8], ResourceError> {
            Ok(&mut self.storage[offset..offset + len])
        }

        fn unmap(&mut self, _options: UnmapOptions) -> Result<(), ResourceError> {
            self.counters.unmaps.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }
    }

    fn desc(buffer_type: BufferType, shadow: bool) -> BufferPackedDescriptor<'static> {
        BufferPackedDescriptor {
            label: Some(Cow::Borrowed("Test")),
            kind: BufferPackedKind::Vertex,
            num_elements: 8,
            bytes_per_element: 4,
            buffer_type,
            internal_buffer_start: 0,
            keep_shadow_copy: shadow,
        }
    }

    #[test]
    fn test_immutable_requires_initial_data() {
        let (iface, _) = MockInterface::boxed(32);
        let err = BufferPacked::new(&desc(BufferType::Immutable, false), None, iface).unwrap_err();
        assert!(matches!(err, BufferError::ImmutableWithoutData { .. }));
    }

    #[test]
    fn test_immutable_with_data_uploads_once() {
        let (iface, counters) = MockInterface::boxed(32);
        let data = [7u8; 32];
        let mut buffer =
            BufferPacked::new(&desc(BufferType::Immutable, false), Some(&data), iface).unwrap();
        assert_eq!(counters.uploads.load(Ordering::Relaxed), 1);

        let err = buffer.upload(&[0; 4], 0, 1).unwrap_err();
        assert!(matches!(err, BufferError::UploadToImmutable { .. }));
    }

    #[test]
    fn test_dynamic_rejects_shadow_copy() {
        let (iface, _) = MockInterface::boxed(32);
        let err = BufferPacked::new(&desc(BufferType::Dynamic, true), None, iface).unwrap_err();
        assert!(matches!(err, BufferError::DynamicWithShadowCopy { .. }));
    }

    #[test]
    fn test_initial_data_size_is_checked() {
        let (iface, _) = MockInterface::boxed(32);
        let err =
            BufferPacked::new(&desc(BufferType::Default, false), Some(&[0; 5]), iface).unwrap_err();
        assert!(matches!(
            err,
            BufferError::DataSizeMismatch {
                expected: 32,
                actual: 5,
                ..
            }
        ));
    }

    #[test]
    fn test_upload_updates_only_addressed_shadow_bytes() {
        let (iface, _) = MockInterface::boxed(32);
        let initial: Vec<u8> = (0..32).collect();
        let mut buffer =
            BufferPacked::new(&desc(BufferType::Default, true), Some(&initial), iface).unwrap();

        let data = [0xAA; 8];
        buffer.upload(&data, 2, 2).unwrap();

        let shadow = buffer.shadow_copy().unwrap();
        assert_eq!(&shadow[8..16], &data);
        assert_eq!(&shadow[..8], &initial[..8]);
        assert_eq!(&shadow[16..], &initial[16..]);
        assert_eq!(buffer.read_shadow(2, 2).unwrap(), &data);
    }

    #[test]
    fn test_upload_out_of_bounds() {
        let (iface, _) = MockInterface::boxed(32);
        let mut buffer = BufferPacked::new(&desc(BufferType::Default, false), None, iface).unwrap();
        let err = buffer.upload(&[0; 12], 6, 3).unwrap_err();
        assert!(matches!(err, BufferError::OutOfBounds { .. }));
    }

    #[test]
    fn test_upload_pod() {
        let (iface, _) = MockInterface::boxed(32);
        let mut buffer = BufferPacked::new(&desc(BufferType::Default, true), None, iface).unwrap();
        buffer.upload_pod(&[1.0f32, 2.0], 3).unwrap();
        assert_eq!(
            buffer.read_shadow(3, 2).unwrap(),
            bytemuck::cast_slice::<f32, u8>(&[1.0, 2.0])
        );
    }

    #[test]
    fn test_map_rejects_non_dynamic() {
        let (iface, _) = MockInterface::boxed(32);
        let mut buffer = BufferPacked::new(&desc(BufferType::Default, false), None, iface).unwrap();
        let err = buffer.map(0, 8, MappingState::Mapped).unwrap_err();
        assert!(matches!(err, BufferError::MapNonDynamic { .. }));
    }

    #[test]
    fn test_map_rejects_unmapped_flag() {
        let (iface, _) = MockInterface::boxed(32);
        let mut buffer = BufferPacked::new(&desc(BufferType::Dynamic, false), None, iface).unwrap();
        let err = buffer.map(0, 8, MappingState::Unmapped).unwrap_err();
        assert!(matches!(err, BufferError::InvalidPersistenceFlag { .. }));
    }

    #[test]
    fn test_map_write_unmap_cycle() {
        let (iface, counters) = MockInterface::boxed(32);
        let mut buffer = BufferPacked::new(&desc(BufferType::Dynamic, false), None, iface).unwrap();

        let bytes = buffer.map(1, 2, MappingState::Mapped).unwrap();
        assert_eq!(bytes.len(), 8);
        bytes.fill(3);
        assert_eq!(buffer.mapping_state(), MappingState::Mapped);

        buffer.unmap(UnmapOptions::KeepPersistent).unwrap();
        assert_eq!(buffer.mapping_state(), MappingState::Unmapped);
        assert_eq!(counters.maps.load(Ordering::Relaxed), 1);
        assert_eq!(counters.unmaps.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_second_map_with_different_flag_fails() {
        let (iface, _) = MockInterface::boxed(32);
        let mut buffer = BufferPacked::new(&desc(BufferType::Dynamic, false), None, iface).unwrap();
        buffer.map(0, 8, MappingState::PersistentCoherent).unwrap();

        let err = buffer.map(0, 4, MappingState::PersistentIncoherent).unwrap_err();
        assert!(matches!(err, BufferError::MappingMismatch { .. }));
        assert_eq!(buffer.mapping_state(), MappingState::PersistentCoherent);
    }

    #[test]
    fn test_persistent_remap_must_stay_inside_region() {
        let (iface, _) = MockInterface::boxed(32);
        let mut buffer = BufferPacked::new(&desc(BufferType::Dynamic, false), None, iface).unwrap();
        buffer.map(2, 4, MappingState::PersistentIncoherent).unwrap();

        assert!(buffer.map(3, 2, MappingState::PersistentIncoherent).is_ok());
        assert_eq!(buffer.last_mapping_start(), 2);
        assert_eq!(buffer.last_mapping_count(), 4);

        let err = buffer
            .map(4, 4, MappingState::PersistentIncoherent)
            .unwrap_err();
        assert!(matches!(err, BufferError::SubRegionOutsideMapping { .. }));
    }

    #[test]
    fn test_keep_persistent_leaves_mapping_active() {
        let (iface, _) = MockInterface::boxed(32);
        let mut buffer = BufferPacked::new(&desc(BufferType::Dynamic, false), None, iface).unwrap();
        buffer.map(0, 8, MappingState::PersistentCoherent).unwrap();

        buffer.unmap(UnmapOptions::KeepPersistent).unwrap();
        assert_eq!(buffer.mapping_state(), MappingState::PersistentCoherent);

        buffer.unmap(UnmapOptions::UnmapAll).unwrap();
        assert_eq!(buffer.mapping_state(), MappingState::Unmapped);
    }

    #[test]
    fn test_unmap_while_unmapped_fails() {
        let (iface, _) = MockInterface::boxed(32);
        let mut buffer = BufferPacked::new(&desc(BufferType::Dynamic, false), None, iface).unwrap();
        let err = buffer.unmap(UnmapOptions::UnmapAll).unwrap_err();
        assert!(matches!(err, BufferError::NotMapped { .. }));
    }

    #[test]
    fn test_upload_while_mapped_fails() {
        let (iface, _) = MockInterface::boxed(32);
        let mut buffer = BufferPacked::new(&desc(BufferType::Dynamic, false), None, iface).unwrap();
        buffer.map(0, 1, MappingState::Mapped).unwrap();
        let err = buffer.upload(&[0; 4], 0, 1).unwrap_err();
        assert!(matches!(err, BufferError::UploadWhileMapped { .. }));
    }

    #[test]
    fn test_internal_start_offsets_interface_writes() {
        let (iface, _) = MockInterface::boxed(64);
        let mut d = desc(BufferType::Dynamic, false);
        d.internal_buffer_start = 4;
        let mut buffer = BufferPacked::new(&d, None, iface).unwrap();
        let bytes = buffer.map(0, 8, MappingState::Mapped).unwrap();
        assert_eq!(bytes.len(), 32);
    }
}
