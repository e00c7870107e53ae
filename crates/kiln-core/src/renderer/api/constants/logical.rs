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

//! Logical-to-physical constant mapping shared by every user of a program.
//!
//! Register-based languages (HLSL, Cg) address constants by a logical slot.
//! The first time a slot is seen it is given a physical range in a flat
//! buffer; later lookups must observe the same range. Program loading may
//! happen on several threads, so the table sits behind a mutex.

use super::types::BaseConstantType;
use crate::renderer::api::util::flags::GpuParamVariability;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

/// The physical placement recorded for one logical slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpuLogicalIndexUse {
    /// Byte offset in the physical buffer.
    pub physical_index: usize,
    /// Number of scalar units reserved.
    pub current_size: usize,
    /// Variability of the constant occupying the slot.
    pub variability: GpuParamVariability,
    /// Base type of the constant occupying the slot.
    pub base_type: BaseConstantType,
}

#[derive(Debug, Default)]
struct LogicalBufferInner {
    map: BTreeMap<usize, GpuLogicalIndexUse>,
    buffer_size: usize,
}

/// A mutex-guarded map from logical slot to physical placement.
#[derive(Debug, Default)]
pub struct GpuLogicalBufferStruct {
    inner: Mutex<LogicalBufferInner>,
}

impl GpuLogicalBufferStruct {
    /// Creates an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, LogicalBufferInner> {
        // A panic while holding the lock cannot leave the map half-updated,
        // every mutation is a single insert plus a size bump.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Returns the physical placement of `logical_index`, reserving
    /// `size` units at the end of the buffer if the slot is new.
    ///
    /// Repeated calls for the same slot return the first placement.
    pub fn allocate(
        &self,
        logical_index: usize,
        size: usize,
        variability: GpuParamVariability,
        base_type: BaseConstantType,
    ) -> GpuLogicalIndexUse {
        let mut inner = self.lock();
        if let Some(existing) = inner.map.get(&logical_index) {
            return *existing;
        }

        let entry = GpuLogicalIndexUse {
            physical_index: inner.buffer_size * base_type.unit_bytes(),
            current_size: size,
            variability,
            base_type,
        };
        inner.buffer_size += size;
        inner.map.insert(logical_index, entry);
        log::trace!(
            "GpuLogicalBufferStruct: slot {} -> byte {} ({} units)",
            logical_index,
            entry.physical_index,
            size
        );
        entry
    }

    /// Looks up an already allocated slot.
    pub fn find(&self, logical_index: usize) -> Option<GpuLogicalIndexUse> {
        self.lock().map.get(&logical_index).copied()
    }

    /// Total number of units reserved so far.
    pub fn buffer_size(&self) -> usize {
        self.lock().buffer_size
    }

    /// Number of allocated slots.
    pub fn len(&self) -> usize {
        self.lock().map.len()
    }

    /// Returns `true` if no slot has been allocated.
    pub fn is_empty(&self) -> bool {
        self.lock().map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_allocate_is_idempotent_per_slot() {
        let buffer = GpuLogicalBufferStruct::new();
        let first = buffer.allocate(3, 4, GpuParamVariability::GLOBAL, BaseConstantType::Float);
        let again = buffer.allocate(3, 16, GpuParamVariability::GLOBAL, BaseConstantType::Float);

        assert_eq!(first, again);
        assert_eq!(buffer.buffer_size(), 4);
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn test_allocations_grow_monotonically() {
        let buffer = GpuLogicalBufferStruct::new();
        let a = buffer.allocate(0, 4, GpuParamVariability::GLOBAL, BaseConstantType::Float);
        let b = buffer.allocate(1, 16, GpuParamVariability::GLOBAL, BaseConstantType::Float);
        let c = buffer.allocate(9, 4, GpuParamVariability::GLOBAL, BaseConstantType::Float);

        assert_eq!(a.physical_index, 0);
        assert_eq!(b.physical_index, 16);
        assert_eq!(c.physical_index, 80);
        assert_eq!(buffer.find(1), Some(b));
        assert_eq!(buffer.find(2), None);
    }

    #[test]
    fn test_concurrent_allocation_has_single_writer() {
        let buffer = Arc::new(GpuLogicalBufferStruct::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let buffer = Arc::clone(&buffer);
                thread::spawn(move || {
                    for i in 0..32 {
                        buffer.allocate(
                            t * 32 + i,
                            4,
                            GpuParamVariability::GLOBAL,
                            BaseConstantType::Float,
                        );
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(buffer.len(), 256);
        assert_eq!(buffer.buffer_size(), 1024);
    }
}
