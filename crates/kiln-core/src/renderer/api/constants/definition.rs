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

//! Defines [`GpuConstantDefinition`], the record describing one named constant.

use super::types::GpuConstantType;
use crate::renderer::api::util::flags::GpuParamVariability;
use serde::{Deserialize, Serialize};

/// Sentinel physical index of a definition that has not been allocated yet.
pub const UNASSIGNED_PHYSICAL_INDEX: usize = usize::MAX;

/// Describes where and how a named constant is stored.
///
/// The record has a fixed serialized size so it can be written verbatim
/// into the microcode cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GpuConstantDefinition {
    /// The semantic type of the constant.
    pub const_type: GpuConstantType,
    /// Offset into the kind-specific physical buffer.
    pub physical_index: usize,
    /// The language-visible slot (register number). Meaningless for GLSL,
    /// where it holds the uniform location instead.
    pub logical_index: usize,
    /// Number of scalar units one element occupies, padded or tight.
    pub element_size: usize,
    /// Number of array elements, `1` for non-arrays.
    pub array_size: usize,
    /// How often the constant changes.
    pub variability: GpuParamVariability,
}

impl GpuConstantDefinition {
    /// Creates a definition of the given type with tight or padded sizing.
    pub fn new(const_type: GpuConstantType, array_size: usize, padded: bool) -> Self {
        Self {
            const_type,
            element_size: const_type.element_size(padded),
            array_size,
            ..Default::default()
        }
    }

    /// Total number of scalar units covered by the whole array.
    pub fn total_size(&self) -> usize {
        self.array_size * self.element_size
    }

    /// Whether this definition has been given a physical slot.
    pub fn is_allocated(&self) -> bool {
        self.physical_index != UNASSIGNED_PHYSICAL_INDEX
    }

    /// Shorthand for [`GpuConstantType::is_float`].
    pub fn is_float(&self) -> bool {
        self.const_type.is_float()
    }

    /// Shorthand for [`GpuConstantType::is_double`].
    pub fn is_double(&self) -> bool {
        self.const_type.is_double()
    }

    /// Shorthand for [`GpuConstantType::is_sampler`].
    pub fn is_sampler(&self) -> bool {
        self.const_type.is_sampler()
    }
}

impl Default for GpuConstantDefinition {
    fn default() -> Self {
        Self {
            const_type: GpuConstantType::Unknown,
            physical_index: UNASSIGNED_PHYSICAL_INDEX,
            logical_index: 0,
            element_size: 0,
            array_size: 1,
            variability: GpuParamVariability::GLOBAL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_definition() {
        let def = GpuConstantDefinition::default();
        assert_eq!(def.const_type, GpuConstantType::Unknown);
        assert_eq!(def.array_size, 1);
        assert_eq!(def.element_size, 0);
        assert!(!def.is_allocated());
        assert_eq!(def.variability, GpuParamVariability::GLOBAL);
    }

    #[test]
    fn test_total_size() {
        let def = GpuConstantDefinition::new(GpuConstantType::Matrix3x3, 4, false);
        assert_eq!(def.element_size, 9);
        assert_eq!(def.total_size(), 36);

        let padded = GpuConstantDefinition::new(GpuConstantType::Float3, 2, true);
        assert_eq!(padded.total_size(), 8);
    }
}
