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

//! The name-keyed table of a program's constant definitions.

use super::definition::GpuConstantDefinition;
use super::types::BaseConstantType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Maps constant names to their definitions and tracks the size of each
/// kind-specific physical buffer.
///
/// Buffer sizes are counted in scalar units; physical indices handed out by
/// [`allocate`](Self::allocate) are byte offsets into the matching buffer.
/// Allocation only ever grows a buffer, so offsets are never reused while
/// the owning program is alive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GpuNamedConstants {
    /// Total size of the float buffer, in floats.
    pub float_buffer_size: usize,
    /// Total size of the double buffer, in doubles.
    pub double_buffer_size: usize,
    /// Total size of the int buffer (ints, uints, bools and samplers), in ints.
    pub int_buffer_size: usize,
    /// Number of sampler registers in use.
    pub register_count: usize,
    map: BTreeMap<String, GpuConstantDefinition>,
}

impl GpuNamedConstants {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the definition registered under `name`.
    pub fn get(&self, name: &str) -> Option<&GpuConstantDefinition> {
        self.map.get(name)
    }

    /// Returns `true` if a definition named `name` exists.
    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    /// Inserts or replaces a definition, returning the previous one.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        def: GpuConstantDefinition,
    ) -> Option<GpuConstantDefinition> {
        self.map.insert(name.into(), def)
    }

    /// Iterates over all definitions in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &GpuConstantDefinition)> {
        self.map.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of registered names, array element entries included.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns `true` if no definition is registered.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Assigns `def` a physical offset in the buffer matching its type and
    /// grows that buffer by `array_size * element_size` units.
    ///
    /// Samplers, booleans and unsigned integers share the int buffer.
    pub fn allocate(&mut self, def: &mut GpuConstantDefinition) {
        let base = def.const_type.base_type();
        let units = def.total_size();
        let buffer = match base {
            BaseConstantType::Float => &mut self.float_buffer_size,
            BaseConstantType::Double => &mut self.double_buffer_size,
            _ => &mut self.int_buffer_size,
        };
        def.physical_index = *buffer * base.unit_bytes();
        *buffer += units;

        if base == BaseConstantType::Sampler {
            self.register_count += def.array_size;
        }
    }

    /// Adds one `name[i]` entry per array element of `base_def`.
    ///
    /// Arrays longer than `limit` only get a `name[0]` entry unless
    /// `generate_all` is set. Each entry has an array size of one and a
    /// physical index advanced by one element.
    pub fn generate_array_entries(
        &mut self,
        name: &str,
        base_def: &GpuConstantDefinition,
        limit: usize,
        generate_all: bool,
    ) {
        let mut entry = *base_def;
        entry.array_size = 1;

        let count = if base_def.array_size <= limit || generate_all {
            base_def.array_size
        } else {
            1
        };
        let stride = base_def.element_size * base_def.const_type.base_type().unit_bytes();

        for i in 0..count {
            self.map.insert(format!("{name}[{i}]"), entry);
            entry.physical_index += stride;
        }
    }

    /// Sum of `array_size * element_size` over the base definitions of the
    /// given category. Array element entries (`name[i]`) are skipped.
    pub fn total_units(&self, base: BaseConstantType) -> usize {
        self.map
            .iter()
            .filter(|(name, _)| !name.ends_with(']'))
            .filter(|(_, def)| match base {
                BaseConstantType::Float | BaseConstantType::Double => {
                    def.const_type.base_type() == base
                }
                _ => !def.is_float() && !def.is_double(),
            })
            .map(|(_, def)| def.total_size())
            .sum()
    }
}
