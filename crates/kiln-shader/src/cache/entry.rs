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

use super::{entry_read_config, wire_config, CacheError};
use kiln_core::renderer::{GpuConstantDefinition, GpuNamedConstants};
use serde::{Deserialize, Serialize};

/// Primitive topology consumed or produced by a geometry stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OperationType {
    PointList,
    LineList,
    LineStrip,
    #[default]
    TriangleList,
    TriangleStrip,
    TriangleFan,
}

/// State carried by a program compiled to a delegate language.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DelegateInfo {
    /// Sampler name to texture register.
    pub sampler_registers: Vec<(String, i32)>,
    pub input_operation: OperationType,
    pub output_operation: OperationType,
}

/// One cached compilation result.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MicrocodeEntry {
    /// The final program text handed to the driver.
    pub program_source: String,
    pub parameters: Vec<(String, GpuConstantDefinition)>,
    pub delegate: Option<DelegateInfo>,
}

impl MicrocodeEntry {
    /// Rebuilds the named constant table from the stored parameters.
    ///
    /// Buffer sizes are recovered from the extent of the stored physical
    /// ranges.
    pub fn to_named_constants(&self) -> GpuNamedConstants {
        let mut named = GpuNamedConstants::new();
        for (name, def) in &self.parameters {
            named.insert(name.as_str(), *def);
            if name.ends_with(']') || !def.is_allocated() {
                continue;
            }
            let unit_bytes = def.const_type.base_type().unit_bytes();
            let end = def.physical_index / unit_bytes + def.total_size();
            let size = if def.is_float() {
                &mut named.float_buffer_size
            } else if def.is_double() {
                &mut named.double_buffer_size
            } else {
                &mut named.int_buffer_size
            };
            *size = (*size).max(end);
            if def.is_sampler() {
                named.register_count += def.array_size;
            }
        }
        named
    }
}

/// Serialises one entry into a self-contained blob.
pub fn encode_entry(entry: &MicrocodeEntry) -> Result<Vec<u8>, CacheError> {
    Ok(bincode::serde::encode_to_vec(entry, wire_config())?)
}

/// Reads a blob written by [`encode_entry`].
///
/// The blob must be consumed exactly.
pub fn decode_entry(bytes: &[u8]) -> Result<MicrocodeEntry, CacheError> {
    let (entry, read): (MicrocodeEntry, usize) =
        bincode::serde::decode_from_slice(bytes, entry_read_config())?;
    if read != bytes.len() {
        return Err(CacheError::TrailingBytes {
            trailing: bytes.len() - read,
        });
    }
    Ok(entry)
}
