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

//! Mapping of reflected Cg parameters to GPU constant definitions.

use kiln_core::renderer::{
    GpuConstantDefinition, GpuConstantType, GpuLogicalBufferStruct, GpuNamedConstants,
    ShaderSettings,
};

/// The type of a reflected Cg parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CgType {
    Float1,
    Float2,
    Float3,
    Float4,
    Half1,
    Half2,
    Half3,
    Half4,
    /// `floatRxC`, `R` rows of `C` columns.
    FloatMatrix { rows: u8, cols: u8 },
    /// `halfRxC`, mapped like the float matrix.
    HalfMatrix { rows: u8, cols: u8 },
    Int1,
    Int2,
    Int3,
    Int4,
    Sampler1D,
    Sampler2D,
    Sampler3D,
    SamplerCube,
    SamplerRect,
    Struct,
    Array,
    /// Any type with no constant mapping.
    Other,
}

impl CgType {
    pub fn is_sampler(self) -> bool {
        matches!(
            self,
            CgType::Sampler1D
                | CgType::Sampler2D
                | CgType::Sampler3D
                | CgType::SamplerCube
                | CgType::SamplerRect
        )
    }

    /// The constant type and padded element size of a leaf parameter.
    ///
    /// Cg stores every row in a full 4-component register.
    fn constant_layout(self) -> (GpuConstantType, usize) {
        use GpuConstantType as G;
        match self {
            CgType::Float1 | CgType::Half1 => (G::Float1, 4),
            CgType::Float2 | CgType::Half2 => (G::Float2, 4),
            CgType::Float3 | CgType::Half3 => (G::Float3, 4),
            CgType::Float4 | CgType::Half4 => (G::Float4, 4),
            CgType::FloatMatrix { rows, cols } | CgType::HalfMatrix { rows, cols } => {
                let ty = match (rows, cols) {
                    (2, 2) => G::Matrix2x2,
                    (2, 3) => G::Matrix2x3,
                    (2, 4) => G::Matrix2x4,
                    // Reported as 2x3 with a 3 row footprint.
                    (3, 2) => G::Matrix2x3,
                    (3, 3) => G::Matrix3x3,
                    (3, 4) => G::Matrix3x4,
                    (4, 2) => G::Matrix4x2,
                    (4, 3) => G::Matrix4x3,
                    (4, 4) => G::Matrix4x4,
                    _ => return (G::Unknown, 0),
                };
                (ty, rows as usize * 4)
            }
            CgType::Int1 => (G::Int1, 4),
            CgType::Int2 => (G::Int2, 4),
            CgType::Int3 => (G::Int3, 4),
            CgType::Int4 => (G::Int4, 4),
            _ => (G::Unknown, 0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CgVariability {
    #[default]
    Uniform,
    Varying,
    Literal,
    Constant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CgDirection {
    #[default]
    In,
    Out,
    InOut,
}

/// One node of the parameter tree the Cg runtime reflects.
///
/// Structs list their fields in `members`; arrays hold their element
/// parameter as the single member and their length in `array_len`. A
/// multi-dimensional array nests one array per dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct CgParameter {
    pub name: String,
    pub cg_type: CgType,
    pub variability: CgVariability,
    pub direction: CgDirection,
    pub referenced: bool,
    pub array_len: usize,
    pub members: Vec<CgParameter>,
    /// Register index assigned by the compiler.
    pub resource_index: usize,
}

impl CgParameter {
    /// A referenced uniform input leaf.
    pub fn uniform(name: impl Into<String>, cg_type: CgType, resource_index: usize) -> Self {
        Self {
            name: name.into(),
            cg_type,
            variability: CgVariability::Uniform,
            direction: CgDirection::In,
            referenced: true,
            array_len: 1,
            members: Vec::new(),
            resource_index,
        }
    }

    /// A referenced uniform struct.
    pub fn structure(name: impl Into<String>, members: Vec<CgParameter>) -> Self {
        Self {
            members,
            ..Self::uniform(name, CgType::Struct, 0)
        }
    }

    /// A referenced uniform array of `len` copies of `element`.
    pub fn array(name: impl Into<String>, len: usize, element: CgParameter) -> Self {
        Self {
            array_len: len,
            members: vec![element],
            ..Self::uniform(name, CgType::Array, 0)
        }
    }

    fn is_mapped_uniform(&self) -> bool {
        self.variability == CgVariability::Uniform
            && !self.cg_type.is_sampler()
            && self.direction != CgDirection::Out
            && self.referenced
    }
}

/// The constant layout of a Cg program.
#[derive(Debug, Default)]
pub struct CgConstants {
    pub named: GpuNamedConstants,
    pub float_logical: GpuLogicalBufferStruct,
    pub int_logical: GpuLogicalBufferStruct,
}

/// Builds the constant layout from the program and global parameter lists.
///
/// Only referenced uniform inputs that are not samplers are mapped. Leaf
/// names are the full names the runtime reports (`light.colour`,
/// `lights[0].colour`), without a trailing `[0]`.
pub fn build_constant_definitions(
    label: &str,
    program_params: &[CgParameter],
    global_params: &[CgParameter],
    settings: &ShaderSettings,
) -> CgConstants {
    let mut constants = CgConstants::default();
    recurse_params(label, program_params, 1, &mut constants, settings);
    recurse_params(label, global_params, 1, &mut constants, settings);
    constants.named.float_buffer_size = constants.float_logical.buffer_size();
    constants.named.int_buffer_size = constants.int_logical.buffer_size();
    constants
}

fn recurse_params(
    label: &str,
    params: &[CgParameter],
    context_array_size: usize,
    out: &mut CgConstants,
    settings: &ShaderSettings,
) {
    for param in params.iter().filter(|p| p.is_mapped_uniform()) {
        match param.cg_type {
            CgType::Struct => recurse_params(label, &param.members, 1, out, settings),
            CgType::Array => {
                // Nested arrays flatten into one run of elements.
                let element = &param.members[..param.members.len().min(1)];
                let size = context_array_size * param.array_len;
                recurse_params(label, element, size, out, settings)
            }
            leaf => {
                let mut name = param.name.as_str();
                while let Some(stripped) = name.strip_suffix("[0]") {
                    name = stripped;
                }
                let (const_type, element_size) = leaf.constant_layout();
                if const_type == GpuConstantType::Unknown {
                    log::warn!(
                        "CgProgram({}): Problem parsing the following Cg uniform: '{}'",
                        label,
                        name
                    );
                    continue;
                }

                let mut def = GpuConstantDefinition {
                    const_type,
                    element_size,
                    array_size: context_array_size,
                    logical_index: param.resource_index,
                    ..Default::default()
                };
                let logical = if def.is_float() {
                    &out.float_logical
                } else {
                    &out.int_logical
                };
                let slot = logical.allocate(
                    def.logical_index,
                    def.total_size(),
                    def.variability,
                    const_type.base_type(),
                );
                def.physical_index = slot.physical_index;

                out.named.insert(name, def);
                out.named.generate_array_entries(
                    name,
                    &def,
                    settings.array_entry_limit,
                    settings.generate_all_array_entries,
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(params: &[CgParameter]) -> CgConstants {
        build_constant_definitions("test", params, &[], &ShaderSettings::default())
    }

    #[test]
    fn test_leaf_mapping_and_padding() {
        let params = vec![
            CgParameter::uniform("scale", CgType::Half1, 0),
            CgParameter::uniform("world", CgType::FloatMatrix { rows: 4, cols: 4 }, 1),
            CgParameter::uniform("tilt", CgType::FloatMatrix { rows: 3, cols: 2 }, 5),
            CgParameter::uniform("count", CgType::Int2, 0),
        ];
        let constants = build(&params);
        let named = &constants.named;

        assert_eq!(named.get("scale").unwrap().element_size, 4);
        assert_eq!(named.get("world").unwrap().physical_index, 4 * 4);
        let tilt = named.get("tilt").unwrap();
        assert_eq!(tilt.const_type, GpuConstantType::Matrix2x3);
        assert_eq!(tilt.element_size, 12);
        assert_eq!(named.float_buffer_size, 4 + 16 + 12);
        assert_eq!(named.int_buffer_size, 4);
        assert_eq!(constants.float_logical.len(), 3);
        assert_eq!(constants.int_logical.find(0).map(|u| u.current_size), Some(4));
    }

    #[test]
    fn test_filtered_parameters() {
        let mut out_param = CgParameter::uniform("out_colour", CgType::Float4, 1);
        out_param.direction = CgDirection::Out;
        let mut unused = CgParameter::uniform("unused", CgType::Float4, 2);
        unused.referenced = false;
        let mut varying = CgParameter::uniform("uv", CgType::Float2, 3);
        varying.variability = CgVariability::Varying;

        let params = vec![
            CgParameter::uniform("tex", CgType::Sampler2D, 0),
            out_param,
            unused,
            varying,
            CgParameter::uniform("odd", CgType::Other, 4),
        ];
        assert!(build(&params).named.is_empty());
    }

    #[test]
    fn test_structs_and_arrays() {
        let params = vec![
            CgParameter::structure(
                "light",
                vec![
                    CgParameter::uniform("light.colour", CgType::Float3, 0),
                    CgParameter::uniform("light.range", CgType::Float1, 1),
                ],
            ),
            CgParameter::array(
                "offsets",
                3,
                CgParameter::uniform("offsets[0]", CgType::Float2, 2),
            ),
        ];
        let constants = build(&params);
        let named = &constants.named;

        assert!(named.contains("light.colour"));
        assert!(named.contains("light.range"));
        let offsets = named.get("offsets").unwrap();
        assert_eq!(offsets.array_size, 3);
        assert_eq!(offsets.physical_index, 8 * 4);
        assert_eq!(named.get("offsets[2]").unwrap().physical_index, (8 + 8) * 4);
        assert_eq!(named.float_buffer_size, 4 + 4 + 12);
    }

    #[test]
    fn test_nested_arrays_flatten_every_dimension() {
        let params = vec![
            CgParameter::array(
                "grid",
                2,
                CgParameter::array(
                    "grid[0]",
                    3,
                    CgParameter::uniform("grid[0][0]", CgType::Float4, 0),
                ),
            ),
            CgParameter::uniform("after", CgType::Float1, 6),
        ];
        let constants = build(&params);
        let named = &constants.named;

        let grid = named.get("grid").unwrap();
        assert_eq!(grid.array_size, 6);
        assert_eq!(grid.total_size(), 24);
        assert_eq!(named.get("grid[5]").unwrap().physical_index, 5 * 4 * 4);
        assert_eq!(named.get("after").unwrap().physical_index, 24 * 4);
        assert_eq!(named.float_buffer_size, 24 + 4);
    }

    #[test]
    fn test_repeated_register_keeps_first_slot() {
        let program = vec![CgParameter::uniform("a", CgType::Float4, 0)];
        let global = vec![CgParameter::uniform("b", CgType::Float4, 0)];
        let constants =
            build_constant_definitions("test", &program, &global, &ShaderSettings::default());
        assert_eq!(
            constants.named.get("a").unwrap().physical_index,
            constants.named.get("b").unwrap().physical_index
        );
        assert_eq!(constants.named.float_buffer_size, 4);
    }
}
