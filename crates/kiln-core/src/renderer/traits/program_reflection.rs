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

//! Raw driver reflection of linked programs.

use crate::renderer::api::shader::ProgramId;
use crate::renderer::error::ResourceError;

/// One active uniform as reported by the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveUniform {
    /// The reported name. Arrays report `name[0]`, some drivers also report
    /// every further element.
    pub name: String,
    /// The driver type enum (for example `GL_FLOAT_VEC4`).
    pub gl_type: u32,
    /// Number of array elements, `1` for non-arrays.
    pub array_size: usize,
    /// The uniform location, negative for uniforms inside blocks.
    pub location: i32,
}

/// One active uniform block as reported by the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveUniformBlock {
    /// The block index inside the program.
    pub index: u32,
    /// The block's external name.
    pub name: String,
    /// The block's data size in bytes.
    pub data_size: usize,
    /// The binding point currently assigned by the driver.
    pub binding: u32,
}

/// Access to a driver's program introspection API.
pub trait ProgramReflection {
    /// Number of active uniforms in `program`.
    fn active_uniform_count(&self, program: ProgramId) -> usize;

    /// The active uniform at `index`.
    fn active_uniform(&self, program: ProgramId, index: usize) -> Option<ActiveUniform>;

    /// Number of active uniform blocks in `program`.
    fn active_uniform_block_count(&self, program: ProgramId) -> usize;

    /// The active uniform block at `index`.
    fn active_uniform_block(&self, program: ProgramId, index: usize)
        -> Option<ActiveUniformBlock>;

    /// Assigns `binding` to the uniform block at `block_index`.
    fn set_uniform_block_binding(
        &self,
        program: ProgramId,
        block_index: u32,
        binding: u32,
    ) -> Result<(), ResourceError>;
}
