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

use super::cpu_program::Program;
use super::function::Function;
use kiln_core::renderer::{ProgramError, ShaderStage};

/// Creates the program objects render states are composed into.
pub trait ProgramFactory: Send + Sync {
    /// Creates an empty program for `stage`.
    fn create_program(&self, stage: ShaderStage, name: &str) -> Result<Program, ProgramError>;

    /// Adds a function to `program` and returns its index.
    fn create_function(
        &self,
        program: &mut Program,
        name: &str,
        description: &str,
    ) -> Result<usize, ProgramError>;

    /// Marks the function at `function` as the program's entry point.
    fn set_entry_point_function(
        &self,
        program: &mut Program,
        function: usize,
    ) -> Result<(), ProgramError>;
}

/// Builds programs purely in memory.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultProgramFactory;

impl ProgramFactory for DefaultProgramFactory {
    fn create_program(&self, stage: ShaderStage, name: &str) -> Result<Program, ProgramError> {
        match stage {
            ShaderStage::Vertex | ShaderStage::Fragment => Ok(Program::new(stage, name)),
            other => Err(ProgramError::GenerationFailed(format!(
                "cannot generate a {other} program"
            ))),
        }
    }

    fn create_function(
        &self,
        program: &mut Program,
        name: &str,
        description: &str,
    ) -> Result<usize, ProgramError> {
        if program.function_index(name).is_some() {
            return Err(ProgramError::GenerationFailed(format!(
                "function '{name}' already exists in program '{}'",
                program.name()
            )));
        }
        Ok(program.add_function(Function::new(name, description)))
    }

    fn set_entry_point_function(
        &self,
        program: &mut Program,
        function: usize,
    ) -> Result<(), ProgramError> {
        program.set_entry_point(function)
    }
}
