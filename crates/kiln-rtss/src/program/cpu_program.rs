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

use super::function::Function;
use super::parameter::{AutoConstant, Parameter};
use kiln_core::renderer::{GpuConstantType, ProgramError, ShaderStage};

/// A CPU-side description of one GPU program, built up by sub render states
/// before being written out as source.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    stage: ShaderStage,
    name: String,
    parameters: Vec<Parameter>,
    functions: Vec<Function>,
    entry_point: Option<usize>,
    dependencies: Vec<String>,
}

impl Program {
    pub fn new(stage: ShaderStage, name: impl Into<String>) -> Self {
        Self {
            stage,
            name: name.into(),
            parameters: Vec::new(),
            functions: Vec::new(),
            entry_point: None,
            dependencies: Vec::new(),
        }
    }

    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns a uniform of `const_type`.
    ///
    /// With an index, the uniform `suggested_name{index}` is shared by every
    /// caller asking for the same index. Without one, a fresh uniform is
    /// declared on every call.
    pub fn resolve_parameter(
        &mut self,
        const_type: GpuConstantType,
        index: Option<u32>,
        suggested_name: &str,
    ) -> &Parameter {
        let slot = match index {
            Some(index) => {
                let name = format!("{suggested_name}{index}");
                match self.parameters.iter().position(|p| p.name() == name) {
                    Some(slot) => slot,
                    None => self.push_parameter(Parameter::uniform(name, const_type, index)),
                }
            }
            None => {
                let name = format!("{suggested_name}{}", self.parameters.len());
                self.push_parameter(Parameter::uniform(name, const_type, 0))
            }
        };
        &self.parameters[slot]
    }

    /// Returns the uniform bound to `constant`, declaring it first if needed.
    pub fn resolve_auto_parameter(&mut self, constant: AutoConstant) -> &Parameter {
        let slot = match self
            .parameters
            .iter()
            .position(|p| p.auto_constant() == Some(constant))
        {
            Some(slot) => slot,
            None => self.push_parameter(Parameter::auto(constant)),
        };
        &self.parameters[slot]
    }

    fn push_parameter(&mut self, parameter: Parameter) -> usize {
        self.parameters.push(parameter);
        self.parameters.len() - 1
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn parameter_by_name(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name() == name)
    }

    /// Adds `function` and returns its index.
    pub fn add_function(&mut self, function: Function) -> usize {
        self.functions.push(function);
        self.functions.len() - 1
    }

    pub fn functions(&self) -> &[Function] {
        &self.functions
    }

    pub fn functions_mut(&mut self) -> &mut [Function] {
        &mut self.functions
    }

    pub fn function_index(&self, name: &str) -> Option<usize> {
        self.functions.iter().position(|f| f.name() == name)
    }

    pub fn set_entry_point(&mut self, index: usize) -> Result<(), ProgramError> {
        if index >= self.functions.len() {
            return Err(ProgramError::GenerationFailed(format!(
                "program '{}' has no function {index}",
                self.name
            )));
        }
        self.entry_point = Some(index);
        Ok(())
    }

    pub fn entry_point_function(&self) -> Option<&Function> {
        self.entry_point.and_then(|i| self.functions.get(i))
    }

    /// The entry point, or an error naming the program when it has none.
    pub fn entry_point_function_mut(&mut self) -> Result<&mut Function, ProgramError> {
        match self.entry_point {
            Some(i) if i < self.functions.len() => Ok(&mut self.functions[i]),
            _ => Err(ProgramError::GenerationFailed(format!(
                "program '{}' has no entry point",
                self.name
            ))),
        }
    }

    /// Records a function library the program needs. Duplicates are ignored.
    pub fn add_dependency(&mut self, library: &str) {
        if !self.dependencies.iter().any(|d| d == library) {
            self.dependencies.push(library.to_owned());
        }
    }

    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }
}

/// The vertex and fragment programs generated for one render state.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgramSet {
    vertex: Program,
    fragment: Program,
}

impl ProgramSet {
    pub fn new(vertex: Program, fragment: Program) -> Self {
        Self { vertex, fragment }
    }

    pub fn vertex(&self) -> &Program {
        &self.vertex
    }

    pub fn fragment(&self) -> &Program {
        &self.fragment
    }

    pub fn vertex_mut(&mut self) -> &mut Program {
        &mut self.vertex
    }

    pub fn fragment_mut(&mut self) -> &mut Program {
        &mut self.fragment
    }

    pub fn into_programs(self) -> (Program, Program) {
        (self.vertex, self.fragment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indexed_parameters_are_shared() {
        let mut p = Program::new(ShaderStage::Fragment, "ps");
        let a = p
            .resolve_parameter(GpuConstantType::Sampler2D, Some(1), "gTextureSampler")
            .name()
            .to_owned();
        p.resolve_parameter(GpuConstantType::Sampler2D, Some(1), "gTextureSampler");
        assert_eq!(a, "gTextureSampler1");
        assert_eq!(p.parameters().len(), 1);
    }

    #[test]
    fn test_unindexed_parameters_are_unique() {
        let mut p = Program::new(ShaderStage::Vertex, "vs");
        let a = p
            .resolve_parameter(GpuConstantType::Float4, None, "light_attenuation")
            .name()
            .to_owned();
        let b = p
            .resolve_parameter(GpuConstantType::Float4, None, "light_attenuation")
            .name()
            .to_owned();
        assert_eq!(a, "light_attenuation0");
        assert_eq!(b, "light_attenuation1");
    }

    #[test]
    fn test_auto_parameters_and_dependencies() {
        let mut p = Program::new(ShaderStage::Vertex, "vs");
        p.resolve_auto_parameter(AutoConstant::WorldViewProjMatrix);
        p.resolve_auto_parameter(AutoConstant::WorldViewProjMatrix);
        assert_eq!(p.parameters().len(), 1);
        assert!(p.parameter_by_name("worldviewproj_matrix").is_some());

        p.add_dependency("FFPLib_Common");
        p.add_dependency("FFPLib_Common");
        assert_eq!(p.dependencies(), ["FFPLib_Common".to_owned()]);
    }

    #[test]
    fn test_entry_point() {
        let mut p = Program::new(ShaderStage::Vertex, "vs");
        assert!(p.entry_point_function_mut().is_err());
        assert!(p.set_entry_point(0).is_err());

        let main = p.add_function(Function::new("main", ""));
        p.set_entry_point(main).unwrap();
        assert_eq!(p.entry_point_function().map(Function::name), Some("main"));
    }
}
