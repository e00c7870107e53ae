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

use super::parameter::{Content, Parameter, Semantic};
use kiln_core::renderer::GpuConstantType;

/// One call emitted into a function body.
///
/// Invocations are ordered by `(group_order, internal_order)`; the group is
/// usually the execution order of the fragment that emitted it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionInvocation {
    function_name: String,
    group_order: i32,
    internal_order: i32,
    operands: Vec<String>,
}

impl FunctionInvocation {
    pub fn new(function_name: impl Into<String>, group_order: i32, internal_order: i32) -> Self {
        Self {
            function_name: function_name.into(),
            group_order,
            internal_order,
            operands: Vec::new(),
        }
    }

    pub fn with_operand(mut self, operand: impl Into<String>) -> Self {
        self.operands.push(operand.into());
        self
    }

    pub fn push_operand(&mut self, operand: impl Into<String>) {
        self.operands.push(operand.into());
    }

    pub fn function_name(&self) -> &str {
        &self.function_name
    }

    pub fn group_order(&self) -> i32 {
        self.group_order
    }

    pub fn internal_order(&self) -> i32 {
        self.internal_order
    }

    pub fn operands(&self) -> &[String] {
        &self.operands
    }

    pub fn order_key(&self) -> (i32, i32) {
        (self.group_order, self.internal_order)
    }
}

/// A function of a generated program.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Function {
    name: String,
    description: String,
    inputs: Vec<Parameter>,
    outputs: Vec<Parameter>,
    locals: Vec<Parameter>,
    atoms: Vec<FunctionInvocation>,
}

fn find_slot(params: &[Parameter], semantic: Semantic, index: u32, content: Content) -> Option<usize> {
    params.iter().position(|p| {
        p.semantic() == semantic
            && p.index() == index
            && (semantic != Semantic::Unknown || p.content() == content)
    })
}

/// The index of the `semantic` parameter carrying `content`, or the first
/// unused index.
fn by_content(params: &[Parameter], semantic: Semantic, content: Content) -> u32 {
    let mut next = 0;
    for p in params.iter().filter(|p| p.semantic() == semantic) {
        if p.content() == content {
            return p.index();
        }
        next = next.max(p.index() + 1);
    }
    next
}

impl Function {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            ..Default::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the input with the given semantic and index, declaring it
    /// first if needed.
    pub fn resolve_input_parameter(
        &mut self,
        semantic: Semantic,
        index: u32,
        content: Content,
        const_type: GpuConstantType,
    ) -> &Parameter {
        let slot = match find_slot(&self.inputs, semantic, index, content) {
            Some(slot) => slot,
            None => {
                let name = format!("i{}_{}", semantic.stem(), index);
                self.inputs
                    .push(Parameter::new(name, const_type, semantic, index, content));
                self.inputs.len() - 1
            }
        };
        &self.inputs[slot]
    }

    /// Returns the output with the given semantic and index, declaring it
    /// first if needed.
    pub fn resolve_output_parameter(
        &mut self,
        semantic: Semantic,
        index: u32,
        content: Content,
        const_type: GpuConstantType,
    ) -> &Parameter {
        let slot = match find_slot(&self.outputs, semantic, index, content) {
            Some(slot) => slot,
            None => {
                let name = format!("o{}_{}", semantic.stem(), index);
                self.outputs
                    .push(Parameter::new(name, const_type, semantic, index, content));
                self.outputs.len() - 1
            }
        };
        &self.outputs[slot]
    }

    /// Returns the input carrying `content`, declaring it at the next free
    /// index of `semantic` if needed.
    pub fn resolve_input_by_content(
        &mut self,
        semantic: Semantic,
        content: Content,
        const_type: GpuConstantType,
    ) -> &Parameter {
        let index = by_content(&self.inputs, semantic, content);
        self.resolve_input_parameter(semantic, index, content, const_type)
    }

    /// Returns the output carrying `content`, declaring it at the next free
    /// index of `semantic` if needed.
    pub fn resolve_output_by_content(
        &mut self,
        semantic: Semantic,
        content: Content,
        const_type: GpuConstantType,
    ) -> &Parameter {
        let index = by_content(&self.outputs, semantic, content);
        self.resolve_output_parameter(semantic, index, content, const_type)
    }

    /// Returns the local variable `name`, declaring it first if needed.
    pub fn resolve_local_parameter(&mut self, name: &str, const_type: GpuConstantType) -> &Parameter {
        let slot = match self.locals.iter().position(|p| p.name() == name) {
            Some(slot) => slot,
            None => {
                self.locals.push(Parameter::new(
                    name,
                    const_type,
                    Semantic::Unknown,
                    0,
                    Content::Unknown,
                ));
                self.locals.len() - 1
            }
        };
        &self.locals[slot]
    }

    pub fn inputs(&self) -> &[Parameter] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[Parameter] {
        &self.outputs
    }

    pub fn locals(&self) -> &[Parameter] {
        &self.locals
    }

    pub fn add_atom_instance(&mut self, invocation: FunctionInvocation) {
        self.atoms.push(invocation);
    }

    pub fn atom_instances(&self) -> &[FunctionInvocation] {
        &self.atoms
    }

    /// Orders the invocations by `(group_order, internal_order)`, keeping
    /// insertion order between equal keys.
    pub fn sort_atom_instances(&mut self) {
        self.atoms.sort_by_key(FunctionInvocation::order_key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_input_is_idempotent() {
        let mut f = Function::new("main", "");
        let name = f
            .resolve_input_parameter(
                Semantic::Normal,
                0,
                Content::NormalObjectSpace,
                GpuConstantType::Float3,
            )
            .name()
            .to_owned();
        assert_eq!(name, "iNormal_0");

        f.resolve_input_parameter(
            Semantic::Normal,
            0,
            Content::NormalObjectSpace,
            GpuConstantType::Float3,
        );
        f.resolve_input_parameter(
            Semantic::Normal,
            1,
            Content::NormalObjectSpace,
            GpuConstantType::Float3,
        );
        assert_eq!(f.inputs().len(), 2);
    }

    #[test]
    fn test_outputs_and_locals() {
        let mut f = Function::new("main", "");
        let out = f
            .resolve_output_parameter(
                Semantic::Color,
                1,
                Content::ColorSpecular,
                GpuConstantType::Float4,
            )
            .name()
            .to_owned();
        assert_eq!(out, "oColor_1");

        f.resolve_local_parameter("texel", GpuConstantType::Float4);
        f.resolve_local_parameter("texel", GpuConstantType::Float4);
        assert_eq!(f.locals().len(), 1);
    }

    #[test]
    fn test_resolve_by_content_takes_next_free_index() {
        let mut f = Function::new("main", "");
        let normal = f
            .resolve_output_by_content(
                Semantic::TextureCoordinates,
                Content::NormalViewSpace,
                GpuConstantType::Float3,
            )
            .index();
        let uv = f
            .resolve_output_by_content(
                Semantic::TextureCoordinates,
                Content::TextureCoordinate(0),
                GpuConstantType::Float2,
            )
            .index();
        let again = f
            .resolve_output_by_content(
                Semantic::TextureCoordinates,
                Content::NormalViewSpace,
                GpuConstantType::Float3,
            )
            .index();
        assert_eq!((normal, uv, again), (0, 1, 0));
        assert_eq!(f.outputs()[1].name(), "oTexCoord_1");
    }

    #[test]
    fn test_sort_atoms_is_stable() {
        let mut f = Function::new("main", "");
        f.add_atom_instance(FunctionInvocation::new("c", 300, 0));
        f.add_atom_instance(FunctionInvocation::new("a", 100, 1));
        f.add_atom_instance(FunctionInvocation::new("b", 100, 0));
        f.add_atom_instance(FunctionInvocation::new("b2", 100, 0));
        f.sort_atom_instances();

        let names: Vec<_> = f.atom_instances().iter().map(|a| a.function_name()).collect();
        assert_eq!(names, vec!["b", "b2", "a", "c"]);
    }
}
