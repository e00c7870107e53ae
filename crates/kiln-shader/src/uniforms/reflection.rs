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

//! Binding of reflected program uniforms to per-stage constant definitions.

use super::types::gl_enum_type;
use super::ExtractionError;
use ahash::AHashMap;
use kiln_core::renderer::{
    GpuConstantDefinition, GpuConstantType, GpuNamedConstants, ProgramId, ProgramReflection,
    ShaderSettings, ShaderStage,
};

/// A uniform of a linked program resolved to the stage that declares it.
#[derive(Debug, Clone, PartialEq)]
pub struct GLUniformReference {
    pub source_stage: ShaderStage,
    pub name: String,
    pub location: i32,
    pub definition: GpuConstantDefinition,
}

/// A uniform block of a linked program and the buffer binding it uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GLUniformBuffer {
    pub name: String,
    pub index: u32,
    pub size: usize,
    pub binding: u32,
}

/// Binding points of named shared parameter sets.
///
/// A uniform block whose name is registered here is bound to the set's
/// binding point in every program that declares it.
#[derive(Debug, Clone, Default)]
pub struct SharedParameterBindings {
    bindings: AHashMap<String, u32>,
}

impl SharedParameterBindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `name`, returning its binding point.
    ///
    /// New names get the next free binding; registering a known name
    /// returns the binding it already has.
    pub fn register(&mut self, name: &str) -> u32 {
        let next = self.bindings.len() as u32;
        *self.bindings.entry(name.to_owned()).or_insert(next)
    }

    pub fn get(&self, name: &str) -> Option<u32> {
        self.bindings.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// The constant definitions of each stage of a program, searched in
/// [`ShaderStage::ALL`] order.
#[derive(Debug, Clone, Copy, Default)]
pub struct StageConstants<'a> {
    stages: [Option<&'a GpuNamedConstants>; 6],
}

impl<'a> StageConstants<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(stage: ShaderStage) -> usize {
        ShaderStage::ALL
            .iter()
            .position(|&s| s == stage)
            .unwrap_or_default()
    }

    /// Attaches the definitions of `stage`, replacing any previous ones.
    pub fn set(&mut self, stage: ShaderStage, defs: &'a GpuNamedConstants) -> &mut Self {
        self.stages[Self::slot(stage)] = Some(defs);
        self
    }

    pub fn get(&self, stage: ShaderStage) -> Option<&'a GpuNamedConstants> {
        self.stages[Self::slot(stage)]
    }

    /// Finds the first stage declaring `name`.
    pub fn find(&self, name: &str) -> Option<(ShaderStage, &'a GpuConstantDefinition)> {
        ShaderStage::ALL
            .iter()
            .zip(self.stages.iter())
            .find_map(|(&stage, defs)| defs.and_then(|d| d.get(name)).map(|def| (stage, def)))
    }
}

/// Everything extracted from a linked program.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedUniforms {
    pub uniforms: Vec<GLUniformReference>,
    pub buffers: Vec<GLUniformBuffer>,
}

/// Reduces a reported uniform name to its root.
///
/// `name[0]` becomes `name`; any other element entry, including nested
/// indices such as `name[0][1]`, yields `None`.
fn root_uniform_name(reported: &str) -> Option<&str> {
    match reported.find('[') {
        Some(open) if &reported[open..] == "[0]" => Some(&reported[..open]),
        Some(_) => None,
        None => Some(reported),
    }
}

/// Walks the active uniforms and uniform blocks of `program`.
///
/// Only uniforms with a location are kept, and only when one of the stages
/// declares them. Blocks named in `shared` are rebound to the shared binding
/// point; other blocks keep the binding the driver reports.
pub fn extract_uniforms(
    reflection: &dyn ProgramReflection,
    program: ProgramId,
    stages: &StageConstants<'_>,
    shared: &SharedParameterBindings,
) -> Result<ExtractedUniforms, ExtractionError> {
    let mut extracted = ExtractedUniforms::default();

    for index in 0..reflection.active_uniform_count(program) {
        let Some(active) = reflection.active_uniform(program, index) else {
            continue;
        };
        if active.location < 0 {
            continue;
        }
        let Some(name) = root_uniform_name(&active.name) else {
            continue;
        };

        match stages.find(name) {
            Some((stage, def)) => {
                if def.array_size != active.array_size {
                    log::warn!(
                        "UniformBinder({}): driver reports {} elements for '{}', {} stage declares {}",
                        program.0,
                        active.array_size,
                        name,
                        stage,
                        def.array_size
                    );
                }
                extracted.uniforms.push(GLUniformReference {
                    source_stage: stage,
                    name: name.to_owned(),
                    location: active.location,
                    definition: *def,
                });
            }
            None => {
                log::trace!(
                    "UniformBinder({}): no stage declares '{}'",
                    program.0,
                    name
                );
            }
        }
    }

    for index in 0..reflection.active_uniform_block_count(program) {
        let Some(block) = reflection.active_uniform_block(program, index) else {
            continue;
        };
        let binding = match shared.get(&block.name) {
            Some(binding) => {
                reflection.set_uniform_block_binding(program, block.index, binding)?;
                binding
            }
            None => block.binding,
        };
        log::debug!(
            "UniformBinder({}): block '{}' ({} bytes) bound to {}",
            program.0,
            block.name,
            block.data_size,
            binding
        );
        extracted.buffers.push(GLUniformBuffer {
            name: block.name,
            index: block.index,
            size: block.data_size,
            binding,
        });
    }

    Ok(extracted)
}

/// Builds constant definitions straight from the driver's reflection.
///
/// Used when no source scan is available. Locations are stored as logical
/// indices and sizes are tight.
pub fn constants_from_reflection(
    reflection: &dyn ProgramReflection,
    program: ProgramId,
    settings: &ShaderSettings,
) -> GpuNamedConstants {
    let mut defs = GpuNamedConstants::new();
    for index in 0..reflection.active_uniform_count(program) {
        let Some(active) = reflection.active_uniform(program, index) else {
            continue;
        };
        if active.location < 0 {
            continue;
        }
        let Some(name) = root_uniform_name(&active.name) else {
            continue;
        };
        let const_type = gl_enum_type(active.gl_type);
        if const_type == GpuConstantType::Unknown {
            log::warn!(
                "UniformBinder({}): unsupported type {:#06x} for '{}'",
                program.0,
                active.gl_type,
                name
            );
            continue;
        }

        let mut def = GpuConstantDefinition::new(const_type, active.array_size.max(1), false);
        def.logical_index = active.location as usize;
        defs.allocate(&mut def);
        defs.insert(name, def);
        if def.array_size > 1 {
            defs.generate_array_entries(
                name,
                &def,
                settings.array_entry_limit,
                settings.generate_all_array_entries,
            );
        }
    }
    defs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uniforms::types::gl;
    use kiln_core::renderer::{ActiveUniform, ActiveUniformBlock, ResourceError};
    use std::cell::RefCell;

    #[derive(Default)]
    struct MockReflection {
        uniforms: Vec<ActiveUniform>,
        blocks: Vec<ActiveUniformBlock>,
        bound: RefCell<Vec<(u32, u32)>>,
    }

    impl MockReflection {
        fn uniform(mut self, name: &str, gl_type: u32, array_size: usize, location: i32) -> Self {
            self.uniforms.push(ActiveUniform {
                name: name.to_owned(),
                gl_type,
                array_size,
                location,
            });
            self
        }

        fn block(mut self, index: u32, name: &str, binding: u32) -> Self {
            self.blocks.push(ActiveUniformBlock {
                index,
                name: name.to_owned(),
                data_size: 64,
                binding,
            });
            self
        }
    }

    impl ProgramReflection for MockReflection {
        fn active_uniform_count(&self, _: ProgramId) -> usize {
            self.uniforms.len()
        }

        fn active_uniform(&self, _: ProgramId, index: usize) -> Option<ActiveUniform> {
            self.uniforms.get(index).cloned()
        }

        fn active_uniform_block_count(&self, _: ProgramId) -> usize {
            self.blocks.len()
        }

        fn active_uniform_block(&self, _: ProgramId, index: usize) -> Option<ActiveUniformBlock> {
            self.blocks.get(index).cloned()
        }

        fn set_uniform_block_binding(
            &self,
            _: ProgramId,
            block_index: u32,
            binding: u32,
        ) -> Result<(), ResourceError> {
            self.bound.borrow_mut().push((block_index, binding));
            Ok(())
        }
    }

    fn stage_defs(names: &[(&str, GpuConstantType, usize)]) -> GpuNamedConstants {
        let mut defs = GpuNamedConstants::new();
        for &(name, ty, len) in names {
            let mut def = GpuConstantDefinition::new(ty, len, false);
            defs.allocate(&mut def);
            defs.insert(name, def);
        }
        defs
    }

    #[test]
    fn test_array_elements_collapse_to_root() {
        let reflection = MockReflection::default()
            .uniform("arr[0]", gl::FLOAT_VEC4, 3, 0)
            .uniform("arr[1]", gl::FLOAT_VEC4, 1, 1)
            .uniform("arr[2]", gl::FLOAT_VEC4, 1, 2);
        let vertex = stage_defs(&[("arr", GpuConstantType::Float4, 3)]);
        let mut stages = StageConstants::new();
        stages.set(ShaderStage::Vertex, &vertex);

        let extracted = extract_uniforms(
            &reflection,
            ProgramId(1),
            &stages,
            &SharedParameterBindings::new(),
        )
        .unwrap();

        assert_eq!(extracted.uniforms.len(), 1);
        let reference = &extracted.uniforms[0];
        assert_eq!(reference.name, "arr");
        assert_eq!(reference.definition.array_size, 3);
        assert_eq!(reference.location, 0);
    }

    #[test]
    fn test_first_declaring_stage_wins() {
        let reflection = MockReflection::default()
            .uniform("shared", gl::FLOAT, 1, 4)
            .uniform("frag_only", gl::FLOAT, 1, 5)
            .uniform("gl_builtin", gl::FLOAT, 1, -1)
            .uniform("unknown", gl::FLOAT, 1, 6);
        let vertex = stage_defs(&[("shared", GpuConstantType::Float1, 1)]);
        let fragment = stage_defs(&[
            ("shared", GpuConstantType::Float1, 1),
            ("frag_only", GpuConstantType::Float1, 1),
        ]);
        let mut stages = StageConstants::new();
        stages
            .set(ShaderStage::Fragment, &fragment)
            .set(ShaderStage::Vertex, &vertex);

        let extracted = extract_uniforms(
            &reflection,
            ProgramId(0),
            &stages,
            &SharedParameterBindings::new(),
        )
        .unwrap();

        let found: Vec<_> = extracted
            .uniforms
            .iter()
            .map(|u| (u.name.as_str(), u.source_stage))
            .collect();
        assert_eq!(
            found,
            vec![
                ("shared", ShaderStage::Vertex),
                ("frag_only", ShaderStage::Fragment)
            ]
        );
    }

    #[test]
    fn test_nested_array_entries_are_skipped() {
        assert_eq!(root_uniform_name("m[0]"), Some("m"));
        assert_eq!(root_uniform_name("m[0][1]"), None);
        assert_eq!(root_uniform_name("m[1]"), None);
        assert_eq!(root_uniform_name("plain"), Some("plain"));
    }

    #[test]
    fn test_shared_blocks_are_rebound() {
        let reflection = MockReflection::default()
            .block(0, "Lights", 7)
            .block(1, "Private", 3);
        let mut shared = SharedParameterBindings::new();
        shared.register("Camera");
        shared.register("Lights");
        assert_eq!(shared.register("Lights"), 1);

        let extracted = extract_uniforms(
            &reflection,
            ProgramId(2),
            &StageConstants::new(),
            &shared,
        )
        .unwrap();

        assert_eq!(extracted.buffers[0].binding, 1);
        assert_eq!(extracted.buffers[1].binding, 3);
        assert_eq!(*reflection.bound.borrow(), vec![(0, 1)]);
    }

    #[test]
    fn test_constants_from_reflection() {
        let reflection = MockReflection::default()
            .uniform("tint", gl::FLOAT_VEC4, 1, 2)
            .uniform("bones[0]", gl::FLOAT_MAT4, 4, 3)
            .uniform("bones[1]", gl::FLOAT_MAT4, 1, 7)
            .uniform("tex", gl::SAMPLER_2D, 1, 0)
            .uniform("in_block", gl::FLOAT, 1, -1);

        let defs = constants_from_reflection(&reflection, ProgramId(0), &ShaderSettings::default());

        assert!(!defs.contains("in_block"));
        let bones = defs.get("bones").unwrap();
        assert_eq!(bones.array_size, 4);
        assert_eq!(bones.logical_index, 3);
        assert_eq!(bones.physical_index, 4 * 4);
        assert!(defs.contains("bones[3]"));
        assert_eq!(defs.float_buffer_size, 4 + 64);
        assert_eq!(defs.register_count, 1);
    }
}
