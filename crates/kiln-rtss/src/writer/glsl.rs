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

use super::ProgramWriter;
use crate::program::{Content, Parameter, Program, Semantic};
use crate::RenderStateError;
use ahash::AHashMap;
use kiln_core::renderer::{GpuConstantType, ProgramError, ShaderSettings, ShaderStage};
use std::fmt::Write;

const SECTION_RULE: &str =
    "//-----------------------------------------------------------------------------";

const ES_PRECISION: &[&str] = &[
    "precision highp float;",
    "precision highp int;",
    "precision lowp sampler2D;",
    "precision lowp samplerCube;",
];

/// The GLSL spelling of a constant type.
pub fn glsl_type_name(const_type: GpuConstantType) -> Option<&'static str> {
    use GpuConstantType::*;
    let name = match const_type {
        Float1 => "float",
        Float2 => "vec2",
        Float3 => "vec3",
        Float4 => "vec4",
        Matrix2x2 => "mat2",
        Matrix2x3 => "mat2x3",
        Matrix2x4 => "mat2x4",
        Matrix3x2 => "mat3x2",
        Matrix3x3 => "mat3",
        Matrix3x4 => "mat3x4",
        Matrix4x2 => "mat4x2",
        Matrix4x3 => "mat4x3",
        Matrix4x4 => "mat4",
        Int1 => "int",
        Int2 => "ivec2",
        Int3 => "ivec3",
        Int4 => "ivec4",
        Double1 => "double",
        Double2 => "dvec2",
        Double3 => "dvec3",
        Double4 => "dvec4",
        MatrixDouble2x2 => "dmat2",
        MatrixDouble2x3 => "dmat2x3",
        MatrixDouble2x4 => "dmat2x4",
        MatrixDouble3x2 => "dmat3x2",
        MatrixDouble3x3 => "dmat3",
        MatrixDouble3x4 => "dmat3x4",
        MatrixDouble4x2 => "dmat4x2",
        MatrixDouble4x3 => "dmat4x3",
        MatrixDouble4x4 => "dmat4",
        Uint1 => "uint",
        Uint2 => "uvec2",
        Uint3 => "uvec3",
        Uint4 => "uvec4",
        Bool1 => "bool",
        Bool2 => "bvec2",
        Bool3 => "bvec3",
        Bool4 => "bvec4",
        Sampler1D => "sampler1D",
        Sampler2D => "sampler2D",
        Sampler3D => "sampler3D",
        SamplerCube => "samplerCube",
        Sampler1DShadow => "sampler1DShadow",
        Sampler2DShadow => "sampler2DShadow",
        Sampler2DArray => "sampler2DArray",
        SamplerExternalOes => "samplerExternalOES",
        Sampler2DArrayShadow => "sampler2DArrayShadow",
        SamplerCubeShadow => "samplerCubeShadow",
        Specialization | Unknown => return None,
    };
    Some(name)
}

fn type_name(parameter: &Parameter) -> Result<&'static str, RenderStateError> {
    glsl_type_name(parameter.const_type()).ok_or_else(|| {
        ProgramError::GenerationFailed(format!(
            "parameter '{}' has no GLSL type",
            parameter.name()
        ))
        .into()
    })
}

/// Replaces every identifier of `operand` found in `renames`.
///
/// Swizzles and other member accesses after a `.` are left alone.
fn rename_operand(operand: &str, renames: &AHashMap<String, String>) -> String {
    if renames.is_empty() {
        return operand.to_owned();
    }
    let mut out = String::with_capacity(operand.len());
    let mut ident = String::new();
    let mut after_dot = false;
    let flush = |ident: &mut String, out: &mut String, after_dot: bool| {
        if ident.is_empty() {
            return;
        }
        match renames.get(ident.as_str()) {
            Some(renamed) if !after_dot => out.push_str(renamed),
            _ => out.push_str(ident),
        }
        ident.clear();
    };
    for c in operand.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            ident.push(c);
            continue;
        }
        flush(&mut ident, &mut out, after_dot);
        after_dot = c == '.';
        out.push(c);
    }
    flush(&mut ident, &mut out, after_dot);
    out
}

/// Writes vertex and fragment programs as GLSL or GLSL ES.
///
/// Library dependencies are embedded from sources registered with
/// [`with_library`](Self::with_library); an unregistered library is left
/// as a comment for the caller to resolve.
#[derive(Debug, Clone)]
pub struct GlslProgramWriter {
    version: u32,
    es: bool,
    libraries: AHashMap<String, String>,
}

impl GlslProgramWriter {
    /// A desktop GLSL writer targeting `settings.glsl_version`.
    pub fn new(settings: &ShaderSettings) -> Self {
        Self {
            version: settings.glsl_version,
            es: false,
            libraries: AHashMap::new(),
        }
    }

    /// A GLSL ES writer targeting `settings.glsl_es_version`.
    pub fn new_es(settings: &ShaderSettings) -> Self {
        Self {
            version: settings.glsl_es_version,
            es: true,
            libraries: AHashMap::new(),
        }
    }

    pub fn with_library(mut self, name: impl Into<String>, source: impl Into<String>) -> Self {
        self.libraries.insert(name.into(), source.into());
        self
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn is_es(&self) -> bool {
        self.es
    }

    /// Whether the target still uses `attribute`/`varying` and
    /// `gl_FragColor`.
    pub fn is_legacy(&self) -> bool {
        if self.es {
            self.version < 300
        } else {
            self.version < 130
        }
    }

    fn write_header(&self, out: &mut String) {
        if self.es && self.version >= 300 {
            let _ = writeln!(out, "#version {} es", self.version);
        } else {
            let _ = writeln!(out, "#version {}", self.version);
        }
        if self.es {
            for line in ES_PRECISION {
                let _ = writeln!(out, "{line}");
            }
        }
        out.push('\n');
    }

    fn write_section(out: &mut String, title: &str) {
        let _ = writeln!(out, "{SECTION_RULE}\n//\t\t\t\t{title}\n{SECTION_RULE}");
    }

    fn write_dependencies(&self, program: &Program, out: &mut String) {
        Self::write_section(out, "PROGRAM DEPENDENCIES");
        for dependency in program.dependencies() {
            match self.libraries.get(dependency) {
                Some(source) => {
                    out.push_str(source);
                    if !source.ends_with('\n') {
                        out.push('\n');
                    }
                }
                None => {
                    log::warn!(
                        "GlslProgramWriter({}): no source registered for library '{dependency}'",
                        program.name()
                    );
                    let _ = writeln!(out, "// {dependency}");
                }
            }
        }
        out.push('\n');
    }

    fn write_uniforms(&self, program: &Program, out: &mut String) -> Result<(), RenderStateError> {
        Self::write_section(out, "GLOBAL PARAMETERS");
        for parameter in program.parameters() {
            let ty = type_name(parameter)?;
            if parameter.is_array() {
                let _ = writeln!(
                    out,
                    "uniform\t{ty}\t{}[{}];",
                    parameter.name(),
                    parameter.array_size()
                );
            } else {
                let _ = writeln!(out, "uniform\t{ty}\t{};", parameter.name());
            }
        }
        out.push('\n');
        Ok(())
    }

    /// Declares the stage interface and returns the operand renames it
    /// implies.
    fn write_interface(
        &self,
        program: &Program,
        out: &mut String,
    ) -> Result<AHashMap<String, String>, RenderStateError> {
        let mut renames = AHashMap::new();
        let Some(main) = program.entry_point_function() else {
            return Ok(renames);
        };
        let legacy = self.is_legacy();
        let (input_qualifier, output_qualifier) = match program.stage() {
            ShaderStage::Vertex if legacy => ("attribute", "varying"),
            ShaderStage::Fragment if legacy => ("varying", ""),
            _ => ("in", "out"),
        };

        for input in main.inputs() {
            let ty = type_name(input)?;
            let name = match program.stage() {
                // Fragment inputs are the vertex outputs of the same slot.
                ShaderStage::Fragment => {
                    let renamed = match input.name().strip_prefix('i') {
                        Some(rest) => format!("o{rest}"),
                        None => input.name().to_owned(),
                    };
                    renames.insert(input.name().to_owned(), renamed.clone());
                    renamed
                }
                _ => input.name().to_owned(),
            };
            let _ = writeln!(out, "{input_qualifier}\t{ty}\t{name};");
        }

        for output in main.outputs() {
            let ty = type_name(output)?;
            match program.stage() {
                ShaderStage::Vertex if output.content() == Content::PositionProjectiveSpace => {
                    renames.insert(output.name().to_owned(), "gl_Position".to_owned());
                }
                ShaderStage::Fragment
                    if output.semantic() == Semantic::Color && output.index() == 0 =>
                {
                    if legacy {
                        renames.insert(output.name().to_owned(), "gl_FragColor".to_owned());
                    } else {
                        renames.insert(output.name().to_owned(), "fragColour".to_owned());
                        let _ = writeln!(out, "out\t{ty}\tfragColour;");
                    }
                }
                ShaderStage::Fragment => {
                    let renamed = format!("frag_{}", output.name());
                    let _ = writeln!(out, "out\t{ty}\t{renamed};");
                    renames.insert(output.name().to_owned(), renamed);
                }
                _ => {
                    let _ = writeln!(out, "{output_qualifier}\t{ty}\t{};", output.name());
                }
            }
        }
        out.push('\n');
        Ok(renames)
    }

    fn write_main(
        &self,
        program: &Program,
        renames: &AHashMap<String, String>,
        out: &mut String,
    ) -> Result<(), RenderStateError> {
        Self::write_section(out, "MAIN");
        let Some(main) = program.entry_point_function() else {
            return Err(ProgramError::GenerationFailed(format!(
                "program '{}' has no entry point",
                program.name()
            ))
            .into());
        };
        let _ = writeln!(out, "void main(void)\n{{");
        for local in main.locals() {
            let _ = writeln!(out, "\t{}\t{};", type_name(local)?, local.name());
        }
        if !main.locals().is_empty() {
            out.push('\n');
        }
        for atom in main.atom_instances() {
            let operands: Vec<_> = atom
                .operands()
                .iter()
                .map(|o| rename_operand(o, renames))
                .collect();
            let _ = writeln!(out, "\t{}({});", atom.function_name(), operands.join(", "));
        }
        out.push_str("}\n");
        Ok(())
    }
}

impl ProgramWriter for GlslProgramWriter {
    fn target_language(&self) -> &'static str {
        if self.es {
            "glsles"
        } else {
            "glsl"
        }
    }

    fn write_source(&self, program: &Program) -> Result<String, RenderStateError> {
        match program.stage() {
            ShaderStage::Vertex | ShaderStage::Fragment => {}
            stage => {
                return Err(ProgramError::GenerationFailed(format!(
                    "cannot write a {stage} program"
                ))
                .into())
            }
        }

        let mut out = String::new();
        self.write_header(&mut out);
        self.write_dependencies(program, &mut out);
        self.write_uniforms(program, &mut out)?;
        let renames = self.write_interface(program, &mut out)?;
        self.write_main(program, &renames, &mut out)?;
        log::trace!(
            "GlslProgramWriter({}): wrote {} bytes",
            program.name(),
            out.len()
        );
        Ok(out)
    }
}
