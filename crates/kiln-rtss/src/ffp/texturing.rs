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

//! One fixed-function texture unit: coordinate generation in the vertex
//! program, sampling and layer blending in the fragment program.

use super::{
    resolved, FFP_FUNC_ADD, FFP_FUNC_ADDSIGNED, FFP_FUNC_ADDSMOOTH, FFP_FUNC_ASSIGN,
    FFP_FUNC_CONSTRUCT, FFP_FUNC_DOTPRODUCT, FFP_FUNC_LERP, FFP_FUNC_MODULATE,
    FFP_FUNC_MODULATEX2, FFP_FUNC_MODULATEX4, FFP_FUNC_SUBTRACT, FFP_LIB_COMMON,
    FFP_LIB_TEXTURING, FFP_PS_TEXTURING, FFP_TEXTURING, FFP_VS_TEXTURING,
};
use crate::pass::{
    LayerBlend, LayerBlendOperation, LayerBlendSource, TexCoordCalc, TextureType,
    TextureUnitDescription,
};
use crate::program::{AutoConstant, Content, Function, FunctionInvocation, ProgramSet, Semantic};
use crate::sub_render_state::{
    base_hash_code, copy_same_type, BuiltinFactory, FactoryRegistration, SubRenderState,
    SubRenderStateType,
};
use crate::RenderStateError;
use kiln_core::renderer::GpuConstantType;
use kiln_core::utils::hash::{hash_combine, hash_combine_bool};
use std::any::Any;

// Invocations of one unit stay together inside the shared texturing group.
const UNIT_STRIDE: i32 = 100;

/// A GLSL float literal; `1` would be read as an int.
fn float_literal(value: f32) -> String {
    if value.fract() == 0.0 && value.is_finite() {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

fn hash_blend(hash: &mut u32, blend: &LayerBlend) {
    hash_combine(hash, blend.operation as u32);
    hash_combine(hash, blend.source1 as u32);
    hash_combine(hash, blend.source2 as u32);
    if blend.source1 == LayerBlendSource::Manual || blend.source2 == LayerBlendSource::Manual {
        for c in blend.colour_arg1.iter().chain(&blend.colour_arg2) {
            hash_combine(hash, c.to_bits());
        }
        hash_combine(hash, blend.alpha_arg1.to_bits());
        hash_combine(hash, blend.alpha_arg2.to_bits());
    }
    if blend.operation == LayerBlendOperation::BlendManual {
        hash_combine(hash, blend.factor.to_bits());
    }
}

/// Emulates a single texture unit of a pass.
#[derive(Debug, Clone, Default)]
pub struct FfpTextureStage {
    index: u32,
    unit: TextureUnitDescription,

    texture_matrix: Option<String>,
    texture_view_proj: Option<String>,
    world_view: Option<String>,
    world_view_it: Option<String>,
    vs_in_position: Option<String>,
    vs_in_normal: Option<String>,
    vs_in_tex_coord: Option<String>,
    vs_out_tex_coord: Option<String>,

    sampler: Option<String>,
    ps_in_tex_coord: Option<String>,
    ps_in_diffuse: Option<String>,
    ps_in_specular: Option<String>,
    ps_out_diffuse: Option<String>,
    texel: Option<String>,
    source1: Option<String>,
    source2: Option<String>,
}

impl FfpTextureStage {
    /// Binds this stage to sampler `index` with the unit's settings.
    pub fn set_texture_unit(&mut self, index: u32, unit: TextureUnitDescription) {
        self.index = index;
        self.unit = unit;
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn texture_unit(&self) -> &TextureUnitDescription {
        &self.unit
    }

    fn sampler_type(&self) -> GpuConstantType {
        match self.unit.texture_type {
            TextureType::Texture1D => GpuConstantType::Sampler1D,
            TextureType::Texture2D => GpuConstantType::Sampler2D,
            TextureType::Texture3D => GpuConstantType::Sampler3D,
            TextureType::CubeMap => GpuConstantType::SamplerCube,
        }
    }

    fn tex_coord_type(&self) -> GpuConstantType {
        match self.unit.tex_coord_calc {
            TexCoordCalc::EnvironmentMapSphere => GpuConstantType::Float2,
            TexCoordCalc::EnvironmentMapReflection | TexCoordCalc::EnvironmentMapNormal => {
                GpuConstantType::Float3
            }
            TexCoordCalc::Projective => GpuConstantType::Float4,
            TexCoordCalc::None => match self.unit.texture_type {
                TextureType::Texture1D => GpuConstantType::Float1,
                TextureType::Texture2D => GpuConstantType::Float2,
                TextureType::Texture3D | TextureType::CubeMap => GpuConstantType::Float3,
            },
        }
    }

    fn uses_source(&self, source: LayerBlendSource) -> bool {
        [self.unit.colour_blend, self.unit.alpha_blend]
            .iter()
            .any(|b| b.source1 == source || b.source2 == source)
    }

    fn tex_coord_content(&self) -> Content {
        Content::TextureCoordinate(self.index.min(u32::from(u8::MAX)) as u8)
    }

    fn resolve_vertex(&mut self, programs: &mut ProgramSet) -> Result<(), RenderStateError> {
        let vs = programs.vertex_mut();
        let calc = self.unit.tex_coord_calc;
        match calc {
            TexCoordCalc::None if self.unit.has_transform => {
                self.texture_matrix = Some(
                    vs.resolve_auto_parameter(AutoConstant::TextureMatrix(self.index))
                        .name()
                        .to_owned(),
                );
            }
            TexCoordCalc::None => {}
            TexCoordCalc::EnvironmentMapSphere | TexCoordCalc::EnvironmentMapReflection => {
                self.world_view = Some(
                    vs.resolve_auto_parameter(AutoConstant::WorldViewMatrix)
                        .name()
                        .to_owned(),
                );
                self.world_view_it = Some(
                    vs.resolve_auto_parameter(AutoConstant::InverseTransposeWorldViewMatrix)
                        .name()
                        .to_owned(),
                );
            }
            TexCoordCalc::EnvironmentMapNormal => {
                self.world_view_it = Some(
                    vs.resolve_auto_parameter(AutoConstant::InverseTransposeWorldViewMatrix)
                        .name()
                        .to_owned(),
                );
            }
            TexCoordCalc::Projective => {
                self.world_view = Some(
                    vs.resolve_auto_parameter(AutoConstant::WorldViewMatrix)
                        .name()
                        .to_owned(),
                );
                self.texture_view_proj = Some(
                    vs.resolve_parameter(
                        GpuConstantType::Matrix4x4,
                        Some(self.index),
                        "texture_viewproj_matrix",
                    )
                    .name()
                    .to_owned(),
                );
            }
        }

        let tex_coord_type = self.tex_coord_type();
        let content = self.tex_coord_content();
        let main = vs.entry_point_function_mut()?;
        match calc {
            TexCoordCalc::None => {
                let set = self.unit.coord_set;
                let input_type = match self.unit.texture_type {
                    TextureType::Texture1D => GpuConstantType::Float1,
                    TextureType::Texture2D => GpuConstantType::Float2,
                    _ => GpuConstantType::Float3,
                };
                self.vs_in_tex_coord = Some(
                    main.resolve_input_parameter(
                        Semantic::TextureCoordinates,
                        set,
                        Content::TextureCoordinate(set.min(u32::from(u8::MAX)) as u8),
                        input_type,
                    )
                    .name()
                    .to_owned(),
                );
            }
            TexCoordCalc::EnvironmentMapNormal | TexCoordCalc::EnvironmentMapSphere => {
                self.vs_in_normal = Some(resolve_normal(main));
            }
            TexCoordCalc::EnvironmentMapReflection => {
                self.vs_in_normal = Some(resolve_normal(main));
                self.vs_in_position = Some(resolve_position(main));
            }
            TexCoordCalc::Projective => {
                self.vs_in_position = Some(resolve_position(main));
            }
        }
        self.vs_out_tex_coord = Some(
            main.resolve_output_by_content(Semantic::TextureCoordinates, content, tex_coord_type)
                .name()
                .to_owned(),
        );
        Ok(())
    }

    fn resolve_fragment(&mut self, programs: &mut ProgramSet) -> Result<(), RenderStateError> {
        let uses_specular = self.uses_source(LayerBlendSource::Specular);
        if uses_specular {
            programs
                .vertex_mut()
                .entry_point_function_mut()?
                .resolve_output_parameter(
                    Semantic::Color,
                    1,
                    Content::ColorSpecular,
                    GpuConstantType::Float4,
                );
        }

        let ps = programs.fragment_mut();
        self.sampler = Some(
            ps.resolve_parameter(self.sampler_type(), Some(self.index), "gTextureSampler")
                .name()
                .to_owned(),
        );

        let tex_coord_type = self.tex_coord_type();
        let content = self.tex_coord_content();
        let main = ps.entry_point_function_mut()?;
        self.ps_in_tex_coord = Some(
            main.resolve_input_by_content(Semantic::TextureCoordinates, content, tex_coord_type)
                .name()
                .to_owned(),
        );
        self.ps_in_diffuse = Some(
            main.resolve_input_parameter(
                Semantic::Color,
                0,
                Content::ColorDiffuse,
                GpuConstantType::Float4,
            )
            .name()
            .to_owned(),
        );
        if uses_specular {
            self.ps_in_specular = Some(
                main.resolve_input_parameter(
                    Semantic::Color,
                    1,
                    Content::ColorSpecular,
                    GpuConstantType::Float4,
                )
                .name()
                .to_owned(),
            );
        }
        self.ps_out_diffuse = Some(
            main.resolve_output_parameter(
                Semantic::Color,
                0,
                Content::ColorDiffuse,
                GpuConstantType::Float4,
            )
            .name()
            .to_owned(),
        );

        let texel = format!("texel_{}", self.index);
        self.texel = Some(
            main.resolve_local_parameter(&texel, GpuConstantType::Float4)
                .name()
                .to_owned(),
        );
        self.source1 = Some(
            main.resolve_local_parameter("source1", GpuConstantType::Float4)
                .name()
                .to_owned(),
        );
        self.source2 = Some(
            main.resolve_local_parameter("source2", GpuConstantType::Float4)
                .name()
                .to_owned(),
        );
        Ok(())
    }

    fn add_vertex_invocations(&self, main: &mut Function) -> Result<(), RenderStateError> {
        let t = Self::TYPE_NAME;
        let out = resolved(t, &self.vs_out_tex_coord, "texture coordinate output")?;
        let order = self.index as i32 * UNIT_STRIDE;
        let call = match self.unit.tex_coord_calc {
            TexCoordCalc::None if self.unit.has_transform => {
                FunctionInvocation::new("FFP_TransformTexCoord", FFP_VS_TEXTURING, order)
                    .with_operand(resolved(t, &self.texture_matrix, "texture matrix")?)
                    .with_operand(resolved(t, &self.vs_in_tex_coord, "texture coordinate input")?)
            }
            TexCoordCalc::None => FunctionInvocation::new(FFP_FUNC_ASSIGN, FFP_VS_TEXTURING, order)
                .with_operand(resolved(t, &self.vs_in_tex_coord, "texture coordinate input")?),
            TexCoordCalc::EnvironmentMapSphere => FunctionInvocation::new(
                "FFP_GenerateTexCoord_EnvMap_Sphere",
                FFP_VS_TEXTURING,
                order,
            )
            .with_operand(resolved(t, &self.world_view, "world view matrix")?)
            .with_operand(resolved(t, &self.world_view_it, "world view inverse transpose")?)
            .with_operand(resolved(t, &self.vs_in_normal, "input normal")?),
            TexCoordCalc::EnvironmentMapReflection => FunctionInvocation::new(
                "FFP_GenerateTexCoord_EnvMap_Reflect",
                FFP_VS_TEXTURING,
                order,
            )
            .with_operand(resolved(t, &self.world_view, "world view matrix")?)
            .with_operand(resolved(t, &self.world_view_it, "world view inverse transpose")?)
            .with_operand(resolved(t, &self.vs_in_position, "input position")?)
            .with_operand(resolved(t, &self.vs_in_normal, "input normal")?),
            TexCoordCalc::EnvironmentMapNormal => FunctionInvocation::new(
                "FFP_GenerateTexCoord_EnvMap_Normal",
                FFP_VS_TEXTURING,
                order,
            )
            .with_operand(resolved(t, &self.world_view_it, "world view inverse transpose")?)
            .with_operand(resolved(t, &self.vs_in_normal, "input normal")?),
            TexCoordCalc::Projective => FunctionInvocation::new(
                "FFP_GenerateTexCoord_Projection",
                FFP_VS_TEXTURING,
                order,
            )
            .with_operand(resolved(t, &self.world_view, "world view matrix")?)
            .with_operand(resolved(t, &self.texture_view_proj, "texture view projection")?)
            .with_operand(resolved(t, &self.vs_in_position, "input position")?),
        };
        main.add_atom_instance(call.with_operand(out));
        Ok(())
    }

    /// The operand a blend source reads from.
    fn source_operand(&self, source: LayerBlendSource) -> Result<String, RenderStateError> {
        let t = Self::TYPE_NAME;
        let name = match source {
            LayerBlendSource::Current if self.index == 0 => {
                resolved(t, &self.ps_in_diffuse, "diffuse input")?
            }
            LayerBlendSource::Current => resolved(t, &self.ps_out_diffuse, "colour output")?,
            LayerBlendSource::Texture => resolved(t, &self.texel, "texel")?,
            LayerBlendSource::Diffuse => resolved(t, &self.ps_in_diffuse, "diffuse input")?,
            LayerBlendSource::Specular => resolved(t, &self.ps_in_specular, "specular input")?,
            LayerBlendSource::Manual => {
                return Err(crate::sub_render_state::fragment_error(
                    t,
                    "manual sources have no operand",
                ))
            }
        };
        Ok(name.to_owned())
    }

    /// Loads one blend argument into `target`.
    fn add_argument(
        &self,
        main: &mut Function,
        source: LayerBlendSource,
        manual: [f32; 4],
        target: &str,
        mask: &str,
        order: &mut i32,
    ) -> Result<(), RenderStateError> {
        let call = if source == LayerBlendSource::Manual {
            if mask == ".a" {
                FunctionInvocation::new(FFP_FUNC_ASSIGN, FFP_PS_TEXTURING, *order)
                    .with_operand(float_literal(manual[3]))
                    .with_operand(format!("{target}{mask}"))
            } else {
                manual
                    .iter()
                    .fold(
                        FunctionInvocation::new(FFP_FUNC_CONSTRUCT, FFP_PS_TEXTURING, *order),
                        |call, c| call.with_operand(float_literal(*c)),
                    )
                    .with_operand(target)
            }
        } else {
            FunctionInvocation::new(FFP_FUNC_ASSIGN, FFP_PS_TEXTURING, *order)
                .with_operand(format!("{}{mask}", self.source_operand(source)?))
                .with_operand(format!("{target}{mask}"))
        };
        main.add_atom_instance(call);
        *order += 1;
        Ok(())
    }

    fn add_blend(
        &self,
        main: &mut Function,
        blend: &LayerBlend,
        alpha: bool,
        mask: &str,
        order: &mut i32,
    ) -> Result<(), RenderStateError> {
        let t = Self::TYPE_NAME;
        let source1 = resolved(t, &self.source1, "source1")?;
        let source2 = resolved(t, &self.source2, "source2")?;
        let (manual1, manual2) = if alpha {
            ([blend.alpha_arg1; 4], [blend.alpha_arg2; 4])
        } else {
            (blend.colour_arg1, blend.colour_arg2)
        };
        self.add_argument(main, blend.source1, manual1, source1, mask, order)?;
        self.add_argument(main, blend.source2, manual2, source2, mask, order)?;

        let out = format!("{}{mask}", resolved(t, &self.ps_out_diffuse, "colour output")?);
        let arg1 = format!("{source1}{mask}");
        let arg2 = format!("{source2}{mask}");
        let binary = |name: &str| {
            FunctionInvocation::new(name, FFP_PS_TEXTURING, *order)
                .with_operand(arg1.clone())
                .with_operand(arg2.clone())
        };
        let lerp = |factor: String| {
            FunctionInvocation::new(FFP_FUNC_LERP, FFP_PS_TEXTURING, *order)
                .with_operand(arg2.clone())
                .with_operand(arg1.clone())
                .with_operand(factor)
        };
        let call = match blend.operation {
            LayerBlendOperation::Source1 => {
                FunctionInvocation::new(FFP_FUNC_ASSIGN, FFP_PS_TEXTURING, *order)
                    .with_operand(arg1.clone())
            }
            LayerBlendOperation::Source2 => {
                FunctionInvocation::new(FFP_FUNC_ASSIGN, FFP_PS_TEXTURING, *order)
                    .with_operand(arg2.clone())
            }
            LayerBlendOperation::Modulate => binary(FFP_FUNC_MODULATE),
            LayerBlendOperation::ModulateX2 => binary(FFP_FUNC_MODULATEX2),
            LayerBlendOperation::ModulateX4 => binary(FFP_FUNC_MODULATEX4),
            LayerBlendOperation::Add => binary(FFP_FUNC_ADD),
            LayerBlendOperation::AddSigned => binary(FFP_FUNC_ADDSIGNED),
            LayerBlendOperation::AddSmooth => binary(FFP_FUNC_ADDSMOOTH),
            LayerBlendOperation::Subtract => binary(FFP_FUNC_SUBTRACT),
            LayerBlendOperation::DotProduct => binary(FFP_FUNC_DOTPRODUCT),
            LayerBlendOperation::BlendDiffuseAlpha => lerp(format!(
                "{}.a",
                resolved(t, &self.ps_in_diffuse, "diffuse input")?
            )),
            LayerBlendOperation::BlendTextureAlpha => {
                lerp(format!("{}.a", resolved(t, &self.texel, "texel")?))
            }
            LayerBlendOperation::BlendCurrentAlpha => lerp(format!(
                "{}.a",
                self.source_operand(LayerBlendSource::Current)?
            )),
            LayerBlendOperation::BlendManual => lerp(float_literal(blend.factor)),
        };
        main.add_atom_instance(call.with_operand(out));
        *order += 1;
        Ok(())
    }

    fn add_fragment_invocations(&self, main: &mut Function) -> Result<(), RenderStateError> {
        let t = Self::TYPE_NAME;
        let mut order = self.index as i32 * UNIT_STRIDE;
        let sample = if self.unit.tex_coord_calc == TexCoordCalc::Projective {
            "FFP_SampleTextureProj"
        } else {
            "FFP_SampleTexture"
        };
        main.add_atom_instance(
            FunctionInvocation::new(sample, FFP_PS_TEXTURING, order)
                .with_operand(resolved(t, &self.sampler, "sampler")?)
                .with_operand(resolved(t, &self.ps_in_tex_coord, "texture coordinate input")?)
                .with_operand(resolved(t, &self.texel, "texel")?),
        );
        order += 1;

        let colour = self.unit.colour_blend;
        let alpha = self.unit.alpha_blend;
        if colour == alpha {
            self.add_blend(main, &colour, false, "", &mut order)
        } else {
            self.add_blend(main, &colour, false, ".rgb", &mut order)?;
            self.add_blend(main, &alpha, true, ".a", &mut order)
        }
    }
}

fn resolve_normal(main: &mut Function) -> String {
    main.resolve_input_parameter(
        Semantic::Normal,
        0,
        Content::NormalObjectSpace,
        GpuConstantType::Float3,
    )
    .name()
    .to_owned()
}

fn resolve_position(main: &mut Function) -> String {
    main.resolve_input_parameter(
        Semantic::Position,
        0,
        Content::PositionObjectSpace,
        GpuConstantType::Float4,
    )
    .name()
    .to_owned()
}

impl SubRenderStateType for FfpTextureStage {
    const TYPE_NAME: &'static str = "FFP_TextureUnitState";
}

impl SubRenderState for FfpTextureStage {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn execution_order(&self) -> i32 {
        FFP_TEXTURING + self.index as i32
    }

    fn hash_code(&self) -> u32 {
        let mut hash = base_hash_code(Self::TYPE_NAME, self.execution_order());
        hash_combine(&mut hash, self.index);
        hash_combine(&mut hash, self.unit.texture_type as u32);
        hash_combine(&mut hash, self.unit.coord_set);
        hash_combine(&mut hash, self.unit.tex_coord_calc as u32);
        hash_combine_bool(&mut hash, self.unit.has_transform);
        hash_blend(&mut hash, &self.unit.colour_blend);
        hash_blend(&mut hash, &self.unit.alpha_blend);
        hash
    }

    fn copy_from(&mut self, other: &dyn SubRenderState) -> Result<(), RenderStateError> {
        copy_same_type(self, other)
    }

    fn resolve_parameters(&mut self, programs: &mut ProgramSet) -> Result<(), RenderStateError> {
        self.resolve_vertex(programs)?;
        self.resolve_fragment(programs)
    }

    fn resolve_dependencies(&mut self, programs: &mut ProgramSet) -> Result<(), RenderStateError> {
        let vs = programs.vertex_mut();
        vs.add_dependency(FFP_LIB_COMMON);
        vs.add_dependency(FFP_LIB_TEXTURING);
        let ps = programs.fragment_mut();
        ps.add_dependency(FFP_LIB_COMMON);
        ps.add_dependency(FFP_LIB_TEXTURING);
        Ok(())
    }

    fn add_function_invocations(
        &mut self,
        programs: &mut ProgramSet,
    ) -> Result<(), RenderStateError> {
        self.add_vertex_invocations(programs.vertex_mut().entry_point_function_mut()?)?;
        self.add_fragment_invocations(programs.fragment_mut().entry_point_function_mut()?)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

inventory::submit! {
    FactoryRegistration { create: BuiltinFactory::<FfpTextureStage>::boxed }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::DefaultProgramFactory;
    use crate::RenderState;

    fn stage(index: u32, unit: TextureUnitDescription) -> FfpTextureStage {
        let mut stage = FfpTextureStage::default();
        stage.set_texture_unit(index, unit);
        stage
    }

    fn generate(stages: Vec<FfpTextureStage>) -> ProgramSet {
        let mut state = RenderState::new();
        for s in stages {
            state.add_sub_render_state(Box::new(s));
        }
        state.create_cpu_programs(&DefaultProgramFactory).unwrap()
    }

    fn names(f: &Function) -> Vec<&str> {
        f.atom_instances().iter().map(|a| a.function_name()).collect()
    }

    #[test]
    fn test_float_literal() {
        assert_eq!(float_literal(1.0), "1.0");
        assert_eq!(float_literal(0.25), "0.25");
    }

    #[test]
    fn test_default_unit_modulates_texture_with_diffuse() {
        let programs = generate(vec![stage(0, TextureUnitDescription::default())]);

        let vs = programs.vertex().entry_point_function().unwrap();
        assert_eq!(names(vs), vec!["FFP_Assign"]);
        assert_eq!(vs.atom_instances()[0].operands(), ["iTexCoord_0", "oTexCoord_0"]);

        let fs = programs.fragment();
        assert!(fs.parameter_by_name("gTextureSampler0").is_some());
        let main = fs.entry_point_function().unwrap();
        assert_eq!(
            names(main),
            vec!["FFP_SampleTexture", "FFP_Assign", "FFP_Assign", "FFP_Modulate"]
        );
        assert_eq!(main.atom_instances()[2].operands(), ["iColor_0", "source2"]);
        assert_eq!(
            main.atom_instances()[3].operands(),
            ["source1", "source2", "oColor_0"]
        );
    }

    #[test]
    fn test_units_keep_their_invocations_together() {
        let second = TextureUnitDescription {
            coord_set: 1,
            ..Default::default()
        };
        let programs = generate(vec![
            stage(1, second),
            stage(0, TextureUnitDescription::default()),
        ]);
        let main = programs.fragment().entry_point_function().unwrap();
        let samples: Vec<_> = main
            .atom_instances()
            .iter()
            .enumerate()
            .filter(|(_, a)| a.function_name() == "FFP_SampleTexture")
            .map(|(i, a)| (i, a.operands()[0].clone()))
            .collect();
        assert_eq!(
            samples,
            vec![(0, "gTextureSampler0".to_owned()), (4, "gTextureSampler1".to_owned())]
        );
        // The second unit blends over the first unit's output.
        assert_eq!(main.atom_instances()[6].operands()[0], "oColor_0");
    }

    #[test]
    fn test_split_alpha_blend_and_manual_source() {
        let unit = TextureUnitDescription {
            alpha_blend: LayerBlend {
                operation: LayerBlendOperation::Source1,
                source1: LayerBlendSource::Manual,
                alpha_arg1: 0.5,
                ..Default::default()
            },
            ..Default::default()
        };
        let programs = generate(vec![stage(0, unit)]);
        let main = programs.fragment().entry_point_function().unwrap();
        let last = main.atom_instances().last().unwrap();
        assert_eq!(last.operands(), ["source1.a", "oColor_0.a"]);
        assert!(main
            .atom_instances()
            .iter()
            .any(|a| a.operands() == ["0.5", "source1.a"]));
    }

    #[test]
    fn test_env_map_and_transform_calcs() {
        let sphere = TextureUnitDescription {
            tex_coord_calc: TexCoordCalc::EnvironmentMapSphere,
            ..Default::default()
        };
        let matrix = TextureUnitDescription {
            has_transform: true,
            ..Default::default()
        };
        let programs = generate(vec![stage(0, sphere), stage(1, matrix)]);
        let vs = programs.vertex();
        assert!(vs.parameter_by_name("texture_matrix1").is_some());
        let main = vs.entry_point_function().unwrap();
        assert_eq!(
            names(main),
            vec!["FFP_GenerateTexCoord_EnvMap_Sphere", "FFP_TransformTexCoord"]
        );
        assert_eq!(main.atom_instances()[1].operands()[1], "iTexCoord_0");
    }

    #[test]
    fn test_hash_tracks_unit_settings() {
        let plain = stage(0, TextureUnitDescription::default());
        let mut added = TextureUnitDescription::default();
        added.colour_blend.operation = LayerBlendOperation::Add;
        assert_ne!(plain.hash_code(), stage(0, added).hash_code());
        assert_ne!(
            plain.hash_code(),
            stage(1, TextureUnitDescription::default()).hash_code()
        );
    }
}
