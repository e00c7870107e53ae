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

use super::{
    resolved, FFP_FOG, FFP_FUNC_LERP, FFP_LIB_COMMON, FFP_LIB_FOG, FFP_PS_FOG, FFP_VS_FOG,
};
use crate::pass::{FogMode, FrameContext, ProgramParameters};
use crate::program::{AutoConstant, Content, FunctionInvocation, ProgramSet, Semantic};
use crate::sub_render_state::{
    base_hash_code, copy_same_type, fragment_error, BuiltinFactory, FactoryRegistration,
    SubRenderState, SubRenderStateType,
};
use crate::RenderStateError;
use kiln_core::renderer::GpuConstantType;
use kiln_core::utils::hash::hash_combine;
use std::any::Any;

/// Per-vertex fog, blended towards the fog colour in the fragment program.
#[derive(Debug, Clone, Default)]
pub struct FfpFog {
    fog_mode: FogMode,

    world_view_proj: Option<String>,
    fog_params: Option<String>,
    fog_colour: Option<String>,
    vs_in_position: Option<String>,
    vs_out_fog_factor: Option<String>,
    ps_in_fog_factor: Option<String>,
    ps_out_diffuse: Option<String>,
}

impl FfpFog {
    pub fn set_fog_mode(&mut self, mode: FogMode) {
        self.fog_mode = mode;
    }

    pub fn fog_mode(&self) -> FogMode {
        self.fog_mode
    }
}

/// `[density, start, end, 1 / (end - start)]`, with a zero scale for an
/// empty range.
pub(crate) fn fog_params(params: [f32; 3]) -> [f32; 4] {
    let [density, start, end] = params;
    let range = end - start;
    let scale = if range != 0.0 { 1.0 / range } else { 0.0 };
    [density, start, end, scale]
}

impl SubRenderStateType for FfpFog {
    const TYPE_NAME: &'static str = "FFP_Fog";
}

impl SubRenderState for FfpFog {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn execution_order(&self) -> i32 {
        FFP_FOG
    }

    fn hash_code(&self) -> u32 {
        let mut hash = base_hash_code(Self::TYPE_NAME, FFP_FOG);
        hash_combine(&mut hash, self.fog_mode as u32);
        hash
    }

    fn copy_from(&mut self, other: &dyn SubRenderState) -> Result<(), RenderStateError> {
        copy_same_type(self, other)
    }

    fn resolve_parameters(&mut self, programs: &mut ProgramSet) -> Result<(), RenderStateError> {
        if self.fog_mode == FogMode::None {
            return Err(fragment_error(Self::TYPE_NAME, "no fog mode set"));
        }

        let vs = programs.vertex_mut();
        self.world_view_proj = Some(
            vs.resolve_auto_parameter(AutoConstant::WorldViewProjMatrix)
                .name()
                .to_owned(),
        );
        self.fog_params = Some(
            vs.resolve_auto_parameter(AutoConstant::FogParams)
                .name()
                .to_owned(),
        );
        let main = vs.entry_point_function_mut()?;
        self.vs_in_position = Some(
            main.resolve_input_parameter(
                Semantic::Position,
                0,
                Content::PositionObjectSpace,
                GpuConstantType::Float4,
            )
            .name()
            .to_owned(),
        );
        self.vs_out_fog_factor = Some(
            main.resolve_output_by_content(
                Semantic::TextureCoordinates,
                Content::FogFactor,
                GpuConstantType::Float1,
            )
            .name()
            .to_owned(),
        );

        let ps = programs.fragment_mut();
        self.fog_colour = Some(
            ps.resolve_auto_parameter(AutoConstant::FogColour)
                .name()
                .to_owned(),
        );
        let main = ps.entry_point_function_mut()?;
        self.ps_in_fog_factor = Some(
            main.resolve_input_by_content(
                Semantic::TextureCoordinates,
                Content::FogFactor,
                GpuConstantType::Float1,
            )
            .name()
            .to_owned(),
        );
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
        Ok(())
    }

    fn resolve_dependencies(&mut self, programs: &mut ProgramSet) -> Result<(), RenderStateError> {
        let vs = programs.vertex_mut();
        vs.add_dependency(FFP_LIB_COMMON);
        vs.add_dependency(FFP_LIB_FOG);
        programs.fragment_mut().add_dependency(FFP_LIB_COMMON);
        Ok(())
    }

    fn add_function_invocations(
        &mut self,
        programs: &mut ProgramSet,
    ) -> Result<(), RenderStateError> {
        let t = Self::TYPE_NAME;
        let function = match self.fog_mode {
            FogMode::Linear => "FFP_VertexFog_Linear",
            FogMode::Exp => "FFP_VertexFog_Exp",
            FogMode::Exp2 => "FFP_VertexFog_Exp2",
            FogMode::None => return Err(fragment_error(t, "no fog mode set")),
        };
        programs.vertex_mut().entry_point_function_mut()?.add_atom_instance(
            FunctionInvocation::new(function, FFP_VS_FOG, 0)
                .with_operand(resolved(t, &self.world_view_proj, "world view projection")?)
                .with_operand(resolved(t, &self.vs_in_position, "input position")?)
                .with_operand(resolved(t, &self.fog_params, "fog parameters")?)
                .with_operand(resolved(t, &self.vs_out_fog_factor, "fog factor output")?),
        );

        let out = resolved(t, &self.ps_out_diffuse, "colour output")?;
        programs.fragment_mut().entry_point_function_mut()?.add_atom_instance(
            FunctionInvocation::new(FFP_FUNC_LERP, FFP_PS_FOG, 0)
                .with_operand(resolved(t, &self.fog_colour, "fog colour")?)
                .with_operand(out)
                .with_operand(resolved(t, &self.ps_in_fog_factor, "fog factor input")?)
                .with_operand(out),
        );
        Ok(())
    }

    fn update_gpu_programs_params(&mut self, frame: &FrameContext<'_>, params: &mut ProgramParameters) {
        if let Some(name) = &self.fog_params {
            params.set_named(name, fog_params(frame.pass.fog_params));
        }
        if let Some(name) = &self.fog_colour {
            params.set_named(name, frame.pass.fog_colour);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

inventory::submit! {
    FactoryRegistration { create: BuiltinFactory::<FfpFog>::boxed }
}
