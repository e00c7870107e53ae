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

//! Per-pixel lighting.
//!
//! Takes the lighting slot in place of [`FfpLighting`](super::FfpLighting).
//! The vertex program only moves the normal and position into view space;
//! every light is evaluated in the fragment program.

use super::lighting::{light_slots, slot_counts, update_light_params, LightParams};
use super::{
    resolved, FFP_FUNC_ADD, FFP_FUNC_ASSIGN, FFP_FUNC_CONSTRUCT, FFP_FUNC_MODULATE,
    FFP_LIB_COMMON, FFP_PS_COLOUR_BEGIN, FFP_PS_COLOUR_END, FFP_VS_LIGHTING, PER_PIXEL_LIGHTING,
    SGX_LIB_PER_PIXEL_LIGHTING,
};
use crate::pass::{FrameContext, LightType, ProgramParameters, TrackVertexColour};
use crate::program::{AutoConstant, Content, Function, FunctionInvocation, Program, ProgramSet, Semantic};
use crate::sub_render_state::{
    base_hash_code, copy_same_type, BuiltinFactory, FactoryRegistration, SubRenderState,
    SubRenderStateType,
};
use crate::RenderStateError;
use kiln_core::renderer::GpuConstantType;
use kiln_core::utils::hash::{hash_combine, hash_combine_bool};
use std::any::Any;

const SPECULAR_SUM: &str = "lighting_specular";

#[derive(Debug, Clone, Default)]
pub struct PerPixelLighting {
    track_vertex_colour: TrackVertexColour,
    specular: bool,
    lights: Vec<LightParams>,

    world_view: Option<String>,
    world_view_it: Option<String>,
    vs_in_position: Option<String>,
    vs_in_normal: Option<String>,
    vs_out_normal: Option<String>,
    vs_out_view_position: Option<String>,

    ps_in_normal: Option<String>,
    ps_in_view_position: Option<String>,
    ps_in_diffuse: Option<String>,
    ps_out_diffuse: Option<String>,
    derived_scene_colour: Option<String>,
    light_ambient: Option<String>,
    derived_ambient: Option<String>,
    surface_emissive: Option<String>,
    surface_shininess: Option<String>,
}

impl PerPixelLighting {
    pub fn set_track_vertex_colour(&mut self, track: TrackVertexColour) {
        self.track_vertex_colour = track;
    }

    pub fn track_vertex_colour(&self) -> TrackVertexColour {
        self.track_vertex_colour
    }

    pub fn set_specular(&mut self, enabled: bool) {
        self.specular = enabled;
    }

    pub fn specular(&self) -> bool {
        self.specular
    }

    pub fn max_light_count(&self) -> [i32; 3] {
        slot_counts(&self.lights)
    }

    fn tracks(&self, flag: TrackVertexColour) -> bool {
        self.track_vertex_colour.contains(flag)
    }

    fn needs_view_position(&self) -> bool {
        self.specular
            || self
                .lights
                .iter()
                .any(|l| l.light_type != LightType::Directional)
    }

    fn resolve_vertex(&mut self, vs: &mut Program) -> Result<(), RenderStateError> {
        let needs_position = self.needs_view_position();
        self.world_view_it = Some(
            vs.resolve_auto_parameter(AutoConstant::InverseTransposeWorldViewMatrix)
                .name()
                .to_owned(),
        );
        if needs_position {
            self.world_view = Some(
                vs.resolve_auto_parameter(AutoConstant::WorldViewMatrix)
                    .name()
                    .to_owned(),
            );
        }

        let main = vs.entry_point_function_mut()?;
        self.vs_in_normal = Some(
            main.resolve_input_parameter(
                Semantic::Normal,
                0,
                Content::NormalObjectSpace,
                GpuConstantType::Float3,
            )
            .name()
            .to_owned(),
        );
        self.vs_out_normal = Some(
            main.resolve_output_by_content(
                Semantic::TextureCoordinates,
                Content::NormalViewSpace,
                GpuConstantType::Float3,
            )
            .name()
            .to_owned(),
        );
        if needs_position {
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
            self.vs_out_view_position = Some(
                main.resolve_output_by_content(
                    Semantic::TextureCoordinates,
                    Content::PositionViewSpace,
                    GpuConstantType::Float3,
                )
                .name()
                .to_owned(),
            );
        }
        Ok(())
    }

    fn resolve_fragment(&mut self, ps: &mut Program) -> Result<(), RenderStateError> {
        let auto = |ps: &mut Program, constant| Some(ps.resolve_auto_parameter(constant).name().to_owned());
        let uniform = |ps: &mut Program, t, name: &str| {
            Some(ps.resolve_parameter(t, None, name).name().to_owned())
        };

        if self.tracks(TrackVertexColour::AMBIENT) {
            self.light_ambient = auto(ps, AutoConstant::AmbientLightColour);
        } else {
            self.derived_ambient = auto(ps, AutoConstant::DerivedAmbientLightColour);
        }
        if !self.tracks(TrackVertexColour::EMISSIVE) {
            self.surface_emissive = auto(ps, AutoConstant::SurfaceEmissiveColour);
        }
        self.derived_scene_colour = auto(ps, AutoConstant::DerivedSceneColour);
        self.surface_shininess = auto(ps, AutoConstant::SurfaceShininess);

        let track_diffuse = self.tracks(TrackVertexColour::DIFFUSE);
        let track_specular = self.tracks(TrackVertexColour::SPECULAR);
        let specular = self.specular;
        for light in &mut self.lights {
            let float4 = GpuConstantType::Float4;
            match light.light_type {
                LightType::Directional => {
                    light.direction = uniform(ps, float4, "light_direction_view_space");
                }
                LightType::Point => {
                    light.position = uniform(ps, float4, "light_position_view_space");
                    light.attenuation = uniform(ps, float4, "light_attenuation");
                }
                LightType::Spotlight => {
                    light.position = uniform(ps, float4, "light_position_view_space");
                    light.direction = uniform(ps, float4, "light_direction_view_space");
                    light.attenuation = uniform(ps, float4, "light_attenuation");
                    light.spot = uniform(ps, GpuConstantType::Float3, "spotlight_params");
                }
            }
            light.diffuse = if track_diffuse {
                uniform(ps, float4, "light_diffuse")
            } else {
                uniform(ps, float4, "derived_light_diffuse")
            };
            if specular {
                light.specular = if track_specular {
                    uniform(ps, float4, "light_specular")
                } else {
                    uniform(ps, float4, "derived_light_specular")
                };
            }
        }

        let needs_position = self.needs_view_position();
        let main = ps.entry_point_function_mut()?;
        self.ps_in_normal = Some(
            main.resolve_input_by_content(
                Semantic::TextureCoordinates,
                Content::NormalViewSpace,
                GpuConstantType::Float3,
            )
            .name()
            .to_owned(),
        );
        if needs_position {
            self.ps_in_view_position = Some(
                main.resolve_input_by_content(
                    Semantic::TextureCoordinates,
                    Content::PositionViewSpace,
                    GpuConstantType::Float3,
                )
                .name()
                .to_owned(),
            );
        }
        if self.track_vertex_colour != TrackVertexColour::NONE {
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
        if self.specular {
            main.resolve_local_parameter(SPECULAR_SUM, GpuConstantType::Float4);
        }
        Ok(())
    }

    fn add_vertex_invocations(&self, main: &mut Function) -> Result<(), RenderStateError> {
        let t = Self::TYPE_NAME;
        main.add_atom_instance(
            FunctionInvocation::new("SGX_TransformNormal", FFP_VS_LIGHTING, 0)
                .with_operand(resolved(t, &self.world_view_it, "world view inverse transpose")?)
                .with_operand(resolved(t, &self.vs_in_normal, "input normal")?)
                .with_operand(resolved(t, &self.vs_out_normal, "view space normal")?),
        );
        if self.needs_view_position() {
            main.add_atom_instance(
                FunctionInvocation::new("SGX_TransformPosition", FFP_VS_LIGHTING, 1)
                    .with_operand(resolved(t, &self.world_view, "world view matrix")?)
                    .with_operand(resolved(t, &self.vs_in_position, "input position")?)
                    .with_operand(resolved(t, &self.vs_out_view_position, "view space position")?),
            );
        }
        Ok(())
    }

    fn add_global_illumination(
        &self,
        main: &mut Function,
        order: &mut i32,
    ) -> Result<(), RenderStateError> {
        let t = Self::TYPE_NAME;
        let out = resolved(t, &self.ps_out_diffuse, "colour output")?;
        let mut next = |name: &str| {
            let call = FunctionInvocation::new(name, FFP_PS_COLOUR_BEGIN, *order);
            *order += 1;
            call
        };
        let mut calls = Vec::new();

        if !self.tracks(TrackVertexColour::AMBIENT) && !self.tracks(TrackVertexColour::EMISSIVE) {
            calls.push(
                next(FFP_FUNC_ASSIGN)
                    .with_operand(resolved(t, &self.derived_scene_colour, "scene colour")?)
                    .with_operand(out),
            );
        } else {
            if self.tracks(TrackVertexColour::AMBIENT) {
                calls.push(
                    next(FFP_FUNC_MODULATE)
                        .with_operand(resolved(t, &self.light_ambient, "ambient light")?)
                        .with_operand(resolved(t, &self.ps_in_diffuse, "vertex colour")?)
                        .with_operand(out),
                );
            } else {
                let ambient = resolved(t, &self.derived_ambient, "derived ambient")?;
                calls.push(
                    next(FFP_FUNC_ASSIGN)
                        .with_operand(format!("{ambient}.xyz"))
                        .with_operand(format!("{out}.xyz")),
                );
            }
            let emissive = if self.tracks(TrackVertexColour::EMISSIVE) {
                resolved(t, &self.ps_in_diffuse, "vertex colour")?
            } else {
                resolved(t, &self.surface_emissive, "surface emissive")?
            };
            calls.push(
                next(FFP_FUNC_ADD)
                    .with_operand(emissive)
                    .with_operand(out)
                    .with_operand(out),
            );
        }

        if self.specular {
            calls.push(
                next(FFP_FUNC_CONSTRUCT)
                    .with_operand("0.0")
                    .with_operand("0.0")
                    .with_operand("0.0")
                    .with_operand("0.0")
                    .with_operand(SPECULAR_SUM),
            );
        }
        for call in calls {
            main.add_atom_instance(call);
        }
        Ok(())
    }

    fn add_illumination(
        &self,
        light: &LightParams,
        main: &mut Function,
        order: &mut i32,
    ) -> Result<(), RenderStateError> {
        let t = Self::TYPE_NAME;
        let xyz = |slot: &Option<String>, what: &str| -> Result<String, RenderStateError> {
            Ok(format!("{}.xyz", resolved(t, slot, what)?))
        };
        let kind = match light.light_type {
            LightType::Directional => "Directional",
            LightType::Point => "Point",
            LightType::Spotlight => "Spot",
        };
        let suffix = if self.specular { "DiffuseSpecular" } else { "Diffuse" };
        let mut call = FunctionInvocation::new(
            format!("SGX_Light_{kind}_{suffix}"),
            FFP_PS_COLOUR_BEGIN,
            *order,
        );
        *order += 1;

        call.push_operand(resolved(t, &self.ps_in_normal, "view space normal")?);
        if self.needs_view_position() {
            call.push_operand(resolved(t, &self.ps_in_view_position, "view space position")?);
        }
        match light.light_type {
            LightType::Directional => call.push_operand(xyz(&light.direction, "light direction")?),
            LightType::Point => {
                call.push_operand(xyz(&light.position, "light position")?);
                call.push_operand(resolved(t, &light.attenuation, "light attenuation")?);
            }
            LightType::Spotlight => {
                call.push_operand(xyz(&light.position, "light position")?);
                call.push_operand(xyz(&light.direction, "light direction")?);
                call.push_operand(resolved(t, &light.attenuation, "light attenuation")?);
                call.push_operand(resolved(t, &light.spot, "spot parameters")?);
            }
        }

        let mut diffuse = xyz(&light.diffuse, "light diffuse")?;
        if self.tracks(TrackVertexColour::DIFFUSE) {
            diffuse = format!(
                "{}*{}",
                diffuse,
                xyz(&self.ps_in_diffuse, "vertex colour")?
            );
        }
        call.push_operand(diffuse);

        let out = xyz(&self.ps_out_diffuse, "colour output")?;
        if self.specular {
            let mut specular = xyz(&light.specular, "light specular")?;
            if self.tracks(TrackVertexColour::SPECULAR) {
                specular = format!(
                    "{}*{}",
                    specular,
                    xyz(&self.ps_in_diffuse, "vertex colour")?
                );
            }
            let sum = format!("{SPECULAR_SUM}.xyz");
            call.push_operand(specular);
            call.push_operand(resolved(t, &self.surface_shininess, "shininess")?);
            call.push_operand(out.clone());
            call.push_operand(sum.clone());
            call.push_operand(out);
            call.push_operand(sum);
        } else {
            call.push_operand(out.clone());
            call.push_operand(out);
        }
        main.add_atom_instance(call);
        Ok(())
    }
}

impl SubRenderStateType for PerPixelLighting {
    const TYPE_NAME: &'static str = "SGX_PerPixelLighting";
}

impl SubRenderState for PerPixelLighting {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn execution_order(&self) -> i32 {
        PER_PIXEL_LIGHTING
    }

    fn hash_code(&self) -> u32 {
        let mut hash = base_hash_code(Self::TYPE_NAME, PER_PIXEL_LIGHTING);
        for light in &self.lights {
            hash_combine(&mut hash, light.light_type as u32);
            hash_combine_bool(&mut hash, self.specular);
        }
        hash_combine(&mut hash, u32::from(self.track_vertex_colour.bits()));
        hash
    }

    fn copy_from(&mut self, other: &dyn SubRenderState) -> Result<(), RenderStateError> {
        copy_same_type(self, other)
    }

    fn set_max_light_count(&mut self, max_light_count: [i32; 3]) {
        self.lights = light_slots(max_light_count);
    }

    fn resolve_parameters(&mut self, programs: &mut ProgramSet) -> Result<(), RenderStateError> {
        self.resolve_vertex(programs.vertex_mut())?;
        self.resolve_fragment(programs.fragment_mut())
    }

    fn resolve_dependencies(&mut self, programs: &mut ProgramSet) -> Result<(), RenderStateError> {
        let vs = programs.vertex_mut();
        vs.add_dependency(FFP_LIB_COMMON);
        vs.add_dependency(SGX_LIB_PER_PIXEL_LIGHTING);
        let ps = programs.fragment_mut();
        ps.add_dependency(FFP_LIB_COMMON);
        ps.add_dependency(SGX_LIB_PER_PIXEL_LIGHTING);
        Ok(())
    }

    fn add_function_invocations(
        &mut self,
        programs: &mut ProgramSet,
    ) -> Result<(), RenderStateError> {
        self.add_vertex_invocations(programs.vertex_mut().entry_point_function_mut()?)?;

        let main = programs.fragment_mut().entry_point_function_mut()?;
        // Runs right after the colour fragment has seeded the output.
        let mut order = 1;
        self.add_global_illumination(main, &mut order)?;
        for light in &self.lights {
            self.add_illumination(light, main, &mut order)?;
        }
        if self.specular {
            let out = resolved(Self::TYPE_NAME, &self.ps_out_diffuse, "colour output")?;
            main.add_atom_instance(
                FunctionInvocation::new(FFP_FUNC_ADD, FFP_PS_COLOUR_END, 1)
                    .with_operand(format!("{out}.xyz"))
                    .with_operand(format!("{SPECULAR_SUM}.xyz"))
                    .with_operand(format!("{out}.xyz")),
            );
        }
        Ok(())
    }

    fn update_gpu_programs_params(&mut self, frame: &FrameContext<'_>, params: &mut ProgramParameters) {
        update_light_params(
            &self.lights,
            frame,
            self.track_vertex_colour,
            self.specular,
            params,
        );
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

inventory::submit! {
    FactoryRegistration { create: BuiltinFactory::<PerPixelLighting>::boxed }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::DefaultProgramFactory;
    use crate::RenderState;

    fn per_pixel(counts: [i32; 3], specular: bool) -> PerPixelLighting {
        let mut lighting = PerPixelLighting::default();
        lighting.set_max_light_count(counts);
        lighting.set_specular(specular);
        lighting
    }

    fn generate(lighting: PerPixelLighting) -> ProgramSet {
        let mut state = RenderState::new();
        state.add_sub_render_state(Box::new(lighting));
        state.create_cpu_programs(&DefaultProgramFactory).unwrap()
    }

    #[test]
    fn test_directional_only_skips_view_position() {
        let programs = generate(per_pixel([0, 1, 0], false));
        let vs = programs.vertex().entry_point_function().unwrap();
        assert_eq!(vs.atom_instances().len(), 1);
        assert_eq!(
            vs.atom_instances()[0].operands(),
            ["inverse_transpose_worldview_matrix", "iNormal_0", "oTexCoord_0"]
        );

        let ps = programs.fragment().entry_point_function().unwrap();
        let names: Vec<_> = ps.atom_instances().iter().map(|a| a.function_name()).collect();
        assert_eq!(names, vec!["FFP_Assign", "SGX_Light_Directional_Diffuse"]);
        assert_eq!(ps.atom_instances()[1].operands()[0], "iTexCoord_0");
    }

    #[test]
    fn test_specular_point_light_accumulates() {
        let programs = generate(per_pixel([1, 0, 0], true));
        let vs = programs.vertex().entry_point_function().unwrap();
        assert_eq!(vs.outputs()[1].name(), "oTexCoord_1");

        let ps = programs.fragment().entry_point_function().unwrap();
        assert!(ps.locals().iter().any(|p| p.name() == SPECULAR_SUM));
        let light = ps
            .atom_instances()
            .iter()
            .find(|a| a.function_name() == "SGX_Light_Point_DiffuseSpecular")
            .unwrap();
        assert_eq!(light.operands()[1], "iTexCoord_1");
        let last = ps.atom_instances().last().unwrap();
        assert_eq!(last.function_name(), "FFP_Add");
        assert_eq!(last.operands()[1], "lighting_specular.xyz");
    }

    #[test]
    fn test_hash_and_light_counts() {
        let a = per_pixel([1, 1, 0], false);
        assert_eq!(a.max_light_count(), [1, 1, 0]);
        assert_ne!(a.hash_code(), per_pixel([1, 1, 0], true).hash_code());
        assert_ne!(a.hash_code(), per_pixel([0, 1, 1], false).hash_code());
    }
}
