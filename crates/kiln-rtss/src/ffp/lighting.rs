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

//! Per-vertex fixed-function lighting.

use super::{
    resolved, FFP_FUNC_ADD, FFP_FUNC_ASSIGN, FFP_FUNC_MODULATE, FFP_LIB_COMMON, FFP_LIB_LIGHTING,
    FFP_LIGHTING, FFP_VS_LIGHTING,
};
use crate::pass::{modulate, FrameContext, LightDescription, LightType, ProgramParameters, TrackVertexColour};
use crate::program::{AutoConstant, Content, Function, FunctionInvocation, Program, ProgramSet, Semantic};
use crate::sub_render_state::{
    base_hash_code, copy_same_type, BuiltinFactory, FactoryRegistration, SubRenderState,
    SubRenderStateType,
};
use crate::RenderStateError;
use kiln_core::renderer::GpuConstantType;
use kiln_core::utils::hash::{hash_combine, hash_combine_bool};
use std::any::Any;

/// Uniform names resolved for one light slot.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LightParams {
    pub light_type: LightType,
    pub position: Option<String>,
    pub direction: Option<String>,
    pub attenuation: Option<String>,
    pub spot: Option<String>,
    pub diffuse: Option<String>,
    pub specular: Option<String>,
}

impl LightParams {
    pub fn new(light_type: LightType) -> Self {
        Self {
            light_type,
            position: None,
            direction: None,
            attenuation: None,
            spot: None,
            diffuse: None,
            specular: None,
        }
    }
}

/// One [`LightParams`] per light, ordered point, directional, spot.
pub(crate) fn light_slots(max_light_count: [i32; 3]) -> Vec<LightParams> {
    LightType::ALL
        .iter()
        .flat_map(|&t| {
            let count = max_light_count[t as usize].max(0) as usize;
            std::iter::repeat_with(move || LightParams::new(t)).take(count)
        })
        .collect()
}

/// Counts the slots of each light type.
pub(crate) fn slot_counts(lights: &[LightParams]) -> [i32; 3] {
    let mut counts = [0; 3];
    for light in lights {
        counts[light.light_type as usize] += 1;
    }
    counts
}

/// Pairs every slot with the scene light that feeds it.
///
/// Lights are matched by type in list order; slots left over get
/// [`LightDescription::BLANK`].
pub(crate) fn match_lights<'a>(
    slots: &'a [LightParams],
    lights: &'a [LightDescription],
) -> impl Iterator<Item = (&'a LightParams, &'a LightDescription)> {
    let mut current_type = None;
    let mut search_from = 0;
    slots.iter().map(move |slot| {
        if current_type != Some(slot.light_type) {
            current_type = Some(slot.light_type);
            search_from = 0;
        }
        let found = lights[search_from.min(lights.len())..]
            .iter()
            .position(|l| l.light_type == slot.light_type);
        let light = match found {
            Some(offset) => {
                let index = search_from + offset;
                search_from = index + 1;
                &lights[index]
            }
            None => &LightDescription::BLANK,
        };
        (slot, light)
    })
}

/// Writes the per-light uniform values shared by the lighting fragments.
pub(crate) fn update_light_params(
    slots: &[LightParams],
    frame: &FrameContext<'_>,
    track: TrackVertexColour,
    specular: bool,
    params: &mut ProgramParameters,
) {
    for (slot, light) in match_lights(slots, frame.lights) {
        let negated = [
            -light.direction[0],
            -light.direction[1],
            -light.direction[2],
            0.0,
        ];
        if let Some(name) = &slot.position {
            params.set_named(name, light.position);
        }
        if let Some(name) = &slot.direction {
            params.set_named(name, negated);
        }
        if let Some(name) = &slot.attenuation {
            params.set_named(name, light.attenuation);
        }
        if let Some(name) = &slot.spot {
            params.set_named(name, [light.spot[0], light.spot[1], light.spot[2], 0.0]);
        }
        if let Some(name) = &slot.diffuse {
            let colour = if track.contains(TrackVertexColour::DIFFUSE) {
                light.diffuse
            } else {
                modulate(light.diffuse, frame.pass.diffuse)
            };
            params.set_named(name, colour);
        }
        if specular {
            if let Some(name) = &slot.specular {
                let colour = if track.contains(TrackVertexColour::SPECULAR) {
                    light.specular
                } else {
                    modulate(light.specular, frame.pass.specular)
                };
                params.set_named(name, colour);
            }
        }
    }
}

fn uniform(program: &mut Program, const_type: GpuConstantType, name: &str) -> Option<String> {
    Some(program.resolve_parameter(const_type, None, name).name().to_owned())
}

fn auto(program: &mut Program, constant: AutoConstant) -> Option<String> {
    Some(program.resolve_auto_parameter(constant).name().to_owned())
}

fn input(function: &mut Function, semantic: Semantic, content: Content, t: GpuConstantType) -> Option<String> {
    Some(function.resolve_input_parameter(semantic, 0, content, t).name().to_owned())
}

/// Classic Gouraud lighting evaluated in the vertex program.
#[derive(Debug, Clone, Default)]
pub struct FfpLighting {
    track_vertex_colour: TrackVertexColour,
    specular: bool,
    lights: Vec<LightParams>,

    world_view: Option<String>,
    world_view_it: Option<String>,
    vs_in_position: Option<String>,
    vs_in_normal: Option<String>,
    vs_in_diffuse: Option<String>,
    vs_out_diffuse: Option<String>,
    vs_out_specular: Option<String>,
    derived_scene_colour: Option<String>,
    light_ambient: Option<String>,
    derived_ambient: Option<String>,
    surface_ambient: Option<String>,
    surface_diffuse: Option<String>,
    surface_specular: Option<String>,
    surface_emissive: Option<String>,
    surface_shininess: Option<String>,
}

impl FfpLighting {
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

    /// Light counts as `[point, directional, spot]`.
    pub fn max_light_count(&self) -> [i32; 3] {
        slot_counts(&self.lights)
    }

    fn tracks(&self, flag: TrackVertexColour) -> bool {
        self.track_vertex_colour.contains(flag)
    }

    fn add_global_illumination(
        &self,
        main: &mut Function,
        counter: &mut i32,
    ) -> Result<(), RenderStateError> {
        let t = Self::TYPE_NAME;
        let out = resolved(t, &self.vs_out_diffuse, "diffuse output")?;
        let mut next = |name: &str| {
            let invocation = FunctionInvocation::new(name, FFP_VS_LIGHTING, *counter);
            *counter += 1;
            invocation
        };

        if !self.tracks(TrackVertexColour::AMBIENT) && !self.tracks(TrackVertexColour::EMISSIVE) {
            main.add_atom_instance(
                next(FFP_FUNC_ASSIGN)
                    .with_operand(resolved(t, &self.derived_scene_colour, "scene colour")?)
                    .with_operand(out),
            );
            return Ok(());
        }

        if self.tracks(TrackVertexColour::AMBIENT) {
            main.add_atom_instance(
                next(FFP_FUNC_MODULATE)
                    .with_operand(resolved(t, &self.light_ambient, "ambient light")?)
                    .with_operand(resolved(t, &self.vs_in_diffuse, "vertex colour")?)
                    .with_operand(out),
            );
        } else {
            let ambient = resolved(t, &self.derived_ambient, "derived ambient")?;
            main.add_atom_instance(
                next(FFP_FUNC_ASSIGN)
                    .with_operand(format!("{ambient}.xyz"))
                    .with_operand(format!("{out}.xyz")),
            );
        }

        let emissive = if self.tracks(TrackVertexColour::EMISSIVE) {
            resolved(t, &self.vs_in_diffuse, "vertex colour")?
        } else {
            resolved(t, &self.surface_emissive, "surface emissive")?
        };
        main.add_atom_instance(
            next(FFP_FUNC_ADD)
                .with_operand(emissive)
                .with_operand(out)
                .with_operand(out),
        );
        Ok(())
    }

    fn add_illumination(
        &self,
        light: &LightParams,
        main: &mut Function,
        counter: &mut i32,
    ) -> Result<(), RenderStateError> {
        let t = Self::TYPE_NAME;
        let xyz = |slot: &Option<String>, what: &str| -> Result<String, RenderStateError> {
            Ok(format!("{}.xyz", resolved(t, slot, what)?))
        };
        let diffuse = xyz(&light.diffuse, "light diffuse")?;

        if self.tracks(TrackVertexColour::DIFFUSE) {
            let colour = xyz(&self.vs_in_diffuse, "vertex colour")?;
            main.add_atom_instance(
                FunctionInvocation::new(FFP_FUNC_MODULATE, FFP_VS_LIGHTING, *counter)
                    .with_operand(colour)
                    .with_operand(diffuse.clone())
                    .with_operand(diffuse.clone()),
            );
            *counter += 1;
        }
        if self.specular && self.tracks(TrackVertexColour::SPECULAR) {
            let colour = xyz(&self.vs_in_diffuse, "vertex colour")?;
            let specular = xyz(&light.specular, "light specular")?;
            main.add_atom_instance(
                FunctionInvocation::new(FFP_FUNC_MODULATE, FFP_VS_LIGHTING, *counter)
                    .with_operand(colour)
                    .with_operand(specular.clone())
                    .with_operand(specular),
            );
            *counter += 1;
        }

        let kind = match light.light_type {
            LightType::Directional => "Directional",
            LightType::Point => "Point",
            LightType::Spotlight => "Spot",
        };
        let suffix = if self.specular { "DiffuseSpecular" } else { "Diffuse" };
        let mut call = FunctionInvocation::new(
            format!("FFP_Light_{kind}_{suffix}"),
            FFP_VS_LIGHTING,
            *counter,
        );
        *counter += 1;

        let needs_position = self.specular || light.light_type != LightType::Directional;
        if needs_position {
            call.push_operand(resolved(t, &self.world_view, "world view matrix")?);
            call.push_operand(resolved(t, &self.vs_in_position, "input position")?);
        }
        call.push_operand(resolved(t, &self.world_view_it, "world view inverse transpose")?);
        call.push_operand(resolved(t, &self.vs_in_normal, "input normal")?);
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
        call.push_operand(diffuse);

        let out_diffuse = xyz(&self.vs_out_diffuse, "diffuse output")?;
        if self.specular {
            let out_specular = xyz(&self.vs_out_specular, "specular output")?;
            call.push_operand(xyz(&light.specular, "light specular")?);
            call.push_operand(resolved(t, &self.surface_shininess, "shininess")?);
            call.push_operand(out_diffuse.clone());
            call.push_operand(out_specular.clone());
            call.push_operand(out_diffuse);
            call.push_operand(out_specular);
        } else {
            call.push_operand(out_diffuse.clone());
            call.push_operand(out_diffuse);
        }
        main.add_atom_instance(call);
        Ok(())
    }
}

impl SubRenderStateType for FfpLighting {
    const TYPE_NAME: &'static str = "FFP_Lighting";
}

impl SubRenderState for FfpLighting {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn execution_order(&self) -> i32 {
        FFP_LIGHTING
    }

    fn hash_code(&self) -> u32 {
        let mut hash = base_hash_code(Self::TYPE_NAME, FFP_LIGHTING);
        hash_combine_bool(&mut hash, self.specular);
        for light in &self.lights {
            hash_combine(&mut hash, light.light_type as u32);
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
        let vs = programs.vertex_mut();
        let track = |flag| self.track_vertex_colour.contains(flag);
        let (ambient, diffuse, specular, emissive) = (
            track(TrackVertexColour::AMBIENT),
            track(TrackVertexColour::DIFFUSE),
            track(TrackVertexColour::SPECULAR),
            track(TrackVertexColour::EMISSIVE),
        );

        self.world_view_it = auto(vs, AutoConstant::InverseTransposeWorldViewMatrix);
        if ambient {
            self.light_ambient = auto(vs, AutoConstant::AmbientLightColour);
            self.surface_ambient = auto(vs, AutoConstant::SurfaceAmbientColour);
        } else {
            self.derived_ambient = auto(vs, AutoConstant::DerivedAmbientLightColour);
        }
        if !diffuse {
            self.surface_diffuse = auto(vs, AutoConstant::SurfaceDiffuseColour);
        }
        if !specular {
            self.surface_specular = auto(vs, AutoConstant::SurfaceSpecularColour);
        }
        if !emissive {
            self.surface_emissive = auto(vs, AutoConstant::SurfaceEmissiveColour);
        }
        self.derived_scene_colour = auto(vs, AutoConstant::DerivedSceneColour);
        self.surface_shininess = auto(vs, AutoConstant::SurfaceShininess);

        let needs_position = self.specular
            || self
                .lights
                .iter()
                .any(|l| l.light_type != LightType::Directional);
        if needs_position {
            self.world_view = auto(vs, AutoConstant::WorldViewMatrix);
        }

        let specular_enabled = self.specular;
        for light in &mut self.lights {
            match light.light_type {
                LightType::Directional => {
                    light.direction = uniform(vs, GpuConstantType::Float4, "light_direction_view_space");
                }
                LightType::Point => {
                    light.position = uniform(vs, GpuConstantType::Float4, "light_position_view_space");
                    light.attenuation = uniform(vs, GpuConstantType::Float4, "light_attenuation");
                }
                LightType::Spotlight => {
                    light.position = uniform(vs, GpuConstantType::Float4, "light_position_view_space");
                    light.direction = uniform(vs, GpuConstantType::Float4, "light_direction_view_space");
                    light.attenuation = uniform(vs, GpuConstantType::Float4, "light_attenuation");
                    light.spot = uniform(vs, GpuConstantType::Float3, "spotlight_params");
                }
            }
            light.diffuse = if diffuse {
                uniform(vs, GpuConstantType::Float4, "light_diffuse")
            } else {
                uniform(vs, GpuConstantType::Float4, "derived_light_diffuse")
            };
            if specular_enabled {
                light.specular = if specular {
                    uniform(vs, GpuConstantType::Float4, "light_specular")
                } else {
                    uniform(vs, GpuConstantType::Float4, "derived_light_specular")
                };
            }
        }

        let main = vs.entry_point_function_mut()?;
        self.vs_in_normal = input(main, Semantic::Normal, Content::NormalObjectSpace, GpuConstantType::Float3);
        if needs_position {
            self.vs_in_position =
                input(main, Semantic::Position, Content::PositionObjectSpace, GpuConstantType::Float4);
        }
        if self.track_vertex_colour != TrackVertexColour::NONE {
            self.vs_in_diffuse = input(main, Semantic::Color, Content::ColorDiffuse, GpuConstantType::Float4);
        }
        self.vs_out_diffuse = Some(
            main.resolve_output_parameter(Semantic::Color, 0, Content::ColorDiffuse, GpuConstantType::Float4)
                .name()
                .to_owned(),
        );
        if self.specular {
            self.vs_out_specular = Some(
                main.resolve_output_parameter(
                    Semantic::Color,
                    1,
                    Content::ColorSpecular,
                    GpuConstantType::Float4,
                )
                .name()
                .to_owned(),
            );
        }
        Ok(())
    }

    fn resolve_dependencies(&mut self, programs: &mut ProgramSet) -> Result<(), RenderStateError> {
        let vs = programs.vertex_mut();
        vs.add_dependency(FFP_LIB_COMMON);
        vs.add_dependency(FFP_LIB_LIGHTING);
        Ok(())
    }

    fn add_function_invocations(
        &mut self,
        programs: &mut ProgramSet,
    ) -> Result<(), RenderStateError> {
        let main = programs.vertex_mut().entry_point_function_mut()?;
        let mut counter = 0;
        self.add_global_illumination(main, &mut counter)?;
        for light in &self.lights {
            self.add_illumination(light, main, &mut counter)?;
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
    FactoryRegistration { create: BuiltinFactory::<FfpLighting>::boxed }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pass::PassDescription;
    use crate::program::DefaultProgramFactory;
    use crate::RenderState;

    fn lighting(counts: [i32; 3], specular: bool) -> FfpLighting {
        let mut lighting = FfpLighting::default();
        lighting.set_max_light_count(counts);
        lighting.set_specular(specular);
        lighting
    }

    fn generate(lighting: FfpLighting) -> ProgramSet {
        let mut state = RenderState::new();
        state.add_sub_render_state(Box::new(lighting));
        state.create_cpu_programs(&DefaultProgramFactory).unwrap()
    }

    fn calls(programs: &ProgramSet) -> Vec<String> {
        programs
            .vertex()
            .entry_point_function()
            .unwrap()
            .atom_instances()
            .iter()
            .map(|a| a.function_name().to_owned())
            .collect()
    }

    #[test]
    fn test_light_slots_follow_max_light_count() {
        let l = lighting([1, 2, 1], false);
        assert_eq!(l.max_light_count(), [1, 2, 1]);
        let types: Vec<_> = l.lights.iter().map(|p| p.light_type).collect();
        assert_eq!(
            types,
            vec![
                LightType::Point,
                LightType::Directional,
                LightType::Directional,
                LightType::Spotlight
            ]
        );

        let mut again = l.clone();
        again.set_max_light_count([0, 1, 0]);
        assert_eq!(again.max_light_count(), [0, 1, 0]);
    }

    #[test]
    fn test_hash_depends_on_lights_and_specular() {
        let a = lighting([0, 1, 0], false);
        assert_eq!(a.hash_code(), lighting([0, 1, 0], false).hash_code());
        assert_ne!(a.hash_code(), lighting([1, 0, 0], false).hash_code());
        assert_ne!(a.hash_code(), lighting([0, 1, 0], true).hash_code());
    }

    #[test]
    fn test_directional_diffuse_invocations() {
        let programs = generate(lighting([0, 1, 0], false));
        assert_eq!(
            calls(&programs),
            vec!["FFP_Assign", "FFP_Light_Directional_Diffuse"]
        );

        let vs = programs.vertex();
        assert!(vs.parameter_by_name("derived_scene_colour").is_some());
        assert!(vs.parameter_by_name("worldview_matrix").is_none());
        let call = &vs.entry_point_function().unwrap().atom_instances()[1];
        assert_eq!(call.operands()[0], "inverse_transpose_worldview_matrix");
        assert_eq!(call.operands()[1], "iNormal_0");
    }

    #[test]
    fn test_point_specular_needs_position() {
        let programs = generate(lighting([1, 0, 0], true));
        let vs = programs.vertex();
        let main = vs.entry_point_function().unwrap();
        assert!(main.inputs().iter().any(|p| p.name() == "iPos_0"));
        assert!(main.outputs().iter().any(|p| p.name() == "oColor_1"));
        assert_eq!(
            main.atom_instances()[1].function_name(),
            "FFP_Light_Point_DiffuseSpecular"
        );
    }

    #[test]
    fn test_tracked_ambient_and_emissive() {
        let mut l = lighting([0, 1, 0], false);
        l.set_track_vertex_colour(TrackVertexColour::AMBIENT | TrackVertexColour::EMISSIVE);
        let programs = generate(l);
        assert_eq!(
            calls(&programs),
            vec!["FFP_Modulate", "FFP_Add", "FFP_Light_Directional_Diffuse"]
        );
    }

    #[test]
    fn test_update_params_uses_matching_lights_and_blanks() {
        let mut l = lighting([0, 2, 0], false);
        let mut programs = RenderState::new()
            .create_cpu_programs(&DefaultProgramFactory)
            .unwrap();
        l.create_cpu_sub_programs(&mut programs).unwrap();

        let pass = PassDescription {
            diffuse: [0.5, 0.5, 0.5, 1.0],
            ..Default::default()
        };
        let sun = LightDescription {
            diffuse: [1.0, 1.0, 1.0, 1.0],
            direction: [0.0, -1.0, 0.0, 0.0],
            ..LightDescription::BLANK
        };
        let frame = FrameContext {
            pass: &pass,
            lights: &[sun],
        };
        let mut params = ProgramParameters::new();
        l.update_gpu_programs_params(&frame, &mut params);

        let first = &l.lights[0];
        let second = &l.lights[1];
        let direction = params.get(first.direction.as_deref().unwrap()).unwrap();
        assert_eq!(direction, [0.0, 1.0, 0.0, 0.0]);
        assert_eq!(
            params.get(first.diffuse.as_deref().unwrap()),
            Some([0.5, 0.5, 0.5, 1.0])
        );
        assert_eq!(
            params.get(second.diffuse.as_deref().unwrap()),
            Some([0.0, 0.0, 0.0, 1.0])
        );
    }

    #[test]
    fn test_match_lights_restarts_per_type() {
        let point = LightDescription {
            light_type: LightType::Point,
            ..LightDescription::BLANK
        };
        let sun = LightDescription::BLANK;
        let lights = [sun, point];
        let slots = light_slots([1, 1, 0]);
        let matched: Vec<_> = match_lights(&slots, &lights).map(|(_, l)| l.light_type).collect();
        assert_eq!(matched, vec![LightType::Point, LightType::Directional]);
    }
}
