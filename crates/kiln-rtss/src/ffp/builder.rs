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

//! Derives the fixed-function part of a render state from a pass.

use super::{
    FfpColour, FfpFog, FfpLighting, FfpTextureStage, FfpTransform, PerPixelLighting, FFP_COLOUR,
    FFP_FOG, FFP_LIGHTING, FFP_TEXTURING, FFP_TRANSFORM,
};
use crate::generator::{ShaderGenerator, ShaderPass};
use crate::pass::{FogMode, PassDescription, TrackVertexColour};
use crate::sub_render_state::{SubRenderState, SubRenderStateType};
use crate::{RenderState, RenderStateError};

/// Adds one fragment per fixed-function slot the pass uses to `target`.
///
/// A custom fragment registered for a slot, on the pass or on its scheme,
/// replaces the built-in one. Either way the fragment is configured from
/// the pass description.
pub fn build_ffp_render_state(
    generator: &ShaderGenerator,
    pass: &ShaderPass,
    target: &mut RenderState,
) -> Result<(), RenderStateError> {
    let description = &pass.description;
    let max_light_count = target.max_light_count();

    let mut add = |order: i32, type_name: &str, configure: &dyn Fn(&mut dyn SubRenderState)| {
        let mut state = match generator.custom_ffp_sub_state(order, pass)? {
            Some(state) => state,
            None => generator.create_sub_render_state(type_name)?,
        };
        configure(state.as_mut());
        target.add_sub_render_state(state);
        Ok::<_, RenderStateError>(())
    };

    add(FFP_TRANSFORM, FfpTransform::TYPE_NAME, &|_| {})?;
    add(FFP_COLOUR, FfpColour::TYPE_NAME, &|state| {
        configure_colour(state, description)
    })?;
    if description.lighting_enabled {
        add(FFP_LIGHTING, FfpLighting::TYPE_NAME, &|state| {
            configure_lighting(state, description, max_light_count)
        })?;
    }
    for (index, unit) in description.texture_units.iter().enumerate() {
        let index = index as u32;
        add(
            FFP_TEXTURING + index as i32,
            FfpTextureStage::TYPE_NAME,
            &|state| {
                if let Some(stage) = state.as_any_mut().downcast_mut::<FfpTextureStage>() {
                    stage.set_texture_unit(index, *unit);
                }
            },
        )?;
    }
    if description.fog_mode != FogMode::None {
        add(FFP_FOG, FfpFog::TYPE_NAME, &|state| {
            if let Some(fog) = state.as_any_mut().downcast_mut::<FfpFog>() {
                fog.set_fog_mode(description.fog_mode);
            }
        })?;
    }
    Ok(())
}

fn configure_colour(state: &mut dyn SubRenderState, pass: &PassDescription) {
    if let Some(colour) = state.as_any_mut().downcast_mut::<FfpColour>() {
        colour.set_vertex_colour_input(pass.track_vertex_colour != TrackVertexColour::NONE);
        colour.set_specular(pass.lighting_enabled && pass.specular_enabled());
    }
}

fn configure_lighting(state: &mut dyn SubRenderState, pass: &PassDescription, lights: [i32; 3]) {
    let any = state.as_any_mut();
    if let Some(lighting) = any.downcast_mut::<FfpLighting>() {
        lighting.set_track_vertex_colour(pass.track_vertex_colour);
        lighting.set_specular(pass.specular_enabled());
    } else if let Some(lighting) = any.downcast_mut::<PerPixelLighting>() {
        lighting.set_track_vertex_colour(pass.track_vertex_colour);
        lighting.set_specular(pass.specular_enabled());
    }
    state.set_max_light_count(lights);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::GeneratorSettings;
    use crate::pass::TextureUnitDescription;

    fn orders(state: &RenderState) -> Vec<(i32, &'static str)> {
        state
            .sub_render_states()
            .map(|s| (s.execution_order(), s.type_name()))
            .collect()
    }

    #[test]
    fn test_default_pass_builds_transform_colour_lighting() {
        let generator = ShaderGenerator::new(GeneratorSettings::default());
        let pass = ShaderPass::new("default", PassDescription::default());
        let mut target = RenderState::new();
        build_ffp_render_state(&generator, &pass, &mut target).unwrap();
        assert_eq!(
            orders(&target),
            vec![
                (FFP_TRANSFORM, "FFP_Transform"),
                (FFP_COLOUR, "FFP_Colour"),
                (FFP_LIGHTING, "FFP_Lighting"),
            ]
        );
    }

    #[test]
    fn test_unlit_textured_fogged_pass() {
        let generator = ShaderGenerator::new(GeneratorSettings::default());
        let description = PassDescription {
            lighting_enabled: false,
            fog_mode: FogMode::Exp2,
            texture_units: vec![TextureUnitDescription::default(); 2],
            ..Default::default()
        };
        let pass = ShaderPass::new("default", description);
        let mut target = RenderState::new();
        build_ffp_render_state(&generator, &pass, &mut target).unwrap();

        let types: Vec<_> = orders(&target).into_iter().map(|(o, _)| o).collect();
        assert_eq!(types, vec![100, 200, 400, 401, 500]);
        let second = target
            .find_by_execution_order(FFP_TEXTURING + 1)
            .and_then(|s| s.as_any().downcast_ref::<FfpTextureStage>())
            .unwrap();
        assert_eq!(second.index(), 1);
    }

    #[test]
    fn test_custom_lighting_replaces_builtin() {
        let generator = ShaderGenerator::new(GeneratorSettings::default());
        let mut custom = RenderState::new();
        custom.add_sub_render_state(generator.create_sub_render_state("SGX_PerPixelLighting").unwrap());
        let pass = ShaderPass::new("default", PassDescription::default())
            .with_custom_render_state(custom);

        let mut target = RenderState::new();
        target.set_max_light_count([1, 0, 0]);
        build_ffp_render_state(&generator, &pass, &mut target).unwrap();

        let lighting = target
            .find_by_execution_order(FFP_LIGHTING)
            .and_then(|s| s.as_any().downcast_ref::<PerPixelLighting>())
            .unwrap();
        assert_eq!(lighting.max_light_count(), [1, 0, 0]);
    }
}
