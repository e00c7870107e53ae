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
    resolved, FFP_COLOUR, FFP_FUNC_ADD, FFP_FUNC_ASSIGN, FFP_FUNC_CONSTRUCT, FFP_LIB_COMMON,
    FFP_PS_COLOUR_BEGIN, FFP_PS_COLOUR_END, FFP_VS_COLOUR,
};
use crate::program::{Content, FunctionInvocation, ProgramSet, Semantic};
use crate::sub_render_state::{
    base_hash_code, copy_same_type, BuiltinFactory, FactoryRegistration, SubRenderState,
    SubRenderStateType,
};
use crate::RenderStateError;
use kiln_core::renderer::GpuConstantType;
use kiln_core::utils::hash::hash_combine_bool;
use std::any::Any;

/// Carries the diffuse and specular colours from the vertex stage to the
/// fragment output.
#[derive(Debug, Clone, Default)]
pub struct FfpColour {
    vertex_colour_input: bool,
    specular: bool,
    vs_in_diffuse: Option<String>,
    vs_out_diffuse: Option<String>,
    vs_out_specular: Option<String>,
    ps_in_diffuse: Option<String>,
    ps_in_specular: Option<String>,
    ps_out_diffuse: Option<String>,
}

impl FfpColour {
    /// Reads the diffuse colour from the vertex stream instead of white.
    pub fn set_vertex_colour_input(&mut self, enabled: bool) {
        self.vertex_colour_input = enabled;
    }

    /// Passes a specular colour through and adds it to the output.
    pub fn set_specular(&mut self, enabled: bool) {
        self.specular = enabled;
    }

    pub fn vertex_colour_input(&self) -> bool {
        self.vertex_colour_input
    }

    pub fn specular(&self) -> bool {
        self.specular
    }
}

fn colour_slot(index: u32) -> Content {
    if index == 0 {
        Content::ColorDiffuse
    } else {
        Content::ColorSpecular
    }
}

impl SubRenderStateType for FfpColour {
    const TYPE_NAME: &'static str = "FFP_Colour";
}

impl SubRenderState for FfpColour {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn execution_order(&self) -> i32 {
        FFP_COLOUR
    }

    fn hash_code(&self) -> u32 {
        let mut hash = base_hash_code(Self::TYPE_NAME, FFP_COLOUR);
        hash_combine_bool(&mut hash, self.vertex_colour_input);
        hash_combine_bool(&mut hash, self.specular);
        hash
    }

    fn copy_from(&mut self, other: &dyn SubRenderState) -> Result<(), RenderStateError> {
        copy_same_type(self, other)
    }

    fn resolve_parameters(&mut self, programs: &mut ProgramSet) -> Result<(), RenderStateError> {
        let colour = |index| (Semantic::Color, index, colour_slot(index), GpuConstantType::Float4);

        let vs_main = programs.vertex_mut().entry_point_function_mut()?;
        if self.vertex_colour_input {
            let (s, i, c, t) = colour(0);
            self.vs_in_diffuse = Some(vs_main.resolve_input_parameter(s, i, c, t).name().to_owned());
        }
        let (s, i, c, t) = colour(0);
        self.vs_out_diffuse = Some(vs_main.resolve_output_parameter(s, i, c, t).name().to_owned());
        if self.specular {
            let (s, i, c, t) = colour(1);
            self.vs_out_specular =
                Some(vs_main.resolve_output_parameter(s, i, c, t).name().to_owned());
        }

        let ps_main = programs.fragment_mut().entry_point_function_mut()?;
        let (s, i, c, t) = colour(0);
        self.ps_in_diffuse = Some(ps_main.resolve_input_parameter(s, i, c, t).name().to_owned());
        self.ps_out_diffuse = Some(ps_main.resolve_output_parameter(s, i, c, t).name().to_owned());
        if self.specular {
            let (s, i, c, t) = colour(1);
            self.ps_in_specular =
                Some(ps_main.resolve_input_parameter(s, i, c, t).name().to_owned());
        }
        Ok(())
    }

    fn resolve_dependencies(&mut self, programs: &mut ProgramSet) -> Result<(), RenderStateError> {
        programs.vertex_mut().add_dependency(FFP_LIB_COMMON);
        programs.fragment_mut().add_dependency(FFP_LIB_COMMON);
        Ok(())
    }

    fn add_function_invocations(
        &mut self,
        programs: &mut ProgramSet,
    ) -> Result<(), RenderStateError> {
        let t = Self::TYPE_NAME;
        let vs_out_diffuse = resolved(t, &self.vs_out_diffuse, "vertex diffuse output")?;

        let vs_main = programs.vertex_mut().entry_point_function_mut()?;
        let diffuse = if self.vertex_colour_input {
            FunctionInvocation::new(FFP_FUNC_ASSIGN, FFP_VS_COLOUR, 0)
                .with_operand(resolved(t, &self.vs_in_diffuse, "vertex diffuse input")?)
        } else {
            FunctionInvocation::new(FFP_FUNC_CONSTRUCT, FFP_VS_COLOUR, 0)
                .with_operand("1.0")
                .with_operand("1.0")
                .with_operand("1.0")
                .with_operand("1.0")
        };
        vs_main.add_atom_instance(diffuse.with_operand(vs_out_diffuse));
        if self.specular {
            vs_main.add_atom_instance(
                FunctionInvocation::new(FFP_FUNC_CONSTRUCT, FFP_VS_COLOUR, 1)
                    .with_operand("0.0")
                    .with_operand("0.0")
                    .with_operand("0.0")
                    .with_operand("0.0")
                    .with_operand(resolved(t, &self.vs_out_specular, "vertex specular output")?),
            );
        }

        let ps_out = resolved(t, &self.ps_out_diffuse, "fragment colour output")?;
        let ps_main = programs.fragment_mut().entry_point_function_mut()?;
        ps_main.add_atom_instance(
            FunctionInvocation::new(FFP_FUNC_ASSIGN, FFP_PS_COLOUR_BEGIN, 0)
                .with_operand(resolved(t, &self.ps_in_diffuse, "fragment diffuse input")?)
                .with_operand(ps_out),
        );
        if self.specular {
            let specular = resolved(t, &self.ps_in_specular, "fragment specular input")?;
            ps_main.add_atom_instance(
                FunctionInvocation::new(FFP_FUNC_ADD, FFP_PS_COLOUR_END, 0)
                    .with_operand(format!("{ps_out}.xyz"))
                    .with_operand(format!("{specular}.xyz"))
                    .with_operand(format!("{ps_out}.xyz")),
            );
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

inventory::submit! {
    FactoryRegistration { create: BuiltinFactory::<FfpColour>::boxed }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::DefaultProgramFactory;
    use crate::RenderState;

    fn generate(colour: FfpColour) -> ProgramSet {
        let mut state = RenderState::new();
        state.add_sub_render_state(Box::new(colour));
        state.create_cpu_programs(&DefaultProgramFactory).unwrap()
    }

    #[test]
    fn test_default_colour_is_white() {
        let programs = generate(FfpColour::default());
        let vs = programs.vertex().entry_point_function().unwrap();
        assert!(vs.inputs().is_empty());
        assert_eq!(vs.atom_instances()[0].function_name(), "FFP_Construct");
        assert_eq!(vs.atom_instances()[0].operands().last().unwrap(), "oColor_0");

        let ps = programs.fragment().entry_point_function().unwrap();
        assert_eq!(ps.atom_instances()[0].operands(), ["iColor_0", "oColor_0"]);
    }

    #[test]
    fn test_vertex_colour_and_specular() {
        let mut colour = FfpColour::default();
        colour.set_vertex_colour_input(true);
        colour.set_specular(true);
        let programs = generate(colour);

        let vs = programs.vertex().entry_point_function().unwrap();
        assert_eq!(vs.inputs()[0].name(), "iColor_0");
        assert_eq!(vs.outputs().len(), 2);

        let ps = programs.fragment().entry_point_function().unwrap();
        let last = ps.atom_instances().last().unwrap();
        assert_eq!(last.function_name(), "FFP_Add");
        assert_eq!(last.operands(), ["oColor_0.xyz", "iColor_1.xyz", "oColor_0.xyz"]);
    }

    #[test]
    fn test_hash_follows_configuration() {
        let plain = FfpColour::default();
        let mut specular = FfpColour::default();
        specular.set_specular(true);
        assert_ne!(plain.hash_code(), specular.hash_code());
    }
}
