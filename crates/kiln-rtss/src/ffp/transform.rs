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

use super::{resolved, FFP_FUNC_TRANSFORM, FFP_LIB_COMMON, FFP_LIB_TRANSFORM, FFP_TRANSFORM, FFP_VS_TRANSFORM};
use crate::program::{AutoConstant, Content, FunctionInvocation, ProgramSet, Semantic};
use crate::sub_render_state::{
    copy_same_type, BuiltinFactory, FactoryRegistration, SubRenderState, SubRenderStateType,
};
use crate::RenderStateError;
use kiln_core::renderer::GpuConstantType;
use std::any::Any;

/// Object space position to clip space.
#[derive(Debug, Clone, Default)]
pub struct FfpTransform {
    world_view_proj: Option<String>,
    position_in: Option<String>,
    position_out: Option<String>,
}

impl SubRenderStateType for FfpTransform {
    const TYPE_NAME: &'static str = "FFP_Transform";
}

impl SubRenderState for FfpTransform {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn execution_order(&self) -> i32 {
        FFP_TRANSFORM
    }

    fn copy_from(&mut self, other: &dyn SubRenderState) -> Result<(), RenderStateError> {
        copy_same_type(self, other)
    }

    fn resolve_parameters(&mut self, programs: &mut ProgramSet) -> Result<(), RenderStateError> {
        let vs = programs.vertex_mut();
        self.world_view_proj = Some(
            vs.resolve_auto_parameter(AutoConstant::WorldViewProjMatrix)
                .name()
                .to_owned(),
        );
        let main = vs.entry_point_function_mut()?;
        self.position_in = Some(
            main.resolve_input_parameter(
                Semantic::Position,
                0,
                Content::PositionObjectSpace,
                GpuConstantType::Float4,
            )
            .name()
            .to_owned(),
        );
        self.position_out = Some(
            main.resolve_output_parameter(
                Semantic::Position,
                0,
                Content::PositionProjectiveSpace,
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
        vs.add_dependency(FFP_LIB_TRANSFORM);
        Ok(())
    }

    fn add_function_invocations(
        &mut self,
        programs: &mut ProgramSet,
    ) -> Result<(), RenderStateError> {
        let t = Self::TYPE_NAME;
        let invocation = FunctionInvocation::new(FFP_FUNC_TRANSFORM, FFP_VS_TRANSFORM, 0)
            .with_operand(resolved(t, &self.world_view_proj, "world view projection")?)
            .with_operand(resolved(t, &self.position_in, "input position")?)
            .with_operand(resolved(t, &self.position_out, "output position")?);
        programs
            .vertex_mut()
            .entry_point_function_mut()?
            .add_atom_instance(invocation);
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
    FactoryRegistration { create: BuiltinFactory::<FfpTransform>::boxed }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RenderState;
    use crate::program::DefaultProgramFactory;

    #[test]
    fn test_transform_emits_single_call() {
        let mut state = RenderState::new();
        state.add_sub_render_state(Box::new(FfpTransform::default()));
        let programs = state.create_cpu_programs(&DefaultProgramFactory).unwrap();

        let vs = programs.vertex();
        assert!(vs.parameter_by_name("worldviewproj_matrix").is_some());
        assert_eq!(vs.dependencies(), [FFP_LIB_COMMON, FFP_LIB_TRANSFORM]);

        let main = vs.entry_point_function().unwrap();
        let call = &main.atom_instances()[0];
        assert_eq!(call.function_name(), "FFP_Transform");
        assert_eq!(call.operands(), ["worldviewproj_matrix", "iPos_0", "oPos_0"]);
    }

    #[test]
    fn test_invocations_before_resolve_fail() {
        let mut programs = RenderState::new()
            .create_cpu_programs(&DefaultProgramFactory)
            .unwrap();
        let err = FfpTransform::default()
            .add_function_invocations(&mut programs)
            .unwrap_err();
        assert!(err.to_string().contains("was not resolved"));
    }
}
