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

//! # Sub Render States
//!
//! A sub render state is one composable fragment of a generated shader:
//! transform, colour, lighting, one texture unit, fog, or any custom
//! effect. A [`RenderState`](crate::RenderState) sorts its fragments by
//! [`execution_order`](SubRenderState::execution_order) and lets each one
//! contribute uniforms, inputs, outputs and function calls to a
//! [`ProgramSet`].
//!
//! Fragments are created and destroyed through a
//! [`SubRenderStateFactory`], looked up by type name in a
//! [`SubRenderStateRegistry`]. Built-in factories register themselves with
//! `inventory::submit!` and a [`FactoryRegistration`].

mod factory;
mod registry;

pub use factory::{BuiltinFactory, FactoryRegistration, SubRenderStateFactory};
pub use registry::SubRenderStateRegistry;

use crate::pass::{FrameContext, ProgramParameters};
use crate::program::ProgramSet;
use crate::RenderStateError;
use kiln_core::utils::hash::{hash_combine, hash_combine_i32};
use std::any::Any;
use std::fmt;

/// The registered type name of a concrete sub render state.
pub trait SubRenderStateType {
    const TYPE_NAME: &'static str;
}

/// One composable fragment of a generated program pair.
pub trait SubRenderState: Any + Send + Sync + fmt::Debug {
    /// The name of the factory that creates this fragment.
    fn type_name(&self) -> &'static str;

    /// Where this fragment runs relative to the others.
    fn execution_order(&self) -> i32;

    /// A hash of everything that changes the generated code.
    fn hash_code(&self) -> u32 {
        base_hash_code(self.type_name(), self.execution_order())
    }

    /// Takes over the configuration of `other`, which must be of the same
    /// type.
    fn copy_from(&mut self, other: &dyn SubRenderState) -> Result<(), RenderStateError>;

    /// Light counts as `[point, directional, spot]`.
    fn set_max_light_count(&mut self, _max_light_count: [i32; 3]) {}

    /// Contributes this fragment to `programs`.
    fn create_cpu_sub_programs(&mut self, programs: &mut ProgramSet) -> Result<(), RenderStateError> {
        self.resolve_parameters(programs)?;
        self.resolve_dependencies(programs)?;
        self.add_function_invocations(programs)
    }

    fn resolve_parameters(&mut self, _programs: &mut ProgramSet) -> Result<(), RenderStateError> {
        Ok(())
    }

    fn resolve_dependencies(&mut self, _programs: &mut ProgramSet) -> Result<(), RenderStateError> {
        Ok(())
    }

    fn add_function_invocations(
        &mut self,
        _programs: &mut ProgramSet,
    ) -> Result<(), RenderStateError> {
        Ok(())
    }

    /// Writes per-object uniform values.
    fn update_gpu_programs_params(
        &mut self,
        _frame: &FrameContext<'_>,
        _params: &mut ProgramParameters,
    ) {
    }

    /// Called once per frame before visibility is computed.
    fn pre_find_visible_objects(&mut self, _frame: &FrameContext<'_>) {}

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// The hash every fragment starts from: its type name and execution order.
pub fn base_hash_code(type_name: &str, execution_order: i32) -> u32 {
    let mut hash = 0;
    for byte in type_name.bytes() {
        hash_combine(&mut hash, u32::from(byte));
    }
    hash_combine_i32(&mut hash, execution_order);
    hash
}

/// Implements [`SubRenderState::copy_from`] for fragments whose whole
/// configuration is their `Clone` state.
pub fn copy_same_type<T>(target: &mut T, other: &dyn SubRenderState) -> Result<(), RenderStateError>
where
    T: SubRenderState + SubRenderStateType + Clone,
{
    match other.as_any().downcast_ref::<T>() {
        Some(source) => {
            *target = source.clone();
            Ok(())
        }
        None => Err(RenderStateError::TypeMismatch {
            target_type: T::TYPE_NAME,
            source_type: other.type_name(),
        }),
    }
}

/// A fragment failure, for `?` inside fragment implementations.
pub(crate) fn fragment_error(type_name: &'static str, reason: impl Into<String>) -> RenderStateError {
    RenderStateError::SubRenderState {
        type_name,
        reason: reason.into(),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::program::FunctionInvocation;

    /// A configurable fragment used by the render state and registry tests.
    #[derive(Debug, Clone, Default)]
    pub struct Marker {
        pub order: i32,
        pub tag: u32,
        pub fail: bool,
        pub updates: usize,
        pub frames: usize,
    }

    impl SubRenderStateType for Marker {
        const TYPE_NAME: &'static str = "Test_Marker";
    }

    impl SubRenderState for Marker {
        fn type_name(&self) -> &'static str {
            Self::TYPE_NAME
        }

        fn execution_order(&self) -> i32 {
            self.order
        }

        fn hash_code(&self) -> u32 {
            let mut hash = base_hash_code(Self::TYPE_NAME, self.order);
            hash_combine(&mut hash, self.tag);
            hash
        }

        fn copy_from(&mut self, other: &dyn SubRenderState) -> Result<(), RenderStateError> {
            copy_same_type(self, other)
        }

        fn add_function_invocations(
            &mut self,
            programs: &mut ProgramSet,
        ) -> Result<(), RenderStateError> {
            if self.fail {
                return Err(fragment_error(Self::TYPE_NAME, "asked to fail"));
            }
            programs
                .vertex_mut()
                .entry_point_function_mut()?
                .add_atom_instance(FunctionInvocation::new(
                    format!("marker{}", self.tag),
                    self.order,
                    0,
                ));
            Ok(())
        }

        fn update_gpu_programs_params(
            &mut self,
            _frame: &FrameContext<'_>,
            _params: &mut ProgramParameters,
        ) {
            self.updates += 1;
        }

        fn pre_find_visible_objects(&mut self, _frame: &FrameContext<'_>) {
            self.frames += 1;
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    pub fn marker(order: i32, tag: u32) -> Box<dyn SubRenderState> {
        Box::new(Marker {
            order,
            tag,
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::Marker;
    use super::*;

    #[test]
    fn test_base_hash_depends_on_name_and_order() {
        assert_eq!(base_hash_code("A", 1), base_hash_code("A", 1));
        assert_ne!(base_hash_code("A", 1), base_hash_code("B", 1));
        assert_ne!(base_hash_code("A", 1), base_hash_code("A", 2));
    }

    #[test]
    fn test_copy_same_type() {
        let source = Marker {
            order: 7,
            tag: 3,
            ..Default::default()
        };
        let mut target = Marker::default();
        target.copy_from(&source).unwrap();
        assert_eq!(target.order, 7);
        assert_eq!(target.tag, 3);
    }

    #[derive(Debug)]
    struct Other;

    impl SubRenderState for Other {
        fn type_name(&self) -> &'static str {
            "Test_Other"
        }
        fn execution_order(&self) -> i32 {
            0
        }
        fn copy_from(&mut self, _other: &dyn SubRenderState) -> Result<(), RenderStateError> {
            Ok(())
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    #[test]
    fn test_copy_from_other_type_fails() {
        let mut target = Marker::default();
        let err = target.copy_from(&Other).unwrap_err();
        assert!(matches!(
            err,
            RenderStateError::TypeMismatch {
                target_type: "Test_Marker",
                source_type: "Test_Other"
            }
        ));
    }
}
