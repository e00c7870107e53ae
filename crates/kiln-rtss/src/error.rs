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

use kiln_core::renderer::ProgramError;

/// An error raised while composing render states or generating programs.
#[derive(Debug, thiserror::Error)]
pub enum RenderStateError {
    /// A factory with the same type name is already registered.
    #[error("A factory of type '{0}' already exists.")]
    DuplicateFactory(String),
    /// No factory is registered under the requested type name.
    #[error("A factory of type '{0}' doesn't exist.")]
    UnknownFactory(String),
    /// `copy_from` was handed a sub render state of another type.
    #[error("Cannot copy a '{source_type}' into a '{target_type}'")]
    TypeMismatch {
        target_type: &'static str,
        source_type: &'static str,
    },
    /// A sub render state could not contribute to the CPU programs.
    #[error("Sub render state '{type_name}' failed: {reason}")]
    SubRenderState {
        type_name: &'static str,
        reason: String,
    },
    /// A render state handle does not refer to a cached render state.
    #[error("No cached render state with hash {0:08x}")]
    NotCached(u32),
    /// The program model rejected an operation.
    #[error(transparent)]
    Program(#[from] ProgramError),
}
