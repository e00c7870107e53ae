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

//! # Kiln RTSS
//!
//! Run-time shader composition. A [`RenderState`] is an ordered list of
//! [`SubRenderState`] fragments; each fragment contributes uniforms, stage
//! inputs and outputs, and function calls to a vertex and fragment
//! [`Program`] pair, which a [`GlslProgramWriter`] turns into source.
//!
//! The [`ShaderGenerator`] derives render states from fixed-function pass
//! descriptions, merges in per-scheme and per-pass custom fragments, and
//! caches the result by hash.

pub mod error;
pub mod ffp;
pub mod generator;
pub mod pass;
pub mod program;
pub mod render_state;
pub mod sub_render_state;
pub mod writer;

pub use error::RenderStateError;
pub use generator::{GeneratorSettings, RenderStateHandle, ShaderGenerator, ShaderPass};
pub use pass::{FrameContext, LightDescription, PassDescription, ProgramParameters};
pub use program::{DefaultProgramFactory, Program, ProgramFactory, ProgramSet};
pub use render_state::RenderState;
pub use sub_render_state::{
    SubRenderState, SubRenderStateFactory, SubRenderStateRegistry, SubRenderStateType,
};
pub use writer::{GlslProgramWriter, ProgramWriter};
