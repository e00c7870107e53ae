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

//! Renders generated programs to shading-language source.

mod glsl;

pub use glsl::{glsl_type_name, GlslProgramWriter};

use crate::program::Program;
use crate::RenderStateError;

/// Turns a [`Program`] into source code for one target language.
pub trait ProgramWriter: Send + Sync {
    /// The language this writer emits, e.g. `"glsl"`.
    fn target_language(&self) -> &'static str;

    fn write_source(&self, program: &Program) -> Result<String, RenderStateError>;
}
