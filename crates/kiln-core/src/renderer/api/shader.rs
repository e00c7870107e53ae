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

use crate::renderer::{ShaderLanguage, ShaderStage};
use std::borrow::Cow;

/// Describes one stage's source text handed to the shader layers.
#[derive(Debug, Clone)]
pub struct ShaderSourceDescriptor<'a> {
    pub label: Option<&'a str>,
    pub language: ShaderLanguage,
    pub stage: ShaderStage,
    pub source: Cow<'a, str>,
    pub entry_point: &'a str,
}

/// An opaque handle representing a compiled and linked program object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramId(pub usize);

#[cfg(test)]
mod tests {
    use super::*;
    use std::borrow::Cow;

    #[test]
    fn program_id_creation_and_equality() {
        let id1 = ProgramId(1);
        let id2 = ProgramId(2);
        let id1_again = ProgramId(1);

        assert_eq!(id1, id1_again);
        assert_ne!(id1, id2);
    }

    #[test]
    fn shader_source_descriptor_creation() {
        let source_code = "void main() {}";
        let descriptor = ShaderSourceDescriptor {
            label: Some("test_shader"),
            language: ShaderLanguage::Glsl,
            stage: ShaderStage::Vertex,
            source: Cow::Borrowed(source_code),
            entry_point: "main",
        };

        assert_eq!(descriptor.label, Some("test_shader"));
        assert_eq!(descriptor.entry_point, "main");
        assert_eq!(descriptor.stage, ShaderStage::Vertex);
        assert_eq!(descriptor.source.as_ref(), source_code);
    }
}
