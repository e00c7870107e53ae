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

//! Enums describing programmable pipeline stages and source languages.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A programmable stage of the GPU pipeline.
///
/// The declaration order is significant: when a linked program is reflected,
/// uniforms are attributed to the first stage, in this order, whose constant
/// definitions contain them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ShaderStage {
    /// The vertex shader stage.
    Vertex,
    /// The geometry shader stage.
    Geometry,
    /// The fragment (or pixel) shader stage.
    Fragment,
    /// The tessellation control (hull) stage.
    Hull,
    /// The tessellation evaluation (domain) stage.
    Domain,
    /// The compute shader stage.
    Compute,
}

impl ShaderStage {
    /// All stages in reflection search order.
    pub const ALL: [ShaderStage; 6] = [
        ShaderStage::Vertex,
        ShaderStage::Geometry,
        ShaderStage::Fragment,
        ShaderStage::Hull,
        ShaderStage::Domain,
        ShaderStage::Compute,
    ];
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Geometry => "geometry",
            ShaderStage::Fragment => "fragment",
            ShaderStage::Hull => "hull",
            ShaderStage::Domain => "domain",
            ShaderStage::Compute => "compute",
        };
        f.write_str(name)
    }
}

/// The high-level language a program source is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShaderLanguage {
    /// Desktop GLSL.
    Glsl,
    /// GLSL for embedded systems.
    GlslEs,
    /// Direct3D HLSL.
    Hlsl,
    /// NVIDIA Cg, compiled to one of the other languages.
    Cg,
}

impl ShaderLanguage {
    /// Whether constants of this language are laid out with 4-float row padding.
    ///
    /// GLSL packs tightly; HLSL and Cg registers are always 4 components wide.
    pub fn uses_padded_constants(&self) -> bool {
        matches!(self, ShaderLanguage::Hlsl | ShaderLanguage::Cg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_search_order() {
        assert_eq!(ShaderStage::ALL[0], ShaderStage::Vertex);
        assert_eq!(ShaderStage::ALL[2], ShaderStage::Fragment);
        assert!(ShaderStage::Vertex < ShaderStage::Compute);
    }

    #[test]
    fn test_language_padding() {
        assert!(!ShaderLanguage::Glsl.uses_padded_constants());
        assert!(!ShaderLanguage::GlslEs.uses_padded_constants());
        assert!(ShaderLanguage::Cg.uses_padded_constants());
    }
}
