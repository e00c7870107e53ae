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

//! Shader parameters: uniforms, function inputs and outputs, and locals.

use kiln_core::renderer::GpuConstantType;

/// The binding semantic of a function input or output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Semantic {
    #[default]
    Unknown,
    Position,
    BlendWeights,
    BlendIndices,
    Normal,
    Color,
    TextureCoordinates,
    Binormal,
    Tangent,
}

impl Semantic {
    /// The stem used when naming a parameter with this semantic.
    pub const fn stem(self) -> &'static str {
        match self {
            Semantic::Unknown => "Param",
            Semantic::Position => "Pos",
            Semantic::BlendWeights => "BlendWeights",
            Semantic::BlendIndices => "BlendIndices",
            Semantic::Normal => "Normal",
            Semantic::Color => "Color",
            Semantic::TextureCoordinates => "TexCoord",
            Semantic::Binormal => "Binormal",
            Semantic::Tangent => "Tangent",
        }
    }
}

/// What a parameter actually carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Content {
    #[default]
    Unknown,
    PositionObjectSpace,
    PositionViewSpace,
    PositionProjectiveSpace,
    NormalObjectSpace,
    NormalViewSpace,
    ColorDiffuse,
    ColorSpecular,
    TextureCoordinate(u8),
    FogFactor,
}

/// A uniform whose value is supplied by the renderer rather than the
/// material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AutoConstant {
    WorldViewProjMatrix,
    WorldViewMatrix,
    InverseTransposeWorldViewMatrix,
    AmbientLightColour,
    DerivedAmbientLightColour,
    DerivedSceneColour,
    SurfaceAmbientColour,
    SurfaceDiffuseColour,
    SurfaceSpecularColour,
    SurfaceEmissiveColour,
    SurfaceShininess,
    TextureMatrix(u32),
    FogColour,
    FogParams,
}

impl AutoConstant {
    /// The uniform name emitted for this constant.
    pub fn name(self) -> String {
        match self {
            AutoConstant::WorldViewProjMatrix => "worldviewproj_matrix".to_owned(),
            AutoConstant::WorldViewMatrix => "worldview_matrix".to_owned(),
            AutoConstant::InverseTransposeWorldViewMatrix => {
                "inverse_transpose_worldview_matrix".to_owned()
            }
            AutoConstant::AmbientLightColour => "ambient_light_colour".to_owned(),
            AutoConstant::DerivedAmbientLightColour => "derived_ambient_light_colour".to_owned(),
            AutoConstant::DerivedSceneColour => "derived_scene_colour".to_owned(),
            AutoConstant::SurfaceAmbientColour => "surface_ambient_colour".to_owned(),
            AutoConstant::SurfaceDiffuseColour => "surface_diffuse_colour".to_owned(),
            AutoConstant::SurfaceSpecularColour => "surface_specular_colour".to_owned(),
            AutoConstant::SurfaceEmissiveColour => "surface_emissive_colour".to_owned(),
            AutoConstant::SurfaceShininess => "surface_shininess".to_owned(),
            AutoConstant::TextureMatrix(unit) => format!("texture_matrix{unit}"),
            AutoConstant::FogColour => "fog_colour".to_owned(),
            AutoConstant::FogParams => "fog_params".to_owned(),
        }
    }

    pub const fn const_type(self) -> GpuConstantType {
        match self {
            AutoConstant::WorldViewProjMatrix
            | AutoConstant::WorldViewMatrix
            | AutoConstant::InverseTransposeWorldViewMatrix
            | AutoConstant::TextureMatrix(_) => GpuConstantType::Matrix4x4,
            AutoConstant::SurfaceShininess => GpuConstantType::Float1,
            _ => GpuConstantType::Float4,
        }
    }
}

/// A named, typed value in a generated program.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    name: String,
    const_type: GpuConstantType,
    semantic: Semantic,
    index: u32,
    content: Content,
    array_size: usize,
    auto_constant: Option<AutoConstant>,
}

impl Parameter {
    pub fn new(
        name: impl Into<String>,
        const_type: GpuConstantType,
        semantic: Semantic,
        index: u32,
        content: Content,
    ) -> Self {
        Self {
            name: name.into(),
            const_type,
            semantic,
            index,
            content,
            array_size: 1,
            auto_constant: None,
        }
    }

    /// A plain uniform with no semantic.
    pub fn uniform(name: impl Into<String>, const_type: GpuConstantType, index: u32) -> Self {
        Self::new(name, const_type, Semantic::Unknown, index, Content::Unknown)
    }

    /// A uniform bound to a renderer-supplied value.
    pub fn auto(constant: AutoConstant) -> Self {
        Self {
            auto_constant: Some(constant),
            ..Self::uniform(constant.name(), constant.const_type(), 0)
        }
    }

    pub fn with_array_size(mut self, array_size: usize) -> Self {
        self.array_size = array_size.max(1);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn const_type(&self) -> GpuConstantType {
        self.const_type
    }

    pub fn semantic(&self) -> Semantic {
        self.semantic
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn content(&self) -> Content {
        self.content
    }

    pub fn array_size(&self) -> usize {
        self.array_size
    }

    pub fn auto_constant(&self) -> Option<AutoConstant> {
        self.auto_constant
    }

    pub fn is_array(&self) -> bool {
        self.array_size > 1
    }

    /// `name.mask`, the way swizzled operands are written.
    pub fn swizzled(&self, mask: &str) -> String {
        format!("{}.{}", self.name, mask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_parameter_takes_constant_name_and_type() {
        let p = Parameter::auto(AutoConstant::TextureMatrix(2));
        assert_eq!(p.name(), "texture_matrix2");
        assert_eq!(p.const_type(), GpuConstantType::Matrix4x4);
        assert_eq!(p.auto_constant(), Some(AutoConstant::TextureMatrix(2)));
    }

    #[test]
    fn test_array_size_is_at_least_one() {
        let p = Parameter::uniform("x", GpuConstantType::Float4, 0).with_array_size(0);
        assert_eq!(p.array_size(), 1);
        assert!(!p.is_array());
        assert_eq!(p.swizzled("xyz"), "x.xyz");
    }
}
