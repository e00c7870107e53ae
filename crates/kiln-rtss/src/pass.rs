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

//! Fixed-function material state that render states are derived from, and
//! the per-frame data fragments read when updating their parameters.

use ahash::AHashMap;

/// Which surface colours come from the vertex colour instead of the
/// material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TrackVertexColour {
    bits: u8,
}

impl TrackVertexColour {
    pub const NONE: Self = Self { bits: 0 };
    pub const AMBIENT: Self = Self { bits: 1 << 0 };
    pub const DIFFUSE: Self = Self { bits: 1 << 1 };
    pub const SPECULAR: Self = Self { bits: 1 << 2 };
    pub const EMISSIVE: Self = Self { bits: 1 << 3 };

    pub const fn from_bits(bits: u8) -> Self {
        Self { bits: bits & 0x0F }
    }

    pub const fn bits(&self) -> u8 {
        self.bits
    }

    pub const fn contains(&self, other: Self) -> bool {
        (self.bits & other.bits) == other.bits && other.bits != 0
    }
}

impl std::ops::BitOr for TrackVertexColour {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self {
            bits: self.bits | rhs.bits,
        }
    }
}

/// Light categories. The discriminant indexes `[point, directional, spot]`
/// max light count arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LightType {
    Point = 0,
    Directional = 1,
    Spotlight = 2,
}

impl LightType {
    pub const ALL: [LightType; 3] = [LightType::Point, LightType::Directional, LightType::Spotlight];
}

/// One scene light, already expressed in view space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightDescription {
    pub light_type: LightType,
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
    pub position: [f32; 4],
    pub direction: [f32; 4],
    /// Range, constant, linear, quadratic.
    pub attenuation: [f32; 4],
    /// Cosine of half the inner angle, cosine of half the outer angle,
    /// falloff.
    pub spot: [f32; 3],
}

impl LightDescription {
    /// A light that contributes nothing, used for unfilled light slots.
    pub const BLANK: LightDescription = LightDescription {
        light_type: LightType::Directional,
        diffuse: [0.0, 0.0, 0.0, 1.0],
        specular: [0.0, 0.0, 0.0, 1.0],
        position: [0.0, 0.0, 1.0, 0.0],
        direction: [0.0, 0.0, -1.0, 0.0],
        attenuation: [0.0, 1.0, 0.0, 0.0],
        spot: [1.0, 1.0, 0.0],
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureType {
    Texture1D,
    #[default]
    Texture2D,
    Texture3D,
    CubeMap,
}

/// How a texture unit derives its coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TexCoordCalc {
    #[default]
    None,
    EnvironmentMapSphere,
    EnvironmentMapReflection,
    EnvironmentMapNormal,
    Projective,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LayerBlendSource {
    #[default]
    Current,
    Texture,
    Diffuse,
    Specular,
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LayerBlendOperation {
    Source1,
    Source2,
    #[default]
    Modulate,
    ModulateX2,
    ModulateX4,
    Add,
    AddSigned,
    AddSmooth,
    Subtract,
    BlendDiffuseAlpha,
    BlendTextureAlpha,
    BlendCurrentAlpha,
    BlendManual,
    DotProduct,
}

/// A texture unit's blend equation for either colour or alpha.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerBlend {
    pub operation: LayerBlendOperation,
    pub source1: LayerBlendSource,
    pub source2: LayerBlendSource,
    pub colour_arg1: [f32; 4],
    pub colour_arg2: [f32; 4],
    pub alpha_arg1: f32,
    pub alpha_arg2: f32,
    pub factor: f32,
}

impl Default for LayerBlend {
    fn default() -> Self {
        Self {
            operation: LayerBlendOperation::Modulate,
            source1: LayerBlendSource::Texture,
            source2: LayerBlendSource::Current,
            colour_arg1: [1.0; 4],
            colour_arg2: [1.0; 4],
            alpha_arg1: 1.0,
            alpha_arg2: 1.0,
            factor: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TextureUnitDescription {
    pub texture_type: TextureType,
    pub coord_set: u32,
    pub tex_coord_calc: TexCoordCalc,
    /// Whether the unit carries a texture matrix.
    pub has_transform: bool,
    pub colour_blend: LayerBlend,
    pub alpha_blend: LayerBlend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FogMode {
    #[default]
    None,
    Linear,
    Exp,
    Exp2,
}

/// The fixed-function state of one material pass.
#[derive(Debug, Clone, PartialEq)]
pub struct PassDescription {
    pub lighting_enabled: bool,
    pub track_vertex_colour: TrackVertexColour,
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
    pub emissive: [f32; 4],
    pub shininess: f32,
    pub fog_mode: FogMode,
    pub fog_colour: [f32; 4],
    /// Density, start, end.
    pub fog_params: [f32; 3],
    pub texture_units: Vec<TextureUnitDescription>,
}

impl Default for PassDescription {
    fn default() -> Self {
        Self {
            lighting_enabled: true,
            track_vertex_colour: TrackVertexColour::NONE,
            ambient: [1.0; 4],
            diffuse: [1.0; 4],
            specular: [0.0, 0.0, 0.0, 1.0],
            emissive: [0.0, 0.0, 0.0, 1.0],
            shininess: 0.0,
            fog_mode: FogMode::None,
            fog_colour: [1.0; 4],
            fog_params: [0.001, 0.0, 1.0],
            texture_units: Vec::new(),
        }
    }
}

impl PassDescription {
    /// Specular lighting is only generated for a non-black specular colour
    /// with some shininess.
    pub fn specular_enabled(&self) -> bool {
        self.shininess > 0.0 && self.specular[..3].iter().any(|c| *c != 0.0)
    }
}

/// What a render state is updated with before an object is drawn.
#[derive(Debug, Clone, Copy)]
pub struct FrameContext<'a> {
    pub pass: &'a PassDescription,
    /// Lights affecting the object, closest first.
    pub lights: &'a [LightDescription],
}

/// Named uniform values written by sub render states.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgramParameters {
    values: AHashMap<String, [f32; 4]>,
}

impl ProgramParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_named(&mut self, name: &str, value: [f32; 4]) {
        self.values.insert(name.to_owned(), value);
    }

    pub fn get(&self, name: &str) -> Option<[f32; 4]> {
        self.values.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Component-wise product of two colours.
pub(crate) fn modulate(a: [f32; 4], b: [f32; 4]) -> [f32; 4] {
    [a[0] * b[0], a[1] * b[1], a[2] * b[2], a[3] * b[3]]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_vertex_colour_flags() {
        let t = TrackVertexColour::DIFFUSE | TrackVertexColour::SPECULAR;
        assert!(t.contains(TrackVertexColour::DIFFUSE));
        assert!(!t.contains(TrackVertexColour::AMBIENT));
        assert!(!t.contains(TrackVertexColour::NONE));
        assert_eq!(TrackVertexColour::from_bits(0xFF).bits(), 0x0F);
    }

    #[test]
    fn test_specular_enabled() {
        let mut pass = PassDescription::default();
        assert!(!pass.specular_enabled());
        pass.specular = [1.0, 1.0, 1.0, 1.0];
        assert!(!pass.specular_enabled());
        pass.shininess = 32.0;
        assert!(pass.specular_enabled());
    }

    #[test]
    fn test_program_parameters() {
        let mut params = ProgramParameters::new();
        params.set_named("tint", [1.0, 0.5, 0.0, 1.0]);
        params.set_named("tint", [0.0; 4]);
        assert_eq!(params.len(), 1);
        assert_eq!(params.get("tint"), Some([0.0; 4]));
        assert_eq!(params.get("missing"), None);
    }
}
