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

//! Translation of GLSL type names and GL type enums to [`GpuConstantType`].

use ahash::AHashMap;
use kiln_core::renderer::GpuConstantType;
use std::sync::OnceLock;

/// GL type enums reported by program reflection.
#[allow(missing_docs)]
pub mod gl {
    pub const FLOAT: u32 = 0x1406;
    pub const FLOAT_VEC2: u32 = 0x8B50;
    pub const FLOAT_VEC3: u32 = 0x8B51;
    pub const FLOAT_VEC4: u32 = 0x8B52;
    pub const INT: u32 = 0x1404;
    pub const INT_VEC2: u32 = 0x8B53;
    pub const INT_VEC3: u32 = 0x8B54;
    pub const INT_VEC4: u32 = 0x8B55;
    pub const BOOL: u32 = 0x8B56;
    pub const BOOL_VEC2: u32 = 0x8B57;
    pub const BOOL_VEC3: u32 = 0x8B58;
    pub const BOOL_VEC4: u32 = 0x8B59;
    pub const FLOAT_MAT2: u32 = 0x8B5A;
    pub const FLOAT_MAT3: u32 = 0x8B5B;
    pub const FLOAT_MAT4: u32 = 0x8B5C;
    pub const SAMPLER_1D: u32 = 0x8B5D;
    pub const SAMPLER_2D: u32 = 0x8B5E;
    pub const SAMPLER_3D: u32 = 0x8B5F;
    pub const SAMPLER_CUBE: u32 = 0x8B60;
    pub const SAMPLER_1D_SHADOW: u32 = 0x8B61;
    pub const SAMPLER_2D_SHADOW: u32 = 0x8B62;
    pub const SAMPLER_2D_RECT: u32 = 0x8B63;
    pub const SAMPLER_2D_RECT_SHADOW: u32 = 0x8B64;
    pub const FLOAT_MAT2X3: u32 = 0x8B65;
    pub const FLOAT_MAT2X4: u32 = 0x8B66;
    pub const FLOAT_MAT3X2: u32 = 0x8B67;
    pub const FLOAT_MAT3X4: u32 = 0x8B68;
    pub const FLOAT_MAT4X2: u32 = 0x8B69;
    pub const FLOAT_MAT4X3: u32 = 0x8B6A;
    pub const SAMPLER_EXTERNAL_OES: u32 = 0x8D66;
    pub const SAMPLER_1D_ARRAY: u32 = 0x8DC0;
    pub const SAMPLER_2D_ARRAY: u32 = 0x8DC1;
    pub const SAMPLER_BUFFER: u32 = 0x8DC2;
    pub const SAMPLER_1D_ARRAY_SHADOW: u32 = 0x8DC3;
    pub const SAMPLER_2D_ARRAY_SHADOW: u32 = 0x8DC4;
    pub const SAMPLER_CUBE_SHADOW: u32 = 0x8DC5;
    pub const UNSIGNED_INT: u32 = 0x1405;
    pub const UNSIGNED_INT_VEC2: u32 = 0x8DC6;
    pub const UNSIGNED_INT_VEC3: u32 = 0x8DC7;
    pub const UNSIGNED_INT_VEC4: u32 = 0x8DC8;
    pub const INT_SAMPLER_1D: u32 = 0x8DC9;
    pub const INT_SAMPLER_2D: u32 = 0x8DCA;
    pub const INT_SAMPLER_3D: u32 = 0x8DCB;
    pub const INT_SAMPLER_CUBE: u32 = 0x8DCC;
    pub const INT_SAMPLER_2D_RECT: u32 = 0x8DCD;
    pub const INT_SAMPLER_1D_ARRAY: u32 = 0x8DCE;
    pub const INT_SAMPLER_2D_ARRAY: u32 = 0x8DCF;
    pub const UNSIGNED_INT_SAMPLER_1D: u32 = 0x8DD1;
    pub const UNSIGNED_INT_SAMPLER_2D: u32 = 0x8DD2;
    pub const UNSIGNED_INT_SAMPLER_3D: u32 = 0x8DD3;
    pub const UNSIGNED_INT_SAMPLER_CUBE: u32 = 0x8DD4;
    pub const UNSIGNED_INT_SAMPLER_2D_RECT: u32 = 0x8DD5;
    pub const UNSIGNED_INT_SAMPLER_1D_ARRAY: u32 = 0x8DD6;
    pub const UNSIGNED_INT_SAMPLER_2D_ARRAY: u32 = 0x8DD7;
    pub const DOUBLE: u32 = 0x140A;
    pub const DOUBLE_VEC2: u32 = 0x8FFC;
    pub const DOUBLE_VEC3: u32 = 0x8FFD;
    pub const DOUBLE_VEC4: u32 = 0x8FFE;
    pub const DOUBLE_MAT2: u32 = 0x8F46;
    pub const DOUBLE_MAT3: u32 = 0x8F47;
    pub const DOUBLE_MAT4: u32 = 0x8F48;
    pub const DOUBLE_MAT2X3: u32 = 0x8F49;
    pub const DOUBLE_MAT2X4: u32 = 0x8F4A;
    pub const DOUBLE_MAT3X2: u32 = 0x8F4B;
    pub const DOUBLE_MAT3X4: u32 = 0x8F4C;
    pub const DOUBLE_MAT4X2: u32 = 0x8F4D;
    pub const DOUBLE_MAT4X3: u32 = 0x8F4E;
    pub const IMAGE_1D: u32 = 0x904C;
    pub const IMAGE_2D: u32 = 0x904D;
    pub const IMAGE_3D: u32 = 0x904E;
    pub const IMAGE_2D_RECT: u32 = 0x904F;
    pub const UNSIGNED_INT_ATOMIC_COUNTER: u32 = 0x92DB;
}

/// Maps a driver type enum to a constant type. Unlisted enums map to
/// [`GpuConstantType::Unknown`].
pub fn gl_enum_type(gl_type: u32) -> GpuConstantType {
    use GpuConstantType::*;
    match gl_type {
        gl::FLOAT => Float1,
        gl::FLOAT_VEC2 => Float2,
        gl::FLOAT_VEC3 => Float3,
        gl::FLOAT_VEC4 => Float4,
        gl::IMAGE_1D
        | gl::SAMPLER_1D
        | gl::SAMPLER_1D_ARRAY
        | gl::INT_SAMPLER_1D
        | gl::INT_SAMPLER_1D_ARRAY
        | gl::UNSIGNED_INT_SAMPLER_1D
        | gl::UNSIGNED_INT_SAMPLER_1D_ARRAY
        | gl::SAMPLER_BUFFER => Sampler1D,
        gl::IMAGE_2D
        | gl::IMAGE_2D_RECT
        | gl::SAMPLER_2D
        | gl::SAMPLER_2D_RECT
        | gl::INT_SAMPLER_2D_RECT
        | gl::UNSIGNED_INT_SAMPLER_2D_RECT
        | gl::INT_SAMPLER_2D
        | gl::UNSIGNED_INT_SAMPLER_2D => Sampler2D,
        gl::SAMPLER_2D_ARRAY | gl::INT_SAMPLER_2D_ARRAY | gl::UNSIGNED_INT_SAMPLER_2D_ARRAY => {
            Sampler2DArray
        }
        gl::IMAGE_3D | gl::SAMPLER_3D | gl::INT_SAMPLER_3D | gl::UNSIGNED_INT_SAMPLER_3D => {
            Sampler3D
        }
        gl::SAMPLER_CUBE | gl::INT_SAMPLER_CUBE | gl::UNSIGNED_INT_SAMPLER_CUBE => SamplerCube,
        gl::SAMPLER_CUBE_SHADOW => SamplerCubeShadow,
        gl::SAMPLER_1D_SHADOW | gl::SAMPLER_1D_ARRAY_SHADOW => Sampler1DShadow,
        gl::SAMPLER_2D_SHADOW | gl::SAMPLER_2D_RECT_SHADOW => Sampler2DShadow,
        gl::SAMPLER_2D_ARRAY_SHADOW => Sampler2DArrayShadow,
        gl::SAMPLER_EXTERNAL_OES => SamplerExternalOes,
        gl::INT => Int1,
        gl::INT_VEC2 => Int2,
        gl::INT_VEC3 => Int3,
        gl::INT_VEC4 => Int4,
        gl::FLOAT_MAT2 => Matrix2x2,
        gl::FLOAT_MAT3 => Matrix3x3,
        gl::FLOAT_MAT4 => Matrix4x4,
        gl::FLOAT_MAT2X3 => Matrix2x3,
        gl::FLOAT_MAT3X2 => Matrix3x2,
        gl::FLOAT_MAT2X4 => Matrix2x4,
        gl::FLOAT_MAT4X2 => Matrix4x2,
        gl::FLOAT_MAT3X4 => Matrix3x4,
        gl::FLOAT_MAT4X3 => Matrix4x3,
        gl::DOUBLE => Double1,
        gl::DOUBLE_VEC2 => Double2,
        gl::DOUBLE_VEC3 => Double3,
        gl::DOUBLE_VEC4 => Double4,
        gl::DOUBLE_MAT2 => MatrixDouble2x2,
        gl::DOUBLE_MAT3 => MatrixDouble3x3,
        gl::DOUBLE_MAT4 => MatrixDouble4x4,
        gl::DOUBLE_MAT2X3 => MatrixDouble2x3,
        gl::DOUBLE_MAT3X2 => MatrixDouble3x2,
        gl::DOUBLE_MAT2X4 => MatrixDouble2x4,
        gl::DOUBLE_MAT4X2 => MatrixDouble4x2,
        gl::DOUBLE_MAT3X4 => MatrixDouble3x4,
        gl::DOUBLE_MAT4X3 => MatrixDouble4x3,
        gl::UNSIGNED_INT | gl::UNSIGNED_INT_ATOMIC_COUNTER => Uint1,
        gl::UNSIGNED_INT_VEC2 => Uint2,
        gl::UNSIGNED_INT_VEC3 => Uint3,
        gl::UNSIGNED_INT_VEC4 => Uint4,
        gl::BOOL => Bool1,
        gl::BOOL_VEC2 => Bool2,
        gl::BOOL_VEC3 => Bool3,
        gl::BOOL_VEC4 => Bool4,
        _ => Unknown,
    }
}

/// Looks up a GLSL type keyword.
pub fn glsl_type(name: &str) -> Option<GpuConstantType> {
    static TABLE: OnceLock<AHashMap<&'static str, GpuConstantType>> = OnceLock::new();
    TABLE.get_or_init(build_glsl_table).get(name).copied()
}

fn build_glsl_table() -> AHashMap<&'static str, GpuConstantType> {
    use GpuConstantType::*;
    let mut table = AHashMap::new();
    let mut add = |names: &[&'static str], ty: GpuConstantType| {
        for name in names {
            table.insert(*name, ty);
        }
    };

    add(&["float"], Float1);
    add(&["vec2"], Float2);
    add(&["vec3"], Float3);
    add(&["vec4"], Float4);
    add(&["int"], Int1);
    add(&["ivec2"], Int2);
    add(&["ivec3"], Int3);
    add(&["ivec4"], Int4);
    add(&["uint", "atomic_uint"], Uint1);
    add(&["uvec2"], Uint2);
    add(&["uvec3"], Uint3);
    add(&["uvec4"], Uint4);
    add(&["bool"], Bool1);
    add(&["bvec2"], Bool2);
    add(&["bvec3"], Bool3);
    add(&["bvec4"], Bool4);
    add(&["double"], Double1);
    add(&["dvec2"], Double2);
    add(&["dvec3"], Double3);
    add(&["dvec4"], Double4);

    add(&["mat2", "mat2x2"], Matrix2x2);
    add(&["mat3", "mat3x3"], Matrix3x3);
    add(&["mat4", "mat4x4"], Matrix4x4);
    add(&["mat2x3"], Matrix2x3);
    add(&["mat3x2"], Matrix3x2);
    add(&["mat2x4"], Matrix2x4);
    add(&["mat4x2"], Matrix4x2);
    add(&["mat3x4"], Matrix3x4);
    add(&["mat4x3"], Matrix4x3);
    add(&["dmat2", "dmat2x2"], MatrixDouble2x2);
    add(&["dmat3", "dmat3x3"], MatrixDouble3x3);
    add(&["dmat4", "dmat4x4"], MatrixDouble4x4);
    add(&["dmat2x3"], MatrixDouble2x3);
    add(&["dmat3x2"], MatrixDouble3x2);
    add(&["dmat2x4"], MatrixDouble2x4);
    add(&["dmat4x2"], MatrixDouble4x2);
    add(&["dmat3x4"], MatrixDouble3x4);
    add(&["dmat4x3"], MatrixDouble4x3);

    add(
        &[
            "sampler1D",
            "isampler1D",
            "usampler1D",
            "samplerBuffer",
            "isamplerBuffer",
            "usamplerBuffer",
            "image1D",
            "iimage1D",
            "uimage1D",
            "imageBuffer",
            "iimageBuffer",
            "uimageBuffer",
        ],
        Sampler1D,
    );
    add(
        &[
            "sampler2D",
            "isampler2D",
            "usampler2D",
            "sampler2DRect",
            "sampler2DRectShadow",
            "isampler2DRect",
            "usampler2DRect",
            "sampler2DMS",
            "isampler2DMS",
            "usampler2DMS",
            "image2D",
            "iimage2D",
            "uimage2D",
            "image2DRect",
            "iimage2DRect",
            "uimage2DRect",
            "image2DMS",
            "iimage2DMS",
            "uimage2DMS",
        ],
        Sampler2D,
    );
    add(
        &["sampler3D", "isampler3D", "usampler3D", "image3D", "iimage3D", "uimage3D"],
        Sampler3D,
    );
    add(
        &[
            "samplerCube",
            "isamplerCube",
            "usamplerCube",
            "samplerCubeShadow",
            "imageCube",
            "iimageCube",
            "uimageCube",
        ],
        SamplerCube,
    );
    add(&["sampler1DShadow"], Sampler1DShadow);
    add(&["sampler2DShadow"], Sampler2DShadow);
    add(
        &[
            "sampler1DArray",
            "sampler2DArray",
            "sampler1DArrayShadow",
            "sampler2DArrayShadow",
            "isampler1DArray",
            "isampler2DArray",
            "usampler1DArray",
            "usampler2DArray",
            "sampler2DMSArray",
            "isampler2DMSArray",
            "usampler2DMSArray",
            "samplerCubeArray",
            "samplerCubeArrayShadow",
            "isamplerCubeArray",
            "usamplerCubeArray",
            "image1DArray",
            "iimage1DArray",
            "uimage1DArray",
            "image2DArray",
            "iimage2DArray",
            "uimage2DArray",
            "imageCubeArray",
            "iimageCubeArray",
            "uimageCubeArray",
            "image2DMSArray",
            "iimage2DMSArray",
            "uimage2DMSArray",
        ],
        Sampler2DArray,
    );
    add(&["samplerExternalOES"], SamplerExternalOes);
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glsl_names() {
        assert_eq!(glsl_type("vec3"), Some(GpuConstantType::Float3));
        assert_eq!(glsl_type("mat4"), Some(GpuConstantType::Matrix4x4));
        assert_eq!(glsl_type("mat2x3"), Some(GpuConstantType::Matrix2x3));
        assert_eq!(glsl_type("dmat3x4"), Some(GpuConstantType::MatrixDouble3x4));
        assert_eq!(glsl_type("usampler2DArray"), Some(GpuConstantType::Sampler2DArray));
        assert_eq!(glsl_type("samplerExternalOES"), Some(GpuConstantType::SamplerExternalOes));
        assert_eq!(glsl_type("atomic_uint"), Some(GpuConstantType::Uint1));
        assert_eq!(glsl_type("Light"), None);
    }

    #[test]
    fn test_gl_enums() {
        assert_eq!(gl_enum_type(gl::FLOAT_VEC4), GpuConstantType::Float4);
        assert_eq!(gl_enum_type(gl::FLOAT_MAT3X2), GpuConstantType::Matrix3x2);
        assert_eq!(gl_enum_type(gl::INT_SAMPLER_2D), GpuConstantType::Sampler2D);
        assert_eq!(gl_enum_type(gl::DOUBLE_MAT4), GpuConstantType::MatrixDouble4x4);
        assert_eq!(gl_enum_type(gl::UNSIGNED_INT_ATOMIC_COUNTER), GpuConstantType::Uint1);
        assert_eq!(gl_enum_type(0xDEAD), GpuConstantType::Unknown);
    }

    #[test]
    fn test_every_table_entry_has_a_type() {
        for name in ["float", "bvec4", "sampler2DShadow", "imageCubeArray"] {
            assert!(glsl_type(name).is_some(), "{name}");
        }
    }
}
