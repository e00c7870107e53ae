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

//! The semantic type tags of GPU program constants.
//!
//! Every type is identified by a stable numeric code whose high nibble is the
//! base type (float, int, double, ...) and whose low nibble selects the
//! vector width, matrix shape or sampler kind. The codes are part of the
//! microcode cache format and must not change.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The base category a [`GpuConstantType`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BaseConstantType {
    /// 32-bit floating point.
    Float,
    /// Signed 32-bit integer.
    Int,
    /// 64-bit floating point.
    Double,
    /// Unsigned 32-bit integer.
    Uint,
    /// Boolean, stored as a 32-bit integer.
    Bool,
    /// Texture sampler, bound through a register or unit index.
    Sampler,
    /// Specialization constant.
    Specialization,
    /// Unrecognised type.
    Unknown,
}

impl BaseConstantType {
    /// The high-nibble code of this base type.
    pub const fn code(&self) -> u32 {
        match self {
            BaseConstantType::Float => 0x00,
            BaseConstantType::Int => 0x10,
            BaseConstantType::Double => 0x20,
            BaseConstantType::Uint => 0x30,
            BaseConstantType::Bool => 0x40,
            BaseConstantType::Sampler => 0x50,
            BaseConstantType::Specialization => 0x60,
            BaseConstantType::Unknown => 0x70,
        }
    }

    /// Size in bytes of one scalar unit stored in a buffer of this category.
    pub const fn unit_bytes(&self) -> usize {
        match self {
            BaseConstantType::Double => 8,
            _ => 4,
        }
    }
}

/// The semantic type tag of a GPU program constant.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u32", try_from = "u32")]
#[repr(u32)]
pub enum GpuConstantType {
    Float1 = 0x01,
    Float2 = 0x02,
    Float3 = 0x03,
    Float4 = 0x04,
    Matrix2x2 = 0x05,
    Matrix2x3 = 0x06,
    Matrix2x4 = 0x07,
    Matrix3x2 = 0x08,
    Matrix3x3 = 0x09,
    Matrix3x4 = 0x0A,
    Matrix4x2 = 0x0B,
    Matrix4x3 = 0x0C,
    Matrix4x4 = 0x0D,

    Int1 = 0x11,
    Int2 = 0x12,
    Int3 = 0x13,
    Int4 = 0x14,

    Double1 = 0x21,
    Double2 = 0x22,
    Double3 = 0x23,
    Double4 = 0x24,
    MatrixDouble2x2 = 0x25,
    MatrixDouble2x3 = 0x26,
    MatrixDouble2x4 = 0x27,
    MatrixDouble3x2 = 0x28,
    MatrixDouble3x3 = 0x29,
    MatrixDouble3x4 = 0x2A,
    MatrixDouble4x2 = 0x2B,
    MatrixDouble4x3 = 0x2C,
    MatrixDouble4x4 = 0x2D,

    Uint1 = 0x31,
    Uint2 = 0x32,
    Uint3 = 0x33,
    Uint4 = 0x34,

    Bool1 = 0x41,
    Bool2 = 0x42,
    Bool3 = 0x43,
    Bool4 = 0x44,

    Sampler1D = 0x51,
    Sampler2D = 0x52,
    Sampler3D = 0x53,
    SamplerCube = 0x54,
    Sampler1DShadow = 0x56,
    Sampler2DShadow = 0x57,
    Sampler2DArray = 0x58,
    SamplerExternalOes = 0x59,
    Sampler2DArrayShadow = 0x5A,
    SamplerCubeShadow = 0x5B,

    Specialization = 0x60,
    Unknown = 0x70,
}

const ALL_TYPES: [GpuConstantType; 50] = {
    use GpuConstantType::*;
    [
        Float1, Float2, Float3, Float4, Matrix2x2, Matrix2x3, Matrix2x4, Matrix3x2, Matrix3x3,
        Matrix3x4, Matrix4x2, Matrix4x3, Matrix4x4, Int1, Int2, Int3, Int4, Double1, Double2,
        Double3, Double4, MatrixDouble2x2, MatrixDouble2x3, MatrixDouble2x4, MatrixDouble3x2,
        MatrixDouble3x3, MatrixDouble3x4, MatrixDouble4x2, MatrixDouble4x3, MatrixDouble4x4,
        Uint1, Uint2, Uint3, Uint4, Bool1, Bool2, Bool3, Bool4, Sampler1D, Sampler2D, Sampler3D,
        SamplerCube, Sampler1DShadow, Sampler2DShadow, Sampler2DArray, SamplerExternalOes,
        Sampler2DArrayShadow, SamplerCubeShadow, Specialization, Unknown,
    ]
};

impl GpuConstantType {
    /// The stable numeric code of this type.
    pub const fn code(self) -> u32 {
        self as u32
    }

    /// Looks a type up by its numeric code.
    pub fn from_code(code: u32) -> Option<Self> {
        ALL_TYPES.iter().copied().find(|t| t.code() == code)
    }

    /// The base category, derived from the high nibble of the code.
    pub const fn base_type(self) -> BaseConstantType {
        match self.code() & 0xF0 {
            0x00 => BaseConstantType::Float,
            0x10 => BaseConstantType::Int,
            0x20 => BaseConstantType::Double,
            0x30 => BaseConstantType::Uint,
            0x40 => BaseConstantType::Bool,
            0x50 => BaseConstantType::Sampler,
            0x60 => BaseConstantType::Specialization,
            _ => BaseConstantType::Unknown,
        }
    }

    /// Returns `true` for 32-bit float scalars, vectors and matrices.
    pub const fn is_float(self) -> bool {
        matches!(self.base_type(), BaseConstantType::Float)
    }

    /// Returns `true` for double scalars, vectors and matrices.
    pub const fn is_double(self) -> bool {
        matches!(self.base_type(), BaseConstantType::Double)
    }

    /// Returns `true` for signed integer types.
    pub const fn is_int(self) -> bool {
        matches!(self.base_type(), BaseConstantType::Int)
    }

    /// Returns `true` for unsigned integer types.
    pub const fn is_uint(self) -> bool {
        matches!(self.base_type(), BaseConstantType::Uint)
    }

    /// Returns `true` for boolean types.
    pub const fn is_bool(self) -> bool {
        matches!(self.base_type(), BaseConstantType::Bool)
    }

    /// Returns `true` for every sampler kind.
    pub const fn is_sampler(self) -> bool {
        matches!(self.base_type(), BaseConstantType::Sampler)
    }

    /// Returns `true` for float and double matrices.
    pub const fn is_matrix(self) -> bool {
        let low = self.code() & 0x0F;
        (self.is_float() || self.is_double()) && low >= 5
    }

    /// The number of scalar units one element of this type occupies.
    ///
    /// With `padded` set, every row is rounded up to four components, which
    /// is how HLSL and Cg registers are laid out. GLSL uses the tight size.
    pub const fn element_size(self, padded: bool) -> usize {
        use GpuConstantType::*;
        if padded {
            match self {
                Float1 | Float2 | Float3 | Float4 => 4,
                Int1 | Int2 | Int3 | Int4 => 4,
                Uint1 | Uint2 | Uint3 | Uint4 => 4,
                Bool1 | Bool2 | Bool3 | Bool4 => 4,
                Sampler1D | Sampler2D | Sampler3D | SamplerCube | Sampler1DShadow
                | Sampler2DShadow | Sampler2DArray | SamplerExternalOes
                | Sampler2DArrayShadow | SamplerCubeShadow => 4,
                Matrix2x2 | Matrix2x3 | Matrix2x4 => 8,
                Double1 | Double2 | Double3 | Double4 => 8,
                Matrix3x2 | Matrix3x3 | Matrix3x4 => 12,
                Matrix4x2 | Matrix4x3 | Matrix4x4 => 16,
                MatrixDouble2x2 | MatrixDouble2x3 | MatrixDouble2x4 => 16,
                MatrixDouble3x2 | MatrixDouble3x3 | MatrixDouble3x4 => 24,
                MatrixDouble4x2 | MatrixDouble4x3 | MatrixDouble4x4 => 32,
                Specialization | Unknown => 4,
            }
        } else {
            match self {
                Sampler1D | Sampler2D | Sampler3D | SamplerCube | Sampler1DShadow
                | Sampler2DShadow | Sampler2DArray | SamplerExternalOes
                | Sampler2DArrayShadow | SamplerCubeShadow => 1,
                Matrix2x2 | MatrixDouble2x2 => 4,
                Matrix2x3 | Matrix3x2 | MatrixDouble2x3 | MatrixDouble3x2 => 6,
                Matrix2x4 | Matrix4x2 | MatrixDouble2x4 | MatrixDouble4x2 => 8,
                Matrix3x3 | MatrixDouble3x3 => 9,
                Matrix3x4 | Matrix4x3 | MatrixDouble3x4 | MatrixDouble4x3 => 12,
                Matrix4x4 | MatrixDouble4x4 => 16,
                _ => (self.code() % 0x10) as usize,
            }
        }
    }
}

impl From<GpuConstantType> for u32 {
    fn from(value: GpuConstantType) -> Self {
        value.code()
    }
}

/// Returned when a numeric code does not name a [`GpuConstantType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownConstantCode(pub u32);

impl fmt::Display for UnknownConstantCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown GPU constant type code: {:#04x}", self.0)
    }
}

impl std::error::Error for UnknownConstantCode {}

impl TryFrom<u32> for GpuConstantType {
    type Error = UnknownConstantCode;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        GpuConstantType::from_code(value).ok_or(UnknownConstantCode(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_type_from_code() {
        assert_eq!(GpuConstantType::Float3.base_type(), BaseConstantType::Float);
        assert_eq!(GpuConstantType::Matrix4x4.base_type(), BaseConstantType::Float);
        assert_eq!(GpuConstantType::Int2.base_type(), BaseConstantType::Int);
        assert_eq!(
            GpuConstantType::MatrixDouble3x3.base_type(),
            BaseConstantType::Double
        );
        assert_eq!(GpuConstantType::Bool1.base_type(), BaseConstantType::Bool);
        assert_eq!(
            GpuConstantType::SamplerCube.base_type(),
            BaseConstantType::Sampler
        );
        assert_eq!(GpuConstantType::Unknown.base_type(), BaseConstantType::Unknown);
    }

    #[test]
    fn test_tight_element_sizes() {
        assert_eq!(GpuConstantType::Float1.element_size(false), 1);
        assert_eq!(GpuConstantType::Float3.element_size(false), 3);
        assert_eq!(GpuConstantType::Int4.element_size(false), 4);
        assert_eq!(GpuConstantType::Matrix2x3.element_size(false), 6);
        assert_eq!(GpuConstantType::Matrix3x3.element_size(false), 9);
        assert_eq!(GpuConstantType::Matrix4x3.element_size(false), 12);
        assert_eq!(GpuConstantType::Matrix4x4.element_size(false), 16);
        assert_eq!(GpuConstantType::MatrixDouble4x4.element_size(false), 16);
        assert_eq!(GpuConstantType::Sampler2D.element_size(false), 1);
    }

    #[test]
    fn test_padded_element_sizes() {
        assert_eq!(GpuConstantType::Float1.element_size(true), 4);
        assert_eq!(GpuConstantType::Matrix2x4.element_size(true), 8);
        assert_eq!(GpuConstantType::Matrix3x2.element_size(true), 12);
        assert_eq!(GpuConstantType::Matrix4x4.element_size(true), 16);
        assert_eq!(GpuConstantType::Double2.element_size(true), 8);
        assert_eq!(GpuConstantType::MatrixDouble3x4.element_size(true), 24);
        assert_eq!(GpuConstantType::MatrixDouble4x2.element_size(true), 32);
        assert_eq!(GpuConstantType::Sampler3D.element_size(true), 4);
    }

    #[test]
    fn test_code_lookup() {
        assert_eq!(
            GpuConstantType::from_code(0x0D),
            Some(GpuConstantType::Matrix4x4)
        );
        assert_eq!(
            GpuConstantType::from_code(0x5B),
            Some(GpuConstantType::SamplerCubeShadow)
        );
        assert_eq!(GpuConstantType::from_code(0x55), None);
        assert!(GpuConstantType::try_from(0x99).is_err());
    }

    #[test]
    fn test_matrix_classification() {
        assert!(GpuConstantType::Matrix2x2.is_matrix());
        assert!(GpuConstantType::MatrixDouble4x3.is_matrix());
        assert!(!GpuConstantType::Float4.is_matrix());
        assert!(!GpuConstantType::Sampler2DShadow.is_matrix());
    }
}
