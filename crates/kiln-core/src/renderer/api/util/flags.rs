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

//! Flags describing how often a GPU constant changes.

use serde::{Deserialize, Serialize};

/// How frequently a constant's value varies during rendering.
///
/// Several frequencies can be combined with bitwise operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GpuParamVariability {
    bits: u16,
}

impl GpuParamVariability {
    /// No variability.
    pub const NONE: Self = Self { bits: 0 };
    /// No variation except by manual setting, the default.
    pub const GLOBAL: Self = Self { bits: 1 << 0 };
    /// Varies per object (based on an auto param usually).
    pub const PER_OBJECT: Self = Self { bits: 1 << 1 };
    /// Varies with light setup.
    pub const LIGHTS: Self = Self { bits: 1 << 2 };
    /// Varies with pass iteration number.
    pub const PASS_ITERATION_NUMBER: Self = Self { bits: 1 << 3 };
    /// Full mask.
    pub const ALL: Self = Self { bits: 0xFFFF };

    /// Creates a new set of flags from raw bits.
    pub const fn from_bits(bits: u16) -> Self {
        Self { bits }
    }

    /// Returns the raw bits.
    pub const fn bits(&self) -> u16 {
        self.bits
    }

    /// Combines two sets of flags.
    pub const fn union(self, other: Self) -> Self {
        Self {
            bits: self.bits | other.bits,
        }
    }

    /// Checks whether every bit of `other` is set in `self`.
    pub const fn contains(&self, other: Self) -> bool {
        (self.bits & other.bits) == other.bits
    }

    /// Checks if these flags are empty.
    pub const fn is_empty(&self) -> bool {
        self.bits == 0
    }
}

impl Default for GpuParamVariability {
    fn default() -> Self {
        Self::GLOBAL
    }
}

impl std::ops::BitOr for GpuParamVariability {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

impl std::ops::BitOrAssign for GpuParamVariability {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.union(rhs);
    }
}
