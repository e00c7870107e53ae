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

//! Order-dependent hash folding for composed render state.
//!
//! Hash codes built with [`hash_combine`] must be identical across runs and
//! platforms because they key program caches, so only fixed-width wrapping
//! arithmetic is used here.

/// Folds `value` into `seed` with the classic golden-ratio mix.
///
/// The fold is not commutative: combining `a` then `b` generally differs
/// from combining `b` then `a`.
#[inline]
pub fn hash_combine(seed: &mut u32, value: u32) {
    *seed ^= value
        .wrapping_add(0x9e37_79b9)
        .wrapping_add(*seed << 6)
        .wrapping_add(*seed >> 2);
}

/// Convenience wrapper for folding a boolean flag.
#[inline]
pub fn hash_combine_bool(seed: &mut u32, value: bool) {
    hash_combine(seed, value as u32);
}

/// Convenience wrapper for folding a signed integer.
#[inline]
pub fn hash_combine_i32(seed: &mut u32, value: i32) {
    hash_combine(seed, value as u32);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combine_is_deterministic() {
        let mut a = 0;
        let mut b = 0;
        for v in [1u32, 2, 3, 400] {
            hash_combine(&mut a, v);
            hash_combine(&mut b, v);
        }
        assert_eq!(a, b);
    }

    #[test]
    fn test_combine_is_order_dependent() {
        let mut a = 0;
        hash_combine(&mut a, 1);
        hash_combine(&mut a, 2);

        let mut b = 0;
        hash_combine(&mut b, 2);
        hash_combine(&mut b, 1);

        assert_ne!(a, b);
    }

    #[test]
    fn test_combine_from_zero_seed() {
        let mut seed = 0;
        hash_combine(&mut seed, 0);
        assert_eq!(seed, 0x9e37_79b9);
    }
}
