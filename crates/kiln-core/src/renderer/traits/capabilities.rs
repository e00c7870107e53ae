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

use std::fmt::Debug;

/// Queries what the active device can compile.
pub trait RenderCapabilities: Send + Sync + Debug {
    /// Returns `true` if programs written for `profile` (for example
    /// `"vs_4_0"`, `"glsl150"`, `"arbfp1"`) can be compiled.
    fn is_syntax_supported(&self, profile: &str) -> bool;
}
