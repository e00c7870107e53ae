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

//! Global settings for shader processing.

/// A collection of settings that affect preprocessing, constant extraction
/// and program generation.
#[derive(Debug, Clone)]
pub struct ShaderSettings {
    /// Upper bound on how many times a macro body is rescanned while
    /// looking for a fixed point.
    pub max_rescan_iterations: usize,
    /// Arrays up to this length get one `name[i]` constant entry per element.
    pub array_entry_limit: usize,
    /// If `true`, per-element entries are generated for arrays of any length.
    pub generate_all_array_entries: bool,
    /// If `true`, compiled programs are stored in and restored from the
    /// microcode cache.
    pub use_microcode_cache: bool,
    /// `#version` emitted by the desktop GLSL program writer.
    pub glsl_version: u32,
    /// `#version` emitted by the GLSL ES program writer.
    pub glsl_es_version: u32,
}

impl Default for ShaderSettings {
    fn default() -> Self {
        Self {
            max_rescan_iterations: 64,
            array_entry_limit: 16,
            generate_all_array_entries: false,
            use_microcode_cache: true,
            glsl_version: 150,
            glsl_es_version: 100,
        }
    }
}
