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

//! # Kiln Shader
//!
//! Everything that happens to a shader source between the author and the
//! driver: C-style preprocessing, discovery of the constants it declares,
//! the Cg compile path and the cache of compiled microcode.

pub mod cache;
pub mod cg;
pub mod preprocessor;
pub mod uniforms;

pub use cache::{CacheError, MicrocodeCache, MicrocodeEntry, MicrocodeKey};
pub use cg::{CgError, CgProgram};
pub use preprocessor::{Preprocessor, PreprocessorError};
pub use uniforms::{extract_program_constants, extract_uniforms, ExtractionError};
