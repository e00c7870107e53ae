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

//! Discovery of a program's uniforms.
//!
//! Two sources are combined: a scan of the preprocessed GLSL text, which
//! yields the constant layout, and the driver's reflection of the linked
//! program, which yields locations and uniform block bindings.

mod reflection;
mod source;
pub mod types;

pub use reflection::{
    constants_from_reflection, extract_uniforms, ExtractedUniforms, GLUniformBuffer,
    GLUniformReference, SharedParameterBindings, StageConstants,
};
pub use source::{extract_from_source, extract_program_constants};
pub use types::{gl, gl_enum_type, glsl_type};

use kiln_core::renderer::ResourceError;

/// An error raised while extracting uniforms.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    /// A uniform block declaration lacks its opening or closing brace.
    #[error("Missing brace in GLSL uniform block '{block}' in {label}")]
    MissingBlockBrace { label: String, block: String },
    /// A uniform declaration is not terminated.
    #[error("Missing ';' after GLSL uniform declaration in {label}")]
    MissingSemicolon { label: String },
    /// An array dimension is not an integer literal.
    #[error("Invalid array size in GLSL uniform '{declaration}' in {label}")]
    InvalidArraySize { label: String, declaration: String },
    /// The driver failed while binding uniform blocks.
    #[error("Driver error during uniform extraction: {0}")]
    Driver(#[from] ResourceError),
}
