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

//! Support for programs written in Cg.
//!
//! The Cg compiler itself is reached through the [`CgCompiler`] trait. This
//! module prepares its input (profile, arguments, includes), maps the
//! parameters it reflects to GPU constants, and repairs the names in
//! source it emits for a delegate language.

mod include;
mod names;
mod params;
mod profile;
mod program;

pub use include::{expand_includes, IncludeResolver};
pub use names::{recover_parameter_names, replace_identifier};
pub use params::{
    build_constant_definitions, CgConstants, CgDirection, CgParameter, CgType, CgVariability,
};
pub use profile::{build_args, is_supported, select_profile};
pub use program::{CgCompileOutput, CgCompileRequest, CgCompiler, CgProgram, LoadedCgProgram};

use crate::cache::CacheError;

/// An error raised while preparing or compiling a Cg program.
#[derive(Debug, thiserror::Error)]
pub enum CgError {
    #[error("Badly formed #include directive (expected {expected}) in {label}: {line}")]
    BadInclude {
        label: String,
        expected: &'static str,
        line: String,
    },
    #[error("Cannot open '{file}' included from {label}")]
    IncludeNotFound { label: String, file: String },
    #[error("No supported Cg profile for {label} among: {}", candidates.join(", "))]
    NoSupportedProfile {
        label: String,
        candidates: Vec<String>,
    },
    #[error("Unable to compile Cg program {label}: {details}")]
    Compile { label: String, details: String },
    #[error(transparent)]
    Cache(#[from] CacheError),
}
