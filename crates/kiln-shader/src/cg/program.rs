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

//! The Cg program load path: profile, includes, compile, constants, cache.

use super::include::{expand_includes, IncludeResolver};
use super::names::recover_parameter_names;
use super::params::{build_constant_definitions, CgParameter};
use super::profile::{build_args, select_profile};
use super::CgError;
use crate::cache::{DelegateInfo, MicrocodeCache, MicrocodeEntry, MicrocodeKey};
use kiln_core::renderer::{GpuNamedConstants, RenderCapabilities, ShaderSettings};

/// What is handed to the Cg compiler.
#[derive(Debug, Clone, Copy)]
pub struct CgCompileRequest<'a> {
    pub label: &'a str,
    /// Source with includes already expanded.
    pub source: &'a str,
    pub profile: &'a str,
    pub entry_point: &'a str,
    pub args: &'a [String],
}

/// What the Cg compiler reports back.
#[derive(Debug, Clone, Default)]
pub struct CgCompileOutput {
    /// The compiled program in the profile's target language.
    pub program_string: String,
    pub program_params: Vec<CgParameter>,
    pub global_params: Vec<CgParameter>,
    /// Present when the profile targets a delegate high-level language.
    pub delegate: Option<DelegateInfo>,
}

/// Access to the Cg compiler and its reflection.
pub trait CgCompiler {
    fn compile(&self, request: &CgCompileRequest<'_>) -> Result<CgCompileOutput, CgError>;
}

/// A Cg program ready for the driver.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedCgProgram {
    pub profile: String,
    pub program_source: String,
    pub constants: GpuNamedConstants,
    pub delegate: Option<DelegateInfo>,
    /// `true` when the result came from the microcode cache.
    pub from_cache: bool,
}

/// A Cg source and the parameters it is compiled with.
#[derive(Debug, Clone)]
pub struct CgProgram {
    label: String,
    source: String,
    entry_point: String,
    profiles: Vec<String>,
    compile_args: String,
}

impl CgProgram {
    pub fn new(label: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            source: source.into(),
            entry_point: "main".to_owned(),
            profiles: Vec::new(),
            compile_args: String::new(),
        }
    }

    /// Sets the candidate profiles from a space separated list.
    pub fn with_profiles(mut self, profiles: &str) -> Self {
        self.profiles = profiles.split_whitespace().map(str::to_owned).collect();
        self
    }

    pub fn with_entry_point(mut self, entry_point: impl Into<String>) -> Self {
        self.entry_point = entry_point.into();
        self
    }

    pub fn with_compile_args(mut self, args: impl Into<String>) -> Self {
        self.compile_args = args.into();
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn profiles(&self) -> &[String] {
        &self.profiles
    }

    pub fn is_supported(&self, caps: &dyn RenderCapabilities) -> bool {
        super::profile::is_supported(&self.profiles, caps)
    }

    /// Compiles the program, or restores it from `cache`.
    ///
    /// A fresh compile is stored back into `cache` when one is given and
    /// `settings.use_microcode_cache` is set.
    pub fn load(
        &self,
        caps: &dyn RenderCapabilities,
        includes: &dyn IncludeResolver,
        compiler: &dyn CgCompiler,
        mut cache: Option<&mut MicrocodeCache>,
        settings: &ShaderSettings,
    ) -> Result<LoadedCgProgram, CgError> {
        let Some(profile) = select_profile(&self.profiles, caps) else {
            log::error!(
                "CgProgram({}): no supported profile among [{}]",
                self.label,
                self.profiles.join(" ")
            );
            return Err(CgError::NoSupportedProfile {
                label: self.label.clone(),
                candidates: self.profiles.clone(),
            });
        };
        let args = build_args(profile, &self.compile_args);
        let source = expand_includes(&self.source, &self.label, includes)?;

        let use_cache = settings.use_microcode_cache && cache.is_some();
        let key = MicrocodeKey::for_compilation(profile, &source, &self.entry_point, &args);
        if use_cache {
            if let Some(entry) = cache.as_deref().and_then(|c| c.get_or_decode(key)) {
                log::debug!("CgProgram({}): microcode cache hit", self.label);
                return Ok(LoadedCgProgram {
                    profile: profile.to_owned(),
                    constants: entry.to_named_constants(),
                    program_source: entry.program_source,
                    delegate: entry.delegate,
                    from_cache: true,
                });
            }
        }

        let output = compiler.compile(&CgCompileRequest {
            label: &self.label,
            source: &source,
            profile,
            entry_point: &self.entry_point,
            args: &args,
        })?;

        let program_source = if profile.starts_with("glsl") {
            recover_parameter_names(&output.program_string)
        } else {
            output.program_string
        };
        let constants = build_constant_definitions(
            &self.label,
            &output.program_params,
            &output.global_params,
            settings,
        )
        .named;
        log::info!(
            "CgProgram({}): compiled for {} with {} constants",
            self.label,
            profile,
            constants.len()
        );

        if use_cache {
            if let Some(cache) = cache.as_deref_mut() {
                let entry = MicrocodeEntry {
                    program_source: program_source.clone(),
                    parameters: constants
                        .iter()
                        .map(|(name, def)| (name.to_owned(), *def))
                        .collect(),
                    delegate: output.delegate.clone(),
                };
                cache.add(key, &entry)?;
            }
        }

        Ok(LoadedCgProgram {
            profile: profile.to_owned(),
            program_source,
            constants,
            delegate: output.delegate,
            from_cache: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cg::CgType;
    use std::cell::Cell;

    #[derive(Debug)]
    struct Caps;

    impl RenderCapabilities for Caps {
        fn is_syntax_supported(&self, profile: &str) -> bool {
            profile == "glslf"
        }
    }

    #[derive(Default)]
    struct FakeCompiler {
        calls: Cell<usize>,
    }

    impl CgCompiler for FakeCompiler {
        fn compile(&self, request: &CgCompileRequest<'_>) -> Result<CgCompileOutput, CgError> {
            self.calls.set(self.calls.get() + 1);
            assert!(request.source.contains("float4 helper"));
            Ok(CgCompileOutput {
                program_string: "//var float4 tint :  : _tint1 : 0 : 1\nuniform vec4 _tint1;\n"
                    .to_owned(),
                program_params: vec![CgParameter::uniform("tint", CgType::Float4, 0)],
                global_params: Vec::new(),
                delegate: None,
            })
        }
    }

    fn includes(file: &str) -> Option<String> {
        (file == "helper.cg").then(|| "float4 helper();".to_owned())
    }

    fn program() -> CgProgram {
        CgProgram::new("tint.cg", "#include \"helper.cg\"\nfloat4 main() : COLOR { return 0; }")
            .with_profiles("ps_2_0 glslf")
    }

    #[test]
    fn test_load_compiles_and_recovers_names() {
        let compiler = FakeCompiler::default();
        let loaded = program()
            .load(&Caps, &includes, &compiler, None, &ShaderSettings::default())
            .unwrap();
        assert_eq!(loaded.profile, "glslf");
        assert!(loaded.program_source.contains("uniform vec4 tint;"));
        assert!(loaded.constants.contains("tint"));
        assert!(!loaded.from_cache);
    }

    #[test]
    fn test_second_load_hits_cache() {
        let compiler = FakeCompiler::default();
        let mut cache = MicrocodeCache::new();
        let settings = ShaderSettings::default();

        let first = program()
            .load(&Caps, &includes, &compiler, Some(&mut cache), &settings)
            .unwrap();
        let second = program()
            .load(&Caps, &includes, &compiler, Some(&mut cache), &settings)
            .unwrap();

        assert_eq!(compiler.calls.get(), 1);
        assert!(second.from_cache);
        assert_eq!(second.program_source, first.program_source);
        assert_eq!(second.constants, first.constants);
    }

    #[derive(Debug)]
    struct VertexCaps;

    impl RenderCapabilities for VertexCaps {
        fn is_syntax_supported(&self, profile: &str) -> bool {
            profile == "glslv"
        }
    }

    /// Emits one line naming the entry point it compiled.
    #[derive(Default)]
    struct EntryCompiler {
        calls: Cell<usize>,
    }

    impl CgCompiler for EntryCompiler {
        fn compile(&self, request: &CgCompileRequest<'_>) -> Result<CgCompileOutput, CgError> {
            self.calls.set(self.calls.get() + 1);
            Ok(CgCompileOutput {
                program_string: format!("// compiled {}\n", request.entry_point),
                ..Default::default()
            })
        }
    }

    fn no_includes(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_entry_points_of_one_source_get_their_own_microcode() {
        let compiler = EntryCompiler::default();
        let mut cache = MicrocodeCache::new();
        let settings = ShaderSettings::default();
        let source = "float4 ambient_vp() : POSITION { return 0; }\n\
                      float4 diffuse_vp() : POSITION { return 0; }";
        let load = |entry: &str, args: &str, cache: &mut MicrocodeCache| {
            CgProgram::new("lighting.cg", source)
                .with_profiles("glslv")
                .with_entry_point(entry)
                .with_compile_args(args)
                .load(&VertexCaps, &no_includes, &compiler, Some(cache), &settings)
                .unwrap()
        };

        let ambient = load("ambient_vp", "", &mut cache);
        let diffuse = load("diffuse_vp", "", &mut cache);
        assert_eq!(ambient.program_source, "// compiled ambient_vp\n");
        assert_eq!(diffuse.program_source, "// compiled diffuse_vp\n");
        assert!(!diffuse.from_cache);
        assert_eq!(cache.len(), 2);

        let optimised = load("diffuse_vp", "-O3", &mut cache);
        assert!(!optimised.from_cache);
        assert_eq!(compiler.calls.get(), 3);

        let again = load("ambient_vp", "", &mut cache);
        assert!(again.from_cache);
        assert_eq!(again.program_source, "// compiled ambient_vp\n");
        assert_eq!(compiler.calls.get(), 3);
    }

    #[test]
    fn test_no_supported_profile() {
        let err = CgProgram::new("x.cg", "")
            .with_profiles("vs_4_0 arbvp1")
            .load(
                &Caps,
                &includes,
                &FakeCompiler::default(),
                None,
                &ShaderSettings::default(),
            )
            .unwrap_err();
        assert!(matches!(err, CgError::NoSupportedProfile { ref candidates, .. } if candidates.len() == 2));
    }
}
