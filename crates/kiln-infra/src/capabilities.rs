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

use kiln_core::renderer::{RenderCapabilities, ShaderSettings};
use std::collections::BTreeSet;

const GLSL_VERSIONS: &[u32] = &[
    100, 110, 120, 130, 140, 150, 330, 400, 410, 420, 430, 440, 450, 460,
];
const GLSL_ES_VERSIONS: &[u32] = &[100, 300, 310, 320];

/// A fixed table of profile names the device accepts.
///
/// Desktop GLSL devices report `glsl` plus one `glsl{N}` entry for every
/// language version up to the native one; ES devices do the same under
/// `glsles`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticCapabilities {
    profiles: BTreeSet<String>,
}

impl StaticCapabilities {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_profiles<I, S>(profiles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            profiles: profiles.into_iter().map(Into::into).collect(),
        }
    }

    /// A desktop GL device whose native GLSL version is `version`.
    pub fn glsl(version: u32) -> Self {
        let mut caps = Self::from_profiles(["glsl"]);
        caps.add_versions("glsl", GLSL_VERSIONS, version);
        caps
    }

    /// An OpenGL ES device whose native GLSL ES version is `version`.
    pub fn glsl_es(version: u32) -> Self {
        let mut caps = Self::from_profiles(["glsles"]);
        caps.add_versions("glsl", GLSL_ES_VERSIONS, version);
        caps
    }

    /// Capabilities matching the versions the program writer targets.
    pub fn for_settings(settings: &ShaderSettings) -> Self {
        let mut caps = Self::glsl(settings.glsl_version);
        caps.profiles.insert("glsles".to_owned());
        caps.add_versions("glsl", GLSL_ES_VERSIONS, settings.glsl_es_version);
        caps
    }

    fn add_versions(&mut self, prefix: &str, table: &[u32], max: u32) {
        for v in table.iter().filter(|&&v| v <= max) {
            self.profiles.insert(format!("{prefix}{v}"));
        }
    }

    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.insert(profile);
        self
    }

    pub fn insert(&mut self, profile: impl Into<String>) -> bool {
        self.profiles.insert(profile.into())
    }

    pub fn remove(&mut self, profile: &str) -> bool {
        self.profiles.remove(profile)
    }

    pub fn profiles(&self) -> impl Iterator<Item = &str> {
        self.profiles.iter().map(String::as_str)
    }
}

impl RenderCapabilities for StaticCapabilities {
    fn is_syntax_supported(&self, profile: &str) -> bool {
        self.profiles.contains(profile)
    }
}
