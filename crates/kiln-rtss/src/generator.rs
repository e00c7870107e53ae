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

//! # Shader Generator
//!
//! Turns material passes into cached render states.
//!
//! Every pass belongs to a *scheme*. A scheme carries a global
//! [`RenderState`] whose fragments are added to every pass of the scheme,
//! and a valid flag: invalidating a scheme makes the next
//! [`validate_scheme`](ShaderGenerator::validate_scheme) rebuild the render
//! states of all its passes.
//!
//! Built render states are deduplicated by hash. Two passes that end up
//! with the same fragments share one cached state, referred to by a
//! [`RenderStateHandle`].

use crate::ffp::{build_ffp_render_state, is_ffp_order};
use crate::pass::PassDescription;
use crate::program::{ProgramFactory, ProgramSet};
use crate::sub_render_state::{SubRenderState, SubRenderStateFactory, SubRenderStateRegistry};
use crate::{RenderState, RenderStateError};
use ahash::AHashMap;

/// Settings applied to schemes the generator creates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorSettings {
    /// Light counts as `[point, directional, spot]` for new schemes.
    pub max_light_count: [i32; 3],
    pub default_scheme: String,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            max_light_count: [0, 1, 0],
            default_scheme: "ShaderGeneratorDefaultScheme".to_owned(),
        }
    }
}

/// Refers to a cached render state by its hash code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderStateHandle(u32);

impl RenderStateHandle {
    /// The hash code of the render state this handle refers to.
    pub fn hash_code(self) -> u32 {
        self.0
    }
}

/// A material pass to generate programs for.
#[derive(Debug)]
pub struct ShaderPass {
    pub scheme: String,
    pub description: PassDescription,
    /// Fragments added to this pass only. A fragment at a fixed-function
    /// execution order replaces the built-in one.
    pub custom_render_state: Option<RenderState>,
}

impl ShaderPass {
    /// A pass of `scheme` with no custom fragments.
    pub fn new(scheme: impl Into<String>, description: PassDescription) -> Self {
        Self {
            scheme: scheme.into(),
            description,
            custom_render_state: None,
        }
    }

    /// Attaches fragments that apply to this pass only.
    pub fn with_custom_render_state(mut self, state: RenderState) -> Self {
        self.custom_render_state = Some(state);
        self
    }
}

#[derive(Debug, Default)]
struct Scheme {
    render_state: RenderState,
    valid: bool,
    passes: Vec<ShaderPass>,
    handles: Vec<Option<RenderStateHandle>>,
}

/// Owns the factory registry, the per-scheme global render states and the
/// render state cache.
#[derive(Debug)]
pub struct ShaderGenerator {
    registry: SubRenderStateRegistry,
    schemes: AHashMap<String, Scheme>,
    cache: AHashMap<u32, RenderState>,
    settings: GeneratorSettings,
}

impl Default for ShaderGenerator {
    fn default() -> Self {
        Self::new(GeneratorSettings::default())
    }
}

impl ShaderGenerator {
    /// Creates a generator with every built-in factory installed.
    pub fn new(settings: GeneratorSettings) -> Self {
        Self {
            registry: SubRenderStateRegistry::with_registered_factories(),
            schemes: AHashMap::new(),
            cache: AHashMap::new(),
            settings,
        }
    }

    /// The settings new schemes are created with.
    pub fn settings(&self) -> &GeneratorSettings {
        &self.settings
    }

    /// The factory registry every fragment is created through.
    pub fn registry(&self) -> &SubRenderStateRegistry {
        &self.registry
    }

    /// Registers a factory for a new fragment type.
    pub fn add_sub_render_state_factory(
        &mut self,
        factory: Box<dyn SubRenderStateFactory>,
    ) -> Result<(), RenderStateError> {
        self.registry.add_factory(factory)
    }

    /// Creates a fragment of `type_name` through its factory.
    pub fn create_sub_render_state(
        &self,
        type_name: &str,
    ) -> Result<Box<dyn SubRenderState>, RenderStateError> {
        self.registry.create(type_name)
    }

    /// Hands a fragment back to its factory.
    pub fn destroy_sub_render_state(&self, state: Box<dyn SubRenderState>) {
        self.registry.destroy(state);
    }

    fn scheme_mut(&mut self, scheme: &str) -> &mut Scheme {
        let max_light_count = self.settings.max_light_count;
        let registry = &self.registry;
        self.schemes.entry(scheme.to_owned()).or_insert_with(|| {
            log::debug!("ShaderGenerator({scheme}): created scheme");
            let mut render_state = RenderState::with_registry(registry);
            render_state.set_max_light_count(max_light_count);
            Scheme {
                render_state,
                ..Default::default()
            }
        })
    }

    /// The global render state of `scheme`, if the scheme exists.
    pub fn render_state(&self, scheme: &str) -> Option<&RenderState> {
        self.schemes.get(scheme).map(|s| &s.render_state)
    }

    /// The global render state of `scheme`, creating the scheme if needed.
    pub fn render_state_mut(&mut self, scheme: &str) -> &mut RenderState {
        &mut self.scheme_mut(scheme).render_state
    }

    /// Registers `pass` with its scheme and invalidates the scheme.
    ///
    /// Returns the pass index inside the scheme.
    pub fn add_pass(&mut self, pass: ShaderPass) -> usize {
        let scheme = self.scheme_mut(&pass.scheme.clone());
        scheme.passes.push(pass);
        scheme.handles.push(None);
        scheme.valid = false;
        scheme.passes.len() - 1
    }

    /// The render state built for pass `index` of `scheme` by the last
    /// validation.
    pub fn pass_render_state(&self, scheme: &str, index: usize) -> Option<RenderStateHandle> {
        self.schemes
            .get(scheme)
            .and_then(|s| s.handles.get(index).copied().flatten())
    }

    /// A clone of the fragment `pass` uses at fixed-function slot `order`
    /// instead of the built-in one, if any.
    ///
    /// The pass's custom render state is searched first, then the global
    /// render state of its scheme.
    pub fn custom_ffp_sub_state(
        &self,
        order: i32,
        pass: &ShaderPass,
    ) -> Result<Option<Box<dyn SubRenderState>>, RenderStateError> {
        let custom = pass
            .custom_render_state
            .as_ref()
            .and_then(|state| state.find_by_execution_order(order));
        let global = || {
            self.render_state(&pass.scheme)
                .and_then(|state| state.find_by_execution_order(order))
        };
        match custom.or_else(global) {
            Some(state) => self.registry.create_copy(state).map(Some),
            None => Ok(None),
        }
    }

    /// Builds the render state of `pass` and returns its cached handle.
    ///
    /// The light counts come from the pass's custom render state, else from
    /// the scheme. The fixed-function fragments are derived from the pass
    /// description, then the scheme's and the pass's other fragments are
    /// appended. If an identical state is already cached, the new one is
    /// destroyed and the cached one returned.
    pub fn build_render_state(
        &mut self,
        pass: &ShaderPass,
    ) -> Result<RenderStateHandle, RenderStateError> {
        let max_light_count = match &pass.custom_render_state {
            Some(custom) => custom.max_light_count(),
            None => self
                .render_state(&pass.scheme)
                .map_or(self.settings.max_light_count, RenderState::max_light_count),
        };

        let mut target = RenderState::with_registry(&self.registry);
        target.set_max_light_count(max_light_count);
        if let Err(err) = self.compose(pass, &mut target) {
            target.reset(&self.registry);
            return Err(err);
        }

        let hash = target.hash_code();
        if self.cache.contains_key(&hash) {
            log::debug!("ShaderGenerator({}): reusing render state {hash:08x}", pass.scheme);
            target.reset(&self.registry);
        } else {
            log::debug!(
                "ShaderGenerator({}): caching render state {hash:08x} with {} sub render states",
                pass.scheme,
                target.len()
            );
            self.cache.insert(hash, target);
        }
        Ok(RenderStateHandle(hash))
    }

    fn compose(&self, pass: &ShaderPass, target: &mut RenderState) -> Result<(), RenderStateError> {
        build_ffp_render_state(self, pass, target)?;
        let not_ffp = |state: &dyn SubRenderState| !is_ffp_order(state.execution_order());
        if let Some(global) = self.render_state(&pass.scheme) {
            target.append_where(global, &self.registry, not_ffp)?;
        }
        if let Some(custom) = &pass.custom_render_state {
            target.append_where(custom, &self.registry, not_ffp)?;
        }
        Ok(())
    }

    /// Marks `scheme` as needing a rebuild.
    pub fn invalidate_scheme(&mut self, scheme: &str) {
        if let Some(s) = self.schemes.get_mut(scheme) {
            s.valid = false;
        }
    }

    /// `true` once `scheme` exists and has been validated since its last
    /// change.
    pub fn is_scheme_valid(&self, scheme: &str) -> bool {
        self.schemes.get(scheme).is_some_and(|s| s.valid)
    }

    /// Rebuilds the render states of every pass of an invalid scheme.
    ///
    /// Returns `false` for an unknown scheme. A pass that fails to build
    /// aborts validation and leaves the scheme invalid.
    pub fn validate_scheme(&mut self, scheme: &str) -> Result<bool, RenderStateError> {
        let Some(entry) = self.schemes.get_mut(scheme) else {
            return Ok(false);
        };
        if entry.valid {
            return Ok(true);
        }

        let passes = std::mem::take(&mut entry.passes);
        let mut handles = Vec::with_capacity(passes.len());
        let mut result = Ok(());
        for pass in &passes {
            match self.build_render_state(pass) {
                Ok(handle) => handles.push(Some(handle)),
                Err(err) => {
                    log::error!("ShaderGenerator({scheme}): {err}");
                    result = Err(err);
                    break;
                }
            }
        }

        let entry = self.scheme_mut(scheme);
        entry.passes = passes;
        result?;
        entry.handles = handles;
        entry.valid = true;
        log::info!(
            "ShaderGenerator({scheme}): validated {} passes",
            entry.passes.len()
        );
        Ok(true)
    }

    /// The cached render state `handle` refers to.
    pub fn cached_render_state(&self, handle: RenderStateHandle) -> Option<&RenderState> {
        self.cache.get(&handle.0)
    }

    /// Mutable access to a cached render state, for parameter updates.
    pub fn cached_render_state_mut(&mut self, handle: RenderStateHandle) -> Option<&mut RenderState> {
        self.cache.get_mut(&handle.0)
    }

    /// Number of distinct render states in the cache.
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Generates the program pair of a cached render state.
    pub fn create_cpu_programs(
        &mut self,
        handle: RenderStateHandle,
        factory: &dyn ProgramFactory,
    ) -> Result<ProgramSet, RenderStateError> {
        self.cache
            .get_mut(&handle.0)
            .ok_or(RenderStateError::NotCached(handle.0))?
            .create_cpu_programs(factory)
    }

    /// Drops a cached render state, returning its fragments to their
    /// factories.
    pub fn release_render_state(&mut self, handle: RenderStateHandle) -> bool {
        match self.cache.remove(&handle.0) {
            Some(mut state) => {
                state.reset(&self.registry);
                true
            }
            None => false,
        }
    }
}

impl Drop for ShaderGenerator {
    fn drop(&mut self) {
        for (_, mut state) in self.cache.drain() {
            state.reset(&self.registry);
        }
        for (_, mut scheme) in self.schemes.drain() {
            scheme.render_state.reset(&self.registry);
            for pass in &mut scheme.passes {
                if let Some(custom) = &mut pass.custom_render_state {
                    custom.reset(&self.registry);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ffp::{FfpTransform, PerPixelLighting, FFP_LIGHTING};
    use crate::pass::FogMode;
    use crate::program::DefaultProgramFactory;
    use crate::sub_render_state::test_support::{marker, Marker};
    use crate::sub_render_state::{BuiltinFactory, SubRenderStateType};

    const SCHEME: &str = "test";

    fn live(generator: &ShaderGenerator, type_name: &str) -> usize {
        generator.registry().factory(type_name).unwrap().live_instances()
    }

    #[test]
    fn test_identical_passes_share_a_cached_state() {
        let mut generator = ShaderGenerator::default();
        let a = generator
            .build_render_state(&ShaderPass::new(SCHEME, PassDescription::default()))
            .unwrap();
        let b = generator
            .build_render_state(&ShaderPass::new(SCHEME, PassDescription::default()))
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(generator.cache_len(), 1);
        // The duplicate's fragments went back to the factory.
        assert_eq!(live(&generator, FfpTransform::TYPE_NAME), 1);

        let fogged = PassDescription {
            fog_mode: FogMode::Linear,
            ..Default::default()
        };
        let c = generator
            .build_render_state(&ShaderPass::new(SCHEME, fogged))
            .unwrap();
        assert_ne!(a, c);
        assert_eq!(generator.cache_len(), 2);

        assert!(generator.release_render_state(c));
        assert!(!generator.release_render_state(c));
        assert_eq!(live(&generator, FfpTransform::TYPE_NAME), 1);
    }

    #[test]
    fn test_light_count_comes_from_custom_then_scheme() {
        let mut generator = ShaderGenerator::default();
        generator.render_state_mut(SCHEME).set_max_light_count([2, 0, 0]);

        let scheme_pass = ShaderPass::new(SCHEME, PassDescription::default());
        let handle = generator.build_render_state(&scheme_pass).unwrap();
        assert_eq!(
            generator.cached_render_state(handle).unwrap().max_light_count(),
            [2, 0, 0]
        );

        let mut custom = RenderState::new();
        custom.set_max_light_count([0, 0, 1]);
        let custom_pass =
            ShaderPass::new(SCHEME, PassDescription::default()).with_custom_render_state(custom);
        let handle = generator.build_render_state(&custom_pass).unwrap();
        assert_eq!(
            generator.cached_render_state(handle).unwrap().max_light_count(),
            [0, 0, 1]
        );
    }

    #[test]
    fn test_global_and_custom_fragments_are_appended_once() {
        let mut generator = ShaderGenerator::default();
        generator
            .add_sub_render_state_factory(BuiltinFactory::<Marker>::boxed())
            .unwrap();
        generator.render_state_mut(SCHEME).add_sub_render_state(marker(700, 1));
        let per_pixel = generator.create_sub_render_state(PerPixelLighting::TYPE_NAME).unwrap();
        generator.render_state_mut(SCHEME).add_sub_render_state(per_pixel);

        let mut custom = RenderState::new();
        custom.add_sub_render_state(marker(600, 2));
        let pass =
            ShaderPass::new(SCHEME, PassDescription::default()).with_custom_render_state(custom);

        let handle = generator.build_render_state(&pass).unwrap();
        let state = generator.cached_render_state(handle).unwrap();
        let types: Vec<_> = state
            .sub_render_states()
            .map(|s| (s.execution_order(), s.type_name()))
            .collect();
        assert_eq!(
            types,
            vec![
                (100, "FFP_Transform"),
                (200, "FFP_Colour"),
                (FFP_LIGHTING, "SGX_PerPixelLighting"),
                (600, "Test_Marker"),
                (700, "Test_Marker"),
            ]
        );
    }

    #[test]
    fn test_scheme_validation_cycle() {
        let mut generator = ShaderGenerator::default();
        assert!(!generator.validate_scheme("missing").unwrap());

        let index = generator.add_pass(ShaderPass::new(SCHEME, PassDescription::default()));
        assert!(!generator.is_scheme_valid(SCHEME));
        assert!(generator.pass_render_state(SCHEME, index).is_none());

        assert!(generator.validate_scheme(SCHEME).unwrap());
        assert!(generator.is_scheme_valid(SCHEME));
        let handle = generator.pass_render_state(SCHEME, index).unwrap();

        generator.invalidate_scheme(SCHEME);
        assert!(!generator.is_scheme_valid(SCHEME));
        assert!(generator.validate_scheme(SCHEME).unwrap());
        assert_eq!(generator.pass_render_state(SCHEME, index), Some(handle));

        let programs = generator
            .create_cpu_programs(handle, &DefaultProgramFactory)
            .unwrap();
        assert_eq!(
            programs.vertex().name(),
            format!("vs_{:08x}", handle.hash_code())
        );
    }

    #[test]
    fn test_uncached_handle_is_an_error() {
        let mut generator = ShaderGenerator::default();
        let err = generator
            .create_cpu_programs(RenderStateHandle(7), &DefaultProgramFactory)
            .unwrap_err();
        assert!(matches!(err, RenderStateError::NotCached(7)));
    }
}
