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

//! An ordered set of sub render states and the program pair it generates.

use crate::pass::{FrameContext, ProgramParameters};
use crate::program::{ProgramFactory, ProgramSet};
use crate::sub_render_state::{SubRenderState, SubRenderStateRegistry};
use crate::RenderStateError;
use kiln_core::hash_combine;
use kiln_core::renderer::ShaderStage;

/// An ordered collection of sub render states.
///
/// Fragments are kept sorted by execution order, lazily: adding or removing
/// one only invalidates the order and the cached hash. Fragments with equal
/// execution order keep their insertion order.
///
/// A render state owns its fragments but not their factories. Operations
/// that create or destroy fragments take the [`SubRenderStateRegistry`]
/// explicitly, and the first registry seen is kept so that dropping the
/// state hands any remaining fragments back to their factories.
#[derive(Debug, Default)]
pub struct RenderState {
    sub_states: Vec<Box<dyn SubRenderState>>,
    max_light_count: [i32; 3],
    sorted: bool,
    hash: Option<u32>,
    release: Option<SubRenderStateRegistry>,
}

impl RenderState {
    /// An empty render state not yet tied to a registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty render state that releases its fragments through
    /// `registry` when dropped.
    pub fn with_registry(registry: &SubRenderStateRegistry) -> Self {
        let mut state = Self::default();
        state.release = Some(registry.clone());
        state
    }

    fn bind(&mut self, registry: &SubRenderStateRegistry) {
        if self.release.is_none() {
            self.release = Some(registry.clone());
        }
    }

    fn invalidate(&mut self) {
        self.sorted = false;
        self.hash = None;
    }

    /// Adds a fragment; the order is restored on the next hash or program
    /// generation.
    pub fn add_sub_render_state(&mut self, state: Box<dyn SubRenderState>) {
        self.sub_states.push(state);
        self.invalidate();
    }

    /// Removes the fragment at `index` of [`sub_render_states`](Self::sub_render_states)
    /// and returns it to its factory.
    pub fn remove_sub_render_state(
        &mut self,
        registry: &SubRenderStateRegistry,
        index: usize,
    ) -> bool {
        self.bind(registry);
        if index >= self.sub_states.len() {
            return false;
        }
        let state = self.sub_states.remove(index);
        registry.destroy(state);
        self.invalidate();
        true
    }

    /// Destroys every fragment.
    pub fn reset(&mut self, registry: &SubRenderStateRegistry) {
        self.bind(registry);
        for state in self.sub_states.drain(..) {
            registry.destroy(state);
        }
        self.invalidate();
    }

    /// Replaces this state's fragments and light counts with clones of
    /// `other`'s.
    pub fn copy_from(
        &mut self,
        other: &RenderState,
        registry: &SubRenderStateRegistry,
    ) -> Result<(), RenderStateError> {
        self.reset(registry);
        self.max_light_count = other.max_light_count;
        self.append(other, registry)
    }

    /// Adds clones of `other`'s fragments after this state's own.
    pub fn append(
        &mut self,
        other: &RenderState,
        registry: &SubRenderStateRegistry,
    ) -> Result<(), RenderStateError> {
        self.append_where(other, registry, |_| true)
    }

    /// Like [`append`](Self::append), for the fragments `keep` accepts.
    pub fn append_where(
        &mut self,
        other: &RenderState,
        registry: &SubRenderStateRegistry,
        keep: impl Fn(&dyn SubRenderState) -> bool,
    ) -> Result<(), RenderStateError> {
        self.bind(registry);
        for state in other.sub_states.iter().filter(|s| keep(s.as_ref())) {
            let copy = registry.create_copy(state.as_ref())?;
            self.add_sub_render_state(copy);
        }
        Ok(())
    }

    /// The fragments in their current order.
    pub fn sub_render_states(&self) -> impl Iterator<Item = &dyn SubRenderState> {
        self.sub_states.iter().map(|s| s.as_ref())
    }

    /// Number of fragments.
    pub fn len(&self) -> usize {
        self.sub_states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sub_states.is_empty()
    }

    /// The first fragment with the given execution order.
    pub fn find_by_execution_order(&self, order: i32) -> Option<&dyn SubRenderState> {
        self.sub_render_states()
            .find(|s| s.execution_order() == order)
    }

    /// Sets the light counts as `[point, directional, spot]`.
    pub fn set_max_light_count(&mut self, max_light_count: [i32; 3]) {
        self.max_light_count = max_light_count;
        self.hash = None;
    }

    pub fn max_light_count(&self) -> [i32; 3] {
        self.max_light_count
    }

    fn sort(&mut self) {
        if !self.sorted {
            self.sub_states.sort_by_key(|s| s.execution_order());
            self.sorted = true;
        }
    }

    /// Combined hash of the sorted fragments.
    pub fn hash_code(&mut self) -> u32 {
        if let Some(hash) = self.hash {
            return hash;
        }
        self.sort();
        let mut hash = 0;
        for state in &self.sub_states {
            hash_combine(&mut hash, state.hash_code());
        }
        self.hash = Some(hash);
        hash
    }

    /// The cached hash, if it is still valid.
    pub fn cached_hash_code(&self) -> Option<u32> {
        self.hash
    }

    /// Generates the vertex and fragment programs for this state.
    ///
    /// Programs are named after the hash code. Nothing is returned if any
    /// fragment fails.
    pub fn create_cpu_programs(
        &mut self,
        factory: &dyn ProgramFactory,
    ) -> Result<ProgramSet, RenderStateError> {
        let hash = self.hash_code();

        let mut vertex = factory.create_program(ShaderStage::Vertex, &format!("vs_{hash:08x}"))?;
        let main = factory.create_function(&mut vertex, "main", "Vertex Program Entry point")?;
        factory.set_entry_point_function(&mut vertex, main)?;

        let mut fragment =
            factory.create_program(ShaderStage::Fragment, &format!("ps_{hash:08x}"))?;
        let main = factory.create_function(&mut fragment, "main", "Pixel Program Entry point")?;
        factory.set_entry_point_function(&mut fragment, main)?;

        let mut programs = ProgramSet::new(vertex, fragment);
        for state in &mut self.sub_states {
            if let Err(err) = state.create_cpu_sub_programs(&mut programs) {
                log::error!("RenderState({hash:08x}): {err}");
                return Err(err);
            }
        }
        for function in programs.vertex_mut().functions_mut() {
            function.sort_atom_instances();
        }
        for function in programs.fragment_mut().functions_mut() {
            function.sort_atom_instances();
        }
        log::debug!(
            "RenderState({hash:08x}): generated programs from {} sub render states",
            self.sub_states.len()
        );
        Ok(programs)
    }

    /// Lets every fragment write its per-frame uniforms.
    pub fn update_gpu_programs_params(
        &mut self,
        frame: &FrameContext<'_>,
        params: &mut ProgramParameters,
    ) {
        for state in &mut self.sub_states {
            state.update_gpu_programs_params(frame, params);
        }
    }

    /// Notifies every fragment before visible objects are gathered.
    pub fn pre_find_visible_objects(&mut self, frame: &FrameContext<'_>) {
        for state in &mut self.sub_states {
            state.pre_find_visible_objects(frame);
        }
    }
}

impl Drop for RenderState {
    fn drop(&mut self) {
        if self.sub_states.is_empty() {
            return;
        }
        match self.release.take() {
            Some(registry) => {
                for state in self.sub_states.drain(..) {
                    registry.destroy(state);
                }
            }
            None => log::debug!(
                "RenderState: dropping {} fragments with no registry to release them",
                self.sub_states.len()
            ),
        }
    }
}
