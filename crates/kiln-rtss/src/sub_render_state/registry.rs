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

use super::factory::{FactoryRegistration, SubRenderStateFactory};
use super::SubRenderState;
use crate::RenderStateError;
use ahash::AHashMap;
use std::fmt;
use std::sync::Arc;

/// Sub render state factories, keyed by type name.
///
/// Clones share the factories registered so far; factories added to one
/// clone afterwards are not seen by the others.
#[derive(Default, Clone)]
pub struct SubRenderStateRegistry {
    factories: AHashMap<&'static str, Arc<dyn SubRenderStateFactory>>,
}

impl SubRenderStateRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every factory submitted through
    /// [`FactoryRegistration`].
    pub fn with_registered_factories() -> Self {
        let mut registry = Self::new();
        for registration in inventory::iter::<FactoryRegistration> {
            if let Err(err) = registry.add_factory((registration.create)()) {
                log::warn!("SubRenderStateRegistry: {err}");
            }
        }
        log::debug!(
            "SubRenderStateRegistry: {} built-in factories registered",
            registry.len()
        );
        registry
    }

    pub fn add_factory(
        &mut self,
        factory: Box<dyn SubRenderStateFactory>,
    ) -> Result<(), RenderStateError> {
        let type_name = factory.type_name();
        if self.factories.contains_key(type_name) {
            return Err(RenderStateError::DuplicateFactory(type_name.to_owned()));
        }
        self.factories.insert(type_name, Arc::from(factory));
        Ok(())
    }

    pub fn remove_factory(&mut self, type_name: &str) -> Option<Arc<dyn SubRenderStateFactory>> {
        self.factories.remove(type_name)
    }

    pub fn factory(&self, type_name: &str) -> Option<&dyn SubRenderStateFactory> {
        self.factories.get(type_name).map(|f| f.as_ref())
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.factories.contains_key(type_name)
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Registered type names, sorted.
    pub fn type_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }

    fn require(&self, type_name: &str) -> Result<&dyn SubRenderStateFactory, RenderStateError> {
        self.factory(type_name)
            .ok_or_else(|| RenderStateError::UnknownFactory(type_name.to_owned()))
    }

    pub fn create(&self, type_name: &str) -> Result<Box<dyn SubRenderState>, RenderStateError> {
        Ok(self.require(type_name)?.create_instance())
    }

    /// Clones `other` through the factory of its type.
    pub fn create_copy(
        &self,
        other: &dyn SubRenderState,
    ) -> Result<Box<dyn SubRenderState>, RenderStateError> {
        self.require(other.type_name())?.create_copy(other)
    }

    /// Hands `state` back to the factory that created it.
    pub fn destroy(&self, state: Box<dyn SubRenderState>) {
        match self.factory(state.type_name()) {
            Some(factory) => factory.destroy_instance(state),
            None => log::warn!(
                "SubRenderStateRegistry: no factory to destroy a '{}'",
                state.type_name()
            ),
        }
    }
}

impl fmt::Debug for SubRenderStateRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubRenderStateRegistry")
            .field("factories", &self.type_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sub_render_state::test_support::Marker;
    use crate::sub_render_state::BuiltinFactory;

    fn registry() -> SubRenderStateRegistry {
        let mut registry = SubRenderStateRegistry::new();
        registry
            .add_factory(BuiltinFactory::<Marker>::boxed())
            .unwrap();
        registry
    }

    #[test]
    fn test_duplicate_factory_is_rejected() {
        let mut registry = registry();
        let err = registry
            .add_factory(BuiltinFactory::<Marker>::boxed())
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "A factory of type 'Test_Marker' already exists."
        );
    }

    #[test]
    fn test_unknown_type_is_an_error() {
        let err = registry().create("Nope").unwrap_err();
        assert!(matches!(err, RenderStateError::UnknownFactory(ref t) if t == "Nope"));
    }

    #[test]
    fn test_create_and_destroy_round_trip_through_factory() {
        let registry = registry();
        let state = registry.create("Test_Marker").unwrap();
        let copy = registry.create_copy(state.as_ref()).unwrap();
        assert_eq!(registry.factory("Test_Marker").unwrap().live_instances(), 2);

        registry.destroy(state);
        registry.destroy(copy);
        assert_eq!(registry.factory("Test_Marker").unwrap().live_instances(), 0);
    }

    #[test]
    fn test_builtin_factories_are_collected() {
        let registry = SubRenderStateRegistry::with_registered_factories();
        for name in [
            "FFP_Transform",
            "FFP_Colour",
            "FFP_Lighting",
            "FFP_TextureUnitState",
            "FFP_Fog",
            "SGX_PerPixelLighting",
        ] {
            assert!(registry.contains(name), "{name} not registered");
        }
        assert!(!registry.contains("Test_Marker"));
    }
}
