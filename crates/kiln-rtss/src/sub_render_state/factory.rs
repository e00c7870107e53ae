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

use super::{SubRenderState, SubRenderStateType};
use crate::RenderStateError;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Creates and destroys the sub render states of one type.
pub trait SubRenderStateFactory: Send + Sync {
    fn type_name(&self) -> &'static str;

    fn create_instance(&self) -> Box<dyn SubRenderState>;

    /// Takes back an instance this factory created.
    fn destroy_instance(&self, state: Box<dyn SubRenderState>);

    /// Creates a new instance configured like `other`.
    fn create_copy(
        &self,
        other: &dyn SubRenderState,
    ) -> Result<Box<dyn SubRenderState>, RenderStateError> {
        let mut state = self.create_instance();
        if let Err(err) = state.copy_from(other) {
            self.destroy_instance(state);
            return Err(err);
        }
        Ok(state)
    }

    /// Number of instances created and not yet destroyed.
    fn live_instances(&self) -> usize;
}

/// A factory for any `Default` sub render state.
pub struct BuiltinFactory<T> {
    live: AtomicUsize,
    _marker: PhantomData<fn() -> T>,
}

impl<T> BuiltinFactory<T>
where
    T: SubRenderState + SubRenderStateType + Default,
{
    pub fn new() -> Self {
        Self {
            live: AtomicUsize::new(0),
            _marker: PhantomData,
        }
    }

    /// Constructor usable in a [`FactoryRegistration`].
    pub fn boxed() -> Box<dyn SubRenderStateFactory> {
        Box::new(Self::new())
    }
}

impl<T> Default for BuiltinFactory<T>
where
    T: SubRenderState + SubRenderStateType + Default,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SubRenderStateFactory for BuiltinFactory<T>
where
    T: SubRenderState + SubRenderStateType + Default,
{
    fn type_name(&self) -> &'static str {
        T::TYPE_NAME
    }

    fn create_instance(&self) -> Box<dyn SubRenderState> {
        self.live.fetch_add(1, Ordering::Relaxed);
        Box::new(T::default())
    }

    fn destroy_instance(&self, state: Box<dyn SubRenderState>) {
        if state.type_name() != T::TYPE_NAME {
            log::warn!(
                "BuiltinFactory({}): asked to destroy a '{}'",
                T::TYPE_NAME,
                state.type_name()
            );
            return;
        }
        let released = self
            .live
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));
        if released.is_err() {
            log::warn!(
                "BuiltinFactory({}): destroyed an instance it did not create",
                T::TYPE_NAME
            );
        }
    }

    fn live_instances(&self) -> usize {
        self.live.load(Ordering::Relaxed)
    }
}

/// Link-time registration of a built-in factory.
pub struct FactoryRegistration {
    pub create: fn() -> Box<dyn SubRenderStateFactory>,
}

inventory::collect!(FactoryRegistration);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sub_render_state::test_support::Marker;

    #[test]
    fn test_factory_tracks_live_instances() {
        let factory = BuiltinFactory::<Marker>::new();
        let a = factory.create_instance();
        let b = factory.create_instance();
        assert_eq!(factory.live_instances(), 2);

        factory.destroy_instance(a);
        assert_eq!(factory.live_instances(), 1);
        factory.destroy_instance(b);
        factory.destroy_instance(Box::new(Marker::default()));
        assert_eq!(factory.live_instances(), 0);
    }

    #[test]
    fn test_create_copy() {
        let factory = BuiltinFactory::<Marker>::new();
        let source = Marker {
            order: 42,
            tag: 9,
            ..Default::default()
        };
        let copy = factory.create_copy(&source).unwrap();
        assert_eq!(copy.execution_order(), 42);
        assert_eq!(copy.hash_code(), source.hash_code());
        assert_eq!(factory.live_instances(), 1);
    }
}
