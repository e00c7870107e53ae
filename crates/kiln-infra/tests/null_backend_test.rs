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

use anyhow::Result;
use kiln_core::renderer::{
    BufferError, BufferPacked, BufferPackedDescriptor, BufferPackedKind, BufferType,
    MappingState, ShaderSettings, UnmapOptions,
};
use kiln_infra::{StaticCapabilities, SystemMemoryBufferInterface};
use kiln_shader::cg::CgProgram;
use std::borrow::Cow;

fn descriptor(buffer_type: BufferType, keep_shadow_copy: bool) -> BufferPackedDescriptor<'static> {
    BufferPackedDescriptor {
        label: Some(Cow::Borrowed("quad")),
        kind: BufferPackedKind::Vertex,
        num_elements: 4,
        bytes_per_element: 8,
        buffer_type,
        internal_buffer_start: 2,
        keep_shadow_copy,
    }
}

#[test]
fn test_dynamic_buffer_round_trip() -> Result<()> {
    let desc = descriptor(BufferType::Dynamic, false);
    let store = SystemMemoryBufferInterface::for_descriptor(&desc);
    let mut buffer = BufferPacked::new(&desc, None, Box::new(store))?;

    buffer.map(1, 2, MappingState::Mapped)?.fill(0xAB);
    buffer.unmap(UnmapOptions::KeepPersistent)?;
    assert_eq!(buffer.mapping_state(), MappingState::Unmapped);

    let view = buffer.map(0, 4, MappingState::Mapped)?;
    assert_eq!(&view[..8], &[0; 8]);
    assert_eq!(&view[8..24], &[0xAB; 16]);
    assert_eq!(&view[24..], &[0; 8]);
    buffer.unmap(UnmapOptions::UnmapAll)?;
    Ok(())
}

#[test]
fn test_persistent_sub_range_must_stay_inside() -> Result<()> {
    let desc = descriptor(BufferType::Dynamic, false);
    let store = SystemMemoryBufferInterface::for_descriptor(&desc);
    let mut buffer = BufferPacked::new(&desc, None, Box::new(store))?;

    buffer.map(0, 2, MappingState::PersistentCoherent)?;
    buffer.unmap(UnmapOptions::KeepPersistent)?;
    assert_eq!(buffer.mapping_state(), MappingState::PersistentCoherent);

    buffer.map(1, 1, MappingState::PersistentCoherent)?.fill(1);
    let outside = buffer.map(1, 3, MappingState::PersistentCoherent);
    assert!(matches!(
        outside,
        Err(BufferError::SubRegionOutsideMapping { .. })
    ));
    buffer.unmap(UnmapOptions::UnmapAll)?;
    assert_eq!(buffer.mapping_state(), MappingState::Unmapped);
    Ok(())
}

#[test]
fn test_shadow_copy_tracks_uploads() -> Result<()> {
    let desc = descriptor(BufferType::Default, true);
    let store = SystemMemoryBufferInterface::for_descriptor(&desc);
    let mut buffer = BufferPacked::new(&desc, Some(&[0; 32]), Box::new(store))?;

    buffer.upload_pod(&[1.0f32, 2.0], 3)?;
    let shadow = buffer.read_shadow(3, 1).expect("default buffer keeps a shadow copy");
    assert_eq!(shadow, [1.0f32.to_le_bytes(), 2.0f32.to_le_bytes()].concat());
    assert_eq!(buffer.read_shadow(0, 1), Some(&[0u8; 8][..]));
    Ok(())
}

#[test]
fn test_cg_profile_selection_against_device_table() {
    let caps = StaticCapabilities::for_settings(&ShaderSettings::default()).with_profile("glslf");
    let program = CgProgram::new("tint.cg", "float4 main() : COLOR { return 0; }")
        .with_profiles("ps_2_0 glslf");
    assert!(program.is_supported(&caps));

    let desktop_only = StaticCapabilities::glsl(330);
    assert!(!program.is_supported(&desktop_only));
}
