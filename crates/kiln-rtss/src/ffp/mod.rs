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

//! # Fixed-Function Emulation
//!
//! Built-in sub render states that reproduce the fixed-function pipeline:
//! vertex transform, vertex colour, per-vertex lighting, texture units and
//! fog, plus a per-pixel lighting replacement for the lighting slot.
//!
//! Each fragment emits calls into the `FFPLib_*` function libraries; the
//! GLSL writer embeds whichever libraries a program depends on.

mod builder;
mod colour;
mod fog;
mod lighting;
mod per_pixel;
mod texturing;
mod transform;

pub use builder::build_ffp_render_state;
pub use colour::FfpColour;
pub use fog::FfpFog;
pub use lighting::FfpLighting;
pub use per_pixel::PerPixelLighting;
pub use texturing::FfpTextureStage;
pub use transform::FfpTransform;

use crate::RenderStateError;

/// Execution orders of the fixed-function slots.
pub const FFP_TRANSFORM: i32 = 100;
pub const FFP_COLOUR: i32 = 200;
pub const FFP_LIGHTING: i32 = 300;
/// Texture unit `n` runs at `FFP_TEXTURING + n`.
pub const FFP_TEXTURING: i32 = 400;
pub const FFP_FOG: i32 = 500;
pub const PER_PIXEL_LIGHTING: i32 = FFP_LIGHTING;

/// Whether `order` belongs to a fixed-function slot.
pub fn is_ffp_order(order: i32) -> bool {
    matches!(order, FFP_TRANSFORM | FFP_COLOUR | FFP_LIGHTING | FFP_FOG)
        || (FFP_TEXTURING..FFP_FOG).contains(&order)
}

// Invocation groups inside the vertex program.
pub(crate) const FFP_VS_TRANSFORM: i32 = 100;
pub(crate) const FFP_VS_COLOUR: i32 = 200;
pub(crate) const FFP_VS_LIGHTING: i32 = 300;
pub(crate) const FFP_VS_TEXTURING: i32 = 400;
pub(crate) const FFP_VS_FOG: i32 = 500;

// Invocation groups inside the fragment program.
pub(crate) const FFP_PS_COLOUR_BEGIN: i32 = 100;
pub(crate) const FFP_PS_TEXTURING: i32 = 200;
pub(crate) const FFP_PS_COLOUR_END: i32 = 300;
pub(crate) const FFP_PS_FOG: i32 = 400;

pub const FFP_LIB_COMMON: &str = "FFPLib_Common";
pub const FFP_LIB_TRANSFORM: &str = "FFPLib_Transform";
pub const FFP_LIB_LIGHTING: &str = "FFPLib_Lighting";
pub const FFP_LIB_TEXTURING: &str = "FFPLib_Texturing";
pub const FFP_LIB_FOG: &str = "FFPLib_Fog";
pub const SGX_LIB_PER_PIXEL_LIGHTING: &str = "SGXLib_PerPixelLighting";

pub(crate) const FFP_FUNC_TRANSFORM: &str = "FFP_Transform";
pub(crate) const FFP_FUNC_ASSIGN: &str = "FFP_Assign";
pub(crate) const FFP_FUNC_CONSTRUCT: &str = "FFP_Construct";
pub(crate) const FFP_FUNC_MODULATE: &str = "FFP_Modulate";
pub(crate) const FFP_FUNC_MODULATEX2: &str = "FFP_ModulateX2";
pub(crate) const FFP_FUNC_MODULATEX4: &str = "FFP_ModulateX4";
pub(crate) const FFP_FUNC_ADD: &str = "FFP_Add";
pub(crate) const FFP_FUNC_ADDSIGNED: &str = "FFP_AddSigned";
pub(crate) const FFP_FUNC_ADDSMOOTH: &str = "FFP_AddSmooth";
pub(crate) const FFP_FUNC_SUBTRACT: &str = "FFP_Subtract";
pub(crate) const FFP_FUNC_LERP: &str = "FFP_Lerp";
pub(crate) const FFP_FUNC_DOTPRODUCT: &str = "FFP_DotProduct";

/// The name stored in a resolved parameter slot.
///
/// Slots are filled by `resolve_parameters`, so an empty one means a
/// fragment step ran out of order.
pub(crate) fn resolved<'a>(
    type_name: &'static str,
    slot: &'a Option<String>,
    what: &str,
) -> Result<&'a str, RenderStateError> {
    slot.as_deref().ok_or_else(|| {
        crate::sub_render_state::fragment_error(type_name, format!("{what} was not resolved"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ffp_orders() {
        assert!(is_ffp_order(FFP_LIGHTING));
        assert!(is_ffp_order(FFP_TEXTURING + 3));
        assert!(!is_ffp_order(FFP_FOG + 1));
        assert!(!is_ffp_order(250));
    }

    #[test]
    fn test_resolved_slot() {
        let filled = Some("x".to_owned());
        assert_eq!(resolved("T", &filled, "x").unwrap(), "x");
        assert!(resolved("T", &None, "x").is_err());
    }
}
