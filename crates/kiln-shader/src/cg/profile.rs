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

use kiln_core::renderer::RenderCapabilities;

/// The first of `profiles` the device can compile, in list order.
pub fn select_profile<'p>(
    profiles: &'p [String],
    caps: &dyn RenderCapabilities,
) -> Option<&'p str> {
    profiles
        .iter()
        .map(String::as_str)
        .find(|p| caps.is_syntax_supported(p))
}

/// Returns `true` if any of `profiles` can be compiled.
pub fn is_supported(profiles: &[String], caps: &dyn RenderCapabilities) -> bool {
    select_profile(profiles, caps).is_some()
}

/// Splits `compile_args` on whitespace and adds the options `profile`
/// always requires.
///
/// The assembler for `vs_1_1` rejects programs without `dcls`.
pub fn build_args(profile: &str, compile_args: &str) -> Vec<String> {
    let mut args: Vec<String> = compile_args.split_whitespace().map(str::to_owned).collect();
    if profile == "vs_1_1" && !args.iter().any(|a| a == "dcls") {
        args.push("-profileopts".to_owned());
        args.push("dcls".to_owned());
    }
    args
}
