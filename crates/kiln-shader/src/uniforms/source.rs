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

//! Uniform extraction by scanning preprocessed GLSL source.

use super::types::glsl_type;
use super::ExtractionError;
use kiln_core::renderer::{
    GpuConstantDefinition, GpuConstantType, GpuNamedConstants, ShaderSettings,
    ShaderSourceDescriptor,
};

const UNIFORM: &str = "uniform";
const PRECISION_QUALIFIERS: [&str; 3] = ["lowp", "mediump", "highp"];

/// Extracts the uniforms of a main source and its attached sources into
/// one table.
///
/// Names already defined by an earlier source are kept as they are.
pub fn extract_program_constants(
    main: &ShaderSourceDescriptor<'_>,
    attached: &[ShaderSourceDescriptor<'_>],
    settings: &ShaderSettings,
) -> Result<GpuNamedConstants, ExtractionError> {
    let mut defs = GpuNamedConstants::new();
    for desc in std::iter::once(main).chain(attached) {
        let label = desc.label.unwrap_or("<unnamed>");
        let padded = desc.language.uses_padded_constants();
        let blocks = extract_from_source(&desc.source, &mut defs, label, padded, settings)?;
        log::debug!(
            "UniformExtractor({}): {} constants, {} blocks",
            label,
            defs.len(),
            blocks.len()
        );
    }
    Ok(defs)
}

/// Scans `source` for `uniform` declarations and adds them to `defs`.
///
/// The source must already be preprocessed. Returns the external names of
/// the uniform blocks encountered; their members are not extracted.
pub fn extract_from_source(
    source: &str,
    defs: &mut GpuNamedConstants,
    label: &str,
    padded: bool,
    settings: &ShaderSettings,
) -> Result<Vec<String>, ExtractionError> {
    let bytes = source.as_bytes();
    let mut blocks = Vec::new();
    let mut search_from = 0;

    while let Some(found) = source[search_from..].find(UNIFORM) {
        let start = search_from + found;
        let mut pos = start + UNIFORM.len();
        search_from = pos;

        let standalone_before = start == 0
            || matches!(bytes[start - 1], b' ' | b'\t' | b'\r' | b'\n' | b';');
        let standalone_after = bytes
            .get(pos)
            .is_some_and(|c| matches!(c, b' ' | b'\t' | b'\r' | b'\n'));
        if !standalone_before || !standalone_after {
            continue;
        }

        let line_end = source[pos..]
            .find(['\n', '\r'])
            .map_or(source.len(), |i| pos + i);
        let line = &source[pos..line_end];
        let mut parts = line.split([' ', '\t']).filter(|p| !p.is_empty());
        let Some(first) = parts.next() else {
            continue;
        };
        let type_name = if PRECISION_QUALIFIERS.contains(&first) {
            parts.next().unwrap_or_default()
        } else {
            first
        };

        if glsl_type(type_name).is_none() {
            // A uniform block: `uniform Name { ... } instance;`
            let external_name = first.to_owned();
            let open = source[pos..]
                .find('{')
                .map(|i| pos + i)
                .ok_or_else(|| ExtractionError::MissingBlockBrace {
                    label: label.to_owned(),
                    block: external_name.clone(),
                })?;
            let close = source[open..].find('}').map(|i| open + i).ok_or_else(|| {
                ExtractionError::MissingBlockBrace {
                    label: label.to_owned(),
                    block: external_name.clone(),
                }
            })?;
            pos = close + 1;
            if !source[pos..].contains(';') {
                return Err(ExtractionError::MissingSemicolon {
                    label: label.to_owned(),
                });
            }
            log::trace!("UniformExtractor({}): uniform block '{}'", label, external_name);
            blocks.push(external_name);
        } else {
            let end = source[pos..]
                .find(';')
                .map(|i| pos + i)
                .ok_or_else(|| ExtractionError::MissingSemicolon {
                    label: label.to_owned(),
                })?;
            parse_declaration(&source[pos..end], defs, label, padded, settings)?;
            pos = end;
        }
        search_from = pos;
    }

    Ok(blocks)
}

/// Parses the declarator list following `uniform`, up to (not including)
/// the semicolon.
fn parse_declaration(
    declaration: &str,
    defs: &mut GpuNamedConstants,
    label: &str,
    padded: bool,
    settings: &ShaderSettings,
) -> Result<(), ExtractionError> {
    // `vec3 v [3]` would otherwise split between the name and its size.
    let mut line = declaration.to_owned();
    while let Some(i) = line.find(" [") {
        line.remove(i);
    }

    let mut def = GpuConstantDefinition::default();
    for part in line.split([',', ' ', '\t', '\r', '\n']) {
        if part.is_empty() {
            continue;
        }
        if let Some(ty) = glsl_type(part) {
            def.const_type = ty;
            def.element_size = ty.element_size(padded);
            continue;
        }
        if PRECISION_QUALIFIERS.contains(&part) {
            continue;
        }
        if part == "=" || part.starts_with('=') {
            break;
        }

        let (name, array_size) = match part.find('[') {
            Some(open) => (part[..open].trim(), parse_array_size(&part[open..], label, part)?),
            None => (part, 1),
        };
        if name.is_empty() {
            continue;
        }

        if def.const_type == GpuConstantType::Unknown {
            log::error!(
                "UniformExtractor({}): Problem parsing the following GLSL uniform: '{}'",
                label,
                declaration.trim()
            );
            break;
        }

        if defs.contains(name) {
            log::trace!("UniformExtractor({}): '{}' already defined", label, name);
        } else {
            def.array_size = array_size;
            def.logical_index = 0;
            defs.allocate(&mut def);
            defs.insert(name, def);
            if array_size > 1 {
                defs.generate_array_entries(
                    name,
                    &def,
                    settings.array_entry_limit,
                    settings.generate_all_array_entries,
                );
            }
        }

        if declaration.contains('=') {
            log::warn!(
                "UniformExtractor({}): Default value of uniform '{}' is ignored",
                label,
                name
            );
            break;
        }
    }
    Ok(())
}

/// Multiplies the dimensions of a chained `[N][M]...` suffix.
fn parse_array_size(suffix: &str, label: &str, part: &str) -> Result<usize, ExtractionError> {
    let mut size = 1usize;
    let mut rest = suffix;
    while let Some(open) = rest.find('[') {
        let close = rest[open..]
            .find(']')
            .map(|i| open + i)
            .unwrap_or(rest.len());
        let term = rest[open + 1..close].trim();
        let dim: usize = term.parse().map_err(|_| ExtractionError::InvalidArraySize {
            label: label.to_owned(),
            declaration: part.to_owned(),
        })?;
        size *= dim;
        rest = rest.get(close + 1..).unwrap_or("");
    }
    Ok(size)
}
