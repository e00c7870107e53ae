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

//! Parameter name recovery for source emitted by the Cg compiler.
//!
//! When compiling to GLSL the compiler renames uniforms and documents the
//! renaming in comment lines such as
//! `//var float4x4 world :  : _world1[0], 4 : 1 : 1`. Matrices are also
//! lowered to arrays of row vectors. Both are undone here so the emitted
//! program exposes the names and types the Cg source declared.

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn is_identifier(s: &str) -> bool {
    !s.is_empty()
        && !s.as_bytes()[0].is_ascii_digit()
        && s.bytes().all(is_ident_byte)
}

#[derive(Debug, PartialEq, Eq)]
struct Renamed<'a> {
    cg_type: &'a str,
    original: &'a str,
    emitted: &'a str,
}

fn parse_var_line(line: &str) -> Option<Renamed<'_>> {
    let rest = line.trim_start().strip_prefix("//var")?;
    let mut fields = rest.split(':');
    let mut decl = fields.next()?.split_whitespace();
    let cg_type = decl.next()?;
    let original = decl.next()?;
    let original = original.split('[').next().unwrap_or(original);
    let emitted = fields.nth(1)?.trim();
    let end = emitted
        .bytes()
        .position(|b| !is_ident_byte(b))
        .unwrap_or(emitted.len());
    let emitted = &emitted[..end];

    (is_identifier(original) && is_identifier(emitted)).then_some(Renamed {
        cg_type,
        original,
        emitted,
    })
}

/// Rows and columns of a `floatRxC` or `halfRxC` type name.
fn matrix_shape(cg_type: &str) -> Option<(u8, u8)> {
    let dims = cg_type
        .strip_prefix("float")
        .or_else(|| cg_type.strip_prefix("half"))?;
    let (rows, cols) = dims.split_once('x')?;
    let rows: u8 = rows.parse().ok()?;
    let cols: u8 = cols.parse().ok()?;
    ((2..=4).contains(&rows) && (2..=4).contains(&cols)).then_some((rows, cols))
}

/// Replaces every whole-identifier occurrence of `from` in `source`.
pub fn replace_identifier(source: &str, from: &str, to: &str) -> String {
    if from.is_empty() {
        return source.to_owned();
    }
    let bytes = source.as_bytes();
    let mut out = String::with_capacity(source.len());
    let mut copied_to = 0;

    for (pos, _) in source.match_indices(from) {
        if pos < copied_to {
            continue;
        }
        let end = pos + from.len();
        let bounded_before = pos == 0 || !is_ident_byte(bytes[pos - 1]);
        let bounded_after = end == bytes.len() || !is_ident_byte(bytes[end]);
        if bounded_before && bounded_after {
            out.push_str(&source[copied_to..pos]);
            out.push_str(to);
            copied_to = end;
        }
    }
    out.push_str(&source[copied_to..]);
    out
}

/// Restores the parameter names, and the matrix uniform declarations, of
/// GLSL emitted by the Cg compiler.
pub fn recover_parameter_names(emitted: &str) -> String {
    let renames: Vec<Renamed<'_>> = emitted.lines().filter_map(parse_var_line).collect();
    let mut source = emitted.to_owned();

    for renamed in &renames {
        if let Some((rows, cols)) = matrix_shape(renamed.cg_type) {
            let lowered = format!("uniform vec{cols} {}[{rows}]", renamed.emitted);
            let matrix = if rows == cols {
                format!("mat{cols}")
            } else {
                format!("mat{cols}x{rows}")
            };
            source = source.replace(&lowered, &format!("uniform {matrix} {}", renamed.emitted));
        }
    }

    for renamed in renames.iter().filter(|r| r.original != r.emitted) {
        log::trace!(
            "CgProgram: restoring '{}' as '{}'",
            renamed.emitted,
            renamed.original
        );
        source = replace_identifier(&source, renamed.emitted, renamed.original);
    }
    source
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_var_line() {
        let parsed = parse_var_line("//var float4x4 world :  : _world1[0], 4 : 1 : 1").unwrap();
        assert_eq!(
            parsed,
            Renamed {
                cg_type: "float4x4",
                original: "world",
                emitted: "_world1",
            }
        );
        assert_eq!(parse_var_line("//var float4 colour : COLOR"), None);
        assert_eq!(parse_var_line("// var float x : : _x"), None);
    }

    #[test]
    fn test_replace_respects_boundaries() {
        let out = replace_identifier("_a + _ab + b_a + _a.x + _a", "_a", "a");
        assert_eq!(out, "a + _ab + b_a + a.x + a");
    }

    #[test]
    fn test_recover_names_and_matrices() {
        let emitted = "\
// main
//var float4x4 world :  : _world1[0], 4 : 1 : 1
//var float3x4 bones :  : _bones2[0], 3 : 2 : 1
//var float4 tint :  : _tint3 : 3 : 1
uniform vec4 _world1[4];
uniform vec4 _bones2[3];
uniform vec4 _tint3;
void main() { gl_FragColor = _tint3 * _world1[0].x + _tint3x; }
";
        let out = recover_parameter_names(emitted);
        assert!(out.contains("uniform mat4 world;"));
        assert!(out.contains("uniform mat4x3 bones;"));
        assert!(out.contains("uniform vec4 tint;"));
        assert!(out.contains("gl_FragColor = tint * world[0].x + _tint3x;"));
        assert!(out.contains("//var float4 tint :  : tint : 3 : 1"));
    }

    #[test]
    fn test_matrix_shape() {
        assert_eq!(matrix_shape("float3x2"), Some((3, 2)));
        assert_eq!(matrix_shape("half4x4"), Some((4, 4)));
        assert_eq!(matrix_shape("float4"), None);
        assert_eq!(matrix_shape("float5x5"), None);
    }
}
