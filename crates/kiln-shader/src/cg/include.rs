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

use super::CgError;

const INCLUDE: &str = "#include";

/// Opens files named by `#include` directives.
pub trait IncludeResolver {
    /// Returns the contents of `file`, or `None` if it does not exist.
    fn resolve(&self, file: &str) -> Option<String>;
}

impl<F> IncludeResolver for F
where
    F: Fn(&str) -> Option<String>,
{
    fn resolve(&self, file: &str) -> Option<String> {
        self(file)
    }
}

/// Returns `true` if `pos` lies inside a line or block comment.
fn is_commented(source: &str, pos: usize) -> bool {
    let before = &source[..pos];
    let line_start = before.rfind('\n');
    if let Some(line_comment) = before.rfind("//") {
        if line_start.is_none_or(|nl| line_comment > nl) {
            return true;
        }
    }
    if let Some(open) = before.rfind("/*") {
        if before.rfind("*/").is_none_or(|close| close < open) {
            return true;
        }
    }
    false
}

/// Replaces every `#include "file"` or `#include <file>` line of `source`
/// with the contents returned by `resolver`.
///
/// Included text is not scanned again. Directives inside comments are left
/// alone.
pub fn expand_includes(
    source: &str,
    label: &str,
    resolver: &dyn IncludeResolver,
) -> Result<String, CgError> {
    let mut out = String::with_capacity(source.len());
    let mut copied_to = 0;
    let mut next = source.find(INCLUDE);

    while let Some(pos) = next {
        let after = pos + INCLUDE.len();
        if is_commented(source, pos) {
            next = source[after..].find(INCLUDE).map(|i| after + i);
            continue;
        }

        let line_start = source[..pos].rfind('\n');
        let line_end = source[after..]
            .find('\n')
            .map_or(source.len(), |i| after + i);
        let directive = || source[pos..line_end].trim_end().to_owned();

        let (open, close) = match source[after..line_end].find('"') {
            Some(i) => (after + i, '"'),
            None => match source[after..line_end].find('<') {
                Some(i) => (after + i, '>'),
                None => {
                    return Err(CgError::BadInclude {
                        label: label.to_owned(),
                        expected: "\" or <",
                        line: directive(),
                    })
                }
            },
        };
        let end = source[open + 1..line_end]
            .find(close)
            .map(|i| open + 1 + i)
            .ok_or_else(|| CgError::BadInclude {
                label: label.to_owned(),
                expected: if close == '"' { "\"" } else { ">" },
                line: directive(),
            })?;

        let file = &source[open + 1..end];
        let contents = resolver
            .resolve(file)
            .ok_or_else(|| CgError::IncludeNotFound {
                label: label.to_owned(),
                file: file.to_owned(),
            })?;
        log::debug!("CgProgram({}): including '{}'", label, file);

        if let Some(nl) = line_start.filter(|&nl| nl >= copied_to) {
            out.push_str(&source[copied_to..=nl]);
        }
        out.push_str(&contents);
        copied_to = line_end;
        next = source[line_end..].find(INCLUDE).map(|i| line_end + i);
    }

    out.push_str(&source[copied_to..]);
    Ok(out)
}
