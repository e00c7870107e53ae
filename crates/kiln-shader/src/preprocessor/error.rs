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

use thiserror::Error;

/// A fatal preprocessing diagnostic.
///
/// Line numbers are relative to the text being parsed; errors raised while
/// rescanning a macro body refer to lines of that body.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {message}{}", offending(.token))]
pub struct PreprocessorError {
    /// The 1-based line the diagnostic refers to.
    pub line: usize,
    /// The diagnostic text.
    pub message: String,
    /// The offending token text, if any.
    pub token: Option<String>,
}

fn offending(token: &Option<String>) -> String {
    match token {
        Some(t) => format!(": `{t}'"),
        None => String::new(),
    }
}
