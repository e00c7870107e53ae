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

//! Macro definitions and the table holding them.

use super::error::PreprocessorError;
use super::token::Token;

/// Suffix appended to parameter names inside stored macro bodies so that
/// argument substitution cannot collide with ordinary identifiers.
pub(crate) const ARG_SUFFIX: &str = "__arg_";

/// A macro implemented in Rust instead of by text substitution.
///
/// Receives the table in which the macro was invoked, the raw argument
/// texts and the current line.
pub type BuiltinExpander =
    fn(&MacroTable, &[String], usize) -> Result<Token<'static>, PreprocessorError>;

/// A `#define`d macro.
#[derive(Debug, Clone)]
pub struct Macro {
    /// The macro name.
    pub name: String,
    /// Parameter names, already carrying the argument suffix.
    pub params: Vec<String>,
    /// `true` if the macro was declared with a parameter list, possibly
    /// empty.
    pub function_like: bool,
    /// The replacement text.
    pub body: String,
    pub(crate) expanding: bool,
    pub(crate) builtin: Option<BuiltinExpander>,
}

impl Macro {
    /// Creates an object-like macro.
    pub fn object(name: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            function_like: false,
            body: body.into(),
            expanding: false,
            builtin: None,
        }
    }

    /// Creates a function-like macro.
    pub fn function(name: impl Into<String>, params: Vec<String>, body: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params,
            function_like: true,
            body: body.into(),
            expanding: false,
            builtin: None,
        }
    }

    pub(crate) fn builtin(name: &str, arity: usize, expander: BuiltinExpander) -> Self {
        Self {
            name: name.to_owned(),
            params: vec![String::new(); arity],
            function_like: true,
            body: String::new(),
            expanding: false,
            builtin: Some(expander),
        }
    }

    /// Returns `true` while the macro's own expansion is being rescanned.
    pub fn is_expanding(&self) -> bool {
        self.expanding
    }
}

/// The set of macros visible to a preprocessing run.
///
/// Entries defined later shadow earlier entries of the same name. `#define`
/// replaces an existing definition; argument bindings pushed during
/// expansion shadow it temporarily.
#[derive(Debug, Clone, Default)]
pub struct MacroTable {
    entries: Vec<Macro>,
}

impl MacroTable {
    /// Defines `mac`, replacing a previous definition of the same name.
    pub fn define(&mut self, mac: Macro) {
        match self.position(&mac.name) {
            Some(index) => self.entries[index] = mac,
            None => self.entries.push(mac),
        }
    }

    /// Removes the most recent definition of `name`. Returns `false` if
    /// `name` was not defined.
    pub fn undef(&mut self, name: &str) -> bool {
        match self.position(name) {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }

    /// Returns `true` if `name` is defined.
    pub fn is_defined(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// The visible definition of `name`.
    pub fn get(&self, name: &str) -> Option<&Macro> {
        self.position(name).map(|index| &self.entries[index])
    }

    /// Number of entries, including shadowed ones.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no macro is defined.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index of the visible definition of `name`.
    pub(crate) fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().rposition(|m| m.name == name)
    }

    /// Index of the visible definition of `name` if it may be expanded now.
    pub(crate) fn expandable(&self, name: &str) -> Option<usize> {
        self.position(name).filter(|&i| !self.entries[i].expanding)
    }

    pub(crate) fn at(&self, index: usize) -> &Macro {
        &self.entries[index]
    }

    pub(crate) fn set_expanding(&mut self, index: usize, expanding: bool) {
        if let Some(m) = self.entries.get_mut(index) {
            m.expanding = expanding;
        }
    }

    /// Clears the expanding flag of the most recent definition of `name`
    /// that has it set.
    pub(crate) fn clear_expanding(&mut self, name: &str) {
        if let Some(m) = self
            .entries
            .iter_mut()
            .rev()
            .find(|m| m.expanding && m.name == name)
        {
            m.expanding = false;
        }
    }

    /// Pushes a definition that shadows any existing one.
    pub(crate) fn push_binding(&mut self, mac: Macro) {
        self.entries.push(mac);
    }
}
