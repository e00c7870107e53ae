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

//! A C-style preprocessor for shader sources.
//!
//! Supports `#define` (object- and function-like), `#undef`, `#if`,
//! `#ifdef`, `#ifndef`, `#elif`, `#else`, `#endif` and `defined()`.
//! Other directives such as `#version` or `#extension` are passed through
//! untouched. Line structure is preserved: every suppressed or consumed line
//! is replaced by an empty one, so compiler diagnostics on the output refer
//! to the lines of the input.

mod context;
mod directive;
mod error;
mod expand;
mod expression;
mod lexer;
mod macros;
mod token;

pub use error::PreprocessorError;
pub use macros::{Macro, MacroTable};
pub use token::{Token, TokenKind};

use context::Context;
use kiln_core::renderer::ShaderSettings;
use std::mem;

/// Default cap on macro-body rescans.
const DEFAULT_MAX_RESCAN: usize = 64;

/// A reusable preprocessor.
///
/// Macros defined through [`define`](Self::define) or by `#define` lines of
/// a parsed source stay defined for later calls to [`parse`](Self::parse).
#[derive(Debug, Clone)]
pub struct Preprocessor {
    macros: MacroTable,
    max_rescan: usize,
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}

impl Preprocessor {
    /// Creates a preprocessor with no macros defined.
    pub fn new() -> Self {
        Self {
            macros: MacroTable::default(),
            max_rescan: DEFAULT_MAX_RESCAN,
        }
    }

    /// Creates a preprocessor using the limits of `settings`.
    pub fn with_settings(settings: &ShaderSettings) -> Self {
        Self {
            macros: MacroTable::default(),
            max_rescan: settings.max_rescan_iterations.max(1),
        }
    }

    /// Defines an object-like macro.
    pub fn define(&mut self, name: &str, value: &str) {
        self.macros.define(Macro::object(name, value));
    }

    /// Defines every entry of a `NAME[=VALUE]` list separated by `,` or `;`.
    ///
    /// Entries without a value are defined as empty macros. Blank entries
    /// are ignored.
    pub fn define_list(&mut self, list: &str) {
        for entry in list.split([',', ';']) {
            let entry = entry.trim();
            if entry.is_empty() {
                continue;
            }
            match entry.split_once('=') {
                Some((name, value)) => self.define(name.trim(), value.trim()),
                None => self.define(entry, ""),
            }
        }
    }

    /// Removes the macro `name`. Returns `false` if it was not defined.
    pub fn undef(&mut self, name: &str) -> bool {
        self.macros.undef(name)
    }

    /// Returns `true` if `name` is defined.
    pub fn is_defined(&self, name: &str) -> bool {
        self.macros.is_defined(name)
    }

    /// The macros currently defined.
    pub fn macros(&self) -> &MacroTable {
        &self.macros
    }

    /// Preprocesses `source`.
    pub fn parse(&mut self, source: &str) -> Result<String, PreprocessorError> {
        let mut ctx = Context::new(source, mem::take(&mut self.macros), self.max_rescan);
        let result = ctx.parse();
        self.macros = ctx.into_macros();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(source: &str) -> String {
        Preprocessor::new().parse(source).unwrap()
    }

    fn significant_lines(output: &str) -> Vec<&str> {
        output
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect()
    }

    #[test]
    fn test_function_like_macro() {
        let out = run("#define M(a,b) a+b\nM(1,2)");
        assert_eq!(out, "\n1+2");
    }

    #[test]
    fn test_object_like_macro_and_nesting() {
        let out = run("#define A B\n#define B 3\nint x = A;\n");
        assert_eq!(significant_lines(&out), vec!["int x = 3;"]);
    }

    #[test]
    fn test_if_else_preserves_line_count() {
        let source = "#if 1\nA\n#else\nB\n#endif\nC";
        let out = run(source);
        assert_eq!(significant_lines(&out), vec!["A", "C"]);
        assert_eq!(out.lines().count(), source.lines().count());
        assert_eq!(out.lines().nth(1), Some("A"));
        assert_eq!(out.lines().nth(5), Some("C"));
    }

    #[test]
    fn test_ifdef_suppresses_body() {
        let out = run("#ifdef UNDEFINED\nhidden\n#endif\nshown");
        assert_eq!(significant_lines(&out), vec!["shown"]);
        assert_eq!(out.lines().nth(3), Some("shown"));
    }

    #[test]
    fn test_ifndef_and_elif_chain() {
        let source = "#define LEVEL 2\n\
                      #ifndef LEVEL\nnone\n\
                      #elif LEVEL == 1\none\n\
                      #elif LEVEL == 2\ntwo\n\
                      #else\nother\n#endif\n";
        assert_eq!(significant_lines(&run(source)), vec!["two"]);
    }

    #[test]
    fn test_defined_operator_and_arithmetic() {
        let source = "#define FOO\n\
                      #if defined(FOO) && (1 + 2 * 3 == 7) && !defined(BAR)\nyes\n#endif\n\
                      #if (0x10 >> 2) != 4 || -1 > 0\nno\n#endif\n";
        assert_eq!(significant_lines(&run(source)), vec!["yes"]);
    }

    #[test]
    fn test_undefined_identifier_is_zero() {
        assert!(significant_lines(&run("#if MISSING\nx\n#endif\n")).is_empty());
    }

    #[test]
    fn test_unknown_directive_passes_through() {
        let out = run("#version 150\n#extension GL_ARB_foo : enable\nvoid main() {}\n");
        let lines = significant_lines(&out);
        assert_eq!(lines[0], "#version 150");
        assert_eq!(lines[1], "#extension GL_ARB_foo : enable");
        assert_eq!(lines[2], "void main() {}");
    }

    #[test]
    fn test_undef() {
        let out = run("#define X 1\n#undef X\nX\n");
        assert_eq!(significant_lines(&out), vec!["X"]);
    }

    #[test]
    fn test_dead_branch_skips_defines() {
        let mut pp = Preprocessor::new();
        pp.parse("#if 0\n#define HIDDEN 1\n#endif\n").unwrap();
        assert!(!pp.is_defined("HIDDEN"));
    }

    #[test]
    fn test_line_continuation_keeps_lines() {
        let source = "#define LONG 1 + \\\n 2\nLONG\nend";
        let out = run(source);
        assert_eq!(out.lines().count(), source.lines().count());
        assert_eq!(out.lines().nth(3), Some("end"));
    }

    #[test]
    fn test_macro_not_followed_by_call_is_left_alone() {
        let out = run("#define F(x) x*2\nint F;\nF(3)");
        assert_eq!(significant_lines(&out), vec!["int F;", "3*2"]);
    }

    #[test]
    fn test_empty_parameter_list() {
        let out = run("#define F() 42\nF()");
        assert_eq!(significant_lines(&out), vec!["42"]);
    }

    #[test]
    fn test_nested_macro_arguments() {
        let out = run("#define ADD(a,b) (a+b)\n#define TWICE(x) ADD(x,x)\nTWICE(ADD(1,2))");
        assert_eq!(significant_lines(&out), vec!["((1+2)+(1+2))"]);
    }

    #[test]
    fn test_self_referential_macro_terminates() {
        let out = run("#define X X+1\nX");
        assert_eq!(significant_lines(&out), vec!["X+1"]);
    }

    #[test]
    fn test_comments_are_replaced() {
        let out = run("a /* one\ntwo */ b // tail\nc");
        assert_eq!(out, "a  \n b \nc");
    }

    #[test]
    fn test_define_list() {
        let mut pp = Preprocessor::new();
        pp.define_list("A=1, B;C = 3");
        assert_eq!(pp.parse("A B C").unwrap(), "1  3");
    }

    #[test]
    fn test_errors() {
        let cases = [
            ("#if 1\nx\n", "Unclosed #if at end of source"),
            ("#endif\n", "#endif without #if"),
            ("#else\n", "#else without #if"),
            ("#elif 1\n", "#elif without #if"),
            ("#if 1 / 0\n#endif\n", "Division by zero"),
            ("#define\n", "Macro name expected after #define"),
            ("#undef 3\n", "Expecting a macro name after #undef, got"),
            ("#define F(a) a\nF(1,2)\n", "Macro `F' passed 2 arguments, but takes just 1"),
            ("#define F(a) a\nF(1", "Unfinished list of arguments"),
            ("#if\n#endif\n", "Trying to evaluate an empty expression"),
            ("#if 1 2\n#endif\n", "Garbage after expression"),
        ];
        for (source, message) in cases {
            let err = Preprocessor::new().parse(source).unwrap_err();
            assert_eq!(err.message, message, "source: {source:?}");
        }
    }

    #[test]
    fn test_error_reports_line() {
        let err = Preprocessor::new()
            .parse("a\nb\n#if 4 % 0\n#endif\n")
            .unwrap_err();
        assert_eq!(err.line, 3);
    }

    #[test]
    fn test_rescan_cap() {
        let settings = ShaderSettings {
            max_rescan_iterations: 2,
            ..Default::default()
        };
        let mut pp = Preprocessor::with_settings(&settings);
        pp.define("A", "B");
        pp.define("B", "C");
        pp.define("C", "D");
        assert_eq!(pp.parse("A").unwrap(), "D");
    }
}
