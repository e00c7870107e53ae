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

use super::error::PreprocessorError;
use super::macros::MacroTable;
use super::token::{Token, TokenKind};

/// Returns `true` if every nesting level of the conditional stack is
/// enabled: the low bits up to the sentinel are all set.
pub(crate) fn output_enabled(enable_output: u32) -> bool {
    enable_output & enable_output.wrapping_add(1) == 0
}

/// Position of a [`Context`] in its source, used to put tokens back.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Mark {
    pos: usize,
    line: usize,
    bol: bool,
}

/// The state of one preprocessing run over one piece of text.
///
/// Nested runs (macro bodies, directive arguments, `#if` expressions) get
/// their own context; the macro table is moved into the nested context and
/// handed back afterwards.
#[derive(Debug)]
pub(crate) struct Context<'a> {
    pub(crate) source: &'a str,
    pub(crate) pos: usize,
    pub(crate) line: usize,
    pub(crate) bol: bool,
    /// One bit per `#if` nesting level with a sentinel bit above the
    /// innermost level. A set bit means the level emits output.
    pub(crate) enable_output: u32,
    /// One bit per level; set while an `#elif`/`#else` may still be taken.
    pub(crate) enable_elif: u32,
    /// Set for macro-body rescans, where `#` is dropped from the output.
    pub(crate) supplementary: bool,
    pub(crate) macros: MacroTable,
    pub(crate) max_rescan: usize,
}

impl<'a> Context<'a> {
    pub(crate) fn new(source: &'a str, macros: MacroTable, max_rescan: usize) -> Self {
        Self {
            source,
            pos: 0,
            line: 1,
            bol: true,
            enable_output: 1,
            enable_elif: 0,
            supplementary: false,
            macros,
            max_rescan,
        }
    }

    pub(crate) fn into_macros(self) -> MacroTable {
        self.macros
    }

    pub(crate) fn mark(&self) -> Mark {
        Mark {
            pos: self.pos,
            line: self.line,
            bol: self.bol,
        }
    }

    pub(crate) fn reset_to(&mut self, mark: Mark) {
        self.pos = mark.pos;
        self.line = mark.line;
        self.bol = mark.bol;
    }

    /// Builds and logs an error.
    pub(crate) fn error(
        &self,
        line: usize,
        message: impl Into<String>,
        token: Option<&Token<'_>>,
    ) -> PreprocessorError {
        let err = PreprocessorError {
            line,
            message: message.into(),
            token: token.map(|t| t.text.clone().into_owned()),
        };
        log::error!("Preprocessor: {err}");
        err
    }

    pub(crate) fn warn(&self, line: usize, message: &str) {
        log::warn!("Preprocessor: line {line}: {message}");
    }

    /// Skips blank tokens and returns the first meaningful one.
    pub(crate) fn next_significant(
        &mut self,
        expand: bool,
    ) -> Result<Token<'a>, PreprocessorError> {
        loop {
            let t = self.get_token(expand)?;
            if !t.kind.is_blank() {
                return Ok(t);
            }
        }
    }

    /// Preprocesses the whole source.
    pub(crate) fn parse(&mut self) -> Result<String, PreprocessorError> {
        self.line = 1;
        self.bol = true;
        self.enable_output = 1;
        self.enable_elif = 0;

        let mut output = Token::empty_text();
        let mut empty_lines = 0usize;
        let mut enabled = true;
        let mut disabled_since = 0usize;

        loop {
            let old_line = self.line;
            // Dead branches are only scanned for directives.
            let mut t = self.get_token(enabled)?;

            loop {
                match t.kind {
                    TokenKind::Eos => break,
                    TokenKind::Comment => {
                        if enabled {
                            output.append_str(" ");
                            output.append_newlines(self.line - old_line);
                        }
                    }
                    TokenKind::LineComment => {}
                    TokenKind::Directive => {
                        t = self.handle_directive(t, old_line)?;

                        let now_enabled = output_enabled(self.enable_output);
                        if now_enabled != enabled {
                            if now_enabled {
                                output.append_newlines(old_line.saturating_sub(disabled_since));
                            } else {
                                disabled_since = old_line;
                            }
                            enabled = now_enabled;
                        }
                        if enabled {
                            let consumed = self.line.saturating_sub(old_line);
                            output.append_newlines(consumed.saturating_sub(t.count_newlines()));
                        }
                        continue;
                    }
                    TokenKind::LineCont => empty_lines += 1,
                    TokenKind::Punctuation => {
                        if enabled && !(self.supplementary && t.text.starts_with('#')) {
                            output.append(&t);
                        }
                    }
                    TokenKind::Newline => {
                        if empty_lines > 0 {
                            if enabled {
                                output.append_newlines(empty_lines);
                            }
                            empty_lines = 0;
                        }
                        if enabled {
                            output.append(&t);
                        }
                    }
                    _ => {
                        if enabled {
                            output.append(&t);
                        }
                    }
                }
                break;
            }

            if t.kind == TokenKind::Eos {
                break;
            }
        }

        if self.enable_output != 1 {
            return Err(self.error(self.line, "Unclosed #if at end of source", None));
        }
        Ok(output.text.into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_enabled_bits() {
        assert!(output_enabled(0b1));
        assert!(output_enabled(0b11));
        assert!(output_enabled(0b111));
        assert!(!output_enabled(0b10));
        assert!(!output_enabled(0b101));
        assert!(!output_enabled(0b110));
    }
}
