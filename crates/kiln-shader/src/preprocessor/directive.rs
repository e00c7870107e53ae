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

use super::context::{output_enabled, Context};
use super::error::PreprocessorError;
use super::macros::{Macro, MacroTable, ARG_SUFFIX};
use super::token::{Token, TokenKind};

impl<'a> Context<'a> {
    /// Executes the directive `directive`, whose arguments extend to the end
    /// of the line.
    ///
    /// Returns the token that ended the directive (a newline or the end of
    /// the stream). Unknown directives are handed back unchanged as text and
    /// the context is reset to just after the directive word.
    pub(crate) fn handle_directive(
        &mut self,
        directive: Token<'a>,
        line: usize,
    ) -> Result<Token<'a>, PreprocessorError> {
        let after_word = self.mark();

        let mut body = Token::empty_text();
        let last = loop {
            let t = self.get_token(false)?;
            match t.kind {
                TokenKind::Newline | TokenKind::Eos => break Some(t),
                k if k.is_blank() => continue,
                _ => {
                    body.append(&t);
                    break None;
                }
            }
        };
        let last = match last {
            Some(t) => t,
            None => loop {
                let t = self.get_token(false)?;
                match t.kind {
                    TokenKind::Eos | TokenKind::Newline => break t,
                    TokenKind::LineComment | TokenKind::Comment | TokenKind::LineCont => {}
                    _ => body.append(&t),
                }
            },
        };
        body.kind = TokenKind::Text;

        let name = directive.text[1..].trim_start().to_owned();
        let enabled = output_enabled(self.enable_output);
        match name.as_str() {
            "define" => {
                if enabled {
                    self.handle_define(&body.text, line)?;
                }
            }
            "undef" => {
                if enabled {
                    self.handle_undef(&body.text, line)?;
                }
            }
            "ifdef" => self.handle_ifdef(&body.text, line)?,
            "ifndef" => {
                self.handle_ifdef(&body.text, line)?;
                self.enable_output ^= 1;
                self.enable_elif ^= 1;
            }
            "if" => {
                // Expressions in dead branches are not evaluated.
                let value = if enabled {
                    self.get_value_def(&body, line)? != 0
                } else {
                    false
                };
                self.handle_if(value, line)?;
            }
            "elif" => self.handle_elif(&body, line)?,
            "else" => self.handle_else(&body, line)?,
            "endif" => self.handle_endif(&body, line)?,
            _ => {
                self.reset_to(after_word);
                return Ok(Token {
                    kind: TokenKind::Text,
                    text: directive.text,
                });
            }
        }
        Ok(last)
    }

    fn handle_define(&mut self, body: &str, line: usize) -> Result<(), PreprocessorError> {
        let mut sub = Context::new(body, MacroTable::default(), self.max_rescan);
        let name = sub.get_token(false)?;
        if name.kind != TokenKind::Keyword {
            return Err(self.error(line, "Macro name expected after #define", None));
        }

        let mark = sub.mark();
        let params = match sub.get_arguments(false, true)? {
            Some(params) => Some(params),
            None => {
                sub.reset_to(mark);
                None
            }
        };

        let value = loop {
            let mark = sub.mark();
            let t = sub.get_token(false)?;
            match t.kind {
                TokenKind::Whitespace => continue,
                TokenKind::Newline | TokenKind::Eos => break String::new(),
                _ => {
                    sub.reset_to(mark);
                    break sub.source[sub.pos..].to_owned();
                }
            }
        };

        let mac = match params {
            None => Macro::object(name.text.as_ref(), value),
            Some(params) => {
                // `F()` declares a function-like macro without parameters.
                let params: Vec<String> = if params.len() == 1 && params[0].is_empty() {
                    Vec::new()
                } else {
                    params
                };
                let value = self.suffix_parameters(&value, &params)?;
                Macro::function(name.text.as_ref(), params, value)
            }
        };
        log::trace!("Preprocessor: #define {} at line {}", mac.name, line);
        self.macros.define(mac);
        Ok(())
    }

    /// Rewrites each parameter reference in `body` to its suffixed name.
    fn suffix_parameters(&self, body: &str, params: &[String]) -> Result<String, PreprocessorError> {
        if params.is_empty() || body.is_empty() {
            return Ok(body.to_owned());
        }
        let mut table = MacroTable::default();
        for param in params {
            let plain = param.strip_suffix(ARG_SUFFIX).unwrap_or(param);
            table.define(Macro::object(plain, param.as_str()));
        }
        Context::new(body, table, self.max_rescan).parse()
    }

    fn handle_undef(&mut self, body: &str, line: usize) -> Result<(), PreprocessorError> {
        let mut sub = Context::new(body, MacroTable::default(), self.max_rescan);
        let name = sub.get_token(false)?;
        if name.kind != TokenKind::Keyword {
            return Err(self.error(
                line,
                "Expecting a macro name after #undef, got",
                Some(&name),
            ));
        }
        self.macros.undef(&name.text);

        if sub.next_significant(false)?.kind != TokenKind::Eos {
            self.warn(line, "Warning: Ignoring garbage after directive");
        }
        Ok(())
    }

    fn handle_ifdef(&mut self, body: &str, line: usize) -> Result<(), PreprocessorError> {
        let mut sub = Context::new(body, MacroTable::default(), self.max_rescan);
        let name = sub.get_token(false)?;
        if name.kind != TokenKind::Keyword {
            return Err(self.error(
                line,
                "Expecting a macro name after #ifdef, got",
                Some(&name),
            ));
        }
        let defined = self.macros.is_defined(&name.text);
        self.handle_if(defined, line)?;

        if sub.next_significant(false)?.kind != TokenKind::Eos {
            self.warn(line, "Warning: Ignoring garbage after directive");
        }
        Ok(())
    }

    /// Opens a conditional level.
    fn handle_if(&mut self, value: bool, line: usize) -> Result<(), PreprocessorError> {
        if self.enable_output & 0x8000_0000 != 0 {
            return Err(self.error(line, "Too many embedded #if directives", None));
        }
        self.enable_output <<= 1;
        self.enable_elif <<= 1;
        if value {
            self.enable_output |= 1;
        } else {
            self.enable_elif |= 1;
        }
        Ok(())
    }

    fn handle_elif(&mut self, body: &Token<'a>, line: usize) -> Result<(), PreprocessorError> {
        if self.enable_output == 1 {
            return Err(self.error(line, "#elif without #if", None));
        }

        let parent_enabled = output_enabled(self.enable_output >> 1);
        let value = if parent_enabled && self.enable_elif & 1 != 0 {
            self.get_value_def(body, line)? != 0
        } else {
            false
        };

        if value && self.enable_elif & 1 != 0 {
            self.enable_output |= 1;
            self.enable_elif &= !1;
        } else {
            self.enable_output &= !1;
        }
        Ok(())
    }

    fn handle_else(&mut self, body: &Token<'a>, line: usize) -> Result<(), PreprocessorError> {
        if self.enable_output == 1 {
            return Err(self.error(line, "#else without #if", None));
        }
        if self.enable_elif & 1 != 0 || self.enable_output & 1 != 0 {
            self.enable_output ^= 1;
        }
        if !body.text.trim().is_empty() {
            self.warn(line, "Warning: Ignoring garbage after #else");
        }
        Ok(())
    }

    fn handle_endif(&mut self, body: &Token<'a>, line: usize) -> Result<(), PreprocessorError> {
        self.enable_elif >>= 1;
        self.enable_output >>= 1;
        if self.enable_output == 0 {
            return Err(self.error(line, "#endif without #if", None));
        }
        if !body.text.trim().is_empty() {
            self.warn(line, "Warning: Ignoring garbage after #endif");
        }
        Ok(())
    }

    /// Evaluates `body` with the `defined()` operator available.
    pub(crate) fn get_value_def(
        &mut self,
        body: &Token<'a>,
        line: usize,
    ) -> Result<i64, PreprocessorError> {
        self.macros.push_binding(Macro::builtin(
            "defined",
            1,
            super::expand::expand_defined,
        ));
        let result = self.get_value(body, line);
        self.macros.undef("defined");
        result
    }
}
