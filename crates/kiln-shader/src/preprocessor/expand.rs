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

//! Macro invocation: argument collection and body rescanning.

use super::context::Context;
use super::error::PreprocessorError;
use super::macros::{Macro, MacroTable, ARG_SUFFIX};
use super::token::{Token, TokenKind};
use std::mem;

/// Upper bound on the number of arguments of one invocation.
pub(crate) const MAX_MACRO_ARGS: usize = 16;

impl<'a> Context<'a> {
    /// Expands `ident` if it names a macro that is not already being
    /// expanded. Returns the identifier unchanged otherwise, or when a
    /// function-like macro is not followed by an argument list.
    pub(crate) fn expand_macro(&mut self, ident: Token<'a>) -> Result<Token<'a>, PreprocessorError> {
        let Some(index) = self.macros.expandable(&ident.text) else {
            return Ok(ident);
        };

        let old_line = self.line;
        let (function_like, arity, builtin) = {
            let m = self.macros.at(index);
            (m.function_like, m.params.len(), m.builtin)
        };

        let mut args = Vec::new();
        if function_like {
            let mark = self.mark();
            match self.get_arguments(builtin.is_none(), false)? {
                Some(list) => args = list,
                None => {
                    self.reset_to(mark);
                    return Ok(ident);
                }
            }
        }

        // `F()` passes one empty argument to a macro declared without
        // parameters.
        let empty_call = arity == 0 && args.len() == 1 && args[0].is_empty();
        if args.len() > arity && !empty_call {
            return Err(self.error(
                old_line,
                format!(
                    "Macro `{}' passed {} arguments, but takes just {}",
                    ident.text,
                    args.len(),
                    arity
                ),
                None,
            ));
        }

        let mut result = match builtin {
            Some(expander) => expander(&self.macros, &args, old_line)?,
            None => self.expand_body(index, &args)?,
        };
        result.append_newlines(self.line - old_line);
        Ok(result)
    }

    /// Substitutes `args` into the body of the macro at `index` and rescans
    /// the result until it stops changing.
    fn expand_body(
        &mut self,
        index: usize,
        args: &[String],
    ) -> Result<Token<'static>, PreprocessorError> {
        let (name, params, body) = {
            let m = self.macros.at(index);
            (m.name.clone(), m.params.clone(), m.body.clone())
        };

        self.macros.set_expanding(index, true);
        let mut table = mem::take(&mut self.macros);
        for (i, param) in params.iter().enumerate() {
            let value = args.get(i).cloned().unwrap_or_default();
            table.push_binding(Macro::object(param.clone(), value));
        }

        let mut current = body;
        let mut unbound = false;
        let mut rescans = 0usize;
        let outcome = loop {
            let mut nested = Context::new(&current, table, self.max_rescan);
            nested.supplementary = true;
            let parsed = nested.parse();
            table = nested.into_macros();

            // Arguments are substituted by the first pass only.
            if !unbound {
                for param in params.iter().rev() {
                    table.undef(param);
                }
                unbound = true;
            }

            match parsed {
                Err(e) => break Err(e),
                Ok(text) if text == current => break Ok(text),
                Ok(text) => {
                    rescans += 1;
                    if rescans >= self.max_rescan {
                        log::warn!(
                            "Preprocessor: macro `{}' still changing after {} rescans, keeping last result",
                            name,
                            rescans
                        );
                        break Ok(text);
                    }
                    current = text;
                }
            }
        };

        self.macros = table;
        self.macros.clear_expanding(&name);
        outcome.map(|text| Token::owned(TokenKind::Text, text))
    }

    /// Reads a parenthesised argument list.
    ///
    /// Returns `None` when the next token is not `(`; the caller is expected
    /// to reset the context. With `append_suffix` set every argument gets
    /// the parameter suffix, which is how `#define` collects parameter names.
    pub(crate) fn get_arguments(
        &mut self,
        expand: bool,
        append_suffix: bool,
    ) -> Result<Option<Vec<String>>, PreprocessorError> {
        let first = self.get_token(expand)?;
        if !(first.kind == TokenKind::Punctuation && first.text == "(") {
            return Ok(None);
        }

        let mut args = Vec::new();
        loop {
            if args.len() == MAX_MACRO_ARGS {
                return Err(self.error(self.line, "Too many arguments to macro", None));
            }
            let (arg, terminator) = self.get_argument(expand, append_suffix)?;
            args.push(arg);
            if terminator == ')' {
                return Ok(Some(args));
            }
        }
    }

    /// Reads one argument up to the `,` or `)` at parenthesis depth zero.
    fn get_argument(
        &mut self,
        expand: bool,
        append_suffix: bool,
    ) -> Result<(String, char), PreprocessorError> {
        let first = self.next_significant(expand)?;
        match first.kind {
            TokenKind::Eos => {
                return Err(self.error(self.line, "Unfinished list of arguments", None));
            }
            TokenKind::Punctuation if first.text == "," || first.text == ")" => {
                let terminator = if first.text == "," { ',' } else { ')' };
                return Ok((String::new(), terminator));
            }
            TokenKind::Keyword => {}
            _ if !expand => {
                return Err(self.error(self.line, "Unexpected token", Some(&first)));
            }
            _ => {}
        }

        let mut depth = usize::from(first.is_punct('('));
        let mut arg = first.text.into_owned();
        let mut trimmed_len = arg.len();

        loop {
            let t = self.get_token(expand)?;
            match t.kind {
                TokenKind::Eos => {
                    return Err(self.error(self.line, "Unfinished list of arguments", None));
                }
                TokenKind::LineCont
                | TokenKind::Comment
                | TokenKind::LineComment
                | TokenKind::Newline => continue,
                TokenKind::Punctuation => {
                    if t.text.starts_with('(') {
                        depth += 1;
                    } else if depth == 0 && (t.text == "," || t.text == ")") {
                        arg.truncate(trimmed_len);
                        if append_suffix {
                            arg.push_str(ARG_SUFFIX);
                        }
                        let terminator = if t.text == "," { ',' } else { ')' };
                        return Ok((arg, terminator));
                    } else if t.text.starts_with(')') {
                        depth -= 1;
                    }
                }
                _ => {}
            }

            if !expand && t.kind != TokenKind::Whitespace {
                return Err(self.error(self.line, "Unexpected token", Some(&t)));
            }
            arg.push_str(&t.text);
            if t.kind != TokenKind::Whitespace {
                trimmed_len = arg.len();
            }
        }
    }
}

/// Expander of the `defined(NAME)` operator available in `#if`/`#elif`.
pub(crate) fn expand_defined(
    macros: &MacroTable,
    args: &[String],
    line: usize,
) -> Result<Token<'static>, PreprocessorError> {
    if args.len() != 1 {
        let err = PreprocessorError {
            line,
            message: "The defined() function takes exactly one argument".into(),
            token: None,
        };
        log::error!("Preprocessor: {err}");
        return Err(err);
    }
    let value = if macros.is_defined(args[0].trim()) { "1" } else { "0" };
    Ok(Token::new(TokenKind::Number, value))
}
