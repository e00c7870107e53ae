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

//! Integer expressions of `#if` and `#elif`.

use super::context::Context;
use super::error::PreprocessorError;
use super::token::{Token, TokenKind};
use std::mem;

/// Binding strength of a binary operator, `0` if `op` is not one.
fn priority(op: &str) -> u32 {
    match op {
        "||" => 2,
        "&&" => 3,
        "|" => 4,
        "^" => 5,
        "&" => 6,
        "==" | "!=" => 7,
        "<" | ">" | "<=" | ">=" => 8,
        "<<" | ">>" => 9,
        "+" | "-" => 10,
        "*" | "/" | "%" => 11,
        _ => 0,
    }
}

/// Priority at which unary operands are parsed.
const UNARY_PRIORITY: u32 = 12;

impl<'a> Context<'a> {
    /// Parses an expression whose operators bind tighter than `min_priority`.
    ///
    /// Returns the folded value and the token that stopped the parse.
    pub(crate) fn get_expression(
        &mut self,
        line: usize,
        min_priority: u32,
    ) -> Result<(Token<'a>, Token<'a>), PreprocessorError> {
        let mut result = self.next_significant(true)?;
        let mut op = Token::new(TokenKind::Whitespace, "");

        if result.kind == TokenKind::Punctuation && result.text.len() == 1 {
            let c = result.text.chars().next().unwrap_or(' ');
            if matches!(c, '+' | '-' | '!' | '~') {
                let (operand, next) = self.get_expression(line, UNARY_PRIORITY)?;
                let value = match self.get_value(&operand, line) {
                    Ok(v) => v,
                    Err(_) => {
                        return Err(self.error(
                            line,
                            format!("Unary '{c}' not applicable"),
                            Some(&operand),
                        ));
                    }
                };
                result = operand;
                op = next;
                match c {
                    '-' => result.set_value(value.wrapping_neg()),
                    '!' => result.set_value(i64::from(value == 0)),
                    '~' => result.set_value(!value),
                    _ => result.set_value(value),
                }
            } else if c == '(' {
                let (inner, close) = self.get_expression(line, 1)?;
                if !close.is_punct(')') {
                    return Err(self.error(line, "Unclosed parenthesis in #if expression", None));
                }
                result = inner;
                op = self.get_token(true)?;
            }
        }

        while op.kind.is_blank() {
            op = self.get_token(true)?;
        }

        loop {
            if op.kind != TokenKind::Punctuation || op.text == ")" {
                return Ok((result, op));
            }

            let op_priority = priority(&op.text);
            if op_priority == 0 {
                return Err(self.error(line, "Expecting operator, got", Some(&op)));
            }
            if min_priority >= op_priority {
                return Ok((result, op));
            }

            let (rhs, next) = self.get_expression(line, op_priority)?;
            let left = match self.get_value(&result, line) {
                Ok(v) => v,
                Err(_) => {
                    return Err(self.error(
                        line,
                        format!("Left operand of '{}' is not a number", op.text),
                        Some(&result),
                    ));
                }
            };
            let right = match self.get_value(&rhs, line) {
                Ok(v) => v,
                Err(_) => {
                    return Err(self.error(
                        line,
                        format!("Right operand of '{}' is not a number", op.text),
                        Some(&rhs),
                    ));
                }
            };

            let value = match op.text.as_ref() {
                "||" => i64::from(left != 0 || right != 0),
                "&&" => i64::from(left != 0 && right != 0),
                "|" => left | right,
                "^" => left ^ right,
                "&" => left & right,
                "==" => i64::from(left == right),
                "!=" => i64::from(left != right),
                "<" => i64::from(left < right),
                ">" => i64::from(left > right),
                "<=" => i64::from(left <= right),
                ">=" => i64::from(left >= right),
                "<<" => left.wrapping_shl(right as u32),
                ">>" => left.wrapping_shr(right as u32),
                "+" => left.wrapping_add(right),
                "-" => left.wrapping_sub(right),
                "*" => left.wrapping_mul(right),
                "/" | "%" => {
                    if right == 0 {
                        return Err(self.error(line, "Division by zero", None));
                    }
                    if op.text == "/" {
                        left.wrapping_div(right)
                    } else {
                        left.wrapping_rem(right)
                    }
                }
                _ => 0,
            };
            result.set_value(value);
            op = next;
        }
    }

    /// Evaluates `token` to an integer.
    ///
    /// Text is parsed as a full expression; an identifier that is not an
    /// expandable object-like macro evaluates to `0`.
    pub(crate) fn get_value(
        &mut self,
        token: &Token<'_>,
        line: usize,
    ) -> Result<i64, PreprocessorError> {
        if matches!(
            token.kind,
            TokenKind::Keyword | TokenKind::Text | TokenKind::Number | TokenKind::Eos
        ) && token.text.trim().is_empty()
        {
            return Err(self.error(line, "Trying to evaluate an empty expression", None));
        }

        let evaluated;
        let token = if token.kind == TokenKind::Text {
            let mut sub = Context::new(&token.text, mem::take(&mut self.macros), self.max_rescan);
            let parsed = sub.get_expression(line, 0);
            let garbage = match &parsed {
                Ok((_, rest)) if rest.kind != TokenKind::Eos => Some(rest.clone().into_owned()),
                _ => None,
            };
            let parsed = parsed.map(|(value, _)| value.into_owned());
            self.macros = sub.into_macros();

            if let Some(rest) = garbage {
                return Err(self.error(line, "Garbage after expression", Some(&rest)));
            }
            evaluated = parsed?;
            &evaluated
        } else {
            token
        };

        match token.kind {
            TokenKind::Keyword => {
                let object_like = self
                    .macros
                    .expandable(&token.text)
                    .filter(|&i| !self.macros.at(i).function_like);
                let Some(index) = object_like else {
                    return Ok(0);
                };
                let name = token.text.clone().into_owned();
                let expanded = self.expand_macro(Token::owned(TokenKind::Keyword, name.clone()))?;
                self.macros.set_expanding(index, true);
                let value = self.get_value(&expanded, line);
                self.macros.clear_expanding(&name);
                value
            }
            TokenKind::Text | TokenKind::Number => match token.value() {
                Some(v) => Ok(v),
                None => Err(self.error(line, "Not a numeric expression", Some(token))),
            },
            _ => Err(self.error(line, "Unexpected token", Some(token))),
        }
    }
}
