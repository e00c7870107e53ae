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

use super::context::Context;
use super::error::PreprocessorError;
use super::token::{Token, TokenKind};

/// Two-character operators recognised as a single punctuation token.
const DIGRAPHS: [&[u8; 2]; 9] = [b">>", b">=", b"<<", b"<=", b"!=", b"==", b"||", b"&&", b"^^"];

// isspace() in the C locale.
fn is_space(c: u8) -> bool {
    matches!(c, b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c)
}

fn is_ident(c: u8) -> bool {
    c == b'_' || c.is_ascii_alphanumeric()
}

impl<'a> Context<'a> {
    /// Reads the next token, expanding macro invocations when `expand` is set.
    pub(crate) fn get_token(&mut self, expand: bool) -> Result<Token<'a>, PreprocessorError> {
        let token = self.lex();
        if expand && token.kind == TokenKind::Keyword {
            return self.expand_macro(token);
        }
        Ok(token)
    }

    fn lex(&mut self) -> Token<'a> {
        let src = self.source.as_bytes();
        let len = src.len();
        if self.pos >= len {
            return Token::eos();
        }

        let begin = self.pos;
        let c = src[begin];
        self.pos += 1;
        let at = |i: usize| src.get(i).copied();

        if c == b'\n' || (c == b'\r' && at(self.pos) == Some(b'\n')) {
            if c == b'\r' {
                self.pos += 1;
            }
            self.line += 1;
            self.bol = true;
            return self.span(TokenKind::Newline, begin);
        }

        if is_space(c) {
            while let Some(n) = at(self.pos) {
                if n == b'\r' || n == b'\n' || !is_space(n) {
                    break;
                }
                self.pos += 1;
            }
            return self.span(TokenKind::Whitespace, begin);
        }

        if c.is_ascii_digit() {
            self.bol = false;
            if c == b'0' && at(self.pos) == Some(b'x') {
                self.pos += 1;
                while at(self.pos).is_some_and(|n| n.is_ascii_hexdigit()) {
                    self.pos += 1;
                }
            } else {
                while at(self.pos).is_some_and(|n| n.is_ascii_digit()) {
                    self.pos += 1;
                }
            }
            return self.span(TokenKind::Number, begin);
        }

        if is_ident(c) {
            self.bol = false;
            while at(self.pos).is_some_and(is_ident) {
                self.pos += 1;
            }
            return self.span(TokenKind::Keyword, begin);
        }

        if c == b'"' || c == b'\'' {
            self.bol = false;
            while let Some(n) = at(self.pos) {
                if n == c {
                    break;
                }
                if n == b'\\' {
                    self.pos += 1;
                    if at(self.pos).is_none() {
                        break;
                    }
                }
                if at(self.pos) == Some(b'\n') {
                    self.line += 1;
                }
                self.pos += 1;
            }
            if self.pos < len {
                self.pos += 1;
            }
            return self.span(TokenKind::String, begin);
        }

        if c == b'/' && at(self.pos) == Some(b'/') {
            self.bol = false;
            self.pos += 1;
            while at(self.pos).is_some_and(|n| n != b'\r' && n != b'\n') {
                self.pos += 1;
            }
            return self.span(TokenKind::LineComment, begin);
        }

        if c == b'/' && at(self.pos) == Some(b'*') {
            self.bol = false;
            self.pos += 1;
            loop {
                match at(self.pos) {
                    None => break,
                    Some(b'*') if at(self.pos + 1) == Some(b'/') => {
                        self.pos += 2;
                        break;
                    }
                    Some(n) => {
                        if n == b'\n' {
                            self.line += 1;
                        }
                        self.pos += 1;
                    }
                }
            }
            return self.span(TokenKind::Comment, begin);
        }

        if c == b'#' && self.bol {
            while at(self.pos).is_some_and(|n| n == b' ' || n == b'\t') {
                self.pos += 1;
            }
            while at(self.pos).is_some_and(|n| !is_space(n)) {
                self.pos += 1;
            }
            return self.span(TokenKind::Directive, begin);
        }

        if c == b'\\' && matches!(at(self.pos), Some(b'\r') | Some(b'\n')) {
            if at(self.pos) == Some(b'\r') {
                self.pos += 1;
            }
            if at(self.pos) == Some(b'\n') {
                self.pos += 1;
            }
            self.line += 1;
            self.bol = true;
            return self.span(TokenKind::LineCont, begin);
        }

        self.bol = false;
        if let Some(n) = at(self.pos) {
            if DIGRAPHS.iter().any(|d| d[0] == c && d[1] == n) {
                self.pos += 1;
                return self.span(TokenKind::Punctuation, begin);
            }
        }
        // Any other character, possibly multi-byte.
        let width = self.source[begin..]
            .chars()
            .next()
            .map_or(1, char::len_utf8);
        self.pos = begin + width;
        self.span(TokenKind::Punctuation, begin)
    }

    fn span(&self, kind: TokenKind, begin: usize) -> Token<'a> {
        Token::new(kind, &self.source[begin..self.pos])
    }
}
