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

//! Tokens produced by the preprocessor lexer.

use std::borrow::Cow;

/// The lexical class of a [`Token`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// End of the source.
    Eos,
    /// A run of blanks, never containing a line break.
    Whitespace,
    /// `\n` or `\r\n`.
    Newline,
    /// A backslash immediately followed by a line break.
    LineCont,
    /// A `/* ... */` comment.
    Comment,
    /// A `// ...` comment, not including the line break.
    LineComment,
    /// `#` at the beginning of a line plus the directive word.
    Directive,
    /// An identifier.
    Keyword,
    /// A decimal or `0x` hexadecimal literal.
    Number,
    /// A single- or double-quoted literal.
    String,
    /// An operator or other symbol.
    Punctuation,
    /// Text accumulated from several tokens, typically an expansion result.
    Text,
}

impl TokenKind {
    /// Tokens that carry no meaning between the parts of an expression or
    /// an argument list.
    pub fn is_blank(&self) -> bool {
        matches!(
            self,
            TokenKind::Whitespace
                | TokenKind::Newline
                | TokenKind::Comment
                | TokenKind::LineComment
                | TokenKind::LineCont
        )
    }
}

/// A lexed token.
///
/// The text borrows from the source while the token is a plain span and is
/// promoted to an owned buffer as soon as something is appended to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    /// The lexical class.
    pub kind: TokenKind,
    /// The token text.
    pub text: Cow<'a, str>,
}

impl<'a> Token<'a> {
    /// Creates a token borrowing `text`.
    pub fn new(kind: TokenKind, text: &'a str) -> Self {
        Self {
            kind,
            text: Cow::Borrowed(text),
        }
    }

    /// Creates a token owning `text`.
    pub fn owned(kind: TokenKind, text: String) -> Self {
        Self {
            kind,
            text: Cow::Owned(text),
        }
    }

    /// The end-of-stream marker. It carries no text.
    pub fn eos() -> Self {
        Self::new(TokenKind::Eos, "")
    }

    /// An empty accumulator.
    pub fn empty_text() -> Self {
        Self::new(TokenKind::Text, "")
    }

    /// Detaches the token from the source it was lexed from.
    pub fn into_owned<'b>(self) -> Token<'b> {
        Token {
            kind: self.kind,
            text: Cow::Owned(self.text.into_owned()),
        }
    }

    /// Returns `true` if the token text is empty.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Returns `true` for a punctuation token starting with `c`.
    pub fn is_punct(&self, c: char) -> bool {
        self.kind == TokenKind::Punctuation && self.text.starts_with(c)
    }

    /// Appends the text of `other`.
    ///
    /// An empty accumulator takes over the other token's text without
    /// copying; anything else is promoted to an owned buffer.
    pub fn append(&mut self, other: &Token<'a>) {
        if other.text.is_empty() {
            return;
        }
        if self.text.is_empty() {
            self.text = other.text.clone();
        } else {
            self.text.to_mut().push_str(&other.text);
        }
    }

    /// Appends a plain string.
    pub fn append_str(&mut self, text: &str) {
        if !text.is_empty() {
            self.text.to_mut().push_str(text);
        }
    }

    /// Appends `count` line breaks.
    pub fn append_newlines(&mut self, count: usize) {
        if count > 0 {
            self.text.to_mut().push_str(&"\n".repeat(count));
        }
    }

    /// Number of `\n` characters in the text.
    pub fn count_newlines(&self) -> usize {
        match self.kind {
            TokenKind::Eos => 0,
            _ => self.text.bytes().filter(|&b| b == b'\n').count(),
        }
    }

    /// Interprets the text as an integer literal.
    ///
    /// Leading and trailing blanks are allowed. A `0x` prefix selects base
    /// 16 and any other leading `0` selects base 8.
    pub fn value(&self) -> Option<i64> {
        let text = self.text.trim_start();
        let (digits, radix) = if let Some(hex) = text.strip_prefix("0x") {
            (hex, 16)
        } else if text.starts_with('0') {
            (text, 8)
        } else {
            (text, 10)
        };

        let end = digits
            .find(|c: char| c.is_ascii_whitespace())
            .unwrap_or(digits.len());
        let (number, rest) = digits.split_at(end);
        if !rest.trim().is_empty() {
            return None;
        }

        let mut value: i64 = 0;
        for c in number.chars() {
            let digit = c.to_digit(radix)?;
            value = value
                .wrapping_mul(i64::from(radix))
                .wrapping_add(i64::from(digit));
        }
        Some(value)
    }

    /// Replaces the token with the decimal representation of `value`.
    pub fn set_value(&mut self, value: i64) {
        self.kind = TokenKind::Number;
        self.text = Cow::Owned(value.to_string());
    }
}
