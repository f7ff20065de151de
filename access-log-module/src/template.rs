// Copyright 2024 Wladimir Palant
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Parsing of log format strings and their compilation into reusable templates
//!
//! A format string like `:method :url :status :res[content-length]` consists of literal text
//! and tokens. A token starts with `:` followed by at least two letters, digits, underscores or
//! hyphens. It can be followed by an argument list in square brackets, e.g. `:date[clf]` or
//! `:response-time[2]`. Multiple arguments are separated by commas.

use std::fmt;

/// Text rendered in place of a token that could not be resolved
pub const ABSENT_VALUE: &str = "-";

const TOKEN_PREFIX: char = ':';
const ARGS_START: u8 = b'[';
const ARGS_END: char = ']';
const MIN_NAME_LENGTH: usize = 2;

/// A token reference as found in a format string: token name and its arguments
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TokenRef {
    /// Name of the token, e.g. `res`
    pub name: String,
    /// Arguments of the token, e.g. `["content-length"]`
    ///
    /// A token without argument list has a single empty argument.
    pub args: Vec<String>,
}

impl TokenRef {
    /// Creates a token reference from a name and a list of arguments
    pub fn new<I, S>(name: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut args: Vec<String> = args.into_iter().map(Into::into).collect();
        if args.is_empty() {
            args.push(String::new());
        }
        Self {
            name: name.into(),
            args,
        }
    }

    /// Returns `false` if the token was used without arguments
    pub fn has_args(&self) -> bool {
        match self.args.as_slice() {
            [] => false,
            [arg] => !arg.is_empty(),
            _ => true,
        }
    }

    /// Returns the argument at the given position, `None` if it is missing or empty
    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args
            .get(index)
            .map(String::as_str)
            .filter(|arg| !arg.is_empty())
    }
}

impl fmt::Display for TokenRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{TOKEN_PREFIX}{}", self.name)?;
        if self.has_args() {
            write!(f, "[{}]", self.args.join(","))?;
        }
        Ok(())
    }
}

/// A piece of a parsed format string
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatSegment {
    /// Literal text, copied verbatim into the log line
    Text(String),
    /// A token resolved for each request
    Token(TokenRef),
}

fn is_name_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'-'
}

/// Splits a format string into literal text and tokens.
///
/// The result preserves the order of the format string. A text segment, possibly empty, is
/// emitted before each token and after the last one.
pub fn parse(format: &str) -> Vec<FormatSegment> {
    let bytes = format.as_bytes();
    let mut segments = Vec::new();
    let mut text_start = 0;
    let mut search_start = 0;

    while let Some(offset) = format[search_start..].find(TOKEN_PREFIX) {
        let start = search_start + offset;
        let name_start = start + 1;
        let name_end = name_start
            + bytes[name_start..]
                .iter()
                .take_while(|byte| is_name_byte(**byte))
                .count();
        if name_end - name_start < MIN_NAME_LENGTH {
            // Not a token, look for another token start further ahead
            search_start = name_start;
            continue;
        }

        let mut end = name_end;
        let mut args = Vec::new();
        if bytes.get(name_end) == Some(&ARGS_START) {
            let args_start = name_end + 1;
            // Empty brackets don’t make an argument list
            if let Some(length) = format[args_start..].find(ARGS_END).filter(|len| *len > 0) {
                args = format[args_start..args_start + length]
                    .split(',')
                    .map(|arg| arg.trim().to_owned())
                    .collect();
                end = args_start + length + 1;
            }
        }

        segments.push(FormatSegment::Text(format[text_start..start].to_owned()));
        segments.push(FormatSegment::Token(TokenRef::new(
            format[name_start..name_end].trim(),
            args,
        )));
        text_start = end;
        search_start = end;
    }

    segments.push(FormatSegment::Text(format[text_start..].to_owned()));
    segments
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Instruction {
    Literal(Box<str>),
    Token(usize),
}

/// A compiled format string
///
/// Compilation happens once, rendering a line afterwards only concatenates literal text and
/// token values. The template holds no per-request state and can be shared between threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    instructions: Vec<Instruction>,
    tokens: Vec<TokenRef>,
}

impl Template {
    /// Compiles a list of segments produced by [`parse`]
    pub fn compile(segments: Vec<FormatSegment>) -> Self {
        let mut instructions = Vec::new();
        let mut tokens: Vec<TokenRef> = Vec::new();
        let mut literal = String::new();

        for segment in segments {
            match segment {
                FormatSegment::Text(text) => literal.push_str(&text),
                FormatSegment::Token(token) => {
                    if !literal.is_empty() {
                        instructions.push(Instruction::Literal(literal.split_off(0).into()));
                    }

                    // Identical tokens are resolved only once
                    let index = match tokens.iter().position(|t| t == &token) {
                        Some(index) => index,
                        None => {
                            tokens.push(token);
                            tokens.len() - 1
                        }
                    };
                    instructions.push(Instruction::Token(index));
                }
            }
        }
        if !literal.is_empty() {
            instructions.push(Instruction::Literal(literal.into()));
        }

        Self {
            instructions,
            tokens,
        }
    }

    /// Distinct tokens referenced by this template, in order of their first occurrence
    pub fn tokens(&self) -> &[TokenRef] {
        &self.tokens
    }

    /// Produces a log line from resolved token values.
    ///
    /// `values[i]` is the value of `self.tokens()[i]`. Tokens without a value, whether `None`
    /// or missing from the list, are rendered as [`ABSENT_VALUE`].
    pub fn render(&self, values: &[Option<String>]) -> String {
        let mut result = String::new();
        for instruction in &self.instructions {
            match instruction {
                Instruction::Literal(text) => result.push_str(text),
                Instruction::Token(index) => result.push_str(
                    values
                        .get(*index)
                        .and_then(Option::as_deref)
                        .unwrap_or(ABSENT_VALUE),
                ),
            }
        }
        result
    }
}

impl From<&str> for Template {
    fn from(format: &str) -> Self {
        Self::compile(parse(format))
    }
}
