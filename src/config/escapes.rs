// Copyright 2025 Eric Jingryd (tidynest@proton.me)
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

//! src/config/escapes.rs
//!
//! Escape sequences for prefix/suffix settings
//!
//! Scanner suffixes are usually control characters, which are awkward to
//! type into a JSON file or a shell. Settings store them escaped:
//!
//! | Written               | Means          |
//! |-----------------------|----------------|
//! | `\r`, `<enter>`, `<return>` | carriage return |
//! | `\n`                  | line feed      |
//! | `\t`, `<tab>`         | tab            |
//! | `\\`                  | backslash      |
//! | `\<`                  | literal `<`    |
//!
//! Named keys are case-insensitive. A `<` that does not start a named key is
//! taken literally.
//!
//! # Architecture
//! The decoder uses nom combinators; each token is tried in order
//! escaped character, named key, literal run.

use nom::{
    branch::alt,
    bytes::complete::{is_not, tag, tag_no_case},
    character::complete::char,
    combinator::{map, value},
    sequence::preceded,
    IResult, Parser,
};
use thiserror::Error;

/// Escape decoding errors with position context
#[derive(Debug, Error, PartialEq)]
pub enum EscapeError {
    #[error("Unknown escape sequence '{sequence}' at position {position}")]
    UnknownEscape { sequence: String, position: usize },

    #[error("Dangling backslash at end of input")]
    DanglingBackslash,
}

enum Token<'a> {
    Char(char),
    Literal(&'a str),
}

/// Parse a backslash escape (`\r`, `\n`, `\t`, `\\`, `\<`)
fn escaped_char(input: &str) -> IResult<&str, char> {
    preceded(
        char('\\'),
        alt((
            value('\r', char('r')),
            value('\n', char('n')),
            value('\t', char('t')),
            value('\\', char('\\')),
            value('<', char('<')),
        )),
    )
    .parse(input)
}

/// Parse a named key (`<enter>`, `<return>`, `<tab>`)
fn named_key(input: &str) -> IResult<&str, char> {
    alt((
        value('\r', tag_no_case("<enter>")),
        value('\r', tag_no_case("<return>")),
        value('\t', tag_no_case("<tab>")),
    ))
    .parse(input)
}

fn token(input: &str) -> IResult<&str, Token<'_>> {
    alt((
        map(escaped_char, Token::Char),
        map(named_key, Token::Char),
        map(is_not("\\<"), Token::Literal),
        map(tag("<"), Token::Literal),
    ))
    .parse(input)
}

/// Decode an escaped setting value into the characters it stands for
///
/// # Example
/// ```
/// use openqr::config::escapes::decode_escapes;
///
/// assert_eq!(decode_escapes(r"qr_").unwrap(), "qr_");
/// assert_eq!(decode_escapes(r"\r").unwrap(), "\r");
/// assert_eq!(decode_escapes("<Enter>").unwrap(), "\r");
/// assert!(decode_escapes(r"\x").is_err());
/// ```
pub fn decode_escapes(input: &str) -> Result<String, EscapeError> {
    let mut decoded = String::with_capacity(input.len());
    let mut rest = input;

    while !rest.is_empty() {
        match token(rest) {
            Ok((next, Token::Char(c))) => {
                decoded.push(c);
                rest = next;
            }
            Ok((next, Token::Literal(s))) => {
                decoded.push_str(s);
                rest = next;
            }
            Err(_) if rest == "\\" => return Err(EscapeError::DanglingBackslash),
            Err(_) => {
                return Err(EscapeError::UnknownEscape {
                    sequence: rest.chars().take(2).collect(),
                    position: input.len() - rest.len(),
                });
            }
        }
    }

    Ok(decoded)
}

/// Encode a raw value so that [`decode_escapes`] restores it exactly
pub fn encode_escapes(raw: &str) -> String {
    let mut encoded = String::with_capacity(raw.len());

    for c in raw.chars() {
        match c {
            '\r' => encoded.push_str(r"\r"),
            '\n' => encoded.push_str(r"\n"),
            '\t' => encoded.push_str(r"\t"),
            '\\' => encoded.push_str(r"\\"),
            '<' => encoded.push_str(r"\<"),
            other => encoded.push(other),
        }
    }

    encoded
}
