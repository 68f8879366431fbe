//! JSON Recovery
//!
//! Best-effort repair of request bodies that are almost JSON: unescaped quotes
//! and backslashes, trailing commas, single-quoted strings and raw control
//! characters inside strings. The repair is lossy. Every single quote becomes
//! a double quote, so an apostrophe inside a string comes out as `"`.
//! Callers reach it only through [`attempt_recover`] and [`parse_body`].

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use thiserror::Error;

/// Maximum number of body characters echoed back in a parse error.
pub const BODY_ECHO_LIMIT: usize = 500;

static TRAILING_COMMA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",(\s*[}\]])").expect("trailing comma pattern is valid"));

/// A body that could not be parsed, even after recovery.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("JSON parsing failed: {message}. Original body: {body}")]
pub struct BodyParseError {
    /// Error from the strict parse of the original body
    pub message: String,
    /// Original body, truncated to [`BODY_ECHO_LIMIT`] characters
    pub body: String,
}

impl BodyParseError {
    /// Build the error from a strict parse failure of `body`.
    pub fn new(error: &serde_json::Error, body: &str) -> Self {
        Self {
            message: error.to_string(),
            body: body.chars().take(BODY_ECHO_LIMIT).collect(),
        }
    }
}

/// Parse a request body, falling back to one recovery attempt.
///
/// On double failure the error reports the strict parse error, not the one
/// from the repaired text.
pub fn parse_body(body: &str) -> Result<Value, BodyParseError> {
    let original = match serde_json::from_str(body) {
        Ok(value) => return Ok(value),
        Err(err) => err,
    };

    match attempt_recover(body).and_then(|fixed| serde_json::from_str(&fixed).ok()) {
        Some(value) => {
            tracing::warn!(error = %original, "recovered malformed JSON body");
            Ok(value)
        }
        None => Err(BodyParseError::new(&original, body)),
    }
}

/// Repair near-valid JSON.
///
/// Returns the repaired text only when the repair changed something and the
/// result parses.
pub fn attempt_recover(input: &str) -> Option<String> {
    let fixed = escape_inner_quotes(input);
    let fixed = escape_stray_backslashes(&fixed);
    let fixed = TRAILING_COMMA.replace_all(&fixed, "$1").into_owned();
    let fixed = normalize_single_quotes(&fixed);
    let fixed = escape_control_chars(&fixed);

    if fixed == input {
        return None;
    }
    serde_json::from_str::<Value>(&fixed).is_ok().then_some(fixed)
}

/// A `"` inside a string closes it only when the next non-blank character is
/// a structural one; anything else is taken as string content.
fn escape_inner_quotes(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len());
    let mut in_string = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '\\' if in_string => {
                out.push(c);
                if let Some(&next) = chars.get(i + 1) {
                    out.push(next);
                    i += 1;
                }
            }
            '"' if !in_string => {
                in_string = true;
                out.push(c);
            }
            '"' => {
                let closes = chars[i + 1..]
                    .iter()
                    .find(|c| !c.is_whitespace())
                    .is_none_or(|c| matches!(*c, ',' | '}' | ']' | ':'));
                if closes {
                    in_string = false;
                    out.push(c);
                } else {
                    out.push_str("\\\"");
                }
            }
            _ => out.push(c),
        }
        i += 1;
    }
    out
}

/// Keeps `\" \\ \/ \b \f \n \r \t` and `\u` followed by four hex digits;
/// every other backslash is doubled.
fn escape_stray_backslashes(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c != '\\' {
            out.push(c);
            i += 1;
            continue;
        }
        match chars.get(i + 1) {
            Some(&next) if matches!(next, '"' | '\\' | '/' | 'b' | 'f' | 'n' | 'r' | 't') => {
                out.push('\\');
                out.push(next);
                i += 2;
            }
            Some('u') if is_unicode_escape(&chars[i + 2..]) => {
                out.push_str("\\u");
                i += 2;
            }
            _ => {
                out.push_str("\\\\");
                i += 1;
            }
        }
    }
    out
}

fn is_unicode_escape(rest: &[char]) -> bool {
    rest.len() >= 4 && rest[..4].iter().all(char::is_ascii_hexdigit)
}

#[derive(Clone, Copy)]
enum Quoting {
    Outside,
    Double,
    Single,
}

/// Single quotes outside strings become delimiters; inside strings they
/// become escaped double quotes.
fn normalize_single_quotes(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut state = Quoting::Outside;
    let mut chars = input.chars();

    while let Some(c) = chars.next() {
        match (state, c) {
            (Quoting::Outside, '"') => {
                state = Quoting::Double;
                out.push('"');
            }
            (Quoting::Outside, '\'') => {
                state = Quoting::Single;
                out.push('"');
            }
            (Quoting::Double | Quoting::Single, '\\') => match chars.next() {
                Some('\'') => out.push_str("\\\""),
                Some(next) => {
                    out.push('\\');
                    out.push(next);
                }
                None => out.push('\\'),
            },
            (Quoting::Double, '"') | (Quoting::Single, '\'') => {
                state = Quoting::Outside;
                out.push('"');
            }
            (Quoting::Double, '\'') | (Quoting::Single, '"') => out.push_str("\\\""),
            _ => out.push(c),
        }
    }
    out
}

fn escape_control_chars(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_string = false;
    let mut chars = input.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' if in_string => {
                out.push(c);
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            }
            '"' => {
                in_string = !in_string;
                out.push(c);
            }
            '\n' if in_string => out.push_str("\\n"),
            '\r' if in_string => out.push_str("\\r"),
            '\t' if in_string => out.push_str("\\t"),
            c if in_string && c.is_control() && (c as u32) < 0x20 => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            _ => out.push(c),
        }
    }
    out
}
