//! Literal decoding.
//!
//! Constants reach the back end as raw lexemes. Character and string
//! constants still carry their quotes and escape sequences.

use pins_lexer::Span;
use pins_parser::{Const, ConstKind};

use crate::error::{constant_err, internal_err, CodegenError};

/// Decode an integer constant into a machine word.
pub fn decode_int(c: &Const) -> Result<i32, CodegenError> {
    expect_kind(c, ConstKind::Int)?;
    c.raw
        .parse::<i32>()
        .map_err(|_| constant_err(format!("integer {} does not fit in a word", c.raw), c.span))
}

/// Decode a character constant into its ASCII code.
pub fn decode_char(c: &Const) -> Result<i32, CodegenError> {
    expect_kind(c, ConstKind::Char)?;
    let body = strip_quotes(&c.raw, '\'', c.span)?;
    let values = unescape(body, c.span)?;
    match values.as_slice() {
        [v] => Ok(*v),
        _ => Err(internal_err(format!("malformed character constant {}", c.raw), c.span)),
    }
}

/// Decode a string constant into one word per character plus a trailing 0.
pub fn decode_str(c: &Const) -> Result<Vec<i32>, CodegenError> {
    expect_kind(c, ConstKind::Str)?;
    let body = strip_quotes(&c.raw, '"', c.span)?;
    let mut values = unescape(body, c.span)?;
    values.push(0);
    Ok(values)
}

/// Inverse of [`decode_str`]: render words (terminator optional) as a
/// string constant lexeme.
pub fn encode_str(values: &[i32]) -> String {
    let values = match values.split_last() {
        Some((0, rest)) => rest,
        _ => values,
    };
    let mut out = String::from('"');
    for &v in values {
        match v {
            10 => out.push_str("\\n"),
            34 => out.push_str("\\\""),
            92 => out.push_str("\\\\"),
            32..=126 => out.push(char::from(v as u8)),
            _ => out.push_str(&format!("\\{:02X}", v & 0xFF)),
        }
    }
    out.push('"');
    out
}

fn expect_kind(c: &Const, kind: ConstKind) -> Result<(), CodegenError> {
    if c.kind != kind {
        return Err(internal_err(format!("expected {kind:?} constant, found {}", c.raw), c.span));
    }
    Ok(())
}

fn strip_quotes(raw: &str, quote: char, span: Span) -> Result<&str, CodegenError> {
    raw.strip_prefix(quote)
        .and_then(|s| s.strip_suffix(quote))
        .ok_or_else(|| internal_err(format!("unquoted constant {raw}"), span))
}

/// Expand `\n`, `\'`, `\"`, `\\` and `\XY` escapes.
fn unescape(body: &str, span: Span) -> Result<Vec<i32>, CodegenError> {
    let mut values = Vec::with_capacity(body.len());
    let mut chars = body.chars();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            values.push(ch as i32);
            continue;
        }
        let value = match chars.next() {
            Some('n') => 10,
            Some(c @ ('\'' | '"' | '\\')) => c as i32,
            Some(hi) => {
                let lo = chars.next();
                match (hi.to_digit(16), lo.and_then(|l| l.to_digit(16))) {
                    (Some(h), Some(l)) => (h * 16 + l) as i32,
                    _ => return Err(internal_err(format!("bad escape in {body}"), span)),
                }
            }
            None => return Err(internal_err(format!("dangling backslash in {body}"), span)),
        };
        values.push(value);
    }

    Ok(values)
}

#[cfg(test)]
mod tests;
