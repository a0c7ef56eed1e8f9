//! Event-driven reader for the TOML subset used by the bookmark file.
//!
//! Supports `[table]` headers, `key = value` pairs with basic and literal
//! strings, 64-bit integers (decimal, `0x`, `0o`, `0b`, `_` separators),
//! floats and booleans, and `#` comments. Events are pushed to a
//! [`TomlHandler`] as they are read, so a syntax error leaves every event
//! before it already delivered.

use crate::types::errors::StorageError;

/// A parsed value.
#[derive(Debug, Clone, PartialEq)]
pub enum TomlValue {
    String(String),
    Int64(i64),
    Float64(f64),
    Boolean(bool),
}

/// Receives parse events.
pub trait TomlHandler {
    /// Called with `is_start = true` when a table header is read, and with
    /// `is_start = false` when the table ends (next header or end of input).
    fn table(&mut self, name: &str, is_start: bool);
    /// Called for each key-value pair. `table` is empty before the first header.
    fn key_value(&mut self, table: &str, key: &str, value: &TomlValue);
}

/// Parses `src`, pushing events to `handler`. Stops at the first syntax error.
pub fn parse(src: &str, handler: &mut dyn TomlHandler) -> Result<(), StorageError> {
    let mut current_table: Option<String> = None;
    for (index, raw_line) in src.lines().enumerate() {
        let line_no = index + 1;
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let syntax = |message: &str| StorageError::Syntax {
            line: line_no,
            message: message.to_string(),
        };
        if let Some(rest) = line.strip_prefix('[') {
            let close = rest.find(']').ok_or_else(|| syntax("unterminated table header"))?;
            let name = rest[..close].trim();
            if name.is_empty() {
                return Err(syntax("empty table name"));
            }
            if !is_blank_or_comment(&rest[close + 1..]) {
                return Err(syntax("unexpected text after table header"));
            }
            if let Some(previous) = current_table.take() {
                handler.table(&previous, false);
            }
            handler.table(name, true);
            current_table = Some(name.to_string());
            continue;
        }
        let eq = line.find('=').ok_or_else(|| syntax("expected `key = value`"))?;
        let key = line[..eq].trim();
        if key.is_empty() || !key.chars().all(is_bare_key_char) {
            return Err(syntax("invalid key"));
        }
        let (value, rest) = parse_value(line[eq + 1..].trim_start()).map_err(|m| syntax(&m))?;
        if !is_blank_or_comment(rest) {
            return Err(syntax("unexpected text after value"));
        }
        handler.key_value(current_table.as_deref().unwrap_or(""), key, &value);
    }
    if let Some(previous) = current_table {
        handler.table(&previous, false);
    }
    Ok(())
}

fn is_blank_or_comment(text: &str) -> bool {
    let text = text.trim();
    text.is_empty() || text.starts_with('#')
}

fn is_bare_key_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// Parses one value from the start of `text`, returning it with the unread rest.
fn parse_value(text: &str) -> Result<(TomlValue, &str), String> {
    if let Some(body) = text.strip_prefix('"') {
        return parse_basic_string(body);
    }
    if let Some(body) = text.strip_prefix('\'') {
        let end = body.find('\'').ok_or("unterminated literal string")?;
        return Ok((TomlValue::String(body[..end].to_string()), &body[end + 1..]));
    }
    let end = text
        .find(|c: char| c.is_whitespace() || c == '#')
        .unwrap_or(text.len());
    let token = &text[..end];
    let rest = &text[end..];
    match token {
        "" => Err("missing value".to_string()),
        "true" => Ok((TomlValue::Boolean(true), rest)),
        "false" => Ok((TomlValue::Boolean(false), rest)),
        _ => parse_number(token).map(|value| (value, rest)),
    }
}

fn parse_number(token: &str) -> Result<TomlValue, String> {
    let cleaned: String = token.chars().filter(|&c| c != '_').collect();
    let (negative, digits) = match cleaned.strip_prefix('-') {
        Some(d) => (true, d),
        None => (false, cleaned.strip_prefix('+').unwrap_or(&cleaned)),
    };
    let radix = match digits.get(..2) {
        Some("0x") => Some(16),
        Some("0o") => Some(8),
        Some("0b") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        let magnitude = i64::from_str_radix(&digits[2..], radix)
            .map_err(|_| format!("invalid integer `{}`", token))?;
        return Ok(TomlValue::Int64(if negative { -magnitude } else { magnitude }));
    }
    if let Ok(value) = cleaned.parse::<i64>() {
        return Ok(TomlValue::Int64(value));
    }
    if digits.starts_with(|c: char| c.is_ascii_digit()) {
        if let Ok(value) = cleaned.parse::<f64>() {
            return Ok(TomlValue::Float64(value));
        }
    }
    Err(format!("invalid value `{}`", token))
}

fn parse_basic_string(body: &str) -> Result<(TomlValue, &str), String> {
    let mut out = String::new();
    let mut chars = body.char_indices();
    while let Some((index, c)) = chars.next() {
        match c {
            '"' => return Ok((TomlValue::String(out), &body[index + 1..])),
            '\\' => {
                let (_, escaped) = chars.next().ok_or("unterminated escape")?;
                match escaped {
                    'n' => out.push('\n'),
                    't' => out.push('\t'),
                    'r' => out.push('\r'),
                    'b' => out.push('\u{8}'),
                    'f' => out.push('\u{c}'),
                    '"' => out.push('"'),
                    '\\' => out.push('\\'),
                    'u' | 'U' => {
                        let len = if escaped == 'u' { 4 } else { 8 };
                        let hex: String = chars.by_ref().take(len).map(|(_, h)| h).collect();
                        let code = u32::from_str_radix(&hex, 16)
                            .ok()
                            .filter(|_| hex.len() == len)
                            .ok_or("invalid unicode escape")?;
                        out.push(char::from_u32(code).ok_or("invalid unicode scalar")?);
                    }
                    other => return Err(format!("unknown escape `\\{}`", other)),
                }
            }
            _ => out.push(c),
        }
    }
    Err("unterminated string".to_string())
}

/// Quotes a string as a TOML basic string body (without the surrounding quotes).
pub fn escape_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c.is_control() => out.push_str(&format!("\\u{:04X}", c as u32)),
            c => out.push(c),
        }
    }
    out
}
