//! Value helpers - truthiness, numeric coercion, path lookup and templates
//!
//! Documents, reference contexts and records are plain [`serde_json::Value`]s.
//! The helpers here give them the loose semantics schemas were written
//! against: `null`, `false`, `0` and `""` are falsy, every array and object is
//! truthy, and numeric-looking text takes part in arithmetic.

use chrono::DateTime;
use serde_json::{Number, Value};

/// Whether a value counts as "present"
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(false, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Convert a number or numeric-looking string into an `f64`
///
/// Blank text converts to `0`. Booleans, arrays, objects and text that is not
/// a finite number do not convert.
pub fn to_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Some(0.0);
            }
            trimmed.parse::<f64>().ok().filter(|f| f.is_finite())
        }
        _ => None,
    }
}

/// Build a JSON number, preferring an integer representation
pub fn number_value(f: f64) -> Value {
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
        Value::from(f as i64)
    } else {
        Number::from_f64(f).map_or(Value::Null, Value::Number)
    }
}

/// Whether a value is an RFC 3339 timestamp
pub fn is_date_like(value: &Value) -> bool {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s).is_ok(),
        _ => false,
    }
}

/// Plain-text rendering used for template interpolation and string filters
pub fn to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Split a property path into segments
///
/// Accepts `a.b.c`, `items[0].name` and `items.0.name`; quoted bracket
/// segments (`map["key.with.dots"]`) are kept whole.
pub fn parse_path(path: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = path.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '.' => {
                if !current.is_empty() {
                    segments.push(std::mem::take(&mut current));
                }
            }
            '[' => {
                if !current.is_empty() {
                    segments.push(std::mem::take(&mut current));
                }
                let mut inner = String::new();
                for c in chars.by_ref() {
                    if c == ']' {
                        break;
                    }
                    inner.push(c);
                }
                let inner = inner.trim();
                let unquoted = inner
                    .strip_prefix('"')
                    .and_then(|s| s.strip_suffix('"'))
                    .or_else(|| inner.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')))
                    .unwrap_or(inner);
                segments.push(unquoted.to_string());
            }
            _ => current.push(c),
        }
    }

    if !current.is_empty() {
        segments.push(current);
    }
    segments
}

/// Look up a property path inside a value
///
/// An object key spelled exactly like the whole path wins over path
/// splitting, so keys containing dots stay addressable.
pub fn lookup<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    if let Some(direct) = root.as_object().and_then(|map| map.get(path)) {
        return Some(direct);
    }

    let segments = parse_path(path);
    if segments.is_empty() {
        return None;
    }

    segments.iter().try_fold(root, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Interpolate `${path}` and `<%= path %>` placeholders against a context
pub fn interpolate(template: &str, context: &Value) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    loop {
        let dollar = rest.find("${").map(|i| (i, 2, "}"));
        let erb = rest.find("<%=").map(|i| (i, 3, "%>"));
        let next = match (dollar, erb) {
            (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
            (a, b) => a.or(b),
        };

        let Some((start, open_len, close)) = next else {
            out.push_str(rest);
            break;
        };

        let body = &rest[start + open_len..];
        let Some(end) = body.find(close) else {
            out.push_str(rest);
            break;
        };

        out.push_str(&rest[..start]);
        let path = body[..end].trim();
        if let Some(value) = lookup(context, path) {
            out.push_str(&to_text(value));
        }
        rest = &body[end + close.len()..];
    }

    out
}
