//! Built-in filters registered by
//! [`FilterRegistry::with_builtins`](crate::FilterRegistry::with_builtins)

use crate::registry::FilterContext;
use chrono::{DateTime, NaiveDate, SecondsFormat, TimeZone, Utc};
use harvester_domain::value::{is_truthy, lookup, number_value, to_number, to_text};
use harvester_domain::FilterError;
use serde_json::Value;

/// Coerce to a number; text that is not numeric becomes `null`
pub(crate) fn to_number_filter(
    value: Value,
    _ctx: &FilterContext<'_>,
) -> Result<Value, FilterError> {
    Ok(match &value {
        Value::Null => Value::Null,
        Value::Bool(b) => Value::from(u8::from(*b)),
        other => to_number(other).map_or(Value::Null, number_value),
    })
}

pub(crate) fn to_string_filter(
    value: Value,
    _ctx: &FilterContext<'_>,
) -> Result<Value, FilterError> {
    Ok(Value::String(to_text(&value)))
}

pub(crate) fn to_boolean_filter(
    value: Value,
    _ctx: &FilterContext<'_>,
) -> Result<Value, FilterError> {
    Ok(Value::Bool(is_truthy(&value)))
}

pub(crate) fn trim_filter(value: Value, _ctx: &FilterContext<'_>) -> Result<Value, FilterError> {
    Ok(map_text(value, |s| s.trim().to_string()))
}

pub(crate) fn lower_case_filter(
    value: Value,
    _ctx: &FilterContext<'_>,
) -> Result<Value, FilterError> {
    Ok(map_text(value, |s| s.to_lowercase()))
}

pub(crate) fn upper_case_filter(
    value: Value,
    _ctx: &FilterContext<'_>,
) -> Result<Value, FilterError> {
    Ok(map_text(value, |s| s.to_uppercase()))
}

/// Normalise timestamps to RFC 3339 UTC
///
/// Accepts RFC 3339 text, `YYYY-MM-DD` dates and epoch milliseconds.
/// Anything else becomes `null`.
pub(crate) fn to_date_filter(value: Value, _ctx: &FilterContext<'_>) -> Result<Value, FilterError> {
    let parsed = match &value {
        Value::String(s) => {
            let s = s.trim();
            DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.with_timezone(&Utc))
                .ok()
                .or_else(|| {
                    NaiveDate::parse_from_str(s, "%Y-%m-%d")
                        .ok()
                        .and_then(|d| d.and_hms_opt(0, 0, 0))
                        .map(|dt| dt.and_utc())
                })
        }
        Value::Number(n) => n
            .as_i64()
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single()),
        _ => None,
    };

    Ok(parsed.map_or(Value::Null, |dt| {
        Value::String(dt.to_rfc3339_opts(SecondsFormat::Secs, true))
    }))
}

/// Replace a falsy value with `opts.value`, or with the reference at `opts.ref`
pub(crate) fn default_filter(value: Value, ctx: &FilterContext<'_>) -> Result<Value, FilterError> {
    if is_truthy(&value) {
        return Ok(value);
    }
    let Some(opts) = ctx.opts else {
        return Ok(value);
    };

    if let Some(path) = opts.get("ref").and_then(Value::as_str) {
        return Ok(lookup(ctx.reference, path).cloned().unwrap_or(value));
    }
    Ok(opts.get("value").cloned().unwrap_or(value))
}

/// Literal substring replacement: `opts.pattern` -> `opts.replacement`
pub(crate) fn replace_filter(value: Value, ctx: &FilterContext<'_>) -> Result<Value, FilterError> {
    let pattern = ctx
        .opts
        .and_then(|opts| opts.get("pattern"))
        .and_then(Value::as_str)
        .ok_or_else(|| FilterError::InvalidOptions {
            id: ctx.id.to_string(),
            reason: "missing string option `pattern`".to_string(),
        })?;
    let replacement = ctx
        .opts
        .and_then(|opts| opts.get("replacement"))
        .map(to_text)
        .unwrap_or_default();

    Ok(map_text(value, |s| s.replace(pattern, &replacement)))
}

/// Split text on `opts.separator` (default `,`)
pub(crate) fn split_filter(value: Value, ctx: &FilterContext<'_>) -> Result<Value, FilterError> {
    let separator = separator(ctx);
    Ok(match value {
        Value::String(s) if !s.is_empty() => Value::Array(
            s.split(separator.as_str())
                .map(|part| Value::String(part.to_string()))
                .collect(),
        ),
        other => other,
    })
}

/// Join array items on `opts.separator` (default `,`)
pub(crate) fn join_filter(value: Value, ctx: &FilterContext<'_>) -> Result<Value, FilterError> {
    let separator = separator(ctx);
    Ok(match value {
        Value::Array(items) => Value::String(
            items
                .iter()
                .map(to_text)
                .collect::<Vec<_>>()
                .join(&separator),
        ),
        other => other,
    })
}

fn separator(ctx: &FilterContext<'_>) -> String {
    ctx.opts
        .and_then(|opts| opts.get("separator"))
        .and_then(Value::as_str)
        .unwrap_or(",")
        .to_string()
}

/// Apply `f` to text, or to every text item of an array
fn map_text(value: Value, f: impl Fn(&str) -> String) -> Value {
    match value {
        Value::String(s) => Value::String(f(&s)),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| match item {
                    Value::String(s) => Value::String(f(&s)),
                    other => other,
                })
                .collect(),
        ),
        other => other,
    }
}
