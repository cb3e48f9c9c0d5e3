//! Path-based value extraction from detail documents
//!
//! A mapping path is either a dotted field sequence (`ad.price`) resolved by
//! walking the nested JSON document, or a `special:` directive that derives a
//! composite value. Extraction is total: any miss resolves to `None`, never
//! a panic or error.

use serde_json::Value;

/// Prefix marking a special directive path
const SPECIAL_PREFIX: &str = "special:";

/// Resolves a mapping path against a detail document
///
/// Dotted paths walk object fields depth-first; the first missing key, or a
/// non-object encountered with steps remaining, resolves to `None`. Special
/// directives dispatch into a closed table; unknown directives resolve to
/// `None`.
pub fn extract(doc: &Value, path: &str) -> Option<Value> {
    if let Some(directive) = path.strip_prefix(SPECIAL_PREFIX) {
        return extract_special(doc, directive);
    }

    let mut current = doc;
    for key in path.split('.') {
        match current {
            Value::Object(map) => current = map.get(key)?,
            _ => return None,
        }
    }
    if current.is_null() {
        None
    } else {
        Some(current.clone())
    }
}

/// Closed dispatch table for `special:` directives
fn extract_special(doc: &Value, directive: &str) -> Option<Value> {
    match directive {
        "latitude_longitude" => {
            let lat = extract(doc, "ad.latitude")?;
            let lon = extract(doc, "ad.longitude")?;
            Some(Value::String(format!(
                "{},{}",
                render_scalar(&lat),
                render_scalar(&lon)
            )))
        }
        _ => None,
    }
}

/// Renders a scalar JSON value without surrounding quotes
///
/// Strings come through as-is; numbers and booleans use their JSON form.
/// Non-scalars fall back to compact JSON serialization.
pub fn render_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
