use crate::model::Value;

/// Canonical form of an employee identifier. The same physical id compares
/// equal whether the export stored it as text or as a numeric cell
/// (`"10045.0"` and `10045` both canonicalize to `"10045"`). Leading zeros
/// are preserved: key comparison never applies the tax-id padding rules.
pub fn normalize_key(value: &Value) -> String {
    match value {
        Value::Empty => String::new(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => {
            if f.is_nan() {
                String::new()
            } else if f.fract() == 0.0 {
                (*f as i64).to_string()
            } else {
                f.to_string()
            }
        }
        Value::Date(d) => d.to_string(),
        Value::Text(t) => {
            let trimmed = t.replace('\u{00A0}', " ").trim().to_string();
            strip_decimal_artifact(&trimmed).to_string()
        }
    }
}

/// `"10045.0"` → `"10045"`: digits, a point, and only zero digits after it.
/// Anything else passes through untouched.
fn strip_decimal_artifact(s: &str) -> &str {
    if let Some((head, tail)) = s.split_once('.') {
        if !head.is_empty()
            && head.bytes().all(|b| b.is_ascii_digit())
            && !tail.is_empty()
            && tail.bytes().all(|b| b == b'0')
        {
            return head;
        }
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_artifact_truncates() {
        assert_eq!(normalize_key(&Value::Text("10045.0".into())), "10045");
        assert_eq!(normalize_key(&Value::Text("10045.000".into())), "10045");
        assert_eq!(normalize_key(&Value::Float(10045.0)), "10045");
        assert_eq!(normalize_key(&Value::Int(10045)), "10045");
        assert_eq!(
            normalize_key(&Value::Text("10045.0".into())),
            normalize_key(&Value::Text("10045".into()))
        );
    }

    #[test]
    fn non_artifact_text_passes_through() {
        assert_eq!(normalize_key(&Value::Text("10045.5".into())), "10045.5");
        assert_eq!(normalize_key(&Value::Text("A-1004".into())), "A-1004");
        // leading zeros are significant for the primary key
        assert_eq!(normalize_key(&Value::Text("007".into())), "007");
    }

    #[test]
    fn whitespace_and_nbsp_stripped() {
        assert_eq!(normalize_key(&Value::Text("  10045\u{00A0}".into())), "10045");
    }

    #[test]
    fn blank_forms() {
        assert_eq!(normalize_key(&Value::Empty), "");
        assert_eq!(normalize_key(&Value::Text("   ".into())), "");
        assert_eq!(normalize_key(&Value::Float(f64::NAN)), "");
    }
}
