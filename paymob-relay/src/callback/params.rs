//! Parameter bags for inbound Paymob callbacks.
//!
//! Callbacks arrive either as URL query parameters (browser redirection) or as
//! a JSON body (processed webhook). Both are normalized into a
//! [`ParameterBag`]: an immutable tree of string keys to scalar values and
//! nested mappings, with a total dotted-path lookup.

use std::collections::BTreeMap;

use serde_json::{Number, Value};
use tracing::warn;

/// A single value inside a [`ParameterBag`].
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Text(String),
    Number(Number),
    Bool(bool),
    List(Vec<ParamValue>),
    Map(ParameterBag),
}

impl ParamValue {
    /// Render the value the way Paymob serializes it when signing.
    ///
    /// Booleans are lowercase, integers carry no separators, integral floats
    /// render without a fractional part, and lists join their elements with `,`.
    /// A mapping has no scalar form and renders as the empty string.
    pub fn canonical(&self) -> String {
        match self {
            ParamValue::Text(s) => s.clone(),
            ParamValue::Bool(b) => b.to_string(),
            ParamValue::Number(n) => render_number(n),
            ParamValue::List(items) => items
                .iter()
                .map(ParamValue::canonical)
                .collect::<Vec<_>>()
                .join(","),
            ParamValue::Map(_) => String::new(),
        }
    }

    /// Convert a JSON value. `null` has no representation and yields `None`.
    fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Bool(b) => Some(ParamValue::Bool(*b)),
            Value::Number(n) => Some(ParamValue::Number(n.clone())),
            Value::String(s) => Some(ParamValue::Text(s.clone())),
            Value::Array(items) => Some(ParamValue::List(
                items
                    .iter()
                    .map(|item| {
                        ParamValue::from_json(item)
                            .unwrap_or_else(|| ParamValue::Text(String::new()))
                    })
                    .collect(),
            )),
            Value::Object(map) => Some(ParamValue::Map(ParameterBag::from_json_object(map))),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Number(value.into())
    }
}

impl From<ParameterBag> for ParamValue {
    fn from(value: ParameterBag) -> Self {
        ParamValue::Map(value)
    }
}

/// Integral values print as integers even when they arrived as floats
/// (`100.0` → `100`), matching the processor's serializer.
fn render_number(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    match n.as_f64() {
        Some(f) => render_float(f),
        None => n.to_string(),
    }
}

/// ECMAScript number-to-string: plain decimals for exponents in `[-7, 21)`,
/// otherwise `d.ddde±x`.
fn render_float(f: f64) -> String {
    if f == 0.0 {
        return "0".to_string();
    }

    // `{:e}` yields the shortest round-trip digits, e.g. `1.25e-7`.
    let sci = format!("{:e}", f.abs());
    let (mantissa, exponent) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let k = digits.len() as i32;
    let n = exponent.parse::<i32>().unwrap_or(0) + 1;

    let body = if k <= n && n <= 21 {
        format!("{}{}", digits, "0".repeat((n - k) as usize))
    } else if 0 < n && n <= 21 {
        let (int, frac) = digits.split_at(n as usize);
        format!("{}.{}", int, frac)
    } else if -6 < n && n <= 0 {
        format!("0.{}{}", "0".repeat((-n) as usize), digits)
    } else {
        let (lead, rest) = digits.split_at(1);
        let sign = if n - 1 < 0 { '-' } else { '+' };
        if rest.is_empty() {
            format!("{}e{}{}", lead, sign, (n - 1).abs())
        } else {
            format!("{}.{}e{}{}", lead, rest, sign, (n - 1).abs())
        }
    };

    if f < 0.0 {
        format!("-{}", body)
    } else {
        body
    }
}

/// Immutable mapping of callback parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterBag {
    entries: BTreeMap<String, ParamValue>,
}

impl ParameterBag {
    /// Create an empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the bag with `key` set to `value`.
    ///
    /// Used while assembling a bag; once handed to the verifier it is only read.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    /// Build a bag from a JSON value. Anything other than an object yields an
    /// empty bag.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Object(map) => Self::from_json_object(map),
            _ => Self::default(),
        }
    }

    fn from_json_object(map: &serde_json::Map<String, Value>) -> Self {
        let entries = map
            .iter()
            .filter_map(|(k, v)| ParamValue::from_json(v).map(|v| (k.clone(), v)))
            .collect();
        Self { entries }
    }

    /// Build a bag from a raw request body.
    ///
    /// An empty or unparseable body degrades to an empty bag, which will fail
    /// verification rather than error out.
    pub fn from_json_slice(body: &[u8]) -> Self {
        if body.is_empty() {
            return Self::default();
        }

        match serde_json::from_slice::<Value>(body) {
            Ok(value) => {
                if !value.is_object() {
                    warn!(body_length = body.len(), "callback_body_not_object");
                }
                Self::from_json(&value)
            }
            Err(e) => {
                warn!(error = %e, body_length = body.len(), "callback_body_parse_failed");
                Self::default()
            }
        }
    }

    /// Build a bag from a URL query string (without the leading `?`).
    ///
    /// Repeated keys keep their first value. Bracketed keys such as
    /// `order[id]=456` expand into nested mappings; a key with an empty or
    /// unbalanced bracket segment is kept literally.
    pub fn from_query(query: &str) -> Self {
        let mut bag = Self::default();

        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            let segments = split_bracket_key(&key);
            let segments: Vec<&str> = match &segments {
                Some(parts) => parts.iter().map(String::as_str).collect(),
                None => vec![&*key],
            };
            bag.insert_first(&segments, ParamValue::Text(value.into_owned()));
        }

        bag
    }

    /// Insert at a nested path unless something already occupies it.
    fn insert_first(&mut self, segments: &[&str], value: ParamValue) {
        let Some((head, rest)) = segments.split_first() else {
            return;
        };

        if rest.is_empty() {
            self.entries.entry(head.to_string()).or_insert(value);
            return;
        }

        let child = self
            .entries
            .entry(head.to_string())
            .or_insert_with(|| ParamValue::Map(ParameterBag::default()));

        // A scalar already sits here, so the first value wins.
        if let ParamValue::Map(nested) = child {
            nested.insert_first(rest, value);
        }
    }

    /// Get a top-level value.
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.entries.get(key)
    }

    /// Resolve a dotted path (`order.id`) by walking nested mappings.
    ///
    /// Returns `None` if any segment is absent or an intermediate value is not
    /// a mapping. Never panics.
    pub fn lookup(&self, path: &str) -> Option<&ParamValue> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut current = self.entries.get(first)?;

        for segment in segments {
            match current {
                ParamValue::Map(nested) => current = nested.entries.get(segment)?,
                _ => return None,
            }
        }

        Some(current)
    }

    /// Canonical string of the value at `path`, if present.
    pub fn lookup_str(&self, path: &str) -> Option<String> {
        self.lookup(path).map(ParamValue::canonical)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, ParamValue)> for ParameterBag {
    fn from_iter<I: IntoIterator<Item = (String, ParamValue)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Split `a[b][c]` into `["a", "b", "c"]`. Returns `None` for plain keys and
/// for keys whose brackets are empty or unbalanced.
fn split_bracket_key(key: &str) -> Option<Vec<String>> {
    let open = key.find('[')?;
    if open == 0 {
        return None;
    }

    let mut segments = vec![key[..open].to_string()];
    let mut rest = &key[open..];

    while !rest.is_empty() {
        let inner = rest.strip_prefix('[')?;
        let close = inner.find(']')?;
        let segment = &inner[..close];
        if segment.is_empty() || segment.contains('[') {
            return None;
        }
        segments.push(segment.to_string());
        rest = &inner[close + 1..];
    }

    Some(segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lookup_nested_path() {
        let bag = ParameterBag::from_json(&json!({
            "id": 123,
            "order": { "id": 456 },
            "source_data": { "pan": "2346", "sub_type": "MasterCard" }
        }));

        assert_eq!(bag.lookup_str("id"), Some("123".to_string()));
        assert_eq!(bag.lookup_str("order.id"), Some("456".to_string()));
        assert_eq!(bag.lookup_str("source_data.sub_type"), Some("MasterCard".to_string()));
    }

    #[test]
    fn test_lookup_missing_segments_resolve_to_none() {
        let bag = ParameterBag::new()
            .with("order", "456")
            .with("source_data", ParameterBag::new());

        // Intermediate is a scalar, not a mapping.
        assert_eq!(bag.lookup("order.id"), None);
        assert_eq!(bag.lookup("source_data.pan"), None);
        assert_eq!(bag.lookup("missing.deeply.nested"), None);
        assert_eq!(bag.lookup(""), None);
        assert_eq!(bag.lookup("order."), None);
    }

    #[test]
    fn test_canonical_scalars() {
        assert_eq!(ParamValue::Bool(true).canonical(), "true");
        assert_eq!(ParamValue::Bool(false).canonical(), "false");
        assert_eq!(ParamValue::from(1_000_000i64).canonical(), "1000000");
        assert_eq!(ParamValue::from(-42i64).canonical(), "-42");
        assert_eq!(ParamValue::from("EGP").canonical(), "EGP");
        assert_eq!(ParamValue::Map(ParameterBag::new()).canonical(), "");
    }

    #[test]
    fn test_canonical_floats() {
        let bag = ParameterBag::from_json(&json!({
            "whole": 100.0,
            "fraction": 12.5,
            "zero": -0.0,
            "big": 18446744073709551615u64
        }));

        assert_eq!(bag.lookup_str("whole"), Some("100".to_string()));
        assert_eq!(bag.lookup_str("fraction"), Some("12.5".to_string()));
        assert_eq!(bag.lookup_str("zero"), Some("0".to_string()));
        assert_eq!(bag.lookup_str("big"), Some("18446744073709551615".to_string()));
    }

    #[test]
    fn test_canonical_float_exponent_thresholds() {
        assert_eq!(render_float(1e21), "1e+21");
        assert_eq!(render_float(1e20), "100000000000000000000");
        assert_eq!(render_float(1.5e300), "1.5e+300");
        assert_eq!(render_float(1e-7), "1e-7");
        assert_eq!(render_float(-2.5e-8), "-2.5e-8");
        assert_eq!(render_float(0.000001), "0.000001");
        assert_eq!(render_float(123.456), "123.456");
        assert_eq!(render_float(-0.5), "-0.5");

        let bag = ParameterBag::from_json(&json!({ "tiny": 1e-7, "huge": 1e21 }));
        assert_eq!(bag.lookup_str("tiny"), Some("1e-7".to_string()));
        assert_eq!(bag.lookup_str("huge"), Some("1e+21".to_string()));
    }

    #[test]
    fn test_canonical_list_joins_with_commas() {
        let bag = ParameterBag::from_json(&json!({ "tags": ["a", 1, true, null] }));
        assert_eq!(bag.lookup_str("tags"), Some("a,1,true,".to_string()));
    }

    #[test]
    fn test_json_null_is_missing() {
        let bag = ParameterBag::from_json(&json!({ "currency": null, "id": 1 }));
        assert_eq!(bag.get("currency"), None);
        assert_eq!(bag.len(), 1);
    }

    #[test]
    fn test_from_json_non_object_is_empty() {
        assert!(ParameterBag::from_json(&json!([1, 2, 3])).is_empty());
        assert!(ParameterBag::from_json(&json!("hmac")).is_empty());
        assert!(ParameterBag::from_json(&Value::Null).is_empty());
    }

    #[test]
    fn test_from_json_slice_malformed_is_empty() {
        assert!(ParameterBag::from_json_slice(b"").is_empty());
        assert!(ParameterBag::from_json_slice(b"{not json").is_empty());
        assert!(ParameterBag::from_json_slice(b"42").is_empty());

        let bag = ParameterBag::from_json_slice(br#"{"hmac":"abc","order":{"id":7}}"#);
        assert_eq!(bag.lookup_str("order.id"), Some("7".to_string()));
    }

    #[test]
    fn test_from_query_first_value_wins() {
        let bag = ParameterBag::from_query("id=1&id=2&success=true");
        assert_eq!(bag.lookup_str("id"), Some("1".to_string()));
        assert_eq!(bag.lookup_str("success"), Some("true".to_string()));
    }

    #[test]
    fn test_from_query_bracket_nesting() {
        let bag = ParameterBag::from_query(
            "order%5Bid%5D=456&source_data[pan]=2346&source_data[sub_type]=Visa&a[b][c]=deep",
        );

        assert_eq!(bag.lookup_str("order.id"), Some("456".to_string()));
        assert_eq!(bag.lookup_str("source_data.pan"), Some("2346".to_string()));
        assert_eq!(bag.lookup_str("source_data.sub_type"), Some("Visa".to_string()));
        assert_eq!(bag.lookup_str("a.b.c"), Some("deep".to_string()));
    }

    #[test]
    fn test_from_query_scalar_then_nested_keeps_scalar() {
        let bag = ParameterBag::from_query("order=456&order[id]=789");
        assert_eq!(bag.lookup_str("order"), Some("456".to_string()));
        assert_eq!(bag.lookup("order.id"), None);
    }

    #[test]
    fn test_from_query_odd_brackets_are_literal() {
        let bag = ParameterBag::from_query("tags[]=a&x[y=1&[z]=2&source_data.pan=2346");
        assert_eq!(bag.lookup_str("tags[]"), Some("a".to_string()));
        assert_eq!(bag.lookup_str("x[y"), Some("1".to_string()));
        assert_eq!(bag.lookup_str("[z]"), Some("2".to_string()));
        // A literal dotted key is not a nested path.
        assert_eq!(bag.lookup("source_data.pan"), None);
        assert_eq!(
            bag.get("source_data.pan").map(ParamValue::canonical),
            Some("2346".to_string())
        );
    }

    #[test]
    fn test_from_query_decodes_plus_and_percent() {
        let bag = ParameterBag::from_query("created_at=2024-01-01T10%3A00%3A00&data.message=Approved+OK");
        assert_eq!(bag.lookup_str("created_at"), Some("2024-01-01T10:00:00".to_string()));
        assert_eq!(
            bag.get("data.message").map(ParamValue::canonical),
            Some("Approved OK".to_string())
        );
    }
}
