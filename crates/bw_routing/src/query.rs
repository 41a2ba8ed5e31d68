//! Query string encode/decode.
//!
//! Keys and values are percent-encoded independently, pairs joined with `=`
//! and `&`. Decoding percent-decodes the value only, matching what the
//! console has always persisted into URLs; a malformed pair with no `=`
//! yields an empty value rather than failing the whole parse.

use std::collections::BTreeMap;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Key → value; keys unique, order irrelevant.
pub type QueryParams = BTreeMap<String, String>;

/// `encodeURIComponent`-equivalent set: everything but unreserved marks.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

pub fn encode_query_params(params: &QueryParams) -> String {
    params
        .iter()
        .map(|(key, value)| {
            format!(
                "{}={}",
                utf8_percent_encode(key, COMPONENT),
                utf8_percent_encode(value, COMPONENT)
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Parse the part after `?`. Accepts a leading `?`.
pub fn decode_query_params(search: &str) -> QueryParams {
    let search = search.strip_prefix('?').unwrap_or(search);
    if search.is_empty() {
        return QueryParams::new();
    }

    let mut params = QueryParams::new();
    for pair in search.split('&') {
        let mut items = pair.splitn(2, '=');
        let key = match items.next() {
            Some(key) if !key.is_empty() => key.to_string(),
            _ => continue,
        };
        let value = items
            .next()
            .map(|value| percent_decode_str(value).decode_utf8_lossy().into_owned())
            .unwrap_or_default();
        params.insert(key, value);
    }
    params
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> QueryParams {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn encode_decode_roundtrip() {
        let original = params(&[
            ("return_uri", "https://admin.example.com/services?x=1"),
            ("invitation_id", "d1f0aa90"),
            ("note", "hello world"),
        ]);
        let encoded = encode_query_params(&original);
        assert_eq!(decode_query_params(&encoded), original);
    }

    #[test]
    fn values_are_percent_encoded() {
        let encoded = encode_query_params(&params(&[("return_uri", "https://a.b.c/x&y")]));
        assert_eq!(encoded, "return_uri=https%3A%2F%2Fa.b.c%2Fx%26y");
    }

    #[test]
    fn pair_without_equals_yields_empty_value() {
        let decoded = decode_query_params("?flag&name=x");
        assert_eq!(decoded.get("flag").map(String::as_str), Some(""));
        assert_eq!(decoded.get("name").map(String::as_str), Some("x"));
    }

    #[test]
    fn empty_search_is_empty_map() {
        assert!(decode_query_params("").is_empty());
        assert!(decode_query_params("?").is_empty());
    }
}
