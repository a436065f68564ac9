//! `serde_json::Value` と Bedrock の `Document` の相互変換

use std::collections::HashMap;

use aws_smithy_types::{Document, Number};
use serde_json::Value;

/// JSON 値を `Document` に変換する
pub fn json_to_document(value: &Value) -> Document {
    match value {
        Value::Null => Document::Null,
        Value::Bool(b) => Document::Bool(*b),
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                Document::Number(Number::PosInt(u))
            } else if let Some(i) = n.as_i64() {
                Document::Number(Number::NegInt(i))
            } else {
                Document::Number(Number::Float(n.as_f64().unwrap_or_default()))
            }
        }
        Value::String(s) => Document::String(s.clone()),
        Value::Array(items) => Document::Array(items.iter().map(json_to_document).collect()),
        Value::Object(map) => Document::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), json_to_document(v)))
                .collect::<HashMap<_, _>>(),
        ),
    }
}

/// `Document` を JSON 値に変換する
///
/// JSON で表現できない浮動小数点数（NaN など）は null になる。
pub fn document_to_json(document: &Document) -> Value {
    match document {
        Document::Null => Value::Null,
        Document::Bool(b) => Value::Bool(*b),
        Document::Number(Number::PosInt(u)) => Value::from(*u),
        Document::Number(Number::NegInt(i)) => Value::from(*i),
        Document::Number(Number::Float(f)) => serde_json::Number::from_f64(*f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Document::String(s) => Value::String(s.clone()),
        Document::Array(items) => Value::Array(items.iter().map(document_to_json).collect()),
        Document::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), document_to_json(v)))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_input_conversion() {
        let input = json!({
            "tickettype": "INC",
            "count": 3,
            "offset": -2,
            "score": 0.75,
            "tags": ["vpn", null, true]
        });

        let document = json_to_document(&input);
        if let Document::Object(map) = &document {
            assert_eq!(map.get("count"), Some(&Document::Number(Number::PosInt(3))));
            assert_eq!(map.get("offset"), Some(&Document::Number(Number::NegInt(-2))));
        } else {
            panic!("Object に変換されるべき");
        }
        assert_eq!(document_to_json(&document), input);
    }

    #[test]
    fn test_nan_becomes_null() {
        let document = Document::Number(Number::Float(f64::NAN));
        assert_eq!(document_to_json(&document), Value::Null);
    }
}
