//! RESP (`REdis` Serialization Protocol) value types

use bytes::Bytes;

/// A decoded RESP reply value
///
/// Server error replies (`-` prefix) are not a value variant; the decoder
/// surfaces them as [`RedisError::Protocol`](crate::error::RedisError).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Simple string: `+OK\r\n`
    Simple(String),
    /// Integer: `:1000\r\n`
    Integer(i64),
    /// Bulk string: `$6\r\nfoobar\r\n`
    Bulk(Bytes),
    /// Null bulk string (`$-1\r\n`) or null array (`*-1\r\n`)
    Null,
    /// Array: `*2\r\n$3\r\nfoo\r\n$3\r\nbar\r\n`
    Array(Vec<Value>),
}

impl Value {
    /// View as text, if this is a simple string or UTF-8 bulk string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Simple(text) => Some(text),
            Value::Bulk(bytes) => std::str::from_utf8(bytes).ok(),
            _ => None,
        }
    }

    /// View as an integer, if this is an integer or a numeric bulk string
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Integer(number) => Some(*number),
            Value::Bulk(bytes) => std::str::from_utf8(bytes).ok()?.parse().ok(),
            _ => None,
        }
    }

    /// View as raw bytes, if this is a bulk or simple string
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bulk(bytes) => Some(bytes),
            Value::Simple(text) => Some(text.as_bytes()),
            _ => None,
        }
    }

    /// View as a slice of elements, if this is an array
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Whether this is the null value
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::Bulk(Bytes::copy_from_slice(text.as_bytes()))
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::Bulk(Bytes::from(text.into_bytes()))
    }
}

impl From<i64> for Value {
    fn from(number: i64) -> Self {
        Value::Integer(number)
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Value::Bulk(Bytes::from(bytes))
    }
}

impl From<Bytes> for Value {
    fn from(bytes: Bytes) -> Self {
        Value::Bulk(bytes)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_str() {
        let value = Value::Simple("OK".to_string());
        assert_eq!(value.as_str(), Some("OK"));

        let value = Value::Bulk(Bytes::from_static(b"test"));
        assert_eq!(value.as_str(), Some("test"));

        let value = Value::Bulk(Bytes::from_static(b"\xff\xfe"));
        assert_eq!(value.as_str(), None);

        assert_eq!(Value::Null.as_str(), None);
    }

    #[test]
    fn test_as_int() {
        assert_eq!(Value::Integer(42).as_int(), Some(42));
        assert_eq!(Value::Integer(-7).as_int(), Some(-7));

        let value = Value::Bulk(Bytes::from_static(b"123"));
        assert_eq!(value.as_int(), Some(123));

        assert_eq!(Value::Null.as_int(), None);
    }

    #[test]
    fn test_as_bytes() {
        let value = Value::Bulk(Bytes::from_static(b"raw"));
        assert_eq!(value.as_bytes(), Some(&b"raw"[..]));

        let value = Value::Simple("OK".to_string());
        assert_eq!(value.as_bytes(), Some(&b"OK"[..]));

        assert_eq!(Value::Integer(1).as_bytes(), None);
    }

    #[test]
    fn test_as_array() {
        let value = Value::Array(vec![Value::Integer(1), Value::Null]);
        assert_eq!(value.as_array().map(|items| items.len()), Some(2));

        assert_eq!(Value::Null.as_array(), None);
    }

    #[test]
    fn test_is_null() {
        assert!(Value::Null.is_null());
        assert!(!Value::Integer(1).is_null());
        assert!(!Value::Bulk(Bytes::new()).is_null());
    }

    #[test]
    fn test_from_conversions() {
        assert_eq!(Value::from("foo"), Value::Bulk(Bytes::from_static(b"foo")));
        assert_eq!(Value::from(12i64), Value::Integer(12));
        assert_eq!(
            Value::from(vec![1u8, 2, 3]),
            Value::Bulk(Bytes::from_static(&[1, 2, 3]))
        );
        assert_eq!(
            Value::from(vec![Value::Integer(1)]),
            Value::Array(vec![Value::Integer(1)])
        );
    }
}
