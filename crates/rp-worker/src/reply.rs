//! Conventional response shapes
//!
//! Responses are not part of the wire format, but callers expect a
//! list headed by the symbol `ok` on success, or by the symbol `error`
//! followed by an error-code symbol and a human-readable string.

use rp_protocol::Value;

/// A bare success response: `(ok)`
pub fn ok() -> Value {
    Value::list([Value::symbol("ok")])
}

/// A success response with payload elements: `(ok <elements>...)`
pub fn ok_with<I>(payload: I) -> Value
where
    I: IntoIterator<Item = Value>,
    I::IntoIter: DoubleEndedIterator,
{
    Value::pair(Value::symbol("ok"), Value::list(payload))
}

/// An error response: `(error <code> "<message>")`
pub fn error(code: &str, message: &str) -> Value {
    Value::list([
        Value::symbol("error"),
        Value::symbol(code),
        Value::string(message),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_shape() {
        let value = ok();
        assert!(value.is_proper_list());
        assert_eq!(value.list_len(), 1);
        assert!(value.head().is_some_and(|h| h.is_symbol_named("ok")));
    }

    #[test]
    fn test_ok_with_payload_shape() {
        let value = ok_with([Value::symbol("row"), Value::Int(1)]);
        assert_eq!(value.list_len(), 3);
        assert!(value.list_ref(1).is_some_and(|v| v.is_symbol_named("row")));
        assert_eq!(value.list_ref(2).and_then(Value::as_i64), Some(1));
    }

    #[test]
    fn test_error_shape() {
        let value = error("state", "not connected to database");
        assert_eq!(value.list_len(), 3);
        assert!(value.head().is_some_and(|h| h.is_symbol_named("error")));
        assert!(value.list_ref(1).is_some_and(|c| c.is_symbol_named("state")));
        assert_eq!(
            value.list_ref(2).and_then(Value::as_utf8),
            Some("not connected to database")
        );
    }
}
