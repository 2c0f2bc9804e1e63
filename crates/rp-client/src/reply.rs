//! Parsing the conventional ok/error response shape

use rp_protocol::Value;

use crate::error::ClientError;

/// A successful worker response: the elements following the `ok` head.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Payload elements after the `ok` symbol, in order
    pub payload: Vec<Value>,
}

impl Reply {
    /// Classify a decoded response value.
    ///
    /// `(ok <payload>...)` becomes a `Reply`; `(error <code> <message>)`
    /// becomes `ClientError::Backend`; anything else is a malformed
    /// reply.
    pub fn parse(response: Value) -> Result<Reply, ClientError> {
        if !response.is_proper_list() {
            return Err(ClientError::BadReply(format!(
                "response is not a proper list: {}",
                response
            )));
        }
        let head = match response.head() {
            Some(head) => head,
            None => {
                return Err(ClientError::BadReply("response is an empty list".into()))
            }
        };

        if head.is_symbol_named("ok") {
            let payload = response.list_iter().skip(1).cloned().collect();
            return Ok(Reply { payload });
        }

        if head.is_symbol_named("error") {
            let code = response
                .list_ref(1)
                .filter(|v| v.is_symbol())
                .and_then(Value::as_utf8)
                .ok_or_else(|| {
                    ClientError::BadReply(format!("error response without code: {}", response))
                })?
                .to_string();
            let message = response
                .list_ref(2)
                .filter(|v| v.is_string())
                .and_then(Value::as_utf8)
                .unwrap_or("")
                .to_string();
            return Err(ClientError::Backend { code, message });
        }

        Err(ClientError::BadReply(format!(
            "response head is neither ok nor error: {}",
            response
        )))
    }

    /// Interpret this reply as a row-reading step: `Some(columns)`
    /// while rows remain, `None` once the statement has finished.
    pub fn into_row(self) -> Result<Option<Vec<Value>>, ClientError> {
        if self.payload.is_empty() {
            return Ok(None);
        }
        if self.payload[0].is_symbol_named("row") {
            let mut columns = self.payload;
            columns.remove(0);
            return Ok(Some(columns));
        }
        Err(ClientError::BadReply(format!(
            "expected a row payload, got: {}",
            Value::list(self.payload)
        )))
    }
}
